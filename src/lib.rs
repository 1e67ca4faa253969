//! Small helpers for talking to an OpenAI-style chat completion endpoint:
//! configuration loading, a blocking chat client, `$name` text templates and
//! extraction of JSON from markdown code fences.

pub mod config;
pub mod helpers;
pub mod jsonblock;
pub mod openaiapi;
pub mod template;

pub use config::{Config, ConfigError};
pub use jsonblock::{json_loads, json_loads_first, FencedJsonError};
pub use openaiapi::{chat_completion, chat_invoke, ChatClient, ChatError, Message, Role};
pub use template::{template_substitute, TemplateError, TemplateProcessor, Templates};

#[cfg(test)]
mod test;

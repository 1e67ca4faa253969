use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde_derive::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum ChatError {
	#[error("HTTP error: {0}")]
	Http(#[from] reqwest::Error),
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
	#[error("Unexpected response shape: {0}")]
	UnexpectedShape(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	System,
	User,
	Assistant,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Message {
	pub role: Role,
	pub content: String,
}

impl Message {
	pub fn new(role: Role, content: impl Into<String>) -> Self {
		Message { role, content: content.into() }
	}
	pub fn system(content: impl Into<String>) -> Self {
		Self::new(Role::System, content)
	}
	pub fn user(content: impl Into<String>) -> Self {
		Self::new(Role::User, content)
	}
	pub fn assistant(content: impl Into<String>) -> Self {
		Self::new(Role::Assistant, content)
	}
}

#[derive(Serialize, Debug)]
pub struct ChatRequest<'a> {
	pub model: &'a str,
	pub messages: &'a [Message],
}

/// The HTTP client used when no [`ChatClient`] is supplied.
///
/// Requests carry no timeout.
fn new_http_client() -> Result<Client, ChatError> {
	Ok(Client::builder().timeout(None::<std::time::Duration>).build()?)
}

/// Posts `messages` to `url` and returns the decoded response body as is.
///
/// The status code is not checked: an error body that is valid JSON comes
/// back like any other.
pub fn chat_completion(messages: &[Message], model: &str, url: &str, api_key: &str) -> Result<Value, ChatError> {
	post_chat(&new_http_client()?, messages, model, url, api_key)
}

fn post_chat(client: &Client, messages: &[Message], model: &str, url: &str, api_key: &str) -> Result<Value, ChatError> {
	let serialised = serde_json::to_string(&ChatRequest { model, messages })?;
	log::debug!("POST {} model={} messages={}", url, model, messages.len());
	let resp = client
		.post(url)
		.bearer_auth(api_key)
		.header(CONTENT_TYPE, "application/json")
		.body(serialised)
		.send()?;
	let status = resp.status();
	if !status.is_success() {
		log::warn!("Chat API returned {}", status);
	}
	let body = resp.text()?;
	log::trace!("Response body: {}", body);
	Ok(serde_json::from_str(&body)?)
}

/// Sends `history` followed by `user_content` as a user message and returns
/// the first choice's reply text. `history` is left untouched.
pub fn chat_invoke(config: &Config, user_content: &str, history: &[Message]) -> Result<String, ChatError> {
	let messages = with_user_message(history, user_content);
	let response = chat_completion(&messages, &config.model, &config.api_url, &config.api_key)?;
	parse_reply(&response)
}

fn with_user_message(history: &[Message], user_content: &str) -> Vec<Message> {
	let mut messages = Vec::with_capacity(history.len() + 1);
	messages.extend_from_slice(history);
	messages.push(Message::user(user_content));
	messages
}

/// Pulls `choices[0].message.content` out of a response body.
pub fn parse_reply(response: &Value) -> Result<String, ChatError> {
	let message = response
		.get("choices").ok_or_else(|| shape("no choices in the response object"))?
		.get(0).ok_or_else(|| shape("no element 0 in the choices array"))?
		.get("message").ok_or_else(|| shape("no message in choices element 0"))?;
	match message.get("content") {
		Some(Value::String(content)) => Ok(content.clone()),
		Some(other) => Err(shape(&format!("message content is not a string: {}", other))),
		None => Err(shape("no content in the message")),
	}
}

fn shape(what: &str) -> ChatError {
	ChatError::UnexpectedShape(what.to_string())
}

/// A [`Config`] paired with one reusable HTTP client.
pub struct ChatClient {
	config: Config,
	http: Client,
}

impl ChatClient {
	pub fn new(config: Config) -> Result<Self, ChatError> {
		Ok(ChatClient {
			config,
			http: new_http_client()?,
		})
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn completion(&self, messages: &[Message]) -> Result<Value, ChatError> {
		post_chat(&self.http, messages, &self.config.model, &self.config.api_url, &self.config.api_key)
	}

	pub fn invoke(&self, user_content: &str, history: &[Message]) -> Result<String, ChatError> {
		let response = self.completion(&with_user_message(history, user_content))?;
		parse_reply(&response)
	}
}

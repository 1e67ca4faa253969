use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use serde_derive::{Deserialize, Serialize};
use thiserror::Error;

use crate::helpers::{self, HelperError};

/// Location read by [`Config::load`], relative to the working directory.
pub const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("IO error: {0}")]
	Io(#[from] io::Error),
	#[error("YAML error: {0}")]
	Yaml(#[from] serde_yaml::Error),
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
	#[error("Missing value for '{0}'")]
	Missing(&'static str),
	#[error("Invalid api_url '{url}': {source}")]
	InvalidUrl {
		url: String,
		source: url::ParseError,
	},
}

impl From<HelperError> for ConfigError {
	fn from(err: HelperError) -> Self {
		match err {
			HelperError::Io(err) => ConfigError::Io(err),
			HelperError::Serde(err) => ConfigError::Json(err),
			other => ConfigError::Io(io::Error::new(io::ErrorKind::InvalidData, other.to_string())),
		}
	}
}

/// Endpoint and credentials for the chat API.
///
/// Built once at start-up and handed by reference to whatever needs it.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
	pub model: String,
	pub api_url: String,
	pub api_key: String,
}

impl fmt::Debug for Config {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Config")
			.field("model", &self.model)
			.field("api_url", &self.api_url)
			.field("api_key", &"<redacted>")
			.finish()
	}
}

impl Config {
	pub fn load() -> Result<Self, ConfigError> {
		Self::from_path(CONFIG_FILE)
	}

	/// JSON when the extension is `.json`, YAML otherwise.
	pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let config: Config = if helpers::has_specific_extension(path, "json") {
			helpers::read_from_json(path)?
		} else {
			serde_yaml::from_str(&fs::read_to_string(path)?)?
		};
		config.validate()?;
		log::debug!("Loaded {:?} from {}", config, path.display());
		Ok(config)
	}

	pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
		let config: Config = serde_yaml::from_str(text)?;
		config.validate()?;
		Ok(config)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.model.trim().is_empty() {
			return Err(ConfigError::Missing("model"));
		}
		if self.api_key.trim().is_empty() {
			return Err(ConfigError::Missing("api_key"));
		}
		url::Url::parse(&self.api_url).map_err(|source| ConfigError::InvalidUrl {
			url: self.api_url.clone(),
			source,
		})?;
		Ok(())
	}
}

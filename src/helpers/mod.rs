use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;
use std::string;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HelperError {
	#[error("IO error: {0}")]
	Io(#[from] io::Error),
	#[error("Serde error: {0}")]
	Serde(#[from] serde_json::Error),
	#[error("FromUtf8 error: {0}")]
	FromUtf8Error(#[from] string::FromUtf8Error),
	#[error("Other Error {0}")]
	FromString(String),
}

impl HelperError {
	pub fn msg<M: Into<String>>(msg: M) -> Self {
		HelperError::FromString(msg.into())
	}
}

pub fn has_specific_extension<P: AsRef<Path>>(path: P, ext: &str) -> bool {
	match path.as_ref().extension() {
		Some(os_str) => os_str == ext,
		None => false,
	}
}

pub fn read_from_json<T: DeserializeOwned>(file_path: impl AsRef<Path>) -> Result<T, HelperError> {
	let mut file = File::open(file_path.as_ref())?;
	let mut content = String::new();
	file.read_to_string(&mut content)?;
	let parsed_json: T = serde_json::from_str(&content)?;
	Ok(parsed_json)
}

pub fn save_to_json<T: Serialize>(file_path: impl AsRef<Path>, object: &T) -> Result<(), HelperError> {
	let serialised = serde_json::to_string_pretty(&object)?;
	let mut file = OpenOptions::new()
		.write(true)
		.create(true)
		.truncate(true)
		.open(file_path.as_ref())?;
	writeln!(file, "{}", &serialised)?;
	Ok(())
}

const MAX_READ_BYTES: usize = 32_768;

pub trait FromInputBytes: Sized {
	fn from_bytes(bytes: Vec<u8>) -> Result<Self, HelperError>;
}

impl FromInputBytes for Vec<u8> {
	fn from_bytes(bytes: Vec<u8>) -> Result<Self, HelperError> {
		Ok(bytes)
	}
}

impl FromInputBytes for String {
	fn from_bytes(bytes: Vec<u8>) -> Result<Self, HelperError> {
		Ok(String::from_utf8(bytes)?)
	}
}

/// Reads at most `MAX_READ_BYTES` from `reader`, failing if more is available.
pub fn read_bounded<R, T>(reader: &mut R) -> Result<T, HelperError>
where
	R: Read,
	T: FromInputBytes,
{
	let mut buffer = Vec::with_capacity(MAX_READ_BYTES);
	reader.by_ref().take(MAX_READ_BYTES as u64).read_to_end(&mut buffer)?;

	if buffer.len() == MAX_READ_BYTES {
		let mut extra = [0u8; 1];
		let extra_read = reader.read(&mut extra)?;
		if extra_read != 0 {
			return Err(HelperError::msg("Input too large"));
		}
	}

	T::from_bytes(buffer)
}

pub fn read_stdin<T>() -> Result<T, HelperError>
where
	T: FromInputBytes,
{
	read_bounded(&mut io::stdin())
}

/// Resolves a command line text argument: `@path` reads the file, `-` reads
/// stdin, anything else is taken literally.
pub fn read_text_arg(arg: &str) -> Result<String, HelperError> {
	if let Some(filename) = arg.strip_prefix('@') {
		let mut content = String::new();
		File::open(filename)?.read_to_string(&mut content)?;
		Ok(content)
	} else if arg == "-" {
		read_stdin()
	} else {
		Ok(arg.to_string())
	}
}

/// Parses a `key=value` pair as given to `--var`.
pub fn parse_key_value(s: &str) -> Result<(String, String), HelperError> {
	match s.split_once('=') {
		Some((key, _)) if key.is_empty() => Err(HelperError::msg(format!("Empty key in '{}'", s))),
		Some((key, value)) => Ok((key.to_string(), value.to_string())),
		None => Err(HelperError::msg(format!("Expected key=value, got '{}'", s))),
	}
}

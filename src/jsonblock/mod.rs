use std::sync::OnceLock;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FencedJsonError {
	#[error("No ```json fenced block found")]
	NotFound,
	#[error("Expected one ```json fenced block, found {0}")]
	Multiple(usize),
	#[error("Fenced block is not valid JSON: {0}")]
	Parse(#[from] serde_json::Error),
	#[error("Path error: {0}")]
	Path(String),
}

// Opening fence and tag, newline, body (lazy), newline, optional indent, closing fence.
const FENCED_JSON_PATTERN: &str = r"(?s)```json[ \t]*\r?\n(.*?)\r?\n[ \t]*```";

fn fenced_json_regex() -> &'static Regex {
	static FENCED_JSON: OnceLock<Regex> = OnceLock::new();
	FENCED_JSON.get_or_init(|| Regex::new(FENCED_JSON_PATTERN).expect("fenced json pattern compiles"))
}

/// Bodies of every ```` ```json ```` block in `text`, in order of appearance.
pub fn find_json_blocks(text: &str) -> Vec<&str> {
	fenced_json_regex()
		.captures_iter(text)
		.filter_map(|cap| cap.get(1))
		.map(|body| body.as_str())
		.collect()
}

/// Parses the single ```` ```json ```` block in `text`.
///
/// Zero blocks is [`FencedJsonError::NotFound`], more than one is
/// [`FencedJsonError::Multiple`]. Use [`json_loads_first`] to take the first
/// of several.
pub fn json_loads(text: &str) -> Result<Value, FencedJsonError> {
	match find_json_blocks(text).as_slice() {
		[] => Err(FencedJsonError::NotFound),
		[body] => Ok(serde_json::from_str(body)?),
		blocks => Err(FencedJsonError::Multiple(blocks.len())),
	}
}

pub fn json_loads_first(text: &str) -> Result<Value, FencedJsonError> {
	let body = fenced_json_regex()
		.captures(text)
		.and_then(|cap| cap.get(1))
		.ok_or(FencedJsonError::NotFound)?;
	Ok(serde_json::from_str(body.as_str())?)
}

/// Follows a path like `parent.child[0].key` into `value`.
pub fn select<'a>(value: &'a Value, path: &str) -> Result<&'a Value, FencedJsonError> {
	let mut current = value;
	for part in path.split('.').filter(|part| !part.is_empty()) {
		let (key, indices) = parse_array_path(part)?;
		if !key.is_empty() {
			current = match current {
				Value::Object(map) => map.get(key).ok_or_else(|| {
					FencedJsonError::Path(format!("Key '{}' not found in JSON", key))
				})?,
				_ => return Err(FencedJsonError::Path(format!("Expected object at path '{}'", part))),
			};
		}
		for index in indices {
			current = match current {
				Value::Array(arr) => arr.get(index).ok_or_else(|| {
					FencedJsonError::Path(format!("Index {} out of bounds", index))
				})?,
				_ => return Err(FencedJsonError::Path(format!("Expected array at path '{}'", part))),
			};
		}
	}
	Ok(current)
}

fn parse_array_path(part: &str) -> Result<(&str, Vec<usize>), FencedJsonError> {
	let mut key = part;
	let mut indices = Vec::new();
	if let Some(open_bracket) = part.find('[') {
		key = &part[..open_bracket];
		for cap in part[open_bracket..].split('[').skip(1) {
			let index_str = cap.strip_suffix(']').ok_or_else(|| {
				FencedJsonError::Path(format!("Unclosed index in '{}'", part))
			})?;
			let index = index_str.parse::<usize>().map_err(|e| {
				FencedJsonError::Path(format!("Bad index '{}': {}", index_str, e))
			})?;
			indices.push(index);
		}
	}
	Ok((key, indices))
}

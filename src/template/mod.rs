use std::collections::HashMap;
use std::fmt::Display;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const TEMPLATES_DIR: &str = "templates";
pub const TEMPLATE_EXTENSION: &str = "txt";

#[derive(Debug, Error)]
pub enum TemplateError {
	#[error("IO error reading {path}: {source}")]
	Io {
		path: PathBuf,
		source: io::Error,
	},
	#[error("No value supplied for placeholder '{0}'")]
	MissingVariable(String),
	#[error("Invalid placeholder in template: line {line}, col {column}")]
	InvalidPlaceholder {
		line: usize,
		column: usize,
	},
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token<'a> {
	Text(&'a str),
	/// `$$`
	Escape,
	/// `$name` or `${name}`; `raw` is the text as written.
	Placeholder { name: &'a str, raw: &'a str },
	/// A `$` not followed by a valid placeholder, at byte `offset`.
	Invalid { offset: usize },
}

fn identifier_len(s: &str) -> usize {
	let mut len = 0;
	for (i, b) in s.bytes().enumerate() {
		let ok = if i == 0 {
			b.is_ascii_alphabetic() || b == b'_'
		} else {
			b.is_ascii_alphanumeric() || b == b'_'
		};
		if !ok {
			break;
		}
		len += 1;
	}
	len
}

fn tokenize(template: &str) -> Vec<Token<'_>> {
	let mut tokens = Vec::new();
	let mut pos = 0;
	while let Some(found) = template[pos..].find('$') {
		let dollar = pos + found;
		if dollar > pos {
			tokens.push(Token::Text(&template[pos..dollar]));
		}
		let rest = &template[dollar + 1..];
		let (token, consumed) = if rest.starts_with('$') {
			(Token::Escape, 2)
		} else if let Some(inner) = rest.strip_prefix('{') {
			let n = identifier_len(inner);
			if n > 0 && inner[n..].starts_with('}') {
				(Token::Placeholder { name: &inner[..n], raw: &template[dollar..dollar + n + 3] }, n + 3)
			} else {
				(Token::Invalid { offset: dollar }, 1)
			}
		} else {
			let n = identifier_len(rest);
			if n > 0 {
				(Token::Placeholder { name: &rest[..n], raw: &template[dollar..dollar + n + 1] }, n + 1)
			} else {
				(Token::Invalid { offset: dollar }, 1)
			}
		};
		tokens.push(token);
		pos = dollar + consumed;
	}
	if pos < template.len() {
		tokens.push(Token::Text(&template[pos..]));
	}
	tokens
}

/// 1-based line and column of byte `offset`.
fn line_and_column(template: &str, offset: usize) -> (usize, usize) {
	let before = &template[..offset];
	let line = before.matches('\n').count() + 1;
	let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
	(line, before[line_start..].chars().count() + 1)
}

/// Substitutes `$name`, `${name}` and `$$` against a set of replacements.
#[derive(Debug, Default, Clone)]
pub struct TemplateProcessor {
	replacements: HashMap<String, String>,
}

impl TemplateProcessor {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_replacements<I, K, V>(replacements: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Display,
	{
		let mut processor = Self::new();
		for (key, value) in replacements {
			processor.add_replacement(key, value);
		}
		processor
	}

	pub fn add_replacement(&mut self, key: impl Into<String>, value: impl Display) {
		self.replacements.insert(key.into(), value.to_string());
	}

	pub fn remove_replacement(&mut self, key: &str) -> Option<String> {
		self.replacements.remove(key)
	}

	pub fn get_replacement(&self, key: &str) -> Option<&String> {
		self.replacements.get(key)
	}

	pub fn replacements(&self) -> &HashMap<String, String> {
		&self.replacements
	}

	/// Fails on the first placeholder with no replacement or the first `$`
	/// that does not start a placeholder.
	pub fn substitute(&self, template: &str) -> Result<String, TemplateError> {
		let mut output = String::with_capacity(template.len());
		for token in tokenize(template) {
			match token {
				Token::Text(text) => output.push_str(text),
				Token::Escape => output.push('$'),
				Token::Placeholder { name, .. } => {
					let value = self.replacements.get(name)
						.ok_or_else(|| TemplateError::MissingVariable(name.to_string()))?;
					output.push_str(value);
				}
				Token::Invalid { offset } => {
					let (line, column) = line_and_column(template, offset);
					return Err(TemplateError::InvalidPlaceholder { line, column });
				}
			}
		}
		Ok(output)
	}

	/// Like [`substitute`](Self::substitute) but leaves unknown and invalid
	/// placeholders in the output as written.
	pub fn safe_substitute(&self, template: &str) -> String {
		let mut output = String::with_capacity(template.len());
		for token in tokenize(template) {
			match token {
				Token::Text(text) => output.push_str(text),
				Token::Escape => output.push('$'),
				Token::Placeholder { name, raw } => match self.replacements.get(name) {
					Some(value) => output.push_str(value),
					None => output.push_str(raw),
				},
				Token::Invalid { .. } => output.push('$'),
			}
		}
		output
	}
}

/// A directory of `<name>.txt` templates. Files are re-read on every render.
#[derive(Debug, Clone)]
pub struct Templates {
	dir: PathBuf,
}

impl Default for Templates {
	fn default() -> Self {
		Templates::new(TEMPLATES_DIR)
	}
}

impl Templates {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Templates { dir: dir.into() }
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	pub fn path_for(&self, template_name: &str) -> PathBuf {
		self.dir.join(format!("{}.{}", template_name, TEMPLATE_EXTENSION))
	}

	pub fn read(&self, template_name: &str) -> Result<String, TemplateError> {
		let path = self.path_for(template_name);
		log::debug!("Reading template {}", path.display());
		fs::read_to_string(&path).map_err(|source| TemplateError::Io { path, source })
	}

	pub fn substitute<I, K, V>(&self, template_name: &str, variables: I) -> Result<String, TemplateError>
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Display,
	{
		let text = self.read(template_name)?;
		TemplateProcessor::with_replacements(variables).substitute(&text)
	}

	pub fn safe_substitute<I, K, V>(&self, template_name: &str, variables: I) -> Result<String, TemplateError>
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Display,
	{
		let text = self.read(template_name)?;
		Ok(TemplateProcessor::with_replacements(variables).safe_substitute(&text))
	}
}

/// Renders `templates/<template_name>.txt` with `variables`.
pub fn template_substitute<I, K, V>(template_name: &str, variables: I) -> Result<String, TemplateError>
where
	I: IntoIterator<Item = (K, V)>,
	K: Into<String>,
	V: Display,
{
	Templates::default().substitute(template_name, variables)
}

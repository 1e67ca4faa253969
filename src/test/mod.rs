use super::*;
use mockito::Matcher;
use serde_json::json;
use std::collections::HashMap;
use std::fs;
use tempfile::TempDir;

fn config_for(server: &mockito::ServerGuard) -> Config {
	Config {
		model: "test-model".to_string(),
		api_url: format!("{}/v1/chat/completions", server.url()),
		api_key: "sk-test".to_string(),
	}
}

fn reply_body(content: &str) -> String {
	json!({ "choices": [ { "message": { "role": "assistant", "content": content } } ] }).to_string()
}

// config

#[test]
fn config_from_yaml() {
	let config = Config::from_yaml("model: m\napi_url: https://example.com/v1/chat\napi_key: k\n").unwrap();
	assert_eq!(config.model, "m");
	assert_eq!(config.api_url, "https://example.com/v1/chat");
	assert_eq!(config.api_key, "k");
}

#[test]
fn config_missing_key_is_an_error() {
	let err = Config::from_yaml("model: m\napi_url: https://example.com\n").unwrap_err();
	assert!(matches!(err, ConfigError::Yaml(_)), "{:?}", err);
}

#[test]
fn config_rejects_empty_and_bad_values() {
	let err = Config::from_yaml("model: ''\napi_url: https://example.com\napi_key: k\n").unwrap_err();
	assert!(matches!(err, ConfigError::Missing("model")));
	let err = Config::from_yaml("model: m\napi_url: not a url\napi_key: k\n").unwrap_err();
	assert!(matches!(err, ConfigError::InvalidUrl { .. }));
}

#[test]
fn config_from_json_and_yaml_files() {
	let dir = TempDir::new().unwrap();
	let json_path = dir.path().join("config.json");
	fs::write(&json_path, r#"{"model":"m","api_url":"http://localhost:1/x","api_key":"k"}"#).unwrap();
	let yaml_path = dir.path().join("config.yaml");
	fs::write(&yaml_path, "model: m\napi_url: http://localhost:1/x\napi_key: k\n").unwrap();
	assert_eq!(Config::from_path(&json_path).unwrap(), Config::from_path(&yaml_path).unwrap());
}

#[test]
fn config_missing_file() {
	let dir = TempDir::new().unwrap();
	let err = Config::from_path(dir.path().join("nope.yaml")).unwrap_err();
	assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn config_debug_hides_key() {
	let config = Config::from_yaml("model: m\napi_url: https://example.com\napi_key: sk-secret\n").unwrap();
	let shown = format!("{:?}", config);
	assert!(!shown.contains("sk-secret"));
	assert!(shown.contains("<redacted>"));
}

// openaiapi

#[test]
fn message_serialises_lowercase_role() {
	let value = serde_json::to_value(Message::system("s")).unwrap();
	assert_eq!(value, json!({"role": "system", "content": "s"}));
	let back: Message = serde_json::from_value(json!({"role": "assistant", "content": "a"})).unwrap();
	assert_eq!(back, Message::assistant("a"));
}

#[test]
fn chat_completion_sends_messages_unchanged() {
	let mut server = mockito::Server::new();
	let messages = vec![
		Message::system("be brief"),
		Message::user("one"),
		Message::assistant("two"),
		Message::user("three"),
	];
	let mock = server.mock("POST", "/v1/chat/completions")
		.match_header("authorization", "Bearer sk-test")
		.match_header("content-type", "application/json")
		.match_body(Matcher::Json(json!({
			"model": "test-model",
			"messages": [
				{"role": "system", "content": "be brief"},
				{"role": "user", "content": "one"},
				{"role": "assistant", "content": "two"},
				{"role": "user", "content": "three"}
			]
		})))
		.with_body(reply_body("ok"))
		.create();

	let config = config_for(&server);
	let response = chat_completion(&messages, &config.model, &config.api_url, &config.api_key).unwrap();
	mock.assert();
	assert_eq!(response["choices"][0]["message"]["content"], "ok");
	assert_eq!(messages.len(), 4);
}

#[test]
fn chat_completion_returns_error_bodies_as_json() {
	let mut server = mockito::Server::new();
	let _mock = server.mock("POST", "/v1/chat/completions")
		.with_status(401)
		.with_body(r#"{"error":{"message":"bad key"}}"#)
		.create();
	let config = config_for(&server);
	let response = chat_completion(&[Message::user("x")], &config.model, &config.api_url, &config.api_key).unwrap();
	assert_eq!(response, json!({"error": {"message": "bad key"}}));
}

#[test]
fn chat_completion_non_json_body() {
	let mut server = mockito::Server::new();
	let _mock = server.mock("POST", "/v1/chat/completions")
		.with_status(502)
		.with_body("<html>Bad Gateway</html>")
		.create();
	let config = config_for(&server);
	let err = chat_completion(&[Message::user("x")], &config.model, &config.api_url, &config.api_key).unwrap_err();
	assert!(matches!(err, ChatError::Json(_)), "{:?}", err);
}

#[test]
fn chat_invoke_returns_first_choice() {
	let mut server = mockito::Server::new();
	let mock = server.mock("POST", "/v1/chat/completions")
		.match_body(Matcher::Json(json!({
			"model": "test-model",
			"messages": [{"role": "user", "content": "hello"}]
		})))
		.with_body(r#"{"choices":[{"message":{"content":"hi"}}]}"#)
		.create();
	let reply = chat_invoke(&config_for(&server), "hello", &[]).unwrap();
	mock.assert();
	assert_eq!(reply, "hi");
}

#[test]
fn chat_invoke_appends_user_message_to_history() {
	let mut server = mockito::Server::new();
	let mock = server.mock("POST", "/v1/chat/completions")
		.match_body(Matcher::Json(json!({
			"model": "test-model",
			"messages": [
				{"role": "system", "content": "s"},
				{"role": "user", "content": "u"}
			]
		})))
		.with_body(reply_body("r"))
		.create();
	let history = vec![Message::system("s")];
	let reply = chat_invoke(&config_for(&server), "u", &history).unwrap();
	mock.assert();
	assert_eq!(reply, "r");
	assert_eq!(history, vec![Message::system("s")]);
}

#[test]
fn chat_invoke_does_not_accumulate_history() {
	let mut server = mockito::Server::new();
	let mock = server.mock("POST", "/v1/chat/completions")
		.match_body(Matcher::Json(json!({
			"model": "test-model",
			"messages": [{"role": "user", "content": "again"}]
		})))
		.with_body(reply_body("r"))
		.expect(2)
		.create();
	let client = ChatClient::new(config_for(&server)).unwrap();
	client.invoke("again", &[]).unwrap();
	client.invoke("again", &[]).unwrap();
	mock.assert();
}

#[test]
fn chat_invoke_unexpected_shape() {
	let mut server = mockito::Server::new();
	let _mock = server.mock("POST", "/v1/chat/completions")
		.with_body(r#"{"error":"nope"}"#)
		.create();
	let err = chat_invoke(&config_for(&server), "hello", &[]).unwrap_err();
	assert!(matches!(err, ChatError::UnexpectedShape(_)), "{:?}", err);
}

#[test]
fn parse_reply_shapes() {
	assert!(matches!(openaiapi::parse_reply(&json!({"choices": []})), Err(ChatError::UnexpectedShape(_))));
	assert!(matches!(openaiapi::parse_reply(&json!({"choices": [{}]})), Err(ChatError::UnexpectedShape(_))));
	assert!(matches!(
		openaiapi::parse_reply(&json!({"choices": [{"message": {"content": null}}]})),
		Err(ChatError::UnexpectedShape(_))
	));
}

#[test]
fn azure_response_parse_test() {
	let response: serde_json::Value = helpers::read_from_json("testdata/sampleresponse.json").unwrap();
	let reply = openaiapi::parse_reply(&response).unwrap();
	assert!(reply.starts_with("Here you go:"));
	assert_eq!(json_loads(&reply).unwrap(), json!({"city": "Paris", "population": 2102650}));
}

#[test]
fn chat_unreachable_endpoint() {
	let err = chat_completion(&[Message::user("x")], "m", "http://127.0.0.1:1/v1/chat", "k").unwrap_err();
	assert!(matches!(err, ChatError::Http(_)), "{:?}", err);
}

// template

#[test]
fn template_substitute_greet() {
	let output = template_substitute("greet", [("name", "Ada")]).unwrap();
	assert_eq!(output, "Hello, Ada!\n");
}

#[test]
fn template_missing_variable() {
	let err = template_substitute("greet", HashMap::<String, String>::new()).unwrap_err();
	assert!(matches!(err, TemplateError::MissingVariable(ref name) if name == "name"), "{:?}", err);
}

#[test]
fn template_missing_file() {
	let err = template_substitute("does_not_exist", [("name", "Ada")]).unwrap_err();
	assert!(matches!(err, TemplateError::Io { .. }));
}

#[test]
fn template_directory_and_display_values() {
	let dir = TempDir::new().unwrap();
	fs::write(dir.path().join("count.txt"), "${who} has $n items costing $$${price}").unwrap();
	let templates = Templates::new(dir.path());
	let mut vars: HashMap<&str, String> = HashMap::new();
	vars.insert("who", "Ada".to_string());
	vars.insert("n", 3.to_string());
	vars.insert("price", format!("{:.2}", 4.5));
	assert_eq!(templates.substitute("count", vars).unwrap(), "Ada has 3 items costing $4.50");
}

#[test]
fn template_processor_grammar() {
	let processor = TemplateProcessor::with_replacements([("a", 1), ("b_2", 2)]);
	assert_eq!(processor.substitute("$a-${b_2}x $ab").unwrap_err().to_string(), "No value supplied for placeholder 'ab'");
	assert_eq!(processor.substitute("${a}b $b_2.").unwrap(), "1b 2.");
	assert_eq!(processor.substitute("cost: $$5").unwrap(), "cost: $5");
	assert_eq!(processor.substitute("no placeholders").unwrap(), "no placeholders");
}

#[test]
fn template_invalid_placeholder_position() {
	let processor = TemplateProcessor::new();
	match processor.substitute("line one\nab $1") {
		Err(TemplateError::InvalidPlaceholder { line, column }) => {
			assert_eq!((line, column), (2, 4));
		}
		other => panic!("unexpected {:?}", other),
	}
	assert!(matches!(processor.substitute("trailing $"), Err(TemplateError::InvalidPlaceholder { .. })));
	assert!(matches!(processor.substitute("${unclosed"), Err(TemplateError::InvalidPlaceholder { .. })));
}

#[test]
fn template_safe_substitute_keeps_unknowns() {
	let mut processor = TemplateProcessor::new();
	processor.add_replacement("known", "yes");
	assert_eq!(processor.safe_substitute("$known ${unknown} $other $5 $$"), "yes ${unknown} $other $5 $");
	assert_eq!(processor.remove_replacement("known"), Some("yes".to_string()));
	assert!(processor.get_replacement("known").is_none());
}

// jsonblock

#[test]
fn json_loads_inline_fence() {
	let value = json_loads("prefix ```json\n{\"a\":1}\n``` suffix").unwrap();
	assert_eq!(value, json!({"a": 1}));
}

#[test]
fn json_loads_not_found() {
	assert!(matches!(json_loads("no fenced block here"), Err(FencedJsonError::NotFound)));
	assert!(matches!(json_loads("```\n{\"a\":1}\n```"), Err(FencedJsonError::NotFound)));
}

#[test]
fn json_loads_invalid_body() {
	assert!(matches!(json_loads("```json\n{not json}\n```"), Err(FencedJsonError::Parse(_))));
}

#[test]
fn json_loads_multiline_and_crlf() {
	let text = "Result:\r\n```json\r\n{\r\n  \"items\": [1, 2]\r\n}\r\n  ```\r\n";
	assert_eq!(json_loads(text).unwrap(), json!({"items": [1, 2]}));
}

#[test]
fn json_loads_multiple_blocks() {
	let text = "```json\n[1]\n```\nand\n```json\n[2]\n```";
	assert!(matches!(json_loads(text), Err(FencedJsonError::Multiple(2))));
	assert_eq!(json_loads_first(text).unwrap(), json!([1]));
	assert_eq!(jsonblock::find_json_blocks(text), vec!["[1]", "[2]"]);
}

#[test]
fn json_select_path() {
	let value = json!({"parent": {"child": [{"key": "v"}, {"key": "w"}]}});
	assert_eq!(jsonblock::select(&value, "parent.child[1].key").unwrap(), &json!("w"));
	assert_eq!(jsonblock::select(&value, "").unwrap(), &value);
	assert!(matches!(jsonblock::select(&value, "parent.child[5]"), Err(FencedJsonError::Path(_))));
	assert!(matches!(jsonblock::select(&value, "parent.missing"), Err(FencedJsonError::Path(_))));
}

// helpers

#[test]
fn parse_key_value_pairs() {
	assert_eq!(helpers::parse_key_value("name=Ada=Lovelace").unwrap(), ("name".to_string(), "Ada=Lovelace".to_string()));
	assert!(helpers::parse_key_value("novalue").is_err());
	assert!(helpers::parse_key_value("=x").is_err());
}

#[test]
fn history_round_trips_through_json_file() {
	let dir = TempDir::new().unwrap();
	let path = dir.path().join("history.json");
	let history = vec![Message::system("s"), Message::user("u"), Message::assistant("a")];
	helpers::save_to_json(&path, &history).unwrap();
	let loaded: Vec<Message> = helpers::read_from_json(&path).unwrap();
	assert_eq!(loaded, history);
}

#[test]
fn read_bounded_rejects_large_input() {
	let small: String = helpers::read_bounded(&mut "hello".as_bytes()).unwrap();
	assert_eq!(small, "hello");
	let big = vec![b'x'; 40_000];
	assert!(helpers::read_bounded::<_, Vec<u8>>(&mut big.as_slice()).is_err());
}

use reqwest::Client;
use serde_json::{Map, Value};

use crate::{Error, Result};
use faq_config::LlmProviderConfig;
use faq_domain::{Message, Role, ToolCall};

/// A function the model may call, described in JSON Schema.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolSpec {
	pub name: String,
	pub description: String,
	pub parameters: Value,
}

pub async fn complete(
	client: &Client,
	cfg: &LlmProviderConfig,
	messages: &[Message],
	tools: &[ToolSpec],
) -> Result<Message> {
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = request_body(cfg, messages, tools);
	let headers = crate::auth_headers(&cfg.api_key, &cfg.default_headers)?;
	let json = crate::post_json(client, url, headers, cfg.timeout_ms, &body).await?;
	let message = parse_chat_response(json)?;

	tracing::debug!(
		model = %cfg.model,
		tool_calls = message.tool_calls.len(),
		"Chat completion received."
	);

	Ok(message)
}

fn request_body(cfg: &LlmProviderConfig, messages: &[Message], tools: &[ToolSpec]) -> Value {
	let mut body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": messages.iter().map(message_to_wire).collect::<Vec<_>>(),
	});

	if !tools.is_empty() {
		body["tools"] = tools.iter().map(tool_to_wire).collect();
		body["tool_choice"] = Value::String("auto".to_string());
	}

	body
}

fn tool_to_wire(tool: &ToolSpec) -> Value {
	serde_json::json!({
		"type": "function",
		"function": {
			"name": tool.name,
			"description": tool.description,
			"parameters": tool.parameters,
		},
	})
}

fn message_to_wire(message: &Message) -> Value {
	let mut wire = Map::new();

	wire.insert("role".to_string(), Value::String(message.role.as_str().to_string()));

	match message.role {
		Role::Assistant if message.has_tool_calls() => {
			let content = if message.content.is_empty() {
				Value::Null
			} else {
				Value::String(message.content.clone())
			};
			let calls = message
				.tool_calls
				.iter()
				.map(|call| {
					serde_json::json!({
						"id": call.id,
						"type": "function",
						"function": {
							"name": call.name,
							"arguments": encode_arguments(&call.arguments),
						},
					})
				})
				.collect();

			wire.insert("content".to_string(), content);
			wire.insert("tool_calls".to_string(), Value::Array(calls));
		},
		Role::Tool => {
			wire.insert("content".to_string(), Value::String(message.content.clone()));
			wire.insert(
				"tool_call_id".to_string(),
				Value::String(message.tool_call_id.clone().unwrap_or_default()),
			);
		},
		_ => {
			wire.insert("content".to_string(), Value::String(message.content.clone()));
		},
	}

	Value::Object(wire)
}

// Arguments travel as a JSON-encoded string. Undecodable arguments are kept as the raw string.
fn encode_arguments(arguments: &Value) -> String {
	match arguments {
		Value::String(raw) => raw.clone(),
		other => other.to_string(),
	}
}

fn decode_arguments(raw: &Value) -> Value {
	match raw {
		Value::String(text) if text.trim().is_empty() => Value::Object(Map::new()),
		Value::String(text) =>
			serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.clone())),
		other => other.clone(),
	}
}

fn parse_chat_response(json: Value) -> Result<Message> {
	let message = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.ok_or_else(|| Error::InvalidResponse {
			message: "Chat response is missing choices[0].message.".to_string(),
		})?;
	let content = message.get("content").and_then(|c| c.as_str()).unwrap_or_default().to_string();
	let mut tool_calls = Vec::new();

	if let Some(calls) = message.get("tool_calls").and_then(|v| v.as_array()) {
		for (index, call) in calls.iter().enumerate() {
			let function = call.get("function").ok_or_else(|| Error::InvalidResponse {
				message: "Tool call is missing function.".to_string(),
			})?;
			let name = function.get("name").and_then(|v| v.as_str()).ok_or_else(|| {
				Error::InvalidResponse { message: "Tool call is missing function name.".to_string() }
			})?;
			let id = call
				.get("id")
				.and_then(|v| v.as_str())
				.map(str::to_string)
				.unwrap_or_else(|| format!("call_{index}"));
			let arguments = function.get("arguments").map(decode_arguments).unwrap_or_default();

			tool_calls.push(ToolCall { id, name: name.to_string(), arguments });
		}
	}

	Ok(Message::assistant_with_tools(content, tool_calls))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn cfg() -> LlmProviderConfig {
		LlmProviderConfig {
			provider_id: "test".to_string(),
			api_base: "http://127.0.0.1:1".to_string(),
			api_key: "key".to_string(),
			path: "/chat/completions".to_string(),
			model: "test-model".to_string(),
			temperature: 0.0,
			timeout_ms: 1_000,
			default_headers: Map::new(),
		}
	}

	#[test]
	fn parses_plain_answer() {
		let json = serde_json::json!({
			"choices": [{ "message": { "role": "assistant", "content": "Hello." } }]
		});
		let message = parse_chat_response(json).expect("parse failed");

		assert_eq!(message.role, Role::Assistant);
		assert_eq!(message.content, "Hello.");
		assert!(message.tool_calls.is_empty());
	}

	#[test]
	fn parses_tool_calls_with_string_arguments() {
		let json = serde_json::json!({
			"choices": [{
				"message": {
					"role": "assistant",
					"content": null,
					"tool_calls": [{
						"id": "call_abc",
						"type": "function",
						"function": { "name": "search_faq", "arguments": "{\"query\":\"refunds\"}" }
					}]
				}
			}]
		});
		let message = parse_chat_response(json).expect("parse failed");

		assert_eq!(message.content, "");
		assert_eq!(message.tool_calls.len(), 1);
		assert_eq!(message.tool_calls[0].id, "call_abc");
		assert_eq!(message.tool_calls[0].arguments["query"], "refunds");
	}

	#[test]
	fn malformed_arguments_are_kept_raw() {
		let decoded = decode_arguments(&Value::String("{not json".to_string()));

		assert_eq!(decoded, Value::String("{not json".to_string()));
	}

	#[test]
	fn missing_choices_is_an_error() {
		assert!(parse_chat_response(serde_json::json!({ "error": "boom" })).is_err());
	}

	#[test]
	fn request_carries_tools_and_tool_results() {
		let messages = vec![
			Message::system("sys"),
			Message::user("question"),
			Message::assistant_with_tools(
				"",
				vec![ToolCall {
					id: "call_1".to_string(),
					name: "search_faq".to_string(),
					arguments: serde_json::json!({ "query": "q" }),
				}],
			),
			Message::tool("call_1", "result"),
		];
		let tools = vec![ToolSpec {
			name: "search_faq".to_string(),
			description: "Search.".to_string(),
			parameters: serde_json::json!({ "type": "object" }),
		}];
		let body = request_body(&cfg(), &messages, &tools);

		assert_eq!(body["temperature"], 0.0);
		assert_eq!(body["tool_choice"], "auto");
		assert_eq!(body["tools"][0]["function"]["name"], "search_faq");
		assert_eq!(body["messages"][2]["content"], Value::Null);
		assert_eq!(body["messages"][2]["tool_calls"][0]["function"]["arguments"], "{\"query\":\"q\"}");
		assert_eq!(body["messages"][3]["tool_call_id"], "call_1");
	}

	#[test]
	fn request_omits_tools_when_none() {
		let body = request_body(&cfg(), &[Message::user("hi")], &[]);

		assert!(body.get("tools").is_none());
		assert!(body.get("tool_choice").is_none());
	}
}

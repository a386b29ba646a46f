use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	System,
	User,
	Assistant,
	Tool,
}
impl Role {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::System => "system",
			Self::User => "user",
			Self::Assistant => "assistant",
			Self::Tool => "tool",
		}
	}
}

/// A tool invocation requested by the model. `arguments` is the decoded JSON object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
	pub id: String,
	pub name: String,
	pub arguments: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
	pub role: Role,
	pub content: String,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub tool_calls: Vec<ToolCall>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tool_call_id: Option<String>,
}
impl Message {
	pub fn system(content: impl Into<String>) -> Self {
		Self::plain(Role::System, content)
	}

	pub fn user(content: impl Into<String>) -> Self {
		Self::plain(Role::User, content)
	}

	pub fn assistant(content: impl Into<String>) -> Self {
		Self::plain(Role::Assistant, content)
	}

	pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
		Self { role: Role::Assistant, content: content.into(), tool_calls, tool_call_id: None }
	}

	pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
		Self {
			role: Role::Tool,
			content: content.into(),
			tool_calls: Vec::new(),
			tool_call_id: Some(tool_call_id.into()),
		}
	}

	pub fn has_tool_calls(&self) -> bool {
		!self.tool_calls.is_empty()
	}

	fn plain(role: Role, content: impl Into<String>) -> Self {
		Self { role, content: content.into(), tool_calls: Vec::new(), tool_call_id: None }
	}
}

/// Most recent message with `role`, scanning from the end.
pub fn last_of_role(messages: &[Message], role: Role) -> Option<&Message> {
	messages.iter().rev().find(|message| message.role == role)
}

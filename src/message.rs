//! The conversation message model: [`Msg`] and its [`ContentBlock`]s.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One piece of a message's content.
///
/// A single assistant turn commonly mixes thinking, text, and tool calls;
/// a tool turn carries exactly one [`ContentBlock::ToolResult`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    Thinking { thinking: String },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        id: String,
        output: Vec<ContentBlock>,
        is_error: bool,
    },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    pub fn thinking(thinking: impl Into<String>) -> Self {
        ContentBlock::Thinking {
            thinking: thinking.into(),
        }
    }

    pub fn tool_use(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        ContentBlock::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    pub fn tool_result(id: impl Into<String>, output: impl Into<String>, is_error: bool) -> Self {
        ContentBlock::ToolResult {
            id: id.into(),
            output: vec![ContentBlock::text(output)],
            is_error,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text { text } => Some(text),
            _ => None,
        }
    }

    pub fn as_tool_use(&self) -> Option<(&str, &str, &Value)> {
        match self {
            ContentBlock::ToolUse { id, name, input } => Some((id, name, input)),
            _ => None,
        }
    }
}

/// An immutable entry in [`crate::memory::Memory`].
///
/// `id` stays stable across hook rewrites of `content`; hooks that replace
/// a message wholesale should carry the id forward rather than minting a new one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Msg {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub content: Vec<ContentBlock>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
    pub timestamp: DateTime<Utc>,
}

impl Msg {
    pub fn new(name: impl Into<String>, role: Role, content: Vec<ContentBlock>) -> Self {
        Msg {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            role,
            content,
            metadata: HashMap::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn system(name: impl Into<String>, text: impl Into<String>) -> Self {
        Msg::new(name, Role::System, vec![ContentBlock::text(text)])
    }

    pub fn user(name: impl Into<String>, text: impl Into<String>) -> Self {
        Msg::new(name, Role::User, vec![ContentBlock::text(text)])
    }

    pub fn assistant(name: impl Into<String>, content: Vec<ContentBlock>) -> Self {
        Msg::new(name, Role::Assistant, content)
    }

    pub fn tool(name: impl Into<String>, result: ContentBlock) -> Self {
        Msg::new(name, Role::Tool, vec![result])
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Concatenation of every [`ContentBlock::Text`] block, in order.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|b| b.as_text())
            .collect::<Vec<_>>()
            .join("")
    }

    /// All `ToolUse` blocks in this message, in canonical order.
    pub fn tool_uses(&self) -> Vec<(&str, &str, &Value)> {
        self.content.iter().filter_map(|b| b.as_tool_use()).collect()
    }
}

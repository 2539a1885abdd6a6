//! The abstract model interface the reasoning pipeline streams against.
//!
//! Concrete wire formats, auth, and provider quirks are deliberately kept
//! out of the core; see `providers::rig_provider` for one concrete example.

use crate::error::Result;
use crate::message::{ContentBlock, Msg};
use async_trait::async_trait;
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::pin::Pin;

/// JSON-schema description of one callable tool, as seen by a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Whether the model must call a tool, and if so which one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolChoice {
    Auto,
    None,
    Required,
    Specific(String),
}

impl Default for ToolChoice {
    fn default() -> Self {
        ToolChoice::Auto
    }
}

/// Generation knobs passed through to `Model::stream`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub tool_choice: ToolChoice,
    pub timeout_secs: u64,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        GenerationOptions {
            model: None,
            temperature: None,
            max_tokens: None,
            top_p: None,
            tool_choice: ToolChoice::Auto,
            timeout_secs: 60,
        }
    }
}

impl GenerationOptions {
    pub fn with_tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = choice;
        self
    }
}

/// Token usage reported by a provider, when available.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UsageStats {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// One chunk of a streamed completion.
///
/// `content` carries deltas: a partial `Text`/`Thinking`, or a fully formed
/// `ToolUse` (tool calls are generally emitted atomically once arguments
/// are complete).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub id: String,
    pub content: Vec<ContentBlock>,
    pub usage: Option<UsageStats>,
    pub finish_reason: Option<String>,
}

/// A lazy, finite, cancellable sequence of [`ChatResponse`] chunks.
pub type ModelStream = Pin<Box<dyn Stream<Item = Result<ChatResponse>> + Send>>;

/// Abstract streaming completion provider.
///
/// Implementations own the wire format, auth, and retry policy; the core
/// only ever consumes `stream`.
#[async_trait]
pub trait Model: Send + Sync {
    fn id(&self) -> &str;

    async fn stream(
        &self,
        messages: &[Msg],
        tools: &[ToolSchema],
        options: &GenerationOptions,
    ) -> Result<ModelStream>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use futures::stream;
    use std::sync::Mutex;

    /// A scripted `Model` for tests: returns one canned stream per call,
    /// advancing through a fixed list of responses.
    pub struct ScriptedModel {
        scripts: Mutex<Vec<Vec<ChatResponse>>>,
    }

    impl ScriptedModel {
        pub fn new(scripts: Vec<Vec<ChatResponse>>) -> Self {
            ScriptedModel {
                scripts: Mutex::new(scripts.into_iter().rev().collect()),
            }
        }
    }

    #[async_trait]
    impl Model for ScriptedModel {
        fn id(&self) -> &str {
            "scripted"
        }

        async fn stream(
            &self,
            _messages: &[Msg],
            _tools: &[ToolSchema],
            _options: &GenerationOptions,
        ) -> Result<ModelStream> {
            let mut scripts = self.scripts.lock().expect("lock poisoned");
            let next = scripts.pop().unwrap_or_default();
            Ok(Box::pin(stream::iter(next.into_iter().map(Ok))))
        }
    }
}

//! The tool registry the acting pipeline dispatches through.

use crate::error::Result;
use crate::message::ContentBlock;
use crate::model::ToolSchema;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A tool callable by the model.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters_schema(&self) -> Value;

    /// Run the tool. Failures are reported as `Ok(ToolResult::failure(..))`;
    /// an `Err` here means the tool could not even be dispatched.
    async fn execute(&self, args: Value) -> Result<ToolResult>;

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// The outcome of one tool invocation, before it is paired back to its
/// originating `ToolUse` id and wrapped in a tool-role `Msg`.
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(content: impl Into<String>) -> Self {
        ToolResult {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        ToolResult {
            content: error.into(),
            is_error: true,
        }
    }

    pub fn into_block(self, id: impl Into<String>) -> ContentBlock {
        ContentBlock::tool_result(id, self.content, self.is_error)
    }
}

/// One requested call, extracted from an assistant message's `ToolUse` blocks.
#[derive(Debug, Clone)]
pub struct ToolUseRequest {
    pub id: String,
    pub name: String,
    pub input: Value,
}

/// Per-call execution knobs (timeout, retry policy) threaded through to tools
/// that care; the default registry implementation below ignores it.
#[derive(Debug, Clone, Default)]
pub struct ExecConfig {
    pub timeout_secs: Option<u64>,
}

/// Sink for intra-tool streaming progress, installed by the acting
/// pipeline before each dispatch. A plain channel sender rather than an
/// async callback, so tools can report progress without borrowing the
/// hook chain across an `.await`.
pub type ChunkSink = tokio::sync::mpsc::UnboundedSender<(ToolUseRequest, String)>;

/// Registry of active tools, plus the dispatch entry point the acting
/// pipeline calls.
#[async_trait]
pub trait Toolkit: Send + Sync {
    fn get_tool_schemas(&self) -> Vec<ToolSchema>;
    fn get_tool(&self, name: &str) -> Option<Arc<dyn Tool>>;

    /// Adds a tool to the active set. Used by the structured-output
    /// handler to install its synthetic `generate_response` tool.
    fn register_tool(&self, tool: Arc<dyn Tool>);

    /// Removes a tool from the active set.
    fn unregister_tool(&self, name: &str);

    /// Invoke every requested call and return results in the same order as
    /// `requests`, regardless of completion order. Individual tool failures
    /// must be captured as `ToolResult::failure`, never propagated as `Err`.
    async fn call_tools(
        &self,
        requests: &[ToolUseRequest],
        exec: &ExecConfig,
        chunks: Option<ChunkSink>,
    ) -> Result<Vec<ToolResult>>;
}

/// The default in-process registry, backed by a name -> tool map.
#[derive(Clone)]
pub struct ToolRegistry {
    tools: Arc<Mutex<HashMap<String, Arc<dyn Tool>>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        ToolRegistry {
            tools: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn register(&self, tool: Arc<dyn Tool>) {
        self.tools
            .lock()
            .expect("registry lock poisoned")
            .insert(tool.name().to_string(), tool);
    }

    pub fn unregister(&self, name: &str) {
        self.tools.lock().expect("registry lock poisoned").remove(name);
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.lock().expect("registry lock poisoned").keys().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.tools.lock().expect("registry lock poisoned").len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        ToolRegistry::new()
    }
}

#[async_trait]
impl Toolkit for ToolRegistry {
    fn get_tool_schemas(&self) -> Vec<ToolSchema> {
        self.tools
            .lock()
            .expect("registry lock poisoned")
            .values()
            .map(|t| t.schema())
            .collect()
    }

    fn get_tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.lock().expect("registry lock poisoned").get(name).cloned()
    }

    fn register_tool(&self, tool: Arc<dyn Tool>) {
        self.register(tool);
    }

    fn unregister_tool(&self, name: &str) {
        self.unregister(name);
    }

    async fn call_tools(
        &self,
        requests: &[ToolUseRequest],
        _exec: &ExecConfig,
        chunks: Option<ChunkSink>,
    ) -> Result<Vec<ToolResult>> {
        // Dispatched concurrently; results are re-ordered to match `requests`
        // before returning, so conversation replay stays deterministic.
        let futures = requests.iter().map(|req| {
            let tool = self.get_tool(&req.name);
            let chunks = chunks.clone();
            async move {
                match tool {
                    Some(tool) => {
                        if let Some(tx) = &chunks {
                            let _ = tx.send((req.clone(), "started".to_string()));
                        }
                        match tool.execute(req.input.clone()).await {
                            Ok(result) => result,
                            Err(e) => ToolResult::failure(e.to_string()),
                        }
                    }
                    None => ToolResult::failure(format!("unknown tool: {}", req.name)),
                }
            }
        });
        Ok(futures::future::join_all(futures).await)
    }
}

//! Coerces a model into returning a typed result by reusing the
//! tool-calling path instead of parsing free-form text.

use crate::error::Result;
use crate::hooks::{priority, Event, Hook, HookChain};
use crate::message::{ContentBlock, Msg};
use crate::model::ToolChoice as ModelToolChoice;
use crate::toolkit::{Tool, Toolkit};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};

pub const SYNTHETIC_TOOL_NAME: &str = "generate_response";
const REMINDER_ID: &str = "structured-output-reminder";
const REMINDER_TEXT: &str =
    "You must call the `generate_response` function with the required schema to produce your final answer.";

/// How the handler coerces the model into calling the synthetic tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Force `tool_choice=required` targeting the synthetic tool on every call.
    ToolChoice,
    /// Leave tool choice to the model, but inject a reminder each turn
    /// until it complies.
    Reminder,
}

struct GenerateResponseTool {
    schema: Value,
    captured: Arc<Mutex<Option<Value>>>,
}

#[async_trait]
impl Tool for GenerateResponseTool {
    fn name(&self) -> &str {
        SYNTHETIC_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Call this with your final structured response matching the required schema."
    }

    fn parameters_schema(&self) -> Value {
        self.schema.clone()
    }

    async fn execute(&self, args: Value) -> Result<crate::toolkit::ToolResult> {
        *self.captured.lock().expect("lock poisoned") = Some(args);
        Ok(crate::toolkit::ToolResult::success("structured response recorded"))
    }
}

struct ReminderHook {
    captured: Arc<Mutex<Option<Value>>>,
}

#[async_trait]
impl Hook for ReminderHook {
    fn priority(&self) -> i32 {
        priority::SYSTEM
    }

    fn id(&self) -> Option<&str> {
        Some(REMINDER_ID)
    }

    async fn on_event(&self, event: Event) -> Result<Event> {
        match event {
            Event::PreReasoning {
                agent,
                model,
                mut messages,
            } => {
                if self.captured.lock().expect("lock poisoned").is_none() {
                    messages.push(Msg::user("system", REMINDER_TEXT));
                }
                Ok(Event::PreReasoning {
                    agent,
                    model,
                    messages,
                })
            }
            other => Ok(other),
        }
    }
}

/// Coordinates a single `call()`'s attempt to obtain a typed result.
///
/// `prepare` must run before the first iteration and `cleanup` on every
/// exit path, success or failure, so the synthetic tool and reminder hook
/// never leak into the next call.
pub struct StructuredOutputHandler {
    strategy: Strategy,
    captured: Arc<Mutex<Option<Value>>>,
    schema: Value,
}

impl StructuredOutputHandler {
    pub fn new(strategy: Strategy, schema: Value) -> Self {
        StructuredOutputHandler {
            strategy,
            captured: Arc::new(Mutex::new(None)),
            schema,
        }
    }

    pub fn model_tool_choice(&self) -> ModelToolChoice {
        match self.strategy {
            Strategy::ToolChoice => ModelToolChoice::Specific(SYNTHETIC_TOOL_NAME.to_string()),
            Strategy::Reminder => ModelToolChoice::Auto,
        }
    }

    pub fn prepare(&self, toolkit: &dyn Toolkit, hooks: &mut HookChain) {
        toolkit.register_tool(Arc::new(GenerateResponseTool {
            schema: self.schema.clone(),
            captured: self.captured.clone(),
        }));
        if self.strategy == Strategy::Reminder {
            hooks.register(Box::new(ReminderHook {
                captured: self.captured.clone(),
            }));
        }
    }

    pub fn cleanup(&self, toolkit: &dyn Toolkit, hooks: &mut HookChain) {
        toolkit.unregister_tool(SYNTHETIC_TOOL_NAME);
        hooks.unregister(REMINDER_ID);
    }

    pub fn has_result(&self) -> bool {
        self.captured.lock().expect("lock poisoned").is_some()
    }

    /// True when, under the reminder strategy, the model has not yet
    /// called the synthetic tool and the engine should reason again
    /// without acting.
    pub fn needs_retry(&self) -> bool {
        self.strategy == Strategy::Reminder && !self.has_result()
    }

    /// Builds the final assistant message once `has_result()` is true.
    /// Panics if called before a result was captured; callers must check
    /// `has_result()` first.
    pub fn extract_final_result(&self, agent_name: &str) -> Msg {
        let value = self
            .captured
            .lock()
            .expect("lock poisoned")
            .clone()
            .expect("extract_final_result called before has_result()");
        Msg::assistant(
            agent_name,
            vec![ContentBlock::text("Structured response generated.")],
        )
        .with_metadata("structured_output", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolkit::ToolRegistry;

    #[test]
    fn tool_choice_strategy_forces_specific_tool() {
        let handler = StructuredOutputHandler::new(Strategy::ToolChoice, serde_json::json!({}));
        assert_eq!(
            handler.model_tool_choice(),
            ModelToolChoice::Specific(SYNTHETIC_TOOL_NAME.to_string())
        );
    }

    #[test]
    fn reminder_strategy_needs_retry_until_result_captured() {
        let handler = StructuredOutputHandler::new(Strategy::Reminder, serde_json::json!({}));
        assert!(handler.needs_retry());
        *handler.captured.lock().unwrap() = Some(serde_json::json!({"answer": "42"}));
        assert!(!handler.needs_retry());
    }

    #[tokio::test]
    async fn prepare_then_cleanup_removes_synthetic_tool() {
        let toolkit = ToolRegistry::new();
        let mut hooks = HookChain::new();
        let handler =
            StructuredOutputHandler::new(Strategy::Reminder, serde_json::json!({"type": "object"}));
        handler.prepare(&toolkit, &mut hooks);
        assert!(toolkit.get_tool(SYNTHETIC_TOOL_NAME).is_some());
        assert_eq!(hooks.len(), 1);
        handler.cleanup(&toolkit, &mut hooks);
        assert!(toolkit.get_tool(SYNTHETIC_TOOL_NAME).is_none());
        assert_eq!(hooks.len(), 0);
    }

    #[tokio::test]
    async fn calling_synthetic_tool_captures_payload() {
        let toolkit = ToolRegistry::new();
        let mut hooks = HookChain::new();
        let handler =
            StructuredOutputHandler::new(Strategy::ToolChoice, serde_json::json!({"type": "object"}));
        handler.prepare(&toolkit, &mut hooks);
        let tool = toolkit.get_tool(SYNTHETIC_TOOL_NAME).unwrap();
        tool.execute(serde_json::json!({"answer": "42"})).await.unwrap();
        assert!(handler.has_result());
        let msg = handler.extract_final_result("agent");
        assert_eq!(
            msg.metadata.get("structured_output").unwrap(),
            &serde_json::json!({"answer": "42"})
        );
    }
}

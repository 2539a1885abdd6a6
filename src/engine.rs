//! The top-level ReAct loop binding reasoning, acting, summarizing, and
//! structured-output coercion together.

use crate::acting::ActingPipeline;
use crate::error::{Error, Result};
use crate::hooks::HookChain;
use crate::memory::Memory;
use crate::message::{ContentBlock, Msg, Role};
use crate::model::{GenerationOptions, Model};
use crate::reasoning::{build_input, ReasoningPipeline};
use crate::structured_output::{Strategy, StructuredOutputHandler};
use crate::summarizing::SummarizingPipeline;
use crate::toolkit::Toolkit;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const DEFAULT_MAX_ITERS: usize = 10;

/// Configuration fixed at construction time.
pub struct EngineConfig {
    pub max_iters: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_iters: DEFAULT_MAX_ITERS,
        }
    }
}

/// Binds a model, a toolkit, a memory log, and a hook chain into one
/// `call()` entry point implementing the reason/act cycle.
pub struct ReactEngine {
    name: String,
    system_prompt: Option<Msg>,
    model: Arc<dyn Model>,
    toolkit: Arc<dyn Toolkit>,
    memory: Memory,
    hooks: HookChain,
    config: EngineConfig,
}

impl ReactEngine {
    pub fn new(
        name: impl Into<String>,
        system_prompt: Option<String>,
        model: Arc<dyn Model>,
        toolkit: Arc<dyn Toolkit>,
        config: EngineConfig,
    ) -> Self {
        let name = name.into();
        ReactEngine {
            system_prompt: system_prompt.map(|p| Msg::system(&name, p)),
            name,
            model,
            toolkit,
            memory: Memory::new(),
            hooks: HookChain::new(),
            config,
        }
    }

    pub fn register_hook(&mut self, hook: Box<dyn crate::hooks::Hook>) {
        self.hooks.register(hook);
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Appends a message to memory without running the loop.
    pub fn observe(&self, msg: Msg) {
        self.memory.append(msg);
    }

    /// Runs the loop to a final assistant message.
    pub async fn call(&mut self, user_msgs: Vec<Msg>, cancel: &CancellationToken) -> Result<Msg> {
        self.call_inner(user_msgs, None, cancel).await
    }

    /// Runs the loop coercing the model into a typed final result via the
    /// synthetic `generate_response` tool.
    pub async fn call_structured(
        &mut self,
        user_msgs: Vec<Msg>,
        schema: Value,
        strategy: Strategy,
        cancel: &CancellationToken,
    ) -> Result<Msg> {
        let handler = StructuredOutputHandler::new(strategy, schema);
        self.call_inner(user_msgs, Some(handler), cancel).await
    }

    async fn call_inner(
        &mut self,
        user_msgs: Vec<Msg>,
        handler: Option<StructuredOutputHandler>,
        cancel: &CancellationToken,
    ) -> Result<Msg> {
        self.memory.append_all(user_msgs);

        if let Some(h) = &handler {
            h.prepare(self.toolkit.as_ref(), &mut self.hooks);
        }

        let result = self.run_loop(handler.as_ref(), cancel).await;

        if let Some(h) = &handler {
            h.cleanup(self.toolkit.as_ref(), &mut self.hooks);
        }

        result
    }

    async fn run_loop(
        &self,
        handler: Option<&StructuredOutputHandler>,
        cancel: &CancellationToken,
    ) -> Result<Msg> {
        for _iter in 0..self.config.max_iters {
            if cancel.is_cancelled() {
                return Ok(self.interrupt_recovery());
            }

            let mut options = GenerationOptions::default();
            if let Some(h) = handler {
                options.tool_choice = h.model_tool_choice();
            }
            let tools = self.toolkit.get_tool_schemas();
            let input = build_input(self.system_prompt.as_ref(), self.memory.snapshot());

            let pipeline = ReasoningPipeline {
                agent_name: &self.name,
                model: self.model.as_ref(),
                hooks: &self.hooks,
                memory: &self.memory,
            };
            // `pipeline.run` races its own stream against `cancel` internally so
            // that a mid-stream cancellation can salvage the partial message
            // before propagating `Error::Cancelled`; no outer `select!` here.
            let outcome = pipeline.run(input, &tools, &options, cancel).await?;

            let msg = match outcome.message {
                Some(msg) => {
                    self.memory.append(msg.clone());
                    msg
                }
                None => return self.last_or_invariant_violation(),
            };

            if cancel.is_cancelled() {
                return Ok(self.interrupt_recovery());
            }

            let requests = outcome.tool_use_requests;

            let any_registered = requests
                .iter()
                .any(|r| self.toolkit.get_tool(&r.name).is_some());

            if requests.is_empty() {
                if let Some(h) = handler {
                    if h.needs_retry() {
                        continue;
                    }
                }
                return Ok(msg);
            }

            if !any_registered {
                // Every tool-use names an unregistered tool: terminate with the
                // dangling ToolUse intact rather than retrying, even under a
                // structured-output handler that still needs a result.
                return Ok(msg);
            }

            let acting = ActingPipeline {
                agent_name: &self.name,
                toolkit: self.toolkit.as_ref(),
                hooks: &self.hooks,
            };
            let tool_msgs = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(self.interrupt_recovery()),
                r = acting.run(&requests) => r?,
            };
            self.memory.append_all(tool_msgs);

            if let Some(h) = handler {
                if h.has_result() {
                    return Ok(h.extract_final_result(&self.name));
                }
            }
        }

        if handler.is_some() {
            return Err(Error::StructuredOutputBudgetExceeded(self.config.max_iters));
        }

        let summarizer = SummarizingPipeline {
            agent_name: &self.name,
            model: self.model.as_ref(),
        };
        let msg = summarizer
            .run(self.memory.snapshot(), self.config.max_iters)
            .await;
        self.memory.append(msg.clone());
        Ok(msg)
    }

    fn interrupt_recovery(&self) -> Msg {
        let msg = Msg::assistant(
            &self.name,
            vec![ContentBlock::text(
                "I noticed that you have interrupted me. Stopping here.",
            )],
        );
        self.memory.append(msg.clone());
        msg
    }

    fn last_or_invariant_violation(&self) -> Result<Msg> {
        self.memory
            .snapshot()
            .into_iter()
            .rev()
            .find(|msg| msg.role == Role::Assistant)
            .ok_or_else(|| {
                Error::InvariantViolation(
                    "reasoning produced nothing and no prior assistant message exists".into(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::mock::ScriptedModel;
    use crate::model::ChatResponse;
    use crate::toolkit::{Tool, ToolRegistry, ToolResult};
    use async_trait::async_trait;

    struct AddTool;

    #[async_trait]
    impl Tool for AddTool {
        fn name(&self) -> &str {
            "add"
        }
        fn description(&self) -> &str {
            "adds two numbers"
        }
        fn parameters_schema(&self) -> Value {
            serde_json::json!({"type": "object"})
        }
        async fn execute(&self, args: Value) -> Result<ToolResult> {
            let a = args.get("a").and_then(|v| v.as_i64()).unwrap_or(0);
            let b = args.get("b").and_then(|v| v.as_i64()).unwrap_or(0);
            Ok(ToolResult::success((a + b).to_string()))
        }
    }

    #[tokio::test]
    async fn single_tool_round_trip() {
        let model = ScriptedModel::new(vec![
            vec![ChatResponse {
                id: "c1".into(),
                content: vec![ContentBlock::tool_use(
                    "t1",
                    "add",
                    serde_json::json!({"a": 2, "b": 3}),
                )],
                usage: None,
                finish_reason: Some("tool_calls".into()),
            }],
            vec![ChatResponse {
                id: "c2".into(),
                content: vec![ContentBlock::text("The answer is 5.")],
                usage: None,
                finish_reason: Some("stop".into()),
            }],
        ]);
        let toolkit = ToolRegistry::new();
        toolkit.register(Arc::new(AddTool));
        let mut engine = ReactEngine::new(
            "agent",
            None,
            Arc::new(model),
            Arc::new(toolkit),
            EngineConfig::default(),
        );
        let cancel = CancellationToken::new();
        let result = engine
            .call(vec![Msg::user("user", "what is 2+3?")], &cancel)
            .await
            .unwrap();
        assert_eq!(result.text(), "The answer is 5.");
        let snapshot = engine.memory().snapshot();
        // user, assistant(tool_use), tool(result), assistant(text)
        assert_eq!(snapshot.len(), 4);
    }

    #[tokio::test]
    async fn max_iters_triggers_summarization() {
        let looping_call = || {
            vec![ChatResponse {
                id: "c".into(),
                content: vec![ContentBlock::tool_use(
                    "t1",
                    "add",
                    serde_json::json!({"a": 1, "b": 1}),
                )],
                usage: None,
                finish_reason: Some("tool_calls".into()),
            }]
        };
        let model = ScriptedModel::new(vec![
            looping_call(),
            looping_call(),
            vec![ChatResponse {
                id: "s".into(),
                content: vec![ContentBlock::text("Summary: reached the limit.")],
                usage: None,
                finish_reason: Some("stop".into()),
            }],
        ]);
        let toolkit = ToolRegistry::new();
        toolkit.register(Arc::new(AddTool));
        let mut engine = ReactEngine::new(
            "agent",
            None,
            Arc::new(model),
            Arc::new(toolkit),
            EngineConfig { max_iters: 2 },
        );
        let cancel = CancellationToken::new();
        let result = engine
            .call(vec![Msg::user("user", "loop forever")], &cancel)
            .await
            .unwrap();
        assert!(result.text().starts_with("Summary:"));
    }

    #[tokio::test]
    async fn structured_output_via_tool_choice() {
        let model = ScriptedModel::new(vec![vec![ChatResponse {
            id: "c1".into(),
            content: vec![ContentBlock::tool_use(
                "t1",
                "generate_response",
                serde_json::json!({"answer": "42"}),
            )],
            usage: None,
            finish_reason: Some("tool_calls".into()),
        }]]);
        let toolkit = Arc::new(ToolRegistry::new());
        let mut engine = ReactEngine::new(
            "agent",
            None,
            Arc::new(model),
            toolkit.clone(),
            EngineConfig::default(),
        );
        let cancel = CancellationToken::new();
        let result = engine
            .call_structured(
                vec![Msg::user("user", "what is the answer?")],
                serde_json::json!({"type": "object", "properties": {"answer": {"type": "string"}}}),
                Strategy::ToolChoice,
                &cancel,
            )
            .await
            .unwrap();
        assert_eq!(
            result.metadata.get("structured_output").unwrap(),
            &serde_json::json!({"answer": "42"})
        );
        assert!(toolkit
            .get_tool(crate::structured_output::SYNTHETIC_TOOL_NAME)
            .is_none());
    }

    #[tokio::test]
    async fn structured_output_via_reminder_retries_until_tool_called() {
        let model = ScriptedModel::new(vec![
            vec![ChatResponse {
                id: "c1".into(),
                content: vec![ContentBlock::text("Let me think about that first.")],
                usage: None,
                finish_reason: Some("stop".into()),
            }],
            vec![ChatResponse {
                id: "c2".into(),
                content: vec![ContentBlock::tool_use(
                    "t1",
                    "generate_response",
                    serde_json::json!({"answer": "42"}),
                )],
                usage: None,
                finish_reason: Some("tool_calls".into()),
            }],
        ]);
        let toolkit = Arc::new(ToolRegistry::new());
        let mut engine = ReactEngine::new(
            "agent",
            None,
            Arc::new(model),
            toolkit.clone(),
            EngineConfig::default(),
        );
        let cancel = CancellationToken::new();
        let result = engine
            .call_structured(
                vec![Msg::user("user", "what is the answer?")],
                serde_json::json!({"type": "object", "properties": {"answer": {"type": "string"}}}),
                Strategy::Reminder,
                &cancel,
            )
            .await
            .unwrap();
        assert_eq!(
            result.metadata.get("structured_output").unwrap(),
            &serde_json::json!({"answer": "42"})
        );
        assert!(toolkit
            .get_tool(crate::structured_output::SYNTHETIC_TOOL_NAME)
            .is_none());
    }

    #[tokio::test]
    async fn unregistered_tool_call_terminates_even_under_reminder_retry() {
        let model = ScriptedModel::new(vec![vec![ChatResponse {
            id: "c1".into(),
            content: vec![ContentBlock::tool_use("t1", "does_not_exist", serde_json::json!({}))],
            usage: None,
            finish_reason: Some("tool_calls".into()),
        }]]);
        let toolkit = Arc::new(ToolRegistry::new());
        let mut engine = ReactEngine::new(
            "agent",
            None,
            Arc::new(model),
            toolkit.clone(),
            EngineConfig::default(),
        );
        let cancel = CancellationToken::new();
        // Reminder strategy: without the termination fix this would retry
        // forever since `needs_retry()` is true until `generate_response` is
        // captured, even though the model never names a registered tool.
        let result = engine
            .call_structured(
                vec![Msg::user("user", "what is the answer?")],
                serde_json::json!({"type": "object"}),
                Strategy::Reminder,
                &cancel,
            )
            .await
            .unwrap();
        assert_eq!(result.tool_uses()[0].1, "does_not_exist");
    }

    #[tokio::test]
    async fn no_prior_assistant_message_is_invariant_violation() {
        let model = ScriptedModel::new(vec![vec![]]);
        let toolkit = ToolRegistry::new();
        let mut engine = ReactEngine::new(
            "agent",
            None,
            Arc::new(model),
            Arc::new(toolkit),
            EngineConfig::default(),
        );
        let cancel = CancellationToken::new();
        let result = engine.call(vec![Msg::user("user", "hi")], &cancel).await;
        assert!(matches!(result, Err(Error::InvariantViolation(_))));
    }

    #[tokio::test]
    async fn cancellation_before_first_iteration_runs_no_model_call() {
        let model = ScriptedModel::new(vec![vec![ChatResponse {
            id: "c1".into(),
            content: vec![ContentBlock::text("should not run")],
            usage: None,
            finish_reason: Some("stop".into()),
        }]]);
        let toolkit = ToolRegistry::new();
        let mut engine = ReactEngine::new(
            "agent",
            None,
            Arc::new(model),
            Arc::new(toolkit),
            EngineConfig::default(),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = engine
            .call(vec![Msg::user("user", "hi")], &cancel)
            .await
            .unwrap();
        assert!(result.text().contains("interrupted"));
    }
}

//! The acting pipeline: dispatches tool-use blocks and folds results back
//! into memory in call order.

use crate::error::Result;
use crate::hooks::{Event, HookChain};
use crate::message::Msg;
use crate::toolkit::{ExecConfig, ToolUseRequest, Toolkit};

pub struct ActingPipeline<'a> {
    pub agent_name: &'a str,
    pub toolkit: &'a dyn Toolkit,
    pub hooks: &'a HookChain,
}

impl<'a> ActingPipeline<'a> {
    /// Runs every requested tool call and returns one tool-role `Msg` per
    /// result, in the same order as `requests` regardless of completion
    /// order.
    pub async fn run(&self, requests: &[ToolUseRequest]) -> Result<Vec<Msg>> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let agent_name = self.agent_name.to_string();
        let drain = async {
            while let Some((tool_use, partial)) = rx.recv().await {
                let _ = self
                    .hooks
                    .dispatch(Event::ActingChunk {
                        agent: agent_name.clone(),
                        tool_use,
                        partial,
                    })
                    .await;
            }
        };

        let call = self.toolkit.call_tools(requests, &ExecConfig::default(), Some(tx));
        let (results, _) = futures::future::join(call, drain).await;
        let results = results?;

        let mut messages = Vec::with_capacity(requests.len());
        for (req, result) in requests.iter().zip(results.into_iter()) {
            let post = self
                .hooks
                .dispatch(Event::PostActing {
                    agent: self.agent_name.to_string(),
                    tool_use: req.clone(),
                    result: result.clone(),
                })
                .await?;
            let result = match post {
                Event::PostActing { result, .. } => result,
                _ => unreachable!("PostActing dispatch must return PostActing"),
            };
            messages.push(Msg::tool(self.agent_name, result.into_block(req.id.clone())));
        }

        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::HookChain;
    use crate::toolkit::{Tool, ToolRegistry, ToolResult};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Arc;

    struct SlowThenFast;

    #[async_trait]
    impl Tool for SlowThenFast {
        fn name(&self) -> &str {
            "weather"
        }
        fn description(&self) -> &str {
            "stub weather tool"
        }
        fn parameters_schema(&self) -> Value {
            serde_json::json!({"type": "object"})
        }
        async fn execute(&self, args: Value) -> crate::error::Result<ToolResult> {
            let city = args.get("city").and_then(|v| v.as_str()).unwrap_or("?");
            if city == "NYC" {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
            Ok(ToolResult::success(format!("weather for {}", city)))
        }
    }

    #[tokio::test]
    async fn results_appended_in_call_order_not_completion_order() {
        let toolkit = ToolRegistry::new();
        toolkit.register(Arc::new(SlowThenFast));
        let hooks = HookChain::new();
        let pipeline = ActingPipeline {
            agent_name: "agent",
            toolkit: &toolkit,
            hooks: &hooks,
        };
        let requests = vec![
            ToolUseRequest {
                id: "t1".into(),
                name: "weather".into(),
                input: serde_json::json!({"city": "NYC"}),
            },
            ToolUseRequest {
                id: "t2".into(),
                name: "weather".into(),
                input: serde_json::json!({"city": "SF"}),
            },
        ];
        let messages = pipeline.run(&requests).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].text().contains("NYC"));
        assert!(messages[1].text().contains("SF"));
    }

    #[tokio::test]
    async fn empty_requests_yield_no_messages() {
        let toolkit = ToolRegistry::new();
        let hooks = HookChain::new();
        let pipeline = ActingPipeline {
            agent_name: "agent",
            toolkit: &toolkit,
            hooks: &hooks,
        };
        assert!(pipeline.run(&[]).await.unwrap().is_empty());
    }
}

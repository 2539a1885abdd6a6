//! One-shot terminal pass run when the engine exhausts its iteration budget
//! without a structured-output handler active.

use crate::error::Result;
use crate::message::Msg;
use crate::model::{GenerationOptions, Model};
use futures::StreamExt;

const SUMMARY_HINT: &str =
    "You have failed to generate response within the maximum iterations. \
     Now respond directly by summarizing the current situation.";

pub struct SummarizingPipeline<'a> {
    pub agent_name: &'a str,
    pub model: &'a dyn Model,
}

impl<'a> SummarizingPipeline<'a> {
    /// Runs a single tool-free reasoning pass over `memory_snapshot` plus a
    /// synthetic hint message. Errors are swallowed into a fallback
    /// assistant message rather than propagated.
    pub async fn run(&self, memory_snapshot: Vec<Msg>, max_iters: usize) -> Msg {
        let mut messages = memory_snapshot;
        messages.push(Msg::user("system", SUMMARY_HINT));

        match self.try_summarize(&messages).await {
            Ok(Some(msg)) => msg,
            Ok(None) => Msg::assistant(
                self.agent_name,
                vec![crate::message::ContentBlock::text(format!(
                    "Maximum iterations ({}) reached. Unable to generate summary.",
                    max_iters
                ))],
            ),
            Err(e) => Msg::assistant(
                self.agent_name,
                vec![crate::message::ContentBlock::text(format!(
                    "Maximum iterations ({}) reached. Error generating summary: {}",
                    max_iters, e
                ))],
            ),
        }
    }

    async fn try_summarize(&self, messages: &[Msg]) -> Result<Option<Msg>> {
        let mut stream = self
            .model
            .stream(messages, &[], &GenerationOptions::default())
            .await?;

        let mut ctx = crate::reasoning::ReasoningContext::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            for block in &chunk.content {
                ctx.absorb(block);
            }
        }
        Ok(ctx.build_message(self.agent_name))
    }
}

//! The reasoning pipeline: streams a model call and accumulates it into a
//! single assistant [`Msg`].

use crate::error::{Error, Result};
use crate::hooks::{Event, HookChain};
use crate::memory::Memory;
use crate::message::{ContentBlock, Msg, Role};
use crate::model::{GenerationOptions, Model, ToolSchema};
use crate::toolkit::ToolUseRequest;
use futures::StreamExt;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

/// Per-turn transient accumulator for streamed reasoning chunks.
///
/// Text and thinking deltas concatenate; `ToolUse` blocks are deduped by id
/// and kept in first-sighting order, since a tool call can arrive in more
/// than one chunk before its arguments are complete.
#[derive(Debug, Default)]
pub struct ReasoningContext {
    text: String,
    thinking: String,
    tool_uses: Vec<ContentBlock>,
    tool_use_index: HashMap<String, usize>,
}

impl ReasoningContext {
    pub fn new() -> Self {
        ReasoningContext::default()
    }

    pub fn absorb(&mut self, block: &ContentBlock) {
        match block {
            ContentBlock::Text { text } => self.text.push_str(text),
            ContentBlock::Thinking { thinking } => self.thinking.push_str(thinking),
            ContentBlock::ToolUse { id, name, input } => {
                if let Some(&idx) = self.tool_use_index.get(id) {
                    self.tool_uses[idx] = ContentBlock::ToolUse {
                        id: id.clone(),
                        name: name.clone(),
                        input: input.clone(),
                    };
                } else {
                    self.tool_use_index.insert(id.clone(), self.tool_uses.len());
                    self.tool_uses.push(block.clone());
                }
            }
            ContentBlock::ToolResult { .. } => {
                // A model never streams tool results; ignore defensively.
            }
        }
    }

    pub fn accumulated_text(&self) -> &str {
        &self.text
    }

    pub fn accumulated_thinking(&self) -> &str {
        &self.thinking
    }

    /// Canonical order: thinking, then text (if any), then tool uses in
    /// arrival order.
    pub fn build_message(&self, name: &str) -> Option<Msg> {
        let mut content = Vec::new();
        if !self.thinking.is_empty() {
            content.push(ContentBlock::thinking(self.thinking.clone()));
        }
        if !self.text.is_empty() {
            content.push(ContentBlock::text(self.text.clone()));
        }
        content.extend(self.tool_uses.iter().cloned());
        if content.is_empty() {
            None
        } else {
            Some(Msg::assistant(name, content))
        }
    }
}

/// Result of one reasoning turn.
pub struct ReasoningOutcome {
    pub message: Option<Msg>,
    /// The tool-use requests named in `message`, after each has passed
    /// through `PreActing` dispatch. A hook that rewrites a `tool_use`'s
    /// name or input here changes what the acting pipeline actually runs,
    /// even though the rewrite is never reflected back into `message`/memory.
    pub tool_use_requests: Vec<ToolUseRequest>,
}

/// Runs one reasoning turn: PreReasoning -> stream -> chunk hooks ->
/// PostReasoning -> PreActing announcements, appending the final message
/// to memory.
pub struct ReasoningPipeline<'a> {
    pub agent_name: &'a str,
    pub model: &'a dyn Model,
    pub hooks: &'a HookChain,
    pub memory: &'a Memory,
}

impl<'a> ReasoningPipeline<'a> {
    pub async fn run(
        &self,
        input_messages: Vec<Msg>,
        tools: &[ToolSchema],
        options: &GenerationOptions,
        cancel: &CancellationToken,
    ) -> Result<ReasoningOutcome> {
        let pre = self
            .hooks
            .dispatch(Event::PreReasoning {
                agent: self.agent_name.to_string(),
                model: self.model.id().to_string(),
                messages: input_messages,
            })
            .await?;
        let messages = match pre {
            Event::PreReasoning { messages, .. } => messages,
            _ => unreachable!("PreReasoning dispatch must return PreReasoning"),
        };

        let mut stream = self.model.stream(&messages, tools, options).await?;
        let mut ctx = ReasoningContext::new();

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return self.salvage_on_cancel(&ctx).await,
                next = stream.next() => next,
            };
            let chunk = match next {
                Some(chunk) => chunk?,
                None => break,
            };
            for block in &chunk.content {
                ctx.absorb(block);
                match block {
                    ContentBlock::Text { text } => {
                        self.hooks
                            .dispatch(Event::ReasoningChunk {
                                agent: self.agent_name.to_string(),
                                incremental: text.clone(),
                                accumulated: ctx.accumulated_text().to_string(),
                            })
                            .await?;
                    }
                    ContentBlock::Thinking { thinking } => {
                        self.hooks
                            .dispatch(Event::ReasoningChunk {
                                agent: self.agent_name.to_string(),
                                incremental: thinking.clone(),
                                accumulated: ctx.accumulated_thinking().to_string(),
                            })
                            .await?;
                    }
                    _ => {}
                }
            }
        }

        let final_msg = ctx.build_message(self.agent_name);
        let (final_msg, tool_use_requests) = match final_msg {
            Some(msg) => {
                let post = self
                    .hooks
                    .dispatch(Event::PostReasoning {
                        agent: self.agent_name.to_string(),
                        message: msg,
                    })
                    .await?;
                let msg = match post {
                    Event::PostReasoning { message, .. } => message,
                    _ => unreachable!("PostReasoning dispatch must return PostReasoning"),
                };

                let mut tool_use_requests = Vec::new();
                for (id, name, input) in msg.tool_uses() {
                    let pre_acting = self
                        .hooks
                        .dispatch(Event::PreActing {
                            agent: self.agent_name.to_string(),
                            tool_use: ToolUseRequest {
                                id: id.to_string(),
                                name: name.to_string(),
                                input: input.clone(),
                            },
                        })
                        .await?;
                    let tool_use = match pre_acting {
                        Event::PreActing { tool_use, .. } => tool_use,
                        _ => unreachable!("PreActing dispatch must return PreActing"),
                    };
                    tool_use_requests.push(tool_use);
                }

                (Some(msg), tool_use_requests)
            }
            None => (None, Vec::new()),
        };

        Ok(ReasoningOutcome {
            message: final_msg,
            tool_use_requests,
        })
    }

    /// Cancellation observed while the stream was still producing chunks:
    /// salvage whatever was accumulated into a message, still emit
    /// `PostReasoning` over it, append it to memory, then propagate the
    /// cancellation rather than silently returning it as a successful turn.
    async fn salvage_on_cancel(&self, ctx: &ReasoningContext) -> Result<ReasoningOutcome> {
        if let Some(msg) = ctx.build_message(self.agent_name) {
            let post = self
                .hooks
                .dispatch(Event::PostReasoning {
                    agent: self.agent_name.to_string(),
                    message: msg,
                })
                .await?;
            let msg = match post {
                Event::PostReasoning { message, .. } => message,
                _ => unreachable!("PostReasoning dispatch must return PostReasoning"),
            };
            self.memory.append(msg);
        }
        Err(Error::Cancelled)
    }
}

/// Builds the message list handed to `Model::stream`: an optional system
/// message followed by a snapshot of memory.
pub fn build_input(system_prompt: Option<&Msg>, memory_snapshot: Vec<Msg>) -> Vec<Msg> {
    let mut messages = Vec::with_capacity(memory_snapshot.len() + 1);
    if let Some(system) = system_prompt {
        messages.push(system.clone());
    }
    messages.extend(memory_snapshot);
    messages
}

pub fn is_assistant(msg: &Msg) -> bool {
    msg.role == Role::Assistant
}

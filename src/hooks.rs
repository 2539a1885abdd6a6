//! The hook chain: priority-ordered middleware dispatched around each phase.

use crate::error::{Error, Result};
use crate::message::Msg;
use crate::toolkit::{ToolResult, ToolUseRequest};
use async_trait::async_trait;

/// Suggested priority bands, lowest runs first.
pub mod priority {
    pub const SYSTEM: i32 = 0;
    pub const VALIDATION: i32 = 51;
    pub const BUSINESS: i32 = 101;
    pub const OBSERVABILITY: i32 = 501;
}

/// The six event kinds the engine dispatches. Pre/Post events carry a
/// mutable payload; Chunk events are notification-only.
#[derive(Debug, Clone)]
pub enum Event {
    PreReasoning { agent: String, model: String, messages: Vec<Msg> },
    ReasoningChunk { agent: String, incremental: String, accumulated: String },
    PostReasoning { agent: String, message: Msg },
    PreActing { agent: String, tool_use: ToolUseRequest },
    ActingChunk { agent: String, tool_use: ToolUseRequest, partial: String },
    PostActing { agent: String, tool_use: ToolUseRequest, result: ToolResult },
}

/// A single hook in the chain.
///
/// Pre/Post handlers return the (possibly rewritten) event; returning an
/// error aborts the remainder of the chain for this dispatch.
#[async_trait]
pub trait Hook: Send + Sync {
    /// Lower values run first.
    fn priority(&self) -> i32 {
        priority::BUSINESS
    }

    /// Stable name used by `HookChain::unregister`. Hooks installed for the
    /// lifetime of the whole agent can leave this `None`.
    fn id(&self) -> Option<&str> {
        None
    }

    async fn on_event(&self, event: Event) -> Result<Event>;
}

/// Ordered collection of hooks, dispatched as a sequential fold.
pub struct HookChain {
    hooks: Vec<Box<dyn Hook>>,
}

impl HookChain {
    pub fn new() -> Self {
        HookChain { hooks: Vec::new() }
    }

    pub fn register(&mut self, hook: Box<dyn Hook>) {
        let pos = self
            .hooks
            .iter()
            .position(|h| h.priority() > hook.priority())
            .unwrap_or(self.hooks.len());
        self.hooks.insert(pos, hook);
    }

    /// Fold every hook over `event` in priority order. A hook error aborts
    /// the fold immediately.
    pub async fn dispatch(&self, mut event: Event) -> Result<Event> {
        for hook in &self.hooks {
            event = hook
                .on_event(event)
                .await
                .map_err(|e| Error::Hook(e.to_string()))?;
        }
        Ok(event)
    }

    /// Removes every hook whose `id()` matches, e.g. a structured-output
    /// reminder installed for the duration of one call.
    pub fn unregister(&mut self, id: &str) {
        self.hooks.retain(|h| h.id() != Some(id));
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl Default for HookChain {
    fn default() -> Self {
        HookChain::new()
    }
}

/// A hook that returns its input unchanged; used to verify hook dispatch is
/// a no-op when no hook actually rewrites anything.
pub struct IdentityHook(pub i32);

#[async_trait]
impl Hook for IdentityHook {
    fn priority(&self) -> i32 {
        self.0
    }

    async fn on_event(&self, event: Event) -> Result<Event> {
        Ok(event)
    }
}

//! Detects a tool call repeating the same result several times in a row
//! and nudges the model with a one-shot reminder instead of looping
//! forever.

use crate::error::Result;
use crate::hooks::{priority, Event, Hook};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

const DEFAULT_THRESHOLD: usize = 3;
const SNIPPET_LEN: usize = 160;

/// A `PostActing` hook: tracks the last few (tool name, result snippet)
/// pairs and, once the same pair repeats `threshold` times in a row,
/// records an intervention hint for the next reasoning turn.
pub struct LoopGuardHook {
    threshold: usize,
    recent: Mutex<VecDeque<(String, String)>>,
    hint: Mutex<Option<String>>,
}

impl LoopGuardHook {
    pub fn new(threshold: usize) -> Self {
        LoopGuardHook {
            threshold,
            recent: Mutex::new(VecDeque::with_capacity(threshold)),
            hint: Mutex::new(None),
        }
    }

    fn snippet(text: &str) -> String {
        if text.len() > SNIPPET_LEN {
            text[..SNIPPET_LEN].to_string()
        } else {
            text.to_string()
        }
    }

    fn record(&self, tool_name: &str, result: &str) -> Option<String> {
        let entry = (tool_name.to_string(), Self::snippet(result));
        let mut recent = self.recent.lock().expect("lock poisoned");
        recent.push_back(entry.clone());
        while recent.len() > self.threshold {
            recent.pop_front();
        }
        let repeated = recent.len() == self.threshold && recent.iter().all(|e| *e == entry);
        if repeated {
            recent.clear();
            Some(format!(
                "The tool `{}` has returned the same result {} times in a row. \
                 Consider a different approach instead of repeating the call.",
                tool_name, self.threshold
            ))
        } else {
            None
        }
    }
}

impl Default for LoopGuardHook {
    fn default() -> Self {
        LoopGuardHook::new(DEFAULT_THRESHOLD)
    }
}

#[async_trait]
impl Hook for LoopGuardHook {
    fn priority(&self) -> i32 {
        priority::OBSERVABILITY
    }

    async fn on_event(&self, event: Event) -> Result<Event> {
        match &event {
            Event::PostActing { tool_use, result, .. } => {
                if let Some(hint) = self.record(&tool_use.name, &result.content) {
                    *self.hint.lock().expect("lock poisoned") = Some(hint);
                }
                Ok(event)
            }
            Event::PreReasoning { agent, model, messages } => {
                let mut hint_slot = self.hint.lock().expect("lock poisoned");
                if let Some(hint) = hint_slot.take() {
                    let mut messages = messages.clone();
                    messages.push(crate::message::Msg::user("system", hint));
                    Ok(Event::PreReasoning {
                        agent: agent.clone(),
                        model: model.clone(),
                        messages,
                    })
                } else {
                    Ok(event)
                }
            }
            _ => Ok(event),
        }
    }
}

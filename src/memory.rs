//! Append-only conversation log.

use crate::message::Msg;
use std::sync::RwLock;

/// Append-only ordered message log with snapshot reads.
///
/// Memory never mutates or deduplicates entries; `observe` and the
/// pipelines only ever append.
pub struct Memory {
    entries: RwLock<Vec<Msg>>,
}

impl Memory {
    pub fn new() -> Self {
        Memory {
            entries: RwLock::new(Vec::new()),
        }
    }

    pub fn from_messages(messages: Vec<Msg>) -> Self {
        Memory {
            entries: RwLock::new(messages),
        }
    }

    pub fn append(&self, msg: Msg) {
        self.entries.write().expect("memory lock poisoned").push(msg);
    }

    pub fn append_all(&self, msgs: impl IntoIterator<Item = Msg>) {
        let mut guard = self.entries.write().expect("memory lock poisoned");
        guard.extend(msgs);
    }

    /// A point-in-time copy of the log.
    pub fn snapshot(&self) -> Vec<Msg> {
        self.entries.read().expect("memory lock poisoned").clone()
    }

    pub fn last(&self) -> Option<Msg> {
        self.entries.read().expect("memory lock poisoned").last().cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("memory lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Memory {
    fn default() -> Self {
        Memory::new()
    }
}

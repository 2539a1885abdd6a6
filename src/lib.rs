//! # react-agent
//!
//! A ReAct (reason-act) agent runtime: an engine that alternates between
//! streaming LLM reasoning and tool-calling acting phases until the model
//! stops calling tools, an iteration budget is exhausted, or the caller
//! cancels.
//!
//! The core (`message`, `memory`, `model`, `toolkit`, `hooks`, `reasoning`,
//! `acting`, `summarizing`, `structured_output`, `engine`) depends on
//! nothing but abstract `Model`/`Toolkit` traits. `tools` holds concrete,
//! swappable example implementations of those traits. `providers` is an
//! optional example `Model` behind the `rig-provider` feature, not part of
//! the core's public contract.

pub mod acting;
pub mod config;
pub mod engine;
pub mod error;
pub mod hooks;
pub mod loop_guard;
pub mod memory;
pub mod message;
pub mod model;
#[cfg(feature = "rig-provider")]
pub mod providers;
pub mod reasoning;
pub mod structured_output;
pub mod summarizing;
pub mod toolkit;
pub mod tools;

pub use engine::{EngineConfig, ReactEngine};
pub use error::{Error, Result};
pub use hooks::{Event, Hook, HookChain};
pub use memory::Memory;
pub use message::{ContentBlock, Msg, Role};
pub use model::{ChatResponse, GenerationOptions, Model, ToolSchema};
pub use toolkit::{Tool, ToolRegistry, ToolResult, Toolkit};

/// Crate version, from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

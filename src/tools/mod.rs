//! Example tools demonstrating the [`crate::toolkit::Tool`] trait.
//!
//! Register these (or your own) into a [`crate::toolkit::ToolRegistry`] and
//! hand it to a [`crate::engine::ReactEngine`].

mod read_file;
mod write_file;

pub use read_file::ReadFileTool;
pub use write_file::WriteFileTool;

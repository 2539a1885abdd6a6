//! Concrete `Model` implementations. None of these are depended on by the
//! core engine; they exist to show how a real provider plugs in.

pub mod rig_provider;

pub use rig_provider::RigOpenRouterModel;

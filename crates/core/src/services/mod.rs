//! Pass orchestration on top of the engine modules.

pub mod analysis;

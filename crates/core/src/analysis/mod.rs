//! Call graph construction and field requirement resolution.

pub mod call_graph;
pub mod requirements;

pub use call_graph::{CallEdge, CallGraph, MethodNode};
pub use requirements::{
    CalledAggregateMethod, CallerRequirements, RequiredFieldsRecord, RequirementResolver,
};

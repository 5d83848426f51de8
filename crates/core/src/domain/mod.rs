//! Domain Type Classifier and Repository-to-Aggregate Resolver.

pub mod classifier;
pub mod naming;
pub mod repository;

pub use classifier::{Classification, DomainIndex, DomainTypeTag};
pub use repository::{IdentificationMethod, RepositoryEvidence, RepositoryIndex, RepositoryInfo};

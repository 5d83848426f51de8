//! fieldscope-core
//!
//! Static analysis of compiled JVM classes for partial aggregate hydration.
//!
//! The crate decodes class files into an immutable model, classifies domain
//! types and repositories, builds a whole-program call graph, and computes for
//! every repository call site the aggregate-root fields it actually needs.
//!
//! All substantive logic lives here so it is fully testable and reusable from
//! frontends other than the bundled CLI.

pub mod model;
pub mod classfile;
pub mod config;
pub mod domain;
pub mod analysis;
pub mod report;
pub mod services;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub mod analyze;
pub mod config;
pub mod inspect;

pub use analyze::*;
pub use config::*;
pub use inspect::*;

//! Subcommand implementations.

pub mod classify;
pub mod extract;

pub use classify::ClassifyArgs;
pub use extract::ExtractArgs;

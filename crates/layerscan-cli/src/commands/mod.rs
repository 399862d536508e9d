//! Subcommand implementations.

pub mod completion;
pub mod fs;
pub mod layer;

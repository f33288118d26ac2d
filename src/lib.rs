//! Bookshelf application library
//!
//! Provides the book record module and the bootstrap used by the CLI.

pub mod app;
pub mod modules;

/// Re-export commonly used types
pub use modules::*;

//! # Error Handling
//!
//! Error types for the stack builder. Every fatal condition aborts the build for the
//! whole group; nothing is retried here.

pub mod types;

pub use types::{ResolverSource, Result, StackError};

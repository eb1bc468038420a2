//! # Observability Infrastructure
//!
//! Structured logging for stack builds.

pub mod logging;

pub use logging::init_logging;

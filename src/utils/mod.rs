//! The `utils` module provides shared definitions used by both programs:
//! the crate-wide error type and logging initialisation.

pub mod error;
pub mod logging;

pub use error::{Error, Result};

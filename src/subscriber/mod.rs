//! The subscriber program: log every message received on one topic filter.

pub mod manager;

pub use manager::{SUBSCRIPTION, log_handler, run_subscriber};

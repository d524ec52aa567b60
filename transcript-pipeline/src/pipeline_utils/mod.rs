//! Shared building blocks for pipeline stages
//!
//! - **json**: JSON extraction from model output and artifact formatting
//! - **fanout**: bounded-concurrency fan-out that keeps input order
//! - **stage**: stage-level progress logging

pub mod fanout;
pub mod json;
pub mod stage;

pub use fanout::{execute_ordered, TaskContext};
pub use json::{extract_json, to_pretty_json};
pub use stage::run_stage;

//! Pipeline orchestrator
//!
//! - **state**: typed per-file progress through the five stages
//! - **aggregate**: combining per-batch results
//! - **orchestrator**: sequencing stages and files, persisting artifacts
//! - **status**: reporting on already-processed files

pub mod aggregate;
pub mod orchestrator;
pub mod state;
pub mod status;

pub use aggregate::{combine_analyses, combine_segmentations};
pub use orchestrator::{FailedFile, Mode, Orchestrator, RunSummary};
pub use state::PipelineState;
pub use status::{collect_status, StatusEntry};

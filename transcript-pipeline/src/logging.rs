//! Tracing subscriber setup
//!
//! Filters with `RUST_LOG` when set; otherwise the crate logs at INFO together
//! with the `pipeline_event` progress target. Output goes to stderr so stdout
//! stays free for command output.

use tracing_subscriber::EnvFilter;

use transcript_pipeline_sdk::EVENT_TARGET;

fn default_filter() -> EnvFilter {
    EnvFilter::new(format!("transcript_pipeline=info,{}=info", EVENT_TARGET))
}

/// Initialize the global tracing subscriber; later calls are no-ops
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter());

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

/*
  Raw transcript ({raw_dir}/{source}/{raw_file})
    │
    ├─> Split into batches of batch_size tokens
    │
    ├─ run: five-stage pipeline
    │    ├─> segment_transcript                       one call per batch, combined
    │    ├─> open_coding                              one call per segment
    │    ├─> clustering_and_thematic_analysis         one call
    │    ├─> affinity_mapping_and_persona_development one call
    │    └─> validate_and_document                    one call (terminal)
    │
    └─ analyze: single pass
         └─> analysis                                 one call per batch, combined (terminal)

  Every artifact lands at {output_dir}/{artifact}/{source}-{raw_file}. Files whose
  terminal artifact exists are skipped.

EXAMPLE COMMANDS:

  # Every raw youtube transcript through all five stages
  transcript-pipeline run --source youtube

  # Two reddit threads, single-pass analysis, with retries
  transcript-pipeline analyze --source reddit --files t3abc,t3xyz --max-attempts 3

  # What has been processed so far
  transcript-pipeline status --source youtube
*/

use clap::Parser;
use transcript_pipeline::cli::{self, Args};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    transcript_pipeline::logging::init();

    let args = Args::parse();
    cli::run(args).await
}

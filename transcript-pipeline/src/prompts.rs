//! Instructions sent with every stage call

use crate::schema::Stage;

const RESEARCHER: &str = "You are a qualitative research expert with a focus on developer and devops productivity.";

/// System instructions for a stage
pub fn system_prompt(stage: Stage) -> String {
    let task = match stage {
        Stage::Segmentation => {
            r#"Segment the transcript into coherent, self-contained sections.

For each segment give:
- title: a short topic label
- content: the verbatim text of the segment
- main_idea: one sentence stating the point the speaker is making

Also give a summary of the whole transcript batch."#
        }
        Stage::OpenCoding => {
            r#"Perform open coding on the transcript segment.

- Pull out the significant excerpts (key phrases and quotes) verbatim
- Assign each excerpt a short, descriptive code
- List every distinct code you used in all_codes"#
        }
        Stage::ThematicAnalysis => {
            r#"Cluster the codes from the open coding results and develop themes.

- Group related codes into clusters and name each cluster
- Group related clusters into themes and name each theme
- Every code should appear in at least one cluster"#
        }
        Stage::AffinityMapping => {
            r#"Build an affinity map from the themes and clusters, then develop personas.

- Describe the relationships between themes in relationships
- Develop personas grounded in the data: background, goals, motivations,
  needs, challenges, behaviors, attitudes, and relevant quotes"#
        }
        Stage::Validation => {
            r#"Validate the personas against the clusters they were derived from and document the findings.

- Propose refinements where a persona is not supported by the clusters
- Summarize key findings, insights, and recommendations"#
        }
        Stage::Analysis => {
            "Extract key phrases, quotes, keywords, context, and group them into suitable themes with codes."
        }
    };

    format!("{} {}", RESEARCHER, task)
}

/// User message wrapping a stage's input
pub fn user_prompt(stage: Stage, input: &str) -> String {
    match stage {
        Stage::Segmentation | Stage::Analysis => format!("Here is the transcript: {}", input),
        Stage::OpenCoding => format!("Here is the transcript segment: {}", input),
        Stage::ThematicAnalysis => format!("Here are the open coding results: {}", input),
        Stage::AffinityMapping => format!("Here are the themes and clusters: {}", input),
        Stage::Validation => format!("Here are the personas and clusters: {}", input),
    }
}

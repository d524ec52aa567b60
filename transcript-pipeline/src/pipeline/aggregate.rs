//! Combining per-batch results into one result per file
//!
//! List fields are concatenated in batch order without deduplication.

use crate::schema::{Analysis, Segmentation};

/// Concatenate segments in batch order and join summaries with a blank line
pub fn combine_segmentations(parts: Vec<Segmentation>) -> Segmentation {
    let mut summaries = Vec::with_capacity(parts.len());
    let mut segments = Vec::new();

    for part in parts {
        summaries.push(part.summary);
        segments.extend(part.segments);
    }

    Segmentation {
        summary: summaries.join("\n\n"),
        segments,
    }
}

/// Concatenate codes, keywords and quotes in batch order
pub fn combine_analyses(parts: Vec<Analysis>) -> Analysis {
    parts.into_iter().fold(Analysis::default(), |mut combined, part| {
        combined.codes.extend(part.codes);
        combined.keywords.extend(part.keywords);
        combined.quotes.extend(part.quotes);
        combined
    })
}

//! Token-bounded batch splitting for long transcripts
//!
//! Tokens are whitespace-delimited words. Batches partition the token sequence
//! exactly, in order, without overlap; each batch is its tokens joined by single
//! spaces, so the only information lost is the original whitespace runs.

use std::str::SplitWhitespace;

/// Default number of tokens per model call
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Lazy iterator over the batches of one transcript
///
/// A clone taken before iterating replays the same batches.
#[derive(Debug, Clone)]
pub struct Batches<'a> {
    tokens: SplitWhitespace<'a>,
    batch_size: usize,
}

impl Iterator for Batches<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let mut batch = String::new();
        for (taken, token) in (&mut self.tokens).enumerate() {
            if taken > 0 {
                batch.push(' ');
            }
            batch.push_str(token);
            if taken + 1 == self.batch_size {
                break;
            }
        }

        if batch.is_empty() {
            None
        } else {
            Some(batch)
        }
    }
}

/// Split `text` into batches of at most `batch_size` tokens
///
/// A `batch_size` of zero is treated as one token per batch; configuration
/// validation rejects it before it reaches here.
pub fn split(text: &str, batch_size: usize) -> Batches<'_> {
    Batches {
        tokens: text.split_whitespace(),
        batch_size: batch_size.max(1),
    }
}

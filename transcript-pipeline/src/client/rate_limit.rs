use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{ModelClient, ModelRequest};
use crate::error::{PipelineError, Result};

/// At most `calls` model calls in any window of `period_secs`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimit {
    pub calls: usize,
    pub period_secs: u64,
}

/// Delays callers until a slot opens in the sliding window; never drops a call
pub struct RateLimitedClient<C> {
    inner: C,
    calls: usize,
    period: Duration,
    window: Mutex<VecDeque<Instant>>,
}

impl<C: ModelClient> RateLimitedClient<C> {
    pub fn new(inner: C, limit: RateLimit) -> Result<Self> {
        if limit.calls == 0 || limit.period_secs == 0 {
            return Err(PipelineError::Config(
                "rate_limit.calls and rate_limit.period_secs must be positive".to_string(),
            ));
        }

        Ok(Self {
            inner,
            calls: limit.calls,
            period: Duration::from_secs(limit.period_secs),
            window: Mutex::new(VecDeque::with_capacity(limit.calls)),
        })
    }

    async fn acquire_slot(&self) {
        let mut window = self.window.lock().await;
        loop {
            let now = Instant::now();
            while window
                .front()
                .is_some_and(|started| now.duration_since(*started) >= self.period)
            {
                window.pop_front();
            }

            if window.len() < self.calls {
                window.push_back(now);
                return;
            }

            if let Some(oldest) = window.front().copied() {
                let wait = self.period.saturating_sub(now.duration_since(oldest));
                tracing::debug!(wait_ms = wait.as_millis() as u64, "rate limit reached, waiting");
                tokio::time::sleep(wait).await;
            }
        }
    }
}

#[async_trait]
impl<C: ModelClient> ModelClient for RateLimitedClient<C> {
    async fn complete(&self, request: &ModelRequest) -> Result<String> {
        self.acquire_slot().await;
        self.inner.complete(request).await
    }
}

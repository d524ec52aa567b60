//! Bounded-concurrency fan-out for independent model calls

use futures::{stream::FuturesUnordered, Future, StreamExt};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::error::{PipelineError, Result};

/// Context provided to each task in a fan-out
#[derive(Debug, Clone, Copy)]
pub struct TaskContext {
    /// Task number (1-indexed for display)
    pub task_number: usize,
    /// Total number of tasks in this fan-out
    pub total_tasks: usize,
}

/// Execute items with at most `concurrency` tasks in flight
///
/// # Returns
/// Results in input order, regardless of completion order
///
/// # Error Handling
/// Fails fast - the first error is returned and remaining tasks are dropped
///
/// # Example
/// ```rust,ignore
/// let codings = execute_ordered(segments, 1, move |segment, ctx| {
///     let executor = executor.clone();
///     async move { executor.execute::<OpenCoding>(&segment, &identity).await }
/// })
/// .await?;
/// ```
pub async fn execute_ordered<T, F, Fut, R>(
    items: Vec<T>,
    concurrency: usize,
    task_executor: F,
) -> Result<Vec<R>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T, TaskContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
{
    let total = items.len();
    let sem = Arc::new(Semaphore::new(concurrency.max(1)));
    let executor = Arc::new(task_executor);
    let mut tasks = FuturesUnordered::new();

    for (idx, item) in items.into_iter().enumerate() {
        let sem = sem.clone();
        let executor = executor.clone();

        let ctx = TaskContext {
            task_number: idx + 1,
            total_tasks: total,
        };

        tasks.push(async move {
            // Acquire permit (blocks while `concurrency` tasks are running)
            let _permit = sem
                .acquire()
                .await
                .map_err(|_| PipelineError::ModelCall("fan-out semaphore closed".to_string()))?;

            executor(item, ctx).await.map(|result| (idx, result))
        });
    }

    let mut slots: Vec<Option<R>> = (0..total).map(|_| None).collect();
    while let Some(result) = tasks.next().await {
        let (idx, value) = result?;
        slots[idx] = Some(value);
    }

    Ok(slots.into_iter().flatten().collect())
}

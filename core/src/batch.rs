use crate::models::{BatchOutcome, BatchReport, BatchStatus};
use crate::throttle::Throttle;
use log::{info, warn};
use std::fmt::Display;
use std::future::Future;

/// Service cap for saving tracks and following artists in one request.
pub const LIBRARY_BATCH_SIZE: usize = 50;
/// Service cap for adding items to a playlist in one request.
pub const PLAYLIST_BATCH_SIZE: usize = 100;

/// Issues one remote write per fixed-size chunk, in order.
///
/// A failed chunk is logged and recorded, then the next chunk is attempted.
/// Nothing is retried. The throttle runs after every chunk, failed or not.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchWriter {
    throttle: Throttle,
}

impl BatchWriter {
    pub fn new(throttle: Throttle) -> Self {
        Self { throttle }
    }

    pub async fn write<'c, T, E, F, Fut>(
        &self,
        label: &str,
        items: &'c [T],
        batch_size: usize,
        mut write: F,
    ) -> BatchReport
    where
        F: FnMut(&'c [T]) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Display,
    {
        let batch_size = batch_size.max(1);
        let total = items.len().div_ceil(batch_size);
        let mut report = BatchReport::new();

        for (i, chunk) in items.chunks(batch_size).enumerate() {
            let status = match write(chunk).await {
                Ok(()) => {
                    info!("{}: batch {}/{} done ({} items)", label, i + 1, total, chunk.len());
                    BatchStatus::Success
                }
                Err(e) => {
                    warn!("{}: batch {}/{} failed: {}", label, i + 1, total, e);
                    BatchStatus::Failed(e.to_string())
                }
            };
            report.push(BatchOutcome {
                batch_index: i,
                items_count: chunk.len(),
                status,
            });
            self.throttle.wait().await;
        }

        report
    }
}

//! Batch conversion of independent documents.
//!
//! Documents run concurrently inside a semaphore window and never share
//! state; one document's failure cannot abort the batch. Each document gets
//! a bounded number of retries with linear backoff, except for failure modes
//! that are terminal by contract (timeout, invalid input). Results come back
//! in input order regardless of completion order.

use crate::core::config::BatchConfig;
use crate::core::orchestrator::Converter;
use crate::types::BatchItem;
use crate::DeckbridgeError;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Convert a set of documents, at most `batch.effective_concurrency()` at a
/// time, returning one [`BatchItem`] per source in input order.
pub async fn convert_batch(converter: &Arc<Converter>, sources: &[PathBuf]) -> Vec<BatchItem> {
    let batch = converter.config().batch.clone();
    let semaphore = Arc::new(Semaphore::new(batch.effective_concurrency()));

    let mut tasks = JoinSet::new();
    for (index, source) in sources.iter().cloned().enumerate() {
        let converter = Arc::clone(converter);
        let semaphore = Arc::clone(&semaphore);
        let batch = batch.clone();
        tasks.spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    return (
                        index,
                        BatchItem {
                            source,
                            attempts: 0,
                            outcome: Err(DeckbridgeError::Other("batch semaphore closed".to_string())),
                        },
                    );
                }
            };
            let item = convert_with_retries(&converter, source, &batch).await;
            (index, item)
        });
    }

    let mut indexed = Vec::with_capacity(sources.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(pair) => indexed.push(pair),
            Err(e) => warn!(error = %e, "batch task panicked"),
        }
    }
    indexed.sort_by_key(|(index, _)| *index);

    let items: Vec<BatchItem> = indexed.into_iter().map(|(_, item)| item).collect();
    let failed = items.iter().filter(|i| i.outcome.is_err()).count();
    info!(total = items.len(), failed, "batch conversion complete");
    items
}

async fn convert_with_retries(converter: &Converter, source: PathBuf, batch: &BatchConfig) -> BatchItem {
    let mut attempts: u32 = 0;
    loop {
        attempts += 1;
        match converter.convert_to_schema(&source).await {
            Ok(output) => {
                return BatchItem {
                    source,
                    attempts,
                    outcome: Ok(output),
                };
            }
            Err(e) => {
                // Timeout and invalid input are terminal: retrying cannot
                // change the outcome.
                let retryable = !matches!(
                    e,
                    DeckbridgeError::Timeout { .. } | DeckbridgeError::InvalidInput(_)
                );
                if retryable && attempts <= batch.max_retries {
                    let delay_ms = batch.retry_backoff_ms * u64::from(attempts);
                    warn!(
                        source = %source.display(),
                        attempt = attempts,
                        delay_ms,
                        error = %e,
                        "conversion failed; retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    continue;
                }
                return BatchItem {
                    source,
                    attempts,
                    outcome: Err(e),
                };
            }
        }
    }
}

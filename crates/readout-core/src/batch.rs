//! Concurrent extraction over many documents.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::error::{ReadoutError, Result};
use crate::models::reading::ExtractionResult;
use crate::pipeline::ExtractionPipeline;

/// Result or error for one document of a batch.
#[derive(Debug)]
pub struct DocumentOutcome {
    /// Input path.
    pub path: PathBuf,
    /// Extraction result, or why this document failed.
    pub result: Result<ExtractionResult>,
    /// Wall time spent on this document, including waiting for the engine lock.
    pub processing_time_ms: u64,
}

impl DocumentOutcome {
    /// Whether the document was processed without error.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Extract every document in `paths` with at most `jobs` in flight.
///
/// Outcomes come back in input order. A failing document never affects its
/// siblings.
pub async fn extract_all(
    pipeline: Arc<ExtractionPipeline>,
    paths: Vec<PathBuf>,
    jobs: usize,
) -> Vec<DocumentOutcome> {
    extract_all_with_progress(pipeline, paths, jobs, |_| {}).await
}

/// Like [`extract_all`], calling `on_done` as each document finishes.
pub async fn extract_all_with_progress<F>(
    pipeline: Arc<ExtractionPipeline>,
    paths: Vec<PathBuf>,
    jobs: usize,
    on_done: F,
) -> Vec<DocumentOutcome>
where
    F: Fn(&DocumentOutcome) + Send + Sync + 'static,
{
    let jobs = jobs.max(1);
    debug!("Extracting {} documents with {} workers", paths.len(), jobs);

    let semaphore = Arc::new(Semaphore::new(jobs));
    let on_done = Arc::new(on_done);
    let mut handles = Vec::with_capacity(paths.len());

    for path in paths {
        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .expect("batch semaphore is never closed");
        let pipeline = Arc::clone(&pipeline);
        let on_done = Arc::clone(&on_done);
        let task_path = path.clone();

        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let start = Instant::now();
            let result = pipeline.extract(&task_path);
            let outcome = DocumentOutcome {
                path: task_path,
                result,
                processing_time_ms: start.elapsed().as_millis() as u64,
            };
            on_done(&outcome);
            outcome
        });
        handles.push((path, handle));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for (path, handle) in handles {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Worker for {} did not finish: {}", path.display(), e);
                DocumentOutcome {
                    path,
                    result: Err(ReadoutError::Worker(e.to_string())),
                    processing_time_ms: 0,
                }
            }
        };
        outcomes.push(outcome);
    }

    outcomes
}

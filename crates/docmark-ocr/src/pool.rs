//! Bounded worker pool that runs the recognizer over every page of a document.
//!
//! Up to `concurrency` blocking OCR calls run at once on tokio's blocking pool.
//! Pages are collected as they finish, so a slow page never idles the other
//! workers, and are then put back into input order. The first failing page
//! aborts the batch.
use futures::stream::{self, StreamExt, TryStreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use docmark_core::error::{Error, Result};
use docmark_core::traits::TextRecognizer;

/// Emitted once per page as soon as its extraction completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageProgress {
    pub page_index: usize,
    pub filename: String,
    pub completed: usize,
    pub total: usize,
}

pub trait ExtractionObserver: Send + Sync {
    fn page_done(&self, progress: &PageProgress);
}

pub struct TextExtractor {
    recognizer: Arc<dyn TextRecognizer>,
    concurrency: usize,
    observer: Option<Arc<dyn ExtractionObserver>>,
    show_progress: bool,
}

impl TextExtractor {
    pub fn new(recognizer: Arc<dyn TextRecognizer>, concurrency: usize) -> Self {
        Self { recognizer, concurrency: concurrency.max(1), observer: None, show_progress: false }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ExtractionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Draw an indicatif bar on stderr while the batch runs.
    pub fn with_progress_bar(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn concurrency(&self) -> usize { self.concurrency }

    /// Extract one space-joined text per filename, index-aligned with `filenames`.
    pub async fn extract(&self, root: &Path, filenames: &[String]) -> Result<Vec<String>> {
        let total = filenames.len();
        tracing::info!(pages = total, workers = self.concurrency, root = %root.display(), "extracting page text");
        let pb = if self.show_progress { ProgressBar::new(total as u64) } else { ProgressBar::hidden() };
        if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages ({percent}%) {msg}") {
            pb.set_style(style.progress_chars("#>-"));
        }
        let completed = AtomicUsize::new(0);

        let texts = stream::iter(filenames.iter().enumerate())
            .map(|(page_index, filename)| {
                let recognizer = Arc::clone(&self.recognizer);
                let path = root.join(filename);
                let (pb, completed) = (&pb, &completed);
                async move {
                    let joined = tokio::task::spawn_blocking(move || recognizer.recognize(&path)).await;
                    let lines = match joined {
                        Ok(Ok(lines)) => lines,
                        Ok(Err(source)) => return Err(Error::ExtractionFailure { page_index, filename: filename.clone(), source }),
                        Err(join) => {
                            return Err(Error::ExtractionFailure { page_index, filename: filename.clone(), source: anyhow::anyhow!("OCR worker panicked: {join}") })
                        }
                    };
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    tracing::info!("{} processed", filename);
                    pb.inc(1);
                    pb.set_message(filename.clone());
                    if let Some(observer) = &self.observer {
                        observer.page_done(&PageProgress { page_index, filename: filename.clone(), completed: done, total });
                    }
                    Ok((page_index, lines.join(" ")))
                }
            })
            .buffer_unordered(self.concurrency)
            .try_collect::<Vec<(usize, String)>>()
            .await
            .map(|mut done| {
                done.sort_unstable_by_key(|(page_index, _)| *page_index);
                done.into_iter().map(|(_, text)| text).collect::<Vec<String>>()
            });

        match &texts {
            Ok(_) => pb.finish_with_message("done"),
            Err(e) => {
                pb.abandon_with_message("failed");
                tracing::error!(error = %e, "text extraction aborted");
            }
        }
        texts
    }
}

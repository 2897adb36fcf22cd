//! One document job from image directory to persisted, dispatched Document.
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use walkdir::WalkDir;

use docmark_core::assembler::{assemble, page_records};
use docmark_core::bookmarks::aggregate;
use docmark_core::config::{resolve_with_base, Settings};
use docmark_core::dates::{annotate, DateStages};
use docmark_core::error::{Error, Result};
use docmark_core::ordering::{order_pages, NamingConvention};
use docmark_core::traits::{BookmarkPredictor, DocumentStore, Notifier, TextRecognizer};
use docmark_core::types::{DateAnnotation, Document, DocumentMeta, PageRow, Provenance};
use docmark_ocr::{ExtractionObserver, TextExtractor};

use crate::dispatch::{dispatch, Effect};
use crate::retry::{error_chain, run_with_retry, RetryPolicy};

/// External services a run talks to, constructed once by the caller.
#[derive(Clone)]
pub struct Collaborators {
    pub recognizer: Arc<dyn TextRecognizer>,
    pub predictor: Arc<dyn BookmarkPredictor>,
    pub dates: Arc<dyn DateStages>,
    pub store: Arc<dyn DocumentStore>,
    pub notifier: Arc<dyn Notifier>,
}

#[derive(Debug, Clone)]
pub struct DocumentJob {
    /// Directory of page images, relative to `PipelineOptions::images_root`.
    pub images_path: String,
    pub meta: DocumentMeta,
    /// Submit results when set, otherwise request image cleanup.
    pub send_results: bool,
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub images_root: PathBuf,
    pub concurrency: usize,
    pub naming: NamingConvention,
    pub provenance: Provenance,
    pub retry: RetryPolicy,
    pub show_progress: bool,
}

impl PipelineOptions {
    /// Options from loaded settings; relative paths are resolved against `base`.
    pub fn from_settings(settings: &Settings, base: &Path) -> Self {
        Self {
            images_root: resolve_with_base(base, &settings.paths.local_images_dir),
            concurrency: settings.pipeline.processes_count,
            naming: NamingConvention::from(&settings.naming),
            provenance: Provenance {
                created_by: settings.store.created_by_tag.clone(),
                store_only_document: settings.store.store_only_document,
            },
            retry: RetryPolicy::from(&settings.retry),
            show_progress: false,
        }
    }
}

pub struct DocumentPipeline {
    collaborators: Collaborators,
    options: PipelineOptions,
    observer: Option<Arc<dyn ExtractionObserver>>,
    active: Mutex<HashSet<String>>,
}

/// Holds a document id in the active set until dropped.
struct ActiveRun<'a> {
    active: &'a Mutex<HashSet<String>>,
    document_id: String,
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        self.active.lock().unwrap_or_else(PoisonError::into_inner).remove(&self.document_id);
    }
}

impl DocumentPipeline {
    pub fn new(collaborators: Collaborators, options: PipelineOptions) -> Self {
        Self { collaborators, options, observer: None, active: Mutex::new(HashSet::new()) }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ExtractionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn options(&self) -> &PipelineOptions { &self.options }

    fn claim(&self, document_id: &str) -> Result<ActiveRun<'_>> {
        let mut set = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if !set.insert(document_id.to_string()) {
            return Err(Error::AlreadyRunning(document_id.to_string()));
        }
        Ok(ActiveRun { active: &self.active, document_id: document_id.to_string() })
    }

    /// Run `job` under the retry policy. Only one run per document id may be active.
    pub async fn run(&self, job: &DocumentJob) -> Result<Document> {
        let _guard = self.claim(&job.meta.document_id)?;
        run_with_retry(&self.options.retry, &job.meta.document_id, |attempt| {
            tracing::info!(document_id = %job.meta.document_id, attempt, "starting pipeline attempt");
            self.run_once(job)
        })
        .await
    }

    /// A single attempt: list, order, extract, annotate, predict, assemble, persist, dispatch.
    pub async fn run_once(&self, job: &DocumentJob) -> Result<Document> {
        let dir = self.options.images_root.join(&job.images_path);
        let filenames = list_images(&dir)?;
        tracing::info!(document_id = %job.meta.document_id, dir = %dir.display(), pages = filenames.len(), "listed page images");

        let ordered = order_pages(filenames, &self.options.naming)?;
        let ordered_names: Vec<String> = ordered.iter().map(|p| p.filename.clone()).collect();

        let mut extractor = TextExtractor::new(Arc::clone(&self.collaborators.recognizer), self.options.concurrency)
            .with_progress_bar(self.options.show_progress);
        if let Some(observer) = &self.observer {
            extractor = extractor.with_observer(Arc::clone(observer));
        }
        let texts = extractor.extract(&dir, &ordered_names).await?;
        let records = page_records(&ordered, texts)?;

        let dates: Vec<DateAnnotation> = records.iter().map(|r| annotate(self.collaborators.dates.as_ref(), &r.text)).collect();
        let rows: Vec<PageRow> = records
            .iter()
            .zip(&dates)
            .map(|(r, d)| PageRow {
                page_index: r.page_index,
                provider: job.meta.provider.clone(),
                document_id: job.meta.document_id.clone(),
                text: r.text.clone(),
                dates: d.clone(),
            })
            .collect();

        let predictions = self.collaborators.predictor.predict(&rows).map_err(Error::Prediction)?;
        let bookmarks = aggregate(&predictions, &dates)?;
        let document = assemble(job.meta.clone(), records, dates, bookmarks)?;
        tracing::info!(document_id = %document.document_id(), pages = document.page_count(), "document assembled");

        self.collaborators.store.save(&document, &self.options.provenance).await.map_err(Error::Persistence)?;
        tracing::info!(document_id = %document.document_id(), "document persisted");

        let effect = Effect::for_job(job.send_results);
        if let Err(err) = dispatch(self.collaborators.notifier.as_ref(), effect, &document).await {
            tracing::warn!(document_id = %document.document_id(), ?effect, error = %error_chain(&err), "notification failed");
        }
        Ok(document)
    }
}

/// Page filenames directly under `dir`, in whatever order the filesystem yields.
///
/// Only hidden files and `<page>.txt` OCR sidecars are skipped. Every other
/// regular file is a page candidate, so a stray name fails page ordering
/// instead of silently shifting the page indices after it.
pub fn list_images(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
            let source = e.into_io_error().unwrap_or_else(|| std::io::Error::other("directory walk failed"));
            Error::Io { path, source }
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            tracing::debug!(file = %name, "skipping hidden file");
            continue;
        }
        if is_sidecar(dir, &name) {
            continue;
        }
        names.push(name);
    }
    Ok(names)
}

/// `<page>.txt` next to an existing `<page>` file.
fn is_sidecar(dir: &Path, name: &str) -> bool {
    name.len() > 4
        && name.is_char_boundary(name.len() - 4)
        && name[name.len() - 4..].eq_ignore_ascii_case(".txt")
        && dir.join(&name[..name.len() - 4]).is_file()
}

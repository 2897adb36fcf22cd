//! Seams to the external collaborators of the pipeline.
//!
//! Each collaborator is constructed once and handed to the pipeline explicitly;
//! nothing here is reached through global state.
use async_trait::async_trait;
use std::path::Path;

use crate::types::{Document, PageRow, Prediction, Provenance};

/// Optical text recognition over a single page image.
pub trait TextRecognizer: Send + Sync {
    /// Recognized lines of `image_path`, in reading order.
    fn recognize(&self, image_path: &Path) -> anyhow::Result<Vec<String>>;
}

/// Per-page bookmark label prediction.
pub trait BookmarkPredictor: Send + Sync {
    /// One prediction set per input row, index-aligned with `rows`.
    fn predict(&self, rows: &[PageRow]) -> anyhow::Result<Vec<Vec<Prediction>>>;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn save(&self, document: &Document, provenance: &Provenance) -> anyhow::Result<()>;
}

/// Outbound notifications. Exactly one of the two calls is made per run.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn submit_results(&self, document: &Document) -> anyhow::Result<()>;
    async fn request_cleanup(&self, document_id: &str) -> anyhow::Result<()>;
}

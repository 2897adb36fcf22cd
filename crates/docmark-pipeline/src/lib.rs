//! Document pipeline: orders page images, extracts their text in parallel,
//! annotates dates, predicts bookmarks, assembles and persists a Document and
//! finally dispatches one notification. Whole runs are retried per [`RetryPolicy`].
#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_imports)]

pub mod dispatch;
pub mod pipeline;
pub mod retry;

pub use dispatch::{dispatch, Effect};
pub use pipeline::{list_images, Collaborators, DocumentJob, DocumentPipeline, PipelineOptions};
pub use retry::{run_with_retry, Backoff, RetryPolicy};

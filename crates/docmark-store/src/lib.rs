//! LanceDB persistence for assembled documents.
//!
//! `documents` keeps one metadata row per document (upserted on
//! `document_id`); `pages` and `bookmarks` hold the full content and are
//! replaced wholesale on every full save.
pub mod schema;
pub mod table;
pub mod writer;

pub use writer::{DocumentRow, LanceDocumentStore};

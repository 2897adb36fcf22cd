//! LanceDB connection and housekeeping helpers.
//!
//! Provides the database open function, ensure-* helpers for the three
//! document tables and small filter/column utilities shared by the writer.
use anyhow::{anyhow, Result};
use arrow_array::{Array, RecordBatch, RecordBatchIterator};
use lancedb::{connect, Connection};
use std::sync::Arc;

use crate::schema::{build_bookmarks_schema, build_documents_schema, build_pages_schema, BOOKMARKS_TABLE, DOCUMENTS_TABLE, PAGES_TABLE};

pub async fn open_db(uri: &str) -> Result<Connection> {
    Ok(connect(uri).execute().await?)
}

pub async fn ensure_table(conn: &Connection, name: &str, schema: Arc<arrow_schema::Schema>) -> Result<()> {
    let names = conn.table_names().execute().await?;
    if names.contains(&name.to_string()) {
        return Ok(());
    }
    // create empty table with 0 rows
    let iter = RecordBatchIterator::new(vec![].into_iter(), schema.clone());
    conn.create_table(name, Box::new(iter)).execute().await?;
    tracing::debug!(table = name, "created table");
    Ok(())
}

pub async fn ensure_document_tables(conn: &Connection) -> Result<()> {
    ensure_table(conn, DOCUMENTS_TABLE, build_documents_schema()).await?;
    ensure_table(conn, PAGES_TABLE, build_pages_schema()).await?;
    ensure_table(conn, BOOKMARKS_TABLE, build_bookmarks_schema()).await
}

pub async fn count_rows(conn: &Connection, table: &str, filter: Option<String>) -> Result<usize> {
    let names = conn.table_names().execute().await?;
    if !names.contains(&table.to_string()) { return Ok(0); }
    let t = conn.open_table(table).execute().await?;
    Ok(t.count_rows(filter).await?)
}

pub fn document_filter(document_id: &str) -> String {
    format!("document_id = '{}'", document_id.replace('\'', "''"))
}

pub(crate) fn column<'a, T: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| anyhow!("{} column missing or mistyped", name))
}

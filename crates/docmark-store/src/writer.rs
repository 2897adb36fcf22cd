use anyhow::{anyhow, Result};
use arrow_array::builder::{ListBuilder, StringBuilder};
use arrow_array::{
	Array, BooleanArray, Float32Array, Int32Array, ListArray, RecordBatch, RecordBatchIterator, StringArray,
	TimestampMillisecondArray,
};
use async_trait::async_trait;
use chrono::Utc;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::Connection;
use std::collections::BTreeMap;
use std::sync::Arc;

use docmark_core::assembler::DocumentBuilder;
use docmark_core::traits::DocumentStore;
use docmark_core::types::{BookmarkCandidate, Document, DocumentMeta, PageBookmarks, Provenance};

use crate::schema::{build_bookmarks_schema, build_documents_schema, build_pages_schema, BOOKMARKS_TABLE, DOCUMENTS_TABLE, PAGES_TABLE};
use crate::table::{column, document_filter, ensure_document_tables, open_db};

/// Metadata row of a stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRow {
	pub meta: DocumentMeta,
	pub page_count: usize,
	pub created_by: String,
	pub store_only_document: bool,
	pub created_at_ms: i64,
}

pub struct LanceDocumentStore { pub(crate) db: Connection }

impl LanceDocumentStore {
	pub async fn open(uri: &str) -> Result<Self> {
		let db = open_db(uri).await?;
		ensure_document_tables(&db).await?;
		Ok(Self { db })
	}

	pub fn connection(&self) -> &Connection { &self.db }

	/// Write `document`. A full save replaces the document's page and bookmark
	/// rows, so saving the same document again leaves one copy.
	pub async fn write(&self, document: &Document, provenance: &Provenance) -> Result<()> {
		let filter = document_filter(document.document_id());
		self.upsert_document_row(document, provenance).await?;
		if provenance.store_only_document {
			tracing::info!(document_id = document.document_id(), "stored document metadata only");
			return Ok(());
		}
		let pages = self.db.open_table(PAGES_TABLE).execute().await?;
		pages.delete(&filter).await?;
		if document.page_count() > 0 {
			let batch = pages_to_record_batch(document)?;
			let schema = batch.schema();
			pages.add(Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema))).execute().await?;
		}
		let bookmarks = self.db.open_table(BOOKMARKS_TABLE).execute().await?;
		bookmarks.delete(&filter).await?;
		if !document.bookmarks().is_empty() {
			let batch = bookmarks_to_record_batch(document)?;
			let schema = batch.schema();
			bookmarks.add(Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema))).execute().await?;
		}
		tracing::info!(document_id = document.document_id(), pages = document.page_count(), created_by = %provenance.created_by, "stored document");
		Ok(())
	}

	async fn upsert_document_row(&self, document: &Document, provenance: &Provenance) -> Result<()> {
		let t = self.db.open_table(DOCUMENTS_TABLE).execute().await?;
		let rb = RecordBatch::try_new(
			build_documents_schema(),
			vec![
				Arc::new(StringArray::from(vec![document.document_id().to_string()])),
				Arc::new(StringArray::from(vec![document.cclr_id().to_string()])),
				Arc::new(StringArray::from(vec![document.provider().to_string()])),
				Arc::new(Int32Array::from(vec![document.page_count() as i32])),
				Arc::new(StringArray::from(vec![provenance.created_by.clone()])),
				Arc::new(BooleanArray::from(vec![provenance.store_only_document])),
				Arc::new(TimestampMillisecondArray::from(vec![Utc::now().timestamp_millis()])),
			],
		)?;
		let reader = Box::new(RecordBatchIterator::new(vec![Ok(rb)].into_iter(), build_documents_schema()));
		// Upsert behavior via merge_insert: document_id is unique
		let mut mi = t.merge_insert(&["document_id"]);
		mi.when_matched_update_all(None).when_not_matched_insert_all();
		let _ = mi.execute(reader).await?;
		Ok(())
	}

	pub async fn document_row(&self, document_id: &str) -> Result<Option<DocumentRow>> {
		let t = self.db.open_table(DOCUMENTS_TABLE).execute().await?;
		let mut stream = t.query().only_if(document_filter(document_id)).execute().await?;
		while let Some(batch) = futures::TryStreamExt::try_next(&mut stream).await? {
			if batch.num_rows() == 0 { continue; }
			return Ok(Some(DocumentRow {
				meta: DocumentMeta {
					document_id: column::<StringArray>(&batch, "document_id")?.value(0).to_string(),
					cclr_id: column::<StringArray>(&batch, "cclr_id")?.value(0).to_string(),
					provider: column::<StringArray>(&batch, "provider")?.value(0).to_string(),
				},
				page_count: column::<Int32Array>(&batch, "page_count")?.value(0) as usize,
				created_by: column::<StringArray>(&batch, "created_by")?.value(0).to_string(),
				store_only_document: column::<BooleanArray>(&batch, "store_only_document")?.value(0),
				created_at_ms: column::<TimestampMillisecondArray>(&batch, "created_at")?.value(0),
			}));
		}
		Ok(None)
	}

	/// Read a fully stored document back. `None` when the document is unknown
	/// or was stored as metadata only.
	pub async fn load_document(&self, document_id: &str) -> Result<Option<Document>> {
		let Some(row) = self.document_row(document_id).await? else { return Ok(None) };
		if row.store_only_document { return Ok(None); }
		let filter = document_filter(document_id);

		let mut texts: BTreeMap<usize, String> = BTreeMap::new();
		let pages = self.db.open_table(PAGES_TABLE).execute().await?;
		let mut stream = pages.query().only_if(filter.clone()).execute().await?;
		while let Some(batch) = futures::TryStreamExt::try_next(&mut stream).await? {
			let idx = column::<Int32Array>(&batch, "page_index")?;
			let text = column::<StringArray>(&batch, "text")?;
			for i in 0..batch.num_rows() { texts.insert(idx.value(i) as usize, text.value(i).to_string()); }
		}

		let mut ranked: BTreeMap<(usize, i32), BookmarkCandidate> = BTreeMap::new();
		let bookmarks = self.db.open_table(BOOKMARKS_TABLE).execute().await?;
		let mut stream = bookmarks.query().only_if(filter).execute().await?;
		while let Some(batch) = futures::TryStreamExt::try_next(&mut stream).await? {
			let idx = column::<Int32Array>(&batch, "page_index")?;
			let rank = column::<Int32Array>(&batch, "rank")?;
			let levels = column::<ListArray>(&batch, "levels")?;
			let dates = column::<ListArray>(&batch, "dates")?;
			let score = column::<Float32Array>(&batch, "confidence_score")?;
			for i in 0..batch.num_rows() {
				let candidate = BookmarkCandidate { levels: list_strings(levels, i)?, dates: list_strings(dates, i)?, confidence_score: score.value(i) };
				ranked.insert((idx.value(i) as usize, rank.value(i)), candidate);
			}
		}
		let mut page_bookmarks = PageBookmarks::new();
		for ((page_index, _), candidate) in ranked { page_bookmarks.push(page_index, candidate); }

		let document = DocumentBuilder::new(row.meta, row.page_count)
			.texts(texts.into_values().collect())
			.bookmarks(page_bookmarks)
			.build()?;
		Ok(Some(document))
	}
}

#[async_trait]
impl DocumentStore for LanceDocumentStore {
	async fn save(&self, document: &Document, provenance: &Provenance) -> Result<()> {
		self.write(document, provenance).await
	}
}

fn list_strings(list: &ListArray, i: usize) -> Result<Vec<String>> {
	if list.is_null(i) { return Ok(Vec::new()); }
	let values = list.value(i);
	let strings = values.as_any().downcast_ref::<StringArray>().ok_or_else(|| anyhow!("list values are not strings"))?;
	Ok(strings.iter().flatten().map(str::to_string).collect())
}

fn pages_to_record_batch(document: &Document) -> Result<RecordBatch> {
	let n = document.page_count();
	let record_batch = RecordBatch::try_new(build_pages_schema(), vec![
		Arc::new(StringArray::from(vec![document.document_id().to_string(); n])),
		Arc::new(Int32Array::from((0..n as i32).collect::<Vec<_>>())),
		Arc::new(StringArray::from(document.texts().to_vec())),
	])?;
	Ok(record_batch)
}

fn bookmarks_to_record_batch(document: &Document) -> Result<RecordBatch> {
	let mut doc_ids = Vec::new(); let mut page_indices = Vec::new(); let mut ranks = Vec::new(); let mut scores = Vec::new();
	let mut levels = ListBuilder::new(StringBuilder::new());
	let mut dates = ListBuilder::new(StringBuilder::new());
	for (page_index, candidates) in document.bookmarks().iter() {
		for (rank, c) in candidates.iter().enumerate() {
			doc_ids.push(document.document_id().to_string()); page_indices.push(page_index as i32); ranks.push(rank as i32); scores.push(c.confidence_score);
			for level in &c.levels { levels.values().append_value(level); }
			levels.append(true);
			for date in &c.dates { dates.values().append_value(date); }
			dates.append(true);
		}
	}
	let record_batch = RecordBatch::try_new(build_bookmarks_schema(), vec![
		Arc::new(StringArray::from(doc_ids)),
		Arc::new(Int32Array::from(page_indices)),
		Arc::new(Int32Array::from(ranks)),
		Arc::new(levels.finish()),
		Arc::new(dates.finish()),
		Arc::new(Float32Array::from(scores)),
	])?;
	Ok(record_batch)
}

use arrow_schema::{DataType, Field, Schema, TimeUnit};
use std::sync::Arc;

pub const DOCUMENTS_TABLE: &str = "documents";
pub const PAGES_TABLE: &str = "pages";
pub const BOOKMARKS_TABLE: &str = "bookmarks";

fn utf8_list() -> DataType {
	DataType::List(Arc::new(Field::new("item", DataType::Utf8, true)))
}

pub fn build_documents_schema() -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("document_id", DataType::Utf8, false),
		Field::new("cclr_id", DataType::Utf8, false),
		Field::new("provider", DataType::Utf8, false),
		Field::new("page_count", DataType::Int32, false),
		Field::new("created_by", DataType::Utf8, false),
		Field::new("store_only_document", DataType::Boolean, false),
		Field::new("created_at", DataType::Timestamp(TimeUnit::Millisecond, None), false),
	]))
}

pub fn build_pages_schema() -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("document_id", DataType::Utf8, false),
		Field::new("page_index", DataType::Int32, false),
		Field::new("text", DataType::Utf8, false),
	]))
}

pub fn build_bookmarks_schema() -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("document_id", DataType::Utf8, false),
		Field::new("page_index", DataType::Int32, false),
		Field::new("rank", DataType::Int32, false),
		Field::new("levels", utf8_list(), true),
		Field::new("dates", utf8_list(), true),
		Field::new("confidence_score", DataType::Float32, false),
	]))
}

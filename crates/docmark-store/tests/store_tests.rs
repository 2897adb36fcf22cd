use docmark_core::assembler::DocumentBuilder;
use docmark_core::traits::DocumentStore;
use docmark_core::types::{BookmarkCandidate, Document, DocumentMeta, PageBookmarks, Provenance};
use docmark_store::schema::{BOOKMARKS_TABLE, PAGES_TABLE};
use docmark_store::table::{count_rows, document_filter};
use docmark_store::LanceDocumentStore;

fn sample_document(id: &str) -> Document {
    let mut bookmarks = PageBookmarks::new();
    bookmarks.push(0, BookmarkCandidate::placeholder(vec![]));
    bookmarks.push(1, BookmarkCandidate { levels: vec!["Intro".into(), "Background".into()], dates: vec!["2021-03-04".into()], confidence_score: 0.01 });
    bookmarks.push(1, BookmarkCandidate { levels: vec!["Intro".into()], dates: vec!["2021-03-04".into()], confidence_score: 0.5 });
    DocumentBuilder::new(DocumentMeta { document_id: id.into(), cclr_id: "7".into(), provider: "acme".into() }, 2)
        .texts(vec!["cover".into(), "it's the intro, 2021-03-04".into()])
        .bookmarks(bookmarks)
        .build()
        .unwrap()
}

fn full() -> Provenance { Provenance { created_by: "ai".into(), store_only_document: false } }

#[tokio::test]
async fn full_save_round_trips_through_lancedb() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = LanceDocumentStore::open(&tmp.path().to_string_lossy()).await?;
    let doc = sample_document("doc-1");

    store.save(&doc, &full()).await?;

    let row = store.document_row("doc-1").await?.expect("metadata row");
    assert_eq!(row.page_count, 2);
    assert_eq!(row.created_by, "ai");
    assert!(!row.store_only_document);

    let loaded = store.load_document("doc-1").await?.expect("stored document");
    assert_eq!(loaded, doc);
    Ok(())
}

#[tokio::test]
async fn saving_twice_keeps_a_single_copy() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = LanceDocumentStore::open(&tmp.path().to_string_lossy()).await?;
    let doc = sample_document("doc-'quoted'");

    store.save(&doc, &full()).await?;
    store.save(&doc, &full()).await?;

    let filter = Some(document_filter(doc.document_id()));
    assert_eq!(count_rows(store.connection(), PAGES_TABLE, filter.clone()).await?, 2);
    assert_eq!(count_rows(store.connection(), BOOKMARKS_TABLE, filter).await?, 3);
    assert_eq!(count_rows(store.connection(), "documents", None).await?, 1);
    Ok(())
}

#[tokio::test]
async fn metadata_only_save_skips_content() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = LanceDocumentStore::open(&tmp.path().to_string_lossy()).await?;
    let doc = sample_document("doc-2");

    store.save(&doc, &Provenance { created_by: "ai".into(), store_only_document: true }).await?;

    let row = store.document_row("doc-2").await?.expect("metadata row");
    assert!(row.store_only_document);
    assert_eq!(count_rows(store.connection(), PAGES_TABLE, None).await?, 0);
    assert!(store.load_document("doc-2").await?.is_none());
    assert!(store.load_document("missing").await?.is_none());
    Ok(())
}

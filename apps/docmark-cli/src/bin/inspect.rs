use std::env;

use docmark_core::config::{resolve_with_base, Config};
use docmark_store::LanceDocumentStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;
    let Some(document_id) = env::args().nth(1) else {
        eprintln!("Usage: docmark-inspect <document-id>");
        std::process::exit(1);
    };

    let uri = resolve_with_base(&env::current_dir()?, &settings.store.uri);
    let store = LanceDocumentStore::open(&uri.to_string_lossy()).await?;
    let Some(row) = store.document_row(&document_id).await? else {
        eprintln!("No document '{}' in {}", document_id, uri.display());
        std::process::exit(1);
    };
    println!("Document {} (provider {}, {} pages, created by {})", document_id, row.meta.provider, row.page_count, row.created_by);

    match store.load_document(&document_id).await? {
        Some(doc) => println!("{}", serde_json::to_string_pretty(&doc.to_payload()?)?),
        None => println!("Only metadata was stored for this document."),
    }
    Ok(())
}

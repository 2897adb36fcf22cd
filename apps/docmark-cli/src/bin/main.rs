use std::sync::Arc;

use clap::Parser;
use rand::Rng;
use tracing_subscriber::EnvFilter;

use docmark_core::config::{resolve_with_base, Config};
use docmark_core::dates::CalendarDates;
use docmark_core::types::DocumentMeta;
use docmark_notify::HttpNotifier;
use docmark_ocr::get_default_recognizer;
use docmark_pipeline::{Collaborators, DocumentJob, DocumentPipeline, PipelineOptions};
use docmark_predict::get_default_predictor;
use docmark_store::LanceDocumentStore;

/// Turn a directory of scanned page images into a bookmarked document.
#[derive(Debug, Parser)]
#[command(name = "docmark", version)]
struct Args {
    /// Image directory, relative to `paths.local_images_dir`.
    #[arg(long, alias = "images_path", default_value = "test")]
    images_path: String,

    #[arg(long, default_value = "unknown")]
    provider: String,

    #[arg(long, alias = "cclr_id", default_value = "0")]
    cclr_id: String,

    /// Defaults to a random ten-digit token.
    #[arg(long, alias = "document_id")]
    document_id: Option<String>,

    /// Submit the bookmarks instead of requesting image cleanup.
    #[arg(long, alias = "send_bookmarks_to_be")]
    send_bookmarks: bool,

    /// Draw a progress bar while pages are being recognized.
    #[arg(long)]
    progress: bool,
}

fn random_document_id() -> String {
    let mut rng = rand::thread_rng();
    (0..10).map(|_| char::from(b'0' + rng.gen_range(0..10u8))).collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;
    let base = std::env::current_dir()?;

    let store_uri = resolve_with_base(&base, &settings.store.uri);
    let model_dir = resolve_with_base(&base, &settings.model.dir);
    let collaborators = Collaborators {
        recognizer: get_default_recognizer()?,
        predictor: get_default_predictor(&model_dir, settings.bookmarks.random)?,
        dates: Arc::new(CalendarDates::new(settings.dates.range_years)),
        store: Arc::new(LanceDocumentStore::open(&store_uri.to_string_lossy()).await?),
        notifier: Arc::new(HttpNotifier::from_settings(&settings.notify)?),
    };
    let mut options = PipelineOptions::from_settings(&settings, &base);
    options.show_progress = args.progress;

    let job = DocumentJob {
        images_path: args.images_path,
        meta: DocumentMeta {
            document_id: args.document_id.unwrap_or_else(random_document_id),
            cclr_id: args.cclr_id,
            provider: args.provider,
        },
        send_results: args.send_bookmarks,
    };
    tracing::info!(document_id = %job.meta.document_id, images_path = %job.images_path, send_results = job.send_results, "processing document");

    let pipeline = DocumentPipeline::new(collaborators, options);
    let document = pipeline.run(&job).await?;
    println!("✅ Document {} processed ({} pages)", document.document_id(), document.page_count());
    Ok(())
}

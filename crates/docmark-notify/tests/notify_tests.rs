use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use docmark_core::assembler::DocumentBuilder;
use docmark_core::traits::Notifier;
use docmark_core::types::{BookmarkCandidate, Document, DocumentMeta, PageBookmarks};
use docmark_notify::HttpNotifier;

/// Serves one request with `status`, returning the raw request (head + body).
async fn one_shot_server(status: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 { break; }
            raw.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&raw);
            if let Some(head_end) = text.find("\r\n\r\n") {
                let content_length = text[..head_end]
                    .lines()
                    .find_map(|l| l.to_ascii_lowercase().strip_prefix("content-length:").map(|v| v.trim().parse::<usize>().unwrap()))
                    .unwrap_or(0);
                if raw.len() >= head_end + 4 + content_length { break; }
            }
        }
        let response = format!("HTTP/1.1 {status}\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok");
        socket.write_all(response.as_bytes()).await.unwrap();
        String::from_utf8_lossy(&raw).to_string()
    });
    (format!("http://{addr}/endpoint"), handle)
}

fn document() -> Document {
    let mut bookmarks = PageBookmarks::new();
    bookmarks.push(0, BookmarkCandidate { levels: vec!["Intro".into()], dates: vec![], confidence_score: 0.5 });
    DocumentBuilder::new(DocumentMeta { document_id: "doc-9".into(), cclr_id: "3".into(), provider: "acme".into() }, 1)
        .texts(vec!["hello".into()])
        .bookmarks(bookmarks)
        .build()
        .unwrap()
}

fn notifier(results: &str, cleanup: &str) -> HttpNotifier {
    HttpNotifier::new(results.to_string(), cleanup.to_string(), Duration::from_secs(5), true).unwrap()
}

#[tokio::test]
async fn results_are_posted_as_json() {
    let (url, server) = one_shot_server("200 OK").await;
    notifier(&url, "http://127.0.0.1:9/unused").submit_results(&document()).await.unwrap();
    let request = server.await.unwrap();
    assert!(request.starts_with("POST /endpoint"));
    assert!(request.contains("\"documentId\":\"doc-9\""));
    assert!(request.contains("\"levels\":[\"Intro\"]"));
}

#[tokio::test]
async fn cleanup_sends_delete_with_document_id() {
    let (url, server) = one_shot_server("200 OK").await;
    notifier("http://127.0.0.1:9/unused", &url).request_cleanup("doc-9").await.unwrap();
    let request = server.await.unwrap();
    assert!(request.starts_with("DELETE /endpoint"));
    assert!(request.contains("{\"documentId\":\"doc-9\"}"));
}

#[tokio::test]
async fn non_success_status_is_a_dispatch_failure() {
    let (url, server) = one_shot_server("500 Internal Server Error").await;
    let err = notifier(&url, "http://127.0.0.1:9/unused").submit_results(&document()).await.unwrap_err();
    server.await.unwrap();
    assert!(matches!(err.downcast_ref::<docmark_core::Error>(), Some(docmark_core::Error::DispatchFailure(_))));
}

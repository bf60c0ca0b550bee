// ABOUTME: Minimal scripted HTTP responder for probe tests.
// ABOUTME: Answers each request with the next status in a sequence.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// A local HTTP server answering with statuses from `sequence`, repeating the
/// last one once exhausted. Returns (base_url, request_counter).
pub async fn spawn_responder(sequence: Vec<u16>) -> (String, Arc<AtomicUsize>) {
    assert!(!sequence.is_empty());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let counter = Arc::new(AtomicUsize::new(0));
    let served = counter.clone();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let n = served.fetch_add(1, Ordering::SeqCst);
            let status = *sequence.get(n).unwrap_or_else(|| sequence.last().unwrap());
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {status} X\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok"
                );
                let _ = socket.write_all(response.as_bytes()).await;
            });
        }
    });

    (format!("http://127.0.0.1:{port}"), counter)
}

/// Always answers with the given status.
pub async fn spawn_fixed_responder(status: u16) -> String {
    spawn_responder(vec![status]).await.0
}

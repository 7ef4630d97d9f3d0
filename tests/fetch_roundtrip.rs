//! End-to-end fetch behavior through the public API
//!
//! Exercises the full path: network fetch, write-through to the cache, and
//! a subsequent cache hit serving byte-identical content without touching
//! the network.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tempfile::tempdir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use soccerfetch::app::{ClientConfig, FetchRequest, HttpReader, Reader, ReaderConfig};

async fn spawn_server(body: &'static str) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            counter.fetch_add(1, Ordering::SeqCst);
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
        }
    });

    (format!("http://{addr}/matches"), hits)
}

fn reader_for(dir: &std::path::Path) -> HttpReader {
    let config = ReaderConfig {
        data_dir: dir.to_path_buf(),
        client: ClientConfig {
            rate_limit_rps: 100,
            ..ClientConfig::default()
        },
        ..ReaderConfig::default()
    };
    HttpReader::new(config).unwrap()
}

#[tokio::test]
async fn fetched_payload_round_trips_through_the_cache() {
    let (url, hits) = spawn_server("{\"match\":[{\"id\":1}]}").await;
    let dir = tempdir().unwrap();
    let cache_path = dir.path().join("matches").join("2023.json");

    // First fetch goes to the network and writes through.
    let mut reader = reader_for(dir.path());
    let fetched = reader
        .fetch(FetchRequest::new(&url).cache_path(&cache_path))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    // Second fetch, from a fresh reader, is served from the cache.
    let mut reader = reader_for(dir.path());
    let cached = reader
        .fetch(FetchRequest::new(&url).cache_path(&cache_path).max_age(1u64))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(cached.as_bytes(), fetched.as_bytes());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn force_refresh_always_hits_the_network() {
    let (url, hits) = spawn_server("fresh bytes").await;
    let dir = tempdir().unwrap();
    let cache_path = dir.path().join("leagues.json");
    std::fs::write(&cache_path, b"stale bytes").unwrap();

    let mut reader = reader_for(dir.path());
    let payload = reader
        .fetch(
            FetchRequest::new(&url)
                .cache_path(&cache_path)
                .force_refresh(true),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(payload.as_bytes(), b"fresh bytes");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    // The cache now holds the refreshed copy.
    assert_eq!(std::fs::read(&cache_path).unwrap(), b"fresh bytes");
}

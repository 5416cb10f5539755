//! Shared utilities for integration testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// What a mock upstream does with one accepted connection.
#[allow(dead_code)]
pub enum UpstreamBehavior {
    /// Write an HTTP response with the given status and body.
    Respond(u16, String),

    /// Close the socket without writing a response (transport failure).
    Close,

    /// Hold the socket open without answering, then close (timeout bait).
    Stall(Duration),
}

/// Start a mock upstream that always returns the same JSON response.
#[allow(dead_code)]
pub async fn start_fixed_upstream(status: u16, body: &'static str) -> SocketAddr {
    start_programmable_upstream(move || async move {
        UpstreamBehavior::Respond(status, body.to_string())
    })
    .await
}

/// Start a programmable mock upstream on an ephemeral port.
///
/// The closure runs once per accepted connection; tests capture an
/// `AtomicU32` in it to count attempts.
#[allow(dead_code)]
pub async fn start_programmable_upstream<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = UpstreamBehavior> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        // Drain the request head first so the client never
                        // sees a reset mid-write.
                        let mut buf = [0u8; 8192];
                        let _ = socket.read(&mut buf).await;

                        match f().await {
                            UpstreamBehavior::Respond(status, body) => {
                                let response = format!(
                                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                                    status_line(status),
                                    body.len(),
                                    body
                                );
                                let _ = socket.write_all(response.as_bytes()).await;
                                let _ = socket.shutdown().await;
                            }
                            UpstreamBehavior::Close => {
                                let _ = socket.shutdown().await;
                            }
                            UpstreamBehavior::Stall(duration) => {
                                tokio::time::sleep(duration).await;
                                let _ = socket.shutdown().await;
                            }
                        }
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

#[allow(dead_code)]
fn status_line(status: u16) -> &'static str {
    match status {
        200 => "200 OK",
        201 => "201 Created",
        400 => "400 Bad Request",
        401 => "401 Unauthorized",
        404 => "404 Not Found",
        429 => "429 Too Many Requests",
        500 => "500 Internal Server Error",
        502 => "502 Bad Gateway",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    }
}

/// An address nothing listens on: bind an ephemeral port, then drop it.
#[allow(dead_code)]
pub async fn unreachable_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

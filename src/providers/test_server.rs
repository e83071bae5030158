//! Minimal scripted HTTP/1.1 server for exercising the real clients.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16, &'static str),
    Delayed(Duration, u16, &'static str),
    /// Read the request and never answer.
    Hang,
}

pub struct TestServer {
    pub url: String,
    hits: Arc<AtomicUsize>,
}

impl TestServer {
    /// Request N gets `replies[N]`; the last reply repeats.
    pub async fn start(replies: Vec<Reply>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let replies = replies.clone();
                let counter = counter.clone();
                tokio::spawn(serve(socket, replies, counter));
            }
        });

        Self { url, hits }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn serve(mut socket: TcpStream, replies: Vec<Reply>, counter: Arc<AtomicUsize>) {
    if !read_request(&mut socket).await {
        return;
    }
    let n = counter.fetch_add(1, Ordering::SeqCst);
    let reply = replies.get(n).or(replies.last()).cloned();

    let (status, body) = match reply {
        Some(Reply::Status(status, body)) => (status, body),
        Some(Reply::Delayed(delay, status, body)) => {
            tokio::time::sleep(delay).await;
            (status, body)
        }
        Some(Reply::Hang) | None => {
            tokio::time::sleep(Duration::from_secs(60)).await;
            return;
        }
    };

    let response = format!(
        "HTTP/1.1 {status} Test\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// Consume headers and a `Content-Length` body. False if the peer went away.
async fn read_request(socket: &mut TcpStream) -> bool {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return false,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return false,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    true
}

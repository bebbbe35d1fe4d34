//! Test doubles: a scriptable in-memory remote and a one-shot HTTP stub.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use super::{LocalStore, RemoteStore, UploadFile};
use crate::listing::Listing;

#[derive(Default)]
pub(crate) struct FakeRemote {
    pub listings: Mutex<Vec<Listing>>,
    pub uploads: Mutex<Vec<Vec<UploadFile>>>,
    pub fail_fetch: AtomicBool,
    pub fail_save: AtomicBool,
    pub fail_upload: AtomicBool,
    pub calls: AtomicUsize,
    next_path: AtomicUsize,
}

impl FakeRemote {
    pub fn stored(&self) -> Vec<Listing> {
        self.listings.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }
}

#[async_trait]
impl RemoteStore for FakeRemote {
    async fn fetch_listings(&self) -> Result<Vec<Listing>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch.load(Ordering::SeqCst) {
            bail!("fetch refused");
        }
        Ok(self.stored())
    }

    async fn save_listings(&self, listings: &[Listing]) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_save.load(Ordering::SeqCst) {
            bail!("save refused");
        }
        *self.listings.lock().unwrap() = listings.to_vec();
        Ok(())
    }

    async fn upload_files(&self, files: Vec<UploadFile>) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_upload.load(Ordering::SeqCst) {
            bail!("upload refused");
        }
        let paths = files
            .iter()
            .map(|f| {
                let n = self.next_path.fetch_add(1, Ordering::SeqCst);
                let ext = f.file_name.rsplit('.').next().unwrap_or("jpg");
                format!("uploads/{}.{}", n, ext)
            })
            .collect();
        self.uploads.lock().unwrap().push(files);
        Ok(paths)
    }
}

/// Local store whose disk is gone: every read and write fails.
#[derive(Default)]
pub(crate) struct FailingLocal {
    pub writes: AtomicUsize,
}

#[async_trait]
impl LocalStore for FailingLocal {
    fn backend_name(&self) -> &str {
        "failing"
    }

    async fn load_listings(&self) -> Result<Vec<Listing>> {
        bail!("local read refused");
    }

    async fn save_listings(&self, _listings: &[Listing]) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        bail!("local write refused");
    }
}

/// Accept a single HTTP request on loopback and answer with `status` + `body`.
///
/// Returns the endpoint URL and a handle resolving to the raw request text.
pub(crate) async fn serve_once(status: u16, body: String) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let reason = if status < 400 { "OK" } else { "Error" };
        let response = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            reason,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
        request
    });

    (format!("http://{}/api.php", addr), handle)
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = socket.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        let Some(header_end) = text.find("\r\n\r\n") else {
            continue;
        };
        let headers = text[..header_end].to_ascii_lowercase();
        let body_len = buf.len() - (header_end + 4);

        if headers.contains("transfer-encoding: chunked") {
            if buf.ends_with(b"0\r\n\r\n") {
                break;
            }
            continue;
        }

        let content_length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if body_len >= content_length {
            break;
        }
    }

    String::from_utf8_lossy(&buf).into_owned()
}

// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A one-shot HTTP/1.1 server that streams a chunked body with pauses.
//!
//! Mock servers answer with the whole body at once, which cannot show how a
//! client behaves while a long response is still arriving.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serves exactly one connection, writing each chunk after `gap`.
///
/// After the last chunk the server waits `hold` before ending the body,
/// so a long `hold` leaves the client waiting on an open stream.
pub struct DripServer {
    uri: String,
    task: JoinHandle<()>,
}

impl DripServer {
    pub async fn start(
        content_type: &'static str,
        chunks: Vec<Vec<u8>>,
        gap: Duration,
        hold: Duration,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let uri = format!("http://{}", listener.local_addr()?);

        let task = tokio::spawn(async move {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let mut request = vec![0u8; 64 * 1024];
            if socket.read(&mut request).await.is_err() {
                return;
            }

            let head = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: {content_type}\r\ntransfer-encoding: chunked\r\n\r\n"
            );
            if socket.write_all(head.as_bytes()).await.is_err() {
                return;
            }
            for chunk in chunks {
                tokio::time::sleep(gap).await;
                let mut frame = format!("{:x}\r\n", chunk.len()).into_bytes();
                frame.extend_from_slice(&chunk);
                frame.extend_from_slice(b"\r\n");
                if socket.write_all(&frame).await.is_err() {
                    return;
                }
            }
            tokio::time::sleep(hold).await;
            let _ = socket.write_all(b"0\r\n\r\n").await;
        });

        Ok(Self { uri, task })
    }

    /// Base URI, `http://127.0.0.1:<port>`.
    pub fn uri(&self) -> &str {
        &self.uri
    }
}

impl Drop for DripServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

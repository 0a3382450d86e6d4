//! Stream-based data source.
//!
//! Receives readings from an async byte stream, typically a TCP
//! connection to a gateway that pushes newline-delimited JSON.

use std::sync::Arc;

use leakwatch_types::AssetReading;
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

use super::{DataSource, Payload};

/// A data source that receives readings from an async stream.
///
/// A background task reads newline-delimited JSON from the reader. Each
/// line is one reading or an array of readings. `poll()` drains whatever
/// has arrived since the last call.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use leakwatch::StreamSource;
///
/// # tokio_test::block_on(async {
/// let data = b"{\"assetId\": \"A1\", \"leakDetected\": true}\n";
/// let source = StreamSource::spawn(Cursor::new(data.to_vec()), "example");
/// # });
/// ```
#[derive(Debug)]
pub struct StreamSource {
    receiver: mpsc::Receiver<Vec<AssetReading>>,
    description: String,
    last_error: Arc<Mutex<Option<String>>>,
    // Snapshot of last_error for `error()`, which hands out a borrow
    error_view: Option<String>,
}

impl StreamSource {
    /// Spawn a background task that reads from the given async reader.
    pub fn spawn<R>(reader: R, description: &str) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(64);
        let last_error = Arc::new(Mutex::new(None));
        let error_handle = last_error.clone();

        tokio::spawn(async move {
            let mut reader = BufReader::new(reader);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        *error_handle.lock() = Some("Connection closed".to_string());
                        break;
                    }
                    Ok(_) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<Payload>(trimmed) {
                            Ok(payload) => {
                                *error_handle.lock() = None;
                                if tx.send(payload.into_readings()).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                debug!("Skipping malformed reading: {}", e);
                                *error_handle.lock() = Some(format!("Parse error: {}", e));
                            }
                        }
                    }
                    Err(e) => {
                        *error_handle.lock() = Some(format!("Read error: {}", e));
                        break;
                    }
                }
            }
        });

        Self {
            receiver: rx,
            description: format!("stream: {}", description),
            last_error,
            error_view: None,
        }
    }
}

impl DataSource for StreamSource {
    fn poll(&mut self) -> Option<Vec<AssetReading>> {
        let mut readings = Vec::new();
        let mut disconnected = false;

        loop {
            match self.receiver.try_recv() {
                Ok(batch) => readings.extend(batch),
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }

        {
            let mut shared = self.last_error.lock();
            if disconnected && shared.is_none() {
                *shared = Some("Stream disconnected".to_string());
            }
            self.error_view = shared.clone();
        }

        if readings.is_empty() {
            None
        } else {
            Some(readings)
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        self.error_view.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::Duration;

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn test_stream_source_reads_lines() {
        let data = concat!(
            r#"{"assetId": "A1", "leakDetected": true, "flowLpm": 12.0}"#,
            "\n",
            r#"[{"assetId": "A2"}, {"assetId": "A3"}]"#,
            "\n",
        );
        let mut source = StreamSource::spawn(Cursor::new(data.as_bytes().to_vec()), "test");
        settle().await;

        let readings = source.poll().unwrap();
        assert_eq!(readings.len(), 3);
        assert_eq!(readings[0].asset_id, "A1");
        assert_eq!(source.description(), "stream: test");
    }

    #[tokio::test]
    async fn test_stream_source_skips_bad_lines() {
        let data = concat!(
            "garbage\n",
            "\n",
            r#"{"assetId": "A1"}"#,
            "\n",
        );
        let mut source = StreamSource::spawn(Cursor::new(data.as_bytes().to_vec()), "test");
        settle().await;

        let readings = source.poll().unwrap();
        assert_eq!(readings.len(), 1);
    }

    #[tokio::test]
    async fn test_stream_source_reports_close() {
        let mut source = StreamSource::spawn(Cursor::new(Vec::new()), "empty");
        settle().await;

        assert!(source.poll().is_none());
        assert_eq!(source.error(), Some("Connection closed"));
    }

    #[tokio::test]
    async fn test_stream_source_over_tcp() {
        use tokio::io::AsyncWriteExt;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket
                .write_all(b"{\"assetId\": \"A1\", \"leakDetected\": true}\n")
                .await
                .unwrap();
        });

        let stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let mut source = StreamSource::spawn(stream, &addr.to_string());
        settle().await;

        let readings = source.poll().unwrap();
        assert!(readings[0].leak_detected);
    }
}

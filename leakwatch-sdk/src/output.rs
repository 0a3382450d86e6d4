//! Output backends for emitting leak events.

use std::path::PathBuf;
use std::time::Duration;

use leakwatch_types::LeakEvent;
use tokio::io::AsyncWriteExt;

/// How long a TCP output may spend connecting and writing one event.
pub const TCP_SEND_TIMEOUT: Duration = Duration::from_millis(500);

/// Destination for lifecycle events.
///
/// Configure where the monitor should send [`LeakEvent`]s.
#[derive(Debug)]
pub enum Output {
    /// Append events to a JSON-lines file.
    ///
    /// The file is created if missing; one event per line.
    File(PathBuf),

    /// Send events to a TCP server.
    ///
    /// Each event is sent as a newline-delimited JSON message. Connection
    /// failures are ignored, and a send that takes longer than
    /// [`TCP_SEND_TIMEOUT`] is abandoned.
    Tcp(String),

    /// Send events through a channel.
    ///
    /// Use `Output::channel()` to create this variant and get the receiver.
    Channel(tokio::sync::mpsc::Sender<LeakEvent>),
}

impl Output {
    /// Create a file output.
    ///
    /// # Example
    ///
    /// ```rust
    /// use leakwatch_sdk::Output;
    ///
    /// let output = Output::file("events.jsonl");
    /// ```
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Output::File(path.into())
    }

    /// Create a TCP output.
    pub fn tcp(addr: impl Into<String>) -> Self {
        Output::Tcp(addr.into())
    }

    /// Create a channel output and return both the output and receiver.
    ///
    /// # Example
    ///
    /// ```rust
    /// use leakwatch_sdk::Output;
    ///
    /// let (output, mut rx) = Output::channel(16);
    ///
    /// // Later, receive events
    /// // while let Some(event) = rx.recv().await {
    /// //     println!("{} {:?}", event.asset_id, event.kind);
    /// // }
    /// ```
    pub fn channel(buffer: usize) -> (Self, tokio::sync::mpsc::Receiver<LeakEvent>) {
        let (tx, rx) = tokio::sync::mpsc::channel(buffer);
        (Output::Channel(tx), rx)
    }

    /// Emit an event to this output.
    pub(crate) async fn emit(&self, event: &LeakEvent) -> std::io::Result<()> {
        match self {
            Output::File(path) => {
                let mut line = serde_json::to_string(event)?;
                line.push('\n');
                let mut file = tokio::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .await?;
                file.write_all(line.as_bytes()).await?;
                file.flush().await?;
            }
            Output::Tcp(addr) => {
                use tokio::net::TcpStream;

                let mut line = serde_json::to_string(event)?;
                line.push('\n');

                // Best effort: a missing or unresponsive listener is not an error
                let send = async {
                    let mut stream = TcpStream::connect(addr).await?;
                    stream.write_all(line.as_bytes()).await
                };
                let _ = tokio::time::timeout(TCP_SEND_TIMEOUT, send).await;
            }
            Output::Channel(tx) => {
                // Don't block the monitor on a slow consumer
                let _ = tx.try_send(event.clone());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leakwatch_types::{EpochMillis, LeakEventKind, Severity};

    fn event(kind: LeakEventKind) -> LeakEvent {
        LeakEvent::new(
            "A1",
            kind,
            Some("rec-1".into()),
            Severity::Moderate,
            EpochMillis::from_millis(10),
        )
    }

    #[tokio::test]
    async fn file_output_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let output = Output::file(&path);

        output.emit(&event(LeakEventKind::Created)).await.unwrap();
        output.emit(&event(LeakEventKind::Resolved)).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let second: LeakEvent = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.kind, LeakEventKind::Resolved);
    }

    #[tokio::test]
    async fn channel_output_delivers() {
        let (output, mut rx) = Output::channel(4);
        output.emit(&event(LeakEventKind::Updated)).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.kind, LeakEventKind::Updated);
    }

    #[tokio::test]
    async fn full_channel_drops_silently() {
        let (output, mut rx) = Output::channel(1);
        output.emit(&event(LeakEventKind::Created)).await.unwrap();
        output.emit(&event(LeakEventKind::Updated)).await.unwrap();

        assert_eq!(rx.recv().await.unwrap().kind, LeakEventKind::Created);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn tcp_output_without_listener_is_ok() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let output = Output::tcp(addr.to_string());
        assert!(output.emit(&event(LeakEventKind::Created)).await.is_ok());
    }

    #[tokio::test]
    async fn tcp_output_gives_up_on_unreachable_host() {
        // Non-routable: connect either fails fast or hangs until the timeout
        let output = Output::tcp("10.255.255.1:9");
        let sent = tokio::time::timeout(
            TCP_SEND_TIMEOUT * 4,
            output.emit(&event(LeakEventKind::Created)),
        )
        .await;
        assert!(matches!(sent, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn tcp_output_sends_json_line() {
        use tokio::io::AsyncBufReadExt;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let reader = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut lines = tokio::io::BufReader::new(socket).lines();
            lines.next_line().await.unwrap().unwrap()
        });

        Output::tcp(addr.to_string())
            .emit(&event(LeakEventKind::Created))
            .await
            .unwrap();

        let line = reader.await.unwrap();
        let received: LeakEvent = serde_json::from_str(&line).unwrap();
        assert_eq!(received.asset_id, "A1");
    }
}

//! Line-oriented user input.
//!
//! A spawned task reads lines and feeds them into a channel; the stream
//! ends when the input closes.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::warn;

/// Lines typed on standard input.
pub fn stdin_lines() -> ReceiverStream<String> {
    lines_from(tokio::io::stdin())
}

/// Lines read from any async reader, without their line endings.
pub fn lines_from<R>(reader: R) -> ReceiverStream<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(32);

    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).await.is_err() {
                        break; // conversation ended
                    }
                }
                Ok(None) => break, // EOF
                Err(e) => {
                    warn!(error = %e, "Failed to read input");
                    break;
                }
            }
        }
    });

    ReceiverStream::new(rx)
}

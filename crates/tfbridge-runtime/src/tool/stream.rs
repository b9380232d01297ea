//! Output stream readers (non-UTF8-safe).
//!
//! The tool may emit bytes that are not valid UTF-8 (legacy code pages on
//! Windows). `BufReader::lines()` would end the reader on the first invalid
//! byte, so lines are read as bytes and decoded lossily.

use tfbridge_core::{StreamKind, ToolError};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, trace};

/// Event produced by a supervision task and delivered by the dispatcher.
#[derive(Debug)]
pub(crate) enum ToolEvent {
    Line { stream: StreamKind, line: String },
    Exception(ToolError),
    Completed(Option<i32>),
}

/// Read `stream` line by line until EOF or a read error.
///
/// A read error is reported as one exception and ends this reader only.
pub(crate) async fn read_lines(
    stream: impl AsyncRead + Unpin + Send,
    kind: StreamKind,
    events: UnboundedSender<ToolEvent>,
) {
    let mut reader = BufReader::new(stream);
    let mut buf: Vec<u8> = Vec::with_capacity(1024);

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break, // EOF
            Ok(_) => {
                // Trim trailing newline(s)
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                    if buf.last() == Some(&b'\r') {
                        buf.pop();
                    }
                }

                let line = String::from_utf8_lossy(&buf).into_owned();
                trace!(stream = kind.as_str(), "{line}");
                if events.send(ToolEvent::Line { stream: kind, line }).is_err() {
                    break;
                }
            }
            Err(e) => {
                debug!(stream = kind.as_str(), error = %e, "stream reader exiting due to read error");
                let _ = events.send(ToolEvent::Exception(ToolError::StreamIo {
                    stream: kind,
                    reason: e.to_string(),
                }));
                break;
            }
        }
    }

    debug!(stream = kind.as_str(), "stream reader exiting");
}

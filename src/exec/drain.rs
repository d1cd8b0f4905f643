// src/exec/drain.rs

use std::path::PathBuf;

use bytes::BytesMut;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing::warn;

/// Read `stream` to end-of-input and return everything it produced.
///
/// When `log_path` is given, every chunk is also written to that file as it
/// is read, so the file ends up byte-identical to the captured output. The
/// loop keeps reading until the stream closes; a read error stops the drain
/// and appends a marker to whatever was accumulated, so the child is never
/// left blocked on a full OS pipe buffer while it is still producing output.
pub async fn drain(mut stream: impl AsyncRead + Unpin, log_path: Option<PathBuf>) -> String {
    let mut log_file = match log_path {
        Some(path) => match File::create(&path).await {
            Ok(file) => Some(file),
            Err(err) => {
                warn!(path = ?path, error = %err, "cannot open log file; capture continues without it");
                None
            }
        },
        None => None,
    };

    let mut collected = BytesMut::with_capacity(4096);
    let mut buf = BytesMut::with_capacity(4096);
    loop {
        match stream.read_buf(&mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let chunk = buf.split();
                if let Some(file) = log_file.as_mut() {
                    if let Err(err) = file.write_all(&chunk).await {
                        warn!(error = %err, "writing to log file failed; dropping it");
                        log_file = None;
                    }
                }
                collected.extend_from_slice(&chunk);
            }
            Err(err) => {
                warn!(error = %err, "stream read failed; returning partial output");
                collected.extend_from_slice(format!("\n[output truncated: {err}]").as_bytes());
                break;
            }
        }
    }

    if let Some(mut file) = log_file {
        if let Err(err) = file.flush().await {
            warn!(error = %err, "flushing log file failed");
        }
    }

    String::from_utf8_lossy(&collected).into_owned()
}

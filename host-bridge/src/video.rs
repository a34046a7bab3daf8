//! MJPEG passthrough for `/video_feed`.
//!
//! A capture program writes back-to-back JPEG images to stdout. They are cut
//! apart at the JPEG start/end markers and re-emitted as a
//! `multipart/x-mixed-replace` stream.

use std::process::Stdio;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::{Child, Command};
use tracing::{debug, info};

use crate::config::VideoConfig;
use crate::error::{BridgeError, Result};

const SOI: [u8; 2] = [0xFF, 0xD8];
const EOI: [u8; 2] = [0xFF, 0xD9];

/// Frames larger than this are discarded.
pub const MAX_FRAME_BYTES: usize = 8 * 1024 * 1024;

/// Splits a byte stream into JPEG frames.
#[derive(Debug, Default)]
pub struct MjpegSplitter {
    buf: Vec<u8>,
}

impl MjpegSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
        if self.buf.len() > MAX_FRAME_BYTES {
            // No end marker in sight; resynchronise on the next frame
            self.buf.clear();
        }
    }

    /// Next complete frame, SOI through EOI inclusive.
    pub fn next_frame(&mut self) -> Option<Vec<u8>> {
        let Some(start) = find(&self.buf, &SOI, 0) else {
            // Keep a trailing 0xFF, it may begin the next SOI
            let keep = usize::from(self.buf.last() == Some(&0xFF));
            self.buf.drain(..self.buf.len() - keep);
            return None;
        };
        self.buf.drain(..start);

        let end = find(&self.buf, &EOI, SOI.len())? + EOI.len();
        Some(self.buf.drain(..end).collect())
    }
}

fn find(haystack: &[u8], needle: &[u8; 2], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(2)
        .position(|w| w == needle)
        .map(|i| i + from)
}

/// `Content-Type` of the multipart stream.
pub fn content_type(boundary: &str) -> String {
    format!("multipart/x-mixed-replace; boundary={boundary}")
}

/// Start the capture program with stdout piped.
///
/// The child is killed when the returned handle is dropped.
pub fn spawn_capture(config: &VideoConfig) -> Result<Child> {
    let child = Command::new(&config.command)
        .args(&config.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| BridgeError::Video(format!("failed to start {}: {e}", config.command)))?;
    info!(command = %config.command, "video capture started");
    Ok(child)
}

/// Copy frames from `source` to `out` as multipart parts.
///
/// Returns the number of frames sent once the source ends. A write error
/// means the client went away.
pub async fn pump_frames<R, W>(mut source: R, boundary: &str, out: &mut W) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut splitter = MjpegSplitter::new();
    let mut chunk = vec![0u8; 16 * 1024];
    let mut frames = 0;

    loop {
        let n = source.read(&mut chunk).await?;
        if n == 0 {
            debug!(frames, "video source ended");
            return Ok(frames);
        }
        splitter.push(&chunk[..n]);
        while let Some(frame) = splitter.next_frame() {
            let header = format!(
                "--{boundary}\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n",
                frame.len()
            );
            out.write_all(header.as_bytes()).await?;
            out.write_all(&frame).await?;
            out.write_all(b"\r\n").await?;
            out.flush().await?;
            frames += 1;
        }
    }
}

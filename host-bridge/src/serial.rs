//! Single-writer serial actor.
//!
//! One OS thread owns the port. HTTP handlers queue encoded lines through a
//! bounded channel and wait for the write to be acknowledged, so writes from
//! concurrent requests never interleave on the wire.
//!
//! Each write carries a hold time: how long the device will be busy playing
//! it back. The thread waits that long before the next write so the device
//! queue never overflows across requests.

use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use serialport::{DataBits, Parity, SerialPort, StopBits};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::config::SerialConfig;
use crate::error::{BridgeError, Result};

/// Bytes to write in one go, and where to report the outcome.
pub struct WriteRequest {
    pub bytes: Vec<u8>,
    /// Pause after a successful write before the next one.
    pub hold: Duration,
    pub ack: oneshot::Sender<io::Result<()>>,
}

/// Cloneable handle to the writer thread.
#[derive(Clone)]
pub struct SerialHandle {
    tx: mpsc::Sender<WriteRequest>,
}

impl SerialHandle {
    /// Queue `bytes` as one write and wait until the port has taken them.
    ///
    /// Later writes start no earlier than `hold` after this one.
    pub async fn send(&self, bytes: Vec<u8>, hold: Duration) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.tx
            .send(WriteRequest { bytes, hold, ack })
            .await
            .map_err(|_| BridgeError::WriterClosed)?;
        done.await
            .map_err(|_| BridgeError::WriterClosed)?
            .map_err(BridgeError::SerialWrite)
    }
}

/// Spawn the writer thread that owns `port`.
///
/// The thread exits once every [`SerialHandle`] has been dropped.
pub fn spawn_writer<W>(mut port: W, queue_depth: usize) -> Result<SerialHandle>
where
    W: Write + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<WriteRequest>(queue_depth);

    thread::Builder::new()
        .name("serial-writer".into())
        .spawn(move || {
            while let Some(request) = rx.blocking_recv() {
                let result = port.write_all(&request.bytes).and_then(|()| port.flush());
                match &result {
                    Ok(()) => debug!(
                        bytes = request.bytes.len(),
                        lines = %String::from_utf8_lossy(&request.bytes).escape_debug(),
                        "wrote command lines"
                    ),
                    Err(e) => warn!(error = %e, "serial write failed"),
                }
                let written = result.is_ok();
                // The requester may have gone away; nothing to do then
                let _ = request.ack.send(result);
                if written && !request.hold.is_zero() {
                    debug!(hold_ms = request.hold.as_millis() as u64, "waiting for playback");
                    thread::sleep(request.hold);
                }
            }
            debug!("serial writer stopped");
        })?;

    Ok(SerialHandle { tx })
}

/// Open the configured port as 8N1 with the configured write timeout.
pub fn open_port(config: &SerialConfig) -> Result<Box<dyn SerialPort>> {
    let port = serialport::new(&config.port, config.baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .timeout(Duration::from_millis(config.timeout_ms))
        .open()
        .map_err(|source| BridgeError::OpenPort {
            port: config.port.clone(),
            source,
        })?;
    info!(port = %config.port, baud = config.baud_rate, "serial port opened");
    Ok(port)
}

/// Stand-in for the port in dry-run mode: logs each write.
#[derive(Debug, Default)]
pub struct LogSink;

impl Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for line in String::from_utf8_lossy(buf).lines() {
            info!(line, "dry-run");
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// In-memory port shared with the test.
    #[derive(Clone, Default)]
    pub(crate) struct MemoryPort(pub Arc<Mutex<Vec<u8>>>);

    impl Write for MemoryPort {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Port that fails every write, like an unplugged adapter.
    pub(crate) struct BrokenPort;

    impl Write for BrokenPort {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "device disconnected"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn writes_are_acknowledged_in_order() {
        let port = MemoryPort::default();
        let handle = spawn_writer(port.clone(), 4).unwrap();

        handle.send(b"up\n".to_vec(), Duration::ZERO).await.unwrap();
        handle.send(b"TEXT:hi\n".to_vec(), Duration::ZERO).await.unwrap();

        assert_eq!(&*port.0.lock().unwrap(), b"up\nTEXT:hi\n");
    }

    #[tokio::test]
    async fn concurrent_requests_do_not_interleave() {
        let port = MemoryPort::default();
        let handle = spawn_writer(port.clone(), 2).unwrap();

        let mut tasks = Vec::new();
        for i in 0..16 {
            let handle = handle.clone();
            tasks.push(tokio::spawn(async move {
                let line = format!("TEXT:{}\nCMD:ENTER\n", "x".repeat(i + 1));
                handle.send(line.into_bytes(), Duration::ZERO).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let written = String::from_utf8(port.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 32);
        for pair in lines.chunks(2) {
            assert!(pair[0].starts_with("TEXT:"));
            assert_eq!(pair[1], "CMD:ENTER");
        }
    }

    #[tokio::test]
    async fn write_failure_is_reported() {
        let handle = spawn_writer(BrokenPort, 1).unwrap();
        let err = handle.send(b"up\n".to_vec(), Duration::ZERO).await.unwrap_err();
        assert!(matches!(err, BridgeError::SerialWrite(_)));

        // The writer keeps serving after a failure
        let err = handle.send(b"down\n".to_vec(), Duration::ZERO).await.unwrap_err();
        assert!(matches!(err, BridgeError::SerialWrite(_)));
    }

    #[tokio::test]
    async fn next_write_waits_for_the_hold() {
        let port = MemoryPort::default();
        let handle = spawn_writer(port.clone(), 4).unwrap();
        let hold = Duration::from_millis(150);

        let start = std::time::Instant::now();
        handle.send(b"TEXT:abc\n".to_vec(), hold).await.unwrap();
        // The first write is acknowledged without waiting for the hold
        assert!(start.elapsed() < hold);

        handle.send(b"up\n".to_vec(), Duration::ZERO).await.unwrap();
        assert!(start.elapsed() >= hold);
        assert_eq!(&*port.0.lock().unwrap(), b"TEXT:abc\nup\n");
    }

    #[tokio::test]
    async fn failed_write_skips_the_hold() {
        let handle = spawn_writer(BrokenPort, 1).unwrap();
        let start = std::time::Instant::now();
        let hold = Duration::from_secs(5);
        assert!(handle.send(b"TEXT:a\n".to_vec(), hold).await.is_err());
        assert!(handle.send(b"up\n".to_vec(), Duration::ZERO).await.is_err());
        assert!(start.elapsed() < hold);
    }

    #[test]
    fn log_sink_accepts_everything() {
        let mut sink = LogSink;
        assert_eq!(sink.write(b"up\nCMD:ENTER\n").unwrap(), 13);
        assert!(sink.flush().is_ok());
    }
}

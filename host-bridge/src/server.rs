//! Accept loop and per-connection handling.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::http::{read_request, write_response, HttpError, Response};
use crate::routes::{handle, AppState, Route};
use crate::video;

/// Time a client gets to send its complete request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Serve connections forever, one task per connection.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, &state).await {
                        debug!(peer = %peer, error = %e, "connection ended with error");
                    }
                });
            }
            Err(e) => {
                warn!(error = %e, "TCP accept error");
            }
        }
    }
}

/// Handle one request on `stream`, then close it.
pub async fn handle_connection<S>(stream: S, state: &AppState) -> std::io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    serve_one(stream, state, REQUEST_TIMEOUT).await
}

async fn serve_one<S>(stream: S, state: &AppState, timeout: Duration) -> std::io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader);

    let request = match tokio::time::timeout(timeout, read_request(&mut reader)).await {
        Ok(Ok(request)) => request,
        Ok(Err(HttpError::Closed)) => return Ok(()),
        Ok(Err(HttpError::Io(e))) => return Err(e),
        Ok(Err(e @ HttpError::BodyTooLarge)) => {
            return write_response(&mut writer, &Response::error(413, &e.to_string())).await;
        }
        Ok(Err(e @ HttpError::Malformed(_))) => {
            return write_response(&mut writer, &Response::error(400, &e.to_string())).await;
        }
        Err(_) => {
            return write_response(&mut writer, &Response::error(408, "request timeout")).await;
        }
    };

    debug!(method = %request.method, path = %request.path, "request");
    match handle(state, &request).await {
        Route::Response(response) => write_response(&mut writer, &response).await,
        Route::VideoFeed => stream_video(state, &mut writer).await,
    }
}

async fn stream_video<W>(state: &AppState, writer: &mut W) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut child = match video::spawn_capture(&state.video) {
        Ok(child) => child,
        Err(e) => {
            warn!(error = %e, "video feed unavailable");
            return write_response(writer, &Response::error(503, &e.to_string())).await;
        }
    };
    let Some(stdout) = child.stdout.take() else {
        return write_response(writer, &Response::error(503, "capture has no stdout")).await;
    };

    let head = format!(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: {}\r\n\
         Cache-Control: no-cache\r\n\
         Connection: close\r\n\
         \r\n",
        video::content_type(&state.video.boundary),
    );
    writer.write_all(head.as_bytes()).await?;

    let result = video::pump_frames(stdout, &state.video.boundary, writer).await;
    match &result {
        Ok(frames) => info!(frames, "video capture ended"),
        Err(e) => debug!(error = %e, "video client went away"),
    }
    // Dropping the child kills the capture program
    drop(child);
    result.map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VideoConfig;
    use crate::serial::spawn_writer;
    use crate::serial::tests::MemoryPort;
    use hid_relay_proto::Grammar;
    use tokio::io::{duplex, AsyncReadExt};

    fn state(port: MemoryPort, video: VideoConfig) -> AppState {
        AppState {
            serial: spawn_writer(port, 4).unwrap(),
            grammar: Grammar::Current,
            index_html: "<p>index</p>".into(),
            video,
        }
    }

    async fn exchange(state: &AppState, raw: &[u8]) -> String {
        let (mut client, server) = duplex(64 * 1024);
        client.write_all(raw).await.unwrap();
        handle_connection(server, state).await.unwrap();
        let mut out = Vec::new();
        client.read_to_end(&mut out).await.unwrap();
        String::from_utf8_lossy(&out).into_owned()
    }

    #[tokio::test]
    async fn post_mouse_reaches_the_port() {
        let port = MemoryPort::default();
        let state = state(port.clone(), VideoConfig::default());

        let body = r#"{"hid_action":"left_click"}"#;
        let raw = format!(
            "POST /api/mouse HTTP/1.1\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        );
        let reply = exchange(&state, raw.as_bytes()).await;

        assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"), "{reply}");
        assert!(reply.ends_with(r#"{"sent":["left_click"],"status":"ok"}"#), "{reply}");
        assert_eq!(&*port.0.lock().unwrap(), b"left_click\n");
    }

    #[tokio::test]
    async fn malformed_request_is_400() {
        let state = state(MemoryPort::default(), VideoConfig::default());
        let reply = exchange(&state, b"NONSENSE\r\n\r\n").await;
        assert!(reply.starts_with("HTTP/1.1 400 Bad Request\r\n"), "{reply}");
    }

    #[tokio::test]
    async fn oversized_body_is_413() {
        let state = state(MemoryPort::default(), VideoConfig::default());
        let reply = exchange(
            &state,
            b"POST /api/keyboard HTTP/1.1\r\nContent-Length: 999999999\r\n\r\n",
        )
        .await;
        assert!(reply.starts_with("HTTP/1.1 413 "), "{reply}");
    }

    #[tokio::test]
    async fn client_that_never_finishes_gets_408() {
        let state = state(MemoryPort::default(), VideoConfig::default());
        let (mut client, server) = duplex(1024);
        client.write_all(b"POST /api/mouse HTTP/1.1\r\n").await.unwrap();

        serve_one(server, &state, Duration::from_millis(50)).await.unwrap();
        let mut out = Vec::new();
        client.read_to_end(&mut out).await.unwrap();
        assert!(out.starts_with(b"HTTP/1.1 408 "));
    }

    #[tokio::test]
    async fn closed_connection_is_not_an_error() {
        let state = state(MemoryPort::default(), VideoConfig::default());
        let (client, server) = duplex(1024);
        drop(client);
        assert!(handle_connection(server, &state).await.is_ok());
    }

    #[tokio::test]
    async fn video_feed_without_capture_program_is_503() {
        let video = VideoConfig {
            command: "/nonexistent/capture-program".into(),
            ..VideoConfig::default()
        };
        let state = state(MemoryPort::default(), video);
        let reply = exchange(&state, b"GET /video_feed HTTP/1.1\r\n\r\n").await;
        assert!(reply.starts_with("HTTP/1.1 503 "), "{reply}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn video_feed_streams_capture_output() {
        let video = VideoConfig {
            enabled: true,
            command: "sh".into(),
            args: vec!["-c".into(), r"printf '\377\330ab\377\331'".into()],
            boundary: "frame".into(),
        };
        let state = state(MemoryPort::default(), video);

        let (mut client, server) = duplex(64 * 1024);
        client
            .write_all(b"GET /video_feed HTTP/1.1\r\n\r\n")
            .await
            .unwrap();
        handle_connection(server, &state).await.unwrap();
        let mut out = Vec::new();
        client.read_to_end(&mut out).await.unwrap();

        let head = b"HTTP/1.1 200 OK\r\nContent-Type: multipart/x-mixed-replace; boundary=frame\r\n";
        assert!(out.starts_with(head));
        let part: &[u8] =
            b"--frame\r\nContent-Type: image/jpeg\r\nContent-Length: 6\r\n\r\n\xFF\xD8ab\xFF\xD9\r\n";
        assert!(out.ends_with(part));
    }
}

//! HTTP route handlers.
//!
//! Each accepted command is encoded into lines and handed to the serial
//! writer as a single write. A write never carries more lines than the
//! device can queue.

use std::time::Duration;

use hid_relay_proto::{
    playback_time_ms, write_key_line, write_mouse_line, write_text_lines, EncodeError, Grammar,
    MouseAction, MAX_BURST_LINES,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::config::VideoConfig;
use crate::error::BridgeError;
use crate::http::{Request, Response};
use crate::serial::SerialHandle;

/// Built-in control page.
pub const DEFAULT_INDEX_HTML: &str = include_str!("../static/index.html");

/// Shared state of every connection.
pub struct AppState {
    pub serial: SerialHandle,
    pub grammar: Grammar,
    pub index_html: String,
    pub video: VideoConfig,
}

/// What the connection handler should do with a request.
#[derive(Debug, PartialEq, Eq)]
pub enum Route {
    Response(Response),
    /// Hand the connection over to the MJPEG stream.
    VideoFeed,
}

impl From<Response> for Route {
    fn from(response: Response) -> Self {
        Self::Response(response)
    }
}

#[derive(Deserialize)]
struct MouseBody {
    hid_action: String,
}

#[derive(Deserialize)]
struct KeyboardBody {
    hid_key: Option<String>,
    hid_text: Option<String>,
}

#[derive(Deserialize)]
struct ControlBody {
    action: String,
}

#[derive(Deserialize)]
struct TypeBody {
    #[serde(default)]
    text: String,
}

/// Tokens `/control` accepts.
const CONTROL_ACTIONS: [MouseAction; 5] = [
    MouseAction::Up,
    MouseAction::Down,
    MouseAction::Left,
    MouseAction::Right,
    MouseAction::LeftClick,
];

/// Dispatch one request.
pub async fn handle(state: &AppState, request: &Request) -> Route {
    let legacy = state.grammar == Grammar::Legacy;
    let method = request.method.as_str();

    match (method, request.path.as_str()) {
        ("GET", "/") => Response::html(state.index_html.clone()).into(),
        ("POST", "/api/mouse") => mouse(state, &request.body).await.into(),
        ("POST", "/api/keyboard") => keyboard(state, &request.body).await.into(),
        ("GET", "/video_feed") if state.video.enabled => Route::VideoFeed,
        ("POST", "/control") if legacy => control(state, &request.body).await.into(),
        ("POST", "/type") if legacy => type_text(state, &request.body).await.into(),

        (_, "/" | "/api/mouse" | "/api/keyboard") => method_not_allowed(),
        (_, "/video_feed") if state.video.enabled => method_not_allowed(),
        (_, "/control" | "/type") if legacy => method_not_allowed(),
        _ => Response::error(404, "not found").into(),
    }
}

fn method_not_allowed() -> Route {
    Response::error(405, "method not allowed").into()
}

fn parse_body<'a, T: Deserialize<'a>>(body: &'a [u8]) -> Result<T, Response> {
    serde_json::from_slice(body).map_err(|e| {
        debug!(error = %e, "rejected request body");
        Response::error(400, &format!("invalid request body: {e}"))
    })
}

async fn mouse(state: &AppState, body: &[u8]) -> Response {
    let body: MouseBody = match parse_body(body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    let mut lines = String::new();
    if let Err(e) = write_mouse_line(&mut lines, &body.hid_action) {
        return encode_error(e);
    }
    send_lines(state, lines).await
}

async fn keyboard(state: &AppState, body: &[u8]) -> Response {
    let body: KeyboardBody = match parse_body(body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    let mut lines = String::new();
    let encoded = match (&body.hid_key, &body.hid_text) {
        (Some(key), _) => write_key_line(&mut lines, key, state.grammar),
        (None, Some(text)) => write_text_lines(&mut lines, text, state.grammar),
        (None, None) => return Response::error(400, "missing hid_key or hid_text"),
    };
    if let Err(e) = encoded {
        return encode_error(e);
    }
    send_lines(state, lines).await
}

async fn control(state: &AppState, body: &[u8]) -> Response {
    let body: ControlBody = match parse_body(body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    let accepted = CONTROL_ACTIONS
        .iter()
        .any(|a| a.token(Grammar::Legacy) == Some(body.action.as_str()));
    if !accepted {
        return Response::json(400, &json!({ "status": "error" }));
    }

    let mut lines = String::new();
    if let Err(e) = write_mouse_line(&mut lines, &body.action) {
        return encode_error(e);
    }
    match write_lines(state, lines).await {
        Ok(()) => Response::json(200, &json!({ "status": "ok", "action": body.action })),
        Err(e) => serial_error(&e),
    }
}

async fn type_text(state: &AppState, body: &[u8]) -> Response {
    let body: TypeBody = match parse_body(body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    let mut lines = String::new();
    if let Err(e) = write_text_lines(&mut lines, &body.text, Grammar::Legacy) {
        return encode_error(e);
    }
    let lines = truncate_burst(lines);
    match write_lines(state, lines).await {
        Ok(()) => Response::json(200, &json!({ "status": "ok", "text": body.text })),
        Err(e) => serial_error(&e),
    }
}

/// Write `lines` and answer with the lines sent.
async fn send_lines(state: &AppState, lines: String) -> Response {
    let count = lines.lines().count();
    if count > MAX_BURST_LINES {
        return Response::error(
            413,
            &format!("command needs {count} lines, the device queues at most {MAX_BURST_LINES}"),
        );
    }
    let response = {
        let sent: Vec<&str> = lines.lines().collect();
        Response::json(200, &json!({ "status": "ok", "sent": sent }))
    };
    match write_lines(state, lines).await {
        Ok(()) => response,
        Err(e) => serial_error(&e),
    }
}

async fn write_lines(state: &AppState, lines: String) -> Result<(), BridgeError> {
    if lines.is_empty() {
        return Ok(());
    }
    let hold = Duration::from_millis(playback_time_ms(&lines, state.grammar));
    state.serial.send(lines.into_bytes(), hold).await
}

/// Keep the first [`MAX_BURST_LINES`] lines of `lines`.
///
/// `/type` has no way to report an error, so excess lines are dropped here
/// and logged instead of being lost on the device.
fn truncate_burst(lines: String) -> String {
    let count = lines.lines().count();
    if count <= MAX_BURST_LINES {
        return lines;
    }
    warn!(lines = count, kept = MAX_BURST_LINES, "text too long, truncating");
    lines
        .split_inclusive('\n')
        .take(MAX_BURST_LINES)
        .collect()
}

fn encode_error(e: EncodeError) -> Response {
    Response::error(400, &BridgeError::from(e).to_string())
}

fn serial_error(e: &BridgeError) -> Response {
    warn!(error = %e, "command not delivered");
    Response::error(500, &e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::spawn_writer;
    use crate::serial::tests::{BrokenPort, MemoryPort};
    use hid_relay_proto::max_text_chunk;
    use std::collections::HashMap;

    fn state(port: MemoryPort, grammar: Grammar) -> AppState {
        AppState {
            serial: spawn_writer(port, 4).unwrap(),
            grammar,
            index_html: "<h1>relay</h1>".into(),
            video: VideoConfig::default(),
        }
    }

    fn request(method: &str, path: &str, body: &str) -> Request {
        Request {
            method: method.into(),
            path: path.into(),
            headers: HashMap::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    async fn call(state: &AppState, method: &str, path: &str, body: &str) -> Response {
        match handle(state, &request(method, path, body)).await {
            Route::Response(response) => response,
            Route::VideoFeed => panic!("unexpected video route"),
        }
    }

    fn json_body(response: &Response) -> serde_json::Value {
        serde_json::from_slice(&response.body).unwrap()
    }

    fn written(port: &MemoryPort) -> String {
        String::from_utf8(port.0.lock().unwrap().clone()).unwrap()
    }

    #[tokio::test]
    async fn mouse_token_is_sent_verbatim() {
        let port = MemoryPort::default();
        let state = state(port.clone(), Grammar::Current);

        let response = call(&state, "POST", "/api/mouse", r#"{"hid_action":"up"}"#).await;
        assert_eq!(response.status, 200);
        assert_eq!(json_body(&response), json!({ "status": "ok", "sent": ["up"] }));

        // Unknown tokens pass through; the device ignores them
        let response = call(&state, "POST", "/api/mouse", r#"{"hid_action":"jump"}"#).await;
        assert_eq!(response.status, 200);
        assert_eq!(written(&port), "up\njump\n");
    }

    #[tokio::test]
    async fn mouse_token_with_newline_is_rejected() {
        let port = MemoryPort::default();
        let state = state(port.clone(), Grammar::Current);

        let response = call(&state, "POST", "/api/mouse", r#"{"hid_action":"up\ndown"}"#).await;
        assert_eq!(response.status, 400);
        assert_eq!(written(&port), "");
    }

    #[tokio::test]
    async fn keyboard_key_and_text() {
        let port = MemoryPort::default();
        let state = state(port.clone(), Grammar::Current);

        let response = call(&state, "POST", "/api/keyboard", r#"{"hid_key":"ENTER"}"#).await;
        assert_eq!(response.status, 200);

        let response = call(&state, "POST", "/api/keyboard", r#"{"hid_text":"Hi\nyo"}"#).await;
        assert_eq!(
            json_body(&response),
            json!({ "status": "ok", "sent": ["TEXT:Hi", "CMD:ENTER", "TEXT:yo"] })
        );
        assert_eq!(written(&port), "CMD:ENTER\nTEXT:Hi\nCMD:ENTER\nTEXT:yo\n");
    }

    #[tokio::test]
    async fn hid_key_wins_over_hid_text() {
        let port = MemoryPort::default();
        let state = state(port.clone(), Grammar::Current);

        let body = r#"{"hid_key":"BACKSPACE","hid_text":"ignored"}"#;
        let response = call(&state, "POST", "/api/keyboard", body).await;
        assert_eq!(response.status, 200);
        assert_eq!(written(&port), "CMD:BACKSPACE\n");
    }

    #[tokio::test]
    async fn empty_text_writes_nothing() {
        let port = MemoryPort::default();
        let state = state(port.clone(), Grammar::Current);

        let response = call(&state, "POST", "/api/keyboard", r#"{"hid_text":""}"#).await;
        assert_eq!(response.status, 200);
        assert_eq!(json_body(&response), json!({ "status": "ok", "sent": [] }));
        assert_eq!(written(&port), "");
    }

    #[tokio::test]
    async fn bad_bodies_are_400() {
        let state = state(MemoryPort::default(), Grammar::Current);

        for (path, body) in [
            ("/api/mouse", "not json"),
            ("/api/mouse", r#"{"action":"up"}"#),
            ("/api/keyboard", "{}"),
            ("/api/keyboard", r#"{"hid_key":5}"#),
        ] {
            let response = call(&state, "POST", path, body).await;
            assert_eq!(response.status, 400, "{path} {body}");
            assert_eq!(json_body(&response)["status"], "error");
        }
    }

    #[tokio::test]
    async fn legacy_keyboard_only_knows_shift() {
        let port = MemoryPort::default();
        let state = state(port.clone(), Grammar::Legacy);

        let response = call(&state, "POST", "/api/keyboard", r#"{"hid_key":"SHIFT"}"#).await;
        assert_eq!(response.status, 200);
        let response = call(&state, "POST", "/api/keyboard", r#"{"hid_key":"ENTER"}"#).await;
        assert_eq!(response.status, 400);
        let response = call(&state, "POST", "/api/keyboard", r#"{"hid_text":"a\nb"}"#).await;
        assert_eq!(response.status, 200);

        assert_eq!(written(&port), "shift\ntype:a\ntype:b\n");
    }

    #[tokio::test]
    async fn serial_failure_is_500() {
        let state = AppState {
            serial: spawn_writer(BrokenPort, 1).unwrap(),
            grammar: Grammar::Current,
            index_html: String::new(),
            video: VideoConfig::default(),
        };
        let response = call(&state, "POST", "/api/mouse", r#"{"hid_action":"up"}"#).await;
        assert_eq!(response.status, 500);
        assert_eq!(json_body(&response)["status"], "error");
    }

    #[tokio::test]
    async fn unknown_route_and_wrong_method() {
        let state = state(MemoryPort::default(), Grammar::Current);

        assert_eq!(call(&state, "GET", "/nope", "").await.status, 404);
        assert_eq!(call(&state, "GET", "/api/mouse", "").await.status, 405);
        assert_eq!(call(&state, "POST", "/", "").await.status, 405);
        // Legacy routes are not mounted with the current grammar
        assert_eq!(call(&state, "POST", "/control", "").await.status, 404);
        assert_eq!(call(&state, "POST", "/type", "").await.status, 404);
    }

    #[tokio::test]
    async fn index_page_is_served() {
        let state = state(MemoryPort::default(), Grammar::Current);
        let response = call(&state, "GET", "/", "").await;
        assert_eq!(response.status, 200);
        assert!(response.content_type.starts_with("text/html"));
        assert_eq!(response.body, b"<h1>relay</h1>");
    }

    #[tokio::test]
    async fn video_route_follows_config() {
        let mut state = state(MemoryPort::default(), Grammar::Current);
        let get = request("GET", "/video_feed", "");
        assert_eq!(handle(&state, &get).await, Route::VideoFeed);

        state.video.enabled = false;
        match handle(&state, &get).await {
            Route::Response(response) => assert_eq!(response.status, 404),
            Route::VideoFeed => panic!("video disabled"),
        }
    }

    #[tokio::test]
    async fn legacy_control_accepts_the_five_actions() {
        let port = MemoryPort::default();
        let state = state(port.clone(), Grammar::Legacy);

        let response = call(&state, "POST", "/control", r#"{"action":"click"}"#).await;
        assert_eq!(response.status, 200);
        assert_eq!(json_body(&response), json!({ "status": "ok", "action": "click" }));

        for action in ["right_click", "left_click", "shift"] {
            let body = format!(r#"{{"action":"{action}"}}"#);
            let response = call(&state, "POST", "/control", &body).await;
            assert_eq!(response.status, 400);
            assert_eq!(json_body(&response), json!({ "status": "error" }));
        }
        assert_eq!(written(&port), "click\n");
    }

    #[tokio::test]
    async fn legacy_type_always_answers_ok() {
        let port = MemoryPort::default();
        let state = state(port.clone(), Grammar::Legacy);

        let response = call(&state, "POST", "/type", r#"{"text":"hello "}"#).await;
        assert_eq!(json_body(&response), json!({ "status": "ok", "text": "hello " }));
        let response = call(&state, "POST", "/type", r#"{"text":""}"#).await;
        assert_eq!(json_body(&response), json!({ "status": "ok", "text": "" }));

        assert_eq!(written(&port), "type:hello \n");
    }

    #[tokio::test]
    async fn text_beyond_the_device_queue_is_413() {
        let port = MemoryPort::default();
        let state = state(port.clone(), Grammar::Current);

        // Six segments encode to eleven lines
        let body = r#"{"hid_text":"one\ntwo\nthree\nfour\nfive\nsix"}"#;
        let response = call(&state, "POST", "/api/keyboard", body).await;
        assert_eq!(response.status, 413);
        assert_eq!(json_body(&response)["status"], "error");

        // So do 2600 characters
        let body = format!(r#"{{"hid_text":"{}"}}"#, "x".repeat(2600));
        let response = call(&state, "POST", "/api/keyboard", &body).await;
        assert_eq!(response.status, 413);
        assert_eq!(written(&port), "");
    }

    #[tokio::test]
    async fn text_filling_the_device_queue_is_sent() {
        let port = MemoryPort::default();
        let state = state(port.clone(), Grammar::Current);

        // Five segments encode to nine lines
        let body = r#"{"hid_text":"a\nb\nc\nd\ne"}"#;
        let response = call(&state, "POST", "/api/keyboard", body).await;
        assert_eq!(response.status, 200);
        assert_eq!(written(&port).lines().count(), MAX_BURST_LINES);
    }

    #[tokio::test]
    async fn legacy_type_without_text_is_ok() {
        let port = MemoryPort::default();
        let state = state(port.clone(), Grammar::Legacy);

        let response = call(&state, "POST", "/type", "{}").await;
        assert_eq!(response.status, 200);
        assert_eq!(json_body(&response), json!({ "status": "ok", "text": "" }));
        assert_eq!(written(&port), "");
    }

    #[tokio::test]
    async fn legacy_type_keeps_what_the_device_can_queue() {
        let port = MemoryPort::default();
        let state = state(port.clone(), Grammar::Legacy);

        let text = "y".repeat(max_text_chunk(Grammar::Legacy) * 12);
        let body = format!(r#"{{"text":"{text}"}}"#);
        let response = call(&state, "POST", "/type", &body).await;
        assert_eq!(response.status, 200);
        assert_eq!(json_body(&response)["text"], text.as_str());

        let written = written(&port);
        assert_eq!(written.lines().count(), MAX_BURST_LINES);
        assert!(written.lines().all(|l| l.starts_with("type:")));
        assert!(written.ends_with('\n'));
    }
}

//! Fakes for the backend and renderer seams, plus a local HTTP stub.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::backend::{ChatBackend, ThreadId};
use crate::error::{WidgetError, WidgetResult};
use crate::events::EntryRole;
use crate::render::Renderer;

#[derive(Default)]
struct FakeState {
    thread: Option<WidgetResult<ThreadId>>,
    replies: VecDeque<WidgetResult<String>>,
    delay: Duration,
    thread_requests: Vec<u64>,
    chat_requests: Vec<(u64, String, String)>,
}

/// Scripted backend. Without scripted replies it echoes the message.
#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        let backend = Self::default();
        backend.state.lock().unwrap().thread = Some(Ok(thread("thread-1")));
        backend
    }

    pub fn with_thread(self, id: Value) -> Self {
        self.state.lock().unwrap().thread = Some(Ok(ThreadId::from_value(&id).unwrap()));
        self
    }

    pub fn failing_start(self, error: WidgetError) -> Self {
        self.state.lock().unwrap().thread = Some(Err(error));
        self
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        self.set_delay(delay);
        self
    }

    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = delay;
    }

    pub fn push_reply(&self, reply: WidgetResult<String>) {
        self.state.lock().unwrap().replies.push_back(reply);
    }

    pub fn thread_requests(&self) -> Vec<u64> {
        self.state.lock().unwrap().thread_requests.clone()
    }

    pub fn chat_requests(&self) -> Vec<(u64, String, String)> {
        self.state.lock().unwrap().chat_requests.clone()
    }
}

fn thread(id: &str) -> ThreadId {
    ThreadId::from_value(&Value::String(id.to_string())).unwrap()
}

#[async_trait]
impl ChatBackend for FakeBackend {
    async fn create_thread(&self, organization_id: u64) -> WidgetResult<ThreadId> {
        let (delay, result) = {
            let mut state = self.state.lock().unwrap();
            state.thread_requests.push(organization_id);
            let result = match state.thread.take() {
                Some(Ok(id)) => {
                    state.thread = Some(Ok(id.clone()));
                    Ok(id)
                }
                Some(Err(e)) => Err(e),
                None => Err(WidgetError::transport("no thread scripted")),
            };
            (state.delay, result)
        };
        tokio::time::sleep(delay).await;
        result
    }

    async fn send_message(
        &self,
        organization_id: u64,
        thread_id: &ThreadId,
        message: &str,
    ) -> WidgetResult<String> {
        let (delay, reply) = {
            let mut state = self.state.lock().unwrap();
            state
                .chat_requests
                .push((organization_id, thread_id.to_string(), message.to_string()));
            let reply = state
                .replies
                .pop_front()
                .unwrap_or_else(|| Ok(format!("echo: {message}")));
            (state.delay, reply)
        };
        tokio::time::sleep(delay).await;
        reply
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderCall {
    Entry(EntryRole, String),
    Clear,
    Error(String),
    Input(bool),
    Scroll,
}

/// Renderer that records every call
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub calls: Vec<RenderCall>,
}

impl RecordingRenderer {
    /// Entries currently visible, i.e. rendered since the last clear
    pub fn visible(&self) -> Vec<(EntryRole, String)> {
        let mut visible = Vec::new();
        for call in &self.calls {
            match call {
                RenderCall::Entry(role, text) => visible.push((*role, text.clone())),
                RenderCall::Clear => visible.clear(),
                _ => {}
            }
        }
        visible
    }

    pub fn errors(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, RenderCall::Error(_)))
            .count()
    }

    pub fn input_enabled(&self) -> Option<bool> {
        self.calls.iter().rev().find_map(|c| match c {
            RenderCall::Input(enabled) => Some(*enabled),
            _ => None,
        })
    }
}

impl Renderer for RecordingRenderer {
    fn render_entry(&mut self, role: EntryRole, text: &str) {
        self.calls.push(RenderCall::Entry(role, text.to_string()));
    }

    fn clear_entries(&mut self) {
        self.calls.push(RenderCall::Clear);
    }

    fn show_error(&mut self, error: &WidgetError) {
        self.calls.push(RenderCall::Error(error.to_string()));
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        self.calls.push(RenderCall::Input(enabled));
    }

    fn scroll_to_latest(&mut self) {
        self.calls.push(RenderCall::Scroll);
    }
}

/// One request captured by [`StubServer`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub request_line: String,
    headers: Vec<(String, String)>,
    pub body: Value,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// HTTP/1.1 server on 127.0.0.1 that answers one connection per scripted
/// `(status line, body)` pair, in order, and records what it received.
pub struct StubServer {
    base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubServer {
    pub async fn start(responses: Vec<(&'static str, &'static str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = requests.clone();
        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let request = read_request(&mut socket).await;
                recorded.lock().unwrap().push(request);

                let response = format!(
                    "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
            }
        });

        Self { base_url, requests }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn read_request(socket: &mut TcpStream) -> RecordedRequest {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let head_end = loop {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before the request head");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default().to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_ascii_lowercase(), value.trim().to_string()))
        .collect();

    let length = headers
        .iter()
        .find(|(key, _)| key == "content-length")
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < head_end + length {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before the request body");
        buf.extend_from_slice(&chunk[..n]);
    }

    RecordedRequest {
        request_line,
        headers,
        body: serde_json::from_slice(&buf[head_end..head_end + length]).unwrap_or(Value::Null),
    }
}

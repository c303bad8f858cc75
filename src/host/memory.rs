//! In-process host.
//!
//! Keeps the queued status, headers and body in memory until the owner
//! converts it into an axum [`Response`] for transmission.

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};

use crate::host::{ExecutionContext, Host};
use crate::http::cookie::Cookie;

/// Host state held in memory for one response.
#[derive(Debug, Clone)]
pub struct MemoryHost {
    status: u16,
    status_line: Option<String>,
    headers: Vec<(String, String)>,
    body: String,
    sent: bool,
    clock: Option<DateTime<Utc>>,
    context: ExecutionContext,
    compressed: bool,
    buffered: Vec<usize>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    /// A fresh host reporting `200` with nothing queued.
    pub fn new() -> Self {
        Self {
            status: 200,
            status_line: None,
            headers: Vec::new(),
            body: String::new(),
            sent: false,
            clock: None,
            context: ExecutionContext::Http,
            compressed: false,
            buffered: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Pin the clock instead of reading the system time.
    pub fn with_clock(mut self, now: DateTime<Utc>) -> Self {
        self.clock = Some(now);
        self
    }

    pub fn with_context(mut self, context: ExecutionContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_compression(mut self, compressed: bool) -> Self {
        self.compressed = compressed;
        self
    }

    pub fn with_buffered_output(mut self, chunks: Vec<usize>) -> Self {
        self.buffered = chunks;
        self
    }

    /// Simulate the server flushing headers to the client.
    pub fn mark_sent(&mut self) {
        self.sent = true;
    }

    /// Last status line emitted, if any.
    pub fn status_line(&self) -> Option<&str> {
        self.status_line.as_deref()
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// All queued values of `name`, case-insensitive.
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

impl Host for MemoryHost {
    fn status(&self) -> u16 {
        self.status
    }

    fn send_status_line(&mut self, code: u16, line: &str) {
        self.status = code;
        self.status_line = Some(line.to_string());
    }

    fn headers(&self) -> Vec<(String, String)> {
        self.headers.clone()
    }

    fn replace_header(&mut self, name: &str, value: &str) {
        match self.headers.iter().position(|(n, _)| n.eq_ignore_ascii_case(name)) {
            Some(first) => {
                self.headers[first] = (name.to_string(), value.to_string());
                let mut index = 0;
                self.headers.retain(|(n, _)| {
                    let keep = index <= first || !n.eq_ignore_ascii_case(name);
                    index += 1;
                    keep
                });
            }
            None => self.append_header(name, value),
        }
    }

    fn append_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    fn remove_header(&mut self, name: &str) {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    fn headers_sent(&self) -> bool {
        self.sent
    }

    fn set_cookie(&mut self, cookie: &Cookie) {
        let value = cookie.to_header_value(self.now());
        self.append_header("Set-Cookie", &value);
    }

    fn write_body(&mut self, chunk: &str) {
        self.body.push_str(chunk);
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.unwrap_or_else(Utc::now)
    }

    fn context(&self) -> ExecutionContext {
        self.context
    }

    fn output_compressed(&self) -> bool {
        self.compressed
    }

    fn buffered_output(&self) -> Vec<usize> {
        self.buffered.clone()
    }
}

impl IntoResponse for MemoryHost {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = status;

        let headers = response.headers_mut();
        for (name, value) in self.headers {
            match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(&value)) {
                (Ok(header_name), Ok(header_value)) => {
                    headers.append(header_name, header_value);
                }
                _ => tracing::warn!(header = %name, "Dropping header that is not valid on the wire"),
            }
        }
        response
    }
}

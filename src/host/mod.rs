//! Host environment abstraction.
//!
//! # Data Flow
//! ```text
//! ResponseFacade (validation, formatting)
//!     → Host (status line, header list, cookies, body)
//!     → the server that actually transmits bytes
//! ```
//!
//! # Design Decisions
//! - The façade keeps no header mirror; reads go back to the host
//! - Wall-clock time comes from the host so tests can pin it

pub mod memory;

use chrono::{DateTime, Utc};

use crate::http::cookie::Cookie;

pub use memory::MemoryHost;

/// Where the façade is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionContext {
    /// Serving an HTTP request.
    #[default]
    Http,
    /// Command-line context; there is no client to send headers to.
    Cli,
}

/// Primitives a server runtime exposes to the façade.
pub trait Host {
    /// Status code the host currently reports.
    fn status(&self) -> u16;

    /// Record the status code and emit its status line.
    fn send_status_line(&mut self, code: u16, line: &str);

    /// Headers currently queued for transmission, in order.
    fn headers(&self) -> Vec<(String, String)>;

    /// Replace every header named `name` (case-insensitive) with one value.
    fn replace_header(&mut self, name: &str, value: &str);

    /// Queue another header without touching existing ones.
    fn append_header(&mut self, name: &str, value: &str);

    /// Drop every header named `name` (case-insensitive).
    fn remove_header(&mut self, name: &str);

    /// Whether headers have left the process.
    fn headers_sent(&self) -> bool;

    /// Queue a cookie for transmission.
    fn set_cookie(&mut self, cookie: &Cookie);

    /// Append to the response body.
    fn write_body(&mut self, chunk: &str);

    /// Current wall-clock time.
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn context(&self) -> ExecutionContext {
        ExecutionContext::Http
    }

    /// Whether the host compresses output (and so owns `Content-Length`).
    fn output_compressed(&self) -> bool {
        false
    }

    /// Sizes of the host's output buffer chunks, outermost first.
    fn buffered_output(&self) -> Vec<usize> {
        Vec::new()
    }
}

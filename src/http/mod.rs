//! HTTP response handling subsystem.
//!
//! # Data Flow
//! ```text
//! handler code
//!     → response.rs (validate, format)
//!     → status.rs / cookie.rs / date.rs (tables and renderers)
//!     → crate::host::Host (queue status, headers, cookies, body)
//!     → server.rs (demo: MemoryHost → axum Response → client)
//! ```

pub mod cookie;
pub mod date;
pub mod response;
pub mod server;
pub mod status;

pub use cookie::{Cookie, CookieOptions, SameSite};
pub use response::{Expiry, ResponseFacade};
pub use server::HttpServer;

//! Response façade over host HTTP primitives.

pub mod config;
pub mod error;
pub mod host;
pub mod http;
pub mod observability;

pub use config::FacadeConfig;
pub use error::{ResponseError, ResponseResult};
pub use host::{ExecutionContext, Host, MemoryHost};
pub use http::{CookieOptions, Expiry, HttpServer, ResponseFacade, SameSite};

//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! ResponseFacade / server:
//!     → tracing events (debug per mutation, warn on diagnostics)
//!     → logging.rs subscriber (EnvFilter + fmt layer) → stdout
//! ```

pub mod logging;

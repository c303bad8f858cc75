//! HTTP date formatting.

use chrono::{DateTime, Utc};

/// `Expires` value used when caching is disabled.
pub const EXPIRED_DATE: &str = "Mon, 23 Jan 1978 10:00:00 GMT";

/// Format `at` as an IMF-fixdate (`Sun, 06 Nov 1994 08:49:37 GMT`).
pub fn format_http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

//! Status code validation and reason phrases.

use axum::http::StatusCode;

use crate::error::{ResponseError, ResponseResult};

/// Lowest status code accepted by the façade.
pub const MIN_STATUS: u16 = 100;

/// Highest status code accepted by the façade.
pub const MAX_STATUS: u16 = 599;

/// Reject codes outside `[100, 599]`.
pub fn validate_status(code: u16) -> ResponseResult<()> {
    if (MIN_STATUS..=MAX_STATUS).contains(&code) {
        Ok(())
    } else {
        Err(ResponseError::argument(format!(
            "status code {} is outside {}..={}",
            code, MIN_STATUS, MAX_STATUS
        )))
    }
}

/// Standard reason phrase for `code`, if it is a registered status.
pub fn reason_phrase(code: u16) -> Option<&'static str> {
    StatusCode::from_u16(code)
        .ok()
        .and_then(|status| status.canonical_reason())
}

/// Build the `HTTP/1.1` status line sent to the host.
pub fn status_line(code: u16, reason: Option<&str>) -> String {
    match reason.or_else(|| reason_phrase(code)) {
        Some(reason) if !reason.is_empty() => format!("HTTP/1.1 {} {}", code, reason),
        _ => format!("HTTP/1.1 {}", code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_bounds() {
        assert!(validate_status(99).is_err());
        assert!(validate_status(100).is_ok());
        assert!(validate_status(599).is_ok());
        assert!(validate_status(600).is_err());
    }

    #[test]
    fn test_known_phrases() {
        assert_eq!(reason_phrase(200), Some("OK"));
        assert_eq!(reason_phrase(404), Some("Not Found"));
        assert_eq!(reason_phrase(302), Some("Found"));
        assert_eq!(reason_phrase(599), None);
    }

    #[test]
    fn test_status_line_override() {
        assert_eq!(status_line(404, None), "HTTP/1.1 404 Not Found");
        assert_eq!(status_line(404, Some("Gone Fishing")), "HTTP/1.1 404 Gone Fishing");
        assert_eq!(status_line(599, None), "HTTP/1.1 599");
    }
}

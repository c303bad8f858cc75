//! Cookie model and `Set-Cookie` rendering.
//!
//! # Scope resolution
//! Path and domain fall back on each other asymmetrically:
//!
//! | path given | domain given | path          | domain         |
//! |------------|--------------|---------------|----------------|
//! | yes        | yes          | given         | given          |
//! | no         | yes          | `/`           | given          |
//! | yes        | no           | given         | empty          |
//! | no         | no           | config default| config default |

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ResponseError, ResponseResult};
use crate::http::date::format_http_date;

/// Characters that may not appear in a cookie name.
const FORBIDDEN_NAME_CHARS: &[char] = &['=', ',', ';', ' ', '\t', '\r', '\n', '\x0b', '\x0c'];

/// `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SameSite::Strict => write!(f, "Strict"),
            SameSite::Lax => write!(f, "Lax"),
            SameSite::None => write!(f, "None"),
        }
    }
}

impl FromStr for SameSite {
    type Err = ResponseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Strict" => Ok(SameSite::Strict),
            "Lax" => Ok(SameSite::Lax),
            "None" => Ok(SameSite::None),
            other => Err(ResponseError::argument(format!(
                "unknown SameSite policy '{}'",
                other
            ))),
        }
    }
}

/// Caller-supplied cookie attributes. Unset fields fall back per the
/// scope table above and the configured defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    pub expires: Option<DateTime<Utc>>,
    pub path: Option<String>,
    pub domain: Option<String>,
    pub secure: Option<bool>,
    pub http_only: bool,
    pub same_site: SameSite,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            expires: None,
            path: None,
            domain: None,
            secure: None,
            http_only: true,
            same_site: SameSite::Lax,
        }
    }
}

impl CookieOptions {
    pub fn expires(mut self, at: DateTime<Utc>) -> Self {
        self.expires = Some(at);
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = Some(secure);
        self
    }

    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }
}

/// Resolved path and domain of a cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieScope {
    pub path: String,
    pub domain: String,
}

/// Apply the path/domain fallback table.
pub fn resolve_scope(
    path: Option<&str>,
    domain: Option<&str>,
    default_path: &str,
    default_domain: &str,
) -> CookieScope {
    let (path, domain) = match (path, domain) {
        (Some(path), Some(domain)) => (path, domain),
        (None, Some(domain)) => ("/", domain),
        (Some(path), None) => (path, ""),
        (None, None) => (default_path, default_domain),
    };
    CookieScope {
        path: path.to_string(),
        domain: domain.to_string(),
    }
}

/// Reject empty names and names containing separators or whitespace.
pub fn validate_cookie_name(name: &str) -> ResponseResult<()> {
    if name.is_empty() {
        return Err(ResponseError::argument("cookie name cannot be empty"));
    }
    if name.contains(FORBIDDEN_NAME_CHARS) {
        return Err(ResponseError::argument(format!(
            "cookie name '{}' contains a forbidden character",
            name.escape_debug()
        )));
    }
    Ok(())
}

/// Whether a path or domain would break out of its `Set-Cookie` attribute.
pub fn has_cookie_delimiter(value: &str) -> bool {
    value.contains(|c: char| matches!(c, ';' | ',') || c.is_ascii_control())
}

/// A fully resolved cookie, ready to hand to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub expires: Option<DateTime<Utc>>,
    pub path: String,
    pub domain: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
}

impl Cookie {
    /// Render the `Set-Cookie` header value. `now` drives `Max-Age`.
    pub fn to_header_value(&self, now: DateTime<Utc>) -> String {
        let value: String = url::form_urlencoded::byte_serialize(self.value.as_bytes()).collect();
        let mut out = format!("{}={}", self.name, value);

        if let Some(expires) = self.expires {
            let max_age = (expires - now).num_seconds().max(0);
            out.push_str(&format!("; Expires={}; Max-Age={}", format_http_date(expires), max_age));
        }
        if !self.path.is_empty() {
            out.push_str(&format!("; Path={}", self.path));
        }
        if !self.domain.is_empty() {
            out.push_str(&format!("; Domain={}", self.domain));
        }
        if self.secure {
            out.push_str("; Secure");
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        out.push_str(&format!("; SameSite={}", self.same_site));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_scope_table() {
        assert_eq!(
            resolve_scope(None, Some("example.com"), "/app", "default.test"),
            CookieScope { path: "/".into(), domain: "example.com".into() }
        );
        assert_eq!(
            resolve_scope(Some("/x"), None, "/app", "default.test"),
            CookieScope { path: "/x".into(), domain: String::new() }
        );
        assert_eq!(
            resolve_scope(Some("/x"), Some("example.com"), "/app", "default.test"),
            CookieScope { path: "/x".into(), domain: "example.com".into() }
        );
        assert_eq!(
            resolve_scope(None, None, "/app", "default.test"),
            CookieScope { path: "/app".into(), domain: "default.test".into() }
        );
    }

    #[test]
    fn test_same_site_exact_strings() {
        assert_eq!("Strict".parse::<SameSite>().unwrap(), SameSite::Strict);
        assert_eq!("None".parse::<SameSite>().unwrap(), SameSite::None);
        assert!("lax".parse::<SameSite>().is_err());
        assert_eq!(SameSite::Lax.to_string(), "Lax");
    }

    #[test]
    fn test_cookie_name_validation() {
        assert!(validate_cookie_name("session").is_ok());
        assert!(validate_cookie_name("").is_err());
        assert!(validate_cookie_name("a=b").is_err());
        assert!(validate_cookie_name("a b").is_err());
        assert!(validate_cookie_name("a\r\nSet-Cookie").is_err());
    }

    #[test]
    fn test_cookie_delimiters() {
        assert!(!has_cookie_delimiter("/app"));
        assert!(!has_cookie_delimiter("example.com"));
        assert!(has_cookie_delimiter("a.test,b.test"));
        assert!(has_cookie_delimiter("/x; Secure"));
        assert!(has_cookie_delimiter("/x\x01"));
    }

    #[test]
    fn test_header_value() {
        let now = Utc.with_ymd_and_hms(2024, 12, 31, 22, 59, 59).unwrap();
        let cookie = Cookie {
            name: "sid".into(),
            value: "a b;c".into(),
            expires: Some(Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap()),
            path: "/".into(),
            domain: "example.com".into(),
            secure: true,
            http_only: true,
            same_site: SameSite::Strict,
        };

        assert_eq!(
            cookie.to_header_value(now),
            "sid=a+b%3Bc; Expires=Tue, 31 Dec 2024 23:59:59 GMT; Max-Age=3600; \
             Path=/; Domain=example.com; Secure; HttpOnly; SameSite=Strict"
        );
    }

    #[test]
    fn test_session_cookie_omits_expiry_and_empty_domain() {
        let cookie = Cookie {
            name: "a".into(),
            value: "b".into(),
            expires: None,
            path: "/x".into(),
            domain: String::new(),
            secure: false,
            http_only: false,
            same_site: SameSite::Lax,
        };
        assert_eq!(cookie.to_header_value(Utc::now()), "a=b; Path=/x; SameSite=Lax");
    }
}

//! Response façade over host primitives.
//!
//! # Responsibilities
//! - Validate status codes, header names/values and cookie attributes
//! - Format status lines, `Content-Type`, `Content-Disposition`,
//!   caching headers and `Set-Cookie` values
//! - Refuse mutation once the host has sent headers
//!
//! # Design Decisions
//! - Header reads always go back to the host; there is no local mirror
//! - The only cached state is the status code
//! - `redirect` never stops the caller; further output is the caller's problem

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::config::FacadeConfig;
use crate::error::{ResponseError, ResponseResult};
use crate::host::{ExecutionContext, Host};
use crate::http::cookie::{
    has_cookie_delimiter, resolve_scope, validate_cookie_name, Cookie, CookieOptions, SameSite,
};
use crate::http::date::{format_http_date, EXPIRED_DATE};
use crate::http::status::{status_line, validate_status};

const TOKEN_SEPARATORS: &str = "!#$%&'*+-.^_`|~";

/// When a cached response should expire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// At an absolute instant.
    At(DateTime<Utc>),
    /// After a duration from the host's current time.
    In(Duration),
}

impl From<DateTime<Utc>> for Expiry {
    fn from(at: DateTime<Utc>) -> Self {
        Expiry::At(at)
    }
}

impl From<Duration> for Expiry {
    fn from(interval: Duration) -> Self {
        Expiry::In(interval)
    }
}

/// Response façade for a single request.
pub struct ResponseFacade<H: Host> {
    host: H,
    config: Arc<FacadeConfig>,
    status: u16,
}

impl<H: Host> ResponseFacade<H> {
    /// Wrap `host`, caching the status it currently reports.
    pub fn new(host: H, config: Arc<FacadeConfig>) -> Self {
        let status = host.status();
        Self { host, config, status }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Release the host, e.g. to hand it to the server for transmission.
    pub fn into_host(self) -> H {
        self.host
    }

    /// Set the status code, with an optional reason phrase override.
    pub fn set_status(&mut self, code: u16, reason: Option<&str>) -> ResponseResult<()> {
        validate_status(code)?;
        self.ensure_mutable()?;
        if let Some(reason) = reason {
            reject_control_chars("reason phrase", reason)?;
        }

        let line = status_line(code, reason);
        self.host.send_status_line(code, &line);
        self.status = code;
        tracing::debug!(status = code, "Status set");
        Ok(())
    }

    /// Last status set, or the host's status at construction.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Set `name`, replacing any existing values.
    pub fn set_header(&mut self, name: &str, value: &str) -> ResponseResult<()> {
        self.ensure_mutable()?;
        validate_header(name, value)?;
        if self.content_length_owned_by_host(name) {
            return Ok(());
        }

        self.host.replace_header(name, value);
        tracing::debug!(header = name, value, "Header set");
        Ok(())
    }

    /// Add another value for `name` without replacing existing ones.
    pub fn add_header(&mut self, name: &str, value: &str) -> ResponseResult<()> {
        self.ensure_mutable()?;
        validate_header(name, value)?;
        if self.content_length_owned_by_host(name) {
            return Ok(());
        }

        self.host.append_header(name, value);
        tracing::debug!(header = name, value, "Header added");
        Ok(())
    }

    pub fn delete_header(&mut self, name: &str) -> ResponseResult<()> {
        self.ensure_mutable()?;
        validate_header_name(name)?;

        self.host.remove_header(name);
        tracing::debug!(header = name, "Header deleted");
        Ok(())
    }

    /// Set `Content-Type` from a media type and optional charset.
    pub fn set_content_type(&mut self, media_type: &str, charset: Option<&str>) -> ResponseResult<()> {
        let value = match charset {
            Some(charset) => format!("{}; charset={}", media_type, charset),
            None => media_type.to_string(),
        };
        self.set_header("Content-Type", &value)
    }

    /// Ask the client to save the body as `filename`.
    pub fn send_as_file(&mut self, filename: &str) -> ResponseResult<()> {
        let legacy: String = filename
            .chars()
            .filter(|&c| c != '"' && !is_forbidden_control(c))
            .collect();
        let value = format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            legacy,
            encode_ext_value(filename)
        );
        self.set_header("Content-Disposition", &value)
    }

    /// Redirect with `302 Found`.
    pub fn redirect(&mut self, url: &str) -> ResponseResult<()> {
        self.redirect_with(url, 302)
    }

    /// Redirect with an explicit status code.
    ///
    /// Relative or non-http(s) targets also get a small HTML body with a
    /// link, for clients that ignore `Location`.
    pub fn redirect_with(&mut self, url: &str, code: u16) -> ResponseResult<()> {
        validate_status(code)?;
        self.ensure_mutable()?;
        validate_header("Location", url)?;

        self.set_status(code, None)?;
        self.set_header("Location", url)?;

        if !is_safe_absolute_url(url) {
            self.set_content_type("text/html", Some("utf-8"))?;
            let escaped = escape_html(url);
            self.host.write_body(&format!(
                "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>Redirecting</title></head>\
                 <body><p>Redirecting to <a href=\"{0}\">{0}</a>.</p></body></html>\n",
                escaped
            ));
        }

        tracing::debug!(status = code, location = url, "Redirect queued");
        Ok(())
    }

    /// Control caching. `None` disables caching entirely.
    pub fn set_expiration(&mut self, expiry: Option<Expiry>) -> ResponseResult<()> {
        self.ensure_mutable()?;

        let Some(expiry) = expiry else {
            self.set_header("Cache-Control", "no-store, no-cache, must-revalidate, max-age=0")?;
            self.set_header("Pragma", "no-cache")?;
            self.set_header("Expires", EXPIRED_DATE)?;
            return Ok(());
        };

        let now = self.host.now();
        let (expires, max_age) = match expiry {
            Expiry::At(at) => (at, (at - now).num_seconds().max(0)),
            Expiry::In(interval) => {
                let secs = i64::try_from(interval.as_secs())
                    .map_err(|_| ResponseError::argument("expiration interval is too large"))?;
                let at = TimeDelta::try_seconds(secs)
                    .and_then(|delta| now.checked_add_signed(delta))
                    .ok_or_else(|| ResponseError::argument("expiration interval is too large"))?;
                (at, secs)
            }
        };

        self.set_header("Cache-Control", &format!("max-age={}", max_age))?;
        self.set_header("Expires", &format_http_date(expires))?;
        self.delete_header("Pragma")
    }

    pub fn headers_sent(&self) -> bool {
        self.host.headers_sent()
    }

    /// First queued value of `name`, case-insensitive.
    pub fn header(&self, name: &str) -> Option<String> {
        self.host
            .headers()
            .into_iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Every header currently queued on the host.
    pub fn headers(&self) -> Vec<(String, String)> {
        self.host.headers()
    }

    /// Queue a cookie. Path and domain resolve per [`resolve_scope`].
    pub fn set_cookie(&mut self, name: &str, value: &str, options: CookieOptions) -> ResponseResult<()> {
        self.ensure_mutable()?;
        validate_cookie_name(name)?;

        let cookies = &self.config.cookies;
        let scope = resolve_scope(
            options.path.as_deref(),
            options.domain.as_deref(),
            &cookies.path,
            &cookies.domain,
        );
        reject_cookie_delimiters("path", &scope.path)?;
        reject_cookie_delimiters("domain", &scope.domain)?;

        let cookie = Cookie {
            name: name.to_string(),
            value: value.to_string(),
            expires: options.expires,
            path: scope.path,
            domain: scope.domain,
            secure: options.secure.unwrap_or(cookies.secure),
            http_only: options.http_only,
            same_site: options.same_site,
        };

        if cookie.same_site == SameSite::None && !cookie.secure {
            tracing::warn!(cookie = name, "SameSite=None without Secure is rejected by most browsers");
        }

        self.host.set_cookie(&cookie);
        tracing::debug!(
            cookie = name,
            path = %cookie.path,
            domain = %cookie.domain,
            "Cookie set"
        );
        Ok(())
    }

    /// Expire a cookie immediately, using the same scope rules as `set_cookie`.
    pub fn delete_cookie(&mut self, name: &str, options: CookieOptions) -> ResponseResult<()> {
        let expired = DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(1);
        self.set_cookie(name, "", options.expires(expired))
    }

    /// Shared precondition of every mutation.
    fn ensure_mutable(&self) -> ResponseResult<()> {
        if self.host.context() == ExecutionContext::Cli {
            return Ok(());
        }
        if self.host.headers_sent() {
            return Err(ResponseError::state("headers have already been sent"));
        }
        if self.config.diagnostics.warn_on_buffered_output {
            let chunks = self.host.buffered_output();
            if chunks.iter().any(|&len| len > 0) {
                tracing::warn!(
                    chunks = ?chunks,
                    "Output is already buffered; a flush will send headers before this change"
                );
            }
        }
        Ok(())
    }

    fn content_length_owned_by_host(&self, name: &str) -> bool {
        let owned = name.eq_ignore_ascii_case("Content-Length") && self.host.output_compressed();
        if owned {
            tracing::debug!("Ignoring Content-Length while output compression is active");
        }
        owned
    }
}

fn validate_header_name(name: &str) -> ResponseResult<()> {
    let is_token = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || TOKEN_SEPARATORS.contains(c));
    if is_token {
        Ok(())
    } else {
        Err(ResponseError::argument(format!(
            "'{}' is not a valid header name",
            name.escape_debug()
        )))
    }
}

fn validate_header(name: &str, value: &str) -> ResponseResult<()> {
    validate_header_name(name)?;
    reject_control_chars(name, value)
}

/// Controls other than HTAB are not valid in a field value.
fn is_forbidden_control(c: char) -> bool {
    c.is_ascii_control() && c != '\t'
}

fn reject_control_chars(field: &str, value: &str) -> ResponseResult<()> {
    if value.contains(is_forbidden_control) {
        return Err(ResponseError::argument(format!(
            "{} may not contain control characters",
            field
        )));
    }
    Ok(())
}

fn reject_cookie_delimiters(field: &str, value: &str) -> ResponseResult<()> {
    if has_cookie_delimiter(value) {
        return Err(ResponseError::argument(format!(
            "cookie {} '{}' contains a delimiter",
            field,
            value.escape_debug()
        )));
    }
    Ok(())
}

/// RFC 5987 `ext-value` encoding of a UTF-8 string.
fn encode_ext_value(value: &str) -> String {
    // form encoding emits '+' only for spaces and leaves '*' bare
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
        .replace('*', "%2A")
}

fn is_safe_absolute_url(url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https") && parsed.has_host(),
        Err(_) => false,
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use chrono::TimeZone;

    fn facade(host: MemoryHost) -> ResponseFacade<MemoryHost> {
        ResponseFacade::new(host, Arc::new(FacadeConfig::default()))
    }

    #[test]
    fn test_initial_status_comes_from_host() {
        let res = facade(MemoryHost::new().with_status(204));
        assert_eq!(res.status(), 204);
    }

    #[test]
    fn test_set_status_emits_line() {
        let mut res = facade(MemoryHost::new());
        res.set_status(418, None).unwrap();
        assert_eq!(res.status(), 418);
        assert_eq!(res.host().status_line(), Some("HTTP/1.1 418 I'm a teapot"));

        res.set_status(200, Some("Fine")).unwrap();
        assert_eq!(res.host().status_line(), Some("HTTP/1.1 200 Fine"));
    }

    #[test]
    fn test_out_of_range_checked_before_state() {
        let mut host = MemoryHost::new();
        host.mark_sent();
        let mut res = facade(host);
        assert!(matches!(res.set_status(600, None), Err(ResponseError::InvalidArgument(_))));
        assert!(matches!(res.set_status(200, None), Err(ResponseError::InvalidState(_))));
    }

    #[test]
    fn test_header_validation() {
        let mut res = facade(MemoryHost::new());
        assert!(res.set_header("X-Ok", "yes").is_ok());
        assert!(res.set_header("Bad Name", "x").is_err());
        assert!(res.set_header("", "x").is_err());
        assert!(res.add_header("X-Split", "a\r\nSet-Cookie: evil=1").is_err());
        assert_eq!(res.headers().len(), 1);
    }

    #[test]
    fn test_control_characters_rejected() {
        let mut res = facade(MemoryHost::new());
        for value in ["a\x01b", "a\x1fb", "a\x7fb", "a\0b"] {
            assert!(
                matches!(res.set_header("X-Ctl", value), Err(ResponseError::InvalidArgument(_))),
                "{:?}",
                value
            );
        }
        assert!(res.set_status(200, Some("O\x07K")).is_err());
        assert!(res.set_header("X-Tab", "a\tb").is_ok());
        assert_eq!(res.headers().len(), 1);
    }

    #[test]
    fn test_send_as_file_strips_controls_from_legacy_name() {
        let mut res = facade(MemoryHost::new());
        res.send_as_file("a\x01b.txt").unwrap();
        assert_eq!(
            res.header("Content-Disposition").as_deref(),
            Some("attachment; filename=\"ab.txt\"; filename*=UTF-8''a%01b.txt")
        );
    }

    #[test]
    fn test_content_length_ignored_under_compression() {
        let mut res = facade(MemoryHost::new().with_compression(true));
        res.set_header("Content-Length", "42").unwrap();
        res.add_header("content-length", "42").unwrap();
        assert_eq!(res.header("Content-Length"), None);

        let mut plain = facade(MemoryHost::new());
        plain.set_header("Content-Length", "42").unwrap();
        assert_eq!(plain.header("content-length").as_deref(), Some("42"));
    }

    #[test]
    fn test_ext_value_encoding() {
        assert_eq!(encode_ext_value("a b*.txt"), "a%20b%2A.txt");
        assert_eq!(encode_ext_value("résumé+1.pdf"), "r%C3%A9sum%C3%A9%2B1.pdf");
    }

    #[test]
    fn test_safe_url_detection() {
        assert!(is_safe_absolute_url("https://example.com"));
        assert!(is_safe_absolute_url("HTTP://example.com/a"));
        assert!(!is_safe_absolute_url("/relative/path"));
        assert!(!is_safe_absolute_url("javascript:alert(1)"));
        assert!(!is_safe_absolute_url("//example.com"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("/a?b=1&c=\"<x>\""), "/a?b=1&amp;c=&quot;&lt;x&gt;&quot;");
    }

    #[test]
    fn test_expiration_at_instant() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut res = facade(MemoryHost::new().with_clock(now));
        res.set_header("Pragma", "no-cache").unwrap();
        res.set_expiration(Some(Expiry::At(now + TimeDelta::hours(1)))).unwrap();

        assert_eq!(res.header("Cache-Control").as_deref(), Some("max-age=3600"));
        assert_eq!(res.header("Expires").as_deref(), Some("Mon, 01 Jan 2024 01:00:00 GMT"));
        assert_eq!(res.header("Pragma"), None);
    }

    #[test]
    fn test_expiration_in_past_floors_at_zero() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut res = facade(MemoryHost::new().with_clock(now));
        res.set_expiration(Some((now - TimeDelta::days(1)).into())).unwrap();
        assert_eq!(res.header("Cache-Control").as_deref(), Some("max-age=0"));
    }

    #[test]
    fn test_cli_context_skips_sent_check() {
        let mut host = MemoryHost::new().with_context(ExecutionContext::Cli);
        host.mark_sent();
        let mut res = facade(host);
        assert!(res.set_header("X-Cli", "1").is_ok());
    }

    #[test]
    fn test_cookie_delimiters_rejected() {
        let mut res = facade(MemoryHost::new());
        let err = res
            .set_cookie("a", "b", CookieOptions::default().path("/x; Domain=evil.test"))
            .unwrap_err();
        assert!(matches!(err, ResponseError::InvalidArgument(_)));
    }
}

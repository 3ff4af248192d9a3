//! Cookie store backed by request headers.
//!
//! Reads the `Cookie` request header once and records every change so the
//! response can carry the matching `Set-Cookie` headers. Signing and
//! encryption are left to the transport layer.

use axum::http::{
    header::{InvalidHeaderValue, COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue,
};
use std::collections::HashMap;

use super::context::CookieStore;

/// Cookie lifetime for values written through the jar.
pub const DEFAULT_MAX_AGE_SECONDS: i64 = 30 * 24 * 60 * 60;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Change {
    Set(String),
    Delete,
}

#[derive(Clone, Debug)]
pub struct CookieJar {
    values: HashMap<String, String>,
    changes: Vec<(String, Change)>,
    max_age_seconds: i64,
    secure: bool,
}

impl Default for CookieJar {
    fn default() -> Self {
        Self {
            values: HashMap::new(),
            changes: Vec::new(),
            max_age_seconds: DEFAULT_MAX_AGE_SECONDS,
            secure: false,
        }
    }
}

impl CookieJar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the cookies sent with a request.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut jar = Self::new();
        for header in headers.get_all(COOKIE) {
            let Ok(value) = header.to_str() else {
                continue;
            };
            for pair in value.split(';') {
                let mut parts = pair.trim().splitn(2, '=');
                let (Some(key), Some(val)) = (parts.next(), parts.next()) else {
                    continue;
                };
                let key = key.trim();
                if !key.is_empty() {
                    jar.values.insert(key.to_string(), val.trim().to_string());
                }
            }
        }
        jar
    }

    #[must_use]
    pub fn with_max_age_seconds(mut self, seconds: i64) -> Self {
        self.max_age_seconds = seconds;
        self
    }

    /// Mark written cookies `Secure`; only useful when served over HTTPS.
    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// `Set-Cookie` values for every change, last write per name wins.
    ///
    /// # Errors
    /// Returns an error if a cookie name or value is not a valid header value.
    pub fn set_cookie_headers(&self) -> Result<Vec<HeaderValue>, InvalidHeaderValue> {
        let mut seen: Vec<&str> = Vec::new();
        let mut headers = Vec::new();
        for (name, change) in self.changes.iter().rev() {
            if seen.contains(&name.as_str()) {
                continue;
            }
            seen.push(name);
            let mut cookie = match change {
                Change::Set(value) => format!(
                    "{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
                    self.max_age_seconds
                ),
                Change::Delete => format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"),
            };
            if self.secure {
                cookie.push_str("; Secure");
            }
            headers.push(HeaderValue::from_str(&cookie)?);
        }
        headers.reverse();
        Ok(headers)
    }

    /// Append the `Set-Cookie` headers to a response header map.
    ///
    /// # Errors
    /// Returns an error if a cookie name or value is not a valid header value.
    pub fn write_headers(&self, headers: &mut HeaderMap) -> Result<(), InvalidHeaderValue> {
        for value in self.set_cookie_headers()? {
            headers.append(SET_COOKIE, value);
        }
        Ok(())
    }
}

impl CookieStore for CookieJar {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }

    fn set(&mut self, name: &str, value: &str) {
        self.values.insert(name.to_string(), value.to_string());
        self.changes
            .push((name.to_string(), Change::Set(value.to_string())));
    }

    fn delete(&mut self, name: &str) {
        self.values.remove(name);
        self.changes.push((name.to_string(), Change::Delete));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_cookie(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn parses_request_cookies() {
        let jar = CookieJar::from_headers(&headers_with_cookie(
            "authlane.token=tok; authlane.session=01J; broken",
        ));
        assert_eq!(jar.get("authlane.token").as_deref(), Some("tok"));
        assert_eq!(jar.get("authlane.session").as_deref(), Some("01J"));
        assert_eq!(jar.get("broken"), None);
        assert!(!jar.has_changes());
    }

    #[test]
    fn set_emits_cookie_header() {
        let mut jar = CookieJar::new().with_max_age_seconds(60);
        jar.set("authlane.token", "tok");
        let headers = jar.set_cookie_headers().unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(
            headers[0],
            "authlane.token=tok; Path=/; HttpOnly; SameSite=Lax; Max-Age=60"
        );
    }

    #[test]
    fn delete_expires_cookie() {
        let mut jar =
            CookieJar::from_headers(&headers_with_cookie("authlane.token=tok")).with_secure(true);
        jar.delete("authlane.token");
        assert_eq!(jar.get("authlane.token"), None);
        let headers = jar.set_cookie_headers().unwrap();
        assert_eq!(
            headers[0],
            "authlane.token=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0; Secure"
        );
    }

    #[test]
    fn last_change_per_name_wins() {
        let mut jar = CookieJar::new();
        jar.set("a", "1");
        jar.set("b", "2");
        jar.delete("a");
        let mut headers = HeaderMap::new();
        jar.write_headers(&mut headers).unwrap();
        let values: Vec<_> = headers.get_all(SET_COOKIE).iter().collect();
        assert_eq!(values.len(), 2);
        assert!(values[0].to_str().unwrap().starts_with("b=2;"));
        assert!(values[1].to_str().unwrap().starts_with("a=;"));
    }
}

/// Session cookie construction and parsing
///
/// The session token travels in an HttpOnly cookie named `jwt`. Cookie
/// flags differ by environment: production adds `Secure` and uses
/// `SameSite=None` so the cookie survives cross-site deployments behind
/// TLS; everywhere else uses `SameSite=Lax` so local development over
/// plain HTTP still works.

use axum::http::{header, HeaderMap};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "jwt";

/// Session cookie Max-Age in seconds, matching the token expiry
const SESSION_MAX_AGE_SECONDS: i64 = 3600;

fn flags(production: bool) -> &'static str {
    if production {
        "HttpOnly; Secure; SameSite=None"
    } else {
        "HttpOnly; SameSite=Lax"
    }
}

/// Builds the `Set-Cookie` value carrying a freshly issued session token
pub fn session_cookie(token: &str, production: bool) -> String {
    format!(
        "{}={}; Max-Age={}; Path=/; {}",
        SESSION_COOKIE,
        token,
        SESSION_MAX_AGE_SECONDS,
        flags(production)
    )
}

/// Builds the `Set-Cookie` value that clears the session cookie
///
/// Note this only removes the cookie from the client; an already-copied
/// token remains valid until its expiry.
pub fn clear_session_cookie(production: bool) -> String {
    format!(
        "{}=; Max-Age=0; Path=/; {}",
        SESSION_COOKIE,
        flags(production)
    )
}

/// Extracts a cookie value by name from the request headers
///
/// Handles multiple `Cookie` headers and multiple cookies per header.
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for value in headers.get_all(header::COOKIE) {
        let Ok(raw) = value.to_str() else {
            continue;
        };
        for pair in raw.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            if parts.next() == Some(name) {
                return parts.next().map(|v| v.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_session_cookie_development_flags() {
        let cookie = session_cookie("abc.def.ghi", false);

        assert!(cookie.starts_with("jwt=abc.def.ghi;"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn test_session_cookie_production_flags() {
        let cookie = session_cookie("abc.def.ghi", true);

        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=None"));
    }

    #[test]
    fn test_clear_session_cookie() {
        let cookie = clear_session_cookie(false);

        assert!(cookie.starts_with("jwt=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn test_extract_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; jwt=token123; lang=en"),
        );

        assert_eq!(
            extract_cookie(&headers, "jwt"),
            Some("token123".to_string())
        );
        assert_eq!(extract_cookie(&headers, "theme"), Some("dark".to_string()));
        assert_eq!(extract_cookie(&headers, "missing"), None);
    }

    #[test]
    fn test_extract_cookie_multiple_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(header::COOKIE, HeaderValue::from_static("jwt=token456"));

        assert_eq!(
            extract_cookie(&headers, "jwt"),
            Some("token456".to_string())
        );
    }

    #[test]
    fn test_extract_cookie_no_header() {
        let headers = HeaderMap::new();
        assert_eq!(extract_cookie(&headers, "jwt"), None);
    }
}

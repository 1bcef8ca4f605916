//! Session cookie extraction.

use axum::http::{header::COOKIE, HeaderMap};

/// Find the value of cookie `name` across all `Cookie` headers.
///
/// Pairs are separated by `;` and surrounding whitespace is ignored. The
/// name must match exactly. The first match wins.
pub fn find_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(values: &[&str]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for value in values {
            headers.append(COOKIE, HeaderValue::from_str(value).unwrap());
        }
        headers
    }

    #[test]
    fn test_single_cookie() {
        let headers = headers(&["mock_session=abc123"]);
        assert_eq!(find_cookie(&headers, "mock_session"), Some("abc123"));
    }

    #[test]
    fn test_cookie_among_others() {
        let headers = headers(&["first=1; mock_session=found; last=3"]);
        assert_eq!(find_cookie(&headers, "mock_session"), Some("found"));
    }

    #[test]
    fn test_cookie_with_spaces() {
        let headers = headers(&["  mock_session=tok  ; other=value"]);
        assert_eq!(find_cookie(&headers, "mock_session"), Some("tok"));
    }

    #[test]
    fn test_cookie_in_second_header() {
        let headers = headers(&["other=value", "mock_session=second"]);
        assert_eq!(find_cookie(&headers, "mock_session"), Some("second"));
    }

    #[test]
    fn test_prefix_name_does_not_match() {
        let headers = headers(&["mock_session_old=stale; xmock_session=nope"]);
        assert_eq!(find_cookie(&headers, "mock_session"), None);
    }

    #[test]
    fn test_no_cookie_header() {
        assert_eq!(find_cookie(&HeaderMap::new(), "mock_session"), None);
    }
}

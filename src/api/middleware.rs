/// Request credential handling
use axum::http::HeaderMap;

/// Extract the credential from the Authorization header.
///
/// Accepts both `Token <key>` and `Bearer <key>`.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let value = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;

    value
        .strip_prefix("Token ")
        .or_else(|| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_token_schemes() {
        assert_eq!(extract_token(&headers("Token abc")), Some("abc".to_string()));
        assert_eq!(extract_token(&headers("Bearer abc")), Some("abc".to_string()));
        assert_eq!(extract_token(&headers("Basic abc")), None);
        assert_eq!(extract_token(&headers("Token ")), None);
        assert_eq!(extract_token(&HeaderMap::new()), None);
    }
}

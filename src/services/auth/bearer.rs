use axum::http::{HeaderMap, header};

pub const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BearerError {
    #[error("missing Authorization header")]
    Missing,
    #[error("Authorization header is not a Bearer credential")]
    Scheme,
    #[error("empty Bearer credential")]
    Empty,
}

/// Split `Bearer <token>` into the token.
///
/// The scheme is matched exactly (`Bearer` followed by one space), which is
/// what both the HTTP clients and the STOMP clients send.
pub fn parse_bearer(value: &str) -> Result<&str, BearerError> {
    let token = value
        .strip_prefix(BEARER_PREFIX)
        .ok_or(BearerError::Scheme)?
        .trim();

    if token.is_empty() {
        return Err(BearerError::Empty);
    }

    Ok(token)
}

/// Bearer token from the `Authorization` header of an HTTP request.
pub fn bearer_from_headers(headers: &HeaderMap) -> Result<&str, BearerError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(BearerError::Missing)?
        .to_str()
        .map_err(|_| BearerError::Scheme)?;

    parse_bearer(value)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn parses_bearer_token() {
        assert_eq!(parse_bearer("Bearer abc.def.ghi"), Ok("abc.def.ghi"));
        assert_eq!(parse_bearer("Bearer  abc "), Ok("abc"));
    }

    #[test]
    fn rejects_other_schemes() {
        assert_eq!(parse_bearer("Basic dXNlcjpwdw=="), Err(BearerError::Scheme));
        assert_eq!(parse_bearer("bearer abc"), Err(BearerError::Scheme));
        assert_eq!(parse_bearer("abc.def.ghi"), Err(BearerError::Scheme));
        assert_eq!(parse_bearer("Bearer "), Err(BearerError::Empty));
    }

    #[test]
    fn reads_authorization_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_from_headers(&headers), Err(BearerError::Missing));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer t0k"));
        assert_eq!(bearer_from_headers(&headers), Ok("t0k"));
    }
}

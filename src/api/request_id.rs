//! `X-Request-ID` handling: a caller's id is kept when it is short and plain, otherwise a UUID is
//! assigned. The id is echoed on the response and recorded on the request's tracing span.
use axum::body::Body;
use axum::http::{HeaderName, Request};
use tracing::Span;

pub(crate) static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

const MAX_REQUEST_ID_LEN: usize = 128;

fn is_valid(id: &[u8]) -> bool {
    !id.is_empty()
        && id.len() <= MAX_REQUEST_ID_LEN
        && id
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}

/// Drop an incoming id that isn't safe to log, so a fresh one is assigned.
#[allow(clippy::unused_async)]
pub(crate) async fn drop_invalid(mut request: Request<Body>) -> Request<Body> {
    let invalid = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .is_some_and(|id| !is_valid(id.as_bytes()));
    if invalid {
        request.headers_mut().remove(&REQUEST_ID_HEADER);
    }
    request
}

pub(crate) fn request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|id| id.to_str().ok())
        .unwrap_or("-");
    tracing::info_span!(
        "request",
        method = %request.method(),
        path = request.uri().path(),
        request_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_ids_are_kept() {
        assert!(is_valid(b"abc-123_x.y"));
        assert!(is_valid(&[b'a'; MAX_REQUEST_ID_LEN]));
    }

    #[test]
    fn unsafe_ids_are_rejected() {
        assert!(!is_valid(b""));
        assert!(!is_valid(b"has space"));
        assert!(!is_valid(b"line\nbreak"));
        assert!(!is_valid(&[b'a'; MAX_REQUEST_ID_LEN + 1]));
    }

    #[tokio::test]
    async fn invalid_ids_are_removed() {
        let request = Request::builder()
            .header("x-request-id", "not valid!")
            .body(Body::empty())
            .unwrap();
        let request = drop_invalid(request).await;
        assert!(request.headers().get(&REQUEST_ID_HEADER).is_none());

        let request = Request::builder()
            .header("x-request-id", "trace-42")
            .body(Body::empty())
            .unwrap();
        let request = drop_invalid(request).await;
        assert_eq!(request.headers()[&REQUEST_ID_HEADER], "trace-42");
    }
}

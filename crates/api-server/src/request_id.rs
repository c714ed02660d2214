use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id, available to handlers as a request extension.
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

/// Tags every evaluation request with an id.
///
/// - Reuses a non-blank incoming `X-Request-Id`, otherwise a fresh UUID v4
/// - Logs method and path against the id at debug level
/// - Echoes the id on the response so callers can correlate failures
pub async fn request_id_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    let id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    tracing::debug!("{} {} [{}]", request.method(), request.uri().path(), id);
    request.extensions_mut().insert(RequestId(id.clone()));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

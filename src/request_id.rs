use axum::{
    body::Body,
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::fmt;
use tracing::Instrument;
use uuid::Uuid;

/// Request ID wrapper for storing in request extensions.
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Assigns/forwards `X-Request-Id`, stores it in request extensions so
/// handlers can pick it up, and stamps it on the outgoing response. The
/// rest of the request — every `tracing` event emitted by the handler and
/// the Cache Engine while `next.run` is in flight — is entered inside a
/// span carrying `request_id`, so those log lines carry it too without
/// threading it through every call site.
pub async fn request_id_middleware(mut req: Request<Body>, next: Next) -> Response {
    let request_id = req
        .headers()
        .get("X-Request-Id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    req.extensions_mut().insert(RequestId(request_id.clone()));

    let method = req.method().clone();
    let uri = req.uri().clone();
    let span = tracing::info_span!("request", request_id = %request_id, %method, %uri);

    async move {
        tracing::info!("incoming request");
        let response = next.run(req).await;

        let (mut parts, body) = response.into_parts();
        if let Ok(header_value) = HeaderValue::from_str(&request_id) {
            parts.headers.insert("X-Request-Id", header_value);
        }
        Response::from_parts(parts, body)
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_ids_are_distinct_uuids() {
        let id1 = RequestId::new();
        let id2 = RequestId::new();
        assert_ne!(id1.0, id2.0);
        assert_eq!(id1.0.len(), 36);
    }

    #[test]
    fn display_matches_as_str() {
        let id = RequestId::new();
        assert_eq!(format!("{id}"), id.as_str());
    }
}

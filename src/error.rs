use axum::{http::StatusCode, response::IntoResponse, Json};

pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundReason {
    Miss,
    Expired,
}

#[derive(Debug)]
pub enum CacheError {
    NotFound(NotFoundReason),
    BadRequest(String),
    StoreUnavailable(String),
}

impl IntoResponse for CacheError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            CacheError::NotFound(NotFoundReason::Miss) => {
                (StatusCode::NOT_FOUND, "cached data not found".to_string())
            }
            CacheError::NotFound(NotFoundReason::Expired) => {
                (StatusCode::NOT_FOUND, "cached data has expired".to_string())
            }
            CacheError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            CacheError::StoreUnavailable(msg) => {
                tracing::error!(error = %msg, "store unavailable");
                (StatusCode::INTERNAL_SERVER_ERROR, "cache store error".to_string())
            }
        };

        (status, Json(serde_json::json!({ "message": message }))).into_response()
    }
}

impl From<anyhow::Error> for CacheError {
    fn from(err: anyhow::Error) -> Self {
        CacheError::StoreUnavailable(err.to_string())
    }
}

impl From<crate::store::StoreError> for CacheError {
    fn from(err: crate::store::StoreError) -> Self {
        CacheError::StoreUnavailable(err.to_string())
    }
}

impl From<crate::engine::SetError> for CacheError {
    fn from(err: crate::engine::SetError) -> Self {
        match err {
            crate::engine::SetError::BadRequest(msg) => CacheError::BadRequest(msg),
            crate::engine::SetError::Store(e) => CacheError::StoreUnavailable(e.to_string()),
        }
    }
}

impl From<crate::engine::GetError> for CacheError {
    fn from(err: crate::engine::GetError) -> Self {
        match err {
            crate::engine::GetError::Miss => CacheError::NotFound(NotFoundReason::Miss),
            crate::engine::GetError::Expired => CacheError::NotFound(NotFoundReason::Expired),
            crate::engine::GetError::Store(e) => CacheError::StoreUnavailable(e.to_string()),
        }
    }
}

impl From<crate::engine::DeleteError> for CacheError {
    fn from(err: crate::engine::DeleteError) -> Self {
        match err {
            crate::engine::DeleteError::NotFound => CacheError::NotFound(NotFoundReason::Miss),
            crate::engine::DeleteError::Store(e) => CacheError::StoreUnavailable(e.to_string()),
        }
    }
}

impl From<crate::engine::DeletePrefixError> for CacheError {
    fn from(err: crate::engine::DeletePrefixError) -> Self {
        match err {
            crate::engine::DeletePrefixError::BadRequest(msg) => CacheError::BadRequest(msg),
            crate::engine::DeletePrefixError::Store(e) => CacheError::StoreUnavailable(e.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for CacheError {
    fn from(err: tokio::task::JoinError) -> Self {
        CacheError::StoreUnavailable(format!("blocking task panicked: {err}"))
    }
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use types::EngineError;

/// Engine error carried through a handler; rendered as
/// `{"error": KIND, "message": ...}` with the matching status code.
#[derive(Debug)]
pub struct ApiError(pub EngineError);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self(EngineError::Validation(message.into()))
    }

    fn status(&self) -> StatusCode {
        match &self.0 {
            EngineError::Validation(_) | EngineError::StateConflict(_) => StatusCode::BAD_REQUEST,
            EngineError::OrderNotFound(_) | EngineError::TradeNotFound(_) => StatusCode::NOT_FOUND,
            EngineError::Storage(_) | EngineError::Unavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.0.kind(),
            "message": self.0.to_string(),
        }));
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError(EngineError::Validation("bad".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError(EngineError::StateConflict("settled".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError(EngineError::OrderNotFound("x".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError(EngineError::Storage("down".into())).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}

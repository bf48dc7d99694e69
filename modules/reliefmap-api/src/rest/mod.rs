pub mod disasters;
pub mod help;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use reliefmap_common::ReliefMapError;

/// Error response wrapper: `{ "error": message, "kind": kind }`.
pub struct ApiError(pub ReliefMapError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            ReliefMapError::Validation(_) | ReliefMapError::NotPlausible => {
                StatusCode::BAD_REQUEST
            }
            ReliefMapError::OracleUnavailable(_)
            | ReliefMapError::CorroborationUnavailable(_)
            | ReliefMapError::GeocodeUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ReliefMapError::StoreUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ReliefMapError> for ApiError {
    fn from(err: ReliefMapError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(ReliefMapError::Validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(serde_json::json!({
                "error": self.0.to_string(),
                "kind": self.0.kind(),
            })),
        )
            .into_response()
    }
}

/// Store reads and writes outside the engine fail the same way ingestion does.
pub(crate) fn store_error(err: anyhow::Error) -> ApiError {
    ApiError(ReliefMapError::StoreUnavailable(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ApiError(ReliefMapError::NotPlausible).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError(ReliefMapError::Validation("x".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError(ReliefMapError::OracleUnavailable("x".into())).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError(ReliefMapError::StoreUnavailable("x".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

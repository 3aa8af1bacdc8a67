use crate::auth::ClassifyError;
use crate::error::Error;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

pub(crate) struct APIError(anyhow::Error);

impl APIError {
    fn status(&self) -> StatusCode {
        if self.0.is::<ClassifyError>() {
            return StatusCode::BAD_REQUEST;
        }
        match self.0.downcast_ref::<Error>() {
            Some(Error::MissingApiKey | Error::InvalidApiKey) => StatusCode::UNAUTHORIZED,
            Some(
                Error::Classification(_) | Error::InvalidRequest(_) | Error::MalformedRequest(_),
            ) => StatusCode::BAD_REQUEST,
            Some(Error::PermissionDenied | Error::MasterKeyLocked) => StatusCode::FORBIDDEN,
            Some(Error::CannotDeleteLastAdmin) => StatusCode::CONFLICT,
            Some(Error::NoAdminTokenExists) => StatusCode::UNPROCESSABLE_ENTITY,
            Some(Error::TokenNotFound(_)) => StatusCode::NOT_FOUND,
            Some(Error::Upstream(_)) => StatusCode::BAD_GATEWAY,
            Some(Error::LogFilter(_)) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for APIError {
    fn into_response(self) -> Response {
        let status = self.status();
        let any_err = self.0;
        if status.is_server_error() {
            tracing::error!("request failed: {any_err:#}");
        }
        let body = Json(json!({
            "error": format!("{any_err}"),
        }));
        (status, body).into_response()
    }
}

impl<E> From<E> for APIError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

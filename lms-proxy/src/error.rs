use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lms_schema::ErrorBody;
use serde_json::Value;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{1}")]
    Server(StatusCode, String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Conflict(String),
    /// The LMS answered with a non-success status.
    #[error("Failed to {action}")]
    Upstream {
        action: &'static str,
        status: StatusCode,
        details: Value,
    },
    /// The LMS could not be reached, or its answer could not be read.
    #[error("Failed to {action}")]
    Request {
        action: &'static str,
        #[source]
        source: reqwest::Error,
    },
    // Froms
    #[error("{0}")]
    ExamUtils(#[from] exam_utils::error::Error),
}

impl Error {
    fn details(&self) -> Option<Value> {
        match self {
            Error::Upstream { details, .. } => Some(details.clone()),
            Error::Request { source, .. } => Some(Value::String(source.to_string())),
            _ => None,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
            details: self.details(),
        };
        if let Error::Upstream { status, .. } = &self {
            tracing::warn!(upstream_status = %status, error = %body.error, "lms request failed");
        }
        let status: StatusCode = self.into();
        if status.is_server_error() {
            tracing::error!(%status, error = %body.error, details = ?body.details);
        }

        (status, Json(body)).into_response()
    }
}

impl From<Error> for StatusCode {
    fn from(error: Error) -> Self {
        match error {
            Error::Server(c, _) => c,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::ExamUtils(exam_utils::error::Error::Generation(_))
            | Error::ExamUtils(exam_utils::error::Error::InvalidConfig(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

/// Every failure a flow can hand back to the HTTP boundary.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Missing required fields")]
    MissingFields,
    #[error("{0}")]
    BadRequest(String),
    #[error("User already exists")]
    DuplicateUser,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Account is not active")]
    AccountNotActive,
    #[error("Access token required")]
    Unauthenticated,
    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,
    #[error("Admin access required")]
    AdminAccessRequired,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingFields | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::DuplicateUser => StatusCode::CONFLICT,
            ApiError::InvalidCredentials
            | ApiError::AccountNotActive
            | ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::InvalidOrExpiredToken | ApiError::AdminAccessRequired => {
                StatusCode::FORBIDDEN
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::MissingFields => "MissingFields",
            ApiError::BadRequest(_) => "BadRequest",
            ApiError::DuplicateUser => "DuplicateUser",
            ApiError::InvalidCredentials => "InvalidCredentials",
            ApiError::AccountNotActive => "AccountNotActive",
            ApiError::Unauthenticated => "Unauthenticated",
            ApiError::InvalidOrExpiredToken => "InvalidOrExpiredToken",
            ApiError::AdminAccessRequired => "AdminAccessRequired",
            ApiError::NotFound(_) => "NotFound",
            ApiError::Internal(_) => "Internal",
        }
    }

    pub fn body(&self) -> ErrorBody {
        match self {
            // Free-form rejections carry their text as the error itself.
            ApiError::BadRequest(text) => ErrorBody {
                error: text.clone(),
                message: None,
            },
            ApiError::Internal(_) => ErrorBody {
                error: self.kind().into(),
                message: Some("Internal server error".into()),
            },
            other => ErrorBody {
                error: other.kind().into(),
                message: Some(other.to_string()),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(e) = &self {
            error!(error = ?e, "request failed");
        }
        (self.status(), Json(self.body())).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(error = %rejection.body_text(), "rejected request body");
        match rejection {
            // Well-formed JSON whose values do not fit the expected types.
            JsonRejection::JsonDataError(_) => ApiError::BadRequest("Invalid field value".into()),
            _ => ApiError::MissingFields,
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        warn!(error = %rejection.body_text(), "rejected query string");
        ApiError::BadRequest("Invalid query parameters".into())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        warn!(error = %rejection.body_text(), "rejected path parameter");
        ApiError::BadRequest("Invalid path parameter".into())
    }
}

/// JSON request body whose rejection is reported as an [`ApiError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Payload<T>(pub T);

/// Query string, rejected as [`ApiError::BadRequest`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);

/// Path segment, rejected as [`ApiError::BadRequest`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct PathParam<T>(pub T);

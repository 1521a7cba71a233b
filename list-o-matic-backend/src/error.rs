use core::convert::Infallible;

use bytes::Bytes;
use http::{header, Response, StatusCode};
use http_body_util::Full;
use list_o_matic_config::ConfigError;
use list_o_matic_database::DatabaseError;
use serde::Serialize;
use tracing::error;

use crate::contribution::ContributionError;
use crate::registry::RegistryError;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Registry(#[from] RegistryError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("IO error: {0}")]
    File(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("query error: {0}")]
    Query(#[from] serde_urlencoded::de::Error),
    #[error("invalid id: {0}")]
    Uuid(#[from] uuid::Error),
    #[error("http error: {0}")]
    Http(#[from] http::Error),
    #[error("webserver error: {0}")]
    Hyper(#[from] hyper::Error),
    #[error("join error: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("request body is larger than {} bytes", crate::MAX_BODY_SIZE)]
    PayloadTooLarge,
    #[error("this route requires a valid api key")]
    Unauthorized,
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("route not found")]
    RouteNotFound,
}

impl From<Infallible> for AppError {
    fn from(value: Infallible) -> Self {
        match value {}
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl AppError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Registry(registry) => match registry {
                RegistryError::ListNotFound(_)
                | RegistryError::GroupNotFound(_)
                | RegistryError::ApplicationNotFound(_)
                | RegistryError::AttendeeNotFound(_) => StatusCode::NOT_FOUND,
                RegistryError::EmptyName(_)
                | RegistryError::InvalidVisibility(_)
                | RegistryError::Contribution(
                    ContributionError::UnknownGroup(_)
                    | ContributionError::UnknownApplication { .. },
                ) => StatusCode::BAD_REQUEST,
                RegistryError::Poisoned => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Json(_) | Self::Query(_) | Self::Uuid(_) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::Config(_)
            | Self::Database(_)
            | Self::File(_)
            | Self::Http(_)
            | Self::Hyper(_)
            | Self::Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Turns the error into a JSON response. Internal details are only logged.
    #[must_use]
    pub fn into_response(self) -> Response<Full<Bytes>> {
        let status = self.status();
        let message = if status.is_server_error() {
            error!("request failed: {self}");
            "internal server error".to_owned()
        } else {
            self.to_string()
        };
        let body = serde_json::to_vec(&ErrorBody { error: message }).unwrap_or_default();
        let mut response = Response::new(Full::new(Bytes::from(body)));
        *response.status_mut() = status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                header::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}

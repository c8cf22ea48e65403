//! Error handling.

use crate::npy::NpyError;
use crate::sink::SinkError;

use axum::{
    extract::rejection::JsonRejection,
    http::header,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::error::Error;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{event, Level};

/// Projection server error type
///
/// This type encapsulates the various errors that may occur.
/// Each variant may result in a different API error response.
#[derive(Debug, Error)]
pub enum ProjectionServerError {
    /// Dataset directory does not exist
    #[error("dataset {dataset} not found")]
    DatasetNotFound { dataset: String },

    /// Projection file does not exist
    #[error("projection {projection} not found in dataset {dataset}")]
    ProjectionNotFound { dataset: String, projection: String },

    /// Label file does not exist
    #[error("labels not found for dataset {dataset}")]
    LabelsNotFound { dataset: String },

    /// Structured label record without a `labels` array
    #[error("labels file {path} has no labels array")]
    LabelsFieldMissing { path: String },

    /// Label file is valid JSON but neither an array nor a record
    #[error("labels file {path} is neither an array nor a record")]
    LabelsUnrecognised { path: String },

    /// Label file is not valid JSON
    #[error("labels file {path} is malformed")]
    MalformedLabels {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Array file could not be decoded
    #[error("array file {path} is malformed")]
    MalformedArray {
        path: String,
        #[source]
        source: NpyError,
    },

    /// Error reading a file in the store
    #[error("failed to read {path}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Error listing the store root directory
    #[error("failed to read dataset store")]
    StoreUnreadable(#[source] std::io::Error),

    /// Dataset or projection name would escape the store
    #[error("invalid dataset or projection name")]
    TraversalRejected(#[from] validator::ValidationErrors),

    /// Error deserialising a request body
    #[error("request data is not valid")]
    RequestJsonRejection(#[from] JsonRejection),

    /// Error serialising a submission
    #[error("failed to serialise submission")]
    Serialise(#[from] serde_json::Error),

    /// Error formatting the receipt timestamp
    #[error("failed to format receipt timestamp")]
    Timestamp(#[from] time::error::Format),

    /// Mail collaborator failed to accept a submission
    #[error("failed to deliver submission")]
    Sink(#[from] SinkError),

    /// Blocking filesystem task panicked or was cancelled
    #[error("error running blocking task")]
    TaskJoin(#[from] JoinError),
}

impl IntoResponse for ProjectionServerError {
    /// Convert from a `ProjectionServerError` into an [axum::response::Response].
    fn into_response(self) -> Response {
        ErrorResponse::from(self).into_response()
    }
}

/// Body of error response
///
/// Implements serde (de)serialise.
#[derive(Deserialize, Serialize)]
struct ErrorBody {
    /// Main error message
    message: String,

    /// Optional list of causes
    #[serde(skip_serializing_if = "Option::is_none")]
    caused_by: Option<Vec<String>>,
}

impl ErrorBody {
    /// Return a new ErrorBody
    ///
    /// # Arguments
    ///
    /// * `error`: The error that occurred
    fn new<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        let message = error.to_string();
        let mut caused_by = None;
        let mut current = error.source();
        while let Some(source) = current {
            let mut causes: Vec<String> = caused_by.unwrap_or_default();
            causes.push(source.to_string());
            caused_by = Some(causes);
            current = source.source();
        }
        // Remove duplicate entries.
        if let Some(caused_by) = caused_by.as_mut() {
            caused_by.dedup()
        }
        ErrorBody { message, caused_by }
    }
}

/// A response to send in error cases
///
/// Implements serde (de)serialise.
#[derive(Deserialize, Serialize)]
struct ErrorResponse {
    /// HTTP status of the response
    #[serde(skip)]
    status: StatusCode,

    /// Response body
    error: ErrorBody,
}

impl ErrorResponse {
    /// Return a new ErrorResponse
    ///
    /// # Arguments
    ///
    /// * `status`: HTTP status of the response
    /// * `error`: The error that occurred. This will be formatted into a suitable `ErrorBody`
    fn new<E>(status: StatusCode, error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        ErrorResponse {
            status,
            error: ErrorBody::new(error),
        }
    }

    /// Return a 400 bad request ErrorResponse
    fn bad_request<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    /// Return a 404 not found ErrorResponse
    fn not_found<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::NOT_FOUND, error)
    }

    /// Return a 500 internal server error ErrorResponse
    fn internal_server_error<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error)
    }

    /// Return a 502 bad gateway ErrorResponse
    fn bad_gateway<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::BAD_GATEWAY, error)
    }
}

impl From<ProjectionServerError> for ErrorResponse {
    /// Convert from a `ProjectionServerError` into an `ErrorResponse`.
    fn from(error: ProjectionServerError) -> Self {
        let response = match &error {
            // Bad request
            ProjectionServerError::TraversalRejected(_)
            | ProjectionServerError::RequestJsonRejection(_) => Self::bad_request(&error),

            // Not found
            ProjectionServerError::DatasetNotFound { dataset: _ }
            | ProjectionServerError::ProjectionNotFound {
                dataset: _,
                projection: _,
            }
            | ProjectionServerError::LabelsNotFound { dataset: _ } => Self::not_found(&error),

            // Internal server error
            ProjectionServerError::LabelsFieldMissing { path: _ }
            | ProjectionServerError::LabelsUnrecognised { path: _ }
            | ProjectionServerError::MalformedLabels { path: _, source: _ }
            | ProjectionServerError::MalformedArray { path: _, source: _ }
            | ProjectionServerError::ReadFile { path: _, source: _ }
            | ProjectionServerError::StoreUnreadable(_)
            | ProjectionServerError::Serialise(_)
            | ProjectionServerError::Timestamp(_)
            | ProjectionServerError::TaskJoin(_) => Self::internal_server_error(&error),

            // Bad gateway
            ProjectionServerError::Sink(_) => Self::bad_gateway(&error),
        };

        // Log server errors.
        if response.status.is_server_error() {
            event!(Level::ERROR, "{}", error.to_string());
            let mut current = error.source();
            while let Some(source) = current {
                event!(Level::ERROR, "Caused by: {}", source.to_string());
                current = source.source();
            }
        }

        response
    }
}

impl IntoResponse for ErrorResponse {
    /// Convert from an `ErrorResponse` into an `axum::response::Response`.
    ///
    /// Renders the response as JSON.
    fn into_response(self) -> Response {
        let json_body = serde_json::to_string_pretty(&self);
        match json_body {
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to serialise error response: {}", err),
            )
                .into_response(),
            Ok(json_body) => (
                self.status,
                [(&header::CONTENT_TYPE, mime::APPLICATION_JSON.to_string())],
                json_body,
            )
                .into_response(),
        }
    }
}

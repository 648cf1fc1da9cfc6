//! Error handlers
//!
//! Maps domain errors onto HTTP status codes and logs server-side failures.

use axum::http::StatusCode;
use log::error;

use crate::error::types::{AuthError, RenderError, ServerError, StorageError};

/// Convert a storage error to an HTTP status code
pub fn storage_status(err: &StorageError) -> StatusCode {
    match err {
        StorageError::InvalidPath(_) => StatusCode::BAD_REQUEST,
        StorageError::InvalidName(_) => StatusCode::BAD_REQUEST,
        StorageError::NotAFile(_) => StatusCode::BAD_REQUEST,
        StorageError::NotFound(_) => StatusCode::NOT_FOUND,
        // The folder view treats a file path as a missing folder
        StorageError::NotADirectory(_) => StatusCode::NOT_FOUND,
        StorageError::AlreadyExists(_) => StatusCode::CONFLICT,
        StorageError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Convert a server error to an HTTP status code
pub fn error_to_status(err: &ServerError) -> StatusCode {
    match err {
        ServerError::Auth(AuthError::PermissionDenied(_)) => StatusCode::FORBIDDEN,
        ServerError::Auth(_) => StatusCode::UNAUTHORIZED,
        ServerError::Storage(e) => storage_status(e),
        ServerError::Render(RenderError::InvalidSize(_)) => StatusCode::BAD_REQUEST,
        ServerError::Render(RenderError::Storage(e)) => storage_status(e),
        ServerError::Render(RenderError::Image(_)) => StatusCode::BAD_REQUEST,
        ServerError::Render(RenderError::IoError(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
        ServerError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Log an error that is about to be returned to a client
pub fn handle_error(err: &ServerError) -> StatusCode {
    let status = error_to_status(err);
    if status.is_server_error() {
        error!("Request failed: {}", err);
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_storage_errors() {
        let cases = [
            (StorageError::InvalidPath("\\".into()), StatusCode::BAD_REQUEST),
            (StorageError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (StorageError::NotADirectory("x".into()), StatusCode::NOT_FOUND),
            (StorageError::AlreadyExists("x".into()), StatusCode::CONFLICT),
            (StorageError::InvalidName("".into()), StatusCode::BAD_REQUEST),
        ];
        for (err, status) in cases {
            assert_eq!(error_to_status(&ServerError::Storage(err)), status);
        }
    }

    #[test]
    fn maps_auth_errors() {
        assert_eq!(
            error_to_status(&AuthError::MissingCredentials.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            error_to_status(&AuthError::PermissionDenied("bob".into()).into()),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn maps_render_errors() {
        assert_eq!(
            error_to_status(&RenderError::InvalidSize("123".into()).into()),
            StatusCode::BAD_REQUEST
        );
        let missing = RenderError::Storage(StorageError::NotFound("a.jpg".into()));
        assert_eq!(error_to_status(&missing.into()), StatusCode::NOT_FOUND);
    }
}

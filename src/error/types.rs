//! Error types
//!
//! Defines domain-specific error types for each concern of the file manager.

use std::fmt;
use std::io;

/// Storage module errors (paths, listings, mutations)
#[derive(Debug)]
pub enum StorageError {
    InvalidPath(String),
    NotFound(String),
    NotADirectory(String),
    NotAFile(String),
    AlreadyExists(String),
    InvalidName(String),
    IoError(io::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::InvalidPath(p) => write!(f, "Invalid path: {}", p),
            StorageError::NotFound(p) => write!(f, "Not found: {}", p),
            StorageError::NotADirectory(p) => write!(f, "Not a directory: {}", p),
            StorageError::NotAFile(p) => write!(f, "Not a file: {}", p),
            StorageError::AlreadyExists(p) => write!(f, "Already exists: {}", p),
            StorageError::InvalidName(n) => write!(f, "Invalid name: {:?}", n),
            StorageError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StorageError {
    fn from(error: io::Error) -> Self {
        StorageError::IoError(error)
    }
}

impl StorageError {
    /// Maps an I/O failure on `path` to `NotFound` when the entry vanished,
    /// keeping every other failure as an I/O error.
    pub fn from_io(error: io::Error, path: &str) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound(path.to_string()),
            _ => StorageError::IoError(error),
        }
    }
}

/// Rendition module errors
#[derive(Debug)]
pub enum RenderError {
    InvalidSize(String),
    Storage(StorageError),
    Image(image::ImageError),
    IoError(io::Error),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::InvalidSize(s) => write!(f, "Invalid size: {}", s),
            RenderError::Storage(e) => write!(f, "{}", e),
            RenderError::Image(e) => write!(f, "Image error: {}", e),
            RenderError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for RenderError {}

impl From<StorageError> for RenderError {
    fn from(error: StorageError) -> Self {
        RenderError::Storage(error)
    }
}

impl From<image::ImageError> for RenderError {
    fn from(error: image::ImageError) -> Self {
        RenderError::Image(error)
    }
}

impl From<io::Error> for RenderError {
    fn from(error: io::Error) -> Self {
        RenderError::IoError(error)
    }
}

/// Authentication and authorization errors
#[derive(Debug)]
pub enum AuthError {
    MissingCredentials,
    MalformedCredentials(String),
    InvalidCredentials(String),
    PermissionDenied(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::MissingCredentials => write!(f, "Authentication required"),
            AuthError::MalformedCredentials(s) => write!(f, "Malformed credentials: {}", s),
            AuthError::InvalidCredentials(u) => write!(f, "Invalid credentials for user: {}", u),
            AuthError::PermissionDenied(u) => write!(f, "Permission denied for user: {}", u),
        }
    }
}

impl std::error::Error for AuthError {}

/// General server error that encompasses all error types
#[derive(Debug)]
pub enum ServerError {
    Auth(AuthError),
    Storage(StorageError),
    Render(RenderError),
    BadRequest(String),
    Task(String),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Auth(e) => write!(f, "{}", e),
            ServerError::Storage(e) => write!(f, "{}", e),
            ServerError::Render(e) => write!(f, "{}", e),
            ServerError::BadRequest(e) => write!(f, "Bad request: {}", e),
            ServerError::Task(e) => write!(f, "Background task failed: {}", e),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<AuthError> for ServerError {
    fn from(error: AuthError) -> Self {
        ServerError::Auth(error)
    }
}

impl From<StorageError> for ServerError {
    fn from(error: StorageError) -> Self {
        ServerError::Storage(error)
    }
}

impl From<RenderError> for ServerError {
    fn from(error: RenderError) -> Self {
        ServerError::Render(error)
    }
}

impl From<tokio::task::JoinError> for ServerError {
    fn from(error: tokio::task::JoinError) -> Self {
        ServerError::Task(error.to_string())
    }
}

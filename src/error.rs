use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of [`Error`], for callers that only care about the
/// category of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    PermissionDenied,
    InvalidData,
    Unsupported,
    Other,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("path not found or not a directory: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("permission denied: {}", path.display())]
    PermissionDenied { path: PathBuf },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("version string must be defined in {}", path.display())]
    VersionNotFound { path: PathBuf },
    #[error("platform with cpu {arch} is not supported")]
    UnsupportedPlatform { arch: String },
    #[error("{board} is not supported")]
    BoardNotSupported { board: String },
    #[error("failed to parse XML {}: {message}", path.display())]
    Xml { path: PathBuf, message: String },
    #[error("{member} not found in the XSA archive {}", archive.display())]
    MissingMember { archive: PathBuf, member: String },
    #[error("failed to read archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("TOML error: {0}")]
    Toml(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),
    #[error("unknown log level '{0}'")]
    InvalidLevel(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } | Error::MissingMember { .. } => ErrorKind::NotFound,
            Error::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Error::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound => ErrorKind::NotFound,
                std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
                _ => ErrorKind::Other,
            },
            Error::Walk(e) => match e.io_error().map(|io| io.kind()) {
                Some(std::io::ErrorKind::NotFound) => ErrorKind::NotFound,
                Some(std::io::ErrorKind::PermissionDenied) => ErrorKind::PermissionDenied,
                _ => ErrorKind::Other,
            },
            Error::VersionNotFound { .. }
            | Error::Xml { .. }
            | Error::Zip(_)
            | Error::Toml(_)
            | Error::Json(_)
            | Error::Glob(_)
            | Error::InvalidLevel(_) => ErrorKind::InvalidData,
            Error::UnsupportedPlatform { .. } | Error::BoardNotSupported { .. } => {
                ErrorKind::Unsupported
            }
        }
    }

    pub(crate) fn not_found(path: impl Into<PathBuf>) -> Self {
        Error::NotFound { path: path.into() }
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Toml(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::Toml(e.to_string())
    }
}

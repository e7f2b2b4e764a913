use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrowseError {
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),
    #[error("cannot list {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot decode {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to launch {what}: {source}")]
    Launch {
        what: String,
        #[source]
        source: io::Error,
    },
    #[error("default image {}: {message}", path.display())]
    DefaultImage { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, BrowseError>;

impl BrowseError {
    /// Map a directory listing failure onto the listing taxonomy.
    pub fn from_listing(path: PathBuf, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => BrowseError::NotFound(path),
            io::ErrorKind::PermissionDenied => BrowseError::PermissionDenied(path),
            _ => BrowseError::Io { path, source: err },
        }
    }
}

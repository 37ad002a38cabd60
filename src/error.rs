use std::path::PathBuf;

/// Errors from which the parser cannot recover.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FatalError {
    #[error("invalid XML: {0}")]
    Xml(#[from] xml::reader::Error),

    #[error("document has no <registry> root element")]
    MissingRegistryElement,

    #[error("registry does not define {0} for the requested API")]
    MissingHeaderVersion(&'static str),
}

/// Failure to produce a snapshot from a registry on disk.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LoadError {
    /// The registry file is missing or unreadable.
    #[error("registry source unavailable at {path}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The registry file was read but could not be parsed.
    #[error("malformed registry source at {path}: {source}")]
    MalformedSource {
        path: PathBuf,
        #[source]
        source: FatalError,
    },
}

/// Failure to refresh the bundled registry from an upstream tree. None of
/// these leave the bundled registry modified.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SyncError {
    /// The upstream tree or one of the files it must contain is absent.
    #[error("source not found: {path}")]
    SourceNotFound { path: PathBuf },

    #[error("malformed registry source at {path}: {source}")]
    MalformedSource {
        path: PathBuf,
        #[source]
        source: FatalError,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid version marker at {path}: {source}")]
    InvalidMarker {
        path: PathBuf,
        #[source]
        source: crate::types::ParseHeaderVersionError,
    },
}

impl SyncError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> SyncError {
        let path = path.into();
        move |source| SyncError::Io { path, source }
    }
}

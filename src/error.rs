//! Error types for overlay computation.
//!
//! Only failures that abort a whole run live here. A file that does not
//! decode as a resource is skipped, and a document the two-way diff cannot
//! handle is dropped (see [`crate::diff::DiffError`]); neither surfaces as an
//! [`Error`].

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for unfork operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A file or directory of one of the trees could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A directory tree could not be traversed.
    #[error("failed to walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// A resource's apiVersion cannot be split into group and version.
    #[error("malformed apiVersion {api_version:?} on {kind} {name:?}")]
    MalformedIdentity {
        api_version: String,
        kind: String,
        name: String,
    },

    /// Renaming an upstream document left bytes that no longer decode as a resource.
    #[error("renamed upstream document {key} no longer decodes as a resource")]
    RenameLostIdentity { key: String },

    /// A computed patch could not be decoded for inspection.
    #[error("failed to decode patch: {source}")]
    PatchDecode {
        #[source]
        source: serde_yaml::Error,
    },

    /// A merge strategy schema is invalid.
    #[error("schema error: {message}")]
    Schema { message: String },

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

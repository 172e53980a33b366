use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// A failed read against the catalog backend.
///
/// Fatal to the view that issued the request; never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP error! status: {status} ({endpoint})")]
    Status { endpoint: String, status: u16 },

    #[error("Network error on {endpoint}: {reason}")]
    Network { endpoint: String, reason: String },

    #[error("Unexpected response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },
}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Client-side checks that reject an input before any request is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("A package file is required")]
    MissingFile,

    #[error("Unsupported file type '{0}' (expected .tsv or .csv)")]
    UnsupportedFileType(String),

    #[error("Package name is required")]
    MissingPackageName,

    #[error("Package ID is required when creating a package")]
    MissingPackageId,

    #[error("Additional identifier must be a whole number, got '{0}'")]
    NonNumericIdentifier(String),

    #[error("No identifier type available for additional identifier")]
    MissingIdentifierType,

    #[error("Page size must be greater than zero")]
    InvalidPageSize,

    #[error("Unknown sort key '{0}' (expected id, name or lastUpdated)")]
    UnknownSortKey(String),
}

pub type Result<T> = std::result::Result<T, Error>;

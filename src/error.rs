//! Error types
//!
//! [`ApiError`] covers failures talking to the Unity Catalog REST API.
//! [`ProvisionError`] covers everything the provisioner and the spec
//! builders can fail with.

use crate::resource::ResourceKind;

/// Failure of a single Admin API call
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("resource not found: {message}")]
    NotFound { message: String },

    #[error("authentication failed")]
    Unauthorized,

    #[error("permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("resource conflict: {message}")]
    Conflict { message: String },

    #[error("API request failed with status {status} ({error_code}): {message}")]
    Status {
        status: u16,
        error_code: String,
        message: String,
    },

    #[error("failed to send request: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("'{0}' cannot be used as an object name in a request path")]
    InvalidName(String),
}

impl ApiError {
    /// Whether this error means the looked-up resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Failure of a provisioning attempt or of building its spec
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("could not determine whether {kind} '{name}' exists: {source}")]
    LookupFailure {
        kind: ResourceKind,
        name: String,
        #[source]
        source: ApiError,
    },

    #[error("Unsupported credential type: {0}")]
    UnsupportedCredentialType(String),

    #[error("credential type '{credential_type}' requires field '{field}'")]
    MissingCredentialField {
        credential_type: &'static str,
        field: &'static str,
    },

    #[error("invalid {kind} spec: {reason}")]
    InvalidSpec { kind: ResourceKind, reason: String },

    #[error("failed to create {kind} '{name}': {source}")]
    CreationFailure {
        kind: ResourceKind,
        name: String,
        #[source]
        source: ApiError,
    },
}

impl ProvisionError {
    pub(crate) fn invalid(kind: ResourceKind, reason: impl Into<String>) -> Self {
        Self::InvalidSpec {
            kind,
            reason: reason.into(),
        }
    }

    /// The underlying API error, for lookup and creation failures
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::LookupFailure { source, .. } | Self::CreationFailure { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }
}

pub type Result<T, E = ProvisionError> = std::result::Result<T, E>;

//! Resource specs
//!
//! A [`ResourceSpec`] is the desired state for one provisioning call. Specs
//! can only be built through the per-kind constructors, which validate their
//! inputs, so the provisioner can rely on a well-formed spec.

use url::Url;

use super::credential::CredentialPayload;
use super::ResourceKind;
use crate::error::{ProvisionError, Result};

/// Kind-specific part of a spec; the variant determines the kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecAttributes {
    Catalog,
    Metastore {
        region: String,
        storage_root: Option<String>,
    },
    StorageCredential {
        credential: CredentialPayload,
        read_only: bool,
    },
    ExternalLocation {
        url: String,
        credential_name: String,
        read_only: bool,
    },
}

impl SpecAttributes {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Catalog => ResourceKind::Catalog,
            Self::Metastore { .. } => ResourceKind::Metastore,
            Self::StorageCredential { .. } => ResourceKind::StorageCredential,
            Self::ExternalLocation { .. } => ResourceKind::ExternalLocation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSpec {
    name: String,
    comment: Option<String>,
    attributes: SpecAttributes,
}

impl ResourceSpec {
    pub fn catalog(name: impl Into<String>, comment: Option<String>) -> Result<Self> {
        Self::new(name.into(), comment, SpecAttributes::Catalog)
    }

    pub fn metastore(
        name: impl Into<String>,
        region: impl Into<String>,
        storage_root: Option<String>,
        comment: Option<String>,
    ) -> Result<Self> {
        let kind = ResourceKind::Metastore;
        let region = required(kind, "region", region.into())?;
        let storage_root = match normalize_optional(storage_root) {
            Some(root) => Some(storage_url(kind, "storage root", root)?),
            None => None,
        };

        Self::new(
            name.into(),
            comment,
            SpecAttributes::Metastore {
                region,
                storage_root,
            },
        )
    }

    pub fn storage_credential(
        name: impl Into<String>,
        credential: CredentialPayload,
        read_only: bool,
        comment: Option<String>,
    ) -> Result<Self> {
        Self::new(
            name.into(),
            comment,
            SpecAttributes::StorageCredential {
                credential,
                read_only,
            },
        )
    }

    pub fn external_location(
        name: impl Into<String>,
        url: impl Into<String>,
        credential_name: impl Into<String>,
        read_only: bool,
        comment: Option<String>,
    ) -> Result<Self> {
        let kind = ResourceKind::ExternalLocation;
        let url = storage_url(kind, "url", required(kind, "url", url.into())?)?;
        let credential_name = required(kind, "credential name", credential_name.into())?;

        Self::new(
            name.into(),
            comment,
            SpecAttributes::ExternalLocation {
                url,
                credential_name,
                read_only,
            },
        )
    }

    fn new(name: String, comment: Option<String>, attributes: SpecAttributes) -> Result<Self> {
        let kind = attributes.kind();
        let name = required(kind, "name", name)?;
        // Dot segments would be resolved away in the object URL
        if name == "." || name == ".." {
            return Err(ProvisionError::invalid(kind, format!("name '{}' is reserved", name)));
        }

        Ok(Self {
            name,
            comment: normalize_optional(comment),
            attributes,
        })
    }

    pub fn kind(&self) -> ResourceKind {
        self.attributes.kind()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn attributes(&self) -> &SpecAttributes {
        &self.attributes
    }
}

fn required(kind: ResourceKind, field: &str, value: String) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ProvisionError::invalid(kind, format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

/// Empty and whitespace-only optional values mean "not given"
fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Storage paths must be absolute URLs with a bucket/container host,
/// e.g. `s3://bucket/path` or `abfss://container@account.dfs.core.windows.net/path`
fn storage_url(kind: ResourceKind, field: &str, value: String) -> Result<String> {
    let parsed = Url::parse(&value)
        .map_err(|e| ProvisionError::invalid(kind, format!("{} '{}' is not a valid URL: {}", field, value, e)))?;

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(ProvisionError::invalid(
            kind,
            format!("{} '{}' has no bucket or container", field, value),
        ));
    }

    Ok(value)
}

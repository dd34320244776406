//! Resource descriptors
//!
//! What the Admin API reports for an object that exists, whether it was
//! just created or found already in place.

use crate::databricks::models::{
    format_timestamp, CatalogInfo, ExternalLocationInfo, MetastoreInfo, StorageCredentialInfo,
};

use super::{CredentialType, ResourceKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceDescriptor {
    Catalog(CatalogInfo),
    Metastore(MetastoreInfo),
    StorageCredential(StorageCredentialInfo),
    ExternalLocation(ExternalLocationInfo),
}

impl ResourceDescriptor {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Catalog(_) => ResourceKind::Catalog,
            Self::Metastore(_) => ResourceKind::Metastore,
            Self::StorageCredential(_) => ResourceKind::StorageCredential,
            Self::ExternalLocation(_) => ResourceKind::ExternalLocation,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Catalog(info) => &info.name,
            Self::Metastore(info) => &info.name,
            Self::StorageCredential(info) => &info.name,
            Self::ExternalLocation(info) => &info.name,
        }
    }

    pub fn comment(&self) -> Option<&str> {
        match self {
            Self::Catalog(info) => info.comment.as_deref(),
            Self::Metastore(info) => info.comment.as_deref(),
            Self::StorageCredential(info) => info.comment.as_deref(),
            Self::ExternalLocation(info) => info.comment.as_deref(),
        }
    }

    fn created_at(&self) -> Option<i64> {
        match self {
            Self::Catalog(info) => info.created_at,
            Self::Metastore(info) => info.created_at,
            Self::StorageCredential(info) => info.created_at,
            Self::ExternalLocation(info) => info.created_at,
        }
    }

    /// Kind-specific attributes worth showing to an operator, as label/value pairs
    pub fn details(&self) -> Vec<(&'static str, String)> {
        let mut details = Vec::new();

        match self {
            Self::Catalog(info) => {
                if let Some(root) = &info.storage_root {
                    details.push(("Storage root", root.clone()));
                }
            }
            Self::Metastore(info) => {
                if let Some(region) = &info.region {
                    details.push(("Region", region.clone()));
                }
                if let Some(id) = &info.metastore_id {
                    details.push(("Metastore ID", id.clone()));
                }
                if let Some(root) = &info.storage_root {
                    details.push(("Storage root", root.clone()));
                }
            }
            Self::StorageCredential(info) => {
                if let Some(credential_type) = info
                    .credential_type()
                    .and_then(|tag| tag.parse::<CredentialType>().ok())
                {
                    details.push(("Credential type", credential_type.display_name().to_string()));
                }
                if let Some(role) = &info.aws_iam_role {
                    if let Some(external_id) = &role.external_id {
                        details.push(("External ID", external_id.clone()));
                    }
                }
                if info.read_only {
                    details.push(("Read only", "true".to_string()));
                }
            }
            Self::ExternalLocation(info) => {
                details.push(("Location URL", info.url.clone()));
                details.push(("Credential", info.credential_name.clone()));
                if info.read_only {
                    details.push(("Read only", "true".to_string()));
                }
            }
        }

        if let Some(created) = self.created_at().and_then(format_timestamp) {
            details.push(("Created at", created));
        }

        details
    }
}

//! Batch manifests
//!
//! A YAML document listing several objects to provision in order:
//!
//! ```yaml
//! resources:
//!   - kind: catalog
//!     name: credit_risk_dev
//!     comment: Credit risk sandbox
//!   - kind: storage_credential
//!     name: landing_cred
//!     credential_type: aws_iam_role
//!     details:
//!       role_arn: arn:aws:iam::123456789012:role/uc-landing
//!   - kind: external_location
//!     name: landing
//!     url: s3://acme-landing/raw
//!     credential_name: landing_cred
//! ```
//!
//! Entries are validated while loading, so a bad entry fails the whole
//! manifest before anything is sent to the API.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use super::credential::build_credential_payload;
use super::ResourceSpec;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestFile {
    #[serde(default)]
    resources: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
enum ManifestEntry {
    Catalog {
        name: String,
        #[serde(default)]
        comment: Option<String>,
    },
    Metastore {
        name: String,
        region: String,
        #[serde(default)]
        storage_root: Option<String>,
        #[serde(default)]
        comment: Option<String>,
    },
    StorageCredential {
        name: String,
        credential_type: String,
        #[serde(default)]
        details: HashMap<String, String>,
        #[serde(default)]
        read_only: bool,
        #[serde(default)]
        comment: Option<String>,
    },
    ExternalLocation {
        name: String,
        url: String,
        credential_name: String,
        #[serde(default)]
        read_only: bool,
        #[serde(default)]
        comment: Option<String>,
    },
}

impl ManifestEntry {
    fn name(&self) -> &str {
        match self {
            Self::Catalog { name, .. }
            | Self::Metastore { name, .. }
            | Self::StorageCredential { name, .. }
            | Self::ExternalLocation { name, .. } => name,
        }
    }

    fn into_spec(self) -> crate::error::Result<ResourceSpec> {
        match self {
            Self::Catalog { name, comment } => ResourceSpec::catalog(name, comment),
            Self::Metastore {
                name,
                region,
                storage_root,
                comment,
            } => ResourceSpec::metastore(name, region, storage_root, comment),
            Self::StorageCredential {
                name,
                credential_type,
                details,
                read_only,
                comment,
            } => {
                let credential = build_credential_payload(&credential_type, &details)?;
                ResourceSpec::storage_credential(name, credential, read_only, comment)
            }
            Self::ExternalLocation {
                name,
                url,
                credential_name,
                read_only,
                comment,
            } => ResourceSpec::external_location(name, url, credential_name, read_only, comment),
        }
    }
}

/// Validated specs, in manifest order
#[derive(Debug, Clone)]
pub struct Manifest {
    pub specs: Vec<ResourceSpec>,
}

impl Manifest {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let file: ManifestFile =
            serde_yaml::from_str(content).context("Failed to parse manifest YAML")?;

        let mut specs = Vec::with_capacity(file.resources.len());
        for (index, entry) in file.resources.into_iter().enumerate() {
            let label = format!("resources[{}] '{}'", index, entry.name());
            let spec = entry
                .into_spec()
                .with_context(|| format!("Invalid manifest entry {}", label))?;
            specs.push(spec);
        }

        Ok(Self { specs })
    }

    /// Load a manifest from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        Self::from_yaml_str(&content).with_context(|| format!("In manifest {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

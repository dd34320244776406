//! Resource abstraction layer
//!
//! This module provides the kind-generic provisioning core for Unity Catalog
//! governance objects.
//!
//! # Architecture
//!
//! - [`spec`] - Desired state of one object and the per-kind builders that validate it
//! - [`credential`] - Storage credential payloads (closed set of cloud identity types)
//! - [`descriptor`] - What the Admin API returns for an existing or new object
//! - [`provisioner`] - The idempotent "create if absent" operation
//! - [`manifest`] - Batch manifests describing several objects at once
//! - [`in_memory`] - An [`AdminApi`] backed by a map, for tests
//!
//! # Example
//!
//! ```ignore
//! use ucprov::report::ConsoleReporter;
//! use ucprov::resource::{Provisioner, ResourceSpec};
//!
//! async fn example(client: &ucprov::databricks::client::WorkspaceClient) -> anyhow::Result<()> {
//!     let spec = ResourceSpec::catalog("credit_risk_dev", Some("Credit risk sandbox".into()))?;
//!     let catalog = Provisioner::new(client, ConsoleReporter::default()).provision(&spec).await?;
//!     println!("{}", catalog.name());
//!     Ok(())
//! }
//! ```

pub mod credential;
mod descriptor;
pub mod in_memory;
pub mod manifest;
mod provisioner;
mod spec;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ApiError;

pub use credential::{build_credential_payload, CredentialPayload, CredentialType};
pub use descriptor::ResourceDescriptor;
pub use provisioner::{BatchSummary, ExistencePolicy, Lookup, Outcome, Provisioned, Provisioner};
pub use spec::{ResourceSpec, SpecAttributes};

/// The four kinds of governance objects that can be provisioned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Catalog,
    Metastore,
    StorageCredential,
    ExternalLocation,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        Self::Catalog,
        Self::Metastore,
        Self::StorageCredential,
        Self::ExternalLocation,
    ];

    /// Lowercase human name ("storage credential")
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Catalog => "catalog",
            Self::Metastore => "metastore",
            Self::StorageCredential => "storage credential",
            Self::ExternalLocation => "external location",
        }
    }

    /// Sentence-case human name ("Storage credential")
    pub fn title(&self) -> &'static str {
        match self {
            Self::Catalog => "Catalog",
            Self::Metastore => "Metastore",
            Self::StorageCredential => "Storage credential",
            Self::ExternalLocation => "External location",
        }
    }

    /// Verb used while the object is being made ("Creating", "Registering")
    pub fn present_participle(&self) -> &'static str {
        match self {
            Self::Catalog | Self::Metastore => "Creating",
            Self::StorageCredential | Self::ExternalLocation => "Registering",
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            Self::Catalog | Self::Metastore => "created",
            Self::StorageCredential | Self::ExternalLocation => "registered",
        }
    }

    /// Lowercase form for error messages ("Error creating catalog")
    pub fn gerund(&self) -> &'static str {
        match self {
            Self::Catalog | Self::Metastore => "creating",
            Self::StorageCredential | Self::ExternalLocation => "registering",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// The Admin API surface the provisioner needs, per resource kind
///
/// `get` must fail with an error whose [`ApiError::is_not_found`] is true when
/// no object of that name exists. `create` fails on validation errors and
/// naming conflicts.
#[async_trait]
pub trait AdminApi: Send + Sync {
    async fn get(&self, kind: ResourceKind, name: &str) -> Result<ResourceDescriptor, ApiError>;

    async fn create(&self, spec: &ResourceSpec) -> Result<ResourceDescriptor, ApiError>;
}

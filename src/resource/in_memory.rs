//! In-memory implementation of [`AdminApi`] for testing.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::json;

use crate::databricks::http::error_from_response;
use crate::databricks::models::{
    AwsIamRoleInfo, AzureManagedIdentityInfo, AzureServicePrincipalInfo, CatalogInfo,
    ExternalLocationInfo, MetastoreInfo, StorageCredentialInfo,
};
use crate::error::ApiError;

use super::credential::CredentialPayload;
use super::{AdminApi, ResourceDescriptor, ResourceKind, ResourceSpec, SpecAttributes};

/// Objects keyed by kind and name, with call counters and failure injection
#[derive(Default)]
pub struct InMemoryAdminApi {
    objects: RwLock<HashMap<(ResourceKind, String), ResourceDescriptor>>,
    get_calls: AtomicUsize,
    create_calls: AtomicUsize,
    lookup_failure: RwLock<Option<u16>>,
    create_failure: RwLock<Option<u16>>,
}

impl InMemoryAdminApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object as if it had been created out of band
    pub fn insert(&self, descriptor: ResourceDescriptor) {
        let key = (descriptor.kind(), descriptor.name().to_string());
        if let Ok(mut objects) = self.objects.write() {
            objects.insert(key, descriptor);
        }
    }

    /// Make every `get` fail with this HTTP status (`None` to stop)
    pub fn fail_lookups_with(&self, status: Option<u16>) {
        if let Ok(mut failure) = self.lookup_failure.write() {
            *failure = status;
        }
    }

    /// Make every `create` fail with this HTTP status (`None` to stop)
    pub fn fail_creates_with(&self, status: Option<u16>) {
        if let Ok(mut failure) = self.create_failure.write() {
            *failure = status;
        }
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.objects.read().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn injected_failure(slot: &RwLock<Option<u16>>) -> Option<ApiError> {
        let status = slot.read().ok().and_then(|s| *s)?;
        let body = json!({
            "error_code": "INJECTED_FAILURE",
            "message": format!("injected failure with status {}", status)
        });
        Some(error_from_response(status, &body.to_string()))
    }

    fn contains(&self, kind: ResourceKind, name: &str) -> bool {
        self.objects
            .read()
            .map(|o| o.contains_key(&(kind, name.to_string())))
            .unwrap_or(false)
    }
}

#[async_trait]
impl AdminApi for InMemoryAdminApi {
    async fn get(&self, kind: ResourceKind, name: &str) -> Result<ResourceDescriptor, ApiError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = Self::injected_failure(&self.lookup_failure) {
            return Err(error);
        }

        let objects = self.objects.read().map_err(|_| ApiError::Status {
            status: 500,
            error_code: "INTERNAL_ERROR".to_string(),
            message: "object store poisoned".to_string(),
        })?;

        objects
            .get(&(kind, name.to_string()))
            .cloned()
            .ok_or_else(|| ApiError::NotFound {
                message: format!("{} '{}' does not exist.", kind.title(), name),
            })
    }

    async fn create(&self, spec: &ResourceSpec) -> Result<ResourceDescriptor, ApiError> {
        let sequence = self.create_calls.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(error) = Self::injected_failure(&self.create_failure) {
            return Err(error);
        }

        if let SpecAttributes::ExternalLocation {
            credential_name, ..
        } = spec.attributes()
        {
            if !self.contains(ResourceKind::StorageCredential, credential_name) {
                return Err(ApiError::NotFound {
                    message: format!("Storage Credential '{}' does not exist.", credential_name),
                });
            }
        }

        let descriptor = descriptor_for(spec, sequence);
        let mut objects = self.objects.write().map_err(|_| ApiError::Status {
            status: 500,
            error_code: "INTERNAL_ERROR".to_string(),
            message: "object store poisoned".to_string(),
        })?;

        match objects.entry((spec.kind(), spec.name().to_string())) {
            Entry::Vacant(e) => {
                e.insert(descriptor.clone());
                Ok(descriptor)
            }
            Entry::Occupied(_) => Err(ApiError::Conflict {
                message: format!("{} '{}' already exists", spec.kind().title(), spec.name()),
            }),
        }
    }
}

/// What the API would echo back for a freshly created object
fn descriptor_for(spec: &ResourceSpec, sequence: usize) -> ResourceDescriptor {
    let name = spec.name().to_string();
    let comment = spec.comment().map(str::to_string);

    match spec.attributes() {
        SpecAttributes::Catalog => ResourceDescriptor::Catalog(CatalogInfo {
            name,
            comment,
            owner: None,
            metastore_id: None,
            storage_root: None,
            created_at: None,
        }),
        SpecAttributes::Metastore {
            region,
            storage_root,
        } => ResourceDescriptor::Metastore(MetastoreInfo {
            name,
            metastore_id: Some(format!("metastore-{:04}", sequence)),
            region: Some(region.clone()),
            storage_root: storage_root.clone(),
            comment,
            owner: None,
            created_at: None,
        }),
        SpecAttributes::StorageCredential {
            credential,
            read_only,
        } => {
            let mut info = StorageCredentialInfo {
                name,
                id: Some(format!("credential-{:04}", sequence)),
                comment,
                owner: None,
                read_only: *read_only,
                aws_iam_role: None,
                azure_managed_identity: None,
                azure_service_principal: None,
                created_at: None,
            };
            match credential {
                CredentialPayload::AwsIamRole(role) => {
                    info.aws_iam_role = Some(AwsIamRoleInfo {
                        role_arn: role.role_arn.clone(),
                        external_id: None,
                        unity_catalog_iam_arn: None,
                    })
                }
                CredentialPayload::AzureManagedIdentity(identity) => {
                    info.azure_managed_identity = Some(AzureManagedIdentityInfo {
                        managed_identity_id: Some(identity.managed_identity_id.clone()),
                        access_connector_id: None,
                        credential_id: None,
                    })
                }
                CredentialPayload::AzureServicePrincipal(principal) => {
                    info.azure_service_principal = Some(AzureServicePrincipalInfo {
                        directory_id: principal.directory_id.clone(),
                        application_id: principal.application_id.clone(),
                    })
                }
            }
            ResourceDescriptor::StorageCredential(info)
        }
        SpecAttributes::ExternalLocation {
            url,
            credential_name,
            read_only,
        } => ResourceDescriptor::ExternalLocation(ExternalLocationInfo {
            name,
            url: url.clone(),
            credential_name: credential_name.clone(),
            comment,
            owner: None,
            read_only: *read_only,
            created_at: None,
        }),
    }
}

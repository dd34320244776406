//! Workspace Client
//!
//! Main client for the Unity Catalog REST API, combining credentials and
//! HTTP functionality. Implements [`AdminApi`] for the provisioner.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use url::Url;

use super::auth::Credentials;
use super::http::{HttpOptions, UcHttpClient};
use super::models::{
    CatalogInfo, ExternalLocationInfo, ListMetastoresResponse, MetastoreInfo,
    StorageCredentialInfo,
};
use crate::error::ApiError;
use crate::resource::{AdminApi, ResourceDescriptor, ResourceKind, ResourceSpec, SpecAttributes};

/// Path of the Unity Catalog API below the workspace host
pub const API_BASE_PATH: &str = "api/2.1/unity-catalog/";

/// Main Unity Catalog client, constructed once and shared by reference
#[derive(Clone)]
pub struct WorkspaceClient {
    http: UcHttpClient,
    base_url: Url,
    token: String,
}

impl WorkspaceClient {
    /// Create a new client for a workspace host (`https://` is assumed when no scheme is given)
    pub fn new(credentials: &Credentials, options: HttpOptions) -> Result<Self, ApiError> {
        let host = credentials.host.trim().trim_end_matches('/');
        let host = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        };

        let mut base_url = Url::parse(&host)?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }
        let base_url = base_url.join(API_BASE_PATH)?;

        Ok(Self {
            http: UcHttpClient::new(options)?,
            base_url,
            token: credentials.token.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Collection endpoint, e.g. `storage-credentials`
    fn collection_url(&self, kind: ResourceKind) -> Result<Url, ApiError> {
        Ok(self.base_url.join(collection_path(kind))?)
    }

    /// Single object endpoint with a percent-encoded name
    ///
    /// `.` and `..` are refused: URL parsing resolves them (even percent-encoded)
    /// and the request would hit a different endpoint.
    fn object_url(&self, kind: ResourceKind, name: &str) -> Result<Url, ApiError> {
        if name == "." || name == ".." {
            return Err(ApiError::InvalidName(name.to_string()));
        }
        let path = format!("{}/{}", collection_path(kind), urlencoding::encode(name));
        Ok(self.base_url.join(&path)?)
    }

    // =========================================================================
    // Catalogs
    // =========================================================================

    pub async fn get_catalog(&self, name: &str) -> Result<CatalogInfo, ApiError> {
        let url = self.object_url(ResourceKind::Catalog, name)?;
        self.http.get(&url, &self.token).await
    }

    pub async fn create_catalog(&self, body: &Value) -> Result<CatalogInfo, ApiError> {
        let url = self.collection_url(ResourceKind::Catalog)?;
        self.http.post(&url, &self.token, body).await
    }

    // =========================================================================
    // Metastores
    // =========================================================================

    pub async fn list_metastores(&self) -> Result<Vec<MetastoreInfo>, ApiError> {
        let url = self.collection_url(ResourceKind::Metastore)?;
        let response: ListMetastoresResponse = self.http.get(&url, &self.token).await?;
        Ok(response.metastores)
    }

    /// Metastores are addressed by id, so a name lookup lists and filters
    pub async fn get_metastore_by_name(&self, name: &str) -> Result<MetastoreInfo, ApiError> {
        self.list_metastores()
            .await?
            .into_iter()
            .find(|m| m.name == name)
            .ok_or_else(|| ApiError::NotFound {
                message: format!("Metastore '{}' does not exist.", name),
            })
    }

    pub async fn create_metastore(&self, body: &Value) -> Result<MetastoreInfo, ApiError> {
        let url = self.collection_url(ResourceKind::Metastore)?;
        self.http.post(&url, &self.token, body).await
    }

    // =========================================================================
    // Storage credentials
    // =========================================================================

    pub async fn get_storage_credential(
        &self,
        name: &str,
    ) -> Result<StorageCredentialInfo, ApiError> {
        let url = self.object_url(ResourceKind::StorageCredential, name)?;
        self.http.get(&url, &self.token).await
    }

    pub async fn create_storage_credential(
        &self,
        body: &Value,
    ) -> Result<StorageCredentialInfo, ApiError> {
        let url = self.collection_url(ResourceKind::StorageCredential)?;
        self.http.post(&url, &self.token, body).await
    }

    // =========================================================================
    // External locations
    // =========================================================================

    pub async fn get_external_location(
        &self,
        name: &str,
    ) -> Result<ExternalLocationInfo, ApiError> {
        let url = self.object_url(ResourceKind::ExternalLocation, name)?;
        self.http.get(&url, &self.token).await
    }

    pub async fn create_external_location(
        &self,
        body: &Value,
    ) -> Result<ExternalLocationInfo, ApiError> {
        let url = self.collection_url(ResourceKind::ExternalLocation)?;
        self.http.post(&url, &self.token, body).await
    }
}

fn collection_path(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Catalog => "catalogs",
        ResourceKind::Metastore => "metastores",
        ResourceKind::StorageCredential => "storage-credentials",
        ResourceKind::ExternalLocation => "external-locations",
    }
}

/// JSON body of the create request for a spec
pub fn create_request_body(spec: &ResourceSpec) -> Result<Value, ApiError> {
    let mut body = Map::new();
    body.insert("name".to_string(), json!(spec.name()));
    if let Some(comment) = spec.comment() {
        body.insert("comment".to_string(), json!(comment));
    }

    match spec.attributes() {
        SpecAttributes::Catalog => {}
        SpecAttributes::Metastore {
            region,
            storage_root,
        } => {
            body.insert("region".to_string(), json!(region));
            if let Some(root) = storage_root {
                body.insert("storage_root".to_string(), json!(root));
            }
        }
        SpecAttributes::StorageCredential {
            credential,
            read_only,
        } => {
            body.insert(
                credential.credential_type().as_str().to_string(),
                credential.to_json()?,
            );
            if *read_only {
                body.insert("read_only".to_string(), json!(true));
            }
        }
        SpecAttributes::ExternalLocation {
            url,
            credential_name,
            read_only,
        } => {
            body.insert("url".to_string(), json!(url));
            body.insert("credential_name".to_string(), json!(credential_name));
            if *read_only {
                body.insert("read_only".to_string(), json!(true));
            }
        }
    }

    Ok(Value::Object(body))
}

#[async_trait]
impl AdminApi for WorkspaceClient {
    async fn get(&self, kind: ResourceKind, name: &str) -> Result<ResourceDescriptor, ApiError> {
        match kind {
            ResourceKind::Catalog => self.get_catalog(name).await.map(ResourceDescriptor::Catalog),
            ResourceKind::Metastore => self
                .get_metastore_by_name(name)
                .await
                .map(ResourceDescriptor::Metastore),
            ResourceKind::StorageCredential => self
                .get_storage_credential(name)
                .await
                .map(ResourceDescriptor::StorageCredential),
            ResourceKind::ExternalLocation => self
                .get_external_location(name)
                .await
                .map(ResourceDescriptor::ExternalLocation),
        }
    }

    async fn create(&self, spec: &ResourceSpec) -> Result<ResourceDescriptor, ApiError> {
        let body = create_request_body(spec)?;
        tracing::info!("Creating {} '{}'", spec.kind(), spec.name());

        match spec.kind() {
            ResourceKind::Catalog => self
                .create_catalog(&body)
                .await
                .map(ResourceDescriptor::Catalog),
            ResourceKind::Metastore => self
                .create_metastore(&body)
                .await
                .map(ResourceDescriptor::Metastore),
            ResourceKind::StorageCredential => self
                .create_storage_credential(&body)
                .await
                .map(ResourceDescriptor::StorageCredential),
            ResourceKind::ExternalLocation => self
                .create_external_location(&body)
                .await
                .map(ResourceDescriptor::ExternalLocation),
        }
    }
}

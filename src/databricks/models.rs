//! Unity Catalog API models
//!
//! Subsets of the object records returned by the Unity Catalog REST API.
//! Unknown fields are ignored; optional fields default to `None`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Catalog record (`GET /catalogs/{name}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogInfo {
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub metastore_id: Option<String>,
    #[serde(default)]
    pub storage_root: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

/// Metastore record (`GET /metastores`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetastoreInfo {
    pub name: String,
    #[serde(default)]
    pub metastore_id: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub storage_root: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

/// Response of `GET /metastores`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListMetastoresResponse {
    #[serde(default)]
    pub metastores: Vec<MetastoreInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsIamRoleInfo {
    pub role_arn: String,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub unity_catalog_iam_arn: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AzureManagedIdentityInfo {
    #[serde(default)]
    pub managed_identity_id: Option<String>,
    #[serde(default)]
    pub access_connector_id: Option<String>,
    #[serde(default)]
    pub credential_id: Option<String>,
}

/// Service principal as echoed back by the API (the secret is never returned)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AzureServicePrincipalInfo {
    pub directory_id: String,
    pub application_id: String,
}

/// Storage credential record (`GET /storage-credentials/{name}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageCredentialInfo {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub aws_iam_role: Option<AwsIamRoleInfo>,
    #[serde(default)]
    pub azure_managed_identity: Option<AzureManagedIdentityInfo>,
    #[serde(default)]
    pub azure_service_principal: Option<AzureServicePrincipalInfo>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

impl StorageCredentialInfo {
    /// Wire tag of the identity branch the API reported, if any
    pub fn credential_type(&self) -> Option<&'static str> {
        if self.aws_iam_role.is_some() {
            Some("aws_iam_role")
        } else if self.azure_managed_identity.is_some() {
            Some("azure_managed_identity")
        } else if self.azure_service_principal.is_some() {
            Some("azure_service_principal")
        } else {
            None
        }
    }
}

/// External location record (`GET /external-locations/{name}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalLocationInfo {
    pub name: String,
    pub url: String,
    pub credential_name: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub created_at: Option<i64>,
}

/// Error body returned by the API on non-success responses
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Render an epoch-millis timestamp from the API
pub fn format_timestamp(millis: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_catalog_ignores_unknown_fields() {
        let info: CatalogInfo = serde_json::from_value(json!({
            "name": "credit_risk_dev",
            "comment": "c",
            "catalog_type": "MANAGED_CATALOG",
            "isolation_mode": "OPEN"
        }))
        .unwrap();

        assert_eq!(info.name, "credit_risk_dev");
        assert_eq!(info.comment.as_deref(), Some("c"));
        assert!(info.owner.is_none());
    }

    #[test]
    fn test_storage_credential_type() {
        let info: StorageCredentialInfo = serde_json::from_value(json!({
            "name": "landing_cred",
            "aws_iam_role": {
                "role_arn": "arn:aws:iam::1:role/x",
                "external_id": "abc"
            }
        }))
        .unwrap();

        assert_eq!(info.credential_type(), Some("aws_iam_role"));
        assert!(!info.read_only);
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(
            format_timestamp(1_700_000_000_000).as_deref(),
            Some("2023-11-14 22:13:20 UTC")
        );
    }
}

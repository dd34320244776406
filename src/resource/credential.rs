//! Storage credential payloads
//!
//! A storage credential wraps exactly one cloud identity. The set of identity
//! types is closed: anything else is rejected here, before a request is built.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{ProvisionError, Result};

/// Tag naming one of the supported cloud identity types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialType {
    AzureManagedIdentity,
    AzureServicePrincipal,
    AwsIamRole,
}

impl CredentialType {
    pub const ALL: [CredentialType; 3] = [
        Self::AzureManagedIdentity,
        Self::AzureServicePrincipal,
        Self::AwsIamRole,
    ];

    /// Wire tag, also the key of the payload in a create request
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AzureManagedIdentity => "azure_managed_identity",
            Self::AzureServicePrincipal => "azure_service_principal",
            Self::AwsIamRole => "aws_iam_role",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::AzureManagedIdentity => "Azure Managed Identity",
            Self::AzureServicePrincipal => "Azure Service Principal",
            Self::AwsIamRole => "AWS IAM Role",
        }
    }

    /// Detail fields this type needs
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            Self::AzureManagedIdentity => &["managed_identity_id"],
            Self::AzureServicePrincipal => &["directory_id", "application_id", "client_secret"],
            Self::AwsIamRole => &["role_arn"],
        }
    }
}

impl FromStr for CredentialType {
    type Err = ProvisionError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "azure_managed_identity" => Ok(Self::AzureManagedIdentity),
            "azure_service_principal" => Ok(Self::AzureServicePrincipal),
            "aws_iam_role" => Ok(Self::AwsIamRole),
            other => Err(ProvisionError::UnsupportedCredentialType(other.to_string())),
        }
    }
}

impl fmt::Display for CredentialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AzureManagedIdentity {
    pub managed_identity_id: String,
}

#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct AzureServicePrincipal {
    pub directory_id: String,
    pub application_id: String,
    pub client_secret: String,
}

impl fmt::Debug for AzureServicePrincipal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureServicePrincipal")
            .field("directory_id", &self.directory_id)
            .field("application_id", &self.application_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AwsIamRole {
    pub role_arn: String,
}

/// The cloud identity behind a storage credential; exactly one branch is set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialPayload {
    AzureManagedIdentity(AzureManagedIdentity),
    AzureServicePrincipal(AzureServicePrincipal),
    AwsIamRole(AwsIamRole),
}

impl CredentialPayload {
    pub fn credential_type(&self) -> CredentialType {
        match self {
            Self::AzureManagedIdentity(_) => CredentialType::AzureManagedIdentity,
            Self::AzureServicePrincipal(_) => CredentialType::AzureServicePrincipal,
            Self::AwsIamRole(_) => CredentialType::AwsIamRole,
        }
    }

    pub fn as_azure_managed_identity(&self) -> Option<&AzureManagedIdentity> {
        match self {
            Self::AzureManagedIdentity(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn as_azure_service_principal(&self) -> Option<&AzureServicePrincipal> {
        match self {
            Self::AzureServicePrincipal(principal) => Some(principal),
            _ => None,
        }
    }

    pub fn as_aws_iam_role(&self) -> Option<&AwsIamRole> {
        match self {
            Self::AwsIamRole(role) => Some(role),
            _ => None,
        }
    }

    /// JSON body of the active branch, to be placed under [`CredentialType::as_str`]
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            Self::AzureManagedIdentity(identity) => serde_json::to_value(identity),
            Self::AzureServicePrincipal(principal) => serde_json::to_value(principal),
            Self::AwsIamRole(role) => serde_json::to_value(role),
        }
    }
}

/// Build a credential payload from a type tag and its named detail fields
///
/// Unknown tags fail with [`ProvisionError::UnsupportedCredentialType`].
/// Extra entries in `details` are ignored.
pub fn build_credential_payload(
    credential_type: &str,
    details: &HashMap<String, String>,
) -> Result<CredentialPayload> {
    let credential_type: CredentialType = credential_type.parse()?;
    let field = |name: &'static str| required_detail(credential_type, details, name);

    let payload = match credential_type {
        CredentialType::AzureManagedIdentity => {
            CredentialPayload::AzureManagedIdentity(AzureManagedIdentity {
                managed_identity_id: field("managed_identity_id")?,
            })
        }
        CredentialType::AzureServicePrincipal => {
            CredentialPayload::AzureServicePrincipal(AzureServicePrincipal {
                directory_id: field("directory_id")?,
                application_id: field("application_id")?,
                client_secret: field("client_secret")?,
            })
        }
        CredentialType::AwsIamRole => CredentialPayload::AwsIamRole(AwsIamRole {
            role_arn: field("role_arn")?,
        }),
    };

    Ok(payload)
}

fn required_detail(
    credential_type: CredentialType,
    details: &HashMap<String, String>,
    field: &'static str,
) -> Result<String> {
    // Blank means missing; anything else is sent as given
    match details.get(field) {
        Some(value) if !value.trim().is_empty() => Ok(value.clone()),
        _ => Err(ProvisionError::MissingCredentialField {
            credential_type: credential_type.as_str(),
            field,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_aws_iam_role_payload() {
        let payload = build_credential_payload(
            "aws_iam_role",
            &details(&[("role_arn", "arn:aws:iam::1:role/x")]),
        )
        .unwrap();

        assert_eq!(
            payload,
            CredentialPayload::AwsIamRole(AwsIamRole {
                role_arn: "arn:aws:iam::1:role/x".to_string()
            })
        );
        assert!(payload.as_azure_managed_identity().is_none());
        assert!(payload.as_azure_service_principal().is_none());
    }

    #[test]
    fn test_service_principal_payload() {
        let payload = build_credential_payload(
            "azure_service_principal",
            &details(&[
                ("directory_id", "tenant"),
                ("application_id", "app"),
                ("client_secret", "s3cr3t"),
            ]),
        )
        .unwrap();

        let principal = payload.as_azure_service_principal().unwrap();
        assert_eq!(principal.directory_id, "tenant");
        assert_eq!(principal.application_id, "app");
        assert_eq!(payload.credential_type(), CredentialType::AzureServicePrincipal);
    }

    #[test]
    fn test_service_principal_debug_hides_secret() {
        let principal = AzureServicePrincipal {
            directory_id: "tenant".to_string(),
            application_id: "app".to_string(),
            client_secret: "s3cr3t".to_string(),
        };
        let rendered = format!("{:?}", principal);
        assert!(!rendered.contains("s3cr3t"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_unsupported_type() {
        let err = build_credential_payload("gcp_service_account", &HashMap::new()).unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::UnsupportedCredentialType(ref t) if t == "gcp_service_account"
        ));
    }

    #[test]
    fn test_tags_are_case_sensitive() {
        assert!("AWS_IAM_ROLE".parse::<CredentialType>().is_err());
    }

    #[test]
    fn test_missing_field() {
        let err = build_credential_payload(
            "azure_service_principal",
            &details(&[("directory_id", "tenant"), ("application_id", "app")]),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ProvisionError::MissingCredentialField {
                credential_type: "azure_service_principal",
                field: "client_secret"
            }
        ));
    }

    #[test]
    fn test_blank_field_counts_as_missing() {
        let err =
            build_credential_payload("azure_managed_identity", &details(&[("managed_identity_id", "  ")]))
                .unwrap_err();
        assert!(matches!(err, ProvisionError::MissingCredentialField { .. }));
    }

    #[test]
    fn test_secret_whitespace_is_kept() {
        let payload = build_credential_payload(
            "azure_service_principal",
            &details(&[
                ("directory_id", "tenant"),
                ("application_id", "app"),
                ("client_secret", " s3cr3t~ "),
            ]),
        )
        .unwrap();

        let principal = payload.as_azure_service_principal().unwrap();
        assert_eq!(principal.client_secret, " s3cr3t~ ");
    }

    #[test]
    fn test_json_body() {
        let payload = CredentialPayload::AzureManagedIdentity(AzureManagedIdentity {
            managed_identity_id: "/subscriptions/1/mi".to_string(),
        });
        let body = payload.to_json().unwrap();
        assert_eq!(body["managed_identity_id"], "/subscriptions/1/mi");
    }

    #[test]
    fn test_required_fields_cover_every_type() {
        for credential_type in CredentialType::ALL {
            let fields: HashMap<String, String> = credential_type
                .required_fields()
                .iter()
                .map(|f| (f.to_string(), "value".to_string()))
                .collect();
            let payload = build_credential_payload(credential_type.as_str(), &fields).unwrap();
            assert_eq!(payload.credential_type(), credential_type);
        }
    }
}

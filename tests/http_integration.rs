//! Integration tests for the workspace client using wiremock
//!
//! These tests run the provisioner against a mocked Unity Catalog API and
//! verify which calls are made for each lookup outcome.

use serde_json::json;
use wiremock::matchers::{bearer_token, body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ucprov::databricks::auth::Credentials;
use ucprov::databricks::client::WorkspaceClient;
use ucprov::databricks::http::HttpOptions;
use ucprov::error::{ApiError, ProvisionError};
use ucprov::report::RecordingReporter;
use ucprov::resource::credential::{AzureManagedIdentity, CredentialPayload};
use ucprov::resource::{ExistencePolicy, Outcome, Provisioner, ResourceKind, ResourceSpec};

const TOKEN: &str = "dapi-test-token";

fn client_for(server: &MockServer) -> WorkspaceClient {
    let credentials = Credentials {
        host: server.uri(),
        token: TOKEN.to_string(),
    };
    WorkspaceClient::new(&credentials, HttpOptions::default()).expect("client should build")
}

fn not_found(error_code: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(json!({
        "error_code": error_code,
        "message": message
    }))
}

mod catalog_tests {
    use super::*;

    /// A missing catalog is created with the requested attributes
    #[tokio::test]
    async fn test_missing_catalog_is_created() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/2.1/unity-catalog/catalogs/credit_risk_dev"))
            .and(bearer_token(TOKEN))
            .respond_with(not_found(
                "CATALOG_DOES_NOT_EXIST",
                "Catalog 'credit_risk_dev' does not exist.",
            ))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/2.1/unity-catalog/catalogs"))
            .and(bearer_token(TOKEN))
            .and(body_json(json!({
                "name": "credit_risk_dev",
                "comment": "Credit risk development"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "credit_risk_dev",
                "comment": "Credit risk development",
                "owner": "admins",
                "created_at": 1700000000000i64
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let reporter = RecordingReporter::new();
        let provisioner = Provisioner::new(&client, &reporter);

        let spec = ResourceSpec::catalog(
            "credit_risk_dev",
            Some("Credit risk development".to_string()),
        )
        .unwrap();
        let provisioned = provisioner.ensure_exists(&spec).await.unwrap();

        assert_eq!(provisioned.outcome, Outcome::Created);
        assert_eq!(provisioned.descriptor.name(), "credit_risk_dev");
        assert_eq!(
            reporter.messages().last().map(String::as_str),
            Some("✓ Successfully created catalog: credit_risk_dev")
        );
    }

    /// An existing catalog is returned as is, without a create call
    #[tokio::test]
    async fn test_existing_catalog_is_not_recreated() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/2.1/unity-catalog/catalogs/main"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "main",
                "comment": "original comment",
                "metastore_id": "11111111-2222"
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let provisioner = Provisioner::new(&client, RecordingReporter::new());

        let spec = ResourceSpec::catalog("main", Some("a different comment".to_string())).unwrap();
        let provisioned = provisioner.ensure_exists(&spec).await.unwrap();

        assert_eq!(provisioned.outcome, Outcome::AlreadyExisted);
        assert_eq!(provisioned.descriptor.comment(), Some("original comment"));
    }

    /// Permission errors on lookup abort without attempting creation
    #[tokio::test]
    async fn test_forbidden_lookup_aborts() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/2.1/unity-catalog/catalogs/restricted"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error_code": "PERMISSION_DENIED",
                "message": "User does not have USE CATALOG on Catalog 'restricted'."
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let provisioner = Provisioner::new(&client, RecordingReporter::new());

        let spec = ResourceSpec::catalog("restricted", None).unwrap();
        let err = provisioner.ensure_exists(&spec).await.unwrap_err();

        match err {
            ProvisionError::LookupFailure { kind, name, source } => {
                assert_eq!(kind, ResourceKind::Catalog);
                assert_eq!(name, "restricted");
                assert!(matches!(source, ApiError::PermissionDenied { .. }));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    /// With the lenient policy a server error on lookup still leads to creation
    #[tokio::test]
    async fn test_lenient_policy_creates_after_server_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/2.1/unity-catalog/catalogs/flaky"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/2.1/unity-catalog/catalogs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "flaky"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let provisioner =
            Provisioner::new(&client, RecordingReporter::new()).with_policy(ExistencePolicy::Lenient);

        let spec = ResourceSpec::catalog("flaky", None).unwrap();
        let provisioned = provisioner.ensure_exists(&spec).await.unwrap();

        assert_eq!(provisioned.outcome, Outcome::Created);
    }

    /// A create rejected by the server surfaces as a creation failure
    #[tokio::test]
    async fn test_conflict_on_create() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/2.1/unity-catalog/catalogs/raced"))
            .respond_with(not_found("CATALOG_DOES_NOT_EXIST", "Catalog 'raced' does not exist."))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/2.1/unity-catalog/catalogs"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "error_code": "CATALOG_ALREADY_EXISTS",
                "message": "Catalog 'raced' already exists"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let reporter = RecordingReporter::new();
        let provisioner = Provisioner::new(&client, &reporter);

        let spec = ResourceSpec::catalog("raced", None).unwrap();
        let err = provisioner.ensure_exists(&spec).await.unwrap_err();

        assert!(matches!(
            err.api_error(),
            Some(ApiError::Conflict { .. })
        ));
        assert!(reporter
            .messages()
            .last()
            .unwrap()
            .starts_with("✗ Error creating catalog:"));
    }

    /// 401 maps to an authentication error
    #[tokio::test]
    async fn test_unauthorized_lookup() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error_code": "UNAUTHENTICATED",
                "message": "Invalid access token."
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.get_catalog("main").await.unwrap_err();

        assert!(matches!(err, ApiError::Unauthorized));
    }
}

mod metastore_tests {
    use super::*;

    /// Metastore lookup goes through the list endpoint
    #[tokio::test]
    async fn test_metastore_found_in_list() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/2.1/unity-catalog/metastores"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "metastores": [
                    {"name": "uk-metastore", "metastore_id": "m-1", "region": "uksouth"},
                    {"name": "us-metastore", "metastore_id": "m-2", "region": "eastus"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let provisioner = Provisioner::new(&client, RecordingReporter::new());

        let spec = ResourceSpec::metastore("us-metastore", "eastus", None, None).unwrap();
        let provisioned = provisioner.ensure_exists(&spec).await.unwrap();

        assert_eq!(provisioned.outcome, Outcome::AlreadyExisted);
        assert!(provisioned
            .descriptor
            .details()
            .contains(&("Metastore ID", "m-2".to_string())));
    }

    /// A name absent from the list is created
    #[tokio::test]
    async fn test_metastore_missing_from_list_is_created() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/2.1/unity-catalog/metastores"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/2.1/unity-catalog/metastores"))
            .and(body_json(json!({
                "name": "uk-metastore",
                "region": "uksouth",
                "storage_root": "abfss://root@account.dfs.core.windows.net/"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "uk-metastore",
                "metastore_id": "m-3",
                "region": "uksouth"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let provisioner = Provisioner::new(&client, RecordingReporter::new());

        let spec = ResourceSpec::metastore(
            "uk-metastore",
            "uksouth",
            Some("abfss://root@account.dfs.core.windows.net/".to_string()),
            None,
        )
        .unwrap();
        let provisioned = provisioner.ensure_exists(&spec).await.unwrap();

        assert_eq!(provisioned.outcome, Outcome::Created);
    }
}

mod storage_tests {
    use super::*;

    /// The credential branch is sent under its type tag
    #[tokio::test]
    async fn test_storage_credential_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/2.1/unity-catalog/storage-credentials/lake_mi"))
            .respond_with(not_found(
                "STORAGE_CREDENTIAL_DOES_NOT_EXIST",
                "Storage Credential 'lake_mi' does not exist.",
            ))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/2.1/unity-catalog/storage-credentials"))
            .and(body_json(json!({
                "name": "lake_mi",
                "azure_managed_identity": {
                    "managed_identity_id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.ManagedIdentity/userAssignedIdentities/mi"
                },
                "read_only": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "lake_mi",
                "read_only": true,
                "azure_managed_identity": {
                    "managed_identity_id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.ManagedIdentity/userAssignedIdentities/mi"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let provisioner = Provisioner::new(&client, RecordingReporter::new());

        let credential = CredentialPayload::AzureManagedIdentity(AzureManagedIdentity {
            managed_identity_id:
                "/subscriptions/s/resourceGroups/rg/providers/Microsoft.ManagedIdentity/userAssignedIdentities/mi"
                    .to_string(),
        });
        let spec = ResourceSpec::storage_credential("lake_mi", credential, true, None).unwrap();
        let provisioned = provisioner.ensure_exists(&spec).await.unwrap();

        assert_eq!(provisioned.outcome, Outcome::Created);
        assert_eq!(provisioned.descriptor.kind(), ResourceKind::StorageCredential);
    }

    /// Names with spaces are percent-encoded in the lookup path
    #[tokio::test]
    async fn test_external_location_lookup_encodes_name() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/2.1/unity-catalog/external-locations/raw%20landing"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "raw landing",
                "url": "s3://bucket/raw",
                "credential_name": "landing_cred"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let provisioner = Provisioner::new(&client, RecordingReporter::new());

        assert!(provisioner
            .exists(ResourceKind::ExternalLocation, "raw landing")
            .await
            .unwrap());
    }

    /// Dot-segment names never reach the server
    #[tokio::test]
    async fn test_dot_segment_name_is_not_requested() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let provisioner = Provisioner::new(&client, RecordingReporter::new());

        for name in [".", ".."] {
            let err = provisioner
                .exists(ResourceKind::ExternalLocation, name)
                .await
                .unwrap_err();
            assert!(matches!(
                err.api_error(),
                Some(ApiError::InvalidName(_))
            ));
        }
    }

    /// Batches stop after the first failure by default
    #[tokio::test]
    async fn test_batch_stops_after_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/2.1/unity-catalog/storage-credentials/cred"))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({
                "error_code": "TEMPORARILY_UNAVAILABLE",
                "message": "try again"
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/2.1/unity-catalog/external-locations/loc"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let provisioner = Provisioner::new(&client, RecordingReporter::new());

        let credential = CredentialPayload::AzureManagedIdentity(AzureManagedIdentity {
            managed_identity_id: "mi".to_string(),
        });
        let specs = vec![
            ResourceSpec::storage_credential("cred", credential, false, None).unwrap(),
            ResourceSpec::external_location("loc", "s3://bucket/loc", "cred", false, None).unwrap(),
        ];

        let summary = provisioner.provision_all(&specs, false).await;

        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.headline(), "0 created, 0 already existed, 1 failed, 1 not attempted");
    }
}

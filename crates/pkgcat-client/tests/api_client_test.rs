//! Contract tests for ApiClient against a wiremock backend.
//!
//! | Method | Path | Test |
//! |--------|------|------|
//! | GET    | `/packages?all=true` | `list_packages_*` |
//! | GET    | `/package/{id}` | `package_detail_*` |
//! | DELETE | `/package/{id}` | `delete_package_*` |
//! | POST   | `/upload` | `upload_*` |
//! | GET    | `/packages/metadata/additional_identifiers` | `identifier_types_*` |

use std::time::Duration;

use pkgcat_client::{ApiClient, ClientOptions};
use pkgcat_core::upload::AdditionalIdentifier;
use pkgcat_core::{CatalogApi, FetchError, UploadFile, UploadResult, UploadSubmission};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(mock_server: &MockServer) -> ApiClient {
    ApiClient::new(ClientOptions {
        base_url: mock_server.uri(),
        timeout: Some(Duration::from_secs(5)),
        user_agent: "pkgcat-test".into(),
    })
    .unwrap()
}

fn submission(package_id: Option<&str>) -> UploadSubmission {
    UploadSubmission {
        file: UploadFile::new("titles.tsv", b"Title\tISSN\nNature\t0028-0836\n".to_vec()),
        package_id: package_id.map(String::from),
        package_name: "Nature titles".into(),
        additional_identifier: Some(AdditionalIdentifier {
            kind: "jisc_id".into(),
            identifier: 123,
        }),
    }
}

async fn upload_body(mock_server: &MockServer) -> String {
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    String::from_utf8_lossy(&requests[0].body).into_owned()
}

// ── GET /packages?all=true ──────────────────────────────────────────

#[tokio::test]
async fn list_packages_parses_summaries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/packages"))
        .and(query_param("all", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "packages": [
                {
                    "identifier": 17,
                    "name": "Springer Journals",
                    "lastUpdated": "2024-01-05T10:00:00Z",
                    "packageContentAsJson": "https://cdn.example.org/17.json",
                    "packageContentAsKbart": "https://cdn.example.org/17.txt"
                },
                { "identifier": "abc" }
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let packages = test_client(&mock_server).list_packages().await.unwrap();
    assert_eq!(packages.len(), 2);
    assert_eq!(packages[0].identifier, "17");
    assert_eq!(packages[0].display_name(), "Springer Journals");
    assert!(packages[0].last_updated.is_some());
    assert!(packages[0].content.has_json());
    assert_eq!(packages[0].content.links().len(), 2);
    assert_eq!(packages[1].display_name(), "Untitled");
    assert!(!packages[1].content.has_json());
}

#[tokio::test]
async fn list_packages_missing_field_is_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/packages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&mock_server)
        .await;

    let packages = test_client(&mock_server).list_packages().await.unwrap();
    assert!(packages.is_empty());
}

#[tokio::test]
async fn list_packages_reports_http_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/packages"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let err = test_client(&mock_server).list_packages().await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert!(err.to_string().contains("HTTP error! status: 503"));
}

#[tokio::test]
async fn list_packages_rejects_malformed_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/packages"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    let err = test_client(&mock_server).list_packages().await.unwrap_err();
    assert!(matches!(err, FetchError::Decode { .. }));
}

// ── GET /package/{id} ───────────────────────────────────────────────

#[tokio::test]
async fn package_detail_uses_first_record() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/package/17"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Packages": [{
                "PackageID": 17,
                "PackageName": "Springer Journals",
                "PackageTermStartDate": "2024-01-01",
                "PackageTermEndDate": null,
                "RelatedOrgs": [{ "OrgRole": "Publisher", "OrgName": "Springer" }],
                "TitleList": [{
                    "Title": "Nature",
                    "publicationType": "Serial",
                    "TitleIDs": { "eissn": "1476-4687", "issn": "0028-0836" }
                }]
            }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let detail = test_client(&mock_server).package_detail("17").await.unwrap();
    assert_eq!(detail.identifier, "17");
    assert_eq!(detail.display_name(), "Springer Journals");
    assert!(detail.term_start.is_some());
    assert!(detail.term_end.is_none());
    assert_eq!(detail.related_orgs[0].name, "Springer");
    assert_eq!(detail.titles[0].print_identifier(), Some("0028-0836"));
}

#[tokio::test]
async fn package_detail_empty_packages_is_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/package/404"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "Packages": [] })),
        )
        .mount(&mock_server)
        .await;

    let err = test_client(&mock_server)
        .package_detail("404")
        .await
        .unwrap_err();
    match err {
        FetchError::Decode { endpoint, .. } => assert_eq!(endpoint, "GET /package/404"),
        other => panic!("expected decode error, got {other:?}"),
    }
}

// ── DELETE /package/{id} ────────────────────────────────────────────

#[tokio::test]
async fn delete_package_succeeds_on_204() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/package/17"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    test_client(&mock_server)
        .delete_package("17")
        .await
        .unwrap();
}

#[tokio::test]
async fn delete_package_reports_500() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/package/17"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let err = test_client(&mock_server)
        .delete_package("17")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
}

// ── POST /upload ────────────────────────────────────────────────────

#[tokio::test]
async fn upload_accepted_with_warnings() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": "Package updated",
            "warnings": [{ "row": 3, "warning": "Unknown ISSN", "data": "Nature\t0000-0000" }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = test_client(&mock_server)
        .upload(&submission(Some("17")))
        .await;
    assert!(result.is_accepted());
    assert_eq!(result.message(), "Package updated");
    assert_eq!(result.warnings()[0].row, Some(3));
    assert_eq!(result.warnings()[0].text, "Unknown ISSN");

    let body = upload_body(&mock_server).await;
    assert!(body.contains(r#"name="file"; filename="titles.tsv""#));
    assert!(body.contains(r#"name="package_id""#));
    assert!(body.contains(r#"name="package_name""#));
    assert!(body.contains(r#"[{"type":"jisc_id","identifier":123}]"#));
}

#[tokio::test]
async fn upload_omits_absent_package_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!({ "message": "ok" })),
        )
        .mount(&mock_server)
        .await;

    let result = test_client(&mock_server).upload(&submission(None)).await;
    assert!(result.is_accepted());

    let body = upload_body(&mock_server).await;
    assert!(!body.contains(r#"name="package_id""#));
}

#[tokio::test]
async fn upload_rejected_with_row_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "Validation failed",
            "errors": [{ "row": 5, "error": "Missing title", "data": "\t0028-0836" }],
            "warnings": [{ "row": 6, "warning": "Duplicate ISSN", "data": "x" }]
        })))
        .mount(&mock_server)
        .await;

    let result = test_client(&mock_server)
        .upload(&submission(Some("17")))
        .await;
    match result {
        UploadResult::Rejected {
            message,
            errors,
            warnings,
        } => {
            assert_eq!(message, "Validation failed");
            assert_eq!(errors[0].row, Some(5));
            assert_eq!(errors[0].text, "Missing title");
            assert_eq!(warnings.len(), 1);
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn upload_non_json_body_is_transport_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&mock_server)
        .await;

    let result = test_client(&mock_server)
        .upload(&submission(Some("17")))
        .await;
    assert!(matches!(result, UploadResult::TransportFailure { .. }));
    assert_eq!(result.message(), "Failed to upload package");
}

#[tokio::test]
async fn upload_network_failure_is_transport_failure() {
    let api = ApiClient::new(ClientOptions::new("http://127.0.0.1:9")).unwrap();
    let result = api.upload(&submission(Some("17"))).await;
    assert!(matches!(result, UploadResult::TransportFailure { .. }));
}

// ── GET /packages/metadata/additional_identifiers ───────────────────

#[tokio::test]
async fn identifier_types_returns_list() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/packages/metadata/additional_identifiers"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!(["jisc_id", "ringgold"])),
        )
        .mount(&mock_server)
        .await;

    let types = test_client(&mock_server).identifier_types().await.unwrap();
    assert_eq!(types, vec!["jisc_id", "ringgold"]);
}

#[tokio::test]
async fn identifier_types_network_error() {
    let api = ApiClient::new(ClientOptions::new("http://127.0.0.1:9")).unwrap();
    let err = api.identifier_types().await.unwrap_err();
    assert!(matches!(err, FetchError::Network { .. }));
}

//! Integration tests for the directory HTTP client against a mock server.

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use groupcast_core::error::DirectoryError;
use groupcast_core::model::MemberKind;
use groupcast_core::ports::DirectoryPort;
use groupcast_directory::DirectoryClient;

fn client(server: &MockServer) -> DirectoryClient {
    DirectoryClient::new(reqwest::Client::new(), server.uri(), "sync-agent")
}

#[tokio::test]
async fn test_group_by_id_carries_acting_user() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/groups/id/g1"))
        .and(query_param("user", "sync-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "g1",
            "name": "org:teams:g1",
            "display_name": "Group One",
            "description": "first"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let group = client(&server).group_by_id("g1").await.unwrap();
    assert_eq!(group.id, "g1");
    assert_eq!(group.name, "org:teams:g1");
    assert_eq!(group.display_name.as_deref(), Some("Group One"));
}

#[tokio::test]
async fn test_group_by_id_maps_404_to_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/groups/id/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such group"))
        .mount(&server)
        .await;

    let err = client(&server).group_by_id("gone").await.unwrap_err();
    assert!(matches!(err, DirectoryError::NotFound(id) if id == "gone"));
}

#[tokio::test]
async fn test_group_by_id_unexpected_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/groups/id/g1"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client(&server).group_by_id("g1").await.unwrap_err();
    match err {
        DirectoryError::UnexpectedStatus { status, .. } => assert_eq!(status, 503),
        other => panic!("expected UnexpectedStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn test_group_members_classifies_sources() {
    let server = MockServer::start().await;

    // Group names are path-encoded; ':' becomes %3A on the wire.
    Mock::given(method("GET"))
        .and(path("/groups/org%3Ag1/members"))
        .and(query_param("user", "sync-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "members": [
                {"id": "alice", "name": "alice", "source_id": "ldap"},
                {"id": "id-g2", "name": "org:g2", "source_id": "g:gsa"},
                {"id": "app-7", "name": "app-7", "source_id": "g:isa"}
            ]
        })))
        .mount(&server)
        .await;

    let members = client(&server).group_members("org:g1").await.unwrap();
    assert_eq!(members.len(), 3);
    assert_eq!(members[0].kind, MemberKind::Principal);
    assert_eq!(members[1].kind, MemberKind::Group);
    assert_eq!(members[1].name, "org:g2");
    assert_eq!(members[2].kind, MemberKind::Unrecognized);
}

#[tokio::test]
async fn test_groups_by_prefix_sends_search_and_folder() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/groups"))
        .and(query_param("search", "org:teams"))
        .and(query_param("folder", "org:teams"))
        .and(query_param("user", "sync-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "groups": [
                {"id": "p1", "name": "org:teams:p1"},
                {"id": "p2", "name": "org:teams:p2"}
            ]
        })))
        .mount(&server)
        .await;

    let groups = client(&server)
        .groups_by_prefix("org:teams", "org:teams")
        .await
        .unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].id, "p1");
}

#[tokio::test]
async fn test_groups_by_prefix_empty_folder_omits_param() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/groups"))
        .and(query_param("search", "org"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "groups": [] })))
        .mount(&server)
        .await;

    let groups = client(&server).groups_by_prefix("org", "").await.unwrap();
    assert!(groups.is_empty());
}

#[tokio::test]
async fn test_check_pings_status_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("expecting", "groups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"service": "groups"})))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).check().await.unwrap();
}

#[tokio::test]
async fn test_check_fails_on_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(client(&server).check().await.is_err());
}

//! Integration tests driving a real session over HTTP.
//!
//! These tests exercise complete request/response cycles against a mock
//! server, covering both API generations, pagination, discovery by
//! inference, conflict surfacing, and the attachment no-op heuristic.

mod common;

use common::fixtures;
use confluence_pub::{
  ApiVersion, AttachmentSource, ConnectionConfig, ContentProperty, Deployment, Error, Label, Session, SpaceRef,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_deployment_hint_selects_api_generation() {
  let server = MockServer::start().await;

  let v1 = common::connect_v1(&server).await;
  assert_eq!(v1.api_version(), ApiVersion::V1);

  let v2 = common::connect_v2(&server).await;
  assert_eq!(v2.api_version(), ApiVersion::V2);

  // An absent hint prefers the newer generation.
  let defaulted = Session::connect(common::base_config(&server)).await.unwrap();
  assert_eq!(defaulted.api_version(), ApiVersion::V2);
}

#[tokio::test]
async fn test_requests_carry_basic_auth_and_generation_prefix() {
  let server = MockServer::start().await;

  Mock::given(method("GET"))
    .and(path("/rest/api/content/65537"))
    .and(header("Authorization", common::BASIC_AUTH))
    .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::v1_page("65537", "Getting Started", 98304, "DOCS", 4)))
    .expect(1)
    .mount(&server)
    .await;

  let session = common::connect_v1(&server).await;
  let page = session.get_page("65537").await.unwrap();

  assert_eq!(page.properties.title, "Getting Started");
  assert_eq!(page.properties.space_id, "98304");
  assert_eq!(page.properties.parent_id.as_deref(), Some("64001"));
  assert_eq!(page.properties.version.number, 4);
  assert!(page.content().contains("Getting Started"));
}

#[tokio::test]
async fn test_v1_offset_pagination_stops_on_short_page() {
  let server = MockServer::start().await;

  let full: Vec<_> = (0..200).map(|i| fixtures::v1_label(i, &format!("label-{i:03}"))).collect();
  let short: Vec<_> = (200..250).map(|i| fixtures::v1_label(i, &format!("label-{i:03}"))).collect();

  Mock::given(method("GET"))
    .and(path("/rest/api/content/65537/label"))
    .and(query_param("start", "0"))
    .and(query_param("limit", "200"))
    .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::v1_listing(full, 0, 200)))
    .expect(1)
    .mount(&server)
    .await;
  Mock::given(method("GET"))
    .and(path("/rest/api/content/65537/label"))
    .and(query_param("start", "200"))
    .and(query_param("limit", "200"))
    .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::v1_listing(short, 200, 200)))
    .expect(1)
    .mount(&server)
    .await;

  let session = common::connect_v1(&server).await;
  let labels = session.get_labels("65537").await.unwrap();

  // 250 results fetched in exactly two round-trips.
  assert_eq!(labels.len(), 250);
  assert_eq!(labels[0].name, "label-000");
  assert_eq!(labels[249].name, "label-249");
}

#[tokio::test]
async fn test_v2_cursor_pagination_follows_next_links() {
  let server = MockServer::start().await;
  let labels_url = format!("{}/api/v2/pages/65537/labels", server.uri());

  Mock::given(method("GET"))
    .and(path("/api/v2/pages/65537/labels"))
    .and(query_param_is_missing("cursor"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "results": [
        {"id": "101", "name": "alpha", "prefix": "global"},
        {"id": "102", "name": "beta", "prefix": "global"}
      ],
      "_links": {"next": format!("{labels_url}?cursor=c2")}
    })))
    .expect(1)
    .mount(&server)
    .await;
  Mock::given(method("GET"))
    .and(path("/api/v2/pages/65537/labels"))
    .and(query_param("cursor", "c2"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "results": [
        {"id": "103", "name": "gamma", "prefix": "global"}
      ],
      "_links": {"next": format!("{labels_url}?cursor=c3")}
    })))
    .expect(1)
    .mount(&server)
    .await;
  Mock::given(method("GET"))
    .and(path("/api/v2/pages/65537/labels"))
    .and(query_param("cursor", "c3"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "results": [
        {"id": "104", "name": "delta", "prefix": "global"}
      ],
      "_links": {}
    })))
    .expect(1)
    .mount(&server)
    .await;

  let session = common::connect_v2(&server).await;
  let labels = session.get_labels("65537").await.unwrap();

  let names: Vec<_> = labels.iter().map(|label| label.name.as_str()).collect();
  assert_eq!(names, ["alpha", "beta", "gamma", "delta"]);
}

#[tokio::test]
async fn test_version_conflict_is_surfaced_without_retry() {
  let server = MockServer::start().await;

  Mock::given(method("PUT"))
    .and(path("/api/v2/pages/65537"))
    .and(body_partial_json(json!({"id": "65537", "version": {"number": 5}})))
    .respond_with(ResponseTemplate::new(409).set_body_string("Version 5 is not the latest version"))
    .expect(1)
    .mount(&server)
    .await;

  let session = common::connect_v2(&server).await;
  let err = session
    .update_page("65537", "<p>new</p>", "Getting Started", 4)
    .await
    .unwrap_err();

  match err {
    Error::Conflict { status, body } => {
      assert_eq!(status.as_u16(), 409);
      assert!(body.contains("not the latest version"));
    }
    other => panic!("expected a conflict error, got: {other}"),
  }
}

#[tokio::test]
async fn test_missing_page_maps_to_remote_error() {
  let server = MockServer::start().await;

  Mock::given(method("GET"))
    .and(path("/api/v2/pages/999"))
    .respond_with(ResponseTemplate::new(404).set_body_string("no content found with id: 999"))
    .mount(&server)
    .await;

  let session = common::connect_v2(&server).await;
  let err = session.get_page("999").await.unwrap_err();

  match err {
    Error::Remote { status, .. } => assert_eq!(status.as_u16(), 404),
    other => panic!("expected a remote error, got: {other}"),
  }
}

#[tokio::test]
async fn test_page_lookup_by_title_requires_a_unique_match() {
  let server = MockServer::start().await;

  Mock::given(method("GET"))
    .and(path("/api/v2/pages"))
    .and(query_param("title", "Duplicate"))
    .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::v2_page_listing(vec![
      fixtures::v2_page("65537", "Duplicate", "98304", 1),
      fixtures::v2_page("65538", "Duplicate", "98305", 1),
    ])))
    .mount(&server)
    .await;

  let session = common::connect_v2(&server).await;
  let err = session.get_page_properties_by_title("Duplicate", None).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_get_or_create_creates_when_title_is_absent() {
  let server = MockServer::start().await;

  Mock::given(method("GET"))
    .and(path("/api/v2/pages/64000"))
    .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::v2_page("64000", "Home", "98304", 9)))
    .mount(&server)
    .await;
  Mock::given(method("GET"))
    .and(path("/api/v2/pages"))
    .and(query_param("title", "Release Notes"))
    .and(query_param("space-id", "98304"))
    .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::v2_page_listing(vec![])))
    .expect(1)
    .mount(&server)
    .await;
  Mock::given(method("POST"))
    .and(path("/api/v2/pages/"))
    .and(body_partial_json(json!({
      "spaceId": "98304",
      "parentId": "64000",
      "title": "Release Notes",
      "status": "current"
    })))
    .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::v2_page("65600", "Release Notes", "98304", 1)))
    .expect(1)
    .mount(&server)
    .await;

  let session = common::connect_v2(&server).await;
  let page = session.get_or_create_page("Release Notes", "64000").await.unwrap();

  assert_eq!(page.properties.id, "65600");
  assert_eq!(page.properties.version.number, 1);
}

#[tokio::test]
async fn test_v1_space_id_resolution_requires_warm_cache() {
  let server = MockServer::start().await;

  Mock::given(method("GET"))
    .and(path("/rest/api/content/64000"))
    .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::v1_page("64000", "Home", 98304, "DOCS", 9)))
    .expect(2)
    .mount(&server)
    .await;
  Mock::given(method("GET"))
    .and(path("/rest/api/space/DOCS"))
    .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::v1_space(98304, "DOCS")))
    .expect(1)
    .mount(&server)
    .await;
  Mock::given(method("POST"))
    .and(path("/rest/api/content"))
    .and(body_partial_json(json!({
      "type": "page",
      "title": "Release Notes",
      "space": {"key": "DOCS"}
    })))
    .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::v1_page("65600", "Release Notes", 98304, "DOCS", 1)))
    .expect(1)
    .mount(&server)
    .await;

  let session = common::connect_v1(&server).await;

  // Cold cache: the space ID from the parent cannot be mapped to a key.
  let err = session.create_page("64000", "Release Notes", "<p>hi</p>").await.unwrap_err();
  assert!(matches!(err, Error::SpaceResolution { ref id } if id == "98304"));

  // One key lookup warms the cache in both directions.
  let space_id = session.space_key_to_id("DOCS").await.unwrap();
  assert_eq!(space_id, "98304");

  let page = session.create_page("64000", "Release Notes", "<p>hi</p>").await.unwrap();
  assert_eq!(page.properties.id, "65600");

  // Served from the cache, not the wire; the space mock allows one call.
  assert_eq!(session.space_id_to_key("98304").await.unwrap(), "DOCS");
  assert_eq!(session.space_key_to_id("DOCS").await.unwrap(), "98304");
}

#[tokio::test]
async fn test_space_ref_coalesces_to_configured_default() {
  let server = MockServer::start().await;

  Mock::given(method("GET"))
    .and(path("/api/v2/spaces"))
    .and(query_param("keys", "DOCS"))
    .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::v2_space_listing("98304", "DOCS")))
    .expect(1)
    .mount(&server)
    .await;

  let config = common::base_config(&server)
    .with_space_key("DOCS")
    .with_deployment(Deployment::Cloud);
  let session = Session::connect(config).await.unwrap();

  assert_eq!(session.space_id(None).await.unwrap().as_deref(), Some("98304"));
  assert_eq!(
    session.space_id(Some(SpaceRef::Id("77"))).await.unwrap().as_deref(),
    Some("77")
  );
  // The default space is cached after the first resolution.
  assert_eq!(session.space_id(None).await.unwrap().as_deref(), Some("98304"));
}

#[tokio::test]
async fn test_upload_skips_attachment_with_identical_size() {
  let server = MockServer::start().await;

  Mock::given(method("GET"))
    .and(path("/rest/api/content/65537/child/attachment"))
    .and(query_param("filename", "logo.png"))
    .respond_with(
      ResponseTemplate::new(200).set_body_json(fixtures::v1_listing(
        vec![fixtures::v1_attachment("att456", "logo.png", 9, 6)],
        0,
        50,
      )),
    )
    .expect(1)
    .mount(&server)
    .await;

  let session = common::connect_v1(&server).await;

  // Same byte size, no force: the lookup is the only request issued.
  session
    .upload_attachment("65537", "logo.png", AttachmentSource::Bytes(b"123456789"), None, None, false)
    .await
    .unwrap();
}

#[tokio::test]
async fn test_forced_upload_replaces_and_reasserts_title() {
  let server = MockServer::start().await;

  Mock::given(method("GET"))
    .and(path("/rest/api/content/65537/child/attachment"))
    .and(query_param("filename", "logo.png"))
    .respond_with(
      ResponseTemplate::new(200).set_body_json(fixtures::v1_listing(
        vec![fixtures::v1_attachment("att456", "logo.png", 9, 6)],
        0,
        50,
      )),
    )
    .expect(1)
    .mount(&server)
    .await;
  // The update-data endpoint takes the bare identifier, without the "att"
  // prefix, and returns the attachment record unwrapped.
  Mock::given(method("POST"))
    .and(path("/rest/api/content/65537/child/attachment/456/data"))
    .and(header("X-Atlassian-Token", "no-check"))
    .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::v1_attachment("att456", "logo.png", 9, 7)))
    .expect(1)
    .mount(&server)
    .await;
  Mock::given(method("PUT"))
    .and(path("/rest/api/content/65537/child/attachment/456"))
    .and(body_partial_json(json!({
      "id": "att456",
      "type": "attachment",
      "title": "logo.png",
      "version": {"number": 8}
    })))
    .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::v1_attachment("att456", "logo.png", 9, 8)))
    .expect(1)
    .mount(&server)
    .await;

  let session = common::connect_v1(&server).await;
  session
    .upload_attachment("65537", "logo.png", AttachmentSource::Bytes(b"123456789"), None, None, true)
    .await
    .unwrap();
}

#[tokio::test]
async fn test_first_upload_creates_then_names_the_attachment() {
  let server = MockServer::start().await;

  Mock::given(method("GET"))
    .and(path("/rest/api/content/65537/child/attachment"))
    .and(query_param("filename", "diagram.svg"))
    .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::v1_listing(vec![], 0, 50)))
    .expect(1)
    .mount(&server)
    .await;
  // Creation responses wrap the record in a result set.
  Mock::given(method("POST"))
    .and(path("/rest/api/content/65537/child/attachment"))
    .and(header("X-Atlassian-Token", "no-check"))
    .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::v1_listing(
      vec![fixtures::v1_attachment("att900", "diagram.svg", 42, 1)],
      0,
      50,
    )))
    .expect(1)
    .mount(&server)
    .await;
  Mock::given(method("PUT"))
    .and(path("/rest/api/content/65537/child/attachment/900"))
    .and(body_partial_json(json!({"title": "diagram.svg", "version": {"number": 2}})))
    .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::v1_attachment("att900", "diagram.svg", 42, 2)))
    .expect(1)
    .mount(&server)
    .await;

  let session = common::connect_v1(&server).await;
  session
    .upload_attachment(
      "65537",
      "diagram.svg",
      AttachmentSource::Bytes(b"<svg xmlns='http://www.w3.org/2000/svg'/>."),
      None,
      Some("architecture overview"),
      false,
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_upload_from_file_checks_size_before_reading() {
  let server = MockServer::start().await;

  let dir = tempfile::tempdir().unwrap();
  let file_path = dir.path().join("logo.png");
  std::fs::write(&file_path, b"123456789").unwrap();

  Mock::given(method("GET"))
    .and(path("/rest/api/content/65537/child/attachment"))
    .and(query_param("filename", "logo.png"))
    .respond_with(
      ResponseTemplate::new(200).set_body_json(fixtures::v1_listing(
        vec![fixtures::v1_attachment("att456", "logo.png", 9, 6)],
        0,
        50,
      )),
    )
    .expect(1)
    .mount(&server)
    .await;

  let session = common::connect_v1(&server).await;
  session
    .upload_attachment("65537", "logo.png", AttachmentSource::File(&file_path), None, None, false)
    .await
    .unwrap();

  // A missing file is a local error, reported before any request.
  let err = session
    .upload_attachment(
      "99999",
      "absent.png",
      AttachmentSource::File(&dir.path().join("absent.png")),
      None,
      None,
      false,
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_label_reconciliation_is_idempotent_over_the_wire() {
  let server = MockServer::start().await;

  Mock::given(method("GET"))
    .and(path("/rest/api/content/65537/label"))
    .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::v1_listing(
      vec![fixtures::v1_label(1, "alpha"), fixtures::v1_label(2, "beta")],
      0,
      200,
    )))
    .expect(1)
    .mount(&server)
    .await;

  let session = common::connect_v1(&server).await;

  // Desired equals current: besides the listing, no request is issued.
  session
    .update_labels("65537", &[Label::new("alpha"), Label::new("beta")], false)
    .await
    .unwrap();
}

#[tokio::test]
async fn test_label_reconciliation_adds_and_removes() {
  let server = MockServer::start().await;

  Mock::given(method("GET"))
    .and(path("/rest/api/content/65537/label"))
    .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::v1_listing(
      vec![fixtures::v1_label(1, "alpha"), fixtures::v1_label(2, "stale")],
      0,
      200,
    )))
    .expect(1)
    .mount(&server)
    .await;
  Mock::given(method("POST"))
    .and(path("/rest/api/content/65537/label"))
    .and(body_partial_json(json!([{"name": "fresh", "prefix": "global"}])))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
    .expect(1)
    .mount(&server)
    .await;
  Mock::given(method("DELETE"))
    .and(path("/rest/api/content/65537/label"))
    .and(query_param("name", "stale"))
    .respond_with(ResponseTemplate::new(204))
    .expect(1)
    .mount(&server)
    .await;

  let session = common::connect_v1(&server).await;
  session
    .update_labels("65537", &[Label::new("alpha"), Label::new("fresh")], false)
    .await
    .unwrap();
}

#[tokio::test]
async fn test_property_reconciliation_applies_minimal_writes() {
  let server = MockServer::start().await;

  Mock::given(method("GET"))
    .and(path("/api/v2/pages/65537/properties"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "results": [
        fixtures::v2_property("p-a", "alpha", json!(1), 3),
        fixtures::v2_property("p-b", "beta", json!({"x": 1}), 2)
      ],
      "_links": {}
    })))
    .expect(1)
    .mount(&server)
    .await;
  Mock::given(method("POST"))
    .and(path("/api/v2/pages/65537/properties"))
    .and(body_partial_json(json!({"key": "gamma", "value": true})))
    .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::v2_property("p-c", "gamma", json!(true), 1)))
    .expect(1)
    .mount(&server)
    .await;
  Mock::given(method("DELETE"))
    .and(path("/api/v2/pages/65537/properties/p-b"))
    .respond_with(ResponseTemplate::new(204))
    .expect(1)
    .mount(&server)
    .await;
  // Value changed: the update submits the current version plus one.
  Mock::given(method("PUT"))
    .and(path("/api/v2/pages/65537/properties/p-a"))
    .and(body_partial_json(json!({"key": "alpha", "value": 2, "version": {"number": 4}})))
    .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::v2_property("p-a", "alpha", json!(2), 4)))
    .expect(1)
    .mount(&server)
    .await;

  let session = common::connect_v2(&server).await;
  session
    .update_content_properties(
      "65537",
      &[ContentProperty::new("alpha", json!(2)), ContentProperty::new("gamma", json!(true))],
      false,
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_v1_purge_is_one_delete_with_status_query() {
  let server = MockServer::start().await;

  Mock::given(method("DELETE"))
    .and(path("/rest/api/content/65537"))
    .and(query_param("status", "trashed"))
    .respond_with(ResponseTemplate::new(204))
    .expect(1)
    .mount(&server)
    .await;

  let session = common::connect_v1(&server).await;
  session.delete_page("65537", true).await.unwrap();
}

#[tokio::test]
async fn test_v2_purge_trashes_then_deletes() {
  let server = MockServer::start().await;

  Mock::given(method("DELETE"))
    .and(path("/api/v2/pages/65537"))
    .and(query_param_is_missing("purge"))
    .respond_with(ResponseTemplate::new(204))
    .expect(1)
    .mount(&server)
    .await;
  Mock::given(method("DELETE"))
    .and(path("/api/v2/pages/65537"))
    .and(query_param("purge", "true"))
    .respond_with(ResponseTemplate::new(204))
    .expect(1)
    .mount(&server)
    .await;

  let session = common::connect_v2(&server).await;
  session.delete_page("65537", true).await.unwrap();
}

#[tokio::test]
async fn test_host_and_base_path_inferred_from_v2_listing() {
  let server = MockServer::start().await;

  Mock::given(method("GET"))
    .and(path("/api/v2/spaces"))
    .and(query_param("limit", "1"))
    .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::v2_space_listing("98304", "DOCS")))
    .expect(1)
    .mount(&server)
    .await;

  let config = ConnectionConfig::new("secret-token")
    .with_api_url(format!("{}/", server.uri()))
    .with_deployment(Deployment::Cloud);
  let session = Session::connect(config).await.unwrap();

  assert_eq!(session.site().host, "example.atlassian.net");
  assert_eq!(session.site().base_path, "/wiki/");
}

#[tokio::test]
async fn test_host_and_base_path_inferred_from_v1_listing() {
  let server = MockServer::start().await;

  Mock::given(method("GET"))
    .and(path("/rest/api/space"))
    .and(query_param("limit", "1"))
    .respond_with(
      ResponseTemplate::new(200).set_body_json(fixtures::v1_listing(vec![fixtures::v1_space(98304, "DOCS")], 0, 1)),
    )
    .expect(1)
    .mount(&server)
    .await;

  let config = ConnectionConfig::new("secret-token")
    .with_api_url(format!("{}/", server.uri()))
    .with_deployment(Deployment::Server);
  let session = Session::connect(config).await.unwrap();

  assert_eq!(session.site().host, "example.atlassian.net");
  assert_eq!(session.site().base_path, "/wiki/");
}

#[tokio::test]
async fn test_scoped_probe_falls_back_to_classic_root_on_404() {
  let server = MockServer::start().await;

  Mock::given(method("GET"))
    .and(path("/_edge/tenant_info"))
    .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
    .expect(1)
    .mount(&server)
    .await;
  Mock::given(method("GET"))
    .and(path("/wiki/api/v2/pages/65537"))
    .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::v2_page("65537", "Getting Started", "98304", 4)))
    .expect(1)
    .mount(&server)
    .await;

  let host = server.uri().trim_start_matches("http://").to_string();
  let config = ConnectionConfig::new("secret-token")
    .with_host(host.clone())
    .with_scheme("http")
    .with_deployment(Deployment::Cloud);
  let session = Session::connect(config).await.unwrap();

  // A missing tenant endpoint is a normal path, not an error; the classic
  // root is adopted and serves subsequent requests.
  assert_eq!(session.api_url(), format!("http://{host}/wiki/"));
  let page = session.get_page("65537").await.unwrap();
  assert_eq!(page.properties.title, "Getting Started");
}

#[tokio::test]
async fn test_scoped_probe_falls_back_when_tenant_response_is_not_tenant_json() {
  let server = MockServer::start().await;

  Mock::given(method("GET"))
    .and(path("/_edge/tenant_info"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "welcome"})))
    .expect(1)
    .mount(&server)
    .await;

  let host = server.uri().trim_start_matches("http://").to_string();
  let config = ConnectionConfig::new("secret-token")
    .with_host(host.clone())
    .with_scheme("http")
    .with_deployment(Deployment::Cloud);
  let session = Session::connect(config).await.unwrap();

  assert_eq!(session.api_url(), format!("http://{host}/wiki/"));
}

#[tokio::test]
async fn test_scoped_probe_falls_back_when_connection_is_refused() {
  // Grab an address that answers nothing by letting a mock server's port go.
  let host = {
    let server = MockServer::start().await;
    server.uri().trim_start_matches("http://").to_string()
  };

  let config = ConnectionConfig::new("secret-token")
    .with_host(host.clone())
    .with_scheme("http")
    .with_deployment(Deployment::Cloud);
  let session = Session::connect(config).await.unwrap();

  assert_eq!(session.api_url(), format!("http://{host}/wiki/"));
  assert_eq!(session.site().scheme, "http");
}

#[tokio::test]
async fn test_inference_fails_cleanly_when_no_spaces_exist() {
  let server = MockServer::start().await;

  Mock::given(method("GET"))
    .and(path("/api/v2/spaces"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": [], "_links": {}})))
    .mount(&server)
    .await;

  let config = ConnectionConfig::new("secret-token")
    .with_api_url(format!("{}/", server.uri()))
    .with_deployment(Deployment::Cloud);
  let err = Session::connect(config).await.unwrap_err();

  assert!(matches!(err, Error::Configuration(_)));
}

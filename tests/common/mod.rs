//! Shared helpers for integration tests.

pub mod fixtures;

use confluence_pub::{ConnectionConfig, Deployment, Session};
use wiremock::MockServer;

/// Expected Authorization header for [`base_config`] credentials.
#[allow(dead_code)]
pub const BASIC_AUTH: &str = "Basic ZG9jcy1ib3RAZXhhbXBsZS5jb206c2VjcmV0LXRva2Vu";

/// A configuration pointing the API root at the mock server, with the host
/// and base path pre-resolved so that connecting performs no discovery
/// requests.
pub fn base_config(server: &MockServer) -> ConnectionConfig {
  ConnectionConfig::new("secret-token")
    .with_user_name("docs-bot@example.com")
    .with_host("example.atlassian.net")
    .with_api_url(format!("{}/", server.uri()))
}

/// Connect a session locked onto the v1 API generation.
pub async fn connect_v1(server: &MockServer) -> Session {
  Session::connect(base_config(server).with_deployment(Deployment::Server))
    .await
    .expect("v1 session should connect without discovery")
}

/// Connect a session locked onto the v2 API generation.
pub async fn connect_v2(server: &MockServer) -> Session {
  Session::connect(base_config(server).with_deployment(Deployment::Cloud))
    .await
    .expect("v2 session should connect without discovery")
}

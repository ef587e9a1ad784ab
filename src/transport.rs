//! HTTP plumbing shared by both API generations.
//!
//! Owns the underlying HTTP client, resolved API root and authentication
//! headers; builds URLs, executes typed JSON requests, and walks both
//! pagination styles (v1 offset/limit, v2 cursor links). Non-2xx responses
//! are mapped into the crate error taxonomy here so higher layers never
//! inspect raw HTTP failures.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::config::ConnectionConfig;
use crate::error::{Error, Result};
use crate::models::ApiVersion;

/// Page size used for v1 offset/limit pagination.
const V1_PAGE_LIMIT: usize = 200;

/// Anti-CSRF header required by v1 mutation endpoints that accept form data.
const ATLASSIAN_TOKEN_HEADER: &str = "X-Atlassian-Token";

/// Executes HTTP requests against a resolved Confluence REST API root.
#[derive(Debug, Clone)]
pub(crate) struct Transport {
  client: reqwest::Client,
  api_url: String,
  link_base: Option<String>,
}

impl Transport {
  /// Build a transport from connection configuration.
  ///
  /// Authentication and extra headers become default headers on the
  /// underlying client; the per-request timeout is enforced there as well.
  /// The API root starts out unset and is assigned during discovery.
  ///
  /// # Errors
  /// Returns [`Error::Configuration`] when a header value is malformed or
  /// the HTTP client cannot be built.
  pub(crate) fn new(config: &ConnectionConfig) -> Result<Self> {
    let mut headers = HeaderMap::new();

    let auth_value = match config.user_name.as_deref() {
      Some(user_name) => {
        let credentials = format!("{}:{}", user_name, config.api_key);
        format!("Basic {}", BASE64.encode(credentials.as_bytes()))
      }
      None => format!("Bearer {}", config.api_key),
    };
    let mut auth_value = HeaderValue::from_str(&auth_value)
      .map_err(|_| Error::Configuration("credentials contain characters not permitted in headers".into()))?;
    auth_value.set_sensitive(true);
    headers.insert(reqwest::header::AUTHORIZATION, auth_value);

    for (name, value) in &config.headers {
      let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| Error::Configuration(format!("invalid header name: {name}")))?;
      let value =
        HeaderValue::from_str(value).map_err(|_| Error::Configuration(format!("invalid value for header {name}")))?;
      headers.insert(name, value);
    }

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .user_agent(concat!("confluence-pub/", env!("CARGO_PKG_VERSION")))
      .default_headers(headers)
      .build()
      .map_err(|err| Error::Configuration(format!("failed to create HTTP client: {err}")))?;

    Ok(Self {
      client,
      api_url: String::new(),
      link_base: None,
    })
  }

  /// Assign the resolved REST API root. Must end with `/`.
  pub(crate) fn set_api_url(&mut self, api_url: impl Into<String>) {
    self.api_url = api_url.into();
  }

  /// The resolved REST API root.
  pub(crate) fn api_url(&self) -> &str {
    &self.api_url
  }

  /// Assign the base URL (`https://{host}`) used to resolve relative
  /// pagination links.
  pub(crate) fn set_link_base(&mut self, link_base: impl Into<String>) {
    self.link_base = Some(link_base.into());
  }

  /// Build a full URL for invoking an API endpoint.
  ///
  /// The layout is `{api_root}{generation-prefix}{path}` with optional query
  /// parameters, e.g. `https://example.atlassian.net/wiki/rest/api/content`.
  pub(crate) fn build_url(&self, version: ApiVersion, path: &str, query: &[(&str, &str)]) -> Result<Url> {
    let mut url = Url::parse(&format!("{}{}{}", self.api_url, version.prefix(), path))?;
    if !query.is_empty() {
      url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url)
  }

  /// Execute a GET request and decode the JSON response.
  pub(crate) async fn get<T: DeserializeOwned>(
    &self,
    version: ApiVersion,
    path: &str,
    query: &[(&str, &str)],
  ) -> Result<T> {
    let url = self.build_url(version, path, query)?;
    self.get_url(url).await
  }

  /// Execute a GET request against an already-built URL.
  pub(crate) async fn get_url<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
    debug!(%url, "GET");
    let response = self.client.get(url).header("Accept", "application/json").send().await?;
    decode(check(response).await?).await
  }

  /// Execute a GET request against an absolute URL outside the API root,
  /// such as the tenant discovery endpoint.
  pub(crate) async fn get_absolute<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
    self.get_url(Url::parse(url)?).await
  }

  /// Create an object, decoding the response body.
  pub(crate) async fn post<T: DeserializeOwned>(
    &self,
    version: ApiVersion,
    path: &str,
    body: &impl Serialize,
  ) -> Result<T> {
    let url = self.build_url(version, path, &[])?;
    debug!(%url, "POST");
    let response = self
      .client
      .post(url)
      .header("Accept", "application/json")
      .json(body)
      .send()
      .await?;
    decode(check(response).await?).await
  }

  /// Create an object, discarding any response body.
  pub(crate) async fn post_unit(&self, version: ApiVersion, path: &str, body: &impl Serialize) -> Result<()> {
    let url = self.build_url(version, path, &[])?;
    debug!(%url, "POST");
    let response = self.client.post(url).json(body).send().await?;
    check(response).await?;
    Ok(())
  }

  /// Update an object, decoding the response body.
  pub(crate) async fn put<T: DeserializeOwned>(
    &self,
    version: ApiVersion,
    path: &str,
    body: &impl Serialize,
  ) -> Result<T> {
    let url = self.build_url(version, path, &[])?;
    debug!(%url, "PUT");
    let response = self
      .client
      .put(url)
      .header("Accept", "application/json")
      .json(body)
      .send()
      .await?;
    decode(check(response).await?).await
  }

  /// Update an object, discarding any response body.
  pub(crate) async fn put_unit(&self, version: ApiVersion, path: &str, body: &impl Serialize) -> Result<()> {
    let url = self.build_url(version, path, &[])?;
    debug!(%url, "PUT");
    let response = self.client.put(url).json(body).send().await?;
    check(response).await?;
    Ok(())
  }

  /// Delete an object.
  pub(crate) async fn delete(&self, version: ApiVersion, path: &str, query: &[(&str, &str)]) -> Result<()> {
    let url = self.build_url(version, path, query)?;
    debug!(%url, "DELETE");
    let response = self.client.delete(url).send().await?;
    check(response).await?;
    Ok(())
  }

  /// Upload a multipart form via a v1 endpoint, passing the anti-CSRF
  /// header the v1 API requires for form submissions.
  pub(crate) async fn post_multipart(&self, path: &str, form: reqwest::multipart::Form) -> Result<serde_json::Value> {
    let url = self.build_url(ApiVersion::V1, path, &[])?;
    debug!(%url, "POST multipart");
    let response = self
      .client
      .post(url)
      .header(ATLASSIAN_TOKEN_HEADER, "no-check")
      .header("Accept", "application/json")
      .multipart(form)
      .send()
      .await?;
    decode(check(response).await?).await
  }

  /// Retrieve all results of a v1 offset/limit paginated result set.
  ///
  /// Repeatedly queries with `start`/`limit`, accumulating each `results`
  /// array. A page whose reported `size` is strictly less than the limit is
  /// the last one; that short page is the only termination signal.
  pub(crate) async fn fetch_v1(&self, path: &str, query: &[(&str, &str)]) -> Result<Vec<serde_json::Value>> {
    let mut items = Vec::new();
    let mut start = 0usize;

    loop {
      let start_text = start.to_string();
      let limit_text = V1_PAGE_LIMIT.to_string();
      let mut paginated: Vec<(&str, &str)> = query.to_vec();
      paginated.push(("start", &start_text));
      paginated.push(("limit", &limit_text));

      let payload: serde_json::Value = self.get(ApiVersion::V1, path, &paginated).await?;
      let results = payload
        .get("results")
        .and_then(|value| value.as_array())
        .cloned()
        .unwrap_or_default();
      items.extend(results);

      let size = payload.get("size").and_then(|value| value.as_u64()).unwrap_or(0) as usize;
      if size < V1_PAGE_LIMIT {
        break;
      }
      start += V1_PAGE_LIMIT;
    }

    Ok(items)
  }

  /// Retrieve all results of a v2 cursor-paginated result set.
  ///
  /// Follows the `next` link embedded in each response's `_links` block
  /// until it is absent. Absolute links are used verbatim; relative links
  /// are resolved against the known host.
  pub(crate) async fn fetch_v2(&self, path: &str, query: &[(&str, &str)]) -> Result<Vec<serde_json::Value>> {
    let mut items = Vec::new();
    let mut url = self.build_url(ApiVersion::V2, path, query)?;

    loop {
      let payload: serde_json::Value = self.get_url(url).await?;
      let results = payload
        .get("results")
        .and_then(|value| value.as_array())
        .cloned()
        .unwrap_or_default();
      items.extend(results);

      let next = payload
        .get("_links")
        .and_then(|links| links.get("next"))
        .and_then(|value| value.as_str())
        .filter(|link| !link.is_empty());

      match next {
        Some(link) if link.starts_with("http://") || link.starts_with("https://") => {
          url = Url::parse(link)?;
        }
        Some(link) => {
          let base = self
            .link_base
            .as_deref()
            .ok_or_else(|| Error::Configuration("cannot resolve relative pagination link: host unknown".into()))?;
          url = Url::parse(&format!("{base}{link}"))?;
        }
        None => break,
      }
    }

    Ok(items)
  }
}

/// Map a non-2xx response into the error taxonomy. A 409 means the service
/// rejected an optimistically-versioned write.
async fn check(response: Response) -> Result<Response> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }

  let body = response
    .text()
    .await
    .unwrap_or_else(|_| String::from("(no error details)"));
  debug!(%status, %body, "request failed");

  if status == StatusCode::CONFLICT {
    Err(Error::Conflict { status, body })
  } else {
    Err(Error::Remote { status, body })
  }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
  let bytes = response.bytes().await?;
  serde_json::from_slice(&bytes).map_err(|err| Error::Decode(err.to_string()))
}

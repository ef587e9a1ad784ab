//! An active, version-locked connection to a Confluence site.
//!
//! [`Session::connect`] performs API generation detection and REST root
//! discovery exactly once; every subsequent operation dispatches through a
//! generation-specific backend selected at that point. The session owns the
//! only mutable client state: the bidirectional space id/key cache.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};
use url::Url;

use crate::api::{ContentApi, SpaceCache, results_array};
use crate::api_v1::V1Api;
use crate::api_v2::V2Api;
use crate::config::{ConnectionConfig, Deployment};
use crate::error::{Error, Result};
use crate::models::{
  ApiVersion, Attachment, ContentProperty, ContentVersion, IdentifiedContentProperty, IdentifiedLabel, Label, Page,
  PageProperties, Status, UpdateAttachmentRequest,
};
use crate::reconcile::{plan_labels, plan_properties};
use crate::transport::Transport;
use crate::wire::ATTACHMENT_ID_PREFIX;

/// Resolved site coordinates, fixed once discovery completes.
#[derive(Debug, Clone)]
pub struct SiteMetadata {
  /// URL scheme used to reach the host.
  pub scheme: String,
  /// Host name of the Confluence instance, including a port if non-default.
  pub host: String,
  /// Wiki base path, delimited by `/` on both ends.
  pub base_path: String,
  /// Default space key, if configured.
  pub space_key: Option<String>,
}

impl SiteMetadata {
  /// The classic REST API root, `{scheme}://{host}{base_path}`.
  pub fn classic_api_url(&self) -> String {
    format!("{}://{}{}", self.scheme, self.host, self.base_path)
  }
}

/// A reference to a space by either of its identifiers.
#[derive(Debug, Clone, Copy)]
pub enum SpaceRef<'a> {
  /// Address the space by numeric ID.
  Id(&'a str),
  /// Address the space by human-readable key.
  Key(&'a str),
}

/// Source of attachment content for an upload.
#[derive(Debug, Clone, Copy)]
pub enum AttachmentSource<'a> {
  /// Read the content from a file on disk.
  File(&'a Path),
  /// Use raw in-memory bytes.
  Bytes(&'a [u8]),
}

/// An authenticated connection to a Confluence site.
///
/// A session is one logical thread of control: operations are synchronous
/// request/response round-trips intended to be awaited strictly
/// sequentially. Concurrent use of a single session is unsupported. No call
/// is retried internally; retries, if desired, are a caller responsibility.
pub struct Session {
  transport: Transport,
  backend: Box<dyn ContentApi>,
  spaces: Arc<SpaceCache>,
  api_version: ApiVersion,
  site: SiteMetadata,
}

impl std::fmt::Debug for Session {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Session")
      .field("api_version", &self.api_version)
      .field("site", &self.site)
      .finish_non_exhaustive()
  }
}

/// Select the API generation from the deployment hint.
///
/// Data Center and Server may not support v2 endpoints, so they force v1.
/// Cloud uses v2. An absent hint defaults to v2 to prefer the newer API.
fn detect_api_version(deployment: Option<Deployment>) -> ApiVersion {
  match deployment {
    Some(Deployment::DataCenter) | Some(Deployment::Server) => ApiVersion::V1,
    Some(Deployment::Cloud) | None => ApiVersion::V2,
  }
}

impl Session {
  /// Open a connection: validate configuration, detect the API generation,
  /// and resolve the REST API root.
  ///
  /// Discovery runs once here; the resolved generation and root never
  /// change for the lifetime of the session.
  ///
  /// # Errors
  /// Returns [`Error::Configuration`] when the host or base path cannot be
  /// determined, and propagates transport errors from discovery probes that
  /// have no fallback.
  pub async fn connect(config: ConnectionConfig) -> Result<Self> {
    let config = config.validated()?;

    let api_version = detect_api_version(config.deployment);
    info!(api = api_version.prefix(), "using Confluence REST API");

    let mut transport = Transport::new(&config)?;
    let mut host = config.host.clone();
    let mut base_path = config.base_path.clone();
    let mut scheme = config.scheme.clone();

    if let Some(api_url) = config.api_url.as_deref() {
      transport.set_api_url(api_url);

      if host.is_none() || base_path.is_none() {
        let base = infer_base_url(&transport, api_version).await?;
        let (inferred_scheme, inferred_host, inferred_path) = split_base_url(&base)?;
        scheme = inferred_scheme;
        host.get_or_insert(inferred_host);
        base_path.get_or_insert(inferred_path);
      }
    }

    let host = host.ok_or_else(|| Error::Configuration("Confluence host not specified and cannot be inferred".into()))?;
    let base_path =
      base_path.ok_or_else(|| Error::Configuration("Confluence base path not specified and cannot be inferred".into()))?;

    let site = SiteMetadata {
      scheme,
      host,
      base_path,
      space_key: config.space_key.clone(),
    };
    transport.set_link_base(format!("{}://{}", site.scheme, site.host));

    if config.api_url.is_none() {
      info!("discovering Confluence REST API URL");

      match api_version {
        ApiVersion::V1 => {
          // Data Center/Server always serve the classic root; no probing.
          transport.set_api_url(site.classic_api_url());
          info!(api_url = transport.api_url(), "configured classic Confluence REST API URL");
        }
        ApiVersion::V2 => match probe_scoped_api_url(&mut transport, &site).await {
          Ok(()) => {
            info!(api_url = transport.api_url(), "configured scoped Confluence REST API URL");
          }
          Err(err) if is_probe_failure(&err) => {
            // Expected for self-hosted sites that claim the v2 API but lack
            // the tenant endpoint; the classic root is the normal fallback.
            debug!(error = %err, "scoped API probe failed");
            transport.set_api_url(site.classic_api_url());
            info!(api_url = transport.api_url(), "configured classic Confluence REST API URL");
          }
          Err(err) => return Err(err),
        },
      }
    }

    let spaces = Arc::new(SpaceCache::default());
    let backend: Box<dyn ContentApi> = match api_version {
      ApiVersion::V1 => Box::new(V1Api::new(transport.clone(), Arc::clone(&spaces))),
      ApiVersion::V2 => Box::new(V2Api::new(transport.clone(), Arc::clone(&spaces))),
    };

    Ok(Self {
      transport,
      backend,
      spaces,
      api_version,
      site,
    })
  }

  /// The API generation this session is locked onto.
  pub fn api_version(&self) -> ApiVersion {
    self.api_version
  }

  /// The resolved REST API root URL.
  pub fn api_url(&self) -> &str {
    self.transport.api_url()
  }

  /// Resolved site coordinates.
  pub fn site(&self) -> &SiteMetadata {
    &self.site
  }

  /// Find the space ID for a space key, consulting the cache first.
  pub async fn space_key_to_id(&self, key: &str) -> Result<String> {
    if let Some(id) = self.spaces.id_for_key(key) {
      return Ok(id);
    }
    let space = self.backend.space_by_key(key).await?;
    Ok(space.id)
  }

  /// Find the space key for a space ID, consulting the cache first.
  ///
  /// # Errors
  /// Under the v1 API this fails with [`Error::SpaceResolution`] unless a
  /// prior key-to-ID resolution populated the cache.
  pub async fn space_id_to_key(&self, id: &str) -> Result<String> {
    if let Some(key) = self.spaces.key_for_id(id) {
      return Ok(key);
    }
    let space = self.backend.space_by_id(id).await?;
    Ok(space.key)
  }

  /// Coalesce an optional space reference into a space ID, falling back to
  /// the configured default space.
  pub async fn space_id(&self, space: Option<SpaceRef<'_>>) -> Result<Option<String>> {
    match space {
      Some(SpaceRef::Id(id)) => Ok(Some(id.to_string())),
      Some(SpaceRef::Key(key)) => Ok(Some(self.space_key_to_id(key).await?)),
      None => match self.site.space_key.as_deref() {
        Some(key) => Ok(Some(self.space_key_to_id(key).await?)),
        None => Ok(None),
      },
    }
  }

  /// Retrieve a page with its storage-format content.
  pub async fn get_page(&self, page_id: &str) -> Result<Page> {
    self.backend.page(page_id).await
  }

  /// Retrieve page metadata without body content.
  pub async fn get_page_properties(&self, page_id: &str) -> Result<PageProperties> {
    self.backend.page_properties(page_id).await
  }

  /// Retrieve a page's current version number.
  pub async fn get_page_version(&self, page_id: &str) -> Result<u32> {
    Ok(self.get_page_properties(page_id).await?.version.number)
  }

  /// Look up a page by title within a space.
  ///
  /// # Errors
  /// Returns [`Error::NotFound`] unless exactly one page matches.
  pub async fn get_page_properties_by_title(
    &self,
    title: &str,
    space: Option<SpaceRef<'_>>,
  ) -> Result<PageProperties> {
    let space_id = self.space_id(space).await?;
    self.backend.page_by_title(title, space_id.as_deref()).await
  }

  /// Check whether a page with the given title exists, returning its ID.
  pub async fn page_exists(&self, title: &str, space: Option<SpaceRef<'_>>) -> Result<Option<String>> {
    debug!(title, "checking if page exists");
    let space_id = self.space_id(space).await?;
    self.backend.page_exists(title, space_id.as_deref()).await
  }

  /// Create a new page under a parent.
  ///
  /// The parent's space is resolved here; callers do not need to have
  /// fetched the parent beforehand. Returns the stored page including its
  /// assigned ID and initial version.
  pub async fn create_page(&self, parent_id: &str, title: &str, content: &str) -> Result<Page> {
    let parent = self.backend.page_properties(parent_id).await?;
    self.backend.create_page(&parent, title, content).await
  }

  /// Find a page with the given title under the parent's space, or create
  /// an empty one when no such page exists.
  pub async fn get_or_create_page(&self, title: &str, parent_id: &str) -> Result<Page> {
    let parent = self.backend.page_properties(parent_id).await?;
    let existing = self.backend.page_exists(title, Some(parent.space_id.as_str())).await?;

    match existing {
      Some(page_id) => {
        debug!(page_id, "retrieving existing page");
        self.backend.page(&page_id).await
      }
      None => {
        debug!(title, "creating new page");
        self.backend.create_page(&parent, title, "").await
      }
    }
  }

  /// Replace a page's content and title.
  ///
  /// Submits `expected_version + 1` as the new version counter; the service
  /// rejects the write when `expected_version` is not its current state,
  /// surfaced as [`Error::Conflict`]. Never retried automatically.
  pub async fn update_page(&self, page_id: &str, content: &str, title: &str, expected_version: u32) -> Result<()> {
    self
      .backend
      .update_page(page_id, content, title, expected_version + 1)
      .await
  }

  /// Move a page to the trash; with `purge`, additionally remove it
  /// permanently. The two API generations encode purging differently; the
  /// dispatch layer hides the asymmetry.
  pub async fn delete_page(&self, page_id: &str, purge: bool) -> Result<()> {
    self.backend.delete_page(page_id, purge).await
  }

  /// Retrieve a page attachment by its unprefixed file name.
  ///
  /// # Errors
  /// Returns [`Error::NotFound`] unless exactly one attachment matches.
  pub async fn get_attachment_by_name(&self, page_id: &str, filename: &str) -> Result<Attachment> {
    self.backend.attachment_by_name(page_id, filename).await
  }

  /// Upload an attachment to a page, replacing any existing attachment of
  /// the same name.
  ///
  /// When an attachment with this name already exists, has the same byte
  /// size, and `force` is false, no write request is issued: size is the
  /// sole identity heuristic, so real changes that keep the size are
  /// deliberately missed in exchange for skipping redundant uploads. The
  /// MIME type is inferred from the file name when not supplied, defaulting
  /// to `application/octet-stream`. After the upload, a follow-up request
  /// re-asserts the attachment title, because the upload transport extracts
  /// a bare filename and may alter the name.
  pub async fn upload_attachment(
    &self,
    page_id: &str,
    attachment_name: &str,
    source: AttachmentSource<'_>,
    content_type: Option<&str>,
    comment: Option<&str>,
    force: bool,
  ) -> Result<()> {
    let content_type = match content_type {
      Some(explicit) => explicit.to_string(),
      None => {
        let guess_from = match source {
          AttachmentSource::File(path) => path.to_string_lossy().into_owned(),
          AttachmentSource::Bytes(_) => attachment_name.to_string(),
        };
        mime_guess::from_path(&guess_from)
          .first_raw()
          .unwrap_or("application/octet-stream")
          .to_string()
      }
    };

    let byte_size = match source {
      AttachmentSource::File(path) => {
        if !path.is_file() {
          return Err(Error::NotFound(format!("file not found: {}", path.display())));
        }
        tokio::fs::metadata(path).await?.len()
      }
      AttachmentSource::Bytes(bytes) => bytes.len() as u64,
    };

    let path = match self.backend.attachment_by_name(page_id, attachment_name).await {
      Ok(existing) => {
        if !force && existing.file_size == byte_size {
          info!(attachment_name, "up-to-date attachment");
          return Ok(());
        }
        let bare_id = existing.id.strip_prefix(ATTACHMENT_ID_PREFIX).unwrap_or(&existing.id);
        format!("/content/{page_id}/child/attachment/{bare_id}/data")
      }
      // Intentionally a normal branch: a missing attachment means create.
      Err(Error::NotFound(_)) => format!("/content/{page_id}/child/attachment"),
      Err(err) => return Err(err),
    };

    let data = match source {
      AttachmentSource::File(path) => tokio::fs::read(path).await?,
      AttachmentSource::Bytes(bytes) => bytes.to_vec(),
    };

    info!(attachment_name, "uploading attachment");

    let file_part = reqwest::multipart::Part::bytes(data)
      .file_name(attachment_name.to_string())
      .mime_str(&content_type)?;
    let mut form = reqwest::multipart::Form::new().part("file", file_part);
    if let Some(comment) = comment {
      form = form.text("comment", comment.to_string());
    }

    let payload = self.transport.post_multipart(&path, form).await?;

    // Creation responses wrap the attachment in a result set; the
    // update-data endpoint returns it bare.
    let results = results_array(&payload);
    let result = results.first().unwrap_or(&payload);

    let attachment_id = result
      .get("id")
      .and_then(|value| value.as_str())
      .ok_or_else(|| Error::Decode("attachment upload response is missing an id".to_string()))?;
    let version = result
      .get("version")
      .and_then(|version| version.get("number"))
      .and_then(|value| value.as_u64())
      .ok_or_else(|| Error::Decode("attachment upload response is missing a version number".to_string()))?
      as u32;

    // The multipart transport truncates the name to a bare filename;
    // re-assert the intended title.
    self
      .update_attachment_title(page_id, attachment_id, version + 1, attachment_name)
      .await
  }

  async fn update_attachment_title(
    &self,
    page_id: &str,
    attachment_id: &str,
    new_version: u32,
    title: &str,
  ) -> Result<()> {
    let bare_id = attachment_id.strip_prefix(ATTACHMENT_ID_PREFIX).unwrap_or(attachment_id);
    let request = UpdateAttachmentRequest {
      id: attachment_id.to_string(),
      content_type: "attachment".to_string(),
      status: Status::Current,
      title: title.to_string(),
      version: ContentVersion::minor(new_version),
    };

    info!(attachment_id, "updating attachment");
    self
      .transport
      .put_unit(
        ApiVersion::V1,
        &format!("/content/{page_id}/child/attachment/{bare_id}"),
        &request,
      )
      .await
  }

  /// Retrieve all labels on a page.
  pub async fn get_labels(&self, page_id: &str) -> Result<Vec<IdentifiedLabel>> {
    self.backend.labels(page_id).await
  }

  /// Add labels to a page.
  ///
  /// Label mutation is a v1 endpoint under both generations; the service
  /// exposes no v2 equivalent.
  pub async fn add_labels(&self, page_id: &str, labels: &[Label]) -> Result<()> {
    self
      .transport
      .post_unit(ApiVersion::V1, &format!("/content/{page_id}/label"), &labels)
      .await
  }

  /// Remove labels from a page, one delete request per label.
  pub async fn remove_labels(&self, page_id: &str, labels: &[Label]) -> Result<()> {
    for label in labels {
      self
        .transport
        .delete(
          ApiVersion::V1,
          &format!("/content/{page_id}/label"),
          &[("name", label.name.as_str())],
        )
        .await?;
    }
    Ok(())
  }

  /// Reconcile the page's labels against a desired set.
  ///
  /// Computes minimal additions and removals keyed by `(name, prefix)`,
  /// applies them in sorted order, and removes nothing when
  /// `keep_existing` is set. Running this twice with the same desired set
  /// performs no mutations on the second pass.
  pub async fn update_labels(&self, page_id: &str, labels: &[Label], keep_existing: bool) -> Result<()> {
    let current: Vec<Label> = self
      .backend
      .labels(page_id)
      .await?
      .iter()
      .map(IdentifiedLabel::label)
      .collect();

    let plan = plan_labels(labels, &current, keep_existing);

    if !plan.add.is_empty() {
      self.add_labels(page_id, &plan.add).await?;
    }
    if !plan.remove.is_empty() {
      self.remove_labels(page_id, &plan.remove).await?;
    }
    Ok(())
  }

  /// Retrieve all content properties on a page.
  pub async fn get_content_properties(&self, page_id: &str) -> Result<Vec<IdentifiedContentProperty>> {
    self.backend.properties(page_id).await
  }

  /// Add a content property to a page.
  pub async fn add_content_property(
    &self,
    page_id: &str,
    property: &ContentProperty,
  ) -> Result<IdentifiedContentProperty> {
    self.backend.add_property(page_id, property).await
  }

  /// Update an existing content property, submitting `expected_version + 1`.
  pub async fn update_content_property(
    &self,
    page_id: &str,
    property_id: &str,
    expected_version: u32,
    property: &ContentProperty,
  ) -> Result<IdentifiedContentProperty> {
    self
      .backend
      .update_property(page_id, property_id, expected_version + 1, property)
      .await
  }

  /// Remove a content property from a page.
  pub async fn remove_content_property(&self, page_id: &str, property_id: &str) -> Result<()> {
    self.backend.remove_property(page_id, property_id).await
  }

  /// Reconcile the page's content properties against a desired set.
  ///
  /// Additions, removals and value-changing updates are computed keyed by
  /// property key and applied in sorted order; updates submit the current
  /// version plus one, and unchanged values are skipped to avoid version
  /// churn. With `keep_existing`, properties absent from the desired set
  /// are left in place.
  pub async fn update_content_properties(
    &self,
    page_id: &str,
    properties: &[ContentProperty],
    keep_existing: bool,
  ) -> Result<()> {
    let current = self.backend.properties(page_id).await?;
    let plan = plan_properties(properties, &current, keep_existing);

    for property in &plan.add {
      self.backend.add_property(page_id, property).await?;
    }
    for removal in &plan.remove {
      self.backend.remove_property(page_id, &removal.id).await?;
    }
    for update in &plan.update {
      self
        .backend
        .update_property(page_id, &update.id, update.new_version, &update.property)
        .await?;
    }
    Ok(())
  }
}

/// Infer the site base URL from a one-item space listing on whichever
/// generation is selected.
async fn infer_base_url(transport: &Transport, api_version: ApiVersion) -> Result<String> {
  let (version, path) = match api_version {
    ApiVersion::V1 => (ApiVersion::V1, "/space"),
    ApiVersion::V2 => (ApiVersion::V2, "/spaces"),
  };

  let payload: serde_json::Value = transport.get(version, path, &[("limit", "1")]).await?;

  let base = match api_version {
    // v1 reports the base link on each result; v2 on the envelope.
    ApiVersion::V1 => results_array(&payload)
      .first()
      .and_then(|result| result.get("_links"))
      .and_then(|links| links.get("base"))
      .and_then(|value| value.as_str())
      .map(str::to_string),
    ApiVersion::V2 => payload
      .get("_links")
      .and_then(|links| links.get("base"))
      .and_then(|value| value.as_str())
      .map(str::to_string),
  };

  base.ok_or_else(|| Error::Configuration("unable to infer host and base path: no spaces found".into()))
}

/// Split a base URL like `https://example.atlassian.net/wiki` into scheme,
/// host and `/`-delimited base path.
fn split_base_url(base: &str) -> Result<(String, String, String)> {
  let parsed = Url::parse(base)?;
  let mut host = parsed
    .host_str()
    .ok_or_else(|| Error::Configuration(format!("base URL has no host: {base}")))?
    .to_string();
  if let Some(port) = parsed.port() {
    host = format!("{host}:{port}");
  }

  let mut path = parsed.path().to_string();
  if !path.ends_with('/') {
    path.push('/');
  }

  Ok((parsed.scheme().to_string(), host, path))
}

/// Obtain a tenant identifier from the edge discovery endpoint, build the
/// scoped API root, and probe it with a minimal request. Any failure leaves
/// the transport's API root unset for the caller to fall back.
async fn probe_scoped_api_url(transport: &mut Transport, site: &SiteMetadata) -> Result<()> {
  let tenant: serde_json::Value = transport
    .get_absolute(&format!("{}://{}/_edge/tenant_info", site.scheme, site.host))
    .await?;
  let cloud_id = tenant
    .get("cloudId")
    .and_then(|value| value.as_str())
    .ok_or_else(|| Error::Decode("tenant_info response is missing cloudId".to_string()))?;

  info!("probing scoped Confluence REST API URL");
  transport.set_api_url(format!("https://api.atlassian.com/ex/confluence/{cloud_id}/"));
  let _: serde_json::Value = transport.get(ApiVersion::V2, "/spaces", &[("limit", "1")]).await?;
  Ok(())
}

/// Probe failures that mean "fall back to the classic root" rather than
/// "abort". Self-hosted deployments lacking the tenant endpoint answer with
/// a connection failure, a non-2xx status, or a 2xx body that is not tenant
/// JSON; all three identify a site without a scoped root.
fn is_probe_failure(err: &Error) -> bool {
  matches!(err, Error::Http(_) | Error::Remote { .. } | Error::Decode(_))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn deployment_hints_map_to_api_versions() {
    assert_eq!(detect_api_version(Some(Deployment::DataCenter)), ApiVersion::V1);
    assert_eq!(detect_api_version(Some(Deployment::Server)), ApiVersion::V1);
    assert_eq!(detect_api_version(Some(Deployment::Cloud)), ApiVersion::V2);
    assert_eq!(detect_api_version(None), ApiVersion::V2);
  }

  #[test]
  fn split_base_url_appends_trailing_slash() {
    let (scheme, host, path) = split_base_url("https://example.atlassian.net/wiki").unwrap();
    assert_eq!(scheme, "https");
    assert_eq!(host, "example.atlassian.net");
    assert_eq!(path, "/wiki/");
  }

  #[test]
  fn split_base_url_keeps_scheme_and_nonstandard_port() {
    let (scheme, host, path) = split_base_url("http://confluence.internal:8090/confluence/").unwrap();
    assert_eq!(scheme, "http");
    assert_eq!(host, "confluence.internal:8090");
    assert_eq!(path, "/confluence/");
  }

  #[test]
  fn split_base_url_rejects_hostless_urls() {
    assert!(split_base_url("file:///wiki/").is_err());
  }

  #[test]
  fn probe_fallback_covers_missing_tenant_endpoints_only() {
    assert!(is_probe_failure(&Error::Remote {
      status: reqwest::StatusCode::NOT_FOUND,
      body: String::new(),
    }));
    assert!(is_probe_failure(&Error::Decode("tenant_info response is missing cloudId".to_string())));
    assert!(!is_probe_failure(&Error::Conflict {
      status: reqwest::StatusCode::CONFLICT,
      body: String::new(),
    }));
    assert!(!is_probe_failure(&Error::Configuration("host unknown".to_string())));
  }
}

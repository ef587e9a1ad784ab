//! Generation dispatch boundary.
//!
//! Every content operation with divergent v1/v2 wire behavior is declared
//! once on [`ContentApi`] and implemented twice, in [`crate::api_v1`] and
//! [`crate::api_v2`]. The implementation is selected a single time at
//! session construction, so call sites stay generation-agnostic.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
  Attachment, ContentProperty, IdentifiedContentProperty, IdentifiedLabel, Page, PageProperties, Space,
};

/// Generation-specific content operations.
///
/// Implementations receive already-resolved inputs: the session coalesces
/// space identifiers and fetches parent pages before dispatching, so each
/// backend only deals with its own wire format.
#[async_trait]
pub(crate) trait ContentApi: Send + Sync {
  /// Look up a space by key.
  async fn space_by_key(&self, key: &str) -> Result<Space>;

  /// Look up a space by ID.
  ///
  /// The v1 implementation serves this only from the shared cache and fails
  /// with a resolution error when the ID has not been seen before.
  async fn space_by_id(&self, id: &str) -> Result<Space>;

  /// Fetch a page with its storage-format body.
  async fn page(&self, page_id: &str) -> Result<Page>;

  /// Fetch page metadata without body content.
  async fn page_properties(&self, page_id: &str) -> Result<PageProperties>;

  /// Find exactly one page by title, optionally scoped to a space.
  async fn page_by_title(&self, title: &str, space_id: Option<&str>) -> Result<PageProperties>;

  /// Return the ID of the page with the given title, or `None` when no
  /// single match exists.
  async fn page_exists(&self, title: &str, space_id: Option<&str>) -> Result<Option<String>>;

  /// Create a page under the given parent, returning the stored page with
  /// its assigned ID and initial version.
  async fn create_page(&self, parent: &PageProperties, title: &str, content: &str) -> Result<Page>;

  /// Replace a page's content and title, submitting `new_version` as the
  /// version counter. The service rejects the write when the counter does
  /// not equal its current state plus one.
  async fn update_page(&self, page_id: &str, content: &str, title: &str, new_version: u32) -> Result<()>;

  /// Move a page to the trash; with `purge` also remove it permanently.
  async fn delete_page(&self, page_id: &str, purge: bool) -> Result<()>;

  /// Find exactly one attachment on a page by its unprefixed file name.
  async fn attachment_by_name(&self, page_id: &str, filename: &str) -> Result<Attachment>;

  /// List all labels on a page.
  async fn labels(&self, page_id: &str) -> Result<Vec<IdentifiedLabel>>;

  /// List all content properties on a page.
  async fn properties(&self, page_id: &str) -> Result<Vec<IdentifiedContentProperty>>;

  /// Add a content property to a page.
  async fn add_property(&self, page_id: &str, property: &ContentProperty) -> Result<IdentifiedContentProperty>;

  /// Update an existing content property, submitting `new_version` as the
  /// version counter.
  async fn update_property(
    &self,
    page_id: &str,
    property_id: &str,
    new_version: u32,
    property: &ContentProperty,
  ) -> Result<IdentifiedContentProperty>;

  /// Remove a content property from a page.
  async fn remove_property(&self, page_id: &str, property_id: &str) -> Result<()>;
}

/// Bidirectional space id/key cache, confined to one session.
///
/// Mappings are created lazily on first resolution and live for the
/// session's lifetime; nothing is ever invalidated or persisted.
#[derive(Debug, Default)]
pub(crate) struct SpaceCache {
  inner: Mutex<SpaceCacheInner>,
}

#[derive(Debug, Default)]
struct SpaceCacheInner {
  id_to_key: HashMap<String, String>,
  key_to_id: HashMap<String, String>,
}

impl SpaceCache {
  /// Record a resolved space in both directions.
  pub(crate) fn insert(&self, space: &Space) {
    let mut inner = self.inner.lock().expect("space cache lock poisoned");
    inner.id_to_key.insert(space.id.clone(), space.key.clone());
    inner.key_to_id.insert(space.key.clone(), space.id.clone());
  }

  /// Cached key for a space ID, if previously resolved.
  pub(crate) fn key_for_id(&self, id: &str) -> Option<String> {
    let inner = self.inner.lock().expect("space cache lock poisoned");
    inner.id_to_key.get(id).cloned()
  }

  /// Cached ID for a space key, if previously resolved.
  pub(crate) fn id_for_key(&self, key: &str) -> Option<String> {
    let inner = self.inner.lock().expect("space cache lock poisoned");
    inner.key_to_id.get(key).cloned()
  }
}

/// Extract the `results` array from a listing payload.
pub(crate) fn results_array(payload: &serde_json::Value) -> Vec<serde_json::Value> {
  payload
    .get("results")
    .and_then(|value| value.as_array())
    .cloned()
    .unwrap_or_default()
}

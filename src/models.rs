//! Version-agnostic domain model for Confluence content.
//!
//! These types mirror the v2 REST API wire shapes (camelCase JSON), which
//! serve as the canonical representation; v1 responses are normalized into
//! them by the mappers in [`crate::wire`]. The rest of the crate never sees
//! generation-specific field names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Confluence REST API generation a request corresponds to.
///
/// Confluence Cloud supports v2 endpoints for most content operations, while
/// some Server and Data Center releases only expose v1. The generation is
/// fixed for the lifetime of a [`crate::Session`]: it is determined once at
/// connect time and never re-detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVersion {
  /// Classic REST API rooted at `rest/api`.
  V1,
  /// Current REST API rooted at `api/v2`.
  V2,
}

impl ApiVersion {
  /// URL path prefix for this API generation.
  pub fn prefix(self) -> &'static str {
    match self {
      ApiVersion::V1 => "rest/api",
      ApiVersion::V2 => "api/v2",
    }
  }
}

/// Publication status of a content node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
  /// Published and visible.
  Current,
  /// Unpublished draft.
  Draft,
  /// Archived content.
  Archived,
  /// Moved to the recoverable trash.
  Trashed,
}

/// Body content representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Representation {
  /// Confluence storage-format XHTML.
  Storage,
  /// Atlassian document format JSON.
  AtlasDocFormat,
  /// Legacy wiki markup.
  Wiki,
}

/// Content types that can parent a page.
///
/// The v1 API does not report a parent type at all; pages mapped from v1
/// responses carry an absent parent type rather than a fabricated value.
/// [`ParentContentType::Unknown`] covers v2 values this crate does not
/// model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParentContentType {
  Page,
  Whiteboard,
  Database,
  Embed,
  Folder,
  /// Parent type not reported by the API generation in use.
  #[serde(other)]
  Unknown,
}

/// Version counter attached to pages, attachments and content properties.
///
/// The number increases by exactly 1 on every successful update; clients must
/// submit `current + 1` when writing (optimistic concurrency).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentVersion {
  /// Monotonically increasing version number.
  pub number: u32,
  /// Whether the edit should be treated as minor (no notifications).
  #[serde(default)]
  pub minor_edit: bool,
  /// When this version was created, if reported.
  #[serde(default, deserialize_with = "flexible_datetime_opt", skip_serializing_if = "Option::is_none")]
  pub created_at: Option<DateTime<Utc>>,
  /// Optional edit message.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
  /// Account ID of the author of this version, if reported.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub author_id: Option<String>,
}

impl ContentVersion {
  /// A version counter with only a number set.
  pub fn numbered(number: u32) -> Self {
    Self {
      number,
      minor_edit: false,
      created_at: None,
      message: None,
      author_id: None,
    }
  }

  /// A minor-edit version counter, used for updates that should not notify
  /// watchers.
  pub fn minor(number: u32) -> Self {
    Self {
      minor_edit: true,
      ..Self::numbered(number)
    }
  }
}

/// A top-level container of pages.
///
/// The id/key mapping is bijective within one site; the session caches both
/// directions after first resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
  /// Numeric space identifier assigned by Confluence.
  pub id: String,
  /// Human-readable space key.
  pub key: String,
}

/// Page metadata used for synchronization, without body content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageProperties {
  /// Unique page identifier assigned by Confluence.
  pub id: String,
  /// Publication status.
  pub status: Status,
  /// Page title, unique within a space (enforced remotely, not locally).
  pub title: String,
  /// Identifier of the containing space.
  pub space_id: String,
  /// Identifier of the immediate parent page, if any.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub parent_id: Option<String>,
  /// Content type of the parent; absent under the v1 API.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub parent_type: Option<ParentContentType>,
  /// Position within the parent's child list; absent under the v1 API.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub position: Option<i32>,
  /// Account ID of the original author; absent under the v1 API.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub author_id: Option<String>,
  /// Account ID of the current owner; absent under the v1 API.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub owner_id: Option<String>,
  /// Account ID of the previous owner, if any.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub last_owner_id: Option<String>,
  /// When the page was created. Informational; unparsable values degrade to
  /// the current instant rather than failing the mapping.
  #[serde(default = "Utc::now", deserialize_with = "flexible_datetime")]
  pub created_at: DateTime<Utc>,
  /// Version counter, incremented on every update.
  pub version: ContentVersion,
}

/// Page body in a single representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageStorage {
  /// Representation of `value` (typically storage format).
  pub representation: Representation,
  /// Raw body content in the named representation.
  pub value: String,
}

impl PageStorage {
  /// Wrap storage-format markup.
  pub fn storage(value: impl Into<String>) -> Self {
    Self {
      representation: Representation::Storage,
      value: value.into(),
    }
  }
}

/// Page body wrapper carrying the storage-format rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageBody {
  /// Storage-format content with representation metadata.
  pub storage: PageStorage,
}

/// A wiki content node: metadata plus body content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
  /// Metadata shared with [`PageProperties`].
  #[serde(flatten)]
  pub properties: PageProperties,
  /// Page body content.
  pub body: PageBody,
}

impl Page {
  /// Storage-format markup of the page body.
  pub fn content(&self) -> &str {
    &self.body.storage.value
  }
}

/// A binary file attached to a page. Titles are unique per page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
  /// Unique attachment identifier.
  pub id: String,
  /// Attachment status.
  pub status: Status,
  /// Filename/title of the attachment.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
  /// When the attachment was created.
  #[serde(default = "Utc::now", deserialize_with = "flexible_datetime")]
  pub created_at: DateTime<Utc>,
  /// Page the attachment is coupled with.
  pub page_id: String,
  /// MIME type of the attachment.
  pub media_type: String,
  /// Human-readable media type description, if reported.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub media_type_description: Option<String>,
  /// Description of the attachment, if any.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub comment: Option<String>,
  /// File ID, distinct from the attachment ID; absent under the v1 API.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub file_id: Option<String>,
  /// Size in bytes. Used as the identity heuristic to skip redundant
  /// uploads.
  pub file_size: u64,
  /// Web UI link, if reported.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub webui_link: Option<String>,
  /// Download link, if reported.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub download_link: Option<String>,
  /// Version counter.
  pub version: ContentVersion,
}

/// A tag attached to a page, identified by the `(name, prefix)` pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Label {
  /// Label name.
  pub name: String,
  /// Namespace prefix; `"global"` unless stated otherwise.
  #[serde(default = "default_label_prefix")]
  pub prefix: String,
}

impl Label {
  /// A label in the default `global` namespace.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      prefix: default_label_prefix(),
    }
  }

  /// A label with an explicit namespace prefix.
  pub fn with_prefix(name: impl Into<String>, prefix: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      prefix: prefix.into(),
    }
  }
}

fn default_label_prefix() -> String {
  "global".to_string()
}

/// A label as returned by the service, carrying its surrogate ID.
///
/// The ID is only meaningful for removal under the v2 API; the natural key
/// remains `(name, prefix)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifiedLabel {
  /// Service-assigned label identifier.
  pub id: String,
  /// Label name.
  pub name: String,
  /// Namespace prefix.
  #[serde(default = "default_label_prefix")]
  pub prefix: String,
}

impl IdentifiedLabel {
  /// The natural-key view of this label.
  pub fn label(&self) -> Label {
    Label {
      name: self.name.clone(),
      prefix: self.prefix.clone(),
    }
  }
}

/// An arbitrary key/value annotation on a page. Keys are unique per page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentProperty {
  /// Property key, the natural identity from the caller's perspective.
  pub key: String,
  /// Arbitrary structured value.
  pub value: serde_json::Value,
}

impl ContentProperty {
  /// Construct a property from a key and any serializable value.
  pub fn new(key: impl Into<String>, value: serde_json::Value) -> Self {
    Self { key: key.into(), value }
  }
}

/// A content property as returned by the service, with surrogate ID and
/// version counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifiedContentProperty {
  /// Service-assigned property identifier.
  pub id: String,
  /// Property key.
  pub key: String,
  /// Property value.
  pub value: serde_json::Value,
  /// Version counter, incremented on every update.
  pub version: ContentVersion,
}

/// Request body for creating a page (v2 shape; mapped for v1).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePageRequest {
  /// Identifier of the space to create the page in.
  pub space_id: String,
  /// Initial status.
  pub status: Status,
  /// New page title, unique within the space.
  pub title: String,
  /// Parent page identifier.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub parent_id: Option<String>,
  /// Page body content.
  pub body: PageBody,
}

/// Request body for updating a page (v2 shape; mapped for v1).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePageRequest {
  /// Page identifier.
  pub id: String,
  /// Status to assign.
  pub status: Status,
  /// Title to assign, unique within the space.
  pub title: String,
  /// Page body content.
  pub body: PageBody,
  /// Version to assign; must be the current version plus one.
  pub version: ContentVersion,
}

/// Request body for re-asserting an attachment's title after upload
/// (v1 shape; the upload endpoint is v1 under both generations).
#[derive(Debug, Clone, Serialize)]
pub struct UpdateAttachmentRequest {
  /// Attachment identifier, including any surrogate prefix.
  pub id: String,
  /// Always `"attachment"`.
  #[serde(rename = "type")]
  pub content_type: String,
  /// Status to assign.
  pub status: Status,
  /// Title to assign.
  pub title: String,
  /// Version to assign; must be the current version plus one.
  pub version: ContentVersion,
}

/// Parse an ISO-8601 timestamp, accepting both `Z` and numeric-offset
/// suffixes. Unparsable input degrades to the current instant: dates are
/// informational and must not fail a mapping.
pub(crate) fn parse_timestamp(value: &str) -> DateTime<Utc> {
  DateTime::parse_from_rfc3339(value)
    .map(|instant| instant.with_timezone(&Utc))
    .unwrap_or_else(|_| Utc::now())
}

fn flexible_datetime<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<String>::deserialize(deserializer)?;
  Ok(match value {
    Some(text) => parse_timestamp(&text),
    None => Utc::now(),
  })
}

fn flexible_datetime_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<String>::deserialize(deserializer)?;
  Ok(value.as_deref().and_then(|text| {
    DateTime::parse_from_rfc3339(text)
      .map(|instant| instant.with_timezone(&Utc))
      .ok()
  }))
}

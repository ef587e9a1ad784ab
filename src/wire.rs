//! Mapping between Confluence REST API v1 wire shapes and the domain model.
//!
//! The v1 API uses different field names and nesting than v2: space data is
//! nested under `space`, the parent is the last entry of an `ancestors`
//! array, version counters live under `version.number`, and body content is
//! found at `body.storage.value`. Every one of those differences is isolated
//! here as a pure, total mapping function so that nothing outside this
//! module ever handles a v1 field name.

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::{
  Attachment, ContentVersion, CreatePageRequest, IdentifiedContentProperty, IdentifiedLabel, Page, PageBody,
  PageProperties, PageStorage, Space, Status, UpdatePageRequest, parse_timestamp,
};

/// Surrogate-ID prefix the v1 API prepends to attachment identifiers.
///
/// Upload and title-update URLs require the bare numeric part. Verified
/// against observed Cloud and Data Center servers; not a documented protocol
/// guarantee.
pub(crate) const ATTACHMENT_ID_PREFIX: &str = "att";

/// Deserializes a JSON value that may be either a string or a number into a
/// string, since v1 endpoints are inconsistent about identifier types.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum IdValue {
  Text(String),
  Number(i64),
}

impl From<IdValue> for String {
  fn from(value: IdValue) -> Self {
    match value {
      IdValue::Text(text) => text,
      IdValue::Number(number) => number.to_string(),
    }
  }
}

#[derive(Debug, Deserialize)]
struct V1Space {
  id: IdValue,
  key: String,
}

#[derive(Debug, Deserialize)]
struct V1Ancestor {
  id: IdValue,
}

#[derive(Debug, Deserialize)]
struct V1Version {
  number: u32,
  #[serde(default, rename = "minorEdit")]
  minor_edit: bool,
  #[serde(default)]
  when: Option<String>,
  #[serde(default)]
  message: Option<String>,
}

impl From<V1Version> for ContentVersion {
  fn from(version: V1Version) -> Self {
    ContentVersion {
      number: version.number,
      minor_edit: version.minor_edit,
      created_at: version.when.as_deref().map(parse_timestamp),
      message: version.message,
      author_id: None,
    }
  }
}

#[derive(Debug, Deserialize)]
struct V1Storage {
  value: String,
}

#[derive(Debug, Deserialize)]
struct V1Body {
  #[serde(default)]
  storage: Option<V1Storage>,
}

#[derive(Debug, Deserialize)]
struct V1History {
  #[serde(default, rename = "createdDate")]
  created_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct V1Page {
  id: IdValue,
  status: Status,
  title: String,
  space: V1Space,
  #[serde(default)]
  ancestors: Vec<V1Ancestor>,
  version: V1Version,
  #[serde(default)]
  body: Option<V1Body>,
  #[serde(default)]
  history: Option<V1History>,
}

/// Map a v1 content response to domain page properties.
///
/// The space ID is flattened out of the nested `space` object and the parent
/// ID is taken from the **last** element of the `ancestors` list (an empty
/// list means no parent). Ownership, position and parent-type metadata do
/// not exist in v1 responses and are mapped to an explicit absent value.
///
/// # Errors
/// Returns [`Error::Decode`] when a structurally required field (id, title,
/// status, space, version) is missing.
pub fn page_properties_from_v1(value: serde_json::Value) -> Result<PageProperties> {
  let page: V1Page = serde_json::from_value(value)?;
  Ok(properties_from(page))
}

/// Map a v1 content response carrying body content to a domain [`Page`].
///
/// # Errors
/// Returns [`Error::Decode`] when required fields or the storage body are
/// missing.
pub fn page_from_v1(value: serde_json::Value) -> Result<Page> {
  let mut page: V1Page = serde_json::from_value(value)?;
  let storage = page
    .body
    .take()
    .and_then(|body| body.storage)
    .ok_or_else(|| Error::Decode("v1 page response is missing body.storage".to_string()))?;

  Ok(Page {
    properties: properties_from(page),
    body: PageBody {
      storage: PageStorage::storage(storage.value),
    },
  })
}

fn properties_from(page: V1Page) -> PageProperties {
  let created_at = page
    .history
    .as_ref()
    .and_then(|history| history.created_date.as_deref())
    .map(parse_timestamp)
    .unwrap_or_else(chrono::Utc::now);

  PageProperties {
    id: page.id.into(),
    status: page.status,
    title: page.title,
    space_id: page.space.id.into(),
    parent_id: page.ancestors.into_iter().next_back().map(|ancestor| ancestor.id.into()),
    parent_type: None,
    position: None,
    author_id: None,
    owner_id: None,
    last_owner_id: None,
    created_at,
    version: page.version.into(),
  }
}

#[derive(Debug, Deserialize)]
struct V1AttachmentExtensions {
  #[serde(rename = "mediaType")]
  media_type: String,
  #[serde(rename = "fileSize")]
  file_size: u64,
  #[serde(default)]
  comment: Option<String>,
}

#[derive(Debug, Deserialize)]
struct V1AttachmentLinks {
  #[serde(default)]
  download: Option<String>,
  #[serde(default)]
  webui: Option<String>,
}

#[derive(Debug, Deserialize)]
struct V1Attachment {
  id: IdValue,
  status: Status,
  title: String,
  extensions: V1AttachmentExtensions,
  version: V1Version,
  #[serde(default, rename = "_links")]
  links: Option<V1AttachmentLinks>,
}

/// Map a v1 attachment record to the domain model.
///
/// Media type and byte size come from the nested `extensions` object and
/// links come from `_links`. The v1 record does not name its page, so the
/// page ID is supplied from the request context.
///
/// # Errors
/// Returns [`Error::Decode`] when required fields are missing.
pub fn attachment_from_v1(page_id: &str, value: serde_json::Value) -> Result<Attachment> {
  let attachment: V1Attachment = serde_json::from_value(value)?;
  let links = attachment.links.unwrap_or(V1AttachmentLinks {
    download: None,
    webui: None,
  });
  let created_at = attachment
    .version
    .when
    .as_deref()
    .map(parse_timestamp)
    .unwrap_or_else(chrono::Utc::now);

  Ok(Attachment {
    id: attachment.id.into(),
    status: attachment.status,
    title: Some(attachment.title),
    created_at,
    page_id: page_id.to_string(),
    media_type: attachment.extensions.media_type,
    media_type_description: None,
    comment: attachment.extensions.comment,
    file_id: None,
    file_size: attachment.extensions.file_size,
    webui_link: links.webui,
    download_link: links.download,
    version: attachment.version.into(),
  })
}

#[derive(Debug, Deserialize)]
struct V1Label {
  id: IdValue,
  name: String,
  #[serde(default)]
  prefix: Option<String>,
}

/// Map a v1 label record to the domain model. A missing prefix defaults to
/// the `global` namespace.
///
/// # Errors
/// Returns [`Error::Decode`] when `id` or `name` is missing.
pub fn label_from_v1(value: serde_json::Value) -> Result<IdentifiedLabel> {
  let label: V1Label = serde_json::from_value(value)?;
  Ok(IdentifiedLabel {
    id: label.id.into(),
    name: label.name,
    prefix: label.prefix.unwrap_or_else(|| "global".to_string()),
  })
}

#[derive(Debug, Deserialize)]
struct V1Property {
  id: IdValue,
  key: String,
  value: serde_json::Value,
  version: V1Version,
}

/// Map a v1 content property record to the domain model. The version number
/// is flattened out of the nested `version` object.
///
/// # Errors
/// Returns [`Error::Decode`] when required fields are missing.
pub fn property_from_v1(value: serde_json::Value) -> Result<IdentifiedContentProperty> {
  let property: V1Property = serde_json::from_value(value)?;
  Ok(IdentifiedContentProperty {
    id: property.id.into(),
    key: property.key,
    value: property.value,
    version: property.version.into(),
  })
}

/// Map a v1 space response to the domain model.
///
/// # Errors
/// Returns [`Error::Decode`] when `id` or `key` is missing.
pub fn space_from_v1(value: serde_json::Value) -> Result<Space> {
  let space: V1Space = serde_json::from_value(value)?;
  Ok(Space {
    id: space.id.into(),
    key: space.key,
  })
}

/// Build the v1 request body for creating a page.
///
/// The v1 API addresses spaces by key rather than ID and takes the parent as
/// a one-element `ancestors` array.
pub fn create_page_to_v1(request: &CreatePageRequest, space_key: &str) -> serde_json::Value {
  let ancestors: Vec<serde_json::Value> = request
    .parent_id
    .iter()
    .map(|id| serde_json::json!({"id": id}))
    .collect();

  serde_json::json!({
    "type": "page",
    "title": request.title,
    "space": {"key": space_key},
    "ancestors": ancestors,
    "status": request.status,
    "body": {
      "storage": {
        "value": request.body.storage.value,
        "representation": request.body.storage.representation,
      }
    },
  })
}

/// Build the v1 request body for updating a page.
pub fn update_page_to_v1(request: &UpdatePageRequest, space_key: &str) -> serde_json::Value {
  serde_json::json!({
    "id": request.id,
    "type": "page",
    "title": request.title,
    "space": {"key": space_key},
    "status": request.status,
    "body": {
      "storage": {
        "value": request.body.storage.value,
        "representation": request.body.storage.representation,
      }
    },
    "version": {
      "number": request.version.number,
      "minorEdit": request.version.minor_edit,
    },
  })
}

//! Classic `rest/api` implementation of the content operations.
//!
//! The v1 API addresses spaces by key, nests page metadata, and reports the
//! parent through an `ancestors` array; all responses pass through the
//! mappers in [`crate::wire`] so the divergence stays contained.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::api::{ContentApi, SpaceCache, results_array};
use crate::error::{Error, Result};
use crate::models::{
  ApiVersion, Attachment, ContentProperty, ContentVersion, CreatePageRequest, IdentifiedContentProperty,
  IdentifiedLabel, Page, PageBody, PageProperties, PageStorage, Space, Status, UpdatePageRequest,
};
use crate::transport::Transport;
use crate::wire;

/// Content operations backed by v1 endpoints.
pub(crate) struct V1Api {
  transport: Transport,
  spaces: Arc<SpaceCache>,
}

impl V1Api {
  pub(crate) fn new(transport: Transport, spaces: Arc<SpaceCache>) -> Self {
    Self { transport, spaces }
  }

  /// Resolve a space ID to its key from the cache.
  ///
  /// The v1 API has no ID-to-key lookup endpoint, so this only succeeds
  /// after a prior key-to-ID resolution populated the cache.
  fn key_for_space_id(&self, space_id: &str) -> Result<String> {
    self.spaces.key_for_id(space_id).ok_or_else(|| Error::SpaceResolution {
      id: space_id.to_string(),
    })
  }
}

#[async_trait]
impl ContentApi for V1Api {
  async fn space_by_key(&self, key: &str) -> Result<Space> {
    let payload: serde_json::Value = self.transport.get(ApiVersion::V1, &format!("/space/{key}"), &[]).await?;
    let space = wire::space_from_v1(payload)?;
    self.spaces.insert(&space);
    Ok(space)
  }

  async fn space_by_id(&self, id: &str) -> Result<Space> {
    let key = self.key_for_space_id(id)?;
    Ok(Space {
      id: id.to_string(),
      key,
    })
  }

  async fn page(&self, page_id: &str) -> Result<Page> {
    let payload: serde_json::Value = self
      .transport
      .get(
        ApiVersion::V1,
        &format!("/content/{page_id}"),
        &[("expand", "body.storage,version,space")],
      )
      .await?;
    wire::page_from_v1(payload)
  }

  async fn page_properties(&self, page_id: &str) -> Result<PageProperties> {
    let payload: serde_json::Value = self
      .transport
      .get(ApiVersion::V1, &format!("/content/{page_id}"), &[("expand", "version,space")])
      .await?;
    wire::page_properties_from_v1(payload)
  }

  async fn page_by_title(&self, title: &str, space_id: Option<&str>) -> Result<PageProperties> {
    info!(title, "looking up page by title");

    let space_key = space_id.map(|id| self.key_for_space_id(id)).transpose()?;
    let mut query = vec![("title", title), ("type", "page"), ("expand", "version,space")];
    if let Some(key) = space_key.as_deref() {
      query.push(("spaceKey", key));
    }

    let payload: serde_json::Value = self.transport.get(ApiVersion::V1, "/content", &query).await?;
    let mut results = results_array(&payload);
    if results.len() != 1 {
      return Err(Error::NotFound(format!("unique page not found with title: {title}")));
    }
    wire::page_properties_from_v1(results.remove(0))
  }

  async fn page_exists(&self, title: &str, space_id: Option<&str>) -> Result<Option<String>> {
    let space_key = space_id.map(|id| self.key_for_space_id(id)).transpose()?;
    let mut query = vec![("title", title), ("type", "page")];
    if let Some(key) = space_key.as_deref() {
      query.push(("spaceKey", key));
    }

    let payload: serde_json::Value = self.transport.get(ApiVersion::V1, "/content", &query).await?;
    let results = results_array(&payload);
    if results.len() == 1 {
      let id = results[0]
        .get("id")
        .map(|value| match value.as_str() {
          Some(text) => text.to_string(),
          None => value.to_string(),
        })
        .ok_or_else(|| Error::Decode("v1 content result is missing an id".to_string()))?;
      Ok(Some(id))
    } else {
      Ok(None)
    }
  }

  async fn create_page(&self, parent: &PageProperties, title: &str, content: &str) -> Result<Page> {
    info!(title, "creating page");

    let space_key = self.key_for_space_id(&parent.space_id)?;
    let request = CreatePageRequest {
      space_id: parent.space_id.clone(),
      status: Status::Current,
      title: title.to_string(),
      parent_id: Some(parent.id.clone()),
      body: PageBody {
        storage: PageStorage::storage(content),
      },
    };

    let body = wire::create_page_to_v1(&request, &space_key);
    let payload: serde_json::Value = self.transport.post(ApiVersion::V1, "/content", &body).await?;
    wire::page_from_v1(payload)
  }

  async fn update_page(&self, page_id: &str, content: &str, title: &str, new_version: u32) -> Result<()> {
    info!(page_id, "updating page");

    // The v1 request body must name the space by key.
    let properties = self.page_properties(page_id).await?;
    let space_key = self.key_for_space_id(&properties.space_id)?;

    let request = UpdatePageRequest {
      id: page_id.to_string(),
      status: Status::Current,
      title: title.to_string(),
      body: PageBody {
        storage: PageStorage::storage(content),
      },
      version: ContentVersion::minor(new_version),
    };

    let body = wire::update_page_to_v1(&request, &space_key);
    self
      .transport
      .put_unit(ApiVersion::V1, &format!("/content/{page_id}"), &body)
      .await
  }

  async fn delete_page(&self, page_id: &str, purge: bool) -> Result<()> {
    // v1 encodes purge as a query parameter on a single delete call.
    if purge {
      info!(page_id, "permanently deleting page");
      self
        .transport
        .delete(ApiVersion::V1, &format!("/content/{page_id}"), &[("status", "trashed")])
        .await
    } else {
      info!(page_id, "moving page to trash");
      self
        .transport
        .delete(ApiVersion::V1, &format!("/content/{page_id}"), &[])
        .await
    }
  }

  async fn attachment_by_name(&self, page_id: &str, filename: &str) -> Result<Attachment> {
    let payload: serde_json::Value = self
      .transport
      .get(
        ApiVersion::V1,
        &format!("/content/{page_id}/child/attachment"),
        &[("filename", filename)],
      )
      .await?;
    let mut results = results_array(&payload);
    if results.len() != 1 {
      return Err(Error::NotFound(format!(
        "no such attachment on page {page_id}: {filename}"
      )));
    }
    wire::attachment_from_v1(page_id, results.remove(0))
  }

  async fn labels(&self, page_id: &str) -> Result<Vec<IdentifiedLabel>> {
    let results = self.transport.fetch_v1(&format!("/content/{page_id}/label"), &[]).await?;
    results.into_iter().map(wire::label_from_v1).collect()
  }

  async fn properties(&self, page_id: &str) -> Result<Vec<IdentifiedContentProperty>> {
    let results = self
      .transport
      .fetch_v1(&format!("/content/{page_id}/property"), &[])
      .await?;
    results.into_iter().map(wire::property_from_v1).collect()
  }

  async fn add_property(&self, page_id: &str, property: &ContentProperty) -> Result<IdentifiedContentProperty> {
    let payload: serde_json::Value = self
      .transport
      .post(ApiVersion::V1, &format!("/content/{page_id}/property"), property)
      .await?;
    wire::property_from_v1(payload)
  }

  async fn update_property(
    &self,
    page_id: &str,
    property_id: &str,
    new_version: u32,
    property: &ContentProperty,
  ) -> Result<IdentifiedContentProperty> {
    // v1 addresses properties by key in the URL, not by ID; map the ID back
    // to its key through the property listing.
    let key = self.property_key_for_id(page_id, property_id).await?;

    let body = serde_json::json!({
      "key": property.key,
      "value": property.value,
      "version": {"number": new_version},
    });

    let payload: serde_json::Value = self
      .transport
      .put(ApiVersion::V1, &format!("/content/{page_id}/property/{key}"), &body)
      .await?;
    wire::property_from_v1(payload)
  }

  async fn remove_property(&self, page_id: &str, property_id: &str) -> Result<()> {
    let key = self.property_key_for_id(page_id, property_id).await?;
    self
      .transport
      .delete(ApiVersion::V1, &format!("/content/{page_id}/property/{key}"), &[])
      .await
  }
}

impl V1Api {
  /// Find the key of the property with the given ID. Costs one extra
  /// listing request per call.
  async fn property_key_for_id(&self, page_id: &str, property_id: &str) -> Result<String> {
    let properties = self.properties(page_id).await?;
    properties
      .into_iter()
      .find(|property| property.id == property_id)
      .map(|property| property.key)
      .ok_or_else(|| Error::NotFound(format!("property with ID {property_id} not found on page {page_id}")))
  }
}

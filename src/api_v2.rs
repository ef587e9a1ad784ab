//! Current `api/v2` implementation of the content operations.
//!
//! The v2 wire format is the domain model, so responses deserialize
//! directly; no field-name translation is needed here.

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

/// Content operations backed by v2 endpoints.
pub(crate) struct V2Api {
  transport: Transport,
  spaces: Arc<SpaceCache>,
}

impl V2Api {
  pub(crate) fn new(transport: Transport, spaces: Arc<SpaceCache>) -> Self {
    Self { transport, spaces }
  }

  async fn space_query(&self, param: &str, value: &str, describe: &str) -> Result<Space> {
    let payload: serde_json::Value = self
      .transport
      .get(ApiVersion::V2, "/spaces", &[(param, value), ("status", "current")])
      .await?;
    let mut results = results_array(&payload);
    if results.len() != 1 {
      return Err(Error::NotFound(format!("unique space not found with {describe}: {value}")));
    }
    let space: Space = serde_json::from_value(results.remove(0))?;
    self.spaces.insert(&space);
    Ok(space)
  }
}

#[async_trait]
impl ContentApi for V2Api {
  async fn space_by_key(&self, key: &str) -> Result<Space> {
    self.space_query("keys", key, "key").await
  }

  async fn space_by_id(&self, id: &str) -> Result<Space> {
    self.space_query("ids", id, "id").await
  }

  async fn page(&self, page_id: &str) -> Result<Page> {
    self
      .transport
      .get(ApiVersion::V2, &format!("/pages/{page_id}"), &[("body-format", "storage")])
      .await
  }

  async fn page_properties(&self, page_id: &str) -> Result<PageProperties> {
    self.transport.get(ApiVersion::V2, &format!("/pages/{page_id}"), &[]).await
  }

  async fn page_by_title(&self, title: &str, space_id: Option<&str>) -> Result<PageProperties> {
    info!(title, "looking up page by title");

    let mut query = vec![("title", title)];
    if let Some(id) = space_id {
      query.push(("space-id", id));
    }

    let payload: serde_json::Value = self.transport.get(ApiVersion::V2, "/pages", &query).await?;
    let mut results = results_array(&payload);
    if results.len() != 1 {
      return Err(Error::NotFound(format!("unique page not found with title: {title}")));
    }
    Ok(serde_json::from_value(results.remove(0))?)
  }

  async fn page_exists(&self, title: &str, space_id: Option<&str>) -> Result<Option<String>> {
    let mut query = vec![("title", title)];
    if let Some(id) = space_id {
      query.push(("space-id", id));
    }

    let payload: serde_json::Value = self.transport.get(ApiVersion::V2, "/pages", &query).await?;
    let mut results = results_array(&payload);
    if results.len() == 1 {
      let properties: PageProperties = serde_json::from_value(results.remove(0))?;
      Ok(Some(properties.id))
    } else {
      Ok(None)
    }
  }

  async fn create_page(&self, parent: &PageProperties, title: &str, content: &str) -> Result<Page> {
    info!(title, "creating page");

    let request = CreatePageRequest {
      space_id: parent.space_id.clone(),
      status: Status::Current,
      title: title.to_string(),
      parent_id: Some(parent.id.clone()),
      body: PageBody {
        storage: PageStorage::storage(content),
      },
    };

    self.transport.post(ApiVersion::V2, "/pages/", &request).await
  }

  async fn update_page(&self, page_id: &str, content: &str, title: &str, new_version: u32) -> Result<()> {
    info!(page_id, "updating page");

    let request = UpdatePageRequest {
      id: page_id.to_string(),
      status: Status::Current,
      title: title.to_string(),
      body: PageBody {
        storage: PageStorage::storage(content),
      },
      version: ContentVersion::minor(new_version),
    };

    self
      .transport
      .put_unit(ApiVersion::V2, &format!("/pages/{page_id}"), &request)
      .await
  }

  async fn delete_page(&self, page_id: &str, purge: bool) -> Result<()> {
    // v2 requires two explicit network effects: trash first, then purge.
    info!(page_id, "moving page to trash");
    self
      .transport
      .delete(ApiVersion::V2, &format!("/pages/{page_id}"), &[])
      .await?;

    if purge {
      info!(page_id, "permanently deleting page");
      self
        .transport
        .delete(ApiVersion::V2, &format!("/pages/{page_id}"), &[("purge", "true")])
        .await?;
    }

    Ok(())
  }

  async fn attachment_by_name(&self, page_id: &str, filename: &str) -> Result<Attachment> {
    let payload: serde_json::Value = self
      .transport
      .get(
        ApiVersion::V2,
        &format!("/pages/{page_id}/attachments"),
        &[("filename", filename)],
      )
      .await?;
    let mut results = results_array(&payload);
    if results.len() != 1 {
      return Err(Error::NotFound(format!(
        "no such attachment on page {page_id}: {filename}"
      )));
    }
    Ok(serde_json::from_value(results.remove(0))?)
  }

  async fn labels(&self, page_id: &str) -> Result<Vec<IdentifiedLabel>> {
    let results = self.transport.fetch_v2(&format!("/pages/{page_id}/labels"), &[]).await?;
    results
      .into_iter()
      .map(|value| serde_json::from_value(value).map_err(Error::from))
      .collect()
  }

  async fn properties(&self, page_id: &str) -> Result<Vec<IdentifiedContentProperty>> {
    let results = self
      .transport
      .fetch_v2(&format!("/pages/{page_id}/properties"), &[])
      .await?;
    results
      .into_iter()
      .map(|value| serde_json::from_value(value).map_err(Error::from))
      .collect()
  }

  async fn add_property(&self, page_id: &str, property: &ContentProperty) -> Result<IdentifiedContentProperty> {
    self
      .transport
      .post(ApiVersion::V2, &format!("/pages/{page_id}/properties"), property)
      .await
  }

  async fn update_property(
    &self,
    page_id: &str,
    property_id: &str,
    new_version: u32,
    property: &ContentProperty,
  ) -> Result<IdentifiedContentProperty> {
    let body = serde_json::json!({
      "key": property.key,
      "value": property.value,
      "version": {"number": new_version},
    });

    self
      .transport
      .put(ApiVersion::V2, &format!("/pages/{page_id}/properties/{property_id}"), &body)
      .await
  }

  async fn remove_property(&self, page_id: &str, property_id: &str) -> Result<()> {
    self
      .transport
      .delete(ApiVersion::V2, &format!("/pages/{page_id}/properties/{property_id}"), &[])
      .await
  }
}

//! Test fixtures for Confluence API responses
//!
//! This module provides realistic sample data from both REST API
//! generations for use in tests.

use serde_json::json;

/// A v2 page response with storage-format content.
pub fn v2_page(id: &str, title: &str, space_id: &str, version: u32) -> serde_json::Value {
  json!({
    "id": id,
    "status": "current",
    "title": title,
    "spaceId": space_id,
    "parentId": null,
    "authorId": "5b10ac8d82e05b22cc7d4ef5",
    "createdAt": "2024-03-18T09:31:44.735Z",
    "version": {
      "number": version,
      "minorEdit": false,
      "createdAt": "2024-05-02T14:02:11.000Z"
    },
    "body": {
      "storage": {
        "value": "<h1>Getting Started</h1><p>Welcome to our documentation!</p>",
        "representation": "storage"
      }
    },
    "_links": {
      "webui": format!("/spaces/DOCS/pages/{id}")
    }
  })
}

/// A v2 page listing envelope.
pub fn v2_page_listing(pages: Vec<serde_json::Value>) -> serde_json::Value {
  json!({
    "results": pages,
    "_links": {
      "base": "https://example.atlassian.net/wiki"
    }
  })
}

/// A v2 space listing with a single space.
pub fn v2_space_listing(id: &str, key: &str) -> serde_json::Value {
  json!({
    "results": [
      {
        "id": id,
        "key": key,
        "name": "Documentation",
        "type": "global",
        "status": "current"
      }
    ],
    "_links": {
      "base": "https://example.atlassian.net/wiki"
    }
  })
}

/// A v2 content property record.
pub fn v2_property(id: &str, key: &str, value: serde_json::Value, version: u32) -> serde_json::Value {
  json!({
    "id": id,
    "key": key,
    "value": value,
    "version": {
      "number": version,
      "minorEdit": false
    }
  })
}

/// A v1 content response with nested space, version and body objects.
pub fn v1_page(id: &str, title: &str, space_id: u64, space_key: &str, version: u32) -> serde_json::Value {
  json!({
    "id": id,
    "type": "page",
    "status": "current",
    "title": title,
    "space": {
      "id": space_id,
      "key": space_key,
      "name": "Documentation"
    },
    "ancestors": [
      { "id": "64001", "type": "page" }
    ],
    "version": {
      "number": version,
      "minorEdit": false,
      "when": "2024-05-02T14:02:11.000Z"
    },
    "history": {
      "createdDate": "2024-03-18T09:31:44.735Z"
    },
    "body": {
      "storage": {
        "value": "<h1>Getting Started</h1><p>Welcome to our documentation!</p>",
        "representation": "storage"
      }
    },
    "_links": {
      "webui": format!("/wiki/spaces/{space_key}/pages/{id}")
    }
  })
}

/// A v1 space response.
pub fn v1_space(id: u64, key: &str) -> serde_json::Value {
  json!({
    "id": id,
    "key": key,
    "name": "Documentation",
    "type": "global",
    "_links": {
      "base": "https://example.atlassian.net/wiki"
    }
  })
}

/// A v1 attachment record as returned by the child-attachment listing.
pub fn v1_attachment(id: &str, title: &str, file_size: u64, version: u32) -> serde_json::Value {
  json!({
    "id": id,
    "type": "attachment",
    "status": "current",
    "title": title,
    "extensions": {
      "mediaType": "image/png",
      "fileSize": file_size
    },
    "version": {
      "number": version,
      "minorEdit": false,
      "when": "2024-05-02T14:02:11.000Z"
    },
    "_links": {
      "download": format!("/download/attachments/65537/{title}"),
      "webui": format!("/pages/viewpageattachments.action?pageId=65537&preview={title}")
    }
  })
}

/// A v1 label record.
pub fn v1_label(id: u64, name: &str) -> serde_json::Value {
  json!({
    "prefix": "global",
    "name": name,
    "id": id,
    "label": name
  })
}

/// A v1 offset-paginated envelope reporting its own `size`.
pub fn v1_listing(results: Vec<serde_json::Value>, start: usize, limit: usize) -> serde_json::Value {
  let size = results.len();
  json!({
    "results": results,
    "start": start,
    "limit": limit,
    "size": size
  })
}

//! Confluence publishing client
//!
//! This library provides an async client for creating, updating and
//! reconciling Confluence pages, attachments, labels and content properties,
//! abstracting over the v1 (`rest/api`) and v2 (`api/v2`) REST API
//! generations behind a single session type.

mod api;
mod api_v1;
mod api_v2;
mod transport;
mod wire;

pub mod config;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod session;

pub use config::{ConnectionConfig, Deployment};
pub use error::{Error, Result};
pub use models::{
  ApiVersion, Attachment, ContentProperty, ContentVersion, IdentifiedContentProperty, IdentifiedLabel, Label, Page,
  PageBody, PageProperties, PageStorage, ParentContentType, Representation, Space, Status,
};
pub use reconcile::{LabelPlan, PropertyPlan, PropertyRemoval, PropertyUpdate};
pub use session::{AttachmentSource, Session, SiteMetadata, SpaceRef};

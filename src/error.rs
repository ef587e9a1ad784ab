//! Error taxonomy shared by every layer of the client.
//!
//! Generation-specific failures are funneled into these variants before they
//! reach the caller; callers never observe v1- or v2-specific error shapes.

use reqwest::StatusCode;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the Confluence client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// Missing or malformed connection parameters. Fatal and not retryable;
  /// indicates caller misconfiguration rather than a transient fault.
  #[error("invalid configuration: {0}")]
  Configuration(String),

  /// A space ID could not be resolved to a key. The v1 API has no direct
  /// ID-to-key lookup endpoint; the reverse direction is served only from
  /// the cache populated by a prior key-to-ID resolution.
  #[error(
    "cannot resolve space ID '{id}' to a space key with the v1 API; resolve the space by key first to populate the cache"
  )]
  SpaceResolution {
    /// The space ID that could not be resolved.
    id: String,
  },

  /// Zero or more than one match where exactly one was required, such as a
  /// page-by-title or attachment-by-name lookup.
  #[error("{0}")]
  NotFound(String),

  /// The service rejected an update because the submitted version number did
  /// not match its current state plus one. Never retried automatically.
  #[error("version conflict reported by Confluence ({status}): {body}")]
  Conflict {
    /// HTTP status returned by the service.
    status: StatusCode,
    /// Response body captured for diagnostics.
    body: String,
  },

  /// Any other non-2xx response from the service.
  #[error("Confluence API returned error {status}: {body}")]
  Remote {
    /// HTTP status returned by the service.
    status: StatusCode,
    /// Response body captured for diagnostics.
    body: String,
  },

  /// A response body was missing a structurally required field or could not
  /// be decoded into the expected shape.
  #[error("failed to decode Confluence API response: {0}")]
  Decode(String),

  /// Transport-level failure from the underlying HTTP client.
  #[error("HTTP transport error: {0}")]
  Http(#[from] reqwest::Error),

  /// Malformed URL encountered while building or following links.
  #[error("invalid URL: {0}")]
  Url(#[from] url::ParseError),

  /// Local filesystem failure while reading an attachment source.
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
  fn from(err: serde_json::Error) -> Self {
    Error::Decode(err.to_string())
  }
}

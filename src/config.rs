//! Connection configuration for a Confluence site.
//!
//! Values can be supplied programmatically or pulled from the conventional
//! `CONFLUENCE_*` environment variables. Validation happens up front so that
//! misconfiguration surfaces as a fatal error before any network traffic.

use std::env;

use crate::error::{Error, Result};

/// Confluence deployment variant, used to select the REST API generation.
///
/// Data Center and Server installations may not support v2 endpoints at all,
/// so they force the v1 API. Cloud supports v2 and prefers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deployment {
  /// Confluence Cloud (`*.atlassian.net`).
  Cloud,
  /// Self-hosted Confluence Data Center.
  DataCenter,
  /// Self-hosted Confluence Server.
  Server,
}

impl Deployment {
  /// Parse a deployment type from its textual form (case-insensitive).
  ///
  /// # Errors
  /// Returns [`Error::Configuration`] for anything other than `cloud`,
  /// `datacenter` or `server`.
  pub fn parse(value: &str) -> Result<Self> {
    match value.to_ascii_lowercase().as_str() {
      "cloud" => Ok(Deployment::Cloud),
      "datacenter" => Ok(Deployment::DataCenter),
      "server" => Ok(Deployment::Server),
      other => Err(Error::Configuration(format!(
        "invalid deployment type '{other}'; must be one of: 'cloud', 'datacenter', 'server'"
      ))),
    }
  }
}

/// How to reach and authenticate to a Confluence site.
///
/// Either `host` or an explicit `api_url` must be provided; the API key is
/// always mandatory. When `user_name` is set, requests use HTTP Basic
/// authentication; otherwise the API key is sent as a bearer token.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
  /// Host name of the Confluence instance (e.g. `example.atlassian.net`).
  /// No scheme, no trailing slash.
  pub host: Option<String>,
  /// URL scheme used to reach the host. Defaults to `https`; `http` is for
  /// self-hosted installations on a trusted network.
  pub scheme: String,
  /// Base path of the wiki, delimited by `/` on both ends. Defaults to
  /// `/wiki/` when a host is given without a path.
  pub base_path: Option<String>,
  /// Default space key used when an operation does not name a space.
  pub space_key: Option<String>,
  /// Explicit REST API root URL. Required for scoped tokens; skips
  /// discovery when present.
  pub api_url: Option<String>,
  /// User name for Basic authentication. Leave unset for bearer tokens.
  pub user_name: Option<String>,
  /// API key or token.
  pub api_key: String,
  /// Deployment variant hint driving API generation selection.
  pub deployment: Option<Deployment>,
  /// Additional HTTP headers passed on every request.
  pub headers: Vec<(String, String)>,
  /// Request timeout in seconds, enforced by the HTTP client.
  pub timeout_secs: u64,
}

/// Default wiki base path used when none is configured.
pub const DEFAULT_BASE_PATH: &str = "/wiki/";

/// Default URL scheme used to reach the host.
pub const DEFAULT_SCHEME: &str = "https";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

impl ConnectionConfig {
  /// Create a configuration with the mandatory API key and defaults for
  /// everything else.
  pub fn new(api_key: impl Into<String>) -> Self {
    Self {
      host: None,
      scheme: DEFAULT_SCHEME.to_string(),
      base_path: None,
      space_key: None,
      api_url: None,
      user_name: None,
      api_key: api_key.into(),
      deployment: None,
      headers: Vec::new(),
      timeout_secs: DEFAULT_TIMEOUT_SECS,
    }
  }

  /// Build a configuration from `CONFLUENCE_*` environment variables.
  ///
  /// Reads `CONFLUENCE_DOMAIN`, `CONFLUENCE_SCHEME`, `CONFLUENCE_PATH`,
  /// `CONFLUENCE_SPACE_KEY`, `CONFLUENCE_USER_NAME`, `CONFLUENCE_API_KEY`,
  /// `CONFLUENCE_API_URL` and `CONFLUENCE_DEPLOYMENT_TYPE`.
  ///
  /// # Errors
  /// Returns [`Error::Configuration`] when mandatory values are missing or
  /// malformed.
  pub fn from_env() -> Result<Self> {
    let api_key =
      env_var("CONFLUENCE_API_KEY").ok_or_else(|| Error::Configuration("Confluence API key not specified".into()))?;

    let deployment = match env_var("CONFLUENCE_DEPLOYMENT_TYPE") {
      Some(value) => Some(Deployment::parse(&value)?),
      None => None,
    };

    let config = Self {
      host: env_var("CONFLUENCE_DOMAIN"),
      scheme: env_var("CONFLUENCE_SCHEME").unwrap_or_else(|| DEFAULT_SCHEME.to_string()),
      base_path: env_var("CONFLUENCE_PATH"),
      space_key: env_var("CONFLUENCE_SPACE_KEY"),
      api_url: env_var("CONFLUENCE_API_URL"),
      user_name: env_var("CONFLUENCE_USER_NAME"),
      api_key,
      deployment,
      headers: Vec::new(),
      timeout_secs: DEFAULT_TIMEOUT_SECS,
    };
    config.validated()
  }

  /// Set the host name.
  pub fn with_host(mut self, host: impl Into<String>) -> Self {
    self.host = Some(host.into());
    self
  }

  /// Set the URL scheme used to reach the host.
  pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
    self.scheme = scheme.into();
    self
  }

  /// Set the wiki base path.
  pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
    self.base_path = Some(base_path.into());
    self
  }

  /// Set the default space key.
  pub fn with_space_key(mut self, space_key: impl Into<String>) -> Self {
    self.space_key = Some(space_key.into());
    self
  }

  /// Set an explicit REST API root URL.
  pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
    self.api_url = Some(api_url.into());
    self
  }

  /// Set the user name, switching authentication to HTTP Basic.
  pub fn with_user_name(mut self, user_name: impl Into<String>) -> Self {
    self.user_name = Some(user_name.into());
    self
  }

  /// Set the deployment variant hint.
  ///
  /// Without a hint the client defaults to the v2 API, which self-hosted
  /// installations may not support; supplying an explicit hint is
  /// recommended for Data Center and Server.
  pub fn with_deployment(mut self, deployment: Deployment) -> Self {
    self.deployment = Some(deployment);
    self
  }

  /// Add an extra HTTP header sent with every request.
  pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.headers.push((name.into(), value.into()));
    self
  }

  /// Set the per-request timeout in seconds.
  pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
    self.timeout_secs = timeout_secs;
    self
  }

  /// Validate the configuration, applying the default base path.
  ///
  /// # Errors
  /// Returns [`Error::Configuration`] when the API key is empty, neither a
  /// host nor an API URL is given, the host looks like a URL, or the base
  /// path is not delimited by `/`.
  pub fn validated(mut self) -> Result<Self> {
    if self.api_key.is_empty() {
      return Err(Error::Configuration("Confluence API key not specified".into()));
    }
    if self.api_url.is_none() && self.host.is_none() {
      return Err(Error::Configuration("Confluence API URL or host required".into()));
    }
    if self.scheme != "https" && self.scheme != "http" {
      return Err(Error::Configuration(format!(
        "invalid URL scheme '{}'; must be 'https' or 'http'",
        self.scheme
      )));
    }

    if let Some(host) = self.host.as_deref() {
      if host.starts_with("http://") || host.starts_with("https://") || host.ends_with('/') {
        return Err(Error::Configuration(
          "Confluence host looks like a URL; only the host name is required".into(),
        ));
      }
      if self.base_path.is_none() {
        self.base_path = Some(DEFAULT_BASE_PATH.to_string());
      }
    }

    if let Some(base_path) = self.base_path.as_deref()
      && (!base_path.starts_with('/') || !base_path.ends_with('/'))
    {
      return Err(Error::Configuration(
        "Confluence base path must start and end with a '/'".into(),
      ));
    }

    Ok(self)
  }
}

fn env_var(name: &str) -> Option<String> {
  env::var(name).ok().filter(|value| !value.is_empty())
}

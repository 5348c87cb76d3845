//! Target resolution: which server a request goes to, and under which path.
//!
//! # Design
//! The environment is never read here. The caller passes the flag value and
//! the environment value in, so precedence is a pure function and tests need
//! no process-wide state. API paths are owned by `Protocol` and nowhere else.

use tracing::debug;
use url::Url;

use crate::error::ClientError;

/// Server used when neither a flag nor the environment names one.
pub const DEFAULT_SERVER: &str = "https://shhh-encrypt.com";

/// Server API generation targeted by a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    /// Single `/api/secret` resource; create takes `expire`, `tries` and
    /// `haveibeenpwned`.
    #[default]
    Current,
    /// Split `/api/c` and `/api/r` endpoints; create takes `days`.
    Legacy,
}

impl Protocol {
    pub fn create_path(self) -> &'static str {
        match self {
            Protocol::Current => "/api/secret",
            Protocol::Legacy => "/api/c",
        }
    }

    pub fn read_path(self) -> &'static str {
        match self {
            Protocol::Current => "/api/secret",
            Protocol::Legacy => "/api/r",
        }
    }
}

/// Pick the server base URL: explicit flag, then environment, then default.
///
/// Blank values count as absent. Anything other than the default must be an
/// absolute URL with a host. The returned base has no trailing slash.
pub fn resolve(explicit: Option<&str>, env: Option<&str>) -> Result<String, ClientError> {
    let chosen = [explicit, env]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty());

    let Some(server) = chosen else {
        debug!(server = DEFAULT_SERVER, "using default server");
        return Ok(DEFAULT_SERVER.to_string());
    };

    let url = Url::parse(server).map_err(|err| ClientError::InvalidServerUrl {
        url: server.to_string(),
        reason: err.to_string(),
    })?;
    if url.host_str().filter(|host| !host.is_empty()).is_none() {
        return Err(ClientError::InvalidServerUrl {
            url: server.to_string(),
            reason: "URL has no host".to_string(),
        });
    }

    debug!(server, "using server override");
    Ok(server.trim_end_matches('/').to_string())
}

/// Split a secret link into the server origin and the slug it points at.
///
/// The origin keeps scheme, host and any explicit port; the link's path is
/// dropped apart from its last non-empty segment.
pub fn split_link(link: &str) -> Result<(String, String), ClientError> {
    let invalid = |reason: &str| ClientError::InvalidLink {
        link: link.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(link.trim()).map_err(|err| invalid(&err.to_string()))?;
    let Some(host) = url.host_str().filter(|host| !host.is_empty()) else {
        return Err(invalid("URL has no host"));
    };

    let slug = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .ok_or_else(|| invalid("URL has no slug in its path"))?;

    let origin = match url.port() {
        Some(port) => format!("{}://{host}:{port}", url.scheme()),
        None => format!("{}://{host}", url.scheme()),
    };
    Ok((origin, slug.to_string()))
}

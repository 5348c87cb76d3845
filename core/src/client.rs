//! Stateless request builder and response parser for the Shhh API.
//!
//! # Design
//! `ShhhClient` holds a server base URL and the protocol generation to speak.
//! Each operation is split into a `build_*` method producing an `HttpRequest`
//! and a `parse_*` method turning the `HttpResponse` into an `Outcome`. The
//! caller performs the round-trip in between.

use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::error::ClientError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::interpret::{interpret, Operation};
use crate::outcome::Outcome;
use crate::target::{self, Protocol};
use crate::types::CreateParams;

#[derive(Serialize)]
struct CreateBody<'a> {
    secret: &'a str,
    passphrase: &'a str,
    expire: &'a str,
    tries: u8,
    haveibeenpwned: bool,
}

#[derive(Serialize)]
struct LegacyCreateBody<'a> {
    secret: &'a str,
    passphrase: &'a str,
    days: u32,
}

#[derive(Debug, Clone)]
pub struct ShhhClient {
    base_url: String,
    protocol: Protocol,
}

impl ShhhClient {
    pub fn new(base_url: &str, protocol: Protocol) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            protocol,
        }
    }

    /// Client for the create flow: flag, then environment, then default.
    pub fn resolve(
        explicit: Option<&str>,
        env: Option<&str>,
        protocol: Protocol,
    ) -> Result<Self, ClientError> {
        let base_url = target::resolve(explicit, env)?;
        Ok(Self::new(&base_url, protocol))
    }

    /// Client for the read flow, bound to the server that issued `link`,
    /// together with the slug the link points at.
    pub fn for_link(link: &str, protocol: Protocol) -> Result<(Self, String), ClientError> {
        let (origin, slug) = target::split_link(link)?;
        Ok((Self::new(&origin, protocol), slug))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn create_url(&self) -> String {
        format!("{}{}", self.base_url, self.protocol.create_path())
    }

    /// Read endpoint without the query string.
    pub fn read_url(&self) -> String {
        format!("{}{}", self.base_url, self.protocol.read_path())
    }

    pub fn build_create_secret(&self, params: &CreateParams) -> Result<HttpRequest, ClientError> {
        let body = match self.protocol {
            Protocol::Current => serde_json::to_string(&CreateBody {
                secret: &params.secret,
                passphrase: &params.passphrase,
                expire: params.expire.as_str(),
                tries: params.tries,
                haveibeenpwned: params.check_breached,
            }),
            Protocol::Legacy => serde_json::to_string(&LegacyCreateBody {
                secret: &params.secret,
                passphrase: &params.passphrase,
                days: params.expire.days(),
            }),
        }
        .map_err(|e| ClientError::Serialization(e.to_string()))?;

        let url = self.create_url();
        debug!(%url, protocol = ?self.protocol, "built create request");
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url,
            headers: vec![
                ("content-type".to_string(), "application/json".to_string()),
                ("accept".to_string(), "application/json".to_string()),
            ],
            body: Some(body),
        })
    }

    pub fn build_read_secret(&self, slug: &str, passphrase: &str) -> Result<HttpRequest, ClientError> {
        let endpoint = self.read_url();
        let mut url = Url::parse(&endpoint).map_err(|err| ClientError::InvalidServerUrl {
            url: self.base_url.clone(),
            reason: err.to_string(),
        })?;
        url.query_pairs_mut()
            .append_pair("slug", slug)
            .append_pair("passphrase", passphrase);

        debug!(endpoint = %endpoint, protocol = ?self.protocol, "built read request");
        Ok(HttpRequest {
            method: HttpMethod::Get,
            url: url.into(),
            headers: vec![("accept".to_string(), "application/json".to_string())],
            body: None,
        })
    }

    pub fn parse_create_secret(&self, response: &HttpResponse) -> Outcome {
        interpret(Operation::Create, response)
    }

    pub fn parse_read_secret(&self, response: &HttpResponse) -> Outcome {
        interpret(Operation::Read, response)
    }
}

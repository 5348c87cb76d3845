//! Client-side errors raised before any request leaves the process.
//!
//! # Design
//! Server-side failures are not errors here: they are `Outcome` values, since
//! every response the server sends must be reported. `ClientError` only covers
//! input the core refuses to turn into a request at all.

use std::fmt;

use crate::outcome::EXIT_FAILURE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The server override (flag or environment) is not an absolute URL.
    InvalidServerUrl { url: String, reason: String },

    /// The read link is not an absolute URL or carries no slug.
    InvalidLink { link: String, reason: String },

    /// The request payload could not be serialized to JSON.
    Serialization(String),
}

impl ClientError {
    pub fn exit_code(&self) -> i32 {
        EXIT_FAILURE
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::InvalidServerUrl { url, reason } => {
                write!(f, "invalid server URL {url:?}: {reason}")
            }
            ClientError::InvalidLink { link, reason } => {
                write!(f, "invalid link {link:?}: {reason}")
            }
            ClientError::Serialization(msg) => {
                write!(f, "could not encode request: {msg}")
            }
        }
    }
}

impl std::error::Error for ClientError {}

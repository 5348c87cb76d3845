//! Wire shapes of the server's `{"response": {...}}` envelope.
//!
//! # Design
//! The server has changed its error shape over time. Rather than inspecting
//! `serde_json::Value` trees at runtime, each `status` value gets a fixed-shape
//! variant and anything else falls into `Unrecognized`. A variant whose
//! required fields are missing fails to decode, which the interpreter reports
//! as a parse failure.

use std::fmt;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub response: ResponseBody,
}

/// The nested `response` object, keyed by its `status` field.
#[derive(Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ResponseBody {
    Created {
        link: String,
        expires_on: String,
    },
    Success {
        msg: String,
    },
    /// Create errors carry `details`; read errors carry `msg`, or `details`
    /// when the query itself failed validation.
    Error {
        #[serde(default)]
        msg: Option<String>,
        #[serde(default)]
        details: Option<ErrorDetails>,
    },
    Expired {
        msg: String,
    },
    Invalid {
        msg: String,
    },
    #[serde(other)]
    Unrecognized,
}

/// `details` of an `error` response: older servers send a flat string, newer
/// ones a per-field map nested under the request location.
#[derive(Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetails {
    Message(String),
    Fields(LocatedFieldErrors),
}

/// `{"json": {...}}` for body validation, `{"query": {...}}` for query
/// string validation.
#[derive(Debug, PartialEq, Eq, Deserialize)]
pub struct LocatedFieldErrors {
    #[serde(alias = "query")]
    pub json: FieldErrors,
}

/// Field name to messages, in the order the server listed the fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<(String, Vec<String>)>);

impl FieldErrors {
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(field, _)| field.as_str())
    }

    /// The first message of every field. Fields with no messages are skipped.
    pub fn first_messages(&self) -> Vec<String> {
        self.0
            .iter()
            .filter_map(|(_, messages)| messages.first().cloned())
            .collect()
    }
}

impl<'de> Deserialize<'de> for FieldErrors {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FieldErrorsVisitor;

        impl<'de> Visitor<'de> for FieldErrorsVisitor {
            type Value = FieldErrors;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field names to lists of messages")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut fields = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((field, messages)) = map.next_entry::<String, Vec<String>>()? {
                    fields.push((field, messages));
                }
                Ok(FieldErrors(fields))
            }
        }

        deserializer.deserialize_map(FieldErrorsVisitor)
    }
}

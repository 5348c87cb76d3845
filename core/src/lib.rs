//! Protocol core for the Shhh one-time secret sharing service.
//!
//! # Overview
//! Builds `HttpRequest` values and interprets `HttpResponse` values without
//! touching the network (host-does-IO pattern). The binary executes the HTTP
//! round-trip; everything that decides what to send and what a response means
//! lives here and is deterministic.
//!
//! # Design
//! - `target` resolves the server (flag, environment, default) and splits
//!   read links into origin and slug. The environment is injected.
//! - `ShhhClient` is stateless: `build_*` produces requests, `parse_*` hands
//!   responses to `interpret`.
//! - `interpret` maps any status and body to exactly one `Outcome`.
//! - `outcome::report` renders an `Outcome` and picks the exit code.

pub mod client;
pub mod envelope;
pub mod error;
pub mod http;
pub mod interpret;
pub mod outcome;
pub mod target;
pub mod types;

pub use client::ShhhClient;
pub use error::ClientError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use interpret::{interpret, Operation};
pub use outcome::{
    report, Outcome, Report, ReportContext, Stream, EXIT_FAILURE, EXIT_SUCCESS,
    EXIT_UNKNOWN_COMMAND,
};
pub use target::{Protocol, DEFAULT_SERVER};
pub use types::{CreateParams, ExpireToken, ReadParams, DEFAULT_TRIES, TRIES_RANGE};

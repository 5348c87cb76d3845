//! The two request flows: resolve, build, send, interpret, report.

use std::fmt;

use shhh_core::{
    report, ClientError, CreateParams, Protocol, ReadParams, Report, ReportContext, ShhhClient,
};

use crate::transport::{Transport, TransportFailure};

/// Failures that end a flow before the server's answer can be interpreted.
#[derive(Debug)]
pub enum FlowError {
    Client(ClientError),
    Transport(TransportFailure),
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowError::Client(err) => write!(f, "{err}"),
            FlowError::Transport(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for FlowError {}

impl From<ClientError> for FlowError {
    fn from(err: ClientError) -> Self {
        FlowError::Client(err)
    }
}

impl From<TransportFailure> for FlowError {
    fn from(err: TransportFailure) -> Self {
        FlowError::Transport(err)
    }
}

/// Where a create goes: `--server`, then `SHHH_SERVER`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerChoice<'a> {
    pub explicit: Option<&'a str>,
    pub env: Option<&'a str>,
}

pub fn create_secret<T: Transport>(
    transport: &T,
    params: &CreateParams,
    server: ServerChoice<'_>,
    protocol: Protocol,
) -> Report {
    try_create_secret(transport, params, server, protocol).unwrap_or_else(Report::error)
}

fn try_create_secret<T: Transport>(
    transport: &T,
    params: &CreateParams,
    server: ServerChoice<'_>,
    protocol: Protocol,
) -> Result<Report, FlowError> {
    let client = ShhhClient::resolve(server.explicit, server.env, protocol)?;
    let request = client.build_create_secret(params)?;
    let response = transport.execute(&request)?;
    let outcome = client.parse_create_secret(&response);
    Ok(report(
        &outcome,
        ReportContext {
            target: &request.url,
            passphrase: &params.passphrase,
        },
    ))
}

/// Reads always go to the server named by the link.
pub fn read_secret<T: Transport>(transport: &T, params: &ReadParams, protocol: Protocol) -> Report {
    try_read_secret(transport, params, protocol).unwrap_or_else(Report::error)
}

fn try_read_secret<T: Transport>(
    transport: &T,
    params: &ReadParams,
    protocol: Protocol,
) -> Result<Report, FlowError> {
    let (client, slug) = ShhhClient::for_link(&params.link, protocol)?;
    let request = client.build_read_secret(&slug, &params.passphrase)?;
    let response = transport.execute(&request)?;
    let outcome = client.parse_read_secret(&response);
    Ok(report(
        &outcome,
        ReportContext {
            target: &client.read_url(),
            passphrase: &params.passphrase,
        },
    ))
}

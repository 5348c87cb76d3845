//! Outcomes of a request and how they are reported to the user.
//!
//! # Design
//! `Outcome` is the only thing the interpreter produces, and `report` is the
//! only thing that turns it into text. Rendering returns data (`Report`) so
//! the binary decides where to write and when to exit, and tests can assert
//! on the exact text.

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_UNKNOWN_COMMAND: i32 = 127;

/// Result of one request. Exactly one variant per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created { link: String, expires_on: String },
    ReadSuccess { message: String },
    /// Field-level rejection; first message of each field in server order.
    ValidationError { messages: Vec<String> },
    RemoteError { message: String },
    /// Status code outside the operation's allow-list.
    TransportError { http_status: u16 },
    ParseError,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Created { .. } | Outcome::ReadSuccess { .. })
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            EXIT_SUCCESS
        } else {
            EXIT_FAILURE
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Rendered form of an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub stream: Stream,
    pub lines: Vec<String>,
    pub exit_code: i32,
}

impl Report {
    pub fn error(message: impl std::fmt::Display) -> Self {
        Self {
            stream: Stream::Stderr,
            lines: vec![format!("Error: {message}")],
            exit_code: EXIT_FAILURE,
        }
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// What the reporter needs beyond the outcome itself.
#[derive(Debug, Clone, Copy)]
pub struct ReportContext<'a> {
    /// URL the request went to, named in transport errors.
    pub target: &'a str,
    /// Passphrase the caller supplied; echoed back after a create.
    pub passphrase: &'a str,
}

pub fn report(outcome: &Outcome, ctx: ReportContext<'_>) -> Report {
    let exit_code = outcome.exit_code();
    match outcome {
        Outcome::Created { link, expires_on } => Report {
            stream: Stream::Stdout,
            lines: vec![
                format!("Secret link         : {link}"),
                format!("One time passphrase : {}", ctx.passphrase),
                format!("Expires on          : {expires_on}"),
            ],
            exit_code,
        },
        Outcome::ReadSuccess { message } => Report {
            stream: Stream::Stdout,
            lines: vec![message.clone()],
            exit_code,
        },
        Outcome::ValidationError { messages } => Report {
            stream: Stream::Stderr,
            lines: messages.iter().map(|m| format!("Error: {m}")).collect(),
            exit_code,
        },
        Outcome::RemoteError { message } => Report::error(message),
        Outcome::TransportError { http_status } => Report::error(format_args!(
            "unexpected HTTP status {http_status} from {}",
            ctx.target
        )),
        Outcome::ParseError => Report::error("could not parse response from server"),
    }
}

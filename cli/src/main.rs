//! `shhh` command-line client entry point.
//!
//! Parses flags into `CreateParams` / `ReadParams`, runs exactly one flow and
//! exits with the code of the single reported outcome.
use std::ffi::OsString;

use clap::builder::NonEmptyStringValueParser;
use clap::{error::ErrorKind as ClapErrorKind, Args, Parser, Subcommand, ValueEnum};
use shhh_core::{
    CreateParams, ExpireToken, Protocol, ReadParams, Report, Stream, DEFAULT_TRIES, EXIT_SUCCESS,
    EXIT_UNKNOWN_COMMAND, TRIES_RANGE,
};

mod config;
mod flows;
mod transport;

use flows::ServerChoice;
use transport::{RetryPolicy, UreqTransport, DEFAULT_RETRIES};

/// Malformed command line (missing or invalid flag).
const EXIT_USAGE: i32 = 2;

#[derive(Parser)]
#[command(
    name = "shhh",
    version,
    about = "Share one-time secrets through a Shhh server",
    long_about = None,
    after_help = r#"EXAMPLES
  $ shhh create -m 'this is a secret msg.' -p SuperPassphrase123 -e 2d
  $ shhh read -l https://shhh-encrypt.com/r/jKD8Uy0A9_51c8asqAYL -p SuperPassphrase123

ENVIRONMENT
  SHHH_SERVER   Base URL of a self-hosted Shhh server (overridden by --server)
  SHHH_LOG      Log filter, e.g. debug (falls back to RUST_LOG)"#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        value_enum,
        default_value = "current",
        help = "Server API generation: current (/api/secret) or legacy (/api/c, /api/r)"
    )]
    protocol: ProtocolArg,

    #[arg(
        long,
        global = true,
        default_value_t = DEFAULT_RETRIES,
        help = "Retries for network failures (HTTP errors are never retried)"
    )]
    retries: u32,

    #[arg(short, long, global = true, help = "Log requests and responses to stderr")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ProtocolArg {
    Current,
    Legacy,
}

impl From<ProtocolArg> for Protocol {
    fn from(arg: ProtocolArg) -> Self {
        match arg {
            ProtocolArg::Current => Protocol::Current,
            ProtocolArg::Legacy => Protocol::Legacy,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Create a secret message.
    Create(CreateArgs),
    /// Read a secret message.
    Read(ReadArgs),
}

#[derive(Args)]
struct CreateArgs {
    #[arg(
        short = 'm',
        long = "message",
        value_parser = NonEmptyStringValueParser::new(),
        help = "Secret message to encrypt"
    )]
    secret: String,

    #[arg(
        short,
        long,
        value_parser = NonEmptyStringValueParser::new(),
        help = "Passphrase to encrypt the secret"
    )]
    passphrase: String,

    #[arg(
        short,
        long,
        default_value = "3d",
        help = "How long to keep the secret: 10m|30m|1h|3h|6h|1d|2d|3d|5d|7d"
    )]
    expire: ExpireToken,

    #[arg(
        short,
        long,
        default_value_t = DEFAULT_TRIES,
        value_parser = parse_tries,
        help = "Failed read attempts allowed before the secret is deleted (3-10)"
    )]
    tries: u8,

    #[arg(
        short = 'c',
        long = "check-pwned",
        help = "Ask the server to reject passphrases found in known data breaches"
    )]
    check_breached: bool,

    #[arg(short, long, help = "Shhh server base URL (overrides SHHH_SERVER)")]
    server: Option<String>,
}

impl CreateArgs {
    fn into_parts(self) -> (CreateParams, Option<String>) {
        let params = CreateParams {
            secret: self.secret,
            passphrase: self.passphrase,
            expire: self.expire,
            tries: self.tries,
            check_breached: self.check_breached,
        };
        (params, self.server)
    }
}

#[derive(Args)]
struct ReadArgs {
    #[arg(
        short,
        long,
        value_parser = NonEmptyStringValueParser::new(),
        help = "Link to the secret"
    )]
    link: String,

    #[arg(
        short,
        long,
        value_parser = NonEmptyStringValueParser::new(),
        help = "Passphrase to decrypt the secret"
    )]
    passphrase: String,
}

impl From<ReadArgs> for ReadParams {
    fn from(args: ReadArgs) -> Self {
        ReadParams {
            link: args.link,
            passphrase: args.passphrase,
        }
    }
}

fn parse_tries(input: &str) -> Result<u8, String> {
    let tries: u8 = input
        .trim()
        .parse()
        .map_err(|_| format!("{input:?} is not a number"))?;
    if !TRIES_RANGE.contains(&tries) {
        return Err(format!(
            "must be between {} and {}",
            TRIES_RANGE.start(),
            TRIES_RANGE.end()
        ));
    }
    Ok(tries)
}

fn main() {
    let exit_code = run(std::env::args_os());
    std::process::exit(exit_code);
}

fn run<I>(args: I) -> i32
where
    I: IntoIterator<Item = OsString>,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => return report_clap_error(&err),
    };

    config::init_tracing(cli.verbose);
    let protocol = Protocol::from(cli.protocol);
    let transport = UreqTransport::new(RetryPolicy::new(cli.retries));

    let report = match cli.command {
        Command::Create(args) => {
            let (params, server) = args.into_parts();
            let env_server = config::env_server();
            flows::create_secret(
                &transport,
                &params,
                ServerChoice {
                    explicit: server.as_deref(),
                    env: env_server.as_deref(),
                },
                protocol,
            )
        }
        Command::Read(args) => flows::read_secret(&transport, &ReadParams::from(args), protocol),
    };

    emit(&report);
    report.exit_code
}

fn report_clap_error(err: &clap::Error) -> i32 {
    let _ = err.print();
    clap_exit_code(err.kind())
}

fn clap_exit_code(kind: ClapErrorKind) -> i32 {
    match kind {
        ClapErrorKind::DisplayHelp
        | ClapErrorKind::DisplayVersion
        | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => EXIT_SUCCESS,
        ClapErrorKind::InvalidSubcommand => EXIT_UNKNOWN_COMMAND,
        _ => EXIT_USAGE,
    }
}

fn emit(report: &Report) {
    let text = report.text();
    match report.stream {
        Stream::Stdout => println!("{text}"),
        Stream::Stderr => eprintln!("{text}"),
    }
}

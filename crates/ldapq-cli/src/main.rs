//! ldapq - print the Active Directory record of an account.

mod output;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use ldapq_directory::{
    BindCredentials, DirectoryClient, DirectoryConfig, Error, ErrorKind,
    DEFAULT_OPERATION_TIMEOUT_SECS,
};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "ldapq")]
#[command(version)]
#[command(about = "Print the directory record of an account", long_about = None)]
struct Cli {
    /// Directory server address (host:port or ldaps:// URL)
    #[arg(short = 'a', long, env = "LDAPQ_ADDRESS")]
    address: String,

    /// Account suffix appended to the bind username (e.g. @corp.example)
    #[arg(short = 's', long, env = "LDAPQ_SUFFIX", default_value = "")]
    suffix: String,

    /// Search base DN
    #[arg(short = 'b', long, env = "LDAPQ_BASE_DN")]
    base_dn: String,

    /// Username to bind as
    #[arg(short = 'u', long, env = "LDAPQ_USER")]
    user: String,

    /// Password for the bind user
    #[arg(short = 'p', long, env = "LDAPQ_PASSWORD", hide_env_values = true)]
    password: String,

    /// Account name (sAMAccountName) whose record is printed
    #[arg(short = 'q', long, env = "LDAPQ_QUERY")]
    query: String,

    /// Skip TLS certificate and hostname verification
    #[arg(long, env = "LDAPQ_INSECURE")]
    insecure: bool,

    /// PEM file with the CA certificate that signed the server certificate
    #[arg(long, env = "LDAPQ_CA_CERT")]
    ca_cert: Option<PathBuf>,

    /// Connect and operation timeout in seconds
    #[arg(long, env = "LDAPQ_TIMEOUT", default_value_t = DEFAULT_OPERATION_TIMEOUT_SECS)]
    timeout: u64,

    /// Print the record as JSON
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LDAPQ_LOG_LEVEL", default_value = "warn")]
    log_level: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(true))
        .with(filter)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = DirectoryConfig::new(&cli.address, cli.base_dn, cli.suffix)?
        .with_tls_verification(!cli.insecure)
        .with_connection_timeout_secs(cli.timeout)
        .with_operation_timeout_secs(cli.timeout);
    if let Some(path) = cli.ca_cert {
        config = config.with_tls_ca_cert(path);
    }
    debug!(url = config.url(), base_dn = config.base_dn(), "querying directory");

    let client = DirectoryClient::new(config)?;
    let credentials = BindCredentials::new(cli.user, cli.password);
    let record = client
        .fetch_record(&credentials, &cli.query)
        .await
        .with_context(|| format!("looking up `{}`", cli.query))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if cli.json {
        output::write_json(&mut out, &record)?;
    } else {
        output::write_record(&mut out, &record)?;
    }
    out.flush()?;
    Ok(())
}

/// Maps a failure to the process exit status.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<Error>().map(Error::kind) {
        Some(ErrorKind::Network) => 2,
        Some(ErrorKind::Auth) => 3,
        Some(ErrorKind::Search) => 4,
        Some(ErrorKind::Format) => 5,
        Some(ErrorKind::Config) => 6,
        None => 1,
    }
}

use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::EnvFilter;

use stampgate::auth::claim::{HEADER_SALT, HEADER_TIMESTAMP, HEADER_TOKEN, HEADER_USERNAME};
use stampgate::auth::sign_request;
use stampgate::config::Config;
use stampgate::gateway;

/// Timestamp + salt + token authentication gateway.
#[derive(Parser, Debug)]
#[command(name = "stampgate", version, about)]
struct Cli {
    /// Path to a TOML config file (defaults apply when omitted).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the gateway
    Serve {
        /// Override gateway.host
        #[arg(long)]
        host: Option<String>,
        /// Override gateway.port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the auth-* headers for one request
    Sign {
        #[arg(long)]
        email: String,
        /// Hex secret hash stored for the account
        #[arg(long)]
        secret_hash: String,
        /// Request salt (random when omitted)
        #[arg(long)]
        salt: Option<String>,
        /// Request timestamp (now, RFC 3339, when omitted)
        #[arg(long)]
        ts: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stampgate=info")),
        )
        .with_timer(ChronoUtc::rfc_3339())
        .try_init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { host, port } => {
            let mut config = Config::load_or_default(cli.config.as_deref())?;
            if let Some(host) = host {
                config.gateway.host = host;
            }
            if let Some(port) = port {
                config.gateway.port = port;
            }
            gateway::run_gateway(config).await
        }
        Command::Sign {
            email,
            secret_hash,
            salt,
            ts,
        } => {
            let salt = salt.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            let ts = ts.unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));
            let headers = sign_request(&email, &secret_hash, &salt, &ts);
            println!("{HEADER_USERNAME}: {}", headers.username);
            println!("{HEADER_TIMESTAMP}: {}", headers.timestamp);
            println!("{HEADER_SALT}: {}", headers.salt);
            println!("{HEADER_TOKEN}: {}", headers.token);
            Ok(())
        }
    }
}

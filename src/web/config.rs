//! Configuration types and constants for the mingle-web server.

use std::path::PathBuf;

use clap::Parser;

/// Photos arrive base64-encoded inside the event JSON body; allow for the
/// ~4/3 encoding overhead on top of the nominal 6 MiB image limit.
pub(crate) const MAX_EVENT_BODY_SIZE: usize = 8 * 1024 * 1024;

/// Web server for the mingle social events backend.
///
/// Provides a REST API for accounts, friendships, and events with
/// friendship-graph gated visibility, and persists state in SQLite.
///
/// Configuration can be set via CLI arguments or environment variables.
/// CLI arguments take precedence over environment variables.
#[derive(Parser, Debug)]
#[command(name = "mingle-web", version, about)]
pub struct Cli {
    /// HTTP server bind address [env: MINGLE_BIND] [default: 127.0.0.1:3000]
    #[arg(long, short = 'b')]
    pub bind: Option<String>,

    /// Data directory for database and photos [env: MINGLE_HOME] [default: ~/.mingle]
    #[arg(long, short = 'd')]
    pub data_dir: Option<PathBuf>,

    /// Remote photo storage endpoint; photos are kept on local disk when
    /// unset [env: MINGLE_PHOTO_ENDPOINT]
    #[arg(long, short = 'p')]
    pub photo_endpoint: Option<String>,
}

pub struct Config {
    pub bind_addr: String,
    pub data_dir: PathBuf,
    pub photo_endpoint: Option<String>,
}

impl Config {
    pub fn from_cli_and_env(cli: Cli) -> Self {
        let data_dir = cli
            .data_dir
            .or_else(|| std::env::var("MINGLE_HOME").ok().map(PathBuf::from))
            .unwrap_or_else(|| {
                std::env::var("HOME")
                    .map(|h| PathBuf::from(h).join(".mingle"))
                    .unwrap_or_else(|_| PathBuf::from(".mingle"))
            });

        let bind_addr = cli
            .bind
            .or_else(|| std::env::var("MINGLE_BIND").ok())
            .unwrap_or_else(|| "127.0.0.1:3000".to_string());

        let photo_endpoint = cli
            .photo_endpoint
            .or_else(|| std::env::var("MINGLE_PHOTO_ENDPOINT").ok());

        Self {
            bind_addr,
            data_dir,
            photo_endpoint,
        }
    }
}

//! Command-line and environment configuration
//!
//! Every option can also be set through its environment variable; `.env.local`
//! and `.env` are loaded by `main` before parsing.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use axum::http::HeaderValue;
use category_matcher::DEFAULT_TOP_N;
use clap::{Args, Parser, Subcommand};

use crate::error::ConfigError;

/// Local frontend dev server
pub const LOCAL_ORIGIN: &str = "http://localhost:3000";
/// Deployed frontend
pub const PRODUCTION_ORIGIN: &str = "https://octave-navy.vercel.app";

#[derive(Parser, Debug)]
#[command(name = "category-server")]
#[command(about = "Recommends implicit categories from free text")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub options: ServerOptions,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the HTTP API (default)
    Serve,

    /// Rank the vocabulary against a text and print scores
    Match {
        #[arg(long, short)]
        text: String,

        #[arg(long, short = 'n')]
        top_n: Option<usize>,
    },

    /// Create an empty preference record for a user
    RegisterUser {
        #[arg(long)]
        user_id: String,
    },

    /// Print a user's stored preference record
    ShowUser {
        #[arg(long)]
        user_id: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ServerOptions {
    /// Address the HTTP API listens on
    #[arg(long, env = "CATEGORY_BIND", default_value = "127.0.0.1:5000", global = true)]
    pub bind: SocketAddr,

    /// RocksDB directory for preference records
    #[arg(
        long,
        env = "CATEGORY_DB_PATH",
        default_value = "./data/preferences",
        global = true
    )]
    pub db_path: PathBuf,

    /// Keep preference records in memory only
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Directory embedding model files are downloaded into
    #[arg(long, env = "CATEGORY_MODEL_CACHE", global = true)]
    pub model_cache: Option<PathBuf>,

    /// Allowed CORS origin (repeatable or comma separated)
    #[arg(
        long = "cors-origin",
        env = "CATEGORY_CORS_ORIGINS",
        value_delimiter = ',',
        default_values = [LOCAL_ORIGIN, PRODUCTION_ORIGIN],
        global = true
    )]
    pub cors_origins: Vec<String>,

    /// Per-request ranking timeout in seconds
    #[arg(long, default_value_t = 30, global = true)]
    pub request_timeout_secs: u64,

    /// Labels returned when a request omits topN
    #[arg(long, default_value_t = DEFAULT_TOP_N, global = true)]
    pub default_top_n: usize,
}

/// Validated server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub db_path: PathBuf,
    pub ephemeral: bool,
    pub model_cache: Option<PathBuf>,
    pub cors_origins: Vec<HeaderValue>,
    pub request_timeout: Duration,
    pub default_top_n: usize,
}

impl ServerConfig {
    pub fn from_options(options: &ServerOptions) -> Result<Self, ConfigError> {
        if options.default_top_n == 0 {
            return Err(ConfigError::InvalidValue {
                field: "default_top_n",
                value: options.default_top_n.to_string(),
            });
        }
        if options.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_secs",
                value: "0".to_string(),
            });
        }

        let cors_origins = options
            .cors_origins
            .iter()
            .map(|origin| origin.trim())
            .filter(|origin| !origin.is_empty())
            .map(|origin| {
                HeaderValue::from_str(origin).map_err(|_| ConfigError::InvalidValue {
                    field: "cors_origin",
                    value: origin.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            bind: options.bind,
            db_path: options.db_path.clone(),
            ephemeral: options.ephemeral,
            model_cache: options.model_cache.clone(),
            cors_origins,
            request_timeout: Duration::from_secs(options.request_timeout_secs),
            default_top_n: options.default_top_n,
        })
    }
}

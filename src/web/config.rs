//! Configuration types and constants for the moonclub-web server.

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;

use crate::cache::DEFAULT_TTL_SECONDS;
use crate::mlog;

/// Posts returned by `GET /api/feed`.
pub(crate) const DEFAULT_FEED_LIMIT: u32 = 50;

/// REST API server for the moonclub community site.
///
/// Resolves wallet-linked profiles against the hosted store, caches them in
/// SQLite, and serves the community feed.
///
/// Configuration can be set via CLI arguments, environment variables, or an
/// optional `config.toml` in the data directory.  CLI arguments take
/// precedence over environment variables, which take precedence over the
/// file.
#[derive(Parser, Debug)]
#[command(name = "moonclub-web", version, about)]
pub struct Cli {
    /// HTTP server bind address [env: MOONCLUB_BIND] [default: 127.0.0.1:4000]
    #[arg(long, short = 'b')]
    pub bind: Option<String>,

    /// Data directory for the local cache [env: MOONCLUB_HOME] [default: ~/.moonclub]
    #[arg(long, short = 'd')]
    pub data_dir: Option<PathBuf>,

    /// Hosted store base URL [env: MOONCLUB_STORE_URL]
    #[arg(long)]
    pub store_url: Option<String>,

    /// Hosted store API key [env: MOONCLUB_STORE_KEY]
    #[arg(long)]
    pub store_key: Option<String>,

    /// Cache freshness window in seconds [env: MOONCLUB_CACHE_TTL]
    #[arg(long)]
    pub cache_ttl: Option<u64>,

    /// Do not cache empty profile lists
    #[arg(long)]
    pub no_cache_empty: bool,
}

/// Optional `{data_dir}/config.toml` contents.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub store_url: Option<String>,
    #[serde(default)]
    pub store_key: Option<String>,
    #[serde(default)]
    pub cache_ttl_seconds: Option<u64>,
    #[serde(default)]
    pub cache_empty_results: Option<bool>,
}

pub struct Config {
    pub bind_addr: String,
    pub data_dir: PathBuf,
    pub store_url: Option<String>,
    pub store_key: Option<String>,
    pub cache_ttl_seconds: u64,
    pub cache_empty_results: bool,
}

fn load_file_config(data_dir: &Path) -> FileConfig {
    let path = data_dir.join("config.toml");
    if !path.exists() {
        return FileConfig::default();
    }
    let contents = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) => {
            mlog!("config: ignoring unreadable {}: {}", path.display(), e);
            return FileConfig::default();
        }
    };
    match toml::from_str(&contents) {
        Ok(file) => file,
        Err(e) => {
            mlog!("config: ignoring malformed {}: {}", path.display(), e);
            FileConfig::default()
        }
    }
}

impl Config {
    pub fn load(cli: Cli) -> Self {
        let data_dir = cli
            .data_dir
            .or_else(|| std::env::var("MOONCLUB_HOME").ok().map(PathBuf::from))
            .unwrap_or_else(|| {
                std::env::var("HOME")
                    .map(|h| PathBuf::from(h).join(".moonclub"))
                    .unwrap_or_else(|_| PathBuf::from(".moonclub"))
            });

        let file = load_file_config(&data_dir);

        let bind_addr = cli
            .bind
            .or_else(|| std::env::var("MOONCLUB_BIND").ok())
            .unwrap_or_else(|| "127.0.0.1:4000".to_string());

        let store_url = cli
            .store_url
            .or_else(|| std::env::var("MOONCLUB_STORE_URL").ok())
            .or(file.store_url);

        let store_key = cli
            .store_key
            .or_else(|| std::env::var("MOONCLUB_STORE_KEY").ok())
            .or(file.store_key);

        let cache_ttl_seconds = cli
            .cache_ttl
            .or_else(|| {
                std::env::var("MOONCLUB_CACHE_TTL")
                    .ok()
                    .and_then(|v| v.parse().ok())
            })
            .or(file.cache_ttl_seconds)
            .unwrap_or(DEFAULT_TTL_SECONDS);

        let cache_empty_results = if cli.no_cache_empty {
            false
        } else {
            file.cache_empty_results.unwrap_or(true)
        };

        Self {
            bind_addr,
            data_dir,
            store_url,
            store_key,
            cache_ttl_seconds,
            cache_empty_results,
        }
    }
}

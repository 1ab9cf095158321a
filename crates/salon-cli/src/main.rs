//! `salon`: command-line client for salon tables.
//!
//! Each invocation opens the on-device SQLite store, connects to the hosted
//! database, and runs a single command through the resilient accessor. Output
//! is JSON on stdout; logs go to stderr (`RUST_LOG` to adjust).
//!
//! # Usage
//!
//! ```
//! salon --url https://abc.supabase.co --api-key KEY list clients
//! salon --config ~/.config/salon/config.toml insert services '{"name":"Corte"}'
//! ```

mod app;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::{Context, Result};
use app::Command;
use clap::Parser;
use salon_core::{Accessor, AccessorConfig};
use salon_remote::{RemoteClient, RemoteConfig};
use salon_store_sqlite::SqliteStore;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "http://localhost:54321";
const DEFAULT_STORE: &str = "~/.local/share/salon/store.db";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "salon", about = "Command-line client for salon tables")]
struct Args {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the hosted database (default: http://localhost:54321).
  #[arg(long, env = "SALON_URL")]
  url: Option<String>,

  /// Public API key.
  #[arg(long, env = "SALON_API_KEY")]
  api_key: Option<String>,

  /// Session token of the signed-in user.
  #[arg(long, env = "SALON_TOKEN")]
  token: Option<String>,

  /// SQLite file for on-device storage.
  #[arg(long, env = "SALON_STORE", value_name = "PATH")]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:      Option<String>,
  #[serde(default)]
  api_key:  Option<String>,
  #[serde(default)]
  token:    Option<String>,
  #[serde(default)]
  store:    Option<PathBuf>,
  #[serde(default)]
  accessor: AccessorConfig,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let remote_cfg = RemoteConfig {
    base_url:     args
      .url
      .or(file_cfg.url)
      .unwrap_or_else(|| DEFAULT_URL.to_string()),
    api_key:      args.api_key.or(file_cfg.api_key).unwrap_or_default(),
    access_token: args.token.or(file_cfg.token),
    timeout_secs: 30,
  };
  let store_path = expand_tilde(
    &args
      .store
      .or(file_cfg.store)
      .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE)),
  );

  if let Some(dir) = store_path.parent() {
    std::fs::create_dir_all(dir)
      .with_context(|| format!("creating store directory {}", dir.display()))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let output = if args.command == Command::Tables {
    let prefix = file_cfg.accessor.storage_prefix.as_str();
    let keys = store
      .keys_with_prefix(prefix)
      .await
      .context("listing on-device tables")?;
    let tables: Vec<&str> = keys.iter().filter_map(|k| k.strip_prefix(prefix)).collect();
    serde_json::to_value(tables)?
  } else {
    let remote = Arc::new(RemoteClient::new(remote_cfg).context("failed to build remote client")?);
    let accessor = Accessor::from_shared(
      Arc::clone(&remote),
      Arc::new(store),
      remote,
      file_cfg.accessor,
    );
    app::run(&accessor, args.command).await?
  };

  if !output.is_null() {
    println!("{}", serde_json::to_string_pretty(&output)?);
  }
  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

//! `abm` — command-line front end for the ABM contact manager.
//!
//! # Usage
//!
//! ```text
//! abm contact add --name Ana --email ana@mail.com
//! abm contact edit 1 --phone 555-1234
//! abm --json contact list
//! abm user register root --password s3cret --role admin
//! abm --db ~/agenda.db schema verify
//! ```

mod commands;

use std::path::{Path, PathBuf};

use abm_store_sqlite::ConnectionProvider;
use anyhow::Context;
use clap::Parser;
use commands::{Command, Format};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "abm", author, version, about = "Contact manager backed by SQLite")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "abm.toml")]
  config: PathBuf,

  /// Database file; overrides `store_path` from the config file.
  #[arg(long, value_name = "FILE")]
  db: Option<PathBuf>,

  /// Print results as JSON.
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional config file. Every key can also be set through an
/// `ABM_`-prefixed environment variable, e.g. `ABM_STORE_PATH`.
#[derive(Debug, Deserialize)]
struct CliConfig {
  #[serde(default = "default_store_path")]
  store_path: PathBuf,
}

fn default_store_path() -> PathBuf { PathBuf::from("abm_contactos.db") }

fn load_config(path: &Path) -> anyhow::Result<CliConfig> {
  config::Config::builder()
    .add_source(config::File::from(path.to_path_buf()).required(false))
    .add_source(config::Environment::with_prefix("ABM"))
    .build()
    .context("failed to read config file")?
    .try_deserialize()
    .context("failed to deserialise CliConfig")
}

// ─── Entry point ──────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
  // Logs go to stderr so command output stays pipeable.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let cfg = load_config(&cli.config)?;
  let store_path = expand_tilde(cli.db.as_deref().unwrap_or(&cfg.store_path));

  tracing::debug!(store = %store_path.display(), "using store");
  let provider = ConnectionProvider::file(&store_path);
  provider
    .ensure_schema()
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let format = if cli.json { Format::Json } else { Format::Text };
  let stdout = std::io::stdout();
  commands::run(cli.command, &provider, format, &mut stdout.lock())
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

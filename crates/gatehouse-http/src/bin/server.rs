//! gatehouse server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite directory, selects the validator mode from configuration, and
//! serves the authenticated API over HTTP.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use clap::Parser;
use gatehouse_http::{AppState, ServerConfig, router};
use gatehouse_iap::{HttpKeySource, IdentityValidator, KeySource, PUBLIC_KEY_URL};
use gatehouse_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Upper bound on one fetch from the trusted key endpoint.
const KEY_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(author, version, about = "Gatehouse authentication server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("GATEHOUSE")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  if server_cfg.auth.auto_seed && server_cfg.auth.auto_seed_user().is_none() {
    anyhow::bail!(
      "auth.auto_seed requires auth.auto_seed_email and auth.auto_seed_name"
    );
  }

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  // Open the SQLite directory.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open directory store at {store_path:?}"))?;

  // The validator mode is fixed here for the process lifetime.
  let keys: Arc<dyn KeySource> =
    Arc::new(HttpKeySource::new(PUBLIC_KEY_URL, KEY_FETCH_TIMEOUT)?);
  let validator = IdentityValidator::from_config(&server_cfg.auth.iap_config(), keys);

  match &validator {
    IdentityValidator::Enforced(_) => {
      tracing::info!("perimeter enforcement is on");
    }
    IdentityValidator::DevFallback(_) => {
      tracing::warn!("perimeter enforcement is OFF; serving the auto-seed development identity");
    }
    IdentityValidator::Disabled => {
      tracing::warn!("perimeter enforcement is off and no auto-seed identity is configured; all requests will be rejected");
    }
  }

  let state = AppState::new(Arc::new(store), validator, server_cfg.clone())
    .context("invalid auth.mode")?;

  let app = router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

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

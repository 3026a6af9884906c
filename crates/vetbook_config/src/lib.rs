//! Configuration for the Vetbook client.
//!
//! Sources, later ones winning:
//! 1. built-in defaults (see [`models`])
//! 2. `config/default.toml`
//! 3. `config/{RUN_ENV}.toml`
//! 4. `VETBOOK__SECTION__KEY` environment variables
//! 5. secrets: `VETBOOK_SECRET_SECTION_KEY` for `"secret_from_env"` markers and
//!    for an unset `session.token`

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use std::env;
use std::path::{Path, PathBuf};

pub mod env_vars;
pub mod models;

pub use models::*;

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Loads the dotenv file once per process.
///
/// `DOTENV_OVERRIDE` picks a different file; the default is `.env` in the
/// working directory. A missing file is not an error. Returns the path tried.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path = env::var("DOTENV_OVERRIDE").unwrap_or_else(|_| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}

/// Directory holding `default.toml` and the per-environment files.
///
/// `VETBOOK_CONFIG_DIR` wins; otherwise `./config` if present, falling back to
/// the workspace's `config/` directory.
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = env::var("VETBOOK_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    let local = PathBuf::from("config");
    if local.is_dir() {
        return local;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config")
}

/// Loads the application configuration from the default locations.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();
    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());
    load_config_from(&config_dir(), &run_env)
}

/// Loads the configuration from `dir`, layering `default` and `run_env`.
pub fn load_config_from(dir: &Path, run_env: &str) -> Result<AppConfig, ConfigError> {
    let default_path = dir.join("default");
    let env_path = dir.join(run_env);

    tracing::debug!(
        "loading config from {} (env: {})",
        dir.display(),
        run_env
    );

    let builder = Config::builder()
        .add_source(File::from(default_path).required(false))
        .add_source(File::from(env_path).required(false))
        .add_source(
            Environment::with_prefix(env_vars::DEFAULT_PREFIX)
                .separator(env_vars::CONFIG_SEPARATOR),
        );

    let mut raw: serde_json::Value = builder.build()?.try_deserialize()?;
    env_vars::inject_env_vars(&mut raw);

    // Environment values stay strings; the config deserializer converts them
    // to numbers where a field asks for one.
    let mut config: AppConfig = Config::try_from(&raw)?.try_deserialize()?;
    apply_secret_overrides(&mut config);
    Ok(config)
}

/// Fills secrets that were left unset by the file and environment layers.
pub fn apply_secret_overrides(config: &mut AppConfig) {
    if config.session.token.is_none() {
        config.session.token = env_vars::get_secret_env_var("session.token");
    }
}

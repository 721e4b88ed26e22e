//! Configuration loading and env overrides.
//!
//! Config file: `carbot.toml`, searched in `./` then `~/.config/carbot/`.
//! Every secret can also arrive via environment (`CARBOT_JWT_SECRET`,
//! `CARBOT_NLU_TOKEN`, `CARBOT_MEDIA_ACCESS_KEY`), which takes precedence
//! over the file so deployments never need secrets on disk.

pub mod schema;

use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

pub use schema::{
    AuthConfig, CarbotConfig, DatabaseConfig, GatewayConfig, MediaConfig, NluConfig,
};

const CONFIG_FILENAME: &str = "carbot.toml";

static CONFIG_DIR_OVERRIDE: OnceLock<PathBuf> = OnceLock::new();
static DATA_DIR_OVERRIDE: OnceLock<PathBuf> = OnceLock::new();

/// Override the config directory (from `--config-dir`). First call wins.
pub fn set_config_dir(dir: PathBuf) {
    let _ = CONFIG_DIR_OVERRIDE.set(dir);
}

/// Override the data directory (from `--data-dir`). First call wins.
pub fn set_data_dir(dir: PathBuf) {
    let _ = DATA_DIR_OVERRIDE.set(dir);
}

/// Load config from the given TOML file.
pub fn load_config(path: &Path) -> anyhow::Result<CarbotConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let config = toml::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))?;
    Ok(config)
}

/// Discover and load config from standard locations, then apply env
/// overrides. Returns defaults when no file is found.
pub fn discover_and_load() -> CarbotConfig {
    let mut config = if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                CarbotConfig::default()
            },
        }
    } else {
        debug!("no config file found, using defaults");
        CarbotConfig::default()
    };
    apply_env_overrides(&mut config);
    config
}

/// Apply `CARBOT_*` environment overrides on top of a loaded config.
pub fn apply_env_overrides(config: &mut CarbotConfig) {
    if let Some(secret) = env_secret("CARBOT_JWT_SECRET") {
        config.auth.jwt_secret = Some(secret);
    }
    if let Some(secret) = env_secret("CARBOT_NLU_TOKEN") {
        config.nlu.token = Some(secret);
    }
    if let Some(secret) = env_secret("CARBOT_MEDIA_ACCESS_KEY") {
        config.media.access_key = Some(secret);
    }
    if let Ok(bind) = std::env::var("CARBOT_BIND")
        && !bind.trim().is_empty()
    {
        config.gateway.bind = bind;
    }
    if let Ok(port) = std::env::var("CARBOT_PORT")
        && let Ok(port) = port.trim().parse::<u16>()
    {
        config.gateway.port = port;
    }
}

fn env_secret(key: &str) -> Option<Secret<String>> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(Secret::new)
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    if let Some(dir) = CONFIG_DIR_OVERRIDE.get() {
        let p = dir.join(CONFIG_FILENAME);
        return p.exists().then_some(p);
    }

    // Project-local
    let local = PathBuf::from(CONFIG_FILENAME);
    if local.exists() {
        return Some(local);
    }

    // User-global: ~/.config/carbot/
    if let Some(dirs) = directories::ProjectDirs::from("", "", "carbot") {
        let p = dirs.config_dir().join(CONFIG_FILENAME);
        if p.exists() {
            return Some(p);
        }
    }

    None
}

/// Data directory for the SQLite database and other mutable state.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = DATA_DIR_OVERRIDE.get() {
        return dir.clone();
    }
    directories::ProjectDirs::from("", "", "carbot")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".carbot"))
}

//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.recuri/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::reveal::{DEFAULT_INTERVAL, MIN_INTERVAL};
use crate::core::state::DEFAULT_GREETING;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RecuriConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub log_file: Option<String>,
    pub log_level: Option<String>,
}

impl GeneralConfig {
    pub fn log_file(&self) -> &str {
        self.log_file.as_deref().unwrap_or(DEFAULT_LOG_FILE)
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct BackendConfig {
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UiConfig {
    pub reveal_interval_ms: Option<u64>,
    pub greeting: Option<String>,
    pub show_greeting: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ProxyConfig {
    pub bind: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_PROXY_BIND: &str = "127.0.0.1:3000";
pub const DEFAULT_LOG_FILE: &str = "recuri.log";
pub const DEFAULT_LOG_LEVEL: &str = "debug";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub backend_url: String,
    pub reveal_interval: Duration,
    /// `None` when the greeting is disabled.
    pub greeting: Option<String>,
    pub proxy_bind: String,
}

/// Values that come from command-line flags (None = not specified).
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub backend_url: Option<String>,
    pub reveal_ms: Option<u64>,
    pub proxy_bind: Option<String>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.recuri/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".recuri").join("config.toml"))
}

/// Where the loaded config came from.
///
/// Config is read before the logger exists (the logger's own settings live
/// in it), so loading stays silent and the caller reports this afterwards.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigSource {
    /// `--config <PATH>`
    Explicit(PathBuf),
    /// The existing `~/.recuri/config.toml`
    Home(PathBuf),
    /// No file existed; a commented default was written here
    Generated(PathBuf),
    /// No file existed and writing the default failed
    GenerationFailed { path: PathBuf, error: String },
    /// The home directory is unknown; built-in defaults apply
    NoHomeDir,
}

impl ConfigSource {
    /// Reports the outcome of [`load_config`] once logging is up.
    pub fn log(&self) {
        match self {
            ConfigSource::Explicit(path) | ConfigSource::Home(path) => {
                info!("Loaded config from {}", path.display());
            }
            ConfigSource::Generated(path) => {
                info!("No config file found, generated default at {}", path.display());
            }
            ConfigSource::GenerationFailed { path, error } => {
                warn!(
                    "No config file found and could not write default to {}: {}",
                    path.display(),
                    error
                );
            }
            ConfigSource::NoHomeDir => {
                warn!("Could not determine home directory, using default config");
            }
        }
    }
}

/// Load config from `explicit` or `~/.recuri/config.toml`.
///
/// A missing default file is generated (commented out) and yields
/// `RecuriConfig::default()`. A missing explicit file is an error.
/// A malformed file returns `ConfigError::Parse`.
pub fn load_config(explicit: Option<&Path>) -> Result<(RecuriConfig, ConfigSource), ConfigError> {
    load_from(explicit, config_path())
}

fn load_from(
    explicit: Option<&Path>,
    default_path: Option<PathBuf>,
) -> Result<(RecuriConfig, ConfigSource), ConfigError> {
    if let Some(path) = explicit {
        let config = read_config(path)?;
        return Ok((config, ConfigSource::Explicit(path.to_path_buf())));
    }

    let Some(path) = default_path else {
        return Ok((RecuriConfig::default(), ConfigSource::NoHomeDir));
    };

    if !path.exists() {
        let source = match generate_default_config(&path) {
            Ok(()) => ConfigSource::Generated(path),
            Err(e) => ConfigSource::GenerationFailed {
                path,
                error: e.to_string(),
            },
        };
        return Ok((RecuriConfig::default(), source));
    }

    let config = read_config(&path)?;
    Ok((config, ConfigSource::Home(path)))
}

fn read_config(path: &Path) -> Result<RecuriConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&contents).map_err(ConfigError::Parse)
}

const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Recuri Configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# log_file = "recuri.log"
# log_level = "debug"                # "error", "warn", "info", "debug", "trace", "off"

# [backend]
# base_url = "http://localhost:8000" # Or set RECURI_BACKEND_URL; point at `recuri proxy` to go through it

# [ui]
# reveal_interval_ms = 30            # Or set RECURI_REVEAL_MS
# show_greeting = true
# greeting = "Hi! Ask me anything."

# [proxy]
# bind = "127.0.0.1:3000"            # Or set RECURI_PROXY_BIND
"#;

fn generate_default_config(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, DEFAULT_CONFIG_TEMPLATE)
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &RecuriConfig, cli: &CliOverrides) -> ResolvedConfig {
    resolve_with_env(config, cli, |key| std::env::var(key).ok())
}

fn resolve_with_env(
    config: &RecuriConfig,
    cli: &CliOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    // Backend URL: CLI → env → config → default
    let backend_url = cli
        .backend_url
        .clone()
        .or_else(|| env("RECURI_BACKEND_URL"))
        .or_else(|| config.backend.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());

    // Reveal interval: CLI → env → config → default
    let reveal_ms = cli
        .reveal_ms
        .or_else(|| {
            env("RECURI_REVEAL_MS").and_then(|raw| match raw.trim().parse::<u64>() {
                Ok(ms) => Some(ms),
                Err(e) => {
                    warn!("Ignoring RECURI_REVEAL_MS={:?}: {}", raw, e);
                    None
                }
            })
        })
        .or(config.ui.reveal_interval_ms);
    let reveal_interval = match reveal_ms {
        Some(0) => {
            warn!("Reveal interval must be positive, using {:?}", MIN_INTERVAL);
            MIN_INTERVAL
        }
        Some(ms) => Duration::from_millis(ms),
        None => DEFAULT_INTERVAL,
    };

    let greeting = if config.ui.show_greeting.unwrap_or(true) {
        Some(
            config
                .ui
                .greeting
                .clone()
                .unwrap_or_else(|| DEFAULT_GREETING.to_string()),
        )
    } else {
        None
    };

    // Proxy bind: CLI → env → config → default
    let proxy_bind = cli
        .proxy_bind
        .clone()
        .or_else(|| env("RECURI_PROXY_BIND"))
        .or_else(|| config.proxy.bind.clone())
        .unwrap_or_else(|| DEFAULT_PROXY_BIND.to_string());

    ResolvedConfig {
        backend_url,
        reveal_interval,
        greeting,
        proxy_bind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let resolved = resolve_with_env(&RecuriConfig::default(), &CliOverrides::default(), no_env);
        assert_eq!(resolved.backend_url, DEFAULT_BACKEND_URL);
        assert_eq!(resolved.reveal_interval, DEFAULT_INTERVAL);
        assert_eq!(resolved.greeting.as_deref(), Some(DEFAULT_GREETING));
        assert_eq!(resolved.proxy_bind, DEFAULT_PROXY_BIND);
        let general = GeneralConfig::default();
        assert_eq!(general.log_file(), DEFAULT_LOG_FILE);
        assert_eq!(general.log_level(), DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_config_values_override_defaults() {
        let config = RecuriConfig {
            backend: BackendConfig {
                base_url: Some("http://research:9000".into()),
            },
            ui: UiConfig {
                reveal_interval_ms: Some(5),
                greeting: Some("Hello.".into()),
                show_greeting: None,
            },
            ..Default::default()
        };
        let resolved = resolve_with_env(&config, &CliOverrides::default(), no_env);
        assert_eq!(resolved.backend_url, "http://research:9000");
        assert_eq!(resolved.reveal_interval, Duration::from_millis(5));
        assert_eq!(resolved.greeting.as_deref(), Some("Hello."));
    }

    #[test]
    fn test_env_beats_config_and_cli_beats_env() {
        let config = RecuriConfig {
            backend: BackendConfig {
                base_url: Some("http://from-config".into()),
            },
            ..Default::default()
        };
        let env = |key: &str| match key {
            "RECURI_BACKEND_URL" => Some("http://from-env".to_string()),
            "RECURI_REVEAL_MS" => Some("12".to_string()),
            _ => None,
        };
        let resolved = resolve_with_env(&config, &CliOverrides::default(), env);
        assert_eq!(resolved.backend_url, "http://from-env");
        assert_eq!(resolved.reveal_interval, Duration::from_millis(12));

        let cli = CliOverrides {
            backend_url: Some("http://from-cli".into()),
            reveal_ms: Some(50),
            proxy_bind: Some("0.0.0.0:8080".into()),
        };
        let resolved = resolve_with_env(&config, &cli, env);
        assert_eq!(resolved.backend_url, "http://from-cli");
        assert_eq!(resolved.reveal_interval, Duration::from_millis(50));
        assert_eq!(resolved.proxy_bind, "0.0.0.0:8080");
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let cli = CliOverrides {
            reveal_ms: Some(0),
            ..Default::default()
        };
        let resolved = resolve_with_env(&RecuriConfig::default(), &cli, no_env);
        assert_eq!(resolved.reveal_interval, MIN_INTERVAL);
    }

    #[test]
    fn test_garbage_env_interval_is_ignored() {
        let env = |key: &str| (key == "RECURI_REVEAL_MS").then(|| "fast".to_string());
        let resolved = resolve_with_env(&RecuriConfig::default(), &CliOverrides::default(), env);
        assert_eq!(resolved.reveal_interval, DEFAULT_INTERVAL);
    }

    #[test]
    fn test_greeting_can_be_disabled() {
        let config = RecuriConfig {
            ui: UiConfig {
                show_greeting: Some(false),
                ..Default::default()
            },
            ..Default::default()
        };
        let resolved = resolve_with_env(&config, &CliOverrides::default(), no_env);
        assert_eq!(resolved.greeting, None);
    }

    #[test]
    fn test_toml_parses() {
        let toml_str = r#"
[general]
log_level = "info"

[backend]
base_url = "http://localhost:3000"

[ui]
reveal_interval_ms = 15
show_greeting = false

[proxy]
bind = "0.0.0.0:3000"
"#;
        let config: RecuriConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level(), "info");
        assert_eq!(config.general.log_file(), DEFAULT_LOG_FILE);
        assert_eq!(
            config.backend.base_url.as_deref(),
            Some("http://localhost:3000")
        );
        assert_eq!(config.ui.reveal_interval_ms, Some(15));
        assert_eq!(config.ui.show_greeting, Some(false));
        assert_eq!(config.proxy.bind.as_deref(), Some("0.0.0.0:3000"));
    }

    #[test]
    fn test_sparse_toml_parses() {
        let config: RecuriConfig = toml::from_str("[ui]\nreveal_interval_ms = 40\n").unwrap();
        assert_eq!(config.ui.reveal_interval_ms, Some(40));
        assert!(config.backend.base_url.is_none());
        assert!(config.proxy.bind.is_none());
    }

    #[test]
    fn test_default_template_parses_to_defaults() {
        let config: RecuriConfig = toml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert!(config.backend.base_url.is_none());
        assert!(config.ui.greeting.is_none());
    }

    fn scratch_config_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("recuri-config-{}", uuid::Uuid::new_v4()))
            .join("config.toml")
    }

    #[test]
    fn test_first_run_generates_default_and_reports_it() {
        let path = scratch_config_path();
        let (config, source) = load_from(None, Some(path.clone())).unwrap();
        assert_eq!(source, ConfigSource::Generated(path.clone()));
        assert!(config.backend.base_url.is_none());
        assert!(path.exists());

        // Second run reads the file it wrote
        let (_, source) = load_from(None, Some(path.clone())).unwrap();
        assert_eq!(source, ConfigSource::Home(path.clone()));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_unwritable_default_is_reported_not_fatal() {
        // A regular file where the config directory should be
        let blocker = scratch_config_path().with_file_name("blocker");
        fs::create_dir_all(blocker.parent().unwrap()).unwrap();
        fs::write(&blocker, "").unwrap();
        let path = blocker.join("config.toml");

        let (_, source) = load_from(None, Some(path.clone())).unwrap();
        assert!(matches!(source, ConfigSource::GenerationFailed { path: p, .. } if p == path));

        let _ = fs::remove_dir_all(blocker.parent().unwrap());
    }

    #[test]
    fn test_unknown_home_uses_defaults() {
        let (_, source) = load_from(None, None).unwrap();
        assert_eq!(source, ConfigSource::NoHomeDir);
    }

    #[test]
    fn test_explicit_missing_file_is_io_error() {
        let err = load_config(Some(Path::new("/definitely/not/here/recuri.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}

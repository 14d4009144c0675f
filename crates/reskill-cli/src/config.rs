//! Configuration file management for reskill.
//!
//! Provides a TOML-based config file at `~/.config/reskill/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default. Nothing
//! here embeds credentials; keys come from the environment or the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use reskill_core::GenerationConfig;
use reskill_core::identity::IdentityConfig;
use reskill_store::StoreConfig;

pub const GEMINI_API_KEY_ENV: &str = "RESKILL_GEMINI_API_KEY";
pub const GEMINI_MODEL_ENV: &str = "RESKILL_GEMINI_MODEL";
pub const FIREBASE_API_KEY_ENV: &str = "RESKILL_FIREBASE_API_KEY";
pub const DATABASE_URL_ENV: &str = "RESKILL_DATABASE_URL";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub generation: GenerationSection,
    #[serde(default)]
    pub firebase: FirebaseSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GenerationSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// API root, without the `/models/...` suffix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FirebaseSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    /// Identity Toolkit root, for emulators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_endpoint: Option<String>,
    /// Secure-token root, for emulators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_endpoint: Option<String>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the reskill config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/reskill` or `~/.config/reskill`,
/// also on macOS.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("reskill");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("reskill")
}

/// Return the path to the reskill config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    write_private(&config_path(), &contents)
}

/// Write `contents` to `path` readable by the owner only (0600 on Unix).
pub fn write_private(path: &Path, contents: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create directory {}", dir.display()))?;
    }
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration.
///
/// Keys that could not be found stay `None`; the accessors report what is
/// missing only when a command needs it, so `reskill whoami` works without a
/// generation key.
#[derive(Debug)]
pub struct ReskillConfig {
    pub generation: Option<GenerationConfig>,
    pub identity: Option<IdentityConfig>,
    pub store: StoreConfig,
}

impl ReskillConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - Database URL: `cli_database_url` > `RESKILL_DATABASE_URL` > `firebase.database_url` > emulator default
    /// - Generation key: `RESKILL_GEMINI_API_KEY` > `generation.api_key`
    /// - Generation model: `RESKILL_GEMINI_MODEL` > `generation.model` > default model
    /// - Identity key: `RESKILL_FIREBASE_API_KEY` > `firebase.api_key`
    pub fn resolve(cli_database_url: Option<&str>) -> Result<Self> {
        let path = config_path();
        let file = if path.exists() {
            load_config()?
        } else {
            ConfigFile::default()
        };
        Ok(Self::from_file(file, cli_database_url))
    }

    fn from_file(file: ConfigFile, cli_database_url: Option<&str>) -> Self {
        let ConfigFile {
            generation: gen_file,
            firebase,
        } = file;

        let generation = env_value(GEMINI_API_KEY_ENV)
            .or(gen_file.api_key)
            .map(|key| {
                let mut config = GenerationConfig::new(key);
                if let Some(model) = env_value(GEMINI_MODEL_ENV).or(gen_file.model) {
                    config.model = model;
                }
                if let Some(endpoint) = gen_file.endpoint {
                    config.endpoint = endpoint;
                }
                config
            });

        let identity = env_value(FIREBASE_API_KEY_ENV)
            .or(firebase.api_key)
            .map(|key| {
                let mut config = IdentityConfig::new(key);
                if let Some(endpoint) = firebase.identity_endpoint {
                    config.endpoint = endpoint;
                }
                if let Some(endpoint) = firebase.token_endpoint {
                    config.token_endpoint = endpoint;
                }
                config
            });

        let database_url = cli_database_url
            .map(str::to_string)
            .or_else(|| env_value(DATABASE_URL_ENV))
            .or(firebase.database_url)
            .unwrap_or_else(|| StoreConfig::DEFAULT_URL.to_string());

        Self {
            generation,
            identity,
            store: StoreConfig::new(database_url),
        }
    }

    pub fn generation(&self) -> Result<&GenerationConfig> {
        match &self.generation {
            Some(config) => Ok(config),
            None => bail!(
                "generation API key not found; set {GEMINI_API_KEY_ENV} or run `reskill init`"
            ),
        }
    }

    pub fn identity(&self) -> Result<&IdentityConfig> {
        match &self.identity {
            Some(config) => Ok(config),
            None => bail!(
                "Firebase API key not found; set {FIREBASE_API_KEY_ENV} or run `reskill init`"
            ),
        }
    }
}

/// A non-blank environment variable.
fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::TempConfigHome;

    fn sample_file() -> ConfigFile {
        ConfigFile {
            generation: GenerationSection {
                api_key: Some("gem-file".into()),
                model: Some("gemini-file".into()),
                endpoint: Some("http://127.0.0.1:1/v1beta".into()),
            },
            firebase: FirebaseSection {
                api_key: Some("fb-file".into()),
                database_url: Some("https://file-default-rtdb.firebaseio.com".into()),
                identity_endpoint: None,
                token_endpoint: None,
            },
        }
    }

    #[test]
    fn save_and_load_config_roundtrip() {
        let _home = TempConfigHome::new();
        save_config(&sample_file()).unwrap();

        let loaded = load_config().unwrap();
        assert_eq!(loaded.generation.api_key.as_deref(), Some("gem-file"));
        assert_eq!(loaded.generation.model.as_deref(), Some("gemini-file"));
        assert_eq!(
            loaded.firebase.database_url.as_deref(),
            Some("https://file-default-rtdb.firebaseio.com")
        );
        assert!(loaded.firebase.identity_endpoint.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn save_config_sets_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let _home = TempConfigHome::new();
        save_config(&sample_file()).unwrap();

        let meta = std::fs::metadata(config_path()).unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o600);
    }

    #[test]
    fn partial_file_parses() {
        let file: ConfigFile = toml::from_str("[generation]\napi_key = \"k\"\n").unwrap();
        assert_eq!(file.generation.api_key.as_deref(), Some("k"));
        assert!(file.firebase.api_key.is_none());
    }

    #[test]
    fn resolve_with_nothing_set() {
        let _home = TempConfigHome::new();

        let config = ReskillConfig::resolve(None).unwrap();
        assert_eq!(config.store.database_url, StoreConfig::DEFAULT_URL);
        assert!(config.generation.is_none());

        let msg = config.generation().unwrap_err().to_string();
        assert!(msg.contains(GEMINI_API_KEY_ENV), "unexpected error: {msg}");
        let msg = config.identity().unwrap_err().to_string();
        assert!(msg.contains(FIREBASE_API_KEY_ENV), "unexpected error: {msg}");
    }

    #[test]
    fn resolve_reads_config_file() {
        let _home = TempConfigHome::new();
        save_config(&sample_file()).unwrap();

        let config = ReskillConfig::resolve(None).unwrap();
        let generation = config.generation().unwrap();
        assert_eq!(generation.api_key, "gem-file");
        assert_eq!(generation.model, "gemini-file");
        assert_eq!(generation.endpoint, "http://127.0.0.1:1/v1beta");
        assert_eq!(config.identity().unwrap().api_key, "fb-file");
        assert_eq!(
            config.identity().unwrap().endpoint,
            IdentityConfig::DEFAULT_ENDPOINT
        );
        assert_eq!(
            config.store.database_url,
            "https://file-default-rtdb.firebaseio.com"
        );
    }

    #[test]
    fn env_vars_override_config_file() {
        let _home = TempConfigHome::new();
        save_config(&sample_file()).unwrap();

        unsafe { std::env::set_var(GEMINI_API_KEY_ENV, "gem-env") };
        unsafe { std::env::set_var(GEMINI_MODEL_ENV, "gemini-env") };
        unsafe { std::env::set_var(FIREBASE_API_KEY_ENV, "fb-env") };
        unsafe { std::env::set_var(DATABASE_URL_ENV, "http://127.0.0.1:9999") };

        let config = ReskillConfig::resolve(None).unwrap();
        assert_eq!(config.generation().unwrap().api_key, "gem-env");
        assert_eq!(config.generation().unwrap().model, "gemini-env");
        assert_eq!(config.identity().unwrap().api_key, "fb-env");
        assert_eq!(config.store.database_url, "http://127.0.0.1:9999");
    }

    #[test]
    fn cli_flag_overrides_all() {
        let _home = TempConfigHome::new();
        save_config(&sample_file()).unwrap();
        unsafe { std::env::set_var(DATABASE_URL_ENV, "http://127.0.0.1:9999") };

        let config = ReskillConfig::resolve(Some("http://127.0.0.1:7777")).unwrap();
        assert_eq!(config.store.database_url, "http://127.0.0.1:7777");
    }

    #[test]
    fn blank_env_var_is_ignored() {
        let _home = TempConfigHome::new();
        save_config(&sample_file()).unwrap();
        unsafe { std::env::set_var(GEMINI_API_KEY_ENV, "  ") };

        let config = ReskillConfig::resolve(None).unwrap();
        assert_eq!(config.generation().unwrap().api_key, "gem-file");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let _home = TempConfigHome::new();
        write_private(&config_path(), "generation = 3").unwrap();

        let err = ReskillConfig::resolve(None).unwrap_err();
        assert!(
            format!("{err:#}").contains("failed to parse config file"),
            "unexpected error: {err:#}"
        );
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let _home = TempConfigHome::new();
        let path = config_path();
        assert!(
            path.ends_with("reskill/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}

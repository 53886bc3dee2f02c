//! Credential and configuration loading.
//!
//! Credentials come from three layers, highest precedence first: CLI
//! flags, environment variables (`EVALGATE_API_KEY`, `EVALGATE_SECRET_KEY`,
//! `EVALGATE_BASE_URL`), and an optional TOML config file. A credential
//! missing from all three layers is a fatal startup condition.

pub mod schema;

pub use schema::{Credentials, FileConfig};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_API_KEY: &str = "EVALGATE_API_KEY";
pub const ENV_SECRET_KEY: &str = "EVALGATE_SECRET_KEY";
pub const ENV_BASE_URL: &str = "EVALGATE_BASE_URL";

/// Fatal startup configuration error. The process must exit non-zero
/// without serving any call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing credential: {0} (set via CLI flag, {1}, or the config file)")]
    MissingCredential(&'static str, &'static str),
}

/// Default evalgate home directory (~/.evalgate).
pub fn default_home_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().join(".evalgate"))
        .unwrap_or_else(|| PathBuf::from(".evalgate"))
}

/// Default config file path (~/.evalgate/evalgate.toml).
pub fn default_config_path() -> PathBuf {
    default_home_dir().join("evalgate.toml")
}

/// Resolve a path that may contain `~` to an absolute path.
pub fn resolve_path(path: &str) -> String {
    shellexpand::tilde(path).into_owned()
}

/// Load the config file from the given path, or return defaults if it
/// does not exist.
pub fn load_file_config(path: &Path) -> Result<FileConfig> {
    if path.exists() {
        let contents =
            std::fs::read_to_string(path).context("Failed to read evalgate config file")?;
        let config: FileConfig =
            toml::from_str(&contents).context("Failed to parse evalgate config (TOML)")?;
        Ok(config)
    } else {
        Ok(FileConfig::default())
    }
}

/// Merge the three layers into resolved credentials.
///
/// `flags` holds the CLI-supplied values (None when the flag was omitted);
/// environment variables fill the gaps, then the config file. An empty
/// string counts as unset at every layer.
pub fn resolve_credentials(
    flag_api_key: Option<&str>,
    flag_secret_key: Option<&str>,
    flag_base_url: Option<&str>,
    file: &FileConfig,
) -> Result<Credentials, ConfigError> {
    let api_key = first_set(flag_api_key, ENV_API_KEY, &file.api_key)
        .ok_or(ConfigError::MissingCredential("api key", ENV_API_KEY))?;
    let secret_key = first_set(flag_secret_key, ENV_SECRET_KEY, &file.secret_key)
        .ok_or(ConfigError::MissingCredential("secret key", ENV_SECRET_KEY))?;
    let base_url = first_set(flag_base_url, ENV_BASE_URL, &file.base_url)
        .ok_or(ConfigError::MissingCredential("base URL", ENV_BASE_URL))?;

    Ok(Credentials {
        api_key,
        secret_key,
        base_url: base_url.trim_end_matches('/').to_string(),
    })
}

fn first_set(flag: Option<&str>, env_var: &str, file_value: &str) -> Option<String> {
    if let Some(value) = flag.filter(|v| !v.is_empty()) {
        return Some(value.to_string());
    }
    if let Ok(value) = std::env::var(env_var) {
        if !value.is_empty() {
            return Some(value);
        }
    }
    if !file_value.is_empty() {
        return Some(file_value.to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// These tests read the process environment; make sure stray
    /// EVALGATE_* variables cannot leak into the assertions.
    fn clear_env() {
        std::env::remove_var(ENV_API_KEY);
        std::env::remove_var(ENV_SECRET_KEY);
        std::env::remove_var(ENV_BASE_URL);
    }

    #[test]
    fn flags_take_precedence_over_file() {
        clear_env();
        let file = FileConfig {
            api_key: "file-key".into(),
            secret_key: "file-secret".into(),
            base_url: "https://file.example".into(),
            log_level: String::new(),
        };
        let creds =
            resolve_credentials(Some("flag-key"), None, Some("https://flag.example/"), &file)
                .unwrap();
        assert_eq!(creds.api_key, "flag-key");
        assert_eq!(creds.secret_key, "file-secret");
        // Trailing slash is trimmed so adapters can join paths.
        assert_eq!(creds.base_url, "https://flag.example");
    }

    #[test]
    fn missing_credential_is_fatal() {
        clear_env();
        let err = resolve_credentials(Some("k"), Some("s"), None, &FileConfig::default())
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingCredential("base URL", ENV_BASE_URL)
        );
    }

    #[test]
    fn empty_flag_counts_as_unset() {
        clear_env();
        let file = FileConfig {
            api_key: "file-key".into(),
            ..FileConfig::default()
        };
        let creds = resolve_credentials(Some(""), Some("s"), Some("https://x"), &file).unwrap();
        assert_eq!(creds.api_key, "file-key");
    }

    #[test]
    fn file_config_parses_and_defaults() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "api_key = \"abc\"\nbase_url = \"https://api.example\"").unwrap();

        let config = load_file_config(tmp.path()).unwrap();
        assert_eq!(config.api_key, "abc");
        assert_eq!(config.secret_key, "");

        let missing = load_file_config(Path::new("/nonexistent/evalgate.toml")).unwrap();
        assert_eq!(missing.api_key, "");
    }
}

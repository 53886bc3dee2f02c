//! Configuration schema for evalgate.toml (TOML-based).

use serde::{Deserialize, Serialize};

/// Optional on-disk configuration. Every field may be omitted; values act
/// as the lowest-precedence layer under environment variables and CLI
/// flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Evaluation platform API key.
    pub api_key: String,

    /// Evaluation platform secret key.
    pub secret_key: String,

    /// Evaluation platform base URL.
    pub base_url: String,

    /// Log level (debug, info, warn, error).
    pub log_level: String,
}

/// Resolved process-wide credentials. Constructed once at startup and
/// passed by reference to every platform adapter; never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub secret_key: String,
    pub base_url: String,
}

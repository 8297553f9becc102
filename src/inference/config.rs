//! Client configuration loading.
//!
//! An optional YAML file supplies defaults for the CLI flags. Lookup order is
//! an explicit path, then `LLAMA_CLIENT_CONFIG`, then
//! `<config dir>/llama-client/config.yaml`. String values may reference
//! environment variables as `${VAR}` or `${VAR:-default}`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use super::errors::InferenceError;

/// Server address used when nothing else is configured.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "LLAMA_CLIENT_CONFIG";

// ─── Public Types ────────────────────────────────────────────────────────────

/// Immutable settings every client operation reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Scheme, host and port, without a trailing `/`.
    pub base_url: String,
    /// Total timeout for chat, completion and model listing. `None` waits
    /// indefinitely; the health check always uses its own bound.
    pub request_timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout: None,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Join an endpoint path onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_URL)
    }
}

/// Contents of the optional config file. Every key may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

// ─── Loading ─────────────────────────────────────────────────────────────────

/// Locate the config file.
///
/// An explicit path (flag or env var) must exist. The platform default is
/// optional, so `Ok(None)` means "no file, use built-in defaults".
pub fn find_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>, InferenceError> {
    let explicit = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

    if let Some(path) = explicit {
        if path.exists() {
            return Ok(Some(path));
        }
        return Err(InferenceError::ConfigError {
            reason: format!("config file {} does not exist", path.display()),
        });
    }

    Ok(dirs::config_dir()
        .map(|dir| dir.join("llama-client").join("config.yaml"))
        .filter(|candidate| candidate.exists()))
}

/// Load and parse a config file, interpolating environment variables.
pub fn load_config_file(path: &Path) -> Result<FileConfig, InferenceError> {
    let raw = std::fs::read_to_string(path).map_err(|e| InferenceError::ConfigError {
        reason: format!("failed to read {}: {e}", path.display()),
    })?;

    parse_config(&raw).map_err(|e| InferenceError::ConfigError {
        reason: format!("failed to parse {}: {e}", path.display()),
    })
}

/// Find and load the config file, or fall back to an empty one.
pub fn load_file_config(explicit: Option<&Path>) -> Result<FileConfig, InferenceError> {
    match find_config_path(explicit)? {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config file");
            load_config_file(&path)
        }
        None => Ok(FileConfig::default()),
    }
}

fn parse_config(raw: &str) -> Result<FileConfig, serde_yaml::Error> {
    if raw.trim().is_empty() {
        return Ok(FileConfig::default());
    }
    serde_yaml::from_str(&interpolate_env_vars(raw))
}

// ─── Env-var interpolation ───────────────────────────────────────────────────

/// Replace `${VAR}` and `${VAR:-default}` in a string.
fn interpolate_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next();
            let mut var_expr = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_expr.push(c);
            }
            result.push_str(&resolve_var_expr(&var_expr));
        } else {
            result.push(ch);
        }
    }

    result
}

fn resolve_var_expr(expr: &str) -> String {
    match expr.split_once(":-") {
        Some((var_name, default)) => {
            std::env::var(var_name).unwrap_or_else(|_| expand_tilde(default))
        }
        None => std::env::var(expr).unwrap_or_default(),
    }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return format!("{}{rest}", home.display());
        }
    }
    path.to_string()
}

// ─── Tests ───────────────────────────────────────────────────────────────────

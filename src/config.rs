use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::error;

const DEFAULT_PORT: u16 = 10000;
const DEFAULT_PROVIDER_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_PROVIDER_MODEL: &str = "gpt-4.1";
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 120;
const DEFAULT_PROVIDER_MAX_TOKENS: u32 = 32_000;
const DEFAULT_PROVIDER_MAX_ATTEMPTS: u32 = 3;

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

// ─── ProviderConfig ───────────────────────────────────────────────────────────

/// Synthesis provider configuration (`[provider]` in config.toml).
///
/// The API key is deliberately not part of the file — it is read from the
/// `OPENAI_API_KEY` environment variable only.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of the chat-completions API (default: https://api.openai.com/v1).
    pub base_url: String,
    /// Model ID sent with every synthesis request (default: gpt-4.1).
    pub model: String,
    /// Hard timeout on a single provider call in seconds (default: 120).
    pub timeout_secs: u64,
    /// Maximum tokens the provider may generate per call (default: 32000).
    pub max_tokens: u32,
    /// Attempts per synthesis call, including the first (default: 3).
    /// Only provider failures are retried; set to 1 to disable retries.
    pub max_attempts: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PROVIDER_BASE_URL.to_string(),
            model: DEFAULT_PROVIDER_MODEL.to_string(),
            timeout_secs: DEFAULT_PROVIDER_TIMEOUT_SECS,
            max_tokens: DEFAULT_PROVIDER_MAX_TOKENS,
            max_attempts: DEFAULT_PROVIDER_MAX_ATTEMPTS,
        }
    }
}

// ─── TOML config file ─────────────────────────────────────────────────────────

/// `{data_dir}/config.toml` — all fields are optional overrides.
/// Priority: CLI / env var  >  TOML  >  built-in default.
#[derive(Deserialize, Default)]
struct TomlConfig {
    /// REST server port (default: 10000).
    port: Option<u16>,
    /// Bind address for the REST server (default: "127.0.0.1"; use "0.0.0.0" for LAN access).
    bind_address: Option<String>,
    /// Log level filter string, e.g. "debug", "info,forged=trace" (default: "info").
    log: Option<String>,
    /// Log output format: "pretty" (default, human-readable) | "json" (structured for log aggregators).
    log_format: Option<String>,
    /// Directory generated projects are written under (default: `{data_dir}/projects`).
    projects_dir: Option<PathBuf>,
    /// Synthesis provider configuration (`[provider]`).
    provider: Option<ProviderConfig>,
}

fn load_toml(data_dir: &Path) -> Option<TomlConfig> {
    let path = data_dir.join("config.toml");
    let contents = std::fs::read_to_string(&path).ok()?;
    match toml::from_str::<TomlConfig>(&contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            error!(path = %path.display(), err = %e, "failed to parse config.toml — using defaults");
            None
        }
    }
}

// ─── DaemonConfig ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub port: u16,
    pub data_dir: PathBuf,
    /// Root under which every project directory is allocated.
    pub projects_dir: PathBuf,
    pub log: String,
    /// Bind address for the REST server (FORGED_BIND env var, default: "127.0.0.1").
    pub bind_address: String,
    /// Log output format: "pretty" (default) | "json".
    pub log_format: String,
    /// Synthesis provider settings (base URL, model, timeout, retry budget).
    pub provider: ProviderConfig,
    /// Provider API key (OPENAI_API_KEY env var). None means generation
    /// cannot start — checked at startup, not per request.
    pub api_key: Option<String>,
    /// Token for optional post-generation GitHub uploads (GITHUB_TOKEN env var).
    /// None disables the upload step entirely.
    pub github_token: Option<String>,
}

impl DaemonConfig {
    /// Build config from CLI/env args + optional TOML file.
    ///
    /// Priority (highest to lowest):
    ///   1. CLI / env — passed as `Some(value)` from clap
    ///   2. TOML file at `{data_dir}/config.toml`
    ///   3. Built-in defaults
    pub fn new(
        port: Option<u16>,
        data_dir: Option<PathBuf>,
        log: Option<String>,
        bind_address: Option<String>,
        projects_dir: Option<PathBuf>,
    ) -> Self {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);

        // Load TOML as the lowest-priority override layer
        let toml = load_toml(&data_dir).unwrap_or_default();

        let port = port.or(toml.port).unwrap_or(DEFAULT_PORT);
        let log = log.or(toml.log).unwrap_or_else(|| "info".to_string());

        let bind_address = bind_address
            .or(std::env::var("FORGED_BIND").ok().filter(|s| !s.is_empty()))
            .or(toml.bind_address)
            .unwrap_or_else(default_bind_address);

        let log_format = std::env::var("FORGED_LOG_FORMAT")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.log_format)
            .unwrap_or_else(|| "pretty".to_string());

        let projects_dir = projects_dir
            .or(toml.projects_dir)
            .unwrap_or_else(|| data_dir.join("projects"));

        let provider = toml.provider.unwrap_or_default();

        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|s| !s.is_empty());

        let github_token = std::env::var("GITHUB_TOKEN")
            .ok()
            .filter(|s| !s.is_empty());

        Self {
            port,
            data_dir,
            projects_dir,
            log,
            bind_address,
            log_format,
            provider,
            api_key,
            github_token,
        }
    }
}

fn default_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        // ~/Library/Application Support/forged
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("forged");
        }
    }
    #[cfg(target_os = "linux")]
    {
        // $XDG_DATA_HOME/forged or ~/.local/share/forged
        if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join("forged");
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join(".local")
                .join("share")
                .join("forged");
        }
    }
    #[cfg(target_os = "windows")]
    {
        // %APPDATA%\forged
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata).join("forged");
        }
    }
    // Fallback
    PathBuf::from(".forged")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_nothing_is_configured() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = DaemonConfig::new(None, Some(dir.path().to_path_buf()), None, None, None);

        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.log, "info");
        assert_eq!(cfg.projects_dir, dir.path().join("projects"));
        assert_eq!(cfg.provider.max_attempts, DEFAULT_PROVIDER_MAX_ATTEMPTS);
    }

    #[test]
    fn cli_beats_toml_beats_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "port = 4400\nlog = \"debug\"\n\n[provider]\nmodel = \"gpt-4o-mini\"\n",
        )
        .unwrap();

        // CLI port wins over TOML; TOML log wins over the default.
        let cfg = DaemonConfig::new(
            Some(5500),
            Some(dir.path().to_path_buf()),
            None,
            None,
            None,
        );
        assert_eq!(cfg.port, 5500);
        assert_eq!(cfg.log, "debug");
        assert_eq!(cfg.provider.model, "gpt-4o-mini");
        // Unset provider fields keep their defaults.
        assert_eq!(cfg.provider.max_tokens, DEFAULT_PROVIDER_MAX_TOKENS);
    }

    #[test]
    fn malformed_toml_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "port = \"not a number\"").unwrap();

        let cfg = DaemonConfig::new(None, Some(dir.path().to_path_buf()), None, None, None);
        assert_eq!(cfg.port, DEFAULT_PORT);
    }
}

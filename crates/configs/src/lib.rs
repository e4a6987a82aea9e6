use std::fmt;

use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub neynar: NeynarConfig,
    #[serde(default)]
    pub app: AppIdentityConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_worker_threads")]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port(), worker_threads: default_worker_threads() }
    }
}

/// Connection pool for the Neynar API. Both fields are required.
#[derive(Clone, Deserialize, Default)]
pub struct NeynarConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Application identity used to sign key requests. Optional at startup;
/// the connect endpoint refuses to run without it.
#[derive(Clone, Deserialize, Default)]
pub struct AppIdentityConfig {
    #[serde(default)]
    pub fid: Option<u64>,
    #[serde(default)]
    pub mnemonic: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// File backing the signer cache; empty keeps it in memory.
    #[serde(default = "default_cache_path")]
    pub path: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { path: default_cache_path() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { format: default_log_format() }
    }
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8080 }
fn default_worker_threads() -> Option<usize> { Some(4) }
fn default_timeout() -> u64 { 10 }
fn default_cache_path() -> String { "data/signers.json".to_string() }
fn default_log_format() -> String { "compact".to_string() }

impl fmt::Debug for NeynarConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NeynarConfig")
            .field("api_key", &redact(&self.api_key))
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl fmt::Debug for AppIdentityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppIdentityConfig")
            .field("fid", &self.fid)
            .field("mnemonic", &self.mnemonic.as_deref().map(redact))
            .finish()
    }
}

fn redact(s: &str) -> &'static str {
    if s.is_empty() { "<unset>" } else { "<redacted>" }
}

fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` when present, overlay process env vars, validate.
    pub fn load_and_validate() -> Result<Self> {
        let path = config_path();
        let mut cfg = if std::path::Path::new(&path).exists() {
            load_from_file(&path)?
        } else {
            AppConfig::default()
        };
        cfg.apply_env_with(|key| std::env::var(key).ok())?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Overlay values from an env-like lookup. Non-empty values win over the file.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("SERVER_HOST") { self.server.host = v; }
        if let Some(v) = get("SERVER_PORT") {
            self.server.port = v.trim().parse().map_err(|_| anyhow!("SERVER_PORT is not a valid port: {v}"))?;
        }
        if let Some(v) = get("TOKIO_WORKER_THREADS") {
            let threads = v
                .trim()
                .parse::<usize>()
                .map_err(|_| anyhow!("TOKIO_WORKER_THREADS must be a positive integer: {v}"))?;
            self.server.worker_threads = Some(threads);
        }
        if let Some(v) = get("NEYNAR_API_KEY") { self.neynar.api_key = v; }
        if let Some(v) = get("NEYNAR_ENDPOINT") { self.neynar.endpoint = v; }
        if let Some(v) = get("APP_FID") {
            let fid = v.trim().parse::<u64>().map_err(|_| anyhow!("APP_FID must be an unsigned integer"))?;
            self.app.fid = Some(fid);
        }
        if let Some(v) = get("APP_MNEMONIC") { self.app.mnemonic = Some(v); }
        if let Some(v) = lookup("SIGNER_CACHE_PATH") { self.cache.path = v; }
        if let Some(v) = get("LOG_FORMAT") { self.log.format = v; }
        Ok(())
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.neynar.normalize_and_validate()?;
        self.app.normalize();
        self.cache.path = self.cache.path.trim().to_string();
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = default_host();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(w) if w > 0 => {}
            _ => self.worker_threads = default_worker_threads(),
        }
        Ok(())
    }
}

impl NeynarConfig {
    fn normalize_and_validate(&mut self) -> Result<()> {
        self.api_key = self.api_key.trim().to_string();
        self.endpoint = self.endpoint.trim().trim_end_matches('/').to_string();
        if self.api_key.is_empty() || self.endpoint.is_empty() {
            return Err(anyhow!("Environment variables not set: NEYNAR_API_KEY and NEYNAR_ENDPOINT are required"));
        }
        let lower = self.endpoint.to_lowercase();
        if !(lower.starts_with("http://") || lower.starts_with("https://")) {
            return Err(anyhow!("neynar.endpoint must start with http:// or https://"));
        }
        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout();
        }
        Ok(())
    }
}

impl AppIdentityConfig {
    fn normalize(&mut self) {
        self.mnemonic = self
            .mnemonic
            .take()
            .map(|m| m.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|m| !m.is_empty());
    }

    /// Both identity values, or `None` when either is missing.
    pub fn identity(&self) -> Option<(u64, &str)> {
        match (self.fid, self.mnemonic.as_deref()) {
            (Some(fid), Some(m)) => Some((fid, m)),
            _ => None,
        }
    }
}

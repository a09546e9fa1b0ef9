//! # Gateway Configuration
//!
//! Konfigurasi dibaca dari environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `OPS_GATEWAY_HOST` | `127.0.0.1` |
//! | `OPS_GATEWAY_PORT` | `8787` |
//! | `OPS_GATEWAY_CLUSTER_ID` | `oak-local-a` |
//! | `OPS_GATEWAY_MODE` | `static` |
//! | `OPS_UPSTREAM_BASE` | `http://127.0.0.1:8090` |
//! | `OPS_UPSTREAM_CACHE_TTL_MS` | `10000` |
//! | `OPS_UPSTREAM_CACHE_MAX_ENTRIES` | `512` |
//! | `OPS_UPSTREAM_TIMEOUT_MS` | `5000` |
//! | `OPS_CHAIN_MODE` / `OAK_CHAIN_MODE` / `BLOCKCHAIN_MODE` | `mock` |

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_CACHE_TTL_MS};
use crate::error::ConfigError;

pub const DEFAULT_LISTEN_HOST: &str = "127.0.0.1";
pub const DEFAULT_LISTEN_PORT: u16 = 8787;
pub const DEFAULT_CLUSTER_ID: &str = "oak-local-a";
pub const DEFAULT_UPSTREAM_BASE: &str = "http://127.0.0.1:8090";
pub const DEFAULT_UPSTREAM_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_CHAIN_MODE: &str = "mock";

// ════════════════════════════════════════════════════════════════════════════
// MODE
// ════════════════════════════════════════════════════════════════════════════

/// Operating mode of the front door.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayMode {
    /// Canned payloads, no upstream traffic. For local development and demos.
    Static,
    /// Reconcile live upstream state.
    Live,
}

impl FromStr for GatewayMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" => Ok(GatewayMode::Static),
            "live" => Ok(GatewayMode::Live),
            _ => Err(ConfigError::InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for GatewayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayMode::Static => write!(f, "static"),
            GatewayMode::Live => write!(f, "live"),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// CONFIG
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub listen_host: String,
    pub listen_port: u16,
    /// Reported as `clusterId` in every success envelope.
    pub cluster_id: String,
    pub mode: GatewayMode,
    /// Default upstream base, without trailing slash.
    pub upstream_base: String,
    /// Maximum age of a cache entry that may stand in for a 429 response.
    pub cache_ttl_ms: u64,
    pub cache_max_entries: usize,
    pub upstream_timeout_ms: u64,
    /// Reported as `mode` in the header snapshot.
    pub chain_mode: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_host: DEFAULT_LISTEN_HOST.to_string(),
            listen_port: DEFAULT_LISTEN_PORT,
            cluster_id: DEFAULT_CLUSTER_ID.to_string(),
            mode: GatewayMode::Static,
            upstream_base: DEFAULT_UPSTREAM_BASE.to_string(),
            cache_ttl_ms: DEFAULT_CACHE_TTL_MS,
            cache_max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            upstream_timeout_ms: DEFAULT_UPSTREAM_TIMEOUT_MS,
            chain_mode: DEFAULT_CHAIN_MODE.to_string(),
        }
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { var, value }),
        None => Ok(default),
    }
}

/// Strip one trailing `/` from a base URL.
pub fn normalize_base(base: &str) -> String {
    base.strip_suffix('/').unwrap_or(base).to_string()
}

impl GatewayConfig {
    /// Baca konfigurasi dari process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Baca konfigurasi lewat fungsi lookup arbitrer (dipakai oleh test).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let mode = match lookup("OPS_GATEWAY_MODE") {
            Some(value) => value.parse()?,
            None => defaults.mode,
        };

        let upstream_base = normalize_base(
            &lookup("OPS_UPSTREAM_BASE").unwrap_or(defaults.upstream_base),
        );
        if !(upstream_base.starts_with("http://") || upstream_base.starts_with("https://")) {
            return Err(ConfigError::InvalidUpstreamBase(upstream_base));
        }

        let chain_mode = ["OPS_CHAIN_MODE", "OAK_CHAIN_MODE", "BLOCKCHAIN_MODE"]
            .into_iter()
            .filter_map(|key| lookup(key))
            .find(|v| !v.is_empty())
            .unwrap_or(defaults.chain_mode);

        Ok(Self {
            listen_host: lookup("OPS_GATEWAY_HOST").unwrap_or(defaults.listen_host),
            listen_port: parse_var(&lookup, "OPS_GATEWAY_PORT", defaults.listen_port)?,
            cluster_id: lookup("OPS_GATEWAY_CLUSTER_ID").unwrap_or(defaults.cluster_id),
            mode,
            upstream_base,
            cache_ttl_ms: parse_var(&lookup, "OPS_UPSTREAM_CACHE_TTL_MS", defaults.cache_ttl_ms)?,
            cache_max_entries: parse_var(
                &lookup,
                "OPS_UPSTREAM_CACHE_MAX_ENTRIES",
                defaults.cache_max_entries,
            )?,
            upstream_timeout_ms: parse_var(
                &lookup,
                "OPS_UPSTREAM_TIMEOUT_MS",
                defaults.upstream_timeout_ms,
            )?,
            chain_mode,
        })
    }

    /// `host:port` to bind the listener on.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.listen_host, self.listen_port)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }
}

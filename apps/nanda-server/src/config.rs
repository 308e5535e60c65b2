use std::net::SocketAddr;
use std::path::PathBuf;

use nanda_core::memory::DEFAULT_MEMORY_FILE;
use nanda_core::rate_limit::DEFAULT_LIMIT_PER_MIN;
use tracing::warn;

pub(crate) const DEFAULT_PORT: &str = "5000";
pub(crate) const DEFAULT_BIND: &str = "0.0.0.0";
pub(crate) const DEFAULT_MAX_CONC: usize = 1024;
pub(crate) const DEFAULT_SERVICE_NAME: &str = "ts-alt: nanda-go-agent";
pub(crate) const DEFAULT_AGENT_ID: &str = "harshit-go-agent";
pub(crate) const DEFAULT_AGENT_NAME: &str = "nanda-go-agent";

#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfigError {
    #[error("invalid PORT: {0}")]
    InvalidPort(String),
    #[error("invalid NANDA_BIND: {0}")]
    InvalidBind(String),
    #[error("invalid NANDA_RATE_LIMIT_PER_MIN: {0} (must be a positive integer)")]
    InvalidRateLimit(String),
    #[error("invalid NANDA_HTTP_MAX_CONC: {0}")]
    InvalidConcurrency(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// How this instance describes itself on `/api/health` and `/api/agents/list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Identity {
    pub service_name: String,
    pub agent_id: String,
    pub agent_name: String,
    pub version: &'static str,
}

impl Default for Identity {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.into(),
            agent_id: DEFAULT_AGENT_ID.into(),
            agent_name: DEFAULT_AGENT_NAME.into(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ServiceConfig {
    pub addr: SocketAddr,
    pub tls: Option<TlsPaths>,
    pub memory_path: PathBuf,
    pub rate_limit_per_min: u32,
    pub tools_enabled: bool,
    pub concurrency_limit: usize,
    pub identity: Identity,
}

impl ServiceConfig {
    /// Defaults for an instance that persists to `memory_path`.
    #[cfg(test)]
    pub fn with_memory_path(memory_path: impl Into<PathBuf>) -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            tls: None,
            memory_path: memory_path.into(),
            rate_limit_per_min: DEFAULT_LIMIT_PER_MIN,
            tools_enabled: false,
            concurrency_limit: DEFAULT_MAX_CONC,
            identity: Identity::default(),
        }
    }

    pub fn scheme(&self) -> &'static str {
        if self.tls.is_some() {
            "HTTPS"
        } else {
            "HTTP"
        }
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_truthy(key: &str) -> bool {
    env_nonempty(key)
        .map(|v| {
            matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
        .unwrap_or(false)
}

pub(crate) fn config_from_env() -> Result<ServiceConfig, ConfigError> {
    let port_raw = env_nonempty("PORT").unwrap_or_else(|| DEFAULT_PORT.into());
    let port: u16 = port_raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidPort(port_raw.clone()))?;

    let bind = env_nonempty("NANDA_BIND").unwrap_or_else(|| DEFAULT_BIND.into());
    let ip: std::net::IpAddr = bind
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .parse()
        .map_err(|_| ConfigError::InvalidBind(bind.clone()))?;
    let addr = SocketAddr::new(ip, port);

    let rate_limit_per_min = env_nonempty("NANDA_RATE_LIMIT_PER_MIN")
        .map(|raw| match raw.trim().parse::<u32>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(ConfigError::InvalidRateLimit(raw)),
        })
        .transpose()?
        .unwrap_or(DEFAULT_LIMIT_PER_MIN);

    let concurrency_limit = env_nonempty("NANDA_HTTP_MAX_CONC")
        .map(|raw| match raw.trim().parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(ConfigError::InvalidConcurrency(raw)),
        })
        .transpose()?
        .unwrap_or(DEFAULT_MAX_CONC);

    let tls = match (env_nonempty("CERT_FILE"), env_nonempty("KEY_FILE")) {
        (Some(cert), Some(key)) => Some(TlsPaths {
            cert: cert.into(),
            key: key.into(),
        }),
        (None, None) => None,
        (cert, _) => {
            warn!(
                target: "nanda::tls",
                missing = if cert.is_some() { "KEY_FILE" } else { "CERT_FILE" },
                "only one of CERT_FILE/KEY_FILE set; serving plain HTTP"
            );
            None
        }
    };

    let defaults = Identity::default();
    let identity = Identity {
        service_name: env_nonempty("NANDA_SERVICE_NAME").unwrap_or(defaults.service_name),
        agent_id: env_nonempty("NANDA_AGENT_ID").unwrap_or(defaults.agent_id),
        agent_name: env_nonempty("NANDA_AGENT_NAME").unwrap_or(defaults.agent_name),
        version: defaults.version,
    };

    Ok(ServiceConfig {
        addr,
        tls,
        memory_path: env_nonempty("NANDA_MEMORY_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MEMORY_FILE)),
        rate_limit_per_min,
        tools_enabled: env_truthy("NANDA_TOOLS"),
        concurrency_limit,
        identity,
    })
}

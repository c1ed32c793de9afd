use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration as StdDuration;

use chrono::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub sessions: SessionConfig,
    pub catalog_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let ttl_minutes = env::var("APP_SESSION_TTL_MINUTES")
            .unwrap_or_else(|_| SessionConfig::DEFAULT_TTL_MINUTES.to_string())
            .parse::<i64>()
            .ok()
            .filter(|minutes| *minutes > 0)
            .ok_or(ConfigError::InvalidSessionTtl)?;

        let sweep_seconds = env::var("APP_SESSION_SWEEP_SECONDS")
            .unwrap_or_else(|_| SessionConfig::DEFAULT_SWEEP_SECONDS.to_string())
            .parse::<u64>()
            .ok()
            .filter(|seconds| *seconds > 0)
            .ok_or(ConfigError::InvalidSweepInterval)?;

        let catalog_path = env::var("APP_QUESTION_CATALOG")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                ansi: environment.is_development(),
            },
            sessions: SessionConfig {
                ttl_minutes,
                sweep_seconds,
            },
            catalog_path,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub ansi: bool,
}

/// Session lifetime and background expiry sweep cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub ttl_minutes: i64,
    pub sweep_seconds: u64,
}

impl SessionConfig {
    pub const DEFAULT_TTL_MINUTES: i64 = 120;
    pub const DEFAULT_SWEEP_SECONDS: u64 = 60;

    pub fn ttl(&self) -> Duration {
        Duration::minutes(self.ttl_minutes)
    }

    pub fn sweep_interval(&self) -> StdDuration {
        StdDuration::from_secs(self.sweep_seconds)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: Self::DEFAULT_TTL_MINUTES,
            sweep_seconds: Self::DEFAULT_SWEEP_SECONDS,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidSessionTtl,
    InvalidSweepInterval,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidSessionTtl => {
                write!(f, "APP_SESSION_TTL_MINUTES must be a positive integer")
            }
            ConfigError::InvalidSweepInterval => {
                write!(f, "APP_SESSION_SWEEP_SECONDS must be a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidSessionTtl
            | ConfigError::InvalidSweepInterval => None,
        }
    }
}

//! Configuration management for the academics service.
//!
//! Loads configuration from environment variables with defaults. Nothing
//! below the binary reads the environment: the resulting [`Config`] is passed
//! into the app at construction.

use crate::rules::RulesConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Signing secret used when `JWT_SECRET` is unset. Only suitable for local runs.
pub const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// `PostgreSQL` configuration; `None` selects the in-memory record store
    pub postgres: Option<PostgresConfig>,
    /// Credential verification configuration
    pub auth: AuthConfig,
    /// Remote status service endpoints
    pub remote: RemoteConfig,
    /// Eligibility rule parameters
    pub rules: RulesConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Prometheus exporter port
    pub metrics_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout: u64,
    /// Upper bound for one orchestration run in milliseconds
    pub orchestration_timeout_ms: u64,
}

/// `PostgreSQL` configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    /// Connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout: u64,
}

/// Credential verification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret shared with the credential issuer
    pub jwt_secret: String,
}

/// Remote status service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Tuition status (finance) GraphQL endpoint
    pub finance_url: String,
    /// Academic standing (student) GraphQL endpoint
    pub student_url: String,
    /// Library clearance GraphQL endpoint
    pub library_url: String,
    /// Per-query timeout in milliseconds
    pub timeout_ms: u64,
}

fn parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn text(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unparsable numeric values fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                host: text("HOST", "0.0.0.0"),
                port: parsed("PORT", 4000),
                metrics_port: parsed("METRICS_PORT", 9100),
                shutdown_timeout: parsed("SHUTDOWN_TIMEOUT", 30),
                orchestration_timeout_ms: parsed("ORCHESTRATION_TIMEOUT_MS", 15_000),
            },
            postgres: env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty())
                .map(|url| PostgresConfig {
                    url,
                    max_connections: parsed("DATABASE_MAX_CONNECTIONS", 10),
                    connect_timeout: parsed("DATABASE_CONNECT_TIMEOUT", 30),
                }),
            auth: AuthConfig {
                jwt_secret: text("JWT_SECRET", DEFAULT_JWT_SECRET),
            },
            remote: RemoteConfig {
                finance_url: text("FINANCE_SERVICE_URL", "http://finance-service:4000/graphql"),
                student_url: text("STUDENT_SERVICE_URL", "http://student-service:4000/graphql"),
                library_url: text(
                    "LIBRABOOK_API_URL",
                    "http://host.docker.internal:5000/graphql",
                ),
                timeout_ms: parsed("REMOTE_TIMEOUT_MS", 5_000),
            },
            rules: RulesConfig {
                max_total_credits: parsed("MAX_SKS", RulesConfig::default().max_total_credits),
                max_credits_per_course: parsed(
                    "MAX_SKS_PER_COURSE",
                    RulesConfig::default().max_credits_per_course,
                ),
            },
        }
    }

    /// Configuration for tests and local runs: in-memory store, local endpoints.
    #[must_use]
    pub fn local(jwt_secret: impl Into<String>) -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 4000,
                metrics_port: 9100,
                shutdown_timeout: 5,
                orchestration_timeout_ms: 5_000,
            },
            postgres: None,
            auth: AuthConfig {
                jwt_secret: jwt_secret.into(),
            },
            remote: RemoteConfig {
                finance_url: "http://127.0.0.1:4001/graphql".to_string(),
                student_url: "http://127.0.0.1:4002/graphql".to_string(),
                library_url: "http://127.0.0.1:5000/graphql".to_string(),
                timeout_ms: 2_000,
            },
            rules: RulesConfig::default(),
        }
    }

    /// Orchestration deadline as a [`Duration`].
    #[must_use]
    pub const fn orchestration_timeout(&self) -> Duration {
        Duration::from_millis(self.server.orchestration_timeout_ms)
    }

    /// Remote query timeout as a [`Duration`].
    #[must_use]
    pub const fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote.timeout_ms)
    }

    /// Whether the signing secret is still the built-in default.
    #[must_use]
    pub fn uses_default_secret(&self) -> bool {
        self.auth.jwt_secret == DEFAULT_JWT_SECRET
    }
}

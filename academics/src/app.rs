//! Application coordinator - wires the record store, remote lookups,
//! credential verifier and orchestrator together.

use crate::access::{CredentialVerifier, JwtVerifier};
use crate::config::Config;
use crate::orchestrator::{Completions, Orchestrator, OrchestratorEnvironment};
use crate::queries::RecordQueries;
use crate::records::{InMemoryRecordStore, PostgresRecordStore, RecordError, RecordStore};
use crate::remote::{
    ClearanceLookup, FinanceClient, GraphqlClient, LibraryClient, RemoteError, RemoteService,
    StandingLookup, StudentClient, TuitionLookup,
};
use crate::server::{AppState, build_router};
use academic_gate_core::environment::{Clock, SystemClock};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Startup errors
#[derive(Error, Debug)]
pub enum StartupError {
    /// Database connection failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Database migration failed
    #[error("Migration error: {0}")]
    Migration(#[from] RecordError),

    /// A remote client could not be built
    #[error("Remote client error: {0}")]
    Remote(#[from] RemoteError),
}

/// Remote lookups used by the orchestrator
#[derive(Clone)]
pub struct Lookups {
    /// Finance service
    pub tuition: Arc<dyn TuitionLookup>,
    /// Student service
    pub standing: Arc<dyn StandingLookup>,
    /// Library
    pub clearance: Arc<dyn ClearanceLookup>,
}

impl Lookups {
    /// GraphQL clients for the configured endpoints.
    ///
    /// # Errors
    ///
    /// Returns error if an HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, RemoteError> {
        let timeout = config.remote_timeout();
        let client = |service, url: &str| GraphqlClient::new(service, url, timeout);

        Ok(Self {
            tuition: Arc::new(FinanceClient::new(client(
                RemoteService::Finance,
                &config.remote.finance_url,
            )?)),
            standing: Arc::new(StudentClient::new(client(
                RemoteService::Student,
                &config.remote.student_url,
            )?)),
            clearance: Arc::new(LibraryClient::new(client(
                RemoteService::Library,
                &config.remote.library_url,
            )?)),
        })
    }
}

/// Main academics application.
#[derive(Clone)]
pub struct AcademicsApp {
    /// Transaction orchestrator
    pub orchestrator: Orchestrator,
    /// Read-side queries
    pub queries: RecordQueries,
    /// Record store shared by both
    pub records: Arc<dyn RecordStore>,
    /// Credential verifier
    pub verifier: Arc<dyn CredentialVerifier>,
    config: Config,
}

impl AcademicsApp {
    /// Initialize the application from configuration.
    ///
    /// Connects to `PostgreSQL` and runs migrations when a database is
    /// configured, otherwise keeps records in memory.
    ///
    /// # Errors
    ///
    /// Returns error if the database or a remote client cannot be set up.
    pub async fn new(config: Config) -> Result<Self, StartupError> {
        tracing::info!("Initializing academics application...");

        let records: Arc<dyn RecordStore> = match &config.postgres {
            Some(pg) => {
                tracing::info!("Connecting to PostgreSQL...");
                let pool = PgPoolOptions::new()
                    .max_connections(pg.max_connections)
                    .acquire_timeout(Duration::from_secs(pg.connect_timeout))
                    .connect(&pg.url)
                    .await?;

                let store = PostgresRecordStore::new(pool);
                tracing::info!("Running database migrations...");
                store.migrate().await?;
                tracing::info!("✓ Record store initialized (PostgreSQL)");
                Arc::new(store)
            },
            None => {
                tracing::warn!("DATABASE_URL not set, records are kept in memory");
                Arc::new(InMemoryRecordStore::new())
            },
        };

        if config.uses_default_secret() {
            tracing::warn!("JWT_SECRET not set, using the development default");
        }

        let lookups = Lookups::from_config(&config)?;
        let verifier = Arc::new(JwtVerifier::new(&config.auth.jwt_secret));

        Ok(Self::with_dependencies(
            config,
            lookups,
            records,
            verifier,
            Arc::new(SystemClock),
        ))
    }

    /// Assemble the application from already-built dependencies.
    #[must_use]
    pub fn with_dependencies(
        config: Config,
        lookups: Lookups,
        records: Arc<dyn RecordStore>,
        verifier: Arc<dyn CredentialVerifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let orchestrator = Orchestrator::new(OrchestratorEnvironment {
            clock,
            tuition: lookups.tuition,
            standing: lookups.standing,
            clearance: lookups.clearance,
            records: Arc::clone(&records),
            rules: config.rules,
            deadline: config.orchestration_timeout(),
            completions: Completions::new(),
        });

        Self {
            orchestrator,
            queries: RecordQueries::new(Arc::clone(&records)),
            records,
            verifier,
            config,
        }
    }

    /// Configuration the app was built with
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// HTTP router over this application
    #[must_use]
    pub fn router(&self) -> Router {
        build_router(AppState::new(
            self.orchestrator.clone(),
            self.queries.clone(),
            Arc::clone(&self.verifier),
        ))
    }
}

//! Application state shared across handlers.

use crate::auth::TokenAuthenticator;
use crate::guard::AuthorizationGuard;
use crate::ingest::IngestLimits;
use critic_analyzers::AnalyzerRegistry;
use critic_core::config::AppConfig;
use critic_metadata::MetadataStore;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Metadata store.
    pub metadata: Arc<dyn MetadataStore>,
    /// Credential verifier.
    pub authenticator: Arc<TokenAuthenticator>,
    /// Ownership checks over the metadata store.
    pub guard: AuthorizationGuard,
    /// Analyzer registry, built once at startup.
    pub analyzers: Arc<AnalyzerRegistry>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Fails if the configuration is invalid.
    pub fn new(
        config: AppConfig,
        metadata: Arc<dyn MetadataStore>,
        analyzers: AnalyzerRegistry,
    ) -> critic_core::Result<Self> {
        config.validate().map_err(critic_core::Error::Config)?;

        let authenticator = TokenAuthenticator::new(&config.auth)?;
        let guard = AuthorizationGuard::new(metadata.clone());

        Ok(Self {
            config: Arc::new(config),
            metadata,
            authenticator: Arc::new(authenticator),
            guard,
            analyzers: Arc::new(analyzers),
        })
    }

    /// Size bounds for archive uploads.
    pub fn ingest_limits(&self) -> IngestLimits {
        IngestLimits::from_config(&self.config.server)
    }
}

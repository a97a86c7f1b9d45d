use crate::config::Config;
use crate::error::ServiceError;
use schsvg_resource::HttpSourceProvider;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Shared application state accessible to all handlers
#[derive(Clone)]
pub struct AppState {
    /// Fetches schematics and libraries; shares one connection pool
    pub provider: Arc<HttpSourceProvider>,

    /// Limits concurrent renders
    pub render_slots: Arc<Semaphore>,

    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, ServiceError> {
        let provider = HttpSourceProvider::with_timeout(config.render.fetch_timeout())
            .map_err(|e| ServiceError::Config(e.to_string()))?;
        Ok(Self::with_provider(config, provider))
    }

    pub fn with_provider(config: Config, provider: HttpSourceProvider) -> Self {
        let render_slots = Arc::new(Semaphore::new(config.render.max_concurrent_renders));
        Self {
            provider: Arc::new(provider),
            render_slots,
            config: Arc::new(config),
        }
    }
}

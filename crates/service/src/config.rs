use schsvg_core::RenderSettings;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub render: RenderConfig,
    /// Render settings used when a request does not override them.
    #[serde(default)]
    pub defaults: RenderSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    pub max_concurrent_renders: usize,
    pub fetch_timeout_secs: u64,
    pub cache_max_age_secs: u64,
    pub buffered_chunks: usize,
}

impl RenderConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            render: RenderConfig {
                max_concurrent_renders: 32,
                fetch_timeout_secs: 30,
                cache_max_age_secs: 30,
                buffered_chunks: 16,
            },
            defaults: RenderSettings::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Try multiple config file locations in order of preference
        let config_candidates = [
            // 1. Current directory (when running from crates/service/)
            "config/default",
            // 2. Workspace root
            "crates/service/config/default",
        ];

        let mut builder = config::Config::builder();
        let mut found = false;

        // Check for environment variable override first
        if let Ok(config_path) = std::env::var("SCHSVG_CONFIG")
            && !config_path.is_empty()
            && std::path::Path::new(&format!("{config_path}.toml")).exists()
        {
            builder = builder.add_source(config::File::with_name(&config_path));
            found = true;
        }

        // If no env override found a config, try the candidates
        if !found
            && let Some(path) = config_candidates
                .iter()
                .find(|path| std::path::Path::new(&format!("{path}.toml")).exists())
        {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Always layer environment variables on top
        builder = builder.add_source(config::Environment::with_prefix("SCHSVG").separator("__"));

        builder.build()?.try_deserialize()
    }
}

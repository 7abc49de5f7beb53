use config::{Config, ConfigError};
use lazy_static::lazy_static;
use serde::Deserialize;
use std::{env, path::Path};

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagConfig {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    pub model_arn: String,
    pub name_prefix: String,
    pub desired_inference_units: u32,
    pub poll_interval_secs: u64,
    #[serde(default)]
    pub tags: Vec<TagConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    pub batch_size: usize,
    pub max_concurrency: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_reconcile_iterations: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub max_requests: usize,
    pub refill_interval_ms: usize,
    pub refill_amount: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordsConfig {
    pub subject_prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub endpoint: EndpointConfig,
    pub dispatch: DispatchConfig,
    pub retry: RetryConfig,
    pub rate_limit: RateLimitConfig,
    pub records: RecordsConfig,
}

impl AppConfig {
    /// Load `config.toml` from `root`, then apply `CLASSIFIER__SECTION__KEY` env overrides.
    pub fn load(root: &str) -> Result<Self, ConfigError> {
        let path = format!("{root}/config.toml");
        let mut app_config: AppConfig = Config::builder()
            .add_source(config::File::with_name(&path))
            .add_source(config::Environment::with_prefix("CLASSIFIER").separator("__"))
            .build()?
            .try_deserialize()?;

        if let Ok(model_arn) = env::var("MODEL_ARN") {
            app_config.endpoint.model_arn = model_arn;
        }
        if let Ok(base_url) = env::var("CLASSIFIER_URL") {
            app_config.service.base_url = base_url;
        }

        Ok(app_config)
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "App Config:\n\nService: {:?}\n\nEndpoint: {:?}\n\nDispatch: {:?}\n\nRetry: {:?}\n\nRate Limit: {:?}\n\nRecords: {:?}",
            self.service,
            self.endpoint,
            self.dispatch,
            self.retry,
            self.rate_limit,
            self.records,
        )
    }
}

fn config_root() -> String {
    env::var("APP_DIR").unwrap_or_else(|_| {
        let dir = env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR or APP_DIR is required");
        let dir = Path::new(&dir)
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or(dir);
        format!("{}/config", dir)
    })
}

lazy_static! {
    pub static ref cfg: AppConfig = AppConfig::load(&config_root()).expect("config.toml is invalid");
}

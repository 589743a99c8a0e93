use serde::Serialize;
use std::time::Duration;

pub const CONFIG_SCHEMA_VERSION: &str = "1";

#[derive(Debug, Clone, Serialize)]
pub struct ServiceConfig {
    pub max_body_bytes: usize,
    pub max_batch_items: usize,
    pub max_idempotency_key_bytes: usize,
    pub request_timeout: Duration,
    pub enable_metrics_endpoint: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 64 * 1024,
            max_batch_items: 100,
            max_idempotency_key_bytes: 256,
            request_timeout: Duration::from_secs(5),
            enable_metrics_endpoint: true,
        }
    }
}

pub fn validate_startup_config_contract(api: &ServiceConfig) -> Result<(), String> {
    if api.max_body_bytes == 0 {
        return Err("max_body_bytes must be > 0".to_string());
    }
    if api.max_batch_items == 0 {
        return Err("max_batch_items must be > 0".to_string());
    }
    if api.max_idempotency_key_bytes == 0 {
        return Err("max_idempotency_key_bytes must be > 0".to_string());
    }
    if api.request_timeout.is_zero() {
        return Err("request_timeout must be > 0".to_string());
    }
    Ok(())
}

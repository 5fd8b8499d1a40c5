use std::fs;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::resilience::BreakerConfig;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    /// Emit money-path audit events (target `AUDIT`)
    #[serde(default = "default_true")]
    pub enable_audit: bool,
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub kyc: KycConfig,
    #[serde(default)]
    pub resilience: ResilienceConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    /// Secret expected in `X-Service-Secret` on webhook and internal routes.
    /// Overridden by `WALLET_SERVICE_SECRET`.
    #[serde(default)]
    pub service_secret: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct KycConfig {
    /// ISO 3166-1 alpha-2 codes accepted at KYC submission
    pub supported_countries: Vec<String>,
    pub manual_review_sla_hours: u64,
}

impl Default for KycConfig {
    fn default() -> Self {
        Self {
            supported_countries: ["TH", "SG", "MY", "ID", "VN", "PH"]
                .into_iter()
                .map(String::from)
                .collect(),
            manual_review_sla_hours: 48,
        }
    }
}

impl KycConfig {
    pub fn manual_review_sla(&self) -> Duration {
        Duration::from_secs(self.manual_review_sla_hours * 3600)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ResilienceConfig {
    pub failure_threshold: u32,
    pub cooldown_secs: u64,
    pub call_timeout_ms: u64,
    /// Advertised to clients on a queued top-up
    pub retry_after_secs: u64,
    pub retry_scan_interval_secs: u64,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cooldown_secs: 30,
            call_timeout_ms: 5000,
            retry_after_secs: 60,
            retry_scan_interval_secs: 10,
        }
    }
}

impl ResilienceConfig {
    pub fn breaker(&self) -> BreakerConfig {
        BreakerConfig {
            failure_threshold: self.failure_threshold.max(1),
            cooldown: Duration::from_secs(self.cooldown_secs),
            call_timeout: Duration::from_millis(self.call_timeout_ms),
        }
    }

    pub fn retry_after(&self) -> Duration {
        Duration::from_secs(self.retry_after_secs)
    }

    pub fn retry_scan_interval(&self) -> Duration {
        Duration::from_secs(self.retry_scan_interval_secs.max(1))
    }
}

fn default_true() -> bool {
    true
}

impl AppConfig {
    pub fn load(env: &str) -> anyhow::Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse {}", config_path))
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }
}

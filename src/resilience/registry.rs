use std::sync::Arc;

use dashmap::DashMap;

use super::breaker::{BreakerConfig, CircuitBreaker, CircuitBreakerState};

/// Process-wide breakers, one per dependency name
#[derive(Debug)]
pub struct BreakerRegistry {
    config: BreakerConfig,
    breakers: DashMap<String, Arc<CircuitBreaker>>,
}

impl BreakerRegistry {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            breakers: DashMap::new(),
        }
    }

    /// Shared breaker for `name`, created on first use
    pub fn breaker(&self, name: &str) -> Arc<CircuitBreaker> {
        if let Some(existing) = self.breakers.get(name) {
            return existing.clone();
        }
        self.breakers
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(name, self.config)))
            .clone()
    }

    /// Snapshots sorted by dependency name
    pub fn snapshots(&self) -> Vec<CircuitBreakerState> {
        let mut states: Vec<_> = self.breakers.iter().map(|b| b.snapshot()).collect();
        states.sort_by(|a, b| a.dependency_name.cmp(&b.dependency_name));
        states
    }
}

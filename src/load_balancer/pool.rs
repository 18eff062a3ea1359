//! Selector pool.
//!
//! # Responsibilities
//! - Keep one selector per service id, created on first use
//! - Apply the configured algorithm to a candidate set

use std::sync::Arc;

use dashmap::DashMap;

use crate::config::LoadBalancerStrategy;
use crate::discovery::ServiceInstance;
use crate::load_balancer::{random::RandomChoice, round_robin::RoundRobin, LoadBalancer};

/// Per-service selectors sharing one strategy.
#[derive(Debug)]
pub struct SelectorPool {
    strategy: LoadBalancerStrategy,
    selectors: DashMap<String, Arc<dyn LoadBalancer>>,
}

impl SelectorPool {
    pub fn new(strategy: LoadBalancerStrategy) -> Self {
        Self {
            strategy,
            selectors: DashMap::new(),
        }
    }

    fn selector(&self, service_id: &str) -> Arc<dyn LoadBalancer> {
        if let Some(existing) = self.selectors.get(service_id) {
            return existing.value().clone();
        }
        self.selectors
            .entry(service_id.to_string())
            .or_insert_with(|| {
                let selector: Arc<dyn LoadBalancer> = match self.strategy {
                    LoadBalancerStrategy::RoundRobin => Arc::new(RoundRobin::new()),
                    LoadBalancerStrategy::Random => Arc::new(RandomChoice::new()),
                };
                selector
            })
            .value()
            .clone()
    }

    /// Choose an instance of `service_id` from `candidates`.
    pub fn choose(&self, service_id: &str, candidates: &[ServiceInstance]) -> Option<ServiceInstance> {
        let chosen = self.selector(service_id).next_instance(candidates);
        if chosen.is_none() {
            tracing::debug!(service_id = %service_id, "No candidates to choose from");
        }
        chosen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates(service: &str) -> Vec<ServiceInstance> {
        (1..=2)
            .map(|n| ServiceInstance::new(format!("{service}-{n}"), service, "localhost", 8000 + n, false))
            .collect()
    }

    #[test]
    fn test_rotation_is_per_service() {
        let pool = SelectorPool::new(LoadBalancerStrategy::RoundRobin);
        let a = candidates("a");
        let b = candidates("b");

        assert_eq!(pool.choose("a", &a).unwrap().instance_id(), "a-1");
        assert_eq!(pool.choose("a", &a).unwrap().instance_id(), "a-2");
        // b has its own counter.
        assert_eq!(pool.choose("b", &b).unwrap().instance_id(), "b-1");
    }

    #[test]
    fn test_empty_candidates() {
        let pool = SelectorPool::new(LoadBalancerStrategy::Random);
        assert!(pool.choose("a", &[]).is_none());
    }
}

//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::discovery::ServiceInstance;
use crate::load_balancer::LoadBalancer;

/// Round-robin selector.
/// Stores an internal counter to rotate through candidates.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoadBalancer for RoundRobin {
    fn next_instance(&self, candidates: &[ServiceInstance]) -> Option<ServiceInstance> {
        if candidates.is_empty() {
            return None;
        }

        let position = self.counter.fetch_add(1, Ordering::Relaxed);
        candidates.get(position % candidates.len()).cloned()
    }
}

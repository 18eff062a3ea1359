//! Random-choice load balancing strategy.

use rand::seq::SliceRandom;

use crate::discovery::ServiceInstance;
use crate::load_balancer::LoadBalancer;

#[derive(Debug, Default)]
pub struct RandomChoice;

impl RandomChoice {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for RandomChoice {
    fn next_instance(&self, candidates: &[ServiceInstance]) -> Option<ServiceInstance> {
        candidates.choose(&mut rand::thread_rng()).cloned()
    }
}

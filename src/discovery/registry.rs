//! In-memory instance registry.
//!
//! # Responsibilities
//! - Store instances per logical service id, in insertion order
//! - Reject duplicate instance ids within a service
//! - Hand out snapshots, never live views
//!
//! # Design Decisions
//! - `DashMap` shards the map; `entry()` holds the shard's write lock for the
//!   whole check-and-append, so concurrent adds of one instance insert it once
//! - Volatile: nothing survives a restart, nothing is ever removed

use std::collections::BTreeSet;

use dashmap::DashMap;

use crate::discovery::instance::ServiceInstance;
use crate::discovery::DiscoveryClient;

/// Concurrency-safe store of route-configured instances.
#[derive(Debug, Default)]
pub struct InstanceRegistry {
    services: DashMap<String, Vec<ServiceInstance>>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `instance` to its service bucket.
    ///
    /// Returns `false` (and changes nothing) when an instance with the same id
    /// is already registered for that service.
    pub fn add_instance(&self, instance: ServiceInstance) -> bool {
        let mut bucket = self
            .services
            .entry(instance.service_id().to_string())
            .or_default();

        if bucket
            .iter()
            .any(|existing| existing.instance_id() == instance.instance_id())
        {
            return false;
        }

        tracing::debug!(
            service_id = %instance.service_id(),
            instance_id = %instance.instance_id(),
            uri = %instance.uri(),
            "Instance registered"
        );
        bucket.push(instance);
        true
    }

    /// Snapshot of the instances registered for `service_id`.
    pub fn get_instances(&self, service_id: &str) -> Vec<ServiceInstance> {
        self.services
            .get(service_id)
            .map(|bucket| bucket.value().clone())
            .unwrap_or_default()
    }

    /// Service ids known at call time.
    pub fn get_service_ids(&self) -> BTreeSet<String> {
        self.services.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Number of known services.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl DiscoveryClient for InstanceRegistry {
    fn description(&self) -> &str {
        "Route-configured instance registry"
    }

    fn instances(&self, service_id: &str) -> Vec<ServiceInstance> {
        self.get_instances(service_id)
    }

    fn services(&self) -> BTreeSet<String> {
        self.get_service_ids()
    }
}

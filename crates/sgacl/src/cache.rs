//! Per-batch lookup cache.
//!
//! Compiling many ports touches the same subnets and security groups over
//! and over. A [`LookupCache`] remembers what the directory returned for the
//! lifetime of one batch so each identifier is fetched once.
//!
//! Only found objects are stored. A miss is not remembered, so a later
//! lookup of the same identifier goes back to the directory. Entries are
//! never created implicitly.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use sgacl_types::{SecurityGroup, Subnet};

use crate::directory::Directory;

/// Directory fetch counters, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Cache of directory lookups, owned by the caller for one batch.
#[derive(Debug, Default)]
pub struct LookupCache {
    subnets: HashMap<String, Subnet>,
    groups: HashMap<String, Arc<SecurityGroup>>,
    group_ports: HashMap<String, Vec<String>>,
    stats: CacheStats,
}

impl LookupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a subnet, fetching it on first use.
    pub fn subnet<D>(&mut self, directory: &D, subnet_id: &str) -> Option<Subnet>
    where
        D: Directory + ?Sized,
    {
        if let Some(subnet) = self.subnets.get(subnet_id) {
            self.stats.hits += 1;
            return Some(subnet.clone());
        }

        self.stats.misses += 1;
        let subnet = directory.get_subnet(subnet_id)?;
        self.subnets.insert(subnet_id.to_string(), subnet.clone());
        Some(subnet)
    }

    /// Returns a security group, fetching it on first use.
    pub fn security_group<D>(&mut self, directory: &D, group_id: &str) -> Option<Arc<SecurityGroup>>
    where
        D: Directory + ?Sized,
    {
        if let Some(group) = self.groups.get(group_id) {
            self.stats.hits += 1;
            return Some(Arc::clone(group));
        }

        self.stats.misses += 1;
        let group = Arc::new(directory.get_security_group(group_id)?);
        self.groups.insert(group_id.to_string(), Arc::clone(&group));
        Some(group)
    }

    /// Returns the IDs of the ports bound to a group, fetching them on first
    /// use. An empty binding list counts as not found.
    pub fn ports_in_group<D>(&mut self, directory: &D, group_id: &str) -> Vec<String>
    where
        D: Directory + ?Sized,
    {
        if let Some(port_ids) = self.group_ports.get(group_id) {
            self.stats.hits += 1;
            return port_ids.clone();
        }

        self.stats.misses += 1;
        let port_ids = directory.get_ports_in_group(group_id);
        if port_ids.is_empty() {
            debug!("Security group {} has no bound ports", group_id);
        } else {
            self.group_ports
                .insert(group_id.to_string(), port_ids.clone());
        }
        port_ids
    }

    /// Seeds the cache with a subnet already known to the caller.
    pub fn insert_subnet(&mut self, subnet: Subnet) {
        self.subnets.insert(subnet.id.clone(), subnet);
    }

    /// Seeds the cache with a group already known to the caller.
    pub fn insert_security_group(&mut self, group: SecurityGroup) {
        self.groups.insert(group.id.clone(), Arc::new(group));
    }

    pub fn contains_subnet(&self, subnet_id: &str) -> bool {
        self.subnets.contains_key(subnet_id)
    }

    pub fn contains_security_group(&self, group_id: &str) -> bool {
        self.groups.contains_key(group_id)
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn is_empty(&self) -> bool {
        self.subnets.is_empty() && self.groups.is_empty() && self.group_ports.is_empty()
    }

    pub fn clear(&mut self) {
        self.subnets.clear();
        self.groups.clear();
        self.group_ports.clear();
        self.stats = CacheStats::default();
    }
}

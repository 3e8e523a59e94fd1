//! Collaborator seams.
//!
//! The compiler never owns directory data or pushes records itself. It
//! reads through a [`Directory`] and hands its output to an
//! [`AclApplier`]; both are implemented by the embedding service.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sgacl_types::{AclRecord, Port, SecurityGroup, Subnet};

use crate::error::ConfigError;
use crate::update::AclUpdate;

/// Read-only lookups against the network directory service.
pub trait Directory {
    fn get_subnet(&self, subnet_id: &str) -> Option<Subnet>;
    fn get_security_group(&self, group_id: &str) -> Option<SecurityGroup>;
    /// Returns the IDs of the ports bound to a security group. May contain
    /// duplicates.
    fn get_ports_in_group(&self, group_id: &str) -> Vec<String>;
    /// Returns the ports with the given IDs. Unknown IDs are skipped.
    fn get_ports(&self, port_ids: &[String]) -> Vec<Port>;
}

/// Transactional sink for compiled ACLs.
pub trait AclApplier {
    /// Replaces the ACL set of a single port.
    fn apply_port_acls(&self, port_id: &str, acls: &[AclRecord]) -> Result<(), String>;
    /// Inserts (or retracts, per [`AclUpdate::is_add`]) the entries of a
    /// rule change, one transaction per affected switch.
    fn apply_update(&self, update: &AclUpdate) -> Result<(), String>;
}

/// A directory held entirely in memory.
///
/// Serves tests and offline compilation from a JSON snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryDirectory {
    #[serde(default)]
    pub ports: Vec<Port>,
    #[serde(default)]
    pub subnets: Vec<Subnet>,
    #[serde(default)]
    pub security_groups: Vec<SecurityGroup>,
    #[serde(skip)]
    port_index: HashMap<String, usize>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a snapshot from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content).map_err(|message| ConfigError::Parse {
            path: path.display().to_string(),
            message,
        })
    }

    /// Parses a snapshot from a JSON string.
    pub fn from_json_str(content: &str) -> Result<Self, String> {
        let mut directory: Self = serde_json::from_str(content).map_err(|e| e.to_string())?;
        directory.reindex();
        Ok(directory)
    }

    pub fn with_port(mut self, port: Port) -> Self {
        self.add_port(port);
        self
    }

    pub fn with_subnet(mut self, subnet: Subnet) -> Self {
        self.subnets.push(subnet);
        self
    }

    pub fn with_security_group(mut self, group: SecurityGroup) -> Self {
        self.security_groups.push(group);
        self
    }

    /// Adds or replaces a port.
    pub fn add_port(&mut self, port: Port) {
        match self.port_index.get(&port.id) {
            Some(&idx) => self.ports[idx] = port,
            None => {
                self.port_index.insert(port.id.clone(), self.ports.len());
                self.ports.push(port);
            }
        }
    }

    pub fn port(&self, port_id: &str) -> Option<&Port> {
        self.port_index.get(port_id).map(|&idx| &self.ports[idx])
    }

    fn reindex(&mut self) {
        self.port_index = self
            .ports
            .iter()
            .enumerate()
            .map(|(idx, port)| (port.id.clone(), idx))
            .collect();
    }

    /// Returns group ID → member port IDs, in port order.
    pub fn group_bindings(&self) -> BTreeMap<String, Vec<String>> {
        let mut bindings: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for port in &self.ports {
            for group_id in &port.security_groups {
                bindings
                    .entry(group_id.clone())
                    .or_default()
                    .push(port.id.clone());
            }
        }
        bindings
    }
}

impl Directory for InMemoryDirectory {
    fn get_subnet(&self, subnet_id: &str) -> Option<Subnet> {
        self.subnets.iter().find(|s| s.id == subnet_id).cloned()
    }

    fn get_security_group(&self, group_id: &str) -> Option<SecurityGroup> {
        self.security_groups
            .iter()
            .find(|g| g.id == group_id)
            .cloned()
    }

    fn get_ports_in_group(&self, group_id: &str) -> Vec<String> {
        self.ports
            .iter()
            .filter(|p| p.security_groups.iter().any(|g| g == group_id))
            .map(|p| p.id.clone())
            .collect()
    }

    fn get_ports(&self, port_ids: &[String]) -> Vec<Port> {
        port_ids
            .iter()
            .filter_map(|id| self.port(id).cloned())
            .collect()
    }
}

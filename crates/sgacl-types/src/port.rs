//! Port and subnet records.

use crate::ip::{IpNetwork, IpVersion};
use serde::{Deserialize, Serialize};

/// Device owner prefix of ports that belong to network services (DHCP
/// agents, router interfaces). Such ports are exempt from security groups.
const TRUSTED_DEVICE_OWNER_PREFIX: &str = "network:";

/// A fixed IP assignment on a port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FixedIp {
    pub ip_address: String,
    pub subnet_id: String,
}

impl FixedIp {
    pub fn new(ip_address: impl Into<String>, subnet_id: impl Into<String>) -> Self {
        Self {
            ip_address: ip_address.into(),
            subnet_id: subnet_id.into(),
        }
    }

    /// Returns the address family, or `None` if the address does not parse.
    pub fn ip_version(&self) -> Option<IpVersion> {
        self.ip_address
            .parse::<IpNetwork>()
            .ok()
            .map(|net| net.version())
    }
}

/// An additional address a port is allowed to source traffic from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AllowedAddressPair {
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
}

/// A logical switch port.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Port {
    pub id: String,
    pub network_id: String,
    #[serde(default)]
    pub fixed_ips: Vec<FixedIp>,
    #[serde(default)]
    pub allowed_address_pairs: Vec<AllowedAddressPair>,
    #[serde(default)]
    pub security_groups: Vec<String>,
    #[serde(default)]
    pub trusted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_owner: Option<String>,
}

impl Port {
    pub fn new(id: impl Into<String>, network_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            network_id: network_id.into(),
            ..Default::default()
        }
    }

    pub fn with_fixed_ip(mut self, ip_address: &str, subnet_id: &str) -> Self {
        self.fixed_ips.push(FixedIp::new(ip_address, subnet_id));
        self
    }

    pub fn with_security_group(mut self, group_id: impl Into<String>) -> Self {
        self.security_groups.push(group_id.into());
        self
    }

    pub fn with_allowed_address(mut self, ip_address: impl Into<String>) -> Self {
        self.allowed_address_pairs.push(AllowedAddressPair {
            ip_address: Some(ip_address.into()),
            mac_address: None,
        });
        self
    }

    pub fn with_trusted(mut self, trusted: bool) -> Self {
        self.trusted = trusted;
        self
    }

    pub fn with_device_owner(mut self, owner: impl Into<String>) -> Self {
        self.device_owner = Some(owner.into());
        self
    }

    /// Returns true if the port is exempt from security-group enforcement.
    pub fn is_trusted(&self) -> bool {
        self.trusted
            || self
                .device_owner
                .as_deref()
                .is_some_and(|owner| owner.starts_with(TRUSTED_DEVICE_OWNER_PREFIX))
    }
}

/// A subnet. Only the CIDR is needed for DHCP baseline entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subnet {
    pub id: String,
    pub cidr: String,
}

impl Subnet {
    pub fn new(id: impl Into<String>, cidr: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cidr: cidr.into(),
        }
    }

    /// Returns the address family of the CIDR, or `None` if it does not
    /// parse.
    pub fn ip_version(&self) -> Option<IpVersion> {
        self.cidr.parse::<IpNetwork>().ok().map(|net| net.version())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fixed_ip_version() {
        assert_eq!(FixedIp::new("10.0.0.5", "s1").ip_version(), Some(IpVersion::V4));
        assert_eq!(FixedIp::new("10.0.0.5/24", "s1").ip_version(), Some(IpVersion::V4));
        assert_eq!(FixedIp::new("fd00::5", "s2").ip_version(), Some(IpVersion::V6));
        assert_eq!(FixedIp::new("bogus", "s3").ip_version(), None);
    }

    #[test]
    fn test_subnet_version() {
        assert_eq!(Subnet::new("s1", "10.0.0.0/24").ip_version(), Some(IpVersion::V4));
        assert_eq!(Subnet::new("s2", "fd00::/64").ip_version(), Some(IpVersion::V6));
        assert_eq!(Subnet::new("s3", "").ip_version(), None);
    }

    #[test]
    fn test_trusted_port() {
        assert!(!Port::new("p1", "n1").is_trusted());
        assert!(Port::new("p1", "n1").with_trusted(true).is_trusted());
        assert!(Port::new("p1", "n1")
            .with_device_owner("network:dhcp")
            .is_trusted());
        assert!(!Port::new("p1", "n1")
            .with_device_owner("compute:nova")
            .is_trusted());
    }

    #[test]
    fn test_port_deserialize_defaults() {
        let json = r#"{"id": "p1", "network_id": "n1"}"#;
        let port: Port = serde_json::from_str(json).unwrap();
        assert!(port.fixed_ips.is_empty());
        assert!(port.security_groups.is_empty());
        assert!(!port.trusted);
    }
}

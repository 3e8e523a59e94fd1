//! Port address collection for address-set maintenance.
//!
//! Each security group has one address set per family holding the
//! addresses of its member ports. Callers keeping those sets current use
//! [`port_addresses`] to find what a port contributes.

use serde::{Deserialize, Serialize};
use sgacl_types::{IpNetwork, IpVersion, Port};

/// Addresses of a port, split by family.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortAddresses {
    pub ip4: Vec<String>,
    pub ip6: Vec<String>,
}

impl PortAddresses {
    pub fn get(&self, version: IpVersion) -> &[String] {
        match version {
            IpVersion::V4 => &self.ip4,
            IpVersion::V6 => &self.ip6,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ip4.is_empty() && self.ip6.is_empty()
    }

    fn push(&mut self, address: &str) {
        let Ok(network) = address.parse::<IpNetwork>() else {
            log::debug!("Ignoring unparseable address {}", address);
            return;
        };
        match network.version() {
            IpVersion::V4 => self.ip4.push(address.to_string()),
            IpVersion::V6 => self.ip6.push(address.to_string()),
        }
    }
}

/// Collects a port's fixed IPs, then its allowed-address-pair IPs, by
/// family and in input order.
///
/// Both lists are empty when security groups are not enforced.
pub fn port_addresses(port: &Port, security_groups_enabled: bool) -> PortAddresses {
    let mut addresses = PortAddresses::default();
    if !security_groups_enabled {
        return addresses;
    }

    for fixed_ip in &port.fixed_ips {
        addresses.push(&fixed_ip.ip_address);
    }
    for pair in &port.allowed_address_pairs {
        if let Some(ip) = pair.ip_address.as_deref().filter(|ip| !ip.is_empty()) {
            addresses.push(ip);
        }
    }

    addresses
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_by_family() {
        let port = Port::new("P1", "N1")
            .with_fixed_ip("10.0.0.5", "S1")
            .with_fixed_ip("fd00::5", "S6")
            .with_allowed_address("10.0.0.0/28")
            .with_allowed_address("fd00::/120");

        let addresses = port_addresses(&port, true);
        assert_eq!(addresses.ip4, vec!["10.0.0.5", "10.0.0.0/28"]);
        assert_eq!(addresses.ip6, vec!["fd00::5", "fd00::/120"]);
        assert_eq!(addresses.get(IpVersion::V6).len(), 2);
    }

    #[test]
    fn test_disabled() {
        let port = Port::new("P1", "N1").with_fixed_ip("10.0.0.5", "S1");
        assert!(port_addresses(&port, false).is_empty());
    }

    #[test]
    fn test_pair_without_ip_ignored() {
        let mut port = Port::new("P1", "N1");
        port.allowed_address_pairs.push(Default::default());
        assert!(port_addresses(&port, true).is_empty());
    }
}

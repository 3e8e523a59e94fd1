//! Security group and rule records.
//!
//! These mirror the directory service representation. The compiler treats
//! them as read-only input.

use crate::ip::IpVersion;
use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Traffic direction of a rule, relative to the guarded port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Traffic arriving at the port.
    #[default]
    Ingress,
    /// Traffic leaving the port.
    Egress,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ingress => write!(f, "ingress"),
            Self::Egress => write!(f, "egress"),
        }
    }
}

impl FromStr for Direction {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ingress" => Ok(Self::Ingress),
            "egress" => Ok(Self::Egress),
            _ => Err(ParseError::InvalidDirection(s.to_string())),
        }
    }
}

/// Address family discriminator of a rule.
///
/// Only `IPv4` and `IPv6` are accepted. Every clause after the direction is
/// qualified by the family, so a rule without one cannot be expressed and
/// is rejected when read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EtherType {
    #[default]
    IPv4,
    IPv6,
}

impl EtherType {
    /// Returns the IP version for this ethertype.
    pub const fn ip_version(&self) -> IpVersion {
        match self {
            Self::IPv4 => IpVersion::V4,
            Self::IPv6 => IpVersion::V6,
        }
    }
}

impl fmt::Display for EtherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IPv4 => write!(f, "IPv4"),
            Self::IPv6 => write!(f, "IPv6"),
        }
    }
}

impl FromStr for EtherType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IPv4" => Ok(Self::IPv4),
            "IPv6" => Ok(Self::IPv6),
            _ => Err(ParseError::InvalidEtherType(s.to_string())),
        }
    }
}

/// A protocol identifier as supplied by the directory service.
///
/// Numbers may arrive as integers or as strings; names are resolved by the
/// compiler's protocol tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProtocolToken {
    Number(i64),
    Name(String),
}

impl fmt::Display for ProtocolToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Name(name) => write!(f, "{}", name),
        }
    }
}

impl From<&str> for ProtocolToken {
    fn from(s: &str) -> Self {
        Self::Name(s.to_string())
    }
}

impl From<i64> for ProtocolToken {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

/// A single security group rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SecurityGroupRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub direction: Direction,
    #[serde(default)]
    pub ethertype: EtherType,
    #[serde(default)]
    pub protocol: Option<ProtocolToken>,
    #[serde(default)]
    pub port_range_min: Option<u32>,
    #[serde(default)]
    pub port_range_max: Option<u32>,
    #[serde(default)]
    pub remote_ip_prefix: Option<String>,
    #[serde(default)]
    pub remote_group_id: Option<String>,
}

impl SecurityGroupRule {
    /// Creates a rule with no protocol, ports or remote constraint.
    pub fn new(direction: Direction, ethertype: EtherType) -> Self {
        Self {
            direction,
            ethertype,
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_protocol(mut self, protocol: impl Into<ProtocolToken>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    /// Sets the port (or ICMP type/code) range. Either bound may be absent.
    pub fn with_port_range(mut self, min: Option<u32>, max: Option<u32>) -> Self {
        self.port_range_min = min;
        self.port_range_max = max;
        self
    }

    pub fn with_remote_ip_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.remote_ip_prefix = Some(prefix.into());
        self
    }

    pub fn with_remote_group(mut self, group_id: impl Into<String>) -> Self {
        self.remote_group_id = Some(group_id.into());
        self
    }
}

/// A named, reusable set of rules.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SecurityGroup {
    pub id: String,
    #[serde(default, alias = "security_group_rules")]
    pub rules: Vec<SecurityGroupRule>,
}

impl SecurityGroup {
    pub fn new(id: impl Into<String>, rules: Vec<SecurityGroupRule>) -> Self {
        Self {
            id: id.into(),
            rules,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_direction_parse() {
        assert_eq!("ingress".parse::<Direction>().unwrap(), Direction::Ingress);
        assert_eq!("EGRESS".parse::<Direction>().unwrap(), Direction::Egress);
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn test_ethertype_version() {
        assert_eq!(EtherType::IPv4.ip_version(), IpVersion::V4);
        assert_eq!(EtherType::IPv6.ip_version(), IpVersion::V6);
        assert_eq!("IPv6".parse::<EtherType>().unwrap(), EtherType::IPv6);
        assert_eq!(
            "ARP".parse::<EtherType>(),
            Err(ParseError::InvalidEtherType("ARP".to_string()))
        );
    }

    #[test]
    fn test_rule_deserialize() {
        let json = r#"{
            "direction": "ingress",
            "ethertype": "IPv4",
            "protocol": "tcp",
            "port_range_min": 22,
            "port_range_max": 22
        }"#;
        let rule: SecurityGroupRule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.direction, Direction::Ingress);
        assert_eq!(rule.protocol, Some(ProtocolToken::Name("tcp".to_string())));
        assert_eq!(rule.port_range_min, Some(22));
        assert_eq!(rule.remote_group_id, None);
    }

    #[test]
    fn test_rule_numeric_protocol() {
        let json = r#"{"direction": "egress", "ethertype": "IPv6", "protocol": 1}"#;
        let rule: SecurityGroupRule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.ethertype, EtherType::IPv6);
        assert_eq!(rule.protocol, Some(ProtocolToken::Number(1)));
    }

    #[test]
    fn test_rule_with_unknown_ethertype_rejected() {
        for ethertype in ["ARP", "ipv4", ""] {
            let json = format!(
                r#"{{"direction": "ingress", "ethertype": "{}", "remote_ip_prefix": "10.0.0.0/8"}}"#,
                ethertype
            );
            assert!(
                serde_json::from_str::<SecurityGroupRule>(&json).is_err(),
                "accepted ethertype {:?}",
                ethertype
            );
        }
    }

    #[test]
    fn test_group_accepts_neutron_field_name() {
        let json = r#"{"id": "sg1", "security_group_rules": [{"direction": "egress"}]}"#;
        let group: SecurityGroup = serde_json::from_str(json).unwrap();
        assert_eq!(group.rules.len(), 1);
        assert_eq!(group.rules[0].ethertype, EtherType::IPv4);
    }
}

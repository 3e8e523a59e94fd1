//! Match expression construction.
//!
//! Turns one security group rule, applied to one port, into a match string
//! of the form
//!
//! ```text
//! <direction> && <family> && <remote prefix> && <remote group> && <protocol/ports>
//! ```
//!
//! Clauses are emitted in that fixed order and joined with ` && `; absent
//! rule fields simply omit their clause. The order is part of the record's
//! identity for the backend's diffing, so it must not change.

use sgacl_types::{Direction, IpVersion, Port, SecurityGroupRule};

use crate::error::Result;
use crate::protocol::{self, Protocol, ProtocolClass};

const CLAUSE_SEPARATOR: &str = " && ";

/// Returns the address set name for a (remote group, family) pair.
///
/// The backend forbids `-` in address set names, so every `-` becomes `_`.
pub fn address_set_name(group_id: &str, version: IpVersion) -> String {
    format!("as-{}-{}", version.match_token(), group_id).replace('-', "_")
}

/// Direction clause.
///
/// An ingress rule guards traffic delivered *to* the port, which the switch
/// sees on the port's `outport`; egress traffic arrives on its `inport`.
pub fn direction_clause(direction: Direction, port_id: &str) -> String {
    let field = match direction {
        Direction::Ingress => "outport",
        Direction::Egress => "inport",
    };
    format!("{} == \"{}\"", field, port_id)
}

/// Side of the packet the remote peer's address sits on.
fn remote_side(direction: Direction) -> &'static str {
    match direction {
        Direction::Ingress => "src",
        Direction::Egress => "dst",
    }
}

/// Remote prefix clause: `ip4.src == 10.0.0.0/24` and the like.
pub fn remote_ip_prefix_clause(rule: &SecurityGroupRule, version: IpVersion) -> Option<String> {
    let prefix = rule.remote_ip_prefix.as_deref().filter(|p| !p.is_empty())?;
    Some(format!(
        "{}.{} == {}",
        version.match_token(),
        remote_side(rule.direction),
        prefix
    ))
}

/// Remote group clause, referencing the group's address set by name.
pub fn remote_group_clause(rule: &SecurityGroupRule, version: IpVersion) -> Option<String> {
    let group_id = rule.remote_group_id.as_deref().filter(|g| !g.is_empty())?;
    Some(format!(
        "{}.{} == ${}",
        version.match_token(),
        remote_side(rule.direction),
        address_set_name(group_id, version)
    ))
}

/// Protocol and port/type-code clauses.
///
/// `version` selects the ICMP flavor.
pub fn protocol_clauses(
    protocol: Option<Protocol>,
    min: Option<u32>,
    max: Option<u32>,
    version: IpVersion,
) -> Vec<String> {
    let Some(protocol) = protocol else {
        return Vec::new();
    };

    let mut clauses = Vec::new();
    match protocol.class() {
        ProtocolClass::Transport(name) => {
            clauses.push(name.to_string());
            match (min, max) {
                (Some(min), Some(max)) if min == max => {
                    clauses.push(format!("{}.dst == {}", name, min));
                }
                _ => {
                    if let Some(min) = min {
                        clauses.push(format!("{} >= {}", name, min));
                    }
                    if let Some(max) = max {
                        clauses.push(format!("{} <= {}", name, max));
                    }
                }
            }
        }
        ProtocolClass::Icmp => {
            let icmp = version.icmp_token();
            clauses.push(icmp.to_string());
            if let Some(icmp_type) = min {
                clauses.push(format!("{}.type == {}", icmp, icmp_type));
            }
            if let Some(code) = max {
                clauses.push(format!("{}.code == {}", icmp, code));
            }
        }
        ProtocolClass::Other => {
            clauses.push(format!("ip.proto == {}", protocol.canonical()));
        }
    }
    clauses
}

/// Builds the match for a rule whose protocol has already been resolved.
///
/// This never fails; resolution is the only fallible step.
pub fn build_resolved_match(
    rule: &SecurityGroupRule,
    port: &Port,
    protocol: Option<Protocol>,
) -> String {
    let version = rule.ethertype.ip_version();

    let mut clauses = vec![
        direction_clause(rule.direction, &port.id),
        version.match_token().to_string(),
    ];
    clauses.extend(remote_ip_prefix_clause(rule, version));
    clauses.extend(remote_group_clause(rule, version));
    clauses.extend(protocol_clauses(
        protocol,
        rule.port_range_min,
        rule.port_range_max,
        version,
    ));

    clauses.join(CLAUSE_SEPARATOR)
}

/// Builds the full match for a rule applied to a port.
///
/// # Errors
///
/// Fails only when the rule's protocol cannot be resolved.
pub fn build_rule_match(rule: &SecurityGroupRule, port: &Port) -> Result<String> {
    let protocol = protocol::resolve(rule.protocol.as_ref())?;
    Ok(build_resolved_match(rule, port, protocol))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileError;
    use pretty_assertions::assert_eq;
    use sgacl_types::EtherType;

    fn port() -> Port {
        Port::new("P1", "N1")
    }

    fn ingress_v4() -> SecurityGroupRule {
        SecurityGroupRule::new(Direction::Ingress, EtherType::IPv4)
    }

    #[test]
    fn test_direction_inversion() {
        assert_eq!(direction_clause(Direction::Ingress, "P1"), "outport == \"P1\"");
        assert_eq!(direction_clause(Direction::Egress, "P1"), "inport == \"P1\"");
    }

    #[test]
    fn test_ssh_ingress() {
        let rule = ingress_v4()
            .with_protocol("tcp")
            .with_port_range(Some(22), Some(22));
        assert_eq!(
            build_rule_match(&rule, &port()).unwrap(),
            "outport == \"P1\" && ip4 && tcp && tcp.dst == 22"
        );
    }

    #[test]
    fn test_port_range_bounds() {
        let rule = ingress_v4()
            .with_protocol("udp")
            .with_port_range(Some(1000), Some(2000));
        assert_eq!(
            build_rule_match(&rule, &port()).unwrap(),
            "outport == \"P1\" && ip4 && udp && udp >= 1000 && udp <= 2000"
        );

        let min_only = ingress_v4().with_protocol("tcp").with_port_range(Some(1024), None);
        assert_eq!(
            build_rule_match(&min_only, &port()).unwrap(),
            "outport == \"P1\" && ip4 && tcp && tcp >= 1024"
        );

        let max_only = ingress_v4().with_protocol("sctp").with_port_range(None, Some(80));
        assert_eq!(
            build_rule_match(&max_only, &port()).unwrap(),
            "outport == \"P1\" && ip4 && sctp && sctp <= 80"
        );
    }

    #[test]
    fn test_icmp_type_without_code() {
        let rule = ingress_v4().with_protocol(1i64).with_port_range(Some(8), None);
        assert_eq!(
            build_rule_match(&rule, &port()).unwrap(),
            "outport == \"P1\" && ip4 && icmp4 && icmp4.type == 8"
        );
    }

    #[test]
    fn test_icmp6_type_and_code() {
        let rule = SecurityGroupRule::new(Direction::Egress, EtherType::IPv6)
            .with_protocol("ipv6-icmp")
            .with_port_range(Some(135), Some(0));
        assert_eq!(
            build_rule_match(&rule, &port()).unwrap(),
            "inport == \"P1\" && ip6 && icmp6 && icmp6.type == 135 && icmp6.code == 0"
        );
    }

    #[test]
    fn test_raw_protocol() {
        let rule = ingress_v4().with_protocol("gre");
        assert_eq!(
            build_rule_match(&rule, &port()).unwrap(),
            "outport == \"P1\" && ip4 && ip.proto == 47"
        );
    }

    #[test]
    fn test_remote_prefix_side() {
        let ingress = ingress_v4().with_remote_ip_prefix("192.168.0.0/16");
        assert_eq!(
            build_rule_match(&ingress, &port()).unwrap(),
            "outport == \"P1\" && ip4 && ip4.src == 192.168.0.0/16"
        );

        let egress = SecurityGroupRule::new(Direction::Egress, EtherType::IPv6)
            .with_remote_ip_prefix("fd00::/8");
        assert_eq!(
            build_rule_match(&egress, &port()).unwrap(),
            "inport == \"P1\" && ip6 && ip6.dst == fd00::/8"
        );
    }

    #[test]
    fn test_remote_group_uses_address_set() {
        let rule = ingress_v4().with_remote_group("sg-1234").with_protocol("tcp");
        assert_eq!(
            build_rule_match(&rule, &port()).unwrap(),
            "outport == \"P1\" && ip4 && ip4.src == $as_ip4_sg_1234 && tcp"
        );
    }

    #[test]
    fn test_prefix_and_group_both_emitted() {
        let rule = ingress_v4()
            .with_remote_ip_prefix("10.0.0.0/8")
            .with_remote_group("g");
        assert_eq!(
            build_rule_match(&rule, &port()).unwrap(),
            "outport == \"P1\" && ip4 && ip4.src == 10.0.0.0/8 && ip4.src == $as_ip4_g"
        );
    }

    #[test]
    fn test_every_constraint_is_emitted() {
        let icmp = ingress_v4().with_protocol("icmp").with_port_range(Some(8), None);
        assert_eq!(
            build_rule_match(&icmp, &port()).unwrap(),
            "outport == \"P1\" && ip4 && icmp4 && icmp4.type == 8"
        );

        let prefix = SecurityGroupRule::new(Direction::Egress, EtherType::IPv6)
            .with_remote_ip_prefix("fd00::/8")
            .with_protocol("icmp");
        assert_eq!(
            build_rule_match(&prefix, &port()).unwrap(),
            "inport == \"P1\" && ip6 && ip6.dst == fd00::/8 && icmp6"
        );

        let group = ingress_v4().with_remote_group("SG2");
        let expr = build_rule_match(&group, &port()).unwrap();
        assert_eq!(expr, "outport == \"P1\" && ip4 && ip4.src == $as_ip4_SG2");
        assert_ne!(expr, direction_clause(Direction::Ingress, "P1"));
    }

    #[test]
    fn test_no_protocol_is_wildcard() {
        assert_eq!(
            build_rule_match(&ingress_v4(), &port()).unwrap(),
            "outport == \"P1\" && ip4"
        );
    }

    #[test]
    fn test_unsupported_protocol() {
        let rule = ingress_v4().with_protocol("foo");
        assert!(matches!(
            build_rule_match(&rule, &port()),
            Err(CompileError::UnsupportedProtocol { .. })
        ));
    }

    #[test]
    fn test_address_set_name() {
        assert_eq!(
            address_set_name("1b2c-aa", IpVersion::V6),
            "as_ip6_1b2c_aa"
        );
        assert!(!address_set_name("a-b-c", IpVersion::V4).contains('-'));
    }
}

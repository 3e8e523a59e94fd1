//! ACL entry construction.
//!
//! Wraps a computed match plus its port context into an [`AclRecord`]. Three
//! shapes exist:
//!
//! - drop baseline (one per direction for a port)
//! - rule allow (stateful `allow-related`, one per rule)
//! - DHCP allow (request and, unless DHCP is native, response)
//!
//! Records come out with the optional logging columns present but unset;
//! whether they survive is decided by the caller for the whole batch.

use std::collections::BTreeMap;

use sgacl_types::{
    AclAction, AclDirection, AclPriority, AclRecord, Direction, LogColumns, Port,
    SecurityGroupRule, Subnet, ACL_PRIORITY_ALLOW, ACL_PRIORITY_DROP, EXTERNAL_ID_LPORT,
};

use crate::error::Result;
use crate::matcher;

/// Prefix of logical switch names derived from network IDs.
const LSWITCH_PREFIX: &str = "neutron-";

/// DHCP server and client UDP ports.
pub const DHCP_SERVER_PORT: u16 = 67;
pub const DHCP_CLIENT_PORT: u16 = 68;

/// Limited broadcast address DHCP discovery is sent to.
const IPV4_BROADCAST: &str = "255.255.255.255";

/// Returns the logical switch name for a network.
pub fn lswitch_name(network_id: &str) -> String {
    format!("{}{}", LSWITCH_PREFIX, network_id)
}

/// Returns the ACL pipeline a rule direction is enforced in.
pub fn acl_direction(direction: Direction) -> AclDirection {
    match direction {
        Direction::Ingress => AclDirection::ToLport,
        Direction::Egress => AclDirection::FromLport,
    }
}

/// Builds a record scoped to `port` with the common columns filled in.
pub fn port_acl(
    port: &Port,
    priority: AclPriority,
    action: AclAction,
    direction: AclDirection,
    match_expr: String,
) -> AclRecord {
    AclRecord {
        lswitch: Some(lswitch_name(&port.network_id)),
        lport: Some(port.id.clone()),
        priority,
        action,
        log: false,
        log_columns: Some(LogColumns::default()),
        direction,
        match_expr,
        external_ids: BTreeMap::from([(EXTERNAL_ID_LPORT.to_string(), port.id.clone())]),
    }
}

/// Drop entries for all IP traffic to and from the port.
pub fn drop_all_ip_traffic(port: &Port) -> Vec<AclRecord> {
    [
        (AclDirection::FromLport, Direction::Egress),
        (AclDirection::ToLport, Direction::Ingress),
    ]
    .into_iter()
    .map(|(acl_dir, rule_dir)| {
        let match_expr = format!("{} && ip", matcher::direction_clause(rule_dir, &port.id));
        port_acl(port, ACL_PRIORITY_DROP, AclAction::Drop, acl_dir, match_expr)
    })
    .collect()
}

/// Allow entry for a rule whose match has already been built.
pub fn rule_allow_entry(port: &Port, rule: &SecurityGroupRule, match_expr: String) -> AclRecord {
    port_acl(
        port,
        ACL_PRIORITY_ALLOW,
        AclAction::AllowRelated,
        acl_direction(rule.direction),
        match_expr,
    )
}

/// Builds the allow entry for a rule applied to a port.
///
/// # Errors
///
/// Fails when the rule's protocol cannot be resolved.
pub fn rule_allow(port: &Port, rule: &SecurityGroupRule) -> Result<AclRecord> {
    let match_expr = matcher::build_rule_match(rule, port)?;
    Ok(rule_allow_entry(port, rule, match_expr))
}

/// DHCP allow entries for one IPv4 subnet of the port.
///
/// Requests from the port are always allowed. Responses towards the port
/// are only allowed here when DHCP is served by an external agent; native
/// DHCP replies are injected by the switch itself.
///
/// These are generated whether or not DHCP is enabled on the subnet.
pub fn dhcp_allow(port: &Port, subnet: &Subnet, native_dhcp: bool) -> Vec<AclRecord> {
    let mut acls = Vec::with_capacity(2);

    if !native_dhcp {
        let match_expr = format!(
            "outport == \"{}\" && ip4 && ip4.src == {} && udp && udp.src == {} && udp.dst == {}",
            port.id, subnet.cidr, DHCP_SERVER_PORT, DHCP_CLIENT_PORT
        );
        acls.push(port_acl(
            port,
            ACL_PRIORITY_ALLOW,
            AclAction::Allow,
            AclDirection::ToLport,
            match_expr,
        ));
    }

    let match_expr = format!(
        "inport == \"{}\" && ip4 && ip4.dst == {{{}, {}}} && udp && udp.src == {} && udp.dst == {}",
        port.id, IPV4_BROADCAST, subnet.cidr, DHCP_CLIENT_PORT, DHCP_SERVER_PORT
    );
    acls.push(port_acl(
        port,
        ACL_PRIORITY_ALLOW,
        AclAction::Allow,
        AclDirection::FromLport,
        match_expr,
    ));

    acls
}

//! Default policy for a port: drop everything, then let DHCP through.

use std::collections::HashSet;

use sgacl_types::{AclRecord, Port, Subnet};

use crate::entry;

/// Builds the default-deny baseline for a port plus the DHCP allow entries
/// for each distinct subnet in `subnets`.
///
/// `subnets` is expected to hold the port's IPv4 subnets; a subnet listed
/// more than once only contributes its entries the first time.
pub fn default_policy(port: &Port, subnets: &[Subnet], native_dhcp: bool) -> Vec<AclRecord> {
    let mut acls = entry::drop_all_ip_traffic(port);

    let mut seen = HashSet::new();
    for subnet in subnets {
        if seen.insert(subnet.id.as_str()) {
            acls.extend(entry::dhcp_allow(port, subnet, native_dhcp));
        }
    }

    acls
}

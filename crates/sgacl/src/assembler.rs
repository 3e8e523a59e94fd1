//! Full ACL set compilation for ports.

use std::collections::HashSet;

use log::{debug, warn};
use sgacl_types::{AclRecord, IpVersion, Port, Subnet};

use crate::cache::LookupCache;
use crate::config::CompilerConfig;
use crate::defaults;
use crate::directory::{AclApplier, Directory};
use crate::entry;
use crate::error::{CompileError, Result};

/// Compiles security group rules into ACL records.
///
/// Holds only immutable configuration and a directory reference; lookups
/// are memoized in a caller-owned [`LookupCache`].
#[derive(Debug)]
pub struct AclCompiler<'a, D: Directory + ?Sized> {
    config: CompilerConfig,
    directory: &'a D,
}

impl<'a, D: Directory + ?Sized> AclCompiler<'a, D> {
    pub fn new(config: CompilerConfig, directory: &'a D) -> Self {
        Self { config, directory }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn directory(&self) -> &'a D {
        self.directory
    }

    /// Returns true if the optional logging columns must be removed from
    /// compiled records.
    pub(crate) fn strip_log_columns(&self) -> bool {
        !self.config.capabilities.name_severity_columns
    }

    /// Distinct IPv4 subnets of the port's fixed IPs, in first-seen order.
    ///
    /// Fixed IPs with an IPv6 or unparseable address are ignored, as are
    /// subnets the directory does not know.
    fn ipv4_subnets(&self, port: &Port, cache: &mut LookupCache) -> Vec<Subnet> {
        let mut seen = HashSet::new();
        let mut subnets = Vec::new();

        for fixed_ip in &port.fixed_ips {
            if fixed_ip.ip_version() != Some(IpVersion::V4) {
                continue;
            }
            if !seen.insert(fixed_ip.subnet_id.as_str()) {
                continue;
            }
            match cache.subnet(self.directory, &fixed_ip.subnet_id) {
                Some(subnet) if subnet.ip_version() == Some(IpVersion::V4) => subnets.push(subnet),
                Some(subnet) => debug!(
                    "Subnet {} ({}) of port {} is not IPv4, skipping DHCP entries",
                    subnet.id, subnet.cidr, port.id
                ),
                None => debug!(
                    "Subnet {} of port {} not found, skipping DHCP entries",
                    fixed_ip.subnet_id, port.id
                ),
            }
        }

        subnets
    }

    /// Compiles the complete ACL set for one port.
    ///
    /// The set is the drop baseline, then DHCP allows per IPv4 subnet, then
    /// one allow per distinct rule across the port's security groups. The
    /// port gets no entries at all when enforcement is disabled, when it is
    /// trusted, or when it has no security groups.
    ///
    /// # Errors
    ///
    /// Fails with [`CompileError::UnsupportedProtocol`] if any rule of any
    /// of the port's groups has an unresolvable protocol. No partial set is
    /// returned in that case.
    pub fn compile_port(&self, port: &Port, cache: &mut LookupCache) -> Result<Vec<AclRecord>> {
        if !self.config.security_groups_enabled {
            return Ok(Vec::new());
        }
        if port.is_trusted() {
            debug!("Port {} is trusted, no ACLs", port.id);
            return Ok(Vec::new());
        }
        if port.security_groups.is_empty() {
            return Ok(Vec::new());
        }

        let subnets = self.ipv4_subnets(port, cache);
        let mut acls = defaults::default_policy(port, &subnets, self.config.native_dhcp);
        let mut seen: HashSet<AclRecord> = acls.iter().cloned().collect();

        for group_id in &port.security_groups {
            let Some(group) = cache.security_group(self.directory, group_id) else {
                debug!(
                    "Security group {} of port {} not found, skipping",
                    group_id, port.id
                );
                continue;
            };

            for rule in &group.rules {
                let acl = entry::rule_allow(port, rule).map_err(|e| {
                    warn!(
                        "Rule {} of security group {} rejected for port {}: {}",
                        rule.id.as_deref().unwrap_or("<unnamed>"),
                        group_id,
                        port.id,
                        e
                    );
                    e
                })?;
                if seen.insert(acl.clone()) {
                    acls.push(acl);
                }
            }
        }

        if self.strip_log_columns() {
            acls.iter_mut().for_each(AclRecord::strip_log_columns);
        }

        debug!("Compiled {} ACLs for port {}", acls.len(), port.id);
        Ok(acls)
    }

    /// Compiles a batch of ports sharing one cache.
    ///
    /// Returns one `(port id, ACL set)` pair per port, in input order. The
    /// first failing port aborts the batch.
    pub fn compile_ports(
        &self,
        ports: &[Port],
        cache: &mut LookupCache,
    ) -> Result<Vec<(String, Vec<AclRecord>)>> {
        ports
            .iter()
            .map(|port| Ok((port.id.clone(), self.compile_port(port, cache)?)))
            .collect()
    }

    /// Compiles a port and hands its ACL set to `applier`.
    pub fn apply_port<A>(&self, port: &Port, cache: &mut LookupCache, applier: &A) -> Result<()>
    where
        A: AclApplier + ?Sized,
    {
        let acls = self.compile_port(port, cache)?;
        applier
            .apply_port_acls(&port.id, &acls)
            .map_err(CompileError::Apply)
    }
}

//! Incremental updates for a single rule change.
//!
//! Adding or removing one rule of a security group touches exactly one ACL
//! entry per member port. Rather than recompiling each port, the entries
//! are computed directly and handed to the applier as one batch, which
//! locates the records to insert or retract by their column values.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use sgacl_types::{AclRecord, Port, SecurityGroupRule};

use crate::assembler::AclCompiler;
use crate::cache::LookupCache;
use crate::directory::{AclApplier, Directory};
use crate::entry;
use crate::error::{CompileError, Result};
use crate::matcher;
use crate::protocol;

/// The entries one rule change adds to (or removes from) its group's
/// member ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclUpdate {
    /// Logical switches holding the affected ports.
    pub switches: BTreeSet<String>,
    /// Affected ports, in directory order.
    pub ports: Vec<Port>,
    /// Port ID → entry. Entries carry no switch or port reference.
    pub entries: BTreeMap<String, AclRecord>,
    /// True to insert the entries, false to retract them.
    pub is_add: bool,
}

impl AclUpdate {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, port_id: &str) -> Option<&AclRecord> {
        self.entries.get(port_id)
    }
}

impl<D: Directory + ?Sized> AclCompiler<'_, D> {
    /// Computes the per-port entries for a rule added to or removed from
    /// `group_id`.
    ///
    /// Returns `Ok(None)` when enforcement is disabled or when the group
    /// has no untrusted member ports.
    ///
    /// # Errors
    ///
    /// Fails with [`CompileError::UnsupportedProtocol`] if the rule's
    /// protocol cannot be resolved. The rule is resolved before any port is
    /// visited, so no partial update is produced.
    pub fn update_for_rule_change(
        &self,
        group_id: &str,
        rule: &SecurityGroupRule,
        is_add: bool,
        cache: &mut LookupCache,
    ) -> Result<Option<AclUpdate>> {
        if !self.config().security_groups_enabled {
            return Ok(None);
        }

        let protocol = protocol::resolve(rule.protocol.as_ref()).map_err(|e| {
            warn!("Rule change for security group {} rejected: {}", group_id, e);
            e
        })?;

        let mut seen = HashSet::new();
        let port_ids: Vec<String> = cache
            .ports_in_group(self.directory(), group_id)
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .collect();
        if port_ids.is_empty() {
            return Ok(None);
        }

        let mut switches = BTreeSet::new();
        let mut ports = Vec::new();
        let mut entries = BTreeMap::new();

        for port in self.directory().get_ports(&port_ids) {
            if port.is_trusted() {
                debug!("Skipping trusted port {}", port.id);
                continue;
            }

            let match_expr = matcher::build_resolved_match(rule, &port, protocol);
            let mut acl = entry::rule_allow_entry(&port, rule, match_expr);
            acl.strip_location();
            if self.strip_log_columns() {
                acl.strip_log_columns();
            }

            switches.insert(entry::lswitch_name(&port.network_id));
            entries.insert(port.id.clone(), acl);
            ports.push(port);
        }

        if ports.is_empty() {
            return Ok(None);
        }

        debug!(
            "Rule change for security group {} touches {} ports on {} switches",
            group_id,
            ports.len(),
            switches.len()
        );
        Ok(Some(AclUpdate {
            switches,
            ports,
            entries,
            is_add,
        }))
    }

    /// Computes a rule change and hands it to `applier` in one call.
    ///
    /// Returns whether anything was applied.
    pub fn apply_rule_change<A>(
        &self,
        group_id: &str,
        rule: &SecurityGroupRule,
        is_add: bool,
        cache: &mut LookupCache,
        applier: &A,
    ) -> Result<bool>
    where
        A: AclApplier + ?Sized,
    {
        match self.update_for_rule_change(group_id, rule, is_add, cache)? {
            Some(update) => {
                applier.apply_update(&update).map_err(CompileError::Apply)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompilerConfig;
    use crate::directory::InMemoryDirectory;
    use pretty_assertions::assert_eq;
    use sgacl_types::{AclAction, AclDirection, Direction, EtherType};

    fn rule() -> SecurityGroupRule {
        SecurityGroupRule::new(Direction::Egress, EtherType::IPv6).with_protocol("udp")
    }

    fn directory() -> InMemoryDirectory {
        InMemoryDirectory::new()
            .with_port(Port::new("P1", "N1").with_security_group("SG1"))
            .with_port(Port::new("P2", "N2").with_security_group("SG1"))
            .with_port(
                Port::new("R1", "N1")
                    .with_security_group("SG1")
                    .with_device_owner("network:router_interface"),
            )
    }

    #[test]
    fn test_entries_per_port() {
        let dir = directory();
        let compiler = AclCompiler::new(CompilerConfig::default(), &dir);
        let update = compiler
            .update_for_rule_change("SG1", &rule(), true, &mut LookupCache::new())
            .unwrap()
            .unwrap();

        assert!(update.is_add);
        assert_eq!(update.len(), 2);
        assert_eq!(
            update.switches.iter().cloned().collect::<Vec<_>>(),
            vec!["neutron-N1", "neutron-N2"]
        );
        assert_eq!(
            update.ports.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
            vec!["P1", "P2"]
        );

        let acl = update.entry("P2").unwrap();
        assert_eq!(acl.lswitch, None);
        assert_eq!(acl.lport, None);
        assert_eq!(acl.owner_port(), Some("P2"));
        assert_eq!(acl.action, AclAction::AllowRelated);
        assert_eq!(acl.direction, AclDirection::FromLport);
        assert_eq!(acl.match_expr, "inport == \"P2\" && ip6 && udp");
        assert!(update.entry("R1").is_none());
    }

    #[test]
    fn test_empty_group() {
        let dir = directory();
        let compiler = AclCompiler::new(CompilerConfig::default(), &dir);
        assert!(compiler
            .update_for_rule_change("SG9", &rule(), true, &mut LookupCache::new())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_only_trusted_members() {
        let dir = InMemoryDirectory::new().with_port(
            Port::new("T1", "N1")
                .with_security_group("SG1")
                .with_trusted(true),
        );
        let compiler = AclCompiler::new(CompilerConfig::default(), &dir);
        assert!(compiler
            .update_for_rule_change("SG1", &rule(), false, &mut LookupCache::new())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_bad_protocol_fails_whole_update() {
        let dir = directory();
        let compiler = AclCompiler::new(CompilerConfig::default(), &dir);
        let bad = rule().with_protocol("foo");
        assert!(matches!(
            compiler.update_for_rule_change("SG1", &bad, true, &mut LookupCache::new()),
            Err(CompileError::UnsupportedProtocol { .. })
        ));
    }

    #[test]
    fn test_columns_stripped() {
        let dir = directory();
        let config = CompilerConfig::default().with_name_severity_columns(false);
        let compiler = AclCompiler::new(config, &dir);
        let update = compiler
            .update_for_rule_change("SG1", &rule(), true, &mut LookupCache::new())
            .unwrap()
            .unwrap();
        assert!(update.entries.values().all(|acl| acl.log_columns.is_none()));
    }

    #[test]
    fn test_disabled() {
        let dir = directory();
        let config = CompilerConfig::default().with_security_groups_enabled(false);
        let compiler = AclCompiler::new(config, &dir);
        let bad = rule().with_protocol("foo");
        assert_eq!(
            compiler
                .update_for_rule_change("SG1", &bad, true, &mut LookupCache::new())
                .unwrap(),
            None
        );
    }
}

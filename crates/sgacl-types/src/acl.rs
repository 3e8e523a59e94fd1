//! ACL record types.
//!
//! An [`AclRecord`] is the compiler's sole output artifact: a
//! priority/action/match entry in the virtual switch's ACL table. Records are
//! built fresh per compilation and never mutated once handed to the apply
//! layer.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// ACL priority (higher value wins on overlapping matches).
pub type AclPriority = u32;

/// Priority of allow entries. Must stay above [`ACL_PRIORITY_DROP`] so that
/// explicit allowances win over the default deny.
pub const ACL_PRIORITY_ALLOW: AclPriority = 1002;

/// Priority of the default drop entries.
pub const ACL_PRIORITY_DROP: AclPriority = 1001;

/// External ID key linking an ACL back to its owning port.
pub const EXTERNAL_ID_LPORT: &str = "neutron:lport";

/// ACL action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AclAction {
    #[serde(rename = "allow")]
    Allow,
    /// Stateful allow: replies to allowed traffic are permitted automatically.
    #[serde(rename = "allow-related")]
    AllowRelated,
    #[serde(rename = "drop")]
    Drop,
}

impl fmt::Display for AclAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => write!(f, "allow"),
            Self::AllowRelated => write!(f, "allow-related"),
            Self::Drop => write!(f, "drop"),
        }
    }
}

impl FromStr for AclAction {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allow" => Ok(Self::Allow),
            "allow-related" => Ok(Self::AllowRelated),
            "drop" => Ok(Self::Drop),
            _ => Err(ParseError::InvalidAction(s.to_string())),
        }
    }
}

/// Pipeline an ACL is evaluated in, from the logical switch's viewpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AclDirection {
    /// Traffic entering the switch from the port (port egress).
    #[serde(rename = "from-lport")]
    FromLport,
    /// Traffic leaving the switch towards the port (port ingress).
    #[serde(rename = "to-lport")]
    ToLport,
}

impl fmt::Display for AclDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FromLport => write!(f, "from-lport"),
            Self::ToLport => write!(f, "to-lport"),
        }
    }
}

impl FromStr for AclDirection {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "from-lport" => Ok(Self::FromLport),
            "to-lport" => Ok(Self::ToLport),
            _ => Err(ParseError::InvalidAclDirection(s.to_string())),
        }
    }
}

/// Optional logging columns of the ACL table.
///
/// Older schemas do not declare these columns; records compiled for such
/// schemas carry no `LogColumns` at all.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LogColumns {
    pub name: Option<String>,
    pub severity: Option<String>,
}

/// A single ACL entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AclRecord {
    /// Logical switch the entry is scoped to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lswitch: Option<String>,
    /// Logical port the entry guards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lport: Option<String>,
    pub priority: AclPriority,
    pub action: AclAction,
    pub log: bool,
    #[serde(flatten, default, skip_serializing_if = "Option::is_none")]
    pub log_columns: Option<LogColumns>,
    pub direction: AclDirection,
    #[serde(rename = "match")]
    pub match_expr: String,
    #[serde(default)]
    pub external_ids: BTreeMap<String, String>,
}

impl AclRecord {
    /// Returns the owning port recorded in the external IDs.
    pub fn owner_port(&self) -> Option<&str> {
        self.external_ids.get(EXTERNAL_ID_LPORT).map(String::as_str)
    }

    /// Drops the optional logging columns.
    pub fn strip_log_columns(&mut self) {
        self.log_columns = None;
    }

    /// Drops the switch and port references, leaving only the column
    /// values an in-place update needs.
    pub fn strip_location(&mut self) {
        self.lswitch = None;
        self.lport = None;
    }
}

impl fmt::Display for AclRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AclRecord({}, priority={}, action={}, match={})",
            self.direction, self.priority, self.action, self.match_expr
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> AclRecord {
        AclRecord {
            lswitch: Some("neutron-n1".to_string()),
            lport: Some("p1".to_string()),
            priority: ACL_PRIORITY_DROP,
            action: AclAction::Drop,
            log: false,
            log_columns: Some(LogColumns::default()),
            direction: AclDirection::FromLport,
            match_expr: "inport == \"p1\" && ip".to_string(),
            external_ids: BTreeMap::from([(EXTERNAL_ID_LPORT.to_string(), "p1".to_string())]),
        }
    }

    #[test]
    fn test_priority_ordering() {
        assert!(ACL_PRIORITY_ALLOW > ACL_PRIORITY_DROP);
    }

    #[test]
    fn test_action_parse_display() {
        assert_eq!("allow-related".parse::<AclAction>().unwrap(), AclAction::AllowRelated);
        assert_eq!(AclAction::Drop.to_string(), "drop");
        assert!("reject".parse::<AclAction>().is_err());
        assert_eq!("to-lport".parse::<AclDirection>().unwrap(), AclDirection::ToLport);
    }

    #[test]
    fn test_serialize_full_record() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["lswitch"], "neutron-n1");
        assert_eq!(value["action"], "drop");
        assert_eq!(value["direction"], "from-lport");
        assert_eq!(value["match"], "inport == \"p1\" && ip");
        assert!(value.get("name").is_some());
        assert!(value["name"].is_null());
        assert_eq!(value["external_ids"]["neutron:lport"], "p1");
    }

    #[test]
    fn test_serialize_stripped_record() {
        let mut acl = sample();
        acl.strip_log_columns();
        acl.strip_location();
        let value = serde_json::to_value(&acl).unwrap();
        assert!(value.get("name").is_none());
        assert!(value.get("severity").is_none());
        assert!(value.get("lswitch").is_none());
        assert!(value.get("lport").is_none());
        assert_eq!(acl.owner_port(), Some("p1"));
    }
}

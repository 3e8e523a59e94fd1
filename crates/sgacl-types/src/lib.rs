//! Data model for security-group ACL compilation.
//!
//! This crate provides the records exchanged between the directory service,
//! the ACL compiler and the apply layer:
//!
//! - [`SecurityGroupRule`] / [`SecurityGroup`]: declarative rules
//! - [`Port`] / [`Subnet`]: the resolved network objects a port ACL set is built for
//! - [`AclRecord`]: a single priority/action/match entry for the virtual switch
//! - [`IpVersion`] / [`IpNetwork`]: address family discrimination and CIDR parsing

mod acl;
mod ip;
mod port;
mod rule;

pub use acl::{
    AclAction, AclDirection, AclPriority, AclRecord, LogColumns, ACL_PRIORITY_ALLOW,
    ACL_PRIORITY_DROP, EXTERNAL_ID_LPORT,
};
pub use ip::{IpNetwork, IpVersion};
pub use port::{AllowedAddressPair, FixedIp, Port, Subnet};
pub use rule::{Direction, EtherType, ProtocolToken, SecurityGroup, SecurityGroupRule};

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid IP address format: {0}")]
    InvalidIpAddress(String),

    #[error("invalid IP network format: {0}")]
    InvalidIpNetwork(String),

    #[error("invalid ethertype: {0}")]
    InvalidEtherType(String),

    #[error("invalid rule direction: {0}")]
    InvalidDirection(String),

    #[error("invalid ACL action: {0}")]
    InvalidAction(String),

    #[error("invalid ACL direction: {0}")]
    InvalidAclDirection(String),
}

//! Protocol resolution.
//!
//! Normalizes a rule's protocol token (a number in 0-255, given as an integer
//! or a string, or a well-known name) into its canonical numeric form and
//! classifies it for match construction.

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use sgacl_types::ProtocolToken;

use crate::error::{CompileError, Result};

/// Well-known IP protocol names and their numbers.
const IP_PROTOCOLS: &[(&str, u8)] = &[
    ("ah", 51),
    ("dccp", 33),
    ("egp", 8),
    ("esp", 50),
    ("gre", 47),
    ("icmp", 1),
    // Legacy alias of ipv6-icmp.
    ("icmpv6", 58),
    ("igmp", 2),
    ("ipip", 4),
    ("ipv6-encap", 41),
    ("ipv6-frag", 44),
    ("ipv6-icmp", 58),
    ("ipv6-nonxt", 59),
    ("ipv6-opts", 60),
    ("ipv6-route", 43),
    ("ospf", 89),
    ("pgm", 113),
    ("rsvp", 46),
    ("sctp", 132),
    ("tcp", 6),
    ("udp", 17),
    ("udplite", 136),
    ("vrrp", 112),
];

/// Protocol numbers matched with port ranges (TCP, UDP, SCTP).
pub const TRANSPORT_PROTOCOLS: [u8; 3] = [6, 17, 132];

/// Protocol numbers matched with type/code (ICMPv4, ICMPv6 and its legacy name).
pub const ICMP_PROTOCOLS: [u8; 2] = [1, 58];

/// Protocol name → number.
static PROTOCOL_NAME_TO_NUM: Lazy<BTreeMap<&'static str, u8>> =
    Lazy::new(|| IP_PROTOCOLS.iter().copied().collect());

/// Protocol number → name. Aliased numbers keep the last name listed.
static PROTOCOL_NUM_TO_NAME: Lazy<BTreeMap<u8, &'static str>> =
    Lazy::new(|| IP_PROTOCOLS.iter().map(|&(name, num)| (num, name)).collect());

/// Comma-separated list of every supported protocol name.
static VALID_PROTOCOLS: Lazy<String> = Lazy::new(|| {
    PROTOCOL_NAME_TO_NUM
        .keys()
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
});

/// Match-construction class of a protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolClass {
    /// Port-based transport protocol, carrying its match-grammar name.
    Transport(&'static str),
    /// ICMP for either address family.
    Icmp,
    /// Any other IP protocol, matched by raw number.
    Other,
}

/// A resolved protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Protocol(u8);

impl Protocol {
    pub const fn number(&self) -> u8 {
        self.0
    }

    /// Returns the canonical numeric token (the number as a string).
    pub fn canonical(&self) -> String {
        self.0.to_string()
    }

    /// Returns the well-known name for this number, if any.
    pub fn name(&self) -> Option<&'static str> {
        PROTOCOL_NUM_TO_NAME.get(&self.0).copied()
    }

    pub fn class(&self) -> ProtocolClass {
        if TRANSPORT_PROTOCOLS.contains(&self.0) {
            match self.name() {
                Some(name) => ProtocolClass::Transport(name),
                None => ProtocolClass::Other,
            }
        } else if ICMP_PROTOCOLS.contains(&self.0) {
            ProtocolClass::Icmp
        } else {
            ProtocolClass::Other
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Returns the comma-separated list of supported protocol names.
pub fn valid_protocols() -> &'static str {
    VALID_PROTOCOLS.as_str()
}

fn from_number(n: i64, token: &ProtocolToken) -> Result<Protocol> {
    u8::try_from(n)
        .map(Protocol)
        .map_err(|_| CompileError::unsupported_protocol(token.to_string(), valid_protocols()))
}

/// Resolves a protocol token.
///
/// Returns `Ok(None)` when no protocol is given, which callers treat as a
/// wildcard.
///
/// # Errors
///
/// Returns [`CompileError::UnsupportedProtocol`] for numbers outside 0-255
/// and for unknown names.
pub fn resolve(token: Option<&ProtocolToken>) -> Result<Option<Protocol>> {
    let Some(token) = token else {
        return Ok(None);
    };

    let protocol = match token {
        ProtocolToken::Number(n) => from_number(*n, token)?,
        ProtocolToken::Name(name) => match name.trim().parse::<i64>() {
            Ok(n) => from_number(n, token)?,
            Err(_) => PROTOCOL_NAME_TO_NUM
                .get(name.as_str())
                .copied()
                .map(Protocol)
                .ok_or_else(|| {
                    CompileError::unsupported_protocol(name.clone(), valid_protocols())
                })?,
        },
    };

    Ok(Some(protocol))
}

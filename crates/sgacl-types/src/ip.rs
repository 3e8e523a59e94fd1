//! IP version and network types with safe parsing.

use crate::ParseError;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// IP address family.
///
/// Besides discrimination, this carries the tokens used by the ACL match
/// grammar for the family (`ip4`/`ip6`, `icmp4`/`icmp6`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    /// Returns the match-grammar family token.
    pub const fn match_token(&self) -> &'static str {
        match self {
            IpVersion::V4 => "ip4",
            IpVersion::V6 => "ip6",
        }
    }

    /// Returns the ICMP token for this family.
    pub const fn icmp_token(&self) -> &'static str {
        match self {
            IpVersion::V4 => "icmp4",
            IpVersion::V6 => "icmp6",
        }
    }

    /// Returns the numeric version (4 or 6).
    pub const fn number(&self) -> u8 {
        match self {
            IpVersion::V4 => 4,
            IpVersion::V6 => 6,
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.match_token())
    }
}

impl From<&IpAddr> for IpVersion {
    fn from(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => IpVersion::V4,
            IpAddr::V6(_) => IpVersion::V6,
        }
    }
}

/// An IP address with an optional prefix length.
///
/// Accepts both bare addresses (`10.0.0.5`) and CIDR notation
/// (`10.0.0.0/24`), the same inputs a port's fixed IPs and allowed address
/// pairs may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpNetwork {
    address: IpAddr,
    prefix_len: Option<u8>,
}

impl IpNetwork {
    /// Creates a new network.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix length exceeds 32 for IPv4 or 128 for
    /// IPv6.
    pub fn new(address: IpAddr, prefix_len: Option<u8>) -> Result<Self, ParseError> {
        let max_len = match address {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };

        if let Some(len) = prefix_len {
            if len > max_len {
                return Err(ParseError::InvalidIpNetwork(format!(
                    "prefix length {} exceeds maximum {} for {}",
                    len, max_len, address
                )));
            }
        }

        Ok(IpNetwork {
            address,
            prefix_len,
        })
    }

    pub const fn address(&self) -> &IpAddr {
        &self.address
    }

    pub const fn prefix_len(&self) -> Option<u8> {
        self.prefix_len
    }

    /// Returns the address family of this network.
    pub fn version(&self) -> IpVersion {
        IpVersion::from(&self.address)
    }
}

impl fmt::Display for IpNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.prefix_len {
            Some(len) => write!(f, "{}/{}", self.address, len),
            None => write!(f, "{}", self.address),
        }
    }
}

impl FromStr for IpNetwork {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr_str, len_str) = match s.trim().rsplit_once('/') {
            Some((addr, len)) => (addr, Some(len)),
            None => (s.trim(), None),
        };

        let address: IpAddr = addr_str
            .parse()
            .map_err(|_| ParseError::InvalidIpAddress(s.to_string()))?;
        let prefix_len = len_str
            .map(|l| {
                l.parse::<u8>()
                    .map_err(|_| ParseError::InvalidIpNetwork(s.to_string()))
            })
            .transpose()?;

        IpNetwork::new(address, prefix_len)
    }
}

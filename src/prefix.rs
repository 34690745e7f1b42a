//! IPv4 prefix type and the line-level prefix parser.

use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use serde::{Serialize, Serializer};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use crate::error::PrefixParseError;

/// Width of an IPv4 address in bits.
pub const V4_BITS: u8 = 32;

/// Width of an IPv6 address in bits.
pub const V6_BITS: u8 = 128;

/// A canonical IPv4 network: host bits are always zero.
///
/// # Examples
/// ```
/// use subnet_lists::Prefix;
///
/// let p: Prefix = "10.1.2.3/16".parse().unwrap();
/// assert_eq!(p.to_string(), "10.1.0.0/16");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Prefix(Ipv4Net);

impl Prefix {
    /// Create a prefix, masking `addr` down to its network address.
    pub fn new(addr: Ipv4Addr, prefix_len: u8) -> Result<Self, PrefixParseError> {
        Ipv4Net::new(addr, prefix_len)
            .map(Self::from_net)
            .map_err(|_| PrefixParseError::LengthOutOfRange {
                literal: format!("{}/{}", addr, prefix_len),
                max: V4_BITS,
            })
    }

    /// Wrap an existing network, dropping any host bits.
    pub fn from_net(net: Ipv4Net) -> Self {
        Prefix(net.trunc())
    }

    /// Build a block from a raw network number.
    ///
    /// Returns `None` when `prefix_len` exceeds 32.
    pub(crate) fn from_bits(network: u32, prefix_len: u8) -> Option<Self> {
        Ipv4Net::new(Ipv4Addr::from(network), prefix_len)
            .ok()
            .map(Self::from_net)
    }

    /// Network address.
    pub fn network(&self) -> Ipv4Addr {
        self.0.network()
    }

    /// Last address covered by this prefix.
    pub fn broadcast(&self) -> Ipv4Addr {
        self.0.broadcast()
    }

    pub fn prefix_len(&self) -> u8 {
        self.0.prefix_len()
    }

    /// Number of addresses covered (`2^(32 - len)`).
    pub fn size(&self) -> u64 {
        1u64 << (V4_BITS - self.prefix_len())
    }

    /// Check whether `addr` falls inside this prefix.
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        self.0.contains(&addr)
    }

    /// Underlying `ipnet` value.
    pub fn as_net(&self) -> Ipv4Net {
        self.0
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0.network(), self.0.prefix_len())
    }
}

impl FromStr for Prefix {
    type Err = PrefixParseError;

    /// Parse an IPv4 literal; IPv6 literals are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_prefix(s)? {
            IpNet::V4(net) => Ok(Prefix::from_net(net)),
            IpNet::V6(_) => Err(PrefixParseError::InvalidAddress(s.trim().to_string())),
        }
    }
}

impl From<Ipv4Net> for Prefix {
    fn from(net: Ipv4Net) -> Self {
        Prefix::from_net(net)
    }
}

impl Serialize for Prefix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Canonical `a.b.c.d/n` text shared by every output format.
pub fn to_canonical_text(prefix: &Prefix) -> String {
    prefix.to_string()
}

/// Address families the normalizer can aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum AddressFamily {
    #[default]
    Ipv4,
}

impl AddressFamily {
    /// Keep `net` if it belongs to this family.
    ///
    /// Networks of any other family are dropped without an error.
    pub fn select(self, net: IpNet) -> Option<Prefix> {
        match (self, net) {
            (AddressFamily::Ipv4, IpNet::V4(v4)) => Some(Prefix::from_net(v4)),
            (AddressFamily::Ipv4, IpNet::V6(_)) => None,
        }
    }
}

/// Parse one feed token as a CIDR literal.
///
/// Accepts `addr/len` and a bare address (host route, full-length prefix).
/// Both IPv4 and IPv6 syntax parse; family filtering happens later.
/// The returned network has its host bits cleared.
pub fn parse_prefix(literal: &str) -> Result<IpNet, PrefixParseError> {
    let literal = literal.trim();
    if literal.is_empty() {
        return Err(PrefixParseError::Empty);
    }

    let (addr_part, len_part) = match literal.split_once('/') {
        Some((addr, len)) => (addr, Some(len)),
        None => (literal, None),
    };

    let addr: IpAddr = addr_part
        .parse()
        .map_err(|_| PrefixParseError::InvalidAddress(literal.to_string()))?;

    let max = match addr {
        IpAddr::V4(_) => V4_BITS,
        IpAddr::V6(_) => V6_BITS,
    };

    let prefix_len = match len_part {
        None => max,
        Some(len) => parse_length(len, literal, max)?,
    };

    if prefix_len > max {
        return Err(PrefixParseError::LengthOutOfRange {
            literal: literal.to_string(),
            max,
        });
    }

    let out_of_range = || PrefixParseError::LengthOutOfRange {
        literal: literal.to_string(),
        max,
    };
    let net = match addr {
        IpAddr::V4(v4) => IpNet::V4(Ipv4Net::new(v4, prefix_len).map_err(|_| out_of_range())?),
        IpAddr::V6(v6) => IpNet::V6(Ipv6Net::new(v6, prefix_len).map_err(|_| out_of_range())?),
    };
    Ok(net.trunc())
}

/// Digits only: `u8::from_str` would also take a leading `+`.
fn parse_length(len: &str, literal: &str, max: u8) -> Result<u8, PrefixParseError> {
    if len.is_empty() || !len.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PrefixParseError::InvalidLength(literal.to_string()));
    }
    match len.parse::<u8>() {
        Ok(n) => Ok(n),
        // Too many digits for u8 is still just a length that is too large.
        Err(_) => Err(PrefixParseError::LengthOutOfRange {
            literal: literal.to_string(),
            max,
        }),
    }
}

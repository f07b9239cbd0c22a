//! IPv4 address blocks in CIDR notation.
//!
//! Provides [`Ipv4`] for network blocks, subnets and route destinations,
//! along with the mask arithmetic used to carve subnets out of a block.

use crate::config::RESERVED_ADDRESSES_PER_SUBNET;
use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

/// Maximum length for an IPv4 subnet mask (32 bits).
pub const MAX_LENGTH: u8 = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CidrError {
    #[error("invalid CIDR format '{0}', expected address/length")]
    Format(String),
    #[error("invalid address '{0}'")]
    Address(String),
    #[error("invalid prefix length '{0}'")]
    Length(String),
    #[error("network length {0} is too long")]
    TooLong(u8),
    #[error("{0} has host bits set, expected {1}")]
    HostBits(Ipv4, Ipv4),
    #[error("next subnet after {0} overflows the address space")]
    Overflow(Ipv4),
}

/// Convert a CIDR prefix length to a subnet mask as u32.
///
/// # Examples
/// ```
/// use topology_synth::models::get_cidr_mask;
/// assert_eq!(get_cidr_mask(24).unwrap(), 0xFFFFFF00);
/// ```
pub fn get_cidr_mask(len: u8) -> Result<u32, CidrError> {
    if len > MAX_LENGTH {
        Err(CidrError::TooLong(len))
    } else {
        let right_len = MAX_LENGTH - len;
        let all_bits = u32::MAX as u64;

        let mask = (all_bits >> right_len) << right_len;

        Ok(mask as u32)
    }
}

/// Get the network address for a given IP and prefix length.
pub fn cut_addr(addr: Ipv4Addr, len: u8) -> Result<Ipv4Addr, CidrError> {
    let mask = get_cidr_mask(len)?;
    Ok(Ipv4Addr::from(u32::from(addr) & mask))
}

/// Calculate the broadcast address for a given IP and prefix length.
pub fn broadcast_addr(addr: Ipv4Addr, len: u8) -> Result<Ipv4Addr, CidrError> {
    let mask = get_cidr_mask(len)?;
    let network_bits = u32::from(addr) & mask;
    Ok(Ipv4Addr::from(network_bits | !mask))
}

/// Returns the IP address following the given subnet.
pub fn ip_after_subnet(addr: Ipv4Addr, cidr: u8) -> Result<Ipv4Addr, CidrError> {
    let network_bits = u32::from(addr) & get_cidr_mask(cidr)?;
    let subnet_size = 1u64 << (MAX_LENGTH - cidr);
    let next = network_bits as u64 + subnet_size;
    u32::try_from(next)
        .map(Ipv4Addr::from)
        .map_err(|_| CidrError::Overflow(Ipv4 { addr, mask: cidr }))
}

/// Calculate the next subnet after the given [`Ipv4`] subnet.
///
/// If `mask` is provided, the next subnet will use that mask size.
pub fn next_subnet_ipv4(ipv4: Ipv4, mask: Option<u8>) -> Result<Ipv4, CidrError> {
    let current_mask = ipv4.mask;
    let new_mask = mask.unwrap_or(current_mask);
    if new_mask <= current_mask {
        // eq or larger subnet (smaller mask)
        let next_subnet = ip_after_subnet(ipv4.addr, new_mask)?;
        Ok(Ipv4 {
            addr: next_subnet,
            mask: new_mask,
        })
    } else {
        // smaller subnet
        let current_broadcast = broadcast_addr(ipv4.addr, current_mask)?;
        let next_subnet = ip_after_subnet(current_broadcast, new_mask)?;
        Ok(Ipv4 {
            addr: next_subnet,
            mask: new_mask,
        })
    }
}

/// Number of usable host addresses in a subnet of the given length.
///
/// The provider reserves 5 addresses per subnet (network, router, DNS,
/// future use and broadcast).
pub fn usable_hosts(len: u8) -> Result<u64, CidrError> {
    if len > MAX_LENGTH - 4 {
        // smallest subnet the provider allows is /28
        Err(CidrError::TooLong(len))
    } else {
        Ok((1u64 << (MAX_LENGTH - len)) - RESERVED_ADDRESSES_PER_SUBNET)
    }
}

/// IPv4 address with CIDR notation support.
#[derive(Eq, Ord, Debug, Copy, Clone, Hash)]
pub struct Ipv4 {
    /// The IPv4 address.
    pub addr: Ipv4Addr,
    /// The subnet mask length (0-32).
    pub mask: u8,
}

impl Serialize for Ipv4 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Ipv4 {
    fn deserialize<D>(deserializer: D) -> Result<Ipv4, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ipv4::new(&s).map_err(de::Error::custom)
    }
}

impl FromStr for Ipv4 {
    type Err = CidrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ipv4::new(s)
    }
}

impl Ipv4 {
    /// Create a new [`Ipv4`] from a CIDR string (e.g., "10.0.0.0/24").
    pub fn new(addr_cidr: &str) -> Result<Ipv4, CidrError> {
        let addr_cidr = addr_cidr.trim();
        let (addr, mask) = addr_cidr
            .split_once('/')
            .ok_or_else(|| CidrError::Format(addr_cidr.to_string()))?;
        let addr: Ipv4Addr = addr
            .parse()
            .map_err(|_| CidrError::Address(addr.to_string()))?;
        let mask: u8 = mask
            .parse()
            .map_err(|_| CidrError::Length(mask.to_string()))?;
        if mask > MAX_LENGTH {
            return Err(CidrError::TooLong(mask));
        }
        Ok(Ipv4 { addr, mask })
    }

    /// Parse a CIDR string that must name a network address (no host bits).
    pub fn network(addr_cidr: &str) -> Result<Ipv4, CidrError> {
        let ipv4 = Ipv4::new(addr_cidr)?;
        let expected = Ipv4 {
            addr: ipv4.lo(),
            mask: ipv4.mask,
        };
        if expected != ipv4 {
            return Err(CidrError::HostBits(ipv4, expected));
        }
        Ok(ipv4)
    }

    /// The whole address space, `0.0.0.0/0`.
    pub fn anywhere() -> Ipv4 {
        Ipv4 {
            addr: Ipv4Addr::UNSPECIFIED,
            mask: 0,
        }
    }

    fn bits(&self) -> u32 {
        // mask is validated on construction; clamp for hand built values
        get_cidr_mask(self.mask.min(MAX_LENGTH)).unwrap_or(u32::MAX)
    }

    /// Get the lowest (network) address in the subnet.
    pub fn lo(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.addr) & self.bits())
    }

    /// Get the highest (broadcast) address in the subnet.
    pub fn hi(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.addr) | !self.bits())
    }

    /// Number of addresses in the block.
    pub fn size(&self) -> u64 {
        1u64 << (MAX_LENGTH - self.mask.min(MAX_LENGTH))
    }

    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        ip >= self.lo() && ip <= self.hi()
    }

    /// True when every address of `other` lies within this block.
    pub fn contains_block(&self, other: &Ipv4) -> bool {
        self.contains(other.lo()) && self.contains(other.hi())
    }

    /// True when the two blocks share at least one address.
    pub fn overlaps(&self, other: &Ipv4) -> bool {
        self.lo() <= other.hi() && other.lo() <= self.hi()
    }
}

impl std::fmt::Display for Ipv4 {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}/{}", self.addr, self.mask)
    }
}

impl PartialEq for Ipv4 {
    fn eq(&self, other: &Ipv4) -> bool {
        self.addr == other.addr && self.mask == other.mask
    }
}

impl PartialOrd for Ipv4 {
    fn partial_cmp(&self, other: &Ipv4) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_cidr_mask() {
        assert_eq!(get_cidr_mask(0).unwrap(), 0x00000000);
        assert_eq!(get_cidr_mask(8).unwrap(), 0xFF000000);
        assert_eq!(get_cidr_mask(27).unwrap(), 0xFFFFFFE0);
        assert_eq!(get_cidr_mask(32).unwrap(), 0xFFFFFFFF);
        assert_eq!(get_cidr_mask(33), Err(CidrError::TooLong(33)));
    }

    #[test]
    fn test_cut_and_broadcast_addr() {
        let ip = Ipv4Addr::new(192, 168, 1, 42);
        assert_eq!(cut_addr(ip, 24).unwrap(), Ipv4Addr::new(192, 168, 1, 0));
        assert_eq!(cut_addr(ip, 27).unwrap(), Ipv4Addr::new(192, 168, 1, 32));
        assert_eq!(
            broadcast_addr(ip, 27).unwrap(),
            Ipv4Addr::new(192, 168, 1, 63)
        );
        assert!(cut_addr(ip, 33).is_err());
    }

    #[test]
    fn test_next_subnet_ipv4() {
        let first = Ipv4::new("10.0.0.0/27").unwrap();
        let second = next_subnet_ipv4(first, None).unwrap();
        assert_eq!(second, Ipv4::new("10.0.0.32/27").unwrap());

        let block = Ipv4::new("10.18.126.0/24").unwrap();
        assert_eq!(
            next_subnet_ipv4(block, Some(27)).unwrap(),
            Ipv4::new("10.18.127.0/27").unwrap()
        );
        assert_eq!(
            next_subnet_ipv4(Ipv4::new("10.2.3.4/16").unwrap(), None).unwrap(),
            Ipv4::new("10.3.0.0/16").unwrap()
        );

        let last = Ipv4::new("255.255.255.224/27").unwrap();
        assert!(matches!(
            next_subnet_ipv4(last, None),
            Err(CidrError::Overflow(_))
        ));
    }

    #[test]
    fn test_usable_hosts() {
        assert_eq!(usable_hosts(24).unwrap(), 251);
        assert_eq!(usable_hosts(27).unwrap(), 27);
        assert_eq!(usable_hosts(28).unwrap(), 11);
        assert!(usable_hosts(29).is_err());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            Ipv4::new("10.0.0.0"),
            Err(CidrError::Format("10.0.0.0".to_string()))
        );
        assert!(matches!(Ipv4::new("10.0.0.300/24"), Err(CidrError::Address(_))));
        assert!(matches!(Ipv4::new("10.0.0.0/x"), Err(CidrError::Length(_))));
        assert_eq!(Ipv4::new("10.0.0.0/33"), Err(CidrError::TooLong(33)));
        assert_eq!(
            " 10.0.0.0/24 ".parse::<Ipv4>().unwrap(),
            Ipv4::new("10.0.0.0/24").unwrap()
        );
    }

    #[test]
    fn test_network_rejects_host_bits() {
        assert!(Ipv4::network("10.0.1.0/24").is_ok());
        let err = Ipv4::network("10.0.1.5/24").unwrap_err();
        assert_eq!(
            err.to_string(),
            "10.0.1.5/24 has host bits set, expected 10.0.1.0/24"
        );
    }

    #[test]
    fn test_overlaps_and_contains() {
        let a = Ipv4::new("10.0.0.0/24").unwrap();
        let b = Ipv4::new("10.0.0.128/25").unwrap();
        let c = Ipv4::new("10.0.1.0/24").unwrap();
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
        assert!(Ipv4::anywhere().overlaps(&c));
        assert!(a.contains(Ipv4Addr::new(10, 0, 0, 255)));
        assert!(!a.contains(Ipv4Addr::new(10, 0, 1, 0)));
        assert_eq!(a.size(), 256);
        assert_eq!(a.hi(), Ipv4Addr::new(10, 0, 0, 255));
    }

    #[test]
    fn test_contains_block() {
        let net = Ipv4::new("10.0.0.0/24").unwrap();
        assert!(net.contains_block(&Ipv4::new("10.0.0.224/27").unwrap()));
        assert!(net.contains_block(&net));
        assert!(!net.contains_block(&Ipv4::new("10.0.0.0/23").unwrap()));
        assert!(!net.contains_block(&Ipv4::new("10.0.1.0/27").unwrap()));
    }

    #[test]
    fn test_serde_round_trip_string() {
        let ip = Ipv4::new("10.0.3.0/24").unwrap();
        let json = serde_json::to_string(&ip).unwrap();
        assert_eq!(json, "\"10.0.3.0/24\"");
        let bad: Result<Ipv4, _> = serde_json::from_str("\"nope\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_ip4_cmp() {
        let ip1 = Ipv4::new("10.0.0.1/24").unwrap();
        let ip2 = Ipv4::new("10.0.0.2/24").unwrap();
        assert!(ip1 < ip2);
        assert!(ip2 >= ip1);
    }
}

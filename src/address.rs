//! Query address parsing and normalization.
//!
//! Lookups accept textual addresses, `std::net` address types, packed
//! network-order bytes and plain integers. Everything is reduced to an
//! [`IpNumber`]: the protocol whose row table to search plus the address as
//! an unsigned integer.

use crate::error::{GeoError, Result};
use serde::Serialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Which of the two row tables an address lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IpVersion {
    /// 32-bit addresses
    V4,
    /// 128-bit addresses
    V6,
}

impl IpVersion {
    /// Size of an `ip_from` value in a row
    pub fn address_len(self) -> usize {
        match self {
            IpVersion::V4 => 4,
            IpVersion::V6 => 16,
        }
    }

    /// Right shift that leaves the top 16 bits (the coarse index bucket)
    pub fn index_shift(self) -> u32 {
        match self {
            IpVersion::V4 => 16,
            IpVersion::V6 => 112,
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpVersion::V4 => write!(f, "IPv4"),
            IpVersion::V6 => write!(f, "IPv6"),
        }
    }
}

/// An address reduced to its row-table key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpNumber {
    /// Table to search
    pub version: IpVersion,
    /// Address as an integer (fits in 32 bits for IPv4)
    pub value: u128,
}

impl IpNumber {
    /// Key for an address, searched in the table of its own family
    pub fn from_ip(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(v4) => IpNumber {
                version: IpVersion::V4,
                value: u32::from(v4) as u128,
            },
            IpAddr::V6(v6) => IpNumber {
                version: IpVersion::V6,
                value: u128::from(v6),
            },
        }
    }

    /// Key for an address, redirecting IPv6 forms that embed an IPv4
    /// address (mapped, 6to4, Teredo) to the IPv4 table
    pub fn from_ip_embedded(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V6(v6) => match embedded_ipv4(v6) {
                Some(v4) => Self::from_ip(IpAddr::V4(v4)),
                None => Self::from_ip(ip),
            },
            IpAddr::V4(_) => Self::from_ip(ip),
        }
    }

    /// Coarse index bucket (top 16 bits of the address)
    pub fn bucket(&self) -> u64 {
        (self.value >> self.version.index_shift()) as u64
    }
}

const FROM_6TO4: u128 = 0x2002_0000_0000_0000_0000_0000_0000_0000;
const TO_6TO4: u128 = 0x2002_ffff_ffff_ffff_ffff_ffff_ffff_ffff;
const FROM_TEREDO: u128 = 0x2001_0000_0000_0000_0000_0000_0000_0000;
const TO_TEREDO: u128 = 0x2001_0000_ffff_ffff_ffff_ffff_ffff_ffff;

/// IPv4 address carried inside an IPv6 address, if any
///
/// - `::ffff:a.b.c.d` (IPv4-mapped)
/// - `2002:AABB:CCDD::/48` (6to4, address in bits 80..112)
/// - `2001:0::/32` (Teredo, client address inverted in the low 32 bits)
pub fn embedded_ipv4(addr: Ipv6Addr) -> Option<Ipv4Addr> {
    if let Some(v4) = addr.to_ipv4_mapped() {
        return Some(v4);
    }

    let value = u128::from(addr);
    if (FROM_6TO4..=TO_6TO4).contains(&value) {
        Some(Ipv4Addr::from((value >> 80) as u32))
    } else if (FROM_TEREDO..=TO_TEREDO).contains(&value) {
        Some(Ipv4Addr::from(!(value as u32)))
    } else {
        None
    }
}

/// Anything a lookup accepts as an address
///
/// Implemented for text, `std::net` types, packed bytes (4 or 16 bytes in
/// network order) and integers. Integers that fit in 32 bits are IPv4.
pub trait ToIpAddr {
    /// Convert to an address or fail with [`GeoError::InvalidAddress`]
    fn to_ip_addr(&self) -> Result<IpAddr>;
}

impl ToIpAddr for str {
    fn to_ip_addr(&self) -> Result<IpAddr> {
        self.parse::<IpAddr>()
            .map_err(|_| GeoError::InvalidAddress(self.to_string()))
    }
}

impl ToIpAddr for String {
    fn to_ip_addr(&self) -> Result<IpAddr> {
        self.as_str().to_ip_addr()
    }
}

impl ToIpAddr for IpAddr {
    fn to_ip_addr(&self) -> Result<IpAddr> {
        Ok(*self)
    }
}

impl ToIpAddr for Ipv4Addr {
    fn to_ip_addr(&self) -> Result<IpAddr> {
        Ok(IpAddr::V4(*self))
    }
}

impl ToIpAddr for Ipv6Addr {
    fn to_ip_addr(&self) -> Result<IpAddr> {
        Ok(IpAddr::V6(*self))
    }
}

impl ToIpAddr for [u8] {
    fn to_ip_addr(&self) -> Result<IpAddr> {
        if let Ok(octets) = <[u8; 4]>::try_from(self) {
            Ok(IpAddr::from(octets))
        } else if let Ok(octets) = <[u8; 16]>::try_from(self) {
            Ok(IpAddr::from(octets))
        } else {
            Err(GeoError::InvalidAddress(format!(
                "{} packed bytes (expected 4 or 16)",
                self.len()
            )))
        }
    }
}

impl ToIpAddr for [u8; 4] {
    fn to_ip_addr(&self) -> Result<IpAddr> {
        Ok(IpAddr::from(*self))
    }
}

impl ToIpAddr for [u8; 16] {
    fn to_ip_addr(&self) -> Result<IpAddr> {
        Ok(IpAddr::from(*self))
    }
}

impl ToIpAddr for u32 {
    fn to_ip_addr(&self) -> Result<IpAddr> {
        Ok(IpAddr::V4(Ipv4Addr::from(*self)))
    }
}

impl ToIpAddr for u128 {
    fn to_ip_addr(&self) -> Result<IpAddr> {
        match u32::try_from(*self) {
            Ok(v4) => v4.to_ip_addr(),
            Err(_) => Ok(IpAddr::V6(Ipv6Addr::from(*self))),
        }
    }
}

impl<T: ToIpAddr + ?Sized> ToIpAddr for &T {
    fn to_ip_addr(&self) -> Result<IpAddr> {
        (**self).to_ip_addr()
    }
}

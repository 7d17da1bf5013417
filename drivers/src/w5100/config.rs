//! Chip network configuration.

use crate::net::addr::{parse_ipv4, parse_mac_addr};
use crate::net::types::{Ipv4Addr, MacAddr, W5100Error};

/// Factory MAC text.
pub const DEFAULT_MAC: &str = "00-DE-AD-BE-EF-00";
/// Used when [`DEFAULT_MAC`] does not parse.
pub const FALLBACK_MAC: MacAddr = MacAddr([0x00, 0xDE, 0xAD, 0xC0, 0xDE, 0x00]);
pub const DEFAULT_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 101);
pub const DEFAULT_SUBNET: Ipv4Addr = Ipv4Addr::new(255, 255, 255, 0);
pub const DEFAULT_GATEWAY: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 1);

/// Addresses programmed into the chip by [`W5100::init`](super::W5100::init).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChipConfig {
    pub mac: MacAddr,
    pub ip: Ipv4Addr,
    pub subnet: Ipv4Addr,
    pub gateway: Ipv4Addr,
}

impl ChipConfig {
    pub const fn new(mac: MacAddr, ip: Ipv4Addr, subnet: Ipv4Addr, gateway: Ipv4Addr) -> Self {
        Self {
            mac,
            ip,
            subnet,
            gateway,
        }
    }

    /// Build a configuration from the textual forms, e.g.
    /// `from_strs("00-DE-AD-BE-EF-00", "10.0.0.2", "255.255.255.0", "10.0.0.1")`.
    pub fn from_strs(
        mac: &str,
        ip: &str,
        subnet: &str,
        gateway: &str,
    ) -> Result<Self, W5100Error> {
        Ok(Self {
            mac: parse_mac_addr(mac)?,
            ip: parse_ipv4(ip)?,
            subnet: parse_ipv4(subnet)?,
            gateway: parse_ipv4(gateway)?,
        })
    }
}

impl Default for ChipConfig {
    fn default() -> Self {
        Self {
            mac: parse_mac_addr(DEFAULT_MAC).unwrap_or(FALLBACK_MAC),
            ip: DEFAULT_IP,
            subnet: DEFAULT_SUBNET,
            gateway: DEFAULT_GATEWAY,
        }
    }
}

//! Type-safe network primitives for the W5100 driver.
//!
//! Newtype wrappers keep byte order explicit and stop addresses, ports and
//! socket indices from being mixed up. All types are `Copy` and sized for a
//! `#![no_std]` target.

use core::fmt;

// =============================================================================
// Ipv4Addr
// =============================================================================

/// IPv4 address stored in **network byte order** (`[u8; 4]`).
///
/// The inner bytes are exactly what the chip's 4-byte address registers hold,
/// first octet at the lowest register address. Conversion to and from the
/// packed `u32` form is explicit via [`from_u32_be`] / [`to_u32_be`].
///
/// [`from_u32_be`]: Ipv4Addr::from_u32_be
/// [`to_u32_be`]: Ipv4Addr::to_u32_be
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Ipv4Addr(pub [u8; 4]);

impl Ipv4Addr {
    /// `0.0.0.0`
    pub const UNSPECIFIED: Self = Self([0, 0, 0, 0]);
    /// `255.255.255.255`; also the bit pattern of the parse-failure sentinel.
    pub const BROADCAST: Self = Self([255, 255, 255, 255]);

    #[inline]
    pub const fn new(a: u8, b: u8, c: u8, d: u8) -> Self {
        Self([a, b, c, d])
    }

    /// Construct from a big-endian packed `u32` (first octet in the top byte).
    #[inline]
    pub const fn from_u32_be(val: u32) -> Self {
        Self(val.to_be_bytes())
    }

    /// Return the address packed big-endian into a `u32`.
    #[inline]
    pub const fn to_u32_be(self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    #[inline]
    pub const fn is_unspecified(&self) -> bool {
        self.to_u32_be() == 0
    }

    #[inline]
    pub const fn is_broadcast(&self) -> bool {
        self.to_u32_be() == u32::MAX
    }

    /// `true` if the address may be used as a remote peer: neither
    /// `0.0.0.0` nor `255.255.255.255`.
    #[inline]
    pub const fn is_valid_peer(&self) -> bool {
        !self.is_unspecified() && !self.is_broadcast()
    }

    #[inline]
    pub const fn octets(&self) -> [u8; 4] {
        self.0
    }
}

impl fmt::Debug for Ipv4Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}.{}", self.0[0], self.0[1], self.0[2], self.0[3])
    }
}

impl fmt::Display for Ipv4Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}.{}", self.0[0], self.0[1], self.0[2], self.0[3])
    }
}

// =============================================================================
// Port
// =============================================================================

/// Port number in **host byte order**.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Port(pub u16);

impl Port {
    #[inline]
    pub const fn new(val: u16) -> Self {
        Self(val)
    }

    /// Serialize to big-endian bytes, the order the chip registers use.
    #[inline]
    pub const fn to_network_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }

    #[inline]
    pub const fn from_network_bytes(bytes: [u8; 2]) -> Self {
        Self(u16::from_be_bytes(bytes))
    }

    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

impl fmt::Debug for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Port({})", self.0)
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// MacAddr
// =============================================================================

/// Ethernet MAC address (6 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    pub const ZERO: Self = Self([0; 6]);
    pub const BROADCAST: Self = Self([0xff; 6]);

    #[inline]
    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        let b = &self.0;
        b[0] == 0 && b[1] == 0 && b[2] == 0 && b[3] == 0 && b[4] == 0 && b[5] == 0
    }
}

impl fmt::Debug for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Dash-separated upper-case hex, e.g. `00-DE-AD-BE-EF-00`.
impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02X}-{:02X}-{:02X}-{:02X}-{:02X}-{:02X}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

// =============================================================================
// SockAddr
// =============================================================================

/// IPv4 endpoint: address plus port.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SockAddr {
    pub ip: Ipv4Addr,
    pub port: Port,
}

impl SockAddr {
    #[inline]
    pub const fn new(ip: Ipv4Addr, port: Port) -> Self {
        Self { ip, port }
    }
}

impl fmt::Debug for SockAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port.0)
    }
}

impl fmt::Display for SockAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port.0)
    }
}

// =============================================================================
// W5100Error
// =============================================================================

/// Every failure the driver reports.
///
/// Internal code uses `W5100Error` exclusively. The packed sentinel values
/// of the legacy API are produced only at the boundary, see
/// [`crate::w5100::compat`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum W5100Error {
    /// Dotted IPv4 text could not be parsed.
    Malformed,
    /// Dash-separated MAC text could not be parsed.
    BadData,
    /// Every eligible socket slot is in use.
    Unavailable,
    /// The socket is not in the ESTABLISHED state.
    NotEstablished,
    /// The socket was opened with a different protocol.
    ProtocolMismatch,
    /// `0.0.0.0` or `255.255.255.255` where a unicast peer is required.
    InvalidAddress,
    /// Socket index outside `0..=3`.
    InvalidSocket,
}

impl W5100Error {
    /// Sentinel used for this failure at the legacy integer boundary.
    pub const fn sentinel(&self) -> u32 {
        match self {
            Self::Malformed => 0xFFFF_FFFF,
            Self::Unavailable | Self::InvalidSocket => 0xFF,
            Self::BadData
            | Self::NotEstablished
            | Self::ProtocolMismatch
            | Self::InvalidAddress => 0,
        }
    }
}

impl fmt::Display for W5100Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed IPv4 address"),
            Self::BadData => write!(f, "malformed MAC address"),
            Self::Unavailable => write!(f, "no free socket slot"),
            Self::NotEstablished => write!(f, "socket not established"),
            Self::ProtocolMismatch => write!(f, "socket protocol mismatch"),
            Self::InvalidAddress => write!(f, "invalid peer address"),
            Self::InvalidSocket => write!(f, "invalid socket index"),
        }
    }
}

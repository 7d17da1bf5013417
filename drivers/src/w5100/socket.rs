//! Socket definitions and the socket allocation table.
//!
//! The chip has four hardware sockets. The driver keeps a shadow record per
//! slot; an empty record means the slot is free. Allocation scans slots in
//! ascending order and never hands out slot 0 for raw-MAC mode, which the
//! chip only supports on the other slots.

use core::fmt;

use bitflags::bitflags;
use w5100_lib::{DelayNs, klog_debug};

use crate::net::types::{MacAddr, Port, W5100Error};

use super::W5100;
use super::regs::{
    IR_CLEAR_ALL, RX_WINDOW_BASE, SN_DEST_MAC, SN_IR, SN_MODE, SN_MSS, SN_PROTO, SN_SOURCE_PORT,
    SN_STATUS, SN_TOS, SN_TTL, SOCKET_COUNT, SOCKET_REG_BASE, SOCKET_REG_STRIDE, TX_WINDOW_BASE,
    WINDOW_SIZE,
};
use super::transport::Transport;

// =============================================================================
// SocketId
// =============================================================================

/// Index of a hardware socket slot, always in `0..4`.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SocketId(u8);

impl SocketId {
    /// Legacy "no slot" value.
    pub const SENTINEL: u8 = 0xFF;

    pub const ALL: [SocketId; SOCKET_COUNT] = [SocketId(0), SocketId(1), SocketId(2), SocketId(3)];

    pub const fn new(raw: u8) -> Option<Self> {
        if (raw as usize) < SOCKET_COUNT {
            Some(Self(raw))
        } else {
            None
        }
    }

    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Absolute address of socket register `offset`.
    #[inline]
    pub const fn reg(self, offset: u16) -> u16 {
        SOCKET_REG_BASE + self.0 as u16 * SOCKET_REG_STRIDE + offset
    }

    /// First address of this socket's transmit window.
    #[inline]
    pub const fn tx_base(self) -> u16 {
        TX_WINDOW_BASE + self.0 as u16 * WINDOW_SIZE
    }

    /// First address of this socket's receive window.
    #[inline]
    pub const fn rx_base(self) -> u16 {
        RX_WINDOW_BASE + self.0 as u16 * WINDOW_SIZE
    }
}

impl TryFrom<u8> for SocketId {
    type Error = W5100Error;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or(W5100Error::InvalidSocket)
    }
}

impl fmt::Debug for SocketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Socket({})", self.0)
    }
}

impl fmt::Display for SocketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Mode, commands, interrupts, status
// =============================================================================

/// Socket protocol, the low nibble of the socket mode register.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Protocol {
    Tcp = 0x01,
    Udp = 0x02,
    IpRaw = 0x03,
    MacRaw = 0x04,
}

impl Protocol {
    pub const fn as_str(self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::IpRaw => "ipraw",
            Protocol::MacRaw => "macraw",
        }
    }
}

bitflags! {
    /// Upper bits of the socket mode register.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct SocketFlags: u8 {
        /// UDP multicast (UDP) or MAC filtering (raw MAC).
        const MULTICAST = 0x80;
        /// No delayed ACK (TCP) or IGMP v1 (UDP multicast).
        const NO_DELAYED_ACK = 0x20;
    }
}

/// Socket command register opcodes.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SocketCommand {
    Open = 0x01,
    Listen = 0x02,
    Connect = 0x04,
    Disconnect = 0x08,
    Close = 0x10,
    Send = 0x20,
    /// SEND using the destination MAC register instead of ARP.
    SendMac = 0x21,
    Recv = 0x40,
}

bitflags! {
    /// Socket interrupt register. Bits are cleared by writing them back as 1.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct SocketInterrupt: u8 {
        const CON = 0x01;
        const DISCON = 0x02;
        const RECV = 0x04;
        const TIMEOUT = 0x08;
        const SEND_OK = 0x10;
    }
}

/// Raw value of the socket status register.
///
/// Only three codes carry meaning for the driver; every other handshake
/// state is opaque.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SocketStatus(pub u8);

impl SocketStatus {
    pub const CLOSED: Self = Self(0x00);
    pub const ESTABLISHED: Self = Self(0x17);
    /// The remote end asked to terminate.
    pub const CLOSE_WAIT: Self = Self(0x1C);

    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn is_established(self) -> bool {
        self.0 == Self::ESTABLISHED.0
    }
}

impl fmt::Debug for SocketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::CLOSED => write!(f, "Closed"),
            Self::ESTABLISHED => write!(f, "Established"),
            Self::CLOSE_WAIT => write!(f, "CloseWait"),
            Self(raw) => write!(f, "Status({raw:#04x})"),
        }
    }
}

// =============================================================================
// Allocation table
// =============================================================================

/// Shadow of one allocated slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SocketEntry {
    pub protocol: Protocol,
    pub flags: SocketFlags,
    pub source_port: Port,
    /// Set once the slot was put into LISTEN.
    pub server: bool,
}

impl SocketEntry {
    pub const fn new(protocol: Protocol, source_port: Port, flags: SocketFlags) -> Self {
        Self {
            protocol,
            flags,
            source_port,
            server: false,
        }
    }

    /// Value written to the socket mode register.
    #[inline]
    pub fn mode(&self) -> u8 {
        self.protocol as u8 | self.flags.bits()
    }
}

#[derive(Clone, Debug, Default)]
pub struct SocketTable {
    slots: [Option<SocketEntry>; SOCKET_COUNT],
}

impl SocketTable {
    pub const fn new() -> Self {
        Self {
            slots: [None; SOCKET_COUNT],
        }
    }

    /// Record `entry` in the first free slot eligible for its protocol.
    pub fn allocate(&mut self, entry: SocketEntry) -> Result<SocketId, W5100Error> {
        let first = if entry.protocol == Protocol::MacRaw { 1 } else { 0 };
        let idx = (first..SOCKET_COUNT)
            .find(|&idx| self.slots[idx].is_none())
            .ok_or(W5100Error::Unavailable)?;
        self.slots[idx] = Some(entry);
        Ok(SocketId(idx as u8))
    }

    pub fn release(&mut self, id: SocketId) {
        self.slots[id.index()] = None;
    }

    pub fn get(&self, id: SocketId) -> Option<&SocketEntry> {
        self.slots[id.index()].as_ref()
    }

    pub fn get_mut(&mut self, id: SocketId) -> Option<&mut SocketEntry> {
        self.slots[id.index()].as_mut()
    }

    #[inline]
    pub fn protocol(&self, id: SocketId) -> Option<Protocol> {
        self.get(id).map(|entry| entry.protocol)
    }

    #[inline]
    pub fn is_allocated(&self, id: SocketId) -> bool {
        self.slots[id.index()].is_some()
    }

    pub fn count_active(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

// =============================================================================
// Driver: open/close and per-socket registers
// =============================================================================

impl<T: Transport, D: DelayNs> W5100<T, D> {
    /// Allocate a slot for `protocol`, program its source port and mode, and
    /// issue OPEN.
    pub fn open(
        &mut self,
        protocol: Protocol,
        port: Port,
        flags: SocketFlags,
    ) -> Result<SocketId, W5100Error> {
        let entry = SocketEntry::new(protocol, port, flags);
        let id = self.sockets.allocate(entry)?;
        self.regs.set_socket_u16(id, SN_SOURCE_PORT, port.as_u16());
        self.regs.set_socket_u8(id, SN_MODE, entry.mode());
        self.execute(id, SocketCommand::Open);
        klog_debug!("w5100: opened {} socket {} on port {}", protocol.as_str(), id, port);
        Ok(id)
    }

    /// Free the slot, issue CLOSE and clear every pending socket interrupt.
    pub fn close(&mut self, id: SocketId) {
        self.sockets.release(id);
        self.execute(id, SocketCommand::Close);
        self.regs.set_socket_u8(id, SN_IR, IR_CLEAR_ALL);
        klog_debug!("w5100: closed socket {}", id);
    }

    pub fn socket_status(&mut self, id: SocketId) -> SocketStatus {
        SocketStatus(self.regs.socket_u8(id, SN_STATUS))
    }

    pub fn socket_established(&mut self, id: SocketId) -> bool {
        self.socket_status(id).is_established()
    }

    pub fn socket_interrupts(&mut self, id: SocketId) -> SocketInterrupt {
        SocketInterrupt::from_bits_truncate(self.regs.socket_u8(id, SN_IR))
    }

    /// Shadow record of `id`, `None` while the slot is free.
    pub fn socket_entry(&self, id: SocketId) -> Option<&SocketEntry> {
        self.sockets.get(id)
    }

    pub fn socket_table(&self) -> &SocketTable {
        &self.sockets
    }

    /// Close `id` if the peer asked to terminate. Returns `true` once the
    /// slot reads CLOSED.
    pub fn process_connections(&mut self, id: SocketId) -> bool {
        if self.socket_status(id) == SocketStatus::CLOSE_WAIT {
            self.close(id);
        }
        self.socket_status(id) == SocketStatus::CLOSED
    }

    // -------------------------------------------------------------------------
    // Tuning
    // -------------------------------------------------------------------------

    pub fn set_socket_ttl(&mut self, id: SocketId, ttl: u8) {
        self.regs.set_socket_u8(id, SN_TTL, ttl);
    }

    pub fn socket_ttl(&mut self, id: SocketId) -> u8 {
        self.regs.socket_u8(id, SN_TTL)
    }

    pub fn set_socket_tos(&mut self, id: SocketId, tos: u8) {
        self.regs.set_socket_u8(id, SN_TOS, tos);
    }

    pub fn socket_tos(&mut self, id: SocketId) -> u8 {
        self.regs.socket_u8(id, SN_TOS)
    }

    pub fn set_socket_mss(&mut self, id: SocketId, mss: u16) {
        self.regs.set_socket_u16(id, SN_MSS, mss);
    }

    pub fn socket_mss(&mut self, id: SocketId) -> u16 {
        self.regs.socket_u16(id, SN_MSS)
    }

    /// IP protocol number used by an IPRAW socket; set before OPEN.
    pub fn set_socket_ip_protocol(&mut self, id: SocketId, proto: u8) {
        self.regs.set_socket_u8(id, SN_PROTO, proto);
    }

    pub fn socket_ip_protocol(&mut self, id: SocketId) -> u8 {
        self.regs.socket_u8(id, SN_PROTO)
    }

    /// Peer MAC learned by the chip (or programmed for SEND_MAC).
    pub fn socket_dest_mac(&mut self, id: SocketId) -> MacAddr {
        self.regs.read_mac(id.reg(SN_DEST_MAC))
    }

    pub fn set_socket_dest_mac(&mut self, id: SocketId, mac: MacAddr) {
        self.regs.write_mac(id.reg(SN_DEST_MAC), mac);
    }
}

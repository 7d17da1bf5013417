//! Register accessor layer: typed reads and writes composed from the
//! single-byte [`Transport`] primitive.
//!
//! Multi-byte values are transferred as consecutive single-byte operations,
//! most significant byte at the lowest address. Block transfers know nothing
//! about packet-memory wraparound; the caller hands in a span that is already
//! contiguous.

use crate::net::types::{Ipv4Addr, MacAddr};

use super::socket::SocketId;
use super::transport::Transport;

pub struct Registers<T: Transport> {
    bus: T,
}

impl<T: Transport> Registers<T> {
    pub const fn new(bus: T) -> Self {
        Self { bus }
    }

    pub fn transport(&self) -> &T {
        &self.bus
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.bus
    }

    pub fn into_inner(self) -> T {
        self.bus
    }

    #[inline]
    pub fn read_u8(&mut self, addr: u16) -> u8 {
        self.bus.read(addr)
    }

    #[inline]
    pub fn write_u8(&mut self, addr: u16, value: u8) {
        self.bus.write(addr, value)
    }

    pub fn read_u16(&mut self, addr: u16) -> u16 {
        let hi = self.bus.read(addr);
        let lo = self.bus.read(addr.wrapping_add(1));
        u16::from_be_bytes([hi, lo])
    }

    pub fn write_u16(&mut self, addr: u16, value: u16) {
        let [hi, lo] = value.to_be_bytes();
        self.bus.write(addr, hi);
        self.bus.write(addr.wrapping_add(1), lo);
    }

    pub fn read_mac(&mut self, addr: u16) -> MacAddr {
        let mut mac = [0u8; 6];
        self.read_block(addr, &mut mac);
        MacAddr(mac)
    }

    pub fn write_mac(&mut self, addr: u16, mac: MacAddr) {
        self.write_block(addr, &mac.0);
    }

    pub fn read_ipv4(&mut self, addr: u16) -> Ipv4Addr {
        let mut ip = [0u8; 4];
        self.read_block(addr, &mut ip);
        Ipv4Addr(ip)
    }

    pub fn write_ipv4(&mut self, addr: u16, ip: Ipv4Addr) {
        self.write_block(addr, &ip.0);
    }

    /// Fill `buf` from `buf.len()` consecutive addresses starting at `addr`.
    pub fn read_block(&mut self, addr: u16, buf: &mut [u8]) {
        let mut cursor = addr;
        for byte in buf.iter_mut() {
            *byte = self.bus.read(cursor);
            cursor = cursor.wrapping_add(1);
        }
    }

    /// Write `data` to consecutive addresses starting at `addr`.
    pub fn write_block(&mut self, addr: u16, data: &[u8]) {
        let mut cursor = addr;
        for &byte in data {
            self.bus.write(cursor, byte);
            cursor = cursor.wrapping_add(1);
        }
    }

    // -------------------------------------------------------------------------
    // Socket register shorthands
    // -------------------------------------------------------------------------

    #[inline]
    pub fn socket_u8(&mut self, socket: SocketId, offset: u16) -> u8 {
        self.read_u8(socket.reg(offset))
    }

    #[inline]
    pub fn set_socket_u8(&mut self, socket: SocketId, offset: u16, value: u8) {
        self.write_u8(socket.reg(offset), value)
    }

    #[inline]
    pub fn socket_u16(&mut self, socket: SocketId, offset: u16) -> u16 {
        self.read_u16(socket.reg(offset))
    }

    #[inline]
    pub fn set_socket_u16(&mut self, socket: SocketId, offset: u16, value: u16) {
        self.write_u16(socket.reg(offset), value)
    }
}

//! Integer-sentinel boundary.
//!
//! Callers that still speak the packed-integer convention (slot `0xFF` for
//! "no socket", `0xFFFF_FFFF` for an unparsable address, `0` bytes for a
//! refused transfer, `8` for a UDP datagram that has not fully arrived)
//! convert the driver's results here. Nothing inside the driver uses these
//! values.

use w5100_lib::DelayNs;

use crate::net::addr::parse_ipv4;
use crate::net::types::W5100Error;

use super::W5100;
use super::regs::UDP_HEADER_LEN;
use super::socket::SocketId;
use super::transport::Transport;
use super::udp::UdpReceive;

/// Legacy status for a successfully parsed MAC.
pub const MAC_OK: u8 = 0x00;
/// Legacy status for malformed MAC text.
pub const MAC_BAD_DATA: u8 = 0x06;

pub fn slot(result: Result<SocketId, W5100Error>) -> u8 {
    match result {
        Ok(id) => id.raw(),
        Err(_) => SocketId::SENTINEL,
    }
}

/// Dotted text to the big-endian packed form, `0xFFFF_FFFF` on failure.
pub fn parse_ipv4_packed(text: &str) -> u32 {
    match parse_ipv4(text) {
        Ok(ip) => ip.to_u32_be(),
        Err(err) => err.sentinel(),
    }
}

pub fn mac_status(result: Result<(), W5100Error>) -> u8 {
    match result {
        Ok(()) => MAC_OK,
        Err(_) => MAC_BAD_DATA,
    }
}

/// Byte count of a send or receive, `0` when it was refused.
pub fn byte_count(result: Result<usize, W5100Error>) -> u16 {
    result.map_or(0, |n| n as u16)
}

pub fn udp_received(result: Result<UdpReceive, W5100Error>) -> u16 {
    match result {
        Ok(UdpReceive::Datagram(packet)) => packet.len as u16,
        Ok(UdpReceive::Incomplete) => UDP_HEADER_LEN as u16,
        Ok(UdpReceive::Empty) | Err(_) => 0,
    }
}

/// Close by raw index; indices outside `0..4` are ignored.
pub fn close_raw<T: Transport, D: DelayNs>(driver: &mut W5100<T, D>, raw: u8) {
    if let Some(id) = SocketId::new(raw) {
        driver.close(id);
    }
}

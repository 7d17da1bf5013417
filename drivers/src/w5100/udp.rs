//! UDP over a hardware socket.
//!
//! Received datagrams sit in the receive window behind an 8-byte header:
//! source IPv4 (4), source port (2, big-endian), payload length (2,
//! big-endian). The header is peeked first; the datagram is only consumed
//! once all of it has arrived.

use w5100_lib::DelayNs;

use crate::net::types::{Ipv4Addr, MacAddr, Port, SockAddr, W5100Error};

use super::W5100;
use super::regs::{MAX_SEND, SN_DEST_IP, SN_DEST_PORT, UDP_HEADER_LEN};
use super::socket::{Protocol, SocketCommand, SocketFlags, SocketId};
use super::transport::Transport;

/// A datagram copied out of the receive window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UdpPacket {
    pub source: SockAddr,
    /// Payload bytes copied into the caller's buffer.
    pub len: usize,
    /// The payload was longer than the buffer; the excess was dropped.
    pub truncated: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UdpReceive {
    /// Nothing waiting.
    Empty,
    /// A datagram is arriving but not complete yet. Nothing was consumed;
    /// try again later.
    Incomplete,
    Datagram(UdpPacket),
}

fn decode_header(header: &[u8; UDP_HEADER_LEN]) -> (SockAddr, usize) {
    let ip = Ipv4Addr([header[0], header[1], header[2], header[3]]);
    let port = Port::from_network_bytes([header[4], header[5]]);
    let len = u16::from_be_bytes([header[6], header[7]]) as usize;
    (SockAddr::new(ip, port), len)
}

impl<T: Transport, D: DelayNs> W5100<T, D> {
    /// Allocate a UDP socket bound to `port`.
    pub fn udp_open(&mut self, port: Port) -> Result<SocketId, W5100Error> {
        self.open(Protocol::Udp, port, SocketFlags::empty())
    }

    /// Send up to 2048 bytes of `data` to `dest`.
    ///
    /// The chip resolves the peer MAC itself. Blocks until the SEND
    /// completes. Returns the number of bytes handed to the chip.
    pub fn udp_send(&mut self, id: SocketId, dest: SockAddr, data: &[u8]) -> Result<usize, W5100Error> {
        self.udp_send_with(id, dest, data, SocketCommand::Send)
    }

    /// Like [`udp_send`](Self::udp_send) but addressed to `mac` directly,
    /// skipping ARP.
    pub fn udp_send_to_mac(
        &mut self,
        id: SocketId,
        mac: MacAddr,
        dest: SockAddr,
        data: &[u8],
    ) -> Result<usize, W5100Error> {
        self.set_socket_dest_mac(id, mac);
        self.udp_send_with(id, dest, data, SocketCommand::SendMac)
    }

    fn udp_send_with(
        &mut self,
        id: SocketId,
        dest: SockAddr,
        data: &[u8],
        command: SocketCommand,
    ) -> Result<usize, W5100Error> {
        if !self.socket_established(id) {
            return Err(W5100Error::NotEstablished);
        }
        if !dest.ip.is_valid_peer() {
            return Err(W5100Error::InvalidAddress);
        }
        let data = &data[..data.len().min(MAX_SEND)];

        self.regs.write_ipv4(id.reg(SN_DEST_IP), dest.ip);
        self.regs.set_socket_u16(id, SN_DEST_PORT, dest.port.as_u16());
        let sent = self.tx_write(id, 0, data);
        self.send_and_wait(id, command);
        Ok(sent)
    }

    /// Take the next complete datagram, copying its payload into `buf`.
    ///
    /// A payload longer than `buf` is cut to `buf.len()`, and the whole
    /// datagram is still consumed.
    pub fn udp_receive(&mut self, id: SocketId, buf: &mut [u8]) -> Result<UdpReceive, W5100Error> {
        if !self.socket_established(id) {
            return Err(W5100Error::NotEstablished);
        }

        let waiting = self.stable_received_size(id) as usize;
        if waiting == 0 {
            return Ok(UdpReceive::Empty);
        }
        if waiting < UDP_HEADER_LEN {
            return Ok(UdpReceive::Incomplete);
        }

        let mut header = [0u8; UDP_HEADER_LEN];
        self.rx_read(id, 0, &mut header, true);
        let (source, payload) = decode_header(&header);
        if waiting < UDP_HEADER_LEN + payload {
            return Ok(UdpReceive::Incomplete);
        }

        let len = payload.min(buf.len());
        let offset = UDP_HEADER_LEN as u16;
        if len == payload {
            self.rx_read(id, offset, &mut buf[..len], false);
        } else {
            self.rx_read(id, offset, &mut buf[..len], true);
            self.rx_consume(id, offset + payload as u16);
        }
        self.execute(id, SocketCommand::Recv);

        Ok(UdpReceive::Datagram(UdpPacket {
            source,
            len,
            truncated: len < payload,
        }))
    }
}

//! TCP over a hardware socket.
//!
//! The chip runs the TCP state machine; the driver only issues commands and
//! compares the socket status register against ESTABLISHED, CLOSE_WAIT and
//! CLOSED.

use w5100_lib::{BoundedWait, DelayNs, WaitOutcome, klog_warn, poll_bounded, poll_unbounded};

use crate::net::types::{Port, SockAddr, W5100Error};

use super::W5100;
use super::regs::{
    CONNECT_MAX_POLLS, MAX_SEND, POLL_INTERVAL_MS, SN_DEST_IP, SN_DEST_PORT, SN_IR, SN_STATUS,
};
use super::socket::{
    Protocol, SocketCommand, SocketFlags, SocketId, SocketInterrupt, SocketStatus,
};
use super::transport::Transport;

const CONNECT_WAIT: BoundedWait = BoundedWait::new(CONNECT_MAX_POLLS, POLL_INTERVAL_MS);

/// How a connect attempt ended. None of these is an error; check
/// [`is_established`](Self::is_established) before sending.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectStatus {
    /// Status reached ESTABLISHED after the given number of polls.
    Established(u32),
    /// The poll budget ran out first.
    TimedOut,
    /// The chip raised its own timeout interrupt.
    ChipTimeout,
}

impl ConnectStatus {
    #[inline]
    pub const fn is_established(&self) -> bool {
        matches!(self, Self::Established(_))
    }
}

impl<T: Transport, D: DelayNs> W5100<T, D> {
    /// Allocate a TCP socket bound to `port`.
    pub fn tcp_open(&mut self, port: Port) -> Result<SocketId, W5100Error> {
        self.open(Protocol::Tcp, port, SocketFlags::empty())
    }

    /// Put `id` into LISTEN and return immediately.
    pub fn tcp_listen(&mut self, id: SocketId) -> WaitOutcome {
        if let Some(entry) = self.sockets.get_mut(id) {
            entry.server = true;
        }
        self.execute(id, SocketCommand::Listen)
    }

    /// Put `id` into LISTEN and block until a peer has connected.
    ///
    /// The wait is unbounded. Returns the number of 1 ms polls spent.
    pub fn tcp_listen_wait(&mut self, id: SocketId) -> u32 {
        self.tcp_listen(id);
        let regs = &mut self.regs;
        poll_unbounded(&mut self.delay, POLL_INTERVAL_MS, || {
            SocketStatus(regs.socket_u8(id, SN_STATUS)).is_established()
        })
    }

    /// Connect `id` to `peer`.
    ///
    /// Waits up to 3000 polls of 1 ms for ESTABLISHED, giving up early when
    /// the chip reports its own timeout. The subnet register holds the real
    /// mask for the whole attempt.
    pub fn tcp_connect(&mut self, id: SocketId, peer: SockAddr) -> Result<ConnectStatus, W5100Error> {
        if !peer.ip.is_valid_peer() {
            return Err(W5100Error::InvalidAddress);
        }
        self.regs.write_ipv4(id.reg(SN_DEST_IP), peer.ip);
        self.regs.set_socket_u16(id, SN_DEST_PORT, peer.port.as_u16());

        let status = self.with_subnet_errata(|drv| {
            drv.execute(id, SocketCommand::Connect);
            let regs = &mut drv.regs;
            let mut chip_timeout = false;
            let outcome = poll_bounded(&mut drv.delay, CONNECT_WAIT, || {
                if SocketStatus(regs.socket_u8(id, SN_STATUS)).is_established() {
                    return true;
                }
                chip_timeout = SocketInterrupt::from_bits_truncate(regs.socket_u8(id, SN_IR))
                    .contains(SocketInterrupt::TIMEOUT);
                chip_timeout
            });
            match outcome {
                WaitOutcome::Ready(_) if chip_timeout => ConnectStatus::ChipTimeout,
                WaitOutcome::Ready(polls) => ConnectStatus::Established(polls),
                WaitOutcome::TimedOut(_) => ConnectStatus::TimedOut,
            }
        });

        if !status.is_established() {
            klog_warn!("w5100: socket {} connect to {} failed: {:?}", id, peer, status);
        }
        Ok(status)
    }

    #[inline]
    pub fn tcp_connected(&mut self, id: SocketId) -> bool {
        self.socket_established(id)
    }

    /// Request a graceful close. Does not wait for the peer.
    pub fn tcp_disconnect(&mut self, id: SocketId) -> WaitOutcome {
        self.execute(id, SocketCommand::Disconnect)
    }

    /// Send up to 2048 bytes of `data` on an established TCP socket.
    ///
    /// Blocks, without bound, until the transmit window has room for the
    /// whole (clipped) payload and then until the chip reports the SEND
    /// finished. Nothing is written when the socket is not established or
    /// was not opened for TCP, or when it drops out of ESTABLISHED while
    /// waiting for room. Returns the number of bytes handed to the chip.
    pub fn tcp_send(&mut self, id: SocketId, data: &[u8]) -> Result<usize, W5100Error> {
        let data = &data[..data.len().min(MAX_SEND)];
        if !self.socket_established(id) {
            return Err(W5100Error::NotEstablished);
        }
        if self.sockets.protocol(id) != Some(Protocol::Tcp) {
            return Err(W5100Error::ProtocolMismatch);
        }

        let needed = data.len() as u16;
        loop {
            let free = self.stable_free_space(id);
            let status = self.socket_status(id);
            if free >= needed {
                break;
            }
            if !status.is_established() {
                return Err(W5100Error::NotEstablished);
            }
            self.delay.delay_ms(POLL_INTERVAL_MS);
        }

        let sent = self.tx_write(id, 0, data);
        self.send_and_wait(id, SocketCommand::Send);
        Ok(sent)
    }

    /// [`tcp_send`](Self::tcp_send) for text.
    pub fn tcp_print(&mut self, id: SocketId, text: &str) -> Result<usize, W5100Error> {
        self.tcp_send(id, text.as_bytes())
    }

    /// Copy waiting bytes into `buf` and acknowledge them to the chip.
    ///
    /// Works in any socket state, so data that arrived before the peer
    /// closed can still be drained. Returns the number of bytes copied,
    /// 0 when nothing is waiting.
    pub fn tcp_receive(&mut self, id: SocketId, buf: &mut [u8]) -> usize {
        let waiting = self.stable_received_size(id) as usize;
        let len = waiting.min(buf.len());
        if len > 0 {
            self.rx_read(id, 0, &mut buf[..len], false);
            self.execute(id, SocketCommand::Recv);
        }
        len
    }
}

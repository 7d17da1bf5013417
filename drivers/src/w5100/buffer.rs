//! Buffer transfer engine.
//!
//! Each socket owns a 2 KiB transmit and a 2 KiB receive window in chip
//! memory. The chip tracks positions with free-running 16-bit pointers; the
//! physical offset inside a window is `pointer & 0x07FF`. A transfer that
//! runs past the end of the window is split into two contiguous block
//! transfers, the second starting at the window base.
//!
//! The free-space and received-size counters are updated by the chip while
//! the driver reads them byte by byte, so they are read until two
//! consecutive reads agree.

use w5100_lib::DelayNs;

use super::W5100;
use super::regs::{
    MAX_SEND, SN_RX_RD, SN_RX_SIZE, SN_TX_FREE, SN_TX_RD, SN_TX_WR, WINDOW_MASK, WINDOW_SIZE,
};
use super::socket::SocketId;
use super::transport::Transport;

/// Split a transfer of `len` bytes starting at window offset `phys` into the
/// part that fits before the window end and the part that wraps to offset 0.
#[inline]
pub(crate) fn split_at_wrap(phys: u16, len: usize) -> (usize, usize) {
    let room = (WINDOW_SIZE - phys) as usize;
    if len > room { (room, len - room) } else { (len, 0) }
}

impl<T: Transport, D: DelayNs> W5100<T, D> {
    /// Copy `data` into the transmit window `offset` bytes past the current
    /// write pointer, then advance the write pointer past the copied bytes.
    ///
    /// At most one window (2048 bytes) is copied; the rest of `data` is
    /// ignored. Returns the number of bytes copied.
    pub(crate) fn tx_write(&mut self, id: SocketId, offset: u16, data: &[u8]) -> usize {
        let data = &data[..data.len().min(MAX_SEND)];
        let start = self.regs.socket_u16(id, SN_TX_WR).wrapping_add(offset);
        let phys = start & WINDOW_MASK;
        let (head, tail) = split_at_wrap(phys, data.len());

        self.regs.write_block(id.tx_base() + phys, &data[..head]);
        if tail > 0 {
            self.regs.write_block(id.tx_base(), &data[head..]);
        }

        let end = start.wrapping_add(data.len() as u16);
        self.regs.set_socket_u16(id, SN_TX_WR, end);
        data.len()
    }

    /// Copy `buf.len()` bytes from the receive window, starting `offset`
    /// bytes past the current read pointer.
    ///
    /// Unless `lookahead` is set, the read pointer is moved past the copied
    /// bytes. A lookahead read leaves the pointer alone so a header can be
    /// inspected before the payload is consumed.
    pub(crate) fn rx_read(&mut self, id: SocketId, offset: u16, buf: &mut [u8], lookahead: bool) {
        let len = buf.len().min(WINDOW_SIZE as usize);
        let buf = &mut buf[..len];
        let start = self.regs.socket_u16(id, SN_RX_RD).wrapping_add(offset);
        let phys = start & WINDOW_MASK;
        let (head, tail) = split_at_wrap(phys, len);

        self.regs.read_block(id.rx_base() + phys, &mut buf[..head]);
        if tail > 0 {
            self.regs.read_block(id.rx_base(), &mut buf[head..]);
        }

        if !lookahead {
            self.regs
                .set_socket_u16(id, SN_RX_RD, start.wrapping_add(len as u16));
        }
    }

    /// Advance the receive read pointer by `len` without copying.
    pub(crate) fn rx_consume(&mut self, id: SocketId, len: u16) {
        let rd = self.regs.socket_u16(id, SN_RX_RD);
        self.regs.set_socket_u16(id, SN_RX_RD, rd.wrapping_add(len));
    }

    fn stable_socket_u16(&mut self, id: SocketId, offset: u16) -> u16 {
        let mut second = 0u16;
        loop {
            let first = self.regs.socket_u16(id, offset);
            if first != 0 {
                second = self.regs.socket_u16(id, offset);
            }
            if first == second {
                return second;
            }
        }
    }

    /// Free bytes in the transmit window.
    pub fn stable_free_space(&mut self, id: SocketId) -> u16 {
        self.stable_socket_u16(id, SN_TX_FREE)
    }

    /// Bytes waiting in the receive window.
    pub fn stable_received_size(&mut self, id: SocketId) -> u16 {
        self.stable_socket_u16(id, SN_RX_SIZE)
    }

    /// Bytes written to the transmit window that the chip has not sent yet.
    pub fn tx_in_flight(&mut self, id: SocketId) -> u16 {
        let wr = self.regs.socket_u16(id, SN_TX_WR);
        let rd = self.regs.socket_u16(id, SN_TX_RD);
        wr.wrapping_sub(rd)
    }

    /// Alias of [`stable_received_size`](Self::stable_received_size).
    #[inline]
    pub fn rx_data_waiting(&mut self, id: SocketId) -> u16 {
        self.stable_received_size(id)
    }
}

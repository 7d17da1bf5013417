//! Simulated W5100 for host tests.
//!
//! [`SimChip`] implements [`Transport`] over a flat 64 KiB image of the
//! register space and packet memory. Socket commands take effect the way the
//! chip applies them (status, interrupt and pointer updates) and self-clear
//! unless the socket is marked stuck. Byte and word scripts feed a sequence
//! of values to successive reads of one address, which is how tests model
//! counters the chip changes behind the driver's back. Every bus operation
//! and every command is journaled.

use std::collections::{BTreeMap, VecDeque};
use std::vec;
use std::vec::Vec;

use w5100_lib::DelayNs;

use crate::net::types::SockAddr;

use super::W5100;
use super::config::ChipConfig;
use super::regs::{
    SN_COMMAND, SN_IR, SN_MODE, SN_RX_RD, SN_RX_SIZE, SN_STATUS, SN_TX_FREE, SN_TX_RD, SN_TX_WR,
    SOCKET_COUNT, SOCKET_REG_BASE, SOCKET_REG_STRIDE, WINDOW_MASK, WINDOW_SIZE,
};
use super::socket::{SocketCommand, SocketId, SocketInterrupt, SocketStatus};
use super::transport::Transport;

const STATUS_INIT: u8 = 0x13;
const STATUS_LISTEN: u8 = 0x14;
const STATUS_UDP: u8 = 0x22;
const STATUS_IPRAW: u8 = 0x32;
const STATUS_MACRAW: u8 = 0x42;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusOp {
    Write(u16, u8),
    Read(u16),
    Command { socket: u8, command: u8 },
}

/// What CONNECT does on the simulated wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimConnect {
    /// The peer answers: status becomes ESTABLISHED.
    Establish,
    /// Nobody answers and the chip never gives up.
    Silent,
    /// The chip raises its TIMEOUT interrupt and closes.
    ChipTimeout,
}

pub struct SimChip {
    mem: Vec<u8>,
    ops: Vec<BusOp>,
    stuck: [bool; SOCKET_COUNT],
    byte_scripts: BTreeMap<u16, VecDeque<u8>>,
    word_scripts: BTreeMap<u16, VecDeque<u16>>,
    reads: BTreeMap<u16, u32>,
    rx_acked: [u16; SOCKET_COUNT],
    connect: SimConnect,
    send_irq: SocketInterrupt,
}

impl SimChip {
    pub fn new() -> Self {
        let mut chip = Self {
            mem: vec![0; 0x10000],
            ops: Vec::new(),
            stuck: [false; SOCKET_COUNT],
            byte_scripts: BTreeMap::new(),
            word_scripts: BTreeMap::new(),
            reads: BTreeMap::new(),
            rx_acked: [0; SOCKET_COUNT],
            connect: SimConnect::Establish,
            send_irq: SocketInterrupt::SEND_OK,
        };
        for id in SocketId::ALL {
            chip.poke_u16(id.reg(SN_TX_FREE), WINDOW_SIZE);
        }
        chip
    }

    // -------------------------------------------------------------------------
    // Direct image access (not journaled)
    // -------------------------------------------------------------------------

    pub fn peek(&self, addr: u16) -> u8 {
        self.mem[addr as usize]
    }

    pub fn peek_u16(&self, addr: u16) -> u16 {
        u16::from_be_bytes([self.peek(addr), self.peek(addr.wrapping_add(1))])
    }

    pub fn peek_block(&self, addr: u16, len: usize) -> Vec<u8> {
        let start = addr as usize;
        self.mem[start..start + len].to_vec()
    }

    pub fn poke(&mut self, addr: u16, value: u8) {
        self.mem[addr as usize] = value;
    }

    pub fn poke_u16(&mut self, addr: u16, value: u16) {
        let [hi, lo] = value.to_be_bytes();
        self.poke(addr, hi);
        self.poke(addr.wrapping_add(1), lo);
    }

    pub fn poke_block(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.mem[start..start + data.len()].copy_from_slice(data);
    }

    pub fn set_status(&mut self, socket: u8, status: SocketStatus) {
        self.poke(sock_reg(socket, SN_STATUS), status.raw());
    }

    pub fn raise_ir(&mut self, socket: u8, bits: SocketInterrupt) {
        let addr = sock_reg(socket, SN_IR);
        self.poke(addr, self.peek(addr) | bits.bits());
    }

    /// Move the receive read pointer as if everything before `ptr` had
    /// already been received and acknowledged.
    pub fn set_rx_read_ptr(&mut self, socket: u8, ptr: u16) {
        self.poke_u16(sock_reg(socket, SN_RX_RD), ptr);
        self.rx_acked[socket as usize] = ptr;
    }

    /// Append `data` to socket `socket`'s receive window as the chip would,
    /// wrapping at the window end, and grow the received-size counter.
    pub fn load_rx(&mut self, socket: u8, data: &[u8]) {
        let id = SocketId::new(socket).expect("socket index");
        let size = self.peek_u16(id.reg(SN_RX_SIZE));
        let mut ptr = self.peek_u16(id.reg(SN_RX_RD)).wrapping_add(size);
        for &byte in data {
            self.poke(id.rx_base() + (ptr & WINDOW_MASK), byte);
            ptr = ptr.wrapping_add(1);
        }
        self.poke_u16(id.reg(SN_RX_SIZE), size + data.len() as u16);
    }

    /// Queue a UDP datagram from `source` behind its 8-byte header.
    pub fn load_udp(&mut self, socket: u8, source: SockAddr, payload: &[u8]) {
        let mut datagram = Vec::with_capacity(8 + payload.len());
        datagram.extend_from_slice(&source.ip.octets());
        datagram.extend_from_slice(&source.port.to_network_bytes());
        datagram.extend_from_slice(&(payload.len() as u16).to_be_bytes());
        datagram.extend_from_slice(payload);
        self.load_rx(socket, &datagram);
    }

    // -------------------------------------------------------------------------
    // Behaviour knobs
    // -------------------------------------------------------------------------

    /// A stuck socket never clears its command register and ignores the
    /// command.
    pub fn stick_commands(&mut self, socket: u8, stuck: bool) {
        self.stuck[socket as usize] = stuck;
    }

    /// Successive reads of `addr` return `values` in order; afterwards the
    /// last value stays.
    pub fn script_byte(&mut self, addr: u16, values: &[u8]) {
        self.byte_scripts
            .entry(addr)
            .or_default()
            .extend(values.iter().copied());
    }

    /// Successive 16-bit reads at `addr` (high byte first) return `values`.
    pub fn script_word(&mut self, addr: u16, values: &[u16]) {
        self.word_scripts
            .entry(addr)
            .or_default()
            .extend(values.iter().copied());
    }

    pub fn set_connect(&mut self, connect: SimConnect) {
        self.connect = connect;
    }

    /// Interrupt bits raised when a SEND completes.
    pub fn set_send_irq(&mut self, bits: SocketInterrupt) {
        self.send_irq = bits;
    }

    // -------------------------------------------------------------------------
    // Journal
    // -------------------------------------------------------------------------

    pub fn ops(&self) -> &[BusOp] {
        &self.ops
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
        self.reads.clear();
    }

    /// `(socket, opcode)` of every command written, in order.
    pub fn commands(&self) -> Vec<(u8, u8)> {
        self.ops
            .iter()
            .filter_map(|op| match *op {
                BusOp::Command { socket, command } => Some((socket, command)),
                _ => None,
            })
            .collect()
    }

    /// Values written to `addr`, in order.
    pub fn writes_to(&self, addr: u16) -> Vec<u8> {
        self.ops
            .iter()
            .filter_map(|op| match *op {
                BusOp::Write(a, v) if a == addr => Some(v),
                _ => None,
            })
            .collect()
    }

    /// Writes into `lo..hi` grouped into runs of consecutive addresses, as
    /// `(start, len)`. One run per block transfer.
    pub fn write_runs(&self, lo: u16, hi: u16) -> Vec<(u16, usize)> {
        let mut runs: Vec<(u16, usize)> = Vec::new();
        for op in &self.ops {
            let BusOp::Write(addr, _) = *op else { continue };
            if addr < lo || addr >= hi {
                continue;
            }
            if let Some((start, len)) = runs.last_mut() {
                if *start as usize + *len == addr as usize {
                    *len += 1;
                    continue;
                }
            }
            runs.push((addr, 1));
        }
        runs
    }

    /// Number of journaled reads of `addr`.
    pub fn word_reads(&self, addr: u16) -> u32 {
        self.reads.get(&addr).copied().unwrap_or(0)
    }

    /// Position of the first journaled op matching `pred`.
    pub fn position(&self, pred: impl Fn(&BusOp) -> bool) -> Option<usize> {
        self.ops.iter().position(pred)
    }

    // -------------------------------------------------------------------------
    // Command effects
    // -------------------------------------------------------------------------

    fn apply_command(&mut self, socket: u8, command: u8) {
        let id = SocketId::new(socket).expect("socket index");
        let status = id.reg(SN_STATUS);
        match command {
            c if c == SocketCommand::Open as u8 => {
                let next = match self.peek(id.reg(SN_MODE)) & 0x0F {
                    0x01 => STATUS_INIT,
                    0x02 => STATUS_UDP,
                    0x03 => STATUS_IPRAW,
                    0x04 => STATUS_MACRAW,
                    _ => SocketStatus::CLOSED.raw(),
                };
                self.poke(status, next);
                self.poke_u16(id.reg(SN_TX_FREE), WINDOW_SIZE);
            }
            c if c == SocketCommand::Listen as u8 => self.poke(status, STATUS_LISTEN),
            c if c == SocketCommand::Connect as u8 => match self.connect {
                SimConnect::Establish => {
                    self.poke(status, SocketStatus::ESTABLISHED.raw());
                    self.raise_ir(socket, SocketInterrupt::CON);
                }
                SimConnect::Silent => {}
                SimConnect::ChipTimeout => {
                    self.poke(status, SocketStatus::CLOSED.raw());
                    self.raise_ir(socket, SocketInterrupt::TIMEOUT);
                }
            },
            c if c == SocketCommand::Disconnect as u8 || c == SocketCommand::Close as u8 => {
                self.poke(status, SocketStatus::CLOSED.raw());
            }
            c if c == SocketCommand::Send as u8 || c == SocketCommand::SendMac as u8 => {
                let wr = self.peek_u16(id.reg(SN_TX_WR));
                self.poke_u16(id.reg(SN_TX_RD), wr);
                self.poke_u16(id.reg(SN_TX_FREE), WINDOW_SIZE);
                self.raise_ir(socket, self.send_irq);
            }
            c if c == SocketCommand::Recv as u8 => {
                let rd = self.peek_u16(id.reg(SN_RX_RD));
                let consumed = rd.wrapping_sub(self.rx_acked[id.index()]);
                let size = self.peek_u16(id.reg(SN_RX_SIZE));
                self.poke_u16(id.reg(SN_RX_SIZE), size.saturating_sub(consumed));
                self.rx_acked[id.index()] = rd;
            }
            _ => {}
        }
    }
}

impl Default for SimChip {
    fn default() -> Self {
        Self::new()
    }
}

fn sock_reg(socket: u8, offset: u16) -> u16 {
    SOCKET_REG_BASE + socket as u16 * SOCKET_REG_STRIDE + offset
}

/// Socket index and register offset of `addr`, if it is a socket register.
fn decode_socket_reg(addr: u16) -> Option<(u8, u16)> {
    let end = SOCKET_REG_BASE + SOCKET_COUNT as u16 * SOCKET_REG_STRIDE;
    if !(SOCKET_REG_BASE..end).contains(&addr) {
        return None;
    }
    let rel = addr - SOCKET_REG_BASE;
    Some(((rel / SOCKET_REG_STRIDE) as u8, rel % SOCKET_REG_STRIDE))
}

impl Transport for SimChip {
    fn write(&mut self, addr: u16, data: u8) {
        self.ops.push(BusOp::Write(addr, data));
        match decode_socket_reg(addr) {
            Some((_, SN_IR)) => {
                self.mem[addr as usize] &= !data;
            }
            Some((socket, SN_COMMAND)) => {
                self.ops.push(BusOp::Command {
                    socket,
                    command: data,
                });
                if self.stuck[socket as usize] {
                    self.mem[addr as usize] = data;
                } else {
                    self.apply_command(socket, data);
                    self.mem[addr as usize] = 0;
                }
            }
            _ => self.mem[addr as usize] = data,
        }
    }

    fn read(&mut self, addr: u16) -> u8 {
        self.ops.push(BusOp::Read(addr));
        *self.reads.entry(addr).or_default() += 1;
        if let Some(value) = self.word_scripts.get_mut(&addr).and_then(VecDeque::pop_front) {
            self.poke_u16(addr, value);
        }
        if let Some(value) = self.byte_scripts.get_mut(&addr).and_then(VecDeque::pop_front) {
            self.poke(addr, value);
        }
        self.mem[addr as usize]
    }
}

/// Delay source that only counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CountingDelay {
    pub elapsed_ms: u64,
    pub elapsed_us: u64,
    pub elapsed_ns: u64,
    pub calls: u32,
}

impl DelayNs for CountingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns += ns as u64;
        self.calls += 1;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.elapsed_ms += ms as u64;
        self.calls += 1;
    }

    fn delay_us(&mut self, us: u32) {
        self.elapsed_us += us as u64;
        self.calls += 1;
    }
}

pub type SimDriver = W5100<SimChip, CountingDelay>;

/// Driver over a fresh simulated chip, not initialised.
pub fn sim_driver() -> SimDriver {
    W5100::new(SimChip::new(), CountingDelay::default())
}

/// Driver initialised with the factory defaults, journal and clock reset.
pub fn started_driver() -> SimDriver {
    let mut drv = sim_driver();
    drv.init(&ChipConfig::default());
    drv.transport_mut().clear_ops();
    *drv.delay_mut() = CountingDelay::default();
    drv
}

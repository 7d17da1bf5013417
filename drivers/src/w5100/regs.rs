//! W5100 hardware definitions.
//!
//! Bus opcodes, register offsets, socket sub-offsets, packet memory layout
//! and the driver's fixed timing constants.

// =============================================================================
// Bus Opcodes
// =============================================================================

pub(crate) const OP_WRITE: u8 = 0xF0;
pub(crate) const OP_READ: u8 = 0x0F;

// =============================================================================
// Common Registers
// =============================================================================

pub(crate) const REG_MODE: u16 = 0x0000;
pub(crate) const REG_GATEWAY: u16 = 0x0001;
pub(crate) const REG_SUBNET: u16 = 0x0005;
pub(crate) const REG_SOURCE_MAC: u16 = 0x0009;
pub(crate) const REG_SOURCE_IP: u16 = 0x000F;
pub(crate) const REG_IR: u16 = 0x0015;
pub(crate) const REG_IMR: u16 = 0x0016;
pub(crate) const REG_RETRY_TIME: u16 = 0x0017;
pub(crate) const REG_RETRY_COUNT: u16 = 0x0019;
pub(crate) const REG_RX_MEM_SIZE: u16 = 0x001A;
pub(crate) const REG_TX_MEM_SIZE: u16 = 0x001B;
pub(crate) const REG_UNREACHABLE_IP: u16 = 0x002A;
pub(crate) const REG_UNREACHABLE_PORT: u16 = 0x002E;

pub(crate) const MODE_RESET: u8 = 0x80;
/// 2 KiB for each of the four sockets, in both directions.
pub(crate) const MEM_SIZE_2K_EACH: u8 = 0x55;
pub(crate) const IR_CLEAR_ALL: u8 = 0xFF;

// =============================================================================
// Socket Registers
// =============================================================================

pub(crate) const SOCKET_REG_BASE: u16 = 0x0400;
pub(crate) const SOCKET_REG_STRIDE: u16 = 0x0100;

pub(crate) const SN_MODE: u16 = 0x00;
pub(crate) const SN_COMMAND: u16 = 0x01;
pub(crate) const SN_IR: u16 = 0x02;
pub(crate) const SN_STATUS: u16 = 0x03;
pub(crate) const SN_SOURCE_PORT: u16 = 0x04;
pub(crate) const SN_DEST_MAC: u16 = 0x06;
pub(crate) const SN_DEST_IP: u16 = 0x0C;
pub(crate) const SN_DEST_PORT: u16 = 0x10;
pub(crate) const SN_MSS: u16 = 0x12;
pub(crate) const SN_PROTO: u16 = 0x14;
pub(crate) const SN_TOS: u16 = 0x15;
pub(crate) const SN_TTL: u16 = 0x16;
pub(crate) const SN_TX_FREE: u16 = 0x20;
/// Transmit read pointer, advanced by the chip as data leaves the wire.
pub(crate) const SN_TX_RD: u16 = 0x22;
/// Transmit write pointer, advanced by the driver after filling the window.
pub(crate) const SN_TX_WR: u16 = 0x24;
pub(crate) const SN_RX_SIZE: u16 = 0x26;
pub(crate) const SN_RX_RD: u16 = 0x28;

// =============================================================================
// Packet Memory
// =============================================================================

pub(crate) const TX_WINDOW_BASE: u16 = 0x4000;
pub(crate) const RX_WINDOW_BASE: u16 = 0x6000;

pub const SOCKET_COUNT: usize = 4;
/// Each socket owns one contiguous window per direction, packed back to back
/// from the direction's base, so socket `n` starts at `base + n * WINDOW_SIZE`.
pub const WINDOW_SIZE: u16 = 0x0800;
pub(crate) const WINDOW_MASK: u16 = WINDOW_SIZE - 1;

/// Largest payload a single send accepts.
pub const MAX_SEND: usize = WINDOW_SIZE as usize;

/// UDP receive header: source IPv4 (4), source port (2), payload length (2).
pub const UDP_HEADER_LEN: usize = 8;

// =============================================================================
// Timing
// =============================================================================

pub(crate) const POLL_INTERVAL_MS: u32 = 1;
pub(crate) const COMMAND_MAX_POLLS: u32 = 125;
pub(crate) const CONNECT_MAX_POLLS: u32 = 3000;
pub(crate) const BOOT_DELAY_MS: u32 = 250;
pub(crate) const RESET_SETTLE_MS: u32 = 10;

//! WIZnet W5100 network offload chip.
//!
//! The chip runs TCP/UDP itself and exposes four hardware sockets through a
//! 16-bit register space reached over SPI. [`W5100`] owns the bus transport,
//! a delay source, the socket allocation table and the cached subnet mask,
//! so there is no hidden global state: the caller owns the driver and every
//! operation takes `&mut self`.
//!
//! # Subnet register errata
//!
//! The chip misbehaves when the subnet mask register holds a real mask while
//! idle. The driver keeps the register at zero and only writes the cached
//! mask around CONNECT and SEND, see [`W5100::with_subnet_errata`].
//!
//! # Waits
//!
//! All waits are polled. Command acknowledgment and connect are bounded;
//! listen-wait, send completion and the free-space wait are not, and block
//! until the chip makes progress.

pub mod access;
pub mod buffer;
pub mod command;
pub mod compat;
pub mod config;
pub mod regs;
pub mod socket;
pub mod tcp;
pub mod transport;
pub mod udp;

#[cfg(test)]
pub(crate) mod sim;

use w5100_lib::{DelayNs, klog_info};

use crate::net::addr::{Ipv4Text, MacText, format_ipv4, format_mac};
use crate::net::types::{Ipv4Addr, MacAddr, Port, W5100Error};

pub use access::Registers;
pub use config::ChipConfig;
pub use socket::{
    Protocol, SocketCommand, SocketEntry, SocketFlags, SocketId, SocketInterrupt, SocketStatus,
    SocketTable,
};
pub use tcp::ConnectStatus;
pub use transport::{NoSelect, SpiBus, SpiStatus, SpiTransport, Transport, TransportMode};
pub use udp::{UdpPacket, UdpReceive};

use regs::{
    BOOT_DELAY_MS, IR_CLEAR_ALL, MEM_SIZE_2K_EACH, MODE_RESET, REG_GATEWAY, REG_IMR, REG_IR,
    REG_MODE, REG_RETRY_COUNT, REG_RETRY_TIME, REG_RX_MEM_SIZE, REG_SOURCE_IP, REG_SOURCE_MAC,
    REG_SUBNET, REG_TX_MEM_SIZE, REG_UNREACHABLE_IP, REG_UNREACHABLE_PORT, RESET_SETTLE_MS,
};

pub struct W5100<T: Transport, D: DelayNs> {
    regs: Registers<T>,
    delay: D,
    sockets: SocketTable,
    subnet_mask: Ipv4Addr,
}

impl<T: Transport, D: DelayNs> W5100<T, D> {
    /// Wrap a transport and delay source. The chip is not touched until
    /// [`init`](Self::init) or [`start`](Self::start).
    pub fn new(transport: T, delay: D) -> Self {
        Self {
            regs: Registers::new(transport),
            delay,
            sockets: SocketTable::new(),
            subnet_mask: Ipv4Addr::UNSPECIFIED,
        }
    }

    /// Reset the chip and program the network configuration.
    ///
    /// Waits out the boot delay, issues a soft reset, closes every socket,
    /// splits packet memory 2 KiB per socket in each direction, writes the
    /// gateway, subnet, MAC and source IP, clears pending interrupts and
    /// finally zeroes the subnet register (the mask stays cached).
    pub fn init(&mut self, config: &ChipConfig) {
        self.delay.delay_ms(BOOT_DELAY_MS);
        self.regs.write_u8(REG_MODE, MODE_RESET);
        self.delay.delay_ms(RESET_SETTLE_MS);

        for id in SocketId::ALL {
            self.close(id);
        }

        self.regs.write_u8(REG_TX_MEM_SIZE, MEM_SIZE_2K_EACH);
        self.regs.write_u8(REG_RX_MEM_SIZE, MEM_SIZE_2K_EACH);
        self.regs.write_ipv4(REG_GATEWAY, config.gateway);
        self.regs.write_ipv4(REG_SUBNET, config.subnet);
        self.subnet_mask = config.subnet;
        self.regs.write_mac(REG_SOURCE_MAC, config.mac);
        self.regs.write_ipv4(REG_SOURCE_IP, config.ip);
        self.regs.write_u8(REG_IR, IR_CLEAR_ALL);
        self.regs.write_ipv4(REG_SUBNET, Ipv4Addr::UNSPECIFIED);

        klog_info!(
            "w5100: initialised mac {} ip {} gateway {}",
            config.mac,
            config.ip,
            config.gateway
        );
    }

    /// [`init`](Self::init) with the factory defaults. Returns the
    /// configuration that was applied.
    pub fn start(&mut self) -> ChipConfig {
        let config = ChipConfig::default();
        self.init(&config);
        config
    }

    /// Run `f` with the cached subnet mask loaded into the subnet register,
    /// zeroing the register again afterwards.
    pub fn with_subnet_errata<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.regs.write_ipv4(REG_SUBNET, self.subnet_mask);
        let result = f(self);
        self.regs.write_ipv4(REG_SUBNET, Ipv4Addr::UNSPECIFIED);
        result
    }

    // -------------------------------------------------------------------------
    // Ownership
    // -------------------------------------------------------------------------

    pub fn transport(&self) -> &T {
        self.regs.transport()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.regs.transport_mut()
    }

    pub fn delay(&self) -> &D {
        &self.delay
    }

    pub fn delay_mut(&mut self) -> &mut D {
        &mut self.delay
    }

    /// Give back the transport and delay source.
    pub fn release(self) -> (T, D) {
        (self.regs.into_inner(), self.delay)
    }

    // -------------------------------------------------------------------------
    // Addressing
    // -------------------------------------------------------------------------

    pub fn ip(&mut self) -> Ipv4Addr {
        self.regs.read_ipv4(REG_SOURCE_IP)
    }

    /// Program a new source IP. `0.0.0.0` and `255.255.255.255` are refused.
    pub fn set_ip(&mut self, ip: Ipv4Addr) -> Result<(), W5100Error> {
        if !ip.is_valid_peer() {
            return Err(W5100Error::InvalidAddress);
        }
        self.regs.write_ipv4(REG_SOURCE_IP, ip);
        Ok(())
    }

    pub fn mac(&mut self) -> MacAddr {
        self.regs.read_mac(REG_SOURCE_MAC)
    }

    pub fn set_mac(&mut self, mac: MacAddr) {
        self.regs.write_mac(REG_SOURCE_MAC, mac);
    }

    /// Programmed source IP as dotted text.
    pub fn ip_text(&mut self) -> Ipv4Text {
        format_ipv4(self.ip())
    }

    /// Programmed MAC as dash-separated text.
    pub fn mac_text(&mut self) -> MacText {
        format_mac(self.mac())
    }

    pub fn gateway(&mut self) -> Ipv4Addr {
        self.regs.read_ipv4(REG_GATEWAY)
    }

    pub fn set_gateway(&mut self, gateway: Ipv4Addr) {
        self.regs.write_ipv4(REG_GATEWAY, gateway);
    }

    /// Cached subnet mask. The register itself reads zero outside
    /// [`with_subnet_errata`](Self::with_subnet_errata).
    pub fn subnet_mask(&self) -> Ipv4Addr {
        self.subnet_mask
    }

    /// Replace the cached subnet mask; takes effect on the next CONNECT or
    /// SEND.
    pub fn set_subnet_mask(&mut self, mask: Ipv4Addr) {
        self.subnet_mask = mask;
    }

    // -------------------------------------------------------------------------
    // Common registers
    // -------------------------------------------------------------------------

    /// Retransmission timeout in units of 100 us.
    pub fn retry_time(&mut self) -> u16 {
        self.regs.read_u16(REG_RETRY_TIME)
    }

    pub fn set_retry_time(&mut self, time: u16) {
        self.regs.write_u16(REG_RETRY_TIME, time);
    }

    pub fn retry_count(&mut self) -> u8 {
        self.regs.read_u8(REG_RETRY_COUNT)
    }

    pub fn set_retry_count(&mut self, count: u8) {
        self.regs.write_u8(REG_RETRY_COUNT, count);
    }

    pub fn interrupt_mask(&mut self) -> u8 {
        self.regs.read_u8(REG_IMR)
    }

    pub fn set_interrupt_mask(&mut self, mask: u8) {
        self.regs.write_u8(REG_IMR, mask);
    }

    pub fn interrupts(&mut self) -> u8 {
        self.regs.read_u8(REG_IR)
    }

    /// Destination of the last packet answered with ICMP unreachable.
    pub fn unreachable_ip(&mut self) -> Ipv4Addr {
        self.regs.read_ipv4(REG_UNREACHABLE_IP)
    }

    pub fn unreachable_port(&mut self) -> Port {
        Port(self.regs.read_u16(REG_UNREACHABLE_PORT))
    }
}

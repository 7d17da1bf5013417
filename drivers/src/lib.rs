#![no_std]

#[cfg(test)]
extern crate std;

pub mod greeter;
pub mod net;
pub mod w5100;

pub use net::types::{Ipv4Addr, MacAddr, Port, SockAddr, W5100Error};
pub use w5100::{ChipConfig, SocketId, W5100};

//! Address types and text utilities shared by the W5100 driver.

pub mod addr;
pub mod types;

pub use addr::{
    IPV4_TEXT_LEN, Ipv4Text, MAC_TEXT_LEN, MacText, format_ipv4, format_mac, parse_ipv4,
    parse_mac, parse_mac_addr,
};
pub use types::{Ipv4Addr, MacAddr, Port, SockAddr, W5100Error};

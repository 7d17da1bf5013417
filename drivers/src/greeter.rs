//! Telnet-style greeter: accept one TCP connection, print a banner, hang up.
//!
//! The board's main loop calls [`serve_once`] forever.

use w5100_lib::{DelayNs, klog_info};

use crate::net::types::{Port, W5100Error};
use crate::w5100::{Transport, W5100};

pub const GREETER_PORT: Port = Port(23);
/// Clears the terminal, then greets.
pub const GREETING: &str = "\x1b[2JHello from the W5100\r\n";

/// Time for the banner to leave the chip before hanging up.
const DRAIN_MS: u32 = 10;
/// Grace period between disconnect and close.
const LINGER_MS: u32 = 50;

/// Serve a single client on `port`: open, wait (without bound) for a
/// connection, send `message`, disconnect and close. Returns the number of
/// bytes sent.
pub fn serve_once<T: Transport, D: DelayNs>(
    driver: &mut W5100<T, D>,
    port: Port,
    message: &str,
) -> Result<usize, W5100Error> {
    let id = driver.tcp_open(port)?;
    driver.tcp_listen_wait(id);
    klog_info!("greeter: client connected on socket {}", id);

    let sent = driver.tcp_print(id, message);
    driver.delay_mut().delay_ms(DRAIN_MS);
    driver.tcp_disconnect(id);
    driver.delay_mut().delay_ms(LINGER_MS);
    driver.close(id);
    sent
}

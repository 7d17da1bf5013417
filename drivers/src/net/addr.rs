//! Address text utilities: dotted IPv4 and dash-separated MAC strings.
//!
//! Parsing is byte-oriented and allocation-free. Rendering goes into a
//! [`TextBuf`] sized for the longest canonical form.

use w5100_lib::numfmt::{TextBuf, hex_value};

use super::types::{Ipv4Addr, MacAddr, W5100Error};

/// Longest dotted-decimal IPv4 text: `255.255.255.255`.
pub const IPV4_TEXT_LEN: usize = 15;
/// Dash-separated MAC text: `FF-FF-FF-FF-FF-FF`.
pub const MAC_TEXT_LEN: usize = 17;

pub type Ipv4Text = TextBuf<IPV4_TEXT_LEN>;
pub type MacText = TextBuf<MAC_TEXT_LEN>;

const IPV4_GROUPS: usize = 4;
const IPV4_GROUP_DIGITS: usize = 3;
const MAC_GROUPS: usize = 6;

/// Parse dotted-decimal IPv4 text such as `192.168.1.101`.
///
/// Exactly four groups of one to three decimal digits, each at most 255,
/// separated by single dots. Anything else (missing groups, a fifth group,
/// trailing characters, an over-long group) is [`W5100Error::Malformed`].
pub fn parse_ipv4(text: &str) -> Result<Ipv4Addr, W5100Error> {
    let mut octets = [0u8; IPV4_GROUPS];
    let mut group = 0usize;
    let mut digits = 0usize;
    let mut value = 0u16;

    for &c in text.as_bytes() {
        match c {
            b'0'..=b'9' => {
                if digits == IPV4_GROUP_DIGITS {
                    return Err(W5100Error::Malformed);
                }
                value = value * 10 + (c - b'0') as u16;
                digits += 1;
            }
            b'.' => {
                if digits == 0 || group == IPV4_GROUPS - 1 {
                    return Err(W5100Error::Malformed);
                }
                octets[group] = octet(value)?;
                group += 1;
                digits = 0;
                value = 0;
            }
            _ => return Err(W5100Error::Malformed),
        }
    }

    if digits == 0 || group != IPV4_GROUPS - 1 {
        return Err(W5100Error::Malformed);
    }
    octets[group] = octet(value)?;
    Ok(Ipv4Addr(octets))
}

fn octet(value: u16) -> Result<u8, W5100Error> {
    u8::try_from(value).map_err(|_| W5100Error::Malformed)
}

/// Parse a MAC address of six two-digit hex groups separated by `-`,
/// e.g. `00-DE-AD-BE-EF-00`, into `out`.
///
/// Groups are decoded left to right straight into `out`. On the first
/// structural violation (non-hex digit, missing second nibble, missing
/// separator, fewer than six groups, trailing characters) parsing stops and
/// [`W5100Error::BadData`] is returned with `out` holding every group decoded
/// so far, including a partially decoded group.
pub fn parse_mac(text: &str, out: &mut [u8; 6]) -> Result<(), W5100Error> {
    let bytes = text.as_bytes();
    let mut idx = 0usize;

    for digit in 0..MAC_GROUPS {
        let hi = bytes
            .get(idx)
            .and_then(|&c| hex_value(c))
            .ok_or(W5100Error::BadData)?;
        out[digit] = hi << 4;
        idx += 1;

        let lo = bytes
            .get(idx)
            .and_then(|&c| hex_value(c))
            .ok_or(W5100Error::BadData)?;
        out[digit] |= lo;
        idx += 1;

        if digit < MAC_GROUPS - 1 {
            if bytes.get(idx) != Some(&b'-') {
                return Err(W5100Error::BadData);
            }
            idx += 1;
        }
    }

    if idx != bytes.len() {
        return Err(W5100Error::BadData);
    }
    Ok(())
}

/// Convenience wrapper around [`parse_mac`] returning a [`MacAddr`].
pub fn parse_mac_addr(text: &str) -> Result<MacAddr, W5100Error> {
    let mut out = [0u8; 6];
    parse_mac(text, &mut out)?;
    Ok(MacAddr(out))
}

/// Render `ip` as canonical dotted decimal (no leading zeros).
pub fn format_ipv4(ip: Ipv4Addr) -> Ipv4Text {
    let mut text = Ipv4Text::new();
    for (i, &b) in ip.0.iter().enumerate() {
        if i > 0 {
            text.push(b'.');
        }
        text.push_u8_dec(b);
    }
    text
}

/// Render `mac` as dash-separated upper-case hex.
pub fn format_mac(mac: MacAddr) -> MacText {
    let mut text = MacText::new();
    for (i, &b) in mac.0.iter().enumerate() {
        if i > 0 {
            text.push(b'-');
        }
        text.push_hex_u8(b);
    }
    text
}

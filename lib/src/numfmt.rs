//! Stack-only number and text formatting for `no_std` contexts.
//!
//! Every helper writes into caller-provided storage. No heap, no allocator.
//!
//! # Typed wrapper
//!
//! [`TextBuf`] encapsulates a fixed-capacity stack buffer that implements
//! [`core::fmt::Write`], so address renderers can hand back owned text
//! without allocating:
//!
//! ```ignore
//! let mut text = TextBuf::<16>::new();
//! text.push_u8_dec(192);
//! text.push(b'.');
//! assert_eq!(text.as_str(), "192.");
//! ```

use core::fmt;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

// ---------------------------------------------------------------------------
// Digit helpers
// ---------------------------------------------------------------------------

/// Upper-case hex digit for the low nibble of `nibble`.
#[inline]
pub const fn hex_digit(nibble: u8) -> u8 {
    HEX_DIGITS[(nibble & 0x0F) as usize]
}

/// Value of an ASCII hex digit (either case), or `None`.
#[inline]
pub const fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Format a `u8` as decimal without leading zeros into `buf`.
///
/// Returns the formatted sub-slice (1 to 3 bytes). `buf` must hold at
/// least 3 bytes.
pub fn fmt_u8_dec(value: u8, buf: &mut [u8; 3]) -> &[u8] {
    let mut len = 0;
    let mut work = value;
    if work >= 100 {
        buf[len] = b'0' + work / 100;
        work %= 100;
        len += 1;
    }
    if value >= 10 {
        buf[len] = b'0' + work / 10;
        work %= 10;
        len += 1;
    }
    buf[len] = b'0' + work;
    len += 1;
    &buf[..len]
}

// ---------------------------------------------------------------------------
// TextBuf
// ---------------------------------------------------------------------------

/// Fixed-capacity ASCII text held on the stack.
///
/// Writes past capacity are truncated and reported as `fmt::Error` through
/// the `fmt::Write` impl.
#[derive(Clone, Copy)]
pub struct TextBuf<const N: usize> {
    data: [u8; N],
    len: usize,
}

impl<const N: usize> TextBuf<N> {
    pub const fn new() -> Self {
        Self {
            data: [0; N],
            len: 0,
        }
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Append one byte; returns `false` if the buffer is full.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.len >= N {
            return false;
        }
        self.data[self.len] = byte;
        self.len += 1;
        true
    }

    /// Append a byte slice; returns `false` (after writing what fits) if it
    /// did not fit entirely.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> bool {
        bytes.iter().all(|&b| self.push(b))
    }

    /// Append `value` in decimal without leading zeros.
    pub fn push_u8_dec(&mut self, value: u8) -> bool {
        let mut digits = [0u8; 3];
        let text = fmt_u8_dec(value, &mut digits);
        self.push_bytes(text)
    }

    /// Append `value` as two upper-case hex digits.
    pub fn push_hex_u8(&mut self, value: u8) -> bool {
        self.push(hex_digit(value >> 4)) && self.push(hex_digit(value))
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Contents as `&str`; only ASCII is ever pushed by the helpers above.
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(self.as_bytes()).unwrap_or("<invalid>")
    }
}

impl<const N: usize> Default for TextBuf<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> PartialEq for TextBuf<N> {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<const N: usize> Eq for TextBuf<N> {}

impl<const N: usize> PartialEq<str> for TextBuf<N> {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<const N: usize> PartialEq<&str> for TextBuf<N> {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<const N: usize> fmt::Write for TextBuf<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.push_bytes(s.as_bytes()) {
            Ok(())
        } else {
            Err(fmt::Error)
        }
    }
}

impl<const N: usize> fmt::Display for TextBuf<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<const N: usize> fmt::Debug for TextBuf<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

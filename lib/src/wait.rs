//! Polled waits with a fixed poll granularity.
//!
//! The chip offers no completion interrupts to this driver, so every wait is
//! a cooperative busy-spin: check a condition, sleep one interval, repeat.
//! Two flavours exist:
//!
//! - [`poll_bounded`] gives up after [`BoundedWait::max_polls`] intervals and
//!   reports [`WaitOutcome::TimedOut`]. Running out of polls is a normal
//!   outcome, not an error.
//! - [`poll_unbounded`] only returns once the condition holds. Use it solely
//!   where the hardware is assumed to make progress eventually.
//!
//! Sleeping goes through [`DelayNs`] from `embedded-hal`, so the board's HAL
//! timer plugs in directly.

/// Delay source supplied by the board. Any `embedded-hal` delay provider
/// works; the driver only calls [`DelayNs::delay_ms`].
pub use embedded_hal::delay::DelayNs;

/// Upper bound for a polled wait.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundedWait {
    /// Maximum number of intervals slept before giving up.
    pub max_polls: u32,
    /// Sleep between two checks of the condition.
    pub interval_ms: u32,
}

impl BoundedWait {
    pub const fn new(max_polls: u32, interval_ms: u32) -> Self {
        Self {
            max_polls,
            interval_ms,
        }
    }

    /// Longest time the wait can take, ignoring the cost of the checks.
    pub const fn max_duration_ms(&self) -> u64 {
        self.max_polls as u64 * self.interval_ms as u64
    }
}

/// Result of a bounded wait. Both variants carry the number of intervals
/// slept before the wait ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitOutcome {
    Ready(u32),
    TimedOut(u32),
}

impl WaitOutcome {
    #[inline]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    #[inline]
    pub const fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut(_))
    }

    #[inline]
    pub const fn polls(&self) -> u32 {
        match self {
            Self::Ready(n) | Self::TimedOut(n) => *n,
        }
    }
}

/// Check `done` until it returns `true` or `bound.max_polls` intervals have
/// elapsed. The condition is evaluated before the first sleep, so an already
/// satisfied condition returns `Ready(0)` without delaying.
pub fn poll_bounded<D, F>(delay: &mut D, bound: BoundedWait, mut done: F) -> WaitOutcome
where
    D: DelayNs + ?Sized,
    F: FnMut() -> bool,
{
    let mut polls = 0u32;
    loop {
        if done() {
            return WaitOutcome::Ready(polls);
        }
        if polls >= bound.max_polls {
            return WaitOutcome::TimedOut(polls);
        }
        polls += 1;
        delay.delay_ms(bound.interval_ms);
    }
}

/// Check `done` every `interval_ms` until it returns `true`.
///
/// There is no upper bound: if the condition never holds this never
/// returns. Returns the number of intervals slept.
pub fn poll_unbounded<D, F>(delay: &mut D, interval_ms: u32, mut done: F) -> u32
where
    D: DelayNs + ?Sized,
    F: FnMut() -> bool,
{
    let mut polls = 0u32;
    while !done() {
        polls = polls.wrapping_add(1);
        delay.delay_ms(interval_ms);
    }
    polls
}

#![no_std]

#[cfg(test)]
extern crate std;

pub mod klog;
pub mod numfmt;
pub mod wait;

pub use klog::{
    KlogLevel, klog_get_level, klog_init, klog_is_enabled, klog_register_backend, klog_set_level,
};
pub use numfmt::TextBuf;
pub use wait::{BoundedWait, DelayNs, WaitOutcome, poll_bounded, poll_unbounded};

//! Socket command engine.
//!
//! A command is written to the socket command register; the chip clears the
//! register once it has accepted the command. The driver polls for that at a
//! 1 ms interval for at most 125 intervals. Running out of polls is reported
//! only through the returned [`WaitOutcome`]: callers do not treat it as a
//! failure and carry on.

use w5100_lib::{
    BoundedWait, DelayNs, WaitOutcome, klog_debug, klog_warn, poll_bounded, poll_unbounded,
};

use super::W5100;
use super::regs::{COMMAND_MAX_POLLS, POLL_INTERVAL_MS, SN_COMMAND, SN_IR};
use super::socket::{SocketCommand, SocketId, SocketInterrupt};
use super::transport::Transport;

pub(crate) const COMMAND_WAIT: BoundedWait = BoundedWait::new(COMMAND_MAX_POLLS, POLL_INTERVAL_MS);

impl<T: Transport, D: DelayNs> W5100<T, D> {
    /// Issue `command` on `id` and wait for the chip to acknowledge it.
    pub fn execute(&mut self, id: SocketId, command: SocketCommand) -> WaitOutcome {
        self.regs.set_socket_u8(id, SN_COMMAND, command as u8);
        let regs = &mut self.regs;
        let outcome = poll_bounded(&mut self.delay, COMMAND_WAIT, || {
            regs.socket_u8(id, SN_COMMAND) == 0
        });
        if outcome.is_timed_out() {
            klog_debug!(
                "w5100: socket {} command {:?} not acknowledged after {} polls",
                id,
                command,
                outcome.polls()
            );
        }
        outcome
    }

    /// Issue a SEND-family command inside the subnet errata bracket and wait,
    /// without bound, for SEND_OK or a timeout/disconnect interrupt. SEND_OK
    /// is cleared before returning; the interrupt bits seen are returned.
    pub(crate) fn send_and_wait(&mut self, id: SocketId, command: SocketCommand) -> SocketInterrupt {
        let ir = self.with_subnet_errata(|drv| {
            drv.execute(id, command);
            let regs = &mut drv.regs;
            let mut ir = SocketInterrupt::empty();
            poll_unbounded(&mut drv.delay, POLL_INTERVAL_MS, || {
                ir = SocketInterrupt::from_bits_truncate(regs.socket_u8(id, SN_IR));
                ir.intersects(SEND_DONE)
            });
            drv.regs
                .set_socket_u8(id, SN_IR, SocketInterrupt::SEND_OK.bits());
            ir
        });
        if !ir.contains(SocketInterrupt::SEND_OK) {
            klog_warn!("w5100: socket {} send ended without SEND_OK ({:?})", id, ir);
        }
        ir
    }
}

const SEND_DONE: SocketInterrupt = SocketInterrupt::SEND_OK
    .union(SocketInterrupt::TIMEOUT)
    .union(SocketInterrupt::DISCON);

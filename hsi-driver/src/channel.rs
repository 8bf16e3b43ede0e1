//! Channel lifecycle
//!
//! CLOSED -> OPEN -> CLOSED. Everything except callback registration is
//! refused on a closed channel.

use embassy_sync::blocking_mutex::raw::RawMutex;

use hsi_core::registers::sys;
use hsi_core::{ChannelFlags, ChannelId, HsiError, PortEvent};
use hsi_hal::{RegisterAccess, TransferBackend};

use crate::controller::{ClockScope, Controller, Shared};
use crate::platform::Platform;
use crate::transfer::{drop_requests_locked, rearm_poll_locked};

/// Port events unmasked when a channel opens
const OPEN_EVENTS: u32 = sys::PEER_WAKE_DETECTED | sys::ERROR_OCCURRED | sys::BREAK_DETECTED;

impl<M: RawMutex, P: Platform> Controller<M, P> {
    pub(crate) fn open(&self, id: ChannelId) -> Result<(), HsiError> {
        let cb = self.callbacks(id);
        if cb.read_done.is_none() || cb.write_done.is_none() {
            warn!("{}: open with no read/write callbacks registered", id);
            return Err(HsiError::InvalidArgument);
        }

        let _clk = ClockScope::enter(self.clocks(), id, "open");
        self.with_shared(|s| {
            let ch = s.channel(id);
            if ch.flags.contains(ChannelFlags::OPEN) {
                warn!("{}: already open", id);
                return Err(HsiError::Busy);
            }
            ch.flags.insert(ChannelFlags::OPEN);

            // Error and break are port-wide; enabling them again is harmless
            let irq = s.port(id.port).irq;
            s.regs.set_bits32(sys::mpu_enable(id.port, irq), OPEN_EVENTS);
            Ok(())
        })?;

        debug!("{}: opened", id);
        Ok(())
    }

    pub(crate) fn close(&self, id: ChannelId) {
        let _clk = ClockScope::enter(self.clocks(), id, "close");
        let closed = self.with_shared(|s| {
            let ch = s.channel(id);
            if !ch.flags.contains(ChannelFlags::OPEN) {
                return false;
            }
            ch.flags.remove(ChannelFlags::OPEN);
            drop_requests_locked(s, id);
            true
        });

        if closed {
            debug!("{}: closed", id);
        }
    }

    pub(crate) fn poll(&self, id: ChannelId) -> Result<(), HsiError> {
        let _clk = ClockScope::enter(self.clocks(), id, "poll");
        self.with_shared(|s| {
            let ch = s.channel(id);
            if !ch.flags.contains(ChannelFlags::OPEN) {
                warn!("{}: poll on closed channel", id);
                return Err(HsiError::InvalidArgument);
            }
            let already_armed = ch.read.is_some() || ch.flags.contains(ChannelFlags::RX_POLL);
            ch.flags.insert(ChannelFlags::RX_POLL);
            if already_armed {
                return Ok(());
            }

            s.backend.enable_read_interrupt(id, None).map_err(|err| {
                error!("{}: poll arm failed: {}", id, err);
                s.channel(id).flags.remove(ChannelFlags::RX_POLL);
                HsiError::from(err)
            })
        })
    }

    /// Whether `id` names an attached channel
    pub(crate) fn contains(&self, id: ChannelId) -> bool {
        self.device(id.port, id.channel).is_ok()
    }

    /// Report data arrival on a polled channel
    ///
    /// Called from receive interrupt context when a word arrives and no read
    /// is pending. Clears RX_POLL and raises [`PortEvent::DataAvailable`] on
    /// the channel. Returns `false` when the channel was not polling.
    pub fn data_available(&self, id: ChannelId) -> bool {
        if !self.contains(id) {
            return false;
        }

        let polled = self.with_shared(|s| {
            let ch = s.channel(id);
            let polled = ch.flags.contains(ChannelFlags::RX_POLL | ChannelFlags::OPEN);
            ch.flags.remove(ChannelFlags::RX_POLL);
            polled
        });
        if !polled {
            return false;
        }

        if let Some(cb) = self.callbacks(id).port_event {
            cb(id, PortEvent::DataAvailable);
        }
        true
    }

    /// Report completion of the pending read on `id`
    ///
    /// Called from interrupt or DMA completion context. The read callback
    /// runs exactly once per accepted request; a completion for a request
    /// that was cancelled (or never issued) is dropped and `false` returned.
    pub fn complete_read(&self, id: ChannelId, words: usize) -> bool {
        if !self.contains(id) {
            return false;
        }
        let done = self.with_shared(|s| {
            let desc = s.channel(id).read.take();
            if desc.is_some() {
                rearm_poll_locked(s, id);
            }
            desc
        });
        if done.is_none() {
            trace!("{}: stale read completion", id);
            return false;
        }
        if let Some(cb) = self.callbacks(id).read_done {
            cb(id, words);
        }
        true
    }

    /// Report completion of the pending write on `id`
    ///
    /// Same contract as [`Controller::complete_read`].
    pub fn complete_write(&self, id: ChannelId, words: usize) -> bool {
        if !self.contains(id) {
            return false;
        }
        let Some(_desc) = self.with_shared(|s| s.channel(id).write.take()) else {
            trace!("{}: stale write completion", id);
            return false;
        };
        if let Some(cb) = self.callbacks(id).write_done {
            cb(id, words);
        }
        true
    }
}

/// Whether `id` is open, read under the lock
pub(crate) fn is_open<P: Platform>(s: &mut Shared<P>, id: ChannelId) -> bool {
    s.channel(id).flags.contains(ChannelFlags::OPEN)
}

//! Read/write request tracking
//!
//! One request per direction per channel. Single-word requests use the
//! interrupt path, anything longer a block transfer; the threshold is fixed
//! because DMA setup costs more than moving one word by hand.

use embassy_sync::blocking_mutex::raw::RawMutex;

use hsi_core::{ChannelFlags, ChannelId, HsiError};
use hsi_hal::TransferBackend;

use crate::controller::{ClockScope, Controller, Descriptor, Shared, TransferPath};
use crate::platform::Platform;

/// Largest request that still goes through the interrupt path
pub const INTERRUPT_PATH_MAX_WORDS: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dir {
    Read,
    Write,
}

impl<M: RawMutex, P: Platform> Controller<M, P> {
    pub(crate) fn write(&self, id: ChannelId, buf: usize, words: usize) -> Result<(), HsiError> {
        self.submit(id, Dir::Write, buf, words)
    }

    pub(crate) fn read(&self, id: ChannelId, buf: usize, words: usize) -> Result<(), HsiError> {
        self.submit(id, Dir::Read, buf, words)
    }

    fn submit(&self, id: ChannelId, dir: Dir, buf: usize, words: usize) -> Result<(), HsiError> {
        if buf == 0 || words == 0 {
            warn!("{}: bad request buf {:#x} words {}", id, buf, words);
            return Err(HsiError::InvalidArgument);
        }

        self.with_shared(|s| {
            let ch = s.channel(id);
            if !ch.flags.contains(ChannelFlags::OPEN) {
                warn!("{}: request on closed channel", id);
                return Err(HsiError::InvalidArgument);
            }

            let slot = match dir {
                Dir::Read => &mut ch.read,
                Dir::Write => &mut ch.write,
            };
            if slot.is_some() {
                warn!("{}: request already pending", id);
                return Err(HsiError::InvalidArgument);
            }
            *slot = Some(Descriptor {
                buf,
                words,
                path: TransferPath::Interrupt,
            });

            let dispatched = if words <= INTERRUPT_PATH_MAX_WORDS {
                match dir {
                    Dir::Read => s.backend.enable_read_interrupt(id, Some(buf)),
                    Dir::Write => s.backend.enable_write_interrupt(id, buf),
                }
                .map(|()| TransferPath::Interrupt)
            } else {
                match dir {
                    Dir::Read => s.backend.read_dma(id, buf, words),
                    Dir::Write => s.backend.write_dma(id, buf, words),
                }
                .map(TransferPath::Dma)
            };

            let ch = s.channel(id);
            let slot = match dir {
                Dir::Read => &mut ch.read,
                Dir::Write => &mut ch.write,
            };
            match dispatched {
                Ok(path) => {
                    if let Some(desc) = slot.as_mut() {
                        desc.path = path;
                    }
                    trace!("{}: {} words accepted", id, words);
                    Ok(())
                }
                Err(err) => {
                    error!("{}: dispatch failed: {}", id, err);
                    *slot = None;
                    Err(err.into())
                }
            }
        })
    }

    pub(crate) fn write_cancel(&self, id: ChannelId) -> Result<(), HsiError> {
        self.cancel(id, Dir::Write)
    }

    pub(crate) fn read_cancel(&self, id: ChannelId) -> Result<(), HsiError> {
        self.cancel(id, Dir::Read)
    }

    fn cancel(&self, id: ChannelId, dir: Dir) -> Result<(), HsiError> {
        let _clk = ClockScope::enter(self.clocks(), id, "cancel");
        self.with_shared(|s| {
            if !s.channel(id).flags.contains(ChannelFlags::OPEN) {
                warn!("{}: cancel on closed channel", id);
                return Err(HsiError::InvalidArgument);
            }
            let cancelled = match dir {
                Dir::Read => cancel_read_locked(s, id),
                Dir::Write => cancel_write_locked(s, id),
            };
            if cancelled {
                debug!("{}: request cancelled", id);
            }
            Ok(())
        })
    }
}

/// Disarm polling and cancel both directions of `id`
pub(crate) fn drop_requests_locked<P: Platform>(s: &mut Shared<P>, id: ChannelId) {
    let ch = s.channel(id);
    let polled_only = ch.flags.contains(ChannelFlags::RX_POLL) && ch.read.is_none();
    ch.flags.remove(ChannelFlags::RX_POLL);
    if polled_only {
        s.backend.cancel_read_interrupt(id);
    }
    cancel_write_locked(s, id);
    cancel_read_locked(s, id);
}

/// Cancel the pending write of `id` on whichever path carries it
///
/// Returns whether a request was pending.
pub(crate) fn cancel_write_locked<P: Platform>(s: &mut Shared<P>, id: ChannelId) -> bool {
    let Some(desc) = s.channel(id).write.take() else {
        return false;
    };
    match desc.path {
        TransferPath::Interrupt => s.backend.cancel_write_interrupt(id),
        TransferPath::Dma(dma) => s.backend.cancel_write_dma(id, dma),
    }
    true
}

/// Cancel the pending read of `id` on whichever path carries it
///
/// Polling is re-armed once the read is gone.
pub(crate) fn cancel_read_locked<P: Platform>(s: &mut Shared<P>, id: ChannelId) -> bool {
    let Some(desc) = s.channel(id).read.take() else {
        return false;
    };
    match desc.path {
        TransferPath::Interrupt => s.backend.cancel_read_interrupt(id),
        TransferPath::Dma(dma) => s.backend.cancel_read_dma(id, dma),
    }
    rearm_poll_locked(s, id);
    true
}

/// Arm the data-available interrupt again if `id` is polling
///
/// `poll` leaves the interrupt alone while a read is pending, so whatever
/// ends the read calls this. A failed arm drops RX_POLL.
pub(crate) fn rearm_poll_locked<P: Platform>(s: &mut Shared<P>, id: ChannelId) {
    if !s.channel(id).flags.contains(ChannelFlags::RX_POLL) {
        return;
    }
    if let Err(err) = s.backend.enable_read_interrupt(id, None) {
        error!("{}: poll re-arm failed: {}", id, err);
        s.channel(id).flags.remove(ChannelFlags::RX_POLL);
    }
}

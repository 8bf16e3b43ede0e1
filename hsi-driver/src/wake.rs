//! Local/peer wake negotiation
//!
//! Each channel's LOCAL_WAKE is a claim on keeping the link awake and holds
//! one clock reference. The port stays awake while any of its channels
//! claims it. When the last claim goes away the clock reference is either
//! returned on the spot or handed to the port's deferred task, which
//! returns it once the peer has dropped its wake line too.

use embassy_sync::blocking_mutex::raw::RawMutex;

use hsi_core::registers::sys;
use hsi_core::{ChannelFlags, ChannelId, HsiError, PortEvent};
use hsi_hal::{ClockDomain, DeferredWork, RegisterAccess};

use crate::controller::{ClockScope, Controller, Shared};
use crate::platform::Platform;

/// Outcome of the locked part of `wake_down`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Release {
    /// Channel held no claim
    Unclaimed,
    /// Other channels still claim the port
    Shared,
    /// Last claim gone, peer asleep: race the deferred task for the release
    TryCancel,
    /// Last claim gone, peer awake: the deferred task owns the release
    Deferred { stale: Option<ChannelId> },
}

impl<M: RawMutex, P: Platform> Controller<M, P> {
    pub(crate) fn wake_up(&self, id: ChannelId) -> Result<(), HsiError> {
        let clk = ClockScope::enter(self.clocks(), id, "wake_up");
        let (new_claim, owed) = self.with_open(id, |s| {
            let ch = s.channel(id);
            let new_claim = !ch.flags.contains(ChannelFlags::LOCAL_WAKE);
            ch.flags.insert(ChannelFlags::LOCAL_WAKE);
            s.claims.claim(id);

            let bit = sys::wake_bit(id.channel);
            if s.regs.read32(sys::wake(id.port)) & bit == 0 {
                s.regs.write32(sys::set_wake(id.port), bit);
            }

            // A new claim supersedes a reference still waiting on the peer
            let owed = if new_claim {
                s.port(id.port).release_owed.take()
            } else {
                None
            };
            Ok((new_claim, owed))
        })?;

        if new_claim {
            clk.keep();
            debug!("{}: wake claimed", id);
        }
        if let Some(prev) = owed {
            self.clocks().disable(prev, "wake_release");
        }
        Ok(())
    }

    pub(crate) fn wake_down(&self, id: ChannelId) -> Result<(), HsiError> {
        let _clk = ClockScope::enter(self.clocks(), id, "wake_down");

        let (release, fixup) = self.with_open(id, |s| {
            let peer_high = s.port(id.port).peer_is_high();
            s.peer_awake = peer_high;
            let fixup = reconcile_claims(s, id.port);

            let ch = s.channel(id);
            if !ch.flags.contains(ChannelFlags::LOCAL_WAKE) {
                clear_wake_bit(s, id);
                return Ok((Release::Unclaimed, fixup));
            }
            ch.flags.remove(ChannelFlags::LOCAL_WAKE);
            s.claims.release(id);

            let release = if !s.claims.port_idle(id.port) {
                Release::Shared
            } else if peer_high {
                let stale = s.port(id.port).release_owed.replace(id);
                Release::Deferred { stale }
            } else {
                Release::TryCancel
            };
            if release != Release::TryCancel {
                clear_wake_bit(s, id);
            }
            Ok((release, fixup))
        })?;

        self.settle_claim_refs(id.port, fixup);

        match release {
            Release::Unclaimed => {
                trace!("{}: wake down without claim", id);
            }
            Release::Shared => {
                debug!("{}: wake released, port still claimed", id);
                self.clocks().disable(id, "wake_down");
            }
            Release::Deferred { stale } => {
                debug!("{}: peer awake, release deferred", id);
                if let Some(prev) = stale {
                    self.clocks().disable(prev, "wake_release");
                }
            }
            Release::TryCancel => self.release_or_hand_over(id),
        }
        Ok(())
    }

    /// Move clock references to follow claims corrected by
    /// [`reconcile_claims`]
    fn settle_claim_refs(&self, port: u8, fixup: ClaimFixup) {
        for channel in bits_of(fixup.adopted) {
            self.clocks().enable(ChannelId::new(port, channel), "wake_adopt");
        }
        for channel in bits_of(fixup.dropped) {
            self.clocks().disable(ChannelId::new(port, channel), "wake_drop");
        }
    }

    /// Race the deferred task for the final clock release of `id`
    fn release_or_hand_over(&self, id: ChannelId) {
        let work = self.work(id.port);
        let cancelled = work.try_cancel();

        let stale = self.with_shared(|s| {
            let port = s.port(id.port);
            let stale = if cancelled {
                port.release_owed.take()
            } else {
                port.release_owed.replace(id)
            };
            if !s.claims.contains(id) {
                clear_wake_bit(s, id);
            }
            stale
        });

        if cancelled {
            debug!("{}: last wake claim gone, releasing", id);
            self.clocks().disable(id, "wake_down");
        } else {
            // The running task may already have looked for an owed reference
            debug!("{}: release task running, handing over", id);
            work.schedule();
        }
        if let Some(prev) = stale {
            self.clocks().disable(prev, "wake_release");
        }
    }

    /// Body of the port's deferred wake-release task
    ///
    /// Returns the clock reference owed to the task once the port has no
    /// wake claims and the peer line is low. Returns whether a reference
    /// was released.
    pub fn wake_release_work(&self, port: u8) -> bool {
        if port as usize >= self.port_count() {
            return false;
        }

        let owed = self.with_shared(|s| {
            let peer_high = s.port(port).peer_is_high();
            s.peer_awake = peer_high;
            if peer_high || !s.claims.port_idle(port) {
                return None;
            }
            s.port(port).release_owed.take()
        });

        match owed {
            Some(id) => {
                debug!("port {}: deferred wake release for {}", port, id);
                self.clocks().disable(id, "wake_release");
                true
            }
            None => false,
        }
    }

    /// Peer wake-line edge on `port`
    ///
    /// Called from the wake-line interrupt. Notifies every open channel of
    /// the port and, on a falling edge, queues the deferred release.
    pub fn peer_wake_edge(&self, port: u8, high: bool) {
        if port as usize >= self.port_count() {
            return;
        }

        self.with_shared(|s| s.peer_awake = high);
        let event = if high {
            PortEvent::PeerWakeUp
        } else {
            PortEvent::PeerWakeDown
        };
        self.port_event(port, event);

        if !high {
            self.work(port).schedule();
        }
    }

    /// Peer wake level last observed by the driver
    pub fn peer_awake(&self) -> bool {
        self.with_shared(|s| s.peer_awake)
    }
}

/// Claims changed by [`reconcile_claims`], as per-port channel bitmaps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ClaimFixup {
    /// Claims the register no longer shows; each still holds a reference
    dropped: u32,
    /// Claims the register shows that hold no reference yet
    adopted: u32,
}

/// Bring the shadow claims of `port` in line with the wake register
///
/// The register is authoritative. A mismatch means something else wrote
/// the register behind the driver's back; it is logged and corrected, and
/// the per-channel LOCAL_WAKE flags follow. Clock references are settled by
/// the caller outside the lock.
fn reconcile_claims<P: Platform>(s: &mut Shared<P>, port: u8) -> ClaimFixup {
    let limit = (1u32 << s.port(port).max_channels) - 1;
    let hw = s.regs.read32(sys::wake(port)) & sys::WAKE_MASK & limit;
    let shadow = s.claims.port_bits(port);
    if hw == shadow {
        return ClaimFixup::default();
    }

    warn!("port {}: wake shadow {:#x} != register {:#x}", port, shadow, hw);
    s.claims.set_port_bits(port, hw);
    for (n, ch) in s.port(port).channels.iter_mut().enumerate() {
        ch.flags.set(ChannelFlags::LOCAL_WAKE, hw & sys::wake_bit(n as u8) != 0);
    }
    ClaimFixup {
        dropped: shadow & !hw,
        adopted: hw & !shadow,
    }
}

/// Channel numbers of the set bits in `bits`
fn bits_of(bits: u32) -> impl Iterator<Item = u8> {
    (0..u32::BITS as u8).filter(move |&n| bits & sys::wake_bit(n) != 0)
}

fn clear_wake_bit<P: Platform>(s: &mut Shared<P>, id: ChannelId) {
    let bit = sys::wake_bit(id.channel);
    if s.regs.read32(sys::wake(id.port)) & bit != 0 {
        s.regs.write32(sys::clear_wake(id.port), bit);
    }
}

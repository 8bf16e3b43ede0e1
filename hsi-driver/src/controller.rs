//! Controller state and shared infrastructure
//!
//! All mutable link state lives in [`Shared`] behind a single blocking
//! mutex. Critical sections only flip flags, move descriptors and touch
//! registers; they never block, never call clocks and never run client
//! callbacks. Clocks are taken outside the lock through [`ClockScope`].
//!
//! Callbacks sit behind a separate per-channel mutex so they can be fetched
//! from completion context without holding the controller lock.

use core::cell::{Cell, RefCell};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embedded_hal::digital::InputPin;
use heapless::Vec;

use hsi_core::registers::defaults;
use hsi_core::{ChannelFlags, ChannelId, HsiError, HwVariant, PortEvent, WakeClaims};
use hsi_core::{MAX_CHANNELS, MAX_PORTS};
use hsi_hal::{ClockDomain, DmaChannel};

use crate::device::Device;
use crate::platform::{Callbacks, Platform, PortConfig};

/// Data path a pending request was dispatched on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferPath {
    /// Single-word interrupt path
    Interrupt,
    /// Block transfer on the given DMA channel
    Dma(DmaChannel),
}

/// Pending request of one direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Descriptor {
    /// Bus address of the word buffer
    pub buf: usize,
    /// Requested size in 32-bit words
    pub words: usize,
    /// Backend path carrying the request
    pub path: TransferPath,
}

/// Locked state of one channel
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ChannelState {
    pub flags: ChannelFlags,
    pub read: Option<Descriptor>,
    pub write: Option<Descriptor>,
}

/// Locked state of one port
pub(crate) struct PortState<P: Platform> {
    pub index: u8,
    pub max_channels: u8,
    pub irq: u8,
    pub wake_line: Option<P::WakeLine>,
    /// HSR counters are live (not in AUTO divisor mode)
    pub counters_on: bool,
    /// Counters saved when entering AUTO
    pub counters_shadow: u32,
    /// Clock reference handed to the deferred wake-release task
    pub release_owed: Option<ChannelId>,
    pub channels: Vec<ChannelState, MAX_CHANNELS>,
}

impl<P: Platform> PortState<P> {
    /// Peer wake-evidence level
    ///
    /// A port without a wake line reports low. A line that cannot be read
    /// reports high, which keeps the link up rather than cutting clocks
    /// under an awake peer.
    pub fn peer_is_high(&mut self) -> bool {
        match self.wake_line.as_mut() {
            None => false,
            Some(line) => match line.is_high() {
                Ok(high) => high,
                Err(_) => {
                    warn!("port {}: peer wake line unreadable", self.index);
                    true
                }
            },
        }
    }
}

/// Everything guarded by the controller lock
pub(crate) struct Shared<P: Platform> {
    pub regs: P::Regs,
    pub backend: P::Backend,
    /// Union of every channel's LOCAL_WAKE
    pub claims: WakeClaims,
    /// Peer wake level last observed by the driver
    pub peer_awake: bool,
    pub ports: Vec<PortState<P>, MAX_PORTS>,
}

impl<P: Platform> Shared<P> {
    pub fn port(&mut self, port: u8) -> &mut PortState<P> {
        &mut self.ports[port as usize]
    }

    pub fn channel(&mut self, id: ChannelId) -> &mut ChannelState {
        &mut self.ports[id.port as usize].channels[id.channel as usize]
    }
}

/// Unlocked per-port resources
struct PortLocal<M: RawMutex, P: Platform> {
    work: P::Work,
    callbacks: Vec<Mutex<M, Cell<Callbacks>>, MAX_CHANNELS>,
}

/// One HSI/SSI controller instance
///
/// `M` selects the lock flavour (`CriticalSectionRawMutex` on target, so the
/// lock is usable from interrupt context).
pub struct Controller<M: RawMutex, P: Platform> {
    variant: HwVariant,
    clocks: P::Clocks,
    shared: Mutex<M, RefCell<Shared<P>>>,
    ports: Vec<PortLocal<M, P>, MAX_PORTS>,
}

impl<M: RawMutex, P: Platform> Controller<M, P> {
    /// Create a controller with no ports
    pub fn new(variant: HwVariant, regs: P::Regs, backend: P::Backend, clocks: P::Clocks) -> Self {
        Self {
            variant,
            clocks,
            shared: Mutex::new(RefCell::new(Shared {
                regs,
                backend,
                claims: WakeClaims::new(),
                peer_awake: false,
                ports: Vec::new(),
            })),
            ports: Vec::new(),
        }
    }

    /// Attach a port, returning its index
    ///
    /// Fails with `InvalidArgument` when every port slot is taken or the
    /// channel limit is not a power of two within `1..=MAX_CHANNELS`.
    pub fn add_port(&mut self, config: PortConfig<P>) -> Result<u8, HsiError> {
        let max = config.max_channels as usize;
        if max == 0 || max > MAX_CHANNELS || !max.is_power_of_two() {
            return Err(HsiError::InvalidArgument);
        }

        let shared = self.shared.get_mut().get_mut();
        let index = shared.ports.len() as u8;

        let mut channels = Vec::new();
        let mut callbacks = Vec::new();
        for _ in 0..max {
            // Capacity is MAX_CHANNELS and max <= MAX_CHANNELS
            let _ = channels.push(ChannelState::default());
            let _ = callbacks.push(Mutex::new(Cell::new(Callbacks::default())));
        }

        let port = PortState {
            index,
            max_channels: config.max_channels,
            irq: config.irq,
            wake_line: config.wake_line,
            counters_on: true,
            counters_shadow: defaults::COUNTERS,
            release_owed: None,
            channels,
        };
        shared
            .ports
            .push(port)
            .map_err(|_| HsiError::InvalidArgument)?;

        let local = PortLocal {
            work: config.work,
            callbacks,
        };
        if self.ports.push(local).is_err() {
            shared.ports.pop();
            return Err(HsiError::InvalidArgument);
        }

        debug!("port {} attached with {} channels", index, config.max_channels);
        Ok(index)
    }

    /// Client handle for `channel` of `port`
    pub fn device(&self, port: u8, channel: u8) -> Result<Device<'_, M, P>, HsiError> {
        let valid = self
            .ports
            .get(port as usize)
            .is_some_and(|p| (channel as usize) < p.callbacks.len());
        if !valid {
            return Err(HsiError::InvalidArgument);
        }
        Ok(Device::new(self, ChannelId::new(port, channel)))
    }

    /// Hardware variant chosen at construction
    pub fn variant(&self) -> HwVariant {
        self.variant
    }

    /// Number of attached ports
    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    /// Run `f` inside the controller critical section
    pub(crate) fn with_shared<R>(&self, f: impl FnOnce(&mut Shared<P>) -> R) -> R {
        self.shared.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// Like [`Controller::with_shared`], but only if `id` is open
    ///
    /// The open check and `f` share one critical section, so a concurrent
    /// close cannot slip in between.
    pub(crate) fn with_open<R>(
        &self,
        id: ChannelId,
        f: impl FnOnce(&mut Shared<P>) -> Result<R, HsiError>,
    ) -> Result<R, HsiError> {
        self.with_shared(|s| {
            if !s.channel(id).flags.contains(ChannelFlags::OPEN) {
                warn!("{}: channel not open", id);
                return Err(HsiError::InvalidArgument);
            }
            f(s)
        })
    }

    pub(crate) fn clocks(&self) -> &P::Clocks {
        &self.clocks
    }

    pub(crate) fn work(&self, port: u8) -> &P::Work {
        &self.ports[port as usize].work
    }

    pub(crate) fn callbacks(&self, id: ChannelId) -> Callbacks {
        self.ports[id.port as usize].callbacks[id.channel as usize].lock(|cb| cb.get())
    }

    pub(crate) fn update_callbacks(&self, id: ChannelId, f: impl FnOnce(&mut Callbacks)) {
        self.ports[id.port as usize].callbacks[id.channel as usize].lock(|cb| {
            let mut value = cb.get();
            f(&mut value);
            cb.set(value);
        });
    }

    /// Broadcast `event` to every open channel of `port`
    ///
    /// Called by the port interrupt handler for error and break conditions.
    pub fn port_event(&self, port: u8, event: PortEvent) {
        if port as usize >= self.ports.len() {
            return;
        }

        let open: Vec<ChannelId, MAX_CHANNELS> = self.with_shared(|s| {
            let state = s.port(port);
            state
                .channels
                .iter()
                .enumerate()
                .filter(|(_, ch)| ch.flags.contains(ChannelFlags::OPEN))
                .map(|(n, _)| ChannelId::new(port, n as u8))
                .collect()
        });

        for id in open {
            if let Some(cb) = self.callbacks(id).port_event {
                cb(id, event);
            }
        }
    }

    /// Snapshot of the locked state of a channel
    #[cfg(test)]
    pub(crate) fn channel_state(&self, id: ChannelId) -> ChannelState {
        self.with_shared(|s| *s.channel(id))
    }

    /// Controller wake claims
    #[cfg(test)]
    pub(crate) fn claims(&self) -> WakeClaims {
        self.with_shared(|s| s.claims)
    }
}

/// Clock reference held for the duration of an operation
///
/// Enabled on creation, disabled on drop. [`ClockScope::keep`] hands the
/// reference over to longer-lived state (a wake claim) instead.
pub(crate) struct ClockScope<'a, C: ClockDomain> {
    clocks: &'a C,
    id: ChannelId,
    tag: &'static str,
}

impl<'a, C: ClockDomain> ClockScope<'a, C> {
    pub fn enter(clocks: &'a C, id: ChannelId, tag: &'static str) -> Self {
        clocks.enable(id, tag);
        Self { clocks, id, tag }
    }

    /// Keep the clock reference past the end of the scope
    pub fn keep(self) {
        core::mem::forget(self);
    }
}

impl<C: ClockDomain> Drop for ClockScope<'_, C> {
    fn drop(&mut self) {
        self.clocks.disable(self.id, self.tag);
    }
}

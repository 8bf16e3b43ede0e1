//! Platform binding
//!
//! Bundles the collaborator types a controller is built from, so the
//! controller carries one type parameter instead of five.

use embedded_hal::digital::InputPin;
use hsi_core::{ChannelId, PortEvent};
use hsi_hal::{ClockDomain, DeferredWork, RegisterAccess, TransferBackend};

/// Collaborators of one controller instance
pub trait Platform {
    /// Register window
    type Regs: RegisterAccess;
    /// Interrupt and block-transfer data paths
    type Backend: TransferBackend;
    /// Functional clock
    type Clocks: ClockDomain;
    /// Per-port deferred wake-release task
    type Work: DeferredWork;
    /// Peer wake-evidence line (CAWAKE)
    type WakeLine: InputPin;
}

/// Attach-time description of one port
pub struct PortConfig<P: Platform> {
    /// Channel count limit (1..=MAX_CHANNELS, a power of two)
    pub max_channels: u8,
    /// Interrupt line used for this port's events
    pub irq: u8,
    /// Peer wake-evidence line, if wired
    pub wake_line: Option<P::WakeLine>,
    /// Deferred wake-release task
    pub work: P::Work,
}

/// Read or write completion: channel and number of words transferred
pub type TransferDoneFn = &'static (dyn Fn(ChannelId, usize) + Send + Sync);

/// Port event notification
pub type PortEventFn = &'static (dyn Fn(ChannelId, PortEvent) + Send + Sync);

/// Registered callbacks of one channel
#[derive(Clone, Copy, Default)]
pub(crate) struct Callbacks {
    pub read_done: Option<TransferDoneFn>,
    pub write_done: Option<TransferDoneFn>,
    pub port_event: Option<PortEventFn>,
}

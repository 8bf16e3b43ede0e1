//! HSI Hardware Abstraction Layer
//!
//! This crate defines the collaborator traits the link driver consumes.
//! Platform code (register mapping, clock framework, DMA engine, work queue)
//! implements them; the driver never touches hardware any other way.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Client protocol (modem IPC, etc.)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  hsi-driver (controller state machine)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  hsi-hal (this crate - traits)          │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┼───────────┐
//!         ▼           ▼           ▼
//!     registers    clocks     DMA / IRQ
//! ```
//!
//! # Traits
//!
//! - [`regs::RegisterAccess`] - 32-bit register window
//! - [`clock::ClockDomain`] - reference-counted clock enable
//! - [`work::DeferredWork`] - cancellable per-port deferred task
//! - [`transfer::TransferBackend`] - interrupt and block-transfer paths
//!
//! The peer wake-evidence line is an `embedded_hal::digital::InputPin` and
//! is not redefined here.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod clock;
pub mod regs;
pub mod transfer;
pub mod work;

// Re-export key traits at crate root for convenience
pub use clock::ClockDomain;
pub use regs::RegisterAccess;
pub use transfer::{DmaChannel, TransferBackend, TransferError};
pub use work::DeferredWork;

/// Identifies one logical channel of one port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelId {
    /// Port index (0-based)
    pub port: u8,
    /// Channel index within the port
    pub channel: u8,
}

impl ChannelId {
    /// Create a channel identifier
    pub const fn new(port: u8, channel: u8) -> Self {
        Self { port, channel }
    }
}

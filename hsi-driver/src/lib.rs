//! HSI/SSI link driver
//!
//! Host-side driver for a synchronous multi-channel serial link between the
//! application processor and a peer such as a modem:
//!
//! - Channel lifecycle (open/close/poll) gating every other operation
//! - Read/write request tracking with one outstanding request per direction,
//!   dispatched to a single-word interrupt path or a block-transfer path
//! - RX/TX register programming with all-or-nothing validation
//! - Local/peer wake-line negotiation with deferred release
//! - A multiplexed control entry point
//!
//! # Usage
//!
//! ```ignore
//! let mut ctrl: Controller<CriticalSectionRawMutex, Board> =
//!     Controller::new(HwVariant::Extended, regs, dma, clocks);
//! let port = ctrl.add_port(PortConfig { max_channels: 8, irq: 0, wake_line: Some(cawake), work })?;
//!
//! let dev = ctrl.device(port, 1)?;
//! dev.set_read_callback(&on_read);
//! dev.set_write_callback(&on_write);
//! dev.open()?;
//! dev.wake_up()?;
//! dev.write(tx_buf_addr, 8)?; // completion arrives via on_write
//! ```
//!
//! Completions and port events are fed back in from interrupt context
//! through [`Controller::complete_read`], [`Controller::complete_write`],
//! [`Controller::data_available`], [`Controller::port_event`] and
//! [`Controller::peer_wake_edge`].

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod channel;
pub mod config;
pub mod controller;
pub mod device;
pub mod ioctl;
pub mod platform;
pub mod transfer;
pub mod wake;

#[cfg(test)]
mod testing;

pub use controller::{Controller, Descriptor, TransferPath};
pub use device::Device;
pub use ioctl::IoctlArg;
pub use platform::{Platform, PortConfig, PortEventFn, TransferDoneFn};

pub use hsi_core::{
    Arbitration, ChannelId, Command, Flow, HsiError, HwVariant, Mode, PortEvent, RxConfig,
    RxDivisor, TxConfig,
};

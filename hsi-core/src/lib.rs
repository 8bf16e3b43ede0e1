//! Board-agnostic core of the HSI/SSI link driver
//!
//! This crate holds everything that can be reasoned about without a lock or
//! a register window:
//!
//! - RX/TX configuration snapshots with per-field "leave unchanged"
//! - Hardware variant rules (validation and AUTO divisor transitions)
//! - Register layout of the controller
//! - Channel flags and the wake-claim bitset
//! - Control command codes and port events
//! - The error taxonomy shared by every driver operation

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod claims;
pub mod config;
pub mod error;
pub mod event;
pub mod ioctl;
pub mod registers;
pub mod variant;

pub use claims::{ChannelFlags, WakeClaims};
pub use config::{Arbitration, Flow, Mode, RxConfig, RxDivisor, TxConfig};
pub use error::HsiError;
pub use event::PortEvent;
pub use ioctl::Command;
pub use variant::{DivisorAction, HwVariant};

pub use hsi_hal::ChannelId;

/// Maximum number of ports on one controller
pub const MAX_PORTS: usize = 2;

/// Maximum number of channels on one port
pub const MAX_CHANNELS: usize = 16;

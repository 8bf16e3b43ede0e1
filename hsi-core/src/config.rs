//! RX/TX configuration snapshots
//!
//! Every field is optional. `None` means "leave the hardware as it is" and
//! is never written.

use crate::registers::mode::{FLOW_MASK, FLOW_OFFSET, MODE_MASK};

/// Link operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Receiver asleep (RX only)
    Sleep,
    /// Continuous stream
    Stream,
    /// Framed transfers
    Frame,
}

impl Mode {
    /// Register encoding
    pub const fn bits(self) -> u32 {
        match self {
            Mode::Sleep => 0,
            Mode::Stream => 1,
            Mode::Frame => 2,
        }
    }

    /// Decode the mode field of a mode register value
    pub fn from_register(value: u32) -> Option<Self> {
        match value & MODE_MASK {
            0 => Some(Mode::Sleep),
            1 => Some(Mode::Stream),
            2 => Some(Mode::Frame),
            _ => None,
        }
    }
}

/// Data flow (handshake) type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Flow {
    /// Synchronized data flow
    Synchronized,
    /// Pipelined data flow (HSI only)
    Pipelined,
}

impl Flow {
    /// Register encoding (unshifted)
    pub const fn bits(self) -> u32 {
        match self {
            Flow::Synchronized => 0,
            Flow::Pipelined => 1,
        }
    }

    /// Decode the flow field of a mode register value
    pub fn from_register(value: u32) -> Option<Self> {
        match (value >> FLOW_OFFSET) & FLOW_MASK {
            0 => Some(Flow::Synchronized),
            1 => Some(Flow::Pipelined),
            _ => None,
        }
    }
}

/// TX arbitration between contending channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Arbitration {
    /// Round-robin
    RoundRobin,
    /// Lowest channel index wins
    Priority,
}

impl Arbitration {
    /// Register encoding
    pub const fn bits(self) -> u32 {
        match self {
            Arbitration::RoundRobin => 0,
            Arbitration::Priority => 1,
        }
    }

    /// Decode an arbitration register value
    pub fn from_register(value: u32) -> Option<Self> {
        match value {
            0 => Some(Arbitration::RoundRobin),
            1 => Some(Arbitration::Priority),
            _ => None,
        }
    }
}

/// Receive divisor setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxDivisor {
    /// Fixed divisor value
    Value(u32),
    /// Sense the rate automatically (counters / timeout disabled)
    Auto,
    /// Leave AUTO and re-enable the frame timeout (SSI only)
    UseTimeout,
}

/// Receive configuration snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxConfig {
    pub mode: Option<Mode>,
    pub flow: Option<Flow>,
    /// Frame size in bits minus one
    pub frame_size: Option<u32>,
    /// Channel count; must be a single power of two
    pub channel_mask: Option<u32>,
    pub divisor: Option<RxDivisor>,
}

/// Transmit configuration snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TxConfig {
    pub mode: Option<Mode>,
    pub flow: Option<Flow>,
    /// Frame size in bits minus one
    pub frame_size: Option<u32>,
    /// Channel count; must be a single power of two
    pub channel_mask: Option<u32>,
    pub divisor: Option<u32>,
    pub arb_mode: Option<Arbitration>,
}

/// Compose a mode register value, keeping unspecified fields from `current`
pub fn merge_mode(current: u32, mode: Option<Mode>, flow: Option<Flow>) -> u32 {
    let mut value = current;
    if let Some(mode) = mode {
        value = (value & !MODE_MASK) | mode.bits();
    }
    if let Some(flow) = flow {
        value = (value & !(FLOW_MASK << FLOW_OFFSET)) | (flow.bits() << FLOW_OFFSET);
    }
    value
}

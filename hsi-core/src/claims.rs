//! Channel flags and the controller wake-claim bitset

use bitflags::bitflags;

use crate::{ChannelId, MAX_CHANNELS, MAX_PORTS};

bitflags! {
    /// Runtime state of one channel
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ChannelFlags: u8 {
        /// Channel is open
        const OPEN       = 1 << 0;
        /// Receive interrupt armed without a buffer
        const RX_POLL    = 1 << 1;
        /// Channel holds a local wake claim
        const LOCAL_WAKE = 1 << 2;
    }
}

const _: () = assert!(MAX_PORTS * MAX_CHANNELS <= 32);

const PORT_MASK: u32 = (1 << MAX_CHANNELS) - 1;

/// Local wake claims of every channel of a controller
///
/// One bit per channel slot, slot = `port * MAX_CHANNELS + channel`. A port
/// keeps the link awake while any of its bits is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WakeClaims(u32);

impl WakeClaims {
    /// No claims
    pub const fn new() -> Self {
        Self(0)
    }

    fn bit(id: ChannelId) -> u32 {
        1 << (id.port as usize * MAX_CHANNELS + id.channel as usize)
    }

    const fn shift(port: u8) -> usize {
        port as usize * MAX_CHANNELS
    }

    /// Record a claim for `id`
    pub fn claim(&mut self, id: ChannelId) {
        self.0 |= Self::bit(id);
    }

    /// Drop the claim of `id`
    pub fn release(&mut self, id: ChannelId) {
        self.0 &= !Self::bit(id);
    }

    /// Whether `id` holds a claim
    pub fn contains(&self, id: ChannelId) -> bool {
        self.0 & Self::bit(id) != 0
    }

    /// Claims of `port`, one bit per channel (same layout as the wake register)
    pub fn port_bits(&self, port: u8) -> u32 {
        (self.0 >> Self::shift(port)) & PORT_MASK
    }

    /// Overwrite the claims of `port`
    pub fn set_port_bits(&mut self, port: u8, bits: u32) {
        let shift = Self::shift(port);
        self.0 = (self.0 & !(PORT_MASK << shift)) | ((bits & PORT_MASK) << shift);
    }

    /// Whether no channel of `port` holds a claim
    pub fn port_idle(&self, port: u8) -> bool {
        self.port_bits(port) == 0
    }

    /// Raw bitset
    pub fn bits(&self) -> u32 {
        self.0
    }
}

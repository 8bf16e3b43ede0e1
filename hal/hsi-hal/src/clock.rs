//! Clock domain abstraction

use crate::ChannelId;

/// Reference-counted functional clock of the link controller
///
/// Enables nest: the clock is physically cut only when every `enable` has
/// been matched by a `disable`. `enable` may wait briefly for the hardware
/// to acknowledge, so the driver never calls either method with its lock
/// held.
///
/// `tag` names the calling operation and is only meant for diagnostics.
pub trait ClockDomain {
    /// Take one clock reference on behalf of `channel`
    fn enable(&self, channel: ChannelId, tag: &'static str);

    /// Drop one clock reference previously taken on behalf of `channel`
    fn disable(&self, channel: ChannelId, tag: &'static str);
}

//! Transfer backend abstraction
//!
//! Two data paths exist per direction: a single-word interrupt-driven path
//! and a block-transfer (DMA) path. The driver decides which one to use and
//! tracks the request; the backend only moves words and later reports
//! completion through the driver's completion entry points.
//!
//! Buffers are passed as bus addresses of 32-bit word arrays. The driver
//! never dereferences them.

use crate::ChannelId;

/// Opaque error reported by a transfer backend
///
/// The driver passes it through to the caller unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferError(pub i32);

/// Logical DMA channel allocated for a block transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DmaChannel(pub u8);

/// Data-path backend for the link controller
///
/// Every method is called with the controller lock held and must not block.
pub trait TransferBackend {
    /// Arm the single-word transmit interrupt for `channel`
    fn enable_write_interrupt(&mut self, channel: ChannelId, buf: usize)
        -> Result<(), TransferError>;

    /// Arm the single-word receive interrupt for `channel`
    ///
    /// `buf` is `None` when polling for data arrival without a destination.
    fn enable_read_interrupt(
        &mut self,
        channel: ChannelId,
        buf: Option<usize>,
    ) -> Result<(), TransferError>;

    /// Disarm the transmit interrupt
    fn cancel_write_interrupt(&mut self, channel: ChannelId);

    /// Disarm the receive interrupt
    fn cancel_read_interrupt(&mut self, channel: ChannelId);

    /// Submit a block transfer from `buf` (`words` 32-bit words)
    fn write_dma(
        &mut self,
        channel: ChannelId,
        buf: usize,
        words: usize,
    ) -> Result<DmaChannel, TransferError>;

    /// Submit a block transfer into `buf` (`words` 32-bit words)
    fn read_dma(
        &mut self,
        channel: ChannelId,
        buf: usize,
        words: usize,
    ) -> Result<DmaChannel, TransferError>;

    /// Abort the transmit block transfer running on `dma`
    fn cancel_write_dma(&mut self, channel: ChannelId, dma: DmaChannel);

    /// Abort the receive block transfer running on `dma`
    fn cancel_read_dma(&mut self, channel: ChannelId, dma: DmaChannel);
}

//! Client-facing channel handle

use embassy_sync::blocking_mutex::raw::RawMutex;

use hsi_core::{ChannelId, Command, HsiError, RxConfig, TxConfig};

use crate::controller::Controller;
use crate::ioctl::IoctlArg;
use crate::platform::{Platform, PortEventFn, TransferDoneFn};

/// Handle on one channel of a controller
///
/// Carries no state of its own; every call goes to the controller.
pub struct Device<'a, M: RawMutex, P: Platform> {
    ctrl: &'a Controller<M, P>,
    id: ChannelId,
}

impl<M: RawMutex, P: Platform> Clone for Device<'_, M, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: RawMutex, P: Platform> Copy for Device<'_, M, P> {}

impl<'a, M: RawMutex, P: Platform> Device<'a, M, P> {
    pub(crate) fn new(ctrl: &'a Controller<M, P>, id: ChannelId) -> Self {
        Self { ctrl, id }
    }

    /// Channel this handle refers to
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Open the channel
    ///
    /// Both completion callbacks must be registered first.
    pub fn open(&self) -> Result<(), HsiError> {
        self.ctrl.open(self.id)
    }

    /// Close the channel, cancelling pending requests
    pub fn close(&self) {
        self.ctrl.close(self.id)
    }

    /// Queue a write of `words` 32-bit words from bus address `buf`
    ///
    /// `Ok` means accepted; completion is reported to the write callback.
    pub fn write(&self, buf: usize, words: usize) -> Result<(), HsiError> {
        self.ctrl.write(self.id, buf, words)
    }

    /// Queue a read of `words` 32-bit words into bus address `buf`
    ///
    /// `Ok` means accepted; completion is reported to the read callback.
    pub fn read(&self, buf: usize, words: usize) -> Result<(), HsiError> {
        self.ctrl.read(self.id, buf, words)
    }

    /// Cancel the pending write, if any
    pub fn write_cancel(&self) -> Result<(), HsiError> {
        self.ctrl.write_cancel(self.id)
    }

    /// Cancel the pending read, if any
    pub fn read_cancel(&self) -> Result<(), HsiError> {
        self.ctrl.read_cancel(self.id)
    }

    /// Arm data-arrival notification without a read buffer
    pub fn poll(&self) -> Result<(), HsiError> {
        self.ctrl.poll(self.id)
    }

    /// Multiplexed control entry point
    pub fn ioctl(&self, command: u32, arg: IoctlArg<'_>) -> Result<(), HsiError> {
        self.ctrl.ioctl(self.id, command, arg)
    }

    /// Register the read completion callback
    pub fn set_read_callback(&self, cb: TransferDoneFn) {
        self.ctrl.update_callbacks(self.id, |c| c.read_done = Some(cb));
    }

    /// Register the write completion callback
    pub fn set_write_callback(&self, cb: TransferDoneFn) {
        self.ctrl.update_callbacks(self.id, |c| c.write_done = Some(cb));
    }

    /// Register the port event callback
    pub fn set_event_callback(&self, cb: PortEventFn) {
        self.ctrl.update_callbacks(self.id, |c| c.port_event = Some(cb));
    }

    /// Claim the wake line
    pub fn wake_up(&self) -> Result<(), HsiError> {
        self.ctrl.control(self.id, Command::WakeUp, IoctlArg::None)
    }

    /// Release the wake claim
    pub fn wake_down(&self) -> Result<(), HsiError> {
        self.ctrl.control(self.id, Command::WakeDown, IoctlArg::None)
    }

    /// Program the receiver of this channel's port
    pub fn set_rx(&self, cfg: &RxConfig) -> Result<(), HsiError> {
        let mut cfg = *cfg;
        self.ctrl.control(self.id, Command::SetRx, IoctlArg::Rx(&mut cfg))
    }

    /// Read back the receiver configuration
    pub fn get_rx(&self) -> Result<RxConfig, HsiError> {
        let mut cfg = RxConfig::default();
        self.ctrl.control(self.id, Command::GetRx, IoctlArg::Rx(&mut cfg))?;
        Ok(cfg)
    }

    /// Program the transmitter of this channel's port
    pub fn set_tx(&self, cfg: &TxConfig) -> Result<(), HsiError> {
        let mut cfg = *cfg;
        self.ctrl.control(self.id, Command::SetTx, IoctlArg::Tx(&mut cfg))
    }

    /// Read back the transmitter configuration
    pub fn get_tx(&self) -> Result<TxConfig, HsiError> {
        let mut cfg = TxConfig::default();
        self.ctrl.control(self.id, Command::GetTx, IoctlArg::Tx(&mut cfg))?;
        Ok(cfg)
    }
}

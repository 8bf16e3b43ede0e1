//! Multiplexed control entry point

use embassy_sync::blocking_mutex::raw::RawMutex;

use hsi_core::registers::{hsr, hst, sys};
use hsi_core::{ChannelId, Command, HsiError, RxConfig, TxConfig};
use hsi_hal::RegisterAccess;

use crate::channel::is_open;
use crate::controller::{ClockScope, Controller};
use crate::platform::Platform;

/// Argument of a control command
///
/// Each command expects exactly one shape; see [`Command`].
pub enum IoctlArg<'a> {
    /// No argument
    None,
    /// Out word (wake register, peer evidence)
    Word(&'a mut u32),
    /// In/out receiver configuration
    Rx(&'a mut RxConfig),
    /// In/out transmitter configuration
    Tx(&'a mut TxConfig),
}

impl<M: RawMutex, P: Platform> Controller<M, P> {
    /// Decode `command` and run it
    ///
    /// The open check comes first, so a closed channel reports
    /// `InvalidArgument` even for unknown codes.
    pub(crate) fn ioctl(
        &self,
        id: ChannelId,
        command: u32,
        arg: IoctlArg<'_>,
    ) -> Result<(), HsiError> {
        self.ensure_open(id)?;
        let command = Command::try_from(command).inspect_err(|_| {
            warn!("{}: unknown control command {}", id, command);
        })?;
        self.dispatch(id, command, arg)
    }

    pub(crate) fn control(
        &self,
        id: ChannelId,
        command: Command,
        arg: IoctlArg<'_>,
    ) -> Result<(), HsiError> {
        self.ensure_open(id)?;
        self.dispatch(id, command, arg)
    }

    fn ensure_open(&self, id: ChannelId) -> Result<(), HsiError> {
        if self.with_shared(|s| is_open(s, id)) {
            Ok(())
        } else {
            warn!("{}: control on closed channel", id);
            Err(HsiError::InvalidArgument)
        }
    }

    fn dispatch(&self, id: ChannelId, command: Command, arg: IoctlArg<'_>) -> Result<(), HsiError> {
        let port = id.port;
        trace!("{}: control {}", id, command.code());

        match (command, arg) {
            (Command::WakeDown, IoctlArg::None) => self.wake_down(id),
            (Command::WakeUp, IoctlArg::None) => self.wake_up(id),
            (Command::SendBreak, IoctlArg::None) => {
                self.write_reg(id, "send_break", hst::brk(port), 1)
            }
            (Command::GetWakeReg, IoctlArg::Word(out)) => {
                let _clk = ClockScope::enter(self.clocks(), id, "get_wake_reg");
                *out = self.with_open(id, |s| Ok(s.regs.read32(sys::wake(port))))?;
                Ok(())
            }
            (Command::FlushRx, IoctlArg::None) => {
                self.write_reg(id, "flush_rx", hsr::rx_state(port), 0)
            }
            (Command::FlushTx, IoctlArg::None) => {
                self.write_reg(id, "flush_tx", hst::tx_state(port), 0)
            }
            (Command::GetPeerEvidence, IoctlArg::Word(out)) => {
                let _clk = ClockScope::enter(self.clocks(), id, "get_peer_evidence");
                let level = self.with_open(id, |s| {
                    let state = s.port(port);
                    if state.wake_line.is_none() {
                        return Ok(None);
                    }
                    Ok(Some(state.peer_is_high()))
                })?;
                match level {
                    Some(high) => {
                        *out = high as u32;
                        Ok(())
                    }
                    None => Err(HsiError::NoDevice),
                }
            }
            (Command::SetRx, IoctlArg::Rx(cfg)) => self.set_rx(id, cfg),
            (Command::GetRx, IoctlArg::Rx(cfg)) => {
                *cfg = self.get_rx(id)?;
                Ok(())
            }
            (Command::SetTx, IoctlArg::Tx(cfg)) => self.set_tx(id, cfg),
            (Command::GetTx, IoctlArg::Tx(cfg)) => {
                *cfg = self.get_tx(id)?;
                Ok(())
            }
            (Command::SwReset, IoctlArg::None) => self.sw_reset(id),
            (command, _) => {
                warn!("{}: bad argument for control {}", id, command.code());
                Err(HsiError::InvalidArgument)
            }
        }
    }

    fn write_reg(
        &self,
        id: ChannelId,
        tag: &'static str,
        offset: u32,
        value: u32,
    ) -> Result<(), HsiError> {
        let _clk = ClockScope::enter(self.clocks(), id, tag);
        self.with_open(id, |s| {
            s.regs.write32(offset, value);
            Ok(())
        })
    }
}

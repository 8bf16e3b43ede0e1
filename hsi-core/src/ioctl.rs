//! Control command codes

use crate::error::HsiError;

/// Multiplexed control command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Release the local wake claim
    WakeDown,
    /// Assert the local wake claim
    WakeUp,
    /// Emit a break frame
    SendBreak,
    /// Read the local wake register (out u32)
    GetWakeReg,
    /// Reset the receiver state machine
    FlushRx,
    /// Reset the transmitter state machine
    FlushTx,
    /// Read the peer wake line level (out u32)
    GetPeerEvidence,
    /// Program the receiver (in RX config)
    SetRx,
    /// Read back the receiver (out RX config)
    GetRx,
    /// Program the transmitter (in TX config)
    SetTx,
    /// Read back the transmitter (out TX config)
    GetTx,
    /// Soft reset the controller and reload defaults
    SwReset,
}

impl Command {
    /// Wire code of the command
    pub const fn code(self) -> u32 {
        match self {
            Command::WakeDown => 0,
            Command::WakeUp => 1,
            Command::SendBreak => 2,
            Command::GetWakeReg => 3,
            Command::FlushRx => 4,
            Command::FlushTx => 5,
            Command::GetPeerEvidence => 6,
            Command::SetRx => 7,
            Command::GetRx => 8,
            Command::SetTx => 9,
            Command::GetTx => 10,
            Command::SwReset => 11,
        }
    }
}

impl TryFrom<u32> for Command {
    type Error = HsiError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => Command::WakeDown,
            1 => Command::WakeUp,
            2 => Command::SendBreak,
            3 => Command::GetWakeReg,
            4 => Command::FlushRx,
            5 => Command::FlushTx,
            6 => Command::GetPeerEvidence,
            7 => Command::SetRx,
            8 => Command::GetRx,
            9 => Command::SetTx,
            10 => Command::GetTx,
            11 => Command::SwReset,
            _ => return Err(HsiError::NotSupported),
        })
    }
}

//! Port events delivered to channel event callbacks

/// Asynchronous event raised on a port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PortEvent {
    /// Peer raised its wake line
    PeerWakeUp,
    /// Peer dropped its wake line
    PeerWakeDown,
    /// Break frame received
    Break,
    /// Receive error (signal, data or frame timeout)
    Error,
    /// Data arrived on a polled channel with no read pending
    DataAvailable,
}

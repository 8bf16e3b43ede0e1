//! Controller register layout
//!
//! Offsets are relative to the controller base. Per-port blocks are laid
//! out at a fixed stride; `port` is always the 0-based port index.

/// System (controller-wide) registers
pub mod sys {
    /// System configuration
    pub const SYSCONFIG: u32 = 0x0010;
    /// System status
    pub const SYSSTATUS: u32 = 0x0014;

    /// SYSCONFIG: start a soft reset
    pub const SOFTRESET: u32 = 1 << 1;
    /// SYSSTATUS: soft reset complete
    pub const RESETDONE: u32 = 1 << 0;

    /// Local wake status, one bit per channel
    pub const fn wake(port: u8) -> u32 {
        0x0030 + 0x20 * port as u32
    }

    /// Write-one-to-clear local wake bits
    pub const fn clear_wake(port: u8) -> u32 {
        0x0034 + 0x20 * port as u32
    }

    /// Write-one-to-set local wake bits
    pub const fn set_wake(port: u8) -> u32 {
        0x0038 + 0x20 * port as u32
    }

    /// Interrupt enable register of `irq` on `port`
    pub const fn mpu_enable(port: u8, irq: u8) -> u32 {
        0x0100 + 0x20 * port as u32 + 0x08 * irq as u32
    }

    /// Wake bit of `channel`
    pub const fn wake_bit(channel: u8) -> u32 {
        1 << channel
    }

    /// Valid wake bits
    pub const WAKE_MASK: u32 = 0xFFFF;

    /// Peer wake line transition detected
    pub const PEER_WAKE_DETECTED: u32 = 1 << 16;
    /// Receive error occurred
    pub const ERROR_OCCURRED: u32 = 1 << 17;
    /// Break frame detected
    pub const BREAK_DETECTED: u32 = 1 << 18;
}

/// Transmitter (HST) registers
pub mod hst {
    const fn base(port: u8) -> u32 {
        0x4000 + 0x1000 * port as u32
    }

    /// Mode, flow and wake-control
    pub const fn mode(port: u8) -> u32 {
        base(port) + 0x04
    }
    /// Frame size in bits minus one
    pub const fn frame_size(port: u8) -> u32 {
        base(port) + 0x08
    }
    /// Transmitter state machine
    pub const fn tx_state(port: u8) -> u32 {
        base(port) + 0x0C
    }
    /// Bit clock divisor
    pub const fn divisor(port: u8) -> u32 {
        base(port) + 0x18
    }
    /// Writing 1 emits a break frame
    pub const fn brk(port: u8) -> u32 {
        base(port) + 0x20
    }
    /// Number of channels
    pub const fn channels(port: u8) -> u32 {
        base(port) + 0x24
    }
    /// Arbitration policy
    pub const fn arb_mode(port: u8) -> u32 {
        base(port) + 0x28
    }

    /// Wake line driven by software (SYS wake registers)
    pub const MODE_WAKE_CTRL_SW: u32 = 1 << 4;
}

/// Receiver (HSR) registers
pub mod hsr {
    const fn base(port: u8) -> u32 {
        0x5000 + 0x1000 * port as u32
    }

    /// Mode and flow
    pub const fn mode(port: u8) -> u32 {
        base(port) + 0x04
    }
    /// Frame size in bits minus one
    pub const fn frame_size(port: u8) -> u32 {
        base(port) + 0x08
    }
    /// Receiver state machine
    pub const fn rx_state(port: u8) -> u32 {
        base(port) + 0x0C
    }
    /// Number of channels
    pub const fn channels(port: u8) -> u32 {
        base(port) + 0x24
    }
    /// Error counters (HSI) or frame timeout (SSI)
    pub const fn counters(port: u8) -> u32 {
        base(port) + 0x30
    }
    /// Bit clock divisor (HSI only)
    pub const fn divisor(port: u8) -> u32 {
        base(port) + 0x34
    }
}

/// Mode register fields shared by HST and HSR
pub mod mode {
    /// Mode field
    pub const MODE_MASK: u32 = 0x3;
    /// Flow field position
    pub const FLOW_OFFSET: u32 = 2;
    /// Flow field width mask (before shifting)
    pub const FLOW_MASK: u32 = 0x3;
}

/// Largest frame size value (32-bit payload)
pub const FRAME_SIZE_MAX: u32 = 0x1F;

/// Largest RX divisor (HSI)
pub const MAX_RX_DIVISOR: u32 = 0xFF;

/// Largest TX divisor (HSI)
pub const MAX_TX_DIVISOR: u32 = 0xFF;

/// Largest TX divisor (SSI)
pub const SSI_MAX_TX_DIVISOR: u32 = 0x7F;

/// Values loaded after a soft reset
pub mod defaults {
    /// TX divisor
    pub const TX_DIVISOR: u32 = 1;
    /// RX divisor
    pub const RX_DIVISOR: u32 = 1;
    /// HSI error counters / SSI frame timeout
    pub const COUNTERS: u32 = 0x0F00_00FF;
}

/// Number of SYSSTATUS reads before a soft reset is declared stuck
pub const SOFTRESET_POLL_LIMIT: u32 = 1000;

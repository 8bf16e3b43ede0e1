//! RX/TX register programming and soft reset
//!
//! Validation is delegated to [`HwVariant`]; nothing is written unless every
//! specified field passed. All functions here run inside the controller
//! critical section.

use embassy_sync::blocking_mutex::raw::RawMutex;

use hsi_core::config::merge_mode;
use hsi_core::registers::{defaults, hsr, hst, sys, FRAME_SIZE_MAX, SOFTRESET_POLL_LIMIT};
use hsi_core::{
    Arbitration, ChannelFlags, ChannelId, DivisorAction, Flow, HsiError, HwVariant, Mode,
    RxConfig, RxDivisor, TxConfig,
};
use hsi_hal::RegisterAccess;

use crate::controller::{ClockScope, Controller, PortState, Shared};
use crate::platform::Platform;
use crate::transfer::drop_requests_locked;

impl<M: RawMutex, P: Platform> Controller<M, P> {
    pub(crate) fn set_rx(&self, id: ChannelId, cfg: &RxConfig) -> Result<(), HsiError> {
        let variant = self.variant();
        let _clk = ClockScope::enter(self.clocks(), id, "set_rx");
        self.with_open(id, |s| {
            let Shared { regs, ports, .. } = s;
            program_rx(variant, regs, &mut ports[id.port as usize], cfg)
        })
    }

    pub(crate) fn get_rx(&self, id: ChannelId) -> Result<RxConfig, HsiError> {
        let variant = self.variant();
        let _clk = ClockScope::enter(self.clocks(), id, "get_rx");
        self.with_open(id, |s| {
            let Shared { regs, ports, .. } = s;
            Ok(read_rx(variant, regs, &ports[id.port as usize]))
        })
    }

    pub(crate) fn set_tx(&self, id: ChannelId, cfg: &TxConfig) -> Result<(), HsiError> {
        let variant = self.variant();
        let _clk = ClockScope::enter(self.clocks(), id, "set_tx");
        self.with_open(id, |s| {
            let Shared { regs, ports, .. } = s;
            program_tx(variant, regs, &ports[id.port as usize], cfg)
        })
    }

    pub(crate) fn get_tx(&self, id: ChannelId) -> Result<TxConfig, HsiError> {
        let _clk = ClockScope::enter(self.clocks(), id, "get_tx");
        self.with_open(id, |s| Ok(read_tx(&mut s.regs, id.port)))
    }

    /// Soft reset the controller and reload driver defaults
    ///
    /// Defaults are reloaded even when the reset does not complete in time,
    /// in which case `Timeout` is returned afterwards.
    pub(crate) fn sw_reset(&self, id: ChannelId) -> Result<(), HsiError> {
        let variant = self.variant();
        let _clk = ClockScope::enter(self.clocks(), id, "sw_reset");
        self.with_open(id, |s| {
            info!("controller @ {:#x}: soft reset", s.regs.base());
            let result = soft_reset(&mut s.regs);
            if result.is_err() {
                error!("soft reset did not complete");
            }
            reload_defaults(variant, s);
            result
        })
    }
}

/// Validate then program the receiver of `port`
pub(crate) fn program_rx<R: RegisterAccess, P: Platform>(
    variant: HwVariant,
    regs: &mut R,
    port: &mut PortState<P>,
    cfg: &RxConfig,
) -> Result<(), HsiError> {
    variant.validate_rx(cfg, port.max_channels as u32)?;
    let n = port.index;

    if cfg.mode.is_some() || cfg.flow.is_some() {
        let current = regs.read32(hsr::mode(n));
        regs.write32(hsr::mode(n), merge_mode(current, cfg.mode, cfg.flow));
    }
    if let Some(frame_size) = cfg.frame_size {
        regs.write32(hsr::frame_size(n), frame_size);
    }
    if let Some(mask) = cfg.channel_mask {
        regs.write32(hsr::channels(n), mask);
    }
    if let Some(divisor) = cfg.divisor {
        apply_rx_divisor(variant, regs, port, divisor);
    }
    Ok(())
}

fn apply_rx_divisor<R: RegisterAccess, P: Platform>(
    variant: HwVariant,
    regs: &mut R,
    port: &mut PortState<P>,
    divisor: RxDivisor,
) {
    let n = port.index;
    match variant.rx_divisor_action(divisor, port.counters_on) {
        DivisorAction::None => {}
        DivisorAction::EnterAuto { zero_divisor } => {
            port.counters_shadow = regs.read32(hsr::counters(n));
            port.counters_on = false;
            regs.write32(hsr::counters(n), 0);
            if zero_divisor {
                regs.write32(hsr::divisor(n), 0);
            }
            debug!("port {}: RX auto divisor, counters {:#x} saved", n, port.counters_shadow);
        }
        DivisorAction::LeaveAuto { then_program } => {
            regs.write32(hsr::counters(n), port.counters_shadow);
            port.counters_on = true;
            debug!("port {}: RX left auto, counters {:#x} restored", n, port.counters_shadow);
            if let Some(value) = then_program {
                regs.write32(hsr::divisor(n), value);
            }
        }
        DivisorAction::Program(value) => regs.write32(hsr::divisor(n), value),
    }
}

pub(crate) fn read_rx<R: RegisterAccess, P: Platform>(
    variant: HwVariant,
    regs: &mut R,
    port: &PortState<P>,
) -> RxConfig {
    let n = port.index;
    let mode = regs.read32(hsr::mode(n));
    let divisor = if !variant.has_rx_divisor() {
        None
    } else if port.counters_on {
        Some(RxDivisor::Value(regs.read32(hsr::divisor(n))))
    } else {
        Some(RxDivisor::Auto)
    };

    RxConfig {
        mode: Mode::from_register(mode),
        flow: Flow::from_register(mode),
        frame_size: Some(regs.read32(hsr::frame_size(n))),
        channel_mask: Some(regs.read32(hsr::channels(n))),
        divisor,
    }
}

/// Validate then program the transmitter of `port`
pub(crate) fn program_tx<R: RegisterAccess, P: Platform>(
    variant: HwVariant,
    regs: &mut R,
    port: &PortState<P>,
    cfg: &TxConfig,
) -> Result<(), HsiError> {
    variant.validate_tx(cfg, port.max_channels as u32)?;
    let n = port.index;

    if cfg.mode.is_some() || cfg.flow.is_some() {
        let current = regs.read32(hst::mode(n));
        let value = merge_mode(current, cfg.mode, cfg.flow) | hst::MODE_WAKE_CTRL_SW;
        regs.write32(hst::mode(n), value);
    }
    if let Some(frame_size) = cfg.frame_size {
        regs.write32(hst::frame_size(n), frame_size);
    }
    if let Some(mask) = cfg.channel_mask {
        regs.write32(hst::channels(n), mask);
    }
    if let Some(divisor) = cfg.divisor {
        regs.write32(hst::divisor(n), divisor);
    }
    if let Some(arb) = cfg.arb_mode {
        regs.write32(hst::arb_mode(n), arb.bits());
    }
    Ok(())
}

pub(crate) fn read_tx<R: RegisterAccess>(regs: &mut R, n: u8) -> TxConfig {
    let mode = regs.read32(hst::mode(n));
    TxConfig {
        mode: Mode::from_register(mode),
        flow: Flow::from_register(mode),
        frame_size: Some(regs.read32(hst::frame_size(n))),
        channel_mask: Some(regs.read32(hst::channels(n))),
        divisor: Some(regs.read32(hst::divisor(n))),
        arb_mode: Arbitration::from_register(regs.read32(hst::arb_mode(n))),
    }
}

fn soft_reset<R: RegisterAccess>(regs: &mut R) -> Result<(), HsiError> {
    regs.set_bits32(sys::SYSCONFIG, sys::SOFTRESET);
    for _ in 0..SOFTRESET_POLL_LIMIT {
        if regs.read32(sys::SYSSTATUS) & sys::RESETDONE != 0 {
            return Ok(());
        }
    }
    Err(HsiError::Timeout)
}

/// Bring driver state and registers back to attach-time defaults
///
/// Pending requests are dropped without completion, polling is disarmed,
/// OPEN and wake claims survive and the wake register is re-asserted to
/// match them.
fn reload_defaults<P: Platform>(variant: HwVariant, s: &mut Shared<P>) {
    for n in 0..s.ports.len() as u8 {
        for c in 0..s.port(n).channels.len() as u8 {
            drop_requests_locked(s, ChannelId::new(n, c));
        }

        let Shared {
            regs,
            ports,
            claims,
            ..
        } = &mut *s;
        let port = &mut ports[n as usize];
        let channels = port.max_channels as u32;
        let mode = merge_mode(0, Some(Mode::Frame), Some(Flow::Synchronized));

        regs.write32(hst::mode(n), mode | hst::MODE_WAKE_CTRL_SW);
        regs.write32(hst::frame_size(n), FRAME_SIZE_MAX);
        regs.write32(hst::channels(n), channels);
        regs.write32(hst::divisor(n), defaults::TX_DIVISOR);
        regs.write32(hst::arb_mode(n), Arbitration::RoundRobin.bits());

        regs.write32(hsr::mode(n), mode);
        regs.write32(hsr::frame_size(n), FRAME_SIZE_MAX);
        regs.write32(hsr::channels(n), channels);
        if variant.has_rx_divisor() {
            regs.write32(hsr::divisor(n), defaults::RX_DIVISOR);
        }
        regs.write32(hsr::counters(n), defaults::COUNTERS);
        port.counters_on = true;
        port.counters_shadow = defaults::COUNTERS;

        let claimed = claims.port_bits(n);
        if claimed != 0 {
            regs.write32(sys::set_wake(n), claimed);
        }

        let any_open = port
            .channels
            .iter()
            .any(|ch| ch.flags.contains(ChannelFlags::OPEN));
        if any_open {
            regs.set_bits32(
                sys::mpu_enable(n, port.irq),
                sys::PEER_WAKE_DETECTED | sys::ERROR_OCCURRED | sys::BREAK_DETECTED,
            );
        }
    }
}

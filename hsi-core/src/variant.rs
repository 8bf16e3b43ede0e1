//! Hardware variant rules
//!
//! The controller comes in two flavours. The extended one (HSI) supports
//! pipelined flow, an RX divisor register and error counters. The basic one
//! (SSI) only does synchronized flow and uses the counters register as a
//! frame timeout. The variant is picked once when the controller is built;
//! all variant branching in the driver goes through this type.

use crate::config::{Flow, Mode, RxConfig, RxDivisor, TxConfig};
use crate::error::HsiError;
use crate::registers::{FRAME_SIZE_MAX, MAX_RX_DIVISOR, MAX_TX_DIVISOR, SSI_MAX_TX_DIVISOR};

/// Controller hardware variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HwVariant {
    /// HSI: pipelined flow, RX divisor, error counters
    Extended,
    /// SSI: synchronized flow only, frame timeout instead of counters
    Basic,
}

/// Register work needed to apply an RX divisor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DivisorAction {
    /// Nothing to program
    None,
    /// Save and zero the counters; zero the divisor register as well if set
    EnterAuto { zero_divisor: bool },
    /// Restore the saved counters, then program the divisor if any
    LeaveAuto { then_program: Option<u32> },
    /// Program the divisor register
    Program(u32),
}

impl HwVariant {
    /// Whether `flow` is supported
    pub fn flow_allowed(self, flow: Flow) -> bool {
        match self {
            HwVariant::Extended => true,
            HwVariant::Basic => flow == Flow::Synchronized,
        }
    }

    /// Whether the RX divisor register exists
    pub fn has_rx_divisor(self) -> bool {
        matches!(self, HwVariant::Extended)
    }

    /// Largest TX divisor value
    pub fn max_tx_divisor(self) -> u32 {
        match self {
            HwVariant::Extended => MAX_TX_DIVISOR,
            HwVariant::Basic => SSI_MAX_TX_DIVISOR,
        }
    }

    /// Validate every specified RX field
    ///
    /// Checks run in field order: flow, frame size, channel mask, divisor.
    /// Every mode, sleep included, is accepted on the receive side, so mode
    /// needs no check. Nothing is written by the caller unless this returns
    /// `Ok`.
    pub fn validate_rx(self, cfg: &RxConfig, max_channels: u32) -> Result<(), HsiError> {
        if let Some(flow) = cfg.flow {
            if !self.flow_allowed(flow) {
                return Err(HsiError::InvalidArgument);
            }
        }

        // Only 32-bit payloads on the receive side
        if let Some(frame_size) = cfg.frame_size {
            if frame_size != FRAME_SIZE_MAX {
                return Err(HsiError::InvalidArgument);
            }
        }

        if let Some(mask) = cfg.channel_mask {
            check_channel_mask(mask, max_channels)?;
        }

        if let Some(divisor) = cfg.divisor {
            match (self, divisor) {
                (HwVariant::Extended, RxDivisor::Value(v)) if v > MAX_RX_DIVISOR => {
                    return Err(HsiError::InvalidArgument);
                }
                (HwVariant::Extended, RxDivisor::UseTimeout) => {
                    return Err(HsiError::InvalidArgument);
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Validate every specified TX field
    ///
    /// Checks run in field order: mode, flow, frame size, channel mask,
    /// divisor, arbitration.
    pub fn validate_tx(self, cfg: &TxConfig, max_channels: u32) -> Result<(), HsiError> {
        if cfg.mode == Some(Mode::Sleep) {
            return Err(HsiError::InvalidArgument);
        }

        if let Some(flow) = cfg.flow {
            if !self.flow_allowed(flow) {
                return Err(HsiError::InvalidArgument);
            }
        }

        if let Some(frame_size) = cfg.frame_size {
            let ok = match self {
                HwVariant::Extended => frame_size == FRAME_SIZE_MAX,
                HwVariant::Basic => frame_size <= FRAME_SIZE_MAX,
            };
            if !ok {
                return Err(HsiError::InvalidArgument);
            }
        }

        if let Some(mask) = cfg.channel_mask {
            check_channel_mask(mask, max_channels)?;
        }

        if let Some(divisor) = cfg.divisor {
            if divisor > self.max_tx_divisor() {
                return Err(HsiError::InvalidArgument);
            }
        }

        // Both arbitration policies exist on both variants
        Ok(())
    }

    /// Work needed to apply a validated RX divisor
    ///
    /// `counters_on` is the port's current counters state. The two variants
    /// leave AUTO on different triggers: the extended one on any fixed
    /// value, the basic one only on [`RxDivisor::UseTimeout`].
    pub fn rx_divisor_action(self, divisor: RxDivisor, counters_on: bool) -> DivisorAction {
        match self {
            HwVariant::Extended => match divisor {
                RxDivisor::Auto if counters_on => DivisorAction::EnterAuto { zero_divisor: true },
                RxDivisor::Auto => DivisorAction::None,
                RxDivisor::Value(v) if !counters_on => DivisorAction::LeaveAuto {
                    then_program: Some(v),
                },
                RxDivisor::Value(v) => DivisorAction::Program(v),
                RxDivisor::UseTimeout => DivisorAction::None,
            },
            HwVariant::Basic => match divisor {
                RxDivisor::Auto if counters_on => DivisorAction::EnterAuto { zero_divisor: false },
                RxDivisor::UseTimeout if !counters_on => DivisorAction::LeaveAuto {
                    then_program: None,
                },
                _ => DivisorAction::None,
            },
        }
    }
}

/// A channel mask is a single set bit no larger than the channel limit
pub fn check_channel_mask(mask: u32, max_channels: u32) -> Result<(), HsiError> {
    if mask == 0 || mask > max_channels || !mask.is_power_of_two() {
        return Err(HsiError::InvalidArgument);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Arbitration;

    fn full_rx() -> RxConfig {
        RxConfig {
            mode: Some(Mode::Frame),
            flow: Some(Flow::Synchronized),
            frame_size: Some(FRAME_SIZE_MAX),
            channel_mask: Some(4),
            divisor: Some(RxDivisor::Value(2)),
        }
    }

    #[test]
    fn test_channel_mask() {
        assert_eq!(check_channel_mask(3, 4), Err(HsiError::InvalidArgument));
        assert_eq!(check_channel_mask(4, 4), Ok(()));
        assert_eq!(check_channel_mask(0, 4), Err(HsiError::InvalidArgument));
        assert_eq!(check_channel_mask(8, 4), Err(HsiError::InvalidArgument));
        assert_eq!(check_channel_mask(1, 4), Ok(()));
    }

    #[test]
    fn test_rx_valid_on_both() {
        assert_eq!(HwVariant::Extended.validate_rx(&full_rx(), 8), Ok(()));
        assert_eq!(HwVariant::Basic.validate_rx(&full_rx(), 8), Ok(()));
        assert_eq!(HwVariant::Extended.validate_rx(&RxConfig::default(), 8), Ok(()));
    }

    #[test]
    fn test_rx_sleep_mode_allowed() {
        let cfg = RxConfig {
            mode: Some(Mode::Sleep),
            ..RxConfig::default()
        };
        assert_eq!(HwVariant::Extended.validate_rx(&cfg, 8), Ok(()));
    }

    #[test]
    fn test_pipelined_flow_extended_only() {
        let cfg = RxConfig {
            flow: Some(Flow::Pipelined),
            ..RxConfig::default()
        };
        assert_eq!(HwVariant::Extended.validate_rx(&cfg, 8), Ok(()));
        assert_eq!(
            HwVariant::Basic.validate_rx(&cfg, 8),
            Err(HsiError::InvalidArgument)
        );
    }

    #[test]
    fn test_rx_frame_size_must_be_max() {
        let cfg = RxConfig {
            frame_size: Some(15),
            ..RxConfig::default()
        };
        assert!(HwVariant::Extended.validate_rx(&cfg, 8).is_err());
        assert!(HwVariant::Basic.validate_rx(&cfg, 8).is_err());
    }

    #[test]
    fn test_rx_divisor_range() {
        let mut cfg = full_rx();
        cfg.divisor = Some(RxDivisor::Value(MAX_RX_DIVISOR + 1));
        assert!(HwVariant::Extended.validate_rx(&cfg, 8).is_err());
        // SSI has no RX divisor register, the value is ignored
        assert_eq!(HwVariant::Basic.validate_rx(&cfg, 8), Ok(()));

        cfg.divisor = Some(RxDivisor::UseTimeout);
        assert!(HwVariant::Extended.validate_rx(&cfg, 8).is_err());
        assert_eq!(HwVariant::Basic.validate_rx(&cfg, 8), Ok(()));
    }

    #[test]
    fn test_tx_rules() {
        let mut cfg = TxConfig {
            mode: Some(Mode::Stream),
            flow: Some(Flow::Synchronized),
            frame_size: Some(7),
            channel_mask: Some(2),
            divisor: Some(0x80),
            arb_mode: Some(Arbitration::Priority),
        };
        // Short frames and 0x80 divisor: only one variant each
        assert!(HwVariant::Extended.validate_tx(&cfg, 8).is_err());
        assert!(HwVariant::Basic.validate_tx(&cfg, 8).is_err());

        cfg.divisor = Some(0x7F);
        assert_eq!(HwVariant::Basic.validate_tx(&cfg, 8), Ok(()));

        cfg.frame_size = Some(FRAME_SIZE_MAX);
        cfg.divisor = Some(0xFF);
        assert_eq!(HwVariant::Extended.validate_tx(&cfg, 8), Ok(()));

        cfg.mode = Some(Mode::Sleep);
        assert!(HwVariant::Extended.validate_tx(&cfg, 8).is_err());
    }

    #[test]
    fn test_extended_divisor_transitions() {
        let v = HwVariant::Extended;
        assert_eq!(
            v.rx_divisor_action(RxDivisor::Auto, true),
            DivisorAction::EnterAuto { zero_divisor: true }
        );
        assert_eq!(v.rx_divisor_action(RxDivisor::Auto, false), DivisorAction::None);
        assert_eq!(
            v.rx_divisor_action(RxDivisor::Value(3), false),
            DivisorAction::LeaveAuto {
                then_program: Some(3)
            }
        );
        assert_eq!(
            v.rx_divisor_action(RxDivisor::Value(3), true),
            DivisorAction::Program(3)
        );
    }

    #[test]
    fn test_basic_divisor_transitions() {
        let v = HwVariant::Basic;
        assert_eq!(
            v.rx_divisor_action(RxDivisor::Auto, true),
            DivisorAction::EnterAuto {
                zero_divisor: false
            }
        );
        // A plain value does not leave AUTO on SSI
        assert_eq!(
            v.rx_divisor_action(RxDivisor::Value(3), false),
            DivisorAction::None
        );
        assert_eq!(
            v.rx_divisor_action(RxDivisor::UseTimeout, false),
            DivisorAction::LeaveAuto { then_program: None }
        );
        assert_eq!(
            v.rx_divisor_action(RxDivisor::UseTimeout, true),
            DivisorAction::None
        );
    }

    proptest::proptest! {
        #[test]
        fn prop_channel_mask_single_bit(mask in 0u32..=64, max in 1u32..=16) {
            let expected = mask != 0 && mask <= max && mask.count_ones() == 1;
            proptest::prop_assert_eq!(check_channel_mask(mask, max).is_ok(), expected);
        }
    }
}

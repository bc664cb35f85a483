//! Bit-level pulse construction
//!
//! One logical bit occupies exactly one carrier period on the wire. The
//! fraction of that period the line is held asserted (the duty class)
//! carries the value.

use serde::Serialize;

/// Duty-cycle class of a single bit slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DutyClass {
    /// 75% duty. Encodes a logical 1 and the Read control bit.
    High,
    /// 25% duty. Encodes a logical 0 and the Write control bit.
    Low,
    /// 50% duty. Marks a frame boundary; carries no data.
    Idle,
}

impl DutyClass {
    /// Duty cycle as a percentage of the carrier period.
    pub fn percent(&self) -> u32 {
        match self {
            Self::High => 75,
            Self::Low => 25,
            Self::Idle => 50,
        }
    }

    /// Class encoding the given logical bit.
    pub fn for_bit(bit: bool) -> Self {
        if bit {
            Self::High
        } else {
            Self::Low
        }
    }
}

/// A single timed line instruction: assert the pins in `set_mask`, deassert
/// the pins in `clear_mask`, then hold for `duration_us` microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pulse {
    /// Bit mask of output pins to assert at the start of the pulse.
    pub set_mask: u32,
    /// Bit mask of output pins to deassert at the start of the pulse.
    pub clear_mask: u32,
    /// How long the resulting line state is held.
    pub duration_us: u32,
}

/// Two pulses spanning exactly one carrier period: the asserted phase and
/// the deasserted remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitPulsePair {
    /// Phase with the line asserted.
    pub high_phase: Pulse,
    /// Phase with the line deasserted.
    pub low_phase: Pulse,
}

impl BitPulsePair {
    /// Duration of the full bit slot in microseconds.
    pub fn period_us(&self) -> u32 {
        self.high_phase.duration_us + self.low_phase.duration_us
    }
}

/// Encode one bit slot at the given duty class and carrier frequency.
///
/// The rounding order is load-bearing: the on-time is derived from the duty
/// percentage first and the off-time is the remainder of the period, so the
/// two phases always sum to exactly one period and the decoder's tolerance
/// windows stay aligned across long frames.
///
/// `carrier_hz` must be non-zero.
pub fn encode_bit(duty: DutyClass, carrier_hz: u32, pin: u8) -> BitPulsePair {
    let period_us = (1_000_000.0 / f64::from(carrier_hz)).round() as u32;
    let on_us = (f64::from(period_us) / (100.0 / f64::from(duty.percent()))).round() as u32;
    let off_us = period_us - on_us;

    BitPulsePair {
        high_phase: Pulse {
            set_mask: 1 << pin,
            clear_mask: 0,
            duration_us: on_us,
        },
        low_phase: Pulse {
            set_mask: 0,
            clear_mask: 1 << pin,
            duration_us: off_us,
        },
    }
}

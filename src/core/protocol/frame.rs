//! Frame construction and encoding
//!
//! A frame is one read or write transaction: control bit, 7-bit address,
//! and for writes up to 8 data bytes. Encoding turns a frame into the
//! ordered pulse sequence transmitted on the wire.

use super::pulse::{encode_bit, DutyClass, Pulse};
use super::{ProtocolError, ADDRESS_BITS, BITS_PER_BYTE, MAX_DATA_BYTES};
use serde::Serialize;

/// Direction control bit, transmitted right after the leading idle slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ControlBit {
    /// Request 8 bytes back from the target.
    Read,
    /// Deliver data bytes to the target.
    Write,
}

impl ControlBit {
    fn duty(self) -> DutyClass {
        match self {
            Self::Read => DutyClass::High,
            Self::Write => DutyClass::Low,
        }
    }
}

/// One logical transaction, validated at construction and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    control: ControlBit,
    address: u8,
    data: Vec<u8>,
}

impl Frame {
    /// Build a write frame carrying up to 8 data bytes.
    pub fn write(address: u8, data: &[u8]) -> Result<Self, ProtocolError> {
        if address > 0x7F {
            return Err(ProtocolError::InvalidAddress(address));
        }
        if data.len() > MAX_DATA_BYTES {
            return Err(ProtocolError::PayloadTooLarge(data.len()));
        }
        Ok(Self {
            control: ControlBit::Write,
            address,
            data: data.to_vec(),
        })
    }

    /// Build a read frame. Read frames never carry a payload.
    pub fn read(address: u8) -> Result<Self, ProtocolError> {
        if address > 0x7F {
            return Err(ProtocolError::InvalidAddress(address));
        }
        Ok(Self {
            control: ControlBit::Read,
            address,
            data: Vec::new(),
        })
    }

    /// Control bit of this frame.
    pub fn control(&self) -> ControlBit {
        self.control
    }

    /// 7-bit target address.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Data bytes (always empty for read frames).
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of pulses `encode` emits for this frame: two per bit slot,
    /// with two idle slots bracketing control + address + data bits.
    pub fn pulse_count(&self) -> usize {
        2 * (3 + ADDRESS_BITS + BITS_PER_BYTE * self.data.len())
    }
}

/// Ordered pulse sequence representing one full frame transmission.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Waveform {
    pulses: Vec<Pulse>,
}

impl Waveform {
    /// Pulses in transmission order.
    pub fn pulses(&self) -> &[Pulse] {
        &self.pulses
    }

    /// Number of pulses.
    pub fn len(&self) -> usize {
        self.pulses.len()
    }

    /// Whether the waveform contains no pulses.
    pub fn is_empty(&self) -> bool {
        self.pulses.is_empty()
    }

    /// Total on-wire duration in microseconds. The transmit wait must
    /// exceed this bound.
    pub fn duration_us(&self) -> u32 {
        self.pulses.iter().map(|p| p.duration_us).sum()
    }
}

fn push_slot(pulses: &mut Vec<Pulse>, duty: DutyClass, carrier_hz: u32, pin: u8) {
    let pair = encode_bit(duty, carrier_hz, pin);
    pulses.push(pair.high_phase);
    pulses.push(pair.low_phase);
}

/// Encode a frame into its on-wire pulse sequence.
///
/// Emission order: one idle slot, the control bit, the 7 address bits MSB
/// first, each data byte's 8 bits MSB first, one closing idle slot. The
/// result always holds exactly `2 * (10 + 8n)` pulses for `n` data bytes.
pub fn encode(frame: &Frame, pin: u8, carrier_hz: u32) -> Result<Waveform, ProtocolError> {
    if frame.data.len() > MAX_DATA_BYTES {
        return Err(ProtocolError::PayloadTooLarge(frame.data.len()));
    }
    if frame.control == ControlBit::Read && !frame.data.is_empty() {
        return Err(ProtocolError::InvalidFrame(frame.data.len()));
    }

    let mut pulses = Vec::with_capacity(frame.pulse_count());

    push_slot(&mut pulses, DutyClass::Idle, carrier_hz, pin);
    push_slot(&mut pulses, frame.control.duty(), carrier_hz, pin);

    for i in (0..ADDRESS_BITS).rev() {
        let bit = frame.address >> i & 1 == 1;
        push_slot(&mut pulses, DutyClass::for_bit(bit), carrier_hz, pin);
    }

    for &byte in &frame.data {
        for i in (0..BITS_PER_BYTE).rev() {
            let bit = byte >> i & 1 == 1;
            push_slot(&mut pulses, DutyClass::for_bit(bit), carrier_hz, pin);
        }
    }

    push_slot(&mut pulses, DutyClass::Idle, carrier_hz, pin);

    Ok(Waveform { pulses })
}

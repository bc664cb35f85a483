//! Capture decoding
//!
//! Turns the rising/falling edge timestamps recorded during a receive
//! window back into a bit sequence, packed bytes, and a carrier frequency
//! estimate. Classification uses a fixed absolute tolerance of
//! [`TOLERANCE_US`](super::TOLERANCE_US) around each duty window.

use super::{ProtocolError, BITS_PER_BYTE, TOLERANCE_US};
use serde::Serialize;

/// Everything recovered from one captured frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedResult {
    /// Recovered carrier period in microseconds.
    pub carrier_period_us: u32,
    /// Recovered carrier frequency in kilohertz.
    pub frequency_khz: f64,
    /// Classified data bits in arrival order (idle markers excluded).
    pub bits: Vec<u8>,
    /// Bits packed LSB-first into complete bytes; trailing partial bits
    /// stay visible in `bits` only.
    pub bytes: Vec<u8>,
}

fn within(offset: f64, expected: f64) -> bool {
    // Bounds are exclusive: an offset of exactly expected +/- TOLERANCE_US
    // does not classify.
    offset < expected + TOLERANCE_US && offset > expected - TOLERANCE_US
}

/// Decode a completed capture into bits, bytes, and a frequency estimate.
///
/// Both sequences must be fully populated before calling; the capture is
/// consumed read-only and decoding the same capture twice yields the same
/// result. Edge pair `0` is the leading idle slot and is consumed for
/// carrier recovery: its deasserted phase spans exactly half a period.
///
/// Fails with [`ProtocolError::AsymmetricEdges`] on mismatched edge counts,
/// [`ProtocolError::EmptyCapture`] on an empty capture, and
/// [`ProtocolError::FramingError`] when a pulse fits no tolerance window.
pub fn decode(rising: &[u32], falling: &[u32]) -> Result<DecodedResult, ProtocolError> {
    if rising.len() != falling.len() {
        return Err(ProtocolError::AsymmetricEdges {
            rising: rising.len(),
            falling: falling.len(),
        });
    }
    if rising.is_empty() {
        return Err(ProtocolError::EmptyCapture);
    }

    // Make absolute timestamps relative to the first rising edge.
    let origin = i64::from(rising[0]);
    let rising: Vec<i64> = rising.iter().map(|&t| i64::from(t) - origin).collect();
    let falling: Vec<i64> = falling.iter().map(|&t| i64::from(t) - origin).collect();

    // The leading pulse is the framing idle bit at 50% duty, so its
    // asserted phase is half a carrier period.
    let carrier_period_us = (2 * falling[0]).max(0) as u32;
    let frequency_khz = 1000.0 / f64::from(carrier_period_us);
    let period = f64::from(carrier_period_us);

    let mut bits: Vec<u8> = Vec::with_capacity(rising.len());
    for i in 1..rising.len() {
        let relative_bit = (i - 1) % BITS_PER_BYTE;
        let offset = (falling[i] - rising[i]) as f64;

        if within(offset, 0.75 * period) {
            bits.push(1);
        } else if within(offset, 0.25 * period) {
            bits.push(0);
        } else if relative_bit == 0 && within(offset, 0.50 * period) {
            // Inter-byte idle marker: legal once every 8 data bits, emits
            // no data bit.
        } else {
            return Err(ProtocolError::FramingError { index: i });
        }
    }

    let mut bytes = Vec::with_capacity(bits.len() / BITS_PER_BYTE);
    for chunk in bits.chunks_exact(BITS_PER_BYTE) {
        let mut byte = 0u8;
        for (pos, &bit) in chunk.iter().enumerate() {
            byte |= bit << pos;
        }
        bytes.push(byte);
    }

    Ok(DecodedResult {
        carrier_period_us,
        frequency_khz,
        bits,
        bytes,
    })
}

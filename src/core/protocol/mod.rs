//! Single-wire pulse-duty-cycle protocol
//!
//! The wire protocol encodes every bit as one carrier period whose duty
//! cycle carries the value: 75% for a logical 1, 25% for a logical 0, and
//! 50% for the idle marker that brackets a frame. A frame is one idle slot,
//! a read/write control bit, a 7-bit address (MSB first), up to 8 data
//! bytes (MSB first), and a closing idle slot.

pub mod decode;
pub mod frame;
pub mod pulse;

pub use decode::{decode, DecodedResult};
pub use frame::{encode, ControlBit, Frame, Waveform};
pub use pulse::{encode_bit, BitPulsePair, DutyClass, Pulse};

use thiserror::Error;

/// Carrier frequency in hertz, fixed by protocol compatibility.
pub const CARRIER_HZ: u32 = 2500;

/// Width of the target address field in bits.
pub const ADDRESS_BITS: usize = 7;

/// Bits per data byte on the wire.
pub const BITS_PER_BYTE: usize = 8;

/// Maximum data bytes in one transaction.
pub const MAX_DATA_BYTES: usize = 8;

/// Absolute decode tolerance around each duty window, in microseconds.
///
/// Fixed regardless of carrier frequency; changing this changes which
/// captures decode at all, so it is part of the protocol.
pub const TOLERANCE_US: f64 = 20.0;

/// Protocol-level encode and decode failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Address does not fit in the 7-bit address field.
    #[error("address {0:#04x} does not fit in 7 bits")]
    InvalidAddress(u8),

    /// More data bytes than one transaction can carry.
    #[error("payload of {0} bytes exceeds the 8-byte transaction limit")]
    PayloadTooLarge(usize),

    /// A read frame was supplied with a payload.
    #[error("read frames carry no payload ({0} bytes supplied)")]
    InvalidFrame(usize),

    /// Rising and falling edge counts differ; the capture is unusable.
    #[error("mismatched edge counts: {rising} rising vs {falling} falling")]
    AsymmetricEdges {
        /// Number of rising edges captured.
        rising: usize,
        /// Number of falling edges captured.
        falling: usize,
    },

    /// Nothing arrived during the receive window.
    #[error("no edges captured during the receive window")]
    EmptyCapture,

    /// A pulse fell outside every duty tolerance window.
    #[error("unclassifiable pulse at edge {index}, treating capture as noise")]
    FramingError {
        /// Index of the offending edge pair in the capture.
        index: usize,
    },
}

//! # Pulsewire Core Library
//!
//! An addressed, single-wire, pulse-duty-cycle GPIO protocol driver:
//! - Bit encoding as two-phase pulse pairs at a fixed carrier frequency
//!   (75% duty = 1, 25% = 0, 50% = frame-boundary idle)
//! - Frame encoding: idle framing, read/write control bit, 7-bit address,
//!   up to 8 data bytes
//! - Capture decoding: edge timestamps back into bits, bytes, and a
//!   carrier frequency estimate with tolerance-based classification
//! - Transaction orchestration over a pluggable GPIO backend, with a
//!   loopback simulator in tree
//!
//! ## Example
//!
//! ```rust,no_run
//! use pulsewire::{LinkConfig, LinkDriver, LoopbackGpio};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = LinkConfig::default();
//!     let backend = LoopbackGpio::new(config.tx_pin, config.rx_pin);
//!     let mut driver = LinkDriver::new(backend, config);
//!
//!     driver.write(0x55, &[0xA3]).await?;
//!
//!     let report = driver.read(0x55).await?;
//!     println!("{}", report.summary);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod core;

// Re-exports for convenience
pub use crate::config::{AppConfig, LinkConfig};
pub use crate::core::capture::{EdgeCapture, EdgeDirection, EdgeEvent, EdgeSink};
pub use crate::core::chart::{SlotLabel, TracePoint, WaveTrace};
pub use crate::core::codec::RequestError;
pub use crate::core::hal::{GpioBackend, HalError, Level, LoopbackGpio, PinMode, WaveHandle};
pub use crate::core::protocol::{
    decode, encode, ControlBit, DecodedResult, DutyClass, Frame, ProtocolError, Waveform,
    CARRIER_HZ, MAX_DATA_BYTES,
};
pub use crate::core::transaction::{
    LinkDriver, ReadReport, TransactionError, TransactionState, WriteReport,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

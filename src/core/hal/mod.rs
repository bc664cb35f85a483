//! Hardware abstraction boundary
//!
//! Contracts the transaction layer drives: a wave engine that executes
//! pulse sequences with microsecond timing, direct pin control, and an
//! edge notifier that reports line transitions on an input pin. The
//! in-tree implementation is the [`LoopbackGpio`] simulator; a real
//! DMA-driven controller backend plugs in behind the same trait.

mod loopback;

pub use loopback::LoopbackGpio;

use crate::core::capture::EdgeSink;
use crate::core::protocol::Waveform;
use async_trait::async_trait;
use thiserror::Error;

/// GPIO pin direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    /// Pin driven by the wave engine or `write`.
    Output,
    /// Pin observed by the edge notifier.
    Input,
}

/// GPIO line level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Deasserted.
    Low,
    /// Asserted.
    High,
}

/// Handle to a wave the backend has accepted for transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveHandle(pub u32);

/// Hardware access failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HalError {
    /// The GPIO controller could not be acquired.
    #[error("GPIO initialisation failed: {0}")]
    InitFailed(String),

    /// The wave engine rejected the pulse sequence.
    #[error("wave creation failed: {0}")]
    WaveCreateFailed(String),

    /// A transmit was requested for a handle the engine does not know.
    #[error("no wave registered under handle {0}")]
    UnknownWave(u32),

    /// The engine accepted the wave but could not fire it.
    #[error("wave transmission failed: {0}")]
    TransmitFailed(String),
}

/// One physical GPIO controller: wave transmission, pin control, and edge
/// notification. A backend instance is a single owned resource handle;
/// the transaction layer holds it exclusively, so only one transaction is
/// ever in flight against it.
#[async_trait]
pub trait GpioBackend: Send + Sync {
    /// Acquire the controller. Must be called before any other operation;
    /// failure aborts the transaction.
    async fn init(&mut self) -> Result<(), HalError>;

    /// Set a pin direction.
    fn set_mode(&mut self, pin: u8, mode: PinMode);

    /// Drive an output pin to a level.
    fn write(&mut self, pin: u8, level: Level);

    /// Hand a waveform to the wave engine. The engine must execute pulses
    /// in order, holding each line state for exactly the pulse's duration.
    async fn submit(&mut self, waveform: &Waveform) -> Result<WaveHandle, HalError>;

    /// Fire a previously submitted wave exactly once.
    async fn transmit_once(&mut self, handle: WaveHandle) -> Result<(), HalError>;

    /// Stop any in-flight transmission.
    async fn stop(&mut self);

    /// Attach an edge notifier sink to an input pin. The notifier invokes
    /// [`EdgeSink::record`] once per observed transition, in order of
    /// occurrence, with microsecond timestamps.
    fn subscribe(&mut self, pin: u8, sink: EdgeSink);

    /// Detach the notifier from a pin. When this returns, no further edges
    /// will be recorded; the caller may then drain the capture.
    fn unsubscribe(&mut self, pin: u8);
}

//! Transaction orchestration
//!
//! Sequences one write or read transaction end to end: encode the frame,
//! hand the waveform to the wave engine, wait out the fixed transmit
//! window, and for reads capture and decode the response. The driver owns
//! the GPIO controller handle, so only one transaction is ever in flight;
//! each transaction is attempted exactly once, with no automatic retry.

use crate::config::LinkConfig;
use crate::core::capture::EdgeCapture;
use crate::core::chart::WaveTrace;
use crate::core::codec::{self, RequestError};
use crate::core::hal::{GpioBackend, HalError, Level, PinMode};
use crate::core::protocol::{decode, encode, DecodedResult, Frame, ProtocolError, Waveform};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Transaction lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransactionState {
    /// No transaction in flight.
    Idle,
    /// Building the frame and waveform.
    Encoding,
    /// Waveform handed to the wave engine, transmit window open.
    Transmitting,
    /// Write transaction completed.
    WriteDone,
    /// Receive window open, notifier attached.
    ReceivingEdges,
    /// Receive window closed, decoding the capture.
    Decoding,
    /// Read transaction completed.
    ReadDone,
    /// The last transaction failed.
    Error,
}

/// Transaction failures. Each wrapped error carries its own distinct,
/// user-diagnosable message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransactionError {
    /// Hardware init or wave creation failed; fatal to the transaction.
    #[error(transparent)]
    Hardware(#[from] HalError),

    /// Frame validation or capture decoding failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// User-supplied request text failed validation.
    #[error(transparent)]
    Request(#[from] RequestError),
}

/// Outcome of a completed write transaction.
#[derive(Debug, Clone, Serialize)]
pub struct WriteReport {
    /// Transaction id.
    pub id: Uuid,
    /// Target address.
    pub address: u8,
    /// Pulses transmitted.
    pub pulses: usize,
    /// On-wire duration of the waveform in microseconds.
    pub wire_time_us: u32,
}

/// Outcome of a completed read transaction. The trace is the visualization
/// payload a display surface may render; the driver itself does nothing
/// with it.
#[derive(Debug, Clone, Serialize)]
pub struct ReadReport {
    /// Transaction id.
    pub id: Uuid,
    /// Target address.
    pub address: u8,
    /// Decoded bits, bytes, and carrier estimate.
    pub decoded: DecodedResult,
    /// Reconstructed waveform trace.
    pub trace: WaveTrace,
    /// Human-readable one-line summary.
    pub summary: String,
}

/// Drives write and read transactions against one GPIO backend.
pub struct LinkDriver<B: GpioBackend> {
    backend: B,
    config: LinkConfig,
    state: Arc<RwLock<TransactionState>>,
}

impl<B: GpioBackend> LinkDriver<B> {
    /// Create a driver owning the backend.
    pub fn new(backend: B, config: LinkConfig) -> Self {
        Self {
            backend,
            config,
            state: Arc::new(RwLock::new(TransactionState::Idle)),
        }
    }

    /// Current transaction state.
    pub fn state(&self) -> TransactionState {
        *self.state.read()
    }

    /// Link configuration in use.
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Borrow the backend, e.g. to inspect pin state after a transaction.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Consume the driver and return the backend.
    pub fn into_backend(self) -> B {
        self.backend
    }

    fn set_state(&self, state: TransactionState) {
        *self.state.write() = state;
        debug!(?state, "transaction state");
    }

    /// Fixed wait covering the transmit window. Must exceed the waveform's
    /// on-wire duration; a too-short configured wait is extended.
    fn transmit_wait(&self, waveform: &Waveform) -> Duration {
        let configured = Duration::from_millis(self.config.tx_wait_ms);
        let floor = Duration::from_micros(u64::from(waveform.duration_us()) + 1_000);
        if configured < floor {
            warn!(
                configured_ms = self.config.tx_wait_ms,
                wire_us = waveform.duration_us(),
                "configured transmit wait shorter than waveform, extending"
            );
            floor
        } else {
            configured
        }
    }

    /// Perform one write transaction: encode the frame, transmit it once,
    /// and force the output pin low afterwards regardless of outcome.
    pub async fn write(&mut self, address: u8, data: &[u8]) -> Result<WriteReport, TransactionError> {
        let id = Uuid::new_v4();
        info!(%id, address, bytes = data.len(), "write transaction");
        let result = self.write_inner(id, address, data).await;
        match &result {
            Ok(_) => self.set_state(TransactionState::Idle),
            Err(error) => {
                warn!(%id, %error, "write transaction failed");
                self.set_state(TransactionState::Error);
            }
        }
        result
    }

    async fn write_inner(
        &mut self,
        id: Uuid,
        address: u8,
        data: &[u8],
    ) -> Result<WriteReport, TransactionError> {
        self.set_state(TransactionState::Encoding);
        let frame = Frame::write(address, data)?;
        let waveform = encode(&frame, self.config.tx_pin, self.config.carrier_hz)?;

        self.backend.init().await?;
        self.backend.set_mode(self.config.tx_pin, PinMode::Output);
        self.backend.write(self.config.tx_pin, Level::Low);

        let handle = match self.backend.submit(&waveform).await {
            Ok(handle) => handle,
            Err(error) => {
                // Wave creation failure aborts immediately, pin stays low.
                self.backend.write(self.config.tx_pin, Level::Low);
                return Err(error.into());
            }
        };

        self.set_state(TransactionState::Transmitting);
        let fired = self.backend.transmit_once(handle).await;
        if fired.is_ok() {
            tokio::time::sleep(self.transmit_wait(&waveform)).await;
        }
        // Cleanup runs whether the wave fired or not: the pin ends low.
        self.backend.stop().await;
        self.backend.write(self.config.tx_pin, Level::Low);
        fired?;

        self.set_state(TransactionState::WriteDone);
        Ok(WriteReport {
            id,
            address,
            pulses: waveform.len(),
            wire_time_us: waveform.duration_us(),
        })
    }

    /// Perform one read transaction: transmit the read command with a
    /// fresh edge capture attached to the receive pin, wait out the
    /// observation window, detach the notifier, then decode whatever
    /// arrived. Decode errors surface to the caller; nothing partial is
    /// ever returned.
    pub async fn read(&mut self, address: u8) -> Result<ReadReport, TransactionError> {
        let id = Uuid::new_v4();
        info!(%id, address, "read transaction");
        let result = self.read_inner(id, address).await;
        match &result {
            Ok(_) => self.set_state(TransactionState::Idle),
            Err(error) => {
                warn!(%id, %error, "read transaction failed");
                self.set_state(TransactionState::Error);
            }
        }
        result
    }

    async fn read_inner(&mut self, id: Uuid, address: u8) -> Result<ReadReport, TransactionError> {
        self.set_state(TransactionState::Encoding);
        let frame = Frame::read(address)?;
        let waveform = encode(&frame, self.config.tx_pin, self.config.carrier_hz)?;

        self.backend.init().await?;
        self.backend.set_mode(self.config.tx_pin, PinMode::Output);
        self.backend.write(self.config.tx_pin, Level::Low);
        self.backend.set_mode(self.config.rx_pin, PinMode::Input);

        let capture = EdgeCapture::with_capacity(self.config.capture_capacity);
        self.backend.subscribe(self.config.rx_pin, capture.sink());

        let handle = match self.backend.submit(&waveform).await {
            Ok(handle) => handle,
            Err(error) => {
                self.backend.unsubscribe(self.config.rx_pin);
                self.backend.write(self.config.tx_pin, Level::Low);
                return Err(error.into());
            }
        };

        self.set_state(TransactionState::ReceivingEdges);
        let fired = self.backend.transmit_once(handle).await;
        if fired.is_ok() {
            tokio::time::sleep(self.transmit_wait(&waveform)).await;
        }
        self.backend.stop().await;

        // Detach before draining: once unsubscribe returns, no appends can
        // race the decode. Runs on the failure path too, so a failed
        // transmit never leaves the notifier attached or the pin high.
        self.backend.unsubscribe(self.config.rx_pin);
        self.backend.write(self.config.tx_pin, Level::Low);
        fired?;

        self.set_state(TransactionState::Decoding);
        let (rising, falling) = capture.finish();
        debug!(rising = rising.len(), falling = falling.len(), "receive window closed");

        let decoded = decode(&rising, &falling)?;
        let trace = WaveTrace::from_capture(&rising, &falling, decoded.carrier_period_us, &decoded.bits);
        let summary = codec::summary(&decoded);

        self.set_state(TransactionState::ReadDone);
        Ok(ReadReport {
            id,
            address,
            decoded,
            trace,
            summary,
        })
    }

    /// Write with the address and payload still in user hex form.
    pub async fn write_hex(&mut self, address: &str, data: &str) -> Result<WriteReport, TransactionError> {
        let address = codec::parse_address(address).map_err(|e| {
            self.set_state(TransactionState::Error);
            e
        })?;
        let data = codec::parse_payload(data).map_err(|e| {
            self.set_state(TransactionState::Error);
            e
        })?;
        self.write(address, &data).await
    }

    /// Read with the address still in user hex form.
    pub async fn read_hex(&mut self, address: &str) -> Result<ReadReport, TransactionError> {
        let address = codec::parse_address(address).map_err(|e| {
            self.set_state(TransactionState::Error);
            e
        })?;
        self.read(address).await
    }
}

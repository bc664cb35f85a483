//! Loopback backend
//!
//! Simulated GPIO controller with the transmit pin wired straight to the
//! receive pin. Transmitting a wave walks its pulses and feeds synthesized
//! edge timestamps to whatever sink is subscribed on the receive pin. Used
//! by the CLI and the integration tests; supports fault injection and a
//! configurable falling-edge jitter for tolerance testing.

use super::{GpioBackend, HalError, Level, PinMode, WaveHandle};
use crate::core::capture::{EdgeDirection, EdgeSink};
use crate::core::protocol::{Pulse, Waveform};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

/// In-memory GPIO backend with the tx pin looped to the rx pin.
pub struct LoopbackGpio {
    tx_pin: u8,
    rx_pin: u8,
    base_us: u32,
    jitter_us: i32,
    fail_init: bool,
    fail_wave: bool,
    fail_transmit: bool,
    initialised: bool,
    waves: Vec<Vec<Pulse>>,
    sinks: Mutex<HashMap<u8, EdgeSink>>,
    modes: HashMap<u8, PinMode>,
    levels: HashMap<u8, Level>,
}

impl LoopbackGpio {
    /// Create a loopback controller wiring `tx_pin` to `rx_pin`.
    pub fn new(tx_pin: u8, rx_pin: u8) -> Self {
        Self {
            tx_pin,
            rx_pin,
            base_us: 5_000,
            jitter_us: 0,
            fail_init: false,
            fail_wave: false,
            fail_transmit: false,
            initialised: false,
            waves: Vec::new(),
            sinks: Mutex::new(HashMap::new()),
            modes: HashMap::new(),
            levels: HashMap::new(),
        }
    }

    /// Absolute timestamp of the first synthesized edge.
    #[must_use]
    pub fn base_offset(mut self, us: u32) -> Self {
        self.base_us = us;
        self
    }

    /// Shift every falling edge by `us` microseconds, distorting the duty
    /// cycle the decoder sees.
    #[must_use]
    pub fn jitter(mut self, us: i32) -> Self {
        self.jitter_us = us;
        self
    }

    /// Make `init` fail, as an unprivileged process would see.
    #[must_use]
    pub fn fail_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    /// Make `submit` fail wave creation.
    #[must_use]
    pub fn fail_wave_create(mut self) -> Self {
        self.fail_wave = true;
        self
    }

    /// Make `transmit_once` fail after the wave was accepted.
    #[must_use]
    pub fn fail_transmit(mut self) -> Self {
        self.fail_transmit = true;
        self
    }

    /// Last level written to a pin, if any.
    pub fn level(&self, pin: u8) -> Option<Level> {
        self.levels.get(&pin).copied()
    }

    /// Last mode set on a pin, if any.
    pub fn mode(&self, pin: u8) -> Option<PinMode> {
        self.modes.get(&pin).copied()
    }

    /// Number of waves the engine has accepted.
    pub fn submitted_waves(&self) -> usize {
        self.waves.len()
    }

    /// Whether an edge notifier sink is currently attached to a pin.
    pub fn is_subscribed(&self, pin: u8) -> bool {
        self.sinks.lock().contains_key(&pin)
    }

    fn emit(&self, timestamp_us: u32, direction: EdgeDirection) {
        if let Some(sink) = self.sinks.lock().get(&self.rx_pin) {
            sink.record(timestamp_us, direction);
        }
    }
}

#[async_trait]
impl GpioBackend for LoopbackGpio {
    async fn init(&mut self) -> Result<(), HalError> {
        if self.fail_init {
            return Err(HalError::InitFailed(
                "controller unavailable (are you root?)".to_string(),
            ));
        }
        self.initialised = true;
        Ok(())
    }

    fn set_mode(&mut self, pin: u8, mode: PinMode) {
        self.modes.insert(pin, mode);
    }

    fn write(&mut self, pin: u8, level: Level) {
        self.levels.insert(pin, level);
    }

    async fn submit(&mut self, waveform: &Waveform) -> Result<WaveHandle, HalError> {
        if !self.initialised {
            return Err(HalError::InitFailed("controller not initialised".to_string()));
        }
        if self.fail_wave {
            return Err(HalError::WaveCreateFailed(
                "wave engine rejected the pulse sequence".to_string(),
            ));
        }
        self.waves.push(waveform.pulses().to_vec());
        let handle = WaveHandle((self.waves.len() - 1) as u32);
        debug!(handle = handle.0, pulses = waveform.len(), "wave accepted");
        Ok(handle)
    }

    async fn transmit_once(&mut self, handle: WaveHandle) -> Result<(), HalError> {
        if self.fail_transmit {
            return Err(HalError::TransmitFailed(
                "wave engine busy".to_string(),
            ));
        }
        let pulses = self
            .waves
            .get(handle.0 as usize)
            .cloned()
            .ok_or(HalError::UnknownWave(handle.0))?;

        let mask = 1u32 << self.tx_pin;
        let mut t = self.base_us;
        for pulse in &pulses {
            if pulse.set_mask & mask != 0 {
                self.emit(t, EdgeDirection::Rising);
            }
            if pulse.clear_mask & mask != 0 {
                let jittered = (i64::from(t) + i64::from(self.jitter_us)).max(0) as u32;
                self.emit(jittered, EdgeDirection::Falling);
            }
            t += pulse.duration_us;
        }
        self.levels.insert(self.tx_pin, Level::Low);
        debug!(handle = handle.0, end_us = t, "wave transmitted");
        Ok(())
    }

    async fn stop(&mut self) {
        // One-shot transmission completes synchronously here.
    }

    fn subscribe(&mut self, pin: u8, sink: EdgeSink) {
        self.sinks.lock().insert(pin, sink);
    }

    fn unsubscribe(&mut self, pin: u8) {
        self.sinks.lock().remove(&pin);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::capture::EdgeCapture;
    use crate::core::protocol::{encode, Frame, CARRIER_HZ};

    #[tokio::test]
    async fn test_transmit_feeds_subscribed_sink() {
        let frame = Frame::read(0x55).unwrap();
        let waveform = encode(&frame, 4, CARRIER_HZ).unwrap();

        let mut gpio = LoopbackGpio::new(4, 12).base_offset(0);
        gpio.init().await.unwrap();
        let capture = EdgeCapture::new();
        gpio.subscribe(12, capture.sink());

        let handle = gpio.submit(&waveform).await.unwrap();
        gpio.transmit_once(handle).await.unwrap();
        gpio.unsubscribe(12);

        let (rising, falling) = capture.finish();
        // One edge pair per bit slot: idle + control + 7 address + idle.
        assert_eq!(rising.len(), 10);
        assert_eq!(falling.len(), 10);
        // Leading idle: rise at 0, fall half a period later.
        assert_eq!(rising[0], 0);
        assert_eq!(falling[0], 200);
    }

    #[tokio::test]
    async fn test_transmit_without_subscriber_is_silent() {
        let frame = Frame::read(0x01).unwrap();
        let waveform = encode(&frame, 4, CARRIER_HZ).unwrap();

        let mut gpio = LoopbackGpio::new(4, 12);
        gpio.init().await.unwrap();
        let handle = gpio.submit(&waveform).await.unwrap();
        gpio.transmit_once(handle).await.unwrap();
        assert_eq!(gpio.level(4), Some(Level::Low));
    }

    #[tokio::test]
    async fn test_unknown_handle() {
        let mut gpio = LoopbackGpio::new(4, 12);
        gpio.init().await.unwrap();
        assert_eq!(
            gpio.transmit_once(WaveHandle(7)).await.unwrap_err(),
            HalError::UnknownWave(7)
        );
    }

    #[tokio::test]
    async fn test_fault_injection() {
        let mut gpio = LoopbackGpio::new(4, 12).fail_init();
        assert!(matches!(
            gpio.init().await.unwrap_err(),
            HalError::InitFailed(_)
        ));

        let frame = Frame::read(0x01).unwrap();
        let waveform = encode(&frame, 4, CARRIER_HZ).unwrap();
        let mut gpio = LoopbackGpio::new(4, 12).fail_wave_create();
        gpio.init().await.unwrap();
        assert!(matches!(
            gpio.submit(&waveform).await.unwrap_err(),
            HalError::WaveCreateFailed(_)
        ));

        let mut gpio = LoopbackGpio::new(4, 12).fail_transmit();
        gpio.init().await.unwrap();
        let handle = gpio.submit(&waveform).await.unwrap();
        assert!(matches!(
            gpio.transmit_once(handle).await.unwrap_err(),
            HalError::TransmitFailed(_)
        ));
    }
}

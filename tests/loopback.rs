//! End-to-end transactions over the loopback backend

use pulsewire::{
    HalError, Level, LinkConfig, LinkDriver, LoopbackGpio, PinMode, ProtocolError,
    TransactionError, TransactionState,
};

/// Short transmit wait so tests do not sit out the 1 s hardware default;
/// the driver extends it to cover the waveform.
fn test_config() -> LinkConfig {
    LinkConfig {
        tx_wait_ms: 1,
        ..LinkConfig::default()
    }
}

fn loopback(config: &LinkConfig) -> LoopbackGpio {
    LoopbackGpio::new(config.tx_pin, config.rx_pin)
}

#[tokio::test]
async fn write_transaction_completes_and_parks_pin_low() {
    let config = test_config();
    let mut driver = LinkDriver::new(loopback(&config), config.clone());

    let report = driver.write(0x55, &[0xA3]).await.unwrap();
    assert_eq!(report.pulses, 36);
    assert_eq!(report.wire_time_us, 18 * 400);
    assert_eq!(driver.state(), TransactionState::Idle);

    let backend = driver.backend();
    assert_eq!(backend.mode(config.tx_pin), Some(PinMode::Output));
    assert_eq!(backend.level(config.tx_pin), Some(Level::Low));
}

#[tokio::test]
async fn read_transaction_decodes_the_looped_command() {
    let config = test_config();
    let mut driver = LinkDriver::new(loopback(&config), config);

    let report = driver.read(0x55).await.unwrap();
    assert_eq!(driver.state(), TransactionState::Idle);
    assert_eq!(report.decoded.carrier_period_us, 400);
    assert!((report.decoded.frequency_khz - 2.5).abs() < 1e-9);

    // The loopback receives the read command itself: control bit 1, then
    // address 1010101; the trailing idle is consumed as a byte boundary.
    assert_eq!(report.decoded.bits, vec![1, 1, 0, 1, 0, 1, 0, 1]);
    assert_eq!(report.decoded.bytes, vec![0xAB]);

    // Trace covers all ten captured slots.
    assert_eq!(report.trace.labels.len(), 10);
    assert_eq!(report.trace.points.len(), 50);
    assert!(report.summary.contains("2.5"));
}

#[tokio::test]
async fn oversized_payload_fails_before_hardware() {
    let config = test_config();
    let mut driver = LinkDriver::new(loopback(&config), config);

    let err = driver.write(0x10, &[0u8; 9]).await.unwrap_err();
    assert_eq!(
        err,
        TransactionError::Protocol(ProtocolError::PayloadTooLarge(9))
    );
    assert_eq!(driver.state(), TransactionState::Error);
    assert_eq!(driver.backend().submitted_waves(), 0);
}

#[tokio::test]
async fn wide_address_fails_validation() {
    let config = test_config();
    let mut driver = LinkDriver::new(loopback(&config), config);

    let err = driver.read(0x80).await.unwrap_err();
    assert_eq!(
        err,
        TransactionError::Protocol(ProtocolError::InvalidAddress(0x80))
    );
}

#[tokio::test]
async fn init_failure_is_fatal_to_the_transaction() {
    let config = test_config();
    let backend = loopback(&config).fail_init();
    let mut driver = LinkDriver::new(backend, config);

    let err = driver.write(0x01, &[0x02]).await.unwrap_err();
    assert!(matches!(
        err,
        TransactionError::Hardware(HalError::InitFailed(_))
    ));
    assert_eq!(driver.state(), TransactionState::Error);
}

#[tokio::test]
async fn wave_create_failure_leaves_pin_low() {
    let config = test_config();
    let backend = loopback(&config).fail_wave_create();
    let mut driver = LinkDriver::new(backend, config.clone());

    let err = driver.write(0x01, &[0x02]).await.unwrap_err();
    assert!(matches!(
        err,
        TransactionError::Hardware(HalError::WaveCreateFailed(_))
    ));
    assert_eq!(driver.backend().level(config.tx_pin), Some(Level::Low));
    assert_eq!(driver.state(), TransactionState::Error);
}

#[tokio::test]
async fn transmit_failure_on_read_detaches_notifier_and_parks_pin_low() {
    let config = test_config();
    let backend = loopback(&config).fail_transmit();
    let mut driver = LinkDriver::new(backend, config.clone());

    let err = driver.read(0x55).await.unwrap_err();
    assert!(matches!(
        err,
        TransactionError::Hardware(HalError::TransmitFailed(_))
    ));
    assert_eq!(driver.state(), TransactionState::Error);

    // The failed fire must not leave the notifier attached or the pin high.
    let backend = driver.backend();
    assert!(!backend.is_subscribed(config.rx_pin));
    assert_eq!(backend.level(config.tx_pin), Some(Level::Low));
}

#[tokio::test]
async fn transmit_failure_on_write_parks_pin_low() {
    let config = test_config();
    let backend = loopback(&config).fail_transmit();
    let mut driver = LinkDriver::new(backend, config.clone());

    let err = driver.write(0x01, &[0x02]).await.unwrap_err();
    assert!(matches!(
        err,
        TransactionError::Hardware(HalError::TransmitFailed(_))
    ));
    assert_eq!(driver.state(), TransactionState::Error);
    assert_eq!(driver.backend().level(config.tx_pin), Some(Level::Low));
}

#[tokio::test]
async fn tolerable_jitter_still_decodes() {
    let config = test_config();
    let backend = loopback(&config).jitter(15);
    let mut driver = LinkDriver::new(backend, config);

    let report = driver.read(0x2A).await.unwrap();
    assert_eq!(report.decoded.bits.len(), 8);
}

#[tokio::test]
async fn excessive_jitter_is_a_framing_error() {
    let config = test_config();
    let backend = loopback(&config).jitter(41);
    let mut driver = LinkDriver::new(backend, config);

    let err = driver.read(0x2A).await.unwrap_err();
    assert!(matches!(
        err,
        TransactionError::Protocol(ProtocolError::FramingError { .. })
    ));
    assert_eq!(driver.state(), TransactionState::Error);
}

#[tokio::test]
async fn hex_request_surface_validates_input() {
    let config = test_config();
    let mut driver = LinkDriver::new(loopback(&config), config.clone());

    assert!(matches!(
        driver.write_hex("zz", "a3").await.unwrap_err(),
        TransactionError::Request(_)
    ));
    assert!(matches!(
        driver.write_hex("55", "a3f").await.unwrap_err(),
        TransactionError::Request(_)
    ));
    assert!(matches!(
        driver.read_hex("80").await.unwrap_err(),
        TransactionError::Request(_)
    ));

    // Valid text goes through the same transaction path.
    let report = driver.write_hex("55", "a3").await.unwrap();
    assert_eq!(report.address, 0x55);
    assert_eq!(report.pulses, 36);
}

#[tokio::test]
async fn transactions_run_back_to_back() {
    let config = test_config();
    let mut driver = LinkDriver::new(loopback(&config), config);

    driver.write(0x01, &[0x11, 0x22]).await.unwrap();
    let first = driver.read(0x01).await.unwrap();
    let second = driver.read(0x01).await.unwrap();
    assert_eq!(first.decoded.bits, second.decoded.bits);
    assert_eq!(driver.state(), TransactionState::Idle);
}

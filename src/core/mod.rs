//! Core module containing the protocol and transaction machinery
//!
//! This module provides:
//! - Pulse-level bit codec and frame encoder/decoder for the single-wire
//!   duty-cycle protocol
//! - Edge capture buffer for the receive window
//! - Hardware abstraction boundary (wave engine, pin control, edge
//!   notifier) with a loopback simulator backend
//! - Transaction orchestration for write and read transactions
//! - Hex request parsing and decoded-waveform trace data

pub mod capture;
pub mod chart;
pub mod codec;
pub mod hal;
pub mod protocol;
pub mod transaction;

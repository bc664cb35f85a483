//! Request parsing and result formatting
//!
//! The user-facing surface supplies the target address as a 2-hex-digit
//! string and write payloads as an even-length hex string, each digit pair
//! one byte. This module validates that text into protocol inputs and
//! renders decode results back into display strings.

use crate::core::protocol::DecodedResult;
use thiserror::Error;

/// Errors in user-supplied request text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// Address text is not hex or exceeds 7 bits.
    #[error("address {0:?} is not a valid 7-bit hex value")]
    InvalidAddress(String),

    /// Payload text is not an even-length hex string.
    #[error("data is not an even-length hex string (partial byte?)")]
    MalformedPayload,
}

/// Parse a 7-bit target address from hex text.
pub fn parse_address(text: &str) -> Result<u8, RequestError> {
    let text = text.trim();
    let value = u8::from_str_radix(text, 16)
        .map_err(|_| RequestError::InvalidAddress(text.to_string()))?;
    if value > 0x7F {
        return Err(RequestError::InvalidAddress(text.to_string()));
    }
    Ok(value)
}

/// Parse an even-length hex payload into bytes. An empty string is an
/// empty payload; the byte-count cap is enforced by the frame encoder.
pub fn parse_payload(text: &str) -> Result<Vec<u8>, RequestError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }
    if text.len() % 2 != 0 {
        return Err(RequestError::MalformedPayload);
    }
    hex::decode(text).map_err(|_| RequestError::MalformedPayload)
}

/// Render decoded bytes the way the result surface displays them, in
/// 4-byte groups prefixed with `0x`.
pub fn format_bytes(bytes: &[u8]) -> String {
    let mut out = String::new();
    for (i, byte) in bytes.iter().enumerate() {
        if i % 4 == 0 {
            out.push_str(" 0x");
        }
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Render a frequency to six significant digits with trailing zeros
/// trimmed, matching the C-style `%g` output of the result surface.
fn format_frequency(khz: f64) -> String {
    if !khz.is_finite() || khz == 0.0 {
        return format!("{khz}");
    }
    let magnitude = khz.abs().log10().floor() as i32;
    let decimals = usize::try_from((5 - magnitude).max(0)).unwrap_or(0);
    let mut text = format!("{khz:.decimals$}");
    if text.contains('.') {
        while text.ends_with('0') {
            text.pop();
        }
        if text.ends_with('.') {
            text.pop();
        }
    }
    text
}

/// One-line human summary of a decode.
pub fn summary(result: &DecodedResult) -> String {
    format!(
        "Incoming frequency seems to be about {} kHz. Data was{}",
        format_frequency(result.frequency_khz),
        format_bytes(&result.bytes)
    )
}

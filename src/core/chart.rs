//! Decoded-waveform trace data
//!
//! Pure data for visualizing a read capture: the reconstructed square-wave
//! vertices and a label per bit slot. Rendering is out of scope; a
//! successful read hands this trace to whatever display surface the
//! application wires up.

use serde::Serialize;

/// Nominal trace amplitude in volts.
const TRACE_HIGH_V: f64 = 5.0;

/// Bit slots per labeled group: eight data bits plus one idle marker.
const SLOTS_PER_GROUP: usize = 9;

/// One vertex of the reconstructed line trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TracePoint {
    /// Time in microseconds, relative to the first rising edge.
    pub x: f64,
    /// Level in volts.
    pub y: f64,
}

/// Label for one bit slot on the time axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotLabel {
    /// Label text, either an idle marker or a bit with its decoded value.
    pub text: String,
    /// Axis position in microseconds.
    pub x: f64,
}

/// Reconstructed waveform trace for one decoded capture.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct WaveTrace {
    /// Square-wave vertices in drawing order.
    pub points: Vec<TracePoint>,
    /// One label per captured bit slot.
    pub labels: Vec<SlotLabel>,
}

impl WaveTrace {
    /// Build a trace from a captured edge sequence and its decode.
    ///
    /// `bits` carries data bits only; idle slots have no bit value, so the
    /// labeling walk keeps an idle offset to stay aligned with the full
    /// slot sequence. Returns an empty trace for unusable captures.
    pub fn from_capture(rising: &[u32], falling: &[u32], period_us: u32, bits: &[u8]) -> Self {
        if rising.is_empty() || rising.len() != falling.len() {
            return Self::default();
        }

        let origin = f64::from(rising[0]);
        let period = f64::from(period_us);
        let mut points = Vec::with_capacity(rising.len() * 5);
        let mut labels = Vec::with_capacity(rising.len());
        let mut idle_slots = 0usize;

        for i in 0..rising.len() {
            let rise = f64::from(rising[i]) - origin;
            let fall = f64::from(falling[i]) - origin;

            points.push(TracePoint { x: rise, y: 0.0 });
            points.push(TracePoint { x: rise, y: TRACE_HIGH_V });
            points.push(TracePoint { x: fall, y: TRACE_HIGH_V });
            points.push(TracePoint { x: fall, y: 0.0 });
            points.push(TracePoint {
                x: period * (i + 1) as f64,
                y: 0.0,
            });

            let x = rise + period;
            if i % SLOTS_PER_GROUP == 0 {
                labels.push(SlotLabel {
                    text: format!("Idle pulse {idle_slots}"),
                    x,
                });
                idle_slots += 1;
            } else {
                let bit_index = i - idle_slots;
                let value = bits.get(bit_index).copied().unwrap_or_default();
                labels.push(SlotLabel {
                    text: format!("Bit {bit_index} ({value})"),
                    x,
                });
            }
        }

        Self { points, labels }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_or_asymmetric_capture_gives_empty_trace() {
        assert_eq!(WaveTrace::from_capture(&[], &[], 400, &[]), WaveTrace::default());
        assert_eq!(
            WaveTrace::from_capture(&[0, 400], &[200], 400, &[]),
            WaveTrace::default()
        );
    }

    #[test]
    fn test_point_and_label_counts() {
        let rising = vec![1000, 1400, 1800];
        let falling = vec![1200, 1700, 1900];
        let trace = WaveTrace::from_capture(&rising, &falling, 400, &[1, 0]);
        assert_eq!(trace.points.len(), 15);
        assert_eq!(trace.labels.len(), 3);
    }

    #[test]
    fn test_points_are_normalized_to_first_rise() {
        let rising = vec![1000, 1400];
        let falling = vec![1200, 1700];
        let trace = WaveTrace::from_capture(&rising, &falling, 400, &[1]);
        assert_eq!(trace.points[0].x, 0.0);
        assert_eq!(trace.points[1].y, 5.0);
        assert_eq!(trace.points[2].x, 200.0);
    }

    #[test]
    fn test_slot_labels_skip_idle_markers() {
        let rising = vec![0, 400, 800];
        let falling = vec![200, 700, 900];
        let trace = WaveTrace::from_capture(&rising, &falling, 400, &[1, 0]);
        assert_eq!(trace.labels[0].text, "Idle pulse 0");
        assert_eq!(trace.labels[1].text, "Bit 0 (1)");
        assert_eq!(trace.labels[2].text, "Bit 1 (0)");
        assert_eq!(trace.labels[1].x, 800.0);
    }
}

//! Input level measurement

/// Width of the meter bar in characters
pub const METER_WIDTH: usize = 40;

/// RMS units per bar character
const RMS_PER_CELL: f64 = 50.0;

/// Root-mean-square amplitude of 16-bit samples
///
/// Samples are widened before squaring so full-scale input cannot
/// overflow. Empty input yields `0.0`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn rms(samples: &[i16]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples
        .iter()
        .map(|&s| {
            let s = f64::from(s);
            s * s
        })
        .sum();
    let value = (sum / samples.len() as f64).sqrt();
    if value.is_finite() { value } else { 0.0 }
}

/// One line of the level meter
///
/// ```
/// use braille_tutor::voice::meter_line;
/// assert_eq!(meter_line(100.0, 500.0).len(), meter_line(0.0, 500.0).len());
/// ```
#[must_use]
pub fn meter_line(level: f64, threshold: f64) -> String {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let cells = ((level / RMS_PER_CELL).max(0.0) as usize).min(METER_WIDTH);
    let marker = if level >= threshold { "SOUND" } else { "quiet" };
    format!(
        "{marker} {level:8.1} |{}{}|",
        "#".repeat(cells),
        " ".repeat(METER_WIDTH - cells)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rms_values() {
        assert!(rms(&[]).abs() < f64::EPSILON);
        assert!(rms(&[0; 64]).abs() < f64::EPSILON);
        assert!((rms(&[100, -100, 100, -100]) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_rms_full_scale_does_not_overflow() {
        let loud = vec![i16::MIN; 4096];
        assert!((rms(&loud) - 32768.0).abs() < 1e-6);
    }

    #[test]
    fn test_meter_bar_saturates() {
        let line = meter_line(1e9, 500.0);
        assert!(line.starts_with("SOUND"));
        assert!(line.contains(&"#".repeat(METER_WIDTH)));

        let quiet = meter_line(120.0, 500.0);
        assert!(quiet.starts_with("quiet"));
        assert!(quiet.contains("|##"));
        assert!(!quiet.contains("###"));
    }
}

//! Reduction of raw sample values to an average.

use tracing::warn;

/// Result of averaging a window of samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Average {
    /// Mean of the parsed samples, or `0.0` when none parsed.
    pub value: f64,
    /// Samples included in the mean.
    pub used: usize,
    /// Samples skipped because they were not finite numbers.
    pub skipped: usize,
}

/// Averages raw sample values.
///
/// Values that do not parse as a finite `f64` (including `NaN` and `inf`)
/// are left out of both the mean and the count. With nothing left, the result
/// is `0.0`, never NaN.
pub fn average_samples<I, S>(raw: I) -> Average
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut mean = 0.0_f64;
    let mut used = 0usize;
    let mut skipped = 0usize;

    for sample in raw {
        let sample = sample.as_ref();
        match sample.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => {
                used += 1;
                // Running mean, so large readings cannot overflow to inf.
                mean += (value - mean) / used as f64;
            }
            _ => {
                warn!(sample, "skipping sample that is not a finite number");
                skipped += 1;
            }
        }
    }

    Average {
        value: if mean.is_finite() { mean } else { 0.0 },
        used,
        skipped,
    }
}

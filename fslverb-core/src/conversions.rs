use std::f64::consts::LN_2;

/// Converts a Gaussian full width at half maximum to its standard deviation.
pub fn fwhm_to_sigma(fwhm: f64) -> f64 {
    fwhm / (2.0 * (2.0 * LN_2).sqrt())
}

/// Converts a highpass cutoff frequency (Hz) to the filter's sigma in volumes.
///
/// This is half the cutoff period expressed in repetition times. Returns `None` unless both
/// the cutoff and the repetition time are positive.
pub fn cutoff_to_sigma_volumes(cutoff_hz: f64, repetition_time: f64) -> Option<f64> {
    if cutoff_hz > 0.0 && repetition_time > 0.0 {
        Some(1.0 / (2.0 * cutoff_hz * repetition_time))
    } else {
        None
    }
}

/// SUSAN's brightness threshold from the median in-brain intensity.
pub fn brightness_threshold(median: f64) -> f64 {
    const FRACTION: f64 = 0.75;
    median * FRACTION
}

/// Parses whitespace-separated numbers as printed by `fslstats` and `fslval`.
pub fn parse_values(s: &str) -> Option<Vec<f64>> {
    let values: Vec<f64> = s
        .split_whitespace()
        .map(|t| t.parse().ok())
        .collect::<Option<_>>()?;

    if values.is_empty() { None } else { Some(values) }
}

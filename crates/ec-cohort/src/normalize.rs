//! Per-subject amplitude normalization.
//!
//! Each function receives the records of ONE subject. Invalid amplitudes
//! stay invalid and are ignored when computing the statistics.

use ec_core::score::{Modality, ScoreRecord};
use ec_core::stats::{mean, std_dev};

const T_MEAN: f64 = 50.0;
const T_SD: f64 = 10.0;

fn valid_amplitudes(records: &[ScoreRecord]) -> Vec<f64> {
    records.iter().filter_map(|r| r.amplitude.value()).collect()
}

/// Score T : `50 + 10 * z`, z computed with the population standard deviation.
///
/// A constant column has no spread; every valid value becomes 50.
pub fn t_scores(records: &mut [ScoreRecord]) {
    let Some((mu, sd)) = column_stats(records) else {
        return;
    };
    for record in records.iter_mut() {
        record.amplitude = record.amplitude.map(|a| {
            if sd > 0.0 {
                T_MEAN + T_SD * (a - mu) / sd
            } else {
                T_MEAN
            }
        });
    }
}

/// `ln(1 + a / max(a))`, bounded to `[0, ln 2]` for non-negative amplitudes.
///
/// A subject whose largest valid amplitude is not positive gets 0 everywhere.
pub fn log_ratio(records: &mut [ScoreRecord]) {
    let Some(max) = valid_amplitudes(records).into_iter().reduce(f64::max) else {
        return;
    };
    if max <= 0.0 {
        log::debug!("Amplitude maximale nulle, normalisation à 0");
    }
    for record in records.iter_mut() {
        record.amplitude = record.amplitude.map(|a| {
            if max > 0.0 {
                (a / max).ln_1p()
            } else {
                0.0
            }
        });
    }
}

/// Normalize one subject's amplitudes with the rule of its modality.
///
/// # Example
/// ```
/// use ec_cohort::normalize;
/// use ec_core::score::{Amplitude, Modality, Score, ScoreRecord};
/// let mut records = vec![
///     ScoreRecord::new("A", "direct CS+".into(), 0, Score::valid(2.0, Some(1.0))),
///     ScoreRecord::new("A", "direct CS-".into(), 1, Score::invalid()),
/// ];
/// normalize(Modality::Eda, &mut records);
/// assert_eq!(records[0].amplitude, Amplitude::Valid(1.0_f64.ln_1p()));
/// assert_eq!(records[1].amplitude, Amplitude::Invalid);
/// ```
pub fn normalize(modality: Modality, records: &mut [ScoreRecord]) {
    match modality {
        Modality::Emg => t_scores(records),
        Modality::Eda => log_ratio(records),
    }
}

/// Mean and population SD of the valid amplitudes.
#[must_use]
pub(crate) fn column_stats(records: &[ScoreRecord]) -> Option<(f64, f64)> {
    let values = valid_amplitudes(records);
    Some((mean(&values)?, std_dev(&values)?))
}

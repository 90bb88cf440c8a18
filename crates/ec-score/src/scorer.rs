use ec_core::config::{EdaConfig, EmgConfig};
use ec_core::score::Score;
use ec_core::stats::{argmax, mean};

use crate::error::ScoreError;
use crate::trial::Trial;

/// Politique de score d'un essai.
///
/// # Example
/// ```
/// use ec_core::score::Score;
/// use ec_score::{ResponseScorer, ScoreError, Trial};
///
/// struct Constant;
/// impl ResponseScorer for Constant {
///     fn score(&self, _trial: &Trial) -> Result<Score, ScoreError> {
///         Ok(Score::valid(1.0, None))
///     }
/// }
/// ```
pub trait ResponseScorer {
    /// Score one trial.
    ///
    /// # Errors
    /// Returns a [`ScoreError`] when the requested windows do not fit in the
    /// trial, or when the policy is not supported.
    fn score(&self, trial: &Trial) -> Result<Score, ScoreError>;
}

/// Slow (skin conductance) response: peak minus baseline mean.
///
/// `onset`, `duration` and `baseline` are in seconds from trial start. At
/// onset 0 the baseline comes from the samples stored before the trial;
/// otherwise from the trial signal just before `onset`. Amplitudes not
/// strictly above `threshold` are reported invalid.
#[derive(Clone, Copy, Debug)]
pub struct SlowResponse {
    pub onset: f64,
    pub duration: f64,
    pub baseline: f64,
    pub threshold: f64,
}

impl SlowResponse {
    /// CS window (onset 0) with durations from the configuration.
    #[must_use]
    pub fn cs(config: &EdaConfig) -> Self {
        Self {
            onset: 0.0,
            duration: config.response_seconds,
            baseline: config.baseline_seconds,
            threshold: config.validity_threshold,
        }
    }

    /// US window (onset `us_onset_seconds`).
    #[must_use]
    pub fn us(config: &EdaConfig) -> Self {
        Self {
            onset: config.us_onset_seconds,
            ..Self::cs(config)
        }
    }

    fn baseline_mean(&self, trial: &Trial) -> Result<f64, ScoreError> {
        let window: &[f64] = if self.onset <= 0.0 {
            let n = trial.to_samples(self.baseline);
            let stored = trial.baseline();
            if n > stored.len() {
                return Err(ScoreError::BaselineTooLong {
                    requested: n,
                    available: stored.len(),
                });
            }
            &stored[..n]
        } else {
            if self.onset < self.baseline {
                return Err(ScoreError::BaselineBeforeStart {
                    onset: self.onset,
                    baseline: self.baseline,
                });
            }
            let start = trial.to_samples(self.onset - self.baseline);
            let end = trial.to_samples(self.onset);
            let signal = trial.signal();
            if end > signal.len() {
                return Err(ScoreError::ResponseOutOfBounds {
                    start,
                    end,
                    len: signal.len(),
                });
            }
            &signal[start..end]
        };
        mean(window).ok_or(ScoreError::EmptyWindow("ligne de base"))
    }
}

impl ResponseScorer for SlowResponse {
    fn score(&self, trial: &Trial) -> Result<Score, ScoreError> {
        check_timing(&[self.onset, self.duration, self.baseline])?;
        let baseline = self.baseline_mean(trial)?;
        let response = response_window(trial.signal(), trial, self.onset, self.duration)?;
        let (idx, peak) = argmax(response).ok_or(ScoreError::EmptyWindow("réponse"))?;

        let amplitude = peak - baseline;
        if amplitude > self.threshold {
            Ok(Score::valid(amplitude, Some(self.onset + idx as f64 / trial.fs())))
        } else {
            Ok(Score::invalid())
        }
    }
}

/// Sum of the sudomotor nerve activity over the response window.
///
/// Trials without an SMNA trace score as invalid. There is never a peak time.
#[derive(Clone, Copy, Debug)]
pub struct SmnaSum {
    pub onset: f64,
    pub duration: f64,
}

impl ResponseScorer for SmnaSum {
    fn score(&self, trial: &Trial) -> Result<Score, ScoreError> {
        check_timing(&[self.onset, self.duration])?;
        let Some(smna) = trial.smna() else {
            return Ok(Score::invalid());
        };
        let response = response_window(smna, trial, self.onset, self.duration)?;
        Ok(Score::valid(response.iter().sum(), None))
    }
}

/// Peak-to-peak scoring with a footpoint search limit. Not implemented.
#[derive(Clone, Copy, Debug)]
pub struct PeakToPeak {
    pub onset: f64,
    pub duration: f64,
    pub footpoint_limit: f64,
}

impl ResponseScorer for PeakToPeak {
    fn score(&self, _trial: &Trial) -> Result<Score, ScoreError> {
        Err(ScoreError::Unsupported("peak-to-peak"))
    }
}

/// Fast (startle EMG) response.
///
/// Baseline is the mean of the `baseline_samples` stored before the probe;
/// the response is the maximum of samples `[latency_start, latency_end)`
/// after it. Negative differences are clipped to 0, never invalid.
#[derive(Clone, Copy, Debug)]
pub struct FastResponse {
    pub baseline_samples: usize,
    pub latency_start: usize,
    pub latency_end: usize,
}

impl FastResponse {
    #[must_use]
    pub fn from_config(config: &EmgConfig) -> Self {
        Self {
            baseline_samples: config.baseline_samples,
            latency_start: config.latency_start,
            latency_end: config.latency_end,
        }
    }
}

impl ResponseScorer for FastResponse {
    fn score(&self, trial: &Trial) -> Result<Score, ScoreError> {
        let stored = trial.baseline();
        if self.baseline_samples > stored.len() {
            return Err(ScoreError::BaselineTooLong {
                requested: self.baseline_samples,
                available: stored.len(),
            });
        }
        let baseline =
            mean(&stored[..self.baseline_samples]).ok_or(ScoreError::EmptyWindow("ligne de base"))?;

        let signal = trial.signal();
        if self.latency_end > signal.len() || self.latency_start >= self.latency_end {
            return Err(ScoreError::ResponseOutOfBounds {
                start: self.latency_start,
                end: self.latency_end,
                len: signal.len(),
            });
        }
        let (_, peak) = argmax(&signal[self.latency_start..self.latency_end])
            .ok_or(ScoreError::EmptyWindow("réponse"))?;

        Ok(Score::valid((peak - baseline).max(0.0), None))
    }
}

fn check_timing(values: &[f64]) -> Result<(), ScoreError> {
    if values.iter().all(|v| v.is_finite() && *v >= 0.0) {
        Ok(())
    } else {
        Err(ScoreError::InvalidWindow(format!("{values:?}")))
    }
}

fn response_window<'a>(
    data: &'a [f64],
    trial: &Trial,
    onset: f64,
    duration: f64,
) -> Result<&'a [f64], ScoreError> {
    let start = trial.to_samples(onset);
    let end = trial.to_samples(onset + duration);
    if end > data.len() {
        return Err(ScoreError::ResponseOutOfBounds {
            start,
            end,
            len: data.len(),
        });
    }
    Ok(&data[start..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ec_core::events::Event;
    use ec_core::score::Amplitude;

    const FS: f64 = 25.0;

    /// Flat signal at `level` with `pre` samples before the trial onset.
    fn flat_trial(level: f64, pre: usize, post: usize, spikes: &[(usize, f64)]) -> Trial {
        let mut signal = vec![level; pre + post];
        for &(offset, v) in spikes {
            signal[pre + offset] = v;
        }
        Trial::new(pre, &[Event::new(pre, 1)], post, pre, FS, &signal, None)
    }

    fn slow(onset: f64) -> SlowResponse {
        SlowResponse {
            onset,
            duration: 6.0,
            baseline: 2.0,
            threshold: 0.02,
        }
    }

    #[test]
    fn slow_response_measures_spike_above_baseline() {
        let b = 1.3;
        let trial = flat_trial(b, 50, 475, &[(60, b + 0.05)]);
        let score = trial.score(&slow(0.0)).unwrap();
        let amplitude = score.amplitude.value().unwrap_or_default();
        assert_abs_diff_eq!(amplitude, 0.05, epsilon = 1e-9);
        assert_abs_diff_eq!(score.peak_time.unwrap_or_default(), 60.0 / FS, epsilon = 1e-9);
    }

    #[test]
    fn slow_response_threshold_is_strict() {
        let at = flat_trial(0.0, 50, 475, &[(10, 0.02)]);
        assert_eq!(at.score(&slow(0.0)).unwrap(), Score::invalid());

        let above = flat_trial(1.0, 50, 475, &[(10, 1.021)]);
        let score = above.score(&slow(0.0)).unwrap();
        assert!(score.amplitude.is_valid());

        let below = flat_trial(1.0, 50, 475, &[(10, 1.019)]);
        assert_eq!(below.score(&slow(0.0)).unwrap().amplitude, Amplitude::Invalid);
    }

    #[test]
    fn slow_response_later_onset_uses_trial_signal() {
        // step to 0.5 at 5.5 s, spike at sample 200
        let mut signal = vec![0.0; 600];
        for v in &mut signal[137..] {
            *v = 0.5;
        }
        signal[200] = 0.9;
        let trial = Trial::new(0, &[Event::new(0, 1)], 600, 0, FS, &signal, None);
        let score = trial.score(&slow(7.5)).unwrap();
        // baseline window [5.5 s, 7.5 s) = samples 137..187, all 0.5
        assert_abs_diff_eq!(score.amplitude.value().unwrap_or_default(), 0.4, epsilon = 1e-9);
        assert_abs_diff_eq!(score.peak_time.unwrap_or_default(), 7.5 + 13.0 / FS, epsilon = 1e-9);
    }

    #[test]
    fn slow_response_boundary_errors() {
        let short_history = flat_trial(1.0, 10, 475, &[]);
        assert!(matches!(
            short_history.score(&slow(0.0)),
            Err(ScoreError::BaselineTooLong { requested: 50, available: 10 })
        ));

        assert!(matches!(
            short_history.score(&slow(1.0)),
            Err(ScoreError::BaselineBeforeStart { .. })
        ));

        let short_trial = flat_trial(1.0, 50, 100, &[]);
        assert!(matches!(
            short_trial.score(&slow(0.0)),
            Err(ScoreError::ResponseOutOfBounds { end: 150, len: 100, .. })
        ));

        assert!(matches!(
            short_trial.score(&slow(-1.0)),
            Err(ScoreError::InvalidWindow(_))
        ));
    }

    #[test]
    fn smna_sum_without_trace_is_unavailable() {
        let trial = flat_trial(1.0, 50, 475, &[]);
        let policy = SmnaSum {
            onset: 0.0,
            duration: 6.0,
        };
        assert_eq!(trial.score(&policy).unwrap(), Score::invalid());
    }

    #[test]
    fn smna_sum_adds_the_window() {
        let signal = vec![0.0; 300];
        let smna = vec![0.1; 300];
        let trial = Trial::new(0, &[Event::new(0, 1)], 300, 0, FS, &signal, Some(&smna));
        let policy = SmnaSum {
            onset: 1.0,
            duration: 2.0,
        };
        let score = trial.score(&policy).unwrap();
        assert_abs_diff_eq!(score.amplitude.value().unwrap_or_default(), 5.0, epsilon = 1e-9);
        assert!(score.peak_time.is_none());
    }

    #[test]
    fn peak_to_peak_is_unsupported() {
        let trial = flat_trial(1.0, 50, 475, &[]);
        let policy = PeakToPeak {
            onset: 0.0,
            duration: 6.0,
            footpoint_limit: 1.0,
        };
        assert!(matches!(trial.score(&policy), Err(ScoreError::Unsupported(_))));
    }

    fn fast() -> FastResponse {
        FastResponse {
            baseline_samples: 100,
            latency_start: 40,
            latency_end: 240,
        }
    }

    #[test]
    fn fast_response_peak_in_latency_window() {
        let mut signal = vec![0.02; 600];
        signal[100 + 30] = 5.0; // stimulus artefact, outside the window
        signal[100 + 80] = 0.12;
        let trial = Trial::new(100, &[Event::new(100, 5)], 240, 100, 2000.0, &signal, None);
        let score = trial.score(&fast()).unwrap();
        assert_abs_diff_eq!(score.amplitude.value().unwrap_or_default(), 0.10, epsilon = 1e-9);
        assert!(score.peak_time.is_none());
    }

    #[test]
    fn fast_response_never_negative() {
        let mut signal = vec![0.0; 600];
        signal[..100].fill(0.5);
        let trial = Trial::new(100, &[Event::new(100, 5)], 240, 100, 2000.0, &signal, None);
        let score = trial.score(&fast()).unwrap();
        assert_eq!(score.amplitude, Amplitude::Valid(0.0));
    }

    #[test]
    fn fast_response_boundary_errors() {
        let signal = vec![0.0; 300];
        let early = Trial::new(50, &[Event::new(50, 5)], 240, 100, 2000.0, &signal, None);
        assert!(matches!(
            early.score(&fast()),
            Err(ScoreError::BaselineTooLong { requested: 100, available: 50 })
        ));
        let late = Trial::new(150, &[Event::new(150, 5)], 240, 100, 2000.0, &signal, None);
        assert!(matches!(
            late.score(&fast()),
            Err(ScoreError::ResponseOutOfBounds { len: 150, .. })
        ));
    }
}

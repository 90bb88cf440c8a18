use ec_core::events::Event;
use ec_core::score::Score;

use crate::error::ScoreError;
use crate::scorer::{ResponseScorer, SmnaSum};

/// Un essai : fenêtre de signal alignée sur un onset.
///
/// Holds the samples `[onset, onset + window)` of the primary signal (and
/// of the optional SMNA trace), the `baseline` samples preceding the onset
/// in reverse order (`baseline[0]` is the sample just before the onset),
/// and the events of the window re-indexed so the onset is sample 0.
/// Windows are clipped to the available signal; scorers check the bounds
/// they need.
///
/// The baseline is `[onset - baseline, onset)`: the onset sample belongs to
/// the response window only. Older analyses took `[onset - baseline, onset]`
/// and so sit one sample later; the fast policy needs a baseline that ends
/// strictly before the probe.
#[derive(Clone, Debug)]
pub struct Trial {
    signal: Vec<f64>,
    smna: Option<Vec<f64>>,
    baseline: Vec<f64>,
    events: Vec<Event>,
    fs: f64,
}

impl Trial {
    /// Cut a trial out of `signal`.
    ///
    /// `events` are global-sample events inside the window; they are copied
    /// and shifted by `-onset`.
    ///
    /// # Example
    /// ```
    /// use ec_core::events::Event;
    /// use ec_score::Trial;
    /// let signal: Vec<f64> = (0..10).map(f64::from).collect();
    /// let trial = Trial::new(4, &[Event::new(4, 1), Event::new(6, 8)], 3, 2, 1.0, &signal, None);
    /// assert_eq!(trial.signal(), &[4.0, 5.0, 6.0]);
    /// assert_eq!(trial.baseline(), &[3.0, 2.0]);
    /// assert_eq!(trial.events()[1].sample, 2);
    /// ```
    #[must_use]
    pub fn new(
        onset: usize,
        events: &[Event],
        window: usize,
        baseline: usize,
        fs: f64,
        signal: &[f64],
        smna: Option<&[f64]>,
    ) -> Self {
        let window_of = |s: &[f64]| {
            let start = onset.min(s.len());
            let end = onset.saturating_add(window).min(s.len());
            s[start..end].to_vec()
        };

        let bl_start = onset.saturating_sub(baseline).min(signal.len());
        let bl_end = onset.min(signal.len());
        let baseline = signal[bl_start..bl_end].iter().rev().copied().collect();

        let events = events
            .iter()
            .map(|e| Event::new(e.sample.saturating_sub(onset), e.code))
            .collect();

        Self {
            signal: window_of(signal),
            smna: smna.map(window_of),
            baseline,
            events,
            fs,
        }
    }

    #[must_use]
    pub fn signal(&self) -> &[f64] {
        &self.signal
    }

    #[must_use]
    pub fn smna(&self) -> Option<&[f64]> {
        self.smna.as_deref()
    }

    /// Pre-onset samples, most recent first.
    #[must_use]
    pub fn baseline(&self) -> &[f64] {
        &self.baseline
    }

    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    #[must_use]
    pub fn fs(&self) -> f64 {
        self.fs
    }

    /// Whether any event of the trial carries `code`.
    #[must_use]
    pub fn contains_code(&self, code: u8) -> bool {
        self.events.iter().any(|e| e.code == code)
    }

    /// Convert seconds from trial start to a sample index (truncating).
    #[must_use]
    pub fn to_samples(&self, seconds: f64) -> usize {
        (seconds * self.fs) as usize
    }

    /// Apply a scoring policy.
    ///
    /// # Errors
    /// Propagates the policy's boundary errors.
    pub fn score(&self, scorer: &impl ResponseScorer) -> Result<Score, ScoreError> {
        scorer.score(self)
    }

    /// Sum of the SMNA trace over `[onset, onset + duration)` seconds.
    ///
    /// # Errors
    /// Fails if the window leaves the trial; a trial without SMNA scores
    /// as invalid instead.
    pub fn score_smna(&self, onset: f64, duration: f64) -> Result<Score, ScoreError> {
        self.score(&SmnaSum { onset, duration })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    #[test]
    fn baseline_is_reversed_and_clipped() {
        let signal = ramp(20);
        let trial = Trial::new(3, &[Event::new(3, 1)], 5, 5, 1.0, &signal, None);
        assert_eq!(trial.baseline(), &[2.0, 1.0, 0.0]);

        // onset sample only in the response window
        let trial = Trial::new(10, &[], 4, 3, 1.0, &signal, None);
        assert_eq!(trial.baseline(), &[9.0, 8.0, 7.0]);
        assert_eq!(trial.signal()[0], 10.0);
        assert!(!trial.baseline().contains(&10.0));

        let trial = Trial::new(0, &[Event::new(0, 1)], 5, 5, 1.0, &signal, None);
        assert!(trial.baseline().is_empty());
    }

    #[test]
    fn window_is_clipped_at_signal_end() {
        let signal = ramp(10);
        let trial = Trial::new(8, &[Event::new(8, 2)], 5, 2, 1.0, &signal, Some(&signal));
        assert_eq!(trial.signal(), &[8.0, 9.0]);
        assert_eq!(trial.smna(), Some(&[8.0, 9.0][..]));

        let past = Trial::new(12, &[Event::new(12, 2)], 5, 2, 1.0, &signal, None);
        assert!(past.signal().is_empty());
        assert_eq!(past.baseline(), &[9.0, 8.0]);
    }

    #[test]
    fn events_are_local_copies() {
        let signal = ramp(100);
        let events = [Event::new(40, 1), Event::new(55, 4), Event::new(70, 8)];
        let trial = Trial::new(40, &events, 50, 10, 25.0, &signal, None);
        let local: Vec<usize> = trial.events().iter().map(|e| e.sample).collect();
        assert_eq!(local, vec![0, 15, 30]);
        assert_eq!(events[1].sample, 55);
        assert!(trial.contains_code(8));
        assert!(!trial.contains_code(2));
        assert_eq!(trial.to_samples(0.5), 12);
    }

    #[test]
    fn smna_shortcut() {
        let signal = ramp(100);
        let smna = vec![0.5; 100];
        let trial = Trial::new(10, &[], 20, 5, 10.0, &signal, Some(&smna));
        let score = trial.score_smna(0.0, 1.0).unwrap();
        assert_eq!(score.amplitude.value(), Some(5.0));
        assert_eq!(score.peak_time, None);

        let bare = Trial::new(10, &[], 20, 5, 10.0, &signal, None);
        assert!(!bare.score_smna(0.0, 1.0).unwrap().amplitude.is_valid());
    }
}

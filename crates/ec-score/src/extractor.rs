use ec_core::config::EdaConfig;
use ec_core::events::EventStream;

use crate::trial::Trial;

/// Découpe un signal continu en essais alignés sur les onsets.
///
/// Onsets are the sorted union of the samples carrying any of
/// `onset_codes`. Each trial spans `window` samples from its onset and
/// keeps `baseline` samples of history.
///
/// # Example
/// ```
/// use ec_core::events::{Event, EventStream};
/// use ec_score::TrialExtractor;
///
/// let events = EventStream::from(vec![Event::new(0, 13), Event::new(60, 2), Event::new(20, 1)]);
/// let signal = vec![0.0; 100];
/// let extractor = TrialExtractor::new(30, 10, 25.0, vec![1, 2]);
/// let trials = extractor.extract(&signal, None, &events);
/// assert_eq!(trials.len(), 2);
/// assert_eq!(trials[0].events()[0].code, 1);
/// ```
#[derive(Clone, Debug)]
pub struct TrialExtractor {
    window: usize,
    baseline: usize,
    fs: f64,
    onset_codes: Vec<u8>,
}

impl TrialExtractor {
    #[must_use]
    pub fn new(window: usize, baseline: usize, fs: f64, onset_codes: Vec<u8>) -> Self {
        Self {
            window,
            baseline,
            fs,
            onset_codes,
        }
    }

    /// CS-aligned trials for skin conductance.
    #[must_use]
    pub fn for_eda(config: &EdaConfig) -> Self {
        Self::new(
            config.trial_samples(),
            config.baseline_samples(),
            config.fs,
            vec![config.cs_plus_code, config.cs_minus_code],
        )
    }

    /// Sorted onset samples.
    #[must_use]
    pub fn onsets(&self, events: &EventStream) -> Vec<usize> {
        let mut onsets: Vec<usize> = self
            .onset_codes
            .iter()
            .flat_map(|&c| events.samples_for_code(c))
            .collect();
        onsets.sort_unstable();
        onsets
    }

    /// One trial per onset, in onset order.
    #[must_use]
    pub fn extract(&self, signal: &[f64], smna: Option<&[f64]>, events: &EventStream) -> Vec<Trial> {
        self.onsets(events)
            .into_iter()
            .map(|onset| {
                let window_events =
                    events.events_between_samples(onset, onset.saturating_add(self.window));
                Trial::new(
                    onset,
                    &window_events,
                    self.window,
                    self.baseline,
                    self.fs,
                    signal,
                    smna,
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ec_core::events::Event;

    fn phase_events() -> EventStream {
        EventStream::from(vec![
            Event::new(0, 13),
            Event::new(100, 2),
            Event::new(150, 8),
            Event::new(300, 1),
            Event::new(320, 5),
            Event::new(500, 1),
        ])
    }

    #[test]
    fn onsets_are_sorted_union() {
        let ex = TrialExtractor::new(150, 50, 25.0, vec![1, 2]);
        assert_eq!(ex.onsets(&phase_events()), vec![100, 300, 500]);
    }

    #[test]
    fn trials_carry_their_window_events() {
        let signal: Vec<f64> = (0..700).map(f64::from).collect();
        let ex = TrialExtractor::new(150, 50, 25.0, vec![1, 2]);
        let trials = ex.extract(&signal, None, &phase_events());
        assert_eq!(trials.len(), 3);

        let codes: Vec<u8> = trials[0].events().iter().map(|e| e.code).collect();
        assert_eq!(codes, vec![2, 8]);
        assert_eq!(trials[0].events()[1].sample, 50);
        assert_eq!(trials[0].signal()[0], 100.0);
        assert_eq!(trials[0].baseline()[0], 99.0);
        assert_eq!(trials[0].baseline().len(), 50);

        assert!(trials[1].contains_code(5));
        assert_eq!(trials[2].signal().len(), 150);
    }

    #[test]
    fn eda_extractor_uses_config_windows() {
        let config = EdaConfig::default();
        let ex = TrialExtractor::for_eda(&config);
        assert_eq!(ex.window, 475);
        assert_eq!(ex.baseline, 50);
        assert_eq!(ex.onset_codes, vec![1, 2]);
    }
}

//! Skin conductance: per-phase decomposition, tonic levels and CS / US scoring.

use ec_core::config::{EdaConfig, PhaseConfig};
use ec_core::decomposition::Decomposer;
use ec_core::events::EventStream;
use ec_core::score::{Score, ScoreRecord};
use ec_core::CoreError;

use crate::error::ScoreError;
use crate::extractor::TrialExtractor;
use crate::phase::extract_phase;
use crate::scl::scl_levels;
use crate::scorer::{ResponseScorer, SlowResponse};
use crate::trial::Trial;

/// Tonic levels and CS trials of one phase.
#[derive(Clone, Debug)]
pub struct PhaseOutcome {
    pub name: String,
    pub levels: Vec<f64>,
    /// Empty for phases that are not scored.
    pub trials: Vec<Trial>,
}

/// Everything the EDA stage produces for one subject.
#[derive(Clone, Debug, Default)]
pub struct EdaSubject {
    /// Tonic levels of every phase, concatenated in configuration order.
    pub levels: Vec<f64>,
    pub records: Vec<ScoreRecord>,
}

/// Découpe une phase, la décompose et extrait ses essais.
///
/// Trials are cut from the phasic component, with the SMNA trace attached
/// when the decomposer provides one.
///
/// # Errors
/// Fails if the phase markers are missing or the decomposition fails.
pub fn process_phase(
    signal: &[f64],
    events: &EventStream,
    phase: &PhaseConfig,
    config: &EdaConfig,
    decomposer: &dyn Decomposer,
) -> Result<PhaseOutcome, ScoreError> {
    let cut = extract_phase(signal, events, phase.start_code, phase.stop_code)?;
    let components = decomposer.decompose(&cut.signal, 1.0 / config.fs)?;
    let levels = scl_levels(&components.tonic, phase.scl_blocks);

    let trials = if phase.scored {
        TrialExtractor::for_eda(config).extract(
            &components.phasic,
            components.smna.as_deref(),
            &cut.events,
        )
    } else {
        Vec::new()
    };
    log::debug!(
        "Phase {} : {} échantillons, {} essais",
        phase.name,
        cut.signal.len(),
        trials.len()
    );

    Ok(PhaseOutcome {
        name: phase.name.clone(),
        levels,
        trials,
    })
}

/// Score one window; a response window cut short by the end of the phase
/// gives an invalid record instead of failing the subject.
fn score_window(
    trial: &Trial,
    policy: &impl ResponseScorer,
    code: &str,
    label: &str,
    n: usize,
) -> Result<Score, ScoreError> {
    match trial.score(policy) {
        Err(ScoreError::ResponseOutOfBounds { start, end, len }) => {
            log::warn!(
                "{code} {label} #{n} : fenêtre [{start}, {end}) au-delà de l'essai ({len} échantillons), réponse invalide"
            );
            Ok(Score::invalid())
        }
        other => other,
    }
}

/// Score the CS window of every trial, plus the US window of observational
/// CS+ trials that carry no startle probe.
///
/// Labels are `"<phase> CS+"` / `"<phase> CS-"` and `"<phase> US present"` /
/// `"<phase> US absent"`; the trial index is the position of the trial in
/// the phase. A window running past the end of the phase is recorded as
/// invalid.
///
/// # Errors
/// Propagates the other boundary errors of the slow-response policy.
pub fn score_trials(
    code: &str,
    trials: &[Trial],
    phase_name: &str,
    config: &EdaConfig,
) -> Result<Vec<ScoreRecord>, ScoreError> {
    let cs_policy = SlowResponse::cs(config);
    let us_policy = SlowResponse::us(config);
    let mut records = Vec::with_capacity(trials.len());

    for (n, trial) in trials.iter().enumerate() {
        let is_plus = trial.contains_code(config.cs_plus_code);
        let label = format!("{phase_name} {}", if is_plus { "CS+" } else { "CS-" });
        let score = score_window(trial, &cs_policy, code, &label, n)?;
        records.push(ScoreRecord::new(code, label, n, score));

        let probed = config.startle_codes.iter().any(|&c| trial.contains_code(c));
        if phase_name == config.observation_phase && is_plus && !probed {
            let stimulus = if trial.contains_code(config.us_code) {
                "US present"
            } else {
                "US absent"
            };
            let label = format!("{phase_name} {stimulus}");
            let score = score_window(trial, &us_policy, code, &label, n)?;
            records.push(ScoreRecord::new(code, label, n, score));
        }
    }
    Ok(records)
}

/// Run every configured phase for one subject.
///
/// `events` are at the acquisition rate and are downsampled by
/// `event_downsample` first. `decomposer_for` supplies the decomposer of
/// each phase.
///
/// # Errors
/// The first phase error aborts the subject.
pub fn score_subject<F>(
    code: &str,
    signal: &[f64],
    events: &EventStream,
    config: &EdaConfig,
    mut decomposer_for: F,
) -> Result<EdaSubject, ScoreError>
where
    F: FnMut(&PhaseConfig) -> Result<Box<dyn Decomposer>, CoreError>,
{
    let events = events.downsampled(config.event_downsample)?;
    let mut subject = EdaSubject::default();

    for phase in &config.phases {
        let decomposer = decomposer_for(phase)?;
        let outcome = process_phase(signal, &events, phase, config, decomposer.as_ref())?;
        subject.levels.extend_from_slice(&outcome.levels);
        if phase.scored {
            subject
                .records
                .extend(score_trials(code, &outcome.trials, &outcome.name, config)?);
        }
    }

    let valid = subject.records.iter().filter(|r| r.amplitude.is_valid()).count();
    log::info!(
        "{code} : {} réponses EDA, {valid} au-dessus du seuil",
        subject.records.len()
    );
    Ok(subject)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ec_core::decomposition::RawSignal;
    use ec_core::events::Event;
    use ec_core::score::Amplitude;

    const FS: f64 = 25.0;

    /// Observational phase at 25 Hz starting at sample 100: a CS- with a
    /// response, a probed CS+, and a CS+ followed by the US.
    fn session() -> (Vec<f64>, EventStream) {
        let mut signal = vec![1.0; 2500];
        // CS- response 40 samples after onset
        signal[240] = 1.3;
        // US response 8.5 s after the reinforced CS+ onset
        signal[1400 + 212] = 1.5;
        let events = EventStream::from(vec![
            Event::new(100, 13),
            Event::new(200, 2),
            Event::new(800, 1),
            Event::new(850, 5),
            Event::new(1400, 1),
            Event::new(1590, 8),
            Event::new(2100, 14),
        ]);
        (signal, events)
    }

    fn obs_phase() -> PhaseConfig {
        PhaseConfig {
            name: "obs".into(),
            start_code: 13,
            stop_code: 14,
            scl_blocks: 2,
            scored: true,
        }
    }

    #[test]
    fn observational_phase_scores_cs_and_us() {
        let (signal, events) = session();
        let config = EdaConfig::default();
        let outcome = process_phase(&signal, &events, &obs_phase(), &config, &RawSignal).unwrap();
        assert_eq!(outcome.trials.len(), 3);
        assert_eq!(outcome.levels.len(), 2);

        let records = score_trials("ABC", &outcome.trials, "obs", &config).unwrap();
        let labels: Vec<&str> = records.iter().map(|r| r.stimulus.as_str()).collect();
        assert_eq!(
            labels,
            vec!["obs CS-", "obs CS+", "obs CS+", "obs US present"]
        );
        assert_eq!(records[3].trial, 2);

        assert_abs_diff_eq!(records[0].amplitude.value().unwrap_or_default(), 0.3, epsilon = 1e-9);
        assert_abs_diff_eq!(records[0].peak_time.unwrap_or_default(), 40.0 / FS, epsilon = 1e-9);
        assert_eq!(records[1].amplitude, Amplitude::Invalid);
        assert_abs_diff_eq!(records[3].amplitude.value().unwrap_or_default(), 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(records[3].peak_time.unwrap_or_default(), 8.5, epsilon = 1e-9);
    }

    #[test]
    fn window_past_phase_end_is_invalid_not_fatal() {
        let mut signal = vec![1.0; 2000];
        signal[240] = 1.3;
        // the last CS+ leaves 300 samples before the stop marker
        let events = EventStream::from(vec![
            Event::new(100, 13),
            Event::new(200, 2),
            Event::new(1400, 1),
            Event::new(1700, 14),
        ]);
        let config = EdaConfig {
            event_downsample: 1.0,
            phases: vec![obs_phase()],
            ..EdaConfig::default()
        };
        let subject =
            score_subject("ABC", &signal, &events, &config, |_| Ok(Box::new(RawSignal))).unwrap();
        let labels: Vec<&str> = subject.records.iter().map(|r| r.stimulus.as_str()).collect();
        assert_eq!(labels, vec!["obs CS-", "obs CS+", "obs US absent"]);
        assert_abs_diff_eq!(
            subject.records[0].amplitude.value().unwrap_or_default(),
            0.3,
            epsilon = 1e-9
        );
        assert_eq!(subject.records[2].amplitude, Amplitude::Invalid);
        assert_eq!(subject.records[2].peak_time, None);
    }

    #[test]
    fn direct_phase_never_scores_us() {
        let (signal, events) = session();
        let config = EdaConfig::default();
        let outcome = process_phase(&signal, &events, &obs_phase(), &config, &RawSignal).unwrap();
        let records = score_trials("ABC", &outcome.trials, "direct", &config).unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.stimulus.starts_with("direct CS")));
    }

    #[test]
    fn unscored_phase_only_gives_levels() {
        let (signal, events) = session();
        let config = EdaConfig::default();
        let phase = PhaseConfig {
            scored: false,
            ..obs_phase()
        };
        let outcome = process_phase(&signal, &events, &phase, &config, &RawSignal).unwrap();
        assert!(outcome.trials.is_empty());
        assert_eq!(outcome.levels.len(), 2);
    }

    #[test]
    fn subject_downsamples_events_and_concatenates_levels() {
        let (signal, events) = session();
        // same markers at 10x the analysis rate
        let fast_events = EventStream::from(
            events
                .iter()
                .map(|e| Event::new(e.sample * 10, e.code))
                .collect::<Vec<_>>(),
        );
        let config = EdaConfig {
            event_downsample: 10.0,
            phases: vec![obs_phase()],
            ..EdaConfig::default()
        };
        let subject =
            score_subject("ABC", &signal, &fast_events, &config, |_| Ok(Box::new(RawSignal))).unwrap();
        assert_eq!(subject.levels.len(), 2);
        assert_eq!(subject.records.len(), 4);
        assert!(subject.records.iter().all(|r| r.code == "ABC"));
    }

    #[test]
    fn missing_phase_aborts_subject() {
        let (signal, events) = session();
        let config = EdaConfig {
            event_downsample: 1.0,
            ..EdaConfig::default()
        };
        // default config starts with the rest phase (11 -> 12), absent here
        let err = score_subject("ABC", &signal, &events, &config, |_| Ok(Box::new(RawSignal)))
            .unwrap_err();
        assert!(matches!(err, ScoreError::Core(CoreError::MissingMarker { code: 11 })));
    }
}

//! Startle EMG: probe-locked trials scored with the fast-response policy.

use ec_core::config::{EmgConfig, PhaseConfig};
use ec_core::events::EventStream;
use ec_core::score::ScoreRecord;

use crate::error::ScoreError;
use crate::scorer::FastResponse;
use crate::trial::Trial;

/// Kind of startle probe, by marker code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Probe {
    Fix,
    CsPlus,
    CsMinus,
}

impl Probe {
    fn from_code(code: u8, config: &EmgConfig) -> Option<Self> {
        if code == config.cs_plus_code {
            Some(Self::CsPlus)
        } else if code == config.cs_minus_code {
            Some(Self::CsMinus)
        } else if code == config.fix_code {
            Some(Self::Fix)
        } else {
            None
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Fix => "fix",
            Self::CsPlus => "CS+",
            Self::CsMinus => "CS-",
        }
    }
}

/// Score every startle probe of one phase.
///
/// `signal` is the whole preprocessed (rectified, smoothed) recording and
/// `events` the whole session at the same rate. Each probe kind keeps its
/// own 1-based trial counter.
///
/// # Errors
/// A probe too close to either end of the recording aborts the phase.
pub fn score_phase(
    code: &str,
    signal: &[f64],
    events: &EventStream,
    phase: &PhaseConfig,
    config: &EmgConfig,
) -> Result<Vec<ScoreRecord>, ScoreError> {
    let policy = FastResponse::from_config(config);
    let mut counters = [0usize; 3];
    let mut records = Vec::new();

    for event in events.events_between_codes(phase.start_code, phase.stop_code) {
        let Some(probe) = Probe::from_code(event.code, config) else {
            continue;
        };
        let counter = &mut counters[probe as usize];
        *counter += 1;

        let window = events.events_between_samples(event.sample, event.sample + config.latency_end);
        let trial = Trial::new(
            event.sample,
            &window,
            config.latency_end,
            config.baseline_samples,
            config.fs,
            signal,
            None,
        );
        let score = trial.score(&policy)?;
        log::debug!("{code} {} #{counter} : {:?}", probe.label(), score.amplitude);
        records.push(ScoreRecord::new(
            code,
            format!("{} {}", phase.name, probe.label()),
            *counter,
            score,
        ));
    }
    Ok(records)
}

/// Score every configured phase for one subject.
///
/// # Errors
/// The first phase error aborts the subject.
pub fn score_subject(
    code: &str,
    signal: &[f64],
    events: &EventStream,
    config: &EmgConfig,
) -> Result<Vec<ScoreRecord>, ScoreError> {
    let mut records = Vec::new();
    for phase in &config.phases {
        records.extend(score_phase(code, signal, events, phase, config)?);
    }
    log::info!("{code} : {} sursauts EMG", records.len());
    Ok(records)
}

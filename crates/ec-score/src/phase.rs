use ec_core::CoreError;
use ec_core::events::EventStream;

use crate::error::ScoreError;

/// Signal et événements d'une phase expérimentale.
///
/// Both are re-indexed so the phase start marker is sample 0.
#[derive(Clone, Debug)]
pub struct Phase {
    pub signal: Vec<f64>,
    pub events: EventStream,
}

/// Cut the phase delimited by the first `start_code` and the first
/// `stop_code` out of a whole-session recording.
///
/// # Errors
/// Returns [`CoreError::MissingMarker`] if either code is absent, and
/// [`ScoreError::EmptyPhase`] if the stop marker does not follow the start.
///
/// # Example
/// ```
/// use ec_core::events::{Event, EventStream};
/// use ec_score::extract_phase;
///
/// let events = EventStream::from(vec![Event::new(2, 13), Event::new(4, 1), Event::new(7, 14)]);
/// let signal: Vec<f64> = (0..10).map(f64::from).collect();
/// let phase = extract_phase(&signal, &events, 13, 14).unwrap();
/// assert_eq!(phase.signal, vec![2.0, 3.0, 4.0, 5.0, 6.0]);
/// assert_eq!(phase.events.samples_for_code(1), vec![2]);
/// ```
pub fn extract_phase(
    signal: &[f64],
    events: &EventStream,
    start_code: u8,
    stop_code: u8,
) -> Result<Phase, ScoreError> {
    let start = events
        .first_sample_for_code(start_code)
        .ok_or(CoreError::MissingMarker { code: start_code })?;
    let stop = events
        .first_sample_for_code(stop_code)
        .ok_or(CoreError::MissingMarker { code: stop_code })?;
    if stop <= start {
        return Err(ScoreError::EmptyPhase { start, stop });
    }

    let end = stop.min(signal.len());
    if end < stop {
        log::warn!(
            "Phase {start_code}→{stop_code} tronquée : signal de {} échantillons, fin à {stop}",
            signal.len()
        );
    }
    let signal = signal.get(start..end).map(<[f64]>::to_vec).unwrap_or_default();
    let events = EventStream::from_slice(&events.events_between_codes(start_code, stop_code), true);

    Ok(Phase { signal, events })
}

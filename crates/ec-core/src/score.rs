use std::fmt;

use serde::{Deserialize, Serialize};

/// Recorded physiological channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    /// Skin conductance (slow responses).
    Eda,
    /// Startle blink EMG (fast responses).
    Emg,
}

impl Modality {
    /// Directory / file stem used for this modality.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eda => "eda",
            Self::Emg => "emg",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Amplitude d'une réponse : valeur mesurée ou rejetée.
///
/// # Example
/// ```
/// use ec_core::score::Amplitude;
/// assert_eq!(Amplitude::Valid(0.3).value(), Some(0.3));
/// assert_eq!(Amplitude::Invalid.value(), None);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
pub enum Amplitude {
    /// Scorable response.
    Valid(f64),
    /// Below threshold, or not scorable.
    #[default]
    Invalid,
}

impl Amplitude {
    #[must_use]
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Valid(v) => Some(v),
            Self::Invalid => None,
        }
    }

    #[must_use]
    pub fn is_valid(self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Transform a valid value, keep `Invalid` as is.
    #[must_use]
    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            Self::Valid(v) => Self::Valid(f(v)),
            Self::Invalid => Self::Invalid,
        }
    }
}

/// Output of one scoring call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Score {
    pub amplitude: Amplitude,
    /// Seconds from trial start. `None` when the policy has no peak.
    pub peak_time: Option<f64>,
}

impl Score {
    /// Rejected response: invalid amplitude, no peak time.
    #[must_use]
    pub fn invalid() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn valid(amplitude: f64, peak_time: Option<f64>) -> Self {
        Self {
            amplitude: Amplitude::Valid(amplitude),
            peak_time,
        }
    }
}

/// One row of a score table.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ScoreRecord {
    /// Subject identifier.
    pub code: String,
    /// Stimulus label, e.g. `"obs CS+"`.
    pub stimulus: String,
    /// Trial index within the stimulus type.
    pub trial: usize,
    pub amplitude: Amplitude,
    pub peak_time: Option<f64>,
}

impl ScoreRecord {
    #[must_use]
    pub fn new(code: &str, stimulus: String, trial: usize, score: Score) -> Self {
        Self {
            code: code.to_owned(),
            stimulus,
            trial,
            amplitude: score.amplitude,
            peak_time: score.peak_time,
        }
    }
}

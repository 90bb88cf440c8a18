//! Per-subject inclusion rules.

use ec_core::config::CohortConfig;
use ec_core::score::{Modality, ScoreRecord};

/// Outcome of the inclusion check for one subject and one modality.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Retained,
    /// Subject left out of the cohort, with the reason.
    Excluded(String),
}

impl Verdict {
    #[must_use]
    pub fn is_retained(&self) -> bool {
        matches!(self, Self::Retained)
    }
}

/// EMG trials whose amplitude exceeds the reaction threshold.
#[must_use]
pub fn emg_reactions(records: &[ScoreRecord], threshold: f64) -> usize {
    records
        .iter()
        .filter(|r| r.amplitude.value().is_some_and(|a| a > threshold))
        .count()
}

/// Valid EDA responses in the direct phase.
#[must_use]
pub fn eda_direct_responses(records: &[ScoreRecord], prefix: &str) -> usize {
    records
        .iter()
        .filter(|r| r.stimulus.starts_with(prefix) && r.amplitude.is_valid())
        .count()
}

/// Décide si un sujet entre dans la cohorte.
///
/// The manual list is checked first; otherwise the subject needs enough
/// scorable responses for the modality. Exclusions are logged at `warn`.
///
/// # Example
/// ```
/// use ec_cohort::{Verdict, verdict};
/// use ec_core::config::CohortConfig;
/// use ec_core::score::Modality;
/// let v = verdict(Modality::Emg, "ABCDEF", &[], &CohortConfig::default());
/// assert!(matches!(v, Verdict::Excluded(_)));
/// ```
#[must_use]
pub fn verdict(
    modality: Modality,
    code: &str,
    records: &[ScoreRecord],
    cohort: &CohortConfig,
) -> Verdict {
    let outcome = if let Some(reason) = cohort.manual_exclusion(code, modality) {
        Verdict::Excluded(reason.to_owned())
    } else {
        match modality {
            Modality::Emg => {
                let n = emg_reactions(records, cohort.emg_reaction_threshold);
                if n < cohort.emg_min_reactions {
                    Verdict::Excluded(format!(
                        "{n} réactions > {} (minimum {})",
                        cohort.emg_reaction_threshold, cohort.emg_min_reactions
                    ))
                } else {
                    Verdict::Retained
                }
            }
            Modality::Eda => {
                let n = eda_direct_responses(records, &cohort.direct_prefix);
                if n < cohort.eda_min_direct {
                    Verdict::Excluded(format!(
                        "{n} réponses {} valides (minimum {})",
                        cohort.direct_prefix, cohort.eda_min_direct
                    ))
                } else {
                    Verdict::Retained
                }
            }
        }
    };

    if let Verdict::Excluded(reason) = &outcome {
        log::warn!("{code} exclu ({modality}) : {reason}");
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use ec_core::config::Exclusion;
    use ec_core::score::Score;

    fn emg_subject(reactions: usize) -> Vec<ScoreRecord> {
        (0..10)
            .map(|i| {
                let a = if i < reactions { 0.5 } else { 0.005 };
                ScoreRecord::new("ABC", "obs CS+".into(), i + 1, Score::valid(a, None))
            })
            .collect()
    }

    fn eda_subject(valid_direct: usize) -> Vec<ScoreRecord> {
        let mut records: Vec<ScoreRecord> = (0..8)
            .map(|i| {
                let score = if i < valid_direct {
                    Score::valid(0.1, Some(1.0))
                } else {
                    Score::invalid()
                };
                ScoreRecord::new("ABC", "direct CS-".into(), i, score)
            })
            .collect();
        // observational responses never count
        records.extend(
            (0..8).map(|i| ScoreRecord::new("ABC", "obs CS+".into(), i, Score::valid(0.3, Some(2.0)))),
        );
        records
    }

    #[test]
    fn emg_boundary() {
        let cohort = CohortConfig::default();
        assert_eq!(verdict(Modality::Emg, "ABC", &emg_subject(6), &cohort), Verdict::Retained);
        assert!(!verdict(Modality::Emg, "ABC", &emg_subject(5), &cohort).is_retained());
    }

    #[test]
    fn emg_threshold_is_strict() {
        let records: Vec<ScoreRecord> = (0..10)
            .map(|i| ScoreRecord::new("ABC", "obs fix".into(), i, Score::valid(0.01, None)))
            .collect();
        assert_eq!(emg_reactions(&records, 0.01), 0);
    }

    #[test]
    fn eda_boundary() {
        let cohort = CohortConfig::default();
        assert_eq!(verdict(Modality::Eda, "ABC", &eda_subject(5), &cohort), Verdict::Retained);
        assert!(!verdict(Modality::Eda, "ABC", &eda_subject(4), &cohort).is_retained());
    }

    #[test]
    fn manual_list_wins() {
        let cohort = CohortConfig {
            exclude: vec![Exclusion {
                code: "ABC".into(),
                modality: Modality::Emg,
                reason: "Bad signal quality (noise)".into(),
            }],
            ..CohortConfig::default()
        };
        assert_eq!(
            verdict(Modality::Emg, "ABC", &emg_subject(10), &cohort),
            Verdict::Excluded("Bad signal quality (noise)".into())
        );
        // other modality unaffected
        assert!(verdict(Modality::Eda, "ABC", &eda_subject(8), &cohort).is_retained());
    }
}

use ec_core::CoreError;
use thiserror::Error;

/// Errors originating from the scoring module.
#[derive(Error, Debug)]
pub enum ScoreError {
    /// The baseline asks for more history than the trial stores.
    #[error("Ligne de base trop longue : {requested} échantillons demandés, {available} disponibles")]
    BaselineTooLong {
        /// Samples requested.
        requested: usize,
        /// Samples stored before the onset.
        available: usize,
    },

    /// The baseline would start before the first sample of the trial.
    #[error("Ligne de base avant le début de l'essai (onset {onset} s, ligne de base {baseline} s)")]
    BaselineBeforeStart {
        /// Scoring onset, seconds.
        onset: f64,
        /// Baseline length, seconds.
        baseline: f64,
    },

    /// The response window runs past the end of the trial.
    #[error("Fenêtre de réponse [{start}, {end}) hors de l'essai ({len} échantillons)")]
    ResponseOutOfBounds {
        /// Window start, samples.
        start: usize,
        /// Window end (exclusive), samples.
        end: usize,
        /// Trial length, samples.
        len: usize,
    },

    /// A window resolved to zero samples.
    #[error("Fenêtre vide : {0}")]
    EmptyWindow(&'static str),

    /// Negative or non-finite timing parameter.
    #[error("Fenêtre invalide : {0}")]
    InvalidWindow(String),

    /// The scoring policy is declared but not implemented.
    #[error("Méthode de score non supportée : {0}")]
    Unsupported(&'static str),

    /// The stop marker of a phase precedes its start marker.
    #[error("Phase vide : début {start}, fin {stop}")]
    EmptyPhase {
        /// Start sample.
        start: usize,
        /// Stop sample.
        stop: usize,
    },

    /// Error bubbled up from the core crate.
    #[error(transparent)]
    Core(#[from] CoreError),
}

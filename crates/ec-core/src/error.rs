use thiserror::Error;

/// Errors originating from the core module.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid configuration value or structure.
    #[error("Configuration invalide : {0}")]
    Config(String),

    /// A line of a persisted event file could not be parsed.
    #[error("Événement illisible ligne {line} : {reason}")]
    EventParse {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        reason: String,
    },

    /// A phase boundary marker is absent from the event stream.
    #[error("Marqueur {code} introuvable dans le flux d'événements")]
    MissingMarker {
        /// The code that was looked up.
        code: u8,
    },

    /// Index outside of the event stream.
    #[error("Index {index} hors limites (longueur {len})")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Stream length.
        len: usize,
    },

    /// A decomposition table does not match the signal it belongs to.
    #[error("Décomposition invalide : {0}")]
    Decomposition(String),
}

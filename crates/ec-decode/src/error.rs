use thiserror::Error;

/// Errors originating from the decode module.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The marker interface has exactly eight lines.
    #[error("{0} canaux numériques fournis, 8 attendus")]
    ChannelCount(usize),

    /// All lines must have the same number of samples.
    #[error("Canal {channel} : {len} échantillons au lieu de {expected}")]
    RaggedChannels {
        /// Offending channel index.
        channel: usize,
        /// Its length.
        len: usize,
        /// Length of channel 0.
        expected: usize,
    },

    /// A row of the channel text file could not be parsed.
    #[error("Ligne {line} illisible : {reason}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        reason: String,
    },
}

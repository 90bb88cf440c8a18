use std::path::Path;

use anyhow::Context;

use crate::error::DecodeError;

/// Number of parallel marker lines.
pub const N_LINES: usize = 8;

/// Binary marker lines, channel-major: `lines[channel][sample]` is 0 or 1.
///
/// # Example
/// ```
/// use ec_decode::channels::DigitalChannels;
/// let lines = vec![vec![0u8, 1, 1]; 8];
/// let ch = DigitalChannels::from_binary(lines).unwrap();
/// assert_eq!(ch.n_samples(), 3);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DigitalChannels {
    lines: Vec<Vec<u8>>,
}

/// Seuillage d'une voie analogique : 1 au-dessus de `threshold`, 0 sinon.
#[must_use]
pub fn binarize(analog: &[f64], threshold: f64) -> Vec<u8> {
    analog.iter().map(|&v| u8::from(v > threshold)).collect()
}

impl DigitalChannels {
    /// Wrap already binary lines. Any non-zero value counts as 1.
    ///
    /// # Errors
    /// Returns [`DecodeError::ChannelCount`] unless there are exactly eight
    /// lines, [`DecodeError::RaggedChannels`] if their lengths differ.
    pub fn from_binary(lines: Vec<Vec<u8>>) -> Result<Self, DecodeError> {
        if lines.len() != N_LINES {
            return Err(DecodeError::ChannelCount(lines.len()));
        }
        let expected = lines[0].len();
        if let Some((channel, l)) = lines.iter().enumerate().find(|(_, l)| l.len() != expected) {
            return Err(DecodeError::RaggedChannels {
                channel,
                len: l.len(),
                expected,
            });
        }
        let lines = lines
            .into_iter()
            .map(|l| l.into_iter().map(|v| u8::from(v != 0)).collect())
            .collect();
        Ok(Self { lines })
    }

    /// Threshold analog lines.
    ///
    /// # Errors
    /// Same shape checks as [`DigitalChannels::from_binary`].
    pub fn from_analog(lines: &[Vec<f64>], threshold: f64) -> Result<Self, DecodeError> {
        Self::from_binary(lines.iter().map(|l| binarize(l, threshold)).collect())
    }

    /// Parse a sample-major text export: one row per sample, eight
    /// whitespace-separated analog values per row.
    ///
    /// # Errors
    /// Returns [`DecodeError::Parse`] on a malformed row.
    pub fn from_text(text: &str, threshold: f64) -> Result<Self, DecodeError> {
        let mut lines: Vec<Vec<u8>> = vec![Vec::new(); N_LINES];
        for (i, row) in text.lines().enumerate() {
            if row.trim().is_empty() {
                continue;
            }
            let values: Vec<f64> = row
                .split_whitespace()
                .map(str::parse::<f64>)
                .collect::<Result<_, _>>()
                .map_err(|e| DecodeError::Parse {
                    line: i + 1,
                    reason: e.to_string(),
                })?;
            if values.len() != N_LINES {
                return Err(DecodeError::Parse {
                    line: i + 1,
                    reason: format!("{} colonnes au lieu de {N_LINES}", values.len()),
                });
            }
            for (line, v) in lines.iter_mut().zip(values) {
                line.push(u8::from(v > threshold));
            }
        }
        Ok(Self { lines })
    }

    /// Charge un export texte des voies numériques.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path, threshold: f64) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Impossible de lire {}", path.display()))?;
        let channels = Self::from_text(&text, threshold)
            .with_context(|| format!("Voies numériques {}", path.display()))?;
        log::debug!(
            "{} échantillons numériques lus depuis {}",
            channels.n_samples(),
            path.display()
        );
        Ok(channels)
    }

    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.lines.first().map_or(0, Vec::len)
    }

    #[must_use]
    pub fn line(&self, channel: usize) -> Option<&[u8]> {
        self.lines.get(channel).map(Vec::as_slice)
    }

    /// Rising edges per line. `edges[c][i] == 1` when line `c` goes 0 → 1
    /// between samples `i` and `i + 1`; each row has `n_samples - 1` entries.
    #[must_use]
    pub fn rising_edges(&self) -> Vec<Vec<u8>> {
        self.lines
            .iter()
            .map(|l| l.windows(2).map(|w| u8::from(w[1] > w[0])).collect())
            .collect()
    }
}

use ec_core::config::DecoderConfig;
use ec_core::events::{Event, EventStream};

use crate::channels::{DigitalChannels, N_LINES};

/// Décode les huit voies numériques parallèles en codes de marqueurs.
///
/// Scanning left to right, the first sample with a rising edge on any line
/// opens a coincidence window of `width` samples. Every line with an edge
/// inside the window sets its bit (line `c` weighs `2^c`) and one event is
/// emitted at the window start. The scan then resumes after the window.
///
/// # Example
/// ```
/// use ec_decode::{DigitalChannels, DigitalEventDecoder};
/// let mut lines = vec![vec![0u8; 20]; 8];
/// lines[0][5..].fill(1);
/// lines[3][7..].fill(1);
/// let channels = DigitalChannels::from_binary(lines).unwrap();
/// let stream = DigitalEventDecoder::new(10).decode(&channels);
/// assert_eq!(stream.len(), 1);
/// assert_eq!(stream.get(0).map(|e| (e.sample, e.code)), Some((4, 9)));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct DigitalEventDecoder {
    width: usize,
}

impl DigitalEventDecoder {
    /// `width` below 1 is raised to 1.
    #[must_use]
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(1),
        }
    }

    #[must_use]
    pub fn from_config(config: &DecoderConfig) -> Self {
        Self::new(config.width)
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Decode all markers. Fewer than two samples yield an empty stream.
    #[must_use]
    pub fn decode(&self, channels: &DigitalChannels) -> EventStream {
        let edges = channels.rising_edges();
        let n = channels.n_samples().saturating_sub(1);
        let mut events = Vec::new();

        let mut i = 0;
        while i < n {
            if edges.iter().any(|line| line[i] != 0) {
                let end = (i + self.width).min(n);
                let mut bits = [0u8; N_LINES];
                for (bit, line) in bits.iter_mut().zip(&edges) {
                    *bit = line[i..end].iter().copied().max().unwrap_or(0);
                }
                let code = to_code(&bits);
                log::trace!("marqueur {code} à l'échantillon {i}");
                events.push(Event::new(i, code));
                i += self.width;
            } else {
                i += 1;
            }
        }

        log::debug!("{} marqueurs décodés sur {} échantillons", events.len(), n + 1);
        EventStream::from(events)
    }
}

/// Somme pondérée des bits : la voie `c` vaut `2^c`.
///
/// # Example
/// ```
/// use ec_decode::decoder::to_code;
/// assert_eq!(to_code(&[1, 0, 0, 1, 0, 0, 0, 0]), 9);
/// assert_eq!(to_code(&[1; 8]), 255);
/// ```
#[must_use]
pub fn to_code(bits: &[u8; N_LINES]) -> u8 {
    bits.iter()
        .enumerate()
        .filter(|(_, b)| **b != 0)
        .fold(0u8, |acc, (c, _)| acc | (1 << c))
}

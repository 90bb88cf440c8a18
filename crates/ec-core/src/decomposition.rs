use std::path::Path;

use anyhow::Context;

use crate::error::CoreError;

/// Result of separating a skin-conductance signal into its components.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Decomposition {
    /// Phasic component (r).
    pub phasic: Vec<f64>,
    /// Sudomotor nerve activity estimate (p). Absent when the solver gives none.
    pub smna: Option<Vec<f64>>,
    /// Tonic component (t).
    pub tonic: Vec<f64>,
    /// Tonic spline coefficients (l).
    pub coefficients: Vec<f64>,
    /// Linear drift terms (d).
    pub drift: Vec<f64>,
    /// Model residuals (e).
    pub residual: Vec<f64>,
    /// Final value of the solver objective.
    pub objective: Option<f64>,
}

/// Sépare un signal EDA en composantes tonique / phasique.
///
/// The solver itself lives outside this workspace; implementations either
/// pass the signal through or replay a table computed elsewhere.
///
/// # Example
/// ```
/// use ec_core::decomposition::{Decomposer, RawSignal};
/// let d = RawSignal.decompose(&[1.0, 2.0], 0.04).unwrap();
/// assert_eq!(d.phasic, vec![1.0, 2.0]);
/// assert!(d.smna.is_none());
/// ```
pub trait Decomposer {
    /// Decompose `signal`, sampled every `dt` seconds.
    ///
    /// # Errors
    /// Returns [`CoreError::Decomposition`] if the components cannot be
    /// produced for this signal.
    fn decompose(&self, signal: &[f64], dt: f64) -> Result<Decomposition, CoreError>;
}

/// Identity decomposition: phasic and tonic both equal the input, no SMNA.
#[derive(Clone, Copy, Debug, Default)]
pub struct RawSignal;

impl Decomposer for RawSignal {
    fn decompose(&self, signal: &[f64], _dt: f64) -> Result<Decomposition, CoreError> {
        Ok(Decomposition {
            phasic: signal.to_vec(),
            smna: None,
            tonic: signal.to_vec(),
            ..Decomposition::default()
        })
    }
}

/// Components produced by an external solver, read from a text table.
///
/// One row per sample, three whitespace-separated columns:
/// `phasic smna tonic`.
#[derive(Clone, Debug)]
pub struct Precomputed {
    decomposition: Decomposition,
}

impl Precomputed {
    /// Parse the three-column table.
    ///
    /// # Errors
    /// Returns [`CoreError::Decomposition`] on a malformed row.
    pub fn from_text(text: &str) -> Result<Self, CoreError> {
        let mut phasic = Vec::new();
        let mut smna = Vec::new();
        let mut tonic = Vec::new();
        for (i, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let cols: Vec<f64> = line
                .split_whitespace()
                .map(str::parse::<f64>)
                .collect::<Result<_, _>>()
                .map_err(|e| CoreError::Decomposition(format!("ligne {} : {e}", i + 1)))?;
            let [r, p, t] = cols[..] else {
                return Err(CoreError::Decomposition(format!(
                    "ligne {} : 3 colonnes attendues, {} trouvées",
                    i + 1,
                    cols.len()
                )));
            };
            phasic.push(r);
            smna.push(p);
            tonic.push(t);
        }
        Ok(Self {
            decomposition: Decomposition {
                phasic,
                smna: Some(smna),
                tonic,
                ..Decomposition::default()
            },
        })
    }

    /// Read the table from disk.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Impossible de lire {}", path.display()))?;
        let table =
            Self::from_text(&text).with_context(|| format!("Décomposition {}", path.display()))?;
        log::debug!(
            "Décomposition de {} échantillons lue depuis {}",
            table.decomposition.phasic.len(),
            path.display()
        );
        Ok(table)
    }
}

impl Decomposer for Precomputed {
    fn decompose(&self, signal: &[f64], _dt: f64) -> Result<Decomposition, CoreError> {
        if self.decomposition.phasic.len() != signal.len() {
            return Err(CoreError::Decomposition(format!(
                "{} échantillons décomposés pour un signal de {}",
                self.decomposition.phasic.len(),
                signal.len()
            )));
        }
        Ok(self.decomposition.clone())
    }
}

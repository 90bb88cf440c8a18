use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::score::Modality;

/// Configuration complète de l'analyse.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut reprenant les
/// constantes de l'étude d'origine.
///
/// # Example
/// ```
/// use ec_core::config::AnalysisConfig;
/// let config = AnalysisConfig::default();
/// assert_eq!(config.decoder.width, 10);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct AnalysisConfig {
    pub decoder: DecoderConfig,
    pub eda: EdaConfig,
    pub emg: EmgConfig,
    pub cohort: CohortConfig,
    pub paths: PathsConfig,
}

/// Digital marker decoding.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DecoderConfig {
    /// Analog level above which a digital line reads as 1.
    pub threshold: f64,
    /// Coincidence window in samples. Edges on different lines closer than
    /// this belong to one marker.
    pub width: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            threshold: 2.5,
            width: 10,
        }
    }
}

/// An experimental phase delimited by two marker codes.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct PhaseConfig {
    /// Label prefix used in stimulus names ("obs", "direct", ...).
    pub name: String,
    pub start_code: u8,
    pub stop_code: u8,
    /// Number of blocks the tonic level is averaged over.
    #[serde(default = "default_blocks")]
    pub scl_blocks: usize,
    /// Whether trials of this phase are scored (rest phases only give levels).
    #[serde(default = "default_true")]
    pub scored: bool,
}

#[must_use]
pub fn default_true() -> bool {
    true
}

fn default_blocks() -> usize {
    1
}

impl PhaseConfig {
    fn new(name: &str, start_code: u8, stop_code: u8, scl_blocks: usize, scored: bool) -> Self {
        Self {
            name: name.into(),
            start_code,
            stop_code,
            scl_blocks,
            scored,
        }
    }
}

/// Source of the phasic / tonic / SMNA components.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DecompositionMode {
    /// Use the signal as is (no SMNA).
    #[default]
    Raw,
    /// Read `<CODE>_<phase>_decomposition.txt` tables produced externally.
    Precomputed,
}

/// Skin conductance scoring (slow responses).
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EdaConfig {
    /// Analysis sampling rate of the EDA signal, Hz.
    pub fs: f64,
    /// Events are recorded at the acquisition rate; divide by this to reach `fs`.
    pub event_downsample: f64,
    /// Trial window after CS onset, seconds (CS + fixation).
    pub trial_seconds: f64,
    /// Baseline length, seconds.
    pub baseline_seconds: f64,
    /// Response window length, seconds.
    pub response_seconds: f64,
    /// Offset of the US window within an observational CS+ trial, seconds.
    pub us_onset_seconds: f64,
    /// Amplitudes must be strictly above this to count.
    pub validity_threshold: f64,
    pub cs_plus_code: u8,
    pub cs_minus_code: u8,
    /// Startle probe codes. Observational trials with a probe get no US score.
    pub startle_codes: Vec<u8>,
    pub us_code: u8,
    /// Name of the phase in which the US window is also scored.
    pub observation_phase: String,
    pub phases: Vec<PhaseConfig>,
    pub decomposition: DecompositionMode,
}

impl Default for EdaConfig {
    fn default() -> Self {
        Self {
            fs: 25.0,
            event_downsample: 80.0,
            trial_seconds: 19.0,
            baseline_seconds: 2.0,
            response_seconds: 6.0,
            us_onset_seconds: 7.5,
            validity_threshold: 0.02,
            cs_plus_code: 1,
            cs_minus_code: 2,
            startle_codes: vec![4, 5, 6],
            us_code: 8,
            observation_phase: "obs".into(),
            phases: vec![
                PhaseConfig::new("rest", 11, 12, 1, false),
                PhaseConfig::new("obs", 13, 14, 6, true),
                PhaseConfig::new("direct", 15, 16, 3, true),
            ],
            decomposition: DecompositionMode::Raw,
        }
    }
}

impl EdaConfig {
    /// Trial window in samples.
    #[must_use]
    pub fn trial_samples(&self) -> usize {
        (self.trial_seconds * self.fs) as usize
    }

    /// Baseline window in samples.
    #[must_use]
    pub fn baseline_samples(&self) -> usize {
        (self.baseline_seconds * self.fs) as usize
    }
}

/// Startle EMG scoring (fast responses).
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EmgConfig {
    /// Sampling rate of the preprocessed EMG signal, Hz.
    pub fs: f64,
    /// Samples averaged before the probe.
    pub baseline_samples: usize,
    /// Response window start, samples after the probe.
    pub latency_start: usize,
    /// Response window end (exclusive), samples after the probe.
    pub latency_end: usize,
    pub fix_code: u8,
    pub cs_plus_code: u8,
    pub cs_minus_code: u8,
    pub phases: Vec<PhaseConfig>,
}

impl Default for EmgConfig {
    fn default() -> Self {
        Self {
            fs: 2000.0,
            baseline_samples: 100,
            latency_start: 40,
            latency_end: 240,
            fix_code: 4,
            cs_plus_code: 5,
            cs_minus_code: 6,
            phases: vec![
                PhaseConfig::new("obs", 13, 14, 1, true),
                PhaseConfig::new("direct", 15, 16, 1, true),
            ],
        }
    }
}

/// Manual exclusion after visual inspection.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Exclusion {
    pub code: String,
    pub modality: Modality,
    pub reason: String,
}

/// Cohort-level exclusion and label correction.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CohortConfig {
    /// EMG: minimum number of trials above `emg_reaction_threshold`.
    pub emg_min_reactions: usize,
    pub emg_reaction_threshold: f64,
    /// EDA: minimum number of valid direct-phase responses.
    pub eda_min_direct: usize,
    /// Stimulus label prefix of the direct phase.
    pub direct_prefix: String,
    pub exclude: Vec<Exclusion>,
    /// Subjects whose direct CS+ / CS- labels were swapped at presentation.
    pub swap_direct_labels: Vec<String>,
}

impl Default for CohortConfig {
    fn default() -> Self {
        Self {
            emg_min_reactions: 6,
            emg_reaction_threshold: 0.01,
            eda_min_direct: 5,
            direct_prefix: "direct".into(),
            exclude: Vec::new(),
            swap_direct_labels: Vec::new(),
        }
    }
}

impl CohortConfig {
    /// Reason for a manual exclusion, if any.
    #[must_use]
    pub fn manual_exclusion(&self, code: &str, modality: Modality) -> Option<&str> {
        self.exclude
            .iter()
            .find(|e| e.code == code && e.modality == modality)
            .map(|e| e.reason.as_str())
    }
}

/// Input and output directories.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PathsConfig {
    pub raw_dir: PathBuf,
    pub stat_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("out/raw_data"),
            stat_dir: PathBuf::from("out/stat_data"),
        }
    }
}

impl AnalysisConfig {
    /// Vérifie la cohérence des valeurs numériques.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<(), CoreError> {
        let bad = |msg: &str| -> Result<(), CoreError> { Err(CoreError::Config(msg.into())) };
        if self.decoder.width == 0 {
            return bad("decoder.width doit être >= 1");
        }
        if !(self.eda.fs.is_finite() && self.eda.fs > 0.0) {
            return bad("eda.fs doit être > 0");
        }
        if !(self.eda.event_downsample.is_finite() && self.eda.event_downsample > 0.0) {
            return bad("eda.event_downsample doit être > 0");
        }
        if self.eda.trial_seconds <= 0.0
            || self.eda.baseline_seconds < 0.0
            || self.eda.response_seconds <= 0.0
            || self.eda.us_onset_seconds < 0.0
        {
            return bad("durées EDA négatives ou nulles");
        }
        if self.eda.phases.iter().any(|p| p.scl_blocks == 0) {
            return bad("eda.phases.scl_blocks doit être >= 1");
        }
        if !(self.emg.fs.is_finite() && self.emg.fs > 0.0) {
            return bad("emg.fs doit être > 0");
        }
        if self.emg.latency_start >= self.emg.latency_end {
            return bad("emg.latency_start doit précéder emg.latency_end");
        }
        if self.emg.baseline_samples == 0 {
            return bad("emg.baseline_samples doit être >= 1");
        }
        Ok(())
    }
}

/// Structure TOML intermédiaire : toutes les sections sont optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    decoder: Option<DecoderSection>,
    eda: Option<EdaSection>,
    emg: Option<EmgSection>,
    cohort: Option<CohortSection>,
    paths: Option<PathsSection>,
}

#[derive(Deserialize)]
struct DecoderSection {
    threshold: Option<f64>,
    width: Option<usize>,
}

#[derive(Deserialize)]
struct EdaSection {
    fs: Option<f64>,
    event_downsample: Option<f64>,
    trial_seconds: Option<f64>,
    baseline_seconds: Option<f64>,
    response_seconds: Option<f64>,
    us_onset_seconds: Option<f64>,
    validity_threshold: Option<f64>,
    cs_plus_code: Option<u8>,
    cs_minus_code: Option<u8>,
    startle_codes: Option<Vec<u8>>,
    us_code: Option<u8>,
    observation_phase: Option<String>,
    phases: Option<Vec<PhaseConfig>>,
    decomposition: Option<DecompositionMode>,
}

#[derive(Deserialize)]
struct EmgSection {
    fs: Option<f64>,
    baseline_samples: Option<usize>,
    latency_start: Option<usize>,
    latency_end: Option<usize>,
    fix_code: Option<u8>,
    cs_plus_code: Option<u8>,
    cs_minus_code: Option<u8>,
    phases: Option<Vec<PhaseConfig>>,
}

#[derive(Deserialize)]
struct CohortSection {
    emg_min_reactions: Option<usize>,
    emg_reaction_threshold: Option<f64>,
    eda_min_direct: Option<usize>,
    direct_prefix: Option<String>,
    exclude: Option<Vec<Exclusion>>,
    swap_direct_labels: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct PathsSection {
    raw_dir: Option<PathBuf>,
    stat_dir: Option<PathBuf>,
}

/// Parse un document TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the document is not valid TOML, or if the merged
/// configuration fails [`AnalysisConfig::validate`].
#[allow(clippy::too_many_lines)]
pub fn parse_config(content: &str) -> Result<AnalysisConfig> {
    let file: ConfigFile = toml::from_str(content).context("Erreur de parsing TOML")?;
    let mut config = AnalysisConfig::default();

    macro_rules! merge {
        ($section:expr, $target:expr, $($field:ident),+ $(,)?) => {
            $(
                if let Some(v) = $section.$field {
                    $target.$field = v;
                }
            )+
        };
    }

    if let Some(d) = file.decoder {
        merge!(d, config.decoder, threshold, width);
    }
    if let Some(e) = file.eda {
        merge!(
            e,
            config.eda,
            fs,
            event_downsample,
            trial_seconds,
            baseline_seconds,
            response_seconds,
            us_onset_seconds,
            validity_threshold,
            cs_plus_code,
            cs_minus_code,
            startle_codes,
            us_code,
            observation_phase,
            phases,
            decomposition,
        );
    }
    if let Some(e) = file.emg {
        merge!(
            e,
            config.emg,
            fs,
            baseline_samples,
            latency_start,
            latency_end,
            fix_code,
            cs_plus_code,
            cs_minus_code,
            phases,
        );
    }
    if let Some(c) = file.cohort {
        merge!(
            c,
            config.cohort,
            emg_min_reactions,
            emg_reaction_threshold,
            eda_min_direct,
            direct_prefix,
            exclude,
            swap_direct_labels,
        );
    }
    if let Some(p) = file.paths {
        merge!(p, config.paths, raw_dir, stat_dir);
    }

    config.validate()?;
    Ok(config)
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read, parsed or validated.
///
/// # Example
/// ```no_run
/// use ec_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<AnalysisConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Configuration {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = parse_config(
            r#"
            [eda]
            fs = 50.0

            [cohort]
            swap_direct_labels = ["ABC"]

            [[cohort.exclude]]
            code = "XYZ"
            modality = "emg"
            reason = "noise"
            "#,
        )
        .unwrap();
        assert!((config.eda.fs - 50.0).abs() < f64::EPSILON);
        assert_eq!(config.eda.trial_samples(), 950);
        assert_eq!(config.decoder.width, 10);
        assert_eq!(config.emg.latency_end, 240);
        assert_eq!(config.cohort.swap_direct_labels, vec!["ABC".to_string()]);
        assert_eq!(
            config.cohort.manual_exclusion("XYZ", Modality::Emg),
            Some("noise")
        );
        assert_eq!(config.cohort.manual_exclusion("XYZ", Modality::Eda), None);
    }

    #[test]
    fn empty_file_is_default() {
        let config = parse_config("").unwrap();
        assert_eq!(config.eda.phases.len(), 3);
        assert_eq!(config.eda.baseline_samples(), 50);
        assert!(!config.eda.phases[0].scored);
    }

    #[test]
    fn phases_default_optional_fields() {
        let config = parse_config(
            r#"
            [[emg.phases]]
            name = "test"
            start_code = 20
            stop_code = 21
            "#,
        )
        .unwrap();
        assert_eq!(config.emg.phases.len(), 1);
        assert_eq!(config.emg.phases[0].scl_blocks, 1);
        assert!(config.emg.phases[0].scored);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(parse_config("[decoder]\nwidth = 0\n").is_err());
        assert!(parse_config("[emg]\nlatency_start = 300\n").is_err());
        assert!(parse_config("[eda]\nfs = -1.0\n").is_err());
        assert!(parse_config("[eda\n").is_err());
    }

    #[test]
    fn load_config_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.toml");
        std::fs::write(&path, "[decoder]\nwidth = 4\n").unwrap();
        assert_eq!(load_config(&path).unwrap().decoder.width, 4);
        assert!(load_config(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn shipped_default_matches_builtin() {
        let config = parse_config(include_str!("../../../config/default.toml")).unwrap();
        let builtin = AnalysisConfig::default();
        assert_eq!(config.eda.phases, builtin.eda.phases);
        assert_eq!(config.emg.phases, builtin.emg.phases);
        assert_eq!(config.decoder.width, builtin.decoder.width);
        assert_eq!(config.cohort.swap_direct_labels.len(), 7);
        assert_eq!(
            config.cohort.manual_exclusion("ESFMRF", Modality::Emg),
            Some("Bad signal quality (noise)")
        );
    }
}

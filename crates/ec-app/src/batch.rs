//! Boucle par sujet de chaque étape.
//!
//! Every subject is processed independently: a failure is logged with the
//! subject code and the loop moves on.

use std::path::Path;

use anyhow::{Context, Result};
use ec_cohort::CohortAggregator;
use ec_cohort::relabel::correct_assignment;
use ec_cohort::table::{save_records, subject_path};
use ec_core::config::{AnalysisConfig, DecompositionMode, PhaseConfig};
use ec_core::decomposition::{Decomposer, Precomputed, RawSignal};
use ec_core::events::EventStream;
use ec_core::score::Modality;
use ec_core::CoreError;
use ec_decode::{DigitalChannels, DigitalEventDecoder};
use ec_score::scl::relative_scl;

use crate::io::{
    DIGITAL, EDA, EMG, EVENTS, decomposition_file, discover_subjects, read_signal, subject_file,
    write_rows,
};

/// Counts of one stage run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StageReport {
    pub processed: usize,
    pub failed: usize,
}

/// Run `step` for each subject, at most `stop_after` of them.
fn for_each_subject<F>(codes: &[String], stop_after: Option<usize>, stage: &str, mut step: F) -> StageReport
where
    F: FnMut(&str) -> Result<()>,
{
    let limit = stop_after.unwrap_or(usize::MAX);
    if codes.len() > limit {
        log::info!("{stage} : arrêt après {limit} sujets sur {}", codes.len());
    }
    let mut report = StageReport::default();
    for code in codes.iter().take(limit) {
        log::info!("{stage} : {code}");
        match step(code) {
            Ok(()) => report.processed += 1,
            Err(e) => {
                log::warn!("{stage} : {code} abandonné : {e:#}");
                report.failed += 1;
            }
        }
    }
    report
}

/// Décode `<CODE>_digital.txt` en `<CODE>_events.txt`.
///
/// # Errors
/// Fails only if the raw directory cannot be listed.
pub fn run_decode(config: &AnalysisConfig, stop_after: Option<usize>) -> Result<StageReport> {
    let raw = &config.paths.raw_dir;
    let decoder = DigitalEventDecoder::from_config(&config.decoder);
    let codes = discover_subjects(raw, DIGITAL)?;
    Ok(for_each_subject(&codes, stop_after, "decode", |code| {
        let channels = DigitalChannels::load(&subject_file(raw, code, DIGITAL), config.decoder.threshold)?;
        let events = decoder.decode(&channels);
        log::debug!("{code} : {} événements", events.len());
        events.save(&subject_file(raw, code, EVENTS))
    }))
}

fn decomposer_for(
    raw: &Path,
    code: &str,
    mode: DecompositionMode,
) -> impl FnMut(&PhaseConfig) -> Result<Box<dyn Decomposer>, CoreError> {
    move |phase: &PhaseConfig| -> Result<Box<dyn Decomposer>, CoreError> {
        match mode {
            DecompositionMode::Raw => Ok(Box::new(RawSignal)),
            DecompositionMode::Precomputed => {
                let path = decomposition_file(raw, code, &phase.name);
                let table = Precomputed::load(&path)
                    .map_err(|e| CoreError::Decomposition(format!("{e:#}")))?;
                Ok(Box::new(table))
            }
        }
    }
}

/// Score EDA for every subject with an `_eda.txt` signal and write the
/// per-subject tables plus `scl.csv`.
///
/// # Errors
/// Fails if the raw directory cannot be listed or `scl.csv` cannot be written.
pub fn run_eda(config: &AnalysisConfig, stop_after: Option<usize>) -> Result<StageReport> {
    let raw = &config.paths.raw_dir;
    let stat = &config.paths.stat_dir;
    let codes = discover_subjects(raw, EDA)?;
    let mut scl_codes = Vec::new();
    let mut scl_rows = Vec::new();

    let report = for_each_subject(&codes, stop_after, "eda", |code| {
        let signal = read_signal(&subject_file(raw, code, EDA))?;
        let events = EventStream::load(&subject_file(raw, code, EVENTS))?;
        let mut subject = ec_score::eda::score_subject(
            code,
            &signal,
            &events,
            &config.eda,
            decomposer_for(raw, code, config.eda.decomposition),
        )?;
        correct_assignment(code, &mut subject.records, &config.cohort);
        save_records(&subject_path(stat, Modality::Eda, code), &subject.records)?;
        scl_codes.push(code.to_owned());
        scl_rows.push(subject.levels);
        Ok(())
    });

    if !scl_rows.is_empty() {
        let width = scl_rows.iter().map(Vec::len).max().unwrap_or(0);
        let header: Vec<String> = std::iter::once("code".to_owned())
            .chain(scl_header(config, width))
            .collect();
        let rows: Vec<(String, Vec<f64>)> = scl_codes.into_iter().zip(relative_scl(&scl_rows)).collect();
        std::fs::create_dir_all(stat)?;
        write_rows(&stat.join("scl.csv"), &header, &rows).context("Écriture de scl.csv")?;
    }
    Ok(report)
}

/// `<phase>_<block>` for every configured SCL block, padded to `width`.
fn scl_header(config: &AnalysisConfig, width: usize) -> Vec<String> {
    let mut names: Vec<String> = config
        .eda
        .phases
        .iter()
        .flat_map(|p| (1..=p.scl_blocks).map(move |b| format!("{}_{b}", p.name)))
        .collect();
    while names.len() < width {
        names.push(format!("block_{}", names.len() + 1));
    }
    names.truncate(width);
    names
}

/// Score EMG for every subject with an `_emg.txt` signal.
///
/// # Errors
/// Fails only if the raw directory cannot be listed.
pub fn run_emg(config: &AnalysisConfig, stop_after: Option<usize>) -> Result<StageReport> {
    let raw = &config.paths.raw_dir;
    let stat = &config.paths.stat_dir;
    let codes = discover_subjects(raw, EMG)?;
    Ok(for_each_subject(&codes, stop_after, "emg", |code| {
        let signal = read_signal(&subject_file(raw, code, EMG))?;
        let events = EventStream::load(&subject_file(raw, code, EVENTS))?;
        let mut records = ec_score::emg::score_subject(code, &signal, &events, &config.emg)?;
        correct_assignment(code, &mut records, &config.cohort);
        save_records(&subject_path(stat, Modality::Emg, code), &records)
    }))
}

/// Build and write the cohort tables of both modalities.
///
/// # Errors
/// Fails if a table directory cannot be listed or an output file cannot be
/// written.
pub fn run_collect(config: &AnalysisConfig) -> Result<()> {
    for modality in [Modality::Emg, Modality::Eda] {
        let mut cohort = CohortAggregator::new(modality, config.cohort.clone());
        cohort.collect_dir(&config.paths.stat_dir)?;
        let table = cohort.finish();
        for path in table.save(&config.paths.stat_dir)? {
            log::info!("Écrit : {}", path.display());
        }
    }
    Ok(())
}

//! Score tables on disk: bincode for lossless storage, CSV for reading.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ec_core::score::{Modality, ScoreRecord};

/// Directory holding the per-subject tables of a modality.
#[must_use]
pub fn subject_dir(stat_dir: &Path, modality: Modality) -> PathBuf {
    stat_dir.join(modality.as_str())
}

/// `stat_dir/<modality>/<CODE>.bin`
#[must_use]
pub fn subject_path(stat_dir: &Path, modality: Modality, code: &str) -> PathBuf {
    subject_dir(stat_dir, modality).join(format!("{code}.bin"))
}

/// Sérialise une table (bincode), en créant le dossier parent si besoin.
///
/// # Errors
/// Fails if the directory or the file cannot be written.
pub fn save_records(path: &Path, records: &[ScoreRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("Impossible d'écrire {}", path.display()))?;
    bincode::serialize_into(BufWriter::new(file), records)
        .with_context(|| format!("Sérialisation de {}", path.display()))?;
    Ok(())
}

/// Read back a table written by [`save_records`].
///
/// # Errors
/// Fails if the file is missing or was not written by this program.
pub fn load_records(path: &Path) -> Result<Vec<ScoreRecord>> {
    let file = File::open(path).with_context(|| format!("Impossible de lire {}", path.display()))?;
    bincode::deserialize_from(BufReader::new(file))
        .with_context(|| format!("Table corrompue : {}", path.display()))
}

/// Per-subject tables of a modality, as `(code, path)` sorted by code.
///
/// A missing directory yields no table.
///
/// # Errors
/// Fails if the directory exists but cannot be listed.
pub fn subject_tables(stat_dir: &Path, modality: Modality) -> Result<Vec<(String, PathBuf)>> {
    let dir = subject_dir(stat_dir, modality);
    if !dir.is_dir() {
        log::warn!("Aucune table {modality} dans {}", dir.display());
        return Ok(Vec::new());
    }
    let mut tables = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("bin") {
            continue;
        }
        if let Some(code) = path.file_stem().and_then(|s| s.to_str()) {
            tables.push((code.to_owned(), path.clone()));
        }
    }
    tables.sort();
    Ok(tables)
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Flatten records to CSV. Invalid amplitudes and missing peak times are
/// empty cells.
///
/// # Example
/// ```
/// use ec_cohort::table::to_csv;
/// use ec_core::score::{Score, ScoreRecord};
/// let records = [ScoreRecord::new("ABC", "obs CS+".into(), 1, Score::valid(0.5, None))];
/// assert_eq!(to_csv(&records, false), "code,stimulus,trial,amplitude\nABC,obs CS+,1,0.5\n");
/// ```
#[must_use]
pub fn to_csv(records: &[ScoreRecord], with_peak_time: bool) -> String {
    let mut csv = String::from("code,stimulus,trial,amplitude");
    if with_peak_time {
        csv.push_str(",peak_time");
    }
    csv.push('\n');
    for r in records {
        csv.push_str(&format!(
            "{},{},{},{}",
            r.code,
            r.stimulus,
            r.trial,
            cell(r.amplitude.value())
        ));
        if with_peak_time {
            csv.push(',');
            csv.push_str(&cell(r.peak_time));
        }
        csv.push('\n');
    }
    csv
}

/// Write [`to_csv`] output to `path`.
///
/// # Errors
/// Fails if the file cannot be written.
pub fn write_csv(path: &Path, records: &[ScoreRecord], with_peak_time: bool) -> Result<()> {
    fs::write(path, to_csv(records, with_peak_time))
        .with_context(|| format!("Impossible d'écrire {}", path.display()))
}

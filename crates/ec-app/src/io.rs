//! Raw-data file layout: `<CODE>_<suffix>.txt` files in one directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub const DIGITAL: &str = "digital";
pub const EVENTS: &str = "events";
pub const EDA: &str = "eda";
pub const EMG: &str = "emg";

/// `dir/<CODE>_<suffix>.txt`
#[must_use]
pub fn subject_file(dir: &Path, code: &str, suffix: &str) -> PathBuf {
    dir.join(format!("{code}_{suffix}.txt"))
}

/// Precomputed decomposition of one phase: `dir/<CODE>_<phase>_decomposition.txt`.
#[must_use]
pub fn decomposition_file(dir: &Path, code: &str, phase: &str) -> PathBuf {
    subject_file(dir, code, &format!("{phase}_decomposition"))
}

fn is_subject_code(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

/// Codes of every subject with a `<CODE>_<suffix>.txt` file, sorted.
///
/// # Errors
/// Fails if `dir` cannot be listed.
pub fn discover_subjects(dir: &Path, suffix: &str) -> Result<Vec<String>> {
    let tail = format!("_{suffix}.txt");
    let mut codes = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Dossier illisible : {}", dir.display()))? {
        let name = entry?.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Some(code) = name.strip_suffix(&tail)
            && is_subject_code(code)
        {
            codes.push(code.to_owned());
        }
    }
    codes.sort();
    Ok(codes)
}

/// Read a signal stored as one value per line. Blank lines are skipped.
///
/// # Errors
/// Fails if the file cannot be read or a line is not a number.
pub fn read_signal(path: &Path) -> Result<Vec<f64>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Impossible de lire {}", path.display()))?;
    text.lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(i, l)| {
            l.trim()
                .parse::<f64>()
                .with_context(|| format!("{} ligne {} : valeur invalide", path.display(), i + 1))
        })
        .collect()
}

/// Write a table of rows as CSV with a header.
///
/// # Errors
/// Fails if the file cannot be written.
pub fn write_rows(path: &Path, header: &[String], rows: &[(String, Vec<f64>)]) -> Result<()> {
    let mut csv = header.join(",");
    csv.push('\n');
    for (code, values) in rows {
        csv.push_str(code);
        for v in values {
            csv.push(',');
            if v.is_finite() {
                csv.push_str(&v.to_string());
            }
        }
        csv.push('\n');
    }
    fs::write(path, csv).with_context(|| format!("Impossible d'écrire {}", path.display()))
}

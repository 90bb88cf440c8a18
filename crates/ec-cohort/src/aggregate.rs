//! Cohort assembly: exclusion then normalization, subject by subject.

use std::path::{Path, PathBuf};

use anyhow::Result;
use ec_core::config::CohortConfig;
use ec_core::score::{Modality, ScoreRecord};

use crate::exclusion::{Verdict, verdict};
use crate::normalize::normalize;
use crate::summary::{Summary, summarize};
use crate::table::{load_records, save_records, subject_tables, write_csv};

/// Combined table of one modality.
#[derive(Clone, Debug)]
pub struct CohortTable {
    pub modality: Modality,
    /// Normalized records of the retained subjects, in insertion order.
    pub records: Vec<ScoreRecord>,
    pub retained: Vec<String>,
    /// `(code, reason)`
    pub excluded: Vec<(String, String)>,
}

/// Accumule les sujets d'une modalité et produit la table de cohorte.
///
/// # Example
/// ```
/// use ec_cohort::CohortAggregator;
/// use ec_core::config::CohortConfig;
/// use ec_core::score::{Modality, Score, ScoreRecord};
/// let mut cohort = CohortAggregator::new(Modality::Emg, CohortConfig::default());
/// let records: Vec<ScoreRecord> = (0..6)
///     .map(|i| ScoreRecord::new("ABC", "obs CS+".into(), i + 1, Score::valid(f64::from(i as u8) + 1.0, None)))
///     .collect();
/// assert!(cohort.add_subject("ABC", records).is_retained());
/// let table = cohort.finish();
/// assert_eq!(table.retained, vec!["ABC"]);
/// ```
#[derive(Clone, Debug)]
pub struct CohortAggregator {
    modality: Modality,
    config: CohortConfig,
    table: CohortTable,
}

impl CohortAggregator {
    #[must_use]
    pub fn new(modality: Modality, config: CohortConfig) -> Self {
        Self {
            modality,
            config,
            table: CohortTable {
                modality,
                records: Vec::new(),
                retained: Vec::new(),
                excluded: Vec::new(),
            },
        }
    }

    /// Check one subject and, if retained, append its normalized records.
    pub fn add_subject(&mut self, code: &str, mut records: Vec<ScoreRecord>) -> Verdict {
        let outcome = verdict(self.modality, code, &records, &self.config);
        match &outcome {
            Verdict::Retained => {
                normalize(self.modality, &mut records);
                self.table.records.extend(records);
                self.table.retained.push(code.to_owned());
            }
            Verdict::Excluded(reason) => {
                self.table.excluded.push((code.to_owned(), reason.clone()));
            }
        }
        outcome
    }

    /// Load every per-subject table of the modality under `stat_dir`.
    ///
    /// An unreadable table is logged and skipped.
    ///
    /// # Errors
    /// Fails only if the table directory cannot be listed.
    pub fn collect_dir(&mut self, stat_dir: &Path) -> Result<()> {
        for (code, path) in subject_tables(stat_dir, self.modality)? {
            match load_records(&path) {
                Ok(records) => {
                    self.add_subject(&code, records);
                }
                Err(e) => log::warn!("{code} ignoré : {e:#}"),
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn finish(self) -> CohortTable {
        log::info!(
            "Cohorte {} : {} sujets retenus, {} exclus",
            self.modality,
            self.table.retained.len(),
            self.table.excluded.len()
        );
        self.table
    }
}

impl CohortTable {
    #[must_use]
    pub fn summary(&self) -> Summary {
        summarize(&self.records, self.modality)
    }

    /// Write `<modality>.bin`, `<modality>.csv` and `<modality>_summary.csv`
    /// into `stat_dir`. Returns the written paths.
    ///
    /// # Errors
    /// Fails on the first file that cannot be written.
    pub fn save(&self, stat_dir: &Path) -> Result<Vec<PathBuf>> {
        let stem = self.modality.as_str();
        let bin = stat_dir.join(format!("{stem}.bin"));
        let csv = stat_dir.join(format!("{stem}.csv"));
        let summary = stat_dir.join(format!("{stem}_summary.csv"));

        save_records(&bin, &self.records)?;
        write_csv(&csv, &self.records, self.modality == Modality::Eda)?;
        std::fs::write(&summary, self.summary().to_csv())?;
        Ok(vec![bin, csv, summary])
    }
}

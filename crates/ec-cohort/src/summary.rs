use std::collections::{BTreeMap, BTreeSet};

use ec_core::score::{Modality, ScoreRecord};
use ec_core::stats::mean;

/// Mean amplitude per subject and stimulus, one row per subject.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Summary {
    /// Column labels, sorted.
    pub stimuli: Vec<String>,
    /// `(code, one mean per stimulus)`, sorted by code.
    pub rows: Vec<(String, Vec<Option<f64>>)>,
}

/// Build the wide summary of a combined table.
///
/// EDA counts invalid amplitudes as 0 before averaging; EMG skips them.
#[must_use]
pub fn summarize(records: &[ScoreRecord], modality: Modality) -> Summary {
    let mut groups: BTreeMap<(&str, &str), Vec<f64>> = BTreeMap::new();
    let mut stimuli = BTreeSet::new();
    let mut codes = BTreeSet::new();

    for r in records {
        stimuli.insert(r.stimulus.as_str());
        codes.insert(r.code.as_str());
        let value = match modality {
            Modality::Eda => Some(r.amplitude.value().unwrap_or(0.0)),
            Modality::Emg => r.amplitude.value(),
        };
        let group = groups.entry((r.code.as_str(), r.stimulus.as_str())).or_default();
        if let Some(v) = value {
            group.push(v);
        }
    }

    let rows = codes
        .iter()
        .map(|&code| {
            let means = stimuli
                .iter()
                .map(|&s| groups.get(&(code, s)).and_then(|v| mean(v)))
                .collect();
            (code.to_owned(), means)
        })
        .collect();

    Summary {
        stimuli: stimuli.into_iter().map(str::to_owned).collect(),
        rows,
    }
}

impl Summary {
    /// `code,<stimulus>...` then one line per subject; missing means are empty.
    #[must_use]
    pub fn to_csv(&self) -> String {
        let mut csv = String::from("code");
        for s in &self.stimuli {
            csv.push(',');
            csv.push_str(s);
        }
        csv.push('\n');
        for (code, means) in &self.rows {
            csv.push_str(code);
            for m in means {
                csv.push(',');
                if let Some(v) = m {
                    csv.push_str(&v.to_string());
                }
            }
            csv.push('\n');
        }
        csv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ec_core::score::Score;

    fn records() -> Vec<ScoreRecord> {
        vec![
            ScoreRecord::new("BBB", "obs CS+".into(), 0, Score::valid(1.0, None)),
            ScoreRecord::new("BBB", "obs CS+".into(), 1, Score::invalid()),
            ScoreRecord::new("AAA", "obs CS-".into(), 0, Score::valid(3.0, None)),
            ScoreRecord::new("AAA", "obs CS+".into(), 0, Score::valid(2.0, None)),
        ]
    }

    #[test]
    fn eda_counts_invalid_as_zero() {
        let summary = summarize(&records(), Modality::Eda);
        assert_eq!(summary.stimuli, vec!["obs CS+", "obs CS-"]);
        assert_eq!(summary.rows[0], ("AAA".into(), vec![Some(2.0), Some(3.0)]));
        assert_eq!(summary.rows[1], ("BBB".into(), vec![Some(0.5), None]));
    }

    #[test]
    fn emg_skips_invalid() {
        let summary = summarize(&records(), Modality::Emg);
        assert_eq!(summary.rows[1].1, vec![Some(1.0), None]);
        assert_eq!(
            summary.to_csv(),
            "code,obs CS+,obs CS-\nAAA,2,3\nBBB,1,\n"
        );
    }
}

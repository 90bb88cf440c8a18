use ec_core::config::CohortConfig;
use ec_core::score::ScoreRecord;

/// Échange `"<prefix> CS+"` et `"<prefix> CS-"` dans une table.
///
/// Used for subjects whose stimulus assignment was inverted at presentation.
/// Returns the number of relabelled records.
pub fn swap_direct_labels(records: &mut [ScoreRecord], prefix: &str) -> usize {
    let plus = format!("{prefix} CS+");
    let minus = format!("{prefix} CS-");
    let mut swapped = 0;
    for record in records.iter_mut() {
        if record.stimulus == plus {
            record.stimulus.clone_from(&minus);
        } else if record.stimulus == minus {
            record.stimulus.clone_from(&plus);
        } else {
            continue;
        }
        swapped += 1;
    }
    swapped
}

/// Apply the configured label swap if `code` is listed.
pub fn correct_assignment(code: &str, records: &mut [ScoreRecord], cohort: &CohortConfig) {
    if cohort.swap_direct_labels.iter().any(|c| c == code) {
        let n = swap_direct_labels(records, &cohort.direct_prefix);
        log::info!("{code} : {n} étiquettes {} CS+/CS- inversées", cohort.direct_prefix);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ec_core::score::Score;

    fn table() -> Vec<ScoreRecord> {
        ["direct CS+", "direct CS-", "obs CS+", "direct CS+"]
            .iter()
            .enumerate()
            .map(|(i, s)| ScoreRecord::new("ABC", (*s).into(), i, Score::valid(0.1, None)))
            .collect()
    }

    #[test]
    fn swaps_only_direct_labels() {
        let mut records = table();
        assert_eq!(swap_direct_labels(&mut records, "direct"), 3);
        let labels: Vec<&str> = records.iter().map(|r| r.stimulus.as_str()).collect();
        assert_eq!(labels, vec!["direct CS-", "direct CS+", "obs CS+", "direct CS-"]);
    }

    #[test]
    fn unlisted_subject_is_untouched() {
        let cohort = CohortConfig {
            swap_direct_labels: vec!["XYZ".into()],
            ..CohortConfig::default()
        };
        let mut records = table();
        correct_assignment("ABC", &mut records, &cohort);
        assert_eq!(records, table());
        correct_assignment("XYZ", &mut records, &cohort);
        assert_eq!(records[0].stimulus, "direct CS-");
    }
}

//! Skin conductance levels from the tonic component.

use ec_core::stats::{mean, split_blocks};

/// Niveau tonique moyen par bloc.
///
/// The tonic trace is split into `n_blocks` contiguous blocks of
/// near-equal length (the first ones one sample longer when the length
/// does not divide). Empty blocks give `NaN`.
///
/// # Example
/// ```
/// use ec_score::scl::scl_levels;
/// assert_eq!(scl_levels(&[1.0, 1.0, 3.0, 3.0], 2), vec![1.0, 3.0]);
/// ```
#[must_use]
pub fn scl_levels(tonic: &[f64], n_blocks: usize) -> Vec<f64> {
    split_blocks(tonic, n_blocks)
        .into_iter()
        .map(|b| mean(b).unwrap_or(f64::NAN))
        .collect()
}

/// Express each subject's levels relative to its first block.
#[must_use]
pub fn relative_scl(levels: &[Vec<f64>]) -> Vec<Vec<f64>> {
    levels
        .iter()
        .map(|row| {
            let base = row.first().copied().unwrap_or(0.0);
            row.iter().map(|v| v - base).collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_follow_uneven_split() {
        let tonic = [1.0, 2.0, 3.0, 10.0, 20.0];
        // blocks [1,2,3] and [10,20]
        assert_eq!(scl_levels(&tonic, 2), vec![2.0, 15.0]);
        let sparse = scl_levels(&[1.0], 2);
        assert!(sparse[1].is_nan());
    }

    #[test]
    fn relative_to_first_column() {
        let rel = relative_scl(&[vec![2.0, 3.0, 1.5], vec![]]);
        assert_eq!(rel[0], vec![0.0, 1.0, -0.5]);
        assert!(rel[1].is_empty());
    }
}

//! Small numeric helpers shared by the scoring and cohort stages.

/// Arithmetic mean. `None` for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Population standard deviation (ddof = 0).
#[must_use]
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

/// Maximum and the index of its first occurrence.
///
/// # Example
/// ```
/// use ec_core::stats::argmax;
/// assert_eq!(argmax(&[1.0, 3.0, 3.0, 2.0]), Some((1, 3.0)));
/// ```
#[must_use]
pub fn argmax(values: &[f64]) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best
}

/// Split into `n` contiguous blocks of near-equal length.
///
/// The first `len % n` blocks are one element longer. Blocks may be empty
/// when `n > len`.
#[must_use]
pub fn split_blocks(values: &[f64], n: usize) -> Vec<&[f64]> {
    if n == 0 {
        return Vec::new();
    }
    let base = values.len() / n;
    let extra = values.len() % n;
    let mut out = Vec::with_capacity(n);
    let mut start = 0;
    for i in 0..n {
        let len = base + usize::from(i < extra);
        out.push(&values[start..start + len]);
        start += len;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn mean_and_std() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_abs_diff_eq!(mean(&v).unwrap_or_default(), 5.0);
        assert_abs_diff_eq!(std_dev(&v).unwrap_or_default(), 2.0);
        assert!(mean(&[]).is_none());
    }

    #[test]
    fn argmax_keeps_first_occurrence() {
        assert_eq!(argmax(&[]), None);
        assert_eq!(argmax(&[-1.0, -0.5, -0.5]), Some((1, -0.5)));
    }

    #[test]
    fn split_blocks_matches_uneven_lengths() {
        let v: Vec<f64> = (0..10).map(f64::from).collect();
        let blocks = split_blocks(&v, 3);
        let lens: Vec<usize> = blocks.iter().map(|b| b.len()).collect();
        assert_eq!(lens, vec![4, 3, 3]);
        assert_abs_diff_eq!(blocks[2][0], 7.0);
        assert!(split_blocks(&v, 0).is_empty());
    }
}

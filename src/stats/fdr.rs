//! Multiple-comparison correction of p-values

use std::cmp::Ordering;

use crate::f64_from_usize;

/// Benjamini-Hochberg false discovery rate adjustment
///
/// Returns the adjusted p-values in the same order as the input.
/// Adjusted values are never smaller than the raw values, never larger than
/// `1.0` and non-decreasing in the order of the raw p-values.
///
/// # Examples
///
/// ```
/// use pathmech::stats::fdr::benjamini_hochberg;
///
/// let adjusted = benjamini_hochberg(&[0.01, 0.04, 0.03, 0.20]);
/// assert!((adjusted[0] - 0.04).abs() < 1e-12);
/// assert!((adjusted[1] - 0.04 * 4.0 / 3.0).abs() < 1e-12);
/// assert!((adjusted[2] - 0.04 * 4.0 / 3.0).abs() < 1e-12);
/// assert!((adjusted[3] - 0.20).abs() < 1e-12);
/// ```
pub fn benjamini_hochberg(pvalues: &[f64]) -> Vec<f64> {
    let total = f64_from_usize(pvalues.len());
    let mut order: Vec<usize> = (0..pvalues.len()).collect();
    order.sort_by(|a, b| {
        pvalues[*a]
            .partial_cmp(&pvalues[*b])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(b))
    });

    let mut adjusted = vec![1.0; pvalues.len()];
    let mut running_min = 1.0f64;
    for (rank, idx) in order.iter().enumerate().rev() {
        let scaled = pvalues[*idx] * total / f64_from_usize(rank + 1);
        running_min = running_min.min(scaled);
        adjusted[*idx] = running_min.max(pvalues[*idx]).min(1.0);
    }
    adjusted
}

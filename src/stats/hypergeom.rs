//! One-sided exact test for over-representation
//!
//! The test is the hypergeometric survival function, which is identical to the
//! one-sided Fisher exact test of a 2x2 [`ContingencyTable`]. It is exact,
//! no sampling is involved.

use statrs::distribution::{DiscreteCDF, Hypergeometric};
use tracing::{debug, warn};

use crate::stats::ContingencyTable;

/// Returns the probability to observe at least as many category
/// members in the disease as the table contains
///
/// # Conventions
///
/// - No category member in the disease: `1.0`
/// - No background outside the disease, or every gene of the universe
///   is a category member: `1.0`, there is no contrast to test
///
/// # Examples
///
/// ```
/// use pathmech::stats::ContingencyTable;
/// use pathmech::stats::hypergeom::over_representation;
///
/// // 8 of 10 disease genes vs. 50 of 500 background genes
/// let table = ContingencyTable::new(8, 2, 50, 450);
/// assert!(over_representation(&table) < 1e-5);
///
/// // the same frequency as in the background
/// let table = ContingencyTable::new(1, 9, 50, 450);
/// assert!(over_representation(&table) > 0.5);
/// ```
pub fn over_representation(table: &ContingencyTable) -> f64 {
    let observed = table.in_disease_with();
    if observed == 0 {
        return 1.0;
    }
    if table.background_len() == 0 || table.successes() == table.population() {
        debug!("No contrast in {:?}", table);
        return 1.0;
    }

    let hyper = match Hypergeometric::new(table.population(), table.successes(), table.draws()) {
        Ok(hyper) => hyper,
        Err(err) => {
            warn!("Invalid contingency table {:?}: {}", table, err);
            return 1.0;
        }
    };

    // subtracting 1, because we want to test including the observed count
    // e.g. "8 or more", but sf by default calculates "more than 8"
    hyper.sf(observed - 1).clamp(0.0, 1.0)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reference_values() {
        // Numbers calculated here https://statisticsbyjim.com/probability/hypergeometric-distribution/
        // population 50, successes 25, draws 13
        let table = ContingencyTable::new(8, 5, 17, 20);
        assert!((over_representation(&table) - 0.26009737477738537).abs() < 1e-10);

        let table = ContingencyTable::new(13, 0, 12, 25);
        assert!((over_representation(&table) - 0.000014654490222007184).abs() < 1e-12);

        let table = ContingencyTable::new(2, 11, 23, 14);
        assert!((over_representation(&table) - 0.9996189832542451).abs() < 1e-10);
    }

    #[test]
    fn strong_enrichment() {
        let table = ContingencyTable::new(8, 2, 50, 450);
        let pvalue = over_representation(&table);
        assert!(pvalue > 0.0);
        assert!(pvalue < 1e-5);
    }

    #[test]
    fn degenerate_tables() {
        // no members
        assert!((over_representation(&ContingencyTable::new(0, 10, 50, 450)) - 1.0).abs() < f64::EPSILON);
        // category present in the full universe
        assert!((over_representation(&ContingencyTable::new(10, 0, 500, 0)) - 1.0).abs() < f64::EPSILON);
        // empty background
        assert!((over_representation(&ContingencyTable::new(3, 7, 0, 0)) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn all_disease_genes_in_category() {
        // 5 of 5 disease genes, 5 of 95 background genes
        let table = ContingencyTable::new(5, 0, 5, 90);
        let pvalue = over_representation(&table);
        // 10 choose 5 / 100 choose 5
        let expected = 252.0 / 75_287_520.0;
        assert!((pvalue - expected).abs() < 1e-12);
    }
}

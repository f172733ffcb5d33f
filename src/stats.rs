//! Statistical enrichment of functional categories within diseases
//!
//! For each disease, the [`EnrichmentEngine`] tests every functional category
//! that is present among the disease's genes for over-representation
//! compared to the [`Background`] of all annotated genes in the catalog.
//! Afterwards the p-values of the disease are adjusted with the
//! Benjamini-Hochberg procedure.
//!
//! # Examples
//!
//! ```
//! use pathmech::{GeneCatalog, FunctionalAnnotator, FunctionalCategory, RuleTable};
//! use pathmech::source::GeneRecord;
//! use pathmech::stats::EnrichmentEngine;
//!
//! let rules = RuleTable::from_tsv("prefix\tNDUF\tmitochondrial-energy-metabolism\n").unwrap();
//!
//! let mut catalog = GeneCatalog::default();
//! let hd: Vec<GeneRecord> = (1..=8)
//!     .map(|i| GeneRecord::new(&i.to_string(), &format!("NDUFA{i}"), "hsa05016"))
//!     .collect();
//! catalog.ingest(5016u32.into(), "Huntington disease", &hd);
//! let other: Vec<GeneRecord> = (100..200)
//!     .map(|i| GeneRecord::new(&i.to_string(), &format!("GENE{i}"), "hsa05010"))
//!     .collect();
//! catalog.ingest(5010u32.into(), "Alzheimer disease", &other);
//! catalog.annotate(&FunctionalAnnotator::new(&rules));
//!
//! let background = catalog.background();
//! let engine = EnrichmentEngine::new(&background, 0.05);
//! let results = engine
//!     .enrich_disease(&catalog, &5016u32.into(), &FunctionalCategory::ALL)
//!     .unwrap();
//!
//! assert_eq!(results.len(), 1);
//! assert_eq!(results[0].category(), FunctionalCategory::MitochondrialEnergyMetabolism);
//! assert!(results[0].significant());
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::annotations::{DiseaseId, Gene};
use crate::catalog::GeneCatalog;
use crate::category::FunctionalCategory;
use crate::{f64_from_usize, PathMechResult};

pub mod fdr;
pub mod hypergeom;

/// 2x2 contingency table of one (disease, category) test
///
/// |                | with category          | without category          |
/// | -------------- | ---------------------- | ------------------------- |
/// | **disease**    | `in_disease_with`      | `in_disease_without`      |
/// | **background** | `background_with`      | `background_without`      |
///
/// The background row only contains genes that are not part of the disease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContingencyTable {
    in_disease_with: u64,
    in_disease_without: u64,
    background_with: u64,
    background_without: u64,
}

impl ContingencyTable {
    /// Constructs a new table
    pub fn new(
        in_disease_with: u64,
        in_disease_without: u64,
        background_with: u64,
        background_without: u64,
    ) -> Self {
        Self {
            in_disease_with,
            in_disease_without,
            background_with,
            background_without,
        }
    }

    /// Disease genes that are members of the category
    pub fn in_disease_with(&self) -> u64 {
        self.in_disease_with
    }

    /// Disease genes that are not members of the category
    pub fn in_disease_without(&self) -> u64 {
        self.in_disease_without
    }

    /// Background genes outside the disease that are members of the category
    pub fn background_with(&self) -> u64 {
        self.background_with
    }

    /// Background genes outside the disease that are not members of the category
    pub fn background_without(&self) -> u64 {
        self.background_without
    }

    /// Total number of genes (`N`)
    pub fn population(&self) -> u64 {
        self.draws() + self.background_len()
    }

    /// Number of category members in the universe (`K`)
    pub fn successes(&self) -> u64 {
        self.in_disease_with + self.background_with
    }

    /// Number of disease genes (`n`)
    pub fn draws(&self) -> u64 {
        self.in_disease_with + self.in_disease_without
    }

    /// Number of background genes outside the disease
    pub fn background_len(&self) -> u64 {
        self.background_with + self.background_without
    }

    /// The fold enrichment of the category in the disease over the universe
    ///
    /// Returns `0.0` if the disease or the category has no genes
    pub fn fold_enrichment(&self) -> f64 {
        if self.draws() == 0 || self.successes() == 0 {
            return 0.0;
        }
        (u64_to_f64(self.in_disease_with) / u64_to_f64(self.draws()))
            / (u64_to_f64(self.successes()) / u64_to_f64(self.population()))
    }
}

fn u64_to_f64(n: u64) -> f64 {
    u32::try_from(n).map_or(f64::from(u32::MAX), f64::from)
}

/// The background universe: all annotated genes of the catalog
///
/// The background is materialized once, before any test runs, and is
/// read-only afterwards so that it can be shared between diseases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Background {
    size: u64,
    counts: [u64; FunctionalCategory::ALL.len()],
}

impl Background {
    /// Counts the category memberships of all annotated genes
    pub fn new<'a, I: IntoIterator<Item = &'a Gene>>(genes: I) -> Self {
        let mut size = 0;
        let mut counts = [0; FunctionalCategory::ALL.len()];
        for gene in genes.into_iter().filter(|gene| gene.is_annotated()) {
            size += 1;
            for membership in gene.memberships() {
                counts[membership.category().index()] += 1;
            }
        }
        Self { size, counts }
    }

    /// The number of annotated genes
    pub fn len(&self) -> u64 {
        self.size
    }

    /// Returns `true` if there are no annotated genes
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// The number of genes in the universe that are members of the category
    pub fn count(&self, category: FunctionalCategory) -> u64 {
        self.counts[category.index()]
    }
}

/// The result of testing one category in one disease
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentResult {
    disease: DiseaseId,
    category: FunctionalCategory,
    table: ContingencyTable,
    pvalue: f64,
    adjusted_pvalue: f64,
    significant: bool,
    enrichment: f64,
}

impl EnrichmentResult {
    /// The tested disease
    pub fn disease(&self) -> DiseaseId {
        self.disease
    }

    /// The tested category
    pub fn category(&self) -> FunctionalCategory {
        self.category
    }

    /// The contingency table of the test
    pub fn table(&self) -> &ContingencyTable {
        &self.table
    }

    /// Returns the raw p-value of the enrichment
    ///
    /// The p-value indicates the probability that the enrichment
    /// occured by chance
    pub fn pvalue(&self) -> f64 {
        self.pvalue
    }

    /// Returns the Benjamini-Hochberg adjusted p-value
    pub fn adjusted_pvalue(&self) -> f64 {
        self.adjusted_pvalue
    }

    /// Returns `true` if the adjusted p-value is at or below alpha
    pub fn significant(&self) -> bool {
        self.significant
    }

    /// Returns the fold enrichment over the background population
    pub fn enrichment(&self) -> f64 {
        self.enrichment
    }

    /// Returns the number of disease genes in the category
    pub fn count(&self) -> u64 {
        self.table.in_disease_with
    }
}

/// Tests categories for over-representation in diseases
#[derive(Debug, Clone, Copy)]
pub struct EnrichmentEngine<'a> {
    background: &'a Background,
    alpha: f64,
}

impl<'a> EnrichmentEngine<'a> {
    /// Constructs a new engine over a materialized background
    ///
    /// `alpha` is the significance threshold for the adjusted p-values
    pub fn new(background: &'a Background, alpha: f64) -> Self {
        Self { background, alpha }
    }

    /// Tests every category of `categories` that has at least one member
    /// among the annotated `genes` of the disease
    ///
    /// Results are sorted by adjusted p-value, ties are broken by category order.
    pub fn enrich(
        &self,
        disease: DiseaseId,
        genes: &[&Gene],
        categories: &[FunctionalCategory],
    ) -> Vec<EnrichmentResult> {
        let mut seen = HashSet::with_capacity(genes.len());
        let annotated: Vec<&Gene> = genes
            .iter()
            .copied()
            .filter(|gene| gene.is_annotated() && seen.insert(*gene.id()))
            .collect();
        let draws = annotated.len() as u64;
        let outside = self.background.len().saturating_sub(draws);

        let mut categories = categories.to_vec();
        categories.sort_unstable();
        categories.dedup();

        let mut tables = Vec::with_capacity(categories.len());
        for category in categories {
            let observed = annotated
                .iter()
                .filter(|gene| gene.memberships().contains(category))
                .count() as u64;
            if observed == 0 {
                debug!("Skipping {} in {}", category, disease);
                continue;
            }
            let background_with = self.background.count(category).saturating_sub(observed);
            let table = ContingencyTable::new(
                observed,
                draws - observed,
                background_with,
                outside.saturating_sub(background_with),
            );
            debug!(
                "Category:{}\tDisease:{}\tPopulation: {}, Successes: {}, Draws: {}, Observed: {}",
                category,
                disease,
                table.population(),
                table.successes(),
                table.draws(),
                observed
            );
            tables.push((category, table));
        }

        let pvalues: Vec<f64> = tables
            .iter()
            .map(|(_, table)| hypergeom::over_representation(table))
            .collect();
        let adjusted = fdr::benjamini_hochberg(&pvalues);

        let mut results: Vec<EnrichmentResult> = tables
            .into_iter()
            .zip(pvalues)
            .zip(adjusted)
            .map(|(((category, table), pvalue), adjusted_pvalue)| EnrichmentResult {
                disease,
                category,
                table,
                pvalue,
                adjusted_pvalue,
                significant: adjusted_pvalue <= self.alpha,
                enrichment: table.fold_enrichment(),
            })
            .collect();

        results.sort_by(|a, b| {
            a.adjusted_pvalue
                .total_cmp(&b.adjusted_pvalue)
                .then(a.category.cmp(&b.category))
        });
        results
    }

    /// Looks up the members of the disease in the catalog and runs [`EnrichmentEngine::enrich`]
    ///
    /// # Errors
    ///
    /// [`PathMechError::DoesNotExist`](crate::PathMechError::DoesNotExist) if the disease is not in the catalog
    pub fn enrich_disease(
        &self,
        catalog: &GeneCatalog,
        disease: &DiseaseId,
        categories: &[FunctionalCategory],
    ) -> PathMechResult<Vec<EnrichmentResult>> {
        let genes = catalog.members(disease)?;
        Ok(self.enrich(*disease, &genes, categories))
    }
}

/// Fraction of `count` in `total`, `0.0` for an empty total
pub(crate) fn fraction(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        f64_from_usize(count) / f64_from_usize(total)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::annotator::{FunctionalAnnotator, RuleTable};
    use crate::source::GeneRecord;
    use crate::PathMechError;

    fn records(range: std::ops::Range<u32>, prefix: &str, pathway: &str) -> Vec<GeneRecord> {
        range
            .map(|i| GeneRecord::new(&i.to_string(), &format!("{prefix}{i}"), pathway))
            .collect()
    }

    /// Disease 1: 8 of 10 genes mitochondrial, 2 apoptosis
    /// Disease 2: 50 of 500 genes mitochondrial, 5 apoptosis
    fn catalog() -> GeneCatalog {
        let rules = RuleTable::from_tsv(
            "prefix\tNDUF\tmitochondrial-energy-metabolism\n\
             prefix\tCASP\tapoptosis\n",
        )
        .unwrap();

        let mut catalog = GeneCatalog::default();
        let mut disease = records(0..8, "NDUF", "hsa05016");
        disease.extend(records(8..10, "CASP", "hsa05016"));
        catalog.ingest(1u32.into(), "Disease 1", &disease);

        let mut other = records(100..150, "NDUF", "hsa05010");
        other.extend(records(150..155, "CASP", "hsa05010"));
        other.extend(records(155..600, "GENE", "hsa05010"));
        catalog.ingest(2u32.into(), "Disease 2", &other);

        catalog.annotate(&FunctionalAnnotator::new(&rules));
        catalog
    }

    #[test]
    fn background_counts() {
        let catalog = catalog();
        let background = catalog.background();
        assert_eq!(background.len(), 510);
        assert_eq!(
            background.count(FunctionalCategory::MitochondrialEnergyMetabolism),
            58
        );
        assert_eq!(background.count(FunctionalCategory::Apoptosis), 7);
        assert_eq!(background.count(FunctionalCategory::Other), 445);
        assert_eq!(background.count(FunctionalCategory::Autophagy), 0);
    }

    #[test]
    fn contingency_tables() {
        let catalog = catalog();
        let background = catalog.background();
        let engine = EnrichmentEngine::new(&background, 0.05);
        let results = engine
            .enrich_disease(&catalog, &1u32.into(), &FunctionalCategory::ALL)
            .unwrap();
        assert_eq!(results.len(), 2);

        let mito = results
            .iter()
            .find(|r| r.category() == FunctionalCategory::MitochondrialEnergyMetabolism)
            .unwrap();
        assert_eq!(mito.table(), &ContingencyTable::new(8, 2, 50, 450));
        assert_eq!(mito.count(), 8);
        assert!(mito.pvalue() < 1e-5);
        assert!(mito.significant());
        assert!((mito.enrichment() - (0.8 / (58.0 / 510.0))).abs() < 1e-9);
    }

    #[test]
    fn sorted_by_adjusted_pvalue() {
        let catalog = catalog();
        let background = catalog.background();
        let engine = EnrichmentEngine::new(&background, 0.05);
        let results = engine
            .enrich_disease(&catalog, &2u32.into(), &FunctionalCategory::ALL)
            .unwrap();

        for window in results.windows(2) {
            assert!(window[0].adjusted_pvalue() <= window[1].adjusted_pvalue());
        }
        for result in &results {
            assert!(result.adjusted_pvalue() >= result.pvalue());
            assert!(result.adjusted_pvalue() <= 1.0);
        }
    }

    #[test]
    fn skips_absent_categories() {
        let catalog = catalog();
        let background = catalog.background();
        let engine = EnrichmentEngine::new(&background, 0.05);
        let results = engine
            .enrich_disease(&catalog, &1u32.into(), &[FunctionalCategory::Autophagy])
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn ties_broken_by_category_order() {
        // a single disease: every category covers the full universe
        // so every p-value is 1.0
        let rules = RuleTable::from_tsv("prefix\tX\tautophagy\nprefix\tX\tproteostasis\n").unwrap();
        let mut catalog = GeneCatalog::default();
        catalog.ingest(1u32.into(), "Disease 1", &records(0..4, "X", "hsa00001"));
        catalog.annotate(&FunctionalAnnotator::new(&rules));

        let background = catalog.background();
        let engine = EnrichmentEngine::new(&background, 0.05);
        let results = engine
            .enrich_disease(&catalog, &1u32.into(), &FunctionalCategory::ALL)
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].category(), FunctionalCategory::Proteostasis);
        assert_eq!(results[1].category(), FunctionalCategory::Autophagy);
        assert!(results.iter().all(|r| !r.significant()));
        assert!(results.iter().all(|r| (r.pvalue() - 1.0).abs() < f64::EPSILON));
    }

    #[test]
    fn empty_disease() {
        let mut catalog = GeneCatalog::default();
        catalog.mark_no_data(1u32.into(), "Disease 1", "offline");
        let background = catalog.background();
        let engine = EnrichmentEngine::new(&background, 0.05);
        assert!(engine
            .enrich_disease(&catalog, &1u32.into(), &FunctionalCategory::ALL)
            .unwrap()
            .is_empty());
        assert_eq!(
            engine.enrich_disease(&catalog, &2u32.into(), &FunctionalCategory::ALL),
            Err(PathMechError::DoesNotExist)
        );
    }

    #[test]
    fn repeated_genes_count_once() {
        let catalog = catalog();
        let background = catalog.background();
        let engine = EnrichmentEngine::new(&background, 0.05);
        let genes = catalog.members(&1u32.into()).unwrap();
        let mut repeated = genes.clone();
        repeated.extend(genes.iter().take(3));

        let results = engine.enrich(1u32.into(), &repeated, &FunctionalCategory::ALL);
        assert_eq!(results, engine.enrich(1u32.into(), &genes, &FunctionalCategory::ALL));
        let mito = results
            .iter()
            .find(|r| r.category() == FunctionalCategory::MitochondrialEnergyMetabolism)
            .unwrap();
        assert_eq!(mito.table(), &ContingencyTable::new(8, 2, 50, 450));
    }

    #[test]
    fn fold_enrichment_of_empty_table() {
        assert!(ContingencyTable::new(0, 0, 0, 0).fold_enrichment().abs() < f64::EPSILON);
    }

    #[test]
    fn fractions() {
        assert!(fraction(1, 0).abs() < f64::EPSILON);
        assert!((fraction(1, 4) - 0.25).abs() < f64::EPSILON);
    }
}

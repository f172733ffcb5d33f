//! Composite priority scores for therapeutic target triage
//!
//! Each gene receives two components, both normalized to `[0, 1]` by the
//! maximum value among the genes of the same disease:
//!
//! - **functional role**: the sum of the gene's category weights,
//!   not counting [`FunctionalCategory::Other`]
//! - **literature prevalence**: the curated value from the rule table
//!
//! The composite is the weighted sum of both components, using the
//! [`PriorityWeights`] of the configuration (`0.6` and `0.4` by default).

use serde::{Deserialize, Serialize};

use crate::annotations::{DiseaseId, Gene, GeneId};
use crate::catalog::GeneCatalog;
use crate::category::FunctionalCategory;
use crate::config::PriorityWeights;
use crate::PathMechResult;

/// The priority of one gene within one disease
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityScore {
    gene: GeneId,
    symbol: String,
    disease: DiseaseId,
    functional_role: f64,
    literature_prevalence: f64,
    composite: f64,
}

impl PriorityScore {
    /// Combines two normalized components into a composite score
    ///
    /// The components and the result are clamped to `[0, 1]`
    ///
    /// # Examples
    ///
    /// ```
    /// use pathmech::{PriorityScore, PriorityWeights};
    ///
    /// let score = PriorityScore::composite(1.0, 0.0, &PriorityWeights::default());
    /// assert_eq!(score, 0.6);
    /// ```
    pub fn composite(functional_role: f64, literature_prevalence: f64, weights: &PriorityWeights) -> f64 {
        let value = weights.functional_role * unit(functional_role)
            + weights.literature_prevalence * unit(literature_prevalence);
        unit(value)
    }

    /// The scored gene
    pub fn gene(&self) -> GeneId {
        self.gene
    }

    /// The symbol of the scored gene
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// The disease the score was computed for
    pub fn disease(&self) -> DiseaseId {
        self.disease
    }

    /// The normalized functional-role component
    pub fn functional_role(&self) -> f64 {
        self.functional_role
    }

    /// The normalized literature-prevalence component
    pub fn literature_prevalence(&self) -> f64 {
        self.literature_prevalence
    }

    /// The composite score, within `[0, 1]`
    pub fn score(&self) -> f64 {
        self.composite
    }
}

/// Clamps to `[0, 1]`, `NaN` becomes `0`
fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Normalizes `value` by `max`, all values are `0` if `max` is `0`
fn normalize(value: f64, max: f64) -> f64 {
    if max > 0.0 {
        unit(value / max)
    } else {
        0.0
    }
}

/// The raw functional-role value of a gene
pub fn functional_role(gene: &Gene) -> f64 {
    gene.memberships()
        .iter()
        .filter(|membership| membership.category() != FunctionalCategory::Other)
        .map(|membership| membership.weight())
        .sum()
}

/// Scores the genes of one disease
///
/// The normalization maxima are computed once, on construction.
///
/// # Examples
///
/// ```
/// use pathmech::{FunctionalAnnotator, GeneCatalog, PriorityScorer, PriorityWeights, RuleTable};
/// use pathmech::source::GeneRecord;
///
/// let rules = RuleTable::from_tsv(
///     "prefix\tCASP\tapoptosis\n\
///      literature\tCASP3\t120\n\
///      literature\tCASP9\t30\n"
/// ).unwrap();
///
/// let mut catalog = GeneCatalog::default();
/// catalog.ingest(5010u32.into(), "Alzheimer disease", &[
///     GeneRecord::new("hsa:836", "CASP3", "hsa05010"),
///     GeneRecord::new("hsa:842", "CASP9", "hsa05010"),
///     GeneRecord::new("hsa:1", "A1BG", "hsa05010"),
/// ]);
/// catalog.annotate(&FunctionalAnnotator::new(&rules));
///
/// let scorer = PriorityScorer::for_disease(&catalog, &5010u32.into(), PriorityWeights::default()).unwrap();
/// let ranking = scorer.rank();
///
/// assert_eq!(ranking[0].symbol(), "CASP3");
/// assert_eq!(ranking[0].score(), 1.0);
/// assert_eq!(ranking[2].symbol(), "A1BG");
/// assert_eq!(ranking[2].score(), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct PriorityScorer<'a> {
    disease: DiseaseId,
    genes: Vec<&'a Gene>,
    weights: PriorityWeights,
    max_role: f64,
    max_literature: f64,
}

impl<'a> PriorityScorer<'a> {
    /// Constructs a scorer over the genes of a disease
    pub fn new(disease: DiseaseId, genes: Vec<&'a Gene>, weights: PriorityWeights) -> Self {
        let max_role = genes
            .iter()
            .map(|gene| functional_role(gene))
            .fold(0.0, f64::max);
        let max_literature = genes
            .iter()
            .map(|gene| gene.literature())
            .fold(0.0, f64::max);
        Self {
            disease,
            genes,
            weights,
            max_role,
            max_literature,
        }
    }

    /// Constructs a scorer over the members of a disease in the catalog
    ///
    /// # Errors
    ///
    /// [`PathMechError::DoesNotExist`](crate::PathMechError::DoesNotExist) if the disease is not in the catalog
    pub fn for_disease(
        catalog: &'a GeneCatalog,
        disease: &DiseaseId,
        weights: PriorityWeights,
    ) -> PathMechResult<Self> {
        Ok(Self::new(*disease, catalog.members(disease)?, weights))
    }

    /// Scores a single gene against the maxima of the disease
    pub fn score(&self, gene: &Gene) -> PriorityScore {
        let role = normalize(functional_role(gene), self.max_role);
        let literature = normalize(gene.literature(), self.max_literature);
        PriorityScore {
            gene: *gene.id(),
            symbol: gene.symbol().to_string(),
            disease: self.disease,
            functional_role: role,
            literature_prevalence: literature,
            composite: PriorityScore::composite(role, literature, &self.weights),
        }
    }

    /// Scores all genes of the disease, highest score first
    ///
    /// Ties are broken by gene ID
    pub fn rank(&self) -> Vec<PriorityScore> {
        let mut scores: Vec<PriorityScore> =
            self.genes.iter().map(|gene| self.score(gene)).collect();
        scores.sort_by(|a, b| {
            b.composite
                .total_cmp(&a.composite)
                .then(a.gene.cmp(&b.gene))
        });
        scores
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::annotator::{FunctionalAnnotator, RuleTable};
    use crate::source::GeneRecord;
    use crate::PathMechError;

    fn catalog(rules: &str, records: &[GeneRecord]) -> GeneCatalog {
        let rules = RuleTable::from_tsv(rules).unwrap();
        let mut catalog = GeneCatalog::default();
        catalog.ingest(1u32.into(), "Disease", records);
        catalog.annotate(&FunctionalAnnotator::new(&rules));
        catalog
    }

    #[test]
    fn default_weighting() {
        let weights = PriorityWeights::default();
        assert!((PriorityScore::composite(1.0, 0.0, &weights) - 0.6).abs() < f64::EPSILON);
        assert!((PriorityScore::composite(0.0, 1.0, &weights) - 0.4).abs() < f64::EPSILON);
        assert!((PriorityScore::composite(1.0, 1.0, &weights) - 1.0).abs() < f64::EPSILON);
        assert!(PriorityScore::composite(0.0, 0.0, &weights).abs() < f64::EPSILON);
    }

    #[test]
    fn custom_weighting() {
        let weights = PriorityWeights::new(1.0, 0.0).unwrap();
        assert!((PriorityScore::composite(0.3, 1.0, &weights) - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn composite_is_bounded() {
        let weights = PriorityWeights::default();
        for (role, literature) in [(2.0, 2.0), (-1.0, 0.5), (f64::NAN, 1.0), (0.5, f64::INFINITY)] {
            let score = PriorityScore::composite(role, literature, &weights);
            assert!((0.0..=1.0).contains(&score));
        }
    }

    #[test]
    fn normalized_by_disease_maximum() {
        let catalog = catalog(
            "prefix\tCASP\tapoptosis\t0.5\n\
             gene\tHTT\tproteostasis\t1.0\n\
             gene\tHTT\tautophagy\t1.0\n\
             literature\tCASP3\t50\n\
             literature\tHTT\t200\n",
            &[
                GeneRecord::new("3064", "HTT", "hsa05016"),
                GeneRecord::new("836", "CASP3", "hsa05016"),
            ],
        );
        let scorer = PriorityScorer::for_disease(&catalog, &1u32.into(), PriorityWeights::default())
            .unwrap();

        let htt = scorer.score(catalog.gene(&3064u32.into()).unwrap());
        assert!((htt.functional_role() - 1.0).abs() < f64::EPSILON);
        assert!((htt.literature_prevalence() - 1.0).abs() < f64::EPSILON);
        assert!((htt.score() - 1.0).abs() < f64::EPSILON);

        let casp3 = scorer.score(catalog.gene(&836u32.into()).unwrap());
        assert!((casp3.functional_role() - 0.25).abs() < f64::EPSILON);
        assert!((casp3.literature_prevalence() - 0.25).abs() < f64::EPSILON);
        assert!((casp3.score() - 0.25).abs() < 1e-12);
        assert_eq!(casp3.disease(), DiseaseId::from(1u32));
    }

    #[test]
    fn zero_maximum() {
        let catalog = catalog(
            "",
            &[
                GeneRecord::new("1", "A1BG", "hsa05016"),
                GeneRecord::new("2", "A2M", "hsa05016"),
            ],
        );
        let scorer = PriorityScorer::for_disease(&catalog, &1u32.into(), PriorityWeights::default())
            .unwrap();
        for score in scorer.rank() {
            assert!(score.functional_role().abs() < f64::EPSILON);
            assert!(score.literature_prevalence().abs() < f64::EPSILON);
            assert!(score.score().abs() < f64::EPSILON);
        }
    }

    #[test]
    fn ranking_ties_by_gene_id() {
        let catalog = catalog(
            "prefix\tATG\tautophagy\n",
            &[
                GeneRecord::new("30", "ATG7", "hsa04140"),
                GeneRecord::new("10", "ATG5", "hsa04140"),
                GeneRecord::new("20", "A1BG", "hsa04140"),
                GeneRecord::new("5", "ATG12", "hsa04140"),
            ],
        );
        let scorer = PriorityScorer::for_disease(&catalog, &1u32.into(), PriorityWeights::default())
            .unwrap();
        let ids: Vec<GeneId> = scorer.rank().iter().map(PriorityScore::gene).collect();
        assert_eq!(
            ids,
            vec![GeneId::from(5u32), GeneId::from(10u32), GeneId::from(30u32), GeneId::from(20u32)]
        );
    }

    #[test]
    fn unknown_disease() {
        let catalog = catalog("", &[]);
        assert_eq!(
            PriorityScorer::for_disease(&catalog, &2u32.into(), PriorityWeights::default())
                .unwrap_err(),
            PathMechError::DoesNotExist
        );
    }
}

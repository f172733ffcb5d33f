use core::fmt::Debug;
use std::cmp::PartialEq;
use std::collections::BTreeSet;
use std::convert::TryFrom;
use std::fmt::Display;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::annotations::{numeric_part, AnnotationId, DiseaseId, PathwayId};
use crate::annotator::Annotation;
use crate::category::Memberships;
use crate::PathMechError;
use crate::DEFAULT_NUM_PATHWAYS;

/// A unique identifier for a [`Gene`]
///
/// This value can - in theory - represent any numerical unique value.
/// When using KEGG as pathway source, it represents the NCBI Gene ID
/// (KEGG uses `hsa:<NCBI-ID>` for human genes)
#[derive(
    Clone, Copy, Default, Debug, Hash, PartialEq, PartialOrd, Eq, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct GeneId {
    inner: u32,
}

impl AnnotationId for GeneId {
    /// Convert `self` to `u32`
    fn as_u32(&self) -> u32 {
        self.inner
    }
}

impl TryFrom<&str> for GeneId {
    type Error = PathMechError;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Ok(GeneId {
            inner: numeric_part(value)?,
        })
    }
}

impl From<u32> for GeneId {
    fn from(inner: u32) -> Self {
        GeneId { inner }
    }
}

impl Display for GeneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NCBI-GeneID:{}", self.inner)
    }
}

/// A single gene
///
/// A gene has a unique [`GeneId`] and a symbol and is connected to
/// the diseases and source pathways it was retrieved from.
/// After annotation it also carries its functional category memberships.
#[derive(Default, Debug, Clone)]
pub struct Gene {
    id: GeneId,
    symbol: String,
    diseases: BTreeSet<DiseaseId>,
    pathways: SmallVec<[PathwayId; DEFAULT_NUM_PATHWAYS]>,
    memberships: Memberships,
    unannotated: bool,
    literature: f64,
}

impl Gene {
    /// Initializes a new Gene
    ///
    /// This method should rarely, if ever, be used directly. The
    /// preferred way to create new genes is through
    /// [`GeneCatalog::add_gene`](crate::GeneCatalog::add_gene)
    /// to ensure that each gene exists only once.
    pub fn new(id: GeneId, symbol: &str) -> Gene {
        Gene {
            id,
            symbol: symbol.to_string(),
            ..Default::default()
        }
    }

    /// The unique [`GeneId`] of the gene, most likely the NCBI Gene ID
    pub fn id(&self) -> &GeneId {
        &self.id
    }

    /// The gene symbol, e.g. `HTT`
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// The diseases the gene was retrieved for
    pub fn diseases(&self) -> impl Iterator<Item = &DiseaseId> {
        self.diseases.iter()
    }

    /// The source pathway records the gene appears in, sorted by ID
    pub fn pathways(&self) -> &[PathwayId] {
        &self.pathways
    }

    /// Returns `true` if both genes appear in at least one common source pathway
    pub fn shares_pathway(&self, other: &Gene) -> bool {
        // both lists are sorted
        let (mut a, mut b) = (self.pathways.iter(), other.pathways.iter());
        let (mut x, mut y) = (a.next(), b.next());
        while let (Some(left), Some(right)) = (x, y) {
            match left.cmp(right) {
                std::cmp::Ordering::Less => x = a.next(),
                std::cmp::Ordering::Greater => y = b.next(),
                std::cmp::Ordering::Equal => return true,
            }
        }
        false
    }

    /// The functional category memberships
    ///
    /// The memberships are empty before the gene is annotated
    pub fn memberships(&self) -> &Memberships {
        &self.memberships
    }

    /// Returns `true` once the gene went through the annotator
    pub fn is_annotated(&self) -> bool {
        !self.memberships.is_empty()
    }

    /// Returns `true` if no rule matched the gene and it fell back to
    /// [`FunctionalCategory::Other`](crate::FunctionalCategory::Other)
    pub fn is_unannotated(&self) -> bool {
        self.unannotated
    }

    /// The curated literature prevalence of the gene (`0.0` if unknown)
    pub fn literature(&self) -> f64 {
        self.literature
    }

    /// Connect the gene to a disease
    ///
    /// # Note
    ///
    /// This method does **not** add the [`Gene`] to the disease.
    /// Use [`GeneCatalog::link`](crate::GeneCatalog::link) instead.
    pub fn add_disease(&mut self, disease: DiseaseId) -> bool {
        self.diseases.insert(disease)
    }

    /// Record a source pathway of the gene
    ///
    /// Returns `false` if the pathway was already recorded
    pub fn add_pathway(&mut self, pathway: PathwayId) -> bool {
        match self.pathways.binary_search(&pathway) {
            Ok(_) => false,
            Err(idx) => {
                self.pathways.insert(idx, pathway);
                true
            }
        }
    }

    /// Stores the result of the [`FunctionalAnnotator`](crate::FunctionalAnnotator)
    pub fn set_annotation(&mut self, annotation: Annotation) {
        self.unannotated = annotation.is_unannotated();
        self.literature = annotation.literature();
        self.memberships = annotation.into_memberships();
    }
}

impl PartialEq for Gene {
    fn eq(&self, other: &Gene) -> bool {
        self.id == other.id
    }
}
impl Eq for Gene {}

impl Hash for Gene {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn gene_id_from_kegg() {
        assert_eq!(GeneId::try_from("hsa:3064").unwrap(), GeneId::from(3064u32));
        assert_eq!(GeneId::try_from("3064").unwrap().as_u32(), 3064);
        assert!(GeneId::try_from("HTT").is_err());
        assert_eq!(GeneId::from(3064u32).to_string(), "NCBI-GeneID:3064");
    }

    #[test]
    fn pathways_are_unique_and_sorted() {
        let mut gene = Gene::new(3064u32.into(), "HTT");
        assert!(gene.add_pathway(5016u32.into()));
        assert!(gene.add_pathway(4140u32.into()));
        assert!(!gene.add_pathway(5016u32.into()));
        assert_eq!(gene.pathways(), &[PathwayId::from(4140u32), PathwayId::from(5016u32)]);
    }

    #[test]
    fn shared_pathways() {
        let mut htt = Gene::new(3064u32.into(), "HTT");
        htt.add_pathway(5016u32.into());
        htt.add_pathway(4140u32.into());

        let mut bdnf = Gene::new(627u32.into(), "BDNF");
        bdnf.add_pathway(4722u32.into());
        assert!(!htt.shares_pathway(&bdnf));

        bdnf.add_pathway(5016u32.into());
        assert!(htt.shares_pathway(&bdnf));
        assert!(bdnf.shares_pathway(&htt));
    }

    #[test]
    fn not_annotated_by_default() {
        let gene = Gene::new(3064u32.into(), "HTT");
        assert!(!gene.is_annotated());
        assert!(!gene.is_unannotated());
        assert!(gene.literature().abs() < f64::EPSILON);
    }
}

use core::fmt::Debug;
use std::collections::HashMap;

use tracing::{debug, warn};

use crate::annotations::{Disease, DiseaseId, Gene, GeneId, PathwayId};
use crate::annotator::FunctionalAnnotator;
use crate::source::GeneRecord;
use crate::stats::Background;
use crate::{PathMechError, PathMechResult};

/// `GeneCatalog` holds all [`Gene`]s and [`Disease`]s of one analysis session
///
/// All downstream components (interactome, enrichment, scoring) only
/// read from the catalog. It is built in three steps:
///
/// 1. Add diseases and their genes, either manually with
///    [`GeneCatalog::add_disease`], [`GeneCatalog::add_gene`] and [`GeneCatalog::link`]
///    or from source records with [`GeneCatalog::ingest`]
/// 2. Annotate all genes with [`GeneCatalog::annotate`]
/// 3. Materialize the [`Background`] with [`GeneCatalog::background`]
///
/// # Examples
///
/// ```
/// use pathmech::{FunctionalAnnotator, GeneCatalog, RuleTable};
/// use pathmech::source::GeneRecord;
///
/// let mut catalog = GeneCatalog::default();
/// let records = vec![
///     GeneRecord::new("hsa:3064", "HTT", "hsa05016"),
///     GeneRecord::new("hsa:627", "BDNF", "hsa05016"),
///     GeneRecord::new("hsa:627", "BDNF", "hsa05016"),
/// ];
/// catalog.ingest("hsa05016".try_into().unwrap(), "Huntington disease", &records);
///
/// let disease = catalog.disease(&5016u32.into()).unwrap();
/// assert_eq!(disease.len(), 2);
///
/// let rules = RuleTable::default_neuro().unwrap();
/// catalog.annotate(&FunctionalAnnotator::new(&rules));
/// assert!(catalog.gene_by_symbol("HTT").unwrap().is_annotated());
/// ```
#[derive(Default)]
pub struct GeneCatalog {
    genes: HashMap<GeneId, Gene>,
    diseases: HashMap<DiseaseId, Disease>,
    disease_order: Vec<DiseaseId>,
}

impl Debug for GeneCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "GeneCatalog with {} genes in {} diseases",
            self.genes.len(),
            self.diseases.len()
        )
    }
}

impl GeneCatalog {
    /// Returns the [`Gene`] of the provided [`GeneId`]
    pub fn gene(&self, gene_id: &GeneId) -> Option<&Gene> {
        self.genes.get(gene_id)
    }

    /// Returns the [`Gene`] with the given symbol (case-insensitive)
    ///
    /// If several genes share the symbol, the one with the smallest [`GeneId`]
    /// is returned. This method iterates all genes, prefer [`GeneCatalog::gene`]
    pub fn gene_by_symbol(&self, symbol: &str) -> Option<&Gene> {
        self.genes
            .values()
            .filter(|gene| gene.symbol().eq_ignore_ascii_case(symbol))
            .min_by_key(|gene| *gene.id())
    }

    /// Iterates all [`Gene`]s in arbitrary order
    pub fn genes(&self) -> std::collections::hash_map::Values<'_, GeneId, Gene> {
        self.genes.values()
    }

    /// Returns the [`Disease`] of the provided [`DiseaseId`]
    pub fn disease(&self, disease_id: &DiseaseId) -> Option<&Disease> {
        self.diseases.get(disease_id)
    }

    /// Iterates all [`Disease`]s in the order they were added
    pub fn diseases(&self) -> impl Iterator<Item = &Disease> {
        self.disease_order
            .iter()
            .filter_map(|id| self.diseases.get(id))
    }

    /// Returns the member [`Gene`]s of a disease, in member order
    ///
    /// # Errors
    ///
    /// [`PathMechError::DoesNotExist`] if the disease is not in the catalog
    pub fn members(&self, disease_id: &DiseaseId) -> PathMechResult<Vec<&Gene>> {
        let disease = self.disease(disease_id).ok_or(PathMechError::DoesNotExist)?;
        Ok(disease
            .members()
            .iter()
            .filter_map(|id| self.genes.get(id))
            .collect())
    }

    /// The number of genes
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    /// Returns `true` if the catalog contains no genes
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Add a disease to the catalog and return its [`DiseaseId`]
    ///
    /// If the disease already exists, it is not added again.
    pub fn add_disease(&mut self, name: &str, disease_id: DiseaseId) -> DiseaseId {
        if let std::collections::hash_map::Entry::Vacant(entry) = self.diseases.entry(disease_id)
        {
            entry.insert(Disease::new(disease_id, name));
            self.disease_order.push(disease_id);
        }
        disease_id
    }

    /// Add a gene to the catalog and return its [`GeneId`]
    ///
    /// If the gene already exists, it is not added again.
    ///
    /// # Note
    ///
    /// Adding a gene does not connect it to any disease.
    /// Use [`GeneCatalog::link`] for creating connections.
    ///
    /// # Errors
    ///
    /// If the `gene_id` is invalid, an [`PathMechError::ParseIntError`] is returned
    pub fn add_gene(&mut self, symbol: &str, gene_id: &str) -> PathMechResult<GeneId> {
        let id = GeneId::try_from(gene_id)?;
        self.genes
            .entry(id)
            .or_insert_with(|| Gene::new(id, symbol));
        Ok(id)
    }

    /// Connects a gene to a disease and records the source pathway
    ///
    /// Linking the same gene twice does not create duplicate members.
    ///
    /// # Errors
    ///
    /// [`PathMechError::DoesNotExist`] if the gene or disease is not in the catalog
    pub fn link(
        &mut self,
        disease_id: DiseaseId,
        gene_id: GeneId,
        pathway: PathwayId,
    ) -> PathMechResult<()> {
        let gene = self
            .genes
            .get_mut(&gene_id)
            .ok_or(PathMechError::DoesNotExist)?;
        let disease = self
            .diseases
            .get_mut(&disease_id)
            .ok_or(PathMechError::DoesNotExist)?;
        gene.add_disease(disease_id);
        gene.add_pathway(pathway);
        disease.add_member(gene_id);
        disease.add_pathway(pathway);
        Ok(())
    }

    /// Adds all source records of a disease
    ///
    /// Records with invalid gene or pathway identifiers are skipped with
    /// a warning and counted in [`Disease::skipped_records`].
    /// Returns the number of records that were added.
    ///
    /// Once records were added, an earlier no-data mark of the disease is cleared.
    pub fn ingest(&mut self, disease_id: DiseaseId, name: &str, records: &[GeneRecord]) -> usize {
        self.add_disease(name, disease_id);
        let mut added = 0;
        for record in records {
            match self.ingest_record(disease_id, record) {
                Ok(()) => added += 1,
                Err(err) => {
                    warn!(
                        "Skipping record {} ({}) of {}: {}",
                        record.gene_id(),
                        record.symbol(),
                        disease_id,
                        err
                    );
                    if let Some(disease) = self.diseases.get_mut(&disease_id) {
                        disease.record_skipped();
                    }
                }
            }
        }
        debug!("Ingested {} of {} records for {}", added, records.len(), disease_id);
        if added > 0 {
            if let Some(disease) = self.diseases.get_mut(&disease_id) {
                disease.clear_no_data();
            }
        }
        added
    }

    fn ingest_record(&mut self, disease_id: DiseaseId, record: &GeneRecord) -> PathMechResult<()> {
        let pathway = PathwayId::try_from(record.pathway_id())?;
        let gene_id = self.add_gene(record.symbol(), record.gene_id())?;
        self.link(disease_id, gene_id, pathway)
    }

    /// Registers a disease without any retrievable data
    ///
    /// A disease that already has member genes keeps them and is not marked.
    pub fn mark_no_data(&mut self, disease_id: DiseaseId, name: &str, reason: &str) {
        self.add_disease(name, disease_id);
        if let Some(disease) = self.diseases.get_mut(&disease_id) {
            if disease.is_empty() {
                warn!("No data for {}: {}", disease_id, reason);
                disease.set_no_data(reason.to_string());
            } else {
                warn!("Keeping {} genes of {}: {}", disease.len(), disease_id, reason);
            }
        }
    }

    /// Annotates every gene of the catalog
    ///
    /// Genes that are already annotated are annotated again, so that
    /// the result always reflects the given annotator.
    pub fn annotate(&mut self, annotator: &FunctionalAnnotator<'_>) {
        for gene in self.genes.values_mut() {
            let annotation = annotator.annotate(gene);
            gene.set_annotation(annotation);
        }
    }

    /// Materializes the background universe of all annotated genes
    pub fn background(&self) -> Background {
        Background::new(self.genes.values())
    }
}

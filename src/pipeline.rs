//! Batch analysis of many diseases
//!
//! The [`Pipeline`] ties all components together:
//!
//! 1. Gene records are fetched from a [`PathwaySource`] into the [`GeneCatalog`].
//!    Diseases without retrievable data are kept and reported as [`DiseaseStatus::NoData`].
//! 2. All genes are annotated and the enrichment background is materialized.
//! 3. Every disease is analyzed independently on the `rayon` thread pool.
//!    Within a disease, the interactome is built concurrently with
//!    enrichment and priority scoring.
//!
//! A batch can be cancelled between diseases with a [`CancellationToken`].
//! Reports of diseases that were completed before the cancellation are kept.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::annotations::{Disease, DiseaseId, Gene, GeneId};
use crate::annotator::{FunctionalAnnotator, RuleTable};
use crate::catalog::GeneCatalog;
use crate::category::FunctionalCategory;
use crate::config::Config;
use crate::interactome::{InteractomeBuilder, InteractomeEdge};
use crate::priority::{PriorityScore, PriorityScorer};
use crate::source::PathwaySource;
use crate::stats::{fraction, Background, EnrichmentEngine, EnrichmentResult};
use crate::PathMechResult;

/// Cooperative cancellation of a running batch
///
/// Clones share the same state, so one clone can be handed to another
/// thread to cancel the batch.
///
/// ```
/// use pathmech::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// assert!(!token.is_cancelled());
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Constructs a new, not cancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Diseases that are already running will complete.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Outcome of the analysis of one disease
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiseaseStatus {
    /// All genes were ingested and annotated
    Ok,
    /// Results are available, but some genes are unannotated or some
    /// source records could not be ingested
    Partial,
    /// No gene records could be retrieved
    NoData,
}

/// All results of one disease, as plain records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseReport {
    disease: DiseaseId,
    name: String,
    status: DiseaseStatus,
    reason: Option<String>,
    genes: usize,
    skipped_records: usize,
    unannotated: Vec<GeneId>,
    coverage: f64,
    edges: Vec<InteractomeEdge>,
    hubs: Vec<GeneId>,
    enrichment: Vec<EnrichmentResult>,
    priorities: Vec<PriorityScore>,
}

impl DiseaseReport {
    fn no_data(disease: &Disease) -> Self {
        Self {
            disease: *disease.id(),
            name: disease.name().to_string(),
            status: DiseaseStatus::NoData,
            reason: Some(
                disease
                    .no_data()
                    .unwrap_or("no gene records retrieved")
                    .to_string(),
            ),
            genes: 0,
            skipped_records: disease.skipped_records(),
            unannotated: Vec::new(),
            coverage: 0.0,
            edges: Vec::new(),
            hubs: Vec::new(),
            enrichment: Vec::new(),
            priorities: Vec::new(),
        }
    }

    /// The disease
    pub fn disease(&self) -> DiseaseId {
        self.disease
    }

    /// The display name of the disease
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The outcome of the analysis
    pub fn status(&self) -> DiseaseStatus {
        self.status
    }

    /// The reason why no data is available
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// The number of member genes
    pub fn genes(&self) -> usize {
        self.genes
    }

    /// The number of source records that could not be ingested
    pub fn skipped_records(&self) -> usize {
        self.skipped_records
    }

    /// Member genes without any matching annotation rule
    pub fn unannotated(&self) -> &[GeneId] {
        &self.unannotated
    }

    /// Fraction of member genes with at least one matching annotation rule
    pub fn coverage(&self) -> f64 {
        self.coverage
    }

    /// The edges of the disease interactome
    pub fn edges(&self) -> &[InteractomeEdge] {
        &self.edges
    }

    /// The hub genes of the disease interactome
    pub fn hubs(&self) -> &[GeneId] {
        &self.hubs
    }

    /// Enrichment results, sorted by adjusted p-value
    pub fn enrichment(&self) -> &[EnrichmentResult] {
        &self.enrichment
    }

    /// Priority scores of all member genes, highest first
    pub fn priorities(&self) -> &[PriorityScore] {
        &self.priorities
    }
}

/// The reports of one batch, in the disease order of the catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    reports: Vec<DiseaseReport>,
    cancelled: bool,
}

impl BatchReport {
    /// All completed disease reports
    pub fn reports(&self) -> &[DiseaseReport] {
        &self.reports
    }

    /// Returns the report of a disease, if it was completed
    pub fn report(&self, disease: &DiseaseId) -> Option<&DiseaseReport> {
        self.reports.iter().find(|report| report.disease == *disease)
    }

    /// Returns `true` if the batch was cancelled before all diseases completed
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// The number of completed disease reports
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    /// Returns `true` if no disease was completed
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Consumes the batch and returns the disease reports
    pub fn into_reports(self) -> Vec<DiseaseReport> {
        self.reports
    }
}

/// Runs the complete analysis for a batch of diseases
///
/// # Examples
///
/// ```
/// use pathmech::{CancellationToken, Config, DiseaseStatus, GeneCatalog, Pipeline, RuleTable};
/// use pathmech::source::TsvSource;
///
/// let source = TsvSource::from_tsv(
///     "#disease_id\tgene_id\tsymbol\tpathway_id\n\
///      hsa05016\thsa:3064\tHTT\thsa05016\n\
///      hsa05016\thsa:836\tCASP3\thsa05016\n\
///      hsa05016\thsa:842\tCASP9\thsa05016\n"
/// ).unwrap();
///
/// let pipeline = Pipeline::new(Config::default(), RuleTable::default_neuro().unwrap()).unwrap();
/// let mut catalog = GeneCatalog::default();
/// pipeline.ingest(&source, &mut catalog, &[
///     (5016u32.into(), "Huntington disease"),
///     (5020u32.into(), "Prion disease"),
/// ]);
///
/// let batch = pipeline.run(&mut catalog, &CancellationToken::new());
/// assert_eq!(batch.len(), 2);
/// assert_eq!(batch.reports()[0].status(), DiseaseStatus::Ok);
/// assert_eq!(batch.reports()[0].edges().len(), 1);
/// assert_eq!(batch.reports()[1].status(), DiseaseStatus::NoData);
/// ```
#[derive(Debug)]
pub struct Pipeline {
    config: Config,
    rules: RuleTable,
}

impl Pipeline {
    /// Constructs a new pipeline
    ///
    /// # Errors
    ///
    /// [`PathMechError::InvalidConfiguration`](crate::PathMechError::InvalidConfiguration)
    /// if the configuration is invalid
    pub fn new(config: Config, rules: RuleTable) -> PathMechResult<Self> {
        config.validate()?;
        debug!("Pipeline with {} rules and {:?}", rules.len(), config);
        Ok(Self { config, rules })
    }

    /// The configuration of the pipeline
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The annotation rules of the pipeline
    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Fetches the gene records of a single disease into the catalog
    ///
    /// Returns the number of ingested records
    ///
    /// # Errors
    ///
    /// [`PathMechError::Source`](crate::PathMechError::Source) if the source fails
    pub fn ingest_disease<S: PathwaySource>(
        &self,
        source: &S,
        catalog: &mut GeneCatalog,
        disease: DiseaseId,
        name: &str,
    ) -> PathMechResult<usize> {
        let records = source.fetch_pathway_genes(disease)?;
        Ok(catalog.ingest(disease, name, &records))
    }

    /// Fetches the gene records of all diseases into the catalog
    ///
    /// Failures of the source never abort the batch. The affected
    /// disease is added without genes and is reported as [`DiseaseStatus::NoData`],
    /// unless it already has genes from an earlier ingest.
    /// Returns the number of diseases with at least one ingested record.
    pub fn ingest<S: PathwaySource>(
        &self,
        source: &S,
        catalog: &mut GeneCatalog,
        diseases: &[(DiseaseId, &str)],
    ) -> usize {
        let mut with_data = 0;
        for (disease, name) in diseases {
            match self.ingest_disease(source, catalog, *disease, name) {
                Ok(0) => catalog.mark_no_data(*disease, name, "no gene records retrieved"),
                Ok(_) => with_data += 1,
                Err(err) => catalog.mark_no_data(*disease, name, &err.to_string()),
            }
        }
        info!("Ingested {} of {} diseases", with_data, diseases.len());
        with_data
    }

    /// Annotates the catalog and analyzes every disease
    pub fn run(&self, catalog: &mut GeneCatalog, cancel: &CancellationToken) -> BatchReport {
        catalog.annotate(&FunctionalAnnotator::new(&self.rules));
        self.analyze(catalog, cancel)
    }

    /// Analyzes every disease of an already annotated catalog
    pub fn analyze(&self, catalog: &GeneCatalog, cancel: &CancellationToken) -> BatchReport {
        self.analyze_with(catalog, cancel, |_| {})
    }

    /// Analyzes every disease and calls `on_report` as soon as a disease is completed
    ///
    /// `on_report` is called from the worker threads, in completion order.
    ///
    /// ```
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use pathmech::{CancellationToken, Config, GeneCatalog, Pipeline, RuleTable};
    /// use pathmech::source::GeneRecord;
    ///
    /// let pipeline = Pipeline::new(Config::default(), RuleTable::default_neuro().unwrap()).unwrap();
    /// let mut catalog = GeneCatalog::default();
    /// catalog.ingest(5016u32.into(), "Huntington disease", &[GeneRecord::new("hsa:3064", "HTT", "hsa05016")]);
    /// catalog.ingest(5010u32.into(), "Alzheimer disease", &[GeneRecord::new("hsa:836", "CASP3", "hsa05010")]);
    /// catalog.annotate(&pathmech::FunctionalAnnotator::new(pipeline.rules()));
    ///
    /// let completed = AtomicUsize::new(0);
    /// let batch = pipeline.analyze_with(&catalog, &CancellationToken::new(), |_| {
    ///     completed.fetch_add(1, Ordering::SeqCst);
    /// });
    /// assert_eq!(completed.into_inner(), batch.len());
    /// ```
    pub fn analyze_with<F>(
        &self,
        catalog: &GeneCatalog,
        cancel: &CancellationToken,
        on_report: F,
    ) -> BatchReport
    where
        F: Fn(&DiseaseReport) + Sync,
    {
        let background = catalog.background();
        info!(
            "Analyzing {} diseases with {} background genes",
            catalog.diseases().count(),
            background.len()
        );

        let diseases: Vec<&Disease> = catalog.diseases().collect();
        let reports: Vec<Option<DiseaseReport>> = diseases
            .par_iter()
            .map(|disease| {
                if cancel.is_cancelled() {
                    None
                } else {
                    let report = self.report(catalog, &background, disease);
                    on_report(&report);
                    Some(report)
                }
            })
            .collect();

        let cancelled = reports.iter().any(Option::is_none);
        if cancelled {
            warn!("Batch cancelled");
        }
        let reports: Vec<DiseaseReport> = reports.into_iter().flatten().collect();
        info!("Completed {} of {} diseases", reports.len(), diseases.len());
        BatchReport { reports, cancelled }
    }

    /// Analyzes a single disease
    fn report(&self, catalog: &GeneCatalog, background: &Background, disease: &Disease) -> DiseaseReport {
        let genes: Vec<&Gene> = disease
            .members()
            .iter()
            .filter_map(|id| catalog.gene(id))
            .collect();
        if disease.no_data().is_some() || genes.is_empty() {
            return DiseaseReport::no_data(disease);
        }

        let id = *disease.id();
        let builder = InteractomeBuilder::new(&self.config);
        let engine = EnrichmentEngine::new(background, self.config.alpha);
        let (graph, (enrichment, priorities)) = rayon::join(
            || builder.build(id, &genes),
            || {
                rayon::join(
                    || engine.enrich(id, &genes, &FunctionalCategory::ALL),
                    || PriorityScorer::new(id, genes.clone(), self.config.priority).rank(),
                )
            },
        );

        let unannotated: Vec<GeneId> = genes
            .iter()
            .filter(|gene| gene.is_unannotated())
            .map(|gene| *gene.id())
            .collect();
        let status = if unannotated.is_empty() && disease.skipped_records() == 0 {
            DiseaseStatus::Ok
        } else {
            DiseaseStatus::Partial
        };
        let hubs = graph.hubs().collect();
        debug!("{} ({}) completed: {:?}", disease.name(), id, status);

        DiseaseReport {
            disease: id,
            name: disease.name().to_string(),
            status,
            reason: None,
            genes: genes.len(),
            skipped_records: disease.skipped_records(),
            coverage: fraction(genes.len() - unannotated.len(), genes.len()),
            unannotated,
            edges: graph.into_edges(),
            hubs,
            enrichment,
            priorities,
        }
    }
}

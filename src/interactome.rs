//! Inferred functional coupling between the genes of a disease
//!
//! Edges are not experimental protein-protein interactions. Two genes are
//! coupled if they share functional categories:
//!
//! ```text
//! weight(a, b) = sum over shared categories c of min(weight_a(c), weight_b(c))
//!              + pathway_bonus, if the sum is > 0 and a and b share a source pathway
//! ```
//!
//! The category [`FunctionalCategory::Other`] never couples genes. Pairs with
//! a weight of `0` have no edge, so the graph is sparse.
//!
//! After construction, genes whose weighted degree exceeds the configured
//! percentile of all weighted degrees are labeled as hubs.
//!
//! # Examples
//!
//! ```
//! use pathmech::{Config, FunctionalAnnotator, GeneCatalog, RuleTable};
//! use pathmech::interactome::InteractomeBuilder;
//! use pathmech::source::GeneRecord;
//!
//! let rules = RuleTable::from_tsv(
//!     "gene\tA\tproteostasis\n\
//!      gene\tB\tproteostasis\n\
//!      gene\tB\tapoptosis\n\
//!      gene\tC\tapoptosis\n"
//! ).unwrap();
//!
//! let mut catalog = GeneCatalog::default();
//! catalog.ingest(1u32.into(), "D", &[
//!     GeneRecord::new("1", "A", "hsa00001"),
//!     GeneRecord::new("2", "B", "hsa00001"),
//!     GeneRecord::new("3", "C", "hsa00001"),
//! ]);
//! catalog.annotate(&FunctionalAnnotator::new(&rules));
//!
//! let builder = InteractomeBuilder::new(&Config::default());
//! let graph = builder.build_disease(&catalog, &1u32.into()).unwrap();
//!
//! assert_eq!(graph.edges().len(), 2);
//! assert!(graph.edge(&1u32.into(), &2u32.into()).is_some());
//! assert!(graph.edge(&2u32.into(), &3u32.into()).is_some());
//! assert!(graph.edge(&1u32.into(), &3u32.into()).is_none());
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::annotations::{DiseaseId, Gene, GeneId};
use crate::catalog::GeneCatalog;
use crate::category::FunctionalCategory;
use crate::config::Config;
use crate::utils::Combinations;
use crate::{f64_from_usize, PathMechResult};

/// An undirected, weighted edge between two genes of one disease
///
/// `gene_a` is always the smaller [`GeneId`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractomeEdge {
    disease: DiseaseId,
    gene_a: GeneId,
    gene_b: GeneId,
    weight: f64,
}

impl InteractomeEdge {
    fn new(disease: DiseaseId, a: GeneId, b: GeneId, weight: f64) -> Self {
        let (gene_a, gene_b) = if a <= b { (a, b) } else { (b, a) };
        Self {
            disease,
            gene_a,
            gene_b,
            weight,
        }
    }

    /// The disease of the edge
    pub fn disease(&self) -> DiseaseId {
        self.disease
    }

    /// The gene with the smaller ID
    pub fn gene_a(&self) -> GeneId {
        self.gene_a
    }

    /// The gene with the larger ID
    pub fn gene_b(&self) -> GeneId {
        self.gene_b
    }

    /// The coupling weight, always positive
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Returns the other end of the edge, or `None` if `gene` is not part of it
    pub fn other(&self, gene: &GeneId) -> Option<GeneId> {
        if *gene == self.gene_a {
            Some(self.gene_b)
        } else if *gene == self.gene_b {
            Some(self.gene_a)
        } else {
            None
        }
    }
}

/// A gene in the interactome with its connectivity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractomeNode {
    gene: GeneId,
    degree: usize,
    weighted_degree: f64,
    hub: bool,
}

impl InteractomeNode {
    /// The gene
    pub fn gene(&self) -> GeneId {
        self.gene
    }

    /// The number of edges of the gene
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// The sum of the weights of all edges of the gene
    pub fn weighted_degree(&self) -> f64 {
        self.weighted_degree
    }

    /// Returns `true` if the gene is a hub
    pub fn is_hub(&self) -> bool {
        self.hub
    }
}

/// The inferred coupling graph of one disease
#[derive(Debug, Clone, Default)]
pub struct Interactome {
    disease: DiseaseId,
    nodes: Vec<InteractomeNode>,
    edges: Vec<InteractomeEdge>,
    index: HashMap<GeneId, usize>,
    adjacency: HashMap<GeneId, Vec<usize>>,
}

impl Interactome {
    /// The disease of the graph
    pub fn disease(&self) -> DiseaseId {
        self.disease
    }

    /// All genes, in member order of the disease
    pub fn nodes(&self) -> &[InteractomeNode] {
        &self.nodes
    }

    /// All edges
    pub fn edges(&self) -> &[InteractomeEdge] {
        &self.edges
    }

    /// Consumes the graph and returns the edges
    pub fn into_edges(self) -> Vec<InteractomeEdge> {
        self.edges
    }

    /// Returns the node of a gene
    pub fn node(&self, gene: &GeneId) -> Option<&InteractomeNode> {
        self.index.get(gene).map(|idx| &self.nodes[*idx])
    }

    /// Returns the edge between two genes, in any order
    pub fn edge(&self, a: &GeneId, b: &GeneId) -> Option<&InteractomeEdge> {
        self.adjacency
            .get(a)?
            .iter()
            .map(|idx| &self.edges[*idx])
            .find(|edge| edge.other(a) == Some(*b))
    }

    /// Returns the neighbors of a gene and the weight of the connecting edge
    pub fn neighbors(&self, gene: &GeneId) -> Vec<(GeneId, f64)> {
        self.adjacency.get(gene).map_or_else(Vec::new, |edges| {
            edges
                .iter()
                .map(|idx| &self.edges[*idx])
                .filter_map(|edge| edge.other(gene).map(|other| (other, edge.weight)))
                .collect()
        })
    }

    /// Iterates the hub genes, in member order
    pub fn hubs(&self) -> impl Iterator<Item = GeneId> + '_ {
        self.nodes.iter().filter(|node| node.hub).map(|node| node.gene)
    }

    /// The number of genes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the graph has no genes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn add_edge(&mut self, edge: InteractomeEdge) {
        let idx = self.edges.len();
        for gene in [edge.gene_a, edge.gene_b] {
            self.adjacency.entry(gene).or_default().push(idx);
            if let Some(node) = self.index.get(&gene).map(|i| &mut self.nodes[*i]) {
                node.degree += 1;
                node.weighted_degree += edge.weight;
            }
        }
        self.edges.push(edge);
    }

    /// Labels all nodes with a weighted degree above the percentile as hubs
    fn label_hubs(&mut self, percentile: f64) {
        let Some(threshold) = percentile_value(
            self.nodes.iter().map(|node| node.weighted_degree).collect(),
            percentile,
        ) else {
            return;
        };
        for node in &mut self.nodes {
            node.hub = node.weighted_degree > threshold && node.weighted_degree > 0.0;
        }
    }
}

/// Nearest-rank percentile of the values, `None` for an empty list
fn percentile_value(mut values: Vec<f64>, percentile: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let rank = (percentile * f64_from_usize(values.len())).ceil();
    // rank is within [0, len] for percentiles within [0, 1]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let rank = (rank as usize).clamp(1, values.len());
    Some(values[rank - 1])
}

/// Builds [`Interactome`]s
#[derive(Debug, Clone, Copy)]
pub struct InteractomeBuilder {
    pathway_bonus: f64,
    hub_percentile: f64,
}

impl InteractomeBuilder {
    /// Constructs a builder with the pathway bonus and hub percentile of the config
    pub fn new(config: &Config) -> Self {
        Self {
            pathway_bonus: config.pathway_bonus,
            hub_percentile: config.hub_percentile,
        }
    }

    /// Returns the coupling weight of two genes
    pub fn coupling(&self, a: &Gene, b: &Gene) -> f64 {
        let shared: f64 = a
            .memberships()
            .iter()
            .filter(|membership| membership.category() != FunctionalCategory::Other)
            .filter_map(|membership| {
                b.memberships()
                    .weight(membership.category())
                    .map(|weight| weight.min(membership.weight()))
            })
            .sum();
        if shared > 0.0 && a.shares_pathway(b) {
            shared + self.pathway_bonus
        } else {
            shared
        }
    }

    /// Builds the graph of the given genes
    ///
    /// Genes that appear more than once are only used once.
    /// Fewer than two genes result in a graph without edges.
    pub fn build(&self, disease: DiseaseId, genes: &[&Gene]) -> Interactome {
        let mut seen = HashSet::with_capacity(genes.len());
        let genes: Vec<&Gene> = genes
            .iter()
            .copied()
            .filter(|gene| seen.insert(*gene.id()))
            .collect();

        let mut graph = Interactome {
            disease,
            ..Default::default()
        };
        for (idx, gene) in genes.iter().enumerate() {
            graph.index.insert(*gene.id(), idx);
            graph.nodes.push(InteractomeNode {
                gene: *gene.id(),
                degree: 0,
                weighted_degree: 0.0,
                hub: false,
            });
        }

        for (a, b) in Combinations::new(&genes) {
            let weight = self.coupling(a, b);
            if weight > 0.0 {
                graph.add_edge(InteractomeEdge::new(disease, *a.id(), *b.id(), weight));
            }
        }

        graph.label_hubs(self.hub_percentile);
        debug!(
            "Interactome of {}: {} genes, {} edges, {} hubs",
            disease,
            graph.len(),
            graph.edges.len(),
            graph.hubs().count()
        );
        graph
    }

    /// Looks up the members of the disease in the catalog and runs [`InteractomeBuilder::build`]
    ///
    /// # Errors
    ///
    /// [`PathMechError::DoesNotExist`](crate::PathMechError::DoesNotExist) if the disease is not in the catalog
    pub fn build_disease(
        &self,
        catalog: &GeneCatalog,
        disease: &DiseaseId,
    ) -> PathMechResult<Interactome> {
        Ok(self.build(*disease, &catalog.members(disease)?))
    }
}

/// An edge of the cross-disease interactome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedEdge {
    gene_a: GeneId,
    gene_b: GeneId,
    weight: f64,
    diseases: Vec<DiseaseId>,
}

impl SharedEdge {
    /// The gene with the smaller ID
    pub fn gene_a(&self) -> GeneId {
        self.gene_a
    }

    /// The gene with the larger ID
    pub fn gene_b(&self) -> GeneId {
        self.gene_b
    }

    /// The sum of the edge weights of all diseases
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// The diseases in which the two genes are coupled, sorted by ID
    pub fn diseases(&self) -> &[DiseaseId] {
        &self.diseases
    }
}

/// Couplings across several diseases
///
/// Edges of the same gene pair in different diseases are merged into
/// a single [`SharedEdge`]. Their weights accumulate.
#[derive(Debug, Clone, Default)]
pub struct SharedInteractome {
    edges: Vec<SharedEdge>,
}

impl SharedInteractome {
    /// Merges the edges of per-disease interactomes
    pub fn from_interactomes<'a, I: IntoIterator<Item = &'a Interactome>>(graphs: I) -> Self {
        let mut merged: BTreeMap<(GeneId, GeneId), (f64, Vec<DiseaseId>)> = BTreeMap::new();
        for graph in graphs {
            for edge in graph.edges() {
                let entry = merged
                    .entry((edge.gene_a, edge.gene_b))
                    .or_insert_with(|| (0.0, Vec::new()));
                entry.0 += edge.weight;
                if let Err(idx) = entry.1.binary_search(&edge.disease) {
                    entry.1.insert(idx, edge.disease);
                }
            }
        }
        Self {
            edges: merged
                .into_iter()
                .map(|((gene_a, gene_b), (weight, diseases))| SharedEdge {
                    gene_a,
                    gene_b,
                    weight,
                    diseases,
                })
                .collect(),
        }
    }

    /// Builds the interactomes of all given diseases and merges them
    ///
    /// # Errors
    ///
    /// [`PathMechError::DoesNotExist`](crate::PathMechError::DoesNotExist) if a disease is not in the catalog
    pub fn build(
        catalog: &GeneCatalog,
        diseases: &[DiseaseId],
        config: &Config,
    ) -> PathMechResult<Self> {
        let builder = InteractomeBuilder::new(config);
        let graphs = diseases
            .iter()
            .map(|disease| builder.build_disease(catalog, disease))
            .collect::<PathMechResult<Vec<Interactome>>>()?;
        Ok(Self::from_interactomes(&graphs))
    }

    /// All edges, sorted by gene pair
    pub fn edges(&self) -> &[SharedEdge] {
        &self.edges
    }

    /// Edges that are present in at least `min` diseases
    pub fn conserved(&self, min: usize) -> impl Iterator<Item = &SharedEdge> {
        self.edges.iter().filter(move |edge| edge.diseases.len() >= min)
    }
}

/// Returns the genes that are members of both diseases, in member order of `a`
///
/// # Errors
///
/// [`PathMechError::DoesNotExist`](crate::PathMechError::DoesNotExist) if a disease is not in the catalog
pub fn shared_genes(
    catalog: &GeneCatalog,
    a: &DiseaseId,
    b: &DiseaseId,
) -> PathMechResult<Vec<GeneId>> {
    let other = catalog
        .disease(b)
        .ok_or(crate::PathMechError::DoesNotExist)?;
    Ok(catalog
        .members(a)?
        .into_iter()
        .map(|gene| *gene.id())
        .filter(|gene| other.contains(gene))
        .collect())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::annotator::{FunctionalAnnotator, RuleTable};
    use crate::source::GeneRecord;
    use crate::PathMechError;

    fn annotated_catalog(rules: &str, diseases: &[(u32, &[(&str, &str, &str)])]) -> GeneCatalog {
        let rules = RuleTable::from_tsv(rules).unwrap();
        let mut catalog = GeneCatalog::default();
        for (disease, records) in diseases {
            let records: Vec<GeneRecord> = records
                .iter()
                .map(|(id, symbol, pathway)| GeneRecord::new(id, symbol, pathway))
                .collect();
            catalog.ingest((*disease).into(), "Disease", &records);
        }
        catalog.annotate(&FunctionalAnnotator::new(&rules));
        catalog
    }

    const ABC_RULES: &str = "gene\tA\tproteostasis\t0.8\n\
        gene\tB\tproteostasis\t0.5\n\
        gene\tB\tapoptosis\t1.0\n\
        gene\tC\tapoptosis\t0.4\n";

    #[test]
    fn shared_categories_create_edges() {
        let catalog = annotated_catalog(
            ABC_RULES,
            &[(
                1,
                &[("1", "A", "hsa00001"), ("2", "B", "hsa00002"), ("3", "C", "hsa00003")],
            )],
        );
        let graph = InteractomeBuilder::new(&Config::default())
            .build_disease(&catalog, &1u32.into())
            .unwrap();

        assert_eq!(graph.len(), 3);
        assert_eq!(graph.edges().len(), 2);

        let ab = graph.edge(&2u32.into(), &1u32.into()).unwrap();
        assert!((ab.weight() - 0.5).abs() < f64::EPSILON);
        assert_eq!(ab.gene_a(), GeneId::from(1u32));

        let bc = graph.edge(&2u32.into(), &3u32.into()).unwrap();
        assert!((bc.weight() - 0.4).abs() < f64::EPSILON);

        assert!(graph.edge(&1u32.into(), &3u32.into()).is_none());
        assert_eq!(graph.node(&2u32.into()).unwrap().degree(), 2);
        assert_eq!(graph.neighbors(&2u32.into()).len(), 2);
        assert!(graph.neighbors(&7u32.into()).is_empty());
    }

    #[test]
    fn pathway_bonus_only_for_coupled_genes() {
        let catalog = annotated_catalog(
            ABC_RULES,
            &[(
                1,
                &[("1", "A", "hsa00001"), ("2", "B", "hsa00001"), ("3", "C", "hsa00001")],
            )],
        );
        let graph = InteractomeBuilder::new(&Config::default())
            .build_disease(&catalog, &1u32.into())
            .unwrap();

        assert_eq!(graph.edges().len(), 2);
        let ab = graph.edge(&1u32.into(), &2u32.into()).unwrap();
        assert!((ab.weight() - 1.0).abs() < f64::EPSILON);
        assert!(graph.edge(&1u32.into(), &3u32.into()).is_none());
    }

    #[test]
    fn other_does_not_couple() {
        let catalog = annotated_catalog(
            "",
            &[(1, &[("1", "X", "hsa00001"), ("2", "Y", "hsa00001")])],
        );
        let graph = InteractomeBuilder::new(&Config::default())
            .build_disease(&catalog, &1u32.into())
            .unwrap();
        assert_eq!(graph.len(), 2);
        assert!(graph.edges().is_empty());
        assert_eq!(graph.hubs().count(), 0);
    }

    #[test]
    fn small_diseases_have_no_edges() {
        let catalog = annotated_catalog(ABC_RULES, &[(1, &[("1", "A", "hsa00001")])]);
        let builder = InteractomeBuilder::new(&Config::default());
        assert!(builder
            .build_disease(&catalog, &1u32.into())
            .unwrap()
            .edges()
            .is_empty());
        assert!(builder.build(2u32.into(), &[]).is_empty());
        assert_eq!(
            builder.build_disease(&catalog, &2u32.into()).unwrap_err(),
            PathMechError::DoesNotExist
        );
    }

    #[test]
    fn no_self_loops_or_duplicates() {
        let catalog = annotated_catalog(
            "prefix\tG\tautophagy\n",
            &[(
                1,
                &[("1", "G1", "hsa00001"), ("2", "G2", "hsa00001"), ("3", "G3", "hsa00001")],
            )],
        );
        let genes = catalog.members(&1u32.into()).unwrap();
        let mut duplicated = genes.clone();
        duplicated.extend(genes.iter().copied());

        let graph = InteractomeBuilder::new(&Config::default()).build(1u32.into(), &duplicated);
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.edges().len(), 3);

        let mut pairs = HashSet::new();
        for edge in graph.edges() {
            assert_ne!(edge.gene_a(), edge.gene_b());
            assert!(pairs.insert((edge.gene_a(), edge.gene_b())));
        }
    }

    #[test]
    fn hubs_by_weighted_degree() {
        // HUB shares a category with every leaf, each leaf with at most one other leaf
        let mut records = vec![("100", "HUB", "hsa00001")];
        let ids: Vec<String> = (1..10).map(|i| i.to_string()).collect();
        let symbols: Vec<String> = (1..10).map(|i| format!("LEAF{i}")).collect();
        for (id, symbol) in ids.iter().zip(&symbols) {
            records.push((id.as_str(), symbol.as_str(), "hsa00002"));
        }
        let mut rules = String::new();
        for i in 1..10 {
            let category = FunctionalCategory::ALL[i % 6];
            rules.push_str(&format!("gene\tLEAF{i}\t{category}\n"));
            rules.push_str(&format!("gene\tHUB\t{category}\n"));
        }
        let catalog = annotated_catalog(&rules, &[(1, records.as_slice())]);

        let graph = InteractomeBuilder::new(&Config::default())
            .build_disease(&catalog, &1u32.into())
            .unwrap();
        let hubs: Vec<GeneId> = graph.hubs().collect();
        assert_eq!(hubs, vec![GeneId::from(100u32)]);
        assert!(graph.node(&100u32.into()).unwrap().is_hub());
        assert_eq!(graph.node(&100u32.into()).unwrap().degree(), 9);
    }

    #[test]
    fn percentiles() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        assert_eq!(percentile_value(values.clone(), 0.9), Some(9.0));
        assert_eq!(percentile_value(values.clone(), 1.0), Some(10.0));
        assert_eq!(percentile_value(values.clone(), 0.0), Some(1.0));
        assert_eq!(percentile_value(values, 0.5), Some(5.0));
        assert_eq!(percentile_value(vec![], 0.9), None);
    }

    #[test]
    fn cross_disease_edges() {
        let catalog = annotated_catalog(
            ABC_RULES,
            &[
                (1, &[("1", "A", "hsa00001"), ("2", "B", "hsa00002"), ("3", "C", "hsa00003")]),
                (2, &[("1", "A", "hsa00004"), ("2", "B", "hsa00005")]),
            ],
        );
        let shared =
            SharedInteractome::build(&catalog, &[1u32.into(), 2u32.into()], &Config::default())
                .unwrap();

        assert_eq!(shared.edges().len(), 2);
        let ab = &shared.edges()[0];
        assert_eq!((ab.gene_a(), ab.gene_b()), (GeneId::from(1u32), GeneId::from(2u32)));
        assert_eq!(ab.diseases(), &[DiseaseId::from(1u32), DiseaseId::from(2u32)]);
        assert!((ab.weight() - 1.0).abs() < f64::EPSILON);
        assert_eq!(shared.conserved(2).count(), 1);

        assert_eq!(
            shared_genes(&catalog, &1u32.into(), &2u32.into()).unwrap(),
            vec![GeneId::from(1u32), GeneId::from(2u32)]
        );
        assert!(shared_genes(&catalog, &1u32.into(), &3u32.into()).is_err());
    }
}

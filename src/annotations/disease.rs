use std::collections::HashSet;
use std::fmt::Display;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::annotations::{numeric_part, AnnotationId, GeneId};
use crate::{PathMechError, DEFAULT_NUM_PATHWAYS};

/// A unique identifier for a [`Disease`]
///
/// The numerical part of the KEGG disease pathway, e.g. `hsa05016` for
/// Huntington disease
#[derive(
    Clone, Copy, Default, Debug, Hash, PartialEq, PartialOrd, Eq, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DiseaseId {
    inner: u32,
}

impl AnnotationId for DiseaseId {
    fn as_u32(&self) -> u32 {
        self.inner
    }
}

impl TryFrom<&str> for DiseaseId {
    type Error = PathMechError;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Ok(DiseaseId {
            inner: numeric_part(value)?,
        })
    }
}

impl From<u32> for DiseaseId {
    fn from(inner: u32) -> Self {
        DiseaseId { inner }
    }
}

impl Display for DiseaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "hsa{:05}", self.inner)
    }
}

/// A unique identifier for a source pathway record
#[derive(
    Clone, Copy, Default, Debug, Hash, PartialEq, PartialOrd, Eq, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PathwayId {
    inner: u32,
}

impl AnnotationId for PathwayId {
    fn as_u32(&self) -> u32 {
        self.inner
    }
}

impl TryFrom<&str> for PathwayId {
    type Error = PathMechError;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Ok(PathwayId {
            inner: numeric_part(value)?,
        })
    }
}

impl From<u32> for PathwayId {
    fn from(inner: u32) -> Self {
        PathwayId { inner }
    }
}

impl Display for PathwayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "hsa{:05}", self.inner)
    }
}

/// A disease and its ordered list of member genes
///
/// Each gene appears only once in the member list. The order of
/// the members is the order in which they were retrieved.
#[derive(Debug, Clone, Default)]
pub struct Disease {
    id: DiseaseId,
    name: String,
    members: Vec<GeneId>,
    member_set: HashSet<GeneId>,
    pathways: SmallVec<[PathwayId; DEFAULT_NUM_PATHWAYS]>,
    skipped_records: usize,
    no_data: Option<String>,
}

impl Disease {
    /// Initializes a new disease
    ///
    /// Use [`GeneCatalog::add_disease`](crate::GeneCatalog::add_disease) instead
    pub fn new(id: DiseaseId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// The unique ID of the disease
    pub fn id(&self) -> &DiseaseId {
        &self.id
    }

    /// The display name of the disease
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The member genes, in retrieval order
    pub fn members(&self) -> &[GeneId] {
        &self.members
    }

    /// Returns `true` if the gene is a member of the disease
    pub fn contains(&self, gene: &GeneId) -> bool {
        self.member_set.contains(gene)
    }

    /// The number of member genes
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if the disease has no member genes
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The source pathway identifiers the members were retrieved from
    pub fn pathways(&self) -> &[PathwayId] {
        &self.pathways
    }

    /// The number of source records that could not be ingested
    pub fn skipped_records(&self) -> usize {
        self.skipped_records
    }

    /// The reason why no data is available, if retrieval failed
    pub fn no_data(&self) -> Option<&str> {
        self.no_data.as_deref()
    }

    /// Adds a member gene
    ///
    /// Returns `false` if the gene is already a member
    pub fn add_member(&mut self, gene: GeneId) -> bool {
        if self.member_set.insert(gene) {
            self.members.push(gene);
            true
        } else {
            false
        }
    }

    /// Records a source pathway of the disease
    pub fn add_pathway(&mut self, pathway: PathwayId) -> bool {
        match self.pathways.binary_search(&pathway) {
            Ok(_) => false,
            Err(idx) => {
                self.pathways.insert(idx, pathway);
                true
            }
        }
    }

    pub(crate) fn record_skipped(&mut self) {
        self.skipped_records += 1;
    }

    pub(crate) fn set_no_data(&mut self, reason: String) {
        self.no_data = Some(reason);
    }

    pub(crate) fn clear_no_data(&mut self) {
        self.no_data = None;
    }
}

impl PartialEq for Disease {
    fn eq(&self, other: &Disease) -> bool {
        self.id == other.id
    }
}
impl Eq for Disease {}

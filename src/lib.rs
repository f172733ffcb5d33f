#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
use std::num::ParseIntError;
use thiserror::Error;

pub mod annotations;
pub mod annotator;
pub mod catalog;
pub mod category;
pub mod config;
pub mod interactome;
pub mod parser;
pub mod pipeline;
pub mod priority;
pub mod source;
pub mod stats;
pub mod utils;

pub use annotations::{Disease, DiseaseId, Gene, GeneId, PathwayId};
pub use annotator::{Annotation, FunctionalAnnotator, RuleTable};
pub use catalog::GeneCatalog;
pub use category::{CategoryMembership, FunctionalCategory};
pub use config::{Config, PriorityWeights};
pub use interactome::{Interactome, InteractomeEdge};
pub use pipeline::{BatchReport, CancellationToken, DiseaseReport, DiseaseStatus, Pipeline};
pub use priority::{PriorityScore, PriorityScorer};
pub use stats::EnrichmentResult;

const DEFAULT_NUM_CATEGORIES: usize = 4;
const DEFAULT_NUM_PATHWAYS: usize = 4;

/// Main Error type for this crate
#[derive(Error, Debug, PartialEq)]
pub enum PathMechError {
    /// The disease or gene is not present in the catalog
    #[error("record does not exist")]
    DoesNotExist,
    /// Parsing of an integer failed
    #[error("unable to parse Integer")]
    ParseIntError,
    /// Invalid data in an input file or identifier
    #[error("invalid input data: {0}")]
    InvalidInput(String),
    /// Failed to open a file
    #[error("cannot open file {0}")]
    CannotOpenFile(String),
    /// The configuration is invalid, no analysis can be run with it
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// The rule table references a category that does not exist
    #[error("unknown functional category: {0}")]
    UnknownCategory(String),
    /// The upstream pathway source failed
    #[error("pathway source failed: {0}")]
    Source(#[from] source::SourceError),
}

impl From<ParseIntError> for PathMechError {
    fn from(_: ParseIntError) -> Self {
        PathMechError::ParseIntError
    }
}

/// Shortcut for `Result<T, PathMechError>`
pub type PathMechResult<T> = Result<T, PathMechError>;

/// Converts a count into `f64`
///
/// Counts in this crate are gene numbers and fit into `u32`,
/// which converts into `f64` without loss of precision.
fn f64_from_usize(n: usize) -> f64 {
    u32::try_from(n).map_or(f64::from(u32::MAX), f64::from)
}

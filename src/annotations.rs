//! Genes and Diseases make up the records of a [`GeneCatalog`](crate::GeneCatalog)
//!
//! This module contains structs to represent [`Gene`]s, [`Disease`]s and
//! the identifiers of the pathways they were retrieved from.
//!
//! The underlying principle for all annotations is the same:
//! - Each record (gene, disease, pathway) has a unique numerical identifier.
//! - Identifiers can be parsed from the prefixed notation used by KEGG,
//!   e.g. `hsa:3064` for genes or `hsa05016` for disease pathways
//! - Genes hold information about which diseases and pathways they belong to

mod disease;
mod gene;
use core::fmt::Debug;
use core::hash::Hash;
use std::fmt::Display;

pub use disease::{Disease, DiseaseId, PathwayId};
pub use gene::{Gene, GeneId};

use crate::PathMechResult;

/// All annotations ([`Gene`]s, [`Disease`]s) are defined by a unique ID that is constrained by this trait
///
/// The ID must be unique only within the annotation type, i.e. a gene and a disease
/// can have the same ID.
pub trait AnnotationId:
    Clone
    + Copy
    + Debug
    + Hash
    + PartialEq
    + PartialOrd
    + Eq
    + Ord
    + Display
    + From<u32>
    + for<'a> TryFrom<&'a str>
{
    /// Return the integer representation of the annotation ID
    fn as_u32(&self) -> u32;
}

/// Extracts the numerical part of a prefixed identifier
///
/// Everything up to the last `:` is dropped, then all leading letters.
///
/// ```text
/// path:hsa05016  => 5016
/// hsa:3064       => 3064
/// 3064           => 3064
/// ```
fn numeric_part(value: &str) -> PathMechResult<u32> {
    let value = value.trim();
    let tail = value.rsplit_once(':').map_or(value, |(_, tail)| tail);
    Ok(tail
        .trim_start_matches(|c: char| c.is_ascii_alphabetic())
        .parse::<u32>()?)
}

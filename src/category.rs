//! Functional mechanism categories that genes are classified into

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{PathMechError, PathMechResult, DEFAULT_NUM_CATEGORIES};

/// A coarse biological role bucket used for enrichment testing
///
/// The set of categories is closed. The declaration order is the
/// canonical order and is used to break ties when sorting results.
#[derive(
    Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum FunctionalCategory {
    /// Oxidative phosphorylation, TCA cycle, mitochondrial dynamics
    MitochondrialEnergyMetabolism,
    /// Protein folding, ubiquitin-proteasome system, chaperones
    Proteostasis,
    /// Glutamate receptor overactivation and calcium overload
    Excitotoxicity,
    /// Programmed cell death
    Apoptosis,
    /// Lysosomal and autophagic clearance
    Autophagy,
    /// Synaptic transmission and neurotrophic signaling
    SynapticSignaling,
    /// Genes without any matching rule
    Other,
}

impl FunctionalCategory {
    /// All categories, in canonical order
    pub const ALL: [FunctionalCategory; 7] = [
        FunctionalCategory::MitochondrialEnergyMetabolism,
        FunctionalCategory::Proteostasis,
        FunctionalCategory::Excitotoxicity,
        FunctionalCategory::Apoptosis,
        FunctionalCategory::Autophagy,
        FunctionalCategory::SynapticSignaling,
        FunctionalCategory::Other,
    ];

    /// The name of the category as used in rule tables and reports
    pub fn name(&self) -> &'static str {
        match self {
            FunctionalCategory::MitochondrialEnergyMetabolism => "mitochondrial-energy-metabolism",
            FunctionalCategory::Proteostasis => "proteostasis",
            FunctionalCategory::Excitotoxicity => "excitotoxicity",
            FunctionalCategory::Apoptosis => "apoptosis",
            FunctionalCategory::Autophagy => "autophagy",
            FunctionalCategory::SynapticSignaling => "synaptic-signaling",
            FunctionalCategory::Other => "other",
        }
    }

    /// Returns the position of the category in [`FunctionalCategory::ALL`]
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl Display for FunctionalCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for FunctionalCategory {
    type Err = PathMechError;

    /// Parses the category name
    ///
    /// Matching ignores case and treats `_` and spaces like `-`
    ///
    /// # Errors
    ///
    /// Unknown names return [`PathMechError::UnknownCategory`]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        FunctionalCategory::ALL
            .into_iter()
            .find(|category| category.name() == normalized)
            .ok_or_else(|| PathMechError::UnknownCategory(s.to_string()))
    }
}

/// A gene's membership in a [`FunctionalCategory`]
///
/// The weight is an independent evidence strength in `[0, 1]`.
/// Weights across the categories of one gene do not need to sum to 1.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryMembership {
    category: FunctionalCategory,
    weight: f64,
}

impl CategoryMembership {
    /// Constructs a new membership
    ///
    /// # Errors
    ///
    /// Returns [`PathMechError::InvalidConfiguration`] if the weight is not within `[0, 1]`
    ///
    /// # Examples
    ///
    /// ```
    /// use pathmech::{CategoryMembership, FunctionalCategory};
    ///
    /// let membership = CategoryMembership::new(FunctionalCategory::Apoptosis, 0.8).unwrap();
    /// assert_eq!(membership.category(), FunctionalCategory::Apoptosis);
    ///
    /// assert!(CategoryMembership::new(FunctionalCategory::Apoptosis, 1.2).is_err());
    /// ```
    pub fn new(category: FunctionalCategory, weight: f64) -> PathMechResult<Self> {
        if !(0.0..=1.0).contains(&weight) {
            return Err(PathMechError::InvalidConfiguration(format!(
                "weight {weight} of {category} is outside [0, 1]"
            )));
        }
        Ok(Self { category, weight })
    }

    /// The fallback membership of genes without any matching rule
    pub fn unannotated() -> Self {
        Self {
            category: FunctionalCategory::Other,
            weight: 1.0,
        }
    }

    /// The category
    pub fn category(&self) -> FunctionalCategory {
        self.category
    }

    /// The evidence strength of the membership
    pub fn weight(&self) -> f64 {
        self.weight
    }
}

/// The category memberships of a single gene
///
/// Each category appears at most once, sorted in canonical order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Memberships {
    inner: SmallVec<[CategoryMembership; DEFAULT_NUM_CATEGORIES]>,
}

impl Memberships {
    /// Constructs a new, empty set of memberships
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a membership
    ///
    /// If the category is already present, the higher weight is kept.
    pub fn insert(&mut self, membership: CategoryMembership) {
        match self
            .inner
            .binary_search_by_key(&membership.category, CategoryMembership::category)
        {
            Ok(idx) => {
                if membership.weight > self.inner[idx].weight {
                    self.inner[idx] = membership;
                }
            }
            Err(idx) => self.inner.insert(idx, membership),
        }
    }

    /// Returns the weight of the category, or `None` if the gene is not a member
    pub fn weight(&self, category: FunctionalCategory) -> Option<f64> {
        self.inner
            .binary_search_by_key(&category, CategoryMembership::category)
            .ok()
            .map(|idx| self.inner[idx].weight)
    }

    /// Returns `true` if the gene is a member of the category
    pub fn contains(&self, category: FunctionalCategory) -> bool {
        self.weight(category).is_some()
    }

    /// Returns `true` if there are no memberships
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of memberships
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Iterates the memberships in canonical category order
    pub fn iter(&self) -> std::slice::Iter<'_, CategoryMembership> {
        self.inner.iter()
    }
}

impl<'a> IntoIterator for &'a Memberships {
    type Item = &'a CategoryMembership;
    type IntoIter = std::slice::Iter<'a, CategoryMembership>;
    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl FromIterator<CategoryMembership> for Memberships {
    fn from_iter<T: IntoIterator<Item = CategoryMembership>>(iter: T) -> Self {
        let mut memberships = Memberships::new();
        for membership in iter {
            memberships.insert(membership);
        }
        memberships
    }
}

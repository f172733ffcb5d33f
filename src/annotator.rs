//! Assigns functional mechanism categories to genes
//!
//! The [`FunctionalAnnotator`] is a pure function over an immutable
//! [`RuleTable`]. The rule table is loaded once per session, either from
//! a rule file (see [`RuleTable::from_file`]) or built in code.
//!
//! # Rules
//!
//! - **prefix** rules match the start of a gene symbol, e.g. all `NDUF*`
//!   genes are part of complex I of the respiratory chain. All matching
//!   prefix rules contribute their category.
//! - **gene** rules are literature-curated overrides for a single gene,
//!   identified by symbol or gene ID. If a gene has any override, prefix
//!   rules are ignored for it.
//! - **literature** rules store a curated literature prevalence value
//!   for a gene, used by the [`PriorityScorer`](crate::PriorityScorer)
//!
//! Genes without any matching rule are not an error. They receive
//! [`FunctionalCategory::Other`] with weight `1.0` and are flagged as unannotated.
//!
//! # Examples
//!
//! ```
//! use pathmech::{FunctionalAnnotator, FunctionalCategory, Gene, RuleTable};
//!
//! let rules = RuleTable::from_tsv(
//!     "prefix\tCASP\tapoptosis\t1.0\n\
//!      gene\tHTT\tproteostasis\t0.9\n"
//! ).unwrap();
//! let annotator = FunctionalAnnotator::new(&rules);
//!
//! let casp3 = Gene::new(836u32.into(), "CASP3");
//! let annotation = annotator.annotate(&casp3);
//! assert_eq!(annotation.memberships().weight(FunctionalCategory::Apoptosis), Some(1.0));
//!
//! let unknown = Gene::new(1u32.into(), "A1BG");
//! assert!(annotator.annotate(&unknown).is_unannotated());
//! ```

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};

use crate::annotations::{Gene, GeneId};
use crate::category::{CategoryMembership, Memberships};
use crate::parser;
use crate::{PathMechError, PathMechResult};

const DEFAULT_NEURO_RULES: &str = include_str!("../data/default_rules.tsv");

/// Identifies a gene in the rule table, either by ID or by symbol
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum GeneKey {
    Id(GeneId),
    Symbol(String),
}

impl GeneKey {
    /// Numeric keys and keys with a database prefix (`hsa:3064`) are IDs,
    /// everything else is a symbol. Symbols are matched case-insensitive.
    fn parse(key: &str) -> PathMechResult<Self> {
        let key = key.trim();
        if key.is_empty() {
            return Err(PathMechError::InvalidInput("empty gene key".to_string()));
        }
        if key.contains(':') || key.bytes().all(|b| b.is_ascii_digit()) {
            Ok(GeneKey::Id(GeneId::try_from(key)?))
        } else {
            Ok(GeneKey::Symbol(key.to_ascii_uppercase()))
        }
    }
}

#[derive(Debug, Clone)]
struct PrefixRule {
    prefix: String,
    membership: CategoryMembership,
}

/// The immutable lookup table used by the [`FunctionalAnnotator`]
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    prefixes: Vec<PrefixRule>,
    overrides: HashMap<GeneKey, Memberships>,
    literature: HashMap<GeneKey, f64>,
}

impl RuleTable {
    /// Constructs a new, empty rule table
    ///
    /// Every gene will be unannotated with an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a rule table from a tab separated string
    ///
    /// # Errors
    ///
    /// - [`PathMechError::UnknownCategory`] if a rule references an unknown category
    /// - [`PathMechError::InvalidConfiguration`] if a weight is outside `[0, 1]`
    /// - [`PathMechError::InvalidInput`] for malformed lines
    pub fn from_tsv(content: &str) -> PathMechResult<Self> {
        parser::rule_table::parse(content)
    }

    /// Reads a rule table from a tab separated file
    ///
    /// # Errors
    ///
    /// [`PathMechError::CannotOpenFile`] if the file is not readable,
    /// otherwise see [`RuleTable::from_tsv`]
    pub fn from_file<P: AsRef<Path>>(path: P) -> PathMechResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| PathMechError::CannotOpenFile(path.display().to_string()))?;
        Self::from_tsv(&content)
    }

    /// The curated rule table for neurodegenerative disease pathways
    /// that ships with this crate
    ///
    /// # Errors
    ///
    /// See [`RuleTable::from_tsv`]
    pub fn default_neuro() -> PathMechResult<Self> {
        Self::from_tsv(DEFAULT_NEURO_RULES)
    }

    /// Adds a rule that applies to all gene symbols starting with `prefix`
    pub fn add_prefix(&mut self, prefix: &str, membership: CategoryMembership) {
        self.prefixes.push(PrefixRule {
            prefix: prefix.trim().to_ascii_uppercase(),
            membership,
        });
    }

    /// Adds a curated override for a single gene, identified by symbol or ID
    ///
    /// # Errors
    ///
    /// [`PathMechError::InvalidInput`] if the key is empty or an invalid ID
    pub fn add_override(&mut self, key: &str, membership: CategoryMembership) -> PathMechResult<()> {
        self.overrides
            .entry(GeneKey::parse(key)?)
            .or_default()
            .insert(membership);
        Ok(())
    }

    /// Sets the literature prevalence of a single gene, identified by symbol or ID
    ///
    /// # Errors
    ///
    /// - [`PathMechError::InvalidConfiguration`] if the value is negative or not finite
    /// - [`PathMechError::InvalidInput`] if the key is empty or an invalid ID
    pub fn set_literature(&mut self, key: &str, value: f64) -> PathMechResult<()> {
        if !value.is_finite() || value < 0.0 {
            return Err(PathMechError::InvalidConfiguration(format!(
                "literature prevalence of {key} must be a non-negative number"
            )));
        }
        self.literature.insert(GeneKey::parse(key)?, value);
        Ok(())
    }

    /// The total number of rules
    pub fn len(&self) -> usize {
        self.prefixes.len()
            + self.overrides.values().map(Memberships::len).sum::<usize>()
            + self.literature.len()
    }

    /// Returns `true` if the table does not contain any rule
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup<'a, T>(map: &'a HashMap<GeneKey, T>, gene: &Gene) -> Option<&'a T> {
        map.get(&GeneKey::Id(*gene.id())).or_else(|| {
            map.get(&GeneKey::Symbol(gene.symbol().to_ascii_uppercase()))
        })
    }
}

/// The result of annotating a single gene
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    memberships: Memberships,
    unannotated: bool,
    literature: f64,
}

impl Annotation {
    /// The category memberships, never empty
    pub fn memberships(&self) -> &Memberships {
        &self.memberships
    }

    /// Returns `true` if no rule matched the gene
    pub fn is_unannotated(&self) -> bool {
        self.unannotated
    }

    /// The curated literature prevalence value, `0.0` if not curated
    pub fn literature(&self) -> f64 {
        self.literature
    }

    pub(crate) fn into_memberships(self) -> Memberships {
        self.memberships
    }
}

/// Assigns [`FunctionalCategory`](crate::FunctionalCategory) memberships to [`Gene`]s
#[derive(Debug, Clone, Copy)]
pub struct FunctionalAnnotator<'a> {
    rules: &'a RuleTable,
}

impl<'a> FunctionalAnnotator<'a> {
    /// Constructs a new annotator over a rule table
    pub fn new(rules: &'a RuleTable) -> Self {
        Self { rules }
    }

    /// Annotates a single gene
    ///
    /// The result only depends on the rule table and the gene's ID and symbol.
    pub fn annotate(&self, gene: &Gene) -> Annotation {
        let literature = RuleTable::lookup(&self.rules.literature, gene)
            .copied()
            .unwrap_or_default();

        if let Some(curated) = RuleTable::lookup(&self.rules.overrides, gene) {
            debug!("Curated annotation for {} ({})", gene.symbol(), gene.id());
            return Annotation {
                memberships: curated.clone(),
                unannotated: false,
                literature,
            };
        }

        let symbol = gene.symbol().to_ascii_uppercase();
        let memberships: Memberships = self
            .rules
            .prefixes
            .iter()
            .filter(|rule| symbol.starts_with(&rule.prefix))
            .map(|rule| rule.membership)
            .collect();

        if memberships.is_empty() {
            warn!(
                "No annotation rule for {} ({}), using `other`",
                gene.symbol(),
                gene.id()
            );
            return Annotation {
                memberships: std::iter::once(CategoryMembership::unannotated()).collect(),
                unannotated: true,
                literature,
            };
        }

        Annotation {
            memberships,
            unannotated: false,
            literature,
        }
    }
}

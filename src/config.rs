//! Externally supplied analysis policy
//!
//! All thresholds and weights used by the algorithms come from a [`Config`].
//! A configuration is validated before any disease is processed, an
//! invalid configuration fails the whole run.
//!
//! ```toml
//! alpha = 0.05
//! hub_percentile = 0.9
//! pathway_bonus = 0.5
//!
//! [priority]
//! functional_role = 0.6
//! literature_prevalence = 0.4
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{PathMechError, PathMechResult};

/// Default significance threshold for adjusted p-values
pub const DEFAULT_ALPHA: f64 = 0.05;
/// Default percentile of weighted degree above which genes are hubs
pub const DEFAULT_HUB_PERCENTILE: f64 = 0.9;
/// Default edge weight bonus for gene pairs sharing a source pathway
pub const DEFAULT_PATHWAY_BONUS: f64 = 0.5;
/// Default weight of the functional-role component of the priority score
pub const DEFAULT_FUNCTIONAL_ROLE_WEIGHT: f64 = 0.6;
/// Default weight of the literature-prevalence component of the priority score
pub const DEFAULT_LITERATURE_WEIGHT: f64 = 0.4;

/// The weights of the two components of the [`PriorityScore`](crate::PriorityScore)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PriorityWeights {
    /// Weight of the functional-role component
    pub functional_role: f64,
    /// Weight of the literature-prevalence component
    pub literature_prevalence: f64,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            functional_role: DEFAULT_FUNCTIONAL_ROLE_WEIGHT,
            literature_prevalence: DEFAULT_LITERATURE_WEIGHT,
        }
    }
}

impl PriorityWeights {
    /// Constructs new weights
    ///
    /// # Errors
    ///
    /// [`PathMechError::InvalidConfiguration`], see [`PriorityWeights::validate`]
    pub fn new(functional_role: f64, literature_prevalence: f64) -> PathMechResult<Self> {
        let weights = Self {
            functional_role,
            literature_prevalence,
        };
        weights.validate()?;
        Ok(weights)
    }

    /// Checks that both weights are within `[0, 1]` and sum to at most `1`,
    /// so that composite scores stay within `[0, 1]`
    ///
    /// # Errors
    ///
    /// [`PathMechError::InvalidConfiguration`]
    pub fn validate(&self) -> PathMechResult<()> {
        for (name, weight) in [
            ("functional_role", self.functional_role),
            ("literature_prevalence", self.literature_prevalence),
        ] {
            if !(0.0..=1.0).contains(&weight) {
                return Err(PathMechError::InvalidConfiguration(format!(
                    "priority weight {name} = {weight} is outside [0, 1]"
                )));
            }
        }
        if self.functional_role + self.literature_prevalence > 1.0 + 1e-9 {
            return Err(PathMechError::InvalidConfiguration(format!(
                "priority weights sum to {} which is larger than 1",
                self.functional_role + self.literature_prevalence
            )));
        }
        Ok(())
    }
}

/// Analysis policy for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Significance threshold for adjusted p-values, within `(0, 1)`
    pub alpha: f64,
    /// Genes with a weighted degree above this percentile are hubs, within `[0, 1]`
    pub hub_percentile: f64,
    /// Added to the edge weight of gene pairs that share a source pathway
    pub pathway_bonus: f64,
    /// Weights of the priority score components
    pub priority: PriorityWeights,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            hub_percentile: DEFAULT_HUB_PERCENTILE,
            pathway_bonus: DEFAULT_PATHWAY_BONUS,
            priority: PriorityWeights::default(),
        }
    }
}

impl Config {
    /// Parses and validates a configuration from TOML
    ///
    /// Missing keys keep their default values
    ///
    /// # Errors
    ///
    /// [`PathMechError::InvalidConfiguration`] for invalid TOML, unknown keys or invalid values
    ///
    /// # Examples
    ///
    /// ```
    /// use pathmech::Config;
    ///
    /// let config = Config::from_toml_str("alpha = 0.01").unwrap();
    /// assert!((config.alpha - 0.01).abs() < f64::EPSILON);
    /// assert!((config.priority.functional_role - 0.6).abs() < f64::EPSILON);
    ///
    /// assert!(Config::from_toml_str("alpha = 1.5").is_err());
    /// ```
    pub fn from_toml_str(content: &str) -> PathMechResult<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|err| PathMechError::InvalidConfiguration(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a configuration from a TOML file
    ///
    /// # Errors
    ///
    /// [`PathMechError::CannotOpenFile`] or see [`Config::from_toml_str`]
    pub fn from_file<P: AsRef<Path>>(path: P) -> PathMechResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| PathMechError::CannotOpenFile(path.display().to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Serializes the configuration to TOML
    ///
    /// # Errors
    ///
    /// [`PathMechError::InvalidConfiguration`] if a value cannot be represented in TOML
    pub fn to_toml_string(&self) -> PathMechResult<String> {
        toml::to_string(self).map_err(|err| PathMechError::InvalidConfiguration(err.to_string()))
    }

    /// Checks all values
    ///
    /// # Errors
    ///
    /// [`PathMechError::InvalidConfiguration`] if
    /// - alpha is not within `(0, 1)`
    /// - the hub percentile is not within `[0, 1]`
    /// - the pathway bonus is negative or not finite
    /// - the priority weights are invalid, see [`PriorityWeights::validate`]
    pub fn validate(&self) -> PathMechResult<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(PathMechError::InvalidConfiguration(format!(
                "alpha = {} is outside (0, 1)",
                self.alpha
            )));
        }
        if !(0.0..=1.0).contains(&self.hub_percentile) {
            return Err(PathMechError::InvalidConfiguration(format!(
                "hub_percentile = {} is outside [0, 1]",
                self.hub_percentile
            )));
        }
        if !self.pathway_bonus.is_finite() || self.pathway_bonus < 0.0 {
            return Err(PathMechError::InvalidConfiguration(format!(
                "pathway_bonus = {} must be a non-negative number",
                self.pathway_bonus
            )));
        }
        self.priority.validate()
    }
}

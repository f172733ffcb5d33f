//! The boundary to the upstream pathway database
//!
//! The engine itself never performs I/O. Gene records are supplied by a
//! [`PathwaySource`], e.g. a client of a remote pathway API or the offline
//! [`TsvSource`]. Caching and retries are wrappers around a source
//! ([`CachedSource`], [`Retrying`]) and live entirely on this side of the boundary.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::annotations::DiseaseId;
use crate::parser;
use crate::{PathMechError, PathMechResult};

/// Failures of a [`PathwaySource`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    /// The source could not be reached
    #[error("source unavailable: {0}")]
    Unavailable(String),
    /// The source refused the request, try again later
    #[error("rate limit exceeded")]
    RateLimited,
    /// The source does not know the disease
    #[error("no records for {0}")]
    NotFound(DiseaseId),
}

impl SourceError {
    /// Returns `true` if repeating the request might succeed
    pub fn is_retriable(&self) -> bool {
        matches!(self, SourceError::Unavailable(_) | SourceError::RateLimited)
    }
}

/// A raw gene record as supplied by the pathway source
///
/// The fields are kept as they were retrieved. They are validated when
/// the record is ingested into the [`GeneCatalog`](crate::GeneCatalog).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneRecord {
    gene_id: String,
    symbol: String,
    pathway_id: String,
}

impl GeneRecord {
    /// Constructs a new record
    pub fn new(gene_id: &str, symbol: &str, pathway_id: &str) -> Self {
        Self {
            gene_id: gene_id.to_string(),
            symbol: symbol.to_string(),
            pathway_id: pathway_id.to_string(),
        }
    }

    /// The gene identifier, e.g. `hsa:3064`
    pub fn gene_id(&self) -> &str {
        &self.gene_id
    }

    /// The gene symbol, e.g. `HTT`
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// The pathway the gene was retrieved from, e.g. `hsa05016`
    pub fn pathway_id(&self) -> &str {
        &self.pathway_id
    }
}

/// Supplies the gene records of a disease
pub trait PathwaySource {
    /// Fetches the ordered gene records of the disease pathway
    ///
    /// # Errors
    ///
    /// Any [`SourceError`]. Callers treat errors as missing data for
    /// this disease only.
    fn fetch_pathway_genes(&self, disease: DiseaseId) -> Result<Vec<GeneRecord>, SourceError>;
}

impl<S: PathwaySource + ?Sized> PathwaySource for &S {
    fn fetch_pathway_genes(&self, disease: DiseaseId) -> Result<Vec<GeneRecord>, SourceError> {
        (**self).fetch_pathway_genes(disease)
    }
}

/// A [`PathwaySource`] backed by an offline tab separated dump
///
/// See [`TsvSource::from_tsv`] for the format
#[derive(Debug, Default, Clone)]
pub struct TsvSource {
    records: BTreeMap<DiseaseId, Vec<GeneRecord>>,
}

impl TsvSource {
    /// Parses the dump from a string
    ///
    /// ```text
    /// disease_id  gene_id     symbol  pathway_id
    /// hsa05016    hsa:3064    HTT     hsa05016
    /// ```
    ///
    /// # Errors
    ///
    /// [`PathMechError::InvalidInput`] if the header is missing or a line is malformed
    pub fn from_tsv(content: &str) -> PathMechResult<Self> {
        Ok(Self {
            records: parser::gene_records::parse(content)?,
        })
    }

    /// Reads the dump from a file
    ///
    /// # Errors
    ///
    /// [`PathMechError::CannotOpenFile`] or see [`TsvSource::from_tsv`]
    pub fn from_file<P: AsRef<Path>>(path: P) -> PathMechResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| PathMechError::CannotOpenFile(path.display().to_string()))?;
        Self::from_tsv(&content)
    }

    /// All diseases present in the dump, sorted by ID
    pub fn diseases(&self) -> impl Iterator<Item = &DiseaseId> {
        self.records.keys()
    }
}

impl PathwaySource for TsvSource {
    fn fetch_pathway_genes(&self, disease: DiseaseId) -> Result<Vec<GeneRecord>, SourceError> {
        self.records
            .get(&disease)
            .cloned()
            .ok_or(SourceError::NotFound(disease))
    }
}

/// A cache of fetched gene records with a time-to-live and a capacity
///
/// - Entries older than the time-to-live are dropped when accessed
/// - If the cache is full, the least recently used entry is evicted
/// - A cache with capacity `0` never stores anything
#[derive(Debug)]
pub struct FetchCache {
    ttl: Duration,
    entries: Option<LruCache<DiseaseId, (Instant, Vec<GeneRecord>)>>,
}

impl FetchCache {
    /// Constructs a new, empty cache
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            entries: NonZeroUsize::new(capacity).map(LruCache::new),
        }
    }

    /// Returns the cached records, unless they are expired
    pub fn get(&mut self, disease: &DiseaseId) -> Option<&[GeneRecord]> {
        let entries = self.entries.as_mut()?;
        let (inserted, _) = entries.peek(disease)?;
        if inserted.elapsed() >= self.ttl {
            debug!("Cache entry for {} expired", disease);
            entries.pop(disease);
            return None;
        }
        entries.get(disease).map(|(_, records)| records.as_slice())
    }

    /// Stores records, evicting the least recently used entry if the cache is full
    pub fn insert(&mut self, disease: DiseaseId, records: Vec<GeneRecord>) {
        let Some(entries) = self.entries.as_mut() else {
            return;
        };
        if let Some((evicted, _)) = entries.push(disease, (Instant::now(), records)) {
            if evicted != disease {
                debug!("Evicting {} from cache", evicted);
            }
        }
    }

    /// Removes a single entry
    pub fn remove(&mut self, disease: &DiseaseId) {
        if let Some(entries) = self.entries.as_mut() {
            entries.pop(disease);
        }
    }

    /// The number of cached diseases, including expired entries
    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, LruCache::len)
    }

    /// Returns `true` if nothing is cached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A [`PathwaySource`] that caches the results of another source
///
/// Errors are never cached.
#[derive(Debug)]
pub struct CachedSource<S> {
    inner: S,
    cache: Mutex<FetchCache>,
}

impl<S: PathwaySource> CachedSource<S> {
    /// Wraps `inner` with the given cache
    pub fn new(inner: S, cache: FetchCache) -> Self {
        Self {
            inner,
            cache: Mutex::new(cache),
        }
    }

    /// Returns the cache, e.g. to inspect or reuse it in another session
    pub fn into_cache(self) -> FetchCache {
        self.cache
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl<S: PathwaySource> PathwaySource for CachedSource<S> {
    fn fetch_pathway_genes(&self, disease: DiseaseId) -> Result<Vec<GeneRecord>, SourceError> {
        {
            let mut cache = self
                .cache
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if let Some(records) = cache.get(&disease) {
                debug!("Cache hit for {}", disease);
                return Ok(records.to_vec());
            }
        }
        let records = self.inner.fetch_pathway_genes(disease)?;
        self.cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(disease, records.clone());
        Ok(records)
    }
}

/// A [`PathwaySource`] that retries retriable failures with exponential backoff
#[derive(Debug)]
pub struct Retrying<S> {
    inner: S,
    attempts: u32,
    base_delay: Duration,
}

impl<S: PathwaySource> Retrying<S> {
    /// Wraps `inner`, trying at most `attempts` times
    ///
    /// The delay before retry `n` is `base_delay * 2^(n-1)`
    pub fn new(inner: S, attempts: u32, base_delay: Duration) -> Self {
        Self {
            inner,
            attempts: attempts.max(1),
            base_delay,
        }
    }
}

impl<S: PathwaySource> PathwaySource for Retrying<S> {
    fn fetch_pathway_genes(&self, disease: DiseaseId) -> Result<Vec<GeneRecord>, SourceError> {
        let mut delay = self.base_delay;
        let mut attempt = 1;
        loop {
            match self.inner.fetch_pathway_genes(disease) {
                Err(err) if err.is_retriable() && attempt < self.attempts => {
                    warn!(
                        "Fetching {} failed ({}), attempt {}/{}",
                        disease, err, attempt, self.attempts
                    );
                    std::thread::sleep(delay);
                    delay = delay.saturating_mul(2);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

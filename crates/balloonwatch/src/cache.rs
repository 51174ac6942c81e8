//! TTL cache for generated narratives.
//!
//! The cache belongs to the serving layer, not the analytic core. Its clock
//! and its store are both injected, so expiry can be tested without sleeping
//! and persistence can be swapped without touching the expiry logic.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::error::{Error, Result};

/// Category of cached narrative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeKind {
    /// General overview of the constellation.
    GeneralInsights,
    /// Narrative about detected anomalies.
    Anomalies,
    /// Launch-site recommendations.
    LaunchRecommendations,
}

impl fmt::Display for NarrativeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GeneralInsights => write!(f, "general_insights"),
            Self::Anomalies => write!(f, "anomalies"),
            Self::LaunchRecommendations => write!(f, "launch_recommendations"),
        }
    }
}

/// One stored narrative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// When the narrative was generated.
    pub generated_at: DateTime<Utc>,
    /// Number of hourly snapshots the narrative was generated from.
    #[serde(default)]
    pub hours: u32,
    /// The narrative text.
    pub payload: String,
}

/// Persistence for cache entries.
pub trait CacheStore {
    /// Look up the entry for `kind`.
    fn get(&self, kind: NarrativeKind) -> Option<CacheEntry>;

    /// Store `entry` under `kind`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be persisted.
    fn put(&mut self, kind: NarrativeKind, entry: CacheEntry) -> Result<()>;
}

/// Process-local store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<NarrativeKind, CacheEntry>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, kind: NarrativeKind) -> Option<CacheEntry> {
        self.entries.get(&kind).cloned()
    }

    fn put(&mut self, kind: NarrativeKind, entry: CacheEntry) -> Result<()> {
        self.entries.insert(kind, entry);
        Ok(())
    }
}

/// Store persisted as a single JSON file, so separate CLI invocations share
/// cached narratives.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: HashMap<NarrativeKind, CacheEntry>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing or unreadable file starts empty.
    #[must_use]
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Ignoring corrupt narrative cache");
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };
        debug!(path = %path.display(), entries = entries.len(), "Opened narrative cache");
        Self { path, entries }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let text = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }
}

impl CacheStore for JsonFileStore {
    fn get(&self, kind: NarrativeKind) -> Option<CacheEntry> {
        self.entries.get(&kind).cloned()
    }

    fn put(&mut self, kind: NarrativeKind, entry: CacheEntry) -> Result<()> {
        self.entries.insert(kind, entry);
        self.flush()
    }
}

/// A narrative and where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CachedNarrative {
    /// The narrative text.
    pub text: String,
    /// When it was generated.
    pub generated_at: DateTime<Utc>,
    /// Whether it was served from the cache.
    pub cached: bool,
}

/// TTL cache keyed by [`NarrativeKind`].
#[derive(Debug)]
pub struct NarrativeCache<S, C> {
    store: S,
    clock: C,
    ttl: Duration,
}

impl<S: CacheStore, C: Clock> NarrativeCache<S, C> {
    /// Create a cache over `store`, aging entries with `clock`.
    #[must_use]
    pub fn new(store: S, clock: C, ttl: Duration) -> Self {
        Self { store, clock, ttl }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// A still-valid entry for `kind` over an `hours` window, if any.
    ///
    /// An entry is valid when it covers the same window, its payload is
    /// non-empty, and its age does not exceed the TTL.
    #[must_use]
    pub fn get(&self, kind: NarrativeKind, hours: u32) -> Option<CacheEntry> {
        let entry = self.store.get(kind)?;
        if entry.hours != hours || entry.payload.is_empty() {
            return None;
        }
        let age = self.clock.now().signed_duration_since(entry.generated_at);
        // A TTL too large for chrono never expires.
        let fresh = chrono::Duration::from_std(self.ttl).map_or(true, |ttl| age <= ttl);
        fresh.then_some(entry)
    }

    /// Return the cached narrative for `kind` over an `hours` window, or
    /// generate and store a new one. `generate` only runs on a miss.
    ///
    /// A store failure is logged; the freshly generated text is still
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns whatever `generate` returns on failure. Failures are not
    /// cached.
    pub fn get_or_generate<F>(
        &mut self,
        kind: NarrativeKind,
        hours: u32,
        generate: F,
    ) -> Result<CachedNarrative>
    where
        F: FnOnce() -> Result<String>,
    {
        if let Some(entry) = self.get(kind, hours) {
            debug!(%kind, hours, "Narrative cache hit");
            return Ok(CachedNarrative {
                text: entry.payload,
                generated_at: entry.generated_at,
                cached: true,
            });
        }

        debug!(%kind, hours, "Narrative cache miss");
        let text = generate()?;
        let generated_at = self.clock.now();
        let entry = CacheEntry {
            generated_at,
            hours,
            payload: text.clone(),
        };
        if let Err(e) = self.store.put(kind, entry) {
            warn!(%kind, error = %e, "Failed to store narrative");
        }

        Ok(CachedNarrative {
            text,
            generated_at,
            cached: false,
        })
    }
}

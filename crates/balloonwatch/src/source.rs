//! Snapshot sources.
//!
//! A [`SnapshotSource`] retrieves the raw body of one hourly snapshot. It is
//! the only place the core touches the network, so it is also the only seam
//! tests need to replace.

use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;
use ureq::Agent;

use crate::error::{Error, Result};

/// Trait for anything that can produce raw hourly snapshot bodies.
pub trait SnapshotSource {
    /// The name of this source (for logging/debugging).
    fn name(&self) -> &'static str;

    /// Identifier of the resource holding the snapshot for `hours_ago`.
    fn locate(&self, hours_ago: u32) -> String;

    /// Retrieve the raw body for `hours_ago`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the snapshot cannot be retrieved.
    fn retrieve(&self, hours_ago: u32) -> Result<String>;
}

/// Blocking HTTP source: `GET <base_url><hh>.json`.
#[derive(Debug)]
pub struct HttpSource {
    base_url: String,
    agent: Agent,
}

impl HttpSource {
    /// Create a source rooted at `base_url` with a per-request timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            base_url: base_url.into(),
            agent,
        }
    }

    /// The configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl SnapshotSource for HttpSource {
    fn name(&self) -> &'static str {
        "http"
    }

    fn locate(&self, hours_ago: u32) -> String {
        snapshot_url(&self.base_url, hours_ago)
    }

    fn retrieve(&self, hours_ago: u32) -> Result<String> {
        let url = self.locate(hours_ago);
        debug!(%url, "Requesting snapshot");

        // Non-2xx statuses arrive as ureq::Error::Status.
        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| Error::transport(&url, e.to_string()))?;

        response
            .into_string()
            .map_err(|e| Error::transport(&url, e.to_string()))
    }
}

/// Source backed by canned bodies, keyed by hour.
///
/// Hours without a body fail with a transport error, the same way a missing
/// file on the real feed would.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    bodies: HashMap<u32, String>,
}

impl MemorySource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the body served for `hours_ago`.
    #[must_use]
    pub fn with_body(mut self, hours_ago: u32, body: impl Into<String>) -> Self {
        self.bodies.insert(hours_ago, body.into());
        self
    }

    /// Register the body served for `hours_ago`.
    pub fn insert(&mut self, hours_ago: u32, body: impl Into<String>) {
        self.bodies.insert(hours_ago, body.into());
    }
}

impl SnapshotSource for MemorySource {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn locate(&self, hours_ago: u32) -> String {
        format!("memory://{hours_ago:02}.json")
    }

    fn retrieve(&self, hours_ago: u32) -> Result<String> {
        self.bodies
            .get(&hours_ago)
            .cloned()
            .ok_or_else(|| Error::transport(self.locate(hours_ago), "no snapshot for this hour"))
    }
}

/// Build the snapshot URL for an hour offset, zero-padded to two digits.
#[must_use]
pub fn snapshot_url(base_url: &str, hours_ago: u32) -> String {
    format!("{base_url}{hours_ago:02}.json")
}

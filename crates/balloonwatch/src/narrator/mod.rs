//! Narrative generation over the core's text summaries.
//!
//! Every backend implements the same [`Narrator`] capability set, so callers
//! never depend on how the text is produced:
//!
//! - [`OfflineNarrator`] is deterministic and needs no network or
//!   credentials.
//! - [`ChatNarrator`] calls an OpenAI-compatible chat-completion endpoint.
//!
//! Narrators only ever see text summaries; they have no bearing on the
//! correctness of the analysis itself.

mod chat;
pub mod prompts;

pub use chat::ChatNarrator;

use crate::config::{Config, NarratorBackend};
use crate::error::Result;

/// Message returned when anomaly narration is requested on an empty data set.
pub const NO_ANOMALY_DATA: &str = "No data available for anomaly detection.";

/// A narrative-generation backend.
pub trait Narrator {
    /// The name of this backend (for logging/debugging).
    fn name(&self) -> &'static str;

    /// Answer a free-form question given the data summary.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to produce text.
    fn answer_question(&self, data_summary: &str, question: &str) -> Result<String>;

    /// Assess the anomalies described by the anomaly summary.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to produce text.
    fn narrate_anomalies(&self, anomaly_summary: &str) -> Result<String>;

    /// Recommend launch sites given the data summary.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to produce text.
    fn recommend_launch_sites(&self, data_summary: &str) -> Result<String>;
}

impl std::fmt::Debug for dyn Narrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Narrator").field("name", &self.name()).finish()
    }
}

/// Backend that echoes the prompt context instead of calling a model.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineNarrator;

impl Narrator for OfflineNarrator {
    fn name(&self) -> &'static str {
        "offline"
    }

    fn answer_question(&self, data_summary: &str, question: &str) -> Result<String> {
        Ok(format!(
            "Question: {question}\n\nNo language model is configured; here is the data \
             the answer would be based on.\n\n{data_summary}"
        ))
    }

    fn narrate_anomalies(&self, anomaly_summary: &str) -> Result<String> {
        Ok(format!(
            "No language model is configured; detector output follows.\n\n{anomaly_summary}"
        ))
    }

    fn recommend_launch_sites(&self, data_summary: &str) -> Result<String> {
        Ok(format!(
            "No language model is configured; launch recommendations need one. \
             Current constellation data:\n\n{data_summary}"
        ))
    }
}

/// Build the narrator selected in `config`.
///
/// # Errors
///
/// Returns an error if the selected backend cannot be constructed, e.g. the
/// chat backend without an API key.
pub fn from_config(config: &Config) -> Result<Box<dyn Narrator>> {
    match config.narrator.backend {
        NarratorBackend::Offline => Ok(Box::new(OfflineNarrator)),
        NarratorBackend::Chat => Ok(Box::new(ChatNarrator::from_config(
            &config.narrator,
            config.narrator_timeout(),
        )?)),
    }
}

//! Prompt templates for narrative backends.
//!
//! Each function takes the deterministic text summaries produced by the core
//! and returns the full prompt. Nothing here touches the network.

/// Role description shared by every prompt.
pub const SYSTEM_PROMPT: &str = "You are an operations analyst for a fleet of long-duration \
weather balloons. You are given machine-generated summaries of the fleet's recent telemetry. \
Ground every statement in those summaries and say so when the data is insufficient.";

/// Prompt for a free-form question about the constellation.
#[must_use]
pub fn question_prompt(data_summary: &str, question: &str) -> String {
    format!(
        "Current constellation data:\n{data_summary}\n\n\
         Question: {question}\n\n\
         Answer concisely. Point out patterns, anomalies, or operational insights that \
         follow from the data above."
    )
}

/// Prompt asking for an assessment of detected anomalies.
#[must_use]
pub fn anomaly_prompt(anomaly_summary: &str) -> String {
    format!(
        "Anomaly detection results:\n{anomaly_summary}\n\n\
         1. Assess whether these anomalies are concerning or expected.\n\
         2. Offer possible explanations.\n\
         3. Recommend follow-up investigation or action.\n\n\
         Keep the analysis short and focused on operations."
    )
}

/// Prompt asking for launch-site recommendations.
#[must_use]
pub fn launch_prompt(data_summary: &str) -> String {
    format!(
        "Current constellation data:\n{data_summary}\n\n\
         Recommend up to three launch locations for the next balloon that would improve \
         global coverage, explain why each helps, and add any other strategic advice. \
         Be specific and actionable."
    )
}

/// Question used for the cached general overview.
pub const GENERAL_INSIGHTS_QUESTION: &str = "Give a general overview of the current balloon \
constellation status and any notable patterns or observations.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_prompt_embeds_inputs() {
        let prompt = question_prompt("3 balloons", "Where are they?");
        assert!(prompt.contains("3 balloons"));
        assert!(prompt.contains("Question: Where are they?"));
    }

    #[test]
    fn test_anomaly_prompt_embeds_summary() {
        let prompt = anomaly_prompt("2 instances of unusual movement");
        assert!(prompt.starts_with("Anomaly detection results:\n2 instances"));
    }

    #[test]
    fn test_launch_prompt_embeds_summary() {
        assert!(launch_prompt("summary text").contains("summary text"));
    }
}

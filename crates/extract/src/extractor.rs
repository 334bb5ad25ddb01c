use std::time::Duration;

use serde_json::{Map, Value};
use tracing::debug;

use crate::json::first_json_object;
use crate::llm::TextGenerator;
use crate::prompt::build_prompt;

/// Hard ceiling on generation calls per document.
pub const MAX_ATTEMPTS: usize = 3;

/// Drives the generative-text collaborator: builds the prompt, invokes the
/// service with a bounded retry loop, and recovers a field mapping from
/// whatever text comes back.
///
/// Service errors, empty replies, prose without JSON, and malformed JSON
/// are all recoverable outcomes that cost one attempt and one diagnostic.
/// Exhausting all attempts yields an empty mapping, never an error.
pub struct StructuredExtractor<G> {
    generator: G,
    retry_delay: Duration,
}

impl<G: TextGenerator> StructuredExtractor<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            retry_delay: Duration::from_secs(1),
        }
    }

    /// Override the pause between attempts; tests pass `Duration::ZERO`.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// The first attempt that yields a syntactically valid JSON object is
    /// accepted as-is, empty or partial objects included; semantic checks
    /// belong to validation downstream.
    pub async fn extract(
        &self,
        doc_label: &str,
        ocr_text: &str,
    ) -> (Map<String, Value>, Vec<String>) {
        let prompt = build_prompt(ocr_text);
        let mut diagnostics = Vec::new();

        for attempt in 1..=MAX_ATTEMPTS {
            if attempt > 1 {
                tokio::time::sleep(self.retry_delay).await;
            }
            match self.generator.generate(&prompt).await {
                Ok(reply) => match first_json_object(&reply) {
                    Ok(mapping) => return (mapping, diagnostics),
                    Err(e) => {
                        debug!("{doc_label}: attempt {attempt} returned no usable JSON: {e}");
                        diagnostics.push(format!("{doc_label}: attempt {attempt}: {e}"));
                    }
                },
                Err(e) => {
                    debug!("{doc_label}: attempt {attempt} failed: {e}");
                    diagnostics.push(format!("{doc_label}: attempt {attempt}: {e}"));
                }
            }
        }

        diagnostics.push(format!(
            "{doc_label}: structured extraction failed after {MAX_ATTEMPTS} attempts"
        ));
        (Map::new(), diagnostics)
    }
}

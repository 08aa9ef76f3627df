//! Completion-signal detection over assistant responses.
//!
//! Classifies an assistant's full response as "dialogue continuing" or
//! "schema proposal ready". The verdict is heuristic: a positive result
//! still has to survive extraction before a task definition can be built
//! from it.

/// Pure classifier deciding whether an assistant response announces a
/// finished schema proposal.
///
/// Kept behind a trait so the dialogue engine never depends on the exact
/// wording of the heuristic; stricter or model-based detectors can be
/// swapped in without touching the state machine.
pub trait CompletionSignal: Send + Sync {
    /// Returns true if the response looks like a completed schema proposal.
    fn is_complete(&self, response: &str) -> bool;
}

use once_cell::sync::Lazy;

/// Indicators accepted by the default detector. Matching any one of them
/// is sufficient.
static DEFAULT_MARKERS: Lazy<Vec<String>> = Lazy::new(|| {
    vec![
        "I now have enough information".to_string(),
        "Here's what I've designed".to_string(),
        "```json".to_string(),
    ]
});

/// Default detector: matches any of a set of marker phrases, or the
/// opening fence of a JSON block.
///
/// Any single indicator is sufficient; there is no weighting or scoring.
#[derive(Debug, Clone)]
pub struct MarkerPhraseDetector {
    markers: Vec<String>,
}

impl MarkerPhraseDetector {
    /// Creates a detector with a custom marker set.
    pub fn new(markers: Vec<String>) -> Self {
        Self { markers }
    }
}

impl Default for MarkerPhraseDetector {
    fn default() -> Self {
        Self::new(DEFAULT_MARKERS.clone())
    }
}

impl CompletionSignal for MarkerPhraseDetector {
    fn is_complete(&self, response: &str) -> bool {
        self.markers.iter().any(|marker| response.contains(marker))
    }
}

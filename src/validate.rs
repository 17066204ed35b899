//! Mode-specific consistency rules layered on top of structural validation.
//!
//! Rules accumulate: the caller always receives the complete set of violated
//! rules in one pass. A non-empty list is terminal for the request.

use crate::cps::{Cps, Mode};

/// Check cross-field semantic rules for the CPS's declared mode.
///
/// Returns one message per violated rule; an empty list means the CPS is
/// consistent. `general` mode accepts any feature combination.
pub fn validate(cps: &Cps) -> Vec<String> {
    let mut violations = Vec::new();

    if cps.mode == Mode::RagOnly {
        if !cps.features.rag {
            violations.push("features.rag MUST be true in RAG-only mode".to_string());
        }
        if !cps.features.embeddings {
            violations.push("features.embeddings MUST be true in RAG-only mode".to_string());
        }
        if cps.features.chat {
            violations
                .push("Chat endpoints are not allowed in the RAG-only specialization".to_string());
        }
        if !is_present(cps.vector_store.as_deref()) {
            violations.push("Vector store configuration is required for RAG".to_string());
        }
        if !is_present(cps.embedding_model.as_deref()) {
            violations.push("Missing embedding model".to_string());
        }
    }

    violations
}

fn is_present(value: Option<&str>) -> bool {
    value.is_some_and(|value| !value.trim().is_empty())
}

//! Canonical Project Specification (CPS) model and structural validation.
//!
//! The CPS is the single source of truth for a generation request. It is
//! produced once (by the extractor or a caller-supplied JSON document),
//! consumed once, and never mutated by the engine.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical Project Specification: the structured description of a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cps {
    pub project_name: String,
    pub description: String,
    pub llm_provider: LlmProvider,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub embedding_model: Option<String>,
    #[serde(default)]
    pub vector_store: Option<String>,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub features: Features,
    pub endpoints: Vec<Endpoint>,
    pub auth: Auth,
    #[serde(default)]
    pub modules: Vec<String>,
}

/// Supported LM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    Openai,
}

/// Generation mode. Governs both consistency rules and template selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    General,
    RagOnly,
}

/// Independent feature flags. Combinations are constrained per mode by the
/// consistency validator, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Features {
    #[serde(default)]
    pub chat: bool,
    #[serde(default)]
    pub rag: bool,
    #[serde(default)]
    pub streaming: bool,
    #[serde(default)]
    pub embeddings: bool,
}

/// A single feature flag, used by template units to declare preconditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Chat,
    Rag,
    Streaming,
    Embeddings,
}

impl Features {
    /// Whether the given flag is enabled.
    pub fn enabled(&self, feature: Feature) -> bool {
        match feature {
            Feature::Chat => self.chat,
            Feature::Rag => self.rag,
            Feature::Streaming => self.streaming,
            Feature::Embeddings => self.embeddings,
        }
    }
}

/// Advisory endpoint metadata. Not consumed by template selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub path: String,
    pub method: HttpMethod,
    pub uses_llm: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    #[serde(rename = "GET")]
    Get,
    #[serde(rename = "POST")]
    Post,
}

/// Advisory auth metadata. Not consumed by template selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Auth {
    #[serde(rename = "type")]
    pub auth_type: AuthType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    None,
    ApiKey,
    Jwt,
}

impl Cps {
    /// Build a CPS from a loosely-typed JSON value.
    ///
    /// Returns the structural violations on failure: wrong type, missing
    /// required field, or a value outside its enumeration. No cross-field
    /// reasoning happens here; that belongs to the consistency validator.
    pub fn from_value(value: Value) -> Result<Cps, Vec<String>> {
        let cps: Cps = match serde_json::from_value(value) {
            Ok(cps) => cps,
            Err(err) => return Err(vec![format!("CPS shape violation: {err}")]),
        };

        let mut violations = Vec::new();
        if cps.project_name.is_empty() {
            violations.push("project_name must not be empty".to_string());
        } else if !project_name_pattern().is_match(&cps.project_name) {
            // The project name prefixes every output path, so it has to be a
            // plain directory name.
            violations.push(format!(
                "project_name {:?} is not usable as a directory name",
                cps.project_name
            ));
        }

        if violations.is_empty() {
            Ok(cps)
        } else {
            Err(violations)
        }
    }
}

fn project_name_pattern() -> Regex {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal_value() -> Value {
        json!({
            "project_name": "notes_api",
            "description": "A note-taking service",
            "llm_provider": "openai",
            "endpoints": [],
            "auth": {"type": "none"}
        })
    }

    #[test]
    fn minimal_cps_gets_defaults() {
        let cps = Cps::from_value(minimal_value()).unwrap();
        assert_eq!(cps.mode, Mode::General);
        assert_eq!(cps.features, Features::default());
        assert!(!cps.features.chat);
        assert!(cps.modules.is_empty());
        assert!(cps.model.is_none());
    }

    #[test]
    fn missing_required_field_is_a_shape_violation() {
        let mut value = minimal_value();
        value.as_object_mut().unwrap().remove("description");
        let violations = Cps::from_value(value).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("description"));
    }

    #[test]
    fn value_outside_enumeration_is_rejected() {
        let mut value = minimal_value();
        value["mode"] = json!("chat_only");
        assert!(Cps::from_value(value).is_err());
    }

    #[test]
    fn method_enum_uses_uppercase_wire_form() {
        let mut value = minimal_value();
        value["endpoints"] = json!([{"path": "/notes", "method": "GET", "uses_llm": false}]);
        let cps = Cps::from_value(value).unwrap();
        assert_eq!(cps.endpoints[0].method, HttpMethod::Get);
    }

    #[test]
    fn project_name_must_work_as_a_directory_name() {
        for bad in ["", "../escape", "a/b", ".hidden"] {
            let mut value = minimal_value();
            value["project_name"] = json!(bad);
            assert!(Cps::from_value(value).is_err(), "accepted {bad:?}");
        }
        let mut value = minimal_value();
        value["project_name"] = json!("My-Project.v2");
        assert!(Cps::from_value(value).is_ok());
    }

    #[test]
    fn feature_lookup_matches_flags() {
        let features = Features {
            chat: true,
            rag: false,
            streaming: true,
            embeddings: false,
        };
        assert!(features.enabled(Feature::Chat));
        assert!(!features.enabled(Feature::Rag));
        assert!(features.enabled(Feature::Streaming));
        assert!(!features.enabled(Feature::Embeddings));
    }
}

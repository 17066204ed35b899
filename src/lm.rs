//! OpenAI-backed extraction and refinement calls.
//!
//! Both operations are opaque collaborators from the engine's point of view:
//! text in, CPS-shaped JSON out; (CPS, files, feedback) in, full file map out.
//! Upstream errors are propagated as-is, with no retry or interpretation, and
//! a refinement result bypasses the selector and render pipeline entirely.

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::time::Instant;

use crate::cps::Cps;

const EXTRACT_PROMPT: &str = include_str!("../prompts/extract_cps.md");
const REFINE_PROMPT: &str = include_str!("../prompts/refine_project.md");

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o";
const PLACEHOLDER_KEY: &str = "your_api_key_here";

/// Explicit LM connection settings. Passed into every call so that multiple
/// configurations can coexist; there is no process-wide client.
#[derive(Debug, Clone)]
pub struct LmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Deserialize)]
struct LmConfigFile {
    api_key: String,
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    model: Option<String>,
}

impl LmConfig {
    /// Resolve settings from the environment, falling back to the user config
    /// file (`<config dir>/fgen/config.json`).
    pub fn load() -> Result<LmConfig> {
        let base_url =
            env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = env::var("FGEN_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        if let Ok(api_key) = env::var("OPENAI_API_KEY") {
            if !api_key.is_empty() && api_key != PLACEHOLDER_KEY {
                return Ok(LmConfig {
                    api_key,
                    base_url,
                    model,
                });
            }
        }

        let path = dirs::config_dir()
            .map(|dir| dir.join("fgen/config.json"))
            .filter(|path| path.exists())
            .ok_or_else(|| {
                anyhow!("OPENAI_API_KEY is not set and no fgen/config.json was found")
            })?;
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("read LM config {}", path.display()))?;
        let file: LmConfigFile = serde_json::from_str(&raw)
            .with_context(|| format!("parse LM config {}", path.display()))?;
        Ok(LmConfig {
            api_key: file.api_key,
            base_url: file.base_url.unwrap_or(base_url),
            model: file.model.unwrap_or(model),
        })
    }
}

/// Extract a CPS-shaped JSON object from a free-text project idea.
///
/// The returned value has not been structurally validated; that is the CPS
/// model's job at the next stage.
pub fn extract_cps(config: &LmConfig, idea: &str) -> Result<Value> {
    let prompt = EXTRACT_PROMPT.replace("{idea}", idea);
    let value = chat_completion(config, "You are a structured data extractor.", &prompt)?;
    reject_error_payload(&value)?;
    Ok(value)
}

/// Ask the LM to regenerate the whole project given user feedback.
///
/// Returns the complete replacement file map (path → content).
pub fn refine_project(
    config: &LmConfig,
    cps: &Cps,
    files: &BTreeMap<String, String>,
    feedback: &str,
) -> Result<BTreeMap<String, String>> {
    let cps_json = serde_json::to_string_pretty(cps).context("serialize CPS for refinement")?;
    let files_json =
        serde_json::to_string_pretty(files).context("serialize file map for refinement")?;
    let prompt = REFINE_PROMPT
        .replace("{cps}", &cps_json)
        .replace("{files}", &files_json)
        .replace("{feedback}", feedback);

    let value = chat_completion(
        config,
        "You are a code refiner and bug fixer. Always return a full file map in valid JSON format.",
        &prompt,
    )?;
    reject_error_payload(&value)?;
    serde_json::from_value(value).context("refinement response is not a path → content map")
}

fn chat_completion(config: &LmConfig, system: &str, user: &str) -> Result<Value> {
    let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
    let body = json!({
        "model": config.model,
        "messages": [
            {"role": "system", "content": system},
            {"role": "user", "content": user},
        ],
        "response_format": {"type": "json_object"},
    });

    let start = Instant::now();
    let mut response = ureq::post(url.as_str())
        .header("Authorization", format!("Bearer {}", config.api_key))
        .send_json(&body)
        .context("call chat completions")?;
    let envelope: Value = response
        .body_mut()
        .read_json()
        .context("read chat completions response")?;

    tracing::info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        model = config.model,
        "lm call complete"
    );

    let content = content_from_envelope(&envelope)?;
    parse_structured(&content)
}

/// Pull the assistant message text out of a chat-completions envelope.
fn content_from_envelope(envelope: &Value) -> Result<String> {
    envelope
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .map(|content| content.to_string())
        .ok_or_else(|| anyhow!("chat completions response missing choices[0].message.content"))
}

/// Parse structured JSON from LM message text, tolerating code fences and
/// surrounding prose.
fn parse_structured(content: &str) -> Result<Value> {
    let cleaned = strip_code_fences(content);
    match serde_json::from_str(&cleaned) {
        Ok(value) => Ok(value),
        Err(err) => extract_json_from_text(&cleaned)
            .ok_or_else(|| anyhow!("LM response is not valid JSON: {err}")),
    }
}

fn reject_error_payload(value: &Value) -> Result<()> {
    if let Some(error) = value.get("error") {
        let detail = error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string());
        bail!("LM returned an error: {detail}");
    }
    Ok(())
}

fn strip_code_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let mut lines: Vec<&str> = trimmed.lines().collect();
    if let Some(first) = lines.first() {
        if first.trim_start().starts_with("```") {
            lines.remove(0);
        }
    }
    if let Some(last) = lines.last() {
        if last.trim_start().starts_with("```") {
            lines.pop();
        }
    }
    lines.join("\n").trim().to_string()
}

fn extract_json_from_text(raw: &str) -> Option<Value> {
    for (idx, ch) in raw.char_indices() {
        if ch != '{' {
            continue;
        }
        let slice = &raw[idx..];
        let mut deserializer = serde_json::Deserializer::from_str(slice);
        if let Ok(value) = Value::deserialize(&mut deserializer) {
            return Some(value);
        }
    }
    None
}

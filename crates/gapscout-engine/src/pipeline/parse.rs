//! Parsing of the decomposer's response into sub-topics.
//!
//! The structured JSON path is the default; the permissive enumerated-list
//! parser only runs behind an explicit best-effort flag so its use is
//! visible and testable in isolation.

use serde::Deserialize;

use gapscout_core::error::{GapscoutError, Result};

use crate::state::SubTopic;

#[derive(Deserialize)]
struct SubTopicsPayload {
    sub_topics: Vec<SubTopic>,
}

/// Parse a structured `{"sub_topics": [...]}` payload.
pub fn from_json(text: &str) -> Result<Vec<SubTopic>> {
    let payload: SubTopicsPayload = serde_json::from_str(text)
        .map_err(|e| GapscoutError::StructuredOutput(format!("sub-topics payload: {}", e)))?;
    Ok(payload.sub_topics)
}

/// Best-effort extraction from a loosely-formatted enumerated list, e.g.
/// `**1. Title**` markdown bold items or plain `1. Title` lines.
pub fn from_enumerated_list(text: &str) -> Vec<SubTopic> {
    let bold = regex::Regex::new(r"\*\*\d+\.\s*(.*?)\*\*").expect("static regex");
    let mut titles: Vec<String> = bold
        .captures_iter(text)
        .map(|c| c[1].trim().to_string())
        .collect();

    if titles.is_empty() {
        let plain = regex::Regex::new(r"(?m)^\s*\d+\.\s+(.+)$").expect("static regex");
        titles = plain
            .captures_iter(text)
            .map(|c| c[1].trim().to_string())
            .collect();
    }

    titles
        .into_iter()
        .map(|raw| {
            let cleaned = raw.replace("**", "");
            // "Title: description" lines split into both fields
            match cleaned.split_once(':') {
                Some((title, desc)) => SubTopic {
                    title: title.trim().to_string(),
                    description: desc.trim().to_string(),
                },
                None => SubTopic {
                    title: cleaned.trim().to_string(),
                    description: String::new(),
                },
            }
        })
        .filter(|s| !s.title.is_empty())
        .collect()
}

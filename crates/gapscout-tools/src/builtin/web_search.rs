use std::time::Duration;

use futures::future::BoxFuture;
use serde::Deserialize;
use tracing::debug;

use gapscout_core::config::SearchConfig;
use gapscout_core::error::{GapscoutError, Result};
use gapscout_core::traits::Tool;

const CSE_API_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// Web search via the Google Programmable Search JSON API.
pub struct WebSearchTool {
    http: reqwest::Client,
    config: SearchConfig,
}

impl WebSearchTool {
    pub fn new(config: SearchConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| GapscoutError::ToolExecution {
                tool: "web_search".into(),
                message: e.to_string(),
            })?;
        Ok(Self { http, config })
    }
}

#[derive(Deserialize)]
struct WebSearchInput {
    query: String,
}

#[derive(Deserialize)]
struct CseResponse {
    #[serde(default)]
    items: Vec<CseItem>,
}

#[derive(Deserialize)]
struct CseItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web. Returns titles, links, and snippets for the top results."
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Search query" }
            },
            "required": ["query"]
        })
    }

    fn timeout_secs(&self) -> u64 {
        30
    }

    fn invoke(&self, arguments: serde_json::Value) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move {
            let input: WebSearchInput = serde_json::from_value(arguments)
                .map_err(|e| GapscoutError::ToolValidation(e.to_string()))?;

            debug!(query = %input.query, "Running web search");

            let resp = self
                .http
                .get(CSE_API_URL)
                .query(&[
                    ("key", self.config.api_key.as_str()),
                    ("cx", self.config.engine_id.as_str()),
                    ("q", input.query.as_str()),
                ])
                .send()
                .await
                .map_err(|e| GapscoutError::ToolExecution {
                    tool: "web_search".into(),
                    message: e.to_string(),
                })?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(GapscoutError::ToolExecution {
                    tool: "web_search".into(),
                    message: format!(
                        "HTTP {}: {}",
                        status.as_u16(),
                        body.chars().take(300).collect::<String>()
                    ),
                });
            }

            let parsed: CseResponse =
                resp.json().await.map_err(|e| GapscoutError::ToolExecution {
                    tool: "web_search".into(),
                    message: format!("response parse error: {}", e),
                })?;

            if parsed.items.is_empty() {
                return Ok(format!("No results for \"{}\".", input.query));
            }

            Ok(format_results(&parsed.items, self.config.max_results))
        })
    }
}

fn format_results(items: &[CseItem], limit: usize) -> String {
    items
        .iter()
        .take(limit)
        .map(|item| format!("{}\n{}\n{}", item.title, item.link, item.snippet))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_results_respects_limit() {
        let items = vec![
            CseItem {
                title: "A".into(),
                link: "https://a".into(),
                snippet: "first".into(),
            },
            CseItem {
                title: "B".into(),
                link: "https://b".into(),
                snippet: "second".into(),
            },
            CseItem {
                title: "C".into(),
                link: "https://c".into(),
                snippet: "third".into(),
            },
        ];
        let out = format_results(&items, 2);
        assert!(out.contains("first"));
        assert!(out.contains("second"));
        assert!(!out.contains("third"));
    }

    #[test]
    fn test_input_requires_query() {
        let parsed: std::result::Result<WebSearchInput, _> =
            serde_json::from_value(serde_json::json!({}));
        assert!(parsed.is_err());
    }
}

//! Prompt templates for the pipeline nodes.

use crate::state::SubTopic;

pub const ANALYST_SYSTEM: &str = "You are a seasoned market analyst.";
pub const RESEARCHER_SYSTEM: &str = "You are a multi-skilled market researcher.";
pub const WRITER_SYSTEM: &str = "You are a founder and copywriter.";

/// Schema hint for the decomposer's structured response.
pub const SUB_TOPICS_SCHEMA: &str =
    r#"{"sub_topics": [{"title": "string", "description": "one sentence"}]}"#;

pub fn decompose(topic: &str) -> String {
    format!(
        r#"Explore the market topic: "{topic}"
Break it down into at least 5 interesting and distinct sub-topics that might hold unique commercial potential.
For each sub-topic, provide a title and a one-sentence description."#
    )
}

pub fn validation_task(sub_topics: &[SubTopic]) -> String {
    let listing = sub_topics
        .iter()
        .map(|s| {
            if s.description.is_empty() {
                format!("- {}", s.title)
            } else {
                format!("- {}: {}", s.title, s.description)
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        r#"Your task is demand validation. For each of the following sub-topics:
{listing}

Do the following:
1. Use the 'web_search' tool to find whether each sub-topic is growing, stable, or declining (search for terms like "<sub-topic> market trend").
2. Use the 'web_search' tool to identify community discussions and product saturation for each sub-topic.
3. Based on your research, determine which single sub-topic has the highest unmet demand.

Your final answer MUST be only the name of the best sub-topic."#
    )
}

pub fn evidence_task(validated_item: &str) -> String {
    format!(
        r#"You have already validated the sub-topic '{validated_item}'. Your new task is to find user pain points for it.
Use the 'web_search' tool with queries like:
- site:reddit.com "{validated_item}" problem
- site:reddit.com "{validated_item}" frustration

Based on the search results, summarize the key user complaints and challenges in a concise paragraph. That summary is your final answer."#
    )
}

pub fn synthesize(validated_item: &str, evidence_summary: &str) -> String {
    format!(
        r#"Based on the following pain point summary from the sub-topic "{validated_item}":

{evidence_summary}

Do the following:
1. List the top 3-5 user pain points.
2. Generate a unique business idea that solves them. Give it a name.
3. Write landing page copy: a headline, a subheadline, 3 feature bullets, and a 2-3 question FAQ.

Return a single, well-formatted markdown document with the complete report."#
    )
}

use serde::{Deserialize, Serialize};

use gapscout_core::types::ChatMessage;

/// A sub-topic candidate produced by the decomposer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubTopic {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Per-field rule for combining a partial update into state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    Overwrite,
    Append,
}

/// The writable fields of [`ResearchState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateField {
    SubTopics,
    ValidatedItem,
    EvidenceSummary,
    FinalReport,
    Messages,
}

impl StateField {
    /// The declared merge-policy table. `messages` is the one append field;
    /// everything else is last-write-wins.
    pub fn merge_policy(self) -> MergePolicy {
        match self {
            Self::Messages => MergePolicy::Append,
            _ => MergePolicy::Overwrite,
        }
    }
}

/// Shared state threaded through every workflow step.
///
/// Owned exclusively by the executor for the duration of one run; `topic` is
/// set at construction and never written by a node.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResearchState {
    pub topic: String,
    pub sub_topics: Vec<SubTopic>,
    pub validated_item: String,
    pub evidence_summary: String,
    pub final_report: String,
    pub messages: Vec<ChatMessage>,
}

impl ResearchState {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            sub_topics: Vec::new(),
            validated_item: String::new(),
            evidence_summary: String::new(),
            final_report: String::new(),
            messages: Vec::new(),
        }
    }

    /// The most recently produced message, if any.
    pub fn latest_message(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Merge a partial update into this state.
    ///
    /// Pure and total: fields absent from the patch are untouched, and the
    /// empty patch is the identity. Each present field is combined under its
    /// declared [`MergePolicy`].
    pub fn apply(&mut self, patch: StatePatch) {
        if patch.clear_messages {
            self.messages.clear();
        }
        if let Some(sub_topics) = patch.sub_topics {
            match StateField::SubTopics.merge_policy() {
                MergePolicy::Overwrite => self.sub_topics = sub_topics,
                MergePolicy::Append => self.sub_topics.extend(sub_topics),
            }
        }
        if let Some(validated_item) = patch.validated_item {
            merge_string(&mut self.validated_item, validated_item, StateField::ValidatedItem);
        }
        if let Some(evidence_summary) = patch.evidence_summary {
            merge_string(
                &mut self.evidence_summary,
                evidence_summary,
                StateField::EvidenceSummary,
            );
        }
        if let Some(final_report) = patch.final_report {
            merge_string(&mut self.final_report, final_report, StateField::FinalReport);
        }
        if let Some(messages) = patch.messages {
            match StateField::Messages.merge_policy() {
                MergePolicy::Append => self.messages.extend(messages),
                MergePolicy::Overwrite => self.messages = messages,
            }
        }
    }
}

fn merge_string(slot: &mut String, update: String, field: StateField) {
    match field.merge_policy() {
        MergePolicy::Overwrite => *slot = update,
        MergePolicy::Append => slot.push_str(&update),
    }
}

/// A node's partial state update. Only the fields a node intends to change
/// are set.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct StatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_topics: Option<Vec<SubTopic>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validated_item: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_report: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ChatMessage>>,
    /// The one sanctioned escape from append-merge: the save nodes reset the
    /// message sequence before the next loop. Applied before the append.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    #[serde(default)]
    pub clear_messages: bool,
}

impl StatePatch {
    /// A patch that appends messages.
    pub fn with_messages(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages: Some(messages),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(text: &str) -> ChatMessage {
        ChatMessage::user(text)
    }

    #[test]
    fn test_empty_patch_is_identity() {
        let mut state = ResearchState::new("Pets");
        state.validated_item = "Pet Grooming Tech".into();
        state.messages.push(msg("hello"));

        let before = state.clone();
        state.apply(StatePatch::default());
        assert_eq!(state, before);
    }

    #[test]
    fn test_messages_append_is_associative() {
        let a = vec![msg("one")];
        let b = vec![msg("two"), msg("three")];

        // Two sequential patches...
        let mut sequential = ResearchState::new("t");
        sequential.apply(StatePatch::with_messages(a.clone()));
        sequential.apply(StatePatch::with_messages(b.clone()));

        // ...equal one patch of their concatenation.
        let mut combined = ResearchState::new("t");
        let mut all = a;
        all.extend(b);
        combined.apply(StatePatch::with_messages(all));

        assert_eq!(sequential, combined);
    }

    #[test]
    fn test_overwrite_fields_replace() {
        let mut state = ResearchState::new("t");
        state.apply(StatePatch {
            sub_topics: Some(vec![SubTopic {
                title: "A".into(),
                description: String::new(),
            }]),
            ..Default::default()
        });
        state.apply(StatePatch {
            sub_topics: Some(vec![SubTopic {
                title: "B".into(),
                description: String::new(),
            }]),
            validated_item: Some("B".into()),
            ..Default::default()
        });

        assert_eq!(state.sub_topics.len(), 1);
        assert_eq!(state.sub_topics[0].title, "B");
        assert_eq!(state.validated_item, "B");
    }

    #[test]
    fn test_clear_messages_runs_before_append() {
        let mut state = ResearchState::new("t");
        state.messages.push(msg("stale"));

        state.apply(StatePatch {
            messages: Some(vec![msg("fresh")]),
            clear_messages: true,
            ..Default::default()
        });

        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.messages[0].text(), "fresh");
    }

    #[test]
    fn test_policy_table() {
        assert_eq!(StateField::Messages.merge_policy(), MergePolicy::Append);
        for field in [
            StateField::SubTopics,
            StateField::ValidatedItem,
            StateField::EvidenceSummary,
            StateField::FinalReport,
        ] {
            assert_eq!(field.merge_policy(), MergePolicy::Overwrite);
        }
    }

    #[test]
    fn test_untouched_fields_survive() {
        let mut state = ResearchState::new("t");
        state.evidence_summary = "kept".into();
        state.apply(StatePatch {
            final_report: Some("report".into()),
            ..Default::default()
        });
        assert_eq!(state.evidence_summary, "kept");
        assert_eq!(state.final_report, "report");
    }
}

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, info, warn};

use gapscout_core::error::{GapscoutError, Result};
use gapscout_core::traits::Reasoner;
use gapscout_core::types::ChatMessage;
use gapscout_tools::ToolRegistry;

use crate::graph::node::Node;
use crate::pipeline::{parse, prompts};
use crate::state::{ResearchState, StatePatch};

/// Decomposer: breaks the topic into sub-topic candidates.
///
/// Zero parsed candidates is a fatal precondition failure: the validation
/// loop must never be entered with an empty list.
pub struct DecomposeNode {
    reasoner: Arc<dyn Reasoner>,
    best_effort: bool,
}

impl DecomposeNode {
    pub fn new(reasoner: Arc<dyn Reasoner>, best_effort: bool) -> Self {
        Self {
            reasoner,
            best_effort,
        }
    }
}

impl Node for DecomposeNode {
    fn name(&self) -> &str {
        "decompose"
    }

    fn run<'a>(&'a self, state: &'a ResearchState) -> BoxFuture<'a, Result<StatePatch>> {
        Box::pin(async move {
            let messages = vec![
                ChatMessage::system(prompts::ANALYST_SYSTEM),
                ChatMessage::user(prompts::decompose(&state.topic)),
            ];
            let response = self
                .reasoner
                .respond_structured(&messages, prompts::SUB_TOPICS_SCHEMA)
                .await?;
            let text = response.text();

            let sub_topics = match parse::from_json(&text) {
                Ok(subs) => subs,
                Err(e) if self.best_effort => {
                    warn!(error = %e, "Structured parse failed, using best-effort list parser");
                    parse::from_enumerated_list(&text)
                }
                Err(e) => return Err(e),
            };

            if sub_topics.is_empty() {
                return Err(GapscoutError::Precondition(
                    "decomposer produced no sub-topics".into(),
                ));
            }

            info!(count = sub_topics.len(), "Decomposed topic into sub-topics");
            Ok(StatePatch {
                sub_topics: Some(sub_topics),
                ..Default::default()
            })
        })
    }
}

/// Task Preparer: poses the next instruction to the researcher, either
/// validating the candidates or gathering evidence for the validated item. The
/// decision point that lets one researcher node serve two phases.
pub struct PrepareTaskNode;

impl Node for PrepareTaskNode {
    fn name(&self) -> &str {
        "prepare_task"
    }

    fn internal(&self) -> bool {
        true
    }

    fn run<'a>(&'a self, state: &'a ResearchState) -> BoxFuture<'a, Result<StatePatch>> {
        Box::pin(async move {
            let prompt = if state.validated_item.is_empty() {
                if state.sub_topics.is_empty() {
                    return Err(GapscoutError::Precondition(
                        "validation loop entered with no sub-topics".into(),
                    ));
                }
                debug!("Preparing demand-validation task");
                prompts::validation_task(&state.sub_topics)
            } else {
                debug!(item = %state.validated_item, "Preparing evidence-gathering task");
                prompts::evidence_task(&state.validated_item)
            };

            Ok(StatePatch::with_messages(vec![ChatMessage::user(prompt)]))
        })
    }
}

/// Researcher: one reasoning turn over the accumulated messages, with the
/// registry's tools declared. The response may request tool invocations.
pub struct ResearchNode {
    reasoner: Arc<dyn Reasoner>,
    registry: Arc<ToolRegistry>,
}

impl ResearchNode {
    pub fn new(reasoner: Arc<dyn Reasoner>, registry: Arc<ToolRegistry>) -> Self {
        Self { reasoner, registry }
    }
}

impl Node for ResearchNode {
    fn name(&self) -> &str {
        "research"
    }

    fn internal(&self) -> bool {
        true
    }

    fn run<'a>(&'a self, state: &'a ResearchState) -> BoxFuture<'a, Result<StatePatch>> {
        Box::pin(async move {
            let definitions = self.registry.definitions();
            // The persona leads every turn but is never stored in state.
            let mut messages = Vec::with_capacity(state.messages.len() + 1);
            messages.push(ChatMessage::system(prompts::RESEARCHER_SYSTEM));
            messages.extend(state.messages.iter().cloned());
            let response = self.reasoner.respond(&messages, &definitions).await?;
            debug!(
                tool_requests = response.tool_requests().len(),
                "Researcher responded"
            );
            Ok(StatePatch::with_messages(vec![response]))
        })
    }
}

/// Which loop a save node concludes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavePhase {
    Validation,
    Evidence,
}

/// Validator/Summarizer: takes the researcher's final answer, writes it to
/// the phase's field, and clears the message sequence so the next loop
/// starts with a clean slate.
pub struct SaveAnswerNode {
    phase: SavePhase,
}

impl SaveAnswerNode {
    pub fn new(phase: SavePhase) -> Self {
        Self { phase }
    }
}

impl Node for SaveAnswerNode {
    fn name(&self) -> &str {
        match self.phase {
            SavePhase::Validation => "save_validated",
            SavePhase::Evidence => "save_evidence",
        }
    }

    fn run<'a>(&'a self, state: &'a ResearchState) -> BoxFuture<'a, Result<StatePatch>> {
        Box::pin(async move {
            let answer = state
                .latest_message()
                .map(|m| m.text())
                .unwrap_or_default()
                .trim()
                .to_string();

            info!(phase = ?self.phase, chars = answer.len(), "Saving loop answer");

            let mut patch = StatePatch {
                clear_messages: true,
                ..Default::default()
            };
            match self.phase {
                SavePhase::Validation => patch.validated_item = Some(answer),
                SavePhase::Evidence => patch.evidence_summary = Some(answer),
            }
            Ok(patch)
        })
    }
}

/// Synthesizer: combines the validated item and its evidence into the final
/// report. Routes unconditionally to termination.
pub struct SynthesizeNode {
    reasoner: Arc<dyn Reasoner>,
}

impl SynthesizeNode {
    pub fn new(reasoner: Arc<dyn Reasoner>) -> Self {
        Self { reasoner }
    }
}

impl Node for SynthesizeNode {
    fn name(&self) -> &str {
        "synthesize"
    }

    fn run<'a>(&'a self, state: &'a ResearchState) -> BoxFuture<'a, Result<StatePatch>> {
        Box::pin(async move {
            let messages = vec![
                ChatMessage::system(prompts::WRITER_SYSTEM),
                ChatMessage::user(prompts::synthesize(
                    &state.validated_item,
                    &state.evidence_summary,
                )),
            ];
            let response = self.reasoner.respond(&messages, &[]).await?;
            info!("Synthesized final report");
            Ok(StatePatch {
                final_report: Some(response.text()),
                ..Default::default()
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use gapscout_core::types::ToolDefinition;

    /// Reasoner double that always returns the same message.
    struct FixedReasoner(ChatMessage);

    impl Reasoner for FixedReasoner {
        fn respond(
            &self,
            _messages: &[ChatMessage],
            _tools: &[ToolDefinition],
        ) -> BoxFuture<'_, Result<ChatMessage>> {
            let msg = self.0.clone();
            Box::pin(async move { Ok(msg) })
        }

        fn respond_structured(
            &self,
            _messages: &[ChatMessage],
            _schema_hint: &str,
        ) -> BoxFuture<'_, Result<ChatMessage>> {
            let msg = self.0.clone();
            Box::pin(async move { Ok(msg) })
        }
    }

    #[tokio::test]
    async fn test_decompose_empty_list_is_fatal() {
        let reasoner = Arc::new(FixedReasoner(ChatMessage::assistant_text(
            r#"{"sub_topics": []}"#,
        )));
        let node = DecomposeNode::new(reasoner, false);
        let err = node.run(&ResearchState::new("Pets")).await.unwrap_err();
        assert!(matches!(err, GapscoutError::Precondition(_)));
    }

    #[tokio::test]
    async fn test_decompose_best_effort_falls_back() {
        let reasoner = Arc::new(FixedReasoner(ChatMessage::assistant_text(
            "**1. Pet Grooming Tech**\n**2. Senior Pet Care**",
        )));
        let node = DecomposeNode::new(reasoner, true);
        let patch = node.run(&ResearchState::new("Pets")).await.unwrap();
        assert_eq!(patch.sub_topics.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_decompose_strict_rejects_loose_output() {
        let reasoner = Arc::new(FixedReasoner(ChatMessage::assistant_text(
            "**1. Pet Grooming Tech**",
        )));
        let node = DecomposeNode::new(reasoner, false);
        let err = node.run(&ResearchState::new("Pets")).await.unwrap_err();
        assert!(matches!(err, GapscoutError::StructuredOutput(_)));
    }

    /// Reasoner double that records the messages it is handed.
    struct CapturingReasoner {
        seen: std::sync::Mutex<Vec<ChatMessage>>,
        reply: ChatMessage,
    }

    impl Reasoner for CapturingReasoner {
        fn respond(
            &self,
            messages: &[ChatMessage],
            _tools: &[ToolDefinition],
        ) -> BoxFuture<'_, Result<ChatMessage>> {
            *self.seen.lock().unwrap() = messages.to_vec();
            let msg = self.reply.clone();
            Box::pin(async move { Ok(msg) })
        }

        fn respond_structured(
            &self,
            messages: &[ChatMessage],
            _schema_hint: &str,
        ) -> BoxFuture<'_, Result<ChatMessage>> {
            *self.seen.lock().unwrap() = messages.to_vec();
            let msg = self.reply.clone();
            Box::pin(async move { Ok(msg) })
        }
    }

    #[tokio::test]
    async fn test_research_leads_with_persona_without_storing_it() {
        let reasoner = Arc::new(CapturingReasoner {
            seen: std::sync::Mutex::new(Vec::new()),
            reply: ChatMessage::assistant_text("answer"),
        });
        let node = ResearchNode::new(
            Arc::clone(&reasoner) as Arc<dyn Reasoner>,
            Arc::new(gapscout_tools::ToolRegistry::new()),
        );

        let mut state = ResearchState::new("Pets");
        state.messages.push(ChatMessage::user("validate these"));

        let patch = node.run(&state).await.unwrap();

        let seen = reasoner.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].role, gapscout_core::types::Role::System);
        assert_eq!(seen[0].text(), prompts::RESEARCHER_SYSTEM);
        assert_eq!(seen[1].text(), "validate these");

        // only the response lands in state; the persona does not
        let appended = patch.messages.unwrap();
        assert_eq!(appended.len(), 1);
        assert_eq!(appended[0].text(), "answer");
    }

    #[tokio::test]
    async fn test_prepare_task_requires_sub_topics() {
        let node = PrepareTaskNode;
        let err = node.run(&ResearchState::new("Pets")).await.unwrap_err();
        assert!(matches!(err, GapscoutError::Precondition(_)));
    }

    #[tokio::test]
    async fn test_prepare_task_switches_on_validated_item() {
        let node = PrepareTaskNode;

        let mut state = ResearchState::new("Pets");
        state.sub_topics.push(crate::state::SubTopic {
            title: "Pet Grooming Tech".into(),
            description: String::new(),
        });

        let patch = node.run(&state).await.unwrap();
        let prompt = patch.messages.unwrap()[0].text();
        assert!(prompt.contains("demand validation"));

        state.validated_item = "Pet Grooming Tech".into();
        let patch = node.run(&state).await.unwrap();
        let prompt = patch.messages.unwrap()[0].text();
        assert!(prompt.contains("pain points"));
    }

    #[tokio::test]
    async fn test_save_nodes_write_their_field_and_clear() {
        let mut state = ResearchState::new("Pets");
        state
            .messages
            .push(ChatMessage::assistant_text("  Pet Grooming Tech \n"));

        let patch = SaveAnswerNode::new(SavePhase::Validation)
            .run(&state)
            .await
            .unwrap();
        assert_eq!(patch.validated_item.as_deref(), Some("Pet Grooming Tech"));
        assert!(patch.evidence_summary.is_none());
        assert!(patch.clear_messages);

        let patch = SaveAnswerNode::new(SavePhase::Evidence)
            .run(&state)
            .await
            .unwrap();
        assert_eq!(
            patch.evidence_summary.as_deref(),
            Some("Pet Grooming Tech")
        );
        assert!(patch.validated_item.is_none());
    }

    #[tokio::test]
    async fn test_synthesize_writes_final_report() {
        let reasoner = Arc::new(FixedReasoner(ChatMessage::assistant_text("# Report")));
        let node = SynthesizeNode::new(reasoner);

        let mut state = ResearchState::new("Pets");
        state.validated_item = "Pet Grooming Tech".into();
        state.evidence_summary = "Owners struggle with matted fur.".into();

        let patch = node.run(&state).await.unwrap();
        assert_eq!(patch.final_report.as_deref(), Some("# Report"));
    }
}

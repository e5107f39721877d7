use serde::Serialize;

use crate::state::StatePatch;

/// One externally observable event per executor step.
///
/// Internal bookkeeping steps carry an empty delta so intermediate message
/// content never leaks to the delivery layer; state-producing steps carry
/// their full delta. A run ends with exactly one `Done` or `Error`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorkflowEvent {
    Step { step: String, delta: StatePatch },
    Done { final_report: String },
    Error { message: String },
}

impl WorkflowEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_event_serializes_tagged() {
        let ev = WorkflowEvent::Step {
            step: "save_validated".into(),
            delta: StatePatch {
                validated_item: Some("Pet Grooming Tech".into()),
                ..Default::default()
            },
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["event"], "step");
        assert_eq!(json["step"], "save_validated");
        assert_eq!(json["delta"]["validated_item"], "Pet Grooming Tech");
    }

    #[test]
    fn test_empty_delta_stays_small() {
        let ev = WorkflowEvent::Step {
            step: "research".into(),
            delta: StatePatch::default(),
        };
        let json = serde_json::to_string(&ev).unwrap();
        assert!(!json.contains("messages"));
    }

    #[test]
    fn test_terminal_markers() {
        assert!(WorkflowEvent::Done {
            final_report: "r".into()
        }
        .is_terminal());
        assert!(WorkflowEvent::Error {
            message: "m".into()
        }
        .is_terminal());
        assert!(!WorkflowEvent::Step {
            step: "s".into(),
            delta: StatePatch::default()
        }
        .is_terminal());
    }
}

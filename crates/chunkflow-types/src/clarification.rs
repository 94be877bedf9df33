//! Clarification payload for ambiguous input

use serde::{Deserialize, Serialize};

use crate::IntentType;

/// Returned instead of a rendered view when the resolved intent lacks
/// information or confidence. The pipeline pauses until the next input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClarificationPayload {
    pub questions: Vec<String>,
    pub candidate_intent: IntentType,
    pub confidence: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clarification_wire_shape() {
        let payload = ClarificationPayload {
            questions: vec!["When should the meeting be?".into()],
            candidate_intent: IntentType::MeetingSchedule,
            confidence: 0.9,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["candidateIntent"], "meeting_schedule");
        assert_eq!(json["questions"].as_array().unwrap().len(), 1);
    }
}

// Modbot Data Models
// Shared record and result shapes for the moderation pipeline

use serde::{Deserialize, Serialize};

// Re-export report and summary types from the moderation module
pub use crate::services::moderation::pipeline::RunSummary;
pub use crate::services::moderation::report::{ModerationReport, OffensiveExcerpt};

/// One user-submitted comment as loaded from the input file.
///
/// Field names match the input keys (`comment_id,username,comment_text` for
/// CSV headers, same keys for JSON objects). Records are immutable once
/// loaded; every downstream stage borrows them read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub comment_id: i64,
    pub username: String,
    pub comment_text: String,
}

/// One validated classification entry parsed from a model completion.
///
/// `offense_type` is `None` when the model judged the comment inoffensive (or
/// sent JSON `null` / omitted the key). Entries that fail shape validation
/// never become a `ClassificationResult`; they are dropped during parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub comment_id: i64,
    pub is_offensive: bool,
    #[serde(default)]
    pub offense_type: Option<String>,
    pub explanation: String,
}

/// Final per-record result: the input record plus its classification, or
/// `None` when no valid classification was obtained (model omitted the id,
/// the batch call failed, or the response never parsed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationOutcome {
    pub record: CommentRecord,
    pub classification: Option<ClassificationResult>,
}

impl ModerationOutcome {
    pub fn resolved(record: CommentRecord, classification: ClassificationResult) -> Self {
        Self {
            record,
            classification: Some(classification),
        }
    }

    pub fn unresolved(record: CommentRecord) -> Self {
        Self {
            record,
            classification: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.classification.is_some()
    }

    pub fn is_offensive(&self) -> bool {
        self.classification
            .as_ref()
            .map(|c| c.is_offensive)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_offense_type_defaults_to_none() {
        let parsed: ClassificationResult = serde_json::from_str(
            r#"{"comment_id": 7, "is_offensive": false, "explanation": "fine"}"#,
        )
        .unwrap();
        assert_eq!(parsed.comment_id, 7);
        assert!(!parsed.is_offensive);
        assert_eq!(parsed.offense_type, None);
    }

    #[test]
    fn test_classification_null_offense_type_is_none() {
        let parsed: ClassificationResult = serde_json::from_str(
            r#"{"comment_id": 1, "is_offensive": true, "offense_type": null, "explanation": "x"}"#,
        )
        .unwrap();
        assert_eq!(parsed.offense_type, None);
    }

    #[test]
    fn test_outcome_helpers() {
        let record = CommentRecord {
            comment_id: 1,
            username: "ann".to_string(),
            comment_text: "hello".to_string(),
        };
        let unresolved = ModerationOutcome::unresolved(record.clone());
        assert!(!unresolved.is_resolved());
        assert!(!unresolved.is_offensive());

        let resolved = ModerationOutcome::resolved(
            record,
            ClassificationResult {
                comment_id: 1,
                is_offensive: true,
                offense_type: Some("insult".to_string()),
                explanation: "direct insult".to_string(),
            },
        );
        assert!(resolved.is_resolved());
        assert!(resolved.is_offensive());
    }
}

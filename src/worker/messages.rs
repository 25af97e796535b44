//! Worker request and reply types

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Graph, PinnedSet, ScoreResult};
use crate::scoring::ScoreError;

/// Errors reported back to the caller as an `error` reply
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkerError {
    #[error("Invalid message format: {0}")]
    MalformedRequest(String),

    #[error(transparent)]
    Scoring(#[from] ScoreError),
}

impl WorkerError {
    pub(crate) fn missing_fields() -> Self {
        WorkerError::MalformedRequest("expected an object with requestId and graph".to_string())
    }
}

/// A scoring request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRequest {
    pub request_id: i64,
    pub graph: Graph,
    /// Present (even empty) means: prune every feature not listed.
    #[serde(default)]
    pub pinned_ids: Option<Vec<String>>,
}

impl ScoreRequest {
    pub fn pinned_set(&self) -> Option<PinnedSet> {
        self.pinned_ids
            .as_ref()
            .map(|ids| ids.iter().cloned().collect())
    }
}

/// A reply line
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WorkerReply {
    Scores {
        #[serde(rename = "requestId")]
        request_id: i64,
        #[serde(flatten)]
        scores: ScoreResult,
    },
    Failed {
        #[serde(rename = "requestId", skip_serializing_if = "Option::is_none")]
        request_id: Option<i64>,
        error: String,
    },
}

impl WorkerReply {
    pub fn failed(request_id: Option<i64>, error: &WorkerError) -> Self {
        WorkerReply::Failed {
            request_id,
            error: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scores_reply_shape() {
        let reply = WorkerReply::Scores {
            request_id: 3,
            scores: ScoreResult {
                replacement_score: 0.5,
                completeness_score: 0.75,
            },
        };
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({"requestId": 3, "replacementScore": 0.5, "completenessScore": 0.75})
        );
    }

    #[test]
    fn test_malformed_reply_omits_request_id() {
        let reply = WorkerReply::failed(None, &WorkerError::missing_fields());
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({"error": "Invalid message format: expected an object with requestId and graph"})
        );
    }

    #[test]
    fn test_scoring_error_message_passes_through() {
        let err = WorkerError::from(ScoreError::ConvergenceFailure { iterations: 1000 });
        assert_eq!(
            err.to_string(),
            "Influence computation failed to converge after 1000 iterations"
        );
    }

    #[test]
    fn test_request_pinned_ids_optional() {
        let without: ScoreRequest =
            serde_json::from_value(json!({"requestId": 1, "graph": {"nodes": [], "links": []}}))
                .unwrap();
        assert!(without.pinned_set().is_none());

        let empty: ScoreRequest = serde_json::from_value(
            json!({"requestId": 1, "graph": {"nodes": [], "links": []}, "pinnedIds": []}),
        )
        .unwrap();
        assert_eq!(empty.pinned_set().map(|s| s.len()), Some(0));
    }
}

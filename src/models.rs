//! Core data models for attribution graphs
//!
//! These types mirror the graph JSON produced by the attribution pipeline.
//! Nodes carry more fields upstream (`clerp`, `is_target_logit`,
//! `influence`, ...); only the ones the scorer needs are modeled and the
//! rest are ignored on deserialization.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Deserializer, Serialize};

/// Layer label used by embedding (token) nodes.
pub const EMBEDDING_LAYER: &str = "E";

/// Node IDs of transcoder features the caller wants kept unmerged.
pub type PinnedSet = FxHashSet<String>;

/// Kind of computational node in an attribution graph.
///
/// The variant order is the canonical sort priority: features first,
/// logits last, anything unrecognized after that.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FeatureType {
    TranscoderFeature,
    ReconstructionError,
    Embedding,
    Logit,
    /// Unrecognized type, preserved verbatim.
    Unknown(String),
}

impl FeatureType {
    /// Sort priority (lower sorts first).
    pub fn priority(&self) -> u8 {
        match self {
            FeatureType::TranscoderFeature => 0,
            FeatureType::ReconstructionError => 1,
            FeatureType::Embedding => 2,
            FeatureType::Logit => 3,
            FeatureType::Unknown(_) => 4,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FeatureType::TranscoderFeature => "transcoder-feature",
            FeatureType::ReconstructionError => "reconstruction-error",
            FeatureType::Embedding => "embedding",
            FeatureType::Logit => "logit",
            FeatureType::Unknown(raw) => raw,
        }
    }
}

impl From<String> for FeatureType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "transcoder-feature" | "cross layer transcoder" => FeatureType::TranscoderFeature,
            "reconstruction-error" | "mlp reconstruction error" => {
                FeatureType::ReconstructionError
            }
            "embedding" => FeatureType::Embedding,
            "logit" => FeatureType::Logit,
            _ => FeatureType::Unknown(raw),
        }
    }
}

impl From<FeatureType> for String {
    fn from(ft: FeatureType) -> Self {
        ft.as_str().to_string()
    }
}

impl std::fmt::Display for FeatureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node in the attribution graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub node_id: String,
    pub feature_type: FeatureType,
    /// Layer index as text, or [`EMBEDDING_LAYER`] for token nodes.
    #[serde(deserialize_with = "deserialize_layer")]
    pub layer: String,
    #[serde(default)]
    pub ctx_idx: i64,
    /// Feature index within the transcoder. Missing or null means 0.
    #[serde(default)]
    pub feature: Option<i64>,
    /// Output probability of a logit node; its injection weight.
    #[serde(default)]
    pub token_prob: f64,
}

impl GraphNode {
    pub fn new(
        node_id: impl Into<String>,
        feature_type: FeatureType,
        layer: impl Into<String>,
        ctx_idx: i64,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            feature_type,
            layer: layer.into(),
            ctx_idx,
            feature: None,
            token_prob: 0.0,
        }
    }

    pub fn with_feature(mut self, feature: i64) -> Self {
        self.feature = Some(feature);
        self
    }

    pub fn with_token_prob(mut self, token_prob: f64) -> Self {
        self.token_prob = token_prob;
        self
    }

    pub fn feature_index(&self) -> i64 {
        self.feature.unwrap_or(0)
    }
}

/// A weighted causal contribution from `source` to `target`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub weight: f64,
}

impl GraphEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>, weight: f64) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            weight,
        }
    }
}

/// Query parameters saved alongside a graph file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    /// Present (even empty) means the saved view was pruned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned_ids: Option<Vec<String>>,
}

/// An attribution graph as supplied by the caller
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default, alias = "edges")]
    pub links: Vec<GraphEdge>,
    #[serde(default, rename = "qParams", skip_serializing_if = "Option::is_none")]
    pub q_params: Option<QueryParams>,
}

impl Graph {
    pub fn new(nodes: Vec<GraphNode>, links: Vec<GraphEdge>) -> Self {
        Self {
            nodes,
            links,
            q_params: None,
        }
    }

    /// Pinned IDs stored in the graph file.
    ///
    /// `None` when the file has no `qParams.pinnedIds`. A saved empty list
    /// is `Some` of an empty set, which prunes every feature.
    pub fn saved_pinned_ids(&self) -> Option<PinnedSet> {
        self.q_params
            .as_ref()
            .and_then(|q| q.pinned_ids.as_ref())
            .map(|ids| ids.iter().cloned().collect())
    }
}

/// The two graph diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub replacement_score: f64,
    pub completeness_score: f64,
}

fn deserialize_layer<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum LayerRepr {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match LayerRepr::deserialize(deserializer)? {
        LayerRepr::Text(s) => s,
        LayerRepr::Int(n) => n.to_string(),
        LayerRepr::Float(x) => x.to_string(),
    })
}

//! Canonical node ordering
//!
//! Sort key: (type priority, layer rank, ctx_idx, feature). The sort is
//! stable, so nodes with equal keys keep their input order. Because type
//! priority is the primary key the sorted list splits into contiguous
//! blocks: features, errors, tokens, logits (unknown types trail).

use crate::models::{FeatureType, GraphNode, EMBEDDING_LAYER};

/// Index ranges of each node block in canonical order.
///
/// features `[0, error_start)`, errors `[error_start, error_end)`,
/// tokens `[error_end, token_end)`, logits `[token_end, len)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockBounds {
    pub error_start: usize,
    pub error_end: usize,
    pub token_end: usize,
    pub len: usize,
}

impl BlockBounds {
    /// Derive block boundaries from per-type counts.
    pub fn from_nodes(nodes: &[&GraphNode]) -> Self {
        let count = |ft: FeatureType| nodes.iter().filter(|n| n.feature_type == ft).count();

        let error_start = count(FeatureType::TranscoderFeature);
        let error_end = error_start + count(FeatureType::ReconstructionError);
        let token_end = error_end + count(FeatureType::Embedding);

        Self {
            error_start,
            error_end,
            token_end,
            len: nodes.len(),
        }
    }

    pub fn errors(&self) -> std::ops::Range<usize> {
        self.error_start..self.error_end
    }

    pub fn tokens(&self) -> std::ops::Range<usize> {
        self.error_end..self.token_end
    }
}

/// Numeric rank of a layer label.
///
/// The embedding layer is 0. Otherwise the label, with surrounding
/// whitespace trimmed, must parse whole as a base-10 integer (`"3"`,
/// `" 3 "`, `"-1"`). Anything else, including `"3.0"` and `"3a"`, gets
/// `unparsed_rank`; no prefix of the label is parsed.
pub fn layer_rank(layer: &str, unparsed_rank: i64) -> i64 {
    if layer == EMBEDDING_LAYER {
        return 0;
    }
    layer.trim().parse::<i64>().unwrap_or(unparsed_rank)
}

/// Return the nodes in canonical order.
pub fn canonical_order(nodes: &[GraphNode], unparsed_rank: i64) -> Vec<&GraphNode> {
    let mut ordered: Vec<&GraphNode> = nodes.iter().collect();
    ordered.sort_by_key(|n| {
        (
            n.feature_type.priority(),
            layer_rank(&n.layer, unparsed_rank),
            n.ctx_idx,
            n.feature_index(),
        )
    });
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(nodes: &[&GraphNode]) -> Vec<String> {
        nodes.iter().map(|n| n.node_id.clone()).collect()
    }

    #[test]
    fn test_layer_rank() {
        assert_eq!(layer_rank("E", 999), 0);
        assert_eq!(layer_rank("12", 999), 12);
        assert_eq!(layer_rank("attn", 999), 999);
        assert_eq!(layer_rank("", 999), 999);
        assert_eq!(layer_rank(" 3 ", 999), 3);
        assert_eq!(layer_rank("3.0", 999), 999);
        assert_eq!(layer_rank("3a", 999), 999);
    }

    #[test]
    fn test_type_priority_dominates() {
        let nodes = vec![
            GraphNode::new("logit", FeatureType::Logit, "1", 0),
            GraphNode::new("emb", FeatureType::Embedding, "E", 0),
            GraphNode::new("err", FeatureType::ReconstructionError, "0", 0),
            GraphNode::new("odd", FeatureType::Unknown("attention".into()), "0", 0),
            GraphNode::new("feat", FeatureType::TranscoderFeature, "5", 3),
        ];

        let ordered = canonical_order(&nodes, 999);
        assert_eq!(ids(&ordered), vec!["feat", "err", "emb", "logit", "odd"]);
    }

    #[test]
    fn test_secondary_keys() {
        let nodes = vec![
            GraphNode::new("f_l2_c0", FeatureType::TranscoderFeature, "2", 0),
            GraphNode::new("f_l1_c1_f9", FeatureType::TranscoderFeature, "1", 1).with_feature(9),
            GraphNode::new("f_l1_c1_f2", FeatureType::TranscoderFeature, "1", 1).with_feature(2),
            GraphNode::new("f_bad", FeatureType::TranscoderFeature, "x", 0),
            GraphNode::new("f_l1_c0", FeatureType::TranscoderFeature, "1", 0),
        ];

        let ordered = canonical_order(&nodes, 999);
        assert_eq!(
            ids(&ordered),
            vec!["f_l1_c0", "f_l1_c1_f2", "f_l1_c1_f9", "f_l2_c0", "f_bad"]
        );
    }

    #[test]
    fn test_ties_are_stable() {
        let nodes = vec![
            GraphNode::new("b", FeatureType::Embedding, "E", 0),
            GraphNode::new("a", FeatureType::Embedding, "E", 0),
        ];
        assert_eq!(ids(&canonical_order(&nodes, 999)), vec!["b", "a"]);
    }

    #[test]
    fn test_block_bounds() {
        let nodes = vec![
            GraphNode::new("l", FeatureType::Logit, "3", 1),
            GraphNode::new("e0", FeatureType::Embedding, "E", 0),
            GraphNode::new("e1", FeatureType::Embedding, "E", 1),
            GraphNode::new("r", FeatureType::ReconstructionError, "0", 0),
            GraphNode::new("f0", FeatureType::TranscoderFeature, "0", 0),
            GraphNode::new("f1", FeatureType::TranscoderFeature, "1", 0),
        ];
        let ordered = canonical_order(&nodes, 999);
        let blocks = BlockBounds::from_nodes(&ordered);

        assert_eq!(
            blocks,
            BlockBounds {
                error_start: 2,
                error_end: 3,
                token_end: 5,
                len: 6
            }
        );
        assert_eq!(blocks.errors(), 2..3);
        assert_eq!(blocks.tokens(), 3..5);
    }
}

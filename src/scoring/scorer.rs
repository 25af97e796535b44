//! Graph scorer
//!
//! Ties ordering, matrix construction, pruning, normalization and
//! propagation together and derives the two scores.

use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use tracing::{debug, info};

use super::influence::{logit_weights, propagate};
use super::matrix::{build_adjacency, merge_unpinned, normalize_rows, MergeStats};
use super::ordering::{canonical_order, BlockBounds};
use super::ScoreOutcome;
use crate::config::ScoringConfig;
use crate::models::{Graph, PinnedSet, ScoreResult};

/// Complete score breakdown for transparency
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub replacement_score: f64,
    pub completeness_score: f64,
    /// Influence reaching token (embedding) nodes
    pub token_influence: f64,
    /// Influence absorbed by reconstruction error nodes
    pub error_influence: f64,
    /// Σ (influence + logit weight) over all nodes
    pub total_output_influence: f64,
    /// Propagation steps after the seed term
    pub iterations: usize,
    pub node_count: usize,
    pub edge_count: usize,
    pub dropped_edges: usize,
    /// Whether pinned-node pruning was applied
    pub pruned: bool,
    pub merged_features: usize,
    pub discarded_features: usize,
}

impl ScoreBreakdown {
    pub fn result(&self) -> ScoreResult {
        ScoreResult {
            replacement_score: self.replacement_score,
            completeness_score: self.completeness_score,
        }
    }
}

/// Influence-based graph scorer
pub struct GraphScorer<'a> {
    config: &'a ScoringConfig,
}

impl<'a> GraphScorer<'a> {
    pub fn new(config: &'a ScoringConfig) -> Self {
        Self { config }
    }

    /// Compute replacement and completeness scores.
    pub fn compute(&self, graph: &Graph, pinned: Option<&PinnedSet>) -> ScoreOutcome<ScoreResult> {
        Ok(self.calculate(graph, pinned)?.result())
    }

    /// Compute scores with the intermediate totals.
    pub fn calculate(
        &self,
        graph: &Graph,
        pinned: Option<&PinnedSet>,
    ) -> ScoreOutcome<ScoreBreakdown> {
        let order = canonical_order(&graph.nodes, self.config.unparsed_layer_rank);
        let blocks = BlockBounds::from_nodes(&order);
        let adjacency = build_adjacency(&order, &graph.links);

        debug!(
            "Scoring graph: {} nodes ({} features, {} errors, {} tokens), {} edges",
            blocks.len,
            blocks.error_start,
            blocks.error_end - blocks.error_start,
            blocks.token_end - blocks.error_end,
            adjacency.resolved_edges
        );

        let mut breakdown = ScoreBreakdown {
            node_count: blocks.len,
            edge_count: adjacency.resolved_edges,
            dropped_edges: adjacency.dropped_edges,
            pruned: pinned.is_some(),
            ..Default::default()
        };

        // Nothing connects: both scores are 0 by definition
        if adjacency.resolved_edges == 0 {
            debug!("Graph has no resolvable edges, scores are 0");
            return Ok(breakdown);
        }

        let mut matrix = adjacency.matrix;
        if let Some(pinned) = pinned {
            let MergeStats { merged, discarded } = merge_unpinned(&mut matrix, &order, pinned);
            breakdown.merged_features = merged;
            breakdown.discarded_features = discarded;
        }
        normalize_rows(&mut matrix, self.config.row_epsilon);

        let weights = logit_weights(&order);
        let propagation = propagate(&matrix, &weights, self.config.max_iterations)?;
        let influence = &propagation.influence;

        breakdown.iterations = propagation.iterations;
        breakdown.token_influence = influence.as_slice()[blocks.tokens()].iter().sum();
        breakdown.error_influence = influence.as_slice()[blocks.errors()].iter().sum();
        breakdown.replacement_score = ratio_or_zero(
            breakdown.token_influence,
            breakdown.token_influence + breakdown.error_influence,
        );

        let (completeness, total_output) = completeness(&matrix, influence, &weights, &blocks);
        breakdown.completeness_score = completeness;
        breakdown.total_output_influence = total_output;

        info!(
            "Graph scores: replacement={:.4}, completeness={:.4} ({} iterations)",
            breakdown.replacement_score, breakdown.completeness_score, breakdown.iterations
        );

        Ok(breakdown)
    }

    /// Generate human-readable explanation of the scores
    pub fn explain(&self, breakdown: &ScoreBreakdown) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "# Replacement: {:.4}  Completeness: {:.4}\n",
            breakdown.replacement_score, breakdown.completeness_score
        ));

        lines.push("## Formula\n".to_string());
        lines.push("```".to_string());
        lines.push("Replacement  = token influence / (token influence + error influence)".to_string());
        lines.push("Completeness = Σ (1 - error share of inputs) × output influence / Σ output influence".to_string());
        lines.push("```\n".to_string());

        lines.push("## Graph\n".to_string());
        lines.push(format!("- **Nodes**: {}", breakdown.node_count));
        lines.push(format!(
            "- **Edges**: {} ({} dropped with unknown endpoints)",
            breakdown.edge_count, breakdown.dropped_edges
        ));
        if breakdown.pruned {
            lines.push(format!(
                "- **Pruned**: {} features merged into error nodes, {} discarded",
                breakdown.merged_features, breakdown.discarded_features
            ));
        } else {
            lines.push("- **Pruned**: no (full graph)".to_string());
        }
        lines.push(String::new());

        lines.push("## Influence\n".to_string());
        lines.push(format!("- Token influence: {:.6}", breakdown.token_influence));
        lines.push(format!("- Error influence: {:.6}", breakdown.error_influence));
        lines.push(format!(
            "- Total output influence: {:.6}",
            breakdown.total_output_influence
        ));
        lines.push(format!("- Propagation steps: {}", breakdown.iterations));

        lines.join("\n")
    }
}

/// Returns `(completeness, Σ output influence)`.
fn completeness(
    normalized: &DMatrix<f64>,
    influence: &DVector<f64>,
    weights: &DVector<f64>,
    blocks: &BlockBounds,
) -> (f64, f64) {
    let mut numerator = 0.0;
    let mut total_output = 0.0;

    for i in 0..blocks.len {
        let error_share: f64 = blocks.errors().map(|j| normalized[(i, j)]).sum();
        let output = influence[i] + weights[i];
        numerator += (1.0 - error_share) * output;
        total_output += output;
    }

    (ratio_or_zero(numerator, total_output), total_output)
}

/// `num / denom`, with NaN (0/0) reported as 0.
fn ratio_or_zero(num: f64, denom: f64) -> f64 {
    let ratio = num / denom;
    if ratio.is_nan() {
        0.0
    } else {
        ratio
    }
}

//! Attribution Graph Influence Scoring
//!
//! Computes two diagnostics for an attribution graph: how much of the
//! logit-directed influence reaches the input tokens through explained
//! features rather than reconstruction error (the replacement score), and
//! how much of all output influence survives once error-node contributions
//! are discounted (the completeness score).
//!
//! # Pipeline
//!
//! ```text
//! nodes ──sort──▶ [features | errors | tokens | logits]
//! edges ──────▶ A[target][source] += weight
//!               (optional) fold unpinned features into their error node
//!               A_norm[i][j] = |A[i][j]| / max(Σ_k |A[i][k]|, ε)
//!               influence = Σ_{k≥1} w · A_normᵏ      (w = logit token_prob)
//!
//! replacement  = Σ influence[tokens] / (Σ influence[tokens] + Σ influence[errors])
//! completeness = Σ_i (1 − Σ_{j∈errors} A_norm[i][j]) · (influence[i] + w[i]) / Σ_i (influence[i] + w[i])
//! ```
//!
//! Undefined ratios (0/0) are reported as 0. The only failure is a
//! propagation that has not decayed to zero within the iteration ceiling.

mod influence;
mod matrix;
mod ordering;
mod scorer;

pub use influence::{logit_weights, propagate, Propagation};
pub use matrix::{build_adjacency, merge_unpinned, normalize_rows, Adjacency, MergeStats};
pub use ordering::{canonical_order, layer_rank, BlockBounds};
pub use scorer::{GraphScorer, ScoreBreakdown};

use crate::config::ScoringConfig;
use crate::models::{Graph, PinnedSet, ScoreResult};
use thiserror::Error;

/// Errors that can occur while scoring a graph
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreError {
    #[error("Influence computation failed to converge after {iterations} iterations")]
    ConvergenceFailure { iterations: usize },
}

pub type ScoreOutcome<T> = Result<T, ScoreError>;

/// Score a graph with the default configuration.
///
/// `pinned` is `None` to score the graph as-is. `Some(set)` prunes the
/// graph first: every transcoder feature not in the set is folded into
/// the reconstruction error at its position (an empty set folds all of
/// them).
pub fn compute(graph: &Graph, pinned: Option<&PinnedSet>) -> ScoreOutcome<ScoreResult> {
    let config = ScoringConfig::default();
    GraphScorer::new(&config).compute(graph, pinned)
}

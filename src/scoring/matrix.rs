//! Adjacency matrix construction, pruning and normalization
//!
//! The matrix is indexed `A[target][source]`: row `i` holds everything
//! flowing *into* node `i`, column `j` everything flowing *out of* node `j`.

use nalgebra::DMatrix;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::models::{FeatureType, GraphEdge, GraphNode, PinnedSet};

/// Dense adjacency matrix plus bookkeeping from the build
#[derive(Debug, Clone)]
pub struct Adjacency {
    pub matrix: DMatrix<f64>,
    /// Edges whose endpoints both resolved
    pub resolved_edges: usize,
    /// Edges dropped because an endpoint is not in the graph
    pub dropped_edges: usize,
}

/// Outcome of folding unpinned features
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Features folded into an error node
    pub merged: usize,
    /// Features removed with no error node to absorb them
    pub discarded: usize,
}

/// Build `A[target][source] += weight` over canonically ordered nodes.
///
/// Parallel edges accumulate. Edges naming an unknown node are skipped.
pub fn build_adjacency(order: &[&GraphNode], edges: &[GraphEdge]) -> Adjacency {
    let n = order.len();
    let index: FxHashMap<&str, usize> = order
        .iter()
        .enumerate()
        .map(|(i, node)| (node.node_id.as_str(), i))
        .collect();

    let mut matrix = DMatrix::<f64>::zeros(n, n);
    let mut resolved_edges = 0;
    let mut dropped_edges = 0;

    for edge in edges {
        match (index.get(edge.source.as_str()), index.get(edge.target.as_str())) {
            (Some(&src), Some(&dst)) => {
                matrix[(dst, src)] += edge.weight;
                resolved_edges += 1;
            }
            _ => dropped_edges += 1,
        }
    }

    if dropped_edges > 0 {
        debug!("Dropped {} edges with unknown endpoints", dropped_edges);
    }

    Adjacency {
        matrix,
        resolved_edges,
        dropped_edges,
    }
}

/// Fold every transcoder feature not in `pinned` into the reconstruction
/// error node at the same `(layer, ctx_idx)`.
///
/// The feature's outgoing column is added to the error node's column, then
/// the feature's row and column are cleared. Without a matching error node
/// the feature is only cleared.
pub fn merge_unpinned(
    matrix: &mut DMatrix<f64>,
    order: &[&GraphNode],
    pinned: &PinnedSet,
) -> MergeStats {
    let error_at: FxHashMap<(&str, i64), usize> = order
        .iter()
        .enumerate()
        .filter(|(_, node)| node.feature_type == FeatureType::ReconstructionError)
        .map(|(i, node)| ((node.layer.as_str(), node.ctx_idx), i))
        .collect();

    let mut stats = MergeStats::default();

    for (idx, node) in order.iter().enumerate() {
        if node.feature_type != FeatureType::TranscoderFeature || pinned.contains(&node.node_id) {
            continue;
        }

        match error_at.get(&(node.layer.as_str(), node.ctx_idx)) {
            Some(&error_idx) => {
                fold_column(matrix, idx, error_idx);
                stats.merged += 1;
            }
            None => stats.discarded += 1,
        }
        clear_node(matrix, idx);
    }

    debug!(
        "Pruned graph: {} features merged into error nodes, {} discarded, {} pinned",
        stats.merged,
        stats.discarded,
        pinned.len()
    );

    stats
}

/// `A[r][into] += A[r][from]` for every row.
fn fold_column(matrix: &mut DMatrix<f64>, from: usize, into: usize) {
    for r in 0..matrix.nrows() {
        let carried = matrix[(r, from)];
        matrix[(r, into)] += carried;
    }
}

/// Zero a node's row and column.
fn clear_node(matrix: &mut DMatrix<f64>, idx: usize) {
    matrix.row_mut(idx).fill(0.0);
    matrix.column_mut(idx).fill(0.0);
}

/// Row-normalize by absolute value.
///
/// `A[i][j] = |A[i][j]| / max(Σ_k |A[i][k]|, eps)`. Signs are dropped and
/// all-zero rows stay zero.
pub fn normalize_rows(matrix: &mut DMatrix<f64>, eps: f64) {
    for i in 0..matrix.nrows() {
        let mut row = matrix.row_mut(i);
        let total: f64 = row.iter().map(|w| w.abs()).sum();
        let denom = total.max(eps);
        for w in row.iter_mut() {
            *w = w.abs() / denom;
        }
    }
}

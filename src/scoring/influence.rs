//! Influence propagation
//!
//! Evaluates the Neumann series `Σ_{k≥1} w · A_normᵏ` one term at a time
//! instead of solving `w · (I − A_norm)⁻¹`. Every row of `A_norm` sums to
//! 1 or 0, so on an acyclic graph the terms reach exactly zero after at
//! most `depth` steps. Cycles keep the series alive and hit the ceiling.

use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

use super::{ScoreError, ScoreOutcome};
use crate::models::{FeatureType, GraphNode};

/// Result of a propagation run
#[derive(Debug, Clone)]
pub struct Propagation {
    /// Accumulated influence per node (canonical index)
    pub influence: DVector<f64>,
    /// Extra steps taken after the seed term
    pub iterations: usize,
}

/// Injection weights: `token_prob` at logit positions, zero elsewhere.
pub fn logit_weights(order: &[&GraphNode]) -> DVector<f64> {
    DVector::from_iterator(
        order.len(),
        order.iter().map(|node| match node.feature_type {
            FeatureType::Logit => node.token_prob,
            _ => 0.0,
        }),
    )
}

/// Propagate `seed` backwards through `normalized` until the current term
/// vanishes.
///
/// Each step computes `next[j] = Σ_i current[i] · A[i][j]`, i.e. `Aᵀ · current`.
///
/// # Errors
/// - `ConvergenceFailure` if the term is still non-zero after `max_iterations` steps
pub fn propagate(
    normalized: &DMatrix<f64>,
    seed: &DVector<f64>,
    max_iterations: usize,
) -> ScoreOutcome<Propagation> {
    let mut current = normalized.tr_mul(seed);
    let mut influence = current.clone();
    let mut iterations = 0;

    while current.iter().any(|&x| x != 0.0) {
        if iterations >= max_iterations {
            warn!(
                "Influence still non-zero after {} iterations (residual {:e})",
                iterations,
                current.iter().map(|x| x.abs()).sum::<f64>()
            );
            return Err(ScoreError::ConvergenceFailure { iterations });
        }
        current = normalized.tr_mul(&current);
        influence += &current;
        iterations += 1;
    }

    debug!("Influence propagation settled after {} iterations", iterations);

    Ok(Propagation {
        influence,
        iterations,
    })
}

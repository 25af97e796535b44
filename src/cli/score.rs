//! Score command - score attribution graph files

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use circuit_score::config::ScoringConfig;
use circuit_score::models::{Graph, PinnedSet};
use circuit_score::scoring::{GraphScorer, ScoreBreakdown, ScoreError};

/// How the pinned set for each graph is chosen
#[derive(Debug, Clone, PartialEq)]
pub enum PinSelection {
    /// Use `qParams.pinnedIds` from the file (an empty list prunes
    /// everything), full graph if the key is absent
    Saved,
    /// Score the full graph
    Full,
    /// Prune against this set (may be empty)
    Pinned(PinnedSet),
}

impl PinSelection {
    pub fn from_flags(pinned: Vec<String>, prune_all: bool, full: bool) -> Self {
        if full {
            PinSelection::Full
        } else if !pinned.is_empty() || prune_all {
            PinSelection::Pinned(pinned.into_iter().collect())
        } else {
            PinSelection::Saved
        }
    }

    fn resolve(&self, graph: &Graph) -> Option<PinnedSet> {
        match self {
            PinSelection::Saved => graph.saved_pinned_ids(),
            PinSelection::Full => None,
            PinSelection::Pinned(set) => Some(set.clone()),
        }
    }
}

/// Scores for one input file
struct FileScore {
    path: PathBuf,
    outcome: Result<ScoreBreakdown, ScoreError>,
}

/// Run the score command
pub fn run(
    files: &[PathBuf],
    selection: &PinSelection,
    format: &str,
    explain: bool,
    workers: usize,
    config: &ScoringConfig,
) -> Result<()> {
    let graphs = files
        .iter()
        .map(|path| load_graph(path).map(|graph| (path.clone(), graph)))
        .collect::<Result<Vec<_>>>()?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.min(graphs.len()).max(1))
        .build()?;

    let scorer = GraphScorer::new(config);
    let results: Vec<FileScore> = pool.install(|| {
        graphs
            .par_iter()
            .map(|(path, graph)| {
                let pinned = selection.resolve(graph);
                debug!(
                    "Scoring {} (pinned: {:?})",
                    path.display(),
                    pinned.as_ref().map(|p| p.len())
                );
                FileScore {
                    path: path.clone(),
                    outcome: scorer.calculate(graph, pinned.as_ref()),
                }
            })
            .collect()
    });

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&json_report(&results))?),
        _ => print!("{}", text_report(&results, &scorer, explain)),
    }

    let failed = results.iter().filter(|r| r.outcome.is_err()).count();
    if failed > 0 {
        anyhow::bail!("{} of {} graphs failed to score", failed, results.len());
    }
    Ok(())
}

fn load_graph(path: &Path) -> Result<Graph> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let graph: Graph = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse graph JSON in {}", path.display()))?;
    Ok(graph)
}

fn json_report(results: &[FileScore]) -> Value {
    Value::Array(
        results
            .iter()
            .map(|r| match &r.outcome {
                Ok(breakdown) => {
                    let mut entry = serde_json::to_value(breakdown).unwrap_or_else(|_| json!({}));
                    entry["file"] = json!(r.path.display().to_string());
                    entry
                }
                Err(e) => json!({
                    "file": r.path.display().to_string(),
                    "error": e.to_string(),
                }),
            })
            .collect(),
    )
}

fn text_report(results: &[FileScore], scorer: &GraphScorer<'_>, explain: bool) -> String {
    let mut out = String::new();
    for r in results {
        match &r.outcome {
            Ok(breakdown) if explain => {
                out.push_str(&format!("{}\n\n{}\n\n", r.path.display(), scorer.explain(breakdown)));
            }
            Ok(breakdown) => {
                out.push_str(&format!(
                    "{}: replacement={:.4} completeness={:.4}\n",
                    r.path.display(),
                    breakdown.replacement_score,
                    breakdown.completeness_score
                ));
            }
            Err(e) => {
                warn!("{}: {}", r.path.display(), e);
                out.push_str(&format!("{}: error: {}\n", r.path.display(), e));
            }
        }
    }
    out
}

//! Serve command handler

use anyhow::Result;

use circuit_score::config::ScoringConfig;

/// Run the stdio scoring worker
pub fn run(config: ScoringConfig) -> Result<()> {
    circuit_score::worker::run_server(config)
}

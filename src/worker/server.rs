//! Newline-delimited JSON worker loop

use anyhow::{Context, Result};
use serde_json::Value;
use std::io::{BufRead, BufReader, Write};
use tracing::{debug, info, warn};

use super::messages::{ScoreRequest, WorkerError, WorkerReply};
use crate::config::ScoringConfig;
use crate::scoring::GraphScorer;

/// Scoring worker
pub struct Worker {
    config: ScoringConfig,
}

impl Worker {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Read requests from `reader` until EOF, writing one reply per request.
    ///
    /// Only I/O failures end the loop. A line that is not valid UTF-8 is
    /// answered as a malformed message.
    pub fn run<R: BufRead, W: Write>(&self, mut reader: R, mut writer: W) -> Result<()> {
        let mut handled = 0usize;
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .context("Failed to read request")?;
            if read == 0 {
                break;
            }

            let reply = match std::str::from_utf8(&buf) {
                Ok(line) => self.handle_message(line.trim_end_matches(['\n', '\r'])),
                Err(e) => {
                    warn!("Request line is not valid UTF-8: {}", e);
                    Some(WorkerReply::failed(None, &WorkerError::missing_fields()))
                }
            };
            let Some(reply) = reply else {
                continue;
            };

            let reply_str = serde_json::to_string(&reply)?;
            debug!("Sending: {}", reply_str);
            writeln!(writer, "{}", reply_str)?;
            writer.flush()?;
            handled += 1;
        }

        info!("Worker input closed after {} replies", handled);
        Ok(())
    }

    /// Handle one raw message. `None` means no reply is sent.
    pub fn handle_message(&self, message: &str) -> Option<WorkerReply> {
        if message.trim().is_empty() {
            return None;
        }

        let value: Value = match serde_json::from_str(message) {
            Ok(value) => value,
            Err(e) => {
                warn!("Unparseable message: {}", e);
                return Some(WorkerReply::failed(None, &WorkerError::missing_fields()));
            }
        };

        if is_empty_payload(&value) {
            debug!("Ignoring empty payload");
            return None;
        }

        Some(self.handle_value(value))
    }

    fn handle_value(&self, value: Value) -> WorkerReply {
        let has_fields = value
            .as_object()
            .is_some_and(|obj| obj.contains_key("requestId") && obj.contains_key("graph"));
        if !has_fields {
            warn!("Rejecting message without requestId/graph");
            return WorkerReply::failed(None, &WorkerError::missing_fields());
        }

        let request_id = value.get("requestId").and_then(Value::as_i64);

        let request: ScoreRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                let err = WorkerError::MalformedRequest(e.to_string());
                warn!("Request {:?}: {}", request_id, err);
                return WorkerReply::failed(request_id, &err);
            }
        };

        debug!(
            "Request {}: {} nodes, {} links, pinned={:?}",
            request.request_id,
            request.graph.nodes.len(),
            request.graph.links.len(),
            request.pinned_ids.as_ref().map(Vec::len)
        );

        let pinned = request.pinned_set();
        let scorer = GraphScorer::new(&self.config);
        match scorer.compute(&request.graph, pinned.as_ref()) {
            Ok(scores) => WorkerReply::Scores {
                request_id: request.request_id,
                scores,
            },
            Err(e) => {
                let err = WorkerError::from(e);
                warn!("Request {} failed: {}", request.request_id, err);
                WorkerReply::failed(Some(request.request_id), &err)
            }
        }
    }
}

/// Payloads a host emits during its own lifecycle; never answered.
fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Run the worker on stdin/stdout
pub fn run_server(config: ScoringConfig) -> Result<()> {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();

    info!(
        "circuit-score worker started (max_iterations={})",
        config.max_iterations
    );

    Worker::new(config).run(BufReader::new(stdin.lock()), stdout.lock())
}

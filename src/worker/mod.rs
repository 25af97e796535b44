//! Scoring Worker over stdio
//!
//! A message-passing shell around the scorer. Each input line is one JSON
//! request; each handled request produces exactly one JSON reply line.
//!
//! # Usage
//!
//! ```bash
//! circuit-score serve < requests.jsonl > replies.jsonl
//! ```
//!
//! # Messages
//!
//! ```json
//! {"requestId": 7, "graph": {"nodes": [...], "links": [...]}, "pinnedIds": ["3_5_0"]}
//! {"requestId": 7, "replacementScore": 0.61, "completenessScore": 0.83}
//! {"requestId": 7, "error": "Influence computation failed to converge after 1000 iterations"}
//! {"error": "Invalid message format: expected an object with requestId and graph"}
//! ```
//!
//! Blank lines and falsy payloads (`null`, `false`, `0`, `""`) get no reply.

mod messages;
mod server;

pub use messages::{ScoreRequest, WorkerError, WorkerReply};
pub use server::{run_server, Worker};

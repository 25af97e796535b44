//! circuit-score - influence scoring for attribution graphs
//!
//! Given an attribution graph (transcoder features, reconstruction errors,
//! token embeddings and output logits joined by weighted edges) this crate
//! computes the replacement and completeness scores of the graph, either
//! as a library call ([`scoring::compute`]) or through a newline-delimited
//! JSON worker ([`worker`]).

pub mod config;
pub mod models;
pub mod scoring;
pub mod worker;

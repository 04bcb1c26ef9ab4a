//! Lingo · language quiz backend
//!
//! Quiz catalogue, grading and progress over HTTP + WebSocket, with spoken
//! answers matched to question options by normalized Levenshtein similarity
//! (see [`similarity`]).

pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod logic;
pub mod protocol;
pub mod routes;
pub mod seeds;
pub mod similarity;
pub mod speech;
pub mod state;
pub mod telemetry;
pub mod util;

pub use similarity::{best_match, Candidate, Match, MatchError, SimilarityScorer};

//! `prodmatch-matcher`: basket-to-catalog product matching engine.
//!
//! Pure engine crate: receives pre-loaded basket and master collections,
//! scores every description pair (edit-distance ratio or equal phonetic key),
//! and returns one merged or unchanged record per basket row.
//! No CLI or IO dependencies.

pub mod config;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod model;
pub mod phonetic;
pub mod score;
pub mod similarity;
pub mod summary;

pub use config::MatchConfig;
pub use engine::{match_collections, run, MatchOptions};
pub use error::MatchError;
pub use matcher::SelectionPolicy;
pub use model::{Collection, CollectionKind, MatchOutput, MatchResult, OutputTable, Record, Value};
pub use similarity::SimilarityMetric;

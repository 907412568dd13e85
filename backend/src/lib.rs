//! Income prediction service: feature shaping, prediction dispatch and the HTTP API.

pub mod config;
pub mod encoding;
pub mod error;
pub mod features;
pub mod inference;
pub mod models;
pub mod predictor;
pub mod routes;
pub mod table;

pub use error::PredictionError;
pub use features::{Cell, ClientRecord, FeatureVector, CANONICAL_FEATURES};
pub use predictor::{BatchPrediction, Predictor, Scorer, ScorerOutput};
pub use table::FeatureTable;

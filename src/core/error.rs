//! Error types for the generation pipeline

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the pipeline
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Insufficient candidates: found {found}, need at least {required}")]
    InsufficientCandidates { found: usize, required: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Soft, non-fatal report for a stage that hit its attempt limit.
///
/// The output that accompanies it is still usable, just sparser than asked for.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DegradedResult {
    /// Stage that produced the shortfall (e.g. "road network", "house")
    pub stage: String,
    pub requested: usize,
    pub achieved: usize,
    pub attempts: usize,
}

impl DegradedResult {
    /// Returns a report only when `achieved < requested`, logging it at warn level.
    pub fn check(stage: &str, requested: usize, achieved: usize, attempts: usize) -> Option<Self> {
        if achieved >= requested {
            return None;
        }
        log::warn!(
            "{}: placed {} of {} requested after {} attempts",
            stage, achieved, requested, attempts
        );
        Some(Self {
            stage: stage.to_string(),
            requested,
            achieved,
            attempts,
        })
    }

    /// Fraction of the request that was fulfilled.
    pub fn fulfillment(&self) -> f32 {
        if self.requested == 0 {
            return 1.0;
        }
        self.achieved as f32 / self.requested as f32
    }
}

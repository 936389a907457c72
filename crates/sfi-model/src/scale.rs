//! Stress scale factors for the parametric sweep.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScaleError {
    #[error("number of stress scales should be larger than 0")]
    NoScales,

    #[error("stress scale bounds must be finite (min {min}, max {max})")]
    NonFinite { min: f64, max: f64 },

    #[error("minimum stress scale should be smaller or equal to the maximum stress scale")]
    Inverted,

    #[error("unclear stress scale definition, only one count for different min and max")]
    SingleCountForRange,

    #[error("unclear stress scale definition, multiple counts for equal min and max")]
    MultipleCountsForPoint,
}

/// A validated `count`/`min`/`max` sweep definition. Deserialization runs
/// the same checks as [`ScaleRange::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawScaleRange")]
pub struct ScaleRange {
    count: usize,
    min: f64,
    max: f64,
}

#[derive(Deserialize)]
struct RawScaleRange {
    count: usize,
    min: f64,
    max: f64,
}

impl TryFrom<RawScaleRange> for ScaleRange {
    type Error = ScaleError;

    fn try_from(raw: RawScaleRange) -> Result<Self, Self::Error> {
        Self::new(raw.count, raw.min, raw.max)
    }
}

impl ScaleRange {
    pub fn new(count: usize, min: f64, max: f64) -> Result<Self, ScaleError> {
        if count < 1 {
            return Err(ScaleError::NoScales);
        }
        if !min.is_finite() || !max.is_finite() {
            return Err(ScaleError::NonFinite { min, max });
        }
        if max < min {
            return Err(ScaleError::Inverted);
        }
        if max > min && count == 1 {
            return Err(ScaleError::SingleCountForRange);
        }
        if max == min && count > 1 {
            return Err(ScaleError::MultipleCountsForPoint);
        }
        Ok(Self { count, min, max })
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Evenly spaced factors from `min` to `max`, or `[min]` for one count.
    pub fn factors(&self) -> Vec<f64> {
        if self.count == 1 {
            return vec![self.min];
        }
        let intervals = (self.count - 1) as f64;
        (0..self.count)
            .map(|i| self.min + i as f64 * (self.max - self.min) / intervals)
            .collect()
    }
}

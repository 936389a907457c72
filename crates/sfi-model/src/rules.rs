//! Capability interfaces for categorization and stress definition.
//!
//! Implementations are passed explicitly into [`crate::characterize`] and
//! [`crate::assign_stresses`]; a [`RuleScript`] bundles whichever of the two
//! a loaded rule source provides.

use nalgebra::Point3;
use thiserror::Error;

use crate::category::StressVector;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleError {
    /// The rule source does not define the requested function for this input.
    #[error("{0} is not defined")]
    Undefined(String),

    /// The function ran and failed.
    #[error("evaluation failed: {0}")]
    Evaluation(String),

    /// The function returned something other than six numbers.
    #[error("stress must have 6 components, got {0}")]
    StressArity(usize),

    #[error("stress component {index} is not finite ({value})")]
    NonFiniteStress { index: usize, value: f64 },
}

/// Maps an element centroid to a category key.
pub trait Classifier {
    fn classify(&self, part_name: &str, point: &Point3<f64>) -> Result<String, RuleError>;
}

/// Maps a representative point to a 6-component stress
/// `(s11, s22, s33, s12, s13, s23)`.
pub trait StressFunction {
    fn stress(&self, part_name: &str, point: &Point3<f64>) -> Result<StressVector, RuleError>;
}

/// A loaded rule source. Either capability may be missing.
pub trait RuleScript {
    fn classifier(&self) -> Option<&dyn Classifier>;
    fn stress_function(&self) -> Option<&dyn StressFunction>;
}

/// Converts a returned sequence into a stress vector.
pub fn stress_from_slice(values: &[f64]) -> Result<StressVector, RuleError> {
    if values.len() != 6 {
        return Err(RuleError::StressArity(values.len()));
    }
    finite_stress(StressVector::from_column_slice(values))
}

/// Rejects a stress with a NaN or infinite component.
pub fn finite_stress(stress: StressVector) -> Result<StressVector, RuleError> {
    match stress.iter().position(|value| !value.is_finite()) {
        Some(index) => Err(RuleError::NonFiniteStress {
            index,
            value: stress[index],
        }),
        None => Ok(stress),
    }
}

//! Rule scripts: JSON rule files and the loader that reads them.
//!
//! ```json
//! {
//!   "classify": { "kind": "bands", "axis": "z", "edges": [0.0, 5.0, 10.0] },
//!   "stress":   { "kind": "linear", "base": [0, 0, -1, 0, 0, 0],
//!                 "gradient": [[0,0,0,0,0,0], [0,0,0,0,0,0], [0,0,0.1,0,0,0]] },
//!   "parts": { "Bolt": { "stress": { "kind": "uniform", "value": [5, 5, 5, 0, 0, 0] } } }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use sfi_model::{Classifier, RuleError, RuleScript, StressFunction, StressVector, finite_stress};

use crate::error::{IoError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn of(self, p: &Point3<f64>) -> f64 {
        match self {
            Axis::X => p.x,
            Axis::Y => p.y,
            Axis::Z => p.z,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifyRule {
    /// Box cells of size `cell` anchored at `origin`; key `i_j_k`.
    Grid {
        cell: [f64; 3],
        #[serde(default)]
        origin: [f64; 3],
    },
    /// Intervals between increasing `edges` along one axis; key `bandN`.
    Bands { axis: Axis, edges: Vec<f64> },
    /// The whole instance is one category, keyed by part name.
    Part,
}

impl ClassifyRule {
    fn validate(&self) -> std::result::Result<(), String> {
        match self {
            ClassifyRule::Grid { cell, .. } => {
                if cell.iter().any(|c| !(c.is_finite() && *c > 0.0)) {
                    return Err(format!("grid cell sizes must be positive, got {cell:?}"));
                }
            }
            ClassifyRule::Bands { edges, .. } => {
                if edges.len() < 2 || edges.windows(2).any(|w| !(w[0] < w[1])) {
                    return Err("band edges must be at least 2 strictly increasing values".to_string());
                }
            }
            ClassifyRule::Part => {}
        }
        Ok(())
    }

    fn key(&self, part_name: &str, p: &Point3<f64>) -> std::result::Result<String, RuleError> {
        match self {
            ClassifyRule::Grid { cell, origin } => {
                let index = |axis: usize, v: f64| ((v - origin[axis]) / cell[axis]).floor() as i64;
                Ok(format!("{}_{}_{}", index(0, p.x), index(1, p.y), index(2, p.z)))
            }
            ClassifyRule::Bands { axis, edges } => {
                let v = axis.of(p);
                let last = edges.len() - 1;
                if v < edges[0] || v > edges[last] {
                    return Err(RuleError::Evaluation(format!(
                        "{v} lies outside the bands [{}, {}]",
                        edges[0], edges[last]
                    )));
                }
                // upper edge belongs to the last band
                let band = edges[1..last].iter().take_while(|&&edge| v >= edge).count();
                Ok(format!("band{band}"))
            }
            ClassifyRule::Part => Ok(part_name.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StressRule {
    Uniform {
        value: [f64; 6],
    },
    /// `base + x * gradient[0] + y * gradient[1] + z * gradient[2]`.
    Linear {
        base: [f64; 6],
        #[serde(default)]
        gradient: [[f64; 6]; 3],
    },
}

impl StressRule {
    fn evaluate(&self, p: &Point3<f64>) -> StressVector {
        match self {
            StressRule::Uniform { value } => StressVector::from_column_slice(value),
            StressRule::Linear { base, gradient } => {
                let mut s = StressVector::from_column_slice(base);
                for (axis, coefficient) in [p.x, p.y, p.z].into_iter().enumerate() {
                    s += StressVector::from_column_slice(&gradient[axis]) * coefficient;
                }
                s
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartRules {
    #[serde(default)]
    pub classify: Option<ClassifyRule>,
    #[serde(default)]
    pub stress: Option<StressRule>,
}

/// A parsed JSON rule file. Part entries override the top-level rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSet {
    #[serde(default)]
    pub classify: Option<ClassifyRule>,
    #[serde(default)]
    pub stress: Option<StressRule>,
    #[serde(default)]
    pub parts: BTreeMap<String, PartRules>,
}

impl RuleSet {
    pub fn from_json(raw: &str) -> std::result::Result<Self, String> {
        let rules: RuleSet = serde_json::from_str(raw).map_err(|err| err.to_string())?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|err| IoError::Rules {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::from_json(&raw).map_err(|message| IoError::Rules {
            path: path.to_path_buf(),
            message,
        })
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(rule) = &self.classify {
            rule.validate()?;
        }
        for (part, rules) in &self.parts {
            if let Some(rule) = &rules.classify {
                rule.validate().map_err(|err| format!("part {part}: {err}"))?;
            }
        }
        Ok(())
    }

    fn classify_rule(&self, part_name: &str) -> Option<&ClassifyRule> {
        self.parts
            .get(part_name)
            .and_then(|p| p.classify.as_ref())
            .or(self.classify.as_ref())
    }

    fn stress_rule(&self, part_name: &str) -> Option<&StressRule> {
        self.parts
            .get(part_name)
            .and_then(|p| p.stress.as_ref())
            .or(self.stress.as_ref())
    }
}

impl Classifier for RuleSet {
    fn classify(&self, part_name: &str, point: &Point3<f64>) -> std::result::Result<String, RuleError> {
        self.classify_rule(part_name)
            .ok_or_else(|| RuleError::Undefined(format!("classify rule for part {part_name}")))?
            .key(part_name, point)
    }
}

impl StressFunction for RuleSet {
    fn stress(&self, part_name: &str, point: &Point3<f64>) -> std::result::Result<StressVector, RuleError> {
        let rule = self
            .stress_rule(part_name)
            .ok_or_else(|| RuleError::Undefined(format!("stress rule for part {part_name}")))?;
        finite_stress(rule.evaluate(point))
    }
}

impl RuleScript for RuleSet {
    fn classifier(&self) -> Option<&dyn Classifier> {
        let defined = self.classify.is_some() || self.parts.values().any(|p| p.classify.is_some());
        defined.then_some(self as &dyn Classifier)
    }

    fn stress_function(&self) -> Option<&dyn StressFunction> {
        let defined = self.stress.is_some() || self.parts.values().any(|p| p.stress.is_some());
        defined.then_some(self as &dyn StressFunction)
    }
}

/// Produces a fresh [`RuleScript`] each time a stage needs one.
pub trait RuleLoader {
    fn load(&self) -> Result<Box<dyn RuleScript>>;

    fn describe(&self) -> String;
}

/// Loads rules from a file: `.py` files through the embedded interpreter
/// (requires the `python` feature), everything else as JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRuleLoader {
    path: PathBuf,
}

impl FileRuleLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_python(&self) -> bool {
        self.path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("py"))
    }
}

impl RuleLoader for FileRuleLoader {
    fn load(&self) -> Result<Box<dyn RuleScript>> {
        if self.is_python() {
            #[cfg(feature = "python")]
            {
                return Ok(Box::new(crate::python::PythonRules::load(&self.path)?));
            }
            #[cfg(not(feature = "python"))]
            {
                return Err(IoError::Rules {
                    path: self.path.clone(),
                    message: "Python rule scripts require the `python` feature".to_string(),
                });
            }
        }
        Ok(Box::new(RuleSet::load(&self.path)?))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

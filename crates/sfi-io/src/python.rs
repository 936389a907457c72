//! Python rule scripts via PyO3.
//!
//! A script may define `classify(part, x, y, z)` returning a category key
//! (any value, converted with `str()`) and `stress(part, x, y, z)` returning
//! six numbers. Missing functions leave the capability undefined.

use std::fs;
use std::path::Path;

use nalgebra::Point3;
use pyo3::prelude::*;
use pyo3::types::PyModule;
use sfi_model::{Classifier, RuleError, RuleScript, StressFunction, StressVector};
use sfi_model::rules::stress_from_slice;

use crate::error::{IoError, Result};

const CLASSIFY: &str = "classify";
const STRESS: &str = "stress";

pub struct PythonRules {
    module: Py<PyModule>,
    has_classify: bool,
    has_stress: bool,
}

impl PythonRules {
    /// Executes the script as a fresh module.
    ///
    /// # Errors
    /// Returns error if the file cannot be read, the module raises on import,
    /// or `classify`/`stress` cannot take `(part, x, y, z)`
    pub fn load(path: &Path) -> Result<Self> {
        let code = fs::read_to_string(path).map_err(|err| IoError::Rules {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        let file_name = path.display().to_string();

        Python::with_gil(|py| {
            let module = PyModule::from_code(py, &code, &file_name, "sfi_rules")?;
            let has_classify = is_callable(module, CLASSIFY);
            let has_stress = is_callable(module, STRESS);

            for (name, defined) in [(CLASSIFY, has_classify), (STRESS, has_stress)] {
                if defined && !takes_point_arguments(py, module, name)? {
                    return Err(IoError::Rules {
                        path: path.to_path_buf(),
                        message: format!("{name} must accept (part, x, y, z)"),
                    });
                }
            }

            Ok(Self {
                module: module.into(),
                has_classify,
                has_stress,
            })
        })
    }

    fn call(&self, name: &str, part_name: &str, point: &Point3<f64>) -> std::result::Result<PyObject, RuleError> {
        Python::with_gil(|py| {
            let module = self.module.as_ref(py);
            let function = module
                .getattr(name)
                .map_err(|_| RuleError::Undefined(name.to_string()))?;
            function
                .call1((part_name, point.x, point.y, point.z))
                .map(|value| value.into_py(py))
                .map_err(|err| RuleError::Evaluation(err.to_string()))
        })
    }
}

fn is_callable(module: &PyModule, name: &str) -> bool {
    module
        .getattr(name)
        .map(|attr| attr.is_callable())
        .unwrap_or(false)
}

// Functions whose signature cannot be inspected are accepted.
fn takes_point_arguments(py: Python<'_>, module: &PyModule, name: &str) -> PyResult<bool> {
    let function = module.getattr(name)?;
    let Ok(signature) = py.import("inspect")?.call_method1("signature", (function,)) else {
        return Ok(true);
    };
    Ok(signature.call_method1("bind", ("", 0.0, 0.0, 0.0)).is_ok())
}

impl Classifier for PythonRules {
    fn classify(&self, part_name: &str, point: &Point3<f64>) -> std::result::Result<String, RuleError> {
        let value = self.call(CLASSIFY, part_name, point)?;
        Python::with_gil(|py| {
            value
                .as_ref(py)
                .str()
                .and_then(|s| s.to_str().map(str::to_owned))
                .map_err(|err| RuleError::Evaluation(err.to_string()))
        })
    }
}

impl StressFunction for PythonRules {
    fn stress(&self, part_name: &str, point: &Point3<f64>) -> std::result::Result<StressVector, RuleError> {
        let value = self.call(STRESS, part_name, point)?;
        let components: Vec<f64> = Python::with_gil(|py| value.extract(py))
            .map_err(|err| RuleError::Evaluation(err.to_string()))?;
        stress_from_slice(&components)
    }
}

impl RuleScript for PythonRules {
    fn classifier(&self) -> Option<&dyn Classifier> {
        self.has_classify.then_some(self as &dyn Classifier)
    }

    fn stress_function(&self) -> Option<&dyn StressFunction> {
        self.has_stress.then_some(self as &dyn StressFunction)
    }
}

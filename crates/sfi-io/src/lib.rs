//! Host-side plumbing for stress input generation.
//!
//! This crate provides:
//! - **Assembly reader** turning `*Part`/`*Instance` cards into placed instance meshes
//! - **Rule scripts** (JSON by default, Python with the `python` feature) supplying
//!   the classify and stress capabilities
//! - **Run configuration** with the pre-flight checks
//! - **Pipeline** driving characterization, injection and per-scale deck output
//! - **Manifest** recording the generated variants for job submission

pub mod assembly;
pub mod config;
mod error;
pub mod output;
pub mod pipeline;
pub mod rules;

#[cfg(feature = "python")]
pub mod python;

pub use assembly::{AssemblyModel, InstanceDef, PartGeometry, Placement, Rotation};
pub use config::{ConfigError, Preflight, RunConfig, preflight};
pub use error::{AssemblyError, IoError, Result};
pub use output::{
    JobManifest, StressVariant, load_manifest, save_manifest, variant_file_name, variant_job_name,
    write_variant,
};
pub use pipeline::{RunOutcome, ScaledDeck, build_variants, run};
pub use rules::{Axis, ClassifyRule, FileRuleLoader, PartRules, RuleLoader, RuleSet, StressRule};

#[cfg(feature = "python")]
pub use python::PythonRules;

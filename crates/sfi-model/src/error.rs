use thiserror::Error;

use crate::rules::RuleError;

/// Stage-fatal failures while building the category model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// No instance in the assembly has any element.
    #[error("no mesh present")]
    NoMesh,

    /// A defined classifier failed; a partially categorized instance would be
    /// inconsistent, so the whole characterization is abandoned.
    #[error("classification failed for element {label} of instance {instance}: {source}")]
    Classification {
        instance: String,
        label: i32,
        #[source]
        source: RuleError,
    },
}

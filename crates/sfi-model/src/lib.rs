//! Domain model for stress-input generation.
//!
//! Element centroids are sampled per part instance, grouped into categories
//! by a [`Classifier`], and each category receives one stress vector from a
//! [`StressFunction`]. The resulting [`MeshData`] feeds the deck injectors
//! in `sfi-inp`.

pub mod category;
pub mod characterize;
mod error;
pub mod mesh_data;
pub mod rules;
pub mod sample;
pub mod scale;

pub use category::{Category, StressVector, set_name_for};
pub use characterize::{StressReport, assign_stresses, characterize};
pub use error::ModelError;
pub use mesh_data::{CategorySummary, MeshData, MeshSummary, PartMeshData};
pub use rules::{Classifier, RuleError, RuleScript, StressFunction, finite_stress};
pub use sample::{ElementNodes, ElementSample, InstanceMesh, centroid};
pub use scale::{ScaleError, ScaleRange};

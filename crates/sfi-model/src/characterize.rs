//! Mesh characterization and stress assignment stages.

use tracing::{debug, info, warn};

use crate::category::StressVector;
use crate::error::ModelError;
use crate::mesh_data::{MeshData, PartMeshData};
use crate::rules::{Classifier, RuleError, StressFunction, finite_stress};
use crate::sample::{ElementSample, InstanceMesh};

/// Groups the elements of every instance into categories.
///
/// Without a classifier each element becomes its own category, keyed by its
/// label. A classifier error aborts the whole stage.
pub fn characterize(
    instances: &[InstanceMesh],
    classifier: Option<&dyn Classifier>,
) -> Result<MeshData, ModelError> {
    info!(
        instances = instances.len(),
        classified = classifier.is_some(),
        "characterizing mesh"
    );

    let mut slots = Vec::with_capacity(instances.len());
    for instance in instances {
        if instance.elements.is_empty() {
            debug!(instance = %instance.name, "instance has no elements");
            slots.push(None);
            continue;
        }

        let mut part = PartMeshData::new();
        for element in &instance.elements {
            let sample = ElementSample::from_element(instance, element);
            let key = match classifier {
                Some(classifier) => classifier
                    .classify(&sample.part_name, &sample.centroid)
                    .map_err(|source| ModelError::Classification {
                        instance: instance.name.clone(),
                        label: element.label,
                        source,
                    })?,
                None => sample.label.to_string(),
            };
            part.insert(key, sample);
        }
        debug!(instance = %instance.name, categories = part.len(), "instance characterized");
        slots.push(Some(part));
    }

    let mesh = MeshData::from_slots(slots);
    if !mesh.has_mesh() {
        return Err(ModelError::NoMesh);
    }
    Ok(mesh)
}

/// Outcome of [`assign_stresses`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StressReport {
    pub assigned: usize,
    /// Qualified set names of categories that fell back to zero stress.
    pub defaulted: Vec<String>,
}

/// Evaluates the stress function once per category at its first member.
/// Failures, including a missing function or a non-finite result, zero that
/// category and continue.
pub fn assign_stresses(mesh: &mut MeshData, stress: Option<&dyn StressFunction>) -> StressReport {
    info!(categories = mesh.category_count(), "defining stresses");
    let mut report = StressReport::default();

    for category in mesh.categories_mut() {
        let representative = category.representative();
        let result = match stress {
            Some(function) => function
                .stress(&representative.part_name, &representative.centroid)
                .and_then(finite_stress),
            None => Err(RuleError::Undefined("stress".to_string())),
        };
        match result {
            Ok(value) => {
                category.define_stress(value);
                report.assigned += 1;
            }
            Err(err) => {
                warn!(
                    category = %category.qualified_set_name(),
                    key = category.key(),
                    error = %err,
                    "stress evaluation failed, defaulting to zero"
                );
                report.defaulted.push(category.qualified_set_name());
                category.define_stress(StressVector::zeros());
            }
        }
    }

    report
}

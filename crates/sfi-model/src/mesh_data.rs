//! Per-instance category maps and the assembly-wide slot list.

use std::collections::HashMap;

use serde::Serialize;
use sfi_inp::{ElementSetDef, PartSets, StressRecord};

use crate::category::{Category, StressVector};
use crate::sample::ElementSample;

/// Categories of one part instance, keyed by category key and iterated in
/// first-discovery order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PartMeshData {
    categories: Vec<Category>,
    index: HashMap<String, usize>,
}

impl PartMeshData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files `sample` under `key`, opening the category on first use.
    pub fn insert(&mut self, key: String, sample: ElementSample) {
        let existing = self.index.get(&key).copied();
        match existing {
            Some(i) => {
                // categories are per instance, so a mismatch means the caller
                // mixed instances in one map
                if let Err(sample) = self.categories[i].push(sample) {
                    tracing::warn!(
                        key = %key,
                        label = sample.label,
                        instance = %sample.instance,
                        "element does not belong to this instance, ignored"
                    );
                }
            }
            None => {
                self.index.insert(key.clone(), self.categories.len());
                self.categories.push(Category::new(key, sample));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Category> {
        self.index.get(key).map(|&i| &self.categories[i])
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn categories_mut(&mut self) -> impl Iterator<Item = &mut Category> {
        self.categories.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn part_name(&self) -> Option<&str> {
        self.categories.first().map(Category::part_name)
    }

    pub fn instance(&self) -> Option<&str> {
        self.categories.first().map(Category::instance)
    }

    pub fn to_part_sets(&self) -> Option<PartSets> {
        let part_name = self.part_name()?.to_string();
        let sets = self
            .categories
            .iter()
            .map(|c| ElementSetDef {
                name: c.set_name(),
                labels: c.labels(),
            })
            .collect();
        Some(PartSets { part_name, sets })
    }
}

/// One slot per part instance, parallel to the host enumeration. `None`
/// marks an instance without elements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    slots: Vec<Option<PartMeshData>>,
}

impl MeshData {
    pub fn from_slots(slots: Vec<Option<PartMeshData>>) -> Self {
        Self { slots }
    }

    pub fn slots(&self) -> &[Option<PartMeshData>] {
        &self.slots
    }

    pub fn has_mesh(&self) -> bool {
        self.slots.iter().flatten().any(|p| !p.is_empty())
    }

    /// All categories, instance by instance, in discovery order.
    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.slots.iter().flatten().flat_map(|p| p.categories().iter())
    }

    pub fn categories_mut(&mut self) -> impl Iterator<Item = &mut Category> {
        self.slots.iter_mut().flatten().flat_map(|p| p.categories_mut())
    }

    pub fn category_count(&self) -> usize {
        self.categories().count()
    }

    pub fn element_count(&self) -> usize {
        self.categories().map(|c| c.members().len()).sum()
    }

    /// Element sets to inject, one entry per slot.
    pub fn part_sets(&self) -> Vec<Option<PartSets>> {
        self.slots
            .iter()
            .map(|slot| slot.as_ref().and_then(PartMeshData::to_part_sets))
            .collect()
    }

    /// Stress block rows for `scale`, in the same order as [`Self::categories`].
    /// Categories without a defined stress are written as zero.
    pub fn stress_records(&self, scale: f64) -> Vec<StressRecord> {
        self.categories()
            .map(|c| {
                let scaled = c.stress().map(|s| s * scale).unwrap_or_else(StressVector::zeros);
                let mut components = [0.0; 6];
                components.copy_from_slice(scaled.as_slice());
                StressRecord {
                    target: c.qualified_set_name(),
                    components,
                }
            })
            .collect()
    }

    pub fn summary(&self) -> MeshSummary {
        let categories = self
            .categories()
            .map(|c| CategorySummary {
                instance: c.instance().to_string(),
                part_name: c.part_name().to_string(),
                key: c.key().to_string(),
                set_name: c.set_name(),
                elements: c.members().len(),
                stress: c.stress().map(|s| {
                    let mut out = [0.0; 6];
                    out.copy_from_slice(s.as_slice());
                    out
                }),
            })
            .collect();
        MeshSummary {
            instances: self.slots.len(),
            empty_instances: self.slots.iter().filter(|s| s.is_none()).count(),
            elements: self.element_count(),
            categories,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshSummary {
    pub instances: usize,
    pub empty_instances: usize,
    pub elements: usize,
    pub categories: Vec<CategorySummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub instance: String,
    pub part_name: String,
    pub key: String,
    pub set_name: String,
    pub elements: usize,
    pub stress: Option<[f64; 6]>,
}

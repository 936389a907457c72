//! Categories: groups of elements of one part instance sharing a key.

use nalgebra::Vector6;

use crate::sample::ElementSample;

pub type StressVector = Vector6<f64>;

const SET_PREFIX: &str = "SFI_CAT_";

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    key: String,
    part_name: String,
    instance: String,
    members: Vec<ElementSample>,
    stress: Option<StressVector>,
}

impl Category {
    /// Opens a category with its first-discovered member.
    pub fn new(key: impl Into<String>, first: ElementSample) -> Self {
        Self {
            key: key.into(),
            part_name: first.part_name.clone(),
            instance: first.instance.clone(),
            members: vec![first],
            stress: None,
        }
    }

    /// Appends a member. Members of other instances are rejected and
    /// returned unchanged.
    pub fn push(&mut self, sample: ElementSample) -> Result<(), ElementSample> {
        if sample.instance != self.instance || sample.part_name != self.part_name {
            return Err(sample);
        }
        self.members.push(sample);
        Ok(())
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn part_name(&self) -> &str {
        &self.part_name
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    pub fn members(&self) -> &[ElementSample] {
        &self.members
    }

    /// The member whose centroid stands in for the whole category.
    pub fn representative(&self) -> &ElementSample {
        &self.members[0]
    }

    pub fn labels(&self) -> Vec<i32> {
        self.members.iter().map(|m| m.label).collect()
    }

    pub fn stress(&self) -> Option<&StressVector> {
        self.stress.as_ref()
    }

    pub fn define_stress(&mut self, stress: StressVector) {
        self.stress = Some(stress);
    }

    /// Element-set name used for this category in the deck.
    pub fn set_name(&self) -> String {
        set_name_for(&self.key)
    }

    /// `<instance>.<set name>` reference used by instance-level keywords.
    /// Instance names that are not plain deck labels are quoted.
    pub fn qualified_set_name(&self) -> String {
        format!("{}.{}", deck_label(&self.instance), self.set_name())
    }
}

fn deck_label(name: &str) -> String {
    let plain = name.starts_with(|c: char| c.is_ascii_alphabetic())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if plain {
        name.to_string()
    } else {
        format!("\"{name}\"")
    }
}

/// Injective mapping from category key to a deck-safe set name. ASCII
/// alphanumerics are kept; every other byte, `_` included, becomes `_XX`.
pub fn set_name_for(key: &str) -> String {
    let mut name = String::with_capacity(SET_PREFIX.len() + key.len());
    name.push_str(SET_PREFIX);
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() {
            name.push(byte as char);
        } else {
            name.push_str(&format!("_{byte:02X}"));
        }
    }
    name
}

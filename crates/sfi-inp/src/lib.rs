//! Abaqus-style `.inp` deck handling for stress-input generation.
//!
//! This crate provides:
//! - a keyword **card parser** used to read parts, nodes, elements and instances
//! - a line-preserving **deck buffer** with a splice builder that never shifts
//!   original line indices while insertions are pending
//! - the **element-set injector**, a two-state scan that pairs part
//!   definitions with pending category sets
//! - the **field locator** and **stress-field injector** that splice an
//!   `*Initial Conditions, type=STRESS` block into a copy of the deck

pub mod buffer;
pub mod cards;
pub mod elset;
mod error;
pub mod field;
pub mod markers;

pub use buffer::{DeckBuffer, Splicer};
pub use cards::{Card, Deck, Parameter, ParseError};
pub use elset::{ElementSetDef, ElsetInjection, LABELS_PER_LINE, PartSets, inject_element_sets};
pub use error::DeckError;
pub use field::{FieldAnchor, StressRecord, format_value, inject_stress_field, locate_field_anchor};

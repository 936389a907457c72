//! Locating the predefined-field slot and splicing the initial stress block.

use tracing::debug;

use crate::buffer::DeckBuffer;
use crate::error::DeckError;
use crate::markers;

/// Where the stress block goes in a deck that already carries its element sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldAnchor {
    /// Line of the `** BOUNDARY CONDITIONS` marker.
    pub boundary_line: usize,
    /// Line of the `** -` terminator; the block is inserted in front of it.
    pub line: usize,
    /// Whether a `** PREDEFINED FIELDS` header already precedes the terminator.
    pub has_predefined_header: bool,
}

/// One `<instance>.<set>,s1,...,s6,` data line of the stress block.
#[derive(Debug, Clone, PartialEq)]
pub struct StressRecord {
    pub target: String,
    pub components: [f64; 6],
}

impl StressRecord {
    pub fn to_line(&self) -> String {
        let mut line = format!("{},", self.target);
        for value in self.components {
            line.push_str(&format_value(value));
            line.push(',');
        }
        line
    }
}

/// Shortest round-trip rendering with a fractional part, e.g. `5.0`, `2.5`.
pub fn format_value(value: f64) -> String {
    format!("{value:?}")
}

/// Scans from `start` for the boundary-conditions section, then for the
/// terminator that closes it.
pub fn locate_field_anchor(deck: &DeckBuffer, start: usize) -> Result<FieldAnchor, DeckError> {
    let boundary_line = (start..deck.len())
        .find(|&i| deck.line(i) == Some(markers::BOUNDARY_CONDITIONS))
        .ok_or(DeckError::MissingBoundaryConditions { from: start })?;

    let mut has_predefined_header = false;
    for i in boundary_line + 1..deck.len() {
        let Some(line) = deck.line(i) else { break };
        if line == markers::PREDEFINED_FIELDS {
            has_predefined_header = true;
            continue;
        }
        if markers::is_section_terminator(line) {
            debug!(line = i + 1, has_predefined_header, "stress field injection point");
            return Ok(FieldAnchor {
                boundary_line,
                line: i,
                has_predefined_header,
            });
        }
    }

    Err(DeckError::MissingTerminator {
        boundary: boundary_line + 1,
    })
}

/// Returns a copy of `base` with the stress block spliced in at `anchor`.
/// `base` itself is never modified, so one base deck serves every scale.
pub fn inject_stress_field(
    base: &DeckBuffer,
    anchor: &FieldAnchor,
    records: &[StressRecord],
) -> Result<DeckBuffer, DeckError> {
    let mut block = Vec::with_capacity(records.len() + 4);
    if !anchor.has_predefined_header {
        block.push(markers::BLANK_COMMENT.to_string());
        block.push(markers::PREDEFINED_FIELDS.to_string());
        block.push(markers::BLANK_COMMENT.to_string());
    }
    block.push(markers::INITIAL_STRESS.to_string());
    block.extend(records.iter().map(StressRecord::to_line));

    let mut splicer = base.splicer();
    splicer.insert_before(anchor.line, block)?;
    Ok(splicer.finish())
}

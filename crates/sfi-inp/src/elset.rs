//! Element-set injection into part definitions.
//!
//! The scan alternates between two states. While seeking a part it skips
//! lines until a `*Part, name=` header, then tries to pair the part with the
//! first pending instance slot of the same part name. Once paired, it skips
//! the node marker, continuation lines, element sections and element data
//! until the next keyword line, and queues the `*Elset` blocks in front of it.
//!
//! The scan stops as soon as no slot is pending and no injection is in
//! progress. Slots without sets are dropped from the worklist the first time
//! any part header is examined, so they never consume a part.

use tracing::debug;

use crate::buffer::DeckBuffer;
use crate::error::DeckError;
use crate::markers;

/// Element labels written per `*Elset` data line.
pub const LABELS_PER_LINE: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSetDef {
    pub name: String,
    pub labels: Vec<i32>,
}

impl ElementSetDef {
    /// Header plus comma-terminated label lines, wrapped at
    /// [`LABELS_PER_LINE`] labels.
    pub fn to_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(1 + self.labels.len().div_ceil(LABELS_PER_LINE));
        lines.push(markers::elset_header(&self.name));
        for chunk in self.labels.chunks(LABELS_PER_LINE) {
            let row = chunk
                .iter()
                .map(|label| format!("{label},"))
                .collect::<Vec<_>>()
                .join(" ");
            lines.push(row);
        }
        lines
    }
}

/// The sets to inject for one part instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartSets {
    pub part_name: String,
    pub sets: Vec<ElementSetDef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElsetInjection {
    /// Deck with every `*Elset` block materialized.
    pub deck: DeckBuffer,
    /// Line in `deck` right after the last line the scan consumed.
    pub resume_at: usize,
    /// Parts that received sets, in injection order.
    pub injected_parts: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    SeekingPart,
    InjectingSets(usize),
}

/// Injects the element sets of every present slot into its part definition.
///
/// `slots` is parallel to the instance enumeration; `None` marks an instance
/// without elements.
pub fn inject_element_sets(
    deck: &DeckBuffer,
    slots: &[Option<PartSets>],
) -> Result<ElsetInjection, DeckError> {
    let mut pending: Vec<usize> = (0..slots.len()).collect();
    let mut splicer = deck.splicer();
    let mut injected_parts = Vec::new();
    let mut state = ScanState::SeekingPart;
    let mut cursor = 0usize;

    while !pending.is_empty() || state != ScanState::SeekingPart {
        let Some(line) = deck.line(cursor) else {
            return Err(match state {
                ScanState::InjectingSets(slot) => DeckError::UnterminatedPart {
                    part: part_label(slots, slot),
                },
                ScanState::SeekingPart => DeckError::UnmatchedParts {
                    parts: pending.iter().map(|&slot| part_label(slots, slot)).collect(),
                },
            });
        };
        cursor += 1;

        match state {
            ScanState::SeekingPart => {
                let Some(part) = markers::part_name(line) else {
                    continue;
                };
                debug!(part, line = cursor, "found part definition");
                match take_matching(&mut pending, slots, part) {
                    Some(slot) => {
                        state = ScanState::InjectingSets(slot);
                        // the node marker follows the part header
                        cursor += 1;
                    }
                    None => debug!(part, "no pending sets for part, skipping"),
                }
            }
            ScanState::InjectingSets(slot) => {
                if !markers::is_keyword_line(line)
                    || markers::is_continuation(line)
                    || markers::is_element_section(line)
                {
                    continue;
                }
                let at = cursor - 1;
                if let Some(part) = &slots[slot] {
                    debug!(part = %part.part_name, line = at + 1, sets = part.sets.len(), "injecting element sets");
                    for set in &part.sets {
                        splicer.insert_before(at, set.to_lines())?;
                    }
                    injected_parts.push(part.part_name.clone());
                }
                state = ScanState::SeekingPart;
            }
        }
    }

    let resume_at = splicer.shifted_index(cursor);
    Ok(ElsetInjection {
        deck: splicer.finish(),
        resume_at,
        injected_parts,
    })
}

/// Removes and returns the first pending slot whose part is `part`. Slots
/// with nothing to inject are dropped along the way.
fn take_matching(pending: &mut Vec<usize>, slots: &[Option<PartSets>], part: &str) -> Option<usize> {
    let mut i = 0;
    while i < pending.len() {
        let slot = pending[i];
        match slots[slot].as_ref().filter(|p| !p.sets.is_empty()) {
            None => {
                pending.remove(i);
            }
            Some(p) if p.part_name == part => {
                pending.remove(i);
                return Some(slot);
            }
            Some(_) => i += 1,
        }
    }
    None
}

fn part_label(slots: &[Option<PartSets>], slot: usize) -> String {
    slots[slot]
        .as_ref()
        .map(|p| p.part_name.clone())
        .unwrap_or_else(|| format!("<instance #{slot}>"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLATE_DECK: &str = "\
*Heading
*Part, name=Plate
*Node
      1,           0.,           0.,           0.
      2,           1.,           0.,           0.
*Element, type=T3D2
1, 1, 2
2, 1, 2
*Nset, nset=All
 1, 2
*End Part
**
*Assembly, name=Assembly
*Instance, name=Plate-1, part=Plate
*End Instance
*End Assembly
** BOUNDARY CONDITIONS
** -----";

    fn sets(part: &str, defs: &[(&str, &[i32])]) -> Option<PartSets> {
        Some(PartSets {
            part_name: part.to_string(),
            sets: defs
                .iter()
                .map(|(name, labels)| ElementSetDef {
                    name: name.to_string(),
                    labels: labels.to_vec(),
                })
                .collect(),
        })
    }

    #[test]
    fn wraps_labels_at_eight_per_line() {
        let set = ElementSetDef {
            name: "Cat".to_string(),
            labels: (1..=17).collect(),
        };
        let lines = set.to_lines();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "*Elset, elset=Cat");
        assert_eq!(lines[1], "1, 2, 3, 4, 5, 6, 7, 8,");
        assert_eq!(lines[2], "9, 10, 11, 12, 13, 14, 15, 16,");
        assert_eq!(lines[3], "17,");
    }

    #[test]
    fn injects_before_first_keyword_after_elements() {
        let deck = DeckBuffer::from_text(PLATE_DECK);
        let slots = vec![sets("Plate", &[("A", &[1]), ("B", &[2])])];

        let out = inject_element_sets(&deck, &slots).expect("injection succeeds");
        let lines = out.deck.lines();
        assert_eq!(lines[8], "*Elset, elset=A");
        assert_eq!(lines[9], "1,");
        assert_eq!(lines[10], "*Elset, elset=B");
        assert_eq!(lines[11], "2,");
        assert_eq!(lines[12], "*Nset, nset=All");
        assert_eq!(out.deck.len(), deck.len() + 4);
        assert_eq!(out.injected_parts, vec!["Plate".to_string()]);
        // scan consumed the *Nset line that triggered injection
        assert_eq!(lines[out.resume_at], " 1, 2");
    }

    #[test]
    fn empty_instances_never_consume_a_part() {
        let deck = DeckBuffer::from_text(PLATE_DECK);
        let slots = vec![None, sets("Plate", &[]), sets("Plate", &[("A", &[1, 2])])];

        let out = inject_element_sets(&deck, &slots).expect("injection succeeds");
        assert_eq!(out.deck.len(), deck.len() + 2);
        assert_eq!(out.injected_parts, vec!["Plate".to_string()]);
    }

    #[test]
    fn all_empty_slots_inject_nothing() {
        let deck = DeckBuffer::from_text(PLATE_DECK);
        let out = inject_element_sets(&deck, &[None, None]).expect("injection succeeds");
        assert_eq!(out.deck, deck);
        assert!(out.injected_parts.is_empty());
        // stops at the first part header once the worklist drains
        assert_eq!(out.resume_at, 2);
    }

    #[test]
    fn skips_parts_without_pending_sets() {
        let src = "\
*Part, name=Bolt
*Node
      1,  0., 0., 0.
*Element, type=T3D2
1, 1, 1
*End Part
*Part, name=Plate
*Node
      1,  0., 0., 0.
*Element, type=T3D2
7, 1, 1
*End Part";
        let deck = DeckBuffer::from_text(src);
        let slots = vec![sets("Plate", &[("P", &[7])])];

        let out = inject_element_sets(&deck, &slots).expect("injection succeeds");
        let lines = out.deck.lines();
        assert_eq!(lines[5], "*End Part", "Bolt is untouched");
        assert_eq!(lines[11], "*Elset, elset=P");
        assert_eq!(lines[12], "7,");
        assert_eq!(lines[13], "*End Part");
    }

    #[test]
    fn matches_quoted_part_names() {
        let src = "\
*Part, name=\"Plate A\"
*Node
      1,  0., 0., 0.
*Element, type=T3D2
4, 1, 1
*End Part";
        let deck = DeckBuffer::from_text(src);
        let slots = vec![sets("Plate A", &[("Q", &[4])])];

        let out = inject_element_sets(&deck, &slots).expect("quoted name matches");
        assert_eq!(out.injected_parts, vec!["Plate A".to_string()]);
        assert_eq!(out.deck.lines()[5], "*Elset, elset=Q");
        assert_eq!(out.deck.lines()[7], "*End Part");
    }

    #[test]
    fn reports_parts_missing_from_deck() {
        let deck = DeckBuffer::from_text(PLATE_DECK);
        let slots = vec![sets("Plate", &[("A", &[1])]), sets("Bracket", &[("B", &[3])])];

        let err = inject_element_sets(&deck, &slots).expect_err("Bracket is never defined");
        match err {
            DeckError::UnmatchedParts { parts } => assert_eq!(parts, vec!["Bracket".to_string()]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn reports_part_running_off_the_end() {
        let deck = DeckBuffer::from_text("*Part, name=Plate\n*Node\n      1, 0., 0., 0.\n1, 1, 1");
        let slots = vec![sets("Plate", &[("A", &[1])])];

        let err = inject_element_sets(&deck, &slots).expect_err("no closing marker");
        assert!(matches!(err, DeckError::UnterminatedPart { part } if part == "Plate"));
    }
}

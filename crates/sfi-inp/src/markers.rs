//! The handful of deck markers the injectors recognize. Everything else is
//! opaque text.

use crate::cards::unquote;

pub const PART_PREFIX: &str = "*Part, name=";
pub const ELEMENT_SECTION_PREFIX: &str = "*Element, type=";
pub const BOUNDARY_CONDITIONS: &str = "** BOUNDARY CONDITIONS";
pub const PREDEFINED_FIELDS: &str = "** PREDEFINED FIELDS";
pub const SECTION_TERMINATOR_PREFIX: &str = "** -";
pub const BLANK_COMMENT: &str = "** ";
pub const ELSET_PREFIX: &str = "*Elset, elset=";
pub const INITIAL_STRESS: &str = "*Initial Conditions, type=STRESS";

/// Part name of a `*Part, name=` header line, matched without regard to
/// case and unquoted the way the card parser reads it.
pub fn part_name(line: &str) -> Option<&str> {
    let prefix = line.get(..PART_PREFIX.len())?;
    if !prefix.eq_ignore_ascii_case(PART_PREFIX) {
        return None;
    }
    Some(unquote(line[PART_PREFIX.len()..].trim()))
}

pub fn is_keyword_line(line: &str) -> bool {
    line.starts_with('*')
}

pub fn is_continuation(line: &str) -> bool {
    line.starts_with(' ')
}

pub fn is_element_section(line: &str) -> bool {
    line.starts_with(ELEMENT_SECTION_PREFIX)
}

pub fn is_section_terminator(line: &str) -> bool {
    line.starts_with(SECTION_TERMINATOR_PREFIX)
}

pub fn elset_header(set_name: &str) -> String {
    format!("{ELSET_PREFIX}{set_name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_part_name() {
        assert_eq!(part_name("*Part, name=Plate-A"), Some("Plate-A"));
        assert_eq!(part_name("*Instance, name=Plate-A-1, part=Plate-A"), None);
        assert_eq!(part_name("*PART, NAME=Plate"), Some("Plate"));
        assert_eq!(part_name("*Part, name=\"Plate A\""), Some("Plate A"));
        assert_eq!(part_name("*Part"), None);
    }

    #[test]
    fn classifies_scan_lines() {
        assert!(is_continuation("      1,  0., 0., 0."));
        assert!(is_element_section("*Element, type=C3D8R"));
        assert!(is_keyword_line("*Nset, nset=Set-1"));
        assert!(!is_keyword_line("1, 1, 2, 3, 4"));
        assert!(is_section_terminator("** ----------------------------------"));
        assert!(!is_section_terminator("** PREDEFINED FIELDS"));
    }
}

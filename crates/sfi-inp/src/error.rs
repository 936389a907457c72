use std::path::PathBuf;

use thiserror::Error;

/// Failures while reading, scanning or splicing a deck.
#[derive(Debug, Error)]
pub enum DeckError {
    #[error("failed to read deck {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("splice position {at} is outside the deck ({len} lines)")]
    SpliceOutOfRange { at: usize, len: usize },

    /// The deck ended while categories were still waiting for their part.
    #[error("malformed deck: no part definition found for {}", parts.join(", "))]
    UnmatchedParts { parts: Vec<String> },

    /// The deck ended inside a part before a section marker closed it.
    #[error("malformed deck: part {part} is not followed by a section marker")]
    UnterminatedPart { part: String },

    #[error("malformed deck: no '** BOUNDARY CONDITIONS' marker after line {from}")]
    MissingBoundaryConditions { from: usize },

    #[error("malformed deck: boundary conditions at line {boundary} are not closed by a '** -' marker")]
    MissingTerminator { boundary: usize },
}

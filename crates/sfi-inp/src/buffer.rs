//! Line buffer for a deck and the splice builder used to insert into it.
//!
//! A [`Splicer`] records insertions against the *original* line indices of a
//! [`DeckBuffer`] and only materializes them in [`Splicer::finish`]. Scans can
//! therefore keep walking the unmodified buffer while queuing insertions.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use crate::error::DeckError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeckBuffer {
    lines: Vec<String>,
}

impl DeckBuffer {
    /// Builds a buffer from deck text. Leading and trailing whitespace of the
    /// whole text is dropped so that a trailing newline does not become an
    /// empty last line.
    pub fn from_text(raw: &str) -> Self {
        Self {
            lines: raw.trim().lines().map(str::to_string).collect(),
        }
    }

    pub fn from_lines(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn read_file(path: impl AsRef<Path>) -> Result<Self, DeckError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| DeckError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_text(&raw))
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Serializes the buffer with one `\n` after every line.
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity(self.lines.iter().map(|l| l.len() + 1).sum());
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    pub fn write_file(&self, path: impl AsRef<Path>) -> io::Result<()> {
        fs::write(path, self.to_text())
    }

    pub fn splicer(&self) -> Splicer<'_> {
        Splicer {
            base: self,
            inserts: BTreeMap::new(),
        }
    }
}

/// Pending insertions against a borrowed [`DeckBuffer`].
#[derive(Debug, Clone)]
pub struct Splicer<'a> {
    base: &'a DeckBuffer,
    inserts: BTreeMap<usize, Vec<String>>,
}

impl Splicer<'_> {
    /// Queues `lines` in front of original line `at`. `at == len` appends.
    /// Repeated insertions at the same position keep their call order.
    pub fn insert_before<I, S>(&mut self, at: usize, lines: I) -> Result<(), DeckError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if at > self.base.len() {
            return Err(DeckError::SpliceOutOfRange {
                at,
                len: self.base.len(),
            });
        }
        self.inserts
            .entry(at)
            .or_default()
            .extend(lines.into_iter().map(Into::into));
        Ok(())
    }

    /// Index that original line `original` will have once the splice is
    /// materialized.
    pub fn shifted_index(&self, original: usize) -> usize {
        original
            + self
                .inserts
                .range(..=original)
                .map(|(_, block)| block.len())
                .sum::<usize>()
    }

    pub fn inserted_len(&self) -> usize {
        self.inserts.values().map(Vec::len).sum()
    }

    pub fn finish(self) -> DeckBuffer {
        let mut lines = Vec::with_capacity(self.base.len() + self.inserted_len());
        let mut inserts = self.inserts.into_iter().peekable();
        for (index, line) in self.base.lines.iter().enumerate() {
            while let Some((_, block)) = inserts.next_if(|(at, _)| *at == index) {
                lines.extend(block);
            }
            lines.push(line.clone());
        }
        for (_, block) in inserts {
            lines.extend(block);
        }
        DeckBuffer { lines }
    }
}

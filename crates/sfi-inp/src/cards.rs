//! Keyword card view of a deck.
//!
//! Groups each `*KEYWORD, key=value, ...` header with the data lines that
//! follow it. Comments and blank lines are dropped, so this view is only
//! used for reading model data; splicing works on [`crate::DeckBuffer`].

use std::fmt::{Display, Formatter};

use crate::buffer::DeckBuffer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    pub cards: Vec<Card>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub keyword: String,
    pub parameters: Vec<Parameter>,
    pub data_lines: Vec<String>,
    pub line_start: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub key: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ParseError {}

impl Card {
    /// Value of a header parameter, looked up case-insensitively.
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|p| p.key.eq_ignore_ascii_case(key))
            .and_then(|p| p.value.as_deref())
    }

    /// Keyword with whitespace and underscores removed, e.g. `ENDPART`.
    pub fn normalized_keyword(&self) -> String {
        self.keyword
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .collect::<String>()
            .to_ascii_uppercase()
    }
}

impl Deck {
    pub fn from_buffer(buffer: &DeckBuffer) -> Result<Self, ParseError> {
        Self::parse_lines(buffer.lines().iter().map(String::as_str))
    }

    pub fn parse_str(raw: &str) -> Result<Self, ParseError> {
        Self::parse_lines(raw.lines())
    }

    fn parse_lines<'a>(lines: impl Iterator<Item = &'a str>) -> Result<Self, ParseError> {
        let lines: Vec<&str> = lines.collect();
        let mut cards = Vec::new();
        let mut i = 0usize;

        while i < lines.len() {
            let trimmed = lines[i].trim();

            if trimmed.is_empty() || is_comment(trimmed) {
                i += 1;
                continue;
            }

            if !trimmed.starts_with('*') {
                return Err(ParseError {
                    line: i + 1,
                    message: "expected card starting with '*'".to_string(),
                });
            }

            let line_start = i + 1;
            let header = trimmed.trim_start_matches('*').trim().to_string();
            i += 1;
            if header.is_empty() {
                continue;
            }

            let (keyword, parameters) = parse_header(&header, line_start)?;

            let mut data_lines = Vec::new();
            while i < lines.len() {
                let candidate = lines[i].trim();
                if candidate.is_empty() || is_comment(candidate) {
                    i += 1;
                    continue;
                }
                if candidate.starts_with('*') {
                    break;
                }
                data_lines.push(candidate.to_string());
                i += 1;
            }

            cards.push(Card {
                keyword,
                parameters,
                data_lines,
                line_start,
            });
        }

        Ok(Deck { cards })
    }
}

fn is_comment(line: &str) -> bool {
    line.starts_with("**")
}

fn parse_header(header: &str, line: usize) -> Result<(String, Vec<Parameter>), ParseError> {
    let fields = split_header_fields(header);
    let keyword_raw = fields.first().map(|s| s.as_str()).unwrap_or("").trim();
    if keyword_raw.is_empty() {
        return Err(ParseError {
            line,
            message: "empty card keyword".to_string(),
        });
    }
    let keyword = keyword_raw.to_ascii_uppercase();
    let mut parameters = Vec::new();

    for part in fields.iter().skip(1) {
        let item = part.trim();
        if item.is_empty() {
            continue;
        }
        match item.split_once('=') {
            Some((k, v)) => parameters.push(Parameter {
                key: k.trim().to_ascii_uppercase(),
                value: Some(unquote(v.trim()).to_string()),
            }),
            None => parameters.push(Parameter {
                key: item.to_ascii_uppercase(),
                value: None,
            }),
        }
    }

    Ok((keyword, parameters))
}

// Part names may be quoted and contain commas: name="Plate, upper".
fn split_header_fields(header: &str) -> Vec<String> {
    let mut fields = Vec::<String>::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in header.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

pub(crate) fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

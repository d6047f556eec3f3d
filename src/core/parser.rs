//! Parser for the two-column airfoil coordinate format.
//!
//! The first line carries the airfoil name. Every following line is either a
//! `#` comment, a pair of numbers, or something else that gets skipped.

use crate::domain::model::{AirfoilRecord, CoordinatePair};
use crate::domain::ports::Diagnostics;
use crate::utils::diagnostics::Diagnostic;

pub const COMMENT_MARKER: char = '#';

#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutput {
    pub record: AirfoilRecord,
    /// Warnings for lines that looked like pairs but held invalid numbers.
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, PartialEq)]
enum Line {
    Pair(CoordinatePair),
    Ignored,
    Invalid(String),
}

/// Parses a whole file body.
pub fn parse(name_hint: &str, raw_text: &str) -> ParseOutput {
    parse_lines(name_hint, raw_text.lines())
}

/// Parses a file given as lines. Pure: diagnostics are returned, not logged.
pub fn parse_lines<'a, I>(name_hint: &str, lines: I) -> ParseOutput
where
    I: IntoIterator<Item = &'a str>,
{
    let mut lines = lines.into_iter();

    let name = lines
        .next()
        .map(|first| first.trim_start_matches('\u{feff}').trim())
        .filter(|first| !first.is_empty())
        .unwrap_or(name_hint)
        .to_string();

    let mut coords = Vec::new();
    let mut diagnostics = Vec::new();

    // 第一行是名稱，座標從第二行開始
    for (offset, line) in lines.enumerate() {
        match classify(line) {
            Line::Pair(pair) => coords.push(pair),
            Line::Ignored => {}
            Line::Invalid(reason) => diagnostics.push(Diagnostic::warn(format!(
                "Invalid coordinate format in {} (line {}): {:?} ({})",
                name_hint,
                offset + 2,
                line.trim(),
                reason
            ))),
        }
    }

    ParseOutput {
        record: AirfoilRecord { name, coords },
        diagnostics,
    }
}

/// Parses a file body and forwards line-level warnings to `sink`.
pub fn parse_with(name_hint: &str, raw_text: &str, sink: &dyn Diagnostics) -> AirfoilRecord {
    let output = parse(name_hint, raw_text);
    for diagnostic in &output.diagnostics {
        sink.record(diagnostic.level, &diagnostic.message);
    }
    output.record
}

fn classify(line: &str) -> Line {
    let trimmed = line.trim();
    if trimmed.starts_with(COMMENT_MARKER) {
        return Line::Ignored;
    }

    let mut tokens = trimmed.split_whitespace();
    let (Some(x), Some(y), None) = (tokens.next(), tokens.next(), tokens.next()) else {
        return Line::Ignored;
    };

    match (parse_number(x), parse_number(y)) {
        (Ok(x), Ok(y)) => Line::Pair(CoordinatePair::new(x, y)),
        (Err(reason), _) | (_, Err(reason)) => Line::Invalid(reason),
    }
}

fn parse_number(token: &str) -> Result<f64, String> {
    let value: f64 = token
        .parse()
        .map_err(|e| format!("'{}' is not a number: {}", token, e))?;
    if !value.is_finite() {
        return Err(format!("'{}' is not a finite number", token));
    }
    Ok(value)
}

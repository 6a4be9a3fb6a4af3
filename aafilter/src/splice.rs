//! Regenerate marked regions of a hand-maintained header
//!
//! ```text
//!     // [[[aafilter:up-filters]]]
//!     ...generated...
//!     // [[[end]]]
//! ```
//!
//! Marker lines are kept; everything between them is replaced.

use std::collections::BTreeMap;

use crate::error::SpliceError;
use crate::table::Region;

const OPEN_MARKER: &str = "[[[aafilter:";
const CLOSE_MARKER: &str = "]]]";
const END_MARKER: &str = "[[[end]]]";

/// A region found in a header, with 1-based line numbers of its markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionSpan {
    pub region: Region,
    pub open_line: usize,
    pub end_line: usize,
}

enum Marker<'a> {
    Open(&'a str),
    End,
}

fn parse_marker(line: &str) -> Option<Marker<'_>> {
    if let Some(start) = line.find(OPEN_MARKER) {
        let rest = &line[start + OPEN_MARKER.len()..];
        let name = rest.find(CLOSE_MARKER).map_or(rest, |end| &rest[..end]);
        return Some(Marker::Open(name.trim()));
    }
    line.contains(END_MARKER).then_some(Marker::End)
}

fn indentation(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

/// List the regions marked in `text`.
pub fn find_regions(text: &str) -> Result<Vec<RegionSpan>, SpliceError> {
    let mut spans = Vec::new();
    let mut open: Option<(Region, usize)> = None;

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        match (parse_marker(line), open) {
            (None, _) => {}
            (Some(Marker::Open(_)), Some((current, _))) => {
                return Err(SpliceError::Nested {
                    open: current.name().to_string(),
                    line: line_no,
                });
            }
            (Some(Marker::Open(name)), None) => {
                let region = name.parse::<Region>().map_err(|name| SpliceError::UnknownRegion {
                    name,
                    line: line_no,
                })?;
                open = Some((region, line_no));
            }
            (Some(Marker::End), Some((region, open_line))) => {
                spans.push(RegionSpan {
                    region,
                    open_line,
                    end_line: line_no,
                });
                open = None;
            }
            (Some(Marker::End), None) => return Err(SpliceError::UnexpectedEnd { line: line_no }),
        }
    }

    match open {
        Some((region, line)) => Err(SpliceError::Unterminated {
            region: region.name().to_string(),
            line,
        }),
        None => Ok(spans),
    }
}

/// Replace the body of every marked region with its generated text.
///
/// Generated lines take the indentation of their opening marker. Regions
/// missing from `generated` are emptied. Line endings outside regions are
/// preserved.
pub fn splice(text: &str, generated: &BTreeMap<Region, String>) -> Result<String, SpliceError> {
    let mut spans = find_regions(text)?.into_iter().peekable();
    let mut out = String::with_capacity(text.len());

    for (index, line) in text.split_inclusive('\n').enumerate() {
        let line_no = index + 1;
        match spans.peek() {
            Some(span) if line_no == span.open_line => {
                out.push_str(line);
                if !line.ends_with('\n') {
                    out.push('\n');
                }
                let body = generated.get(&span.region).map_or("", String::as_str);
                let indent = indentation(line);
                for body_line in body.lines() {
                    if !body_line.is_empty() {
                        out.push_str(indent);
                        out.push_str(body_line);
                    }
                    out.push('\n');
                }
            }
            Some(span) if line_no < span.end_line && line_no > span.open_line => {}
            Some(span) if line_no == span.end_line => {
                out.push_str(line);
                spans.next();
            }
            _ => out.push_str(line),
        }
    }

    Ok(out)
}

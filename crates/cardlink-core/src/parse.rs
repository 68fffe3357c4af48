//! Reference token parser.
//!
//! Scans raw card text for the `[[title]](placeholder)` reference syntax,
//! assigns a stable ref id to every occurrence that lacks one, and rewrites
//! each token into its fully-normalized form
//! `[[title]](placeholder)<!--ref:ID-->`. Reference-like syntax inside
//! fenced code blocks or inline code spans is passed through untouched.
//!
//! A ref comment only belongs to a token when it sits immediately after the
//! closing paren, with zero characters in between. Any other ref comment is
//! an orphan: a structural error in validation mode, stripped from the text
//! in repair mode.
//!
//! # Modes
//!
//! | `allow_insert` | Missing ref id | Orphan comment |
//! |----------------|----------------|----------------|
//! | `true` (repair) | generate a new id | strip it |
//! | `false` (validation) | [`InvalidReferenceError::MissingRefId`] | [`InvalidReferenceError::OrphanComment`] |
//!
//! Repair mode is idempotent: parsing the output of a previous parse yields
//! byte-identical text and an identical token list.

use std::collections::HashSet;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use uuid::Uuid;

use crate::models::RefToken;

/// `[[title]](placeholder)` with an optional immediately adjacent ref
/// comment. The title match is non-greedy so punctuation and single
/// brackets inside it survive; the placeholder may be empty.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[(.+?)\]\]\(([^)\n]*)\)(?:<!--ref:([A-Za-z0-9]+)-->)?").unwrap()
});

/// Any ref comment, attached or not.
static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!--ref:[A-Za-z0-9]+-->").unwrap());

/// Fenced code blocks. Dot-all so fences span lines.
static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)```.*?```").unwrap());

/// Inline code spans, single line only.
static INLINE_CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`[^`\n]+`").unwrap());

/// Structural defect found while parsing in validation mode.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidReferenceError {
    /// A reference has no ref comment and `allow_insert` is false.
    #[error("missing ref id for reference '[[{title}]]'")]
    MissingRefId { title: String },
    /// A ref comment is not immediately adjacent to a reference.
    #[error("orphan ref comment at byte {index}")]
    OrphanComment { index: usize },
}

/// Result of a parse: normalized text plus tokens ordered by offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOutcome {
    pub text: String,
    pub tokens: Vec<RefToken>,
}

/// Parse card text into normalized text and reference tokens.
///
/// With `allow_insert = true` (repair mode) every structural defect is
/// fixed deterministically and the call cannot fail. With
/// `allow_insert = false` (validation mode) the first defect is returned
/// as an [`InvalidReferenceError`]; this mode is an assertion used by
/// tests and invariant checks, not by the editing flow.
pub fn parse_references(
    text: &str,
    allow_insert: bool,
) -> Result<ParseOutcome, InvalidReferenceError> {
    let mut scan = scan_text(text, allow_insert)?;
    // Stripping orphans shifts every later offset, so rescan the stripped
    // text instead of patching indices. The text shrinks on every round.
    while !scan.orphan_spans.is_empty() {
        if !allow_insert {
            return Err(InvalidReferenceError::OrphanComment {
                index: scan.orphan_spans[0].start,
            });
        }
        let stripped = strip_spans(&scan.text, &scan.orphan_spans);
        scan = scan_text(&stripped, allow_insert)?;
    }
    Ok(ParseOutcome {
        text: scan.text,
        tokens: scan.tokens,
    })
}

/// Generate a fresh ref id: 32 alphanumeric characters, collision-free for
/// any realistic volume of references within one document.
fn new_ref_id() -> String {
    Uuid::new_v4().simple().to_string()
}

struct ScanOutput {
    text: String,
    tokens: Vec<RefToken>,
    /// Spans (in `text`) of ref comments that belong to no token.
    orphan_spans: Vec<Range<usize>>,
}

/// Single rewrite pass: tokenize, normalize, and locate orphan comments.
fn scan_text(text: &str, allow_insert: bool) -> Result<ScanOutput, InvalidReferenceError> {
    let excluded = excluded_ranges(text);
    let mut out = String::with_capacity(text.len() + 64);
    let mut tokens: Vec<RefToken> = Vec::new();
    let mut copied_to = 0usize;

    for caps in TOKEN_RE.captures_iter(text) {
        let m = caps.get(0).unwrap();
        if covered(&excluded, m.start(), m.end()) {
            // Inside a code span: copied verbatim with the surrounding text.
            continue;
        }
        let title = caps.get(1).unwrap().as_str().trim();
        let placeholder = caps.get(2).unwrap().as_str();
        let ref_id = match caps.get(3) {
            Some(id) => id.as_str().to_string(),
            None if allow_insert => new_ref_id(),
            None => {
                return Err(InvalidReferenceError::MissingRefId {
                    title: title.to_string(),
                })
            }
        };

        out.push_str(&text[copied_to..m.start()]);
        let raw = format!("[[{title}]]({placeholder})<!--ref:{ref_id}-->");
        let index = out.len();
        out.push_str(&raw);
        tokens.push(RefToken {
            title: title.to_string(),
            placeholder: placeholder.to_string(),
            ref_id,
            index,
            raw,
        });
        copied_to = m.end();
    }
    out.push_str(&text[copied_to..]);

    // A comment belongs to a token iff it starts exactly where that
    // token's trailing comment was written. Everything else outside code
    // spans is an orphan.
    let attached: HashSet<usize> = tokens
        .iter()
        .map(|t| t.index + t.raw.len() - comment_len(&t.ref_id))
        .collect();
    let excluded_out = excluded_ranges(&out);
    let orphan_spans = COMMENT_RE
        .find_iter(&out)
        .filter(|m| !covered(&excluded_out, m.start(), m.end()))
        .filter(|m| !attached.contains(&m.start()))
        .map(|m| m.start()..m.end())
        .collect();

    Ok(ScanOutput {
        text: out,
        tokens,
        orphan_spans,
    })
}

fn comment_len(ref_id: &str) -> usize {
    "<!--ref:".len() + ref_id.len() + "-->".len()
}

/// Byte ranges of fenced code blocks and inline code spans.
///
/// Inline spans overlapping a fence are dropped so a fence's interior
/// backticks don't spawn phantom inline ranges.
fn excluded_ranges(text: &str) -> Vec<Range<usize>> {
    let mut ranges: Vec<Range<usize>> = FENCE_RE.find_iter(text).map(|m| m.range()).collect();
    let inline: Vec<Range<usize>> = INLINE_CODE_RE
        .find_iter(text)
        .map(|m| m.range())
        .filter(|r| !ranges.iter().any(|f| r.start < f.end && f.start < r.end))
        .collect();
    ranges.extend(inline);
    ranges.sort_by_key(|r| r.start);
    ranges
}

/// Whether `start..end` lies entirely inside one excluded range.
fn covered(ranges: &[Range<usize>], start: usize, end: usize) -> bool {
    ranges.iter().any(|r| r.start <= start && end <= r.end)
}

/// Rebuild text with the given disjoint, ascending spans removed.
fn strip_spans(text: &str, spans: &[Range<usize>]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut copied_to = 0usize;
    for span in spans {
        out.push_str(&text[copied_to..span.start]);
        copied_to = span.end;
    }
    out.push_str(&text[copied_to..]);
    out
}

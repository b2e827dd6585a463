//! Tracker discovery inside Markdown documents.
//!
//! Trackers live in fenced code blocks whose info string starts with
//! [`TRACKER_LANGUAGE`]. Fences follow the CommonMark rules that matter for
//! locating blocks: backtick or tilde runs of at least three, indented by at
//! most three spaces, closed by a run of the same character that is at least
//! as long. An unclosed fence runs to the end of the document.

use std::ops::Range;
use std::sync::LazyLock;

use chrono::TimeZone;
use regex::Regex;

use crate::entry::Tracker;
use crate::parser::{ParseError, parse_tracker_in};

/// Info string that marks a tracker block.
pub const TRACKER_LANGUAGE: &str = "time-tracker";

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {0,3}(`{3,}|~{3,})(.*)$").unwrap());

/// A fenced code block located in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock<'a> {
    /// Info string after the opening fence, trimmed.
    pub info: &'a str,
    /// Byte range of the block body, between the fence lines.
    pub body: Range<usize>,
    /// 1-based line of the opening fence.
    pub line: usize,
}

impl CodeBlock<'_> {
    /// The first word of the info string.
    pub fn language(&self) -> Option<&str> {
        self.info.split_whitespace().next()
    }
}

/// A tracker block that parsed successfully, with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerMatch {
    /// Position among the tracker blocks of the document, from 0.
    pub index: usize,
    /// 1-based line of the opening fence.
    pub line: usize,
    /// Byte range of the block body.
    pub span: Range<usize>,
    pub tracker: Tracker,
}

/// A tracker block that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockFailure {
    pub index: usize,
    pub line: usize,
    pub error: ParseError,
}

/// Result of scanning one document for trackers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    /// Parsed trackers in document order.
    pub trackers: Vec<TrackerMatch>,
    /// Blocks skipped because they did not parse.
    pub failures: Vec<BlockFailure>,
}

struct OpenFence<'a> {
    marker: char,
    len: usize,
    info: &'a str,
    body_start: usize,
    line: usize,
}

/// Lists every fenced code block of a Markdown document in order.
pub fn code_blocks(text: &str) -> Vec<CodeBlock<'_>> {
    let mut blocks = Vec::new();
    let mut open: Option<OpenFence<'_>> = None;
    let mut offset = 0;

    for (idx, raw) in text.split_inclusive('\n').enumerate() {
        let line_start = offset;
        offset += raw.len();
        let content = raw.trim_end_matches(['\n', '\r']);

        let Some(caps) = FENCE_RE.captures(content) else {
            continue;
        };
        let fence = caps.get(1).map_or("", |m| m.as_str());
        let rest = caps.get(2).map_or("", |m| m.as_str()).trim();
        let Some(marker) = fence.chars().next() else {
            continue;
        };

        match &open {
            Some(current) => {
                if marker == current.marker && fence.len() >= current.len && rest.is_empty() {
                    blocks.push(CodeBlock {
                        info: current.info,
                        body: current.body_start..line_start,
                        line: current.line,
                    });
                    open = None;
                }
            }
            None => {
                // Backtick info strings cannot contain backticks.
                if marker == '`' && rest.contains('`') {
                    continue;
                }
                open = Some(OpenFence {
                    marker,
                    len: fence.len(),
                    info: rest,
                    body_start: offset,
                    line: idx + 1,
                });
            }
        }
    }

    if let Some(current) = open {
        blocks.push(CodeBlock {
            info: current.info,
            body: current.body_start..text.len(),
            line: current.line,
        });
    }
    blocks
}

/// Finds and parses every tracker block in `text`.
///
/// Each block is parsed on its own: a malformed block is reported in
/// [`Discovery::failures`] and the other blocks are still returned.
pub fn discover_trackers<Tz: TimeZone>(text: &str, tz: &Tz) -> Discovery {
    let mut discovery = Discovery::default();
    let blocks = code_blocks(text)
        .into_iter()
        .filter(|b| b.language() == Some(TRACKER_LANGUAGE));

    for (index, block) in blocks.enumerate() {
        match parse_tracker_in(&text[block.body.clone()], tz) {
            Ok(tracker) => discovery.trackers.push(TrackerMatch {
                index,
                line: block.line,
                span: block.body,
                tracker,
            }),
            Err(error) => {
                tracing::warn!(index, line = block.line, %error, "skipping malformed tracker block");
                discovery.failures.push(BlockFailure {
                    index,
                    line: block.line,
                    error,
                });
            }
        }
    }

    tracing::debug!(
        trackers = discovery.trackers.len(),
        failures = discovery.failures.len(),
        "scanned document for trackers"
    );
    discovery
}

/// Replaces the body of a block, leaving everything outside `span` untouched.
pub fn replace_block(text: &str, span: Range<usize>, body: &str) -> String {
    let mut out = String::with_capacity(text.len() + body.len());
    out.push_str(&text[..span.start]);
    out.push_str(body);
    // An unclosed block at the end of a file without a trailing newline.
    if span.end == text.len() && !body.is_empty() && !body.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&text[span.end..]);
    out
}

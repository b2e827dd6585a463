//! YAML frontmatter surgery.
//!
//! The header is the block between a `---` line at the very start of the
//! document and the next `---` line. The payload must parse as a YAML
//! mapping before anything is written. Updating then edits text, not a
//! re-serialized mapping: only the top-level `elapsed` line is replaced or
//! appended, so comments, anchors and the spelling of every other value
//! survive byte for byte. The body after the closing delimiter is copied
//! verbatim.
//!
//! Anything that cannot be parsed with confidence is an error, never a
//! reason to write a fresh header over the old one.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde_yaml::{Mapping, Value};
use thiserror::Error;

/// Delimiter line that opens and closes the header.
pub const DELIMITER: &str = "---";

/// The only key this system owns.
pub const ELAPSED_KEY: &str = "elapsed";

static ELAPSED_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?:elapsed|"elapsed"|'elapsed')[ \t]*:(?:[ \t\r\n]|$)"#).unwrap()
});

/// Errors reading an existing header.
#[derive(Debug, Error)]
pub enum HeaderError {
    /// The document opens a header that never closes.
    #[error("frontmatter opened on line 1 is never closed")]
    Unterminated,
    #[error("frontmatter is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// The payload parsed, but not as a key-value mapping.
    #[error("frontmatter must be a key-value mapping, found {found}")]
    NotAMapping { found: &'static str },
    /// Editing the `elapsed` line would not yield the expected mapping.
    #[error("frontmatter layout prevents updating `elapsed` in place")]
    NotRewritable,
}

/// Location of the header inside a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderSpan {
    /// The whole header, from byte 0 through the closing line terminator.
    pub span: Range<usize>,
    /// The YAML payload between the delimiter lines.
    pub payload: Range<usize>,
    /// What followed the closing delimiter: `"\n"`, `"\r\n"`, or nothing at end of input.
    pub closing_terminator: &'static str,
}

fn trim_eol(line: &str) -> &str {
    line.strip_suffix('\n')
        .map_or(line, |l| l.strip_suffix('\r').unwrap_or(l))
}

/// Locates the header. `Ok(None)` when the document has none.
pub fn split_header(text: &str) -> Result<Option<HeaderSpan>, HeaderError> {
    let mut lines = text.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return Ok(None);
    };
    if trim_eol(first) != DELIMITER {
        return Ok(None);
    }

    let payload_start = first.len();
    let mut offset = payload_start;
    for line in lines {
        if trim_eol(line) == DELIMITER {
            let closing_terminator = match &line[DELIMITER.len()..] {
                "\r\n" => "\r\n",
                "\n" => "\n",
                _ => "",
            };
            return Ok(Some(HeaderSpan {
                span: 0..offset + line.len(),
                payload: payload_start..offset,
                closing_terminator,
            }));
        }
        offset += line.len();
    }
    Err(HeaderError::Unterminated)
}

/// Parses a header payload. Empty and comment-only payloads are an empty mapping.
pub fn parse_header(payload: &str) -> Result<Mapping, HeaderError> {
    let has_content = payload.lines().any(|line| {
        let line = line.trim();
        !line.is_empty() && !line.starts_with('#')
    });
    if !has_content {
        return Ok(Mapping::new());
    }
    match serde_yaml::from_str::<Value>(payload)? {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Mapping::new()),
        other => Err(HeaderError::NotAMapping {
            found: value_kind(&other),
        }),
    }
}

const fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

fn line_terminator(line: &str) -> &'static str {
    if line.as_bytes().ends_with(b"\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}

/// Replaces the top-level `elapsed` line of `payload` with `new_line`, or
/// appends `new_line` when there is none.
fn splice_elapsed(payload: &str, new_line: &str) -> String {
    let mut out = String::with_capacity(payload.len() + new_line.len());
    let mut lines = payload.split_inclusive('\n').peekable();
    let mut replaced = false;
    while let Some(line) = lines.next() {
        if replaced || !ELAPSED_LINE_RE.is_match(line) {
            out.push_str(line);
            continue;
        }
        out.push_str(new_line);
        replaced = true;
        // Indented lines below the key belong to its old value.
        while lines
            .next_if(|next| next.starts_with([' ', '\t']) && !next.trim().is_empty())
            .is_some()
        {}
    }
    if !replaced {
        out.push_str(new_line);
    }
    out
}

/// Reads the `elapsed` value of the header, if both exist.
pub fn read_elapsed(text: &str) -> Result<Option<i64>, HeaderError> {
    let Some(header) = split_header(text)? else {
        return Ok(None);
    };
    let mapping = parse_header(&text[header.payload])?;
    Ok(mapping.get(ELAPSED_KEY).and_then(Value::as_i64))
}

/// Returns the document with `elapsed` set to `elapsed_ms` in its header.
///
/// Every other header byte is kept; an existing `elapsed` keeps its
/// position and a new one goes last. Inserted lines use the line ending of
/// the opening delimiter. A document without a header gets a minimal one
/// prepended.
pub fn set_elapsed(text: &str, elapsed_ms: i64) -> Result<String, HeaderError> {
    let Some(header) = split_header(text)? else {
        let eol = text.split_inclusive('\n').next().map_or("\n", line_terminator);
        return Ok(format!(
            "{DELIMITER}{eol}{ELAPSED_KEY}: {elapsed_ms}{eol}{DELIMITER}{eol}{text}"
        ));
    };

    let payload = &text[header.payload.clone()];
    let mut expected = parse_header(payload)?;
    expected.insert(
        Value::String(ELAPSED_KEY.to_string()),
        Value::from(elapsed_ms),
    );

    let eol = line_terminator(&text[..header.payload.start]);
    let new_line = format!("{ELAPSED_KEY}: {elapsed_ms}{eol}");
    let edited = splice_elapsed(payload, &new_line);
    if parse_header(&edited)? != expected {
        return Err(HeaderError::NotRewritable);
    }

    let mut out = String::with_capacity(text.len() + new_line.len());
    out.push_str(&text[..header.payload.start]);
    out.push_str(&edited);
    out.push_str(&text[header.payload.end..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_header_absent() {
        assert_eq!(split_header("").unwrap(), None);
        assert_eq!(split_header("# Title\n---\n").unwrap(), None);
        // The delimiter must be the very first line.
        assert_eq!(split_header("\n---\na: 1\n---\n").unwrap(), None);
    }

    #[test]
    fn test_split_header_present() {
        let text = "---\ntitle: X\n---\nbody\n";
        let header = split_header(text).unwrap().unwrap();
        assert_eq!(&text[header.payload.clone()], "title: X\n");
        assert_eq!(&text[header.span.end..], "body\n");
        assert_eq!(header.closing_terminator, "\n");
    }

    #[test]
    fn test_split_header_crlf_and_eof() {
        let text = "---\r\na: 1\r\n---\r\nbody";
        let header = split_header(text).unwrap().unwrap();
        assert_eq!(header.closing_terminator, "\r\n");
        assert_eq!(&text[header.span.end..], "body");

        let text = "---\na: 1\n---";
        let header = split_header(text).unwrap().unwrap();
        assert_eq!(header.closing_terminator, "");
        assert_eq!(header.span.end, text.len());
    }

    #[test]
    fn test_split_header_unterminated() {
        let err = split_header("---\ntitle: X\nbody\n").unwrap_err();
        assert!(matches!(err, HeaderError::Unterminated));
    }

    #[test]
    fn test_parse_header_rejects_non_mapping() {
        let err = parse_header("- a\n- b\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "frontmatter must be a key-value mapping, found a list"
        );
        assert!(matches!(
            parse_header("title: [unclosed\n").unwrap_err(),
            HeaderError::Yaml(_)
        ));
    }

    #[test]
    fn test_parse_header_empty_and_comments() {
        assert!(parse_header("").unwrap().is_empty());
        assert!(parse_header("# just a comment\n").unwrap().is_empty());
    }

    #[test]
    fn test_set_elapsed_without_header() {
        let body = "# Notes\n\nSome text.\n";
        let updated = set_elapsed(body, 3_600_000).unwrap();
        assert_eq!(updated, format!("---\nelapsed: 3600000\n---\n{body}"));
    }

    #[test]
    fn test_set_elapsed_preserves_other_keys() {
        let text = "---\ntitle: \"X\"\n---\nBody text\n";
        let updated = set_elapsed(text, 120_000).unwrap();

        assert!(updated.ends_with("---\nBody text\n"));
        let header = split_header(&updated).unwrap().unwrap();
        let mapping = parse_header(&updated[header.payload]).unwrap();
        assert_eq!(mapping.get("title").and_then(Value::as_str), Some("X"));
        assert_eq!(mapping.get(ELAPSED_KEY).and_then(Value::as_i64), Some(120_000));
        assert_eq!(read_elapsed(&updated).unwrap(), Some(120_000));
    }

    #[test]
    fn test_set_elapsed_overwrites_in_place() {
        let text = "---\nelapsed: 5\ntags:\n- work\nstatus: open\n---\n\nbody";
        let updated = set_elapsed(text, 42).unwrap();
        assert_eq!(
            updated,
            "---\nelapsed: 42\ntags:\n- work\nstatus: open\n---\n\nbody"
        );
    }

    #[test]
    fn test_set_elapsed_keeps_crlf_body_bytes() {
        let text = "---\r\na: 1\r\n---\r\nline one\r\nline two\r\n";
        let updated = set_elapsed(text, 7).unwrap();
        assert!(updated.ends_with("---\r\nline one\r\nline two\r\n"));
    }

    #[test]
    fn test_set_elapsed_empty_header() {
        let updated = set_elapsed("---\n---\nbody\n", 1).unwrap();
        assert_eq!(updated, "---\nelapsed: 1\n---\nbody\n");
    }

    #[test]
    fn test_set_elapsed_fails_closed() {
        for text in [
            "---\ntitle: X\nno closing delimiter\n",
            "---\n- not\n- a mapping\n---\nbody\n",
            "---\ntitle: [broken\n---\nbody\n",
            "---\na: 1\na: 2\n---\nbody\n",
        ] {
            assert!(set_elapsed(text, 1).is_err(), "{text:?} should not be rewritten");
        }
    }

    #[test]
    fn test_set_elapsed_keeps_foreign_values_verbatim() {
        for payload in [
            "version: 1.10\n",
            "id: 0x1F\n",
            "# keep me\ntitle: X\n",
            "a: &x hello\nb: *x\n",
            "title: 'yes'\n",
            "empty:\n",
        ] {
            let updated = set_elapsed(&format!("---\n{payload}---\nbody\n"), 5).unwrap();
            assert_eq!(updated, format!("---\n{payload}elapsed: 5\n---\nbody\n"));
        }
    }

    #[test]
    fn test_set_elapsed_same_value_is_byte_identical() {
        let text = "---\n# notes\nversion: 1.10\nelapsed: 5\nlist: [a, b]\n---\nbody\n";
        assert_eq!(set_elapsed(text, 5).unwrap(), text);
    }

    #[test]
    fn test_set_elapsed_replaces_multiline_value() {
        let text = "---\nelapsed:\n  5\nnext: 1\n---\n";
        assert_eq!(set_elapsed(text, 9).unwrap(), "---\nelapsed: 9\nnext: 1\n---\n");
    }

    #[test]
    fn test_set_elapsed_crlf_header_lines() {
        let text = "---\r\na: 1\r\n---\r\nbody";
        assert_eq!(
            set_elapsed(text, 7).unwrap(),
            "---\r\na: 1\r\nelapsed: 7\r\n---\r\nbody"
        );
        assert_eq!(
            set_elapsed("line one\r\n", 7).unwrap(),
            "---\r\nelapsed: 7\r\n---\r\nline one\r\n"
        );
    }

    #[test]
    fn test_set_elapsed_refuses_flow_mapping() {
        // Appending a block line after a flow mapping is not valid YAML.
        assert!(set_elapsed("---\n{title: X}\n---\nbody\n", 1).is_err());
    }
}

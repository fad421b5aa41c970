//! crates/logging/src/wrap.rs
//! Splits free-form text into physical lines that fit a syslog record.
//!
//! Text is first normalised (tabs become four spaces, optionally the two
//! character escape `\n` becomes a real line break), then split on line breaks
//! into logical lines. Logical lines that reach the configured length are cut
//! into fixed-width chunks tagged with the continuation marker, and every
//! physical line after the first one of the call is prefixed with the indent
//! marker so a reader can tell where one record ends and the next begins.

use std::num::NonZeroUsize;

/// Marker attached to the cut edges of a wrapped logical line.
pub const DEFAULT_CONTINUATION_TAG: &str = "!!LINEWRAPPED!!";

/// Prefix applied to every physical line after the first of a record.
pub const DEFAULT_INDENT_MARKER: &str = "    ";

/// Default maximum logical line length in characters.
///
/// Leaves room for the record header and the syslog envelope inside the
/// traditional 1024 byte datagram.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 900;

const TAB_REPLACEMENT: &str = "    ";

/// Process-wide wrapping parameters.
///
/// Built once at startup and shared read-only by every [`Emitter`](crate::Emitter).
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WrapConfig {
    max_line_length: NonZeroUsize,
    indent_marker: String,
    continuation_tag: String,
    expand_escaped_newlines: bool,
}

impl WrapConfig {
    /// Creates a configuration with the given maximum and default markers.
    #[must_use]
    pub fn new(max_line_length: NonZeroUsize) -> Self {
        Self {
            max_line_length,
            indent_marker: DEFAULT_INDENT_MARKER.to_owned(),
            continuation_tag: DEFAULT_CONTINUATION_TAG.to_owned(),
            expand_escaped_newlines: true,
        }
    }

    /// Replaces the indent marker.
    #[must_use]
    pub fn with_indent_marker(mut self, marker: impl Into<String>) -> Self {
        self.indent_marker = marker.into();
        self
    }

    /// Replaces the continuation tag.
    #[must_use]
    pub fn with_continuation_tag(mut self, tag: impl Into<String>) -> Self {
        self.continuation_tag = tag.into();
        self
    }

    /// Enables or disables expansion of the two-character `\n` escape.
    #[must_use]
    pub const fn with_expand_escaped_newlines(mut self, expand: bool) -> Self {
        self.expand_escaped_newlines = expand;
        self
    }

    /// Maximum logical line length, in characters, before wrapping kicks in.
    #[must_use]
    pub const fn max_line_length(&self) -> NonZeroUsize {
        self.max_line_length
    }

    /// Prefix for continuation physical lines.
    #[must_use]
    pub fn indent_marker(&self) -> &str {
        &self.indent_marker
    }

    /// Marker attached where a logical line was cut.
    #[must_use]
    pub fn continuation_tag(&self) -> &str {
        &self.continuation_tag
    }

    /// Whether `\n` escapes are turned into line breaks.
    #[must_use]
    pub const fn expand_escaped_newlines(&self) -> bool {
        self.expand_escaped_newlines
    }
}

impl Default for WrapConfig {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_MAX_LINE_LENGTH).unwrap_or(NonZeroUsize::MIN))
    }
}

/// Turns `text` into the ordered physical lines of one record.
///
/// The result always holds at least one line. Empty input yields a single
/// empty line; a trailing line break does not add an extra empty line, so
/// `"\n\n"` yields two empty lines.
///
/// A logical line shorter than or exactly at the maximum is kept whole. Longer
/// lines are cut into chunks of exactly the maximum (the last may be shorter):
/// the first chunk gets the tag appended, the last gets it prepended, middle
/// chunks get both.
///
/// # Examples
///
/// ```
/// use std::num::NonZeroUsize;
/// use logging::{WrapConfig, wrap};
///
/// let config = WrapConfig::new(NonZeroUsize::new(4).unwrap())
///     .with_indent_marker("> ")
///     .with_continuation_tag("~");
///
/// assert_eq!(wrap("abcdef", &config), vec!["abcd~", "> ~ef"]);
/// assert_eq!(wrap("one\ntwo", &config), vec!["one", "> two"]);
/// assert_eq!(wrap("a\tb", &config), vec!["a   ~", "> ~ b"]);
/// ```
#[must_use]
pub fn wrap(text: &str, config: &WrapConfig) -> Vec<String> {
    let normalized = normalize(text, config.expand_escaped_newlines);
    let max = config.max_line_length.get();
    let tag = config.continuation_tag.as_str();

    let mut physical = Vec::new();
    for logical in logical_lines(&normalized) {
        split_logical(logical, max, tag, &mut physical);
    }

    for line in physical.iter_mut().skip(1) {
        line.insert_str(0, &config.indent_marker);
    }
    physical
}

fn normalize(text: &str, expand_escaped_newlines: bool) -> String {
    let detabbed = text.replace('\t', TAB_REPLACEMENT);
    if expand_escaped_newlines {
        detabbed.replace("\\n", "\n")
    } else {
        detabbed
    }
}

fn logical_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.split('\n').collect();
    if lines.len() > 1 && lines.last().is_some_and(|last| last.is_empty()) {
        lines.pop();
    }
    lines
}

fn split_logical(line: &str, max: usize, tag: &str, out: &mut Vec<String>) {
    let boundaries: Vec<usize> = line
        .char_indices()
        .map(|(offset, _)| offset)
        .step_by(max)
        .skip(1)
        .collect();

    if boundaries.is_empty() {
        out.push(line.to_owned());
        return;
    }

    let mut start = 0;
    let last = boundaries.len();
    for (index, end) in boundaries
        .into_iter()
        .chain(std::iter::once(line.len()))
        .enumerate()
    {
        let chunk = &line[start..end];
        start = end;

        let mut piece = String::with_capacity(chunk.len() + 2 * tag.len());
        if index > 0 {
            piece.push_str(tag);
        }
        piece.push_str(chunk);
        if index < last {
            piece.push_str(tag);
        }
        out.push(piece);
    }
}

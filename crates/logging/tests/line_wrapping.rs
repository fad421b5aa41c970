//! Integration tests for line wrapping.
//!
//! Checks chunk counts, continuation tag placement and indentation for
//! long logical lines and multi-line text.

use std::num::NonZeroUsize;

use logging::{DEFAULT_CONTINUATION_TAG, DEFAULT_INDENT_MARKER, WrapConfig, wrap};

fn config(max: usize) -> WrapConfig {
    WrapConfig::new(NonZeroUsize::new(max).expect("non-zero"))
}

fn strip_indent(line: &str) -> &str {
    line.strip_prefix(DEFAULT_INDENT_MARKER).unwrap_or(line)
}

// ============================================================================
// Chunking
// ============================================================================

/// Verifies a line of 3*max+5 characters becomes four tagged chunks.
#[test]
fn long_line_becomes_four_chunks() {
    let max = 10;
    let text: String = ('a'..='z').cycle().take(3 * max + 5).collect();
    let lines = wrap(&text, &config(max));
    let tag = DEFAULT_CONTINUATION_TAG;

    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], format!("{}{tag}", &text[..10]));
    assert_eq!(lines[1], format!("{DEFAULT_INDENT_MARKER}{tag}{}{tag}", &text[10..20]));
    assert_eq!(lines[2], format!("{DEFAULT_INDENT_MARKER}{tag}{}{tag}", &text[20..30]));
    assert_eq!(lines[3], format!("{DEFAULT_INDENT_MARKER}{tag}{}", &text[30..]));
}

/// Verifies the chunks reassemble into the original line.
#[test]
fn chunks_reassemble_original_text() {
    let text = "x".repeat(2_500);
    let joined: String = wrap(&text, &config(900))
        .iter()
        .map(|line| strip_indent(line).replace(DEFAULT_CONTINUATION_TAG, ""))
        .collect();
    assert_eq!(joined, text);
}

/// Verifies a line of exactly the maximum is emitted whole and untagged.
#[test]
fn line_at_exact_maximum_is_not_wrapped() {
    let text = "y".repeat(900);
    assert_eq!(wrap(&text, &WrapConfig::default()), vec![text]);
}

/// Verifies a short line passes through unchanged.
#[test]
fn short_line_is_unchanged() {
    assert_eq!(wrap("backup complete", &config(80)), vec!["backup complete"]);
}

/// Verifies wrapping a single short line twice changes nothing.
#[test]
fn short_line_wrapping_is_idempotent() {
    let config = config(40);
    let once = wrap("nothing to do", &config);
    let twice = wrap(&once[0], &config);
    assert_eq!(once, twice);
}

// ============================================================================
// Indentation
// ============================================================================

/// Verifies only the first physical line of a record is unindented.
#[test]
fn every_line_after_the_first_is_indented() {
    let lines = wrap("first\nsecond\nthird", &config(80));
    assert_eq!(lines[0], "first");
    for line in &lines[1..] {
        assert!(line.starts_with(DEFAULT_INDENT_MARKER), "{line:?}");
    }
}

/// Verifies a wrapped second logical line is indented on every chunk.
#[test]
fn wrapped_second_line_is_fully_indented() {
    let lines = wrap("head\n0123456789AB", &config(5));
    assert_eq!(
        lines,
        vec![
            "head".to_owned(),
            format!("{DEFAULT_INDENT_MARKER}01234{DEFAULT_CONTINUATION_TAG}"),
            format!("{DEFAULT_INDENT_MARKER}{DEFAULT_CONTINUATION_TAG}56789{DEFAULT_CONTINUATION_TAG}"),
            format!("{DEFAULT_INDENT_MARKER}{DEFAULT_CONTINUATION_TAG}AB"),
        ]
    );
}

/// Verifies a custom indent marker is honoured.
#[test]
fn custom_indent_marker() {
    let config = config(80).with_indent_marker("| ");
    assert_eq!(wrap("a\nb", &config), vec!["a", "| b"]);
}

// ============================================================================
// Normalisation
// ============================================================================

/// Verifies tab expansion happens before measuring length.
#[test]
fn tabs_count_as_four_characters() {
    let lines = wrap("\t\t", &config(6));
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("      "));
}

/// Verifies text made only of line breaks yields one empty line per break.
#[test]
fn bare_line_breaks() {
    let lines = wrap("\n\n", &config(10));
    assert_eq!(lines, vec![String::new(), DEFAULT_INDENT_MARKER.to_owned()]);
}

//! Line-level text helpers: line splitting, display cells, grapheme steps and word classes.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

pub(crate) fn split_lines_preserve_trailing(text: &str) -> Vec<String> {
    // N newlines => N+1 lines, matching how the rope counts lines.
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}

fn cell_width(ch: char, cell: usize, tab_stop: usize) -> usize {
    if ch == '\t' {
        let tab_stop = tab_stop.max(1);
        tab_stop - (cell % tab_stop)
    } else {
        UnicodeWidthChar::width(ch).unwrap_or(0)
    }
}

/// Display cell at which character `column` of `line` starts.
pub fn display_column(line: &str, column: usize, tab_stop: usize) -> usize {
    line.chars()
        .take(column)
        .fold(0, |cell, ch| cell + cell_width(ch, cell, tab_stop))
}

/// Character column whose cell range contains display cell `cell`.
///
/// Returns the line length in characters if `cell` lies past the end of the line.
pub fn column_for_display(line: &str, cell: usize, tab_stop: usize) -> usize {
    let mut current = 0;
    for (column, ch) in line.chars().enumerate() {
        let width = cell_width(ch, current, tab_stop);
        if cell < current + width.max(1) {
            return column;
        }
        current += width;
    }
    line.chars().count()
}

/// Character column of the grapheme boundary after `column`.
pub fn next_grapheme_column(line: &str, column: usize) -> usize {
    let mut chars = 0;
    for grapheme in line.graphemes(true) {
        let len = grapheme.chars().count();
        if chars + len > column {
            return chars + len;
        }
        chars += len;
    }
    chars
}

/// Character column of the grapheme boundary before `column`.
pub fn prev_grapheme_column(line: &str, column: usize) -> usize {
    let mut chars = 0;
    let mut previous = 0;
    for grapheme in line.graphemes(true) {
        if chars >= column {
            break;
        }
        previous = chars;
        chars += grapheme.chars().count();
    }
    previous
}

/// Vim character classes for word motions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    /// Whitespace and line breaks.
    Blank,
    /// Letters, digits and `_`.
    Keyword,
    /// Anything else.
    Punctuation,
}

/// Classify `ch` for word motions.
pub fn char_class(ch: char) -> CharClass {
    if ch.is_whitespace() {
        CharClass::Blank
    } else if ch.is_alphanumeric() || ch == '_' {
        CharClass::Keyword
    } else {
        CharClass::Punctuation
    }
}

/// Column of the first non-blank character, or the line length for a blank line.
pub fn first_non_blank(line: &str) -> usize {
    line.chars()
        .position(|ch| !ch.is_whitespace())
        .unwrap_or_else(|| line.chars().count())
}

/// Character range `[start, end)` of the run of same-class characters around `column`.
///
/// A column past the end of a non-empty line uses its last character; an empty line gives an empty
/// range at column 0.
pub fn word_bounds(line: &str, column: usize) -> (usize, usize) {
    let chars: Vec<char> = line.chars().collect();
    let Some(last) = chars.len().checked_sub(1) else {
        return (0, 0);
    };
    let column = column.min(last);
    let class = char_class(chars[column]);
    let start = chars[..column]
        .iter()
        .rposition(|&ch| char_class(ch) != class)
        .map_or(0, |index| index + 1);
    let end = chars[column..]
        .iter()
        .position(|&ch| char_class(ch) != class)
        .map_or(chars.len(), |index| column + index);
    (start, end)
}

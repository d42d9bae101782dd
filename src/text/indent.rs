//! Indentation width arithmetic.
//!
//! Widths are visual columns: a tab advances to the next multiple of the tab
//! stop, every other whitespace character is one column wide.

use crate::options::TextOptions;

/// Check if `c` counts as indentation whitespace.
#[inline]
#[must_use]
pub fn is_space(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Visual width of `c` when it starts at visual column `col`.
#[inline]
#[must_use]
pub fn space_width(c: char, col: usize, tab_stop: usize) -> usize {
    if c == '\t' {
        let tab_stop = tab_stop.max(1);
        tab_stop - col % tab_stop
    } else {
        1
    }
}

/// Visual width of the leading whitespace of `s`.
#[must_use]
pub fn indent_width(s: &str, tab_stop: usize) -> usize {
    s.chars()
        .take_while(|&c| is_space(c))
        .fold(0, |col, c| col + space_width(c, col, tab_stop))
}

/// Build whitespace of exactly `width` visual columns.
///
/// With `expand_tab` the result is all spaces, otherwise tabs fill as much
/// as possible and spaces pad the remainder.
#[must_use]
pub fn indent_string(width: usize, options: &TextOptions) -> String {
    if options.expand_tab {
        return " ".repeat(width);
    }
    let tab_stop = options.tab_stop.max(1);
    let mut s = "\t".repeat(width / tab_stop);
    s.push_str(&" ".repeat(width % tab_stop));
    s
}

/// Number of leading characters of `indent` to drop for one decrease step.
///
/// Characters are consumed until the removed width reaches `shift_width` or
/// the whitespace runs out.
#[must_use]
pub fn shift_removal(indent: &str, shift_width: usize, tab_stop: usize) -> usize {
    let mut width = 0;
    let mut count = 0;
    for c in indent.chars().take_while(|&c| is_space(c)) {
        if width >= shift_width {
            break;
        }
        width += space_width(c, width, tab_stop);
        count += 1;
    }
    count
}

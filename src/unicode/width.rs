//! Display width calculation.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::text::TextExtent;

/// Width calculation method for ambiguous-width characters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WidthMethod {
    /// POSIX-like wcwidth: ambiguous width = 1.
    #[default]
    WcWidth,
    /// Unicode East Asian Width: ambiguous width = 2.
    Unicode,
}

/// Display width of a string in terminal columns. Tabs count as zero.
#[must_use]
pub fn display_width_with_method(s: &str, method: WidthMethod) -> usize {
    match method {
        WidthMethod::WcWidth => UnicodeWidthStr::width(s),
        WidthMethod::Unicode => UnicodeWidthStr::width_cjk(s),
    }
}

/// Display width of a character in terminal columns.
///
/// ASCII printable characters take the fast path; control characters are
/// zero width.
#[inline]
#[must_use]
pub fn display_width_char_with_method(c: char, method: WidthMethod) -> usize {
    if (' '..='~').contains(&c) {
        return 1;
    }
    if c < ' ' {
        return 0;
    }
    match method {
        WidthMethod::WcWidth => UnicodeWidthChar::width(c).unwrap_or(0),
        WidthMethod::Unicode => UnicodeWidthChar::width_cjk(c).unwrap_or(0),
    }
}

/// [`TextExtent`] measuring terminal cells.
///
/// A tab advances to the next multiple of `tab_stop`, counted from the start
/// of the measured text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CharWidthExtent {
    tab_stop: usize,
    method: WidthMethod,
}

impl Default for CharWidthExtent {
    fn default() -> Self {
        Self::new(4)
    }
}

impl CharWidthExtent {
    /// Extent with the given tab stop. Zero is treated as one.
    #[must_use]
    pub fn new(tab_stop: usize) -> Self {
        Self {
            tab_stop: tab_stop.max(1),
            method: WidthMethod::default(),
        }
    }

    /// Set the ambiguous-width method (builder pattern).
    #[must_use]
    pub fn with_method(mut self, method: WidthMethod) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn tab_stop(&self) -> usize {
        self.tab_stop
    }

    #[must_use]
    pub fn method(&self) -> WidthMethod {
        self.method
    }
}

impl TextExtent for CharWidthExtent {
    fn width(&self, text: &str) -> usize {
        if !text.contains('\t') {
            return display_width_with_method(text, self.method);
        }
        text.chars().fold(0, |col, c| {
            if c == '\t' {
                col + self.tab_stop - col % self.tab_stop
            } else {
                col + display_width_char_with_method(c, self.method)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_width() {
        assert_eq!(display_width_with_method("hello", WidthMethod::WcWidth), 5);
        assert_eq!(display_width_char_with_method('a', WidthMethod::WcWidth), 1);
        assert_eq!(display_width_char_with_method('\x07', WidthMethod::WcWidth), 0);
    }

    #[test]
    fn test_cjk_width() {
        assert_eq!(display_width_with_method("漢字", WidthMethod::WcWidth), 4);
        assert_eq!(display_width_char_with_method('漢', WidthMethod::Unicode), 2);
    }

    #[test]
    fn test_width_methods() {
        // U+2460 CIRCLED DIGIT ONE is ambiguous.
        let ch = '①';
        assert_eq!(display_width_char_with_method(ch, WidthMethod::WcWidth), 1);
        assert_eq!(display_width_char_with_method(ch, WidthMethod::Unicode), 2);
    }

    #[test]
    fn test_extent_tabs() {
        let extent = CharWidthExtent::new(4);
        assert_eq!(extent.width("\t"), 4);
        assert_eq!(extent.width("ab\t"), 4);
        assert_eq!(extent.width("abcd\tx"), 9);
        assert_eq!(extent.width("漢\t"), 4);
        assert_eq!(CharWidthExtent::new(0).tab_stop(), 1);
    }

    #[test]
    fn test_extent_with_method() {
        let extent = CharWidthExtent::new(8).with_method(WidthMethod::Unicode);
        assert_eq!(extent.width("①"), 2);
        assert_eq!(extent.method(), WidthMethod::Unicode);
    }
}

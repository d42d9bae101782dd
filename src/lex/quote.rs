//! Delimited regions: strings, comments and the like.

use bitflags::bitflags;

use crate::lex::pattern::Regex;
use crate::lex::tag::LexTag;

bitflags! {
    /// Behaviour flags of a [`Quote`].
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct QuoteFlags: u8 {
        /// A backslash escapes the next character, so an escaped end
        /// delimiter does not close the quote.
        const ESCAPE = 1 << 0;
        /// An unterminated quote continues on the next line.
        const MULTI_LINE = 1 << 1;
        /// An unterminated quote continues only if the line ends with a
        /// backslash.
        const ESCAPE_EOL = 1 << 2;
    }
}

/// Back-reference marker in an end delimiter.
const BACK_REF: &str = "\\1";

/// How a quote's start delimiter is matched.
#[derive(Clone, Debug)]
pub enum QuoteStart {
    Literal(String),
    Regex(Regex),
}

/// A concrete end delimiter: literal text or an anchored regex.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuoteEnd {
    Literal(String),
    Regex(Regex),
}

impl QuoteEnd {
    /// Source text of the delimiter.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Literal(s) => s,
            Self::Regex(re) => re.pattern(),
        }
    }

    /// An empty end closes the quote at end of line.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }

    /// Byte length of the delimiter if it occurs exactly at `off`.
    fn match_at(&self, hay: &str, off: usize, ignore_case: bool) -> Option<usize> {
        match self {
            Self::Literal(s) => literal_at(hay, off, s, ignore_case),
            Self::Regex(re) => {
                let e = re.match_at(hay, off);
                (e > off).then_some(e - off)
            }
        }
    }
}

/// Result of [`Quote::match_start`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StartMatch {
    /// Offset the match was attempted at.
    pub start: usize,
    /// Offset after the start delimiter; equals `start` on no match.
    pub end: usize,
    /// End delimiter with the back-reference resolved, if the end
    /// delimiter has one.
    pub concrete_end: Option<QuoteEnd>,
}

impl StartMatch {
    fn none(off: usize) -> Self {
        Self {
            start: off,
            end: off,
            concrete_end: None,
        }
    }

    #[must_use]
    pub fn is_match(&self) -> bool {
        self.end > self.start
    }
}

/// Byte length of `pat` if `hay` has it at `off`.
fn literal_at(hay: &str, off: usize, pat: &str, ignore_case: bool) -> Option<usize> {
    let rest = hay.get(off..)?;
    if pat.is_empty() {
        return None;
    }
    if !ignore_case {
        return rest.starts_with(pat).then_some(pat.len());
    }
    let mut chars = rest.char_indices();
    for pc in pat.chars() {
        let (_, hc) = chars.next()?;
        if !hc.to_lowercase().eq(pc.to_lowercase()) {
            return None;
        }
    }
    Some(chars.next().map_or(rest.len(), |(i, _)| i))
}

/// A lexical region delimited by a start and an end.
///
/// The end delimiter is literal text unless [`Quote::with_regex_end`] makes
/// it a regex. It may contain one `\1` marker, which a regex start resolves
/// to the text of its first capture group (escaped for a regex end). An
/// empty end delimiter closes the region at end of line.
#[derive(Clone, Debug)]
pub struct Quote {
    lex: LexTag,
    start: QuoteStart,
    end_source: String,
    regex_end: bool,
    end: QuoteEnd,
    flags: QuoteFlags,
    ignore_case: bool,
}

impl Quote {
    fn build(lex: LexTag, start: QuoteStart, end: &str, flags: QuoteFlags) -> Self {
        let mut quote = Self {
            lex,
            start,
            end_source: end.to_string(),
            regex_end: false,
            end: QuoteEnd::Literal(String::new()),
            flags,
            ignore_case: false,
        };
        quote.end = quote.resolve_end("");
        quote
    }

    /// A quote with a literal start delimiter.
    #[must_use]
    pub fn literal(lex: LexTag, start: &str, end: &str, flags: QuoteFlags) -> Self {
        Self::build(lex, QuoteStart::Literal(start.to_string()), end, flags)
    }

    /// A quote whose start delimiter is a regular expression.
    #[must_use]
    pub fn regex(lex: LexTag, start: &str, end: &str, flags: QuoteFlags) -> Self {
        Self::build(lex, QuoteStart::Regex(Regex::new(start, false)), end, flags)
    }

    /// Treat the end delimiter as a regular expression (builder pattern).
    #[must_use]
    pub fn with_regex_end(mut self, regex_end: bool) -> Self {
        self.regex_end = regex_end;
        self.end = self.resolve_end("");
        self
    }

    /// Set case-insensitive matching (builder pattern).
    #[must_use]
    pub fn with_ignore_case(mut self, ignore_case: bool) -> Self {
        if let QuoteStart::Regex(re) = &self.start {
            if re.ignore_case() != ignore_case {
                self.start = QuoteStart::Regex(Regex::new(re.pattern(), ignore_case));
            }
        }
        self.ignore_case = ignore_case;
        self.end = self.resolve_end("");
        self
    }

    /// Substitute `captured` for the back-reference marker and build the
    /// concrete end delimiter.
    fn resolve_end(&self, captured: &str) -> QuoteEnd {
        if self.regex_end {
            let pattern = self.end_source.replacen(BACK_REF, &regex_lite::escape(captured), 1);
            QuoteEnd::Regex(Regex::new(&pattern, self.ignore_case))
        } else {
            QuoteEnd::Literal(self.end_source.replacen(BACK_REF, captured, 1))
        }
    }

    #[must_use]
    pub fn lex(&self) -> LexTag {
        self.lex
    }

    #[must_use]
    pub fn start(&self) -> &QuoteStart {
        &self.start
    }

    /// End delimiter used when the start does not resolve a back-reference.
    #[must_use]
    pub fn end(&self) -> &QuoteEnd {
        &self.end
    }

    #[must_use]
    pub fn flags(&self) -> QuoteFlags {
        self.flags
    }

    #[must_use]
    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    /// Match the start delimiter exactly at byte offset `off`.
    #[must_use]
    pub fn match_start(&self, line: &str, off: usize) -> StartMatch {
        match &self.start {
            QuoteStart::Literal(start) => match literal_at(line, off, start, self.ignore_case) {
                Some(len) => StartMatch {
                    start: off,
                    end: off + len,
                    concrete_end: None,
                },
                None => StartMatch::none(off),
            },
            QuoteStart::Regex(re) => {
                let Some(caps) = re.captures_at(line, off) else {
                    return StartMatch::none(off);
                };
                let end = caps.get(0).map_or(off, |m| off + m.end());
                let concrete_end = self.end_source.contains(BACK_REF).then(|| {
                    self.resolve_end(caps.get(1).map_or("", |m| m.as_str()))
                });
                StartMatch {
                    start: off,
                    end,
                    concrete_end,
                }
            }
        }
    }

    /// Find the end delimiter `end` at or after byte offset `off`.
    ///
    /// Returns the offset after the delimiter, or `None` if the line does not
    /// close the quote.
    #[must_use]
    pub fn match_end(&self, line: &str, off: usize, end: &QuoteEnd) -> Option<usize> {
        if end.is_empty() {
            return None;
        }
        let rest = line.get(off..)?;
        let escape = self.flags.contains(QuoteFlags::ESCAPE);
        let mut chars = rest.char_indices();
        while let Some((i, c)) = chars.next() {
            if let Some(len) = end.match_at(rest, i, self.ignore_case) {
                return Some(off + i + len);
            }
            if escape && c == '\\' {
                chars.next();
            }
        }
        None
    }

    /// Whether an unterminated quote on `line` stays open on the next line.
    #[must_use]
    pub fn continues_after(&self, line: &str) -> bool {
        self.flags.contains(QuoteFlags::MULTI_LINE)
            || (self.flags.contains(QuoteFlags::ESCAPE_EOL) && line.ends_with('\\'))
    }
}

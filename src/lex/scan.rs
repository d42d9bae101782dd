//! Line scanning and incremental highlighting.

use crate::lex::pattern::Regex;
use crate::lex::quote::{Quote, QuoteEnd};
use crate::lex::tag::LexTag;
use crate::text::{BufferListener, ChangeKind, LexElement, LineChange, TextBuffer};

/// Ordered lexical rules of one file type.
///
/// Quotes are tried before token regexes; within each list the first rule
/// that matches wins.
#[derive(Clone, Debug, Default)]
pub struct LexRules {
    pub quotes: Vec<Quote>,
    pub regexes: Vec<(Regex, LexTag)>,
}

impl LexRules {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a quote rule (builder pattern).
    #[must_use]
    pub fn with_quote(mut self, quote: Quote) -> Self {
        self.quotes.push(quote);
        self
    }

    /// Add a token rule (builder pattern).
    #[must_use]
    pub fn with_regex(mut self, pattern: &str, ignore_case: bool, lex: LexTag) -> Self {
        self.regexes.push((Regex::new(pattern, ignore_case), lex));
        self
    }
}

/// Scanner state carried from the end of one line to the next.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LexState {
    #[default]
    Normal,
    /// Inside quote number `quote`, waiting for `end` (the resolved end
    /// delimiter, or the quote's own when `None`).
    InQuote { quote: usize, end: Option<QuoteEnd> },
}

/// Maps increasing byte offsets of one string to char offsets.
struct ColCounter<'a> {
    s: &'a str,
    byte: usize,
    col: usize,
}

impl<'a> ColCounter<'a> {
    fn new(s: &'a str) -> Self {
        Self { s, byte: 0, col: 0 }
    }

    fn col(&mut self, byte: usize) -> usize {
        debug_assert!(byte >= self.byte);
        self.col += self.s[self.byte..byte].chars().count();
        self.byte = byte;
        self.col
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Splits lines into lex elements.
#[derive(Clone, Debug, Default)]
pub struct Scanner {
    rules: LexRules,
}

impl Scanner {
    #[must_use]
    pub fn new(rules: LexRules) -> Self {
        Self { rules }
    }

    #[must_use]
    pub fn rules(&self) -> &LexRules {
        &self.rules
    }

    /// Scan `line` starting in `state`. Returns the elements (char offsets)
    /// and the state at end of line.
    #[must_use]
    pub fn scan_line(&self, line: &str, state: &LexState) -> (Vec<LexElement>, LexState) {
        let mut elements = Vec::new();
        let mut cols = ColCounter::new(line);
        let mut push = |from: usize, to: usize, lex: LexTag, cols: &mut ColCounter<'_>| {
            if to > from {
                let begin = cols.col(from);
                let end = cols.col(to);
                elements.push(LexElement::new(begin, end - begin, lex));
            }
        };

        let len = line.len();
        let mut off = 0;

        if let LexState::InQuote { quote, end } = state {
            if let Some(q) = self.rules.quotes.get(*quote) {
                let end_pat = end.as_ref().unwrap_or(q.end());
                if let Some(e) = q.match_end(line, 0, end_pat) {
                    push(0, e, q.lex(), &mut cols);
                    off = e;
                } else {
                    push(0, len, q.lex(), &mut cols);
                    let next = if q.continues_after(line) {
                        state.clone()
                    } else {
                        LexState::Normal
                    };
                    return (elements, next);
                }
            }
        }

        while off < len {
            let started = self
                .rules
                .quotes
                .iter()
                .enumerate()
                .map(|(i, q)| (i, q, q.match_start(line, off)))
                .find(|(_, _, m)| m.is_match());
            if let Some((i, q, m)) = started {
                let end_pat = m.concrete_end.as_ref().unwrap_or(q.end());
                if let Some(e) = q.match_end(line, m.end, end_pat) {
                    push(off, e, q.lex(), &mut cols);
                    off = e;
                    continue;
                }
                push(off, len, q.lex(), &mut cols);
                let next = if q.continues_after(line) {
                    LexState::InQuote {
                        quote: i,
                        end: m.concrete_end,
                    }
                } else {
                    LexState::Normal
                };
                return (elements, next);
            }

            let token = self.rules.regexes.iter().find_map(|(re, lex)| {
                let e = re.match_at(line, off);
                (e > off).then_some((e, *lex))
            });
            if let Some((e, lex)) = token {
                push(off, e, lex, &mut cols);
                off = e;
                continue;
            }

            // Skip an identifier run or a single char.
            let rest = &line[off..];
            off += match rest.chars().next() {
                Some(c) if is_word_char(c) => rest
                    .char_indices()
                    .find(|&(_, c)| !is_word_char(c))
                    .map_or(rest.len(), |(i, _)| i),
                Some(c) => c.len_utf8(),
                None => rest.len().max(1),
            };
        }

        (elements, LexState::Normal)
    }
}

/// Keeps the lex elements of a buffer up to date.
///
/// Attach it as a listener so edits mark lines dirty, then call
/// [`Highlighter::update`] to rescan. Rescanning continues past the last
/// changed line until a line's end state is known and unchanged.
#[derive(Debug)]
pub struct Highlighter {
    scanner: Scanner,
    /// End state per line; `None` until the line has been scanned.
    states: Vec<Option<LexState>>,
    dirty: Option<(usize, usize)>,
}

impl Highlighter {
    /// Create a highlighter with every line of `buffer` dirty.
    #[must_use]
    pub fn new(rules: LexRules, buffer: &TextBuffer) -> Self {
        let count = buffer.line_count();
        Self {
            scanner: Scanner::new(rules),
            states: vec![None; count],
            dirty: Some((1, count)),
        }
    }

    #[must_use]
    pub fn scanner(&self) -> &Scanner {
        &self.scanner
    }

    /// State at the end of line `ln`, as of the last update.
    #[must_use]
    pub fn end_state(&self, ln: usize) -> Option<&LexState> {
        ln.checked_sub(1)
            .and_then(|i| self.states.get(i))
            .and_then(Option::as_ref)
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty.is_some()
    }

    fn mark(&mut self, first: usize, last: usize) {
        self.dirty = Some(match self.dirty {
            Some((from, to)) => (from.min(first), to.max(last)),
            None => (first, last),
        });
    }

    /// Rescan dirty lines and write their elements back to `buffer`.
    /// Returns the number of lines scanned.
    pub fn update(&mut self, buffer: &mut TextBuffer) -> usize {
        let Some((from, to)) = self.dirty.take() else {
            return 0;
        };
        let count = buffer.line_count();
        self.states.resize(count, None);

        let mut scanned = 0;
        for ln in from.max(1)..=count {
            let prev = match ln.checked_sub(2).and_then(|i| self.states[i].as_ref()) {
                Some(state) => state.clone(),
                None => LexState::Normal,
            };
            let (elements, state) = self.scanner.scan_line(buffer.line_data(ln), &prev);
            buffer.set_lex_elements(ln, elements);
            scanned += 1;

            let unchanged = self.states[ln - 1].as_ref() == Some(&state);
            self.states[ln - 1] = Some(state);
            if unchanged && ln >= to {
                break;
            }
        }
        scanned
    }
}

impl BufferListener for Highlighter {
    fn on_buffer_change(&mut self, buffer: &TextBuffer, change: &LineChange) {
        let LineChange { kind, lines } = *change;
        match kind {
            ChangeKind::Insert => {
                let at = (lines.first - 1).min(self.states.len());
                self.states
                    .splice(at..at, std::iter::repeat_n(None, lines.count()));
                if let Some((_, to)) = &mut self.dirty {
                    if *to >= lines.first {
                        *to += lines.count();
                    }
                }
                self.mark(lines.first, lines.last);
            }
            ChangeKind::Delete => {
                let at = (lines.first - 1).min(self.states.len());
                let end = lines.last.min(self.states.len());
                self.states.drain(at..end.max(at));
                if let Some((_, to)) = &mut self.dirty {
                    if *to > lines.last {
                        *to -= lines.count();
                    } else if *to >= lines.first {
                        *to = lines.first;
                    }
                }
                self.mark(lines.first, lines.first);
            }
            ChangeKind::Update => self.mark(lines.first, lines.last),
            ChangeKind::Bulk => {
                self.states = vec![None; buffer.line_count()];
                self.dirty = Some((1, buffer.line_count()));
            }
        }
    }
}

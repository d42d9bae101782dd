//! Lexical classification of buffer lines.
//!
//! A file type is described by [`LexRules`]: delimited regions ([`Quote`])
//! and single-token patterns ([`Regex`]). A [`Scanner`] turns one line into
//! [`LexElement`](crate::text::LexElement)s, carrying a [`LexState`] across
//! lines for multi-line regions. A [`Highlighter`] drives the scanner
//! incrementally as the buffer changes.
//!
//! Rules with malformed patterns never match; the affected text is simply
//! left unclassified.

mod pattern;
mod quote;
mod scan;
mod tag;

pub use pattern::Regex;
pub use quote::{Quote, QuoteEnd, QuoteFlags, QuoteStart, StartMatch};
pub use scan::{Highlighter, LexRules, LexState, Scanner};
pub use tag::{LexMajor, LexTag, minor};

//! `textcore` - line-oriented text editing core
//!
//! A line buffer with undoable editing actions, a quote/regex lexer for
//! syntax classification, a soft line-wrap helper and find/replace with a
//! background batch worker.

// Crate-level lint configuration
#![allow(clippy::module_name_repetitions)] // Allow text::TextBuffer etc
#![allow(clippy::missing_errors_doc)] // Docs WIP
#![allow(clippy::missing_panics_doc)] // Docs WIP
#![allow(clippy::missing_const_for_fn)] // Many functions could be const, not critical
#![allow(clippy::doc_markdown)] // Allow technical names without backticks
#![allow(clippy::use_self)] // Allow explicit type names in impl blocks
#![allow(clippy::needless_pass_by_value)] // Allow pass by value for small Copy types
#![allow(clippy::collapsible_if)] // Sometimes nested ifs are clearer
#![allow(clippy::cast_possible_wrap)] // Line counts fit in isize
#![allow(clippy::items_after_statements)] // Common pattern in tests
#![allow(clippy::redundant_clone)] // Clones in tests for clarity are fine
#![allow(clippy::semicolon_if_nothing_returned)] // Style preference

pub mod error;
pub mod lex;
pub mod log;
pub mod options;
pub mod search;
pub mod text;
pub mod unicode;

// Re-export core types at crate root
pub use error::{Error, Result};
pub use log::{LogLevel, clear_log_callback, emit_log, set_log_callback};
pub use options::{FileFormat, TextOptions};

pub use lex::{Highlighter, LexRules, LexTag, Quote, QuoteFlags, Scanner};
pub use search::{BatchEvent, BatchJob, BatchWorker, FindFlags, Finder, ReplacedBuffers};
pub use text::{Action, BufferListener, TextBuffer, TextPoint, TextRange, WrapHelper};
pub use unicode::{CharWidthExtent, WidthMethod};

//! Line buffer, reversible edits and soft wrapping.
//!
//! Key types:
//!
//! - [`TextBuffer`]: ordered lines with edit primitives, undo/redo history
//!   and change notifications
//! - [`Action`]: a reversible edit executed through [`TextBuffer::execute`]
//! - [`WrapHelper`]: per-line wrap offsets kept in step with the buffer
//!
//! # Examples
//!
//! ```
//! use textcore::options::TextOptions;
//! use textcore::text::{Action, TextBuffer, TextPoint};
//!
//! let mut buffer = TextBuffer::from_text("abc\ndef", TextOptions::default());
//! let caret = buffer.execute(Action::insert_string(TextPoint::new(1, 1), "X"));
//! assert_eq!(buffer.line_data(1), "aXbc");
//! assert_eq!(caret, TextPoint::new(1, 2));
//!
//! assert_eq!(buffer.undo(), Some(TextPoint::new(1, 1)));
//! assert_eq!(buffer.text(), "abc\ndef");
//! ```

mod action;
mod buffer;
mod history;
pub mod indent;
mod line;
mod point;
mod wrap;

pub use action::{Action, ActionKind, DeletedText, IndentChange, RangeAction};
pub use buffer::{BufferId, BufferListener, BufferSnapshot, ChangeKind, LineChange, TextBuffer};
pub use line::{LexElement, TextLine};
pub use point::{CharRange, LineRange, Seek, TextDelta, TextDir, TextPoint, TextRange, TextUnit};
pub use wrap::{TextExtent, WrapHelper, WrapInfo, wrap_line_by_char};

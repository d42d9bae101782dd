//! Property-based tests for indent actions.

mod common;

use common::lines;
use proptest::prelude::*;
use textcore::text::TextDir;
use textcore::{Action, TextBuffer, TextOptions, TextPoint, TextRange};

/// Lines with tab, space or mixed leading whitespace.
fn indented_line() -> impl Strategy<Value = String> {
    ("[ \\t]{0,6}", "[a-z{} ]{0,8}").prop_map(|(indent, body)| format!("{indent}{body}"))
}

fn options() -> impl Strategy<Value = TextOptions> {
    (prop::sample::select(vec![1usize, 4, 8]), 1usize..9, any::<bool>()).prop_map(
        |(tab_stop, shift_width, expand_tab)| {
            TextOptions::default()
                .with_tab_stop(tab_stop)
                .with_shift_width(shift_width)
                .with_expand_tab(expand_tab)
        },
    )
}

fn whole(buf: &TextBuffer) -> TextRange {
    TextRange::new(TextPoint::new(1, 0), buf.end_point())
}

proptest! {
    /// Increase then decrease restores the original whitespace bytes.
    #[test]
    fn increase_then_decrease_restores_bytes(
        input in prop::collection::vec(indented_line(), 1..8),
        options in options(),
    ) {
        let mut buf = TextBuffer::from_text(&input.join("\n"), options);
        let original = lines(&buf);

        buf.execute(Action::increase_indent(whole(&buf), TextDir::Forward, true));
        buf.execute(Action::decrease_indent(whole(&buf), TextDir::Forward, true));
        prop_assert_eq!(lines(&buf), original);
    }

    /// Undoing a decrease restores the exact whitespace removed.
    #[test]
    fn decrease_undo_restores_bytes(
        input in prop::collection::vec(indented_line(), 1..8),
        options in options(),
    ) {
        let mut buf = TextBuffer::from_text(&input.join("\n"), options);
        let original = lines(&buf);

        buf.execute(Action::decrease_indent(whole(&buf), TextDir::Forward, true));
        buf.undo();
        prop_assert_eq!(lines(&buf), original);
    }

    /// Auto-indent undoes byte-for-byte.
    #[test]
    fn auto_indent_undo_restores_bytes(
        input in prop::collection::vec(indented_line(), 1..8),
        options in options(),
    ) {
        let mut buf = TextBuffer::from_text(&input.join("\n"), options);
        let original = lines(&buf);

        buf.execute(Action::auto_indent(whole(&buf), TextDir::Forward, true));
        buf.undo();
        prop_assert_eq!(lines(&buf), original);
    }
}

#[test]
fn selection_follows_shifted_text() {
    let options = TextOptions::default()
        .with_tab_stop(8)
        .with_shift_width(4)
        .with_expand_tab(false);
    let mut buf = TextBuffer::from_text("\tab\n    cd", options);
    let range = TextRange::new(TextPoint::new(1, 2), TextPoint::new(2, 5));

    let (caret, selection) =
        buf.execute_with_selection(Action::increase_indent(range, TextDir::Forward, true));
    assert_eq!(lines(&buf), vec!["    \tab", "        cd"]);
    assert_eq!(caret, TextPoint::new(2, 9));
    assert_eq!(
        selection,
        Some(TextRange::new(TextPoint::new(1, 6), TextPoint::new(2, 9)))
    );

    let (_, selection) =
        buf.execute_with_selection(Action::decrease_indent(selection.unwrap(), TextDir::Forward, true));
    assert_eq!(lines(&buf), vec!["\tab", "    cd"]);
    assert_eq!(selection, Some(range));
}

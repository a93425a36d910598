//! Minimal spoken feedback for value and selection changes.
//!
//! The goal is to say exactly what changed and nothing more: a single
//! keystroke speaks one character, a completed word speaks the word, a
//! selection change speaks the delta. Everything here is a pure function
//! of two snapshots; the tracker supplies them.

use crate::control::TextControl;
use crate::state::{EditableState, clamp_to_char_boundary};
use unicode_segmentation::UnicodeSegmentation as _;

/// Values at or under this many characters are spoken in full when the
/// edit pattern is too tangled to isolate a span.
const SHORT_VALUE_CHARS: usize = 30;

/// How the visual cursor is drawn; decides which character a one-step
/// cursor move announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorStyle {
    /// Block cursor sits on a character: speak the character to the right
    /// of the new position.
    Block,
    /// I-beam sits between characters: speak whichever character the
    /// cursor crossed.
    #[default]
    IBeam,
}

/// Feedback for a selection change with an unchanged value.
pub fn describe_selection_changed(
    control: &dyn TextControl,
    old: &EditableState,
    new: &EditableState,
    style: CursorStyle,
) -> Option<String> {
    if new.is_password {
        return None;
    }
    let value = new.value.as_str();

    if new.is_collapsed() {
        if !old.is_collapsed() {
            return Some("Unselected.".to_owned());
        }
        let old_line = control.line_index(value, old.sel_start);
        let new_line = control.line_index(value, new.sel_start);
        if old_line != new_line {
            let line = &value[control.line_bounds(value, new_line)];
            return Some(if line.is_empty() {
                "blank".to_owned()
            } else {
                line.to_owned()
            });
        }
        let lo = old.sel_start.min(new.sel_start);
        let hi = old.sel_start.max(new.sel_start);
        if lo == hi {
            return None;
        }
        let crossed = &value[lo..hi];
        if crossed.chars().count() == 1 {
            let spoken = match style {
                CursorStyle::Block => char_right_of(value, new.sel_start)
                    .map_or_else(|| spoken_span(crossed), spoken_char),
                CursorStyle::IBeam => {
                    crossed.chars().next().map(spoken_char).unwrap_or_default()
                }
            };
            return Some(spoken);
        }
        return Some(spoken_span(crossed));
    }

    // The selection now covers a range.
    if let Some(suggestion) = new.trailing_suggestion()
        && old.is_collapsed()
        && old.sel_start == new.sel_start
    {
        // Autocomplete filled in the tail and left it selected: phrase it
        // as "what you typed, what it suggests".
        let typed = &value[..new.sel_start];
        return Some(format!("{typed}, {suggestion}"));
    }
    if old.sel_start == new.sel_start && old.sel_end != new.sel_end {
        return Some(if new.sel_end > old.sel_end {
            format!("{}, added to selection", spoken_span(&value[old.sel_end..new.sel_end]))
        } else {
            format!("{}, removed from selection", spoken_span(&value[new.sel_end..old.sel_end]))
        });
    }
    if old.sel_end == new.sel_end && old.sel_start != new.sel_start {
        return Some(if new.sel_start < old.sel_start {
            format!("{}, added to selection", spoken_span(&value[new.sel_start..old.sel_start]))
        } else {
            format!("{}, removed from selection", spoken_span(&value[old.sel_start..new.sel_start]))
        });
    }
    // Both ends moved at once (select-all and friends).
    Some(format!("{}, selected", spoken_span(new.selected_text())))
}

/// Feedback for a value change.
pub fn describe_text_changed(old: &EditableState, new: &EditableState) -> Option<String> {
    if new.is_password || old.is_password {
        // Never reveal content; a masking placeholder is all the feedback
        // a password field produces.
        return Some("*".to_owned());
    }

    // Strip a trailing autocomplete suggestion before diffing so the
    // suggested tail is not narrated as typed text.
    let (new_value, suggestion) = match new.trailing_suggestion() {
        Some(suggestion) => (&new.value[..new.sel_start], Some(suggestion)),
        None => (new.value.as_str(), None),
    };
    let old_value = match old.trailing_suggestion() {
        Some(_) => &old.value[..old.sel_start],
        None => old.value.as_str(),
    };

    let core = if new_value == old_value {
        None
    } else {
        // Anchor 1: typed/pasted text replaced the previous selection (or
        // landed at the caret). Anchor 2: characters deleted from one edge
        // of the new cursor. Either isolates the exact edited span.
        let old_prefix = old.sel_start.min(old_value.len());
        let old_suffix = old_value.len() - old.sel_end.min(old_value.len());
        let (new_cursor_start, new_cursor_end) = if suggestion.is_some() {
            (new_value.len(), new_value.len())
        } else {
            (new.sel_start.min(new_value.len()), new.sel_end.min(new_value.len()))
        };
        let new_prefix = new_cursor_start;
        let new_suffix = new_value.len() - new_cursor_end;

        let anchored = span_anchored(old_value, new_value, old_prefix, old_suffix)
            .or_else(|| span_anchored(old_value, new_value, new_prefix, new_suffix));
        match anchored {
            Some((prefix, suffix)) => narrate_edit_at_selection(old_value, new_value, prefix, suffix),
            None => narrate_generic(old_value, new_value),
        }
    };

    match (core, suggestion) {
        (Some(core), Some(suggestion)) => Some(format!("{core}, {suggestion}")),
        (Some(core), None) => Some(core),
        (None, Some(suggestion)) => {
            let typed = &new.value[..new.sel_start];
            Some(format!("{typed}, {suggestion}"))
        }
        (None, None) => None,
    }
}

/// Validate that the values agree outside `prefix..len-suffix` on both
/// sides; the edit then lies entirely inside that window.
fn span_anchored(
    old_value: &str,
    new_value: &str,
    prefix: usize,
    suffix: usize,
) -> Option<(usize, usize)> {
    if new_value.len() < prefix + suffix || old_value.len() < prefix + suffix {
        return None;
    }
    let heads_match = new_value.get(..prefix)? == old_value.get(..prefix)?;
    let tails_match =
        new_value.get(new_value.len() - suffix..)? == old_value.get(old_value.len() - suffix..)?;
    (heads_match && tails_match).then_some((prefix, suffix))
}

/// The edit happened exactly at the previous selection: characters were
/// typed/pasted over it or deleted from one edge. Narrate only that span.
fn narrate_edit_at_selection(
    old_value: &str,
    new_value: &str,
    prefix: usize,
    suffix: usize,
) -> Option<String> {
    let deleted = &old_value[prefix..old_value.len() - suffix];
    let inserted = &new_value[prefix..new_value.len() - suffix];
    match (inserted.is_empty(), deleted.is_empty()) {
        (true, true) => None,
        (true, false) => Some(format!("{}, deleted", spoken_span(deleted))),
        (false, true) if inserted.chars().count() == 1 => {
            narrate_single_char_insert(new_value, prefix, inserted)
        }
        (false, _) => Some(spoken_span(inserted)),
    }
}

/// A single typed character. A word-break character completes the word
/// before it; speak that word rather than isolated punctuation.
fn narrate_single_char_insert(new_value: &str, at: usize, inserted: &str) -> Option<String> {
    let ch = inserted.chars().next()?;
    if !ch.is_alphanumeric()
        && let Some(word) = new_value[..at].unicode_words().last()
    {
        return Some(word.to_owned());
    }
    Some(spoken_char(ch))
}

/// Fallback for edits that do not line up with the previous selection:
/// speak short values whole, otherwise a word-boundary-aligned span.
fn narrate_generic(old_value: &str, new_value: &str) -> Option<String> {
    if new_value.is_empty() {
        return Some(format!("{}, deleted", spoken_span(old_value)));
    }
    if new_value.chars().count() <= SHORT_VALUE_CHARS {
        return Some(new_value.to_owned());
    }

    let prefix = common_prefix_len(old_value, new_value);
    let max_suffix = old_value.len().min(new_value.len()) - prefix;
    let suffix = common_suffix_len(old_value, new_value, max_suffix);

    let start = word_start_before(new_value, prefix);
    let end = word_end_after(new_value, new_value.len() - suffix);
    if start < end {
        return Some(spoken_span(&new_value[start..end]));
    }
    let deleted_start = word_start_before(old_value, prefix);
    let deleted_end = word_end_after(old_value, old_value.len() - suffix);
    if deleted_start < deleted_end {
        return Some(format!("{}, deleted", spoken_span(&old_value[deleted_start..deleted_end])));
    }
    None
}

fn common_prefix_len(left: &str, right: &str) -> usize {
    let mut len = 0;
    for (lch, rch) in left.chars().zip(right.chars()) {
        if lch != rch {
            break;
        }
        len += lch.len_utf8();
    }
    len
}

/// Longest common suffix in bytes, capped so it cannot overlap the prefix.
fn common_suffix_len(left: &str, right: &str, max: usize) -> usize {
    let mut len = 0;
    for (lch, rch) in left.chars().rev().zip(right.chars().rev()) {
        if lch != rch || len + lch.len_utf8() > max {
            break;
        }
        len += lch.len_utf8();
    }
    len
}

fn word_start_before(text: &str, pos: usize) -> usize {
    let pos = clamp_to_char_boundary(text, pos);
    text.split_word_bound_indices()
        .map(|(index, _)| index)
        .take_while(|index| *index <= pos)
        .last()
        .unwrap_or(0)
}

fn word_end_after(text: &str, pos: usize) -> usize {
    let pos = clamp_to_char_boundary(text, pos);
    text.split_word_bound_indices()
        .map(|(index, word)| index + word.len())
        .find(|end| *end >= pos)
        .unwrap_or(text.len())
}

fn char_right_of(value: &str, pos: usize) -> Option<char> {
    value.get(pos..)?.chars().next()
}

/// Speakable rendering of one character.
fn spoken_char(ch: char) -> String {
    match ch {
        ' ' => "space".to_owned(),
        '\n' => "new line".to_owned(),
        '\t' => "tab".to_owned(),
        other => other.to_string(),
    }
}

/// Speakable rendering of a span; whitespace-only spans get named.
fn spoken_span(span: &str) -> String {
    let mut chars = span.chars();
    match (chars.next(), chars.next()) {
        (Some(only), None) => spoken_char(only),
        _ => span.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{MultiLineControl, SingleLineControl};
    use dom::Document;

    fn single_line() -> SingleLineControl {
        SingleLineControl::new(Document::new().root())
    }

    fn state(value: &str, start: usize, end: usize) -> EditableState {
        EditableState::new(value, start, end, false)
    }

    #[test]
    fn single_keystroke_speaks_one_char() {
        let old = state("abc", 3, 3);
        let new = state("abcd", 4, 4);
        assert_eq!(describe_text_changed(&old, &new).as_deref(), Some("d"));
    }

    #[test]
    fn space_completes_a_word() {
        let old = state("hello", 5, 5);
        let new = state("hello ", 6, 6);
        assert_eq!(describe_text_changed(&old, &new).as_deref(), Some("hello"));
    }

    #[test]
    fn backspace_speaks_deleted_char() {
        let old = state("abcd", 4, 4);
        let new = state("abc", 3, 3);
        assert_eq!(describe_text_changed(&old, &new).as_deref(), Some("d, deleted"));
    }

    #[test]
    fn replacing_selection_speaks_inserted_span() {
        let old = state("one two three", 4, 7);
        let new = state("one TWO three", 7, 7);
        assert_eq!(describe_text_changed(&old, &new).as_deref(), Some("TWO"));
    }

    #[test]
    fn short_value_spoken_in_full_on_tangled_edit() {
        let old = state("alpha beta", 0, 0);
        let new = state("gamma delta", 11, 11);
        assert_eq!(
            describe_text_changed(&old, &new).as_deref(),
            Some("gamma delta")
        );
    }

    #[test]
    fn long_value_gets_word_aligned_span() {
        let old = state(
            "the quick brown fox jumps over the lazy dog near the river",
            0,
            0,
        );
        let new = state(
            "the quick brown cat jumps over the lazy dog near the river",
            0,
            0,
        );
        assert_eq!(describe_text_changed(&old, &new).as_deref(), Some("cat"));
    }

    #[test]
    fn password_changes_are_masked() {
        let old = EditableState::new("secret", 6, 6, true);
        let new = EditableState::new("secrets", 7, 7, true);
        assert_eq!(describe_text_changed(&old, &new).as_deref(), Some("*"));
    }

    #[test]
    fn autocomplete_suffix_is_stripped_and_phrased() {
        let old = state("mon", 3, 3);
        // Autocomplete fills "monday", leaving "day" selected.
        let new = state("monday", 3, 6);
        assert_eq!(
            describe_text_changed(&old, &new).as_deref(),
            Some("mon, day")
        );
    }

    #[test]
    fn collapse_to_cursor_says_unselected() {
        let control = single_line();
        let old = state("hello world", 0, 5);
        let new = state("hello world", 8, 8);
        assert_eq!(
            describe_selection_changed(&control, &old, &new, CursorStyle::IBeam).as_deref(),
            Some("Unselected.")
        );
    }

    #[test]
    fn one_char_cursor_move_speaks_crossed_char() {
        let control = single_line();
        let old = state("abc", 1, 1);
        let new = state("abc", 2, 2);
        assert_eq!(
            describe_selection_changed(&control, &old, &new, CursorStyle::IBeam).as_deref(),
            Some("b")
        );
        assert_eq!(
            describe_selection_changed(&control, &old, &new, CursorStyle::Block).as_deref(),
            Some("c")
        );
    }

    #[test]
    fn multi_char_move_speaks_crossed_span() {
        let control = single_line();
        let old = state("hello world", 0, 0);
        let new = state("hello world", 5, 5);
        assert_eq!(
            describe_selection_changed(&control, &old, &new, CursorStyle::IBeam).as_deref(),
            Some("hello")
        );
    }

    #[test]
    fn line_move_speaks_new_line() {
        let doc = Document::new();
        let control = MultiLineControl::new(doc.root());
        let value = "one\ntwo";
        let old = state(value, 0, 0);
        let new = state(value, 4, 4);
        assert_eq!(
            describe_selection_changed(&control, &old, &new, CursorStyle::IBeam).as_deref(),
            Some("two")
        );
    }

    #[test]
    fn selection_growth_speaks_delta() {
        let control = single_line();
        let old = state("hello world", 0, 5);
        let new = state("hello world", 0, 8);
        assert_eq!(
            describe_selection_changed(&control, &old, &new, CursorStyle::IBeam).as_deref(),
            Some(" wo, added to selection")
        );

        let shrunk = state("hello world", 0, 3);
        assert_eq!(
            describe_selection_changed(&control, &old, &shrunk, CursorStyle::IBeam).as_deref(),
            Some("lo, removed from selection")
        );
    }
}

//! Cursor movement actions: granularity stepping, wrapping search, table
//! navigation.

use dom::{Document, NavPredicate, NodeId};
use log::debug;
use pipeline::{Granularity, SessionState};
use std::ops::Range;

/// What a movement action produced.
#[derive(Debug, Default)]
pub struct MoveOutcome {
    /// Annotation spoken before the landing description ("Wrapped to top.").
    pub prefix: Option<&'static str>,
    /// Spoken error; when set, the action failed and nothing moved.
    pub error: Option<String>,
    /// Sub-node text to speak instead of the full node description.
    pub spoken_text: Option<String>,
}

impl MoveOutcome {
    fn moved() -> Self {
        Self::default()
    }

    fn wrapped(reversed: bool) -> Self {
        Self {
            prefix: Some(if reversed {
                "Wrapped to bottom."
            } else {
                "Wrapped to top."
            }),
            ..Self::default()
        }
    }

    fn text(text: String) -> Self {
        Self {
            spoken_text: Some(text),
            ..Self::default()
        }
    }

    fn fail(error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }
}

/// Step by the given granularity in the cursor's current direction.
pub fn step(session: &mut SessionState, granularity: Granularity, reversed: bool) -> MoveOutcome {
    match granularity {
        Granularity::Object => step_object(session, reversed),
        Granularity::Group => step_group(session, reversed),
        Granularity::Character | Granularity::Word | Granularity::Sentence | Granularity::Line => {
            step_within_text(session, granularity, reversed)
        }
    }
}

fn step_object(session: &mut SessionState, reversed: bool) -> MoveOutcome {
    let next = {
        let SessionState {
            walker,
            document,
            cursor,
            ..
        } = session;
        walker.step(document, cursor.node, reversed)
    };
    if let Some(node) = next {
        session.cursor.sync_to(&session.document, node);
        return MoveOutcome::moved();
    }
    wrap_to_edge(session, reversed)
}

/// Group movement leaves the current container: keep stepping until the
/// parent changes.
fn step_group(session: &mut SessionState, reversed: bool) -> MoveOutcome {
    let landing = {
        let SessionState {
            walker,
            document,
            cursor,
            ..
        } = session;
        let current_parent = cursor.node.and_then(|node| document.parent(node));
        let mut candidate = walker.step(document, cursor.node, reversed);
        while let Some(node) = candidate {
            if document.parent(node) != current_parent {
                break;
            }
            candidate = walker.step(document, Some(node), reversed);
        }
        candidate
    };
    if let Some(node) = landing {
        session.cursor.sync_to(&session.document, node);
        return MoveOutcome::moved();
    }
    wrap_to_edge(session, reversed)
}

fn wrap_to_edge(session: &mut SessionState, reversed: bool) -> MoveOutcome {
    let edge = {
        let SessionState {
            walker, document, ..
        } = session;
        walker.step(document, None, reversed)
    };
    match edge {
        Some(node) => {
            debug!("navigation wrapped ({})", if reversed { "to bottom" } else { "to top" });
            session.cursor.sync_to(&session.document, node);
            MoveOutcome::wrapped(reversed)
        }
        None => MoveOutcome::fail("Nothing to navigate.".to_owned()),
    }
}

/// Character/word/sentence/line movement inside the current node's text;
/// crossing the text edge falls over to object movement.
fn step_within_text(
    session: &mut SessionState,
    granularity: Granularity,
    reversed: bool,
) -> MoveOutcome {
    let Some(node) = session.cursor.node else {
        return step_object(session, reversed);
    };
    let text = session.document.text_content(node);
    if text.is_empty() {
        return step_object(session, reversed);
    }
    let units = unit_ranges(&text, granularity);
    if units.is_empty() {
        return step_object(session, reversed);
    }
    let offset = session.cursor.text_offset.min(text.len());
    let position = units.iter().position(|range| range.contains(&offset))
        .or_else(|| units.iter().position(|range| range.start >= offset));

    let target = match (position, reversed) {
        (Some(index), false) if index + 1 < units.len() => Some(index + 1),
        (Some(index), true) if index > 0 => Some(index - 1),
        (None, false) => Some(0),
        _ => None,
    };
    match target {
        Some(index) => {
            session.cursor.text_offset = units[index].start;
            MoveOutcome::text(text[units[index].clone()].to_owned())
        }
        // Edge of the node's text: move to the neighboring object.
        None => step_object(session, reversed),
    }
}

/// Split text into navigation units for a sub-node granularity.
fn unit_ranges(text: &str, granularity: Granularity) -> Vec<Range<usize>> {
    match granularity {
        Granularity::Character => text
            .char_indices()
            .map(|(index, ch)| index..index + ch.len_utf8())
            .collect(),
        Granularity::Word => split_runs(text, |ch| !ch.is_whitespace()),
        Granularity::Sentence => split_sentences(text),
        _ => vec![0..text.len()],
    }
}

/// Ranges of maximal runs of characters matching `keep`.
fn split_runs(text: &str, keep: impl Fn(char) -> bool) -> Vec<Range<usize>> {
    let mut out = Vec::new();
    let mut start = None;
    for (index, ch) in text.char_indices() {
        if keep(ch) {
            if start.is_none() {
                start = Some(index);
            }
        } else if let Some(begin) = start.take() {
            out.push(begin..index);
        }
    }
    if let Some(begin) = start {
        out.push(begin..text.len());
    }
    out
}

/// Terminator-delimited sentences: a run ending at `.`, `!` or `?`.
fn split_sentences(text: &str) -> Vec<Range<usize>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut prev_was_terminator = false;
    for (index, ch) in text.char_indices() {
        if prev_was_terminator && ch.is_whitespace() {
            out.push(start..index);
            start = index + ch.len_utf8();
        }
        prev_was_terminator = matches!(ch, '.' | '!' | '?');
    }
    if start < text.len() {
        out.push(start..text.len());
    }
    out
}

/// Search for the next node matching `predicate`, wrapping around the
/// document at most once.
pub fn find_with_wrap(
    session: &mut SessionState,
    predicate: NavPredicate,
    reversed: bool,
) -> MoveOutcome {
    let saved = session.cursor.node;
    let first_try = {
        let SessionState {
            walker,
            document,
            cursor,
            ..
        } = session;
        walker.find(document, cursor.node, predicate, reversed)
    };
    if let Some(found) = first_try {
        session.cursor.sync_to(&session.document, found);
        return MoveOutcome::moved();
    }

    // Not found ahead: jump to the document edge and retry exactly once.
    session.cursor.node = None;
    let wrapped_try = {
        let SessionState {
            walker, document, ..
        } = session;
        walker.find(document, None, predicate, reversed)
    };
    match wrapped_try {
        Some(found) => {
            session.cursor.sync_to(&session.document, found);
            MoveOutcome::wrapped(reversed)
        }
        None => {
            // Still nothing anywhere: restore the original position.
            session.cursor.node = saved;
            let direction = if reversed { "previous" } else { "next" };
            MoveOutcome::fail(format!("No {direction} {}.", predicate.noun()))
        }
    }
}

/// Jump to a document edge.
pub fn jump_to_edge(session: &mut SessionState, from_end: bool) -> MoveOutcome {
    let edge = {
        let SessionState {
            walker, document, ..
        } = session;
        walker.edge(document, from_end)
    };
    match edge {
        Some(node) => {
            session.cursor.sync_to(&session.document, node);
            MoveOutcome::moved()
        }
        None => MoveOutcome::fail("Nothing to navigate.".to_owned()),
    }
}

// ---- tables ----

struct CellPosition {
    rows: Vec<NodeId>,
    row_index: usize,
    col_index: usize,
}

fn collect_by_tag(doc: &Document, root: NodeId, tags: &[&str], out: &mut Vec<NodeId>) {
    for child in doc.children(root) {
        if doc.tag(child).is_some_and(|tag| tags.contains(&tag)) {
            out.push(child);
        }
        collect_by_tag(doc, child, tags, out);
    }
}

fn row_cells(doc: &Document, row: NodeId) -> Vec<NodeId> {
    doc.children(row)
        .into_iter()
        .filter(|cell| doc.tag(*cell).is_some_and(|tag| matches!(tag, "td" | "th")))
        .collect()
}

fn locate_cell(doc: &Document, node: NodeId) -> Option<CellPosition> {
    let mut chain = vec![node];
    chain.extend(doc.ancestors(node));
    let cell = chain
        .iter()
        .copied()
        .find(|id| doc.tag(*id).is_some_and(|tag| matches!(tag, "td" | "th")))?;
    let row = doc.parent(cell)?;
    let table = chain
        .iter()
        .copied()
        .find(|id| doc.tag(*id) == Some("table"))?;

    let mut rows = Vec::new();
    collect_by_tag(doc, table, &["tr"], &mut rows);
    let row_index = rows.iter().position(|id| *id == row)?;
    let col_index = row_cells(doc, row).iter().position(|id| *id == cell)?;
    Some(CellPosition {
        rows,
        row_index,
        col_index,
    })
}

/// Move within the current table by a row/column delta.
pub fn table_move(session: &mut SessionState, row_delta: i8, col_delta: i8) -> MoveOutcome {
    let Some(node) = session.cursor.node else {
        return MoveOutcome::fail("Not inside a table.".to_owned());
    };
    let Some(position) = locate_cell(&session.document, node) else {
        return MoveOutcome::fail("Not inside a table.".to_owned());
    };

    let row_index = position.row_index as i64 + i64::from(row_delta);
    let col_index = position.col_index as i64 + i64::from(col_delta);
    if row_index < 0 {
        return MoveOutcome::fail("No cell above.".to_owned());
    }
    if row_index >= position.rows.len() as i64 {
        return MoveOutcome::fail("No cell below.".to_owned());
    }
    if col_index < 0 {
        return MoveOutcome::fail("No cell to the left.".to_owned());
    }
    let cells = row_cells(&session.document, position.rows[row_index as usize]);
    let Some(target) = cells.get(col_index as usize).copied() else {
        return MoveOutcome::fail("No cell to the right.".to_owned());
    };
    session.cursor.sync_to(&session.document, target);
    MoveOutcome::moved()
}

/// Jump to the first or last cell of the current table.
pub fn table_corner(session: &mut SessionState, last: bool) -> MoveOutcome {
    let Some(node) = session.cursor.node else {
        return MoveOutcome::fail("Not inside a table.".to_owned());
    };
    let Some(position) = locate_cell(&session.document, node) else {
        return MoveOutcome::fail("Not inside a table.".to_owned());
    };
    let row = if last {
        position.rows.last().copied()
    } else {
        position.rows.first().copied()
    };
    let target = row.and_then(|row| {
        let cells = row_cells(&session.document, row);
        if last {
            cells.last().copied()
        } else {
            cells.first().copied()
        }
    });
    match target {
        Some(cell) => {
            session.cursor.sync_to(&session.document, cell);
            MoveOutcome::moved()
        }
        None => MoveOutcome::fail("Not inside a table.".to_owned()),
    }
}

/// Speak the cursor's row/column coordinates.
pub fn table_location(session: &SessionState) -> MoveOutcome {
    let Some(node) = session.cursor.node else {
        return MoveOutcome::fail("Not inside a table.".to_owned());
    };
    let Some(position) = locate_cell(&session.document, node) else {
        return MoveOutcome::fail("Not inside a table.".to_owned());
    };
    let columns = row_cells(&session.document, position.rows[position.row_index]).len();
    MoveOutcome::text(format!(
        "Row {} of {}, column {} of {}.",
        position.row_index + 1,
        position.rows.len(),
        position.col_index + 1,
        columns
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use speech::CaptureSink;

    fn session_with_table() -> (SessionState, Vec<Vec<NodeId>>) {
        let mut session = SessionState::new(Box::new(CaptureSink::new()));
        let root = session.document.root();
        let table = session.document.append_element(root, "table");
        let mut grid = Vec::new();
        for row_text in [["a1", "a2"], ["b1", "b2"]] {
            let row = session.document.append_element(table, "tr");
            let mut cells = Vec::new();
            for text in row_text {
                let cell = session.document.append_element(row, "td");
                session.document.append_text(cell, text);
                cells.push(cell);
            }
            grid.push(cells);
        }
        (session, grid)
    }

    #[test]
    fn table_moves_by_row_and_column() {
        let (mut session, grid) = session_with_table();
        session.cursor.sync_to(&session.document, grid[0][0]);

        assert!(table_move(&mut session, 1, 0).error.is_none());
        assert_eq!(session.cursor.node, Some(grid[1][0]));

        assert!(table_move(&mut session, 0, 1).error.is_none());
        assert_eq!(session.cursor.node, Some(grid[1][1]));

        let outcome = table_move(&mut session, 1, 0);
        assert_eq!(outcome.error.as_deref(), Some("No cell below."));
        assert_eq!(session.cursor.node, Some(grid[1][1]));
    }

    #[test]
    fn table_location_reports_coordinates() {
        let (mut session, grid) = session_with_table();
        session.cursor.sync_to(&session.document, grid[1][0]);
        let outcome = table_location(&session);
        assert_eq!(outcome.spoken_text.as_deref(), Some("Row 2 of 2, column 1 of 2."));
    }

    #[test]
    fn word_stepping_walks_the_node_text() {
        let mut session = SessionState::new(Box::new(CaptureSink::new()));
        let root = session.document.root();
        let para = session.document.append_element(root, "p");
        session.document.append_text(para, "alpha beta gamma");
        session.cursor.sync_to(&session.document, para);

        let first = step(&mut session, Granularity::Word, false);
        assert_eq!(first.spoken_text.as_deref(), Some("beta"));
        let second = step(&mut session, Granularity::Word, false);
        assert_eq!(second.spoken_text.as_deref(), Some("gamma"));

        let back = step(&mut session, Granularity::Word, true);
        assert_eq!(back.spoken_text.as_deref(), Some("beta"));
    }

    #[test]
    fn sentence_splitting_handles_terminators() {
        let ranges = split_sentences("One two. Three! Four");
        assert_eq!(ranges.len(), 3);
    }

    #[test]
    fn find_wraps_exactly_once_and_restores_on_failure() {
        let mut session = SessionState::new(Box::new(CaptureSink::new()));
        let root = session.document.root();
        let heading = session.document.append_element(root, "h1");
        session.document.append_text(heading, "Title");
        let para = session.document.append_element(root, "p");
        session.document.append_text(para, "body");
        session.cursor.sync_to(&session.document, para);

        // The only heading is before the cursor: found after one wrap.
        let outcome = find_with_wrap(&mut session, NavPredicate::Heading(None), false);
        assert_eq!(outcome.prefix, Some("Wrapped to top."));
        assert_eq!(session.cursor.node, Some(heading));

        // A predicate that matches nothing terminates and restores.
        session.cursor.sync_to(&session.document, para);
        let missing = find_with_wrap(&mut session, NavPredicate::Table, false);
        assert_eq!(missing.error.as_deref(), Some("No next table."));
        assert_eq!(session.cursor.node, Some(para));
    }
}

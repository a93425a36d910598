//! End-to-end narration behavior: dialogs, editable text, commands.

use herald::{DocumentEdit, Session};
use pipeline::{RawEvent, Timestamp};
use speech::{QueueMode, SharedCapture};

fn t(millis: u64) -> Timestamp {
    Timestamp::from_millis(millis)
}

fn new_session() -> (Session, SharedCapture) {
    let capture = SharedCapture::new();
    let session = Session::new(Box::new(capture.clone()));
    (session, capture)
}

fn focus(session: &mut Session, node: dom::NodeId, now: Timestamp) {
    session.apply_edit(DocumentEdit::SetFocus(Some(node)));
    session.handle_event(RawEvent::focus(node, now), now);
}

#[test]
fn dialog_round_trip_announces_once_each_way() {
    let (mut session, capture) = new_session();
    let root = session.document().root();
    let dialog = session.document_mut().append_element(root, "div");
    session.document_mut().set_attr(dialog, "role", "dialog");
    session.document_mut().set_attr(dialog, "aria-label", "Settings");
    let ok_button = session.document_mut().append_element(dialog, "button");
    session.document_mut().append_text(ok_button, "OK");
    let cancel_button = session.document_mut().append_element(dialog, "button");
    session.document_mut().append_text(cancel_button, "Cancel");
    let outside = session.document_mut().append_element(root, "a");
    session.document_mut().append_text(outside, "Home");

    focus(&mut session, ok_button, t(0));
    session.advance_until(t(100));
    let texts = capture.texts();
    assert!(texts.iter().any(|text| text == "Entered dialog."), "{texts:?}");
    assert!(texts.iter().any(|text| text == "Settings"), "{texts:?}");
    assert!(texts.iter().any(|text| text.contains("OK")), "{texts:?}");

    // Bouncing inside the same dialog never re-announces it.
    capture.clear();
    focus(&mut session, cancel_button, t(200));
    session.advance_until(t(300));
    focus(&mut session, ok_button, t(400));
    session.advance_until(t(500));
    let texts = capture.texts();
    assert!(!texts.iter().any(|text| text.contains("dialog")), "{texts:?}");

    // Leaving announces the exit, then the new position.
    capture.clear();
    focus(&mut session, outside, t(600));
    session.advance_until(t(700));
    let texts = capture.texts();
    assert_eq!(texts.first().map(String::as_str), Some("Exited dialog."), "{texts:?}");
    assert!(texts.iter().any(|text| text.contains("Home")), "{texts:?}");
}

#[test]
fn alert_dialog_reads_its_body() {
    let (mut session, capture) = new_session();
    let root = session.document().root();
    let alert = session.document_mut().append_element(root, "div");
    session.document_mut().set_attr(alert, "role", "alertdialog");
    let message = session.document_mut().append_element(alert, "p");
    session
        .document_mut()
        .append_text(message, "Unsaved changes will be lost");
    let hidden = session.document_mut().append_element(alert, "p");
    session.document_mut().set_attr(hidden, "aria-hidden", "true");
    session.document_mut().append_text(hidden, "internal state");
    let confirm = session.document_mut().append_element(alert, "button");
    session.document_mut().append_text(confirm, "Discard");

    focus(&mut session, confirm, t(0));
    session.advance_until(t(100));

    let texts = capture.texts();
    assert!(
        texts.iter().any(|text| text.contains("Unsaved changes")),
        "alert dialogs proactively read body text: {texts:?}"
    );
    assert!(
        !texts.iter().any(|text| text.contains("internal state")),
        "hidden children stay unspoken: {texts:?}"
    );
}

#[test]
fn single_keystroke_speaks_only_the_inserted_char() {
    let (mut session, capture) = new_session();
    let root = session.document().root();
    let input = session.document_mut().append_element(root, "input");
    session.document_mut().set_value(input, "abc");
    session.document_mut().set_selection(input, 3, 3);

    focus(&mut session, input, t(0));
    session.advance_until(t(100));
    capture.clear();

    // The keystroke: value and caret move, then the key event arrives.
    session.apply_edit(DocumentEdit::SetValue {
        node: input,
        value: "abcd".to_owned(),
    });
    session.apply_edit(DocumentEdit::SetSelection {
        node: input,
        start: 4,
        end: 4,
    });
    session.handle_event(RawEvent::change(input, t(200)), t(200));
    session.advance_until(t(300));

    let utterances = capture.utterances();
    let spoken: Vec<&str> = utterances
        .iter()
        .map(|utterance| utterance.text.as_str())
        .collect();
    assert_eq!(spoken, vec!["d"], "minimal diff, not the whole value");
    assert_eq!(utterances[0].mode, QueueMode::Flush);
}

#[test]
fn selection_collapse_says_unselected() {
    let (mut session, capture) = new_session();
    let root = session.document().root();
    let input = session.document_mut().append_element(root, "input");
    session.document_mut().set_value(input, "hello world");
    session.document_mut().set_selection(input, 0, 5);

    focus(&mut session, input, t(0));
    session.advance_until(t(100));
    capture.clear();

    session.apply_edit(DocumentEdit::SetSelection {
        node: input,
        start: 8,
        end: 8,
    });
    session.handle_event(RawEvent::select(input, t(200)), t(200));
    session.advance_until(t(300));

    assert_eq!(capture.texts(), vec!["Unselected.".to_owned()]);
}

#[test]
fn polling_catches_silent_value_drift() {
    let (mut session, capture) = new_session();
    let root = session.document().root();
    let input = session.document_mut().append_element(root, "input");
    session.document_mut().set_value(input, "stock: 4");

    focus(&mut session, input, t(0));
    session.advance_until(t(100));
    capture.clear();

    // Page script rewrites the value. No event fires at all.
    session.apply_edit(DocumentEdit::SetValue {
        node: input,
        value: "stock: 3".to_owned(),
    });
    session.advance_until(t(600));

    let texts = capture.texts();
    assert!(
        !texts.is_empty(),
        "the polling fallback announced the drift"
    );
}

#[test]
fn password_fields_never_reveal_content() {
    let (mut session, capture) = new_session();
    let root = session.document().root();
    let input = session.document_mut().append_element(root, "input");
    session.document_mut().set_attr(input, "type", "password");
    session.document_mut().set_value(input, "hunter");

    focus(&mut session, input, t(0));
    session.advance_until(t(100));
    capture.clear();

    session.apply_edit(DocumentEdit::SetValue {
        node: input,
        value: "hunter2".to_owned(),
    });
    session.handle_event(RawEvent::change(input, t(200)), t(200));
    session.advance_until(t(300));

    let texts = capture.texts();
    assert!(!texts.iter().any(|text| text.contains("hunter")), "{texts:?}");
    assert!(texts.iter().any(|text| text == "*"), "{texts:?}");
}

#[test]
fn find_wraps_once_and_reports_not_found() {
    let (mut session, capture) = new_session();
    let root = session.document().root();
    let heading = session.document_mut().append_element(root, "h2");
    session.document_mut().append_text(heading, "Archive");
    let para = session.document_mut().append_element(root, "p");
    session.document_mut().append_text(para, "body text");
    session.state.cursor.sync_to(&session.state.document, para);

    // The only heading is behind the cursor: reachable via one wrap.
    let pass = session
        .execute_command("nextHeading", t(0))
        .expect("known command");
    assert!(!pass);
    let texts = capture.texts();
    assert!(texts.iter().any(|text| text == "Wrapped to top."), "{texts:?}");
    assert!(texts.iter().any(|text| text.contains("Archive")), "{texts:?}");

    // Nothing matches: terminates, restores, and speaks the error.
    capture.clear();
    session
        .execute_command("nextTable", t(10))
        .expect("known command");
    assert_eq!(capture.texts(), vec!["No next table.".to_owned()]);
    assert_eq!(session.state.cursor.node, Some(heading));
}

#[test]
fn continuous_reading_walks_to_the_end() {
    let (mut session, capture) = new_session();
    let root = session.document().root();
    for text in ["one", "two", "three"] {
        let para = session.document_mut().append_element(root, "p");
        session.document_mut().append_text(para, text);
    }

    session
        .execute_command("readFromHere", t(0))
        .expect("known command");
    session.advance_until(t(2000));

    let texts = capture.texts();
    assert!(texts.iter().any(|text| text.contains("one")), "{texts:?}");
    assert!(texts.iter().any(|text| text.contains("three")), "{texts:?}");
    assert_eq!(texts.last().map(String::as_str), Some("End of document."));
    assert!(!session.pipeline.reading_active());
}

#[test]
fn commands_without_continuation_stop_reading() {
    let (mut session, _capture) = new_session();
    let root = session.document().root();
    for text in ["one", "two", "three", "four", "five"] {
        let para = session.document_mut().append_element(root, "p");
        session.document_mut().append_text(para, text);
    }

    session
        .execute_command("readFromHere", t(0))
        .expect("known command");
    session.advance_until(t(250));
    assert!(session.pipeline.reading_active());

    // A TTS tweak composes with reading; navigation does not.
    session
        .execute_command("increaseTtsRate", t(300))
        .expect("known command");
    assert!(session.pipeline.reading_active());

    session
        .execute_command("nextObject", t(400))
        .expect("known command");
    assert!(!session.pipeline.reading_active());
}

//! End-to-end timing properties of the coalescing pipeline.

use herald::{DocumentEdit, Session};
use pipeline::{EventKind, KeyPayload, RawEvent, Timestamp};
use speech::SharedCapture;

fn t(millis: u64) -> Timestamp {
    Timestamp::from_millis(millis)
}

fn new_session() -> (Session, SharedCapture) {
    let capture = SharedCapture::new();
    let session = Session::new(Box::new(capture.clone()));
    (session, capture)
}

fn keydown(at: Timestamp) -> RawEvent {
    RawEvent::new(EventKind::KeyDown(KeyPayload::default()), None, at)
}

#[test]
fn no_events_schedules_no_flush() {
    let (mut session, capture) = new_session();
    assert_eq!(session.next_deadline(), None);

    // Pumping an idle session is a no-op, repeatedly.
    session.advance_to(t(100));
    session.advance_to(t(100));
    session.advance_until(t(500));
    assert_eq!(session.next_deadline(), None);
    assert!(capture.is_empty());
}

#[test]
fn focus_supersession_drops_the_stale_focus() {
    let (mut session, capture) = new_session();
    let root = session.document().root();
    let first = session.document_mut().append_element(root, "button");
    session.document_mut().append_text(first, "First");
    let second = session.document_mut().append_element(root, "button");
    session.document_mut().append_text(second, "Second");

    session.apply_edit(DocumentEdit::SetFocus(Some(first)));
    session.handle_event(RawEvent::focus(first, t(0)), t(0));
    session.handle_event(keydown(t(1)), t(1));
    session.apply_edit(DocumentEdit::SetFocus(Some(second)));
    session.handle_event(RawEvent::focus(second, t(2)), t(2));
    session.handle_event(keydown(t(3)), t(3));

    session.advance_until(t(40));

    let texts = capture.texts();
    assert!(
        texts.iter().any(|text| text.contains("Second")),
        "the surviving focus is described: {texts:?}"
    );
    assert!(
        !texts.iter().any(|text| text.contains("First")),
        "the superseded focus is never described: {texts:?}"
    );
}

#[test]
fn focus_storm_cannot_starve_the_queue() {
    let (mut session, capture) = new_session();
    let root = session.document().root();
    let button = session.document_mut().append_element(root, "button");
    session.document_mut().append_text(button, "Busy");
    session.apply_edit(DocumentEdit::SetFocus(Some(button)));

    // A focus event every 5ms, indefinitely. The max-wait bound must force
    // a dispatch within 50ms of the first buffered event.
    let mut first_spoken_at = None;
    for step in 0..=20u64 {
        let now = step * 5;
        session.handle_event(RawEvent::focus(button, t(now)), t(now));
        session.advance_to(t(now));
        if first_spoken_at.is_none() && !capture.is_empty() {
            first_spoken_at = Some(now);
        }
    }
    let when = first_spoken_at.expect("the queue dispatched despite the storm");
    assert!(when <= 55, "first dispatch too late: {when}ms");
}

#[test]
fn mutation_bursts_are_capped_at_three() {
    let (mut session, capture) = new_session();
    let root = session.document().root();
    let region = session.document_mut().append_element(root, "div");
    session.document_mut().set_attr(region, "role", "status");
    session.document_mut().append_text(region, "saved");

    // Ten mutations inside one 1000ms window.
    for step in 0..10u64 {
        let now = step * 20;
        session.handle_event(RawEvent::subtree_modified(Some(region), t(now)), t(now));
        session.advance_to(t(now));
    }
    session.advance_until(t(400));

    let announcements = capture
        .texts()
        .iter()
        .filter(|text| text.contains("saved"))
        .count();
    assert_eq!(announcements, 3, "4th through 10th mutations drop silently");
}

#[test]
fn null_target_events_are_tolerated() {
    let (mut session, capture) = new_session();
    session.handle_event(RawEvent::subtree_modified(None, t(0)), t(0));
    session.handle_event(RawEvent::new(EventKind::Focus, None, t(1)), t(1));
    session.handle_event(RawEvent::change(session.document().root(), t(2)), t(2));
    session.advance_until(t(100));
    assert!(capture.is_empty());
}

#[test]
fn suspension_holds_events_until_resume() {
    let (mut session, capture) = new_session();
    let root = session.document().root();
    let button = session.document_mut().append_element(root, "button");
    session.document_mut().append_text(button, "Go");

    session.pipeline.suspend();
    session.apply_edit(DocumentEdit::SetFocus(Some(button)));
    session.handle_event(RawEvent::focus(button, t(0)), t(0));
    session.advance_until(t(100));
    assert!(capture.is_empty(), "suspended queue speaks nothing");

    session.pipeline.resume(t(100));
    session.advance_until(t(200));
    assert!(
        capture.texts().iter().any(|text| text.contains("Go")),
        "buffered event dispatches after resume"
    );
}

//! The demo script replays deterministically under virtual time.

use herald::Session;
use herald::script::Script;
use speech::SharedCapture;

#[test]
fn tour_script_replays_and_narrates() {
    let script = Script::parse(include_str!("../demos/tour.json")).expect("demo script parses");
    let capture = SharedCapture::new();
    let mut session = Session::new(Box::new(capture.clone()));

    herald::script::replay(&script, &mut session).expect("replay succeeds");

    let texts = capture.texts();
    // Focus on the labelled search box.
    assert!(texts.iter().any(|text| text.contains("Search orders")), "{texts:?}");
    // Each keystroke narrated minimally.
    assert!(texts.iter().any(|text| text == "w"), "{texts:?}");
    assert!(texts.iter().any(|text| text == "i"), "{texts:?}");
    // The alert dialog announced itself and its body.
    assert!(texts.iter().any(|text| text == "Entered dialog."), "{texts:?}");
    assert!(
        texts.iter().any(|text| text.contains("draft order has not been saved")),
        "{texts:?}"
    );
    // Continuous reading reached the heading at the top.
    assert!(texts.iter().any(|text| text.contains("Orders")), "{texts:?}");
}

#[test]
fn scripts_with_unknown_ids_fail_loudly() {
    let script = Script::parse(
        r#"{ "document": [], "steps": [ { "at_ms": 0, "focus": "missing" } ] }"#,
    )
    .expect("script parses");
    let mut session = Session::new(Box::new(SharedCapture::new()));
    assert!(herald::script::replay(&script, &mut session).is_err());
}

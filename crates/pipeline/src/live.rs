//! Live-region announcement formatting.

use dom::{Document, NodeId, Politeness};
use log::debug;
use speech::{QueueMode, Utterance};

/// Format one live region's current content as an utterance.
///
/// Assertive regions interrupt pending speech; polite ones queue behind
/// it. Regions with no speakable content produce nothing.
pub fn live_region_utterance(doc: &Document, region: NodeId) -> Option<Utterance> {
    let text = doc.text_content(region);
    if text.is_empty() {
        return None;
    }
    let mode = match doc.politeness(region) {
        Politeness::Assertive => QueueMode::Flush,
        Politeness::Polite => QueueMode::Queue,
        Politeness::Off => return None,
    };
    debug!("live region {region:?} -> {mode:?}");
    Some(Utterance::new(text, mode))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn politeness_selects_queue_mode() {
        let mut doc = Document::new();
        let root = doc.root();
        let alert = doc.append_element(root, "div");
        doc.set_attr(alert, "role", "alert");
        doc.append_text(alert, "saved");
        let status = doc.append_element(root, "div");
        doc.set_attr(status, "aria-live", "polite");
        doc.append_text(status, "loading");
        let empty = doc.append_element(root, "div");
        doc.set_attr(empty, "role", "alert");

        let Some(flushing) = live_region_utterance(&doc, alert) else {
            unreachable!("alert region has text");
        };
        assert_eq!(flushing.mode, QueueMode::Flush);
        assert_eq!(flushing.text, "saved");

        let Some(queued) = live_region_utterance(&doc, status) else {
            unreachable!("status region has text");
        };
        assert_eq!(queued.mode, QueueMode::Queue);

        assert!(live_region_utterance(&doc, empty).is_none());
    }
}

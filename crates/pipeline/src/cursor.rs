//! The navigation cursor: the single source of truth for "where the user
//! currently is".

use describe::NavDescription;
use dom::{Document, NodeId};
use smallvec::SmallVec;

/// Unit the cursor advances by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Granularity {
    Character,
    Word,
    Sentence,
    Line,
    #[default]
    Object,
    Group,
}

impl Granularity {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::Word => "word",
            Self::Sentence => "sentence",
            Self::Line => "line",
            Self::Object => "object",
            Self::Group => "group",
        }
    }

    /// Cycle to the next finer/coarser unit, wrapping.
    pub const fn cycled(self, forward: bool) -> Self {
        const ORDER: [Granularity; 6] = [
            Granularity::Character,
            Granularity::Word,
            Granularity::Sentence,
            Granularity::Line,
            Granularity::Object,
            Granularity::Group,
        ];
        let mut index = 0;
        while index < ORDER.len() {
            if ORDER[index] as u8 == self as u8 {
                break;
            }
            index += 1;
        }
        let next = if forward {
            (index + 1) % ORDER.len()
        } else {
            (index + ORDER.len() - 1) % ORDER.len()
        };
        ORDER[next]
    }
}

/// Owned by the navigation subsystem; the event router and command
/// dispatch both read and conditionally overwrite it, never concurrently.
/// Last writer wins by design.
#[derive(Debug, Default)]
pub struct NavigationCursor {
    pub node: Option<NodeId>,
    /// Ancestor levels entered by the last move, outermost first; feeds the
    /// description's context line.
    pub ancestors_changed: SmallVec<NodeId, 4>,
    pub reversed: bool,
    pub granularity: Granularity,
    /// Byte offset into the current node's text for sub-node granularities.
    pub text_offset: usize,
}

impl NavigationCursor {
    /// Move the cursor to `node`, recording which ancestor levels were
    /// entered relative to the previous position.
    pub fn sync_to(&mut self, doc: &Document, node: NodeId) {
        let old_ancestors: Vec<NodeId> = match self.node {
            Some(old) => {
                let mut chain = doc.ancestors(old);
                chain.push(old);
                chain
            }
            None => Vec::new(),
        };
        let mut entered: SmallVec<NodeId, 4> = SmallVec::new();
        // ancestors() is nearest-first; context reads outermost-first.
        for ancestor in doc.ancestors(node).into_iter().rev() {
            if !old_ancestors.contains(&ancestor) {
                entered.push(ancestor);
            }
        }
        self.node = Some(node);
        self.ancestors_changed = entered;
        self.text_offset = 0;
    }

    /// Description of the current position, or `None` when the cursor has
    /// nowhere to stand (empty document, detached node).
    pub fn describe(&self, doc: &Document) -> Option<NavDescription> {
        let node = self.node.filter(|node| doc.is_attached(*node))?;
        let ancestors: Vec<NodeId> = self.ancestors_changed.iter().copied().collect();
        Some(describe::describe_node(doc, node, &ancestors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_records_entered_ancestors_outermost_first() {
        let mut doc = Document::new();
        let root = doc.root();
        let nav = doc.append_element(root, "nav");
        let list = doc.append_element(nav, "ul");
        let item = doc.append_element(list, "li");
        doc.append_text(item, "one");
        let outside = doc.append_element(root, "p");
        doc.append_text(outside, "after");

        let mut cursor = NavigationCursor::default();
        cursor.sync_to(&doc, outside);
        assert!(cursor.ancestors_changed.is_empty());

        cursor.sync_to(&doc, item);
        let entered: Vec<NodeId> = cursor.ancestors_changed.iter().copied().collect();
        assert_eq!(entered, vec![nav, list]);

        // Moving within the same list enters nothing new.
        let item_two = doc.append_element(list, "li");
        cursor.sync_to(&doc, item_two);
        assert!(cursor.ancestors_changed.is_empty());
    }

    #[test]
    fn granularity_cycles_and_wraps() {
        assert_eq!(Granularity::Object.cycled(true), Granularity::Group);
        assert_eq!(Granularity::Group.cycled(true), Granularity::Character);
        assert_eq!(Granularity::Character.cycled(false), Granularity::Group);
    }
}

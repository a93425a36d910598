//! Document tree model for the narration engine.
//!
//! This crate owns the in-memory document the rest of the engine navigates:
//! an arena-backed tree of elements and text runs with an attribute bag per
//! node, plus the ARIA-flavored queries (roles, hidden state, dialogs,
//! composite controls, live regions) that event routing and command
//! dispatch are built on. It performs no parsing; documents are constructed
//! programmatically by the host.

pub mod document;
pub mod node;
pub mod walker;

pub use document::{ControlState, Document};
pub use indextree::NodeId;
pub use node::{DomNode, EditableKind, NodeKind, Politeness};
pub use walker::{NavPredicate, Walker};

//! Authoring: range-clamped parameter edits with undo/redo.
//!
//! # Invariants
//! - Every edit is reversible.
//! - Every applied edit goes through the fur's reapply hook.

mod editor;

pub use editor::{EditCommand, EditError, ParameterEditor};

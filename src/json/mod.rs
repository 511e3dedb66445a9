//! Purpose: Internal JSON parsing boundary used when decoding on-disk documents.
//! Exports: `parse` module with decode helpers.
//! Role: Single seam for parser details so callsites avoid ad hoc decode logic.
//! Invariants: Helper APIs stay small and deterministic (no hidden global state).

pub(crate) mod parse;

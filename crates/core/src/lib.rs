//! renewal-core: the pure half of the agreement renewal workflow.
//!
//! Everything in this crate is a synchronous function of its inputs:
//!
//! - [`model`] -- agreement records and their three owned line collections
//! - [`snapshot()`] -- normalized, comparable term document for an agreement
//! - [`suggest_window()`] -- default validity period for a renewal
//! - [`materialize()`] -- identity-free editable copies of an agreement's lines
//! - [`diff()`] -- structural delta between two term documents
//! - [`render_digest()`] -- human-readable change digest plus raw delta
//!
//! Persistence, transactions and notifications live in `renewal-storage`;
//! the orchestration that ties them together lives in `renewal-workflow`.

pub mod delta;
pub mod digest;
pub mod materialize;
pub mod model;
pub mod snapshot;
pub mod window;

// ── Convenience re-exports ───────────────────────────────────────────

pub use delta::{diff, Delta, Patch, DELETE_MARKER};
pub use digest::{escape_html, render_digest, summary_lines, NO_MATERIAL_CHANGES};
pub use materialize::{
    materialize, StagedBonusRuleLine, StagedClauseLine, StagedLines, StagedMatrixLine,
};
pub use model::{
    Agreement, AgreementState, BonusRuleLine, ClauseLine, CostCategory, ManpowerTotals,
    MatrixLine, RuleType, Shift,
};
pub use snapshot::{snapshot, Document};
pub use window::{suggest_window, suggest_window_from, DEFAULT_DURATION_DAYS};

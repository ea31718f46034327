//! bibweave-reconcile — author/institution identity reconciliation.
//!
//! Pure logic, no I/O: name normalization, pairwise author similarity,
//! list-level match policies, and the institution merge rule.

pub mod merge;
pub mod normalize;
pub mod similar;

pub use merge::{attach_positional, merge_institutions};
pub use normalize::{fuzzy_normalize, normalize_name, strip_diacritics};
pub use similar::{authors_match, fuzzy_authors_match, similar, MatchPolicy};

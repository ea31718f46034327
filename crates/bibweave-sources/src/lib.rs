//! bibweave-sources — adapters for the external metadata sources.
//!
//! Each adapter translates one API (OpenAlex, Semantic Scholar, CrossRef)
//! into the shared record shape on top of the request gate. Gate failures
//! are absorbed here: enrichment methods log and return `None`/empty so the
//! pipeline sees "no data from this source" instead of errors.

use bibweave_core::GateError;
use serde_json::Value;

pub mod crossref;
pub mod openalex;
pub mod semantic_scholar;

pub use crossref::Crossref;
pub use openalex::OpenAlex;
pub use semantic_scholar::SemanticScholar;

/// Single-record lookup by the paper's primary identifier.
pub trait FetchByIdentifier {
    /// Raw source record, or `None` when the DOI is empty, the source has
    /// no matching record, or the source could not be reached.
    fn fetch_by_doi(&self, doi: &str) -> Option<Value>;
}

/// Multi-record lookup with source-imposed chunking.
pub trait BatchFetch {
    /// Fetch all ids, chunking as the source requires. Failed chunks are
    /// dropped; partial results are acceptable.
    fn batch_fetch(&self, ids: &[String]) -> Vec<Value>;
}

/// Ranked title search, used only when no identifier is available.
pub trait SearchByTitle {
    /// The single top candidate, to be verified by reconciliation before
    /// anything is trusted from it.
    fn search_by_title(&self, title: &str) -> Option<Value>;
}

/// Collapse a gate outcome into the adapter-boundary "data or no data"
/// shape, logging the distinction the caller no longer sees.
pub(crate) fn absorb(source: &str, what: &str, result: Result<Value, GateError>) -> Option<Value> {
    match result {
        Ok(value) => Some(value),
        Err(GateError::NotFound) => {
            log::debug!("{source}: {what}: not found");
            None
        }
        Err(e) => {
            log::warn!("{source}: {what}: {e}");
            None
        }
    }
}

//! bibweave-core — shared infrastructure for the enrichment pipeline.
//!
//! Owns the request gate (cache + rate limiting + retry/backoff), the
//! canonical record model and builder, year-keyed stage file storage,
//! and the worker-pool / logging / progress plumbing.

pub mod builder;
pub mod cache;
pub mod error;
pub mod gate;
pub mod http;
pub mod limiter;
pub mod logging;
pub mod progress;
pub mod record;
pub mod store;
pub mod work_queue;

// Re-exports for convenience
pub use builder::{first_present, BuildError, RecordBuilder};
pub use cache::RequestCache;
pub use error::GateError;
pub use gate::{GateConfig, GateRequest, RequestGate};
pub use http::{get_text, http_client, SHARED_RUNTIME};
pub use limiter::RateLimiter;
pub use logging::init_logging;
pub use progress::{fmt_num, ProgressContext, SharedProgress};
pub use record::{
    AuthorAffiliation, CitationStub, CitationsEntry, Institution, PaperRecord, PaperStub,
};
pub use store::{load_year_map, merge_year_map, save_year_map};
pub use work_queue::{run_pool, WorkQueue};

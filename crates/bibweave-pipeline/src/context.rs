//! Shared state threaded through every stage run.

use std::path::PathBuf;
use std::sync::Arc;

use bibweave_core::{ProgressContext, RequestGate, SharedProgress};
use bibweave_sources::{Crossref, OpenAlex, SemanticScholar};

/// Knobs that apply to every stage.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub workers: usize,
    pub output_dir: PathBuf,
    /// Resolve missing institutions through the author's profile.
    pub author_fallback: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            output_dir: PathBuf::from("./output"),
            author_fallback: true,
        }
    }
}

/// One gate, one client per source, shared by all workers of a run.
pub struct PipelineContext {
    pub openalex: OpenAlex,
    pub s2: SemanticScholar,
    pub crossref: Crossref,
    pub config: PipelineConfig,
    pub progress: SharedProgress,
}

impl PipelineContext {
    pub fn new(
        gate: Arc<RequestGate>,
        s2_api_key: Option<String>,
        config: PipelineConfig,
        progress: SharedProgress,
    ) -> Self {
        Self {
            openalex: OpenAlex::new(gate.clone()),
            s2: SemanticScholar::new(gate.clone(), s2_api_key),
            crossref: Crossref::new(gate),
            config,
            progress,
        }
    }

    /// Build around pre-configured clients (tests point these at a mock
    /// server).
    pub fn with_clients(
        openalex: OpenAlex,
        s2: SemanticScholar,
        crossref: Crossref,
        config: PipelineConfig,
    ) -> Self {
        Self {
            openalex,
            s2,
            crossref,
            config,
            progress: Arc::new(ProgressContext::new()),
        }
    }

    fn stage_file(&self, stage_dir: &str, conference: &str, suffix: &str) -> PathBuf {
        self.config
            .output_dir
            .join(stage_dir)
            .join(format!("{conference}_{suffix}.json"))
    }

    pub fn base_path(&self, conference: &str) -> PathBuf {
        self.stage_file("base", conference, "base_data")
    }

    pub fn extended_path(&self, conference: &str) -> PathBuf {
        self.stage_file("extended", conference, "extended_data")
    }

    pub fn citations_path(&self, conference: &str) -> PathBuf {
        self.stage_file("citations", conference, "citations_data")
    }
}

/// Inclusive year range as the list of years it covers.
pub fn year_range(first: u16, last: u16) -> Vec<u16> {
    (first.min(last)..=first.max(last)).collect()
}

/// Restrict a loaded year map to the requested years.
pub fn filter_years<T>(
    map: std::collections::BTreeMap<String, Vec<T>>,
    years: &[u16],
) -> Vec<(String, T)> {
    let mut out = Vec::new();
    for (year, records) in map {
        let keep = year.parse::<u16>().is_ok_and(|y| years.contains(&y));
        if !keep {
            log::debug!("year {year} outside requested range, skipping");
            continue;
        }
        for record in records {
            out.push((year.clone(), record));
        }
    }
    out
}

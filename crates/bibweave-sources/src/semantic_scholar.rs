//! Semantic Scholar adapter: abstracts, TLDRs and citation stubs.

use std::sync::Arc;
use std::time::Duration;

use bibweave_core::record::CitationStub;
use bibweave_core::{GateRequest, RequestGate};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{absorb, BatchFetch, FetchByIdentifier, SearchByTitle};

const SOURCE: &str = "semantic_scholar";
const MIN_INTERVAL: Duration = Duration::from_secs(2);

/// Batch endpoint hard limit on ids per call.
pub const BATCH_CHUNK_SIZE: usize = 500;

const PAPER_FIELDS: &str = "title,authors.name,abstract,tldr,citations,externalIds";
const BATCH_FIELDS: &str = "title,year,venue,externalIds,authors.name";

/// Typed view over a Semantic Scholar paper payload. Every field is
/// optional; the API returns only what was asked for and sometimes less.
#[derive(Debug, Clone, Deserialize)]
pub struct S2Paper {
    #[serde(rename = "paperId", default)]
    pub paper_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(rename = "abstract", default)]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub tldr: Option<Tldr>,
    #[serde(default)]
    pub authors: Vec<S2Author>,
    #[serde(default)]
    pub citations: Vec<CitationStub>,
    #[serde(rename = "externalIds", default)]
    pub external_ids: Option<ExternalIds>,
}

impl S2Paper {
    pub fn tldr_text(&self) -> Option<String> {
        self.tldr.as_ref().and_then(|t| t.text.clone())
    }

    pub fn doi(&self) -> Option<String> {
        self.external_ids.as_ref().and_then(|ids| ids.doi.clone())
    }

    pub fn author_names(&self) -> Vec<String> {
        self.authors
            .iter()
            .map(|a| a.name.clone().unwrap_or_default())
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tldr {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S2Author {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExternalIds {
    #[serde(rename = "DOI", default)]
    pub doi: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    data: Vec<Value>,
}

pub struct SemanticScholar {
    gate: Arc<RequestGate>,
    base_url: String,
    api_key: Option<String>,
}

impl SemanticScholar {
    pub fn new(gate: Arc<RequestGate>, api_key: Option<String>) -> Self {
        Self::with_base(gate, "https://api.semanticscholar.org/graph/v1/paper", api_key)
    }

    /// Base URL override for tests.
    pub fn with_base(gate: Arc<RequestGate>, base: &str, api_key: Option<String>) -> Self {
        Self {
            gate,
            base_url: base.to_string(),
            api_key,
        }
    }

    fn with_key(&self, req: GateRequest) -> GateRequest {
        match &self.api_key {
            Some(key) => req.header("x-api-key", key.clone()),
            None => req,
        }
    }

    /// Typed single-paper fetch.
    pub fn paper_by_doi(&self, doi: &str) -> Option<S2Paper> {
        parse_paper(self.fetch_by_doi(doi)?)
    }

    /// Typed batch fetch; unknown ids (nulls) are dropped.
    pub fn batch_papers(&self, ids: &[String]) -> Vec<S2Paper> {
        self.batch_fetch(ids).into_iter().filter_map(parse_paper).collect()
    }

    /// Typed title search, top candidate only.
    pub fn search_paper(&self, title: &str) -> Option<S2Paper> {
        parse_paper(self.search_by_title(title)?)
    }
}

fn parse_paper(raw: Value) -> Option<S2Paper> {
    match serde_json::from_value(raw) {
        Ok(paper) => Some(paper),
        Err(e) => {
            log::warn!("{SOURCE}: unexpected paper shape: {e}");
            None
        }
    }
}

impl FetchByIdentifier for SemanticScholar {
    fn fetch_by_doi(&self, doi: &str) -> Option<Value> {
        if doi.is_empty() {
            return None;
        }
        let req = self.with_key(
            GateRequest::get(format!("{}/{doi}", self.base_url))
                .param("fields", PAPER_FIELDS)
                .paced(SOURCE, MIN_INTERVAL),
        );
        absorb(SOURCE, &format!("doi {doi}"), self.gate.execute(&req))
    }
}

impl BatchFetch for SemanticScholar {
    fn batch_fetch(&self, ids: &[String]) -> Vec<Value> {
        let mut results = Vec::new();
        for chunk in ids.chunks(BATCH_CHUNK_SIZE) {
            let req = self.with_key(
                GateRequest::post(format!("{}/batch", self.base_url), json!({ "ids": chunk }))
                    .param("fields", BATCH_FIELDS)
                    .paced(SOURCE, MIN_INTERVAL),
            );
            match absorb(
                SOURCE,
                &format!("batch of {}", chunk.len()),
                self.gate.execute(&req),
            ) {
                Some(Value::Array(items)) => {
                    results.extend(items.into_iter().filter(|v| !v.is_null()));
                }
                Some(other) => {
                    log::warn!("{SOURCE}: batch returned non-array payload: {other}");
                }
                // Failed chunk: dropped, partial results are acceptable.
                None => {}
            }
        }
        results
    }
}

impl SearchByTitle for SemanticScholar {
    fn search_by_title(&self, title: &str) -> Option<Value> {
        if title.is_empty() {
            return None;
        }
        let req = self.with_key(
            GateRequest::get(format!("{}/search", self.base_url))
                .param("query", title)
                .param("limit", "1")
                .param("fields", PAPER_FIELDS)
                .paced(SOURCE, MIN_INTERVAL),
        );
        let page = absorb(SOURCE, &format!("search '{title}'"), self.gate.execute(&req))?;
        let page: SearchPage = serde_json::from_value(page).ok()?;
        page.data.into_iter().next()
    }
}

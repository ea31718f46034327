//! CrossRef adapter: affiliation backfill when OpenAlex comes up empty.

use std::sync::Arc;
use std::time::Duration;

use bibweave_core::record::Institution;
use bibweave_core::{GateRequest, RequestGate};
use serde::Deserialize;
use serde_json::Value;

use bibweave_reconcile::{authors_match, MatchPolicy};

use crate::{absorb, FetchByIdentifier};

const SOURCE: &str = "crossref";
const MIN_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Deserialize)]
struct Envelope {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    author: Vec<CrAuthor>,
}

#[derive(Debug, Deserialize)]
struct CrAuthor {
    #[serde(default)]
    given: Option<String>,
    #[serde(default)]
    family: Option<String>,
    #[serde(default)]
    affiliation: Vec<CrAffiliation>,
}

impl CrAuthor {
    fn full_name(&self) -> String {
        match (&self.given, &self.family) {
            (Some(g), Some(f)) => format!("{g} {f}"),
            (Some(g), None) => g.clone(),
            (None, Some(f)) => f.clone(),
            (None, None) => String::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CrAffiliation {
    #[serde(default)]
    name: Option<String>,
}

pub struct Crossref {
    gate: Arc<RequestGate>,
    base_url: String,
}

impl Crossref {
    pub fn new(gate: Arc<RequestGate>) -> Self {
        Self::with_base(gate, "https://api.crossref.org/works")
    }

    /// Base URL override for tests.
    pub fn with_base(gate: Arc<RequestGate>, base: &str) -> Self {
        Self {
            gate,
            base_url: base.to_string(),
        }
    }

    /// Positional affiliations for a paper, gated on a strict author-list
    /// match against the authoritative names. CrossRef author ordering is
    /// trusted once the match passes, so results line up by index.
    pub fn institutions_by_doi(
        &self,
        doi: &str,
        authoritative: &[String],
    ) -> Vec<Option<Vec<Institution>>> {
        let Some(raw) = self.fetch_by_doi(doi) else {
            return Vec::new();
        };
        let envelope: Envelope = match serde_json::from_value(raw) {
            Ok(env) => env,
            Err(e) => {
                log::warn!("{SOURCE}: unexpected work shape for doi {doi}: {e}");
                return Vec::new();
            }
        };
        let names: Vec<String> = envelope.message.author.iter().map(CrAuthor::full_name).collect();
        if !authors_match(authoritative, &names, MatchPolicy::Strict) {
            log::debug!("{SOURCE}: author list mismatch for doi {doi}, skipping affiliations");
            return Vec::new();
        }
        envelope
            .message
            .author
            .iter()
            .map(|author| {
                let institutions: Vec<Institution> = author
                    .affiliation
                    .iter()
                    .filter_map(|aff| aff.name.clone())
                    .filter(|name| !name.is_empty())
                    .map(|name| Institution {
                        name,
                        country: String::new(),
                    })
                    .collect();
                if institutions.is_empty() {
                    None
                } else {
                    Some(institutions)
                }
            })
            .collect()
    }
}

impl FetchByIdentifier for Crossref {
    fn fetch_by_doi(&self, doi: &str) -> Option<Value> {
        if doi.is_empty() {
            return None;
        }
        let req = GateRequest::get(format!("{}/{doi}", self.base_url)).paced(SOURCE, MIN_INTERVAL);
        absorb(SOURCE, &format!("doi {doi}"), self.gate.execute(&req))
    }
}

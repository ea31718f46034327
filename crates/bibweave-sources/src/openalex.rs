//! OpenAlex adapter: primary institution source.

use std::sync::Arc;
use std::time::Duration;

use bibweave_core::record::{AuthorAffiliation, Institution};
use bibweave_core::{GateRequest, RequestGate};
use bibweave_reconcile::{authors_match, similar, MatchPolicy};
use serde::Deserialize;
use serde_json::Value;

use crate::{absorb, FetchByIdentifier, SearchByTitle};

const SOURCE: &str = "openalex";
const MIN_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Deserialize)]
struct Work {
    #[serde(default)]
    authorships: Vec<Authorship>,
    #[serde(default)]
    referenced_works: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Authorship {
    #[serde(default)]
    author: Option<DehydratedAuthor>,
    #[serde(default)]
    institutions: Vec<OaInstitution>,
}

#[derive(Debug, Deserialize)]
struct DehydratedAuthor {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OaInstitution {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    country_code: Option<String>,
}

impl OaInstitution {
    fn into_institution(self) -> Institution {
        Institution {
            name: self.display_name.unwrap_or_default(),
            country: self.country_code.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AuthorProfile {
    #[serde(default)]
    last_known_institutions: Vec<OaInstitution>,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    results: Vec<Value>,
}

pub struct OpenAlex {
    gate: Arc<RequestGate>,
    works_url: String,
    authors_url: String,
}

impl OpenAlex {
    pub fn new(gate: Arc<RequestGate>) -> Self {
        Self::with_base(gate, "https://api.openalex.org")
    }

    /// Base URL override for tests.
    pub fn with_base(gate: Arc<RequestGate>, base: &str) -> Self {
        Self {
            gate,
            works_url: format!("{base}/works"),
            authors_url: format!("{base}/authors"),
        }
    }

    fn get(&self, url: String) -> GateRequest {
        GateRequest::get(url).paced(SOURCE, MIN_INTERVAL)
    }

    /// Per-author institution lists for a paper.
    ///
    /// With `author_fallback`, an authorship that carries no institutions is
    /// resolved through the author's profile, substituting the first of
    /// their last-known institutions.
    pub fn authors_and_affiliations(
        &self,
        doi: &str,
        author_fallback: bool,
    ) -> Option<Vec<AuthorAffiliation>> {
        let raw = self.fetch_by_doi(doi)?;
        let work: Work = match serde_json::from_value(raw) {
            Ok(w) => w,
            Err(e) => {
                log::warn!("{SOURCE}: unexpected work shape for doi {doi}: {e}");
                return None;
            }
        };
        Some(
            work.authorships
                .into_iter()
                .map(|authorship| self.resolve_authorship(authorship, author_fallback))
                .collect(),
        )
    }

    fn resolve_authorship(
        &self,
        authorship: Authorship,
        author_fallback: bool,
    ) -> AuthorAffiliation {
        let (name, author_id) = match authorship.author {
            Some(author) => (author.display_name.unwrap_or_default(), author.id),
            None => (String::new(), None),
        };
        let mut institutions: Vec<Institution> = authorship
            .institutions
            .into_iter()
            .map(OaInstitution::into_institution)
            .collect();
        if institutions.is_empty() && author_fallback {
            if let Some(id) = author_id {
                if let Some(last_known) = self.author_last_known_institution(&id) {
                    institutions = vec![last_known];
                }
            }
        }
        AuthorAffiliation {
            name,
            institutions: Some(institutions),
        }
    }

    /// First of the author's last-known institutions, from their profile.
    fn author_last_known_institution(&self, author_id: &str) -> Option<Institution> {
        let id = normalize_work_id(author_id);
        let req = self.get(format!("{}/{id}", self.authors_url));
        let raw = absorb(SOURCE, &format!("author {id}"), self.gate.execute(&req))?;
        let profile: AuthorProfile = serde_json::from_value(raw).ok()?;
        profile
            .last_known_institutions
            .into_iter()
            .next()
            .map(OaInstitution::into_institution)
    }

    /// Outbound reference ids, normalized from full URLs to bare ids.
    pub fn referenced_works(&self, doi: &str) -> Option<Vec<String>> {
        let raw = self.fetch_by_doi(doi)?;
        let work: Work = serde_json::from_value(raw).ok()?;
        if work.referenced_works.is_empty() {
            return None;
        }
        Some(
            work.referenced_works
                .iter()
                .map(|w| normalize_work_id(w))
                .collect(),
        )
    }

    /// Title-search fallback: per-position institution lists for the
    /// authoritative author order, or `None` when the top search candidate
    /// fails the lenient author verification.
    pub fn institutions_by_title(
        &self,
        title: &str,
        authoritative: &[String],
    ) -> Option<Vec<Option<Vec<Institution>>>> {
        if title.is_empty() || authoritative.is_empty() {
            return None;
        }
        let top = self.search_by_title(title)?;
        let work: Work = serde_json::from_value(top).ok()?;
        let candidate_names: Vec<String> = work
            .authorships
            .iter()
            .map(|a| {
                a.author
                    .as_ref()
                    .and_then(|au| au.display_name.clone())
                    .unwrap_or_default()
            })
            .collect();
        if !authors_match(authoritative, &candidate_names, MatchPolicy::Lenient) {
            log::debug!("{SOURCE}: title search candidate rejected for '{title}'");
            return None;
        }

        // Best-match positional search: each candidate slot is usable once.
        let mut used = vec![false; candidate_names.len()];
        let per_position = authoritative
            .iter()
            .map(|name| {
                let idx = candidate_names
                    .iter()
                    .enumerate()
                    .find(|(i, c)| !used[*i] && similar(name, c))
                    .map(|(i, _)| i)?;
                used[idx] = true;
                Some(
                    work.authorships[idx]
                        .institutions
                        .iter()
                        .map(|inst| Institution {
                            name: inst.display_name.clone().unwrap_or_default(),
                            country: inst.country_code.clone().unwrap_or_default(),
                        })
                        .collect(),
                )
            })
            .collect();
        Some(per_position)
    }
}

impl FetchByIdentifier for OpenAlex {
    fn fetch_by_doi(&self, doi: &str) -> Option<Value> {
        if doi.is_empty() {
            return None;
        }
        let req = self.get(format!("{}/doi:{doi}", self.works_url));
        absorb(SOURCE, &format!("doi {doi}"), self.gate.execute(&req))
    }
}

impl SearchByTitle for OpenAlex {
    fn search_by_title(&self, title: &str) -> Option<Value> {
        if title.is_empty() {
            return None;
        }
        let req = self
            .get(self.works_url.clone())
            .param("search", title)
            .param("per-page", "1");
        let page = absorb(SOURCE, &format!("search '{title}'"), self.gate.execute(&req))?;
        let page: SearchPage = serde_json::from_value(page).ok()?;
        page.results.into_iter().next()
    }
}

/// Strip the `https://openalex.org/` prefix from entity ids.
pub fn normalize_work_id(id: &str) -> String {
    match id.rsplit_once('/') {
        Some((_, bare)) if id.contains("openalex.org") => bare.to_string(),
        _ => id.to_string(),
    }
}

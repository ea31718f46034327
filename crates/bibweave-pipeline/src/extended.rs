//! Extended stage: Semantic Scholar abstracts, TLDRs and citation stubs.

use std::path::PathBuf;

use bibweave_core::record::PaperRecord;
use bibweave_core::{first_present, load_year_map};
use bibweave_reconcile::{attach_positional, fuzzy_authors_match, merge_institutions};
use bibweave_sources::semantic_scholar::S2Paper;

use crate::context::{filter_years, PipelineContext};
use crate::stage::{classify_input_error, Processed, Stage, StageError};

pub struct ExtendedStage;

impl ExtendedStage {
    /// S2 record for a paper: DOI lookup first, then a title search whose
    /// top candidate must pass the fuzzy author check.
    fn s2_record(&self, ctx: &PipelineContext, record: &PaperRecord) -> Option<S2Paper> {
        if let Some(doi) = record.doi.as_deref() {
            if let Some(paper) = ctx.s2.paper_by_doi(doi) {
                return Some(paper);
            }
        }
        let candidate = ctx.s2.search_paper(&record.title)?;
        let authoritative: Vec<String> =
            record.authors.iter().map(|a| a.name.clone()).collect();
        if fuzzy_authors_match(&authoritative, &candidate.author_names()) {
            Some(candidate)
        } else {
            log::debug!(
                "[extended] title search candidate rejected for '{}'",
                record.title
            );
            None
        }
    }

    fn has_no_institutions(record: &PaperRecord) -> bool {
        record
            .authors
            .iter()
            .all(|a| a.institutions.as_ref().map_or(true, |i| i.is_empty()))
    }
}

impl Stage for ExtendedStage {
    type Item = (String, PaperRecord);
    type Output = PaperRecord;

    fn name(&self) -> &'static str {
        "extended"
    }

    fn load(
        &self,
        ctx: &PipelineContext,
        conference: &str,
        years: &[u16],
    ) -> Result<Vec<(String, PaperRecord)>, StageError> {
        let path = ctx.base_path(conference);
        let map = load_year_map(&path).map_err(|e| classify_input_error(path, e))?;
        Ok(filter_years(map, years))
    }

    fn process(
        &self,
        ctx: &PipelineContext,
        (year, record): &(String, PaperRecord),
    ) -> Option<Processed<PaperRecord>> {
        let mut out = record.clone();
        out.year = year.clone();

        // Names from the index stay authoritative; only institutions may
        // be filled in after the fact. OpenAlex first, CrossRef second.
        if Self::has_no_institutions(record) {
            if let Some(doi) = record.doi.as_deref() {
                if let Some(secondary) = ctx
                    .openalex
                    .authors_and_affiliations(doi, ctx.config.author_fallback)
                {
                    out.authors = merge_institutions(&record.authors, &secondary);
                }
                if Self::has_no_institutions(&out) {
                    let names: Vec<String> =
                        record.authors.iter().map(|a| a.name.clone()).collect();
                    let per_position = ctx.crossref.institutions_by_doi(doi, &names);
                    if !per_position.is_empty() {
                        out.authors = attach_positional(&names, &per_position);
                    }
                }
            }
        }

        if let Some(doi) = record.doi.as_deref() {
            if let Some(refreshed) = ctx.openalex.referenced_works(doi) {
                out.referenced_works = Some(refreshed);
            }
        }

        match self.s2_record(ctx, record) {
            Some(paper) => {
                out.s2_paper_id = paper.paper_id.clone();
                out.abstract_text =
                    first_present([paper.abstract_text.clone(), record.abstract_text.clone()]);
                out.tldr = first_present([paper.tldr_text(), record.tldr.clone()]);
                out.citations = Some(paper.citations);
                Some(Processed {
                    year: year.clone(),
                    output: out,
                    enriched: true,
                })
            }
            // No S2 record: the paper keeps its base fields.
            None => Some(Processed {
                year: year.clone(),
                output: out,
                enriched: false,
            }),
        }
    }

    fn output_path(&self, ctx: &PipelineContext, conference: &str) -> PathBuf {
        ctx.extended_path(conference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bibweave_core::record::{AuthorAffiliation, Institution};

    fn record(authors: Vec<AuthorAffiliation>) -> PaperRecord {
        PaperRecord {
            title: "T".into(),
            year: "2024".into(),
            doi: None,
            source_link: None,
            authors,
            referenced_works: None,
            s2_paper_id: None,
            abstract_text: None,
            tldr: None,
            venue: None,
            citations: None,
        }
    }

    #[test]
    fn missing_and_empty_institutions_both_count_as_none() {
        let bare = record(vec![AuthorAffiliation::bare("A B")]);
        assert!(ExtendedStage::has_no_institutions(&bare));

        let empty = record(vec![AuthorAffiliation {
            name: "A B".into(),
            institutions: Some(vec![]),
        }]);
        assert!(ExtendedStage::has_no_institutions(&empty));

        let filled = record(vec![AuthorAffiliation {
            name: "A B".into(),
            institutions: Some(vec![Institution {
                name: "X".into(),
                country: "US".into(),
            }]),
        }]);
        assert!(!ExtendedStage::has_no_institutions(&filled));
    }
}

//! Citations stage: resolve citation stubs into full cited-paper records.

use std::path::PathBuf;

use bibweave_core::load_year_map;
use bibweave_core::record::{CitationsEntry, PaperRecord};
use bibweave_core::RecordBuilder;
use bibweave_sources::semantic_scholar::S2Paper;

use crate::context::{filter_years, PipelineContext};
use crate::stage::{classify_input_error, Processed, Stage, StageError};

pub struct CitationsStage;

impl CitationsStage {
    /// One cited paper, enriched with OpenAlex affiliations. Cited papers
    /// without a DOI or without a resolvable OpenAlex record are skipped.
    fn cited_record(&self, ctx: &PipelineContext, cited: &S2Paper) -> Option<PaperRecord> {
        let doi = cited.doi()?;
        let authors = ctx.openalex.authors_and_affiliations(&doi, false)?;
        let title = cited.title.clone()?;
        let year = cited.year?.to_string();

        let mut builder = RecordBuilder::new();
        let build = builder
            .title(title)
            .and_then(|b| b.year(year))
            .map(|b| {
                b.doi(Some(doi))
                    .venue(cited.venue.clone())
                    .authors(authors)
                    .build()
            });
        match build {
            Ok(Ok(record)) => Some(record),
            Ok(Err(e)) | Err(e) => {
                log::debug!("[citations] skipping cited paper: {e}");
                None
            }
        }
    }
}

impl Stage for CitationsStage {
    type Item = (String, PaperRecord);
    type Output = CitationsEntry;

    fn name(&self) -> &'static str {
        "citations"
    }

    fn load(
        &self,
        ctx: &PipelineContext,
        conference: &str,
        years: &[u16],
    ) -> Result<Vec<(String, PaperRecord)>, StageError> {
        let path = ctx.extended_path(conference);
        let map = load_year_map(&path).map_err(|e| classify_input_error(path, e))?;
        Ok(filter_years(map, years))
    }

    fn process(
        &self,
        ctx: &PipelineContext,
        (year, record): &(String, PaperRecord),
    ) -> Option<Processed<CitationsEntry>> {
        let ids: Vec<String> = record
            .citations
            .iter()
            .flatten()
            .filter_map(|stub| stub.paper_id.clone())
            .collect();

        let cited_papers: Vec<PaperRecord> = if ids.is_empty() {
            Vec::new()
        } else {
            ctx.s2
                .batch_papers(&ids)
                .iter()
                .filter_map(|cited| self.cited_record(ctx, cited))
                .collect()
        };

        let enriched = !cited_papers.is_empty();
        Some(Processed {
            year: year.clone(),
            output: CitationsEntry {
                title: record.title.clone(),
                cited_papers,
            },
            enriched,
        })
    }

    fn output_path(&self, ctx: &PipelineContext, conference: &str) -> PathBuf {
        ctx.citations_path(conference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bibweave_core::record::CitationStub;

    #[test]
    fn stub_ids_skip_missing_paper_ids() {
        let citations = vec![
            CitationStub {
                paper_id: Some("a".into()),
                title: None,
            },
            CitationStub {
                paper_id: None,
                title: Some("untracked".into()),
            },
        ];
        let ids: Vec<String> = citations.iter().filter_map(|c| c.paper_id.clone()).collect();
        assert_eq!(ids, vec!["a"]);
    }
}

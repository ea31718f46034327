//! Base stage: DBLP stubs enriched with OpenAlex affiliations.

use std::path::PathBuf;

use bibweave_core::record::{AuthorAffiliation, PaperRecord, PaperStub};
use bibweave_core::RecordBuilder;
use bibweave_reconcile::attach_positional;

use crate::context::PipelineContext;
use crate::stage::{Processed, Stage, StageError};

pub struct BaseStage;

impl Stage for BaseStage {
    type Item = PaperStub;
    type Output = PaperRecord;

    fn name(&self) -> &'static str {
        "base"
    }

    fn load(
        &self,
        _ctx: &PipelineContext,
        conference: &str,
        years: &[u16],
    ) -> Result<Vec<PaperStub>, StageError> {
        bibweave_dblp::harvest(conference, years).map_err(StageError::Load)
    }

    fn process(&self, ctx: &PipelineContext, stub: &PaperStub) -> Option<Processed<PaperRecord>> {
        let mut authors: Option<Vec<AuthorAffiliation>> = None;
        let mut referenced_works = None;

        if let Some(doi) = stub.doi.as_deref() {
            authors = ctx
                .openalex
                .authors_and_affiliations(doi, ctx.config.author_fallback);
            referenced_works = ctx.openalex.referenced_works(doi);
        }
        // No identifier or no hit: try matching the work by title, keeping
        // the DBLP names and taking only the institutions.
        if authors.is_none() && !stub.authors.is_empty() {
            authors = ctx
                .openalex
                .institutions_by_title(&stub.title, &stub.authors)
                .map(|per_position| attach_positional(&stub.authors, &per_position));
        }
        let enriched = authors.is_some() || referenced_works.is_some();
        let authors = authors
            .unwrap_or_else(|| stub.authors.iter().map(AuthorAffiliation::bare).collect());

        let mut builder = RecordBuilder::new();
        let build = builder
            .title(stub.title.clone())
            .and_then(|b| b.year(stub.year.clone()))
            .map(|b| {
                b.doi(stub.doi.clone())
                    .source_link(stub.source_link.clone())
                    .authors(authors)
                    .referenced_works(referenced_works)
                    .build()
            });
        match build {
            Ok(Ok(record)) => Some(Processed {
                year: stub.year.clone(),
                output: record,
                enriched,
            }),
            Ok(Err(e)) | Err(e) => {
                log::error!("[base] dropping '{}': {e}", stub.title);
                None
            }
        }
    }

    fn output_path(&self, ctx: &PipelineContext, conference: &str) -> PathBuf {
        ctx.base_path(conference)
    }
}

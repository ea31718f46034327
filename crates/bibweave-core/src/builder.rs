//! Accumulator for assembling a [`PaperRecord`] from several sources.

use crate::record::{AuthorAffiliation, CitationStub, PaperRecord};

/// Validation failure for a required field. Fatal for the paper being
/// built, never for the run.
#[derive(Debug, PartialEq)]
pub enum BuildError {
    EmptyTitle,
    EmptyYear,
    MissingTitle,
    MissingYear,
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title cannot be empty"),
            Self::EmptyYear => write!(f, "year cannot be empty"),
            Self::MissingTitle => write!(f, "title is required"),
            Self::MissingYear => write!(f, "year is required"),
        }
    }
}

impl std::error::Error for BuildError {}

/// Field accumulator. Each setter stores one field and returns the builder
/// for chaining; [`build`](RecordBuilder::build) resets the state so one
/// instance can be reused sequentially (not concurrently).
#[derive(Debug, Default)]
pub struct RecordBuilder {
    title: Option<String>,
    year: Option<String>,
    doi: Option<String>,
    source_link: Option<String>,
    authors: Vec<AuthorAffiliation>,
    referenced_works: Option<Vec<String>>,
    s2_paper_id: Option<String>,
    abstract_text: Option<String>,
    tldr: Option<String>,
    venue: Option<String>,
    citations: Option<Vec<CitationStub>>,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&mut self, title: impl Into<String>) -> Result<&mut Self, BuildError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(BuildError::EmptyTitle);
        }
        self.title = Some(title.trim().to_string());
        Ok(self)
    }

    pub fn year(&mut self, year: impl Into<String>) -> Result<&mut Self, BuildError> {
        let year = year.into();
        if year.trim().is_empty() {
            return Err(BuildError::EmptyYear);
        }
        self.year = Some(year.trim().to_string());
        Ok(self)
    }

    pub fn doi(&mut self, doi: Option<String>) -> &mut Self {
        if let Some(d) = &doi {
            if !d.starts_with("10.") {
                log::warn!("DOI '{d}' does not start with '10.', may be invalid");
            }
        }
        self.doi = doi;
        self
    }

    pub fn source_link(&mut self, link: Option<String>) -> &mut Self {
        self.source_link = link;
        self
    }

    pub fn authors(&mut self, authors: Vec<AuthorAffiliation>) -> &mut Self {
        self.authors = authors;
        self
    }

    pub fn referenced_works(&mut self, works: Option<Vec<String>>) -> &mut Self {
        self.referenced_works = works;
        self
    }

    pub fn s2_paper_id(&mut self, id: Option<String>) -> &mut Self {
        self.s2_paper_id = id;
        self
    }

    pub fn abstract_text(&mut self, text: Option<String>) -> &mut Self {
        self.abstract_text = text;
        self
    }

    pub fn tldr(&mut self, tldr: Option<String>) -> &mut Self {
        self.tldr = tldr;
        self
    }

    pub fn venue(&mut self, venue: Option<String>) -> &mut Self {
        self.venue = venue;
        self
    }

    pub fn citations(&mut self, citations: Option<Vec<CitationStub>>) -> &mut Self {
        self.citations = citations;
        self
    }

    /// Produce the immutable record and reset the builder.
    pub fn build(&mut self) -> Result<PaperRecord, BuildError> {
        let state = std::mem::take(self);
        Ok(PaperRecord {
            title: state.title.ok_or(BuildError::MissingTitle)?,
            year: state.year.ok_or(BuildError::MissingYear)?,
            doi: state.doi,
            source_link: state.source_link,
            authors: state.authors,
            referenced_works: state.referenced_works,
            s2_paper_id: state.s2_paper_id,
            abstract_text: state.abstract_text,
            tldr: state.tldr,
            venue: state.venue,
            citations: state.citations,
        })
    }
}

/// Earliest present candidate wins.
///
/// Used when the same field can be supplied redundantly by two call sites;
/// the ordering of `candidates` is the priority order.
pub fn first_present<T>(candidates: impl IntoIterator<Item = Option<T>>) -> Option<T> {
    candidates.into_iter().flatten().next()
}

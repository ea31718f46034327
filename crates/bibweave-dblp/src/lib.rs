//! bibweave-dblp — harvesting paper stubs from DBLP conference listings.
//!
//! DBLP is the authoritative source: its titles, years and author name
//! spellings are never overwritten by enrichment data downstream.

use anyhow::Context;
use bibweave_core::get_text;
use bibweave_core::record::PaperStub;

pub mod listing;
pub mod parser;

pub use listing::{index_url, volume_links};
pub use parser::{clean_doi, parse_volume};

/// All main-track paper stubs for a conference over the given years.
///
/// Fetches the conference index, then every matching volume page. A
/// failure here fails the whole conference load; per-paper problems are
/// handled inside the parser by dropping the item.
pub fn harvest(conference: &str, years: &[u16]) -> anyhow::Result<Vec<PaperStub>> {
    let index = index_url(conference);
    let index_html = get_text(&index).with_context(|| format!("fetching index {index}"))?;
    let links = volume_links(&index_html, conference, years);
    log::info!("{conference}: {} volume page(s) for {years:?}", links.len());

    let mut stubs = Vec::new();
    for link in &links {
        let html = get_text(link).with_context(|| format!("fetching volume {link}"))?;
        let mut page_stubs = parse_volume(&html);
        log::debug!("{link}: {} paper(s)", page_stubs.len());
        stubs.append(&mut page_stubs);
    }
    Ok(stubs)
}

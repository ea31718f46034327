//! Volume page parsing: ScholarlyArticle items into paper stubs.

use std::sync::LazyLock;

use bibweave_core::record::PaperStub;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Section headings whose publication lists are not main-track papers.
const SKIP_SECTIONS: &[&str] = &[
    "workshop",
    "tutorial",
    "keynote",
    "panel",
    "poster",
    "demo",
    "doctoral",
    "posters",
    "short papers",
    "demos",
    "short paper",
    "tutorials",
    "demonstration",
    "phd symposium",
    "short research",
];

static SKIPPED_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(Demo:|Poster:|Welcome Message|Poster Paper:|Demo Paper:)")
        .expect("title pattern is valid")
});

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

/// All main-track paper stubs on one volume page, in document order.
///
/// DBLP groups papers into `ul.publ-list` blocks under session headings.
/// The nearest preceding h2, h3 and h4 are each consulted; a block is
/// skipped when any of the three matches a skip keyword, so an h3 like
/// "Session 1" cannot launder papers under a "Workshops" h2. Malformed
/// items are dropped, not errors.
pub fn parse_volume(html: &str) -> Vec<PaperStub> {
    let article_sel = selector("li[itemtype=\"http://schema.org/ScholarlyArticle\"]");
    let document = Html::parse_document(html);

    let mut stubs = Vec::new();
    // Last heading seen per level: h2, h3, h4.
    let mut headings = [String::new(), String::new(), String::new()];
    for node in document.root_element().descendants() {
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };
        match element.value().name() {
            name @ ("h2" | "h3" | "h4") => {
                let level = match name {
                    "h2" => 0,
                    "h3" => 1,
                    _ => 2,
                };
                headings[level] = element
                    .text()
                    .collect::<String>()
                    .replace('\n', "")
                    .to_lowercase();
            }
            "ul" => {
                if !element.value().classes().any(|c| c == "publ-list") {
                    continue;
                }
                if headings
                    .iter()
                    .any(|h| SKIP_SECTIONS.iter().any(|s| h.contains(s)))
                {
                    log::debug!("skipping section '{}'", headings.join(" / "));
                    continue;
                }
                for article in element.select(&article_sel) {
                    if let Some(stub) = parse_article(article) {
                        stubs.push(stub);
                    }
                }
            }
            _ => {}
        }
    }
    stubs
}

fn parse_article(article: ElementRef<'_>) -> Option<PaperStub> {
    let title_sel = selector("span.title");
    let year_sel = selector("span[itemprop=\"datePublished\"]");
    let year_meta_sel = selector("meta[itemprop=\"datePublished\"]");
    let author_sel = selector("span[itemprop=\"author\"]");
    let anchor_sel = selector("a[href]");

    let title = article
        .select(&title_sel)
        .next()?
        .text()
        .collect::<String>()
        .trim()
        .to_string();
    if SKIPPED_TITLE.is_match(&title) {
        log::debug!("dropping non-paper entry '{title}'");
        return None;
    }

    let year = article
        .select(&year_sel)
        .next()
        .map(|span| span.text().collect::<String>())
        .or_else(|| {
            article
                .select(&year_meta_sel)
                .next()
                .and_then(|meta| meta.value().attr("content").map(str::to_string))
        })?;

    let mut authors: Vec<String> = Vec::new();
    for span in article.select(&author_sel) {
        let name = span.text().collect::<String>().trim().to_string();
        if !name.is_empty() && !authors.contains(&name) {
            authors.push(name);
        }
    }

    let hrefs: Vec<&str> = article
        .select(&anchor_sel)
        .filter_map(|a| a.value().attr("href"))
        .collect();
    let source_link = hrefs
        .iter()
        .find(|h| h.contains("openalex"))
        .map(|h| h.to_string());
    let doi = hrefs
        .iter()
        .find(|h| h.contains("doi.org"))
        .map(|h| clean_doi(h))
        .or_else(|| {
            source_link
                .as_deref()
                .and_then(|link| link.split_once("/works/doi:").map(|(_, d)| d.to_string()))
        });

    Some(PaperStub {
        title,
        year,
        authors,
        doi,
        source_link,
    })
}

/// Bare DOI from a resolver URL: scheme/host and query string stripped.
pub fn clean_doi(url: &str) -> String {
    let doi = url
        .trim_start_matches("https://doi.org/")
        .trim_start_matches("http://doi.org/")
        .trim_start_matches("https://dx.doi.org/")
        .trim_start_matches("http://dx.doi.org/");
    match doi.split_once('?') {
        Some((bare, _)) => bare.to_string(),
        None => doi.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, year: &str, authors: &[&str], hrefs: &[&str]) -> String {
        let author_spans: String = authors
            .iter()
            .map(|a| format!("<span itemprop=\"author\"><span itemprop=\"name\">{a}</span></span>"))
            .collect();
        let anchors: String = hrefs
            .iter()
            .map(|h| format!("<a href=\"{h}\">link</a>"))
            .collect();
        format!(
            "<li itemtype=\"http://schema.org/ScholarlyArticle\">\
               <div class=\"nav\">{anchors}</div>\
               <cite class=\"data\">{author_spans}\
                 <span class=\"title\" itemprop=\"name\">{title}</span>\
                 <span itemprop=\"datePublished\">{year}</span>\
               </cite>\
             </li>"
        )
    }

    fn page(sections: &[(&str, &str)]) -> String {
        let body: String = sections
            .iter()
            .map(|(heading, items)| {
                format!("<h2>{heading}</h2><ul class=\"publ-list\">{items}</ul>")
            })
            .collect();
        format!("<html><body>{body}</body></html>")
    }

    #[test]
    fn extracts_stub_fields() {
        let html = page(&[(
            "Main Track",
            &article(
                "Fast Consensus.",
                "2024",
                &["Jane Doe", "John Smith"],
                &[
                    "https://doi.org/10.1145/12345?param=1",
                    "https://api.openalex.org/works/doi:10.1145/12345",
                ],
            ),
        )]);
        let stubs = parse_volume(&html);
        assert_eq!(stubs.len(), 1);
        let stub = &stubs[0];
        assert_eq!(stub.title, "Fast Consensus.");
        assert_eq!(stub.year, "2024");
        assert_eq!(stub.authors, vec!["Jane Doe", "John Smith"]);
        assert_eq!(stub.doi.as_deref(), Some("10.1145/12345"));
        assert_eq!(
            stub.source_link.as_deref(),
            Some("https://api.openalex.org/works/doi:10.1145/12345")
        );
    }

    #[test]
    fn workshop_sections_are_skipped() {
        let html = page(&[
            ("Accepted Papers", &article("Kept", "2024", &["A B"], &[])),
            ("Workshop Papers", &article("Dropped", "2024", &["C D"], &[])),
        ]);
        let stubs = parse_volume(&html);
        assert_eq!(stubs.len(), 1);
        assert_eq!(stubs[0].title, "Kept");
    }

    #[test]
    fn session_subheading_does_not_unskip_a_workshop_block() {
        let kept = article("Kept", "2024", &["A B"], &[]);
        let dropped = article("Dropped", "2024", &["C D"], &[]);
        let html = format!(
            "<html><body>\
               <h2>Accepted Papers</h2>\
               <ul class=\"publ-list\">{kept}</ul>\
               <h2>Workshops</h2>\
               <h3>Session 1</h3>\
               <ul class=\"publ-list\">{dropped}</ul>\
             </body></html>"
        );
        let stubs = parse_volume(&html);
        assert_eq!(stubs.len(), 1);
        assert_eq!(stubs[0].title, "Kept");
    }

    #[test]
    fn heading_match_is_case_insensitive() {
        let html = page(&[("PhD Symposium", &article("Dropped", "2024", &["A B"], &[]))]);
        assert!(parse_volume(&html).is_empty());
    }

    #[test]
    fn non_paper_titles_are_filtered() {
        let html = page(&[(
            "Main Track",
            &format!(
                "{}{}",
                article("Demo: Shiny Tool", "2024", &["A B"], &[]),
                article("Real Paper", "2024", &["A B"], &[]),
            ),
        )]);
        let stubs = parse_volume(&html);
        assert_eq!(stubs.len(), 1);
        assert_eq!(stubs[0].title, "Real Paper");
    }

    #[test]
    fn year_falls_back_to_meta_content() {
        let item = "<li itemtype=\"http://schema.org/ScholarlyArticle\">\
                      <cite class=\"data\">\
                        <span itemprop=\"author\">A B</span>\
                        <span class=\"title\" itemprop=\"name\">T</span>\
                        <meta itemprop=\"datePublished\" content=\"2023\">\
                      </cite>\
                    </li>";
        let stubs = parse_volume(&page(&[("Main Track", item)]));
        assert_eq!(stubs[0].year, "2023");
    }

    #[test]
    fn doi_recovered_from_source_link() {
        let html = page(&[(
            "Main Track",
            &article(
                "T",
                "2024",
                &["A B"],
                &["https://api.openalex.org/works/doi:10.1/abc"],
            ),
        )]);
        let stubs = parse_volume(&html);
        assert_eq!(stubs[0].doi.as_deref(), Some("10.1/abc"));
    }

    #[test]
    fn repeated_author_names_collapse() {
        let html = page(&[(
            "Main Track",
            &article("T", "2024", &["A B", "A B", "C D"], &[]),
        )]);
        assert_eq!(parse_volume(&html)[0].authors, vec!["A B", "C D"]);
    }

    #[test]
    fn clean_doi_strips_resolver_variants() {
        assert_eq!(clean_doi("https://doi.org/10.1/x"), "10.1/x");
        assert_eq!(clean_doi("http://dx.doi.org/10.1/x?y=z"), "10.1/x");
        assert_eq!(clean_doi("10.1/x"), "10.1/x");
    }
}

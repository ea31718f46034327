//! Conference index pages: which volume links belong to a year range.

use regex::Regex;
use scraper::{Html, Selector};

/// DBLP directory and volume-name pattern for a conference key.
///
/// Two keys do not match their directory: USENIX ATC lives under `usenix`,
/// and the `cloud` directory holds `socc`-named volumes.
pub fn directory_and_pattern(conference: &str) -> (&str, &str) {
    match conference {
        "atc" => ("usenix", "usenix"),
        "cloud" => ("cloud", "socc"),
        other => (other, other),
    }
}

/// Index URL for a conference.
pub fn index_url(conference: &str) -> String {
    let (directory, _) = directory_and_pattern(conference);
    format!("https://dblp.org/db/conf/{directory}/")
}

/// Volume page links for the requested years, extracted from the index
/// page HTML. Proceedings may split into several volumes
/// (`europar2024-1.html`); workshop volumes (`europar2024w1.html`) never
/// match.
pub fn volume_links(index_html: &str, conference: &str, years: &[u16]) -> Vec<String> {
    let (directory, pattern) = directory_and_pattern(conference);
    let volume_re = Regex::new(&format!(
        r"^https://dblp\.org/db/conf/{directory}/{pattern}(\d{{4}})(-\d+)?\.html$"
    ))
    .expect("volume pattern is valid");

    let anchor = Selector::parse("a[href]").expect("static selector");
    let document = Html::parse_document(index_html);
    let mut links: Vec<String> = document
        .select(&anchor)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| {
            volume_re.captures(href).is_some_and(|caps| {
                caps[1]
                    .parse::<u16>()
                    .is_ok_and(|year| years.contains(&year))
            })
        })
        .map(str::to_string)
        .collect();
    links.sort();
    links.dedup();
    links
}

//! Canonical paper records and their on-disk JSON schema.
//!
//! Field names are capitalized to stay compatible with the stage files the
//! crawler has always produced (`"Title"`, `"DOI Number"`, ...).

use serde::{Deserialize, Serialize};

/// Raw paper stub from the bibliographic index (DBLP).
///
/// The author list here is the authoritative citation order; reconciliation
/// never rewrites these names.
#[derive(Debug, Clone, PartialEq)]
pub struct PaperStub {
    pub title: String,
    pub year: String,
    pub authors: Vec<String>,
    pub doi: Option<String>,
    pub source_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Institution {
    #[serde(rename = "Institution Name")]
    pub name: String,
    /// Empty when the source cannot supply it (CrossRef has no countries).
    #[serde(rename = "Country")]
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorAffiliation {
    #[serde(rename = "Author")]
    pub name: String,
    #[serde(rename = "Institutions")]
    pub institutions: Option<Vec<Institution>>,
}

impl AuthorAffiliation {
    /// An author with no institution data attached.
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            institutions: None,
        }
    }
}

/// Citation stub as returned by Semantic Scholar's `citations` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationStub {
    #[serde(rename = "paperId")]
    pub paper_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Canonical merged record for one paper.
///
/// Title and year are always present; everything else only when some source
/// supplied it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperRecord {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Year")]
    pub year: String,
    #[serde(rename = "DOI Number", default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(
        rename = "OpenAlex Link",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub source_link: Option<String>,
    #[serde(rename = "Authors and Institutions", default)]
    pub authors: Vec<AuthorAffiliation>,
    #[serde(
        rename = "OpenAlex Referenced Works",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub referenced_works: Option<Vec<String>>,
    #[serde(
        rename = "S2 Paper ID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub s2_paper_id: Option<String>,
    #[serde(rename = "Abstract", default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    #[serde(rename = "TLDR", default, skip_serializing_if = "Option::is_none")]
    pub tldr: Option<String>,
    #[serde(rename = "Venue", default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(rename = "Citations", default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<CitationStub>>,
}

/// Citations-stage output entry: one citing paper and its resolved citers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationsEntry {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Cited Papers")]
    pub cited_papers: Vec<PaperRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_serializes_with_legacy_field_names() {
        let record = PaperRecord {
            title: "A Paper".into(),
            year: "2023".into(),
            doi: Some("10.1/x".into()),
            source_link: None,
            authors: vec![AuthorAffiliation {
                name: "A. Lee".into(),
                institutions: Some(vec![Institution {
                    name: "X University".into(),
                    country: "US".into(),
                }]),
            }],
            referenced_works: None,
            s2_paper_id: None,
            abstract_text: None,
            tldr: None,
            venue: None,
            citations: None,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["Title"], "A Paper");
        assert_eq!(value["DOI Number"], "10.1/x");
        assert_eq!(
            value["Authors and Institutions"][0]["Institutions"][0]["Institution Name"],
            "X University"
        );
        // Absent optionals are omitted entirely.
        assert!(value.get("Abstract").is_none());
        assert!(value.get("OpenAlex Link").is_none());
    }

    #[test]
    fn record_roundtrips_from_stage_file_shape() {
        let value = json!({
            "Title": "T",
            "Year": "2020",
            "Authors and Institutions": [
                {"Author": "B. Kim", "Institutions": null}
            ]
        });
        let record: PaperRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.year, "2020");
        assert_eq!(record.authors[0], AuthorAffiliation::bare("B. Kim"));
        assert!(record.doi.is_none());
    }

    #[test]
    fn citation_stub_keeps_s2_key_casing() {
        let stub = CitationStub {
            paper_id: Some("abc".into()),
            title: None,
        };
        let value = serde_json::to_value(&stub).unwrap();
        assert_eq!(value["paperId"], "abc");
    }
}

//! Institution merge onto an authoritative author list.
//!
//! The authoritative names come from the bibliographic index and are never
//! replaced. A merge that cannot be trusted is abandoned wholesale rather
//! than guessed at.

use bibweave_core::record::{AuthorAffiliation, Institution};

use crate::similar::similar;

/// Attach institutions from a secondary source positionally.
///
/// Cardinality mismatch abandons the merge and returns the authoritative
/// list unchanged. Within a matched list, a position whose names disagree
/// gets institutions = absent, never the secondary's name or a guess.
pub fn merge_institutions(
    authoritative: &[AuthorAffiliation],
    secondary: &[AuthorAffiliation],
) -> Vec<AuthorAffiliation> {
    if authoritative.is_empty() || secondary.is_empty() {
        return authoritative.to_vec();
    }
    if authoritative.len() != secondary.len() {
        log::warn!(
            "author count mismatch in merge: authoritative={}, secondary={}",
            authoritative.len(),
            secondary.len()
        );
        return authoritative.to_vec();
    }

    authoritative
        .iter()
        .zip(secondary)
        .enumerate()
        .map(|(position, (auth, sec))| {
            let institutions = if similar(&auth.name, &sec.name) {
                sec.institutions.clone()
            } else {
                log::warn!(
                    "author mismatch at position {position}: '{}' vs '{}'",
                    auth.name,
                    sec.name
                );
                None
            };
            AuthorAffiliation {
                name: auth.name.clone(),
                institutions,
            }
        })
        .collect()
}

/// Zip authoritative names with one optional institution list per position.
/// Positions beyond the supplied lists get institutions = absent.
pub fn attach_positional(
    names: &[String],
    institutions: &[Option<Vec<Institution>>],
) -> Vec<AuthorAffiliation> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| AuthorAffiliation {
            name: name.clone(),
            institutions: institutions.get(i).cloned().flatten(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare(names: &[&str]) -> Vec<AuthorAffiliation> {
        names.iter().map(|n| AuthorAffiliation::bare(*n)).collect()
    }

    fn inst(name: &str, country: &str) -> Institution {
        Institution {
            name: name.into(),
            country: country.into(),
        }
    }

    #[test]
    fn cardinality_mismatch_abandons_merge() {
        let auth = bare(&["A. Lee", "B. Kim"]);
        let secondary = vec![
            AuthorAffiliation {
                name: "A. Lee".into(),
                institutions: Some(vec![inst("X University", "US")]),
            },
            AuthorAffiliation::bare("B. Kim"),
            AuthorAffiliation::bare("C. Park"),
        ];
        let merged = merge_institutions(&auth, &secondary);
        assert_eq!(merged, auth);
        assert!(merged.iter().all(|a| a.institutions.is_none()));
    }

    #[test]
    fn matched_cardinality_attaches_positionally() {
        let auth = bare(&["A. Lee", "B. Kim"]);
        let secondary = vec![
            AuthorAffiliation {
                name: "A. Lee".into(),
                institutions: Some(vec![inst("X University", "US")]),
            },
            AuthorAffiliation {
                name: "B. Kim".into(),
                institutions: Some(vec![]),
            },
        ];
        let merged = merge_institutions(&auth, &secondary);
        assert_eq!(merged[0].name, "A. Lee");
        assert_eq!(
            merged[0].institutions,
            Some(vec![inst("X University", "US")])
        );
        assert_eq!(merged[1].institutions, Some(vec![]));
    }

    #[test]
    fn names_are_never_taken_from_secondary() {
        let auth = bare(&["Hans Müller"]);
        let secondary = vec![AuthorAffiliation {
            name: "Hans Muller".into(),
            institutions: Some(vec![inst("TU Wien", "AT")]),
        }];
        let merged = merge_institutions(&auth, &secondary);
        assert_eq!(merged[0].name, "Hans Müller");
        assert!(merged[0].institutions.is_some());
    }

    #[test]
    fn dissimilar_position_gets_no_institutions() {
        let auth = bare(&["A. Lee", "B. Kim"]);
        let secondary = vec![
            AuthorAffiliation {
                name: "Z. Wrong".into(),
                institutions: Some(vec![inst("Wherever", "")]),
            },
            AuthorAffiliation {
                name: "B. Kim".into(),
                institutions: Some(vec![inst("Y Lab", "KR")]),
            },
        ];
        let merged = merge_institutions(&auth, &secondary);
        assert!(merged[0].institutions.is_none());
        assert_eq!(merged[1].institutions, Some(vec![inst("Y Lab", "KR")]));
    }

    #[test]
    fn attach_positional_pads_with_absent() {
        let names = vec!["A. Lee".to_string(), "B. Kim".to_string()];
        let per_position = vec![Some(vec![inst("X", "US")])];
        let out = attach_positional(&names, &per_position);
        assert_eq!(out.len(), 2);
        assert!(out[0].institutions.is_some());
        assert!(out[1].institutions.is_none());
    }
}

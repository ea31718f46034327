//! Pairwise and list-level author matching.

use crate::normalize::{fuzzy_normalize, normalize_name};

/// Edit-distance ratio threshold for the fuzzy path (0..=1 scale).
const FUZZY_THRESHOLD: f64 = 0.75;

/// Decide whether two display names denote the same author.
///
/// Exact normalized match (including reordered "Surname, Given" forms) wins;
/// otherwise surnames must match exactly and the first name must agree —
/// fully when both sides spell it out, by initial when either side
/// abbreviates ("J. Smith" vs "John Smith").
pub fn similar(a: &str, b: &str) -> bool {
    let na = normalize_name(a);
    let nb = normalize_name(b);
    if na.is_empty() || nb.is_empty() {
        return false;
    }
    if na == nb {
        return true;
    }

    let tokens_a: Vec<&str> = na.split(' ').collect();
    let tokens_b: Vec<&str> = nb.split(' ').collect();
    {
        let mut sorted_a = tokens_a.clone();
        let mut sorted_b = tokens_b.clone();
        sorted_a.sort_unstable();
        sorted_b.sort_unstable();
        if sorted_a == sorted_b {
            return true;
        }
    }

    if tokens_a.last() != tokens_b.last() {
        return false;
    }
    let first_a = tokens_a[0];
    let first_b = tokens_b[0];
    if first_a.chars().count() == 1 || first_b.chars().count() == 1 {
        first_a.chars().next() == first_b.chars().next()
    } else {
        first_a == first_b
    }
}

/// List-level match policy; varies by source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchPolicy {
    /// Exact cardinality required upfront; ≥ 80% positional matches.
    Strict,
    /// Cardinality mismatch tolerated; best-match search per author;
    /// ≥ max(2, half the authoritative length) matches.
    Lenient,
}

/// Decide whether `candidate` plausibly lists the same paper's authors as
/// the authoritative list. Never trusted for merging unless this passes.
pub fn authors_match(authoritative: &[String], candidate: &[String], policy: MatchPolicy) -> bool {
    if authoritative.is_empty() || candidate.is_empty() {
        return false;
    }
    match policy {
        MatchPolicy::Strict => {
            if authoritative.len() != candidate.len() {
                return false;
            }
            let matches = authoritative
                .iter()
                .zip(candidate)
                .filter(|(a, c)| similar(a, c))
                .count();
            let required = ((authoritative.len() as f64 * 0.8) as usize).max(1);
            matches >= required
        }
        MatchPolicy::Lenient => {
            let mut used = vec![false; candidate.len()];
            let mut matches = 0usize;
            for name in authoritative {
                if let Some(idx) = candidate
                    .iter()
                    .enumerate()
                    .position(|(i, c)| !used[i] && similar(name, c))
                {
                    used[idx] = true;
                    matches += 1;
                }
            }
            matches >= authoritative.len().div_ceil(2).max(2)
        }
    }
}

/// Fuzzy list match used on the extended-merge path: positional pairs over
/// the common prefix, counted when the normalized edit-distance ratio
/// reaches the threshold; at least half the authoritative list must score.
pub fn fuzzy_authors_match(authoritative: &[String], candidate: &[String]) -> bool {
    if authoritative.is_empty() || candidate.is_empty() {
        return false;
    }
    let pairs = authoritative.len().min(candidate.len());
    let scored = (0..pairs)
        .filter(|&i| {
            strsim::normalized_levenshtein(
                &fuzzy_normalize(&authoritative[i]),
                &fuzzy_normalize(&candidate[i]),
            ) >= FUZZY_THRESHOLD
        })
        .count();
    scored as f64 >= authoritative.len() as f64 / 2.0
}

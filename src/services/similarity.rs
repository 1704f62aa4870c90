//! Normalized textual similarity for free-text grading.
//!
//! Metric: Levenshtein edit distance over normalized strings, scaled to
//! [0, 1] as `1 - distance / max(len)`. The choice matters at the
//! threshold boundary: one edit on a five-character answer scores 0.8,
//! below the 0.9 default threshold.

/// Case- and whitespace-normalization applied before comparison:
/// trim, lowercase, collapse internal whitespace runs to single spaces.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Similarity of `candidate` against `reference` in [0, 1].
/// Deterministic; exact match after normalization is 1.0, an empty
/// candidate is 0.0 regardless of the reference.
pub fn score(candidate: &str, reference: &str) -> f64 {
    let candidate = normalize(candidate);
    let reference = normalize(reference);

    if candidate.is_empty() {
        return 0.0;
    }
    if candidate == reference {
        return 1.0;
    }
    if reference.is_empty() {
        return 0.0;
    }

    let candidate: Vec<char> = candidate.chars().collect();
    let reference: Vec<char> = reference.chars().collect();
    let distance = levenshtein(&candidate, &reference);
    let max_len = candidate.len().max(reference.len());

    1.0 - distance as f64 / max_len as f64
}

/// Two-row Levenshtein over char slices.
fn levenshtein(a: &[char], b: &[char]) -> usize {
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

//! Search terms derived from a color's display name.

use std::collections::HashSet;

/// Words never searched on their own.
const WORD_STOP_LIST: &[&str] = &[
    "the", "a", "in", "of", "an", "on", "and", "or", "for", "to", "is", "are", "was", "were",
    "be", "by", "with",
];

/// Words a two-word pair may not start or end with. Narrower than
/// `WORD_STOP_LIST` so pairs like "Salmon and" survive.
const PAIR_EDGE_STOP_LIST: &[&str] = &["the", "a", "in", "of", "an", "on"];

fn in_list(list: &[&str], word: &str) -> bool {
    let lower = word.to_lowercase();
    list.contains(&lower.as_str())
}

/// Returns the unique search terms for `name`, in insertion order: the
/// whole name, then meaningful single words, then meaningful adjacent pairs
/// (only for names of three or more words).
pub fn derive_terms(name: &str) -> Vec<String> {
    let name = name.trim();
    let mut terms = Vec::new();
    if name.is_empty() {
        return terms;
    }

    let mut seen = HashSet::new();
    let mut push = |term: String| {
        if !term.is_empty() && seen.insert(term.clone()) {
            terms.push(term);
        }
    };

    push(name.to_string());

    let words: Vec<&str> = name.split_whitespace().collect();
    for word in &words {
        if word.chars().count() > 2 && !in_list(WORD_STOP_LIST, word) {
            push(word.to_string());
        }
    }

    if words.len() > 2 {
        for pair in words.windows(2) {
            if !in_list(PAIR_EDGE_STOP_LIST, pair[0]) && !in_list(PAIR_EDGE_STOP_LIST, pair[1]) {
                push(format!("{} {}", pair[0], pair[1]));
            }
        }
    }

    terms
}

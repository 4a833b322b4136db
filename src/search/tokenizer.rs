//! Token generation for the search index

/// Shortest word prefix that gets its own token
pub const MIN_PREFIX_LEN: usize = 2;

/// Tokens for one piece of text: the full lower-cased text, every word, and
/// every word prefix of at least [`MIN_PREFIX_LEN`] characters.
pub fn index_terms(text: &str) -> Vec<String> {
    let lower = text.trim().to_lowercase();
    if lower.is_empty() {
        return Vec::new();
    }

    let mut terms = vec![lower.split_whitespace().collect::<Vec<_>>().join(" ")];
    for word in lower.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        for len in MIN_PREFIX_LEN..=chars.len() {
            terms.push(chars[..len].iter().collect());
        }
        if chars.len() < MIN_PREFIX_LEN {
            terms.push(word.to_string());
        }
    }

    terms.sort_unstable();
    terms.dedup();
    terms
}

/// Query words that take part in matching (at least two characters)
pub fn query_terms(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .filter(|term| term.chars().count() >= MIN_PREFIX_LEN)
        .collect()
}

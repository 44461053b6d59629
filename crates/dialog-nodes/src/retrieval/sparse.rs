//! Sparse query encoding
//!
//! Turns a corpus-language query string into weighted terms for the sparse
//! side of the hybrid lookup. Weighting is term frequency within the query;
//! the encoding is fully deterministic for a given string.
//!
//! Alphanumeric runs become lowercased word tokens. CJK characters become
//! one token each: the corpus is Traditional Chinese, which carries no
//! whitespace word boundaries, so per-character terms are the overlap unit
//! the index can actually match on.

use providers::SparseTerm;

/// Encode a query into frequency-weighted sparse terms.
///
/// Terms appear in first-occurrence order.
pub fn encode(query: &str) -> Vec<SparseTerm> {
    let mut terms: Vec<SparseTerm> = Vec::new();
    for token in tokenize(query) {
        match terms.iter_mut().find(|t| t.term == token) {
            Some(existing) => existing.weight += 1.0,
            None => terms.push(SparseTerm {
                term: token,
                weight: 1.0,
            }),
        }
    }
    terms
}

fn tokenize(query: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut word = String::new();

    for c in query.chars() {
        if is_cjk(c) {
            flush(&mut word, &mut tokens);
            tokens.push(c.to_string());
        } else if c.is_alphanumeric() {
            word.extend(c.to_lowercase());
        } else {
            flush(&mut word, &mut tokens);
        }
    }
    flush(&mut word, &mut tokens);
    tokens
}

fn flush(word: &mut String, tokens: &mut Vec<String>) {
    if !word.is_empty() {
        tokens.push(std::mem::take(word));
    }
}

/// Unified CJK ideograph ranges (base, extension A, compatibility).
fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}' | '\u{F900}'..='\u{FAFF}')
}

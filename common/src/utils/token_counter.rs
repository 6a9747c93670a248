//! C1: token counter.
//!
//! Counts model-equivalent tokens in a string using the `cl100k_base`
//! byte-pair scheme (empirically what the embedding model uses). Falls back
//! to `len(text) / 4` on initialization failure, per spec.md §4.1. Pure and
//! safe to call concurrently: `tiktoken_rs::cl100k_base()` builds an
//! immutable `CoreBPE` cached behind a `OnceLock`.
use std::sync::OnceLock;

use tiktoken_rs::CoreBPE;

fn bpe() -> Option<&'static CoreBPE> {
    static BPE: OnceLock<Option<CoreBPE>> = OnceLock::new();
    BPE.get_or_init(|| tiktoken_rs::cl100k_base().ok()).as_ref()
}

/// Counts tokens in `text`. Never fails: falls back to a `len() / 4`
/// approximation (documented, not silent) if the tokenizer could not be
/// initialized.
pub fn count(text: &str) -> usize {
    match bpe() {
        Some(bpe) => bpe.encode_ordinary(text).len(),
        None => text.len() / 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_nonempty_text() {
        assert!(count("The quick brown fox jumps over the lazy dog.") > 0);
    }

    #[test]
    fn empty_text_is_zero_tokens() {
        assert_eq!(count(""), 0);
    }

    #[test]
    fn longer_text_has_more_tokens() {
        let short = count("hello world");
        let long = count("hello world ".repeat(50).trim());
        assert!(long > short);
    }
}

use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, TextAnalyzer, TokenStream};

/// Term extraction shared by the sparse embedders.
///
/// Splits on every non-alphanumeric character and lowercases, so Persian
/// words separated by a zero-width non-joiner become two terms, the same
/// way a `\w+` word pattern treats them.
#[derive(Clone)]
pub struct TermAnalyzer {
    analyzer: TextAnalyzer,
}

impl Default for TermAnalyzer {
    fn default() -> Self {
        let analyzer = TextAnalyzer::builder(SimpleTokenizer::default()).filter(LowerCaser).build();
        Self { analyzer }
    }
}

impl TermAnalyzer {
    /// Lowercased tokens of at least `min_chars` characters, in text order.
    pub fn tokens(&self, text: &str, min_chars: usize) -> Vec<String> {
        let mut analyzer = self.analyzer.clone();
        let mut stream = analyzer.token_stream(text);
        let mut out = Vec::new();
        while stream.advance() {
            let token = &stream.token().text;
            if token.chars().count() >= min_chars {
                out.push(token.clone());
            }
        }
        out
    }

    /// Tokens expanded to every n-gram with `min <= n <= max`, words joined
    /// by a single space.
    pub fn terms(&self, text: &str, min_chars: usize, ngram_range: (usize, usize)) -> Vec<String> {
        ngrams(&self.tokens(text, min_chars), ngram_range)
    }
}

pub fn ngrams(tokens: &[String], (min, max): (usize, usize)) -> Vec<String> {
    let mut out = Vec::new();
    for n in min.max(1)..=max {
        if n == 1 {
            out.extend(tokens.iter().cloned());
            continue;
        }
        out.extend(tokens.windows(n).map(|w| w.join(" ")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_drops_short_tokens() {
        let analyzer = TermAnalyzer::default();
        assert_eq!(analyzer.tokens("The Cat, a dog!", 2), ["the", "cat", "dog"]);
        assert_eq!(analyzer.tokens("The Cat, a dog!", 1), ["the", "cat", "a", "dog"]);
    }

    #[test]
    fn persian_tokens_survive() {
        let analyzer = TermAnalyzer::default();
        assert_eq!(analyzer.tokens("تعطیلات نوروز", 2), ["تعطیلات", "نوروز"]);
    }

    #[test]
    fn bigrams_follow_unigrams() {
        let analyzer = TermAnalyzer::default();
        assert_eq!(
            analyzer.terms("cats chase dogs", 2, (1, 2)),
            ["cats", "chase", "dogs", "cats chase", "chase dogs"]
        );
        assert!(ngrams(&["one".to_string()], (2, 2)).is_empty());
    }
}

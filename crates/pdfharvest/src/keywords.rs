//! Keyword frequency analysis.
//!
//! Pure function over extracted text: no IO, no clock, fully
//! deterministic for identical input.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::AnalyzerConfig;

/// Words too common to be informative. Fixed set; case handled by
/// lowercasing tokens before the lookup.
const STOPWORDS: &[&str] = &[
    "about", "above", "after", "again", "against", "also", "because", "been", "before", "being",
    "below", "between", "both", "cannot", "could", "does", "doing", "down", "during", "each",
    "from", "further", "have", "having", "here", "into", "itself", "more", "most", "other",
    "over", "same", "shall", "should", "some", "such", "than", "that", "their", "them", "then",
    "there", "these", "they", "this", "those", "through", "under", "until", "very", "were",
    "what", "when", "where", "which", "while", "will", "with", "would", "your",
];

/// One ranked keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub word: String,
    pub frequency: u64,
}

/// Tokenizes the text and returns the top-K keywords ranked by
/// frequency, ties broken by first occurrence in the text.
pub fn analyze(text: &str, config: &AnalyzerConfig) -> Vec<Keyword> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    // Insertion order, for deterministic tie-breaking.
    let mut order: Vec<String> = Vec::new();

    for token in tokenize(text) {
        if token.chars().count() < config.min_word_len {
            continue;
        }
        if STOPWORDS.contains(&token.as_str()) {
            continue;
        }

        match counts.get_mut(&token) {
            Some(n) => *n += 1,
            None => {
                counts.insert(token.clone(), 1);
                order.push(token);
            }
        }
    }

    let mut ranked: Vec<Keyword> = order
        .into_iter()
        .map(|word| {
            let frequency = counts[&word];
            Keyword { word, frequency }
        })
        .collect();

    // Stable sort keeps first-occurrence order within equal frequencies.
    ranked.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    ranked.truncate(config.top_k);
    ranked
}

/// Lowercases and splits into alphanumeric runs, dropping punctuation.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AnalyzerConfig {
        AnalyzerConfig::default()
    }

    #[test]
    fn test_frequency_ranking() {
        let text = "invoice payment invoice total payment invoice";
        let keywords = analyze(text, &config());

        assert_eq!(keywords[0].word, "invoice");
        assert_eq!(keywords[0].frequency, 3);
        assert_eq!(keywords[1].word, "payment");
        assert_eq!(keywords[1].frequency, 2);
        assert_eq!(keywords[2].word, "total");
        assert_eq!(keywords[2].frequency, 1);
    }

    #[test]
    fn test_frequencies_never_exceed_token_count() {
        let text = "alpha beta gamma alpha beta alpha";
        let keywords = analyze(text, &config());
        let total: u64 = keywords.iter().map(|k| k.frequency).sum();
        assert!(total <= 6);
    }

    #[test]
    fn test_ties_broken_by_first_occurrence() {
        let text = "zebra apple zebra apple mango mango";
        let keywords = analyze(text, &config());
        let words: Vec<&str> = keywords.iter().map(|k| k.word.as_str()).collect();
        // All frequency 2; order of appearance wins.
        assert_eq!(words, vec!["zebra", "apple", "mango"]);
    }

    #[test]
    fn test_case_and_punctuation_normalized() {
        let text = "Report, REPORT. report!";
        let keywords = analyze(text, &config());
        assert_eq!(keywords.len(), 1);
        assert_eq!(keywords[0].word, "report");
        assert_eq!(keywords[0].frequency, 3);
    }

    #[test]
    fn test_short_tokens_dropped() {
        let text = "the cat sat on mat but encyclopedia";
        let keywords = analyze(text, &config());
        assert_eq!(keywords.len(), 1);
        assert_eq!(keywords[0].word, "encyclopedia");
    }

    #[test]
    fn test_stopwords_dropped() {
        let text = "because should would document document";
        let keywords = analyze(text, &config());
        assert_eq!(keywords.len(), 1);
        assert_eq!(keywords[0].word, "document");
    }

    #[test]
    fn test_top_k_truncation() {
        let text = "aaaa bbbb cccc dddd eeee";
        let cfg = AnalyzerConfig {
            top_k: 2,
            min_word_len: 4,
        };
        let keywords = analyze(text, &cfg);
        assert_eq!(keywords.len(), 2);
    }

    #[test]
    fn test_empty_text() {
        assert!(analyze("", &config()).is_empty());
        assert!(analyze("   \n\t  ", &config()).is_empty());
    }

    #[test]
    fn test_determinism() {
        let text = "one of the larger bodies of text with repeated words words \
                    and more words that should rank rank rank deterministically";
        let a = analyze(text, &config());
        let b = analyze(text, &config());
        assert_eq!(a, b);
    }

    #[test]
    fn test_sorted_non_increasing() {
        let text = "alpha alpha alpha beta beta gamma delta delta delta delta";
        let keywords = analyze(text, &config());
        for pair in keywords.windows(2) {
            assert!(pair[0].frequency >= pair[1].frequency);
        }
    }

    #[test]
    fn test_unicode_tokens() {
        let text = "naïve naïve café résumé";
        let keywords = analyze(text, &config());
        assert_eq!(keywords[0].word, "naïve");
        assert_eq!(keywords[0].frequency, 2);
    }
}

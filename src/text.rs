//! Text cleaning: punctuation stripping and stopword removal.

use std::collections::HashSet;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// NLTK English stopword list.
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're",
    "you've", "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he",
    "him", "his", "himself", "she", "she's", "her", "hers", "herself", "it", "it's",
    "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "that'll", "these", "those", "am", "is", "are",
    "was", "were", "be", "been", "being", "have", "has", "had", "having", "do", "does",
    "did", "doing", "a", "an", "the", "and", "but", "if", "or", "because", "as",
    "until", "while", "of", "at", "by", "for", "with", "about", "against", "between",
    "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further",
    "then", "once", "here", "there", "when", "where", "why", "how", "all", "any",
    "both", "each", "few", "more", "most", "other", "some", "such", "no", "nor",
    "not", "only", "own", "same", "so", "than", "too", "very", "s", "t", "can",
    "will", "just", "don", "don't", "should", "should've", "now", "d", "ll", "m",
    "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven",
    "haven't", "isn", "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't",
    "needn", "needn't", "shan", "shan't", "shouldn", "shouldn't", "wasn", "wasn't",
    "weren", "weren't", "won", "won't", "wouldn", "wouldn't",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanerConfig {
    pub lowercase: bool,
    /// Tokens shorter than this many characters are dropped
    pub min_token_len: usize,
    /// Added on top of the English list
    pub extra_stop_words: Vec<String>,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        CleanerConfig {
            lowercase: true,
            min_token_len: 1,
            extra_stop_words: Vec::new(),
        }
    }
}

/// Shape of a cleaned document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanOutput {
    Tokens(Vec<String>),
    Joined(String),
}

impl CleanOutput {
    fn from_tokens(tokens: Vec<String>, joined: bool) -> Self {
        if joined {
            CleanOutput::Joined(tokens.join(" "))
        } else {
            CleanOutput::Tokens(tokens)
        }
    }

    pub fn into_tokens(self) -> Vec<String> {
        match self {
            CleanOutput::Tokens(tokens) => tokens,
            CleanOutput::Joined(text) => text.split_whitespace().map(str::to_string).collect(),
        }
    }

    pub fn into_string(self) -> String {
        match self {
            CleanOutput::Tokens(tokens) => tokens.join(" "),
            CleanOutput::Joined(text) => text,
        }
    }
}

pub struct TextCleaner {
    config: CleanerConfig,
    word_re: Regex,
    stop_words: HashSet<String>,
}

impl TextCleaner {
    pub fn new(config: CleanerConfig) -> Self {
        let stop_words = ENGLISH_STOP_WORDS
            .iter()
            .map(|word| word.to_string())
            .chain(config.extra_stop_words.iter().map(|word| word.to_lowercase()))
            .collect();

        TextCleaner {
            config,
            // Runs of letters or digits; everything else separates tokens
            word_re: Regex::new(r"[\p{L}\p{N}]+").expect("static token pattern"),
            stop_words,
        }
    }

    /// Split `text` into tokens with punctuation and whitespace removed.
    pub fn strip_punctuation(&self, text: &str, joined: bool) -> CleanOutput {
        let text = if self.config.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };

        let tokens = self
            .word_re
            .find_iter(&text)
            .map(|m| m.as_str())
            .filter(|word| word.chars().count() >= self.config.min_token_len)
            .map(|word| word.to_string())
            .collect();

        CleanOutput::from_tokens(tokens, joined)
    }

    /// Drop stopwords from an already punctuation-free document.
    pub fn remove_stopwords(&self, document: CleanOutput, joined: bool) -> CleanOutput {
        let tokens = document
            .into_tokens()
            .into_iter()
            .filter(|token| !self.is_stop_word(token))
            .collect();

        CleanOutput::from_tokens(tokens, joined)
    }

    /// Both cleaning steps, producing the line written to the processed corpus.
    pub fn clean(&self, text: &str) -> String {
        let stripped = self.strip_punctuation(text, false);
        self.remove_stopwords(stripped, true).into_string()
    }

    pub fn is_stop_word(&self, token: &str) -> bool {
        if self.config.lowercase {
            self.stop_words.contains(token)
        } else {
            self.stop_words.contains(&token.to_lowercase())
        }
    }
}

impl Default for TextCleaner {
    fn default() -> Self {
        TextCleaner::new(CleanerConfig::default())
    }
}

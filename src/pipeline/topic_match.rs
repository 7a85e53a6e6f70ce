//! Named-condition lookup: exact substring, then per-token fuzzy match.

use serde::Serialize;

use super::normalize::{has_separators, normalize};
use crate::knowledge::TopicVocabulary;

/// Tokens this short are never fuzzy-matched; too many false positives.
const MIN_FUZZY_TOKEN_CHARS: usize = 5;

/// How a topic was found in the message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Fuzzy { token: String, similarity: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicMatch {
    pub key: String,
    pub kind: MatchKind,
}

/// Finds a named condition in normalized, alias-resolved text.
pub struct KnownTopicMatcher<'a> {
    topics: &'a TopicVocabulary,
    threshold: f64,
}

impl<'a> KnownTopicMatcher<'a> {
    pub fn new(topics: &'a TopicVocabulary, threshold: f64) -> Self {
        Self { topics, threshold }
    }

    /// Exact substring match first, in vocabulary order; the first topic
    /// contained in the text wins even if a longer one also occurs. Then a
    /// fuzzy pass over each token of more than four characters, in text order,
    /// accepting the best-scoring topic for the first token that clears the
    /// threshold. Equal scores keep the earlier vocabulary entry.
    pub fn find(&self, text: &str) -> Option<TopicMatch> {
        if text.trim().is_empty() || self.topics.is_empty() {
            return None;
        }

        for topic in self.topics.iter() {
            if contains_key(text, &topic.key) {
                return Some(TopicMatch {
                    key: topic.key.clone(),
                    kind: MatchKind::Exact,
                });
            }
        }

        for token in text.split_whitespace() {
            if token.chars().count() < MIN_FUZZY_TOKEN_CHARS {
                continue;
            }
            let mut best: Option<(&str, f64)> = None;
            for key in self.topics.keys() {
                let score = similarity(token, key);
                if best.map_or(true, |(_, s)| score > s) {
                    best = Some((key, score));
                }
            }
            if let Some((key, score)) = best {
                if score >= self.threshold {
                    tracing::debug!(token, topic = key, similarity = score, "Fuzzy topic match");
                    return Some(TopicMatch {
                        key: key.to_string(),
                        kind: MatchKind::Fuzzy {
                            token: token.to_string(),
                            similarity: score,
                        },
                    });
                }
            }
        }
        None
    }
}

/// Keys with separator punctuation are also tried in normalized form, since
/// normalized input can never contain the raw key.
fn contains_key(text: &str, key: &str) -> bool {
    text.contains(key) || (has_separators(key) && text.contains(&normalize(key)))
}

/// Ratio in [0, 1]: 1 − edit_distance / longer length.
pub(crate) fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - edit_distance(a, b) as f64 / longest as f64
}

/// Levenshtein distance over chars, two-row.
fn edit_distance(a: &str, b: &str) -> u32 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let m = a_chars.len();
    let n = b_chars.len();

    if m == 0 {
        return n as u32;
    }
    if n == 0 {
        return m as u32;
    }

    let mut prev: Vec<u32> = (0..=n as u32).collect();
    let mut curr = vec![0u32; n + 1];

    for (i, &a_ch) in a_chars.iter().enumerate() {
        curr[0] = (i + 1) as u32;
        for (j, &b_ch) in b_chars.iter().enumerate() {
            let cost = if a_ch == b_ch { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

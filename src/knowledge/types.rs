//! Reference data types: topics, aliases, feature vocabulary, schedule.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Description used when a topic has no reference text.
pub const FALLBACK_DESCRIPTION: &str = "Details unavailable.";
/// Precaution used when a topic has no reference precautions.
pub const FALLBACK_PRECAUTION: &str = "Consult Doctor";

/// Canonical form of a topic key: trimmed, lowercased, inner whitespace collapsed.
pub fn topic_key(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Title-case a key for display ("chicken pox" → "Chicken Pox").
pub fn title_case(key: &str) -> String {
    key.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// A canonical disease/condition entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub key: String,
    pub label: String,
    pub description: String,
    pub precautions: Vec<String>,
}

impl Topic {
    pub fn new(key: &str) -> Self {
        let key = topic_key(key);
        Self {
            label: title_case(&key),
            key,
            description: FALLBACK_DESCRIPTION.to_string(),
            precautions: Vec::new(),
        }
    }
}

/// Ordered set of topics. Iteration order is insertion order, which is
/// the order the exact-substring matcher scans in.
#[derive(Debug, Clone, Default)]
pub struct TopicVocabulary {
    topics: Vec<Topic>,
    index: HashMap<String, usize>,
}

impl TopicVocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a topic. Returns false (and keeps the existing entry) on a duplicate key.
    pub fn insert(&mut self, topic: Topic) -> bool {
        if topic.key.is_empty() || self.index.contains_key(&topic.key) {
            return false;
        }
        self.index.insert(topic.key.clone(), self.topics.len());
        self.topics.push(topic);
        true
    }

    /// Case- and whitespace-insensitive lookup.
    pub fn get(&self, key: &str) -> Option<&Topic> {
        self.index.get(&topic_key(key)).map(|&i| &self.topics[i])
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Topic> {
        match self.index.get(&topic_key(key)) {
            Some(&i) => Some(&mut self.topics[i]),
            None => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(&topic_key(key))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.topics.iter().map(|t| t.key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Topic> {
        self.topics.iter()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Topic for `key`, or a placeholder carrying the fallback texts.
    /// Alias targets missing from the vocabulary still produce a usable answer.
    pub fn enrich(&self, key: &str) -> Topic {
        let mut topic = self.get(key).cloned().unwrap_or_else(|| Topic::new(key));
        if topic.precautions.is_empty() {
            topic.precautions.push(FALLBACK_PRECAUTION.to_string());
        }
        topic
    }
}

/// Informal phrase → canonical topic key, kept sorted longest alias first.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: Vec<(String, String)>,
}

impl AliasTable {
    pub fn new<I, A, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, C)>,
        A: AsRef<str>,
        C: AsRef<str>,
    {
        let mut entries: Vec<(String, String)> = Vec::new();
        for (alias, canonical) in pairs {
            let alias = topic_key(alias.as_ref());
            if alias.is_empty() || entries.iter().any(|(a, _)| *a == alias) {
                continue;
            }
            entries.push((alias, topic_key(canonical.as_ref())));
        }
        // Stable: equal-length aliases keep their table order.
        entries.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));
        Self { entries }
    }

    /// Aliases used when no alias file is provided.
    pub fn builtin() -> Self {
        Self::new([
            ("chickenpox", "chicken pox"),
            ("flu", "influenza"),
            ("sugar", "diabetes"),
            ("bp", "hypertension"),
            ("high bp", "hypertension"),
            ("madras eye", "madras eye (conjunctivitis)"),
        ])
    }

    /// Entries in matching order (longest alias first).
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ordered symptom-feature identifiers (snake_case).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVocabulary(Vec<String>);

impl FeatureVocabulary {
    /// Trims entries and drops blanks and repeats; order is otherwise preserved.
    pub fn new<I, S>(features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for f in features {
            let f = f.as_ref().trim();
            if !f.is_empty() && !out.iter().any(|e| e == f) {
                out.push(f.to_string());
            }
        }
        Self(out)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn position(&self, feature: &str) -> Option<usize> {
        self.0.iter().position(|f| f == feature)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One row of the immunization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub age: String,
    pub vaccines: Vec<String>,
}

/// Immutable snapshot of all reference data. Replaced as a whole on reload.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    pub topics: TopicVocabulary,
    pub aliases: AliasTable,
    pub features: FeatureVocabulary,
    pub vaccine_schedule: Vec<ScheduleEntry>,
}

//! Offline phrase book for common colloquial symptom words.

use super::{TranslationError, Translator};

/// Colloquial Tamil/Hindi (romanized) symptom phrases with fixed English meanings.
const PHRASES: &[(&str, &str)] = &[
    ("kaichal", "fever"),
    ("juram", "fever"),
    ("bukhar", "fever"),
    ("sardi", "cold"),
    ("irumal", "cough"),
    ("khansi", "cough"),
    ("pet dard", "stomach pain"),
    ("vayitru vali", "stomach pain"),
    ("sar dard", "headache"),
    ("thalai vali", "headache"),
];

/// Answers whole-message phrase-book hits locally and delegates everything else.
/// Only exact (case-insensitive, trimmed) matches are served from the table.
pub struct PhraseBookTranslator<T> {
    inner: Option<T>,
}

impl<T: Translator> PhraseBookTranslator<T> {
    pub fn new(inner: T) -> Self {
        Self { inner: Some(inner) }
    }

    /// Phrase book only, no network fallback.
    pub fn offline() -> Self {
        Self { inner: None }
    }

    pub fn lookup(text: &str) -> Option<&'static str> {
        let key = text.trim().to_lowercase();
        PHRASES
            .iter()
            .find(|(phrase, _)| *phrase == key)
            .map(|(_, english)| *english)
    }
}

impl<T: Translator> Translator for PhraseBookTranslator<T> {
    fn to_working_language(&self, text: &str, source: &str) -> Result<String, TranslationError> {
        if let Some(english) = Self::lookup(text) {
            tracing::debug!(phrase = %text.trim(), "Phrase book hit");
            return Ok(english.to_string());
        }
        match &self.inner {
            Some(inner) => inner.to_working_language(text, source),
            None => Err(TranslationError::Disabled),
        }
    }

    fn from_working_language(&self, text: &str, target: &str) -> Result<String, TranslationError> {
        match &self.inner {
            Some(inner) => inner.from_working_language(text, target),
            None => Err(TranslationError::Disabled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::DisabledTranslator;

    struct Echo;

    impl Translator for Echo {
        fn to_working_language(&self, text: &str, _source: &str) -> Result<String, TranslationError> {
            Ok(format!("translated:{text}"))
        }
        fn from_working_language(&self, text: &str, target: &str) -> Result<String, TranslationError> {
            Ok(format!("{target}:{text}"))
        }
    }

    #[test]
    fn phrase_hit_skips_inner() {
        let t = PhraseBookTranslator::new(Echo);
        assert_eq!(t.to_working_language(" Kaichal ", "auto").unwrap(), "fever");
        assert_eq!(t.to_working_language("thalai vali", "ta").unwrap(), "headache");
    }

    #[test]
    fn partial_phrase_delegates() {
        let t = PhraseBookTranslator::new(Echo);
        assert_eq!(
            t.to_working_language("enaku kaichal", "auto").unwrap(),
            "translated:enaku kaichal"
        );
    }

    #[test]
    fn offline_misses_are_disabled() {
        let t = PhraseBookTranslator::<DisabledTranslator>::offline();
        assert_eq!(t.to_working_language("bukhar", "hi").unwrap(), "fever");
        assert!(matches!(
            t.to_working_language("mujhe bukhar hai", "hi"),
            Err(TranslationError::Disabled)
        ));
        assert!(t.from_working_language("fever", "hi").is_err());
    }
}

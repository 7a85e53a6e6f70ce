//! Translation capability: the `Translator` seam, its HTTP and phrase-book
//! implementations, and language parsing.

pub mod http;
pub mod language;
pub mod phrasebook;

pub use http::HttpTranslator;
pub use language::Language;
pub use phrasebook::PhraseBookTranslator;

use std::sync::Arc;

use thiserror::Error;

use crate::config::TranslatorConfig;

#[derive(Error, Debug)]
pub enum TranslationError {
    #[error("Translation is not configured")]
    Disabled,

    #[error("Translation service unreachable at {0}")]
    Connection(String),

    #[error("Translation timed out after {0}s")]
    Timeout(u64),

    #[error("Translation service returned error (status {status}): {body}")]
    Service { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Translation returned empty text")]
    EmptyResult,
}

/// External translation capability.
///
/// A call is one bounded network round-trip. Callers treat every error as
/// "no translation" and carry on with the original text.
pub trait Translator: Send + Sync {
    fn to_working_language(&self, text: &str, source: &str) -> Result<String, TranslationError>;

    fn from_working_language(&self, text: &str, target: &str) -> Result<String, TranslationError>;
}

impl<T: Translator + ?Sized> Translator for Arc<T> {
    fn to_working_language(&self, text: &str, source: &str) -> Result<String, TranslationError> {
        (**self).to_working_language(text, source)
    }

    fn from_working_language(&self, text: &str, target: &str) -> Result<String, TranslationError> {
        (**self).from_working_language(text, target)
    }
}

/// Used when no translation endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledTranslator;

impl Translator for DisabledTranslator {
    fn to_working_language(&self, _text: &str, _source: &str) -> Result<String, TranslationError> {
        Err(TranslationError::Disabled)
    }

    fn from_working_language(&self, _text: &str, _target: &str) -> Result<String, TranslationError> {
        Err(TranslationError::Disabled)
    }
}

/// Phrase book in front of the configured HTTP service, or phrase book only
/// when no endpoint is set or the client cannot be built. `working` is the
/// language remote translations go to and come from.
pub fn translator_from_config(config: &TranslatorConfig, working: &Language) -> Arc<dyn Translator> {
    match HttpTranslator::from_config(config, working) {
        Ok(Some(http)) => {
            tracing::info!(timeout_secs = config.timeout_secs, "Remote translation enabled");
            Arc::new(PhraseBookTranslator::new(http))
        }
        Ok(None) => {
            tracing::info!("No translation endpoint configured, phrase book only");
            Arc::new(PhraseBookTranslator::<DisabledTranslator>::offline())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Translation client unavailable, phrase book only");
            Arc::new(PhraseBookTranslator::<DisabledTranslator>::offline())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_always_errors() {
        let t = DisabledTranslator;
        assert!(matches!(
            t.to_working_language("juram", "ta"),
            Err(TranslationError::Disabled)
        ));
    }

    #[test]
    fn config_without_endpoint_still_serves_phrase_book() {
        let t = translator_from_config(&TranslatorConfig::default(), &Language::English);
        assert_eq!(t.to_working_language("sardi", "hi").unwrap(), "cold");
        assert!(t.to_working_language("mujhe sardi hai", "hi").is_err());
    }
}

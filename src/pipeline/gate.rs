//! Translation gate: decides whether a message must be translated before
//! interpretation, and runs the interpretation pass at most twice.

use serde::Serialize;

use super::alias::resolve_aliases;
use super::features::SymptomFeatureExtractor;
use super::normalize::normalize;
use super::topic_match::{KnownTopicMatcher, TopicMatch};
use crate::knowledge::KnowledgeBase;
use crate::model::{DiagnosticClassifier, Prediction};
use crate::translate::{Language, Translator};

/// Result of one pass over a piece of text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    /// Normalized text the pass ran on.
    pub text: String,
    pub topic: Option<TopicMatch>,
    pub detected_features: Vec<String>,
    pub prediction: Prediction,
}

impl Analysis {
    /// A named topic or a usable prediction.
    pub fn is_conclusive(&self) -> bool {
        self.topic.is_some() || self.prediction.is_usable()
    }
}

/// What happened with translation for one message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TranslationAttempt {
    NotNeeded,
    /// Translated; `used` tells whether the translated pass was kept.
    Applied { source: String, used: bool },
    /// The service answered with the input unchanged.
    Unchanged,
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateResolution {
    /// The text the chosen analysis came from: raw input or its translation.
    pub effective_text: String,
    pub analysis: Analysis,
    pub translation: TranslationAttempt,
}

/// Decides whether a message needs translation before interpretation and runs
/// the interpretation pipeline on the original and, at most once, on the
/// translated text.
pub struct TranslationGate<'a> {
    knowledge: &'a KnowledgeBase,
    classifier: &'a DiagnosticClassifier,
    translator: &'a dyn Translator,
    working_language: &'a Language,
    fuzzy_threshold: f64,
}

impl<'a> TranslationGate<'a> {
    pub fn new(
        knowledge: &'a KnowledgeBase,
        classifier: &'a DiagnosticClassifier,
        translator: &'a dyn Translator,
        working_language: &'a Language,
        fuzzy_threshold: f64,
    ) -> Self {
        Self {
            knowledge,
            classifier,
            translator,
            working_language,
            fuzzy_threshold,
        }
    }

    /// Normalize, resolve aliases, look for a named topic and, failing that,
    /// extract features and classify.
    pub fn analyze(&self, text: &str) -> Analysis {
        let normalized = normalize(text);
        let resolved = resolve_aliases(&normalized, &self.knowledge.aliases);
        let topic = KnownTopicMatcher::new(&self.knowledge.topics, self.fuzzy_threshold).find(&resolved);

        if topic.is_some() {
            return Analysis {
                text: normalized,
                topic,
                detected_features: Vec::new(),
                prediction: Prediction::NoPrediction,
            };
        }

        let detected_features = SymptomFeatureExtractor::new(&self.knowledge.features).extract(&normalized);
        let prediction = self.classifier.predict(&detected_features);
        Analysis {
            text: normalized,
            topic,
            detected_features,
            prediction,
        }
    }

    /// Fast path on the raw text, then one translation when the requested
    /// language differs from the working language or the fast path found
    /// nothing usable. A translation failure never fails the request.
    pub fn resolve(&self, raw: &str, requested: &Language) -> GateResolution {
        let fast = self.analyze(raw);
        let foreign = requested != self.working_language;

        if fast.text.is_empty() || (!foreign && fast.is_conclusive()) {
            return GateResolution {
                effective_text: raw.to_string(),
                analysis: fast,
                translation: TranslationAttempt::NotNeeded,
            };
        }

        let source = if foreign { requested.source_code() } else { "auto" };
        match self.translator.to_working_language(raw, source) {
            Ok(translated) if normalize(&translated) != fast.text => {
                let second = self.analyze(&translated);
                // A conclusive fast path is kept unless the translated pass is
                // conclusive too; an inconclusive one is always replaced.
                let used = second.is_conclusive() || !fast.is_conclusive();
                tracing::debug!(source, used, "Translated pass complete");
                if used {
                    GateResolution {
                        effective_text: translated,
                        analysis: second,
                        translation: TranslationAttempt::Applied {
                            source: source.to_string(),
                            used,
                        },
                    }
                } else {
                    GateResolution {
                        effective_text: raw.to_string(),
                        analysis: fast,
                        translation: TranslationAttempt::Applied {
                            source: source.to_string(),
                            used,
                        },
                    }
                }
            }
            Ok(_) => {
                tracing::debug!(source, "Translation returned the input unchanged");
                GateResolution {
                    effective_text: raw.to_string(),
                    analysis: fast,
                    translation: TranslationAttempt::Unchanged,
                }
            }
            Err(e) => {
                tracing::warn!(source, error = %e, "Translation failed, using original text");
                GateResolution {
                    effective_text: raw.to_string(),
                    analysis: fast,
                    translation: TranslationAttempt::Failed {
                        error: e.to_string(),
                    },
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::knowledge::{AliasTable, FeatureVocabulary, Topic, TopicVocabulary};
    use crate::model::{
        ClassifierState, LabelEncoder, ModelError, ModelSource, ProbabilisticModel, RankingPolicy,
    };
    use crate::translate::TranslationError;

    /// Returns class 0 with certainty whenever any feature is set.
    struct FirstClass {
        n_features: usize,
        n_classes: usize,
    }

    impl ProbabilisticModel for FirstClass {
        fn n_features(&self) -> usize {
            self.n_features
        }
        fn n_classes(&self) -> usize {
            self.n_classes
        }
        fn predict_proba(&self, _features: &[f32]) -> Result<Vec<f64>, ModelError> {
            let mut p = vec![0.0; self.n_classes];
            p[0] = 1.0;
            Ok(p)
        }
    }

    /// Scripted translator that counts calls.
    struct Scripted {
        replies: HashMap<&'static str, Result<&'static str, ()>>,
        calls: AtomicUsize,
        last_source: std::sync::Mutex<Option<String>>,
    }

    impl Scripted {
        fn new(replies: &[(&'static str, Result<&'static str, ()>)]) -> Self {
            Self {
                replies: replies.iter().cloned().collect(),
                calls: AtomicUsize::new(0),
                last_source: std::sync::Mutex::new(None),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Translator for Scripted {
        fn to_working_language(&self, text: &str, source: &str) -> Result<String, TranslationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_source.lock().unwrap() = Some(source.to_string());
            match self.replies.get(text) {
                Some(Ok(t)) => Ok(t.to_string()),
                Some(Err(())) => Err(TranslationError::Timeout(5)),
                None => Ok(text.to_string()),
            }
        }
        fn from_working_language(&self, text: &str, _target: &str) -> Result<String, TranslationError> {
            Ok(text.to_string())
        }
    }

    fn knowledge() -> KnowledgeBase {
        let mut topics = TopicVocabulary::new();
        for k in ["fungal infection", "malaria", "influenza"] {
            topics.insert(Topic::new(k));
        }
        KnowledgeBase {
            topics,
            aliases: AliasTable::builtin(),
            features: FeatureVocabulary::new(["itching", "skin_rash", "high_fever"]),
            vaccine_schedule: Vec::new(),
        }
    }

    fn classifier() -> DiagnosticClassifier {
        let state = ClassifierState::healthy(
            Box::new(FirstClass {
                n_features: 3,
                n_classes: 2,
            }),
            LabelEncoder::from_classes(vec!["Fungal infection".into(), "Malaria".into()]),
            FeatureVocabulary::new(["itching", "skin_rash", "high_fever"]),
            ModelSource::Persisted,
        );
        DiagnosticClassifier::new(Arc::new(state), RankingPolicy::default())
    }

    #[test]
    fn conclusive_english_skips_translation() {
        let kb = knowledge();
        let clf = classifier();
        let tr = Scripted::new(&[]);
        let gate = TranslationGate::new(&kb, &clf, &tr, &Language::English, 0.75);

        let r = gate.resolve("I have itching and skin rash", &Language::English);
        assert_eq!(r.translation, TranslationAttempt::NotNeeded);
        assert!(r.analysis.prediction.is_usable());
        assert_eq!(tr.calls(), 0);
    }

    #[test]
    fn foreign_language_translates_once() {
        let kb = knowledge();
        let clf = classifier();
        let tr = Scripted::new(&[("enaku kaichal", Ok("i have high fever"))]);
        let gate = TranslationGate::new(&kb, &clf, &tr, &Language::English, 0.75);

        let r = gate.resolve("enaku kaichal", &Language::Tamil);
        assert_eq!(tr.calls(), 1);
        assert_eq!(tr.last_source.lock().unwrap().as_deref(), Some("ta"));
        assert_eq!(r.effective_text, "i have high fever");
        assert_eq!(r.analysis.detected_features, vec!["high_fever".to_string()]);
        assert!(matches!(r.translation, TranslationAttempt::Applied { used: true, .. }));
    }

    #[test]
    fn inconclusive_english_translates_with_auto_source() {
        let kb = knowledge();
        let clf = classifier();
        let tr = Scripted::new(&[("mujhe flu hai yaar", Ok("i have flu friend"))]);
        let gate = TranslationGate::new(&kb, &clf, &tr, &Language::English, 0.75);

        // "flu" resolves to influenza on the fast path already.
        let r = gate.resolve("mujhe flu hai yaar", &Language::English);
        assert_eq!(tr.calls(), 0);
        assert_eq!(r.analysis.topic.unwrap().key, "influenza");

        let tr = Scripted::new(&[("kuch theek nahi", Ok("i have itching"))]);
        let gate = TranslationGate::new(&kb, &clf, &tr, &Language::English, 0.75);
        let r = gate.resolve("kuch theek nahi", &Language::English);
        assert_eq!(tr.calls(), 1);
        assert_eq!(tr.last_source.lock().unwrap().as_deref(), Some("auto"));
        assert!(r.analysis.prediction.is_usable());
    }

    #[test]
    fn translation_failure_falls_back_to_fast_path() {
        let kb = knowledge();
        let clf = classifier();
        let tr = Scripted::new(&[("itching irukku", Err(()))]);
        let gate = TranslationGate::new(&kb, &clf, &tr, &Language::English, 0.75);

        let r = gate.resolve("itching irukku", &Language::Tamil);
        assert_eq!(tr.calls(), 1);
        assert_eq!(r.effective_text, "itching irukku");
        assert!(r.analysis.prediction.is_usable());
        assert!(matches!(r.translation, TranslationAttempt::Failed { .. }));
    }

    #[test]
    fn inconclusive_passes_keep_translated_text() {
        let kb = knowledge();
        let clf = classifier();
        let tr = Scripted::new(&[("udambu sari illai", Ok("body is not well"))]);
        let gate = TranslationGate::new(&kb, &clf, &tr, &Language::English, 0.75);

        let r = gate.resolve("udambu sari illai", &Language::Tamil);
        assert_eq!(tr.calls(), 1);
        assert_eq!(r.effective_text, "body is not well");
        assert!(!r.analysis.is_conclusive());
        assert!(matches!(r.translation, TranslationAttempt::Applied { used: true, .. }));
    }

    #[test]
    fn unchanged_translation_is_not_reanalyzed() {
        let kb = knowledge();
        let clf = classifier();
        let tr = Scripted::new(&[]);
        let gate = TranslationGate::new(&kb, &clf, &tr, &Language::English, 0.75);

        let r = gate.resolve("blah blah", &Language::English);
        assert_eq!(tr.calls(), 1);
        assert_eq!(r.translation, TranslationAttempt::Unchanged);
        assert!(!r.analysis.is_conclusive());
    }

    #[test]
    fn inconclusive_translation_keeps_conclusive_fast_path() {
        let kb = knowledge();
        let clf = classifier();
        let tr = Scripted::new(&[("malaria irukka", Ok("is there"))]);
        let gate = TranslationGate::new(&kb, &clf, &tr, &Language::English, 0.75);

        let r = gate.resolve("malaria irukka", &Language::Tamil);
        assert_eq!(tr.calls(), 1);
        assert_eq!(r.analysis.topic.unwrap().key, "malaria");
        assert_eq!(r.effective_text, "malaria irukka");
        assert!(matches!(r.translation, TranslationAttempt::Applied { used: false, .. }));
    }

    #[test]
    fn blank_message_is_never_translated() {
        let kb = knowledge();
        let clf = classifier();
        let tr = Scripted::new(&[]);
        let gate = TranslationGate::new(&kb, &clf, &tr, &Language::English, 0.75);

        let r = gate.resolve("   ", &Language::Hindi);
        assert_eq!(tr.calls(), 0);
        assert_eq!(r.analysis.prediction, Prediction::NoPrediction);
    }

    #[test]
    fn topic_found_skips_classification() {
        let kb = knowledge();
        let clf = classifier();
        let tr = Scripted::new(&[]);
        let gate = TranslationGate::new(&kb, &clf, &tr, &Language::English, 0.75);

        let a = gate.analyze("fungal infection with itching");
        assert_eq!(a.topic.unwrap().key, "fungal infection");
        assert!(a.detected_features.is_empty());
        assert_eq!(a.prediction, Prediction::NoPrediction);
    }
}

//! Routing of one message to exactly one reply.
//!
//! Order is fixed: greeting, fixed table, known topic, diagnosis, unclear.
//! Greeting and fixed-table checks run on the raw text so they never pay
//! for translation.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use super::gate::{GateResolution, TranslationGate};
use super::normalize::normalize;
use super::types::{
    Alternate, DiagnosisReport, RouteOutcome, ScheduleTable, TopicInfo, UnclearReason, UnclearReply,
};
use crate::config::EngineConfig;
use crate::knowledge::{title_case, KnowledgeBase};
use crate::model::{DiagnosticClassifier, Prediction};
use crate::translate::{Language, Translator};

/// Greetings in the languages users write in, romanized.
const GREETING_PHRASES: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "vanakam",
    "namaste",
    "hola",
    "greetings",
    "epdi iruka",
    "nalama",
    "kaisan ba",
    "how are you",
];

/// Substrings that ask for the immunization schedule.
const SCHEDULE_KEYWORDS: &[&str] = &["vaccin", "immuniz", "immunis", "schedule"];

static GREETING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives: Vec<String> = GREETING_PHRASES.iter().map(|p| regex::escape(p)).collect();
    Regex::new(&format!(r"\b(?:{})\b", alternatives.join("|"))).unwrap()
});

pub const GREETING_MESSAGE: &str =
    "Namaste! 🙏 I am functioning well! How can I assist with your health today?";
pub const SCHEDULE_TITLE: &str = "Universal Immunization Schedule";
pub const NOTHING_DETECTED_MESSAGE: &str =
    "I didn't catch any symptoms provided. Could you describe your health issue?";
pub const MODEL_UNAVAILABLE_MESSAGE: &str =
    "Symptom analysis is temporarily unavailable. You can still ask about a condition by name, or please consult a doctor.";

/// Whole-word greeting check on normalized text.
pub fn is_greeting(normalized: &str) -> bool {
    GREETING_PATTERN.is_match(normalized)
}

pub fn is_schedule_query(normalized: &str) -> bool {
    SCHEDULE_KEYWORDS.iter().any(|k| normalized.contains(k))
}

/// Turns one message into exactly one outcome.
///
/// Priority is fixed: greeting, fixed table, known topic, diagnosis, unclear.
/// The first two are decided on the raw text before any translation cost.
pub struct RoutingEngine {
    classifier: DiagnosticClassifier,
    translator: Arc<dyn Translator>,
    working_language: Language,
    fuzzy_threshold: f64,
}

impl RoutingEngine {
    pub fn new(
        classifier: DiagnosticClassifier,
        translator: Arc<dyn Translator>,
        working_language: Language,
        fuzzy_threshold: f64,
    ) -> Self {
        Self {
            classifier,
            translator,
            working_language,
            fuzzy_threshold,
        }
    }

    pub fn from_config(
        config: &EngineConfig,
        classifier: DiagnosticClassifier,
        translator: Arc<dyn Translator>,
    ) -> Self {
        Self::new(
            classifier,
            translator,
            Language::parse(&config.working_language),
            config.fuzzy_threshold,
        )
    }

    pub fn classifier(&self) -> &DiagnosticClassifier {
        &self.classifier
    }

    pub fn translator(&self) -> &Arc<dyn Translator> {
        &self.translator
    }

    pub fn route(&self, knowledge: &KnowledgeBase, message: &str, language: &Language) -> RouteOutcome {
        let cleaned = normalize(message);

        if is_greeting(&cleaned) {
            return RouteOutcome::Greeting {
                message: GREETING_MESSAGE.to_string(),
            };
        }

        if is_schedule_query(&cleaned) {
            return RouteOutcome::FixedTable(ScheduleTable {
                title: SCHEDULE_TITLE.to_string(),
                rows: knowledge.vaccine_schedule.clone(),
            });
        }

        let gate = TranslationGate::new(
            knowledge,
            &self.classifier,
            self.translator.as_ref(),
            &self.working_language,
            self.fuzzy_threshold,
        );
        let resolution = gate.resolve(message, language);
        compose(knowledge, resolution)
    }
}

fn compose(knowledge: &KnowledgeBase, resolution: GateResolution) -> RouteOutcome {
    let analysis = resolution.analysis;

    if let Some(found) = analysis.topic {
        let topic = knowledge.topics.enrich(&found.key);
        return RouteOutcome::KnownTopic(TopicInfo {
            topic_key: topic.key,
            topic_label: topic.label,
            description: topic.description,
            precautions: topic.precautions,
        });
    }

    match analysis.prediction {
        Prediction::Ranked { candidates } if !candidates.is_empty() => {
            let mut ranked = candidates.into_iter();
            let Some(primary) = ranked.next() else {
                return nothing_detected();
            };
            let topic = knowledge.topics.enrich(&primary.topic_key);
            RouteOutcome::Diagnosis(DiagnosisReport {
                primary_key: primary.topic_key,
                primary_label: primary.label,
                confidence: primary.probability,
                detected_features: analysis.detected_features,
                alternates: ranked
                    .map(|c| Alternate {
                        label: c.label,
                        confidence: c.probability,
                    })
                    .collect(),
                description: topic.description,
                precautions: topic.precautions,
            })
        }
        Prediction::Unavailable { reason } => {
            tracing::debug!(reason = %reason, "Classifier unavailable for this request");
            RouteOutcome::Unclear(UnclearReply {
                reason: UnclearReason::ModelUnavailable,
                message: MODEL_UNAVAILABLE_MESSAGE.to_string(),
            })
        }
        _ => nothing_detected(),
    }
}

fn nothing_detected() -> RouteOutcome {
    RouteOutcome::Unclear(UnclearReply {
        reason: UnclearReason::NothingDetected,
        message: NOTHING_DETECTED_MESSAGE.to_string(),
    })
}

/// Precaution lines are shown title-cased.
pub(crate) fn display_precautions(precautions: &[String]) -> Vec<String> {
    precautions.iter().map(|p| title_case(p)).collect()
}

//! Process-wide engine state.
//!
//! `CoreState` is built once at startup and shared (behind `Arc`) by every
//! transport. The classifier is fixed for the life of the process; the
//! reference data can be swapped atomically while requests are in flight.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::knowledge::{load_knowledge, AliasTable, KnowledgeBase, KnowledgeError};
use crate::model::{
    ClassifierState, ClassifierStatus, DiagnosticClassifier, RankingPolicy, SelfHealingModelLoader,
};
use crate::pipeline::{localize, RouteOutcome, RoutingEngine};
use crate::translate::{translator_from_config, Language, Translator};

/// Point-in-time summary for health endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub classifier: ClassifierStatus,
    pub classifier_loaded_at: DateTime<Utc>,
    pub topics: usize,
    pub aliases: usize,
    pub features: usize,
    pub schedule_rows: usize,
    pub knowledge_loaded_at: DateTime<Utc>,
}

struct KnowledgeSlot {
    snapshot: Arc<KnowledgeBase>,
    loaded_at: DateTime<Utc>,
}

pub struct CoreState {
    config: EngineConfig,
    /// Replaced as a whole on reload. Readers clone the `Arc` and drop the
    /// lock immediately.
    knowledge: RwLock<KnowledgeSlot>,
    engine: RoutingEngine,
}

impl CoreState {
    /// Load the classifier (self-healing), the reference data and the
    /// translator. Never fails: missing pieces degrade the matching modes.
    pub fn bootstrap(config: EngineConfig) -> Self {
        let classifier = Arc::new(SelfHealingModelLoader::from_config(&config).load());
        let translator = translator_from_config(
            &config.translator,
            &Language::parse(&config.working_language),
        );

        let knowledge = match load_knowledge(&config.master_data_dir, classifier.feature_order()) {
            Ok(kb) => kb,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    dir = %config.master_data_dir.display(),
                    "Reference data unavailable, starting with empty vocabulary"
                );
                KnowledgeBase {
                    aliases: AliasTable::builtin(),
                    features: classifier.feature_order().clone(),
                    ..KnowledgeBase::default()
                }
            }
        };

        Self::with_parts(config, knowledge, classifier, translator)
    }

    pub fn with_parts(
        config: EngineConfig,
        knowledge: KnowledgeBase,
        classifier: Arc<ClassifierState>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        let policy = RankingPolicy {
            max_candidates: config.max_candidates,
            floor_pct: config.confidence_floor_pct,
        };
        let engine = RoutingEngine::from_config(
            &config,
            DiagnosticClassifier::new(classifier, policy),
            translator,
        );

        tracing::info!(
            topics = knowledge.topics.len(),
            features = knowledge.features.len(),
            classifier_healthy = engine.classifier().state().is_healthy(),
            "Engine ready"
        );

        Self {
            config,
            knowledge: RwLock::new(KnowledgeSlot {
                snapshot: Arc::new(knowledge),
                loaded_at: Utc::now(),
            }),
            engine,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current reference data. Stays valid after a concurrent reload.
    pub fn knowledge(&self) -> Arc<KnowledgeBase> {
        // The slot is only ever replaced whole, so a poisoned lock still holds
        // a complete snapshot.
        let guard = self.knowledge.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard.snapshot)
    }

    /// Re-read MasterData and swap it in. On error the previous snapshot
    /// stays in place. Returns the new topic count.
    pub fn reload_knowledge(&self) -> Result<usize, KnowledgeError> {
        let fresh = load_knowledge(
            &self.config.master_data_dir,
            self.engine.classifier().state().feature_order(),
        )
        .inspect_err(|e| tracing::warn!(error = %e, "Reference data reload failed, keeping previous"))?;

        let topics = fresh.topics.len();
        self.replace_knowledge(fresh);
        tracing::info!(topics, "Reference data reloaded");
        Ok(topics)
    }

    pub fn replace_knowledge(&self, knowledge: KnowledgeBase) {
        let slot = KnowledgeSlot {
            snapshot: Arc::new(knowledge),
            loaded_at: Utc::now(),
        };
        let mut guard = self.knowledge.write().unwrap_or_else(PoisonError::into_inner);
        *guard = slot;
    }

    /// Route one message. `language` is the user's selection, name or code.
    pub fn route(&self, message: &str, language: &str) -> RouteOutcome {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("route", %request_id);
        let _enter = span.enter();

        let language = Language::parse(language);
        let knowledge = self.knowledge();
        tracing::debug!(text = message, language = %language, "Routing message");

        let outcome = self.engine.route(&knowledge, message, &language);
        tracing::info!(mode = %outcome.mode(), language = %language, "Message routed");
        outcome
    }

    /// Route and render as plain text in the user's language.
    pub fn respond(&self, message: &str, language: &str) -> String {
        let outcome = self.route(message, language);
        localize(
            &outcome,
            &Language::parse(language),
            &Language::parse(&self.config.working_language),
            self.engine.translator().as_ref(),
        )
    }

    pub fn status(&self) -> EngineStatus {
        let (knowledge, knowledge_loaded_at) = {
            let guard = self.knowledge.read().unwrap_or_else(PoisonError::into_inner);
            (Arc::clone(&guard.snapshot), guard.loaded_at)
        };
        let classifier = self.engine.classifier().state();
        EngineStatus {
            classifier: classifier.status().clone(),
            classifier_loaded_at: classifier.loaded_at(),
            topics: knowledge.topics.len(),
            aliases: knowledge.aliases.len(),
            features: knowledge.features.len(),
            schedule_rows: knowledge.vaccine_schedule.len(),
            knowledge_loaded_at,
        }
    }
}

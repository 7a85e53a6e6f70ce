//! Message interpretation: normalize, resolve aliases, match topics, extract
//! features, classify, and route to one reply.

pub mod alias;
pub mod features;
pub mod gate;
pub mod normalize;
pub mod render;
pub mod router;
pub mod topic_match;
pub mod types;

pub use alias::resolve_aliases;
pub use features::SymptomFeatureExtractor;
pub use gate::{Analysis, GateResolution, TranslationAttempt, TranslationGate};
pub use normalize::normalize;
pub use render::{localize, render_plain};
pub use router::RoutingEngine;
pub use topic_match::{KnownTopicMatcher, MatchKind, TopicMatch};
pub use types::*;

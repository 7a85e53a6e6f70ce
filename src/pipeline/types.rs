//! Reply types produced by the router.

use serde::Serialize;

use crate::knowledge::ScheduleEntry;

/// The five kinds of reply. Exactly one is produced per message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteMode {
    Greeting,
    FixedTable,
    KnownTopic,
    Diagnosis,
    Unclear,
}

impl std::fmt::Display for RouteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RouteMode::Greeting => "greeting",
            RouteMode::FixedTable => "fixed_table",
            RouteMode::KnownTopic => "known_topic",
            RouteMode::Diagnosis => "diagnosis",
            RouteMode::Unclear => "unclear",
        };
        write!(f, "{s}")
    }
}

/// Structured reply handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", content = "payload", rename_all = "snake_case")]
pub enum RouteOutcome {
    Greeting { message: String },
    FixedTable(ScheduleTable),
    KnownTopic(TopicInfo),
    Diagnosis(DiagnosisReport),
    Unclear(UnclearReply),
}

impl RouteOutcome {
    pub fn mode(&self) -> RouteMode {
        match self {
            RouteOutcome::Greeting { .. } => RouteMode::Greeting,
            RouteOutcome::FixedTable(_) => RouteMode::FixedTable,
            RouteOutcome::KnownTopic(_) => RouteMode::KnownTopic,
            RouteOutcome::Diagnosis(_) => RouteMode::Diagnosis,
            RouteOutcome::Unclear(_) => RouteMode::Unclear,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleTable {
    pub title: String,
    pub rows: Vec<ScheduleEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicInfo {
    pub topic_key: String,
    pub topic_label: String,
    pub description: String,
    pub precautions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alternate {
    pub label: String,
    /// Percentage.
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosisReport {
    pub primary_key: String,
    pub primary_label: String,
    /// Percentage.
    pub confidence: f64,
    pub detected_features: Vec<String>,
    /// Ranked after the primary, at most two.
    pub alternates: Vec<Alternate>,
    pub description: String,
    pub precautions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnclearReason {
    NothingDetected,
    ModelUnavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnclearReply {
    pub reason: UnclearReason,
    pub message: String,
}

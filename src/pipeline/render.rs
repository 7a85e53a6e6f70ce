//! Plain-text rendering and reply localization.

use std::fmt::Write;

use super::router::display_precautions;
use super::types::RouteOutcome;
use crate::translate::{Language, Translator};

/// Plain-text rendering for transports without markup (SMS, WhatsApp).
pub fn render_plain(outcome: &RouteOutcome) -> String {
    let mut out = String::new();
    match outcome {
        RouteOutcome::Greeting { message } => out.push_str(message),
        RouteOutcome::FixedTable(table) => {
            let _ = writeln!(out, "💉 {}", table.title);
            if table.rows.is_empty() {
                out.push_str("Schedule details are not available right now.");
            }
            for row in &table.rows {
                let _ = write!(out, "\n• {}: {}", row.age, row.vaccines.join(", "));
            }
        }
        RouteOutcome::KnownTopic(info) => {
            let _ = writeln!(out, "ℹ️ Information: {}", info.topic_label);
            let _ = writeln!(out, "{}", info.description);
            out.push_str("\nStandard Treatments:");
            for p in display_precautions(&info.precautions) {
                let _ = write!(out, "\n• {p}");
            }
        }
        RouteOutcome::Diagnosis(report) => {
            let _ = writeln!(out, "Possible Condition: {}", report.primary_label);
            if !report.detected_features.is_empty() {
                let noted: Vec<String> = report
                    .detected_features
                    .iter()
                    .map(|f| f.replace('_', " "))
                    .collect();
                let _ = writeln!(out, "Symptoms noted: {}", noted.join(", "));
            }
            let _ = writeln!(out, "{}", report.description);
            out.push_str("\nRecommended Actions:");
            for p in display_precautions(&report.precautions) {
                let _ = write!(out, "\n• {p}");
            }
            if !report.alternates.is_empty() {
                out.push_str("\n\nOther Possibilities:");
                for alt in &report.alternates {
                    let _ = write!(out, "\n• {} ({:.0}%)", alt.label, alt.confidence);
                }
            }
            let _ = write!(out, "\n\nMatch Confidence: {:.1}%", report.confidence);
        }
        RouteOutcome::Unclear(reply) => out.push_str(&reply.message),
    }
    out
}

/// Render, then translate into `language`. Falls back to the working-language
/// text when the language is the working language, has no usable code, or
/// translation fails.
pub fn localize(
    outcome: &RouteOutcome,
    language: &Language,
    working_language: &Language,
    translator: &dyn Translator,
) -> String {
    let text = render_plain(outcome);
    if language == working_language {
        return text;
    }
    let target = language.source_code();
    if target == "auto" {
        tracing::debug!(language = %language, "No language code for reply, sending working-language text");
        return text;
    }
    match translator.from_working_language(&text, target) {
        Ok(translated) => translated,
        Err(e) => {
            tracing::warn!(lang_code = target, error = %e, "Reply translation failed, sending working-language text");
            text
        }
    }
}

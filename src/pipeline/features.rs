//! Symptom feature detection by substring containment.

use crate::knowledge::FeatureVocabulary;

/// Detects symptom features mentioned in normalized text.
///
/// A feature is present when its identifier (`skin_rash`) or its readable
/// form (`skin rash`) occurs as a substring. Longer features are checked
/// first, so results come back longest-first.
pub struct SymptomFeatureExtractor {
    /// (identifier, readable form), longest identifier first.
    ordered: Vec<(String, String)>,
}

impl SymptomFeatureExtractor {
    pub fn new(vocabulary: &FeatureVocabulary) -> Self {
        let mut ordered: Vec<(String, String)> = vocabulary
            .as_slice()
            .iter()
            .map(|f| (f.clone(), readable(f)))
            .collect();
        ordered.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));
        Self { ordered }
    }

    pub fn extract(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        self.ordered
            .iter()
            .filter(|(id, form)| (!form.is_empty() && text.contains(form.as_str())) || text.contains(id.as_str()))
            .map(|(id, _)| id.clone())
            .collect()
    }
}

/// `dischromic _patches` → `dischromic patches`
fn readable(feature: &str) -> String {
    feature
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> FeatureVocabulary {
        FeatureVocabulary::new([
            "itching",
            "skin_rash",
            "nodal_skin_eruptions",
            "dischromic _patches",
            "high_fever",
            "headache",
            "vomiting",
        ])
    }

    #[test]
    fn empty_text_detects_nothing() {
        let ex = SymptomFeatureExtractor::new(&vocab());
        assert!(ex.extract("").is_empty());
    }

    #[test]
    fn readable_forms_detected_longest_first() {
        let ex = SymptomFeatureExtractor::new(&vocab());
        assert_eq!(
            ex.extract("i have itching and skin rash"),
            vec!["skin_rash".to_string(), "itching".to_string()]
        );
    }

    #[test]
    fn identifier_form_also_detected() {
        let ex = SymptomFeatureExtractor::new(&vocab());
        assert_eq!(ex.extract("high_fever since monday"), vec!["high_fever".to_string()]);
    }

    #[test]
    fn irregular_spacing_in_identifier() {
        let ex = SymptomFeatureExtractor::new(&vocab());
        assert_eq!(
            ex.extract("dischromic patches on arm"),
            vec!["dischromic _patches".to_string()]
        );
    }

    #[test]
    fn nothing_mentioned() {
        let ex = SymptomFeatureExtractor::new(&vocab());
        assert!(ex.extract("hello there").is_empty());
    }

    #[test]
    fn every_present_feature_is_found() {
        let ex = SymptomFeatureExtractor::new(&vocab());
        let found = ex.extract("headache vomiting high fever itching");
        for f in ["headache", "vomiting", "high_fever", "itching"] {
            assert!(found.iter().any(|x| x == f), "{f} missing from {found:?}");
        }
        assert_eq!(found.len(), 4);
    }
}

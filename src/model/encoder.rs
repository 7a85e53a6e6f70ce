use serde::{Deserialize, Serialize};

/// Maps class labels to dense indices. Classes are kept sorted, so the
/// index of a label is stable for a given label set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit<S: AsRef<str>>(labels: &[S]) -> Self {
        let mut classes: Vec<String> = labels.iter().map(|l| l.as_ref().to_string()).collect();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    pub fn from_classes(mut classes: Vec<String>) -> Self {
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    pub fn transform(&self, label: &str) -> Option<usize> {
        self.classes.binary_search_by(|c| c.as_str().cmp(label)).ok()
    }

    pub fn inverse_transform(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_sorts_and_dedups() {
        let enc = LabelEncoder::fit(&["Malaria", "Acne", "Malaria", "Typhoid"]);
        assert_eq!(enc.classes(), &["Acne", "Malaria", "Typhoid"]);
    }

    #[test]
    fn transform_and_inverse_agree() {
        let enc = LabelEncoder::fit(&["Malaria", "Acne", "Typhoid"]);
        let idx = enc.transform("Typhoid").unwrap();
        assert_eq!(idx, 2);
        assert_eq!(enc.inverse_transform(idx), Some("Typhoid"));
        assert_eq!(enc.transform("Dengue"), None);
        assert_eq!(enc.inverse_transform(9), None);
    }
}

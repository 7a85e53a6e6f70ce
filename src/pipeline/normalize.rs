//! Text normalization shared by every matching step.

/// Punctuation that separates words in chat input but carries no meaning.
const SEPARATORS: [char; 3] = ['!', '.', ','];

/// Canonical form for all downstream matching: lowercased, separator
/// punctuation replaced by spaces, whitespace collapsed and trimmed.
pub fn normalize(text: &str) -> String {
    let replaced: String = text
        .to_lowercase()
        .chars()
        .map(|c| if SEPARATORS.contains(&c) { ' ' } else { c })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when `text` contains one of the separator characters.
pub(crate) fn has_separators(text: &str) -> bool {
    text.contains(SEPARATORS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn lowercases_and_collapses() {
        assert_eq!(normalize("  I have   Fever!! "), "i have fever");
        assert_eq!(normalize("Headache,vomiting.nausea"), "headache vomiting nausea");
    }

    #[test]
    fn empty_and_punctuation_only() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("!!! ... ,,,"), "");
    }

    #[test]
    fn keeps_other_punctuation() {
        assert_eq!(
            normalize("Madras Eye (Conjunctivitis)?"),
            "madras eye (conjunctivitis)?"
        );
    }

    proptest! {
        #[test]
        fn idempotent(text in "[a-zA-Z0-9àéîõüñ !.,?()\\t\\n-]{0,64}") {
            let once = normalize(&text);
            prop_assert_eq!(normalize(&once), once.clone());
            prop_assert!(!has_separators(&once));
            prop_assert!(!once.contains("  "));
        }
    }
}

//! User language selection and ISO code mapping.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A user-facing language choice. Display names and ISO 639-1 codes both parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    English,
    Tamil,
    Hindi,
    Odia,
    Telugu,
    Malayalam,
    Kannada,
    /// Anything else, kept as the lowercased input.
    Other(String),
}

impl Language {
    pub fn parse(raw: &str) -> Self {
        let lower = raw.trim().to_lowercase();
        match lower.as_str() {
            "english" | "en" | "eng" => Language::English,
            "tamil" | "ta" => Language::Tamil,
            "hindi" | "hi" => Language::Hindi,
            "odia" | "oriya" | "or" => Language::Odia,
            "telugu" | "te" => Language::Telugu,
            "malayalam" | "ml" => Language::Malayalam,
            "kannada" | "kn" => Language::Kannada,
            _ => Language::Other(lower),
        }
    }

    /// ISO code for translation requests. Unknown or empty languages map to "auto".
    pub fn source_code(&self) -> &str {
        match self {
            Language::English => "en",
            Language::Tamil => "ta",
            Language::Hindi => "hi",
            Language::Odia => "or",
            Language::Telugu => "te",
            Language::Malayalam => "ml",
            Language::Kannada => "kn",
            Language::Other(code) if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) => {
                code.as_str()
            }
            Language::Other(_) => "auto",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::English => write!(f, "English"),
            Language::Tamil => write!(f, "Tamil"),
            Language::Hindi => write!(f, "Hindi"),
            Language::Odia => write!(f, "Odia"),
            Language::Telugu => write!(f, "Telugu"),
            Language::Malayalam => write!(f, "Malayalam"),
            Language::Kannada => write!(f, "Kannada"),
            Language::Other(code) => write!(f, "{code}"),
        }
    }
}

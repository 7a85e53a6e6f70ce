//! Remote translation over a LibreTranslate-compatible HTTP API.

use serde::{Deserialize, Serialize};

use super::{Language, TranslationError, Translator};
use crate::config::TranslatorConfig;

/// Used when the configured working language has no ISO code.
const DEFAULT_WORKING_CODE: &str = "en";

/// HTTP client for a LibreTranslate-compatible `/translate` endpoint.
pub struct HttpTranslator {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
    /// ISO code of the language the engine works in.
    working_code: String,
}

impl HttpTranslator {
    pub fn new(
        endpoint: &str,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, TranslationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| TranslationError::HttpClient(e.to_string()))?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            client,
            timeout_secs,
            working_code: DEFAULT_WORKING_CODE.to_string(),
        })
    }

    pub fn with_working_language(mut self, working: &Language) -> Self {
        match working.source_code() {
            "auto" => tracing::warn!(
                language = %working,
                "Working language has no ISO code, translating to {DEFAULT_WORKING_CODE}"
            ),
            code => self.working_code = code.to_string(),
        }
        self
    }

    /// `None` when no endpoint is configured.
    pub fn from_config(
        config: &TranslatorConfig,
        working: &Language,
    ) -> Result<Option<Self>, TranslationError> {
        match config.endpoint.as_deref() {
            Some(endpoint) if !endpoint.trim().is_empty() => Ok(Some(
                Self::new(endpoint, config.api_key.clone(), config.timeout_secs)?
                    .with_working_language(working),
            )),
            _ => Ok(None),
        }
    }

    fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, TranslationError> {
        let url = format!("{}/translate", self.endpoint);
        let body = TranslateRequest {
            q: text,
            source,
            target,
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        let response = self.client.post(&url).json(&body).send().map_err(|e| {
            if e.is_connect() {
                TranslationError::Connection(self.endpoint.clone())
            } else if e.is_timeout() {
                TranslationError::Timeout(self.timeout_secs)
            } else {
                TranslationError::HttpClient(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TranslationError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TranslateResponse = response
            .json()
            .map_err(|e| TranslationError::ResponseParsing(e.to_string()))?;

        let translated = parsed.translated_text.trim().to_string();
        if translated.is_empty() {
            return Err(TranslationError::EmptyResult);
        }
        tracing::debug!(source, target, "Translation succeeded");
        Ok(translated)
    }
}

/// Request body for POST /translate
#[derive(Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

/// Response body from POST /translate
#[derive(Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

impl Translator for HttpTranslator {
    fn to_working_language(&self, text: &str, source: &str) -> Result<String, TranslationError> {
        self.translate(text, source, &self.working_code)
    }

    fn from_working_language(&self, text: &str, target: &str) -> Result<String, TranslationError> {
        self.translate(text, &self.working_code, target)
    }
}

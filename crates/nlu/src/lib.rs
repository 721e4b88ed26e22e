//! Intent classification adapter for a Wit.ai-compatible NLU service.
//!
//! Wraps the raw `{intents, entities}` payload behind a typed decode step:
//! the highest-confidence intent (first-ranked, the service returns them
//! pre-sorted) plus cleaned brand/model entities. An unexpected payload
//! shape is a classification failure, never a crash.

pub mod error;

use std::{collections::HashMap, time::Duration};

use {
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    tracing::debug,
};

pub use error::{Error, Result};

// ── Normalized result ────────────────────────────────────────────────────────

/// The classified purpose of an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Price,
    Info,
    Description,
    Image,
}

impl Intent {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "car_price" => Some(Self::Price),
            "car_info" => Some(Self::Info),
            "car_description" => Some(Self::Description),
            "car_image" => Some(Self::Image),
            _ => None,
        }
    }
}

/// Transient per-message classification. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct ClassificationResult {
    pub intent: Option<Intent>,
    pub brand: Option<String>,
    /// Already cleaned: separators stripped, trimmed, lowercased.
    pub model: Option<String>,
}

/// Strip `?` and `.`, trim, lowercase. Idempotent.
pub fn clean_model_name(raw: &str) -> String {
    raw.replace(['?', '.'], "").trim().to_lowercase()
}

// ── Wire shapes ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct WitResponse {
    #[serde(default)]
    intents: Vec<WitIntent>,
    #[serde(default)]
    entities: HashMap<String, Vec<WitEntity>>,
}

#[derive(Debug, Deserialize)]
struct WitIntent {
    name: String,
    #[allow(dead_code)]
    confidence: f64,
}

#[derive(Debug, Deserialize)]
struct WitEntity {
    value: String,
}

const BRAND_ENTITY: &str = "car_brand:car_brand";
const MODEL_ENTITY: &str = "car_model:car_model";

fn normalize_response(raw: WitResponse) -> ClassificationResult {
    let intent = raw
        .intents
        .first()
        .and_then(|i| Intent::from_name(&i.name));
    let entity = |key: &str| {
        raw.entities
            .get(key)
            .and_then(|values| values.first())
            .map(|e| e.value.clone())
    };
    ClassificationResult {
        intent,
        brand: entity(BRAND_ENTITY),
        model: entity(MODEL_ENTITY).map(|m| clean_model_name(&m)),
    }
}

// ── Client ───────────────────────────────────────────────────────────────────

/// HTTP client for the classification service. One call per message; no
/// internal retries.
pub struct WitClassifier {
    client: reqwest::Client,
    base_url: String,
    api_version: String,
    token: Secret<String>,
    timeout: Duration,
}

impl WitClassifier {
    pub fn new(
        base_url: impl Into<String>,
        api_version: impl Into<String>,
        token: Secret<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_version: api_version.into(),
            token,
            timeout,
        }
    }

    /// Classify one utterance. Any transport, status, or decode problem is
    /// reported to the caller as a failure of this single call.
    pub async fn classify(&self, text: &str) -> Result<ClassificationResult> {
        let url = format!(
            "{}/message?v={}&q={}",
            self.base_url,
            self.api_version,
            urlencoding::encode(text)
        );
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .bearer_auth(self.token.expose_secret())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        let raw: WitResponse = serde_json::from_str(&body)?;
        let result = normalize_response(raw);
        debug!(intent = ?result.intent, brand = ?result.brand, model = ?result.model, "classified");
        Ok(result)
    }
}

#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::GeminiConfig;

const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

/// Models tried in order when picking a generation model at startup
const MODEL_PREFERENCES: [&str; 4] = [
    "models/gemini-1.5-flash",
    "models/gemini-1.5-flash-latest",
    "models/gemini-pro",
    "models/gemini-1.0-pro",
];

/// Used when model listing fails or returns nothing usable
const FALLBACK_MODEL: &str = "gemini-1.5-flash";

const NO_ANSWER: &str = "I don't know.";

/// Client for the Gemini generative language API.
///
/// The generation model is chosen once at construction and reused for the
/// lifetime of the process.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    base_url: Url,
    api_key: String,
    model: String,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
pub struct GeminiModelInfo {
    pub name: String,
    #[serde(rename = "supportedGenerationMethods", default)]
    pub supported_generation_methods: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<GeminiModelInfo>,
}

/// Pick a generation model from the available set: the first preference-list
/// entry present wins, then the first available model, then the hardcoded
/// fallback. Deterministic for a fixed available set.
#[inline]
pub fn select_preferred_model(available: &[String]) -> String {
    for preference in MODEL_PREFERENCES {
        if available.iter().any(|name| name == preference) {
            return preference.to_string();
        }
    }

    available
        .first()
        .cloned()
        .unwrap_or_else(|| FALLBACK_MODEL.to_string())
}

/// Compose the context-constrained instruction prompt
fn build_prompt(query: &str, context: &str) -> String {
    format!(
        "You are a helpful assistant.\n\
         Answer ONLY from the context.\n\
         If the answer is not in the context, say \"I don't know\".\n\
         \n\
         Context:\n\
         {}\n\
         \n\
         Question:\n\
         {}\n\
         \n\
         Answer:\n",
        context, query
    )
}

/// Model names from listing carry a `models/` prefix; the fallback does not
fn model_path(name: &str) -> String {
    if name.starts_with("models/") {
        name.to_string()
    } else {
        format!("models/{}", name)
    }
}

impl GeminiClient {
    /// Create a client and select the generation model.
    ///
    /// Fails when no API key is configured; a failed model listing is not
    /// fatal and falls back to the hardcoded default model.
    #[inline]
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            anyhow::anyhow!("Gemini API key not found (set gemini.api_key or GEMINI_API_KEY)")
        })?;

        let base_url = Url::parse(&config.endpoint)
            .with_context(|| format!("Invalid Gemini endpoint: {}", config.endpoint))?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
            .build()
            .into();

        let mut client = Self {
            base_url,
            api_key,
            model: FALLBACK_MODEL.to_string(),
            agent,
        };

        client.model = client.select_model();
        info!("Initialized LLM with model: {}", client.model);

        Ok(client)
    }

    /// The model chosen at construction time
    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn select_model(&self) -> String {
        match self.list_generation_models() {
            Ok(available) => select_preferred_model(&available),
            Err(e) => {
                warn!("Error listing models: {e:#}");
                FALLBACK_MODEL.to_string()
            }
        }
    }

    /// List models that support content generation
    #[inline]
    pub fn list_generation_models(&self) -> Result<Vec<String>> {
        let mut url = self
            .base_url
            .join("/v1beta/models")
            .context("Failed to build models URL")?;
        url.query_pairs_mut().append_pair("key", &self.api_key);

        debug!("Fetching available Gemini models");

        let response_text = self
            .agent
            .get(url.as_str())
            .call()
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .context("Failed to fetch models")?;

        let models_response: ListModelsResponse =
            serde_json::from_str(&response_text).context("Failed to parse models response")?;

        let names = models_response
            .models
            .into_iter()
            .filter(|m| {
                m.supported_generation_methods
                    .iter()
                    .any(|method| method == "generateContent")
            })
            .map(|m| m.name)
            .collect::<Vec<_>>();

        debug!("Found {} generation-capable models", names.len());
        Ok(names)
    }

    /// Answer a question strictly from the supplied context chunks.
    ///
    /// Never fails: a response without text degrades to a fixed fallback and
    /// a failed call degrades to a fallback embedding the error message.
    #[inline]
    pub fn generate_answer(&self, query: &str, context_docs: &[String]) -> String {
        let context = context_docs.join("\n\n");
        let prompt = build_prompt(query, &context);

        match self.generate_text(&prompt) {
            Ok(Some(text)) => text,
            Ok(None) => NO_ANSWER.to_string(),
            Err(e) => {
                error!("Error generating content with {}: {e:#}", self.model);
                format!("I don't know (Error: {e:#})")
            }
        }
    }

    /// Send a raw prompt to the selected model.
    ///
    /// Returns `Ok(None)` when the response carries no text.
    #[inline]
    pub fn generate_text(&self, prompt: &str) -> Result<Option<String>> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let mut url = self
            .base_url
            .join(&format!("/v1beta/{}:generateContent", model_path(&self.model)))
            .context("Failed to build generation URL")?;
        url.query_pairs_mut().append_pair("key", &self.api_key);

        let request_json =
            serde_json::to_string(&request).context("Failed to serialize generation request")?;

        debug!("Requesting generation from {}", self.model);

        let response_text = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .send(&request_json)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .context("Failed to generate content")?;

        let response: GenerateResponse =
            serde_json::from_str(&response_text).context("Failed to parse generation response")?;

        let text = response
            .candidates
            .into_iter()
            .filter_map(|candidate| candidate.content)
            .flat_map(|content| content.parts)
            .map(|part| part.text)
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(text.trim().to_string()))
        }
    }
}

//! Minimal client for the Generative Language REST API.
//!
//! Text calls always request JSON constrained by a response schema; the
//! caller deserializes into its own type and validates the shape.

use anyhow::{anyhow, bail, Context};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

#[derive(Clone)]
pub struct GenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    image_model: String,
}

impl GenAiClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.genai_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_key: config.genai_api_key.clone(),
            base_url: config.genai_base_url.trim_end_matches('/').to_string(),
            model: config.genai_model.clone(),
            image_model: config.genai_image_model.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/v1beta/models/{}:{}", self.base_url, model, method)
    }

    /// Single-prompt JSON generation.
    pub async fn generate_json<T: DeserializeOwned>(
        &self,
        system: Option<&str>,
        prompt: &str,
        schema: Value,
    ) -> anyhow::Result<T> {
        let turns = [ChatTurn {
            role: ChatRole::User,
            text: prompt.to_string(),
        }];
        self.generate_json_from_turns(system, &turns, schema).await
    }

    /// Multi-turn JSON generation (chat history oldest first).
    pub async fn generate_json_from_turns<T: DeserializeOwned>(
        &self,
        system: Option<&str>,
        turns: &[ChatTurn],
        schema: Value,
    ) -> anyhow::Result<T> {
        if !self.is_configured() {
            bail!("generative AI API key is not configured");
        }

        let body = build_generate_body(system, turns, schema);
        let response = self
            .http
            .post(self.endpoint(&self.model, "generateContent"))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("generative AI error {}: {}", status, body);
        }

        let payload: Value = response.json().await?;
        let text = extract_candidate_text(&payload)
            .ok_or_else(|| anyhow!("generative AI response had no text candidate"))?;
        serde_json::from_str(text).context("generative AI response did not match the schema")
    }

    /// Generate one image and return it as a `data:` URI.
    pub async fn generate_image(&self, prompt: &str) -> anyhow::Result<String> {
        if !self.is_configured() {
            bail!("generative AI API key is not configured");
        }

        let response = self
            .http
            .post(self.endpoint(&self.image_model, "predict"))
            .header("x-goog-api-key", &self.api_key)
            .json(&json!({
                "instances": [{ "prompt": prompt }],
                "parameters": { "sampleCount": 1, "aspectRatio": "1:1" }
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("image generation error {}: {}", status, body);
        }

        let payload: Value = response.json().await?;
        extract_image_data_uri(&payload).ok_or_else(|| anyhow!("image response had no image data"))
    }
}

pub fn build_generate_body(system: Option<&str>, turns: &[ChatTurn], schema: Value) -> Value {
    let contents: Vec<Value> = turns
        .iter()
        .map(|t| json!({ "role": t.role, "parts": [{ "text": t.text }] }))
        .collect();

    let mut body = json!({
        "contents": contents,
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": schema,
            "temperature": 0.7,
        },
    });
    if let Some(system) = system {
        body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
    }
    body
}

pub fn extract_candidate_text(payload: &Value) -> Option<&str> {
    payload
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?
        .iter()
        .find_map(|p| p.get("text").and_then(Value::as_str))
}

pub fn extract_image_data_uri(payload: &Value) -> Option<String> {
    let prediction = payload.get("predictions")?.get(0)?;
    let data = prediction.get("bytesBase64Encoded")?.as_str()?;
    if data.is_empty() {
        return None;
    }
    let mime = prediction
        .get("mimeType")
        .and_then(Value::as_str)
        .unwrap_or("image/png");
    Some(format!("data:{};base64,{}", mime, data))
}

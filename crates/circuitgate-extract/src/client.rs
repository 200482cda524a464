// circuitgate-extract/src/client.rs
// ============================================================================
// Module: HTTP Extraction Client
// Description: `ExtractionClient` implementation backed by an HTTP LLM
//              provider, with dual retry policies (transient, schema).
// Purpose: The only component in this workspace permitted to call an
//          external model (§4.3); every other crate is deterministic.
// Dependencies: circuitgate-core, reqwest, jsonschema, serde_json
// ============================================================================

//! ## Overview
//! Two independent retry loops, both capped at
//! [`crate::config::MAX_PROVIDER_ATTEMPTS`]/[`crate::config::MAX_SCHEMA_ATTEMPTS`]
//! attempts: the inner loop retries a transient provider failure (network,
//! 5xx, rate-limit) with exponential backoff; the outer loop retries a
//! schema-validation failure by re-prompting with the validator's error
//! text appended to the system prompt. A value is only ever returned once
//! it has passed [`crate::schema_check::validate`].

use async_trait::async_trait;
use circuitgate_core::ContentBlock;
use circuitgate_core::ExtractionClient;
use circuitgate_core::ExtractionError;
use circuitgate_core::ExtractionMetadata;
use circuitgate_core::ExtractionRequest;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::config::HttpExtractionConfig;
use crate::config::MAX_PROVIDER_ATTEMPTS;
use crate::config::MAX_SCHEMA_ATTEMPTS;
use crate::config::transient_backoff;
use crate::schema_check;

/// Wire request body sent to the extraction provider.
#[derive(Debug, Serialize)]
struct ProviderRequest<'a> {
    model: &'a str,
    system_prompt: &'a str,
    content: Vec<WireBlock<'a>>,
    response_schema: &'a Value,
}

/// One content block as sent over the wire.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireBlock<'a> {
    /// Plain text content.
    Text { text: &'a str },
    /// A base64-encoded image.
    Image { base64_data: &'a str, content_type: &'a str },
}

/// Wire response body returned by the extraction provider.
#[derive(Debug, Deserialize)]
struct ProviderResponse {
    value: Value,
    model_version: Option<String>,
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
    aggregate_quality: Option<f64>,
}

/// `ExtractionClient` implementation that calls an HTTP LLM provider.
pub struct HttpExtractionClient {
    http: reqwest::Client,
    config: HttpExtractionConfig,
    prompt_version: String,
}

impl HttpExtractionClient {
    /// Builds a client from `config`, tagging every request with
    /// `prompt_version` (propagated into [`ExtractionMetadata`]).
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying HTTP client cannot be built.
    pub fn new(config: HttpExtractionConfig, prompt_version: impl Into<String>) -> Result<Self, ExtractionError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ExtractionError::Provider(e.to_string()))?;
        Ok(Self {
            http,
            config,
            prompt_version: prompt_version.into(),
        })
    }

    async fn call_once(
        &self,
        system_prompt: &str,
        text_blocks: &[String],
        image_blocks: &[ContentBlock],
        response_schema: &Value,
    ) -> Result<ProviderResponse, String> {
        let mut content: Vec<WireBlock<'_>> = text_blocks.iter().map(|t| WireBlock::Text { text: t }).collect();
        for block in image_blocks {
            if let ContentBlock::Image { base64_data, content_type } = block {
                content.push(WireBlock::Image {
                    base64_data,
                    content_type,
                });
            }
        }

        let body = ProviderRequest {
            model: &self.config.model,
            system_prompt,
            content,
            response_schema,
        };

        let response = self
            .http
            .post(self.config.endpoint.clone())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("provider returned status {}", response.status()));
        }

        response.json::<ProviderResponse>().await.map_err(|e| e.to_string())
    }

    async fn call_with_transient_retries(
        &self,
        system_prompt: &str,
        text_blocks: &[String],
        image_blocks: &[ContentBlock],
        response_schema: &Value,
    ) -> Result<ProviderResponse, String> {
        let mut last_error = String::new();
        for attempt in 1..=MAX_PROVIDER_ATTEMPTS {
            match self.call_once(system_prompt, text_blocks, image_blocks, response_schema).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    last_error = e;
                    if attempt < MAX_PROVIDER_ATTEMPTS {
                        tokio::time::sleep(transient_backoff(attempt)).await;
                    }
                }
            }
        }
        Err(last_error)
    }
}

#[async_trait]
impl ExtractionClient for HttpExtractionClient {
    async fn extract(&self, request: ExtractionRequest<'_>) -> Result<(Value, ExtractionMetadata), ExtractionError> {
        let mut prompt = request.system_prompt.to_string();
        let mut last_schema_error = String::new();

        for _schema_attempt in 1..=MAX_SCHEMA_ATTEMPTS {
            let response = self
                .call_with_transient_retries(&prompt, request.text_blocks, request.image_blocks, request.response_schema)
                .await
                .map_err(ExtractionError::Provider)?;

            match schema_check::validate(&response.value, request.response_schema) {
                Ok(()) => {
                    let metadata = ExtractionMetadata {
                        model_version: response.model_version.unwrap_or_else(|| self.config.model.clone()),
                        prompt_version: self.prompt_version.clone(),
                        prompt_tokens: response.prompt_tokens,
                        completion_tokens: response.completion_tokens,
                        aggregate_quality: response.aggregate_quality.unwrap_or(1.0),
                    };
                    return Ok((response.value, metadata));
                }
                Err(validation_error) => {
                    prompt = format!(
                        "{}\n\nYour previous response failed schema validation: {validation_error}. \
                         Correct it and respond again with a conforming value.",
                        request.system_prompt
                    );
                    last_schema_error = validation_error;
                }
            }
        }

        Err(ExtractionError::SchemaValidation(last_schema_error))
    }
}

// circuitgate-extract/src/extractors.rs
// ============================================================================
// Module: Per-Flavor Extractors
// Description: One extractor per extraction flavor, each pairing a fixed
//              prompt and schema with the `ExtractionClient` and decoding
//              its response into the typed `circuitgate_core` structs.
// Purpose: Give the orchestrator (C10) one call per document flavor instead
//          of hand-building prompts/schemas at each call site (§4.4).
// Dependencies: circuitgate-core, serde_json
// ============================================================================

//! ## Overview
//! Every extractor is a thin wrapper over `Arc<dyn ExtractionClient>`: it
//! owns nothing but the flavor's prompt/schema pair and decodes the
//! returned `serde_json::Value` into its typed extraction struct. The
//! decode step is the only place a malformed-but-schema-valid response
//! (e.g. a numeric field `serde` can't represent exactly) surfaces as an
//! error.

use std::sync::Arc;

use circuitgate_core::CertificateOcrExtraction;
use circuitgate_core::ContentBlock;
use circuitgate_core::ExtractionClient;
use circuitgate_core::ExtractionError;
use circuitgate_core::ExtractionMetadata;
use circuitgate_core::ExtractionRequest;
use circuitgate_core::GroundingExtraction;
use circuitgate_core::HygrometerOcrExtraction;
use circuitgate_core::MeggerExtraction;
use circuitgate_core::ThermographyExtraction;

use crate::prompts;
use crate::schemas;

/// Maximum images per thermography extraction call (§4.4: "more than 10
/// images for thermography").
pub const MAX_IMAGES_PER_THERMOGRAPHY_BATCH: usize = 10;

/// Errors from a per-flavor extractor.
#[derive(Debug, thiserror::Error)]
pub enum ExtractorError {
    /// The underlying extraction client failed after retries.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    /// The response passed schema validation but did not decode into the
    /// flavor's typed struct.
    #[error("extraction response did not match the expected shape: {0}")]
    Decode(String),
}

/// Extracts grounding (earth resistance) test data.
pub struct GroundingExtractor {
    client: Arc<dyn ExtractionClient>,
}

impl GroundingExtractor {
    /// Wraps an extraction client.
    #[must_use]
    pub fn new(client: Arc<dyn ExtractionClient>) -> Self {
        Self { client }
    }

    /// Extracts a grounding result from the given text and image blocks.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractorError`] when extraction fails or the response
    /// does not decode into [`GroundingExtraction`].
    pub async fn extract(
        &self,
        text_blocks: &[String],
        image_blocks: &[ContentBlock],
    ) -> Result<(GroundingExtraction, ExtractionMetadata), ExtractorError> {
        let schema = schemas::grounding_schema();
        let (value, metadata) = self
            .client
            .extract(ExtractionRequest {
                system_prompt: prompts::GROUNDING_PROMPT,
                text_blocks,
                image_blocks,
                response_schema: &schema,
            })
            .await?;
        let extraction = serde_json::from_value(value).map_err(|e| ExtractorError::Decode(e.to_string()))?;
        Ok((extraction, metadata))
    }
}

/// Extracts Megger (insulation resistance) test data.
pub struct MeggerExtractor {
    client: Arc<dyn ExtractionClient>,
}

impl MeggerExtractor {
    /// Wraps an extraction client.
    #[must_use]
    pub fn new(client: Arc<dyn ExtractionClient>) -> Self {
        Self { client }
    }

    /// Extracts a Megger result from the given text and image blocks.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractorError`] when extraction fails or the response
    /// does not decode into [`MeggerExtraction`].
    pub async fn extract(
        &self,
        text_blocks: &[String],
        image_blocks: &[ContentBlock],
    ) -> Result<(MeggerExtraction, ExtractionMetadata), ExtractorError> {
        let schema = schemas::megger_schema();
        let (value, metadata) = self
            .client
            .extract(ExtractionRequest {
                system_prompt: prompts::MEGGER_PROMPT,
                text_blocks,
                image_blocks,
                response_schema: &schema,
            })
            .await?;
        let extraction = serde_json::from_value(value).map_err(|e| ExtractorError::Decode(e.to_string()))?;
        Ok((extraction, metadata))
    }
}

/// Extracts thermography inspection data, one image batch at a time.
pub struct ThermographyExtractor {
    client: Arc<dyn ExtractionClient>,
}

impl ThermographyExtractor {
    /// Wraps an extraction client.
    #[must_use]
    pub fn new(client: Arc<dyn ExtractionClient>) -> Self {
        Self { client }
    }

    /// Extracts a single batch (at most [`MAX_IMAGES_PER_THERMOGRAPHY_BATCH`]
    /// images; the caller is responsible for splitting a larger document
    /// via [`split_into_batches`]).
    ///
    /// # Errors
    ///
    /// Returns [`ExtractorError`] when extraction fails or the response
    /// does not decode into [`ThermographyExtraction`].
    pub async fn extract_batch(
        &self,
        text_blocks: &[String],
        image_blocks: &[ContentBlock],
    ) -> Result<(ThermographyExtraction, ExtractionMetadata), ExtractorError> {
        let schema = schemas::thermography_schema();
        let (value, metadata) = self
            .client
            .extract(ExtractionRequest {
                system_prompt: prompts::THERMOGRAPHY_PROMPT,
                text_blocks,
                image_blocks,
                response_schema: &schema,
            })
            .await?;
        let extraction = serde_json::from_value(value).map_err(|e| ExtractorError::Decode(e.to_string()))?;
        Ok((extraction, metadata))
    }
}

/// Splits `images` into batches of at most [`MAX_IMAGES_PER_THERMOGRAPHY_BATCH`],
/// preserving order.
#[must_use]
pub fn split_into_batches(images: &[ContentBlock]) -> Vec<&[ContentBlock]> {
    images.chunks(MAX_IMAGES_PER_THERMOGRAPHY_BATCH.max(1)).collect()
}

/// Merges a non-empty sequence of per-batch thermography results into one,
/// concatenating hotspots; the first batch's equipment/calibration/test
/// conditions/thermal metadata/report comments are kept as the merged
/// result's own (§4.4: "merged by concatenating hotspots and recomputing
/// derived fields" — the derived fields are accessor methods over
/// `hotspots`, so no recomputation step is needed beyond the concatenation
/// itself).
///
/// # Panics
///
/// Never panics; returns `None` only when `results` is empty.
#[must_use]
pub fn merge_thermography_batches(mut results: Vec<ThermographyExtraction>) -> Option<ThermographyExtraction> {
    if results.is_empty() {
        return None;
    }
    let mut merged = results.remove(0);
    for batch in results {
        merged.merge_batch(batch);
    }
    Some(merged)
}

/// Extracts calibration certificate OCR data from a single image.
pub struct CertificateOcrExtractor {
    client: Arc<dyn ExtractionClient>,
}

impl CertificateOcrExtractor {
    /// Wraps an extraction client.
    #[must_use]
    pub fn new(client: Arc<dyn ExtractionClient>) -> Self {
        Self { client }
    }

    /// Extracts certificate data from `image`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractorError`] when extraction fails or the response
    /// does not decode into [`CertificateOcrExtraction`].
    pub async fn extract(&self, image: &ContentBlock) -> Result<(CertificateOcrExtraction, ExtractionMetadata), ExtractorError> {
        let schema = schemas::certificate_ocr_schema();
        let images = std::slice::from_ref(image);
        let (value, metadata) = self
            .client
            .extract(ExtractionRequest {
                system_prompt: prompts::CERTIFICATE_OCR_PROMPT,
                text_blocks: &[],
                image_blocks: images,
                response_schema: &schema,
            })
            .await?;
        let extraction = serde_json::from_value(value).map_err(|e| ExtractorError::Decode(e.to_string()))?;
        Ok((extraction, metadata))
    }
}

/// Extracts thermo-hygrometer display OCR data from a single image.
pub struct HygrometerOcrExtractor {
    client: Arc<dyn ExtractionClient>,
}

impl HygrometerOcrExtractor {
    /// Wraps an extraction client.
    #[must_use]
    pub fn new(client: Arc<dyn ExtractionClient>) -> Self {
        Self { client }
    }

    /// Extracts readings from `image`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractorError`] when extraction fails or the response
    /// does not decode into [`HygrometerOcrExtraction`].
    pub async fn extract(&self, image: &ContentBlock) -> Result<(HygrometerOcrExtraction, ExtractionMetadata), ExtractorError> {
        let schema = schemas::hygrometer_ocr_schema();
        let images = std::slice::from_ref(image);
        let (value, metadata) = self
            .client
            .extract(ExtractionRequest {
                system_prompt: prompts::HYGROMETER_OCR_PROMPT,
                text_blocks: &[],
                image_blocks: images,
                response_schema: &schema,
            })
            .await?;
        let extraction = serde_json::from_value(value).map_err(|e| ExtractorError::Decode(e.to_string()))?;
        Ok((extraction, metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(n: u8) -> ContentBlock {
        ContentBlock::Image {
            base64_data: format!("data{n}"),
            content_type: "image/png".to_string(),
        }
    }

    #[test]
    fn split_into_batches_caps_each_chunk_at_ten() {
        let images: Vec<ContentBlock> = (0..25).map(image).collect();
        let batches = split_into_batches(&images);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].len(), 10);
        assert_eq!(batches[1].len(), 10);
        assert_eq!(batches[2].len(), 5);
    }

    #[test]
    fn merge_thermography_batches_returns_none_for_empty_input() {
        assert!(merge_thermography_batches(Vec::new()).is_none());
    }
}

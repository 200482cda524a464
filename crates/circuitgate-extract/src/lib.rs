// circuitgate-extract/src/lib.rs
// ============================================================================
// Module: Circuitgate Extract
// Description: LLM extraction client adapter, per-flavor extractors, and
//              the deterministic test-type classifier.
// Purpose: Bundle C4 (extraction client), C5 (extractors), and C6
//          (classifier) — the only crate in the workspace that ever calls
//          an external model.
// Dependencies: circuitgate-core, reqwest, jsonschema, serde_json
// ============================================================================

//! ## Overview
//! [`client::HttpExtractionClient`] is the sole `ExtractionClient`
//! implementation. [`extractors`] layers the fixed prompt/schema pairs on
//! top of it. [`classifier`] is pure and never touches the client at all.

pub mod classifier;
pub mod client;
pub mod config;
pub mod extractors;
pub mod prompts;
pub mod schema_check;
pub mod schemas;

pub use classifier::Classification;
pub use classifier::classify;
pub use client::HttpExtractionClient;
pub use config::HttpExtractionConfig;
pub use config::MAX_PROVIDER_ATTEMPTS;
pub use config::MAX_SCHEMA_ATTEMPTS;
pub use extractors::CertificateOcrExtractor;
pub use extractors::ExtractorError;
pub use extractors::GroundingExtractor;
pub use extractors::HygrometerOcrExtractor;
pub use extractors::MAX_IMAGES_PER_THERMOGRAPHY_BATCH;
pub use extractors::MeggerExtractor;
pub use extractors::ThermographyExtractor;
pub use extractors::merge_thermography_batches;
pub use extractors::split_into_batches;
pub use prompts::PROMPT_VERSION;

// circuitgate-orchestrator/src/pipeline.rs
// ============================================================================
// Module: Orchestrator Pipeline
// Description: The background worker's single entry point: claims a task,
//              decodes its artifact, extracts, validates, and persists the
//              result, with an append-only audit trail at every step.
// Purpose: C10 (§4.9): the 10-step `process(task_id)` sequence wired to
//          C1/C2/C3/C4/C5/C6/C7/C8/C9 purely through `circuitgate-core`
//          trait objects.
// Dependencies: circuitgate-core, circuitgate-extract, circuitgate-validate
// ============================================================================

//! ## Overview
//! `process` is the function `circuitgate-cli` wraps into the closure
//! `circuitgate_broker::worker::run_worker` drives. It never assumes a
//! concrete store, object store, or extraction provider — only the trait
//! objects in [`OrchestratorContext`]. Every branch that can fail after
//! the task has been claimed (`PROCESSING`) is funneled through one
//! catch-all that transitions the task to `FAILED` with the error's
//! message before propagating, matching §4.9's closing line.

use std::sync::Arc;

use circuitgate_core::Analysis;
use circuitgate_core::AnalysisId;
use circuitgate_core::AnalysisStore;
use circuitgate_core::AuditEvent;
use circuitgate_core::AuditEventId;
use circuitgate_core::AuditEventType;
use circuitgate_core::AuditStore;
use circuitgate_core::CertificateOcrExtraction;
use circuitgate_core::ContentBlock;
use circuitgate_core::Diagnostics;
use circuitgate_core::EquipmentType;
use circuitgate_core::ExtractionClient;
use circuitgate_core::ExtractionMetadata;
use circuitgate_core::Finding;
use circuitgate_core::FindingStore;
use circuitgate_core::GroundingExtraction;
use circuitgate_core::HygrometerOcrExtraction;
use circuitgate_core::LeafConfidences;
use circuitgate_core::MeggerExtraction;
use circuitgate_core::ObjectStore;
use circuitgate_core::StandardProfile;
use circuitgate_core::Task;
use circuitgate_core::TaskId;
use circuitgate_core::TaskStatus;
use circuitgate_core::TaskStore;
use circuitgate_core::TestType;
use circuitgate_core::ThermographyExtraction;
use circuitgate_core::MAX_ARTIFACT_BYTES;
use circuitgate_extract::CertificateOcrExtractor;
use circuitgate_extract::GroundingExtractor;
use circuitgate_extract::HygrometerOcrExtractor;
use circuitgate_extract::MeggerExtractor;
use circuitgate_extract::ThermographyExtractor;
use circuitgate_extract::classify;
use circuitgate_extract::merge_thermography_batches;
use circuitgate_extract::split_into_batches;
use circuitgate_validate::ComplementaryInputs;
use circuitgate_validate::ValidationResult;
use circuitgate_validate::compute_score;
use circuitgate_validate::compute_verdict;
use circuitgate_validate::to_persisted;
use circuitgate_validate::validate_grounding;
use circuitgate_validate::validate_megger;
use circuitgate_validate::validate_thermography;
use time::OffsetDateTime;

use crate::decode;
use crate::equipment;
use crate::error::OrchestratorError;
use crate::error::require_known;

/// Every backend-agnostic collaborator the pipeline needs, bundled for a
/// single call to [`process`]. Cheap to clone (every field is an `Arc`
/// or, for the profile, a small immutable value).
pub struct OrchestratorContext {
    /// Task persistence (C2).
    pub task_store: Arc<dyn TaskStore>,
    /// Analysis persistence (C2).
    pub analysis_store: Arc<dyn AnalysisStore>,
    /// Finding persistence (C2).
    pub finding_store: Arc<dyn FindingStore>,
    /// Append-only audit persistence (C9).
    pub audit_store: Arc<dyn AuditStore>,
    /// Artifact storage (C3).
    pub object_store: Arc<dyn ObjectStore>,
    /// LLM extraction adapter (C4).
    pub extraction_client: Arc<dyn ExtractionClient>,
    /// The standard profile (C7 parameter) every analysis is validated
    /// against. Resolved once at process startup, not per task (§B.1).
    pub profile: StandardProfile,
    /// Operational diagnostics sink for non-fatal warnings (e.g. an
    /// audit-log append failure).
    pub diagnostics: Arc<dyn Diagnostics>,
}

/// Runs the full pipeline for one task: claim, decode, classify, extract,
/// validate, persist, complete. Idempotent on re-entry — a task whose
/// persisted status is not `QUEUED` returns `Ok(())` immediately without
/// side effects, and a lost compare-and-set race does the same.
///
/// # Errors
///
/// Returns [`OrchestratorError`] for any failure after the task is
/// claimed; the task is transitioned to `FAILED` with the error's message
/// before the error is returned.
pub async fn process(ctx: &OrchestratorContext, task_id: TaskId) -> Result<(), OrchestratorError> {
    let task = ctx
        .task_store
        .get(task_id)
        .await?
        .ok_or(OrchestratorError::TaskNotFound(task_id))?;

    if task.status != TaskStatus::Queued {
        return Ok(());
    }

    let step_two_timestamp = OffsetDateTime::now_utc();
    let claimed = ctx
        .task_store
        .compare_and_set_status(task_id, TaskStatus::Queued, TaskStatus::Processing, None)
        .await?;
    if !claimed {
        return Ok(());
    }

    match run_claimed(ctx, &task, step_two_timestamp).await {
        Ok(()) => Ok(()),
        Err(err) => {
            let message = err.to_string();
            // Best-effort: if this also fails there is nothing further to
            // do but return the original error.
            let _ = ctx
                .task_store
                .compare_and_set_status(task_id, TaskStatus::Processing, TaskStatus::Failed, Some(&message))
                .await;
            Err(err)
        }
    }
}

/// Pending buffer entry for `extraction_started`/`extraction_completed`,
/// which cannot be appended until step 7 creates the `Analysis` they are
/// keyed to.
struct PendingEvent {
    event_type: AuditEventType,
    timestamp: OffsetDateTime,
    model_version: Option<String>,
    prompt_version: Option<String>,
    confidence_score: Option<f64>,
    details: serde_json::Value,
}

/// Runs steps 3 through 10 of `process` against a task already claimed
/// (transitioned to `PROCESSING`) by the caller. `step_two_timestamp` is
/// the moment the claim happened, used to retroactively timestamp the
/// `extraction_started` event once step 7 creates the `Analysis` it is
/// keyed to.
async fn run_claimed(ctx: &OrchestratorContext, task: &Task, step_two_timestamp: OffsetDateTime) -> Result<(), OrchestratorError> {
    // Step 3.
    let bytes = ctx.object_store.get(&task.object_key).await?;
    let actual = bytes.len() as u64;
    if actual > MAX_ARTIFACT_BYTES {
        return Err(OrchestratorError::ArtifactTooLarge { actual, max: MAX_ARTIFACT_BYTES });
    }
    let decoded = decode::decode(&bytes)?;

    // Step 4.
    let normalized_text = decoded.text_blocks.join(" ").to_lowercase();
    let classification = classify(&normalized_text, decoded.image_blocks.len());
    let test_type = require_known(classification)?;

    // Step 5 (+ step 6 for thermography).
    let extraction_started_at = OffsetDateTime::now_utc();
    let outcome = extract(ctx, test_type, &decoded.text_blocks, &decoded.image_blocks).await;

    let mut pending = vec![PendingEvent {
        event_type: AuditEventType::ExtractionStarted,
        timestamp: step_two_timestamp,
        model_version: None,
        prompt_version: None,
        confidence_score: None,
        details: serde_json::Value::Null,
    }];

    let outcome = match outcome {
        Ok(outcome) => {
            pending.push(PendingEvent {
                event_type: AuditEventType::ExtractionCompleted,
                timestamp: extraction_started_at,
                model_version: Some(outcome.metadata().model_version.clone()),
                prompt_version: Some(outcome.metadata().prompt_version.clone()),
                confidence_score: Some(outcome.overall_confidence()),
                details: serde_json::Value::Null,
            });
            outcome
        }
        Err(err) => {
            pending.push(PendingEvent {
                event_type: AuditEventType::ExtractionFailed,
                timestamp: OffsetDateTime::now_utc(),
                model_version: None,
                prompt_version: None,
                confidence_score: None,
                details: serde_json::json!({ "error": err.to_string() }),
            });
            // The analysis never gets created for a failed extraction, so
            // these events have no id to be keyed to; best-effort warn
            // instead of silently dropping them.
            for event in &pending {
                ctx.diagnostics.warn(&format!(
                    "dropping pre-analysis audit event {:?}: extraction failed before an analysis id existed",
                    event.event_type
                ));
            }
            return Err(err);
        }
    };

    // Step 7.
    let now = OffsetDateTime::now_utc();
    let analysis = Analysis {
        id: AnalysisId::new(),
        task_id: task.id,
        test_type,
        equipment_type: outcome.equipment_type(),
        equipment_tag: outcome.equipment_tag(),
        compliance_score: None,
        overall_confidence: outcome.overall_confidence(),
        verdict: None,
        rejection_reason: None,
        extraction_payload: outcome.extraction_payload(),
        validation_payload: serde_json::Value::Null,
        created_at: now,
        updated_at: now,
    };
    ctx.analysis_store.create(&analysis).await?;

    for event in pending {
        append_or_warn(ctx, analysis.id, event).await;
    }

    // Step 8.
    let validation = outcome.validate(&ctx.profile);
    for finding in &validation.findings {
        append_or_warn(
            ctx,
            analysis.id,
            PendingEvent {
                event_type: AuditEventType::ValidationRuleApplied,
                timestamp: OffsetDateTime::now_utc(),
                model_version: None,
                prompt_version: None,
                confidence_score: None,
                details: serde_json::json!({ "rule_id": finding.rule_id }),
            },
        )
        .await;
        append_or_warn(
            ctx,
            analysis.id,
            PendingEvent {
                event_type: AuditEventType::FindingGenerated,
                timestamp: OffsetDateTime::now_utc(),
                model_version: None,
                prompt_version: None,
                confidence_score: None,
                details: serde_json::json!({ "rule_id": finding.rule_id, "severity": finding.severity }),
            },
        )
        .await;
    }

    // Step 9.
    let findings: Vec<Finding> = validation
        .findings
        .into_iter()
        .map(|f| to_persisted(f, analysis.id))
        .collect();
    ctx.finding_store.create_many(&findings).await?;

    let score = compute_score(&findings);
    let verdict = compute_verdict(&findings, score, analysis.overall_confidence);
    let mut analysis = analysis;
    analysis.compliance_score = Some(score);
    analysis.verdict = Some(verdict);
    analysis.validation_payload = serde_json::json!({
        "critical_count": validation.critical_count,
        "major_count": validation.major_count,
        "minor_count": validation.minor_count,
        "info_count": validation.info_count,
        "is_valid": validation.is_valid,
        "needs_review": outcome.needs_review(),
        "standard_profile": ctx.profile.name,
    });
    analysis.updated_at = OffsetDateTime::now_utc();
    ctx.analysis_store.update(&analysis).await?;

    append_or_warn(
        ctx,
        analysis.id,
        PendingEvent {
            event_type: AuditEventType::ValidationCompleted,
            timestamp: OffsetDateTime::now_utc(),
            model_version: None,
            prompt_version: None,
            confidence_score: None,
            details: serde_json::json!({ "compliance_score": score, "verdict": verdict }),
        },
    )
    .await;

    // Step 10.
    ctx.task_store
        .compare_and_set_status(task.id, TaskStatus::Processing, TaskStatus::Completed, None)
        .await?;

    Ok(())
}

/// Appends a [`PendingEvent`] to the audit log, now that `analysis_id` is
/// known. A failure here is logged as a diagnostic warning and otherwise
/// swallowed (§4.8: an audit gap must never fail the surrounding
/// operation).
async fn append_or_warn(ctx: &OrchestratorContext, analysis_id: AnalysisId, pending: PendingEvent) {
    let event = AuditEvent {
        id: AuditEventId::new(),
        analysis_id,
        event_type: pending.event_type,
        event_timestamp: pending.timestamp,
        model_version: pending.model_version,
        prompt_version: pending.prompt_version,
        rule_id: None,
        confidence_score: pending.confidence_score,
        details: pending.details,
    };
    if let Err(err) = ctx.audit_store.append(&event).await {
        ctx.diagnostics.warn(&format!("audit append failed for {:?}: {err}", event.event_type));
    }
}

/// The typed result of step 5 (plus step 6 for thermography), carrying
/// enough to derive the `Analysis` row and dispatch to the matching
/// validator without the caller needing to match on test type twice.
enum ExtractionOutcome {
    Grounding(GroundingExtraction, ExtractionMetadata),
    Megger(MeggerExtraction, ExtractionMetadata),
    Thermography(
        ThermographyExtraction,
        ExtractionMetadata,
        Option<CertificateOcrExtraction>,
        Option<HygrometerOcrExtraction>,
    ),
}

impl ExtractionOutcome {
    fn metadata(&self) -> &ExtractionMetadata {
        match self {
            Self::Grounding(_, m) | Self::Megger(_, m) | Self::Thermography(_, m, _, _) => m,
        }
    }

    fn leaf_source(&self) -> &dyn LeafConfidences {
        match self {
            Self::Grounding(e, _) => e,
            Self::Megger(e, _) => e,
            Self::Thermography(e, _, _, _) => e,
        }
    }

    fn overall_confidence(&self) -> f64 {
        circuitgate_core::overall_confidence(&self.leaf_source().all_confidences())
    }

    fn needs_review(&self) -> bool {
        circuitgate_core::needs_review(&self.leaf_source().tagged_confidences())
    }

    fn equipment_tag(&self) -> String {
        match self {
            Self::Grounding(e, _) => e.equipment.tag.value.clone(),
            Self::Megger(e, _) => e.equipment.tag.value.clone(),
            Self::Thermography(e, _, _, _) => e.equipment.tag.value.clone(),
        }
    }

    fn equipment_type(&self) -> EquipmentType {
        let text = match self {
            Self::Grounding(e, _) => &e.equipment.equipment_type,
            Self::Megger(e, _) => &e.equipment.equipment_type,
            Self::Thermography(e, _, _, _) => &e.equipment.equipment_type,
        };
        equipment::resolve(text.as_ref().map(|f| f.value.as_str()))
    }

    fn extraction_payload(&self) -> serde_json::Value {
        match self {
            Self::Grounding(e, _) => serde_json::to_value(e),
            Self::Megger(e, _) => serde_json::to_value(e),
            Self::Thermography(e, _, cert, hygro) => serde_json::to_value(serde_json::json!({
                "extraction": e,
                "certificate_ocr": cert,
                "hygrometer_ocr": hygro,
            })),
        }
        .unwrap_or(serde_json::Value::Null)
    }

    fn validate(&self, profile: &StandardProfile) -> ValidationResult {
        match self {
            Self::Grounding(e, _) => {
                let equipment_type = equipment::resolve(e.equipment.equipment_type.as_ref().map(|f| f.value.as_str()));
                validate_grounding(e, equipment_type, profile)
            }
            Self::Megger(e, _) => validate_megger(e, profile),
            Self::Thermography(e, _, cert, hygro) => {
                let equipment_type = equipment::resolve(e.equipment.equipment_type.as_ref().map(|f| f.value.as_str()));
                let expected_phases = profile.expected_phases(equipment_type);
                let inputs = ComplementaryInputs {
                    certificate_ocr: cert.as_ref(),
                    hygrometer_ocr: hygro.as_ref(),
                    expected_phases,
                };
                validate_thermography(e, profile, inputs)
            }
        }
    }
}

/// Dispatches step 5 to the extractor matching `test_type`, routing
/// thermography through [`extract_thermography`] for its extra OCR
/// passes.
async fn extract(
    ctx: &OrchestratorContext,
    test_type: TestType,
    text_blocks: &[String],
    image_blocks: &[ContentBlock],
) -> Result<ExtractionOutcome, OrchestratorError> {
    match test_type {
        TestType::Grounding => {
            let extractor = GroundingExtractor::new(ctx.extraction_client.clone());
            let (extraction, metadata) = extractor.extract(text_blocks, image_blocks).await?;
            Ok(ExtractionOutcome::Grounding(extraction, metadata))
        }
        TestType::Megger => {
            let extractor = MeggerExtractor::new(ctx.extraction_client.clone());
            let (extraction, metadata) = extractor.extract(text_blocks, image_blocks).await?;
            Ok(ExtractionOutcome::Megger(extraction, metadata))
        }
        TestType::Thermography => extract_thermography(ctx, text_blocks, image_blocks).await,
    }
}

/// Splits `image_blocks` into a hotspot-photo slice and, when more than
/// one image is present, reserves the trailing two as candidate
/// calibration-certificate and thermo-hygrometer images respectively —
/// the convention documented in `DESIGN.md`. With the current decode
/// model (at most one image per ingested artifact) this reservation is
/// never triggered; it exists so the OCR wiring below is correct should a
/// future decode step ever produce more than one image per task.
fn split_thermography_inputs(image_blocks: &[ContentBlock]) -> (&[ContentBlock], Option<&ContentBlock>, Option<&ContentBlock>) {
    if image_blocks.len() < 2 {
        return (image_blocks, None, None);
    }
    let split = image_blocks.len() - 2;
    (&image_blocks[..split], image_blocks.get(split), image_blocks.get(split + 1))
}

/// Runs the thermography extractor over batched hotspot images (step 5),
/// merging batch results, then the optional certificate/hygrometer OCR
/// passes (step 6) when `split_thermography_inputs` found images for
/// them.
async fn extract_thermography(
    ctx: &OrchestratorContext,
    text_blocks: &[String],
    image_blocks: &[ContentBlock],
) -> Result<ExtractionOutcome, OrchestratorError> {
    let (hotspot_images, certificate_image, hygrometer_image) = split_thermography_inputs(image_blocks);

    let extractor = ThermographyExtractor::new(ctx.extraction_client.clone());
    let batches = split_into_batches(hotspot_images);
    let mut batch_results = Vec::with_capacity(batches.len().max(1));
    let mut last_metadata: Option<ExtractionMetadata> = None;
    if batches.is_empty() {
        let (extraction, metadata) = extractor.extract_batch(text_blocks, &[]).await?;
        last_metadata = Some(metadata);
        batch_results.push(extraction);
    } else {
        for batch in batches {
            let (extraction, metadata) = extractor.extract_batch(text_blocks, batch).await?;
            last_metadata = Some(metadata);
            batch_results.push(extraction);
        }
    }
    let merged = merge_thermography_batches(batch_results).ok_or(OrchestratorError::EmptyThermographyBatch)?;
    let metadata = last_metadata.ok_or(OrchestratorError::EmptyThermographyBatch)?;

    let certificate_ocr = if let Some(image) = certificate_image {
        let (extraction, _) = CertificateOcrExtractor::new(ctx.extraction_client.clone()).extract(image).await?;
        Some(extraction)
    } else {
        None
    };
    let hygrometer_ocr = if let Some(image) = hygrometer_image {
        let (extraction, _) = HygrometerOcrExtractor::new(ctx.extraction_client.clone()).extract(image).await?;
        Some(extraction)
    } else {
        None
    };

    Ok(ExtractionOutcome::Thermography(merged, metadata, certificate_ocr, hygrometer_ocr))
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
    fn fewer_than_two_images_reserves_nothing() {
        let images = vec![image(0)];
        let (hotspot, cert, hygro) = split_thermography_inputs(&images);
        assert_eq!(hotspot.len(), 1);
        assert!(cert.is_none());
        assert!(hygro.is_none());
    }

    #[test]
    fn two_or_more_images_reserves_the_trailing_two() {
        let images: Vec<ContentBlock> = (0..5).map(image).collect();
        let (hotspot, cert, hygro) = split_thermography_inputs(&images);
        assert_eq!(hotspot.len(), 3);
        assert!(cert.is_some());
        assert!(hygro.is_some());
    }
}

// circuitgate-core/src/lib.rs
// ============================================================================
// Module: Circuitgate Core Library
// Description: Public API surface for the commissioning audit core.
// Purpose: Expose the data model, extraction schemas, standard profiles,
//          and backend-agnostic interfaces shared by every other crate.
// Dependencies: crate::{entities, extraction, identifiers, interfaces,
//               profile, report, error}
// ============================================================================

//! ## Overview
//! `circuitgate-core` has no knowledge of SQLite, S3, axum, or any LLM
//! provider. It is the vocabulary the rest of the workspace agrees on: the
//! persisted entities (§3), the extraction schemas (§4.3–4.4), the
//! standard profiles (§4.6), the trait interfaces the orchestrator drives,
//! and the shared error taxonomy (§7).

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod diagnostics;
pub mod entities;
pub mod error;
pub mod extraction;
pub mod identifiers;
pub mod interfaces;
pub mod profile;
pub mod report;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use diagnostics::Diagnostics;
pub use diagnostics::NoopDiagnostics;

pub use entities::AuditEvent;
pub use entities::AuditEventType;
pub use entities::Analysis;
pub use entities::EquipmentType;
pub use entities::Evidence;
pub use entities::Finding;
pub use entities::Severity;
pub use entities::Task;
pub use entities::TaskStatus;
pub use entities::TestType;
pub use entities::User;
pub use entities::Verdict;

pub use error::AppError;

pub use extraction::CertificateOcrExtraction;
pub use extraction::FieldConfidence;
pub use extraction::GroundingExtraction;
pub use extraction::HygrometerOcrExtraction;
pub use extraction::Hotspot;
pub use extraction::LeafConfidences;
pub use extraction::MeggerExtraction;
pub use extraction::ThermalSeverity;
pub use extraction::ThermographyExtraction;
pub use extraction::needs_review;
pub use extraction::overall_confidence;

pub use identifiers::AnalysisId;
pub use identifiers::AuditEventId;
pub use identifiers::FindingId;
pub use identifiers::IdParseError;
pub use identifiers::TaskId;
pub use identifiers::UserId;

pub use interfaces::AnalysisFilter;
pub use interfaces::AnalysisSortBy;
pub use interfaces::AnalysisStore;
pub use interfaces::AnalysisStoreError;
pub use interfaces::AuditStore;
pub use interfaces::AuditStoreError;
pub use interfaces::BrokerError;
pub use interfaces::ContentBlock;
pub use interfaces::EnqueueAck;
pub use interfaces::ExtractionClient;
pub use interfaces::ExtractionError;
pub use interfaces::ExtractionMetadata;
pub use interfaces::ExtractionRequest;
pub use interfaces::FindingStore;
pub use interfaces::FindingStoreError;
pub use interfaces::JobBroker;
pub use interfaces::MAX_ARTIFACT_BYTES;
pub use interfaces::ObjectStore;
pub use interfaces::ObjectStoreError;
pub use interfaces::Page;
pub use interfaces::ReportError;
pub use interfaces::ReportRenderer;
pub use interfaces::SortOrder;
pub use interfaces::TaskStore;
pub use interfaces::TaskStoreError;
pub use interfaces::UserStore;
pub use interfaces::UserStoreError;

pub use profile::ComplementaryThresholds;
pub use profile::Phase;
pub use profile::ProfileName;
pub use profile::StandardProfile;

pub use report::JsonReportRenderer;
pub use report::ReportBundle;
pub use report::ReportHeader;
pub use report::ReportSummary;

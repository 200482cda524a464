// circuitgate-validate/src/lib.rs
// ============================================================================
// Module: Circuitgate Validate
// Description: The deterministic validation engine (C7) and the finding/
//              verdict/score service (C8).
// Purpose: Turn a typed extraction result into categorized findings, a
//          compliance score, and a verdict — with no I/O, no randomness,
//          and no wall-clock reads anywhere in this crate.
// Dependencies: circuitgate-core
// ============================================================================

//! ## Overview
//! Every public function in this crate is pure: same input, same output,
//! forever (§4.6, §8 "validator idempotence"). The orchestrator is the
//! only caller that ever feeds this crate a wall-clock value, and it never
//! does — the "current date" for expiration checks is always the
//! extraction's own inspection or test date.

pub mod calibration;
pub mod complementary;
pub mod cross_field;
pub mod engine;
pub mod finding;
pub mod grounding;
pub mod megger;
pub mod thermography;
pub mod verdict;

pub use complementary::ComplementaryInputs;
pub use engine::ValidationResult;
pub use engine::validate_grounding;
pub use engine::validate_megger;
pub use engine::validate_thermography;
pub use finding::ValidationFinding;
pub use verdict::compute_score;
pub use verdict::compute_verdict;
pub use verdict::to_persisted;

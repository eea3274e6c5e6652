//! Turning the uploaded payload into plain text
//!
//! Decoding is cheap and done inline. Text extraction is CPU-bound, so it runs on tokio's
//! blocking pool to keep the request-handling threads free.
use crate::errors::ExtractError;
use base64::{
    Engine as _, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use tracing::{debug, instrument, warn};

/// Standard alphabet, trailing `=` padding optional.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decodes the base64 `file` field into the raw document bytes.
///
/// ASCII whitespace is skipped so line-wrapped (MIME style) payloads are accepted.
pub fn decode_payload(file: &str) -> Result<Vec<u8>, ExtractError> {
    let bytes = if file.bytes().any(|b| b.is_ascii_whitespace()) {
        let compact: String = file.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        PAYLOAD_ENGINE.decode(compact)?
    } else {
        PAYLOAD_ENGINE.decode(file)?
    };
    debug!("Decoded payload into {} bytes", bytes.len());
    Ok(bytes)
}

/// Extracts the text of every page, concatenated in document order.
///
/// Anything the parser rejects, including a panic inside it, is reported as
/// [`ExtractError::Parse`].
#[instrument(skip(bytes), fields(len = bytes.len()))]
pub async fn extract_text(bytes: Vec<u8>) -> Result<String, ExtractError> {
    let text = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem(&bytes).map_err(|e| e.to_string())
    })
    .await
    .map_err(|e| {
        if e.is_panic() {
            ExtractError::Parse("PDF parser panicked".to_string())
        } else {
            ExtractError::Parse(e.to_string())
        }
    })?
    .map_err(ExtractError::Parse)?;

    if text.trim().is_empty() {
        warn!("PDF contains no extractable text");
    }
    debug!("Extracted {} characters of text", text.len());
    Ok(text)
}

use crate::{
    error::{Result, SketchError},
    models::{GenerateForm, GenerationRequest},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};

pub const SKETCH_DATA_URI_PREFIX: &str = "data:image/png;base64,";
pub const MAX_PROMPT_CHARS: usize = 1000;
pub const MAX_SKETCH_BYTES: usize = 5_242_880;

/// Validates raw form fields into a [`GenerationRequest`].
///
/// Checks run in a fixed order (prompt presence, emptiness, length, then
/// sketch presence, prefix, encoding, size) so a given input always yields
/// the same classification. Prompt length is counted in characters, not bytes.
pub fn validate(form: &GenerateForm) -> Result<GenerationRequest> {
    let prompt = form
        .prompt
        .as_deref()
        .ok_or(SketchError::MissingField("prompt"))?
        .trim();

    if prompt.is_empty() {
        return Err(SketchError::EmptyPrompt);
    }

    let length = prompt.chars().count();
    if length > MAX_PROMPT_CHARS {
        return Err(SketchError::PromptTooLong {
            length,
            max: MAX_PROMPT_CHARS,
        });
    }

    let sketch = form
        .sketch
        .as_deref()
        .ok_or(SketchError::MissingField("sketch"))?;

    let encoded = sketch
        .strip_prefix(SKETCH_DATA_URI_PREFIX)
        .ok_or(SketchError::InvalidImageFormat)?;

    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| SketchError::MalformedBase64(e.to_string()))?;

    if bytes.len() > MAX_SKETCH_BYTES {
        return Err(SketchError::ImageTooLarge {
            size: bytes.len(),
            max: MAX_SKETCH_BYTES,
        });
    }

    Ok(GenerationRequest {
        prompt: prompt.to_string(),
        sketch: bytes,
    })
}

/// Encodes raw PNG bytes as a sketch data URI.
pub fn to_data_uri(png: &[u8]) -> String {
    format!("{}{}", SKETCH_DATA_URI_PREFIX, STANDARD.encode(png))
}

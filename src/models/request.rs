use serde::{Deserialize, Serialize};

/// Raw form fields as they arrive from the caller. Both are optional so
/// that absence is reported as a validation error rather than a decode error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateForm {
    pub prompt: Option<String>,
    pub sketch: Option<String>,
}

impl GenerateForm {
    pub fn new(prompt: impl Into<String>, sketch: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            sketch: Some(sketch.into()),
        }
    }
}

/// A validated generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub sketch: Vec<u8>,
}

impl GenerationRequest {
    pub fn sketch_size(&self) -> usize {
        self.sketch.len()
    }
}

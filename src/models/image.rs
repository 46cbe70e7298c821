pub const GENERATED_CONTENT_TYPE: &str = "image/jpeg";
pub const GENERATED_FILENAME: &str = "generated_image.jpg";

/// Final artifact of a successful generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    pub data: Vec<u8>,
    pub content_type: &'static str,
    pub filename: &'static str,
}

impl GeneratedImage {
    pub fn jpeg(data: Vec<u8>) -> Self {
        Self {
            data,
            content_type: GENERATED_CONTENT_TYPE,
            filename: GENERATED_FILENAME,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `statusCode` value the provider uses for success.
pub const ENVELOPE_SUCCESS: i64 = 2000;

/// Uniform response wrapper used by every LightX metadata endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(rename = "statusCode")]
    pub status_code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub body: Value,
}

impl Envelope {
    pub fn is_success(&self) -> bool {
        self.status_code == Some(ENVELOPE_SUCCESS)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadImageUrlRequest {
    #[serde(rename = "uploadType")]
    pub upload_type: &'static str,
    pub size: usize,
    #[serde(rename = "contentType")]
    pub content_type: &'static str,
}

impl UploadImageUrlRequest {
    pub fn png(size: usize) -> Self {
        Self {
            upload_type: "imageUrl",
            size,
            content_type: "image/png",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadImageUrlBody {
    #[serde(rename = "uploadImage")]
    pub upload_image: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}

/// Write-once destination for the sketch plus the URL it is readable at.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadSlot {
    pub upload_target_url: String,
    pub public_image_url: String,
    /// Byte length declared when the slot was requested.
    pub declared_size: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Sketch2ImageRequest {
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    pub strength: f32,
    #[serde(rename = "textPrompt")]
    pub text_prompt: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sketch2ImageBody {
    #[serde(rename = "orderId")]
    pub order_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderStatusRequest {
    #[serde(rename = "orderId")]
    pub order_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderStatusBody {
    pub status: String,
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Active,
    Failed,
}

impl JobStatus {
    /// Anything other than `active` or `failed` is still in progress.
    pub fn from_provider(status: &str) -> Self {
        match status {
            "active" => JobStatus::Active,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Active | JobStatus::Failed)
    }
}

/// One observation of an order, as returned by the status endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderStatus {
    pub status: JobStatus,
    /// Status string exactly as the provider sent it.
    pub raw_status: String,
    pub output_url: Option<String>,
    /// Full envelope, kept for diagnostics.
    pub raw: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationJob {
    pub order_id: String,
    pub status: JobStatus,
}

impl GenerationJob {
    pub fn new(order_id: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
            status: JobStatus::Pending,
        }
    }

    /// Records an observation. Terminal states never change once reached.
    pub fn advance(&mut self, observed: JobStatus) -> JobStatus {
        if !self.status.is_terminal() {
            self.status = observed;
        }
        self.status
    }
}

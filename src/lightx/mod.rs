pub mod client;
pub mod retry;

use crate::{
    error::ProviderFailure,
    models::{OrderStatus, UploadSlot},
};
use async_trait::async_trait;

pub use client::LightXClient;
pub use retry::{Backoff, RetryPolicy};

pub type ProviderResult<T> = std::result::Result<T, ProviderFailure>;

/// The external image-generation workflow, one method per outbound call.
///
/// Implementations report failures as a [`ProviderFailure`]; the
/// orchestrator decides which step the failure belongs to.
#[async_trait]
pub trait SketchProvider: Send + Sync {
    /// Requests a write-once upload slot for `size` bytes of PNG.
    async fn request_upload_slot(&self, size: usize) -> ProviderResult<UploadSlot>;

    /// Writes the sketch bytes to the slot's upload target.
    async fn upload_sketch(&self, slot: &UploadSlot, sketch: &[u8]) -> ProviderResult<()>;

    /// Submits a sketch-to-image job and returns its order id.
    async fn submit_job(
        &self,
        image_url: &str,
        prompt: &str,
        strength: f32,
    ) -> ProviderResult<String>;

    async fn order_status(&self, order_id: &str) -> ProviderResult<OrderStatus>;

    async fn download(&self, output_url: &str) -> ProviderResult<Vec<u8>>;
}

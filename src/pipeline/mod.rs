pub mod poll;

use crate::{
    error::{ProviderFailure, Result, SketchError},
    lightx::SketchProvider,
    models::{
        GenerateForm, GeneratedImage, GenerationJob, GenerationRequest, JobStatus, UploadSlot,
    },
    validation,
};
use std::fmt;
use std::sync::Arc;

pub use poll::PollPolicy;

/// Transformation strength sent with every sketch2image job.
pub const SKETCH_STRENGTH: f32 = 0.5;

/// Where a single generation currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    AcquiringSlot,
    Uploading,
    Submitting,
    Polling(u32),
    Succeeded,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Validating => write!(f, "validating"),
            Stage::AcquiringSlot => write!(f, "acquiring-slot"),
            Stage::Uploading => write!(f, "uploading"),
            Stage::Submitting => write!(f, "submitting"),
            Stage::Polling(n) => write!(f, "polling({})", n),
            Stage::Succeeded => write!(f, "succeeded"),
            Stage::Failed => write!(f, "failed"),
        }
    }
}

/// Drives validate → upload slot → upload → submit → poll → fetch against a
/// [`SketchProvider`]. Holds no per-request state; share it across requests.
pub struct Orchestrator<P> {
    provider: Arc<P>,
    poll: PollPolicy,
}

impl<P> Clone for Orchestrator<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            poll: self.poll.clone(),
        }
    }
}

impl<P: SketchProvider> Orchestrator<P> {
    pub fn new(provider: Arc<P>, poll: PollPolicy) -> Self {
        Self { provider, poll }
    }

    /// Validates the raw fields, then runs the provider workflow. Validation
    /// failures return before any provider call.
    pub async fn run(&self, form: &GenerateForm) -> Result<GeneratedImage> {
        log::debug!("🧭 stage: {}", Stage::Validating);
        let request = validation::validate(form).map_err(|e| {
            log::error!("❌ Validation failed: {}", e);
            e
        })?;
        log::debug!(
            "✅ Request validated: prompt {} chars, sketch {} bytes",
            request.prompt.chars().count(),
            request.sketch_size()
        );
        self.generate(&request).await
    }

    /// Runs the provider workflow for an already validated request.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
        let result = self.drive(request).await;
        match &result {
            Ok(image) => log::info!("🖼️  stage: {} ({} bytes)", Stage::Succeeded, image.len()),
            Err(e) => log::error!(
                "❌ stage: {} ({}, status {})",
                Stage::Failed,
                e,
                e.http_status()
            ),
        }
        result
    }

    async fn drive(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
        let slot = self.acquire_slot(request.sketch_size()).await?;
        self.upload(&slot, &request.sketch).await?;
        let mut job = self.submit(&slot, &request.prompt).await?;
        let output_url = self.poll_until_done(&mut job).await?;
        self.fetch(&output_url).await
    }

    async fn acquire_slot(&self, size: usize) -> Result<UploadSlot> {
        log::debug!("🧭 stage: {} for {} bytes", Stage::AcquiringSlot, size);
        let slot = self
            .provider
            .request_upload_slot(size)
            .await
            .map_err(SketchError::UploadSlot)?;
        log::debug!(
            "Upload URL: {}, Image URL: {}",
            slot.upload_target_url,
            slot.public_image_url
        );
        Ok(slot)
    }

    async fn upload(&self, slot: &UploadSlot, sketch: &[u8]) -> Result<()> {
        log::debug!("🧭 stage: {}", Stage::Uploading);
        if sketch.len() != slot.declared_size {
            return Err(SketchError::Internal(format!(
                "sketch is {} bytes but the upload slot was requested for {}",
                sketch.len(),
                slot.declared_size
            )));
        }
        self.provider
            .upload_sketch(slot, sketch)
            .await
            .map_err(SketchError::Upload)?;
        log::debug!("Sketch uploaded successfully");
        Ok(())
    }

    async fn submit(&self, slot: &UploadSlot, prompt: &str) -> Result<GenerationJob> {
        log::debug!("🧭 stage: {}", Stage::Submitting);
        let order_id = self
            .provider
            .submit_job(&slot.public_image_url, prompt, SKETCH_STRENGTH)
            .await
            .map_err(SketchError::Submission)?;
        log::info!("📨 Order ID received: {}", order_id);
        Ok(GenerationJob::new(order_id))
    }

    /// Polls until the job is active (returning its output URL), failed, or
    /// the attempt budget is spent.
    async fn poll_until_done(&self, job: &mut GenerationJob) -> Result<String> {
        let mut attempt = 1;
        loop {
            log::debug!(
                "🧭 stage: {} checking order status, attempt {}/{}",
                Stage::Polling(attempt),
                attempt,
                self.poll.max_attempts
            );
            let observed = self
                .provider
                .order_status(&job.order_id)
                .await
                .map_err(SketchError::StatusCheck)?;
            log::debug!("Order status: {}", observed.raw_status);

            match job.advance(observed.status) {
                JobStatus::Active => {
                    return observed.output_url.ok_or_else(|| {
                        SketchError::StatusCheck(ProviderFailure::envelope(observed.raw))
                    });
                }
                JobStatus::Failed => {
                    return Err(SketchError::GenerationFailed(Some(observed.raw)));
                }
                JobStatus::Pending => {}
            }

            match self.poll.delay_after(attempt) {
                Some(delay) => tokio::time::sleep(delay).await,
                None => {
                    log::error!(
                        "⏰ Order {} did not complete within {} attempts",
                        job.order_id,
                        self.poll.max_attempts
                    );
                    return Err(SketchError::Timeout {
                        attempts: self.poll.max_attempts,
                    });
                }
            }
            attempt += 1;
        }
    }

    async fn fetch(&self, output_url: &str) -> Result<GeneratedImage> {
        log::debug!("Output URL received: {}", output_url);
        let bytes = self
            .provider
            .download(output_url)
            .await
            .map_err(SketchError::Download)?;
        Ok(GeneratedImage::jpeg(bytes))
    }
}

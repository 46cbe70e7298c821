use crate::{
    config::{LightXConfig, Timeouts},
    error::{ProviderFailure, Result, SketchError},
    lightx::{retry::RetryPolicy, ProviderResult, SketchProvider},
    models::{
        Envelope, JobStatus, OrderStatus, OrderStatusBody, OrderStatusRequest, Sketch2ImageBody,
        Sketch2ImageRequest, UploadImageUrlBody, UploadImageUrlRequest, UploadSlot,
    },
};
use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

const UPLOAD_IMAGE_URL_PATH: &str = "/external/api/v2/uploadImageUrl";
const SKETCH2IMAGE_PATH: &str = "/external/api/v1/sketch2image";
const ORDER_STATUS_PATH: &str = "/external/api/v1/order-status";
const API_KEY_HEADER: &str = "x-api-key";

/// LightX REST client. Holds one connection-pooled `reqwest::Client`; clone
/// it freely, clones share the pool.
#[derive(Debug, Clone)]
pub struct LightXClient {
    http: Client,
    api_key: String,
    base_url: String,
    timeouts: Timeouts,
    retry: RetryPolicy,
}

impl LightXClient {
    pub fn new(config: &LightXConfig) -> Result<Self> {
        let http = Client::builder()
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .build()
            .map_err(|e| SketchError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_http_client(http, config))
    }

    /// Use a caller-supplied `reqwest::Client`.
    pub fn with_http_client(http: Client, config: &LightXConfig) -> Self {
        Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeouts: config.timeouts.clone(),
            retry: config.retry.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header(API_KEY_HEADER, &self.api_key)
            .header(header::CONTENT_TYPE, "application/json")
    }

    async fn send(&self, builder: RequestBuilder) -> ProviderResult<Response> {
        let request = builder.build()?;
        Ok(self.retry.execute(&self.http, request).await?)
    }
}

/// Rejects non-success HTTP statuses, keeping the provider's code and body.
async fn ensure_success(response: Response) -> ProviderResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderFailure::http(status.as_u16(), body))
}

/// Unwraps a LightX envelope into its typed body. Returns the raw JSON as well
/// so callers can keep it for diagnostics.
async fn read_envelope<T: DeserializeOwned>(response: Response) -> ProviderResult<(T, Value)> {
    let response = ensure_success(response).await?;
    let raw: Value = response.json().await?;

    let envelope: Envelope = serde_json::from_value(raw.clone())
        .map_err(|e| ProviderFailure::malformed(format!("Unexpected response shape: {}", e)))?;

    if !envelope.is_success() {
        return Err(ProviderFailure::envelope(raw));
    }

    let body = serde_json::from_value(envelope.body)
        .map_err(|e| ProviderFailure::malformed(format!("Unexpected response body: {}", e)))?;
    Ok((body, raw))
}

#[async_trait]
impl SketchProvider for LightXClient {
    async fn request_upload_slot(&self, size: usize) -> ProviderResult<UploadSlot> {
        let builder = self
            .authorized(self.http.post(self.endpoint(UPLOAD_IMAGE_URL_PATH)))
            .timeout(self.timeouts.metadata)
            .json(&UploadImageUrlRequest::png(size));

        let (body, _): (UploadImageUrlBody, _) = read_envelope(self.send(builder).await?).await?;

        Ok(UploadSlot {
            upload_target_url: body.upload_image,
            public_image_url: body.image_url,
            declared_size: size,
        })
    }

    async fn upload_sketch(&self, slot: &UploadSlot, sketch: &[u8]) -> ProviderResult<()> {
        // Pre-signed target: no API key.
        let builder = self
            .http
            .put(&slot.upload_target_url)
            .header(header::CONTENT_TYPE, "image/png")
            .timeout(self.timeouts.upload)
            .body(sketch.to_vec());

        ensure_success(self.send(builder).await?).await?;
        Ok(())
    }

    async fn submit_job(
        &self,
        image_url: &str,
        prompt: &str,
        strength: f32,
    ) -> ProviderResult<String> {
        let payload = Sketch2ImageRequest {
            image_url: image_url.to_string(),
            strength,
            text_prompt: prompt.to_string(),
        };
        let builder = self
            .authorized(self.http.post(self.endpoint(SKETCH2IMAGE_PATH)))
            .timeout(self.timeouts.submit)
            .json(&payload);

        let (body, _): (Sketch2ImageBody, _) = read_envelope(self.send(builder).await?).await?;
        Ok(body.order_id)
    }

    async fn order_status(&self, order_id: &str) -> ProviderResult<OrderStatus> {
        let builder = self
            .authorized(self.http.post(self.endpoint(ORDER_STATUS_PATH)))
            .timeout(self.timeouts.metadata)
            .json(&OrderStatusRequest {
                order_id: order_id.to_string(),
            });

        let (body, raw): (OrderStatusBody, _) = read_envelope(self.send(builder).await?).await?;

        Ok(OrderStatus {
            status: JobStatus::from_provider(&body.status),
            raw_status: body.status,
            output_url: body.output,
            raw,
        })
    }

    async fn download(&self, output_url: &str) -> ProviderResult<Vec<u8>> {
        let builder = self.http.get(output_url).timeout(self.timeouts.download);
        let response = ensure_success(self.send(builder).await?).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

#![allow(dead_code)]

use async_trait::async_trait;
use rsketch::{
    lightx::ProviderResult, validation::to_data_uri, GenerateForm, JobStatus, OrderStatus,
    ProviderFailure, SketchProvider, UploadSlot,
};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;

pub const PUBLIC_IMAGE_URL: &str = "https://cdn.example.com/sketches/slot-1.png";
pub const OUTPUT_URL: &str = "https://cdn.example.com/outputs/abc123.jpg";
pub const ORDER_ID: &str = "abc123";

/// Scripted provider that records every call it receives.
pub struct MockProvider {
    slot: ProviderResult<()>,
    upload: ProviderResult<()>,
    submit: ProviderResult<String>,
    statuses: Mutex<VecDeque<ProviderResult<OrderStatus>>>,
    download: ProviderResult<Vec<u8>>,
    calls: Mutex<Vec<&'static str>>,
    uploaded: Mutex<Vec<u8>>,
    submitted: Mutex<Option<(String, String, f32)>>,
}

impl MockProvider {
    /// Every step succeeds; the first poll reports `active`.
    pub fn happy(output: Vec<u8>) -> Self {
        Self {
            slot: Ok(()),
            upload: Ok(()),
            submit: Ok(ORDER_ID.to_string()),
            statuses: Mutex::new(VecDeque::from(vec![Ok(active())])),
            download: Ok(output),
            calls: Mutex::new(Vec::new()),
            uploaded: Mutex::new(Vec::new()),
            submitted: Mutex::new(None),
        }
    }

    pub fn with_slot_failure(mut self, failure: ProviderFailure) -> Self {
        self.slot = Err(failure);
        self
    }

    pub fn with_upload_failure(mut self, failure: ProviderFailure) -> Self {
        self.upload = Err(failure);
        self
    }

    pub fn with_submit_failure(mut self, failure: ProviderFailure) -> Self {
        self.submit = Err(failure);
        self
    }

    pub fn with_download_failure(mut self, failure: ProviderFailure) -> Self {
        self.download = Err(failure);
        self
    }

    pub fn with_statuses(self, statuses: Vec<ProviderResult<OrderStatus>>) -> Self {
        *self.statuses.lock().unwrap() = VecDeque::from(statuses);
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls().iter().filter(|c| **c == name).count()
    }

    pub fn uploaded(&self) -> Vec<u8> {
        self.uploaded.lock().unwrap().clone()
    }

    pub fn submitted(&self) -> Option<(String, String, f32)> {
        self.submitted.lock().unwrap().clone()
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }
}

#[async_trait]
impl SketchProvider for MockProvider {
    async fn request_upload_slot(&self, size: usize) -> ProviderResult<UploadSlot> {
        self.record("request_upload_slot");
        self.slot.clone()?;
        Ok(UploadSlot {
            upload_target_url: "https://upload.example.com/slot-1?signature=xyz".to_string(),
            public_image_url: PUBLIC_IMAGE_URL.to_string(),
            declared_size: size,
        })
    }

    async fn upload_sketch(&self, _slot: &UploadSlot, sketch: &[u8]) -> ProviderResult<()> {
        self.record("upload_sketch");
        *self.uploaded.lock().unwrap() = sketch.to_vec();
        self.upload.clone()
    }

    async fn submit_job(
        &self,
        image_url: &str,
        prompt: &str,
        strength: f32,
    ) -> ProviderResult<String> {
        self.record("submit_job");
        *self.submitted.lock().unwrap() =
            Some((image_url.to_string(), prompt.to_string(), strength));
        self.submit.clone()
    }

    async fn order_status(&self, _order_id: &str) -> ProviderResult<OrderStatus> {
        self.record("order_status");
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(status("init")))
    }

    async fn download(&self, _output_url: &str) -> ProviderResult<Vec<u8>> {
        self.record("download");
        self.download.clone()
    }
}

pub fn status(raw: &str) -> OrderStatus {
    OrderStatus {
        status: JobStatus::from_provider(raw),
        raw_status: raw.to_string(),
        output_url: None,
        raw: json!({"statusCode": 2000, "body": {"orderId": ORDER_ID, "status": raw}}),
    }
}

pub fn active() -> OrderStatus {
    OrderStatus {
        output_url: Some(OUTPUT_URL.to_string()),
        ..status("active")
    }
}

pub fn png_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
    bytes.extend((0..len.saturating_sub(8)).map(|i| (i % 251) as u8));
    bytes.truncate(len);
    bytes
}

pub fn form(prompt: &str, png_len: usize) -> GenerateForm {
    GenerateForm::new(prompt, to_data_uri(&png_bytes(png_len)))
}

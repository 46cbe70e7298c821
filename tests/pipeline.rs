mod common;

use common::*;
use rsketch::{
    validation::MAX_SKETCH_BYTES, ErrorKind, GenerateForm, Orchestrator, PollPolicy,
    ProviderFailure, SketchError,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn orchestrator(provider: MockProvider) -> (Orchestrator<MockProvider>, Arc<MockProvider>) {
    let provider = Arc::new(provider);
    (
        Orchestrator::new(Arc::clone(&provider), PollPolicy::default()),
        provider,
    )
}

#[tokio::test]
async fn end_to_end_returns_fetched_bytes() {
    let jpeg = vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3, 4, 0xFF, 0xD9];
    let (orchestrator, provider) = orchestrator(MockProvider::happy(jpeg.clone()));

    let image = orchestrator
        .run(&form("a red bicycle", 10 * 1024))
        .await
        .unwrap();

    assert_eq!(image.data, jpeg);
    assert_eq!(image.content_type, "image/jpeg");
    assert_eq!(image.filename, "generated_image.jpg");
    assert_eq!(
        provider.calls(),
        vec![
            "request_upload_slot",
            "upload_sketch",
            "submit_job",
            "order_status",
            "download"
        ]
    );
    assert_eq!(provider.uploaded(), png_bytes(10 * 1024));

    let (image_url, prompt, strength) = provider.submitted().unwrap();
    assert_eq!(image_url, PUBLIC_IMAGE_URL);
    assert_eq!(prompt, "a red bicycle");
    assert_eq!(strength, 0.5);
}

#[tokio::test]
async fn validation_failures_make_no_provider_calls() {
    let cases = vec![
        (form("   ", 64), ErrorKind::Validation),
        (form(&"x".repeat(1001), 64), ErrorKind::Validation),
        (form("cat", MAX_SKETCH_BYTES + 1), ErrorKind::Validation),
        (
            GenerateForm::new("cat", "data:image/jpeg;base64,AAAA"),
            ErrorKind::Validation,
        ),
        (GenerateForm::default(), ErrorKind::Validation),
    ];

    for (input, kind) in cases {
        let (orchestrator, provider) = orchestrator(MockProvider::happy(vec![1]));
        let err = orchestrator.run(&input).await.unwrap_err();
        assert_eq!(err.kind(), kind);
        assert_eq!(err.http_status(), 400);
        assert!(provider.calls().is_empty(), "unexpected calls for {}", err);
    }
}

#[tokio::test]
async fn oversized_sketch_is_rejected_as_too_large() {
    let (orchestrator, provider) = orchestrator(MockProvider::happy(vec![1]));
    let err = orchestrator
        .run(&form("cat", MAX_SKETCH_BYTES + 1))
        .await
        .unwrap_err();
    assert!(matches!(err, SketchError::ImageTooLarge { .. }));
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn failed_slot_envelope_halts_pipeline() {
    let envelope = json!({"statusCode": 5040, "message": "API_KEY_INVALID", "body": null});
    let (orchestrator, provider) = orchestrator(
        MockProvider::happy(vec![1]).with_slot_failure(ProviderFailure::envelope(envelope.clone())),
    );

    let err = orchestrator.run(&form("cat", 128)).await.unwrap_err();

    assert!(matches!(err, SketchError::UploadSlot(_)));
    assert_eq!(err.to_string(), "Upload URL request failed");
    assert_eq!(err.http_status(), 500);
    assert_eq!(err.details(), Some(&envelope));
    assert_eq!(provider.calls(), vec!["request_upload_slot"]);
}

#[tokio::test]
async fn upload_failure_forwards_provider_status() {
    let (orchestrator, provider) = orchestrator(
        MockProvider::happy(vec![1])
            .with_upload_failure(ProviderFailure::http(403, "<Error>AccessDenied</Error>")),
    );

    let err = orchestrator.run(&form("cat", 128)).await.unwrap_err();

    assert!(matches!(err, SketchError::Upload(_)));
    assert_eq!(err.http_status(), 403);
    assert_eq!(provider.call_count("submit_job"), 0);
    assert_eq!(provider.call_count("order_status"), 0);
}

#[tokio::test]
async fn submission_failure_skips_polling() {
    let (orchestrator, provider) = orchestrator(
        MockProvider::happy(vec![1]).with_submit_failure(ProviderFailure::http(429, "slow down")),
    );

    let err = orchestrator.run(&form("cat", 128)).await.unwrap_err();

    assert!(matches!(err, SketchError::Submission(_)));
    assert_eq!(err.http_status(), 429);
    assert_eq!(provider.call_count("order_status"), 0);
}

#[tokio::test(start_paused = true)]
async fn pending_four_times_then_active() {
    let jpeg = vec![0xFF, 0xD8, 0xFF, 0xD9];
    let provider = MockProvider::happy(jpeg.clone()).with_statuses(vec![
        Ok(status("pending")),
        Ok(status("pending")),
        Ok(status("pending")),
        Ok(status("pending")),
        Ok(active()),
    ]);
    let (orchestrator, provider) = orchestrator(provider);

    let start = Instant::now();
    let image = orchestrator.run(&form("cat", 128)).await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(image.data, jpeg);
    assert_eq!(provider.call_count("order_status"), 5);
    assert_eq!(provider.call_count("download"), 1);
    // Four 3 s delays between five attempts.
    assert!(elapsed >= Duration::from_secs(12), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(15), "elapsed {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn all_pending_times_out_without_fetch() {
    let provider = MockProvider::happy(vec![1]).with_statuses(vec![
        Ok(status("pending")),
        Ok(status("pending")),
        Ok(status("pending")),
        Ok(status("pending")),
        Ok(status("pending")),
    ]);
    let (orchestrator, provider) = orchestrator(provider);

    let start = Instant::now();
    let err = orchestrator.run(&form("cat", 128)).await.unwrap_err();
    let elapsed = start.elapsed();

    assert!(matches!(err, SketchError::Timeout { attempts: 5 }));
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(err.http_status(), 504);
    assert_eq!(provider.call_count("order_status"), 5);
    assert_eq!(provider.call_count("download"), 0);
    // No wait after the final attempt.
    assert!(elapsed < Duration::from_secs(15), "elapsed {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn failed_status_stops_polling_immediately() {
    let provider = MockProvider::happy(vec![1]).with_statuses(vec![
        Ok(status("init")),
        Ok(status("failed")),
        Ok(active()),
    ]);
    let (orchestrator, provider) = orchestrator(provider);

    let err = orchestrator.run(&form("cat", 128)).await.unwrap_err();

    assert!(matches!(err, SketchError::GenerationFailed(Some(_))));
    assert_eq!(err.details().unwrap()["body"]["status"], "failed");
    assert_eq!(provider.call_count("order_status"), 2);
    assert_eq!(provider.call_count("download"), 0);
}

#[tokio::test(start_paused = true)]
async fn unrecognized_status_keeps_waiting() {
    let provider = MockProvider::happy(vec![7]).with_statuses(vec![
        Ok(status("rendering-in-progress")),
        Ok(active()),
    ]);
    let (orchestrator, provider) = orchestrator(provider);

    let image = orchestrator.run(&form("cat", 128)).await.unwrap();

    assert_eq!(image.data, vec![7]);
    assert_eq!(provider.call_count("order_status"), 2);
}

#[tokio::test]
async fn status_transport_failure_is_status_check_error() {
    let provider = MockProvider::happy(vec![1])
        .with_statuses(vec![Err(ProviderFailure::transport("operation timed out"))]);
    let (orchestrator, provider) = orchestrator(provider);

    let err = orchestrator.run(&form("cat", 128)).await.unwrap_err();

    assert!(matches!(err, SketchError::StatusCheck(_)));
    assert_eq!(err.http_status(), 500);
    assert_eq!(provider.call_count("order_status"), 1);
    assert_eq!(provider.call_count("download"), 0);
}

#[tokio::test]
async fn active_without_output_url_is_status_check_error() {
    let provider = MockProvider::happy(vec![1]).with_statuses(vec![Ok(status("active"))]);
    let (orchestrator, provider) = orchestrator(provider);

    let err = orchestrator.run(&form("cat", 128)).await.unwrap_err();

    assert!(matches!(err, SketchError::StatusCheck(_)));
    assert_eq!(provider.call_count("download"), 0);
}

#[tokio::test]
async fn download_failure_is_reported() {
    let (orchestrator, _provider) = orchestrator(
        MockProvider::happy(vec![1]).with_download_failure(ProviderFailure::http(404, "NoSuchKey")),
    );

    let err = orchestrator.run(&form("cat", 128)).await.unwrap_err();

    assert!(matches!(err, SketchError::Download(_)));
    assert_eq!(err.http_status(), 404);
    assert_eq!(err.details(), Some(&json!("NoSuchKey")));
}

#[tokio::test(start_paused = true)]
async fn custom_poll_budget_is_honored() {
    let provider = Arc::new(MockProvider::happy(vec![1]).with_statuses(vec![]));
    let orchestrator =
        Orchestrator::new(Arc::clone(&provider), PollPolicy::new(2, Duration::from_secs(1)));

    let err = orchestrator.run(&form("cat", 128)).await.unwrap_err();

    assert!(matches!(err, SketchError::Timeout { attempts: 2 }));
    assert_eq!(provider.call_count("order_status"), 2);
}

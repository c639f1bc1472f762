use std::time::Duration;

use conforma_network::{CapturedRequest, NetworkInterceptor, ResourceType};
use futures::channel::mpsc;
use futures::{stream, StreamExt};

#[tokio::test]
async fn records_events_emitted_before_the_operation_resolves() {
    let mut events = stream::iter(vec![
        CapturedRequest::new("https://site.com/", ResourceType::Document),
        CapturedRequest::new("https://site.com/logo.webp", ResourceType::Image),
        CapturedRequest::new("https://cdn.example/app.js", ResourceType::Script)
            .with_initiator("https://site.com/"),
    ]);

    let mut interceptor = NetworkInterceptor::new();
    let output = interceptor
        .capture_while(
            &mut events,
            async { 7 },
            Duration::from_millis(10),
            Duration::from_secs(1),
        )
        .await;

    assert_eq!(output, 7);
    let urls: Vec<_> = interceptor.requests().iter().map(|r| r.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://site.com/",
            "https://site.com/logo.webp",
            "https://cdn.example/app.js"
        ]
    );
    assert_eq!(
        interceptor.requests()[2].initiator_url.as_deref(),
        Some("https://site.com/")
    );
}

#[tokio::test]
async fn empty_event_stream_yields_empty_log() {
    let mut events = stream::empty::<CapturedRequest>();
    let mut interceptor = NetworkInterceptor::new();

    let result: Result<(), &str> = interceptor
        .capture_while(
            &mut events,
            async { Err("navigation refused") },
            Duration::ZERO,
            Duration::ZERO,
        )
        .await;

    assert_eq!(result, Err("navigation refused"));
    assert!(interceptor.is_empty());
}

#[tokio::test]
async fn keeps_draining_after_the_operation_until_quiet() {
    let (tx, mut rx) = mpsc::unbounded();
    tx.unbounded_send(CapturedRequest::new("https://site.com/a.woff2", ResourceType::Font))
        .unwrap();

    let late = tx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let _ = late.unbounded_send(CapturedRequest::new(
            "https://site.com/lazy.svg",
            ResourceType::Image,
        ));
    });

    let mut interceptor = NetworkInterceptor::new();
    interceptor
        .capture_while(
            &mut rx,
            async {},
            Duration::from_millis(500),
            Duration::from_secs(5),
        )
        .await;
    drop(tx);

    assert_eq!(interceptor.len(), 2);
    assert_eq!(interceptor.into_requests()[1].url, "https://site.com/lazy.svg");
}

#[tokio::test]
async fn drain_is_capped_for_pages_that_never_go_quiet() {
    let mut events = stream::unfold(0u32, |n| async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let beacon = format!("https://site.com/beacon?n={n}");
        Some((CapturedRequest::new(beacon, ResourceType::Other), n + 1))
    })
    .boxed();

    let mut interceptor = NetworkInterceptor::new();
    let started = std::time::Instant::now();
    let finished = tokio::time::timeout(
        Duration::from_secs(5),
        interceptor.capture_while(
            &mut events,
            async {},
            Duration::from_millis(200),
            Duration::from_millis(300),
        ),
    )
    .await;

    assert!(finished.is_ok(), "capture never returned");
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(!interceptor.is_empty());
}

#[test]
fn captured_request_serializes_camel_case() {
    let request = CapturedRequest::new("https://site.com/x.png", ResourceType::Image)
        .with_initiator("https://site.com/");
    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["resourceType"], "image");
    assert_eq!(json["initiatorUrl"], "https://site.com/");
}

mod common;

use std::{future::poll_fn, pin::Pin, time::Duration};

use actix_web::{
    App,
    body::MessageBody,
    http::header,
    rt::time::sleep,
    test,
    web::{self, Bytes},
};
use common::{DeviceLog, FakeBackend, FakeDevice, FakeSource};
use inference_bench::bench::{
    BenchConfig, BenchmarkLoop, FrameFeed, FrameStream, Presentation, StreamContext,
    configure_routes,
};
use ml_core::AcceleratorBackend;

const SEGMENT_HEADER: &[u8] = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n";

fn count_segments(body: &[u8]) -> usize {
    body.windows(SEGMENT_HEADER.len())
        .filter(|window| *window == SEGMENT_HEADER)
        .count()
}

/// Pull exactly one chunk from a streaming response body.
async fn next_part<B: MessageBody + Unpin>(body: &mut B) -> Option<Bytes> {
    poll_fn(|cx| Pin::new(&mut *body).poll_next(cx))
        .await
        .and_then(Result::ok)
}

/// Give the producer thread time to run ahead if it were going to.
async fn settle() {
    sleep(Duration::from_millis(300)).await;
}

#[test]
fn frame_stream_emits_every_third_frame() {
    let overlay = BenchConfig::cpu(Presentation::Stream).overlay;
    for frames in [0usize, 1, 2, 3, 7, 9, 10] {
        let mut engine = FakeBackend::new();
        let runs = engine.runs.clone();
        let bench = BenchmarkLoop::new(
            &mut engine,
            FrameFeed::Live(FakeSource::with_frames(frames)),
            overlay,
        );
        let segments: Vec<_> = FrameStream::new(bench, 3, 85).collect();

        assert_eq!(segments.len(), frames / 3, "{frames} frames");
        assert_eq!(runs.get(), frames);
        for segment in &segments {
            assert!(segment.starts_with(SEGMENT_HEADER));
            assert!(segment.ends_with(b"\xFF\xD9\r\n"));
        }
    }
}

#[test]
fn frame_stream_stays_finished_after_stop() {
    let mut engine = FakeBackend::failing_on(2);
    let bench = BenchmarkLoop::new(
        &mut engine,
        FrameFeed::Live(FakeSource::with_frames(10)),
        BenchConfig::cpu(Presentation::Stream).overlay,
    );
    let mut stream = FrameStream::new(bench, 1, 85);
    assert!(stream.next().is_some());
    assert!(stream.next().is_none());
    assert!(stream.next().is_none());
    assert_eq!(stream.bench().stats().frame_count(), 1);
}

#[actix_web::test]
async fn index_serves_embedded_page() {
    let config = BenchConfig::cpu(Presentation::Stream);
    let context = StreamContext::new(FakeBackend::new(), FakeSource::with_frames(0), &config);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(context))
            .configure(configure_routes::<FakeBackend, FakeSource>),
    )
    .await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert!(resp.status().is_success());
    let body = test::read_body(resp).await;
    let html = std::str::from_utf8(&body).unwrap();
    assert!(html.contains("<title>Hailo Pi CPU Inference</title>"));
    assert!(html.contains(r#"<img src="/video_feed" width="640" height="480">"#));
}

#[actix_web::test]
async fn video_feed_streams_jpeg_parts() {
    let config = BenchConfig::cpu(Presentation::Stream);
    let engine = FakeBackend::new();
    let runs = engine.runs.clone();
    let context = StreamContext::new(engine, FakeSource::with_frames(10), &config);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(context))
            .configure(configure_routes::<FakeBackend, FakeSource>),
    )
    .await;

    let req = test::TestRequest::get().uri("/video_feed").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "multipart/x-mixed-replace; boundary=frame"
    );

    let body = test::read_body(resp).await;
    assert!(body.starts_with(SEGMENT_HEADER));
    assert_eq!(&body[SEGMENT_HEADER.len()..SEGMENT_HEADER.len() + 2], b"\xFF\xD8");
    assert_eq!(count_segments(&body), 3);
    assert_eq!(runs.get(), 10);
}

#[actix_web::test]
async fn accelerator_stream_deactivates_when_stream_ends() {
    let config = BenchConfig::accelerator(Presentation::Stream);
    let log = DeviceLog::default();
    let engine =
        AcceleratorBackend::new(FakeDevice::new(log.clone()), Duration::from_millis(1000)).unwrap();
    let context = StreamContext::new(engine, FakeSource::with_frames(6), &config);
    context.warm_up(config.warmup_runs).unwrap();
    assert_eq!(log.activations.get(), 1);
    assert_eq!(log.deactivations.get(), 1);
    assert_eq!(log.infers.get(), 5);

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(context))
            .configure(configure_routes::<AcceleratorBackend<FakeDevice>, FakeSource>),
    )
    .await;
    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/video_feed").to_request()).await;
    let body = test::read_body(resp).await;

    assert_eq!(count_segments(&body), 2);
    assert_eq!(log.infers.get(), 5 + 6);
    assert_eq!(log.activations.get(), 2);
    assert_eq!(log.deactivations.get(), 2);
}

#[actix_web::test]
async fn producer_runs_only_as_far_as_the_client_pulls() {
    let config = BenchConfig::cpu(Presentation::Stream);
    let engine = FakeBackend::new();
    let runs = engine.runs.clone();
    let context = StreamContext::new(engine, FakeSource::with_frames(usize::MAX), &config);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(context))
            .configure(configure_routes::<FakeBackend, FakeSource>),
    )
    .await;

    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/video_feed").to_request()).await;
    let mut body = resp.into_body();

    let first = next_part(&mut body).await.unwrap();
    assert!(first.starts_with(SEGMENT_HEADER));
    settle().await;
    assert_eq!(runs.get(), 3);

    let second = next_part(&mut body).await.unwrap();
    assert!(second.starts_with(SEGMENT_HEADER));
    settle().await;
    assert_eq!(runs.get(), 6);
}

#[actix_web::test]
async fn client_that_leaves_while_queued_costs_no_work() {
    let config = BenchConfig::accelerator(Presentation::Stream);
    let log = DeviceLog::default();
    let engine =
        AcceleratorBackend::new(FakeDevice::new(log.clone()), Duration::from_millis(1000)).unwrap();
    let source = FakeSource::with_frames(usize::MAX);
    let reads = source.reads.clone();
    let context = StreamContext::new(engine, source, &config);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(context))
            .configure(configure_routes::<AcceleratorBackend<FakeDevice>, FakeSource>),
    )
    .await;

    let first =
        test::call_service(&app, test::TestRequest::get().uri("/video_feed").to_request()).await;
    let mut first_body = first.into_body();
    assert!(next_part(&mut first_body).await.is_some());

    let queued =
        test::call_service(&app, test::TestRequest::get().uri("/video_feed").to_request()).await;
    assert!(queued.status().is_success());
    drop(queued);
    drop(first_body);
    settle().await;

    assert_eq!(log.activations.get(), 1);
    assert_eq!(log.deactivations.get(), 1);
    assert_eq!(log.infers.get(), 3);
    assert_eq!(reads.get(), 3);
}

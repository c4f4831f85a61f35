//! Actix Web server exposing the annotated benchmark loop as an MJPEG stream.
//!
//! The backend and camera live in a single [`StreamContext`] created at start
//! up. Each `/video_feed` request runs its own benchmark loop on a producer
//! thread that holds the context lock for the lifetime of the stream, so a
//! second client waits until the first one disconnects.
//!
//! The response body pulls segments one at a time: it hands the producer a
//! reply slot and the producer runs the loop only far enough to fill it.

use std::sync::{Mutex, MutexGuard, PoisonError};

use actix_web::{
    App, HttpResponse, HttpServer,
    http::header,
    web::{self, Bytes},
};
use anyhow::{Context, Result};
use async_stream::stream;
use ml_core::ScopedBackend;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};
use video_ingest::FrameSource;

use crate::bench::{
    config::{BenchConfig, OverlayStyle},
    driver::{BenchmarkLoop, FrameFeed, warm_up},
    encoding::STREAM_CONTENT_TYPE,
    stream::FrameStream,
    telemetry,
};

/// Inference engine and camera shared by every stream.
pub struct StreamResources<E, S> {
    pub engine: E,
    pub source: S,
}

/// Process-wide state handed to the HTTP handlers.
pub struct StreamContext<E, S> {
    resources: Mutex<StreamResources<E, S>>,
    overlay: OverlayStyle,
    stride: u64,
    quality: u8,
    index_html: &'static str,
}

impl<E: ScopedBackend, S: FrameSource> StreamContext<E, S> {
    pub fn new(engine: E, source: S, config: &BenchConfig) -> Self {
        Self {
            resources: Mutex::new(StreamResources { engine, source }),
            overlay: config.overlay,
            stride: config.stream_stride,
            quality: config.jpeg_quality,
            index_html: config.index_html(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StreamResources<E, S>> {
        self.resources.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Activate the engine once, run `runs` warmup calls, and deactivate.
    pub fn warm_up(&self, runs: usize) -> Result<()> {
        let mut resources = self.lock();
        let mut session = resources
            .engine
            .activate()
            .context("failed to activate backend for warmup")?;
        warm_up(&mut session, runs).context("warmup failed")
    }

    /// Run one client's stream, answering each pull with the next segment.
    ///
    /// Nothing is activated or read until the client's first pull arrives,
    /// so a client that left while waiting for the lock costs no work.
    fn produce(&self, mut pulls: mpsc::Receiver<SegmentSlot>) {
        let mut guard = self.lock();
        let Some(mut slot) = next_pull(&mut pulls) else {
            debug!("client left before its stream started");
            return;
        };

        let resources = &mut *guard;
        let session = match resources.engine.activate() {
            Ok(session) => session,
            Err(err) => {
                error!("failed to activate backend for stream: {err}");
                return;
            }
        };

        // Declared after `slot`, so the session deactivates before the last
        // pending slot is dropped and the response body ends.
        let bench = BenchmarkLoop::new(session, FrameFeed::Live(&mut resources.source), self.overlay);
        let mut frames = FrameStream::new(bench, self.stride, self.quality);
        for segment in frames.by_ref() {
            if slot.send(segment).is_err() {
                debug!("client disconnected");
                break;
            }
            match next_pull(&mut pulls) {
                Some(next) => slot = next,
                None => {
                    debug!("client disconnected");
                    break;
                }
            }
        }
        frames.log_summary();
    }
}

/// One pending client pull, filled with the next multipart segment.
type SegmentSlot = oneshot::Sender<Bytes>;

/// Wait for the client to ask for another segment. `None` once it is gone.
fn next_pull(pulls: &mut mpsc::Receiver<SegmentSlot>) -> Option<SegmentSlot> {
    pulls.blocking_recv().filter(|slot| !slot.is_closed())
}

/// Register `/` and `/video_feed`.
pub fn configure_routes<E, S>(cfg: &mut web::ServiceConfig)
where
    E: ScopedBackend + 'static,
    S: FrameSource + 'static,
{
    cfg.route("/", web::get().to(index_route::<E, S>))
        .route("/video_feed", web::get().to(video_feed::<E, S>));
}

/// Bind `0.0.0.0:port` and serve until the process is interrupted.
pub fn serve<E, S>(context: StreamContext<E, S>, port: u16) -> Result<()>
where
    E: ScopedBackend + 'static,
    S: FrameSource + 'static,
{
    let data = web::Data::new(context);
    info!("serving MJPEG stream on http://0.0.0.0:{port}/");
    actix_web::rt::System::new()
        .block_on(async move {
            HttpServer::new(move || {
                App::new()
                    .app_data(data.clone())
                    .configure(configure_routes::<E, S>)
            })
            .bind(("0.0.0.0", port))?
            .run()
            .await
        })
        .with_context(|| format!("HTTP server on port {port} failed"))
}

async fn index_route<E, S>(context: web::Data<StreamContext<E, S>>) -> HttpResponse
where
    E: ScopedBackend + 'static,
    S: FrameSource + 'static,
{
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(context.index_html)
}

async fn video_feed<E, S>(context: web::Data<StreamContext<E, S>>) -> HttpResponse
where
    E: ScopedBackend + 'static,
    S: FrameSource + 'static,
{
    let (pull_tx, pull_rx) = mpsc::channel::<SegmentSlot>(1);
    let producer = context.into_inner();
    if let Err(err) = telemetry::spawn_thread("stream-producer", move || producer.produce(pull_rx)) {
        error!("failed to spawn stream producer: {err}");
        return HttpResponse::InternalServerError().finish();
    }

    let body = stream! {
        loop {
            let (slot, segment) = oneshot::channel();
            if pull_tx.send(slot).await.is_err() {
                break;
            }
            match segment.await {
                Ok(segment) => yield Ok::<Bytes, actix_web::Error>(segment),
                Err(_) => break,
            }
        }
    };

    HttpResponse::Ok()
        .append_header((header::CACHE_CONTROL, "no-cache"))
        .append_header((header::CONTENT_TYPE, STREAM_CONTENT_TYPE))
        .streaming(body)
}

//! MJPEG video feed.
//!
//! Every viewer subscribes to the same broadcast of encoded frames. A viewer
//! that falls behind skips the frames it missed; it never slows the capture
//! loop down.

use std::convert::Infallible;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use futures_util::stream::{self, Stream};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::debug;

use gmc_pipeline::PipelineError;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

pub const MJPEG_CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=frame";

/// Wrap one JPEG as a multipart part.
pub fn mjpeg_part(jpeg: &[u8]) -> Bytes {
    const HEADER: &[u8] = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n";
    let mut part = Vec::with_capacity(HEADER.len() + jpeg.len() + 2);
    part.extend_from_slice(HEADER);
    part.extend_from_slice(jpeg);
    part.extend_from_slice(b"\r\n");
    Bytes::from(part)
}

/// Keeps the viewer gauge in step with live streams.
struct Viewer {
    rx: broadcast::Receiver<Bytes>,
}

impl Viewer {
    fn new(rx: broadcast::Receiver<Bytes>) -> Self {
        metrics::record_stream_connected();
        Self { rx }
    }
}

impl Drop for Viewer {
    fn drop(&mut self) {
        metrics::record_stream_disconnected();
        debug!("MJPEG viewer disconnected");
    }
}

/// Multipart stream over a frame subscription. Ends when the publisher goes away.
pub fn mjpeg_stream(
    rx: broadcast::Receiver<Bytes>,
) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
    stream::unfold(Viewer::new(rx), |mut viewer| async move {
        loop {
            match viewer.rx.recv().await {
                Ok(jpeg) => return Some((Ok(mjpeg_part(&jpeg)), viewer)),
                Err(RecvError::Lagged(skipped)) => {
                    metrics::record_stream_frames_skipped(skipped);
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}

/// `GET /video_feed`
pub async fn video_feed(State(state): State<AppState>) -> Response {
    let body = Body::from_stream(mjpeg_stream(state.subscribe_frames()));
    (
        [
            (header::CONTENT_TYPE, MJPEG_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache, no-store"),
        ],
        body,
    )
        .into_response()
}

/// `GET /snapshot.jpg`: the most recent annotated frame.
pub async fn snapshot(State(state): State<AppState>) -> ApiResult<Response> {
    match state.latest_frame() {
        Some(jpeg) => Ok(([(header::CONTENT_TYPE, "image/jpeg")], jpeg).into_response()),
        None => match state.status().error {
            Some(e) => Err(PipelineError::collaborator_unavailable(e).into()),
            None => Err(ApiError::unavailable("no frame captured yet")),
        },
    }
}

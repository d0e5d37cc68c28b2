//! Application state shared between the capture loop and HTTP handlers.
//!
//! The capture loop owns a [`StatusPublisher`]; handlers hold an
//! [`AppState`]. Status travels over a `watch` channel (latest value wins)
//! and encoded frames over a `broadcast` channel (slow viewers skip frames).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::body::Bytes;
use gmc_models::{FrameMetrics, StatusSnapshot};
use tokio::sync::{broadcast, watch};

use crate::config::ServerConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    status: watch::Receiver<StatusSnapshot>,
    frames: broadcast::Sender<Bytes>,
    latest_frame: watch::Receiver<Option<Bytes>>,
    frames_processed: Arc<AtomicU64>,
}

impl AppState {
    /// Create state and the publisher that feeds it.
    pub fn new(config: ServerConfig) -> (Self, StatusPublisher) {
        let (status_tx, status_rx) = watch::channel(StatusSnapshot::default());
        let (frames_tx, _) = broadcast::channel(config.stream_buffer.max(1));
        let (latest_tx, latest_rx) = watch::channel(None);
        let frames_processed = Arc::new(AtomicU64::new(0));

        let state = Self {
            config: Arc::new(config),
            status: status_rx,
            frames: frames_tx.clone(),
            latest_frame: latest_rx,
            frames_processed: Arc::clone(&frames_processed),
        };
        let publisher = StatusPublisher {
            status: status_tx,
            frames: frames_tx,
            latest_frame: latest_tx,
            frames_processed,
            error: None,
        };
        (state, publisher)
    }

    /// State with default config, for tests.
    pub fn for_testing() -> (Self, StatusPublisher) {
        Self::new(ServerConfig::default())
    }

    /// Latest status snapshot.
    pub fn status(&self) -> StatusSnapshot {
        self.status.borrow().clone()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed.load(Ordering::Relaxed)
    }

    /// Most recently encoded JPEG frame.
    pub fn latest_frame(&self) -> Option<Bytes> {
        self.latest_frame.borrow().clone()
    }

    /// Subscribe to encoded JPEG frames.
    pub fn subscribe_frames(&self) -> broadcast::Receiver<Bytes> {
        self.frames.subscribe()
    }
}

/// Write side of the shared state, owned by the capture loop.
pub struct StatusPublisher {
    status: watch::Sender<StatusSnapshot>,
    frames: broadcast::Sender<Bytes>,
    latest_frame: watch::Sender<Option<Bytes>>,
    frames_processed: Arc<AtomicU64>,
    error: Option<String>,
}

impl StatusPublisher {
    /// Record a collaborator failure. It stays attached to every later
    /// snapshot.
    pub fn fail(&mut self, error: impl Into<String>) {
        let error = error.into();
        self.status.send_modify(|s| s.error = Some(error.clone()));
        self.error = Some(error);
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Publish metrics for a processed frame.
    pub fn publish_metrics(&self, metrics: &FrameMetrics) {
        self.status
            .send_replace(StatusSnapshot::from_metrics(metrics, self.error.clone()));
        self.frames_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Publish an encoded frame to all viewers and the snapshot slot.
    pub fn publish_frame(&self, jpeg: Vec<u8>) {
        let jpeg = Bytes::from(jpeg);
        self.latest_frame.send_replace(Some(jpeg.clone()));
        // No viewers is not an error.
        let _ = self.frames.send(jpeg);
    }

    pub fn viewer_count(&self) -> usize {
        self.frames.receiver_count()
    }
}

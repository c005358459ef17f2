//! Latest camera frame for a submersible, with optional periodic refresh.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use image::ImageFormat;
use shared::{domain::SubmarineId, protocol::PictureResponse};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::{
    error::{GatewayError, GatewayResult},
    session::{Session, SessionEvent},
};

/// A decoded picture ready to be embedded by the view layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameImage {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
}

impl FrameImage {
    pub fn decode(encoded: &str) -> GatewayResult<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|err| GatewayError::Malformed(format!("picture is not base64: {err}")))?;
        let format = image::guess_format(&bytes)
            .map_err(|err| GatewayError::Malformed(format!("unknown picture format: {err}")))?;
        let decoded = image::load_from_memory_with_format(&bytes, format)
            .map_err(|err| GatewayError::Malformed(format!("undecodable picture: {err}")))?;
        let mime_type = match format {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            _ => "application/octet-stream",
        };
        Ok(Self {
            width: decoded.width(),
            height: decoded.height(),
            bytes,
            mime_type,
        })
    }

    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveViewFrame {
    pub image: Option<FrameImage>,
    pub subject_id: Option<SubmarineId>,
    pub captured_at: Option<DateTime<Utc>>,
    pub is_loading: bool,
}

impl LiveViewFrame {
    fn from_response(response: PictureResponse) -> GatewayResult<Self> {
        match response.picture.as_deref() {
            Some(encoded) if response.has_picture => Ok(Self {
                image: Some(FrameImage::decode(encoded)?),
                subject_id: response.id,
                captured_at: response
                    .timestamp
                    .filter(|millis| *millis > 0)
                    .and_then(DateTime::<Utc>::from_timestamp_millis),
                is_loading: false,
            }),
            _ => Ok(Self {
                image: None,
                subject_id: response.id.filter(|id| !id.as_str().is_empty()),
                captured_at: None,
                is_loading: false,
            }),
        }
    }
}

impl Session {
    /// Fetches the newest picture for `id`, or for the server's default
    /// submersible when `id` is `None`. On failure the previous frame stays.
    pub async fn load_frame(&self, id: Option<SubmarineId>) {
        self.update_live_view(|frame| frame.is_loading = true).await;

        let fetched = match self.api.fetch_picture(id.as_ref()).await {
            Ok(response) => LiveViewFrame::from_response(response),
            Err(err) => Err(err),
        };

        match fetched {
            Ok(frame) => {
                debug!(
                    subject = ?frame.subject_id,
                    has_image = frame.image.is_some(),
                    "live view frame loaded"
                );
                self.update_live_view(|current| *current = frame).await;
            }
            Err(err) => {
                warn!(submarine_id = ?id, "live view fetch failed: {err}");
                self.log(format!("Live view failed: {err}")).await;
                self.update_live_view(|frame| frame.is_loading = false)
                    .await;
            }
        }
    }

    pub async fn set_auto_refresh(self: &Arc<Self>, enabled: bool) {
        self.inner.lock().await.auto_refresh = enabled;
        self.restart_live_view_refresh().await;
    }

    /// (Re)binds the auto-refresh task to the current selection, or stops it
    /// when refresh is disabled or nothing is selected. Each tick's fetch runs
    /// on its own task, so stopping the ticker never cuts a fetch short.
    pub(crate) async fn restart_live_view_refresh(self: &Arc<Self>) {
        let target = {
            let guard = self.inner.lock().await;
            guard
                .selection
                .clone()
                .filter(|_| guard.auto_refresh)
        };

        let mut tasks = self.tasks.lock().await;
        if let Some(previous) = tasks.live_view_refresh.take() {
            previous.abort();
        }
        let Some(target) = target else {
            return;
        };

        let session = Arc::clone(self);
        let period = self.options.live_view_interval;
        tasks.live_view_refresh = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let session = Arc::clone(&session);
                let target = target.clone();
                tokio::spawn(async move {
                    session.load_frame(Some(target)).await;
                });
            }
        }));
    }

    async fn update_live_view(&self, apply: impl FnOnce(&mut LiveViewFrame)) {
        let frame = {
            let mut guard = self.inner.lock().await;
            apply(&mut guard.live_view);
            guard.live_view.clone()
        };
        self.emit(SessionEvent::LiveViewUpdated(frame));
    }
}

#[cfg(test)]
#[path = "tests/live_view_tests.rs"]
mod tests;

//! Follow-up capture after submersible commands.
//!
//! A movement is chained with an automatic photograph and a live-view fetch.
//! The delays stand in for a completion acknowledgement the server never
//! sends, so a fetch can still race a photo that is not ready yet.

use std::{fmt, sync::Arc, time::Duration};

use shared::{
    domain::{PilotAction, Route, SubmarineId},
    protocol::PilotRequest,
};
use tokio::{task::JoinHandle, time::sleep};
use tracing::debug;

use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureTiming {
    /// Movement command -> automatic photo.
    pub photo_delay: Duration,
    /// Automatic photo -> live-view fetch.
    pub fetch_after_photo: Duration,
    /// Explicit `take_photo` command -> live-view fetch.
    pub fetch_after_explicit_photo: Duration,
    /// Manual capture from the live-view panel -> extra fetch.
    pub manual_capture_fetch: Duration,
}

impl Default for CaptureTiming {
    fn default() -> Self {
        Self {
            photo_delay: Duration::from_millis(200),
            fetch_after_photo: Duration::from_millis(600),
            fetch_after_explicit_photo: Duration::from_millis(800),
            manual_capture_fetch: Duration::from_millis(1500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    /// Photograph after `photo_delay`, then fetch after `fetch_after_photo`.
    CaptureAndFetch,
    /// Fetch only, after the given delay.
    FetchAfter(Duration),
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStage {
    SendMove,
    AutoPhoto,
    FetchFrame,
}

impl fmt::Display for CaptureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SendMove => "send_move",
            Self::AutoPhoto => "auto_photo",
            Self::FetchFrame => "fetch_frame",
        })
    }
}

pub fn is_movement(route: Route, action: PilotAction) -> bool {
    route != Route::None && action == PilotAction::Move
}

pub fn plan_follow_up(route: Route, action: PilotAction, timing: &CaptureTiming) -> FollowUp {
    if is_movement(route, action) {
        return FollowUp::CaptureAndFetch;
    }
    match action {
        PilotAction::TakePhoto => FollowUp::FetchAfter(timing.fetch_after_explicit_photo),
        PilotAction::Locate | PilotAction::Move => FollowUp::None,
    }
}

impl Session {
    /// Runs the follow-up for a pilot command that has already been sent.
    /// Stages run in order on their own task; nothing cancels them.
    pub(crate) fn spawn_follow_up(
        self: &Arc<Self>,
        target: Option<SubmarineId>,
        plan: FollowUp,
    ) -> Option<JoinHandle<()>> {
        let timing = self.options.capture;
        let session = Arc::clone(self);
        match plan {
            FollowUp::None => None,
            FollowUp::FetchAfter(delay) => Some(tokio::spawn(async move {
                sleep(delay).await;
                debug!(stage = %CaptureStage::FetchFrame, submarine_id = ?target, "capture stage");
                session.load_frame(target).await;
            })),
            FollowUp::CaptureAndFetch => Some(tokio::spawn(async move {
                sleep(timing.photo_delay).await;
                debug!(stage = %CaptureStage::AutoPhoto, submarine_id = ?target, "capture stage");
                let photo = PilotRequest {
                    id: target.clone(),
                    route: Route::None,
                    action: PilotAction::TakePhoto,
                };
                // A failed auto-photo must not read as a failed movement.
                if let Err(err) = session.api.pilot(&photo).await {
                    debug!(submarine_id = ?target, "automatic photo dropped: {err}");
                    return;
                }

                sleep(timing.fetch_after_photo).await;
                debug!(stage = %CaptureStage::FetchFrame, submarine_id = ?target, "capture stage");
                session.load_frame(target).await;
            })),
        }
    }
}

#[cfg(test)]
#[path = "tests/sequencer_tests.rs"]
mod tests;

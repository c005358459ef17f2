//! Operator intents to outbound commands.
//!
//! Every command follows the same path: send, append a log line, refresh the
//! read model. A failed send is logged and never retried.

use std::{future::Future, sync::Arc};

use shared::{
    domain::{Course, PilotAction, Route, Rudder, SubmarineId},
    protocol::{
        LaunchParams, MeasurementsResponse, NavigateRequest, PilotRequest, ScanResponse,
    },
};
use tracing::{debug, info, warn};

use crate::{
    error::GatewayResult,
    keys::{self, KeyInput, KeyIntent},
    radar::{self, Blip, RadarSnapshot},
    selection::reconcile,
    sequencer::{plan_follow_up, CaptureStage, FollowUp},
    session::{Session, SessionEvent},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PilotIntent {
    /// `None` lets the server pick its default submersible.
    pub target: Option<SubmarineId>,
    pub route: Route,
    pub action: PilotAction,
}

impl PilotIntent {
    pub fn movement(target: impl Into<SubmarineId>, route: Route) -> Self {
        Self {
            target: Some(target.into()),
            route,
            action: PilotAction::Move,
        }
    }

    pub fn take_photo(target: impl Into<SubmarineId>) -> Self {
        Self {
            target: Some(target.into()),
            route: Route::None,
            action: PilotAction::TakePhoto,
        }
    }

    pub fn locate(target: impl Into<SubmarineId>) -> Self {
        Self {
            target: Some(target.into()),
            route: Route::None,
            action: PilotAction::Locate,
        }
    }
}

fn describe(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| v.to_string())
}

impl Session {
    async fn send<T>(
        &self,
        label: &str,
        request: impl Future<Output = GatewayResult<T>>,
    ) -> Option<T> {
        match request.await {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(command = label, "command failed: {err}");
                self.log(format!("{label} failed: {err}")).await;
                None
            }
        }
    }

    pub async fn launch(self: &Arc<Self>, params: &LaunchParams) -> bool {
        if self.send("Launch", self.api.launch(params)).await.is_none() {
            return false;
        }
        info!(name = %params.name, x = params.x, y = params.y, "launch sent");
        self.log(format!(
            "Launch sent: name={}, sector=({},{}), dir=({},{})",
            params.name, params.x, params.y, params.dx, params.dy
        ))
        .await;
        self.refresh().await;
        true
    }

    pub async fn navigate(self: &Arc<Self>, rudder: Rudder, course: Course) -> bool {
        let request = NavigateRequest { rudder, course };
        if self.send("Navigate", self.api.navigate(request)).await.is_none() {
            return false;
        }
        self.log(format!("Navigate: rudder={rudder}, course={course}"))
            .await;
        self.refresh().await;
        true
    }

    pub async fn scan(self: &Arc<Self>) -> Option<ScanResponse> {
        let result = self.send("Scan", self.api.scan()).await?;
        self.log(format!(
            "Scan: depth={}, stddev={}",
            describe(result.depth),
            describe(result.stddev)
        ))
        .await;
        self.refresh().await;
        Some(result)
    }

    /// Requests radar echoes and keeps them with the ship sector known at
    /// request time.
    pub async fn radar(self: &Arc<Self>) -> Option<Vec<Blip>> {
        let ship_sector_at_capture = self
            .inner
            .lock()
            .await
            .world
            .as_ref()
            .and_then(|world| world.ship_sector());
        let response = self.send("Radar", self.api.radar()).await?;

        let snapshot = RadarSnapshot {
            echoes: response.echoes,
            ship_sector_at_capture,
        };
        let blips = radar::project(&snapshot, self.options.radar_display);
        let echo_count = snapshot.echoes.len();
        self.inner.lock().await.radar = Some(snapshot);
        self.emit(SessionEvent::RadarUpdated(blips.clone()));

        self.log(format!(
            "Radar: {echo_count} echoes, {} plotted",
            blips.len()
        ))
        .await;
        self.refresh().await;
        Some(blips)
    }

    pub async fn start_submarine(self: &Arc<Self>) -> bool {
        if self
            .send("Submarine start", self.api.start_submarine())
            .await
            .is_none()
        {
            return false;
        }
        self.log("Submarine started").await;
        self.refresh().await;
        true
    }

    pub async fn kill_submarine(self: &Arc<Self>, id: &SubmarineId) -> bool {
        if self
            .send("Kill", self.api.kill_submarine(id))
            .await
            .is_none()
        {
            return false;
        }
        self.log(format!("Submarine killed: {id}")).await;
        self.refresh().await;
        true
    }

    /// Sends a pilot command and schedules its capture follow-up.
    pub async fn pilot(self: &Arc<Self>, intent: PilotIntent) -> bool {
        let request = PilotRequest {
            id: intent.target.clone(),
            route: intent.route,
            action: intent.action,
        };
        if self.send("Pilot", self.api.pilot(&request)).await.is_none() {
            return false;
        }
        let target = intent
            .target
            .as_ref()
            .map_or("default", SubmarineId::as_str);
        self.log(format!(
            "Pilot: id={target}, route={}, action={}",
            intent.route, intent.action
        ))
        .await;

        let plan = plan_follow_up(intent.route, intent.action, &self.options.capture);
        if plan == FollowUp::CaptureAndFetch {
            debug!(stage = %CaptureStage::SendMove, submarine_id = ?intent.target, "capture stage");
        }
        self.spawn_follow_up(intent.target, plan);
        self.refresh().await;
        true
    }

    /// Photographs the selected submersible from the live-view panel and
    /// fetches the frame once more after the manual-capture delay.
    pub async fn capture_now(self: &Arc<Self>) -> bool {
        let Some(selected) = self.selection().await else {
            self.log("No submarine selected for capture").await;
            return false;
        };
        if !self.pilot(PilotIntent::take_photo(selected.clone())).await {
            return false;
        }

        let session = Arc::clone(self);
        let delay = self.options.capture.manual_capture_fetch;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            session.load_frame(Some(selected)).await;
        });
        true
    }

    pub async fn measurements(
        self: &Arc<Self>,
        id: Option<&SubmarineId>,
    ) -> Option<MeasurementsResponse> {
        let response = self
            .send("Measurements", self.api.measurements(id))
            .await?;
        let summary = match &response {
            MeasurementsResponse::Submarine {
                submarine_id,
                count,
                ..
            } => format!("Measurements: {submarine_id} has {count} points"),
            MeasurementsResponse::Overview {
                submarines,
                total_measurements,
            } => format!(
                "Measurements: {total_measurements} points across {} submarines",
                submarines.len()
            ),
        };
        self.log(summary).await;
        self.refresh().await;
        Some(response)
    }

    pub async fn reset(self: &Arc<Self>) -> bool {
        if self.send("Reset", self.api.reset()).await.is_none() {
            return false;
        }
        self.log("Session reset (ship and submarines cleared)").await;
        self.replace_world(None).await;
        self.refresh().await;
        true
    }

    /// Operator picks a submersible. Ids outside the current roster are
    /// ignored so the selection invariant holds.
    pub async fn select_submarine(self: &Arc<Self>, id: &SubmarineId) -> bool {
        {
            let mut guard = self.inner.lock().await;
            let known = guard
                .world
                .as_ref()
                .is_some_and(|world| world.contains_submarine(id));
            if !known {
                return false;
            }
            if guard.selection.as_ref() == Some(id) {
                return true;
            }
            guard.selection = Some(id.clone());
        }
        self.emit(SessionEvent::SelectionChanged(Some(id.clone())));
        self.restart_live_view_refresh().await;
        true
    }

    /// Global key handler. Returns whether a command was dispatched.
    pub async fn handle_key(self: &Arc<Self>, input: KeyInput) -> bool {
        match keys::resolve(input) {
            None => false,
            Some(KeyIntent::Navigate { rudder, course }) => self.navigate(rudder, course).await,
            Some(KeyIntent::PilotSelected { route, action }) => {
                let target = {
                    let guard = self.inner.lock().await;
                    let roster = guard
                        .world
                        .as_ref()
                        .map(|world| world.submarines.as_slice())
                        .unwrap_or_default();
                    reconcile(roster, guard.selection.as_ref())
                };
                let Some(target) = target else {
                    return false;
                };
                self.pilot(PilotIntent {
                    target: Some(target),
                    route,
                    action,
                })
                .await
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/dispatcher_tests.rs"]
mod tests;

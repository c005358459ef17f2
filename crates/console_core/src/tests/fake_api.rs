//! In-memory `ShipApi` that records every call with its (virtual) time.

use std::{sync::Mutex, time::Duration};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageBuffer, ImageFormat, Rgb};
use shared::{
    domain::SubmarineId,
    protocol::{
        LaunchParams, MeasurementCount, MeasurementsResponse, NavigateRequest, PictureResponse,
        PilotRequest, RadarResponse, ScanResponse, Submarine, WorldState,
    },
};
use tokio::time::{sleep, Instant};

use crate::{
    error::{GatewayError, GatewayResult},
    gateway::ShipApi,
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    GetState,
    Launch(LaunchParams),
    Navigate(NavigateRequest),
    Scan,
    Radar,
    StartSubmarine,
    Kill(SubmarineId),
    Pilot(PilotRequest),
    FetchPicture(Option<SubmarineId>),
    Measurements(Option<SubmarineId>),
    Reset,
}

#[derive(Default)]
struct Script {
    world: WorldState,
    fail_state: bool,
    fail_commands: bool,
    fail_photo: bool,
    fail_picture: bool,
    state_delay: Duration,
    picture_delay: Duration,
    picture: PictureResponse,
    radar: RadarResponse,
    scan: ScanResponse,
}

pub(crate) struct FakeApi {
    started: Instant,
    calls: Mutex<Vec<(u128, Call)>>,
    script: Mutex<Script>,
}

impl FakeApi {
    pub(crate) fn new() -> Self {
        Self {
            started: Instant::now(),
            calls: Mutex::new(Vec::new()),
            script: Mutex::new(Script::default()),
        }
    }

    pub(crate) fn with_roster(ids: &[&str]) -> Self {
        let api = Self::new();
        api.set_roster(ids);
        api
    }

    pub(crate) fn set_roster(&self, ids: &[&str]) {
        self.script.lock().expect("script").world.submarines =
            ids.iter().map(|id| submarine(id)).collect();
    }

    pub(crate) fn set_world(&self, world: WorldState) {
        self.script.lock().expect("script").world = world;
    }

    pub(crate) fn fail_state(&self, fail: bool) {
        self.script.lock().expect("script").fail_state = fail;
    }

    pub(crate) fn fail_commands(&self, fail: bool) {
        self.script.lock().expect("script").fail_commands = fail;
    }

    pub(crate) fn fail_photo(&self, fail: bool) {
        self.script.lock().expect("script").fail_photo = fail;
    }

    pub(crate) fn fail_picture(&self, fail: bool) {
        self.script.lock().expect("script").fail_picture = fail;
    }

    /// Holds every `get_state` response back for `delay`.
    pub(crate) fn delay_state(&self, delay: Duration) {
        self.script.lock().expect("script").state_delay = delay;
    }

    pub(crate) fn delay_picture(&self, delay: Duration) {
        self.script.lock().expect("script").picture_delay = delay;
    }

    pub(crate) fn set_picture(&self, picture: PictureResponse) {
        self.script.lock().expect("script").picture = picture;
    }

    pub(crate) fn set_radar(&self, radar: RadarResponse) {
        self.script.lock().expect("script").radar = radar;
    }

    pub(crate) fn set_scan(&self, scan: ScanResponse) {
        self.script.lock().expect("script").scan = scan;
    }

    /// Calls with their offset from construction, in milliseconds.
    pub(crate) fn timed_calls(&self) -> Vec<(u128, Call)> {
        self.calls.lock().expect("calls").clone()
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.timed_calls().into_iter().map(|(_, call)| call).collect()
    }

    pub(crate) fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|call| matches(call)).count()
    }

    fn record(&self, call: Call) {
        let elapsed = self.started.elapsed().as_millis();
        self.calls.lock().expect("calls").push((elapsed, call));
    }

    fn command_result(&self) -> GatewayResult<()> {
        if self.script.lock().expect("script").fail_commands {
            return Err(GatewayError::Status {
                status: 500,
                message: "Internal Server Error".into(),
            });
        }
        Ok(())
    }
}

pub(crate) fn submarine(id: &str) -> Submarine {
    Submarine {
        id: id.into(),
        pos: None,
        depth: 0.0,
        distance: 0.0,
        has_picture: false,
        picture_timestamp: None,
    }
}

/// A tiny valid PNG, base64-encoded.
pub(crate) fn png_base64(width: u32, height: u32) -> String {
    let buffer = ImageBuffer::from_pixel(width, height, Rgb([12u8, 80, 160]));
    let mut bytes = std::io::Cursor::new(Vec::new());
    buffer
        .write_to(&mut bytes, ImageFormat::Png)
        .expect("encode png");
    STANDARD.encode(bytes.into_inner())
}

#[async_trait]
impl ShipApi for FakeApi {
    async fn get_state(&self) -> GatewayResult<WorldState> {
        self.record(Call::GetState);
        let delay = self.script.lock().expect("script").state_delay;
        if !delay.is_zero() {
            sleep(delay).await;
        }
        let script = self.script.lock().expect("script");
        if script.fail_state {
            return Err(GatewayError::Transport("connection refused".into()));
        }
        Ok(script.world.clone())
    }

    async fn launch(&self, params: &LaunchParams) -> GatewayResult<()> {
        self.record(Call::Launch(params.clone()));
        self.command_result()
    }

    async fn navigate(&self, request: NavigateRequest) -> GatewayResult<()> {
        self.record(Call::Navigate(request));
        self.command_result()
    }

    async fn scan(&self) -> GatewayResult<ScanResponse> {
        self.record(Call::Scan);
        self.command_result()?;
        Ok(self.script.lock().expect("script").scan)
    }

    async fn radar(&self) -> GatewayResult<RadarResponse> {
        self.record(Call::Radar);
        self.command_result()?;
        Ok(self.script.lock().expect("script").radar.clone())
    }

    async fn start_submarine(&self) -> GatewayResult<()> {
        self.record(Call::StartSubmarine);
        self.command_result()
    }

    async fn kill_submarine(&self, id: &SubmarineId) -> GatewayResult<()> {
        self.record(Call::Kill(id.clone()));
        self.command_result()
    }

    async fn pilot(&self, request: &PilotRequest) -> GatewayResult<()> {
        self.record(Call::Pilot(request.clone()));
        let fail_photo = self.script.lock().expect("script").fail_photo;
        if fail_photo && request.action == shared::domain::PilotAction::TakePhoto {
            return Err(GatewayError::Status {
                status: 400,
                message: "no such submarine".into(),
            });
        }
        self.command_result()
    }

    async fn fetch_picture(&self, id: Option<&SubmarineId>) -> GatewayResult<PictureResponse> {
        self.record(Call::FetchPicture(id.cloned()));
        let delay = self.script.lock().expect("script").picture_delay;
        if !delay.is_zero() {
            sleep(delay).await;
        }
        let script = self.script.lock().expect("script");
        if script.fail_picture {
            return Err(GatewayError::Transport("connection reset".into()));
        }
        Ok(script.picture.clone())
    }

    async fn measurements(
        &self,
        id: Option<&SubmarineId>,
    ) -> GatewayResult<MeasurementsResponse> {
        self.record(Call::Measurements(id.cloned()));
        self.command_result()?;
        Ok(match id {
            Some(id) => MeasurementsResponse::Submarine {
                submarine_id: id.clone(),
                count: 3,
                measurements: Vec::new(),
            },
            None => MeasurementsResponse::Overview {
                submarines: vec![MeasurementCount {
                    id: "S1".into(),
                    measurement_count: 3,
                }],
                total_measurements: 3,
            },
        })
    }

    async fn reset(&self) -> GatewayResult<()> {
        self.record(Call::Reset);
        self.command_result()
    }
}

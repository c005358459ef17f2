//! Session context shared by every console component.
//!
//! Each field has exactly one writer: the synchronizer owns `world` and
//! (through the reconciler) `selection`, the live-view loader owns
//! `live_view`, the dispatcher owns `radar`, and everyone appends to the log.
//! Writers always replace values wholesale.

use std::{sync::Arc, time::Duration};

use shared::{domain::SubmarineId, protocol::WorldState};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::info;

use crate::{
    gateway::ShipApi,
    live_view::LiveViewFrame,
    log_sink::{LogEntry, LogSink},
    radar::{self, Blip, RadarDisplay, RadarSnapshot},
    sequencer::CaptureTiming,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionOptions {
    pub poll_interval: Duration,
    pub live_view_interval: Duration,
    pub capture: CaptureTiming,
    pub radar_display: RadarDisplay,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(2000),
            live_view_interval: Duration::from_millis(3000),
            capture: CaptureTiming::default(),
            radar_display: RadarDisplay::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    WorldUpdated(Option<WorldState>),
    SelectionChanged(Option<SubmarineId>),
    LiveViewUpdated(LiveViewFrame),
    RadarUpdated(Vec<Blip>),
    Logged(LogEntry),
    LogCleared,
}

#[derive(Default)]
pub(crate) struct SessionState {
    pub(crate) world: Option<WorldState>,
    pub(crate) selection: Option<SubmarineId>,
    pub(crate) live_view: LiveViewFrame,
    pub(crate) radar: Option<RadarSnapshot>,
    pub(crate) auto_refresh: bool,
}

#[derive(Default)]
pub(crate) struct SessionTasks {
    pub(crate) poller: Option<JoinHandle<()>>,
    pub(crate) live_view_refresh: Option<JoinHandle<()>>,
}

pub struct Session {
    pub(crate) api: Arc<dyn ShipApi>,
    pub(crate) options: SessionOptions,
    pub(crate) inner: Mutex<SessionState>,
    pub(crate) tasks: Mutex<SessionTasks>,
    log: Mutex<LogSink>,
    events: broadcast::Sender<SessionEvent>,
}

impl Session {
    pub fn new(api: Arc<dyn ShipApi>, options: SessionOptions) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            api,
            options,
            inner: Mutex::new(SessionState::default()),
            tasks: Mutex::new(SessionTasks::default()),
            log: Mutex::new(LogSink::default()),
            events,
        })
    }

    /// Starts the state poller; the first poll runs immediately.
    pub async fn start(self: &Arc<Self>) {
        let handle = self.spawn_poller();
        let mut tasks = self.tasks.lock().await;
        if let Some(previous) = tasks.poller.replace(handle) {
            previous.abort();
        }
    }

    /// Stops the poller and live-view auto refresh. Sequencer chains already
    /// in flight are left to finish.
    pub async fn shutdown(&self) {
        let mut tasks = self.tasks.lock().await;
        if let Some(poller) = tasks.poller.take() {
            poller.abort();
        }
        if let Some(refresh) = tasks.live_view_refresh.take() {
            refresh.abort();
        }
        info!("console session shut down");
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub async fn log(&self, message: impl Into<String>) -> LogEntry {
        let entry = self.log.lock().await.append(message);
        info!(target: "console_log", "{}", entry.message);
        self.emit(SessionEvent::Logged(entry.clone()));
        entry
    }

    pub async fn log_entries(&self) -> Vec<LogEntry> {
        self.log.lock().await.entries().cloned().collect()
    }

    /// Empties the log and forgets the last radar picture.
    pub async fn clear_log(&self) {
        self.log.lock().await.clear();
        self.inner.lock().await.radar = None;
        self.emit(SessionEvent::LogCleared);
        self.emit(SessionEvent::RadarUpdated(Vec::new()));
    }

    pub async fn world(&self) -> Option<WorldState> {
        self.inner.lock().await.world.clone()
    }

    pub async fn selection(&self) -> Option<SubmarineId> {
        self.inner.lock().await.selection.clone()
    }

    pub async fn live_view(&self) -> LiveViewFrame {
        self.inner.lock().await.live_view.clone()
    }

    pub async fn auto_refresh_enabled(&self) -> bool {
        self.inner.lock().await.auto_refresh
    }

    pub async fn radar_snapshot(&self) -> Option<RadarSnapshot> {
        self.inner.lock().await.radar.clone()
    }

    pub async fn radar_blips(&self) -> Vec<Blip> {
        self.inner
            .lock()
            .await
            .radar
            .as_ref()
            .map(|snapshot| radar::project(snapshot, self.options.radar_display))
            .unwrap_or_default()
    }
}

use super::*;

use std::time::Duration;

use shared::{
    domain::GridVector,
    protocol::{Echo, EchoSector, PictureResponse, RadarResponse, Ship, WorldState},
};

use crate::{
    fake_api::{png_base64, submarine, Call, FakeApi},
    keys::Key,
    session::SessionOptions,
};

fn s1_picture() -> PictureResponse {
    PictureResponse {
        has_picture: true,
        picture: Some(png_base64(2, 2)),
        id: Some("S1".into()),
        timestamp: Some(1_700_000_000_000),
    }
}

fn session_for(api: &Arc<FakeApi>) -> Arc<Session> {
    Session::new(api.clone(), SessionOptions::default())
}

fn world_with_ship_at(x: i32, y: i32, subs: &[&str]) -> WorldState {
    WorldState {
        ship: Some(Ship {
            id: "ship-1".into(),
            sector: Some(GridVector::new(x, y)),
            dir: Some(GridVector::new(0, 1)),
        }),
        submarines: subs.iter().map(|id| submarine(id)).collect(),
    }
}

#[tokio::test]
async fn launch_sends_once_logs_once_and_refreshes() {
    let api = Arc::new(FakeApi::new());
    let session = session_for(&api);
    let params = LaunchParams {
        name: "Explorer1".into(),
        x: 1,
        y: 1,
        dx: 0,
        dy: 0,
    };

    assert!(session.launch(&params).await);

    assert_eq!(api.calls(), vec![Call::Launch(params), Call::GetState]);
    let log = session.log_entries().await;
    assert_eq!(log.len(), 1);
    assert!(log[0].message.starts_with("Launch sent: name=Explorer1"));
    assert_eq!(session.world().await, Some(WorldState::default()));
}

#[tokio::test]
async fn failed_command_logs_and_skips_refresh() {
    let api = Arc::new(FakeApi::new());
    api.fail_commands(true);
    let session = session_for(&api);

    assert!(!session.navigate(Rudder::Left, Course::Forward).await);

    assert_eq!(
        api.calls(),
        vec![Call::Navigate(NavigateRequest {
            rudder: Rudder::Left,
            course: Course::Forward,
        })]
    );
    let log = session.log_entries().await;
    assert_eq!(log.len(), 1);
    assert_eq!(
        log[0].message,
        "Navigate failed: HTTP 500: Internal Server Error"
    );
}

#[tokio::test]
async fn letter_keys_navigate_unless_input_focused() {
    let api = Arc::new(FakeApi::new());
    let session = session_for(&api);

    assert!(session.handle_key(KeyInput::new(Key::Char('q'))).await);
    assert!(!session.handle_key(KeyInput::focused(Key::Char('w'))).await);
    assert!(!session.handle_key(KeyInput::focused(Key::ArrowUp)).await);

    let navigations: Vec<Call> = api
        .calls()
        .into_iter()
        .filter(|call| matches!(call, Call::Navigate(_)))
        .collect();
    assert_eq!(
        navigations,
        vec![Call::Navigate(NavigateRequest {
            rudder: Rudder::Left,
            course: Course::Backward,
        })]
    );
    assert_eq!(session.log_entries().await[0].message, "Navigate: rudder=Left, course=Backward");
}

#[tokio::test(start_paused = true)]
async fn arrow_keys_target_selection_or_first_submarine() {
    let api = Arc::new(FakeApi::with_roster(&["S1", "S2"]));
    let session = session_for(&api);

    // No snapshot yet: nothing to pilot.
    assert!(!session.handle_key(KeyInput::new(Key::ArrowUp)).await);

    session.refresh().await;
    assert!(session.select_submarine(&"S2".into()).await);
    assert!(session.handle_key(KeyInput::new(Key::ArrowDown)).await);

    api.set_roster(&["S1"]);
    session.refresh().await;
    assert!(session.handle_key(KeyInput::new(Key::ArrowRight)).await);

    let moves: Vec<PilotRequest> = api
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::Pilot(request) if request.action == PilotAction::Move => Some(request),
            _ => None,
        })
        .collect();
    assert_eq!(
        moves,
        vec![
            PilotRequest {
                id: Some("S2".into()),
                route: Route::Down,
                action: PilotAction::Move,
            },
            PilotRequest {
                id: Some("S1".into()),
                route: Route::E,
                action: PilotAction::Move,
            },
        ]
    );
}

#[tokio::test]
async fn selecting_unknown_submarine_is_ignored() {
    let api = Arc::new(FakeApi::with_roster(&["S1"]));
    let session = session_for(&api);
    session.refresh().await;

    assert!(!session.select_submarine(&"S9".into()).await);
    assert_eq!(session.selection().await, Some("S1".into()));
}

#[tokio::test]
async fn radar_keeps_ship_sector_from_request_time() {
    let api = Arc::new(FakeApi::new());
    api.set_world(world_with_ship_at(5, 5, &[]));
    api.set_radar(RadarResponse {
        echoes: vec![
            Echo {
                sector: Some(EchoSector { vec2: [5.0, 7.0] }),
                height: Some(2.0),
                ground: Some("Water".into()),
            },
            Echo {
                sector: Some(EchoSector { vec2: [5.0, 5.0] }),
                height: Some(9.0),
                ground: None,
            },
        ],
    });
    let session = session_for(&api);
    session.refresh().await;

    // The ship moves before the radar response is drawn again.
    api.set_world(world_with_ship_at(9, 9, &[]));
    let blips = session.radar().await.expect("radar");

    assert_eq!(blips.len(), 1);
    assert_eq!((blips[0].dx, blips[0].dy), (0.0, 2.0));
    let snapshot = session.radar_snapshot().await.expect("snapshot");
    assert_eq!(snapshot.ship_sector_at_capture, Some(GridVector::new(5, 5)));
    assert_eq!(session.radar_blips().await, blips);
    assert_eq!(
        session.log_entries().await.last().map(|e| e.message.clone()),
        Some("Radar: 2 echoes, 1 plotted".to_string())
    );

    session.clear_log().await;
    assert!(session.log_entries().await.is_empty());
    assert!(session.radar_snapshot().await.is_none());
    assert!(session.radar_blips().await.is_empty());
}

#[tokio::test]
async fn scan_logs_missing_values_as_unavailable() {
    let api = Arc::new(FakeApi::new());
    api.set_scan(ScanResponse {
        depth: Some(42.0),
        stddev: None,
    });
    let session = session_for(&api);

    let result = session.scan().await.expect("scan");

    assert_eq!(result.depth, Some(42.0));
    assert_eq!(session.log_entries().await[0].message, "Scan: depth=42, stddev=n/a");
}

#[tokio::test]
async fn kill_and_start_are_logged() {
    let api = Arc::new(FakeApi::with_roster(&["S1"]));
    let session = session_for(&api);

    assert!(session.start_submarine().await);
    assert!(session.kill_submarine(&"S1".into()).await);

    let messages: Vec<String> = session
        .log_entries()
        .await
        .into_iter()
        .map(|entry| entry.message)
        .collect();
    assert_eq!(messages, vec!["Submarine started", "Submarine killed: S1"]);
    assert_eq!(api.count(|call| *call == Call::Kill("S1".into())), 1);
    assert_eq!(api.count(|call| *call == Call::GetState), 2);
}

#[tokio::test]
async fn reset_clears_snapshot_when_follow_up_poll_fails() {
    let api = Arc::new(FakeApi::new());
    api.set_world(world_with_ship_at(1, 1, &["S1"]));
    let session = session_for(&api);
    session.refresh().await;
    assert_eq!(session.selection().await, Some("S1".into()));

    api.fail_state(true);
    assert!(session.reset().await);

    assert_eq!(session.world().await, None);
    assert_eq!(session.selection().await, None);
    let messages: Vec<String> = session
        .log_entries()
        .await
        .into_iter()
        .map(|entry| entry.message)
        .collect();
    assert_eq!(messages[0], "Session reset (ship and submarines cleared)");
    assert!(messages[1].starts_with("Failed to load state"));
}

#[tokio::test]
async fn measurements_summaries() {
    let api = Arc::new(FakeApi::new());
    let session = session_for(&api);

    session.measurements(Some(&"S1".into())).await.expect("one");
    session.measurements(None).await.expect("all");

    let messages: Vec<String> = session
        .log_entries()
        .await
        .into_iter()
        .map(|entry| entry.message)
        .collect();
    assert_eq!(
        messages,
        vec![
            "Measurements: S1 has 3 points",
            "Measurements: 3 points across 1 submarines",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn capture_now_fetches_again_after_manual_delay() {
    let api = Arc::new(FakeApi::with_roster(&["S1"]));
    api.set_picture(s1_picture());
    let session = session_for(&api);

    assert!(!session.capture_now().await);

    session.refresh().await;
    assert!(session.capture_now().await);
    tokio::time::sleep(Duration::from_secs(3)).await;

    let fetch_times: Vec<u128> = api
        .timed_calls()
        .into_iter()
        .filter(|(_, call)| *call == Call::FetchPicture(Some("S1".into())))
        .map(|(at, _)| at)
        .collect();
    assert_eq!(fetch_times, vec![800, 1500]);
    assert!(session.live_view().await.image.is_some());
}

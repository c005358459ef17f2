use std::sync::Arc;

use console_core::{Key, KeyInput, PilotIntent, Session};
use shared::{
    domain::{Course, PilotAction, Route, Rudder, SubmarineId},
    protocol::LaunchParams,
};

use crate::render;

pub const HELP: &str = "\
commands:
  w a s d q e | up down left right   keyboard bindings
  nav <rudder> <course>              Left|Center|Right, Forward|Backward
  launch [name x y dx dy]            launch the ship (default Explorer 1 1 0 0)
  scan | radar | blips               sonar depth, radar sweep, last plotted blips
  start | kill <id>                  start or kill a submersible
  select <id>                        focus a submersible
  pilot <id|-> <route> [action]      action: take_photo | locate
  photo <id> | locate <id>           photo or locate request
  capture                            photo of the selection plus a delayed frame fetch
  view [id]                          fetch a live-view frame
  auto on|off                        periodic live-view refresh
  focus on|off                       simulate a focused text input
  measure [id]                       measurement counts
  state | log | clear | reset | help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Key(Key),
    Navigate(Rudder, Course),
    Launch(LaunchParams),
    Scan,
    Radar,
    Blips,
    Start,
    Kill(SubmarineId),
    Select(SubmarineId),
    Pilot(PilotIntent),
    Capture,
    View(Option<SubmarineId>),
    AutoRefresh(bool),
    Focus(bool),
    Measure(Option<SubmarineId>),
    State,
    Log,
    Clear,
    Reset,
    Help,
    Quit,
}

pub fn parse(line: &str) -> Result<Command, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&head, args)) = words.split_first() else {
        return Err(String::new());
    };

    let command = match (head.to_ascii_lowercase().as_str(), args) {
        ("nav", [rudder, course]) => Command::Navigate(rudder.parse()?, course.parse()?),
        ("launch", []) => Command::Launch(LaunchParams::default()),
        ("launch", [name, x, y, dx, dy]) => Command::Launch(LaunchParams {
            name: name.to_string(),
            x: int(x)?,
            y: int(y)?,
            dx: int(dx)?,
            dy: int(dy)?,
        }),
        ("scan", []) => Command::Scan,
        ("radar", []) => Command::Radar,
        ("blips", []) => Command::Blips,
        ("start", []) => Command::Start,
        ("kill", [id]) => Command::Kill(SubmarineId::from(*id)),
        ("select", [id]) => Command::Select(SubmarineId::from(*id)),
        ("pilot", [id, route]) => {
            Command::Pilot(pilot_intent(id, route.parse()?, PilotAction::Move))
        }
        ("pilot", [id, route, action]) => {
            Command::Pilot(pilot_intent(id, route.parse()?, action.parse()?))
        }
        ("photo", [id]) => Command::Pilot(PilotIntent::take_photo(*id)),
        ("locate", [id]) => Command::Pilot(PilotIntent::locate(*id)),
        ("capture", []) => Command::Capture,
        ("view", []) => Command::View(None),
        ("view", [id]) => Command::View(Some(SubmarineId::from(*id))),
        ("auto", [flag]) => Command::AutoRefresh(on_off(flag)?),
        ("focus", [flag]) => Command::Focus(on_off(flag)?),
        ("measure", []) => Command::Measure(None),
        ("measure", [id]) => Command::Measure(Some(SubmarineId::from(*id))),
        ("state", []) => Command::State,
        ("log", []) => Command::Log,
        ("clear", []) => Command::Clear,
        ("reset", []) => Command::Reset,
        ("help", _) => Command::Help,
        ("quit" | "exit", []) => Command::Quit,
        (_, []) => Command::Key(head.parse()?),
        _ => return Err(format!("cannot parse '{line}', try 'help'")),
    };
    Ok(command)
}

/// `-` leaves the id out so the server picks the submersible.
fn pilot_intent(id: &str, route: Route, action: PilotAction) -> PilotIntent {
    PilotIntent {
        target: (id != "-").then(|| SubmarineId::from(id)),
        route,
        action,
    }
}

fn int(raw: &str) -> Result<i32, String> {
    raw.parse().map_err(|_| format!("'{raw}' is not an integer"))
}

fn on_off(raw: &str) -> Result<bool, String> {
    match raw.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        other => Err(format!("expected on/off, got '{other}'")),
    }
}

/// Runs one operator command. Outcomes reach the operator through the
/// session log, so only the read-only commands print directly.
pub async fn execute(session: Arc<Session>, command: Command, text_input_focused: bool) {
    match command {
        Command::Key(key) => {
            let input = KeyInput {
                key,
                text_input_focused,
            };
            session.handle_key(input).await;
        }
        Command::Navigate(rudder, course) => {
            session.navigate(rudder, course).await;
        }
        Command::Launch(params) => {
            session.launch(&params).await;
        }
        Command::Scan => {
            session.scan().await;
        }
        Command::Radar => {
            session.radar().await;
        }
        Command::Blips => render::print_blips(&session.radar_blips().await),
        Command::Start => {
            session.start_submarine().await;
        }
        Command::Kill(id) => {
            session.kill_submarine(&id).await;
        }
        Command::Select(id) => {
            session.select_submarine(&id).await;
        }
        Command::Pilot(intent) => {
            session.pilot(intent).await;
        }
        Command::Capture => {
            session.capture_now().await;
        }
        Command::View(id) => {
            let target = match id {
                Some(id) => Some(id),
                None => session.selection().await,
            };
            session.load_frame(target).await;
        }
        Command::AutoRefresh(enabled) => session.set_auto_refresh(enabled).await,
        Command::Measure(id) => {
            session.measurements(id.as_ref()).await;
        }
        Command::State => {
            let selection = session.selection().await;
            render::print_world(session.world().await.as_ref(), selection.as_ref());
        }
        Command::Log => {
            for entry in session.log_entries().await {
                println!("{entry}");
            }
        }
        Command::Clear => session.clear_log().await,
        Command::Reset => {
            session.reset().await;
        }
        Command::Help => println!("{HELP}"),
        // Handled by the input loop.
        Command::Focus(_) | Command::Quit => {}
    }
}

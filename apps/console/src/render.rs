use console_core::{Blip, LiveViewFrame, SessionEvent};
use shared::{domain::SubmarineId, protocol::WorldState};
use tokio::sync::broadcast::{self, error::RecvError};

/// Mirrors session events onto stdout until the session goes away.
pub async fn print_events(mut events: broadcast::Receiver<SessionEvent>) {
    loop {
        match events.recv().await {
            Ok(SessionEvent::Logged(entry)) => println!("{entry}"),
            Ok(SessionEvent::SelectionChanged(selection)) => match selection {
                Some(id) => println!("-- selected {id}"),
                None => println!("-- no submarine selected"),
            },
            Ok(SessionEvent::LiveViewUpdated(frame)) => print_frame(&frame),
            Ok(SessionEvent::RadarUpdated(blips)) if !blips.is_empty() => print_blips(&blips),
            Ok(SessionEvent::LogCleared) => println!("-- log cleared"),
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "console fell behind session events");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

pub fn print_world(world: Option<&WorldState>, selection: Option<&SubmarineId>) {
    let Some(world) = world else {
        println!("no state loaded");
        return;
    };
    match &world.ship {
        Some(ship) => println!(
            "ship {} sector={} dir={}",
            ship.id,
            opt(ship.sector),
            opt(ship.dir),
        ),
        None => println!("ship not launched"),
    }
    if world.submarines.is_empty() {
        println!("no submarines");
    }
    for sub in &world.submarines {
        let marker = if selection == Some(&sub.id) { '*' } else { ' ' };
        let pos = sub
            .pos
            .map(|p| format!("({:.1},{:.1},{:.1})", p.x, p.y, p.z))
            .unwrap_or_else(|| "n/a".into());
        println!(
            "{marker} {} pos={pos} depth={:.1} distance={:.1} picture={}",
            sub.id,
            sub.depth,
            sub.distance,
            if sub.has_picture { "yes" } else { "no" },
        );
    }
}

pub fn print_blips(blips: &[Blip]) {
    if blips.is_empty() {
        println!("radar: nothing plotted");
    }
    for blip in blips {
        println!(
            "blip at ({:.0},{:.0}) bearing {:.0}deg offset=({},{}) height={:.1} ground={}",
            blip.x,
            blip.y,
            blip.angle.to_degrees(),
            blip.dx,
            blip.dy,
            blip.height,
            blip.ground.as_deref().unwrap_or("n/a"),
        );
    }
}

fn print_frame(frame: &LiveViewFrame) {
    if frame.is_loading {
        return;
    }
    let subject = frame
        .subject_id
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "?".into());
    match &frame.image {
        Some(image) => println!(
            "live view: {subject} {}x{} {} captured {}",
            image.width,
            image.height,
            image.mime_type,
            frame
                .captured_at
                .map(|at| at.format("%H:%M:%S").to_string())
                .unwrap_or_else(|| "n/a".into()),
        ),
        None => println!("live view: no picture for {subject}"),
    }
}

fn opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "n/a".into())
}

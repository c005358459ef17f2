//! Projects radar echoes onto a fixed-size circular display.
//!
//! Bearings are taken relative to the ship sector recorded when the radar
//! request was issued, so blips already on screen do not drift when the ship
//! moves afterwards.

use serde::Serialize;
use shared::{domain::GridVector, protocol::Echo};

/// Fraction of the display radius at which blips are placed.
const BLIP_RING: f64 = 0.9;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RadarSnapshot {
    pub echoes: Vec<Echo>,
    pub ship_sector_at_capture: Option<GridVector>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadarDisplay {
    /// Width and height of the square canvas holding the disc, in pixels.
    pub size: f64,
}

impl RadarDisplay {
    pub fn new(size: f64) -> Self {
        Self { size }
    }

    pub fn center(&self) -> f64 {
        self.size / 2.0
    }

    pub fn radius(&self) -> f64 {
        self.size / 2.0
    }
}

impl Default for RadarDisplay {
    fn default() -> Self {
        Self::new(220.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Blip {
    pub x: f64,
    pub y: f64,
    /// Screen bearing in radians; positive world-y maps to "up".
    pub angle: f64,
    pub dx: f64,
    pub dy: f64,
    pub height: f64,
    pub ground: Option<String>,
}

pub fn project(snapshot: &RadarSnapshot, display: RadarDisplay) -> Vec<Blip> {
    let Some(ship) = snapshot.ship_sector_at_capture else {
        return Vec::new();
    };
    let center = display.center();
    let ring = display.radius() * BLIP_RING;

    snapshot
        .echoes
        .iter()
        .filter_map(|echo| {
            let sector = echo.sector?;
            let height = echo.height.filter(|h| *h > 0.0)?;
            let dx = sector.vec2[0] - f64::from(ship.x);
            let dy = sector.vec2[1] - f64::from(ship.y);
            if dx == 0.0 && dy == 0.0 {
                return None;
            }
            let angle = (-dy).atan2(dx);
            Some(Blip {
                x: center + ring * angle.cos(),
                y: center + ring * angle.sin(),
                angle,
                dx,
                dy,
                height,
                ground: echo.ground.clone(),
            })
        })
        .collect()
}

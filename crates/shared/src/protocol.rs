use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{Course, GridVector, PilotAction, Position, Route, Rudder, ShipId, SubmarineId};

/// Full snapshot returned by `GET /state`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    #[serde(default)]
    pub ship: Option<Ship>,
    #[serde(default)]
    pub submarines: Vec<Submarine>,
}

impl WorldState {
    pub fn ship_sector(&self) -> Option<GridVector> {
        self.ship.as_ref().and_then(|ship| ship.sector)
    }

    pub fn contains_submarine(&self, id: &SubmarineId) -> bool {
        self.submarines.iter().any(|sub| &sub.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ship {
    pub id: ShipId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<GridVector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<GridVector>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submarine {
    /// Empty until the submersible has announced itself to the ship.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: SubmarineId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<Position>,
    #[serde(default)]
    pub depth: f64,
    #[serde(default)]
    pub distance: f64,
    #[serde(default, rename = "hasPicture")]
    pub has_picture: bool,
    #[serde(
        default,
        rename = "pictureTimestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub picture_timestamp: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchParams {
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub dx: i32,
    pub dy: i32,
}

impl Default for LaunchParams {
    fn default() -> Self {
        Self {
            name: "Explorer1".into(),
            x: 1,
            y: 1,
            dx: 0,
            dy: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigateRequest {
    pub rudder: Rudder,
    pub course: Course,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PilotRequest {
    /// Absent means "the server's default submersible".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SubmarineId>,
    pub route: Route,
    #[serde(default)]
    pub action: PilotAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillRequest {
    pub id: SubmarineId,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanResponse {
    #[serde(default)]
    pub depth: Option<f64>,
    #[serde(default)]
    pub stddev: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RadarResponse {
    #[serde(default, alias = "echos")]
    pub echoes: Vec<Echo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Echo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<EchoSector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ground: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EchoSector {
    pub vec2: [f64; 2],
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PictureResponse {
    #[serde(default, rename = "hasPicture")]
    pub has_picture: bool,
    /// Base64-encoded image bytes.
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub id: Option<SubmarineId>,
    /// Capture time in epoch milliseconds.
    #[serde(default)]
    pub timestamp: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MeasurementsResponse {
    Submarine {
        submarine_id: SubmarineId,
        count: u64,
        #[serde(default)]
        measurements: Vec<serde_json::Value>,
    },
    Overview {
        #[serde(default)]
        submarines: Vec<MeasurementCount>,
        total_measurements: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementCount {
    pub id: SubmarineId,
    pub measurement_count: u64,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

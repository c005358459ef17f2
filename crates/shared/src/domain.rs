use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

id_newtype!(ShipId);
id_newtype!(SubmarineId);

/// Integer cell coordinate (or direction) on the 10x10 km sector grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridVector {
    pub x: i32,
    pub y: i32,
}

impl GridVector {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for GridVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

macro_rules! wire_enum {
    ($name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                $(
                    if raw.eq_ignore_ascii_case($wire) {
                        return Ok(Self::$variant);
                    }
                )+
                Err(format!("unknown {} '{raw}'", stringify!($name)))
            }
        }
    };
}

wire_enum!(Rudder {
    Left => "Left",
    Center => "Center",
    Right => "Right",
});

wire_enum!(Course {
    Forward => "Forward",
    Backward => "Backward",
});

// Relative to the submersible's heading; `None` keeps it in place.
wire_enum!(Route {
    C => "C",
    N => "N",
    NE => "NE",
    E => "E",
    SE => "SE",
    S => "S",
    SW => "SW",
    W => "W",
    NW => "NW",
    Up => "UP",
    Down => "DOWN",
    None => "None",
});

wire_enum!(PilotAction {
    Move => "",
    TakePhoto => "take_photo",
    Locate => "locate",
});

impl Default for PilotAction {
    fn default() -> Self {
        Self::Move
    }
}

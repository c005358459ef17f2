//! Client-side orchestration for the Ocean Explorer operator console: keeps a
//! local read model of the ship API fresh, turns operator intents into
//! commands and projects sensor data for display.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod gateway;
pub mod keys;
pub mod live_view;
pub mod log_sink;
pub mod radar;
pub mod selection;
pub mod sequencer;
pub mod session;
mod sync;

pub use config::{load_settings, Settings};
pub use dispatcher::PilotIntent;
pub use error::{GatewayError, GatewayResult};
pub use gateway::{HttpGateway, ShipApi};
pub use keys::{Key, KeyInput};
pub use live_view::{FrameImage, LiveViewFrame};
pub use log_sink::{LogEntry, LogSink};
pub use radar::{Blip, RadarDisplay, RadarSnapshot};
pub use sequencer::CaptureTiming;
pub use session::{Session, SessionEvent, SessionOptions};

#[cfg(test)]
#[path = "tests/fake_api.rs"]
pub(crate) mod fake_api;

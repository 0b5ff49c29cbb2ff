pub mod config;
pub mod driver;
pub mod logging;
pub mod protocols;
pub mod thought_parser;

pub use config::{ConfigError, ConfigResult, DelimiterPair, StreamConfig};
pub use driver::{Renderer, drive_stream};
pub use thought_parser::{
    EmissionState, Fragment, SessionId, StreamController, StreamError, StreamSession,
    TransportError,
};

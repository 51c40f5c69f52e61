//! `macrorec` - Record global mouse and keyboard input and replay it
//!
//! A recording session turns device events into an [`ActionLog`] until the
//! stop hotkey is pressed. A playback session replays a log with its original
//! inter-action delays, once, N times, or until the abort hotkey is pressed.
//! Logs are stored as JSON files.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod action;
pub mod capture;
pub mod cli;
pub mod config;
pub mod device;
pub mod error;
pub mod hotkey;
pub mod keysym;
pub mod logging;
#[cfg(feature = "native")]
pub mod native;
pub mod playback;
pub mod session;
pub mod storage;
pub mod timing;

pub use action::{Action, ActionLog, ActionSummary, MouseButton, Point};
pub use capture::{start_recording, stop_recording, RecordingSession};
pub use config::Config;
pub use device::{DeviceError, DeviceEvent, EventKind, EventSource, InputBackend};
pub use error::{Error, Result};
pub use hotkey::{CancelFlag, Hotkeys};
pub use keysym::{KeySym, NamedKey};
pub use logging::init_logging;
pub use playback::{LoopCount, PlaybackEngine, PlaybackHandle, PlaybackReport, PlaybackResult};
pub use session::{Controller, SessionKind};
pub use storage::{load_log, save_log, MacroStore};
pub use timing::compute_delay;

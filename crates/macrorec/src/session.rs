//! Session coordination.
//!
//! A [`Controller`] is the entry point for front-ends: it starts recording
//! and playback sessions against one [`EventSource`] and guarantees, through
//! a [`SessionGate`], that at most one session holds the devices at a time.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;

use tracing::{debug, info};

use crate::action::ActionLog;
use crate::capture::{start_recording, RecordingSession};
use crate::device::{EventSource, InputBackend};
use crate::error::{Error, Result};
use crate::hotkey::{start_monitor, CancelFlag, Hotkeys};
use crate::playback::{LoopCount, PlaybackEngine, PlaybackHandle, PlaybackSession};
use crate::timing::{Sleeper, ThreadSleeper};

const IDLE: u8 = 0;
const RECORDING: u8 = 1;
const PLAYBACK: u8 = 2;

/// The two kinds of session that compete for the input devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKind {
    /// Capturing input into an action log.
    Recording,
    /// Replaying an action log.
    Playback,
}

impl SessionKind {
    fn code(self) -> u8 {
        match self {
            Self::Recording => RECORDING,
            Self::Playback => PLAYBACK,
        }
    }

    fn from_code(code: u8) -> Option<Self> {
        match code {
            RECORDING => Some(Self::Recording),
            PLAYBACK => Some(Self::Playback),
            _ => None,
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recording => write!(f, "recording"),
            Self::Playback => write!(f, "playback"),
        }
    }
}

/// Admits at most one active session at a time.
///
/// Cloning shares the gate.
#[derive(Debug, Clone, Default)]
pub struct SessionGate {
    state: Arc<AtomicU8>,
}

impl SessionGate {
    /// Create an idle gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the gate for a session of the given kind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Busy`] if another session holds the gate.
    pub fn try_acquire(&self, kind: SessionKind) -> Result<SessionGuard> {
        self.state
            .compare_exchange(IDLE, kind.code(), Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|current| Error::Busy {
                requested: kind,
                active: SessionKind::from_code(current).unwrap_or(kind),
            })?;
        debug!(session = %kind, "Session gate acquired");
        Ok(SessionGuard {
            state: Arc::clone(&self.state),
            kind,
        })
    }

    /// The session currently holding the gate, if any.
    #[must_use]
    pub fn active(&self) -> Option<SessionKind> {
        SessionKind::from_code(self.state.load(Ordering::SeqCst))
    }
}

/// Proof of holding a [`SessionGate`]. Dropping it releases the gate.
#[derive(Debug)]
pub struct SessionGuard {
    state: Arc<AtomicU8>,
    kind: SessionKind,
}

impl SessionGuard {
    /// The kind of session holding the gate.
    #[must_use]
    pub fn kind(&self) -> SessionKind {
        self.kind
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.state.store(IDLE, Ordering::SeqCst);
        debug!(session = %self.kind, "Session gate released");
    }
}

/// Starts recording and playback sessions on one event source.
#[derive(Debug)]
pub struct Controller<S> {
    source: Arc<S>,
    hotkeys: Hotkeys,
    gate: SessionGate,
}

impl<S: EventSource> Controller<S> {
    /// Create a controller that owns its event source.
    pub fn new(source: S, hotkeys: Hotkeys) -> Self {
        Self::with_shared_source(Arc::new(source), hotkeys)
    }

    /// Create a controller over a source shared with other code.
    pub fn with_shared_source(source: Arc<S>, hotkeys: Hotkeys) -> Self {
        Self {
            source,
            hotkeys,
            gate: SessionGate::new(),
        }
    }

    /// The event source.
    #[must_use]
    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// The configured hotkeys.
    #[must_use]
    pub fn hotkeys(&self) -> &Hotkeys {
        &self.hotkeys
    }

    /// The session currently active, if any.
    #[must_use]
    pub fn active_session(&self) -> Option<SessionKind> {
        self.gate.active()
    }

    /// Start recording. The session ends when the stop hotkey is pressed or
    /// when it is passed to [`Controller::end_recording`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Busy`] during playback, or an error if the event
    /// source cannot be subscribed to.
    pub fn begin_recording(&self) -> Result<RecordingSession> {
        let guard = self.gate.try_acquire(SessionKind::Recording)?;
        let session = start_recording(self.source.as_ref(), &self.hotkeys)?;
        Ok(session.with_guard(guard))
    }

    /// Finish a recording session and hand over its log (possibly empty).
    pub fn end_recording(&self, session: RecordingSession) -> ActionLog {
        session.stop()
    }

    /// Replay `log` on a background thread with real-time delays.
    ///
    /// The abort hotkey is watched for the duration of the playback.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyLog`] for an empty log, [`Error::Busy`] while
    /// recording, or an error if the hotkey monitor cannot be started.
    pub fn play<B>(&self, log: Arc<ActionLog>, loops: LoopCount, backend: B) -> Result<PlaybackHandle>
    where
        B: InputBackend + 'static,
    {
        self.play_with_sleeper(log, loops, backend, ThreadSleeper)
    }

    /// Like [`Controller::play`], with a custom [`Sleeper`].
    ///
    /// # Errors
    ///
    /// See [`Controller::play`].
    pub fn play_with_sleeper<B, W>(
        &self,
        log: Arc<ActionLog>,
        loops: LoopCount,
        backend: B,
        sleeper: W,
    ) -> Result<PlaybackHandle>
    where
        B: InputBackend + 'static,
        W: Sleeper + 'static,
    {
        if log.is_empty() {
            return Err(Error::EmptyLog);
        }
        let guard = self.gate.try_acquire(SessionKind::Playback)?;
        let cancel = CancelFlag::new();
        let mut session = PlaybackSession::new(log, loops, cancel.clone())?;
        let monitor = start_monitor(
            self.source.as_ref(),
            self.hotkeys.abort_playback.clone(),
            cancel.clone(),
        )?;

        info!(
            actions = session.log().len(),
            loops = %loops,
            abort_key = %self.hotkeys.abort_playback,
            "Starting playback"
        );

        let thread = thread::Builder::new()
            .name("macrorec-playback".to_string())
            .spawn(move || {
                let mut engine = PlaybackEngine::with_sleeper(backend, sleeper);
                let report = engine.run(&mut session);
                monitor.stop();
                drop(guard);
                report
            })?;

        Ok(PlaybackHandle::new(cancel, thread))
    }
}

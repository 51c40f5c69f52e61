//! Event capture for recording sessions.
//!
//! A [`RecordingSession`] subscribes to an [`EventSource`] and hands the
//! receiving end to a consumer thread, which is the only writer of the
//! session's [`ActionLog`]. The log is handed back when the session stops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, select, Receiver, RecvTimeoutError, Sender};
use tracing::{debug, info, trace, warn};

use crate::action::{Action, ActionLog};
use crate::device::{DeviceEvent, EventKind, EventSource};
use crate::error::Result;
use crate::hotkey::Hotkeys;
use crate::keysym::KeySym;
use crate::session::SessionGuard;

/// Decides which device events become actions.
///
/// A press of the stop key ends the session. Releases of the stop key and of
/// the abort key are dropped; every other event is recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturePolicy {
    stop_key: KeySym,
    abort_key: KeySym,
}

/// What the consumer should do with one event.
#[derive(Debug, Clone, PartialEq)]
pub enum Captured {
    /// Append this action.
    Record(Action),
    /// Drop the event.
    Skip,
    /// The stop key was pressed.
    Stop,
}

impl CapturePolicy {
    /// Build a policy from the configured hotkeys.
    #[must_use]
    pub fn new(hotkeys: &Hotkeys) -> Self {
        Self {
            stop_key: hotkeys.stop_recording.clone(),
            abort_key: hotkeys.abort_playback.clone(),
        }
    }

    /// Classify a device event.
    #[must_use]
    pub fn classify(&self, event: DeviceEvent) -> Captured {
        let t = event.time;
        let action = match event.kind {
            EventKind::Move { pos } => Action::Move { pos, t },
            EventKind::Button {
                pos,
                button,
                pressed,
            } => Action::Click {
                pos,
                button,
                pressed,
                t,
            },
            EventKind::Scroll { pos, dx, dy } => Action::Scroll { pos, dx, dy, t },
            EventKind::Key { key, pressed: true } => {
                if key == self.stop_key {
                    return Captured::Stop;
                }
                Action::KeyPress { key, t }
            }
            EventKind::Key { key, pressed: false } => {
                if key == self.stop_key || key == self.abort_key {
                    return Captured::Skip;
                }
                Action::KeyRelease { key, t }
            }
        };
        Captured::Record(action)
    }
}

/// An in-progress recording.
///
/// Dropping the session discards whatever was captured.
#[derive(Debug)]
pub struct RecordingSession {
    active: Arc<AtomicBool>,
    stopped: Receiver<()>,
    shutdown: Option<Sender<()>>,
    consumer: Option<JoinHandle<ActionLog>>,
    guard: Option<SessionGuard>,
}

/// Start recording every event delivered by `source`.
///
/// # Errors
///
/// Returns an error if the source cannot be subscribed to or the consumer
/// thread cannot be spawned.
pub fn start_recording<S: EventSource + ?Sized>(
    source: &S,
    hotkeys: &Hotkeys,
) -> Result<RecordingSession> {
    let events = source.subscribe()?;
    let policy = CapturePolicy::new(hotkeys);
    let active = Arc::new(AtomicBool::new(true));
    let (stopped_tx, stopped_rx) = bounded::<()>(1);
    let (shutdown_tx, shutdown_rx) = bounded::<()>(0);

    let consumer = {
        let active = Arc::clone(&active);
        thread::Builder::new()
            .name("macrorec-capture".to_string())
            .spawn(move || consume(&events, &shutdown_rx, &policy, &active, &stopped_tx))?
    };

    info!(
        source = source.name(),
        stop_key = %hotkeys.stop_recording,
        "Recording started"
    );
    Ok(RecordingSession {
        active,
        stopped: stopped_rx,
        shutdown: Some(shutdown_tx),
        consumer: Some(consumer),
        guard: None,
    })
}

/// Finish a recording session and return what it captured.
#[must_use]
pub fn stop_recording(session: RecordingSession) -> ActionLog {
    session.stop()
}

fn consume(
    events: &Receiver<DeviceEvent>,
    shutdown: &Receiver<()>,
    policy: &CapturePolicy,
    active: &AtomicBool,
    stopped: &Sender<()>,
) -> ActionLog {
    let mut log = ActionLog::new();

    // Returns false once the stop key has been seen.
    let handle = |event: DeviceEvent, log: &mut ActionLog| match policy.classify(event) {
        Captured::Record(action) => {
            trace!(kind = action.kind(), t = action.time(), "Captured action");
            log.push(action);
            true
        }
        Captured::Skip => true,
        Captured::Stop => {
            info!("Stop hotkey pressed");
            active.store(false, Ordering::SeqCst);
            let _ = stopped.try_send(());
            false
        }
    };

    loop {
        select! {
            recv(events) -> event => match event {
                Ok(event) => {
                    if !handle(event, &mut log) {
                        break;
                    }
                }
                Err(_) => {
                    warn!("Device event source closed during recording");
                    break;
                }
            },
            recv(shutdown) -> _ => {
                // Keep what was already delivered before the stop request.
                for event in events.try_iter() {
                    if !handle(event, &mut log) {
                        break;
                    }
                }
                break;
            }
        }
    }

    active.store(false, Ordering::SeqCst);
    debug!(actions = log.len(), "Capture consumer finished");
    log
}

impl RecordingSession {
    pub(crate) fn with_guard(mut self, guard: SessionGuard) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Check if the session is still capturing events.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Wait up to `timeout` for the session to end on its own (stop hotkey or
    /// source closed). Returns `true` if it has ended.
    #[must_use]
    pub fn wait_for_stop(&self, timeout: Duration) -> bool {
        match self.stopped.recv_timeout(timeout) {
            Ok(()) => true,
            // The consumer clears `active` before its sender is dropped.
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => !self.is_active(),
        }
    }

    /// Block until the session ends on its own.
    pub fn wait(&self) {
        while !self.wait_for_stop(Duration::from_millis(100)) {}
    }

    /// Stop capturing and return the log, which may be empty.
    #[must_use]
    pub fn stop(mut self) -> ActionLog {
        let log = self.shutdown_and_join();
        info!(actions = log.len(), "Recording stopped");
        log
    }

    fn shutdown_and_join(&mut self) -> ActionLog {
        self.shutdown.take();
        let log = self
            .consumer
            .take()
            .map(|consumer| {
                consumer.join().unwrap_or_else(|_| {
                    warn!("Capture consumer panicked; recording is lost");
                    ActionLog::new()
                })
            })
            .unwrap_or_default();
        self.active.store(false, Ordering::SeqCst);
        self.guard.take();
        log
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        if self.consumer.is_some() {
            let discarded = self.shutdown_and_join();
            debug!(actions = discarded.len(), "Recording session dropped");
        }
    }
}

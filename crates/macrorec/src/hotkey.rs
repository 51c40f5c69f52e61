//! Hotkeys and the abort-playback monitor.
//!
//! During playback a [`MonitorHandle`] owns a listener thread that watches
//! the device stream for the abort key and raises a shared [`CancelFlag`].
//! The playback thread only ever reads the flag, so neither side blocks the
//! other.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, select, Receiver, Sender};
use tracing::{debug, info};

use crate::device::{DeviceEvent, EventSource};
use crate::error::Result;
use crate::keysym::{KeySym, NamedKey};

/// The control keys intercepted by sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hotkeys {
    /// Ends a recording session. Never recorded.
    pub stop_recording: KeySym,
    /// Aborts a playback session.
    pub abort_playback: KeySym,
}

impl Default for Hotkeys {
    fn default() -> Self {
        Self {
            stop_recording: KeySym::Named(NamedKey::Function(8)),
            abort_playback: KeySym::Named(NamedKey::Function(9)),
        }
    }
}

/// A cancellation signal shared between a playback and its monitor.
///
/// Cloning shares the flag. Once raised it stays raised.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create a lowered flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag. Returns `true` only for the call that raised it.
    pub fn raise(&self) -> bool {
        !self.0.swap(true, Ordering::SeqCst)
    }

    /// Check if the flag has been raised.
    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A handle to a running abort-key monitor.
///
/// Stopping or dropping the handle ends the listener thread.
#[derive(Debug)]
pub struct MonitorHandle {
    cancel: CancelFlag,
    shutdown: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

/// Start watching `source` for presses of `abort_key`.
///
/// The first press raises `cancel` and ends the listener; later presses are
/// never observed.
///
/// # Errors
///
/// Returns an error if the source cannot be subscribed to or the listener
/// thread cannot be spawned.
pub fn start_monitor<S: EventSource + ?Sized>(
    source: &S,
    abort_key: KeySym,
    cancel: CancelFlag,
) -> Result<MonitorHandle> {
    let events = source.subscribe()?;
    let (shutdown_tx, shutdown_rx) = bounded::<()>(0);
    let flag = cancel.clone();

    let thread = thread::Builder::new()
        .name("macrorec-hotkey".to_string())
        .spawn(move || watch(&events, &shutdown_rx, &abort_key, &flag))?;

    debug!(source = source.name(), "Hotkey monitor started");
    Ok(MonitorHandle {
        cancel,
        shutdown: Some(shutdown_tx),
        thread: Some(thread),
    })
}

fn watch(
    events: &Receiver<DeviceEvent>,
    shutdown: &Receiver<()>,
    abort_key: &KeySym,
    cancel: &CancelFlag,
) {
    loop {
        select! {
            recv(events) -> event => match event {
                Ok(event) if event.is_press_of(abort_key) => {
                    if cancel.raise() {
                        info!(key = %abort_key, "Abort hotkey pressed, cancelling playback");
                    }
                    break;
                }
                Ok(_) => {}
                Err(_) => {
                    debug!("Device event source closed, hotkey monitor exiting");
                    break;
                }
            },
            recv(shutdown) -> _ => break,
        }
    }
}

impl MonitorHandle {
    /// The flag this monitor raises.
    #[must_use]
    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    /// Check if the listener thread is still running.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the listener and wait for its thread to exit.
    pub fn stop(mut self) {
        self.shutdown_and_join();
    }

    fn shutdown_and_join(&mut self) {
        // Dropping the sender disconnects the shutdown channel.
        self.shutdown.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
            debug!("Hotkey monitor stopped");
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}

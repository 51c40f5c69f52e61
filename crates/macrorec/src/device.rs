//! Platform-agnostic device abstraction.
//!
//! Raw input arrives from an [`EventSource`] as a stream of [`DeviceEvent`]s
//! over a channel, and replayed actions leave through an [`InputBackend`].
//! Platform implementations live in the `native` module; the in-memory
//! implementations here drive sessions programmatically and in tests.

use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::trace;

use crate::action::{MouseButton, Point};
use crate::error::Result;
use crate::keysym::KeySym;
use crate::timing::now_secs;

/// Errors that can occur in the device layer.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The global input listener could not be started.
    #[error("failed to start input listener: {0}")]
    ListenFailed(String),

    /// The input injection backend could not be created.
    #[error("failed to open input backend: {0}")]
    BackendUnavailable(String),

    /// Permission required to read or inject input.
    #[error("permission required: {0}")]
    PermissionRequired(String),

    /// This build has no native input support.
    #[error("native input support is not compiled in (rebuild with --features native)")]
    Unsupported,
}

/// What happened on an input device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// The pointer moved.
    Move {
        /// New pointer position.
        pos: Point,
    },
    /// A mouse button changed state.
    Button {
        /// Pointer position.
        pos: Point,
        /// The button.
        button: MouseButton,
        /// `true` for press, `false` for release.
        pressed: bool,
    },
    /// The wheel scrolled.
    Scroll {
        /// Pointer position.
        pos: Point,
        /// Horizontal delta.
        dx: i32,
        /// Vertical delta (positive is up).
        dy: i32,
    },
    /// A key changed state.
    Key {
        /// The key.
        key: KeySym,
        /// `true` for press, `false` for release.
        pressed: bool,
    },
}

/// A device event as delivered by a listener, stamped at delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceEvent {
    /// Delivery time in seconds since the Unix epoch.
    pub time: f64,
    /// The event itself.
    pub kind: EventKind,
}

impl DeviceEvent {
    /// Create an event with an explicit timestamp.
    #[must_use]
    pub fn at(time: f64, kind: EventKind) -> Self {
        Self { time, kind }
    }

    /// Create an event stamped with the current time.
    #[must_use]
    pub fn now(kind: EventKind) -> Self {
        Self::at(now_secs(), kind)
    }

    /// Check if this is a press of the given key.
    #[must_use]
    pub fn is_press_of(&self, target: &KeySym) -> bool {
        matches!(&self.kind, EventKind::Key { key, pressed: true } if key == target)
    }
}

/// A source of global device events.
///
/// Every subscriber receives every event delivered after it subscribed, in
/// delivery order. Dropping the receiver unsubscribes.
pub trait EventSource: Send + Sync {
    /// The name of this source (for logging/debugging).
    fn name(&self) -> &'static str;

    /// Subscribe to device events.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying listener cannot be started.
    fn subscribe(&self) -> Result<Receiver<DeviceEvent>>;
}

impl<S: EventSource + ?Sized> EventSource for Arc<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn subscribe(&self) -> Result<Receiver<DeviceEvent>> {
        (**self).subscribe()
    }
}

/// Fan-out of one event stream to any number of channel subscribers.
#[derive(Debug, Default)]
pub(crate) struct Fanout {
    subscribers: Mutex<Vec<Sender<DeviceEvent>>>,
}

impl Fanout {
    pub(crate) fn subscribe(&self) -> Receiver<DeviceEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Deliver an event to every live subscriber, pruning closed ones.
    pub(crate) fn publish(&self, event: &DeviceEvent) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        trace!(subscribers = subscribers.len(), kind = ?event.kind, "Published device event");
    }

    pub(crate) fn len(&self) -> usize {
        self.subscribers.lock().len()
    }
}

/// An in-memory [`EventSource`] fed by [`ScriptedSource::emit`].
#[derive(Debug, Default)]
pub struct ScriptedSource {
    fanout: Fanout,
}

impl ScriptedSource {
    /// Create a new scripted source with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an event to all current subscribers.
    pub fn emit(&self, event: DeviceEvent) {
        self.fanout.publish(&event);
    }

    /// Deliver a key press followed by its release, stamped now.
    pub fn tap(&self, key: &KeySym) {
        for pressed in [true, false] {
            self.emit(DeviceEvent::now(EventKind::Key {
                key: key.clone(),
                pressed,
            }));
        }
    }

    /// Number of subscribers that were live at the last delivery.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.fanout.len()
    }
}

impl EventSource for ScriptedSource {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn subscribe(&self) -> Result<Receiver<DeviceEvent>> {
        Ok(self.fanout.subscribe())
    }
}

/// Injects input onto the live devices.
pub trait InputBackend: Send {
    /// Move the pointer to an absolute position.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot inject the event.
    fn move_to(&mut self, pos: Point) -> Result<()>;

    /// Press or release a mouse button at the current pointer position.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot inject the event.
    fn button(&mut self, button: MouseButton, pressed: bool) -> Result<()>;

    /// Scroll by the given deltas (positive `dy` is up).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot inject the event.
    fn scroll(&mut self, dx: i32, dy: i32) -> Result<()>;

    /// Press or release a key.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot inject the event.
    fn key(&mut self, key: &KeySym, pressed: bool) -> Result<()>;

    /// Type a string of text.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot inject the event.
    fn text(&mut self, text: &str) -> Result<()>;
}

impl<B: InputBackend + ?Sized> InputBackend for Box<B> {
    fn move_to(&mut self, pos: Point) -> Result<()> {
        (**self).move_to(pos)
    }

    fn button(&mut self, button: MouseButton, pressed: bool) -> Result<()> {
        (**self).button(button, pressed)
    }

    fn scroll(&mut self, dx: i32, dy: i32) -> Result<()> {
        (**self).scroll(dx, dy)
    }

    fn key(&mut self, key: &KeySym, pressed: bool) -> Result<()> {
        (**self).key(key, pressed)
    }

    fn text(&mut self, text: &str) -> Result<()> {
        (**self).text(text)
    }
}

/// One call made on a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Injected {
    /// `move_to`
    Move(Point),
    /// `button`
    Button(MouseButton, bool),
    /// `scroll`
    Scroll(i32, i32),
    /// `key`
    Key(KeySym, bool),
    /// `text`
    Text(String),
}

/// An [`InputBackend`] that records what it was asked to inject.
///
/// Clones share the same record, so a clone kept by the caller observes
/// injections made on another thread.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    injected: Arc<Mutex<Vec<Injected>>>,
}

impl RecordingBackend {
    /// Create a new backend with an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything injected so far, in order.
    #[must_use]
    pub fn injected(&self) -> Vec<Injected> {
        self.injected.lock().clone()
    }

    /// Number of injections so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.injected.lock().len()
    }

    fn record(&self, injected: Injected) {
        self.injected.lock().push(injected);
    }
}

impl InputBackend for RecordingBackend {
    fn move_to(&mut self, pos: Point) -> Result<()> {
        self.record(Injected::Move(pos));
        Ok(())
    }

    fn button(&mut self, button: MouseButton, pressed: bool) -> Result<()> {
        self.record(Injected::Button(button, pressed));
        Ok(())
    }

    fn scroll(&mut self, dx: i32, dy: i32) -> Result<()> {
        self.record(Injected::Scroll(dx, dy));
        Ok(())
    }

    fn key(&mut self, key: &KeySym, pressed: bool) -> Result<()> {
        self.record(Injected::Key(key.clone(), pressed));
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<()> {
        self.record(Injected::Text(text.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keysym::NamedKey;

    fn key_event(key: KeySym, pressed: bool) -> DeviceEvent {
        DeviceEvent::at(1.0, EventKind::Key { key, pressed })
    }

    #[test]
    fn test_device_error_display() {
        assert!(DeviceError::ListenFailed("x".to_string())
            .to_string()
            .contains("listener"));
        assert!(DeviceError::BackendUnavailable("x".to_string())
            .to_string()
            .contains("backend"));
        assert!(DeviceError::PermissionRequired("x".to_string())
            .to_string()
            .contains("permission"));
        assert!(DeviceError::Unsupported.to_string().contains("native"));
    }

    #[test]
    fn test_is_press_of() {
        let f9 = KeySym::Named(NamedKey::Function(9));
        assert!(key_event(f9.clone(), true).is_press_of(&f9));
        assert!(!key_event(f9.clone(), false).is_press_of(&f9));
        assert!(!key_event(KeySym::Char('a'), true).is_press_of(&f9));
    }

    #[test]
    fn test_scripted_source_delivers_in_order() {
        let source = ScriptedSource::new();
        let rx = source.subscribe().unwrap();

        for x in 0..5 {
            source.emit(DeviceEvent::at(
                f64::from(x),
                EventKind::Move {
                    pos: Point::new(x, 0),
                },
            ));
        }

        let received: Vec<_> = rx.try_iter().map(|e| e.time).collect();
        assert_eq!(received, [0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_scripted_source_fans_out() {
        let source = ScriptedSource::new();
        let a = source.subscribe().unwrap();
        let b = source.subscribe().unwrap();

        source.tap(&KeySym::Char('x'));

        assert_eq!(a.try_iter().count(), 2);
        assert_eq!(b.try_iter().count(), 2);
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let source = ScriptedSource::new();
        let keep = source.subscribe().unwrap();
        let gone = source.subscribe().unwrap();
        assert_eq!(source.subscriber_count(), 2);

        drop(gone);
        source.tap(&KeySym::Char('x'));

        assert_eq!(source.subscriber_count(), 1);
        assert_eq!(keep.try_iter().count(), 2);
    }

    #[test]
    fn test_late_subscriber_misses_earlier_events() {
        let source = ScriptedSource::new();
        source.tap(&KeySym::Char('x'));
        let rx = source.subscribe().unwrap();
        assert_eq!(rx.try_iter().count(), 0);
    }

    #[test]
    fn test_recording_backend_shares_record() {
        let backend = RecordingBackend::new();
        let mut moved = backend.clone();

        moved.move_to(Point::new(1, 2)).unwrap();
        moved.button(MouseButton::Left, true).unwrap();
        moved.scroll(0, -2).unwrap();
        moved.key(&KeySym::Char('a'), true).unwrap();
        moved.text("hello").unwrap();

        assert_eq!(backend.count(), 5);
        assert_eq!(
            backend.injected(),
            vec![
                Injected::Move(Point::new(1, 2)),
                Injected::Button(MouseButton::Left, true),
                Injected::Scroll(0, -2),
                Injected::Key(KeySym::Char('a'), true),
                Injected::Text("hello".to_string()),
            ]
        );
    }
}

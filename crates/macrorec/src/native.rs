//! Native input devices: global hooks through rdev, injection through enigo.
//!
//! rdev can only run one listener per process and never returns once it is
//! listening, so [`RdevSource::global`] starts a single listener thread on
//! first use and every session subscribes to its fan-out.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError};
use enigo::{Axis, Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::action::{MouseButton, Point};
use crate::device::{DeviceError, DeviceEvent, EventKind, EventSource, Fanout, InputBackend};
use crate::error::{Error, Result};
use crate::keysym::{KeySym, NamedKey};

/// How long to wait for rdev to report a startup failure.
const LISTEN_STARTUP_GRACE: Duration = Duration::from_millis(250);

static GLOBAL_SOURCE: Mutex<Option<Arc<RdevSource>>> = parking_lot::const_mutex(None);

/// Global device events from the operating system.
#[derive(Debug)]
pub struct RdevSource {
    fanout: Arc<Fanout>,
}

impl RdevSource {
    /// The process-wide source, starting the listener on first use.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::ListenFailed`] if the operating system refuses
    /// the global hook (no display, missing accessibility permission).
    pub fn global() -> Result<Arc<Self>> {
        let mut global = GLOBAL_SOURCE.lock();
        if let Some(source) = global.as_ref() {
            return Ok(Arc::clone(source));
        }
        let source = Arc::new(Self::start()?);
        *global = Some(Arc::clone(&source));
        Ok(source)
    }

    fn start() -> Result<Self> {
        let fanout = Arc::new(Fanout::default());
        let (failed_tx, failed_rx) = bounded::<String>(1);

        let mut translator = Translator::default();
        let sink = Arc::clone(&fanout);
        thread::Builder::new()
            .name("macrorec-rdev".to_string())
            .spawn(move || {
                let result = rdev::listen(move |event| {
                    if let Some(kind) = translator.translate(&event) {
                        sink.publish(&DeviceEvent::now(kind));
                    }
                });
                if let Err(e) = result {
                    error!(error = ?e, "Global input listener failed");
                    let _ = failed_tx.send(format!("{e:?}"));
                }
            })?;

        match failed_rx.recv_timeout(LISTEN_STARTUP_GRACE) {
            Ok(reason) => Err(DeviceError::ListenFailed(reason).into()),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
                info!("Global input listener started");
                Ok(Self { fanout })
            }
        }
    }
}

impl EventSource for RdevSource {
    fn name(&self) -> &'static str {
        "rdev"
    }

    fn subscribe(&self) -> Result<crossbeam_channel::Receiver<DeviceEvent>> {
        Ok(self.fanout.subscribe())
    }
}

/// Converts rdev events, tracking the pointer and which symbol each held key
/// was recorded as so its release matches.
#[derive(Default)]
struct Translator {
    pointer: Point,
    held: Vec<(rdev::Key, KeySym)>,
}

impl Translator {
    fn translate(&mut self, event: &rdev::Event) -> Option<EventKind> {
        use rdev::EventType;

        let kind = match event.event_type {
            EventType::MouseMove { x, y } => {
                self.pointer = Point::from((x, y));
                EventKind::Move { pos: self.pointer }
            }
            EventType::ButtonPress(button) => EventKind::Button {
                pos: self.pointer,
                button: mouse_button(button),
                pressed: true,
            },
            EventType::ButtonRelease(button) => EventKind::Button {
                pos: self.pointer,
                button: mouse_button(button),
                pressed: false,
            },
            EventType::Wheel { delta_x, delta_y } => EventKind::Scroll {
                pos: self.pointer,
                dx: saturate(delta_x),
                dy: saturate(delta_y),
            },
            EventType::KeyPress(key) => {
                let sym = key_sym(key, event.name.as_deref());
                // Auto-repeat delivers presses without releases.
                if !self.held.iter().any(|(k, _)| *k == key) {
                    self.held.push((key, sym.clone()));
                }
                EventKind::Key {
                    key: sym,
                    pressed: true,
                }
            }
            EventType::KeyRelease(key) => {
                let sym = match self.held.iter().position(|(k, _)| *k == key) {
                    Some(index) => self.held.swap_remove(index).1,
                    None => key_sym(key, None),
                };
                EventKind::Key {
                    key: sym,
                    pressed: false,
                }
            }
        };
        Some(kind)
    }
}

fn saturate(delta: i64) -> i32 {
    i32::try_from(delta).unwrap_or(if delta < 0 { i32::MIN } else { i32::MAX })
}

fn mouse_button(button: rdev::Button) -> MouseButton {
    match button {
        rdev::Button::Left => MouseButton::Left,
        rdev::Button::Right => MouseButton::Right,
        _ => MouseButton::Middle,
    }
}

/// The layout's printable name wins; with a modifier held (Ctrl+C reports
/// `"\u{3}"`) or no name at all, the physical key's unshifted character is
/// used so the shortcut replays.
fn key_sym(key: rdev::Key, name: Option<&str>) -> KeySym {
    if let Some(named) = named_key(key) {
        return KeySym::Named(named);
    }
    let mut chars = name.unwrap_or_default().chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if !c.is_control() {
            return KeySym::Char(c);
        }
    }
    if let Some(c) = char_key(key) {
        return KeySym::Char(c);
    }
    match key {
        rdev::Key::Unknown(code) => KeySym::Literal(format!("<{code}>")),
        other => KeySym::Literal(format!("<{other:?}>")),
    }
}

/// US-layout character of a printable physical key.
fn char_key(key: rdev::Key) -> Option<char> {
    use rdev::Key as K;

    let c = match key {
        K::KeyA => 'a',
        K::KeyB => 'b',
        K::KeyC => 'c',
        K::KeyD => 'd',
        K::KeyE => 'e',
        K::KeyF => 'f',
        K::KeyG => 'g',
        K::KeyH => 'h',
        K::KeyI => 'i',
        K::KeyJ => 'j',
        K::KeyK => 'k',
        K::KeyL => 'l',
        K::KeyM => 'm',
        K::KeyN => 'n',
        K::KeyO => 'o',
        K::KeyP => 'p',
        K::KeyQ => 'q',
        K::KeyR => 'r',
        K::KeyS => 's',
        K::KeyT => 't',
        K::KeyU => 'u',
        K::KeyV => 'v',
        K::KeyW => 'w',
        K::KeyX => 'x',
        K::KeyY => 'y',
        K::KeyZ => 'z',
        K::Num0 | K::Kp0 => '0',
        K::Num1 | K::Kp1 => '1',
        K::Num2 | K::Kp2 => '2',
        K::Num3 | K::Kp3 => '3',
        K::Num4 | K::Kp4 => '4',
        K::Num5 | K::Kp5 => '5',
        K::Num6 | K::Kp6 => '6',
        K::Num7 | K::Kp7 => '7',
        K::Num8 | K::Kp8 => '8',
        K::Num9 | K::Kp9 => '9',
        K::Minus | K::KpMinus => '-',
        K::KpPlus => '+',
        K::KpMultiply => '*',
        K::Slash | K::KpDivide => '/',
        K::Equal => '=',
        K::LeftBracket => '[',
        K::RightBracket => ']',
        K::SemiColon => ';',
        K::Quote => '\'',
        K::BackQuote => '`',
        K::BackSlash | K::IntlBackslash => '\\',
        K::Comma => ',',
        K::Dot => '.',
        _ => return None,
    };
    Some(c)
}

fn named_key(key: rdev::Key) -> Option<NamedKey> {
    use rdev::Key as K;

    let named = match key {
        K::Alt => NamedKey::AltLeft,
        K::AltGr => NamedKey::AltGr,
        K::Backspace => NamedKey::Backspace,
        K::CapsLock => NamedKey::CapsLock,
        K::ControlLeft => NamedKey::CtrlLeft,
        K::ControlRight => NamedKey::CtrlRight,
        K::Delete | K::KpDelete => NamedKey::Delete,
        K::DownArrow => NamedKey::Down,
        K::End => NamedKey::End,
        K::Escape => NamedKey::Esc,
        K::F1 => NamedKey::Function(1),
        K::F2 => NamedKey::Function(2),
        K::F3 => NamedKey::Function(3),
        K::F4 => NamedKey::Function(4),
        K::F5 => NamedKey::Function(5),
        K::F6 => NamedKey::Function(6),
        K::F7 => NamedKey::Function(7),
        K::F8 => NamedKey::Function(8),
        K::F9 => NamedKey::Function(9),
        K::F10 => NamedKey::Function(10),
        K::F11 => NamedKey::Function(11),
        K::F12 => NamedKey::Function(12),
        K::Home => NamedKey::Home,
        K::Insert => NamedKey::Insert,
        K::LeftArrow => NamedKey::Left,
        K::MetaLeft => NamedKey::CmdLeft,
        K::MetaRight => NamedKey::CmdRight,
        K::NumLock => NamedKey::NumLock,
        K::PageDown => NamedKey::PageDown,
        K::PageUp => NamedKey::PageUp,
        K::Pause => NamedKey::Pause,
        K::PrintScreen => NamedKey::PrintScreen,
        K::Return | K::KpReturn => NamedKey::Enter,
        K::RightArrow => NamedKey::Right,
        K::ScrollLock => NamedKey::ScrollLock,
        K::ShiftLeft => NamedKey::ShiftLeft,
        K::ShiftRight => NamedKey::ShiftRight,
        K::Space => NamedKey::Space,
        K::Tab => NamedKey::Tab,
        K::UpArrow => NamedKey::Up,
        _ => return None,
    };
    Some(named)
}

/// Injects input through enigo.
pub struct EnigoBackend {
    enigo: Enigo,
}

impl std::fmt::Debug for EnigoBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnigoBackend").finish_non_exhaustive()
    }
}

impl EnigoBackend {
    /// Connect to the platform's input system.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::BackendUnavailable`] if the connection fails.
    pub fn new() -> Result<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| DeviceError::BackendUnavailable(e.to_string()))?;
        debug!("Input backend ready");
        Ok(Self { enigo })
    }
}

impl InputBackend for EnigoBackend {
    fn move_to(&mut self, pos: Point) -> Result<()> {
        self.enigo
            .move_mouse(pos.x, pos.y, Coordinate::Abs)
            .map_err(|e| Error::injection("move", e.to_string()))
    }

    fn button(&mut self, button: MouseButton, pressed: bool) -> Result<()> {
        let button = match button {
            MouseButton::Left => Button::Left,
            MouseButton::Right => Button::Right,
            MouseButton::Middle => Button::Middle,
        };
        self.enigo
            .button(button, direction(pressed))
            .map_err(|e| Error::injection("click", e.to_string()))
    }

    fn scroll(&mut self, dx: i32, dy: i32) -> Result<()> {
        // enigo scrolls down for positive lengths.
        if dy != 0 {
            self.enigo
                .scroll(-dy, Axis::Vertical)
                .map_err(|e| Error::injection("scroll", e.to_string()))?;
        }
        if dx != 0 {
            self.enigo
                .scroll(dx, Axis::Horizontal)
                .map_err(|e| Error::injection("scroll", e.to_string()))?;
        }
        Ok(())
    }

    fn key(&mut self, key: &KeySym, pressed: bool) -> Result<()> {
        let Some(target) = enigo_key(key) else {
            warn!(key = %key, "No injectable key for symbol, skipping");
            return Ok(());
        };
        self.enigo
            .key(target, direction(pressed))
            .map_err(|e| Error::injection("key", e.to_string()))
    }

    fn text(&mut self, text: &str) -> Result<()> {
        self.enigo
            .text(text)
            .map_err(|e| Error::injection("text", e.to_string()))
    }
}

fn direction(pressed: bool) -> Direction {
    if pressed {
        Direction::Press
    } else {
        Direction::Release
    }
}

fn enigo_key(key: &KeySym) -> Option<Key> {
    let named = match key {
        KeySym::Char(c) => return Some(Key::Unicode(*c)),
        KeySym::Literal(_) => return None,
        KeySym::Named(named) => *named,
    };

    let key = match named {
        NamedKey::Alt | NamedKey::AltLeft | NamedKey::AltRight | NamedKey::AltGr => Key::Alt,
        NamedKey::Backspace => Key::Backspace,
        NamedKey::CapsLock => Key::CapsLock,
        NamedKey::Cmd | NamedKey::CmdLeft | NamedKey::CmdRight => Key::Meta,
        NamedKey::Ctrl | NamedKey::CtrlLeft | NamedKey::CtrlRight => Key::Control,
        NamedKey::Delete => Key::Delete,
        NamedKey::Down => Key::DownArrow,
        NamedKey::End => Key::End,
        NamedKey::Enter => Key::Return,
        NamedKey::Esc => Key::Escape,
        NamedKey::Function(n) => function_key(n)?,
        NamedKey::Home => Key::Home,
        NamedKey::Left => Key::LeftArrow,
        NamedKey::PageDown => Key::PageDown,
        NamedKey::PageUp => Key::PageUp,
        NamedKey::Right => Key::RightArrow,
        NamedKey::Shift | NamedKey::ShiftLeft | NamedKey::ShiftRight => Key::Shift,
        NamedKey::Space => Key::Space,
        NamedKey::Tab => Key::Tab,
        NamedKey::Up => Key::UpArrow,
        _ => return None,
    };
    Some(key)
}

fn function_key(n: u8) -> Option<Key> {
    Some(match n {
        1 => Key::F1,
        2 => Key::F2,
        3 => Key::F3,
        4 => Key::F4,
        5 => Key::F5,
        6 => Key::F6,
        7 => Key::F7,
        8 => Key::F8,
        9 => Key::F9,
        10 => Key::F10,
        11 => Key::F11,
        12 => Key::F12,
        13 => Key::F13,
        14 => Key::F14,
        15 => Key::F15,
        16 => Key::F16,
        17 => Key::F17,
        18 => Key::F18,
        19 => Key::F19,
        20 => Key::F20,
        _ => return None,
    })
}

//! Core action types for macrorec.
//!
//! This module defines the data structures for a recorded macro: individual
//! input [`Action`]s and the ordered [`ActionLog`] that is persisted and
//! replayed.

use std::fmt;

use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::keysym::KeySym;

/// An absolute screen position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(i32, i32)")]
pub struct Point {
    /// Horizontal coordinate in pixels.
    pub x: i32,
    /// Vertical coordinate in pixels.
    pub y: i32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

// Some recorders write fractional coordinates; they are rounded to pixels.
#[allow(clippy::cast_possible_truncation)]
impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self {
            x: x.round() as i32,
            y: y.round() as i32,
        }
    }
}

impl From<Point> for (i32, i32) {
    fn from(p: Point) -> Self {
        (p.x, p.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A mouse button.
///
/// Stored as `"Button.left"`, `"Button.right"` or `"Button.middle"`. When
/// reading, the label is matched case-insensitively against `left` and then
/// `right`; every other label, `middle` included, is [`MouseButton::Middle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MouseButton {
    /// The primary button.
    Left,
    /// The secondary button.
    Right,
    /// The middle button, and the fallback for unrecognized labels.
    Middle,
}

impl MouseButton {
    /// Map a stored button label to a button.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let label = label.to_lowercase();
        if label.contains("left") {
            Self::Left
        } else if label.contains("right") {
            Self::Right
        } else {
            Self::Middle
        }
    }

    /// The label written to macro files.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Left => "Button.left",
            Self::Right => "Button.right",
            Self::Middle => "Button.middle",
        }
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
            Self::Middle => write!(f, "middle"),
        }
    }
}

impl From<String> for MouseButton {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl From<MouseButton> for String {
    fn from(button: MouseButton) -> Self {
        button.label().to_string()
    }
}

/// A single captured input event.
///
/// `t` is the capture time in seconds since the Unix epoch and is stored
/// under the `time` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// The pointer moved to an absolute position.
    Move {
        /// New pointer position.
        pos: Point,
        /// Capture time.
        #[serde(rename = "time", serialize_with = "finite_time")]
        t: f64,
    },
    /// A mouse button was pressed or released.
    Click {
        /// Pointer position at the time of the click.
        pos: Point,
        /// The button involved.
        button: MouseButton,
        /// `true` for press, `false` for release.
        pressed: bool,
        /// Capture time.
        #[serde(rename = "time", serialize_with = "finite_time")]
        t: f64,
    },
    /// The wheel scrolled.
    Scroll {
        /// Pointer position at the time of the scroll.
        pos: Point,
        /// Horizontal delta.
        #[serde(default, deserialize_with = "lenient_int")]
        dx: i32,
        /// Vertical delta (positive is up).
        #[serde(default, deserialize_with = "lenient_int")]
        dy: i32,
        /// Capture time.
        #[serde(rename = "time", serialize_with = "finite_time")]
        t: f64,
    },
    /// A key was pressed.
    KeyPress {
        /// The key.
        key: KeySym,
        /// Capture time.
        #[serde(rename = "time", serialize_with = "finite_time")]
        t: f64,
    },
    /// A key was released.
    KeyRelease {
        /// The key.
        key: KeySym,
        /// Capture time.
        #[serde(rename = "time", serialize_with = "finite_time")]
        t: f64,
    },
}

#[allow(clippy::cast_possible_truncation)]
fn lenient_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    let value = f64::deserialize(deserializer)?;
    Ok(value.round() as i32)
}

// JSON has no spelling for NaN or infinity; serde_json would write `null`.
#[allow(clippy::trivially_copy_pass_by_ref)]
fn finite_time<S: Serializer>(t: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if !t.is_finite() {
        return Err(S::Error::custom(format!("timestamp {t} is not a finite number")));
    }
    serializer.serialize_f64(*t)
}

impl Action {
    /// The capture timestamp of this action.
    #[must_use]
    pub fn time(&self) -> f64 {
        match self {
            Self::Move { t, .. }
            | Self::Click { t, .. }
            | Self::Scroll { t, .. }
            | Self::KeyPress { t, .. }
            | Self::KeyRelease { t, .. } => *t,
        }
    }

    /// The `type` tag of this action.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Move { .. } => "move",
            Self::Click { .. } => "click",
            Self::Scroll { .. } => "scroll",
            Self::KeyPress { .. } => "key_press",
            Self::KeyRelease { .. } => "key_release",
        }
    }
}

/// Counts of each action kind in a log, plus its time span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ActionSummary {
    /// Total number of actions.
    pub total: usize,
    /// Pointer moves.
    pub moves: usize,
    /// Button presses and releases.
    pub clicks: usize,
    /// Wheel scrolls.
    pub scrolls: usize,
    /// Key presses.
    pub key_presses: usize,
    /// Key releases.
    pub key_releases: usize,
    /// Seconds between the first and last action of one pass.
    pub span_secs: f64,
}

/// An ordered sequence of actions. Order is replay order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionLog {
    actions: Vec<Action>,
}

impl ActionLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an action.
    pub fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    /// Number of actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Check if the log has no actions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// The actions in replay order.
    #[must_use]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Iterate over the actions in replay order.
    pub fn iter(&self) -> std::slice::Iter<'_, Action> {
        self.actions.iter()
    }

    /// Timestamp of the first action, which anchors every playback pass.
    #[must_use]
    pub fn start_time(&self) -> Option<f64> {
        self.actions.first().map(Action::time)
    }

    /// Summarize the log.
    #[must_use]
    pub fn summary(&self) -> ActionSummary {
        let mut summary = ActionSummary {
            total: self.actions.len(),
            ..ActionSummary::default()
        };
        for action in &self.actions {
            match action {
                Action::Move { .. } => summary.moves += 1,
                Action::Click { .. } => summary.clicks += 1,
                Action::Scroll { .. } => summary.scrolls += 1,
                Action::KeyPress { .. } => summary.key_presses += 1,
                Action::KeyRelease { .. } => summary.key_releases += 1,
            }
        }
        if let (Some(first), Some(last)) = (self.actions.first(), self.actions.last()) {
            summary.span_secs = (last.time() - first.time()).max(0.0);
        }
        summary
    }
}

impl From<Vec<Action>> for ActionLog {
    fn from(actions: Vec<Action>) -> Self {
        Self { actions }
    }
}

impl FromIterator<Action> for ActionLog {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        Self {
            actions: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ActionLog {
    type Item = &'a Action;
    type IntoIter = std::slice::Iter<'a, Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}

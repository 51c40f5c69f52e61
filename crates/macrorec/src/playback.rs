//! Timed replay of action logs.
//!
//! A [`PlaybackEngine`] walks a [`PlaybackSession`] pass by pass, waiting the
//! recorded gap before each action and checking the session's [`CancelFlag`]
//! before and after every wait. Cancellation is cooperative, so the longest
//! it can go unnoticed is one inter-action delay.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::thread::JoinHandle;

use serde::Serialize;
use tracing::{debug, error, info, trace};

use crate::action::{Action, ActionLog};
use crate::device::InputBackend;
use crate::error::{Error, Result};
use crate::hotkey::CancelFlag;
use crate::keysym::KeySym;
use crate::timing::{compute_delay, Sleeper, ThreadSleeper};

/// How many passes to play. Zero repeats until cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct LoopCount(u32);

impl LoopCount {
    /// Repeat until cancelled.
    pub const INFINITE: Self = Self(0);

    /// Play exactly `passes` passes (`0` means infinite).
    #[must_use]
    pub const fn new(passes: u32) -> Self {
        Self(passes)
    }

    /// Parse a loop count typed by a user.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLoopCount`] unless the input is a
    /// non-negative whole number.
    pub fn parse(input: &str) -> Result<Self> {
        input
            .trim()
            .parse::<u32>()
            .map(Self)
            .map_err(|_| Error::InvalidLoopCount {
                input: input.to_string(),
            })
    }

    /// Check if this count repeats until cancelled.
    #[must_use]
    pub fn is_infinite(self) -> bool {
        self.0 == 0
    }

    /// The finite number of passes, if any.
    #[must_use]
    pub fn passes(self) -> Option<u32> {
        (!self.is_infinite()).then_some(self.0)
    }

    /// Check if another pass is due after `done` passes.
    #[must_use]
    pub fn allows_another(self, done: u32) -> bool {
        self.is_infinite() || done < self.0
    }
}

impl FromStr for LoopCount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for LoopCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_infinite() {
            write!(f, "until aborted")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// How a playback ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackResult {
    /// Every requested pass finished.
    Completed,
    /// Cancellation was observed before the requested passes finished.
    Aborted,
}

impl fmt::Display for PlaybackResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

/// Where a playback session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Created, not yet started.
    Idle,
    /// Replaying actions.
    Playing,
    /// Finished every requested pass.
    Completed,
    /// Stopped early by cancellation or an injection failure.
    Aborted,
}

/// Counts of injected actions by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlaybackStats {
    /// Pointer moves.
    pub moves: u64,
    /// Button presses and releases.
    pub clicks: u64,
    /// Wheel scrolls.
    pub scrolls: u64,
    /// Key presses and releases.
    pub keys: u64,
    /// Literal symbols typed as text.
    pub texts: u64,
}

/// The outcome of a playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlaybackReport {
    /// Completed or aborted.
    pub result: PlaybackResult,
    /// Number of passes that ran to the end, saturating at `u32::MAX`.
    pub passes: u32,
    /// Number of actions injected across all passes. A literal key
    /// release injects nothing and is not counted.
    pub actions_applied: u64,
    /// Breakdown of applied actions.
    pub stats: PlaybackStats,
}

/// One invocation of playback: a shared log, the loop count, the
/// cancellation flag and the current position.
#[derive(Debug)]
pub struct PlaybackSession {
    log: Arc<ActionLog>,
    loops: LoopCount,
    cancel: CancelFlag,
    state: PlaybackState,
    passes_done: u32,
    position: usize,
}

impl PlaybackSession {
    /// Create a session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyLog`] if the log has no actions.
    pub fn new(log: Arc<ActionLog>, loops: LoopCount, cancel: CancelFlag) -> Result<Self> {
        if log.is_empty() {
            return Err(Error::EmptyLog);
        }
        Ok(Self {
            log,
            loops,
            cancel,
            state: PlaybackState::Idle,
            passes_done: 0,
            position: 0,
        })
    }

    /// The log being replayed.
    #[must_use]
    pub fn log(&self) -> &Arc<ActionLog> {
        &self.log
    }

    /// The requested loop count.
    #[must_use]
    pub fn loops(&self) -> LoopCount {
        self.loops
    }

    /// The session's cancellation flag.
    #[must_use]
    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Passes that ran to the end.
    #[must_use]
    pub fn passes_done(&self) -> u32 {
        self.passes_done
    }

    /// Index of the action being processed in the current pass.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }
}

/// Replays action logs onto an [`InputBackend`].
#[derive(Debug)]
pub struct PlaybackEngine<B, S = ThreadSleeper> {
    backend: B,
    sleeper: S,
}

impl<B: InputBackend> PlaybackEngine<B> {
    /// Create an engine that waits in real time.
    pub fn new(backend: B) -> Self {
        Self::with_sleeper(backend, ThreadSleeper)
    }
}

impl<B: InputBackend, S: Sleeper> PlaybackEngine<B, S> {
    /// Create an engine with a custom [`Sleeper`].
    pub fn with_sleeper(backend: B, sleeper: S) -> Self {
        Self { backend, sleeper }
    }

    /// Consume the engine and return its backend.
    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Play `log` `loops` times on the calling thread.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyLog`] for an empty log, or the backend's error
    /// if an injection fails.
    pub fn play(
        &mut self,
        log: Arc<ActionLog>,
        loops: LoopCount,
        cancel: &CancelFlag,
    ) -> Result<PlaybackReport> {
        let mut session = PlaybackSession::new(log, loops, cancel.clone())?;
        self.run(&mut session)
    }

    /// Run a session to completion or cancellation on the calling thread.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if an injection fails; the session is
    /// left in [`PlaybackState::Aborted`].
    pub fn run(&mut self, session: &mut PlaybackSession) -> Result<PlaybackReport> {
        let log = Arc::clone(&session.log);
        let anchor = log.start_time().ok_or(Error::EmptyLog)?;
        let mut actions_applied = 0u64;
        let mut stats = PlaybackStats::default();

        session.state = PlaybackState::Playing;
        let result = 'passes: loop {
            if !session.loops.allows_another(session.passes_done) {
                break PlaybackResult::Completed;
            }
            if session.cancel.is_raised() {
                break PlaybackResult::Aborted;
            }
            debug!(pass = session.passes_done.saturating_add(1), loops = %session.loops, "Starting pass");

            let mut prev = anchor;
            for (index, action) in log.iter().enumerate() {
                session.position = index;
                if session.cancel.is_raised() {
                    break 'passes PlaybackResult::Aborted;
                }

                let delay = compute_delay(prev, action.time());
                if !delay.is_zero() {
                    trace!(delay_ms = delay.as_millis(), "Waiting before next action");
                    self.sleeper.suspend(delay);
                }
                prev = action.time();

                if session.cancel.is_raised() {
                    break 'passes PlaybackResult::Aborted;
                }

                match self.apply(action, &mut stats) {
                    Ok(true) => actions_applied += 1,
                    Ok(false) => {}
                    Err(e) => {
                        error!(error = %e, position = index, "Injection failed, stopping playback");
                        session.state = PlaybackState::Aborted;
                        return Err(e);
                    }
                }
            }

            // An infinite playback can outlive the counter.
            session.passes_done = session.passes_done.saturating_add(1);
            session.position = 0;
        };

        session.state = match result {
            PlaybackResult::Completed => PlaybackState::Completed,
            PlaybackResult::Aborted => PlaybackState::Aborted,
        };
        info!(
            result = %result,
            passes = session.passes_done,
            actions = actions_applied,
            "Playback finished"
        );

        Ok(PlaybackReport {
            result,
            passes: session.passes_done,
            actions_applied,
            stats,
        })
    }

    /// Inject one action. Returns `false` when there was nothing to inject.
    fn apply(&mut self, action: &Action, stats: &mut PlaybackStats) -> Result<bool> {
        match action {
            Action::Move { pos, .. } => {
                self.backend.move_to(*pos)?;
                stats.moves += 1;
            }
            Action::Click {
                button, pressed, ..
            } => {
                self.backend.button(*button, *pressed)?;
                stats.clicks += 1;
            }
            Action::Scroll { dx, dy, .. } => {
                self.backend.scroll(*dx, *dy)?;
                stats.scrolls += 1;
            }
            Action::KeyPress {
                key: KeySym::Literal(text),
                ..
            } => {
                self.backend.text(text)?;
                stats.texts += 1;
            }
            Action::KeyRelease {
                key: KeySym::Literal(text),
                ..
            } => {
                trace!(text = %text, "Nothing to release for literal text");
                return Ok(false);
            }
            Action::KeyPress { key, .. } => {
                self.backend.key(key, true)?;
                stats.keys += 1;
            }
            Action::KeyRelease { key, .. } => {
                self.backend.key(key, false)?;
                stats.keys += 1;
            }
        }
        Ok(true)
    }
}

/// A playback running on its own thread.
#[derive(Debug)]
pub struct PlaybackHandle {
    cancel: CancelFlag,
    thread: JoinHandle<Result<PlaybackReport>>,
}

impl PlaybackHandle {
    pub(crate) fn new(cancel: CancelFlag, thread: JoinHandle<Result<PlaybackReport>>) -> Self {
        Self { cancel, thread }
    }

    /// Check if the playback has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Request cancellation, as the abort hotkey would.
    pub fn abort(&self) {
        if self.cancel.raise() {
            info!("Playback abort requested");
        }
    }

    /// The playback's cancellation flag.
    #[must_use]
    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    /// Wait for the playback to end.
    ///
    /// # Errors
    ///
    /// Returns the playback's error, or an internal error if the playback
    /// thread panicked.
    pub fn join(self) -> Result<PlaybackReport> {
        self.thread
            .join()
            .map_err(|_| Error::internal("playback thread panicked"))?
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use parking_lot::Mutex;

    use super::*;
    use crate::action::{MouseButton, Point};
    use crate::device::{Injected, RecordingBackend};
    use crate::keysym::NamedKey;

    /// Records requested waits instead of sleeping.
    #[derive(Debug, Default, Clone)]
    struct FakeSleeper {
        waits: Arc<Mutex<Vec<Duration>>>,
    }

    impl FakeSleeper {
        fn waits(&self) -> Vec<Duration> {
            self.waits.lock().clone()
        }
    }

    impl Sleeper for FakeSleeper {
        fn suspend(&self, duration: Duration) {
            self.waits.lock().push(duration);
        }
    }

    /// Raises a cancel flag once a number of injections have happened.
    struct CancelAfter {
        inner: RecordingBackend,
        remaining: usize,
        cancel: CancelFlag,
    }

    impl InputBackend for CancelAfter {
        fn move_to(&mut self, pos: Point) -> Result<()> {
            self.inner.move_to(pos)?;
            self.remaining = self.remaining.saturating_sub(1);
            if self.remaining == 0 {
                self.cancel.raise();
            }
            Ok(())
        }

        fn button(&mut self, button: MouseButton, pressed: bool) -> Result<()> {
            self.inner.button(button, pressed)
        }

        fn scroll(&mut self, dx: i32, dy: i32) -> Result<()> {
            self.inner.scroll(dx, dy)
        }

        fn key(&mut self, key: &KeySym, pressed: bool) -> Result<()> {
            self.inner.key(key, pressed)
        }

        fn text(&mut self, text: &str) -> Result<()> {
            self.inner.text(text)
        }
    }

    /// Fails every button injection.
    struct BrokenMouse;

    impl InputBackend for BrokenMouse {
        fn move_to(&mut self, _pos: Point) -> Result<()> {
            Ok(())
        }

        fn button(&mut self, _button: MouseButton, _pressed: bool) -> Result<()> {
            Err(Error::injection("click", "no pointer device"))
        }

        fn scroll(&mut self, _dx: i32, _dy: i32) -> Result<()> {
            Ok(())
        }

        fn key(&mut self, _key: &KeySym, _pressed: bool) -> Result<()> {
            Ok(())
        }

        fn text(&mut self, _text: &str) -> Result<()> {
            Ok(())
        }
    }

    fn click_log() -> Arc<ActionLog> {
        Arc::new(ActionLog::from(vec![
            Action::Move {
                pos: Point::new(0, 0),
                t: 0.0,
            },
            Action::Click {
                pos: Point::new(0, 0),
                button: MouseButton::Left,
                pressed: true,
                t: 0.2,
            },
            Action::Click {
                pos: Point::new(0, 0),
                button: MouseButton::Left,
                pressed: false,
                t: 0.25,
            },
        ]))
    }

    fn moves(times: &[f64]) -> Arc<ActionLog> {
        Arc::new(
            times
                .iter()
                .zip(0..)
                .map(|(&t, i)| Action::Move {
                    pos: Point::new(i, i),
                    t,
                })
                .collect(),
        )
    }

    fn assert_close(actual: Duration, expected_secs: f64) {
        assert!(
            (actual.as_secs_f64() - expected_secs).abs() < 1e-6,
            "expected ~{expected_secs}s, got {actual:?}"
        );
    }

    #[test]
    fn test_loop_count_parse() {
        assert_eq!(LoopCount::parse("3").unwrap(), LoopCount::new(3));
        assert_eq!(LoopCount::parse(" 0 ").unwrap(), LoopCount::INFINITE);
        assert!(matches!(
            LoopCount::parse("three"),
            Err(Error::InvalidLoopCount { .. })
        ));
        assert!(LoopCount::parse("-1").is_err());
        assert!(LoopCount::parse("1.5").is_err());
        assert!(LoopCount::parse("").is_err());
        assert_eq!("7".parse::<LoopCount>().unwrap(), LoopCount::new(7));
    }

    #[test]
    fn test_loop_count_semantics() {
        assert!(LoopCount::INFINITE.is_infinite());
        assert_eq!(LoopCount::INFINITE.passes(), None);
        assert!(LoopCount::INFINITE.allows_another(u32::MAX - 1));

        let two = LoopCount::new(2);
        assert_eq!(two.passes(), Some(2));
        assert!(two.allows_another(0));
        assert!(two.allows_another(1));
        assert!(!two.allows_another(2));

        assert_eq!(two.to_string(), "2");
        assert_eq!(LoopCount::INFINITE.to_string(), "until aborted");
    }

    #[test]
    fn test_example_scenario() {
        let backend = RecordingBackend::new();
        let sleeper = FakeSleeper::default();
        let mut engine = PlaybackEngine::with_sleeper(backend.clone(), sleeper.clone());

        let report = engine
            .play(click_log(), LoopCount::new(1), &CancelFlag::new())
            .unwrap();

        assert_eq!(report.result, PlaybackResult::Completed);
        assert_eq!(report.passes, 1);
        assert_eq!(report.actions_applied, 3);
        assert_eq!(
            backend.injected(),
            vec![
                Injected::Move(Point::new(0, 0)),
                Injected::Button(MouseButton::Left, true),
                Injected::Button(MouseButton::Left, false),
            ]
        );
        let waits = sleeper.waits();
        assert_eq!(waits.len(), 2);
        assert_close(waits[0], 0.2);
        assert_close(waits[1], 0.05);
    }

    #[test]
    fn test_each_pass_reanchors() {
        let backend = RecordingBackend::new();
        let sleeper = FakeSleeper::default();
        let mut engine = PlaybackEngine::with_sleeper(backend.clone(), sleeper.clone());

        let log = moves(&[100.0, 100.5, 101.0]);
        let report = engine.play(log, LoopCount::new(3), &CancelFlag::new()).unwrap();

        assert_eq!(report.result, PlaybackResult::Completed);
        assert_eq!(report.passes, 3);
        assert_eq!(report.stats.moves, 9);

        let expected: Vec<_> = (0..3)
            .flat_map(|_| (0..3).map(|i| Injected::Move(Point::new(i, i))))
            .collect();
        assert_eq!(backend.injected(), expected);

        // No wait between the last action of a pass and the first of the next.
        let waits = sleeper.waits();
        assert_eq!(waits.len(), 6);
        for wait in waits {
            assert_close(wait, 0.5);
        }
    }

    #[test]
    fn test_backwards_timestamps_do_not_wait() {
        let sleeper = FakeSleeper::default();
        let mut engine = PlaybackEngine::with_sleeper(RecordingBackend::new(), sleeper.clone());

        let report = engine
            .play(moves(&[5.0, 4.0, 4.5]), LoopCount::new(1), &CancelFlag::new())
            .unwrap();

        assert_eq!(report.actions_applied, 3);
        let waits = sleeper.waits();
        assert_eq!(waits.len(), 1);
        assert_close(waits[0], 0.5);
    }

    #[test]
    fn test_empty_log_is_an_error() {
        let mut engine = PlaybackEngine::with_sleeper(RecordingBackend::new(), FakeSleeper::default());
        let err = engine
            .play(Arc::new(ActionLog::new()), LoopCount::new(1), &CancelFlag::new())
            .unwrap_err();
        assert!(err.is_empty_log());
    }

    #[test]
    fn test_infinite_loop_runs_until_cancelled() {
        let cancel = CancelFlag::new();
        let recorder = RecordingBackend::new();
        let backend = CancelAfter {
            inner: recorder.clone(),
            remaining: 10,
            cancel: cancel.clone(),
        };
        let mut engine = PlaybackEngine::with_sleeper(backend, FakeSleeper::default());

        let report = engine
            .play(moves(&[0.0, 0.1, 0.2]), LoopCount::INFINITE, &cancel)
            .unwrap();

        assert_eq!(report.result, PlaybackResult::Aborted);
        assert_eq!(report.actions_applied, 10);
        assert_eq!(report.passes, 3);
        assert_eq!(recorder.count(), 10);
    }

    #[test]
    fn test_pass_counter_saturates() {
        let cancel = CancelFlag::new();
        let backend = CancelAfter {
            inner: RecordingBackend::new(),
            remaining: 3,
            cancel: cancel.clone(),
        };
        let mut engine = PlaybackEngine::with_sleeper(backend, FakeSleeper::default());
        let mut session = PlaybackSession::new(moves(&[0.0]), LoopCount::INFINITE, cancel).unwrap();
        session.passes_done = u32::MAX - 1;

        let report = engine.run(&mut session).unwrap();

        assert_eq!(report.result, PlaybackResult::Aborted);
        assert_eq!(report.actions_applied, 3);
        assert_eq!(report.passes, u32::MAX);
        assert_eq!(session.passes_done(), u32::MAX);
    }

    #[test]
    fn test_cancel_mid_pass_stops_immediately() {
        let cancel = CancelFlag::new();
        let recorder = RecordingBackend::new();
        let backend = CancelAfter {
            inner: recorder.clone(),
            remaining: 2,
            cancel: cancel.clone(),
        };
        let mut engine = PlaybackEngine::with_sleeper(backend, FakeSleeper::default());
        let mut session =
            PlaybackSession::new(moves(&[0.0, 1.0, 2.0, 3.0]), LoopCount::new(5), cancel).unwrap();
        assert_eq!(session.state(), PlaybackState::Idle);

        let report = engine.run(&mut session).unwrap();

        assert_eq!(report.result, PlaybackResult::Aborted);
        assert_eq!(report.passes, 0);
        assert_eq!(recorder.count(), 2);
        assert_eq!(session.state(), PlaybackState::Aborted);
        assert_eq!(session.position(), 2);
        assert_eq!(session.passes_done(), 0);
    }

    #[test]
    fn test_cancelled_before_start() {
        let cancel = CancelFlag::new();
        cancel.raise();
        let recorder = RecordingBackend::new();
        let mut engine = PlaybackEngine::with_sleeper(recorder.clone(), FakeSleeper::default());

        let report = engine.play(click_log(), LoopCount::new(1), &cancel).unwrap();

        assert_eq!(report.result, PlaybackResult::Aborted);
        assert_eq!(recorder.count(), 0);
    }

    #[test]
    fn test_cancel_during_wait_skips_pending_action() {
        struct CancellingSleeper(CancelFlag);

        impl Sleeper for CancellingSleeper {
            fn suspend(&self, _duration: Duration) {
                self.0.raise();
            }
        }

        let cancel = CancelFlag::new();
        let recorder = RecordingBackend::new();
        let mut engine =
            PlaybackEngine::with_sleeper(recorder.clone(), CancellingSleeper(cancel.clone()));

        let report = engine.play(click_log(), LoopCount::new(1), &cancel).unwrap();

        assert_eq!(report.result, PlaybackResult::Aborted);
        assert_eq!(recorder.injected(), vec![Injected::Move(Point::new(0, 0))]);
    }

    #[test]
    fn test_keys_and_literals() {
        let recorder = RecordingBackend::new();
        let mut engine = PlaybackEngine::with_sleeper(recorder.clone(), FakeSleeper::default());
        let log = Arc::new(ActionLog::from(vec![
            Action::KeyPress {
                key: KeySym::Named(NamedKey::ShiftLeft),
                t: 0.0,
            },
            Action::KeyPress {
                key: KeySym::Char('a'),
                t: 0.0,
            },
            Action::KeyRelease {
                key: KeySym::Char('a'),
                t: 0.0,
            },
            Action::KeyRelease {
                key: KeySym::Named(NamedKey::ShiftLeft),
                t: 0.0,
            },
            Action::KeyPress {
                key: KeySym::decode("<dead_acute>"),
                t: 0.0,
            },
            Action::KeyRelease {
                key: KeySym::decode("<dead_acute>"),
                t: 0.0,
            },
            Action::Scroll {
                pos: Point::new(9, 9),
                dx: 1,
                dy: -2,
                t: 0.0,
            },
        ]));

        let report = engine.play(log, LoopCount::new(1), &CancelFlag::new()).unwrap();

        assert_eq!(
            recorder.injected(),
            vec![
                Injected::Key(KeySym::Named(NamedKey::ShiftLeft), true),
                Injected::Key(KeySym::Char('a'), true),
                Injected::Key(KeySym::Char('a'), false),
                Injected::Key(KeySym::Named(NamedKey::ShiftLeft), false),
                Injected::Text("<dead_acute>".to_string()),
                Injected::Scroll(1, -2),
            ]
        );
        assert_eq!(report.stats.keys, 4);
        assert_eq!(report.stats.texts, 1);
        assert_eq!(report.stats.scrolls, 1);
        assert_eq!(report.actions_applied, 6);
        assert_eq!(recorder.injected().len(), 6);
    }

    #[test]
    fn test_injection_failure_stops_playback() {
        let mut engine = PlaybackEngine::with_sleeper(BrokenMouse, FakeSleeper::default());
        let mut session =
            PlaybackSession::new(click_log(), LoopCount::new(2), CancelFlag::new()).unwrap();

        let err = engine.run(&mut session).unwrap_err();

        assert!(matches!(err, Error::Injection { action: "click", .. }));
        assert_eq!(session.state(), PlaybackState::Aborted);
        assert_eq!(session.position(), 1);
    }

    #[test]
    fn test_playback_handle_join() {
        let recorder = RecordingBackend::new();
        let cancel = CancelFlag::new();
        let thread = {
            let recorder = recorder.clone();
            let cancel = cancel.clone();
            std::thread::spawn(move || {
                PlaybackEngine::with_sleeper(recorder, FakeSleeper::default()).play(
                    click_log(),
                    LoopCount::new(2),
                    &cancel,
                )
            })
        };
        let handle = PlaybackHandle::new(cancel, thread);

        let report = handle.join().unwrap();
        assert_eq!(report.result, PlaybackResult::Completed);
        assert_eq!(recorder.count(), 6);
    }

    #[test]
    fn test_report_serializes() {
        let report = PlaybackReport {
            result: PlaybackResult::Aborted,
            passes: 1,
            actions_applied: 4,
            stats: PlaybackStats::default(),
        };
        let json = serde_json::to_value(report).unwrap();
        assert_eq!(json["result"], "aborted");
        assert_eq!(json["passes"], 1);
    }
}

//! Session state machine.
//!
//! ```text
//! Idle -> Running <-> Paused
//!         Running -> Ended -> (restart) Running
//! any  -> (stop) Idle
//! ```
//!
//! The machine is driven from outside: input events arrive through
//! `on_key_input` / `on_pointer_input`, and the owner calls `poll()`
//! regularly so due timers turn into progress updates, expiry and the next
//! challenge. Every transition cancels the timers it owns before arming new
//! ones, and timer events are only honoured when their token is the one
//! currently recorded for the round.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::mem;
use std::time::{Duration, Instant};

use crate::challenge::{self, Challenge, ChallengeId};
use crate::clock::Clock;
use crate::config::{ResumePolicy, Tuning};
use crate::port::{ActionSignal, DisplayPort};
use crate::score::{ScoreTracker, SpeedRule};
use crate::timer::{TimerEngine, TimerEventKind, TimerSnapshot, TimerToken};

const FEEDBACK_DURATION: Duration = Duration::from_millis(1_500);
const PAUSE_NOTICE_DURATION: Duration = Duration::from_millis(3_000);
const GAME_OVER_DURATION: Duration = Duration::from_millis(10_000);
const INSTRUCTIONS_DURATION: Duration = Duration::from_millis(16_000);

pub const INSTRUCTIONS: &str = "Type the letter or digit on screen, or click the highlighted target! \
You start with 30 seconds per challenge and get faster every level.";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum_macros::Display,
)]
pub enum Status {
    #[default]
    Idle,
    Running,
    Paused,
    Ended,
}

/// Everything that describes one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub status: Status,
    pub tracker: ScoreTracker,
}

impl GameState {
    pub fn new(rule: SpeedRule) -> Self {
        Self {
            status: Status::Idle,
            tracker: ScoreTracker::new(rule),
        }
    }
}

/// End-of-session summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalReport {
    pub score: u64,
    pub level: u32,
    pub completed_count: u32,
    pub average_reaction_ms: u64,
    pub reaction_std_dev_ms: f64,
}

impl From<&ScoreTracker> for FinalReport {
    fn from(tracker: &ScoreTracker) -> Self {
        Self {
            score: tracker.score(),
            level: tracker.level(),
            completed_count: tracker.completed_count(),
            average_reaction_ms: tracker.average_reaction_time(),
            reaction_std_dev_ms: tracker.reaction_std_dev(),
        }
    }
}

/// What an operation did.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Event arrived in a state that does not accept it.
    Ignored,
    Started {
        challenge: ChallengeId,
    },
    Paused,
    Resumed {
        challenge: ChallengeId,
        regenerated: bool,
    },
    Succeeded {
        points: u64,
        reaction_time_ms: u64,
        leveled_up: bool,
    },
    WrongInput {
        remaining_ms: u64,
    },
    Expired(FinalReport),
    NextChallenge {
        challenge: ChallengeId,
    },
    Stopped,
}

/// Read-only view for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub status: Status,
    pub score: u64,
    pub level: u32,
    pub speed_ms: u64,
    pub completed_count: u32,
    pub progress_within_level: u32,
    pub average_reaction_time: u64,
    pub active_challenge: Option<Challenge>,
    pub remaining_fraction: f64,
    pub remaining_whole_seconds: u64,
}

#[derive(Debug, Clone, PartialEq)]
enum TimerSlot {
    Inactive,
    Armed {
        token: TimerToken,
        challenge: ChallengeId,
    },
}

#[derive(Debug, Clone)]
struct ActiveChallenge {
    challenge: Challenge,
    countdown: TimerSnapshot,
    timer: TimerSlot,
    /// Time left when the session was paused.
    paused_remaining: Option<Duration>,
}

impl ActiveChallenge {
    fn remaining(&self, now: Instant) -> Duration {
        self.paused_remaining
            .unwrap_or_else(|| self.countdown.remaining(now))
    }
}

#[derive(Debug, Clone)]
enum Round {
    Empty,
    Active(ActiveChallenge),
    Pacing { token: TimerToken },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingKind {
    Start,
    Restart,
    Resume,
}

#[derive(Debug, Clone)]
struct PendingAction {
    kind: PendingKind,
    signal: ActionSignal,
}

pub struct Game<C: Clock, R: Rng, P: DisplayPort> {
    clock: C,
    rng: R,
    port: P,
    tuning: Tuning,
    timers: TimerEngine,
    state: GameState,
    round: Round,
    pending: Option<PendingAction>,
}

impl<C: Clock, R: Rng, P: DisplayPort> Game<C, R, P> {
    pub fn new(clock: C, rng: R, port: P, tuning: Tuning) -> Self {
        Self {
            clock,
            rng,
            port,
            timers: TimerEngine::new(tuning.progress_interval, tuning.readout_interval),
            state: GameState::new(tuning.speed),
            tuning,
            round: Round::Empty,
            pending: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn status(&self) -> Status {
        self.state.status
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    pub fn active_challenge(&self) -> Option<&Challenge> {
        match &self.round {
            Round::Active(active) => Some(&active.challenge),
            _ => None,
        }
    }

    /// Earliest instant a `poll()` could change anything.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    pub fn snapshot(&self) -> Snapshot {
        let now = self.clock.now();
        let tracker = &self.state.tracker;
        let (remaining_fraction, remaining_whole_seconds) = match &self.round {
            Round::Active(active) => {
                let remaining = active.remaining(now);
                let total = active.countdown.duration;
                let fraction = if total.is_zero() {
                    0.0
                } else {
                    remaining.as_secs_f64() / total.as_secs_f64()
                };
                (fraction, (remaining.as_millis() as u64).div_ceil(1000))
            }
            _ => (0.0, 0),
        };

        Snapshot {
            status: self.state.status,
            score: tracker.score(),
            level: tracker.level(),
            speed_ms: tracker.speed_ms(),
            completed_count: tracker.completed_count(),
            progress_within_level: tracker.progress_within_level(),
            average_reaction_time: tracker.average_reaction_time(),
            active_challenge: self.active_challenge().cloned(),
            remaining_fraction,
            remaining_whole_seconds,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Post the how-to-play notice. Its action starts a session.
    pub fn show_instructions(&mut self) {
        if matches!(self.state.status, Status::Running | Status::Paused) {
            return;
        }
        let signal = self
            .port
            .show_with_action(INSTRUCTIONS, "Start!", INSTRUCTIONS_DURATION);
        self.pending = Some(PendingAction {
            kind: PendingKind::Start,
            signal,
        });
    }

    /// Fresh session: reset state and deal the first challenge.
    pub fn start(&mut self) -> Transition {
        let now = self.clock.now();
        self.timers.cancel_all();
        self.pending = None;
        self.round = Round::Empty;
        self.state = GameState::new(self.tuning.speed);
        self.state.status = Status::Running;

        let challenge = self.deal_challenge(now);
        tracing::info!(%challenge, speed_ms = self.state.tracker.speed_ms(), "session started");
        Transition::Started { challenge }
    }

    pub fn pause(&mut self) -> Transition {
        if self.state.status != Status::Running {
            return Transition::Ignored;
        }
        let now = self.clock.now();
        if self.countdown_exhausted(now) {
            return self.expire();
        }

        self.timers.cancel_all();
        if let Round::Active(active) = &mut self.round {
            active.paused_remaining = Some(active.countdown.remaining(now));
            active.timer = TimerSlot::Inactive;
        } else {
            // a pending pacing delay is dropped; resume deals afresh
            self.round = Round::Empty;
        }
        self.state.status = Status::Paused;

        let signal = self
            .port
            .show_with_action("Game paused", "Continue", PAUSE_NOTICE_DURATION);
        self.pending = Some(PendingAction {
            kind: PendingKind::Resume,
            signal,
        });
        tracing::debug!("paused");
        Transition::Paused
    }

    pub fn resume(&mut self) -> Transition {
        if self.state.status != Status::Paused {
            return Transition::Ignored;
        }
        let now = self.clock.now();
        self.timers.cancel_all();
        self.pending = None;
        self.state.status = Status::Running;

        let continuing = self.tuning.resume_policy == ResumePolicy::Continue;
        if let (true, Round::Active(active)) = (continuing, &mut self.round) {
            let duration = active.countdown.duration;
            let remaining = active.paused_remaining.take().unwrap_or(duration);
            // shift the origin forward by the time spent paused
            let countdown = TimerSnapshot::resumed(duration, remaining, now);
            if countdown.duration != duration {
                tracing::warn!(
                    remaining_ms = remaining.as_millis() as u64,
                    "countdown origin out of range, restarting with the remaining time"
                );
            }
            active.countdown = countdown;
            let token = self
                .timers
                .start_at(countdown.started_at, countdown.duration, now);
            active.timer = TimerSlot::Armed {
                token,
                challenge: active.challenge.id.clone(),
            };
            let challenge = active.challenge.id.clone();
            tracing::debug!(%challenge, remaining_ms = remaining.as_millis() as u64, "resumed");
            return Transition::Resumed {
                challenge,
                regenerated: false,
            };
        }

        self.round = Round::Empty;
        let challenge = self.deal_challenge(now);
        tracing::debug!(%challenge, "resumed with a new challenge");
        Transition::Resumed {
            challenge,
            regenerated: true,
        }
    }

    pub fn toggle_pause(&mut self) -> Transition {
        match self.state.status {
            Status::Running => self.pause(),
            Status::Paused => self.resume(),
            Status::Idle | Status::Ended => Transition::Ignored,
        }
    }

    /// Player left the screen. Drops the session.
    pub fn stop(&mut self) -> Transition {
        self.timers.cancel_all();
        self.pending = None;
        self.round = Round::Empty;
        self.state = GameState::new(self.tuning.speed);
        tracing::debug!("stopped");
        Transition::Stopped
    }

    pub fn on_key_input(&mut self, key: char) -> Transition {
        let accepted = match self.running_challenge() {
            Some(challenge) if challenge.is_key() => challenge.accepts_key(key),
            _ => return Transition::Ignored,
        };
        self.resolve(accepted)
    }

    /// `hit` is the surface's verdict on whether the click landed on the
    /// current target.
    pub fn on_pointer_input(&mut self, hit: bool) -> Transition {
        match self.running_challenge() {
            Some(challenge) if challenge.is_click() => self.resolve(hit),
            _ => Transition::Ignored,
        }
    }

    /// Click on a specific target. Clicks on a superseded target count as a
    /// miss.
    pub fn on_target_clicked(&mut self, id: &ChallengeId) -> Transition {
        let hit = self.active_challenge().is_some_and(|c| &c.id == id);
        self.on_pointer_input(hit)
    }

    /// Turn due timers into effects and honour triggered notification actions.
    pub fn poll(&mut self) -> Transition {
        let now = self.clock.now();

        for event in self.timers.poll(now) {
            match event.kind {
                TimerEventKind::Progress {
                    remaining_fraction, ..
                } if self.is_armed(event.token) => self.port.show_progress(remaining_fraction),
                TimerEventKind::Readout { remaining_seconds } if self.is_armed(event.token) => {
                    self.port.show_seconds(remaining_seconds)
                }
                TimerEventKind::Expired if self.is_armed(event.token) => return self.expire(),
                TimerEventKind::Elapsed if self.is_pacing(event.token) => {
                    return self.next_challenge(now)
                }
                kind => tracing::trace!(?kind, "discarding stale timer event"),
            }
        }

        let triggered = self
            .pending
            .as_ref()
            .filter(|p| p.signal.take())
            .map(|p| p.kind);
        match triggered {
            Some(PendingKind::Start) | Some(PendingKind::Restart) => self.start(),
            Some(PendingKind::Resume) => self.resume(),
            None => Transition::Ignored,
        }
    }

    // ── Internals ────────────────────────────────────────────────────

    fn running_challenge(&self) -> Option<&Challenge> {
        if self.state.status != Status::Running {
            return None;
        }
        self.active_challenge()
    }

    fn countdown_exhausted(&self, now: Instant) -> bool {
        match &self.round {
            Round::Active(active) => active.remaining(now).is_zero(),
            _ => false,
        }
    }

    fn is_armed(&self, token: TimerToken) -> bool {
        match &self.round {
            Round::Active(ActiveChallenge {
                challenge,
                timer: TimerSlot::Armed { token: armed, challenge: owner },
                ..
            }) => *armed == token && *owner == challenge.id,
            _ => false,
        }
    }

    fn is_pacing(&self, token: TimerToken) -> bool {
        matches!(self.round, Round::Pacing { token: pacing } if pacing == token)
    }

    fn deal_challenge(&mut self, now: Instant) -> ChallengeId {
        let challenge = challenge::generate(&mut self.rng);
        let duration = Duration::from_millis(self.state.tracker.speed_ms());
        let token = self.timers.start(duration, now);
        let id = challenge.id.clone();
        tracing::debug!(%id, kind = ?challenge.kind, "dealt challenge");

        self.round = Round::Active(ActiveChallenge {
            countdown: TimerSnapshot::new(now, duration),
            timer: TimerSlot::Armed {
                token,
                challenge: id.clone(),
            },
            challenge,
            paused_remaining: None,
        });
        id
    }

    fn resolve(&mut self, correct: bool) -> Transition {
        let now = self.clock.now();
        if self.countdown_exhausted(now) {
            return self.expire();
        }
        if correct {
            self.succeed(now)
        } else {
            self.wrong_input(now)
        }
    }

    fn succeed(&mut self, now: Instant) -> Transition {
        let Round::Active(active) = mem::replace(&mut self.round, Round::Empty) else {
            return Transition::Ignored;
        };
        self.timers.cancel_all();

        let reaction_time_ms = active.countdown.elapsed(now).as_millis() as u64;
        let speed_ms = active.countdown.duration_ms();
        let tracker = &mut self.state.tracker;
        let points = tracker.record_success(reaction_time_ms, speed_ms);
        let leveled_up = tracker.maybe_level_up();
        let level = tracker.level();

        self.port
            .show_transient(&format!("+{points} points!"), FEEDBACK_DURATION);
        if leveled_up {
            self.port
                .show_transient(&format!("Level {level}! Faster now!"), FEEDBACK_DURATION);
        }

        let token = self.timers.delay(self.tuning.pacing_delay, now);
        self.round = Round::Pacing { token };
        tracing::debug!(
            challenge = %active.challenge.id,
            reaction_time_ms,
            points,
            leveled_up,
            "challenge completed"
        );
        Transition::Succeeded {
            points,
            reaction_time_ms,
            leveled_up,
        }
    }

    fn wrong_input(&mut self, now: Instant) -> Transition {
        let Round::Active(active) = &mut self.round else {
            return Transition::Ignored;
        };
        if let TimerSlot::Armed { token, .. } = active.timer {
            self.timers.cancel(token);
        }
        // same origin, fresh token: the countdown keeps running
        let token = self
            .timers
            .start_at(active.countdown.started_at, active.countdown.duration, now);
        active.timer = TimerSlot::Armed {
            token,
            challenge: active.challenge.id.clone(),
        };
        let remaining_ms = active.countdown.remaining_ms(now);

        self.port
            .show_transient("Wrong! Try again", FEEDBACK_DURATION);
        tracing::debug!(challenge = %active.challenge.id, remaining_ms, "wrong input");
        Transition::WrongInput { remaining_ms }
    }

    fn next_challenge(&mut self, now: Instant) -> Transition {
        self.round = Round::Empty;
        if self.state.status != Status::Running {
            return Transition::Ignored;
        }
        let challenge = self.deal_challenge(now);
        Transition::NextChallenge { challenge }
    }

    fn expire(&mut self) -> Transition {
        self.timers.cancel_all();
        self.round = Round::Empty;
        self.state.status = Status::Ended;

        let report = FinalReport::from(&self.state.tracker);
        self.port.show_progress(0.0);
        self.port.show_seconds(0);
        let signal = self.port.show_with_action(
            &format!(
                "Time's up! Score: {} | Average reaction: {}ms",
                report.score, report.average_reaction_ms
            ),
            "Play again",
            GAME_OVER_DURATION,
        );
        self.pending = Some(PendingAction {
            kind: PendingKind::Restart,
            signal,
        });
        tracing::info!(
            score = report.score,
            level = report.level,
            completed = report.completed_count,
            average_reaction_ms = report.average_reaction_ms,
            "session ended"
        );
        Transition::Expired(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::ChallengeKind;
    use crate::clock::ManualClock;
    use crate::port::{Notice, RecordingPort};
    use assert_matches::assert_matches;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    type TestGame = Game<ManualClock, StdRng, RecordingPort>;

    fn game_with(seed: u64, tuning: Tuning) -> (TestGame, ManualClock) {
        let clock = ManualClock::new();
        let game = Game::new(
            clock.clone(),
            StdRng::seed_from_u64(seed),
            RecordingPort::new(),
            tuning,
        );
        (game, clock)
    }

    fn game(seed: u64) -> (TestGame, ManualClock) {
        game_with(seed, Tuning::default())
    }

    /// A key that does not match the current key challenge.
    fn wrong_key(game: &TestGame) -> char {
        match game.active_challenge().map(|c| &c.kind) {
            Some(ChallengeKind::Key('A')) => 'B',
            _ => 'A',
        }
    }

    /// Answer the current challenge correctly, whatever its kind.
    fn answer(game: &mut TestGame) -> Transition {
        match game.active_challenge().map(|c| c.kind.clone()) {
            Some(ChallengeKind::Key(c)) => game.on_key_input(c),
            Some(ChallengeKind::Click(_)) => game.on_pointer_input(true),
            None => Transition::Ignored,
        }
    }

    /// Answer incorrectly, whatever its kind.
    fn miss(game: &mut TestGame) -> Transition {
        match game.active_challenge().map(|c| c.kind.clone()) {
            Some(ChallengeKind::Key(_)) => {
                let key = wrong_key(game);
                game.on_key_input(key)
            }
            Some(ChallengeKind::Click(_)) => game.on_pointer_input(false),
            None => Transition::Ignored,
        }
    }

    #[test]
    fn starts_idle_and_ignores_input() {
        let (mut game, _) = game(1);
        assert_eq!(game.status(), Status::Idle);
        assert_eq!(game.on_key_input('A'), Transition::Ignored);
        assert_eq!(game.on_pointer_input(true), Transition::Ignored);
        assert_eq!(game.pause(), Transition::Ignored);
        assert_eq!(game.resume(), Transition::Ignored);
        assert!(game.active_challenge().is_none());
    }

    #[test]
    fn start_deals_a_challenge_with_full_countdown() {
        let (mut game, _) = game(2);
        assert_matches!(game.start(), Transition::Started { .. });

        let snap = game.snapshot();
        assert_eq!(snap.status, Status::Running);
        assert_eq!(snap.level, 1);
        assert_eq!(snap.speed_ms, 30_000);
        assert!(snap.active_challenge.is_some());
        assert_eq!(snap.remaining_fraction, 1.0);
        assert_eq!(snap.remaining_whole_seconds, 30);
    }

    #[test]
    fn poll_pushes_progress_to_the_port() {
        let (mut game, clock) = game(3);
        game.start();
        game.poll();
        clock.advance_ms(15_000);
        game.poll();

        let port = game.port();
        assert_eq!(port.progress.first(), Some(&1.0));
        assert!((port.last_progress().unwrap() - 0.5).abs() < 1e-9);
        assert_eq!(port.seconds, vec![30, 15]);
    }

    #[test]
    fn success_scores_and_paces_the_next_challenge() {
        let (mut game, clock) = game(4);
        game.start();
        let first = game.active_challenge().unwrap().id.clone();

        clock.advance_ms(5_000);
        assert_eq!(
            answer(&mut game),
            Transition::Succeeded {
                points: 2_600,
                reaction_time_ms: 5_000,
                leveled_up: false
            }
        );
        assert_eq!(game.port().last_message(), Some("+2600 points!"));
        assert!(game.active_challenge().is_none());

        // nothing during the pacing delay
        clock.advance_ms(499);
        assert_eq!(game.poll(), Transition::Ignored);
        assert_eq!(answer(&mut game), Transition::Ignored);

        clock.advance_ms(1);
        let next = assert_matches!(game.poll(), Transition::NextChallenge { challenge } => challenge);
        assert_ne!(next, first);
        assert_eq!(game.active_challenge().map(|c| &c.id), Some(&next));
    }

    #[test]
    fn five_successes_level_up() {
        let (mut game, clock) = game(5);
        game.start();
        for n in 1..=5 {
            clock.advance_ms(1_000);
            let leveled = assert_matches!(
                answer(&mut game),
                Transition::Succeeded { leveled_up, .. } => leveled_up
            );
            assert_eq!(leveled, n == 5);
            clock.advance_ms(500);
            assert_matches!(game.poll(), Transition::NextChallenge { .. });
        }
        let snap = game.snapshot();
        assert_eq!(snap.level, 2);
        assert_eq!(snap.speed_ms, 29_000);
        assert_eq!(snap.completed_count, 5);
        assert_eq!(snap.progress_within_level, 0);
        assert!(game
            .port()
            .notices
            .iter()
            .any(|n| n.message() == "Level 2! Faster now!"));
        // the new challenge runs on the new speed
        assert_eq!(snap.remaining_whole_seconds, 29);
    }

    #[test]
    fn wrong_input_keeps_challenge_and_countdown() {
        let (mut game, clock) = game(6);
        game.start();
        let id = game.active_challenge().unwrap().id.clone();

        clock.advance_ms(10_000);
        assert_eq!(miss(&mut game), Transition::WrongInput { remaining_ms: 20_000 });
        assert_eq!(game.active_challenge().unwrap().id, id);
        assert_eq!(game.snapshot().remaining_whole_seconds, 20);
        assert_eq!(game.port().last_message(), Some("Wrong! Try again"));

        // the countdown still ends 30s after the original start
        clock.advance_ms(19_999);
        assert_matches!(game.poll(), Transition::Ignored);
        clock.advance_ms(1);
        assert_matches!(game.poll(), Transition::Expired(_));
    }

    #[test]
    fn wrong_then_right_records_one_success() {
        let (mut game, clock) = game(7);
        game.start();
        let id = game.active_challenge().unwrap().id.clone();

        clock.advance_ms(300);
        assert_matches!(miss(&mut game), Transition::WrongInput { .. });
        assert_eq!(game.active_challenge().unwrap().id, id);
        clock.advance_ms(200);
        assert_matches!(
            answer(&mut game),
            Transition::Succeeded {
                reaction_time_ms: 500,
                ..
            }
        );
        assert_eq!(game.state().tracker.completed_count(), 1);
    }

    #[test]
    fn natural_expiry_ends_the_session() {
        let (mut game, clock) = game(8);
        game.start();
        clock.advance_ms(30_000);

        let report = assert_matches!(game.poll(), Transition::Expired(report) => report);
        assert_eq!(report.completed_count, 0);
        assert_eq!(game.status(), Status::Ended);
        assert!(game.state().tracker.reaction_times().is_empty());
        assert_matches!(
            game.port().notices.last(),
            Some(Notice::WithAction { action_label, .. }) if action_label == "Play again"
        );

        // no further input accepted
        assert_eq!(answer(&mut game), Transition::Ignored);
        assert_eq!(game.on_key_input('A'), Transition::Ignored);
        assert_eq!(game.on_pointer_input(true), Transition::Ignored);
        assert_eq!(game.pause(), Transition::Ignored);
    }

    #[test]
    fn input_after_exhaustion_is_an_expiry() {
        let (mut game, clock) = game(9);
        game.start();
        clock.advance_ms(31_000);

        // not polled yet, but time is gone
        assert_matches!(miss(&mut game), Transition::Expired(_));
        assert_eq!(game.status(), Status::Ended);

        // the session is over for every kind of input
        assert_eq!(game.on_key_input('A'), Transition::Ignored);
        assert_eq!(game.on_pointer_input(true), Transition::Ignored);
        assert_eq!(game.pause(), Transition::Ignored);
        assert_eq!(game.poll(), Transition::Ignored);
        assert_eq!(game.state().tracker.completed_count(), 0);
    }

    #[test]
    fn pause_after_exhaustion_is_an_expiry() {
        let (mut game, clock) = game(22);
        game.start();
        clock.advance_ms(30_000);

        // not polled yet: pausing cannot rescue a spent countdown
        assert_matches!(game.pause(), Transition::Expired(_));
        assert_eq!(game.status(), Status::Ended);
        assert_eq!(game.resume(), Transition::Ignored);
        assert_matches!(
            game.port().notices.last(),
            Some(Notice::WithAction { action_label, .. }) if action_label == "Play again"
        );
        assert_eq!(game.poll(), Transition::Ignored);
    }

    #[test]
    fn correct_answer_after_exhaustion_is_an_expiry() {
        let (mut game, clock) = game(10);
        game.start();
        clock.advance_ms(30_000);
        assert_matches!(answer(&mut game), Transition::Expired(_));
        assert!(game.state().tracker.reaction_times().is_empty());
    }

    #[test]
    fn expired_report_includes_average() {
        let (mut game, clock) = game(11);
        game.start();
        clock.advance_ms(1_000);
        answer(&mut game);
        clock.advance_ms(500);
        game.poll();
        clock.advance_ms(2_000);
        answer(&mut game);
        clock.advance_ms(500);
        game.poll();
        clock.advance_ms(30_000);

        let report = assert_matches!(game.poll(), Transition::Expired(r) => r);
        assert_eq!(report.completed_count, 2);
        assert_eq!(report.average_reaction_ms, 1_500);
        assert_eq!(
            game.port().last_message(),
            Some(
                format!(
                    "Time's up! Score: {} | Average reaction: 1500ms",
                    report.score
                )
                .as_str()
            )
        );
    }

    #[test]
    fn restart_action_starts_a_new_session() {
        let (mut game, clock) = game(12);
        game.start();
        clock.advance_ms(30_000);
        game.poll();

        game.port().last_signal().unwrap().trigger();
        assert_matches!(game.poll(), Transition::Started { .. });
        assert_eq!(game.status(), Status::Running);
        assert_eq!(game.state().tracker.score(), 0);
        // single fire
        assert_eq!(game.poll(), Transition::Ignored);
    }

    #[test]
    fn instructions_action_starts_the_game() {
        let (mut game, _) = game(13);
        game.show_instructions();
        assert_eq!(game.port().last_message(), Some(INSTRUCTIONS));
        assert_eq!(game.poll(), Transition::Ignored);

        game.port().last_signal().unwrap().trigger();
        assert_matches!(game.poll(), Transition::Started { .. });
    }

    #[test]
    fn pause_freezes_the_countdown_and_continue_resumes_it() {
        let (mut game, clock) = game(14);
        game.start();
        let id = game.active_challenge().unwrap().id.clone();

        clock.advance_ms(10_000);
        assert_eq!(game.pause(), Transition::Paused);
        assert_eq!(game.on_key_input('A'), Transition::Ignored);

        clock.advance_ms(120_000);
        assert_eq!(game.poll(), Transition::Ignored);
        assert_eq!(game.status(), Status::Paused);
        assert_eq!(game.snapshot().remaining_whole_seconds, 20);

        assert_eq!(
            game.resume(),
            Transition::Resumed {
                challenge: id.clone(),
                regenerated: false
            }
        );
        assert_eq!(game.snapshot().remaining_whole_seconds, 20);

        // reaction time counts only unpaused time
        clock.advance_ms(2_000);
        assert_matches!(
            answer(&mut game),
            Transition::Succeeded {
                reaction_time_ms: 12_000,
                ..
            }
        );
    }

    #[test]
    fn resumed_countdown_still_expires() {
        let (mut game, clock) = game(15);
        game.start();
        clock.advance_ms(25_000);
        game.pause();
        clock.advance_ms(60_000);
        game.resume();
        clock.advance_ms(4_999);
        assert_eq!(game.poll(), Transition::Ignored);
        clock.advance_ms(1);
        assert_matches!(game.poll(), Transition::Expired(_));
    }

    #[test]
    fn regenerate_policy_deals_a_new_challenge() {
        let tuning = Tuning {
            resume_policy: ResumePolicy::Regenerate,
            ..Tuning::default()
        };
        let (mut game, clock) = game_with(16, tuning);
        game.start();
        let id = game.active_challenge().unwrap().id.clone();
        clock.advance_ms(10_000);
        game.pause();

        let next = assert_matches!(
            game.resume(),
            Transition::Resumed { challenge, regenerated: true } => challenge
        );
        assert_ne!(next, id);
        assert_eq!(game.snapshot().remaining_whole_seconds, 30);
    }

    #[test]
    fn continue_action_on_pause_notice_resumes() {
        let (mut game, _) = game(17);
        game.start();
        game.pause();
        assert_matches!(
            game.port().notices.last(),
            Some(Notice::WithAction { action_label, .. }) if action_label == "Continue"
        );
        game.port().last_signal().unwrap().trigger();
        assert_matches!(game.poll(), Transition::Resumed { .. });
        assert_eq!(game.status(), Status::Running);
    }

    #[test]
    fn pause_during_pacing_deals_on_resume() {
        let (mut game, clock) = game(18);
        game.start();
        clock.advance_ms(100);
        answer(&mut game);
        game.pause();

        // the pacing delay was cancelled
        clock.advance_ms(1_000);
        assert_eq!(game.poll(), Transition::Ignored);
        assert!(game.active_challenge().is_none());

        assert_matches!(
            game.resume(),
            Transition::Resumed {
                regenerated: true,
                ..
            }
        );
        assert!(game.active_challenge().is_some());
    }

    #[test]
    fn toggle_pause_flips() {
        let (mut game, _) = game(19);
        assert_eq!(game.toggle_pause(), Transition::Ignored);
        game.start();
        assert_eq!(game.toggle_pause(), Transition::Paused);
        assert_matches!(game.toggle_pause(), Transition::Resumed { .. });
        assert_eq!(game.status(), Status::Running);
    }

    #[test]
    fn stop_cancels_everything() {
        let (mut game, clock) = game(20);
        game.start();
        clock.advance_ms(100);
        answer(&mut game);

        assert_eq!(game.stop(), Transition::Stopped);
        assert_eq!(game.status(), Status::Idle);
        assert_eq!(game.next_deadline(), None);
        clock.advance_ms(60_000);
        assert_eq!(game.poll(), Transition::Ignored);
        assert_eq!(game.state().tracker.completed_count(), 0);
    }

    #[test]
    fn stale_pointer_id_counts_as_miss() {
        // find a seed whose first challenge is a click target
        let (mut game, _) = (0..200)
            .map(game)
            .find_map(|(mut g, c)| {
                g.start();
                g.active_challenge()
                    .is_some_and(Challenge::is_click)
                    .then_some((g, c))
            })
            .expect("some seed deals a click challenge first");

        let id = game.active_challenge().unwrap().id.clone();
        assert_matches!(
            game.on_target_clicked(&ChallengeId::new("stale")),
            Transition::WrongInput { .. }
        );
        assert_eq!(game.on_key_input('A'), Transition::Ignored);
        assert_matches!(game.on_target_clicked(&id), Transition::Succeeded { .. });
    }

    #[test]
    fn invariants_hold_over_a_long_session() {
        let (mut game, clock) = game(21);
        game.start();
        let mut last_speed = game.snapshot().speed_ms;

        for round in 0..120u64 {
            let speed = game.snapshot().speed_ms;
            let id = game.active_challenge().unwrap().id.clone();
            if round % 3 == 0 {
                clock.advance_ms(50);
                miss(&mut game);
                assert_eq!(game.active_challenge().unwrap().id, id);
            }
            clock.advance_ms(round * 37 % 4_000);
            let reaction = assert_matches!(
                answer(&mut game),
                Transition::Succeeded { reaction_time_ms, .. } => reaction_time_ms
            );
            assert!(reaction <= speed);

            let tracker = &game.state().tracker;
            assert_eq!(tracker.level(), 1 + tracker.completed_count() / 5);
            assert_eq!(tracker.reaction_times().len() as u32, tracker.completed_count());
            assert!(tracker.speed_ms() >= 5_000);
            assert!(tracker.speed_ms() <= last_speed);
            last_speed = tracker.speed_ms();

            clock.advance_ms(500);
            assert_matches!(game.poll(), Transition::NextChallenge { .. });
        }
        assert_eq!(game.snapshot().speed_ms, 6_000);
    }
}

//! Countdown and delay timers.
//!
//! The engine has no thread of its own. The caller polls it with the current
//! monotonic instant and receives whatever became due since the last poll.
//! Remaining time is always derived from the absolute start instant, so a late
//! or irregular poll never accumulates drift.
//!
//! ```text
//! start/start_at -> Progress* / Readout* -> Expired   (countdown)
//! delay          -> Elapsed                          (one-shot)
//! cancel         -> nothing, ever again, for that token
//! ```

use std::time::{Duration, Instant};

/// Default cadence for progress-bar updates.
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(50);
/// Default cadence for the whole-seconds readout.
pub const READOUT_INTERVAL: Duration = Duration::from_millis(100);

/// Handle for one scheduled timer. Never reused within an engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

/// Countdown state at a point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerSnapshot {
    pub started_at: Instant,
    pub duration: Duration,
}

impl TimerSnapshot {
    pub fn new(started_at: Instant, duration: Duration) -> Self {
        Self {
            started_at,
            duration,
        }
    }

    /// A countdown of `duration` with `remaining` left at `now`. The origin is
    /// moved back by the time already used. If `now` is too early to move it
    /// that far, the countdown starts at `now` and runs for `remaining` only.
    pub fn resumed(duration: Duration, remaining: Duration, now: Instant) -> Self {
        let remaining = remaining.min(duration);
        match now.checked_sub(duration - remaining) {
            Some(started_at) => Self::new(started_at, duration),
            None => Self::new(now, remaining),
        }
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration.as_millis() as u64
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_at)
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.duration.saturating_sub(self.elapsed(now))
    }

    pub fn remaining_ms(&self, now: Instant) -> u64 {
        self.remaining(now).as_millis() as u64
    }

    /// 1.0 at start, 0.0 at expiry.
    pub fn remaining_fraction(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 0.0;
        }
        self.remaining(now).as_secs_f64() / self.duration.as_secs_f64()
    }

    /// Remaining time rounded up to whole seconds; 0 only once expired.
    pub fn remaining_whole_seconds(&self, now: Instant) -> u64 {
        self.remaining_ms(now).div_ceil(1000)
    }

    pub fn is_exhausted(&self, now: Instant) -> bool {
        self.remaining(now).is_zero()
    }

    pub fn expires_at(&self) -> Instant {
        self.started_at + self.duration
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TimerEventKind {
    /// Progress-bar update.
    Progress {
        remaining_fraction: f64,
        remaining_seconds: u64,
    },
    /// Whole-seconds readout update.
    Readout { remaining_seconds: u64 },
    /// Countdown reached zero. Fires once, then the timer is gone.
    Expired,
    /// One-shot delay elapsed.
    Elapsed,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimerEvent {
    pub token: TimerToken,
    pub kind: TimerEventKind,
}

#[derive(Debug, Clone)]
enum Schedule {
    Countdown {
        snapshot: TimerSnapshot,
        next_progress: Instant,
        next_readout: Instant,
    },
    Delay {
        due: Instant,
    },
}

#[derive(Debug, Clone)]
struct Timer {
    token: TimerToken,
    schedule: Schedule,
}

impl Timer {
    fn next_due(&self) -> Instant {
        match &self.schedule {
            Schedule::Countdown {
                snapshot,
                next_progress,
                next_readout,
            } => (*next_progress).min(*next_readout).min(snapshot.expires_at()),
            Schedule::Delay { due } => *due,
        }
    }
}

/// Owns every pending countdown and delay.
#[derive(Debug, Clone)]
pub struct TimerEngine {
    next_token: u64,
    timers: Vec<Timer>,
    progress_interval: Duration,
    readout_interval: Duration,
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(PROGRESS_INTERVAL, READOUT_INTERVAL)
    }
}

impl TimerEngine {
    pub fn new(progress_interval: Duration, readout_interval: Duration) -> Self {
        Self {
            next_token: 0,
            timers: Vec::new(),
            progress_interval,
            readout_interval,
        }
    }

    fn issue_token(&mut self) -> TimerToken {
        self.next_token += 1;
        TimerToken(self.next_token)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start a countdown of `duration` beginning at `now`.
    pub fn start(&mut self, duration: Duration, now: Instant) -> TimerToken {
        self.start_at(now, duration, now)
    }

    /// Arm a fresh countdown whose origin is `started_at` (possibly in the
    /// past). Remaining time is whatever is left of `duration` from there.
    pub fn start_at(&mut self, started_at: Instant, duration: Duration, now: Instant) -> TimerToken {
        let token = self.issue_token();
        self.timers.push(Timer {
            token,
            schedule: Schedule::Countdown {
                snapshot: TimerSnapshot::new(started_at, duration),
                // first updates go out on the next poll
                next_progress: now,
                next_readout: now,
            },
        });
        token
    }

    /// Schedule a single `Elapsed` event `after` from `now`.
    pub fn delay(&mut self, after: Duration, now: Instant) -> TimerToken {
        let token = self.issue_token();
        self.timers.push(Timer {
            token,
            schedule: Schedule::Delay { due: now + after },
        });
        token
    }

    /// Idempotent. Returns whether a live timer was removed.
    pub fn cancel(&mut self, token: TimerToken) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.token != token);
        self.timers.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_active(&self, token: TimerToken) -> bool {
        self.timers.iter().any(|t| t.token == token)
    }

    pub fn active_count(&self) -> usize {
        self.timers.len()
    }

    pub fn snapshot(&self, token: TimerToken) -> Option<TimerSnapshot> {
        self.timers.iter().find_map(|t| match &t.schedule {
            Schedule::Countdown { snapshot, .. } if t.token == token => Some(*snapshot),
            _ => None,
        })
    }

    /// Earliest instant at which a poll would produce something.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.iter().map(Timer::next_due).min()
    }

    /// Collect every event due at `now`. Expired countdowns and elapsed delays
    /// are removed before returning.
    pub fn poll(&mut self, now: Instant) -> Vec<TimerEvent> {
        let mut events = Vec::new();
        let progress_interval = self.progress_interval;
        let readout_interval = self.readout_interval;

        self.timers.retain_mut(|timer| {
            let token = timer.token;
            match &mut timer.schedule {
                Schedule::Delay { due } => {
                    if now >= *due {
                        events.push(TimerEvent {
                            token,
                            kind: TimerEventKind::Elapsed,
                        });
                        return false;
                    }
                    true
                }
                Schedule::Countdown {
                    snapshot,
                    next_progress,
                    next_readout,
                } => {
                    // one snapshot per poll so the bar and the readout agree
                    let remaining_fraction = snapshot.remaining_fraction(now);
                    let remaining_seconds = snapshot.remaining_whole_seconds(now);

                    if snapshot.is_exhausted(now) {
                        events.push(TimerEvent {
                            token,
                            kind: TimerEventKind::Progress {
                                remaining_fraction: 0.0,
                                remaining_seconds: 0,
                            },
                        });
                        events.push(TimerEvent {
                            token,
                            kind: TimerEventKind::Expired,
                        });
                        return false;
                    }

                    if now >= *next_progress {
                        events.push(TimerEvent {
                            token,
                            kind: TimerEventKind::Progress {
                                remaining_fraction,
                                remaining_seconds,
                            },
                        });
                        *next_progress = next_tick(*next_progress, progress_interval, now);
                    }
                    if now >= *next_readout {
                        events.push(TimerEvent {
                            token,
                            kind: TimerEventKind::Readout { remaining_seconds },
                        });
                        *next_readout = next_tick(*next_readout, readout_interval, now);
                    }
                    true
                }
            }
        });

        events
    }
}

/// Advance a cadence past `now` without replaying missed ticks.
fn next_tick(previous: Instant, interval: Duration, now: Instant) -> Instant {
    let candidate = previous + interval;
    if candidate > now {
        candidate
    } else {
        now + interval
    }
}

use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind, MouseButton, MouseEventKind};

/// Input the front-end loop reacts to. `Tick` means nothing arrived in time.
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Key(KeyEvent),
    /// Left-button press at terminal cell (column, row).
    Click { column: u16, row: u16 },
    Resize,
    Tick,
}

/// Where keyboard, mouse and resize events come from.
pub trait GameEventSource: Send + 'static {
    /// Wait at most `timeout` for the next event.
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError>;
}

/// Map a raw crossterm event onto the events the game cares about.
pub fn translate(ev: CtEvent) -> Option<GameEvent> {
    match ev {
        // key release/repeat reports would count as extra answers
        CtEvent::Key(key) if key.kind == KeyEventKind::Press => Some(GameEvent::Key(key)),
        CtEvent::Mouse(mouse) => match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => Some(GameEvent::Click {
                column: mouse.column,
                row: mouse.row,
            }),
            _ => None,
        },
        CtEvent::Resize(_, _) => Some(GameEvent::Resize),
        _ => None,
    }
}

/// Reads the real terminal on a background thread.
pub struct CrosstermEventSource {
    rx: Receiver<GameEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (events, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(ev) => {
                    if let Some(ev) = translate(ev) {
                        if events.send(ev).is_err() {
                            break;
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(%err, "terminal event reader stopped");
                    break;
                }
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl GameEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Upper bound on how long the loop sleeps between redraws.
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Events fed from a channel, for tests and scripted runs.
pub struct TestEventSource {
    rx: Receiver<GameEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<GameEvent>) -> Self {
        Self { rx }
    }
}

impl GameEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Pulls one event (or a tick) per call.
pub struct Runner<E: GameEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: GameEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Next event, or `Tick` once the tick interval passes quietly.
    pub fn step(&self) -> GameEvent {
        self.step_within(self.ticker.interval())
    }

    /// Like `step`, but never waits longer than `limit`. Lets the caller wake
    /// up exactly when the engine's next timer is due.
    pub fn step_within(&self, limit: Duration) -> GameEvent {
        let timeout = limit.min(self.ticker.interval());
        match self.event_source.recv_timeout(timeout) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => GameEvent::Tick,
        }
    }
}

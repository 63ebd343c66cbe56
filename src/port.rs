//! Seams between the engine and whatever presents it.
//!
//! The engine pushes text and progress values out through these traits and
//! never renders anything itself.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
enum SignalState {
    #[default]
    Pending,
    Triggered,
    Consumed,
}

/// Single-fire flag linking a notification action button to the engine.
///
/// The surface calls [`ActionSignal::trigger`] when the player picks the
/// action; the engine calls [`ActionSignal::take`] while polling. Each signal
/// fires at most once.
#[derive(Clone, Debug, Default)]
pub struct ActionSignal(Rc<Cell<SignalState>>);

impl ActionSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the signal already fired.
    pub fn trigger(&self) -> bool {
        if self.0.get() == SignalState::Pending {
            self.0.set(SignalState::Triggered);
            true
        } else {
            false
        }
    }

    /// True exactly once, after a trigger.
    pub fn take(&self) -> bool {
        if self.0.get() == SignalState::Triggered {
            self.0.set(SignalState::Consumed);
            true
        } else {
            false
        }
    }

    pub fn is_pending(&self) -> bool {
        self.0.get() == SignalState::Pending
    }
}

/// Transient message surface (toast, snackbar, status line).
pub trait NotificationPort {
    fn show_transient(&mut self, message: &str, duration: Duration);
    fn show_with_action(
        &mut self,
        message: &str,
        action_label: &str,
        duration: Duration,
    ) -> ActionSignal;
}

/// Receives countdown values for the progress indicator.
pub trait DisplayPort: NotificationPort {
    /// Fraction of the countdown still left, 1.0 down to 0.0.
    fn show_progress(&mut self, remaining_fraction: f64);
    fn show_seconds(&mut self, remaining_seconds: u64);
}

/// Implemented by the surrounding screen, never called by the engine.
pub trait NavigationPort {
    fn go_to_menu(&mut self);
}

#[derive(Clone, Debug, PartialEq)]
pub enum Notice {
    Transient {
        message: String,
        duration: Duration,
    },
    WithAction {
        message: String,
        action_label: String,
        duration: Duration,
    },
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Transient { message, .. } | Notice::WithAction { message, .. } => message,
        }
    }
}

/// Port that remembers everything it was told. Used by headless drivers and
/// tests.
#[derive(Debug, Default)]
pub struct RecordingPort {
    pub notices: Vec<Notice>,
    pub signals: Vec<ActionSignal>,
    pub progress: Vec<f64>,
    pub seconds: Vec<u64>,
}

impl RecordingPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_message(&self) -> Option<&str> {
        self.notices.last().map(Notice::message)
    }

    pub fn last_signal(&self) -> Option<&ActionSignal> {
        self.signals.last()
    }

    pub fn last_progress(&self) -> Option<f64> {
        self.progress.last().copied()
    }
}

impl NotificationPort for RecordingPort {
    fn show_transient(&mut self, message: &str, duration: Duration) {
        self.notices.push(Notice::Transient {
            message: message.to_string(),
            duration,
        });
    }

    fn show_with_action(
        &mut self,
        message: &str,
        action_label: &str,
        duration: Duration,
    ) -> ActionSignal {
        self.notices.push(Notice::WithAction {
            message: message.to_string(),
            action_label: action_label.to_string(),
            duration,
        });
        let signal = ActionSignal::new();
        self.signals.push(signal.clone());
        signal
    }
}

impl DisplayPort for RecordingPort {
    fn show_progress(&mut self, remaining_fraction: f64) {
        self.progress.push(remaining_fraction);
    }

    fn show_seconds(&mut self, remaining_seconds: u64) {
        self.seconds.push(remaining_seconds);
    }
}

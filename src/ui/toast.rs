use std::time::{Duration, Instant};

use reflex::clock::{Clock, SystemClock};
use reflex::port::{ActionSignal, DisplayPort, NotificationPort};

/// One line of feedback, optionally with an action the player can pick.
#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub action: Option<(String, ActionSignal)>,
    pub expires_at: Instant,
}

impl Toast {
    pub fn action_label(&self) -> Option<&str> {
        self.action.as_ref().map(|(label, _)| label.as_str())
    }
}

/// Terminal-side notification and progress sink handed to the engine.
///
/// A new toast replaces the one on screen, like a snackbar. Expiry is
/// measured on the surface's own clock.
#[derive(Debug)]
pub struct ToastSurface<C: Clock = SystemClock> {
    clock: C,
    current: Option<Toast>,
    remaining_fraction: f64,
    remaining_seconds: u64,
}

impl Default for ToastSurface {
    fn default() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl ToastSurface {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: Clock> ToastSurface<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            current: None,
            remaining_fraction: 1.0,
            remaining_seconds: 0,
        }
    }

    pub fn current(&self) -> Option<&Toast> {
        self.current.as_ref()
    }

    pub fn remaining_fraction(&self) -> f64 {
        self.remaining_fraction
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    /// Drop the toast once its time is up.
    pub fn expire(&mut self) {
        let now = self.clock.now();
        if self.current.as_ref().is_some_and(|t| now >= t.expires_at) {
            self.current = None;
        }
    }

    /// Pick the action on the visible toast, if it has one.
    pub fn trigger_action(&mut self) -> bool {
        match self.current.take() {
            Some(Toast {
                action: Some((_, signal)),
                ..
            }) => signal.trigger(),
            other => {
                self.current = other;
                false
            }
        }
    }

    fn push(&mut self, message: &str, action: Option<(String, ActionSignal)>, duration: Duration) {
        self.current = Some(Toast {
            message: message.to_string(),
            action,
            expires_at: self.clock.now() + duration,
        });
    }
}

impl<C: Clock> NotificationPort for ToastSurface<C> {
    fn show_transient(&mut self, message: &str, duration: Duration) {
        self.push(message, None, duration);
    }

    fn show_with_action(
        &mut self,
        message: &str,
        action_label: &str,
        duration: Duration,
    ) -> ActionSignal {
        let signal = ActionSignal::new();
        self.push(
            message,
            Some((action_label.to_string(), signal.clone())),
            duration,
        );
        signal
    }
}

impl<C: Clock> DisplayPort for ToastSurface<C> {
    fn show_progress(&mut self, remaining_fraction: f64) {
        self.remaining_fraction = remaining_fraction.clamp(0.0, 1.0);
    }

    fn show_seconds(&mut self, remaining_seconds: u64) {
        self.remaining_seconds = remaining_seconds;
    }
}

// Headless game engine. The terminal front-end in main.rs and ui.rs sits on
// top of this and nothing here depends on it.
pub mod app_dirs;
pub mod challenge;
pub mod clock;
pub mod config;
pub mod game;
pub mod port;
pub mod runtime;
pub mod score;
pub mod timer;
pub mod util;

pub use challenge::{Challenge, ChallengeId, ChallengeKind, Position};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, ResumePolicy, Tuning};
pub use game::{FinalReport, Game, GameState, Snapshot, Status, Transition};
pub use port::{ActionSignal, DisplayPort, NavigationPort, NotificationPort};

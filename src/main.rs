mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use rand::{rngs::StdRng, SeedableRng};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    Terminal,
};
use reflex::{
    app_dirs::AppDirs,
    config::{ConfigStore, FileConfigStore},
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, Runner},
    Config, Game, NavigationPort, ResumePolicy, Status, SystemClock, Transition, Tuning,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing_subscriber::EnvFilter;

use crate::ui::toast::ToastSurface;

const TICK_RATE_MS: u64 = 25;

/// reaction-time trainer: hit the key or click the target before time runs out
#[derive(Parser, Debug, Clone)]
#[clap(version, about)]
pub struct Cli {
    /// starting countdown per challenge, in milliseconds
    #[clap(short = 's', long)]
    speed: Option<u64>,

    /// shortest countdown the game speeds up to, in milliseconds
    #[clap(long)]
    min_speed: Option<u64>,

    /// what resuming does with the challenge that was paused
    #[clap(short = 'r', long, value_enum)]
    resume: Option<ResumePolicy>,

    /// seed for a reproducible challenge sequence
    #[clap(long)]
    seed: Option<u64>,

    /// write the effective settings to the config file
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Command-line flags win over the stored config.
    fn apply(&self, mut config: Config) -> Config {
        if let Some(speed) = self.speed {
            config.initial_speed_ms = speed;
        }
        if let Some(min_speed) = self.min_speed {
            config.min_speed_ms = min_speed;
        }
        if let Some(resume) = self.resume {
            config.resume_policy = resume;
        }
        config
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppScreen {
    Menu,
    Game,
}

pub struct App {
    pub screen: AppScreen,
    pub game: Game<SystemClock, StdRng, ToastSurface>,
    /// Last area drawn, for mouse hit testing.
    pub viewport: Rect,
    pub should_quit: bool,
}

impl App {
    pub fn new(tuning: Tuning, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            screen: AppScreen::Menu,
            game: Game::new(SystemClock, rng, ToastSurface::new(), tuning),
            viewport: Rect::default(),
            should_quit: false,
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Transition {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            // ctrl+c to quit
            if key.code == KeyCode::Char('c') {
                self.should_quit = true;
            }
            return Transition::Ignored;
        }

        match self.screen {
            AppScreen::Menu => {
                match key.code {
                    KeyCode::Enter => {
                        self.screen = AppScreen::Game;
                        self.game.show_instructions();
                    }
                    KeyCode::Esc | KeyCode::Char('q') => self.should_quit = true,
                    _ => {}
                }
                Transition::Ignored
            }
            AppScreen::Game => match key.code {
                KeyCode::Esc => {
                    self.go_to_menu();
                    Transition::Stopped
                }
                KeyCode::Tab => self.game.toggle_pause(),
                KeyCode::Enter => {
                    if self.game.port_mut().trigger_action() {
                        self.game.poll()
                    } else if matches!(self.game.status(), Status::Idle | Status::Ended) {
                        self.game.start()
                    } else {
                        Transition::Ignored
                    }
                }
                KeyCode::Char(c) => self.game.on_key_input(c),
                _ => Transition::Ignored,
            },
        }
    }

    pub fn on_click(&mut self, column: u16, row: u16) -> Transition {
        if self.screen != AppScreen::Game {
            return Transition::Ignored;
        }
        let Some(pos) = self
            .game
            .active_challenge()
            .and_then(|challenge| challenge.position())
        else {
            return Transition::Ignored;
        };
        match ui::click_hits_target(ui::play_inner(self.viewport), pos, column, row) {
            Some(hit) => self.game.on_pointer_input(hit),
            // clicks on the header or legend are not answers
            None => Transition::Ignored,
        }
    }

    pub fn on_tick(&mut self) -> Transition {
        self.game.port_mut().expire();
        self.game.poll()
    }
}

impl NavigationPort for App {
    fn go_to_menu(&mut self) {
        self.game.stop();
        self.screen = AppScreen::Menu;
    }
}

fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(dir) = path.parent() {
        if fs::create_dir_all(dir).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    let store = FileConfigStore::new();
    let config = cli.apply(store.load());
    let tuning = match config.tuning() {
        Ok(tuning) => tuning,
        Err(err) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::ValueValidation, err).exit();
        }
    };
    if cli.save_config {
        store.save(&config)?;
        tracing::info!(path = %store.path().display(), "saved config");
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(tuning, cli.seed);
    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let tick = Duration::from_millis(TICK_RATE_MS);
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::new(tick));

    while !app.should_quit {
        terminal.draw(|f| {
            app.viewport = f.area();
            f.render_widget(&*app, f.area());
        })?;

        // wake up no later than the engine's next due timer
        let limit = app
            .game
            .next_deadline()
            .map(|due| due.saturating_duration_since(Instant::now()))
            .unwrap_or(tick);

        let transition = match runner.step_within(limit) {
            GameEvent::Key(key) => app.on_key(key),
            GameEvent::Click { column, row } => app.on_click(column, row),
            GameEvent::Resize | GameEvent::Tick => Transition::Ignored,
        };
        if transition != Transition::Ignored {
            tracing::trace!(?transition, "input handled");
        }
        app.on_tick();
    }

    Ok(())
}

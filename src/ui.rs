pub mod toast;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget, Wrap},
};

use reflex::challenge::{ChallengeKind, Position, TARGET_GLYPH};
use reflex::game::{Snapshot, Status};

use crate::{App, AppScreen};

const HORIZONTAL_MARGIN: u16 = 2;
/// Half the target's hit box, in terminal cells.
const TARGET_HIT_RADIUS_COLS: f64 = 1.5;
const TARGET_HIT_RADIUS_ROWS: f64 = 1.0;

/// Areas of the game screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameLayout {
    pub header: Rect,
    pub level_progress: Rect,
    pub play: Rect,
    pub countdown: Rect,
    pub toast: Rect,
    pub legend: Rect,
}

pub fn game_layout(area: Rect) -> GameLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Length(1), // level progress
            Constraint::Min(5),    // play area
            Constraint::Length(1), // countdown
            Constraint::Length(2), // toast
            Constraint::Length(1), // legend
        ])
        .split(area);

    GameLayout {
        header: chunks[0],
        level_progress: chunks[1],
        play: chunks[2],
        countdown: chunks[3],
        toast: chunks[4],
        legend: chunks[5],
    }
}

/// Cell at which a target at `pos` is centred inside `play`.
pub fn target_cell(play: Rect, pos: Position) -> (u16, u16) {
    let col = (pos.x / 100.0 * play.width as f64) as u16;
    let row = (pos.y / 100.0 * play.height as f64) as u16;
    (
        play.x + col.min(play.width.saturating_sub(1)),
        play.y + row.min(play.height.saturating_sub(1)),
    )
}

/// Whether a click at terminal cell (column, row) lands on the target.
/// `None` when the click is outside the play area altogether.
pub fn click_hits_target(play: Rect, pos: Position, column: u16, row: u16) -> Option<bool> {
    if play.width == 0
        || play.height == 0
        || column < play.x
        || row < play.y
        || column >= play.x + play.width
        || row >= play.y + play.height
    {
        return None;
    }
    let width = play.width as f64;
    let height = play.height as f64;
    let x = ((column - play.x) as f64 + 0.5) / width * 100.0;
    let y = ((row - play.y) as f64 + 0.5) / height * 100.0;
    Some(pos.hit_test(
        x,
        y,
        TARGET_HIT_RADIUS_COLS / width * 100.0,
        TARGET_HIT_RADIUS_ROWS / height * 100.0,
    ))
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.screen {
            AppScreen::Menu => render_menu(area, buf),
            AppScreen::Game => render_game(self, area, buf),
        }
    }
}

fn render_menu(area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Min(0),
        ])
        .split(area);

    Paragraph::new(Span::styled("R E F L E X", bold_style.fg(Color::Cyan)))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        "(enter) play / (q) quit",
        italic_style,
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);
}

fn render_game(app: &App, area: Rect, buf: &mut Buffer) {
    let snapshot = app.game.snapshot();
    let surface = app.game.port();
    let layout = game_layout(area);

    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_bold_style = bold_style.add_modifier(Modifier::DIM);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    render_header(&snapshot, layout.header, buf);

    Gauge::default()
        .gauge_style(Style::default().fg(Color::Blue))
        .percent(snapshot.progress_within_level.min(100) as u16)
        .label(format!("level {}: {}%", snapshot.level, snapshot.progress_within_level))
        .render(layout.level_progress, buf);

    render_play_area(&snapshot, layout.play, buf);

    if matches!(snapshot.status, Status::Running | Status::Paused) {
        let fraction = surface.remaining_fraction();
        let color = if fraction > 0.5 {
            Color::Green
        } else if fraction > 0.2 {
            Color::Yellow
        } else {
            Color::Red
        };
        Gauge::default()
            .gauge_style(Style::default().fg(color))
            .ratio(fraction)
            .label(Span::styled(
                format!("{}s", surface.remaining_seconds()),
                dim_bold_style,
            ))
            .render(layout.countdown, buf);
    }

    if let Some(toast) = surface.current() {
        let mut spans = vec![Span::styled(toast.message.clone(), bold_style)];
        if let Some(label) = toast.action_label() {
            spans.push(Span::styled(
                format!("  [enter: {label}]"),
                bold_style.fg(Color::Cyan),
            ));
        }
        Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(layout.toast, buf);
    }

    Paragraph::new(Span::styled(
        "(tab) pause / (enter) action / (esc) menu",
        italic_style,
    ))
    .alignment(Alignment::Center)
    .render(layout.legend, buf);
}

fn render_header(snapshot: &Snapshot, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);

    let mut spans = vec![
        Span::styled(format!("score {}", snapshot.score), bold_style),
        Span::raw("   "),
        Span::styled(format!("level {}", snapshot.level), bold_style),
        Span::raw("   "),
        Span::raw(format!("avg {}ms", snapshot.average_reaction_time)),
        Span::raw("   "),
        Span::raw(format!("{:.1}s per challenge", snapshot.speed_ms as f64 / 1000.0)),
    ];
    if snapshot.status == Status::Paused {
        spans.push(Span::raw("   "));
        spans.push(Span::styled(
            "PAUSED",
            bold_style.fg(Color::Yellow),
        ));
    }

    Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("reflex"))
        .alignment(Alignment::Center)
        .render(area, buf);
}

fn render_play_area(snapshot: &Snapshot, area: Rect, buf: &mut Buffer) {
    let block = Block::default().borders(Borders::ALL);
    let inner = block.inner(area);
    block.render(area, buf);

    let message = |text: &str, style: Style, buf: &mut Buffer| {
        let row = Rect {
            y: inner.y + inner.height / 2,
            height: 1.min(inner.height),
            ..inner
        };
        Paragraph::new(Span::styled(text.to_string(), style))
            .alignment(Alignment::Center)
            .render(row, buf);
    };

    match (snapshot.status, &snapshot.active_challenge) {
        (Status::Idle, _) => message(
            "(enter) start",
            Style::default().add_modifier(Modifier::ITALIC),
            buf,
        ),
        (Status::Ended, _) => message(
            &format!(
                "GAME OVER  score {}  avg {}ms  (enter) play again",
                snapshot.score, snapshot.average_reaction_time
            ),
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
            buf,
        ),
        (Status::Paused, _) => message(
            "PAUSED - (tab) to continue",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::ITALIC),
            buf,
        ),
        (Status::Running, Some(challenge)) => match challenge.kind {
            ChallengeKind::Key(_) => message(
                &format!("[ {} ]", challenge.prompt()),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
                buf,
            ),
            ChallengeKind::Click(_) if inner.is_empty() => {}
            ChallengeKind::Click(pos) => {
                let (col, row) = target_cell(inner, pos);
                let start = col.saturating_sub(1).max(inner.x);
                buf.set_stringn(
                    start,
                    row,
                    TARGET_GLYPH,
                    inner.right().saturating_sub(start) as usize,
                    Style::default()
                        .fg(Color::Magenta)
                        .add_modifier(Modifier::BOLD),
                );
            }
        },
        // between challenges
        (Status::Running, None) => {}
    }
}

/// Inner play rect for hit testing, matching what `render_play_area` draws.
pub fn play_inner(area: Rect) -> Rect {
    Block::default().borders(Borders::ALL).inner(game_layout(area).play)
}

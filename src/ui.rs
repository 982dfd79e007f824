use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use fokus::feedback::FeedbackBurst;
use fokus::session::Phase;
use fokus::spawn::TargetKind;
use fokus::spelling::TARGET_WORD;

use crate::App;

const HORIZONTAL_MARGIN: u16 = 5;

pub fn draw(app: &mut App, f: &mut Frame) {
    let area = f.area();
    match app.game.phase {
        Phase::AwaitingStart => render_instructions(f, area),
        Phase::Countdown(n) => render_countdown(n, f, area),
        Phase::Active => render_play(app, f, area),
        Phase::Ended => render_end_dialog(app, f, area),
    }
}

fn render_instructions(f: &mut Frame, area: Rect) {
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let lines = vec![
        Line::from(Span::styled("fokus", bold.fg(Color::Cyan))),
        Line::from(""),
        Line::from(vec![
            Span::styled("green", bold.fg(Color::Green)),
            Span::raw("  tap it repeatedly; the number shows the taps left"),
        ]),
        Line::from(vec![
            Span::styled("yellow", bold.fg(Color::Yellow)),
            Span::raw(" one tap clears it"),
        ]),
        Line::from(vec![
            Span::styled("red", bold.fg(Color::Red)),
            Span::raw(format!(
                "    a distraction; don't tap it, spell {} with the letter keys",
                TARGET_WORD
            )),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "(enter/space) start / (esc)ape",
            Style::default().add_modifier(Modifier::ITALIC),
        )),
    ];

    let widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("how to play"))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(widget, centered_rect(area, 70, 60));
}

fn render_countdown(n: u8, f: &mut Frame, area: Rect) {
    let text = if n == 0 {
        "Start!".to_string()
    } else {
        n.to_string()
    };
    let widget = Paragraph::new(Span::styled(
        text,
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Length(1),
            Constraint::Percentage(45),
        ])
        .split(area);
    f.render_widget(widget, chunks[1]);
}

fn render_play(app: &mut App, f: &mut Frame, area: Rect) {
    let game = &app.game;
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(1), // score
            Constraint::Length(1), // notice
            Constraint::Min(3),    // target
            Constraint::Length(1), // hint
            Constraint::Length(1), // letter bank
            Constraint::Length(1), // legend
        ])
        .split(area);

    let score = Paragraph::new(Span::styled(format!("score {}", game.score), bold))
        .alignment(Alignment::Center);
    f.render_widget(score, chunks[0]);

    if let Some(notice) = &game.notice {
        let warn = Paragraph::new(Span::styled(
            notice.clone(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center);
        f.render_widget(warn, chunks[1]);
    }

    let target = if game.target.visible {
        match game.target.kind {
            TargetKind::FocusMultiTap => Paragraph::new(Span::styled(
                format!("({})", game.target.remaining_taps),
                bold.fg(Color::Green),
            )),
            TargetKind::QuickWin => Paragraph::new(Span::styled("( )", bold.fg(Color::Yellow))),
            TargetKind::Distractor => Paragraph::new(Span::styled("(!)", bold.fg(Color::Red))),
        }
    } else {
        Paragraph::new(Span::styled("...", dim))
    };
    f.render_widget(target.alignment(Alignment::Center), centered_rect(chunks[2], 30, 100));

    let hint = hint_line(app);
    if !hint.is_empty() {
        let widget = Paragraph::new(Span::styled(
            hint,
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center);
        f.render_widget(widget, chunks[3]);
    }

    let typed = game.attempt.typed();
    let letters: Vec<Span> = game
        .letters
        .letters()
        .iter()
        .flat_map(|&c| {
            let style = if typed.contains(&c) {
                bold.fg(Color::Cyan)
            } else {
                bold
            };
            [Span::styled(format!("[{}]", c), style), Span::raw(" ")]
        })
        .collect();
    let bank = Paragraph::new(Line::from(letters)).alignment(Alignment::Center);
    f.render_widget(bank, chunks[4]);

    let legend = Paragraph::new(Span::styled(
        "(space) tap / letter keys spell / (d)one training / (esc)ape",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center);
    f.render_widget(legend, chunks[5]);

    if game.feedback.is_active {
        render_burst_particles(&game.feedback, area, f.buffer_mut());
    }
}

/// First-encounter tooltips, shown until a target of the kind has been
/// cleared once, plus the nudge for tapping a red circle.
fn hint_line(app: &App) -> String {
    let game = &app.game;
    if !game.target.visible {
        return String::new();
    }
    if game.hints.red_tap_hint {
        return format!(
            "ignore the red circle! spell {} with the letters below",
            TARGET_WORD
        );
    }
    match game.target.kind {
        TargetKind::FocusMultiTap if !game.hints.seen_green => {
            "a focus target: tap it until the counter reaches zero".to_string()
        }
        TargetKind::QuickWin if !game.hints.seen_yellow => {
            "quick win: one tap clears it".to_string()
        }
        TargetKind::Distractor if !game.hints.seen_red => format!(
            "a distraction: don't tap, spell {} instead",
            TARGET_WORD
        ),
        _ => String::new(),
    }
}

fn render_end_dialog(app: &mut App, f: &mut Frame, area: Rect) {
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let email_line = if app.game.contact_submitted {
        Line::from(Span::styled("Thanks!", bold.fg(Color::Green)))
    } else {
        Line::from(vec![
            Span::raw("email: "),
            Span::styled(app.email_input.clone(), bold),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ])
    };

    let mut lines = vec![
        Line::from(Span::styled("Great focus session!", bold.fg(Color::Cyan))),
        Line::from(""),
        Line::from(format!("You scored {} points.", app.game.score)),
        Line::from(""),
        Line::from("Want to hear about new focus drills? Leave an email."),
        email_line,
        Line::from(""),
        Line::from(Span::styled(
            "type email + (enter) submit / (←) play again / (esc)ape",
            Style::default().add_modifier(Modifier::ITALIC),
        )),
    ];

    if let Some(notice) = &app.game.notice {
        lines.push(Line::from(Span::styled(
            notice.clone(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        )));
    }

    let widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("session over"))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(widget, centered_rect(area, 70, 60));
}

/// Render feedback particles on top of the play screen
fn render_burst_particles(burst: &FeedbackBurst, area: Rect, buf: &mut Buffer) {
    let colors = [
        Color::Yellow,
        Color::Magenta,
        Color::Cyan,
        Color::Green,
        Color::Red,
        Color::Blue,
        Color::LightYellow,
    ];

    for particle in &burst.particles {
        let x = particle.x as u16;
        let y = particle.y as u16;

        if x < area.width && y < area.height {
            let color = colors[particle.color_index % colors.len()];

            // Fade with age
            let alpha = 1.0 - (particle.age / particle.max_age);
            let style = if alpha > 0.7 {
                Style::default().fg(color).add_modifier(Modifier::BOLD)
            } else if alpha > 0.3 {
                Style::default().fg(color)
            } else {
                Style::default().fg(color).add_modifier(Modifier::DIM)
            };

            if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
                cell.set_symbol(&particle.symbol.to_string());
                cell.set_style(style);
            }
        }
    }
}

/// Center a child rect of the given percentage size inside `area`.
fn centered_rect(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

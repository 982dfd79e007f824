mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    time::Duration,
};

use fokus::config::{Config, ConfigStore, FileConfigStore};
use fokus::game::Game;
use fokus::runtime::{CrosstermEventSource, FixedTicker, GameEvent, Runner};
use fokus::score_sink::{ScoreSink, SqliteScoreSink};
use fokus::session::Phase;
use fokus::spawn::{RandomSource, SeededSource, ThreadRngSource};
use fokus::TICK_RATE_MS;

/// reaction/focus training tui
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A reaction/focus training TUI. Tap green circles down to zero, grab yellow ones with a single tap, and counter red distractions by spelling FOCUS from the scrambled letters."
)]
pub struct Cli {
    /// seed the spawn randomness for a reproducible run
    #[clap(short = 's', long)]
    seed: Option<u64>,

    /// delay in milliseconds between a cleared target and the next spawn
    #[clap(long)]
    respawn_delay_ms: Option<u64>,

    /// countdown start value before a round begins
    #[clap(short = 'c', long)]
    countdown: Option<u8>,

    /// keep scores local only, skip the on-disk score record
    #[clap(long)]
    no_db: bool,

    /// persist the resulting settings as the new defaults
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Layer CLI overrides on top of the stored configuration.
    fn apply_to(&self, config: &mut Config) {
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(ms) = self.respawn_delay_ms {
            config.respawn_delay_ms = ms;
        }
        if let Some(n) = self.countdown {
            config.countdown_from = n;
        }
        if self.no_db {
            config.use_db = false;
        }
    }
}

#[derive(Debug)]
pub struct App {
    pub game: Game,
    /// Email being typed into the end dialog.
    pub email_input: String,
}

impl App {
    pub fn new(config: Config) -> Self {
        let rng: Box<dyn RandomSource> = match config.seed {
            Some(seed) => Box::new(SeededSource::new(seed)),
            None => Box::new(ThreadRngSource),
        };
        let sink: Option<Box<dyn ScoreSink>> = if config.use_db {
            SqliteScoreSink::new()
                .ok()
                .map(|s| Box::new(s) as Box<dyn ScoreSink>)
        } else {
            None
        };

        Self {
            game: Game::new(config.to_game_config(), sink, rng),
            email_input: String::new(),
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let store = FileConfigStore::new();
    let mut config = store.load();
    cli.apply_to(&mut config);
    if cli.save_config {
        store.save(&config)?;
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config);
    let result = run(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    let size = terminal.size()?;
    app.game.set_viewport(size.width, size.height);
    terminal.draw(|f| ui::draw(app, f))?;

    loop {
        match runner.step() {
            GameEvent::Tick => {
                app.game.on_tick();

                // Redraw on ticks only while something is moving on screen
                let animating = matches!(app.game.phase, Phase::Countdown(_) | Phase::Active)
                    || app.game.feedback.is_active;
                if animating {
                    terminal.draw(|f| ui::draw(app, f))?;
                }
            }
            GameEvent::Resize(w, h) => {
                app.game.set_viewport(w, h);
                terminal.draw(|f| ui::draw(app, f))?;
            }
            GameEvent::Key(key) => {
                if handle_key(app, key) == KeyOutcome::Quit {
                    break;
                }
                terminal.draw(|f| ui::draw(app, f))?;
            }
        }
    }

    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum KeyOutcome {
    Continue,
    Quit,
}

fn handle_key(app: &mut App, key: KeyEvent) -> KeyOutcome {
    if key.code == KeyCode::Esc
        || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
    {
        return KeyOutcome::Quit;
    }

    match app.game.phase {
        Phase::AwaitingStart => {
            if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
                app.game.start();
            }
        }
        Phase::Countdown(_) => {}
        Phase::Active => match key.code {
            KeyCode::Enter | KeyCode::Char(' ') => app.game.on_tap(),
            KeyCode::Char('d') | KeyCode::Char('D') => app.game.end_session(),
            KeyCode::Char(c) if app.game.letters.contains(c.to_ascii_uppercase()) => {
                app.game.on_letter(c);
            }
            _ => {}
        },
        Phase::Ended => match key.code {
            KeyCode::Enter => {
                let email = app.email_input.clone();
                app.game.attach_contact(&email);
            }
            KeyCode::Backspace => {
                app.email_input.pop();
            }
            KeyCode::Left => {
                app.email_input.clear();
                app.game.play_again();
            }
            KeyCode::Char(c) => app.email_input.push(c),
            _ => {}
        },
    }

    KeyOutcome::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use fokus::spawn::TargetKind;

    fn test_app() -> App {
        App::new(Config {
            seed: Some(1),
            use_db: false,
            ..Config::default()
        })
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn run_countdown(app: &mut App) {
        for _ in 0..40 {
            app.game.on_tick();
        }
        assert_eq!(app.game.phase, Phase::Active);
    }

    #[test]
    fn cli_default_values() {
        let cli = Cli::parse_from(["fokus"]);
        assert_eq!(cli.seed, None);
        assert_eq!(cli.respawn_delay_ms, None);
        assert_eq!(cli.countdown, None);
        assert!(!cli.no_db);
        assert!(!cli.save_config);
    }

    #[test]
    fn cli_overrides_config() {
        let cli = Cli::parse_from([
            "fokus",
            "-s",
            "42",
            "--respawn-delay-ms",
            "2000",
            "-c",
            "5",
            "--no-db",
        ]);
        let mut config = Config::default();
        cli.apply_to(&mut config);

        assert_eq!(config.seed, Some(42));
        assert_eq!(config.respawn_delay_ms, 2000);
        assert_eq!(config.countdown_from, 5);
        assert!(!config.use_db);
    }

    #[test]
    fn cli_without_flags_keeps_config() {
        let cli = Cli::parse_from(["fokus"]);
        let mut config = Config {
            respawn_delay_ms: 2000,
            countdown_from: 5,
            seed: Some(9),
            use_db: true,
        };
        cli.apply_to(&mut config);
        assert_eq!(config.respawn_delay_ms, 2000);
        assert_eq!(config.seed, Some(9));
        assert!(config.use_db);
    }

    #[test]
    fn enter_starts_the_session() {
        let mut app = test_app();
        assert_eq!(app.game.phase, Phase::AwaitingStart);
        handle_key(&mut app, key(KeyCode::Enter));
        assert_eq!(app.game.phase, Phase::Countdown(3));
    }

    #[test]
    fn escape_quits_from_any_phase() {
        let mut app = test_app();
        assert_eq!(handle_key(&mut app, key(KeyCode::Esc)), KeyOutcome::Quit);

        let mut app = test_app();
        app.game.start();
        assert_eq!(handle_key(&mut app, key(KeyCode::Esc)), KeyOutcome::Quit);
    }

    #[test]
    fn space_taps_the_target() {
        let mut app = test_app();
        app.game.start();
        run_countdown(&mut app);
        let taps = app.game.target.remaining_taps;

        handle_key(&mut app, key(KeyCode::Char(' ')));
        assert_eq!(app.game.target.remaining_taps, taps - 1);
    }

    #[test]
    fn d_ends_the_session() {
        let mut app = test_app();
        app.game.start();
        run_countdown(&mut app);

        handle_key(&mut app, key(KeyCode::Char('d')));
        assert_eq!(app.game.phase, Phase::Ended);
    }

    #[test]
    fn only_bank_letters_are_forwarded() {
        let mut app = test_app();
        app.game.start();
        run_countdown(&mut app);
        assert_eq!(app.game.target.kind, TargetKind::FocusMultiTap);

        // letters while a green circle is active are ignored by the engine
        handle_key(&mut app, key(KeyCode::Char('f')));
        assert!(app.game.attempt.is_empty());
        assert_eq!(app.game.score, 0);
    }

    #[test]
    fn ended_phase_collects_email() {
        let mut app = test_app();
        app.game.start();
        run_countdown(&mut app);
        handle_key(&mut app, key(KeyCode::Char('d')));

        for c in "me@example.com".chars() {
            handle_key(&mut app, key(KeyCode::Char(c)));
        }
        assert_eq!(app.email_input, "me@example.com");

        handle_key(&mut app, key(KeyCode::Backspace));
        assert_eq!(app.email_input, "me@example.co");
    }

    #[test]
    fn left_arrow_plays_again_and_clears_email() {
        let mut app = test_app();
        app.game.start();
        run_countdown(&mut app);
        handle_key(&mut app, key(KeyCode::Char('d')));
        handle_key(&mut app, key(KeyCode::Char('x')));

        handle_key(&mut app, key(KeyCode::Left));
        assert_eq!(app.game.phase, Phase::AwaitingStart);
        assert!(app.email_input.is_empty());
    }

    #[test]
    fn countdown_ignores_gameplay_keys() {
        let mut app = test_app();
        app.game.start();
        assert_eq!(app.game.phase, Phase::Countdown(3));

        handle_key(&mut app, key(KeyCode::Char(' ')));
        handle_key(&mut app, key(KeyCode::Char('f')));
        assert_eq!(app.game.phase, Phase::Countdown(3));
        assert_eq!(app.game.score, 0);
    }
}

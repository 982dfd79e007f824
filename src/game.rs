use crate::feedback::{BurstIntensity, FeedbackBurst};
use crate::score_sink::{ScoreSink, SessionId};
use crate::session::{GameConfig, HintFlags, Phase, Timers};
use crate::spawn::{self, RandomSource, Target, TargetKind};
use crate::spelling::{LetterBank, LetterOutcome, SpellingAttempt};
use crate::TICK_RATE_MS;

/// The whole game session: phase, score, the active target, the spelling
/// attempt and the deferred-action timers. All mutation happens through the
/// event handlers below, each running to completion on the single event
/// loop thread.
pub struct Game {
    pub phase: Phase,
    pub score: u32,
    pub target: Target,
    pub attempt: SpellingAttempt,
    pub letters: LetterBank,
    pub timers: Timers,
    pub hints: HintFlags,
    pub feedback: FeedbackBurst,
    /// Transient warning surfaced by the UI; cleared on the next scoring
    /// event that succeeds remotely, and on play-again.
    pub notice: Option<String>,
    /// Set once the score sink acknowledges session creation.
    pub remote_session_id: Option<SessionId>,
    /// The end dialog disables re-submission after a successful attach.
    pub contact_submitted: bool,
    pub config: GameConfig,
    viewport: (u16, u16),
    sink: Option<Box<dyn ScoreSink>>,
    rng: Box<dyn RandomSource>,
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("phase", &self.phase)
            .field("score", &self.score)
            .field("target", &self.target)
            .field("timers", &self.timers)
            .field("remote_session_id", &self.remote_session_id)
            .finish_non_exhaustive()
    }
}

impl Game {
    pub fn new(
        config: GameConfig,
        sink: Option<Box<dyn ScoreSink>>,
        mut rng: Box<dyn RandomSource>,
    ) -> Self {
        let mut letters = LetterBank::new();
        letters.shuffle(rng.as_mut());

        Self {
            phase: Phase::AwaitingStart,
            score: 0,
            target: Target::hidden(),
            attempt: SpellingAttempt::new(),
            letters,
            timers: Timers::default(),
            hints: HintFlags::default(),
            feedback: FeedbackBurst::new(),
            notice: None,
            remote_session_id: None,
            contact_submitted: false,
            config,
            viewport: (80, 24),
            sink,
            rng,
        }
    }

    /// Terminal size used to place feedback bursts; updated on resize.
    pub fn set_viewport(&mut self, width: u16, height: u16) {
        self.viewport = (width, height);
    }

    /// Start action: instructions dismissed, countdown begins. Creating the
    /// remote record is best-effort; a failure leaves the session local-only.
    pub fn start(&mut self) {
        if self.phase != Phase::AwaitingStart {
            return;
        }

        self.phase = Phase::Countdown(self.config.countdown_from);
        self.timers.countdown_ms = Some(self.config.countdown_step_ms);

        if let Some(sink) = self.sink.as_mut() {
            match sink.create_session(0) {
                Ok(id) => self.remote_session_id = Some(id),
                Err(e) => {
                    self.notice = Some(format!("couldn't create score record: {}", e));
                }
            }
        }
    }

    /// One event-loop tick (TICK_RATE_MS of wall time). Drives the countdown
    /// steps and the respawn delay; both are cancelable and only fire in the
    /// phase that scheduled them.
    pub fn on_tick(&mut self) {
        self.feedback.update();

        match self.phase {
            Phase::Countdown(n) => {
                if self.expire_timer(TimerKind::Countdown) {
                    if n > 0 {
                        self.phase = Phase::Countdown(n - 1);
                        self.timers.countdown_ms = Some(self.config.countdown_step_ms);
                    } else {
                        self.enter_active();
                    }
                }
            }
            Phase::Active => {
                if self.expire_timer(TimerKind::Respawn) && !self.target.visible {
                    self.spawn_next(false);
                }
            }
            Phase::AwaitingStart | Phase::Ended => {}
        }
    }

    /// Tap on the active circle.
    pub fn on_tap(&mut self) {
        if self.phase != Phase::Active || !self.target.visible {
            return; // defined no-op, not an error
        }

        match self.target.kind {
            TargetKind::QuickWin => {
                self.clear_target(BurstIntensity::Minor);
            }
            TargetKind::FocusMultiTap => {
                self.target.remaining_taps -= 1;
                if self.target.remaining_taps == 0 {
                    self.clear_target(BurstIntensity::Major);
                }
            }
            TargetKind::Distractor => {
                // Tapping a red circle is inert; nudge towards spelling.
                self.hints.red_tap_hint = true;
            }
        }
    }

    /// Letter button press. Ignored unless a red circle is active.
    pub fn on_letter(&mut self, letter: char) {
        if self.phase != Phase::Active
            || !self.target.visible
            || self.target.kind != TargetKind::Distractor
        {
            return; // defined no-op, not an error
        }

        match self.attempt.press(letter.to_ascii_uppercase()) {
            LetterOutcome::Match => {
                self.letters.shuffle(self.rng.as_mut());
                self.clear_target(BurstIntensity::Major);
            }
            LetterOutcome::Progress | LetterOutcome::Reset => {}
        }
    }

    /// Player ends the session. Any pending timer is canceled so nothing
    /// spawns into the ended phase.
    pub fn end_session(&mut self) {
        if self.phase != Phase::Active {
            return;
        }
        self.phase = Phase::Ended;
        self.timers.cancel_all();
    }

    /// Back to the instructions screen with everything reset. The remote
    /// record is discarded; the next start creates a fresh one.
    pub fn play_again(&mut self) {
        if self.phase != Phase::Ended {
            return;
        }

        self.phase = Phase::AwaitingStart;
        self.score = 0;
        self.target = Target::hidden();
        self.attempt.clear();
        self.letters.shuffle(self.rng.as_mut());
        self.timers.cancel_all();
        self.hints.reset();
        self.notice = None;
        self.remote_session_id = None;
        self.contact_submitted = false;
    }

    /// Attach the email the player left in the end dialog. Retryable on
    /// failure; a success disables further submissions.
    pub fn attach_contact(&mut self, email: &str) {
        if self.contact_submitted || email.is_empty() {
            return;
        }
        let (Some(sink), Some(id)) = (self.sink.as_mut(), self.remote_session_id) else {
            self.notice = Some("no score record for this session".to_string());
            return;
        };

        match sink.attach_contact(id, email) {
            Ok(()) => {
                self.contact_submitted = true;
                self.notice = None;
            }
            Err(e) => {
                self.notice = Some(format!("couldn't save contact, try again: {}", e));
            }
        }
    }

    fn enter_active(&mut self) {
        self.phase = Phase::Active;
        self.spawn_next(true);
    }

    /// Spawn the next target. The round opener is always green; afterwards
    /// the 50/25/25 classification applies. Spawning discards any partial
    /// spelling attempt.
    fn spawn_next(&mut self, opener: bool) {
        debug_assert!(!self.target.visible, "spawn while a target is visible");

        self.target = if opener {
            spawn::spawn_opener(self.rng.as_mut())
        } else {
            spawn::spawn_target(self.rng.as_mut())
        };
        self.attempt.clear();
        self.hints.red_tap_hint = false;
    }

    fn clear_target(&mut self, intensity: BurstIntensity) {
        match self.target.kind {
            TargetKind::FocusMultiTap => self.hints.seen_green = true,
            TargetKind::QuickWin => self.hints.seen_yellow = true,
            TargetKind::Distractor => self.hints.seen_red = true,
        }
        self.target.visible = false;
        self.score += 1;
        let (w, h) = self.viewport;
        self.feedback.start(intensity, w, h);
        self.timers.respawn_ms = Some(self.config.respawn_delay_ms);
        self.push_score();
    }

    /// Mirror the score to the sink. Fire-and-forget: an error becomes a
    /// notice, gameplay is untouched.
    fn push_score(&mut self) {
        let (Some(sink), Some(id)) = (self.sink.as_mut(), self.remote_session_id) else {
            return;
        };
        match sink.update_score(id, self.score) {
            Ok(()) => self.notice = None,
            Err(e) => {
                self.notice = Some(format!("score didn't reach the record: {}", e));
            }
        }
    }

    /// Count a timer down by one tick; true when it fires this tick.
    fn expire_timer(&mut self, kind: TimerKind) -> bool {
        let slot = match kind {
            TimerKind::Countdown => &mut self.timers.countdown_ms,
            TimerKind::Respawn => &mut self.timers.respawn_ms,
        };
        match slot {
            Some(ms) => {
                *ms = ms.saturating_sub(TICK_RATE_MS);
                if *ms == 0 {
                    *slot = None;
                    true
                } else {
                    false
                }
            }
            None => false,
        }
    }

}

enum TimerKind {
    Countdown,
    Respawn,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score_sink::{FailingSink, MemorySink};
    use crate::spawn::{ScriptedSource, SeededSource};
    use assert_matches::assert_matches;

    /// Ticks covering one countdown step.
    const STEP_TICKS: u64 = 1000 / TICK_RATE_MS;
    /// Ticks covering the respawn delay.
    const RESPAWN_TICKS: u64 = 1500 / TICK_RATE_MS;

    fn seeded_game() -> Game {
        Game::new(GameConfig::default(), None, Box::new(SeededSource::new(1)))
    }

    fn scripted_game(draws: Vec<f64>) -> Game {
        Game::new(
            GameConfig::default(),
            None,
            Box::new(ScriptedSource::new(draws)),
        )
    }

    fn run_ticks(game: &mut Game, n: u64) {
        for _ in 0..n {
            game.on_tick();
        }
    }

    /// Start and run the full countdown so the game lands in Active with
    /// the opener spawned.
    fn start_active(game: &mut Game) {
        game.start();
        // steps: 3 -> 2 -> 1 -> 0 -> Active
        run_ticks(game, STEP_TICKS * 4);
        assert_eq!(game.phase, Phase::Active);
    }

    #[test]
    fn new_game_awaits_start() {
        let game = seeded_game();
        assert_eq!(game.phase, Phase::AwaitingStart);
        assert_eq!(game.score, 0);
        assert!(!game.target.visible);
        assert_eq!(game.timers, Timers::default());
    }

    #[test]
    fn countdown_steps_once_per_second() {
        let mut game = seeded_game();
        game.start();
        assert_eq!(game.phase, Phase::Countdown(3));

        run_ticks(&mut game, STEP_TICKS - 1);
        assert_eq!(game.phase, Phase::Countdown(3));
        game.on_tick();
        assert_eq!(game.phase, Phase::Countdown(2));

        run_ticks(&mut game, STEP_TICKS);
        assert_eq!(game.phase, Phase::Countdown(1));
        run_ticks(&mut game, STEP_TICKS);
        assert_eq!(game.phase, Phase::Countdown(0));
        run_ticks(&mut game, STEP_TICKS);
        assert_eq!(game.phase, Phase::Active);
    }

    #[test]
    fn first_target_is_always_green_in_range() {
        for seed in 0..20u64 {
            let mut game = Game::new(
                GameConfig::default(),
                None,
                Box::new(SeededSource::new(seed)),
            );
            start_active(&mut game);
            assert_eq!(game.target.kind, TargetKind::FocusMultiTap);
            assert!((3..=6).contains(&game.target.remaining_taps));
            assert!(game.target.visible);
        }
    }

    #[test]
    fn green_needs_exactly_k_taps_and_scores_once() {
        // opener draw 0.0 -> 3 taps
        let mut game = scripted_game(vec![0.0]);
        start_active(&mut game);
        let k = game.target.remaining_taps;
        assert_eq!(k, 3);

        for i in 1..k {
            game.on_tap();
            assert_eq!(game.score, 0, "no score before tap {k}");
            assert!(game.target.visible);
            assert_eq!(game.target.remaining_taps, k - i);
        }
        game.on_tap();
        assert_eq!(game.score, 1);
        assert!(!game.target.visible);
        assert_eq!(game.timers.respawn_ms, Some(1500));
    }

    #[test]
    fn yellow_clears_on_single_tap() {
        // opener taps 0.0, then classification 0.1 -> QuickWin
        let mut game = scripted_game(vec![0.0, 0.1]);
        start_active(&mut game);
        // finish the 3-tap opener
        game.on_tap();
        game.on_tap();
        game.on_tap();
        assert_eq!(game.score, 1);

        run_ticks(&mut game, RESPAWN_TICKS);
        assert_eq!(game.target.kind, TargetKind::QuickWin);
        game.on_tap();
        assert_eq!(game.score, 2);
        assert!(!game.target.visible);
    }

    #[test]
    fn red_tap_is_inert() {
        // opener taps 0.0, then classification 0.9 -> Distractor
        let mut game = scripted_game(vec![0.0, 0.9]);
        start_active(&mut game);
        for _ in 0..3 {
            game.on_tap();
        }
        run_ticks(&mut game, RESPAWN_TICKS);
        assert_eq!(game.target.kind, TargetKind::Distractor);

        for _ in 0..10 {
            game.on_tap();
        }
        assert_eq!(game.score, 1); // only the opener scored
        assert!(game.target.visible);
        assert!(game.hints.red_tap_hint);
    }

    #[test]
    fn spelling_focus_clears_red_and_reshuffles() {
        let mut game = scripted_game(vec![0.0, 0.9]);
        start_active(&mut game);
        for _ in 0..3 {
            game.on_tap();
        }
        run_ticks(&mut game, RESPAWN_TICKS);
        assert_eq!(game.target.kind, TargetKind::Distractor);

        let before: Vec<char> = game.letters.letters().to_vec();
        for c in "FOCUS".chars() {
            game.on_letter(c);
        }
        assert_eq!(game.score, 2);
        assert!(!game.target.visible);
        assert!(game.attempt.is_empty());
        // ScriptedSource shuffles by rotation, so the bank must have moved
        assert_ne!(game.letters.letters(), before.as_slice());
    }

    #[test]
    fn lowercase_letters_are_accepted() {
        let mut game = scripted_game(vec![0.0, 0.9]);
        start_active(&mut game);
        for _ in 0..3 {
            game.on_tap();
        }
        run_ticks(&mut game, RESPAWN_TICKS);

        for c in "focus".chars() {
            game.on_letter(c);
        }
        assert_eq!(game.score, 2);
    }

    #[test]
    fn focal_resets_attempt_without_scoring() {
        let mut game = scripted_game(vec![0.0, 0.9]);
        start_active(&mut game);
        for _ in 0..3 {
            game.on_tap();
        }
        run_ticks(&mut game, RESPAWN_TICKS);

        for c in "FOCAL".chars() {
            game.on_letter(c);
        }
        assert_eq!(game.score, 1);
        assert!(game.target.visible);
        assert!(game.attempt.is_empty());
    }

    #[test]
    fn letters_ignored_while_green_or_yellow_active() {
        let mut game = scripted_game(vec![0.0]);
        start_active(&mut game);
        assert_eq!(game.target.kind, TargetKind::FocusMultiTap);

        for c in "FOCUS".chars() {
            game.on_letter(c);
        }
        assert_eq!(game.score, 0);
        assert!(game.attempt.is_empty());
        assert!(game.target.visible);
    }

    #[test]
    fn input_ignored_while_no_target_visible() {
        let mut game = scripted_game(vec![0.0]);
        start_active(&mut game);
        for _ in 0..3 {
            game.on_tap();
        }
        assert!(!game.target.visible);

        game.on_tap();
        game.on_letter('F');
        assert_eq!(game.score, 1);
        assert!(game.attempt.is_empty());
    }

    #[test]
    fn at_most_one_target_visible_over_a_long_run() {
        let mut game = seeded_game();
        start_active(&mut game);

        for step in 0..2000u64 {
            // alternate taps, letters and ticks
            match step % 4 {
                0 | 1 => game.on_tap(),
                2 => game.on_letter('F'),
                _ => {}
            }
            let was_visible = game.target.visible;
            game.on_tick();
            // a spawn may only happen from a hidden state
            if game.target.visible && !was_visible {
                assert_eq!(game.timers.respawn_ms, None);
            }
        }
    }

    #[test]
    fn respawn_fires_after_fixed_delay() {
        let mut game = scripted_game(vec![0.0, 0.1]);
        start_active(&mut game);
        for _ in 0..3 {
            game.on_tap();
        }
        assert!(!game.target.visible);

        run_ticks(&mut game, RESPAWN_TICKS - 1);
        assert!(!game.target.visible);
        game.on_tick();
        assert!(game.target.visible);
    }

    #[test]
    fn ending_session_cancels_pending_respawn() {
        let mut game = seeded_game();
        start_active(&mut game);
        while game.target.remaining_taps > 0 {
            game.on_tap();
        }
        assert!(game.timers.respawn_ms.is_some());

        game.end_session();
        assert_eq!(game.phase, Phase::Ended);
        assert_eq!(game.timers, Timers::default());

        run_ticks(&mut game, RESPAWN_TICKS * 4);
        assert!(!game.target.visible, "no stray spawn after Ended");
    }

    #[test]
    fn input_not_scored_after_ended() {
        let mut game = seeded_game();
        start_active(&mut game);
        game.end_session();
        let score = game.score;

        game.on_tap();
        game.on_letter('F');
        assert_eq!(game.score, score);
    }

    #[test]
    fn play_again_resets_everything() {
        let mut game = Game::new(
            GameConfig::default(),
            Some(Box::new(MemorySink::new())),
            Box::new(SeededSource::new(5)),
        );
        start_active(&mut game);
        while game.target.remaining_taps > 0 {
            game.on_tap();
        }
        game.end_session();
        assert!(game.score > 0);

        game.play_again();
        assert_eq!(game.phase, Phase::AwaitingStart);
        assert_eq!(game.score, 0);
        assert!(!game.target.visible);
        assert!(game.attempt.is_empty());
        assert_eq!(game.remote_session_id, None);
        assert!(!game.contact_submitted);
        assert!(!game.hints.seen_green);

        let mut sorted: Vec<char> = game.letters.letters().to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, vec!['C', 'F', 'O', 'S', 'U']);
    }

    #[test]
    fn start_creates_remote_session_and_scores_mirror() {
        let mut game = Game::new(
            GameConfig::default(),
            Some(Box::new(MemorySink::new())),
            Box::new(ScriptedSource::new(vec![0.0])),
        );
        start_active(&mut game);
        assert_matches!(game.remote_session_id, Some(_));

        for _ in 0..3 {
            game.on_tap();
        }
        assert_eq!(game.score, 1);
        assert!(game.notice.is_none());
    }

    #[test]
    fn sink_failure_leaves_local_score_authoritative() {
        let mut game = Game::new(
            GameConfig::default(),
            Some(Box::new(FailingSink)),
            Box::new(ScriptedSource::new(vec![0.0])),
        );
        game.start();
        assert_eq!(game.remote_session_id, None);
        assert!(game.notice.is_some());
        // the countdown still runs
        assert_eq!(game.phase, Phase::Countdown(3));

        run_ticks(&mut game, STEP_TICKS * 4);
        for _ in 0..3 {
            game.on_tap();
        }
        assert_eq!(game.score, 1);
    }

    #[test]
    fn attach_contact_is_idempotent_from_caller_side() {
        let mut game = Game::new(
            GameConfig::default(),
            Some(Box::new(MemorySink::new())),
            Box::new(SeededSource::new(9)),
        );
        start_active(&mut game);
        game.end_session();

        game.attach_contact("player@example.com");
        assert!(game.contact_submitted);

        // second call is a no-op by contract
        game.attach_contact("other@example.com");
        assert!(game.contact_submitted);
    }

    #[test]
    fn attach_contact_failure_is_retryable() {
        let mut game = Game::new(
            GameConfig::default(),
            Some(Box::new(FailingSink)),
            Box::new(SeededSource::new(9)),
        );
        start_active(&mut game);
        game.end_session();

        game.attach_contact("player@example.com");
        assert!(!game.contact_submitted);
        assert!(game.notice.is_some());
    }

    #[test]
    fn feedback_burst_fires_on_clear() {
        let mut game = scripted_game(vec![0.0]);
        start_active(&mut game);
        assert!(!game.feedback.is_active);
        for _ in 0..3 {
            game.on_tap();
        }
        assert!(game.feedback.is_active);
        assert_eq!(game.feedback.particles.len(), 100); // major burst for green
    }

    #[test]
    fn hint_flags_flip_on_first_clear() {
        let mut game = scripted_game(vec![0.0, 0.9]);
        start_active(&mut game);
        assert!(!game.hints.seen_green, "green not cleared yet");

        for _ in 0..3 {
            game.on_tap();
        }
        assert!(game.hints.seen_green);

        run_ticks(&mut game, RESPAWN_TICKS);
        assert_eq!(game.target.kind, TargetKind::Distractor);
        assert!(!game.hints.seen_red);
        for c in "FOCUS".chars() {
            game.on_letter(c);
        }
        assert!(game.hints.seen_red);
    }

    #[test]
    fn partial_spelling_discarded_on_session_end() {
        let mut game = scripted_game(vec![0.0, 0.9]);
        start_active(&mut game);
        for _ in 0..3 {
            game.on_tap();
        }
        run_ticks(&mut game, RESPAWN_TICKS);
        game.on_letter('F');
        game.on_letter('O');
        assert!(!game.attempt.is_empty());

        let score = game.score;
        game.end_session();
        game.on_letter('C');
        game.on_letter('U');
        game.on_letter('S');
        assert_eq!(game.score, score);
    }
}

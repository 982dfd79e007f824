use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// The three circle kinds the player has to react to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum TargetKind {
    /// Green circle; needs several taps to clear.
    FocusMultiTap,
    /// Yellow circle; a single tap clears it.
    QuickWin,
    /// Red circle; tapping is inert, spelling the word clears it.
    Distractor,
}

/// The single active on-screen objective.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Target {
    pub kind: TargetKind,
    /// Taps left before the target clears. Only meaningful for FocusMultiTap.
    pub remaining_taps: u32,
    pub visible: bool,
}

impl Target {
    /// Placeholder used before the first spawn and after play-again.
    pub fn hidden() -> Self {
        Self {
            kind: TargetKind::FocusMultiTap,
            remaining_taps: 0,
            visible: false,
        }
    }
}

/// Source of randomness for spawn decisions and letter shuffling.
///
/// Keeping this behind a trait makes spawn-distribution and tap-range tests
/// deterministic; production code plugs in the thread rng.
pub trait RandomSource {
    /// Uniform draw in [0, 1).
    fn next_f64(&mut self) -> f64;
    /// Shuffle the letter bank in place.
    fn shuffle(&mut self, letters: &mut [char]);
}

/// Production source backed by `rand::thread_rng`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngSource;

impl RandomSource for ThreadRngSource {
    fn next_f64(&mut self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }

    fn shuffle(&mut self, letters: &mut [char]) {
        letters.shuffle(&mut rand::thread_rng());
    }
}

/// Seeded source for reproducible runs (`--seed`).
#[derive(Debug, Clone)]
pub struct SeededSource {
    rng: StdRng,
}

impl SeededSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededSource {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn shuffle(&mut self, letters: &mut [char]) {
        letters.shuffle(&mut self.rng);
    }
}

/// Scripted source for unit tests: replays a fixed list of draws.
/// Shuffles rotate the slice so tests see a deterministic reordering.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    draws: Vec<f64>,
    next: usize,
}

impl ScriptedSource {
    pub fn new(draws: Vec<f64>) -> Self {
        Self { draws, next: 0 }
    }
}

impl RandomSource for ScriptedSource {
    fn next_f64(&mut self) -> f64 {
        let v = self.draws.get(self.next).copied().unwrap_or(0.0);
        self.next += 1;
        v
    }

    fn shuffle(&mut self, letters: &mut [char]) {
        letters.rotate_left(1);
    }
}

/// Classify a uniform draw into a target kind.
///
/// The thresholds are part of the game's observable contract:
/// r < 0.5 yields QuickWin, 0.5 <= r < 0.75 yields FocusMultiTap and
/// r >= 0.75 yields Distractor, i.e. a fixed 50/25/25 split.
pub fn classify(r: f64) -> TargetKind {
    if r < 0.5 {
        TargetKind::QuickWin
    } else if r < 0.75 {
        TargetKind::FocusMultiTap
    } else {
        TargetKind::Distractor
    }
}

/// Draw the tap requirement for a green circle: uniform in [3, 6].
fn draw_taps(rng: &mut dyn RandomSource) -> u32 {
    (rng.next_f64() * 4.0) as u32 + 3
}

/// Spawn the next target. Callers must only invoke this while no target
/// is visible.
pub fn spawn_target(rng: &mut dyn RandomSource) -> Target {
    let kind = classify(rng.next_f64());
    let remaining_taps = if kind == TargetKind::FocusMultiTap {
        draw_taps(rng)
    } else {
        0
    };

    Target {
        kind,
        remaining_taps,
        visible: true,
    }
}

/// The very first target of a round is always a green circle, so every
/// session opens with a guaranteed multi-tap objective.
pub fn spawn_opener(rng: &mut dyn RandomSource) -> Target {
    Target {
        kind: TargetKind::FocusMultiTap,
        remaining_taps: draw_taps(rng),
        visible: true,
    }
}

/// Discrete session phase. One tagged enum instead of a pile of booleans,
/// so impossible combinations cannot be represented.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Instructions shown, waiting for the start action.
    AwaitingStart,
    /// Counting down; the payload is the number currently displayed (3..=0).
    Countdown(u8),
    /// Gameplay: targets spawn and input is scored.
    Active,
    /// Session over; score frozen, end dialog shown.
    Ended,
}

/// Cancelable deferred actions owned by the lifecycle controller.
///
/// Each entry is the remaining time in milliseconds until the action fires,
/// decremented by the event-loop tick. Phase exits cancel them all; a timer
/// belonging to a phase the session already left can therefore never fire.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Timers {
    /// Until the next countdown step.
    pub countdown_ms: Option<u64>,
    /// Until the next target spawn after a clear.
    pub respawn_ms: Option<u64>,
}

impl Timers {
    pub fn cancel_all(&mut self) {
        self.countdown_ms = None;
        self.respawn_ms = None;
    }
}

/// Tunable session parameters.
#[derive(Clone, Debug)]
pub struct GameConfig {
    /// Delay between a target clearing and the next spawn.
    pub respawn_delay_ms: u64,
    /// Countdown start value.
    pub countdown_from: u8,
    /// Duration of one countdown step.
    pub countdown_step_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            respawn_delay_ms: 1500,
            countdown_from: 3,
            countdown_step_ms: 1000,
        }
    }
}

/// First-encounter hints surfaced by the UI, plus the "don't tap the red
/// circle" nudge. Reset on play-again.
#[derive(Clone, Debug, Default)]
pub struct HintFlags {
    pub seen_green: bool,
    pub seen_yellow: bool,
    pub seen_red: bool,
    /// Raised when the player taps a red circle instead of spelling.
    pub red_tap_hint: bool,
}

impl HintFlags {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod config;
pub mod feedback;
pub mod game;
pub mod runtime;
pub mod score_sink;
pub mod session;
pub mod spawn;
pub mod spelling;

/// Event-loop tick interval; timers advance in these increments.
pub const TICK_RATE_MS: u64 = 100;

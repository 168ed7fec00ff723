// ── Availability window ──────────────────────────────────────────

pub const MIN_GRANULARITY_MINUTES: u32 = 5;
pub const MAX_GRANULARITY_MINUTES: u32 = 240;

/// Days of candidates generated per computation.
pub const MAX_WINDOW_DAYS: u32 = 31;

// ── Suggestion set bounds ────────────────────────────────────────

pub const MAX_SUGGESTION_DAYS: usize = 14;
pub const MAX_SUGGESTIONS_PER_DAY: usize = 8;

// ── Session inputs ───────────────────────────────────────────────

/// Free-text time and date entries longer than this are rejected outright.
pub const MAX_INPUT_LEN: usize = 64;

pub const MAX_DEBOUNCE_MS: u64 = 5_000;
pub const MAX_QUERY_TIMEOUT_MS: u64 = 60_000;

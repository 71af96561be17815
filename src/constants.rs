//! Constants for board dimensions, the document format and the clock.
//!
//! Board sizes are limited by the coordinate text form: columns are named
//! with the letters `A` to `Z` skipping `I`, which leaves 25 columns.

use std::time::Duration;

// =============================================================================
// Board Geometry
// =============================================================================

/// Board size used when none is given.
pub const DEFAULT_BOARD_SIZE: usize = 19;

/// Smallest supported board size.
pub const MIN_BOARD_SIZE: usize = 1;

/// Largest supported board size.
pub const MAX_BOARD_SIZE: usize = 25;

/// Column letters in order. `I` is skipped to avoid confusion with `J`.
pub const COLUMN_LETTERS: &[u8; MAX_BOARD_SIZE] = b"ABCDEFGHJKLMNOPQRSTUVWXYZ";

// =============================================================================
// Document Format
// =============================================================================

/// First line of every written document.
pub const XML_PROLOGUE: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>";

/// SGF property holding the setup player.
pub const SGF_PLAYER: &str = "PL";

/// SGF properties holding the time left for Black and White.
pub const SGF_TIME_LEFT: [&str; 2] = ["BL", "WL"];

/// SGF properties holding the moves left for Black and White.
pub const SGF_MOVES_LEFT: [&str; 2] = ["OB", "OW"];

// =============================================================================
// Clock
// =============================================================================

/// Default period between clock ticks.
pub const CLOCK_TICK_INTERVAL: Duration = Duration::from_millis(100);

//! Shared utilities for agent-versus-environment board games
//!
//! Cell and winner values follow one convention across games:
//! 0 = empty/none, 1 = searching agent, 2 = opponent, 3 = draw (winner only).

/// Cell owned by nobody
pub const EMPTY: u8 = 0;
/// Cell owned by the searching agent
pub const AGENT: u8 = 1;
/// Cell owned by the environment's opponent
pub const OPPONENT: u8 = 2;
/// Winner value for a finished game without a winner
pub const DRAW: u8 = 3;

/// Calculate reward from the searching agent's perspective.
///
/// # Arguments
/// * `winner` - Winner indicator: 0=ongoing, 1=agent, 2=opponent, 3=draw
///
/// # Returns
/// * `1.0` if the agent won
/// * `-1.0` if the opponent won
/// * `0.0` for draws or ongoing games
///
/// # Example
/// ```
/// use engine_core::game_utils::agent_reward;
///
/// assert_eq!(agent_reward(1), 1.0);
/// assert_eq!(agent_reward(2), -1.0);
/// assert_eq!(agent_reward(3), 0.0);
/// assert_eq!(agent_reward(0), 0.0);
/// ```
#[inline]
pub fn agent_reward(winner: u8) -> f32 {
    match winner {
        AGENT => 1.0,
        OPPONENT => -1.0,
        _ => 0.0,
    }
}

/// Convert a signed cell value (1 = agent, -1 = opponent, 0 = empty) to the
/// unsigned cell convention.
///
/// Returns `None` for values outside the domain.
#[inline]
pub fn cell_from_signed(value: i8) -> Option<u8> {
    match value {
        0 => Some(EMPTY),
        1 => Some(AGENT),
        -1 => Some(OPPONENT),
        _ => None,
    }
}

/// Single-character rendering of a cell for board dumps.
#[inline]
pub fn cell_symbol(cell: u8) -> char {
    match cell {
        AGENT => 'X',
        OPPONENT => 'O',
        _ => '.',
    }
}

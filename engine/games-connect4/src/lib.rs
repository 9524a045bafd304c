//! Connect 4 against a uniformly random opponent
//!
//! Connect 4 is a connection game where discs are dropped into a 7-column,
//! 6-row vertically suspended grid. The objective is to be the first to form a
//! horizontal, vertical, or diagonal line of four discs.
//!
//! Here the searching agent always moves first in a ply and the opponent
//! answers with a uniformly random legal column, drawn from the caller's RNG.
//!
//! # Board Layout
//!
//! The board is stored in row-major order, with row 0 at the bottom:
//! ```text
//! Row 5: [35][36][37][38][39][40][41]  <- Top
//! Row 4: [28][29][30][31][32][33][34]
//! Row 3: [21][22][23][24][25][26][27]
//! Row 2: [14][15][16][17][18][19][20]
//! Row 1: [ 7][ 8][ 9][10][11][12][13]
//! Row 0: [ 0][ 1][ 2][ 3][ 4][ 5][ 6]  <- Bottom
//!         Col 0  1  2  3  4  5  6
//! ```
//!
//! Grids supplied by callers through [`State::from_rows`] are read top row
//! first, with 1 for the agent, -1 for the opponent and 0 for empty.
//!
//! # Usage
//!
//! ```rust
//! use engine_core::Game;
//! use games_connect4::{Connect4, State};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha20Rng;
//!
//! let game = Connect4::new();
//! let mut rng = ChaCha20Rng::seed_from_u64(42);
//! let mut state = State::opening();
//!
//! let ply = game.apply_ply(3, &mut state, &mut rng).unwrap();
//! assert!(!ply.done);
//! assert_eq!(state.moves_played(), 3);
//! ```

use std::fmt;

use engine_core::game_utils::{
    agent_reward, cell_from_signed, cell_symbol, AGENT, DRAW, EMPTY, OPPONENT,
};
use engine_core::{Game, GameError, Ply};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha20Rng;

/// Board dimensions
pub const COLS: usize = 7;
pub const ROWS: usize = 6;
pub const BOARD_SIZE: usize = COLS * ROWS; // 42

/// Column of the opponent's disc in the fixed opening position
pub const CENTER_COLUMN: u8 = 3;

/// Canonical encoding: one byte per cell in board order
pub type Snapshot = [u8; BOARD_SIZE];

/// Column index in `0..COLS`
pub type Action = u8;

/// Connect4 game state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    /// Board representation: 0=empty, 1=agent, 2=opponent
    /// Stored in row-major order with row 0 at the bottom
    board: [u8; BOARD_SIZE],
    /// Winner: 0=none/ongoing, 1=agent, 2=opponent, 3=draw
    winner: u8,
    /// Height of each column (number of discs in the column)
    column_heights: [u8; COLS],
}

impl State {
    /// Create an empty board
    pub fn new() -> Self {
        Self {
            board: [EMPTY; BOARD_SIZE],
            winner: 0,
            column_heights: [0; COLS],
        }
    }

    /// Empty board with a single opponent disc in the centre column.
    pub fn opening() -> Self {
        let mut state = Self::new();
        state.place_unchecked(CENTER_COLUMN as usize, OPPONENT);
        state
    }

    /// Build a state from a grid given top row first.
    ///
    /// Cells use the signed convention: 1 = agent, -1 = opponent, 0 = empty.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidState`] when the grid is not 6×7, holds a value
    /// outside {-1, 0, 1}, or has a disc floating above an empty cell.
    pub fn from_rows<R: AsRef<[i8]>>(rows: &[R]) -> Result<Self, GameError> {
        if rows.len() != ROWS {
            return Err(GameError::InvalidState(format!(
                "expected {} rows, got {}",
                ROWS,
                rows.len()
            )));
        }

        let mut board = [EMPTY; BOARD_SIZE];
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != COLS {
                return Err(GameError::InvalidState(format!(
                    "row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    COLS
                )));
            }
            let board_row = ROWS - 1 - i;
            for (col, &value) in row.iter().enumerate() {
                board[Self::pos(col, board_row)] = cell_from_signed(value).ok_or_else(|| {
                    GameError::InvalidState(format!(
                        "invalid cell value {} at row {}, column {}",
                        value, i, col
                    ))
                })?;
            }
        }

        Self::from_board(board)
    }

    /// Build a state from its canonical cell array.
    ///
    /// Column heights and the winner are reconstructed from the board.
    pub fn from_board(board: Snapshot) -> Result<Self, GameError> {
        let mut column_heights = [0u8; COLS];
        for col in 0..COLS {
            for row in 0..ROWS {
                let cell = board[Self::pos(col, row)];
                if cell > OPPONENT {
                    return Err(GameError::InvalidState(format!(
                        "invalid board cell {} at column {}, row {}",
                        cell, col, row
                    )));
                }
                if cell == EMPTY {
                    continue;
                }
                if column_heights[col] as usize != row {
                    return Err(GameError::InvalidState(format!(
                        "disc at column {}, row {} is floating",
                        col, row
                    )));
                }
                column_heights[col] += 1;
            }
        }

        let mut state = Self {
            board,
            winner: 0,
            column_heights,
        };
        state.winner = state.scan_winner();
        Ok(state)
    }

    /// Check if the game is over (win or full board)
    pub fn is_done(&self) -> bool {
        self.winner != 0
    }

    /// Winner: 0=ongoing, 1=agent, 2=opponent, 3=draw
    pub fn winner(&self) -> u8 {
        self.winner
    }

    /// Check if every column is full
    pub fn is_full(&self) -> bool {
        self.column_heights.iter().all(|&h| h as usize >= ROWS)
    }

    /// Columns whose topmost cell is empty
    pub fn legal_moves(&self) -> Vec<Action> {
        (0..COLS as u8)
            .filter(|&col| (self.column_heights[col as usize] as usize) < ROWS)
            .collect()
    }

    /// Number of discs on the board
    pub fn moves_played(&self) -> u32 {
        self.column_heights.iter().map(|&h| h as u32).sum()
    }

    /// Cell at (col, row), row 0 at the bottom
    pub fn cell(&self, col: usize, row: usize) -> u8 {
        self.board[Self::pos(col, row)]
    }

    /// Canonical cell array
    pub fn board(&self) -> &Snapshot {
        &self.board
    }

    /// Convert column and row to board index
    #[inline]
    pub(crate) fn pos(col: usize, row: usize) -> usize {
        row * COLS + col
    }

    /// Drop a disc for `player` into `column`.
    ///
    /// A winner already recorded on the board is kept; otherwise the new disc
    /// is checked for a line of four and the board for a draw.
    pub fn drop_piece(&mut self, column: Action, player: u8) -> Result<(), GameError> {
        let col = column as usize;
        if col >= COLS {
            return Err(GameError::InvalidMove {
                action: column as u32,
                reason: format!("column out of range 0..{}", COLS),
            });
        }
        if self.column_heights[col] as usize >= ROWS {
            return Err(GameError::InvalidMove {
                action: column as u32,
                reason: "column is full".to_string(),
            });
        }

        self.place_unchecked(col, player);
        Ok(())
    }

    fn place_unchecked(&mut self, col: usize, player: u8) {
        let row = self.column_heights[col] as usize;
        self.board[Self::pos(col, row)] = player;
        self.column_heights[col] += 1;

        if self.winner == 0 {
            self.winner = self.check_winner_at(col, row);
        }
    }

    /// Check if the disc at (col, row) creates a winning line
    pub(crate) fn check_winner_at(&self, col: usize, row: usize) -> u8 {
        let player = self.board[Self::pos(col, row)];
        if player == EMPTY {
            return 0;
        }

        // Direction vectors: horizontal, vertical, diagonal /, diagonal \
        let directions: [(i32, i32); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

        for (dc, dr) in directions {
            let count = 1
                + self.count_direction(col, row, dc, dr, player)
                + self.count_direction(col, row, -dc, -dr, player);

            if count >= 4 {
                return player;
            }
        }

        if self.is_full() {
            return DRAW;
        }

        0
    }

    fn count_direction(&self, col: usize, row: usize, dc: i32, dr: i32, player: u8) -> usize {
        let mut count = 0;
        let (mut c, mut r) = (col as i32 + dc, row as i32 + dr);
        while c >= 0 && c < COLS as i32 && r >= 0 && r < ROWS as i32 {
            if self.board[Self::pos(c as usize, r as usize)] != player {
                break;
            }
            count += 1;
            c += dc;
            r += dr;
        }
        count
    }

    /// Winner of an arbitrary board, scanning every occupied cell.
    ///
    /// If both sides own a line the first one found bottom-up wins.
    fn scan_winner(&self) -> u8 {
        for row in 0..ROWS {
            for col in 0..COLS {
                match self.check_winner_at(col, row) {
                    AGENT => return AGENT,
                    OPPONENT => return OPPONENT,
                    _ => {}
                }
            }
        }

        if self.is_full() {
            DRAW
        } else {
            0
        }
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..ROWS).rev() {
            let line: String = (0..COLS)
                .map(|col| cell_symbol(self.cell(col, row)))
                .collect();
            writeln!(f, "{}", line)?;
        }
        write!(f, "0123456")
    }
}

/// Connect4 rules with an embedded uniformly random opponent
#[derive(Debug, Clone, Copy, Default)]
pub struct Connect4;

impl Connect4 {
    /// Create a new Connect4 game
    pub fn new() -> Self {
        Self
    }

    /// Fresh game: empty board plus one random opponent disc.
    pub fn reset(&self, rng: &mut ChaCha20Rng) -> State {
        let mut state = State::new();
        Self::opponent_move(&mut state, rng);
        state
    }

    /// Fixed opening used for reproducible scenarios.
    pub fn initial_state(&self) -> State {
        State::opening()
    }

    fn opponent_move(state: &mut State, rng: &mut ChaCha20Rng) {
        let legal = state.legal_moves();
        if let Some(&col) = legal.choose(rng) {
            state.place_unchecked(col as usize, OPPONENT);
        }
    }
}

impl Game for Connect4 {
    type State = State;
    type Action = Action;
    type Snapshot = Snapshot;

    fn legal_moves(state: &State) -> Vec<Action> {
        state.legal_moves()
    }

    fn apply_ply(
        &self,
        action: Action,
        state: &mut State,
        rng: &mut ChaCha20Rng,
    ) -> Result<Ply, GameError> {
        state.drop_piece(action, AGENT)?;
        if state.is_done() {
            return Ok(Ply::finished(agent_reward(state.winner)));
        }

        Self::opponent_move(state, rng);
        if state.is_done() {
            return Ok(Ply::finished(agent_reward(state.winner)));
        }

        Ok(Ply::ongoing())
    }

    fn is_terminal(state: &State) -> bool {
        state.is_done()
    }

    fn terminal_reward(state: &State) -> f32 {
        agent_reward(state.winner)
    }

    fn encode(state: &State) -> Snapshot {
        state.board
    }

    fn decode(snapshot: &Snapshot) -> Result<State, GameError> {
        State::from_board(*snapshot)
    }
}

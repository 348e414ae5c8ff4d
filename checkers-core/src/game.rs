//! Board state, move legality and move application

use std::cell::{Cell, RefCell};
use std::fmt;
use std::ops::Index;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::board::{forward_directions, playable_squares, sign, Coord, DIRECTIONS, SIZE};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Moves without a capture after which the game is a draw
pub const MAX_MOVES_WITHOUT_CAPTURE: u16 = 50;

/// Piece magnitudes (sign encodes the owner)
pub const EMPTY: i8 = 0;
pub const SIMPLE: i8 = 1;
pub const KING: i8 = 2;

/// Initial layout, listed row by row (row 0 first)
const INITIAL_ROWS: [[i8; SIZE as usize]; SIZE as usize] = [
    [-1, 0, -1, 0, -1, 0],
    [0, -1, 0, -1, 0, -1],
    [0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0],
    [1, 0, 1, 0, 1, 0],
    [0, 1, 0, 1, 0, 1],
];

type Cells = [[i8; SIZE as usize]; SIZE as usize];

// ============================================================================
// CORE TYPES
// ============================================================================

/// Game state as seen from the board
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    NotOver,
    PositiveWins,
    NegativeWins,
    Draw,
}

impl GameState {
    /// The state where the player with `sign` has won
    pub fn win_for(sign: i8) -> Self {
        if sign > 0 {
            GameState::PositiveWins
        } else {
            GameState::NegativeWins
        }
    }

    pub fn is_over(self) -> bool {
        self != GameState::NotOver
    }

    /// Sign of the winner, `None` for draws and unfinished games
    pub fn winner(self) -> Option<i8> {
        match self {
            GameState::PositiveWins => Some(1),
            GameState::NegativeWins => Some(-1),
            GameState::NotOver | GameState::Draw => None,
        }
    }
}

/// A move of one piece from `from` to `to`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Move {
    pub from: Coord,
    pub to: Coord,
}

impl Move {
    pub fn new(from: Coord, to: Coord) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// What happened during `make_move`, used for reward shaping
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MoveOutcome {
    pub captured: bool,
    pub promoted: bool,
}

// ============================================================================
// BOARD
// ============================================================================

/// Board engine (clone to branch)
///
/// Cells are indexed `[x][y]`. Derived caches live behind interior
/// mutability so that queries stay `&self`; they are cleared by every
/// mutation.
#[derive(Clone, Debug)]
pub struct Board {
    cells: Cells,

    /// Capture obligation per side
    positive_should_capture: bool,
    negative_should_capture: bool,

    turn_sign: i8,
    moves_since_last_capture: u16,
    enable_should_capture_rule: bool,

    correct_moves_cache: RefCell<FxHashMap<(Coord, Coord), bool>>,
    game_state_cache: Cell<Option<GameState>>,
}

impl Board {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Standard starting position, positive player to move
    pub fn new() -> Self {
        let mut cells = [[EMPTY; SIZE as usize]; SIZE as usize];
        for (y, row) in INITIAL_ROWS.iter().enumerate() {
            for (x, &value) in row.iter().enumerate() {
                cells[x][y] = value;
            }
        }
        Self::from_parts(cells, false, false, 1, 0, true)
    }

    /// Board holding exactly `pieces`, with obligations computed from scratch
    pub fn with_pieces(pieces: &[(Coord, i8)], turn_sign: i8) -> Self {
        assert!(turn_sign != 0, "turn sign must be 1 or -1");
        let mut cells = [[EMPTY; SIZE as usize]; SIZE as usize];
        for &(pos, value) in pieces {
            assert!(pos.is_playable(), "piece placed on non-playable square {pos}");
            assert!((-KING..=KING).contains(&value), "invalid piece value {value}");
            cells[pos.x as usize][pos.y as usize] = value;
        }
        let mut board = Self::from_parts(cells, false, false, sign(turn_sign), 0, true);
        board.update_should_capture();
        board
    }

    pub(crate) fn from_parts(
        cells: Cells,
        negative_should_capture: bool,
        positive_should_capture: bool,
        turn_sign: i8,
        moves_since_last_capture: u16,
        enable_should_capture_rule: bool,
    ) -> Self {
        Self {
            cells,
            positive_should_capture,
            negative_should_capture,
            turn_sign,
            moves_since_last_capture,
            enable_should_capture_rule,
            correct_moves_cache: RefCell::new(FxHashMap::default()),
            game_state_cache: Cell::new(None),
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    /// Piece value at `pos`, 0 for empty or off-board squares
    pub fn get(&self, pos: Coord) -> i8 {
        if pos.is_valid() {
            self.cells[pos.x as usize][pos.y as usize]
        } else {
            EMPTY
        }
    }

    pub fn turn_sign(&self) -> i8 {
        self.turn_sign
    }

    pub fn moves_since_last_capture(&self) -> u16 {
        self.moves_since_last_capture
    }

    /// Whether the side `sign` must capture this move
    pub fn check_should_capture(&self, sign: i8) -> bool {
        if sign > 0 {
            self.positive_should_capture
        } else {
            self.negative_should_capture
        }
    }

    pub fn enable_should_capture_rule(&self) -> bool {
        self.enable_should_capture_rule
    }

    /// Toggle mandatory capture. Disabling clears both obligations and makes
    /// captures optional; enabling recomputes them from the board.
    pub fn set_enable_should_capture_rule(&mut self, enabled: bool) {
        self.invalidate_derived_state();
        self.enable_should_capture_rule = enabled;
        self.update_should_capture();
    }

    /// Number of pieces owned by `sign`
    pub fn piece_count(&self, sign_of: i8) -> usize {
        self.pieces().filter(|&(_, v)| sign(v) == sign_of).count()
    }

    /// Iterate occupied squares in canonical order
    pub fn pieces(&self) -> impl Iterator<Item = (Coord, i8)> + '_ {
        playable_squares()
            .map(|pos| (pos, self.get(pos)))
            .filter(|&(_, v)| v != EMPTY)
    }

    // ========================================================================
    // CACHES
    // ========================================================================

    fn invalidate_derived_state(&mut self) {
        self.correct_moves_cache.get_mut().clear();
        self.game_state_cache.set(None);
    }

    // ========================================================================
    // MOVE LEGALITY
    // ========================================================================

    /// Check whether moving the piece at `start` to `end` is legal.
    ///
    /// Never fails: off-board squares, an empty source, an occupied
    /// destination or a non-diagonal delta all yield `false`.
    pub fn is_move_correct(&self, start: Coord, end: Coord) -> bool {
        let cached = self.correct_moves_cache.borrow().get(&(start, end)).copied();
        if let Some(result) = cached {
            return result;
        }

        let result = self.compute_move_correct(start, end);
        self.correct_moves_cache
            .borrow_mut()
            .insert((start, end), result);
        result
    }

    fn compute_move_correct(&self, start: Coord, end: Coord) -> bool {
        if !start.is_valid() || !end.is_valid() {
            return false;
        }
        let piece = self.get(start);
        if piece == EMPTY || self.get(end) != EMPTY {
            return false;
        }

        let delta = end - start;
        if !delta.is_diagonal() {
            return false;
        }
        let direction = delta.signum();
        let piece_sign = sign(piece);

        match piece.abs() {
            SIMPLE => match delta.x.abs() {
                1 => {
                    forward_directions(piece_sign).contains(&direction)
                        && !self.check_should_capture(piece_sign)
                }
                2 => self.is_enemy(piece_sign, start + direction),
                _ => false,
            },
            KING => {
                let mut pos = start;
                let mut found_enemy = false;
                while pos != end {
                    pos = pos + direction;
                    if self.get(pos) == EMPTY {
                        continue;
                    }
                    // Second piece on the path, or our own piece
                    if found_enemy || !self.is_enemy(piece_sign, pos) {
                        return false;
                    }
                    found_enemy = true;
                }
                self.capture_allowed(piece_sign, found_enemy)
            }
            _ => panic!("invalid piece value {piece} at {start}"),
        }
    }

    /// Legal destinations for the piece at `start`, in direction order.
    /// Empty for empty or off-board squares.
    pub fn get_correct_moves(&self, start: Coord) -> Vec<Coord> {
        let mut moves = Vec::new();
        let piece = self.get(start);
        if piece == EMPTY {
            return moves;
        }
        let piece_sign = sign(piece);

        match piece.abs() {
            SIMPLE => {
                let obligated = self.check_should_capture(piece_sign);
                if !obligated {
                    for &direction in forward_directions(piece_sign) {
                        let next = start + direction;
                        if next.is_valid() && self.get(next) == EMPTY {
                            moves.push(next);
                        }
                    }
                }
                if obligated || !self.enable_should_capture_rule {
                    for &direction in &DIRECTIONS {
                        let over = start + direction;
                        let landing = over + direction;
                        if landing.is_valid()
                            && self.is_enemy(piece_sign, over)
                            && self.get(landing) == EMPTY
                        {
                            moves.push(landing);
                        }
                    }
                }
            }
            KING => {
                for &direction in &DIRECTIONS {
                    let mut pos = start;
                    let mut found_enemy = false;
                    loop {
                        pos = pos + direction;
                        if !pos.is_valid() {
                            break;
                        }
                        if self.get(pos) == EMPTY {
                            if self.capture_allowed(piece_sign, found_enemy) {
                                moves.push(pos);
                            }
                            continue;
                        }
                        if found_enemy || !self.is_enemy(piece_sign, pos) {
                            break;
                        }
                        found_enemy = true;
                    }
                }
            }
            _ => panic!("invalid piece value {piece} at {start}"),
        }

        moves
    }

    /// Squares holding a piece of the side to move
    pub fn get_possible_pos(&self) -> Vec<Coord> {
        self.pieces()
            .filter(|&(_, v)| sign(v) == self.turn_sign)
            .map(|(pos, _)| pos)
            .collect()
    }

    /// Every legal move of the side to move
    pub fn legal_moves(&self) -> Vec<Move> {
        self.get_possible_pos()
            .into_iter()
            .flat_map(|from| {
                self.get_correct_moves(from)
                    .into_iter()
                    .map(move |to| Move::new(from, to))
            })
            .collect()
    }

    /// With the rule on, a capture is allowed exactly when it is obligatory
    fn capture_allowed(&self, piece_sign: i8, found_enemy: bool) -> bool {
        !self.enable_should_capture_rule || found_enemy == self.check_should_capture(piece_sign)
    }

    fn is_enemy(&self, piece_sign: i8, pos: Coord) -> bool {
        let value = self.get(pos);
        value != EMPTY && sign(value) == -piece_sign
    }

    // ========================================================================
    // CAPTURE OBLIGATION
    // ========================================================================

    fn update_should_capture(&mut self) {
        if self.enable_should_capture_rule {
            self.positive_should_capture = self.side_can_capture(1);
            self.negative_should_capture = self.side_can_capture(-1);
        } else {
            self.positive_should_capture = false;
            self.negative_should_capture = false;
        }
    }

    fn side_can_capture(&self, side: i8) -> bool {
        self.pieces()
            .filter(|&(_, v)| sign(v) == side)
            .any(|(pos, v)| self.piece_can_capture(pos, v))
    }

    fn piece_can_capture(&self, pos: Coord, piece: i8) -> bool {
        let piece_sign = sign(piece);
        if piece.abs() == SIMPLE {
            return DIRECTIONS.iter().any(|&direction| {
                let landing = pos + direction + direction;
                landing.is_valid()
                    && self.is_enemy(piece_sign, pos + direction)
                    && self.get(landing) == EMPTY
            });
        }

        DIRECTIONS.iter().any(|&direction| {
            let mut current = pos + direction;
            while current.is_valid() && self.get(current) == EMPTY {
                current = current + direction;
            }
            let landing = current + direction;
            current.is_valid()
                && self.is_enemy(piece_sign, current)
                && landing.is_valid()
                && self.get(landing) == EMPTY
        })
    }

    // ========================================================================
    // APPLY MOVE
    // ========================================================================

    /// Apply a move.
    ///
    /// **No legality checks are performed**: the caller must only pass moves
    /// accepted by [`Board::is_move_correct`] for the side to move. Debug
    /// builds assert this.
    ///
    /// Removes the captured piece, promotes, recomputes obligations and passes
    /// the turn unless the mover must keep capturing with the moved piece.
    pub fn make_move(&mut self, start: Coord, end: Coord) -> MoveOutcome {
        debug_assert!(
            self.is_move_correct(start, end),
            "illegal move {start} -> {end}\n{self}"
        );
        debug_assert_eq!(sign(self.get(start)), self.turn_sign, "moving out of turn");

        self.invalidate_derived_state();

        let piece = self.get(start);
        let mover = sign(piece);

        let captured_pos = self.enemy_between(start, end, mover);
        if self.check_should_capture(mover) && captured_pos.is_none() {
            panic!("capture obligation for {mover} but no enemy between {start} and {end}");
        }
        let captured = match captured_pos {
            Some(pos) => {
                self.set(pos, EMPTY);
                self.moves_since_last_capture = 0;
                true
            }
            None => {
                self.moves_since_last_capture = self.moves_since_last_capture.saturating_add(1);
                false
            }
        };

        self.set(end, piece);
        self.set(start, EMPTY);

        let promoted = if piece == SIMPLE && end.y == 0 {
            self.set(end, KING);
            true
        } else if piece == -SIMPLE && end.y == SIZE - 1 {
            self.set(end, -KING);
            true
        } else {
            false
        };

        self.update_should_capture();

        let continues = captured
            && self.check_should_capture(mover)
            && !self.get_correct_moves(end).is_empty();
        if !continues {
            self.turn_sign = -self.turn_sign;
        }

        MoveOutcome { captured, promoted }
    }

    /// Convenience wrapper over [`Board::make_move`]
    pub fn apply(&mut self, mv: Move) -> MoveOutcome {
        self.make_move(mv.from, mv.to)
    }

    fn enemy_between(&self, start: Coord, end: Coord, mover: i8) -> Option<Coord> {
        let direction = (end - start).signum();
        let mut pos = start + direction;
        while pos != end && pos.is_valid() {
            if self.is_enemy(mover, pos) {
                return Some(pos);
            }
            pos = pos + direction;
        }
        None
    }

    fn set(&mut self, pos: Coord, value: i8) {
        self.cells[pos.x as usize][pos.y as usize] = value;
    }

    // ========================================================================
    // GAME STATE
    // ========================================================================

    /// Terminal-state evaluation (memoized until the next mutation)
    pub fn game_state(&self) -> GameState {
        if let Some(state) = self.game_state_cache.get() {
            return state;
        }
        let state = self.compute_game_state();
        self.game_state_cache.set(Some(state));
        state
    }

    fn compute_game_state(&self) -> GameState {
        if self.moves_since_last_capture >= MAX_MOVES_WITHOUT_CAPTURE {
            return GameState::Draw;
        }

        let own = self.get_possible_pos();
        if own.is_empty() {
            return GameState::win_for(-self.turn_sign);
        }
        if self.piece_count(-self.turn_sign) == 0 {
            return GameState::win_for(self.turn_sign);
        }

        if own.iter().any(|&pos| !self.get_correct_moves(pos).is_empty()) {
            GameState::NotOver
        } else {
            GameState::win_for(-self.turn_sign)
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        self.cells == other.cells
            && self.positive_should_capture == other.positive_should_capture
            && self.negative_should_capture == other.negative_should_capture
            && self.turn_sign == other.turn_sign
            && self.moves_since_last_capture == other.moves_since_last_capture
            && self.enable_should_capture_rule == other.enable_should_capture_rule
    }
}

impl Eq for Board {}

impl Index<Coord> for Board {
    type Output = i8;

    fn index(&self, pos: Coord) -> &i8 {
        &self.cells[pos.x as usize][pos.y as usize]
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..SIZE {
            for x in 0..SIZE {
                write!(f, "|{:2}", self.get(Coord::new(x, y)))?;
            }
            writeln!(f, "|")?;
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

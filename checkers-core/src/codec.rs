//! Board serialization: fixed-width byte keys, packed integer keys and the
//! one-hot feature encoding used by learned policies.
//!
//! Byte layout of the compact key (21 bytes):
//! - turn: 1 for the positive player, 0 for the negative player
//! - negative player must capture (0/1)
//! - positive player must capture (0/1)
//! - 18 playable cells in row-major order, each `value + 2` (0..=4)
//!
//! The full key (24 bytes) prefixes the compact key with the capture-rule
//! toggle (0/1) and `moves_since_last_capture` as u16 LE.
//!
//! Compact keys drop the draw counter and the rule toggle. A decoded compact
//! key only matches the original board while the counter is below
//! `MAX_MOVES_WITHOUT_CAPTURE` and the capture rule is enabled; a drawn board
//! decodes as still in play. Use the full key or [`BoardKey`] when the game
//! state must survive.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::board::{playable_squares, Coord, PLAYABLE_SQUARES, SIZE};
use crate::game::{Board, EMPTY, KING};

// ============================================================================
// CONSTANTS
// ============================================================================

pub const COMPACT_KEY_LEN: usize = 3 + PLAYABLE_SQUARES;
pub const FULL_KEY_LEN: usize = 3 + COMPACT_KEY_LEN;

/// Distinct cell values (-2..=2)
const CELL_VALUES: u64 = 5;

/// Feature vector length: one-hot cell value per playable square
pub const FEATURE_LEN: usize = PLAYABLE_SQUARES * CELL_VALUES as usize;

/// 5^18, the number of distinct cell configurations
const CELL_SPACE: u64 = CELL_VALUES.pow(PLAYABLE_SQUARES as u32);

// Bit positions above the base-5 cell digits in a packed key
const CELL_BITS: u32 = 42;
const TURN_BIT: u32 = CELL_BITS;
const NEGATIVE_CAPTURE_BIT: u32 = CELL_BITS + 1;
const POSITIVE_CAPTURE_BIT: u32 = CELL_BITS + 2;
const RULE_BIT: u32 = CELL_BITS + 3;
const COUNTER_SHIFT: u32 = CELL_BITS + 4;

/// Codec errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("invalid key length {0} (expected {COMPACT_KEY_LEN} or {FULL_KEY_LEN})")]
    InvalidLength(usize),

    #[error("invalid value {value} at byte {index}")]
    InvalidValue { index: usize, value: u8 },

    #[error("packed key out of range: {0}")]
    KeyOutOfRange(u64),
}

/// Which byte layout to emit
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyFormat {
    Compact,
    Full,
}

// ============================================================================
// BYTE KEYS
// ============================================================================

/// Serialize a board into a fixed-width byte key
pub fn to_key(board: &Board, format: KeyFormat) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(FULL_KEY_LEN);
    if format == KeyFormat::Full {
        bytes.push(board.enable_should_capture_rule() as u8);
        bytes.extend_from_slice(&board.moves_since_last_capture().to_le_bytes());
    }
    bytes.push((board.turn_sign() > 0) as u8);
    bytes.push(board.check_should_capture(-1) as u8);
    bytes.push(board.check_should_capture(1) as u8);
    bytes.extend(playable_squares().map(|pos| (board.get(pos) + KING) as u8));
    bytes
}

/// Deserialize a board from a compact or full byte key.
///
/// The format is inferred from the length; compact keys decode with the
/// capture rule enabled and a zero move counter, so a board drawn by the
/// move counter comes back as `NotOver`.
pub fn from_key(bytes: &[u8]) -> Result<Board, CodecError> {
    let (rule, counter, body) = match bytes.len() {
        FULL_KEY_LEN => {
            let rule = read_flag(bytes, 0)?;
            let counter = u16::from_le_bytes([bytes[1], bytes[2]]);
            (rule, counter, 3)
        }
        COMPACT_KEY_LEN => (true, 0, 0),
        len => return Err(CodecError::InvalidLength(len)),
    };

    let turn_sign = if read_flag(bytes, body)? { 1 } else { -1 };
    let negative_capture = read_flag(bytes, body + 1)?;
    let positive_capture = read_flag(bytes, body + 2)?;

    let mut cells = [[EMPTY; SIZE as usize]; SIZE as usize];
    for (i, pos) in playable_squares().enumerate() {
        let index = body + 3 + i;
        let value = bytes[index];
        if value as u64 >= CELL_VALUES {
            return Err(CodecError::InvalidValue { index, value });
        }
        cells[pos.x as usize][pos.y as usize] = value as i8 - KING;
    }

    Ok(Board::from_parts(
        cells,
        negative_capture,
        positive_capture,
        turn_sign,
        counter,
        rule,
    ))
}

fn read_flag(bytes: &[u8], index: usize) -> Result<bool, CodecError> {
    match bytes[index] {
        0 => Ok(false),
        1 => Ok(true),
        value => Err(CodecError::InvalidValue { index, value }),
    }
}

// ============================================================================
// PACKED INTEGER KEY
// ============================================================================

/// Full-fidelity board key packed into a `u64`.
///
/// Bits 0..42 hold the 18 cells as base-5 digits, followed by the turn bit,
/// both obligation flags, the rule toggle and a 16-bit move counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoardKey(pub u64);

impl BoardKey {
    pub fn from_board(board: &Board) -> Self {
        let cells = playable_squares()
            .collect::<Vec<Coord>>()
            .into_iter()
            .rev()
            .fold(0u64, |acc, pos| acc * CELL_VALUES + (board.get(pos) + KING) as u64);

        let mut key = cells;
        key |= ((board.turn_sign() > 0) as u64) << TURN_BIT;
        key |= (board.check_should_capture(-1) as u64) << NEGATIVE_CAPTURE_BIT;
        key |= (board.check_should_capture(1) as u64) << POSITIVE_CAPTURE_BIT;
        key |= (board.enable_should_capture_rule() as u64) << RULE_BIT;
        key |= (board.moves_since_last_capture() as u64) << COUNTER_SHIFT;
        BoardKey(key)
    }

    pub fn to_board(self) -> Result<Board, CodecError> {
        from_key(&self.to_bytes()?)
    }

    /// Expand into the full byte key
    pub fn to_bytes(self) -> Result<Vec<u8>, CodecError> {
        let mut digits = self.0 & ((1u64 << CELL_BITS) - 1);
        if digits >= CELL_SPACE || self.0 >> (COUNTER_SHIFT + 16) != 0 {
            return Err(CodecError::KeyOutOfRange(self.0));
        }

        let bit = |shift: u32| ((self.0 >> shift) & 1) as u8;
        let counter = (self.0 >> COUNTER_SHIFT) as u16;

        let mut bytes = Vec::with_capacity(FULL_KEY_LEN);
        bytes.push(bit(RULE_BIT));
        bytes.extend_from_slice(&counter.to_le_bytes());
        bytes.push(bit(TURN_BIT));
        bytes.push(bit(NEGATIVE_CAPTURE_BIT));
        bytes.push(bit(POSITIVE_CAPTURE_BIT));
        for _ in 0..PLAYABLE_SQUARES {
            bytes.push((digits % CELL_VALUES) as u8);
            digits /= CELL_VALUES;
        }
        Ok(bytes)
    }

    /// Pack a byte key of either format
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        from_key(bytes).map(|board| BoardKey::from_board(&board))
    }
}

impl From<&Board> for BoardKey {
    fn from(board: &Board) -> Self {
        BoardKey::from_board(board)
    }
}

impl fmt::Display for BoardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// FEATURES
// ============================================================================

/// One-hot encoding of the playable cells (5 slots per cell, ordered
/// -2, -1, 0, 1, 2)
pub fn features(board: &Board) -> [f32; FEATURE_LEN] {
    let mut out = [0.0; FEATURE_LEN];
    for (i, pos) in playable_squares().enumerate() {
        let slot = (board.get(pos) + KING) as usize;
        out[i * CELL_VALUES as usize + slot] = 1.0;
    }
    out
}

//! Challenge generation.
//!
//! A challenge is either a key to type or a target to click. Generation is a
//! pure function of the random source so seeded runs are reproducible.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";

/// Horizontal placement range for click targets, percent of the play area.
pub const TARGET_X_RANGE: (f64, f64) = (15.0, 85.0);
/// Vertical placement range for click targets, percent of the play area.
pub const TARGET_Y_RANGE: (f64, f64) = (20.0, 80.0);

pub const TARGET_GLYPH: &str = "(◎)";

/// Opaque token identifying one challenge instance.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChallengeId(String);

impl ChallengeId {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(to_base36(rng.gen::<u64>()))
    }

    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChallengeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn to_base36(mut n: u64) -> String {
    const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut digits = Vec::with_capacity(13);
    loop {
        digits.push(char::from(ALPHABET[(n % 36) as usize]));
        n /= 36;
        if n == 0 {
            break;
        }
    }
    digits.iter().rev().collect()
}

/// Point inside the play area, both axes in percent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    /// True when `(x, y)` lies within the box of half-extents
    /// `radius_x`/`radius_y` (percent) centred on this position.
    pub fn hit_test(&self, x: f64, y: f64, radius_x: f64, radius_y: f64) -> bool {
        (x - self.x).abs() <= radius_x && (y - self.y).abs() <= radius_y
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ChallengeKind {
    /// Type this uppercase letter or digit.
    Key(char),
    /// Click the target at this position.
    Click(Position),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: ChallengeId,
    pub kind: ChallengeKind,
}

impl Challenge {
    pub fn key(id: ChallengeId, value: char) -> Self {
        Self {
            id,
            kind: ChallengeKind::Key(value.to_ascii_uppercase()),
        }
    }

    pub fn click(id: ChallengeId, position: Position) -> Self {
        Self {
            id,
            kind: ChallengeKind::Click(position),
        }
    }

    pub fn is_key(&self) -> bool {
        matches!(self.kind, ChallengeKind::Key(_))
    }

    pub fn is_click(&self) -> bool {
        matches!(self.kind, ChallengeKind::Click(_))
    }

    pub fn position(&self) -> Option<Position> {
        match self.kind {
            ChallengeKind::Click(pos) => Some(pos),
            ChallengeKind::Key(_) => None,
        }
    }

    /// Case-insensitive key match. Always false for click challenges.
    pub fn accepts_key(&self, key: char) -> bool {
        match self.kind {
            ChallengeKind::Key(value) => value.eq_ignore_ascii_case(&key),
            ChallengeKind::Click(_) => false,
        }
    }

    /// Text a front-end shows for this challenge.
    pub fn prompt(&self) -> String {
        match self.kind {
            ChallengeKind::Key(value) => value.to_string(),
            ChallengeKind::Click(_) => TARGET_GLYPH.to_string(),
        }
    }
}

/// Draw the next challenge: letter, digit or click target with equal odds.
pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Challenge {
    let kind = match rng.gen_range(0..3) {
        0 => ChallengeKind::Key(LETTERS[rng.gen_range(0..LETTERS.len())] as char),
        1 => ChallengeKind::Key(DIGITS[rng.gen_range(0..DIGITS.len())] as char),
        _ => ChallengeKind::Click(Position {
            x: rng.gen_range(TARGET_X_RANGE.0..=TARGET_X_RANGE.1),
            y: rng.gen_range(TARGET_Y_RANGE.0..=TARGET_Y_RANGE.1),
        }),
    };

    Challenge {
        id: ChallengeId::generate(rng),
        kind,
    }
}

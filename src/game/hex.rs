//! Board topology: the fixed radius-3 hexagon of 37 cells in cube coordinates.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::card::types::CardType;
use crate::game::conditions::allowed_to_attack;
use crate::game::state::{MatchState, PlayerColor};

pub const BOARD_RADIUS: i32 = 3;

/// Unit steps to the six neighbors, in the order neighbors are enumerated
const DIRECTIONS: [(i32, i32, i32); 6] = [
    (0, -1, 1),
    (0, 1, -1),
    (-1, 1, 0),
    (1, -1, 0),
    (-1, 0, 1),
    (1, 0, -1),
];

/// A board cell in cube coordinates; `q + r + s == 0`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Hex {
    pub q: i32,
    pub r: i32,
    pub s: i32,
}

impl Hex {
    pub fn new(q: i32, r: i32) -> Self {
        Hex { q, r, s: -q - r }
    }

    pub fn distance(&self, other: &Hex) -> u32 {
        let dq = (self.q - other.q).unsigned_abs();
        let dr = (self.r - other.r).unsigned_abs();
        let ds = (self.s - other.s).unsigned_abs();
        dq.max(dr).max(ds)
    }

    pub fn is_on_board(&self) -> bool {
        self.q.abs() <= BOARD_RADIUS && self.r.abs() <= BOARD_RADIUS && self.s.abs() <= BOARD_RADIUS
    }

    /// Neighboring cells that lie on the board
    pub fn neighbors(&self) -> Vec<Hex> {
        DIRECTIONS
            .iter()
            .map(|(dq, dr, ds)| Hex {
                q: self.q + dq,
                r: self.r + dr,
                s: self.s + ds,
            })
            .filter(Hex::is_on_board)
            .collect()
    }

    pub fn is_adjacent(&self, other: &Hex) -> bool {
        self.distance(other) == 1
    }
}

impl fmt::Display for Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.q, self.r, self.s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid hex id '{0}'")]
pub struct ParseHexError(pub String);

impl FromStr for Hex {
    type Err = ParseHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<i32> = s
            .split(',')
            .map(|p| p.trim().parse::<i32>())
            .collect::<Result<_, _>>()
            .map_err(|_| ParseHexError(s.to_string()))?;

        match parts.as_slice() {
            [q, r, s_] if q.checked_add(*r).and_then(|qr| qr.checked_add(*s_)) == Some(0) => {
                Ok(Hex { q: *q, r: *r, s: *s_ })
            }
            _ => Err(ParseHexError(s.to_string())),
        }
    }
}

impl TryFrom<String> for Hex {
    type Error = ParseHexError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Hex> for String {
    fn from(hex: Hex) -> Self {
        hex.to_string()
    }
}

/// Every cell of the board, q-major then r
pub fn all_hex_ids() -> &'static [Hex] {
    static ALL: OnceLock<Vec<Hex>> = OnceLock::new();
    ALL.get_or_init(|| {
        let mut hexes = Vec::with_capacity(37);
        for q in -BOARD_RADIUS..=BOARD_RADIUS {
            let r_min = (-BOARD_RADIUS).max(-q - BOARD_RADIUS);
            let r_max = BOARD_RADIUS.min(-q + BOARD_RADIUS);
            for r in r_min..=r_max {
                hexes.push(Hex::new(q, r));
            }
        }
        hexes
    })
}

pub fn core_hex(player: PlayerColor) -> Hex {
    match player {
        PlayerColor::Blue => Hex::new(-3, 0),
        PlayerColor::Orange => Hex::new(3, 0),
    }
}

/// Fixed hexes where robots may be placed
pub fn placement_hexes(player: PlayerColor) -> [Hex; 3] {
    match player {
        PlayerColor::Blue => [Hex::new(-3, 1), Hex::new(-2, -1), Hex::new(-2, 0)],
        PlayerColor::Orange => [Hex::new(3, -1), Hex::new(2, 1), Hex::new(2, 0)],
    }
}

//
// Board-aware queries
//

pub fn valid_placement_hexes(state: &MatchState, player: PlayerColor, card_type: CardType) -> Vec<Hex> {
    let candidates: Vec<Hex> = match card_type {
        CardType::Robot => placement_hexes(player).to_vec(),
        CardType::Structure => state
            .board
            .objects_of(player)
            .flat_map(|obj| obj.hex.neighbors())
            .collect(),
        CardType::Event | CardType::Core => vec![],
    };

    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|hex| !state.board.is_occupied(hex) && seen.insert(*hex))
        .collect()
}

/// Reachable unoccupied hexes, in breadth-first discovery order
pub fn valid_movement_hexes(state: &MatchState, start: Hex) -> Vec<Hex> {
    let Some(object) = state.board.object_at(&start) else {
        return vec![];
    };
    let moves_left = object.moves_left();
    let passes_through = object.can_move_over_objects();

    let mut reached = vec![start];
    let mut seen: HashSet<Hex> = HashSet::from([start]);
    let mut frontier = vec![start];

    for _ in 0..moves_left {
        let mut next = Vec::new();
        for hex in &frontier {
            for neighbor in hex.neighbors() {
                if seen.contains(&neighbor) {
                    continue;
                }
                if passes_through || !state.board.is_occupied(&neighbor) {
                    seen.insert(neighbor);
                    reached.push(neighbor);
                    next.push(neighbor);
                }
            }
        }
        frontier = next;
    }

    reached
        .into_iter()
        .filter(|hex| !state.board.is_occupied(hex))
        .collect()
}

pub fn valid_attack_hexes(state: &MatchState, start: Hex) -> Vec<Hex> {
    let Some(attacker) = state.board.object_at(&start) else {
        return vec![];
    };

    let mut origins = vec![start];
    origins.extend(valid_movement_hexes(state, start));

    let mut seen = HashSet::new();
    origins
        .iter()
        .flat_map(|hex| hex.neighbors())
        .filter(|hex| seen.insert(*hex))
        .filter(|hex| allowed_to_attack(state, attacker, hex))
        .collect()
}

/// Every hex the object at `start` can act on this turn
pub fn valid_action_hexes(state: &MatchState, start: Hex) -> Vec<Hex> {
    let Some(object) = state.board.object_at(&start) else {
        return vec![];
    };

    let mut hexes = valid_movement_hexes(state, start);
    hexes.extend(valid_attack_hexes(state, start));
    if !object.activated_abilities.is_empty() && !object.cant_activate {
        hexes.push(start);
    }
    hexes
}

/// Where an attacker has to step before attacking a non-adjacent target.
/// Picks the first qualifying movement hex in discovery order.
pub fn intermediate_move_hex(state: &MatchState, start: Hex, target: Hex) -> Option<Hex> {
    if start.is_adjacent(&target) {
        return None;
    }
    valid_movement_hexes(state, start)
        .into_iter()
        .find(|hex| hex.is_adjacent(&target))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_has_37_hexes() {
        let hexes = all_hex_ids();
        assert_eq!(hexes.len(), 37);
        assert!(hexes.iter().all(|h| h.q + h.r + h.s == 0 && h.is_on_board()));
        let unique: HashSet<_> = hexes.iter().collect();
        assert_eq!(unique.len(), 37);
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        for hex in all_hex_ids() {
            assert_eq!(hex.distance(hex), 0);
        }
    }

    #[test]
    fn test_distance_across_board() {
        assert_eq!(core_hex(PlayerColor::Blue).distance(&core_hex(PlayerColor::Orange)), 6);
        assert_eq!(Hex::new(0, 0).distance(&Hex::new(1, -1)), 1);
        assert_eq!(Hex::new(0, 0).distance(&Hex::new(2, -1)), 2);
    }

    #[test]
    fn test_neighbors_clip_to_board() {
        assert_eq!(Hex::new(0, 0).neighbors().len(), 6);
        assert_eq!(core_hex(PlayerColor::Blue).neighbors().len(), 3);
        let corner = Hex::new(3, -3);
        assert_eq!(corner.neighbors().len(), 3);
    }

    #[test]
    fn test_placement_hexes_surround_core() {
        for player in PlayerColor::ALL {
            for hex in placement_hexes(player) {
                assert!(hex.is_on_board());
                assert!(hex.is_adjacent(&core_hex(player)));
            }
        }
    }

    #[test]
    fn test_hex_id_round_trip() {
        let hex: Hex = "-3,1,2".parse().unwrap();
        assert_eq!(hex, Hex::new(-3, 1));
        assert_eq!(hex.to_string(), "-3,1,2");
        assert!("1,1,1".parse::<Hex>().is_err());
        assert!("a,b".parse::<Hex>().is_err());
        assert_eq!(serde_json::to_string(&hex).unwrap(), "\"-3,1,2\"");
    }

    #[test]
    fn test_hex_id_overflow_is_an_error() {
        assert!("2147483647,1,-2147483648".parse::<Hex>().is_err());
        assert!("-2147483648,-1,2147483647".parse::<Hex>().is_err());
        let err = serde_json::from_str::<Hex>("\"2147483647,1,-2147483648\"");
        assert!(err.is_err());
    }
}

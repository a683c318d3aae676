use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::ops::{Index, IndexMut};
use tracing::info;

use crate::card::abilities::AbilityId;
use crate::card::types::{CardId, CardInGame, CardType};
use crate::game::error::Rejection;
use crate::game::formats::{GameFormat, MatchOptions};
use crate::game::hex::Hex;
use crate::game::zones::{Board, Deck, DiscardPile, Hand, Object, ObjectId};
use crate::rng::GameRng;

/// Player colors. Blue always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerColor {
    Blue,
    Orange,
}

impl PlayerColor {
    pub const ALL: [PlayerColor; 2] = [PlayerColor::Blue, PlayerColor::Orange];

    pub fn opponent(&self) -> PlayerColor {
        match self {
            PlayerColor::Blue => PlayerColor::Orange,
            PlayerColor::Orange => PlayerColor::Blue,
        }
    }
}

impl fmt::Display for PlayerColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerColor::Blue => f.write_str("blue"),
            PlayerColor::Orange => f.write_str("orange"),
        }
    }
}

/// One value per player, indexable by color
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerPlayer<T> {
    pub blue: T,
    pub orange: T,
}

impl<T> PerPlayer<T> {
    pub fn new(blue: T, orange: T) -> Self {
        PerPlayer { blue, orange }
    }
}

impl<T> Index<PlayerColor> for PerPlayer<T> {
    type Output = T;

    fn index(&self, color: PlayerColor) -> &T {
        match color {
            PlayerColor::Blue => &self.blue,
            PlayerColor::Orange => &self.orange,
        }
    }
}

impl<T> IndexMut<PlayerColor> for PerPlayer<T> {
    fn index_mut(&mut self, color: PlayerColor) -> &mut T {
        match color {
            PlayerColor::Blue => &mut self.blue,
            PlayerColor::Orange => &mut self.orange,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Energy {
    pub available: i32,
    pub total: i32,
}

/// A target picked by a player in answer to a selection prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChosenTarget {
    Hex(Hex),
    Card(CardId),
}

/// What the presentation layer needs to prompt for a target
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetSelection {
    pub choosing: bool,
    pub possible_hexes: Vec<Hex>,
    pub possible_cards: Vec<CardId>,
    /// Targets chosen so far in the current resolution, consumed front first
    pub chosen: VecDeque<ChosenTarget>,
}

impl TargetSelection {
    pub fn allows(&self, target: &ChosenTarget) -> bool {
        match target {
            ChosenTarget::Hex(hex) => self.possible_hexes.contains(hex),
            ChosenTarget::Card(id) => self.possible_cards.contains(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub color: PlayerColor,
    pub hand: Hand,
    pub deck: Deck,
    pub discard_pile: DiscardPile,
    pub energy: Energy,
    pub target: TargetSelection,
    pub status_message: String,
}

impl PlayerState {
    pub fn new(color: PlayerColor, deck: Deck) -> Self {
        PlayerState {
            color,
            hand: Hand::new(),
            deck,
            discard_pile: DiscardPile::new(),
            energy: Energy::default(),
            target: TargetSelection::default(),
            status_message: String::new(),
        }
    }
}

/// A line of the game-facing action log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub player: Option<PlayerColor>,
    pub text: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub cards: Vec<CardInGame>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Animation {
    Move { from: Hex, to: Hex },
    Attack { from: Hex, to: Hex },
}

/// The command a suspended resolution will re-run once a target is chosen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Resumption {
    PlayCard { card_id: CardId, hex: Option<Hex> },
    MoveObject { from: Hex, to: Hex },
    AttackObject { from: Hex, target: Hex },
    ActivateAbility { hex: Hex, ability_index: usize },
}

/// A resolution waiting on a player's target choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingSelection {
    pub player: PlayerColor,
    pub resumption: Resumption,
}

/// Canonical match state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchState {
    pub current_turn: PlayerColor,
    pub players: PerPlayer<PlayerState>,
    pub usernames: PerPlayer<String>,
    pub format: GameFormat,
    pub options: MatchOptions,
    /// Whose point of view log lines and sound cues are written from
    pub perspective: PlayerColor,
    pub board: Board,
    pub rng: GameRng,
    pub next_id: u64,
    pub turn_number: u32,

    pub action_log: Vec<LogEntry>,
    pub sfx_queue: Vec<String>,
    pub animation_queue: Vec<Animation>,

    pub winner: Option<PlayerColor>,
    pub pending: Option<PendingSelection>,
    /// An event card is resolving, so its slot in hand is still occupied
    pub event_executing: bool,
    /// Why the last command was refused, if it was
    pub invalid: Option<Rejection>,
}

impl MatchState {
    pub fn player(&self, color: PlayerColor) -> &PlayerState {
        &self.players[color]
    }

    pub fn player_mut(&mut self, color: PlayerColor) -> &mut PlayerState {
        &mut self.players[color]
    }

    pub fn current_player(&self) -> &PlayerState {
        &self.players[self.current_turn]
    }

    pub fn is_game_over(&self) -> bool {
        self.winner.is_some()
    }

    /// Allocate a fresh id from the match counter
    pub fn fresh_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn fresh_object_id(&mut self) -> ObjectId {
        ObjectId(self.fresh_id())
    }

    pub fn fresh_ability_id(&mut self) -> AbilityId {
        AbilityId(self.fresh_id())
    }

    pub fn object(&self, id: ObjectId) -> Option<&Object> {
        self.board.get(id)
    }

    /// Every card in either player's hand, blue first
    pub fn cards_in_hands(&self) -> impl Iterator<Item = &CardInGame> {
        PlayerColor::ALL
            .into_iter()
            .flat_map(move |color| self.players[color].hand.cards().iter())
    }

    /// Whose hand holds the card with this id
    pub fn holder_of(&self, card_id: &CardId) -> Option<PlayerColor> {
        PlayerColor::ALL
            .into_iter()
            .find(|color| self.players[*color].hand.get(card_id).is_some())
    }

    pub fn play_sound(&mut self, filename: &str) {
        self.sfx_queue.push(filename.to_string());
    }

    /// Append to the action log. Lines about a player are prefixed with "You"
    /// when written from that player's perspective, else with their username.
    pub fn log(&mut self, player: Option<PlayerColor>, action: &str, cards: Vec<CardInGame>) {
        let prefix = match player {
            Some(color) if color == self.perspective => "You ".to_string(),
            Some(color) => format!("{} ", self.usernames[color]),
            None => String::new(),
        };
        self.action_log.push(LogEntry {
            player,
            text: format!("{}{}.", prefix, action),
            timestamp: chrono::Utc::now().timestamp_millis(),
            cards,
        });
    }

    /// Record a refused command without touching anything else
    pub fn reject(&mut self, player: PlayerColor, rejection: Rejection) {
        self.players[player].status_message = rejection.to_string();
        self.invalid = Some(rejection);
    }

    pub fn discard(&mut self, color: PlayerColor, card: CardInGame) {
        self.players[color].discard_pile.add_card(card);
    }

    /// A player loses when no core remains on their side; blue is checked first
    pub fn check_victory(&mut self) {
        if self.winner.is_some() {
            return;
        }

        let has_core = |state: &MatchState, color| {
            state
                .board
                .objects_of(color)
                .any(|obj| obj.card_type() == CardType::Core)
        };

        let winner = if !has_core(self, PlayerColor::Blue) {
            PlayerColor::Orange
        } else if !has_core(self, PlayerColor::Orange) {
            PlayerColor::Blue
        } else {
            return;
        };

        info!(%winner, turn = self.turn_number, "match decided");
        self.winner = Some(winner);
        if winner == self.perspective {
            self.play_sound("win.wav");
            self.log(Some(winner), "win", vec![]);
        } else {
            self.play_sound("lose.wav");
            self.log(Some(winner), "wins", vec![]);
        }
    }
}

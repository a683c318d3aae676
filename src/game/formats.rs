//! Match setup: options, deck formats and the initial state.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::card::types::{CardId, CardInGame, CardSource, CardType, Stats};
use crate::game::error::EngineError;
use crate::game::hex::core_hex;
use crate::game::state::{Energy, MatchState, PerPlayer, PlayerColor, PlayerState};
use crate::game::zones::{Board, Deck, Object};
use crate::rng::GameRng;

/// Tunable match rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchOptions {
    pub max_hand_size: usize,
    pub starting_hand_size: usize,
    pub max_energy: i32,
    pub core_health: i32,
}

impl Default for MatchOptions {
    fn default() -> Self {
        MatchOptions {
            max_hand_size: 7,
            starting_hand_size: 2,
            max_energy: 10,
            core_health: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameFormat {
    /// Each player draws from their own deck
    #[default]
    Normal,
    /// Both decks are merged; every card leaving the top leaves it for both players
    SharedDeck,
}

/// Everything the transport layer supplies to start a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSetup {
    pub usernames: PerPlayer<String>,
    pub decks: PerPlayer<Vec<CardInGame>>,
    #[serde(default)]
    pub format: GameFormat,
    #[serde(default)]
    pub options: MatchOptions,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_perspective")]
    pub perspective: PlayerColor,
}

fn default_perspective() -> PlayerColor {
    PlayerColor::Blue
}

fn core_card(color: PlayerColor, health: i32) -> CardInGame {
    let name = match color {
        PlayerColor::Blue => "Blue Core",
        PlayerColor::Orange => "Orange Core",
    };
    CardInGame {
        id: CardId(format!("{}/core", color)),
        name: name.to_string(),
        card_type: CardType::Core,
        base_cost: 0,
        cost: 0,
        stats: Some(Stats::structure(health)),
        text: String::new(),
        abilities: Vec::new(),
        source: CardSource::Builtin,
        cost_adjustments: Vec::new(),
    }
}

/// Scope card ids by owner so both players may bring the same deck list
fn scoped(color: PlayerColor, cards: &[CardInGame]) -> Vec<CardInGame> {
    cards
        .iter()
        .map(|card| CardInGame {
            id: CardId(format!("{}/{}", color, card.id)),
            ..card.clone()
        })
        .collect()
}

fn validate(setup: &MatchSetup) -> Result<(), EngineError> {
    for color in PlayerColor::ALL {
        if let Some(core) = setup.decks[color]
            .iter()
            .find(|card| card.card_type == CardType::Core)
        {
            return Err(EngineError::InvalidSetup(format!(
                "{}'s deck contains a core card ({})",
                color, core.name
            )));
        }
        if let Some(card) = setup.decks[color]
            .iter()
            .find(|card| card.card_type.is_object() && card.stats.is_none())
        {
            return Err(EngineError::InvalidSetup(format!("{} has no stats", card.name)));
        }
    }
    if setup.options.max_hand_size == 0 || setup.options.max_energy <= 0 {
        return Err(EngineError::InvalidSetup(
            "hand size and energy limits must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Create a fresh match: shuffled decks, opening hands, both cores placed.
/// Blue moves first with one energy.
pub fn new_game(setup: MatchSetup) -> Result<MatchState, EngineError> {
    validate(&setup)?;
    let mut rng = GameRng::new(setup.seed);

    let decks = match setup.format {
        GameFormat::Normal => {
            let mut blue = Deck::from_cards(scoped(PlayerColor::Blue, &setup.decks.blue));
            let mut orange = Deck::from_cards(scoped(PlayerColor::Orange, &setup.decks.orange));
            blue.shuffle(&mut rng);
            orange.shuffle(&mut rng);
            PerPlayer::new(blue, orange)
        }
        GameFormat::SharedDeck => {
            let mut cards = scoped(PlayerColor::Blue, &setup.decks.blue);
            cards.extend(scoped(PlayerColor::Orange, &setup.decks.orange));
            let mut shared = Deck::from_cards(cards);
            shared.shuffle(&mut rng);
            PerPlayer::new(shared.clone(), shared)
        }
    };

    let mut state = MatchState {
        current_turn: PlayerColor::Blue,
        players: PerPlayer::new(
            PlayerState::new(PlayerColor::Blue, decks.blue),
            PlayerState::new(PlayerColor::Orange, decks.orange),
        ),
        usernames: setup.usernames,
        format: setup.format,
        options: setup.options,
        perspective: setup.perspective,
        board: Board::new(),
        rng,
        next_id: 0,
        turn_number: 1,
        action_log: Vec::new(),
        sfx_queue: Vec::new(),
        animation_queue: Vec::new(),
        winner: None,
        pending: None,
        event_executing: false,
        invalid: None,
    };

    for color in PlayerColor::ALL {
        let id = state.fresh_object_id();
        let core = Object::new(id, core_card(color, state.options.core_health), color, core_hex(color));
        state.board.place(core).map_err(|obj| {
            EngineError::InvalidSetup(format!("core hex {} is occupied", obj.hex))
        })?;
    }

    for color in PlayerColor::ALL {
        for _ in 0..state.options.starting_hand_size {
            take_top_card(&mut state, color);
        }
    }

    state.players.blue.energy = Energy {
        available: 1,
        total: 1,
    };

    info!(
        format = ?state.format,
        seed = state.rng.seed(),
        "new match between {} and {}",
        state.usernames.blue,
        state.usernames.orange
    );
    Ok(state)
}

/// Move the top card of a player's deck into their hand. In a shared deck
/// the same card also leaves the other player's deck.
pub(crate) fn take_top_card(state: &mut MatchState, color: PlayerColor) -> Option<CardInGame> {
    let card = state.players[color].deck.draw()?;
    if state.format == GameFormat::SharedDeck {
        state.players[color.opponent()].deck.draw();
    }
    state.players[color].hand.add_card(card.clone());
    Some(card)
}

/// Move the top card of a player's deck straight to their discard pile
pub(crate) fn burn_top_card(state: &mut MatchState, color: PlayerColor) -> Option<CardInGame> {
    let card = state.players[color].deck.draw()?;
    if state.format == GameFormat::SharedDeck {
        state.players[color.opponent()].deck.draw();
    }
    state.players[color].discard_pile.add_card(card.clone());
    Some(card)
}

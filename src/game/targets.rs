//! Target resolution.
//!
//! A [`Target`] resolves against the match state and an evaluation [`Context`]
//! into a tagged [`Collection`]. Everything here is pure apart from `Choose`,
//! which either consumes a queued player choice or suspends resolution, and
//! `Random`, `CopyOf` and `GenerateCard`, which draw on the match RNG and id
//! counter.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::card::abilities::AbilityId;
use crate::card::types::{CardId, CardInGame, CardSource};
use crate::card::vocabulary::Target;
use crate::game::conditions::compile_all;
use crate::game::error::{EngineError, Rejection};
use crate::game::hex::{all_hex_ids, Hex};
use crate::game::state::{ChosenTarget, MatchState, PlayerColor};
use crate::game::zones::ObjectId;

/// A resolved target set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "entries", rename_all = "camelCase")]
pub enum Collection {
    Cards(Vec<CardInGame>),
    Objects(Vec<ObjectId>),
    Players(Vec<PlayerColor>),
    Hexes(Vec<Hex>),
}

impl Collection {
    pub fn len(&self) -> usize {
        match self {
            Collection::Cards(v) => v.len(),
            Collection::Objects(v) => v.len(),
            Collection::Players(v) => v.len(),
            Collection::Hexes(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Collection::Cards(_) => "cards",
            Collection::Objects(_) => "objects",
            Collection::Players(_) => "players",
            Collection::Hexes(_) => "hexes",
        }
    }

    /// An empty collection of the same kind
    pub fn emptied(&self) -> Collection {
        match self {
            Collection::Cards(_) => Collection::Cards(vec![]),
            Collection::Objects(_) => Collection::Objects(vec![]),
            Collection::Players(_) => Collection::Players(vec![]),
            Collection::Hexes(_) => Collection::Hexes(vec![]),
        }
    }

    pub fn contains_object(&self, id: ObjectId) -> bool {
        matches!(self, Collection::Objects(ids) if ids.contains(&id))
    }

    pub fn contains_player(&self, color: PlayerColor) -> bool {
        matches!(self, Collection::Players(players) if players.contains(&color))
    }

    /// Board hexes this collection points at
    pub fn hexes(&self, state: &MatchState) -> Result<Vec<Hex>, EngineError> {
        match self {
            Collection::Objects(ids) => Ok(ids
                .iter()
                .filter_map(|id| state.board.get(*id))
                .map(|obj| obj.hex)
                .collect()),
            Collection::Hexes(hexes) => Ok(hexes.clone()),
            other => Err(mismatch("objects or hexes", other)),
        }
    }

    /// Objects this collection points at; hexes resolve to their occupants
    pub fn objects(&self, state: &MatchState) -> Result<Vec<ObjectId>, EngineError> {
        match self {
            Collection::Objects(ids) => Ok(ids.clone()),
            Collection::Hexes(hexes) => Ok(hexes.iter().filter_map(|h| state.board.id_at(h)).collect()),
            other => Err(mismatch("objects", other)),
        }
    }

    pub fn players(&self) -> Result<Vec<PlayerColor>, EngineError> {
        match self {
            Collection::Players(players) => Ok(players.clone()),
            other => Err(mismatch("players", other)),
        }
    }

    pub fn cards(&self) -> Result<Vec<CardInGame>, EngineError> {
        match self {
            Collection::Cards(cards) => Ok(cards.clone()),
            other => Err(mismatch("cards", other)),
        }
    }
}

pub(crate) fn mismatch(expected: &str, got: &Collection) -> EngineError {
    EngineError::Malformed(format!("expected {}, got a collection of {}", expected, got.kind()))
}

/// The object or card an event or a choice made prominent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Salient {
    Object(ObjectId),
    Card(CardInGame),
}

/// Salience and provenance threaded through one resolution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    /// Object whose ability is being evaluated
    pub current_object: Option<ObjectId>,
    /// Who controls the ability, should its object leave the board mid-resolution
    pub controller: Option<PlayerColor>,
    /// Ability the resolution belongs to
    pub source: Option<AbilityId>,
    /// Object or card recorded by the event being handled, or the last choice
    pub it: Option<Salient>,
    /// Player recorded by the event being handled
    pub salient_player: Option<PlayerColor>,
    /// The event's undergoer, e.g. the defender of an attack
    pub that: Option<Salient>,
    /// Entry a per-target action is currently working on
    pub iteratee: Option<Salient>,
    pub in_trigger: bool,
    /// A player can be asked to choose; otherwise `Choose` picks at random
    pub interactive: bool,
    /// Duration given to abilities installed during this resolution
    pub duration: Option<u32>,
}

impl Context {
    /// Resolution started by a player's command
    pub fn command() -> Self {
        Context {
            interactive: true,
            ..Default::default()
        }
    }

    /// Evaluation on behalf of an object outside any player prompt
    pub fn for_object(state: &MatchState, id: ObjectId) -> Self {
        Context {
            current_object: Some(id),
            controller: state.board.get(id).map(|obj| obj.owner),
            ..Default::default()
        }
    }

    /// Child context evaluating on behalf of `id`, keeping event salience
    pub fn on_behalf_of(&self, state: &MatchState, id: ObjectId) -> Self {
        Context {
            current_object: Some(id),
            controller: state.board.get(id).map(|obj| obj.owner),
            ..self.clone()
        }
    }

    /// Player controlling the ability being resolved
    pub fn controller(&self, state: &MatchState) -> PlayerColor {
        self.current_object
            .and_then(|id| state.board.get(id))
            .map(|obj| obj.owner)
            .or(self.controller)
            .unwrap_or(state.current_turn)
    }

    /// `it`: inside a trigger the event's object outranks the trigger owner,
    /// outside one the object under evaluation outranks the event's object
    pub fn it(&self) -> Option<Salient> {
        let current = self.current_object.map(Salient::Object);
        if self.in_trigger {
            self.it.clone().or(current)
        } else {
            current.or_else(|| self.it.clone())
        }
    }

    pub fn that(&self) -> Option<Salient> {
        self.that.clone().or_else(|| self.it.clone())
    }

    pub fn they(&self) -> Option<Salient> {
        self.iteratee.clone().or_else(|| self.it.clone())
    }
}

fn salient_collection(state: &MatchState, salient: Option<Salient>) -> Collection {
    match salient {
        Some(Salient::Object(id)) if state.board.contains(id) => Collection::Objects(vec![id]),
        Some(Salient::Card(card)) => Collection::Cards(vec![card]),
        _ => Collection::Objects(vec![]),
    }
}

/// Join names as "A", "A and B" or "A, B, and C"
pub(crate) fn sentence(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [one] => one.clone(),
        [a, b] => format!("{} and {}", a, b),
        [rest @ .., last] => format!("{}, and {}", rest.join(", "), last),
    }
}

fn fresh_card_id(state: &mut MatchState) -> CardId {
    CardId(format!("token/{}", state.fresh_id()))
}

pub fn resolve(state: &mut MatchState, target: &Target, ctx: &mut Context) -> Result<Collection, EngineError> {
    let collection = match target {
        Target::AllTiles => Collection::Hexes(all_hex_ids().to_vec()),

        Target::CardsInHand { player, card_type } => {
            let players = resolve(state, player, ctx)?.players()?;
            let view: &MatchState = state;
            let cards = players
                .into_iter()
                .flat_map(|color| view.players[color].hand.cards().iter())
                .filter(|card| card_type.matches(card.card_type))
                .cloned()
                .collect();
            Collection::Cards(cards)
        }

        Target::ObjectsInPlay(query) => Collection::Objects(
            state
                .board
                .objects()
                .filter(|obj| query.matches(obj.card_type()))
                .map(|obj| obj.id)
                .collect(),
        ),

        Target::ObjectsMatching {
            object_type,
            conditions,
        } => {
            let predicates = compile_all(state, conditions, ctx)?;
            Collection::Objects(
                state
                    .board
                    .objects()
                    .filter(|obj| object_type.matches(obj.card_type()))
                    .filter(|obj| predicates.iter().all(|p| p.matches(&obj.hex, Some(obj))))
                    .map(|obj| obj.id)
                    .collect(),
            )
        }

        Target::TilesMatching(conditions) => {
            let predicates = compile_all(state, conditions, ctx)?;
            Collection::Hexes(
                all_hex_ids()
                    .iter()
                    .filter(|hex| {
                        let occupant = state.board.object_at(hex);
                        predicates.iter().all(|p| p.matches(hex, occupant))
                    })
                    .copied()
                    .collect(),
            )
        }

        Target::All(inner) => resolve(state, inner, ctx)?,

        Target::Choose(inner) => {
            let candidates = resolve(state, inner, ctx)?;
            choose(state, candidates, ctx)?
        }

        Target::Random { count, from } => {
            let candidates = resolve(state, from, ctx)?;
            random(state, candidates, *count)
        }

        Target::It => salient_collection(state, ctx.it()),
        Target::That => salient_collection(state, ctx.that()),
        Target::They => salient_collection(state, ctx.they()),
        Target::ThisObject => salient_collection(state, ctx.current_object.map(Salient::Object)),

        Target::AllPlayers => {
            Collection::Players(vec![state.current_turn, state.current_turn.opponent()])
        }
        Target::SelfPlayer => Collection::Players(vec![ctx.controller(state)]),
        Target::Opponent => Collection::Players(vec![ctx.controller(state).opponent()]),
        Target::SalientPlayer => Collection::Players(vec![ctx
            .salient_player
            .unwrap_or_else(|| state.current_turn.opponent())]),

        Target::ControllerOf(inner) => {
            let players = match resolve(state, inner, ctx)? {
                Collection::Objects(ids) if ids.len() == 1 => {
                    state.board.get(ids[0]).map(|obj| obj.owner).into_iter().collect()
                }
                Collection::Cards(cards) if cards.len() == 1 => {
                    state.holder_of(&cards[0].id).into_iter().collect()
                }
                Collection::Players(_) | Collection::Objects(_) | Collection::Cards(_) => vec![],
                other => return Err(mismatch("objects or cards", &other)),
            };
            Collection::Players(players)
        }

        Target::CopyOf(inner) => {
            let template = match resolve(state, inner, ctx)? {
                Collection::Objects(ids) => ids
                    .first()
                    .and_then(|id| state.board.get(*id))
                    .map(|obj| obj.card.clone()),
                Collection::Cards(cards) => cards.into_iter().next(),
                other => return Err(mismatch("objects or cards", &other)),
            };
            match template {
                Some(card) => {
                    let id = fresh_card_id(state);
                    Collection::Cards(vec![CardInGame {
                        id,
                        cost: card.base_cost,
                        cost_adjustments: Vec::new(),
                        ..card
                    }])
                }
                None => Collection::Cards(vec![]),
            }
        }

        Target::GenerateCard {
            card_type,
            stats,
            name,
        } => {
            let id = fresh_card_id(state);
            Collection::Cards(vec![CardInGame {
                id,
                name: name.clone().unwrap_or_else(|| "Token".to_string()),
                card_type: *card_type,
                base_cost: 0,
                cost: 0,
                stats: Some(*stats),
                text: String::new(),
                abilities: Vec::new(),
                source: CardSource::Generated,
                cost_adjustments: Vec::new(),
            }])
        }
    };

    Ok(collection)
}

/// The interactive selector.
///
/// Pops the turn player's chosen queue if anything is queued. Otherwise it
/// exposes the candidates and returns an empty collection, which suspends the
/// resolution until the player answers. Outside a player prompt it picks one
/// candidate at random.
fn choose(state: &mut MatchState, candidates: Collection, ctx: &mut Context) -> Result<Collection, EngineError> {
    if let Collection::Players(_) = candidates {
        return Err(EngineError::Malformed("cannot choose among players".to_string()));
    }

    if !ctx.interactive {
        return Ok(random(state, candidates, 1));
    }

    let player = state.current_turn;
    if let Some(chosen) = state.players[player].target.chosen.pop_front() {
        let picked = match chosen {
            ChosenTarget::Hex(hex) => match state.board.id_at(&hex) {
                Some(id) => {
                    ctx.it = Some(Salient::Object(id));
                    Collection::Objects(vec![id])
                }
                None => Collection::Hexes(vec![hex]),
            },
            ChosenTarget::Card(card_id) => {
                let card = match &candidates {
                    Collection::Cards(cards) => cards.iter().find(|c| c.id == card_id).cloned(),
                    _ => None,
                }
                .or_else(|| state.cards_in_hands().find(|c| c.id == card_id).cloned());
                match card {
                    Some(card) => {
                        ctx.it = Some(Salient::Card(card.clone()));
                        Collection::Cards(vec![card])
                    }
                    None => Collection::Cards(vec![]),
                }
            }
        };
        debug!(?player, picked = picked.kind(), "consumed queued choice");
        return Ok(picked);
    }

    // Only one prompt per round trip
    if state.players[player].target.choosing {
        return Ok(candidates.emptied());
    }

    let (possible_hexes, possible_cards): (Vec<Hex>, Vec<CardId>) = match &candidates {
        Collection::Cards(cards) => (vec![], cards.iter().map(|c| c.id.clone()).collect()),
        Collection::Objects(ids) => (
            ids.iter()
                .filter_map(|id| state.board.get(*id))
                .filter(|obj| !obj.just_played)
                .map(|obj| obj.hex)
                .collect(),
            vec![],
        ),
        Collection::Hexes(hexes) => (
            hexes
                .iter()
                .filter(|hex| state.board.object_at(hex).map_or(true, |obj| !obj.just_played))
                .copied()
                .collect(),
            vec![],
        ),
        Collection::Players(_) => (vec![], vec![]),
    };

    if possible_hexes.is_empty() && possible_cards.is_empty() {
        debug!(?player, "nothing to choose from");
        state.invalid = Some(Rejection::NoValidTargets);
        return Ok(candidates.emptied());
    }

    debug!(
        ?player,
        hexes = possible_hexes.len(),
        cards = possible_cards.len(),
        "awaiting target choice"
    );
    let record = &mut state.players[player].target;
    record.choosing = true;
    record.possible_hexes = possible_hexes;
    record.possible_cards = possible_cards;
    Ok(candidates.emptied())
}

/// Seeded pick without replacement; logs what was selected
fn random(state: &mut MatchState, candidates: Collection, count: usize) -> Collection {
    let picked = match candidates {
        Collection::Cards(cards) => Collection::Cards(state.rng.pick(&cards, count)),
        Collection::Objects(ids) => Collection::Objects(state.rng.pick(&ids, count)),
        Collection::Players(players) => Collection::Players(state.rng.pick(&players, count)),
        Collection::Hexes(hexes) => Collection::Hexes(state.rng.pick(&hexes, count)),
    };

    let cards: Vec<CardInGame> = match &picked {
        Collection::Cards(cards) => cards.clone(),
        Collection::Objects(ids) => ids
            .iter()
            .filter_map(|id| state.board.get(*id))
            .map(|obj| obj.card.clone())
            .collect(),
        _ => vec![],
    };
    if !cards.is_empty() {
        let names: Vec<String> = cards.iter().map(|c| format!("|{}|", c.name)).collect();
        let verb = if cards.len() == 1 { "was" } else { "were" };
        state.log(None, &format!("{} {} selected", sentence(&names), verb), cards);
    }
    picked
}

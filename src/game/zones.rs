use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::card::abilities::{
    AbilityId, ActivatedAbility, PassiveAbility, StatusEffect, StatusEffectKind, TriggeredAbility,
};
use crate::card::types::{Attribute, CardId, CardInGame, CardType, StatAdjustment, Stats};
use crate::game::hex::Hex;
use crate::game::state::PlayerColor;

/// Stable integer id of an object on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object#{}", self.0)
    }
}

/// A robot, structure or core on the board with state tracking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    pub id: ObjectId,
    pub card: CardInGame,
    pub owner: PlayerColor,
    pub hex: Hex,
    pub stats: Stats,

    pub abilities: Vec<PassiveAbility>,
    pub triggers: Vec<TriggeredAbility>,
    pub activated_abilities: Vec<ActivatedAbility>,
    pub effects: Vec<StatusEffect>,
    pub temporary_adjustments: Vec<StatAdjustment>,

    pub moves_made: i32,
    pub cant_move: bool,
    pub cant_attack: bool,
    pub cant_activate: bool,
    pub attacked_this_turn: bool,
    pub moved_this_turn: bool,
    pub attacked_last_turn: bool,
    pub moved_last_turn: bool,
    pub just_played: bool,

    /// Destruction requested
    pub is_destroyed: bool,
    /// Destruction handling has started; set exactly once
    pub being_destroyed: bool,
}

impl Object {
    /// A freshly placed object cannot move, attack or activate until its next turn
    pub fn new(id: ObjectId, card: CardInGame, owner: PlayerColor, hex: Hex) -> Self {
        let stats = card.stats.unwrap_or(Stats::structure(0));
        Object {
            id,
            card,
            owner,
            hex,
            stats,
            abilities: Vec::new(),
            triggers: Vec::new(),
            activated_abilities: Vec::new(),
            effects: Vec::new(),
            temporary_adjustments: Vec::new(),
            moves_made: 0,
            cant_move: true,
            cant_attack: true,
            cant_activate: true,
            attacked_this_turn: false,
            moved_this_turn: false,
            attacked_last_turn: false,
            moved_last_turn: false,
            just_played: false,
            is_destroyed: false,
            being_destroyed: false,
        }
    }

    pub fn card_type(&self) -> CardType {
        self.card.card_type
    }

    pub fn name(&self) -> &str {
        &self.card.name
    }

    /// Effective attribute: base stat with each temporary adjustment applied in order
    pub fn attribute(&self, attribute: Attribute) -> Option<i32> {
        let base = self.stats.get(attribute)?;
        Some(
            self.temporary_adjustments
                .iter()
                .filter(|adj| adj.attribute == Some(attribute))
                .fold(base, |value, adj| adj.adjustment.apply(value)),
        )
    }

    pub fn attack(&self) -> i32 {
        self.attribute(Attribute::Attack).unwrap_or(0)
    }

    pub fn health(&self) -> i32 {
        self.attribute(Attribute::Health).unwrap_or(0)
    }

    pub fn speed(&self) -> i32 {
        self.attribute(Attribute::Speed).unwrap_or(0)
    }

    pub fn is_damaged(&self) -> bool {
        self.health() < self.card.base_health()
    }

    pub fn has_effect(&self, kind: &StatusEffectKind) -> bool {
        self.effects.iter().any(|e| e.kind.same_kind(kind))
    }

    /// Union of every `CanOnlyAttack` restriction, or None when unrestricted
    pub fn attack_restriction(&self) -> Option<Vec<ObjectId>> {
        let mut restricted = false;
        let mut allowed = Vec::new();
        for effect in &self.effects {
            if let StatusEffectKind::CanOnlyAttack(ids) = &effect.kind {
                restricted = true;
                allowed.extend(ids.iter().copied());
            }
        }
        restricted.then_some(allowed)
    }

    pub fn can_move_over_objects(&self) -> bool {
        self.has_effect(&StatusEffectKind::CanMoveOverObjects)
    }

    pub fn moves_left(&self) -> i32 {
        if self.cant_move || self.has_effect(&StatusEffectKind::CannotMove) {
            0
        } else {
            (self.speed() - self.moves_made).max(0)
        }
    }

    pub fn can_activate(&self) -> bool {
        !self.cant_activate && !self.has_effect(&StatusEffectKind::CannotActivate)
    }

    /// Per-turn reset at the start of its owner's turn
    pub fn reset_for_turn(&mut self) {
        self.moves_made = 0;
        self.cant_activate = false;
        self.cant_attack = false;
        self.cant_move = false;
    }

    /// Shift this turn's flags into the last-turn mirrors
    pub fn end_turn(&mut self) {
        self.attacked_last_turn = self.attacked_this_turn;
        self.moved_last_turn = self.moved_this_turn;
        self.attacked_this_turn = false;
        self.moved_this_turn = false;
    }

    pub fn remove_adjustments_from(&mut self, aid: AbilityId) {
        self.temporary_adjustments.retain(|adj| adj.aid != aid);
    }
}

/// Objects on the board, indexed by id. Each carries its hex and owner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Board {
    objects: BTreeMap<ObjectId, Object>,
}

impl Board {
    pub fn new() -> Self {
        Board {
            objects: BTreeMap::new(),
        }
    }

    /// Place an object. Returns it back if its hex is taken.
    pub fn place(&mut self, object: Object) -> Result<(), Object> {
        if self.is_occupied(&object.hex) || self.objects.contains_key(&object.id) {
            return Err(object);
        }
        self.objects.insert(object.id, object);
        Ok(())
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<Object> {
        self.objects.remove(&id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.objects.get_mut(&id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn object_at(&self, hex: &Hex) -> Option<&Object> {
        self.objects.values().find(|obj| obj.hex == *hex)
    }

    pub fn id_at(&self, hex: &Hex) -> Option<ObjectId> {
        self.object_at(hex).map(|obj| obj.id)
    }

    pub fn is_occupied(&self, hex: &Hex) -> bool {
        self.object_at(hex).is_some()
    }

    /// All objects, in creation order
    pub fn objects(&self) -> impl Iterator<Item = &Object> {
        self.objects.values()
    }

    pub fn objects_mut(&mut self) -> impl Iterator<Item = &mut Object> {
        self.objects.values_mut()
    }

    pub fn objects_of(&self, player: PlayerColor) -> impl Iterator<Item = &Object> {
        self.objects.values().filter(move |obj| obj.owner == player)
    }

    pub fn ids(&self) -> Vec<ObjectId> {
        self.objects.keys().copied().collect()
    }

    pub fn core_of(&self, player: PlayerColor) -> Option<&Object> {
        self.objects_of(player).find(|obj| obj.card_type() == CardType::Core)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Deck - ordered stack of cards, drawn from the front
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Deck {
    cards: Vec<CardInGame>,
}

impl Deck {
    pub fn new() -> Self {
        Deck { cards: Vec::new() }
    }

    pub fn from_cards(cards: Vec<CardInGame>) -> Self {
        Deck { cards }
    }

    pub fn add_card(&mut self, card: CardInGame) {
        self.cards.push(card);
    }

    pub fn draw(&mut self) -> Option<CardInGame> {
        if self.cards.is_empty() {
            None
        } else {
            Some(self.cards.remove(0))
        }
    }

    pub fn size(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn shuffle(&mut self, rng: &mut crate::rng::GameRng) {
        rng.shuffle(&mut self.cards);
    }

    pub fn cards(&self) -> &[CardInGame] {
        &self.cards
    }
}

/// Hand - cards in hand
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hand {
    cards: Vec<CardInGame>,
}

impl Hand {
    pub fn new() -> Self {
        Hand { cards: Vec::new() }
    }

    pub fn add_card(&mut self, card: CardInGame) {
        self.cards.push(card);
    }

    pub fn remove_card(&mut self, id: &CardId) -> Option<CardInGame> {
        let idx = self.cards.iter().position(|c| c.id == *id)?;
        Some(self.cards.remove(idx))
    }

    pub fn get(&self, id: &CardId) -> Option<&CardInGame> {
        self.cards.iter().find(|c| c.id == *id)
    }

    pub fn get_mut(&mut self, id: &CardId) -> Option<&mut CardInGame> {
        self.cards.iter_mut().find(|c| c.id == *id)
    }

    pub fn size(&self) -> usize {
        self.cards.len()
    }

    pub fn cards(&self) -> &[CardInGame] {
        &self.cards
    }

    pub fn cards_mut(&mut self) -> &mut [CardInGame] {
        &mut self.cards
    }
}

/// Discard pile (ordered, newest last)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiscardPile {
    cards: Vec<CardInGame>,
}

impl DiscardPile {
    pub fn new() -> Self {
        DiscardPile { cards: Vec::new() }
    }

    pub fn add_card(&mut self, card: CardInGame) {
        self.cards.push(card);
    }

    pub fn size(&self) -> usize {
        self.cards.len()
    }

    pub fn cards(&self) -> &[CardInGame] {
        &self.cards
    }

    pub fn last(&self) -> Option<&CardInGame> {
        self.cards.last()
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::card::abilities::AbilityId;
use crate::card::vocabulary::CardCommand;

/// Card types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Robot,
    Event,
    Structure,
    Core,
}

impl CardType {
    /// Whether cards of this type become objects on the board when played
    pub fn is_object(&self) -> bool {
        !matches!(self, CardType::Event)
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CardType::Robot => "robot",
            CardType::Event => "event",
            CardType::Structure => "structure",
            CardType::Core => "core",
        };
        f.write_str(name)
    }
}

/// A card-type filter used by collections and trigger specs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CardTypeQuery {
    Any,
    Only(CardType),
    OneOf(Vec<CardType>),
}

impl CardTypeQuery {
    pub fn matches(&self, card_type: CardType) -> bool {
        match self {
            CardTypeQuery::Any => true,
            CardTypeQuery::Only(t) => *t == card_type,
            CardTypeQuery::OneOf(types) => types.contains(&card_type),
        }
    }
}

/// Where a card came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardSource {
    #[default]
    Builtin,
    User,
    Generated,
}

/// The three numeric attributes an object can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    Attack,
    Health,
    Speed,
}

impl Attribute {
    pub const ALL: [Attribute; 3] = [Attribute::Attack, Attribute::Health, Attribute::Speed];
}

/// Attribute selector for modifications; `Cost` only applies to cards in hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeTarget {
    Attack,
    Health,
    Speed,
    Cost,
    AllAttributes,
}

impl AttributeTarget {
    /// Expand to the object attributes this selector touches
    pub fn attributes(&self) -> Vec<Attribute> {
        match self {
            AttributeTarget::Attack => vec![Attribute::Attack],
            AttributeTarget::Health => vec![Attribute::Health],
            AttributeTarget::Speed => vec![Attribute::Speed],
            AttributeTarget::Cost => vec![],
            AttributeTarget::AllAttributes => Attribute::ALL.to_vec(),
        }
    }
}

/// Base stats. Structures and cores have no attack or speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub attack: Option<i32>,
    pub health: i32,
    #[serde(default)]
    pub speed: Option<i32>,
}

impl Stats {
    pub fn robot(attack: i32, health: i32, speed: i32) -> Self {
        Stats {
            attack: Some(attack),
            health,
            speed: Some(speed),
        }
    }

    pub fn structure(health: i32) -> Self {
        Stats {
            attack: None,
            health,
            speed: None,
        }
    }

    pub fn get(&self, attribute: Attribute) -> Option<i32> {
        match attribute {
            Attribute::Attack => self.attack,
            Attribute::Health => Some(self.health),
            Attribute::Speed => self.speed,
        }
    }

    /// Overwrite an attribute. Absent attributes stay absent.
    pub fn set(&mut self, attribute: Attribute, value: i32) {
        match attribute {
            Attribute::Attack => {
                if self.attack.is_some() {
                    self.attack = Some(value);
                }
            }
            Attribute::Health => self.health = value,
            Attribute::Speed => {
                if self.speed.is_some() {
                    self.speed = Some(value);
                }
            }
        }
    }
}

/// A resolved modification function. Every application is clamped at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Adjustment {
    Add(i32),
    Subtract(i32),
    Multiply(i32),
    Divide(i32),
    Set(i32),
}

impl Adjustment {
    pub fn apply(&self, value: i32) -> i32 {
        let raw = match *self {
            Adjustment::Add(n) => value.saturating_add(n),
            Adjustment::Subtract(n) => value.saturating_sub(n),
            Adjustment::Multiply(n) => value.saturating_mul(n),
            Adjustment::Divide(n) => {
                if n == 0 {
                    value
                } else {
                    value.div_euclid(n)
                }
            }
            Adjustment::Set(n) => n,
        };
        clamp(raw)
    }
}

/// Attribute values never drop below zero
pub fn clamp(value: i32) -> i32 {
    value.max(0)
}

/// A temporary, independently removable attribute adjustment keyed by ability id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatAdjustment {
    pub aid: AbilityId,
    pub attribute: Option<Attribute>,
    pub adjustment: Adjustment,
}

/// Stable card instance id (e.g. `"Attack Bot#3"` or `"token/17"`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub String);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Library entry for a card, as supplied by the card compiler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub card_type: CardType,
    pub cost: i32,
    #[serde(default)]
    pub stats: Option<Stats>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub abilities: Vec<CardCommand>,
    #[serde(default)]
    pub source: CardSource,
}

impl CardDefinition {
    pub fn instantiate(&self, id: CardId) -> CardInGame {
        CardInGame {
            id,
            name: self.name.clone(),
            card_type: self.card_type,
            base_cost: self.cost,
            cost: self.cost,
            stats: self.stats,
            text: self.text.clone(),
            abilities: self.abilities.clone(),
            source: self.source,
            cost_adjustments: Vec::new(),
        }
    }
}

/// A card instance inside a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardInGame {
    pub id: CardId,
    pub name: String,
    #[serde(rename = "type")]
    pub card_type: CardType,
    pub base_cost: i32,
    pub cost: i32,
    pub stats: Option<Stats>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub abilities: Vec<CardCommand>,
    #[serde(default)]
    pub source: CardSource,
    #[serde(default)]
    pub cost_adjustments: Vec<StatAdjustment>,
}

impl CardInGame {
    /// Cost after applying every temporary adjustment in order
    pub fn effective_cost(&self) -> i32 {
        self.cost_adjustments
            .iter()
            .fold(self.cost, |cost, adj| adj.adjustment.apply(cost))
    }

    pub fn base_health(&self) -> i32 {
        self.stats.map(|s| s.health).unwrap_or(0)
    }
}

//! The closed vocabulary that card commands are written in.
//!
//! Every card behavior is plain data built from these enums. The card compiler
//! emits them as JSON; the engine interprets them in `game::targets`,
//! `game::conditions`, `game::actions` and `game::triggers`. An unknown name
//! fails deserialization, so malformed content never reaches the interpreter.

use serde::{Deserialize, Serialize};

use crate::card::types::{Attribute, AttributeTarget, CardType, CardTypeQuery, Stats};
use crate::game::zones::ObjectId;

/// Selects cards, objects, players or hexes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Target {
    // Collections
    AllTiles,
    CardsInHand {
        player: Box<Target>,
        card_type: CardTypeQuery,
    },
    ObjectsInPlay(CardTypeQuery),
    ObjectsMatching {
        object_type: CardTypeQuery,
        conditions: Vec<ObjectCondition>,
    },
    TilesMatching(Vec<ObjectCondition>),

    // Selectors
    All(Box<Target>),
    Choose(Box<Target>),
    Random {
        count: usize,
        from: Box<Target>,
    },

    // Salience
    It,
    That,
    They,
    ThisObject,

    // Players
    AllPlayers,
    SelfPlayer,
    Opponent,
    SalientPlayer,
    ControllerOf(Box<Target>),

    // Fabricated cards
    CopyOf(Box<Target>),
    GenerateCard {
        card_type: CardType,
        stats: Stats,
        #[serde(default)]
        name: Option<String>,
    },
}

impl Target {
    pub fn choose(from: Target) -> Self {
        Target::Choose(Box::new(from))
    }

    pub fn random(count: usize, from: Target) -> Self {
        Target::Random {
            count,
            from: Box::new(from),
        }
    }
}

/// Boolean flags an object can be asked about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Property {
    AttackedLastTurn,
    AttackedThisTurn,
    MovedLastTurn,
    MovedThisTurn,
    IsDestroyed,
    IsDamaged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Comparison {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl Comparison {
    pub fn holds(&self, lhs: i32, rhs: i32) -> bool {
        match self {
            Comparison::Equal => lhs == rhs,
            Comparison::NotEqual => lhs != rhs,
            Comparison::LessThan => lhs < rhs,
            Comparison::LessThanOrEqual => lhs <= rhs,
            Comparison::GreaterThan => lhs > rhs,
            Comparison::GreaterThanOrEqual => lhs >= rhs,
        }
    }
}

/// Predicate over a (hex, optional object) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ObjectCondition {
    AdjacentTo(Target),
    AttributeComparison {
        attribute: Attribute,
        comparison: Comparison,
        value: Number,
    },
    ControlledBy(Target),
    ExactDistanceFrom {
        distance: u32,
        target: Target,
    },
    WithinDistanceOf {
        distance: u32,
        target: Target,
    },
    /// Internal only; the card compiler never emits it.
    HasId(ObjectId),
    HasProperty(Property),
    Unoccupied,
}

/// Predicate over the whole state, used by `Action::If`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum GlobalCondition {
    CollectionExists(Target),
    TargetHasProperty { target: Target, property: Property },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Number {
    Const(i32),
    Count(Box<Target>),
    AttributeSum {
        target: Box<Target>,
        attribute: Attribute,
    },
    AttributeValue {
        target: Box<Target>,
        attribute: Attribute,
    },
}

impl From<i32> for Number {
    fn from(n: i32) -> Self {
        Number::Const(n)
    }
}

/// Modification function; resolves to an `Adjustment` once its number is known
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Modifier {
    Add(Number),
    Subtract(Number),
    Multiply(Number),
    Divide(Number),
    Set(Number),
}

impl Modifier {
    pub fn number(&self) -> &Number {
        match self {
            Modifier::Add(n)
            | Modifier::Subtract(n)
            | Modifier::Multiply(n)
            | Modifier::Divide(n)
            | Modifier::Set(n) => n,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Action {
    CanMoveAgain(Target),
    CanMoveAndAttackAgain(Target),
    DealDamage {
        target: Target,
        amount: Number,
    },
    Destroy(Target),
    Discard(Target),
    Draw {
        player: Target,
        count: Number,
    },
    EndTurn,
    GiveAbility {
        target: Target,
        ability: Box<CardCommand>,
        #[serde(default)]
        duration: Option<u32>,
    },
    ModifyAttribute {
        target: Target,
        attribute: AttributeTarget,
        modifier: Modifier,
    },
    ModifyEnergy {
        player: Target,
        modifier: Modifier,
    },
    RestoreHealth {
        target: Target,
        #[serde(default)]
        amount: Option<Number>,
    },
    SetAttribute {
        target: Target,
        attribute: AttributeTarget,
        value: Number,
    },
    SwapAttributes {
        target: Target,
        first: Attribute,
        second: Attribute,
    },
    TakeControl {
        player: Target,
        target: Target,
    },
    ReturnToHand(Target),
    MoveObject {
        target: Target,
        destination: Target,
    },
    SpawnObject {
        card: Target,
        hex: Target,
        owner: Target,
    },
    If {
        condition: GlobalCondition,
        then: Vec<Action>,
    },
}

/// Status effects a passive ability can place on objects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusEffectDef {
    CannotAttack,
    CannotMove,
    CannotActivate,
    CannotFightBack,
    CanMoveOverObjects,
    CanOnlyAttack(Target),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PassiveEffect {
    AttributeAdjustment {
        attribute: AttributeTarget,
        modifier: Modifier,
    },
    ApplyEffect(StatusEffectDef),
    GiveAbility(Box<CardCommand>),
    /// Grants an activated ability to each target
    Activated {
        text: String,
        actions: Vec<Action>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassiveAbilityDef {
    pub targets: Target,
    pub effect: PassiveEffect,
    #[serde(default)]
    pub duration: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventType {
    AfterAttack,
    AfterCardPlay,
    AfterDamageReceived,
    AfterDestroyed,
    AfterMove,
    AfterPlayed,
    BeginningOfTurn,
    EndOfTurn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Cause {
    Combat,
    #[default]
    AnyEvent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerSpec {
    pub event: EventType,
    /// Objects (or players) whose events this trigger listens to
    pub targets: Target,
    #[serde(default)]
    pub cause: Cause,
    /// Defender type for `AfterAttack`, played card type for `AfterCardPlay`
    #[serde(default)]
    pub card_type: Option<CardTypeQuery>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerDef {
    pub trigger: TriggerSpec,
    pub actions: Vec<Action>,
    #[serde(default, rename = "override")]
    pub override_default: bool,
    #[serde(default)]
    pub duration: Option<u32>,
}

/// One compiled sentence of card text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CardCommand {
    Actions(Vec<Action>),
    SetAbility(PassiveAbilityDef),
    SetTrigger(TriggerDef),
}

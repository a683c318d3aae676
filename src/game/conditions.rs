//! Condition evaluation.
//!
//! Object conditions are compiled once per resolution into [`Predicate`]s,
//! which are then tested against (hex, occupant) pairs without touching the
//! state again. Spatial conditions become plain hex sets.

use std::collections::HashSet;

use crate::card::abilities::StatusEffectKind;
use crate::card::types::{Adjustment, Attribute, CardType};
use crate::card::vocabulary::{
    Comparison, GlobalCondition, Modifier, Number, ObjectCondition, Property, Target,
};
use crate::game::error::EngineError;
use crate::game::hex::{all_hex_ids, Hex};
use crate::game::state::{MatchState, PlayerColor};
use crate::game::targets::{mismatch, resolve, Collection, Context};
use crate::game::zones::{Object, ObjectId};

/// A compiled object condition
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    InHexes(HashSet<Hex>),
    ControlledBy(Option<PlayerColor>),
    Attribute {
        attribute: Attribute,
        comparison: Comparison,
        value: i32,
    },
    HasId(ObjectId),
    HasProperty(Property),
    Unoccupied,
}

impl Predicate {
    pub fn matches(&self, hex: &Hex, object: Option<&Object>) -> bool {
        match self {
            Predicate::InHexes(hexes) => hexes.contains(hex),
            Predicate::ControlledBy(player) => match (object, player) {
                (Some(obj), Some(player)) => obj.owner == *player,
                _ => false,
            },
            Predicate::Attribute {
                attribute,
                comparison,
                value,
            } => object
                .and_then(|obj| obj.attribute(*attribute))
                .is_some_and(|actual| comparison.holds(actual, *value)),
            Predicate::HasId(id) => object.is_some_and(|obj| obj.id == *id),
            Predicate::HasProperty(property) => object.is_some_and(|obj| has_property(obj, *property)),
            Predicate::Unoccupied => object.is_none(),
        }
    }
}

pub fn has_property(object: &Object, property: Property) -> bool {
    match property {
        Property::AttackedLastTurn => object.attacked_last_turn,
        Property::AttackedThisTurn => object.attacked_this_turn,
        Property::MovedLastTurn => object.moved_last_turn,
        Property::MovedThisTurn => object.moved_this_turn,
        Property::IsDestroyed => object.is_destroyed,
        Property::IsDamaged => object.is_damaged(),
    }
}

fn hexes_near(
    state: &mut MatchState,
    reference: &Target,
    ctx: &mut Context,
    within: impl Fn(u32) -> bool,
) -> Result<HashSet<Hex>, EngineError> {
    let anchors = resolve(state, reference, ctx)?.hexes(state)?;
    Ok(all_hex_ids()
        .iter()
        .filter(|hex| anchors.iter().any(|anchor| within(hex.distance(anchor))))
        .copied()
        .collect())
}

pub fn compile(state: &mut MatchState, condition: &ObjectCondition, ctx: &mut Context) -> Result<Predicate, EngineError> {
    let predicate = match condition {
        ObjectCondition::AdjacentTo(target) => {
            let anchors = resolve(state, target, ctx)?.hexes(state)?;
            Predicate::InHexes(anchors.iter().flat_map(|hex| hex.neighbors()).collect())
        }
        ObjectCondition::AttributeComparison {
            attribute,
            comparison,
            value,
        } => Predicate::Attribute {
            attribute: *attribute,
            comparison: *comparison,
            value: evaluate_number(state, value, ctx)?,
        },
        ObjectCondition::ControlledBy(target) => {
            let players = resolve(state, target, ctx)?.players()?;
            Predicate::ControlledBy(players.first().copied())
        }
        ObjectCondition::ExactDistanceFrom { distance, target } => {
            let d = *distance;
            Predicate::InHexes(hexes_near(state, target, ctx, |actual| actual == d)?)
        }
        ObjectCondition::WithinDistanceOf { distance, target } => {
            let d = *distance;
            Predicate::InHexes(hexes_near(state, target, ctx, |actual| actual <= d)?)
        }
        ObjectCondition::HasId(id) => Predicate::HasId(*id),
        ObjectCondition::HasProperty(property) => Predicate::HasProperty(*property),
        ObjectCondition::Unoccupied => Predicate::Unoccupied,
    };
    Ok(predicate)
}

pub fn compile_all(
    state: &mut MatchState,
    conditions: &[ObjectCondition],
    ctx: &mut Context,
) -> Result<Vec<Predicate>, EngineError> {
    conditions.iter().map(|c| compile(state, c, ctx)).collect()
}

pub fn evaluate_global(state: &mut MatchState, condition: &GlobalCondition, ctx: &mut Context) -> Result<bool, EngineError> {
    match condition {
        GlobalCondition::CollectionExists(target) => Ok(!resolve(state, target, ctx)?.is_empty()),
        GlobalCondition::TargetHasProperty { target, property } => {
            let ids = resolve(state, target, ctx)?.objects(state)?;
            Ok(ids
                .iter()
                .filter_map(|id| state.board.get(*id))
                .all(|obj| has_property(obj, *property)))
        }
    }
}

fn attribute_values(state: &MatchState, collection: &Collection, attribute: Attribute) -> Result<Vec<i32>, EngineError> {
    match collection {
        Collection::Objects(ids) => Ok(ids
            .iter()
            .filter_map(|id| state.board.get(*id))
            .map(|obj| obj.attribute(attribute).unwrap_or(0))
            .collect()),
        Collection::Cards(cards) => Ok(cards
            .iter()
            .map(|card| card.stats.and_then(|s| s.get(attribute)).unwrap_or(0))
            .collect()),
        other => Err(mismatch("objects or cards", other)),
    }
}

pub fn evaluate_number(state: &mut MatchState, number: &Number, ctx: &mut Context) -> Result<i32, EngineError> {
    match number {
        Number::Const(n) => Ok(*n),
        Number::Count(target) => Ok(resolve(state, target, ctx)?.len() as i32),
        Number::AttributeSum { target, attribute } => {
            let collection = resolve(state, target, ctx)?;
            Ok(attribute_values(state, &collection, *attribute)?.iter().sum())
        }
        Number::AttributeValue { target, attribute } => {
            let collection = resolve(state, target, ctx)?;
            Ok(attribute_values(state, &collection, *attribute)?
                .first()
                .copied()
                .unwrap_or(0))
        }
    }
}

/// Resolve a modifier's number into a concrete adjustment
pub fn resolve_modifier(state: &mut MatchState, modifier: &Modifier, ctx: &mut Context) -> Result<Adjustment, EngineError> {
    let n = evaluate_number(state, modifier.number(), ctx)?;
    Ok(match modifier {
        Modifier::Add(_) => Adjustment::Add(n),
        Modifier::Subtract(_) => Adjustment::Subtract(n),
        Modifier::Multiply(_) => Adjustment::Multiply(n),
        Modifier::Divide(_) => Adjustment::Divide(n),
        Modifier::Set(_) => Adjustment::Set(n),
    })
}

/// Whether `attacker` may attack whatever stands on `hex`
pub fn allowed_to_attack(state: &MatchState, attacker: &Object, hex: &Hex) -> bool {
    let Some(defender) = state.board.object_at(hex) else {
        return false;
    };

    defender.owner != attacker.owner
        && attacker.card_type() == CardType::Robot
        && !attacker.cant_attack
        && !attacker.has_effect(&StatusEffectKind::CannotAttack)
        && attacker.attack() > 0
        && attacker
            .attack_restriction()
            .map_or(true, |allowed| allowed.contains(&defender.id))
}

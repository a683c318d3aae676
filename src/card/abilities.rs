use serde::{Deserialize, Serialize};
use std::fmt;

use crate::card::vocabulary::{Action, PassiveEffect, Target, TriggerSpec};
use crate::game::targets::Collection;
use crate::game::zones::ObjectId;

/// Stable ability id, allocated from the match id counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbilityId(pub u64);

impl fmt::Display for AbilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ability#{}", self.0)
    }
}

/// Behavior shared by abilities that live on an object and can expire
pub trait Ability {
    fn id(&self) -> AbilityId;
    fn source(&self) -> Option<AbilityId>;
    fn duration(&self) -> Option<u32>;
    fn set_duration(&mut self, duration: Option<u32>);

    /// Count down one turn. Returns true when the ability has run out.
    fn tick(&mut self) -> bool {
        match self.duration() {
            Some(1) | Some(0) => true,
            Some(n) => {
                self.set_duration(Some(n - 1));
                false
            }
            None => false,
        }
    }
}

/// A continuously reapplied ability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassiveAbility {
    pub id: AbilityId,
    /// The ability that granted this one, if it was given
    pub source: Option<AbilityId>,
    pub targets: Target,
    pub effect: PassiveEffect,
    pub duration: Option<u32>,
    pub disabled: bool,
    pub current_targets: Option<Collection>,
}

impl Ability for PassiveAbility {
    fn id(&self) -> AbilityId {
        self.id
    }

    fn source(&self) -> Option<AbilityId> {
        self.source
    }

    fn duration(&self) -> Option<u32> {
        self.duration
    }

    fn set_duration(&mut self, duration: Option<u32>) {
        self.duration = duration;
    }
}

/// An ability that reacts to board events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggeredAbility {
    pub id: AbilityId,
    pub source: Option<AbilityId>,
    pub trigger: TriggerSpec,
    pub actions: Vec<Action>,
    pub override_default: bool,
    pub duration: Option<u32>,
    #[serde(default)]
    pub disabled: bool,
}

impl Ability for TriggeredAbility {
    fn id(&self) -> AbilityId {
        self.id
    }

    fn source(&self) -> Option<AbilityId> {
        self.source
    }

    fn duration(&self) -> Option<u32> {
        self.duration
    }

    fn set_duration(&mut self, duration: Option<u32>) {
        self.duration = duration;
    }
}

/// A player-invoked ability granted to an object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivatedAbility {
    pub aid: AbilityId,
    pub text: String,
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusEffectKind {
    CannotAttack,
    CannotMove,
    CannotActivate,
    CannotFightBack,
    CanMoveOverObjects,
    /// Legal defenders, computed when the effect was applied
    CanOnlyAttack(Vec<ObjectId>),
}

impl StatusEffectKind {
    /// Same kind, ignoring payload
    pub fn same_kind(&self, other: &StatusEffectKind) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub aid: AbilityId,
    pub kind: StatusEffectKind,
}

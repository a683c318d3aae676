pub mod abilities;
pub mod database;
pub mod types;
pub mod vocabulary;

pub use abilities::{
    Ability, AbilityId, ActivatedAbility, PassiveAbility, StatusEffect, StatusEffectKind,
    TriggeredAbility,
};
pub use database::{CardDatabase, CardDatabaseError};
pub use types::{
    Adjustment, Attribute, AttributeTarget, CardDefinition, CardId, CardInGame, CardSource,
    CardType, CardTypeQuery, StatAdjustment, Stats,
};
pub use vocabulary::{
    Action, CardCommand, Cause, Comparison, EventType, GlobalCondition, Modifier, Number,
    ObjectCondition, PassiveAbilityDef, PassiveEffect, Property, StatusEffectDef, Target,
    TriggerDef, TriggerSpec,
};

//! Triggered and passive abilities.
//!
//! Triggers are matched against events as they happen. Passive abilities are
//! kept current by `apply_abilities`, which unapplies each one from its cached
//! targets and reapplies it to freshly resolved targets. Every passive writes
//! its changes under its own ability id, so one can be removed without
//! disturbing the others.

use tracing::{debug, trace};

use crate::card::abilities::{
    Ability, AbilityId, ActivatedAbility, PassiveAbility, StatusEffect, StatusEffectKind, TriggeredAbility,
};
use crate::card::types::{AttributeTarget, CardInGame, CardType, StatAdjustment};
use crate::card::vocabulary::{CardCommand, Cause, EventType, PassiveEffect, StatusEffectDef};
use crate::game::actions::execute_actions;
use crate::game::conditions::resolve_modifier;
use crate::game::error::EngineError;
use crate::game::state::{MatchState, PlayerColor};
use crate::game::targets::{mismatch, resolve, Collection, Context, Salient};
use crate::game::zones::ObjectId;

/// What an event happened to
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventTarget {
    /// Object events are heard by triggers listening to this object
    pub object: Option<ObjectId>,
    /// Card involved in a player event, e.g. the card just played
    pub card: Option<CardInGame>,
    /// Player events are heard by triggers listening to this player
    pub player: Option<PlayerColor>,
    pub undergoer: Option<ObjectId>,
    pub cause: Option<Cause>,
    pub card_type: Option<CardType>,
}

impl EventTarget {
    pub fn object(id: ObjectId) -> Self {
        EventTarget {
            object: Some(id),
            ..Default::default()
        }
    }

    pub fn player(color: PlayerColor) -> Self {
        EventTarget {
            player: Some(color),
            ..Default::default()
        }
    }

    pub fn with_card(self, card: CardInGame) -> Self {
        EventTarget {
            card_type: Some(card.card_type),
            card: Some(card),
            ..self
        }
    }

    pub fn with_undergoer(self, id: ObjectId) -> Self {
        EventTarget {
            undergoer: Some(id),
            ..self
        }
    }

    pub fn with_cause(self, cause: Option<Cause>) -> Self {
        EventTarget { cause, ..self }
    }

    pub fn with_card_type(self, card_type: CardType) -> Self {
        EventTarget {
            card_type: Some(card_type),
            ..self
        }
    }

    fn salient(&self) -> Option<Salient> {
        self.object
            .map(Salient::Object)
            .or_else(|| self.card.clone().map(Salient::Card))
    }
}

/// Behavior an event has unless a matching trigger overrides it
pub type DefaultBehavior<'a> = &'a dyn Fn(&mut MatchState, &Context) -> Result<(), EngineError>;

/// Fire an event: run its default behavior unless overridden, then every
/// matching trigger in board order.
pub fn trigger_event(
    state: &mut MatchState,
    event: EventType,
    target: EventTarget,
    parent: &Context,
    default: Option<DefaultBehavior<'_>>,
) -> Result<(), EngineError> {
    let mut matched: Vec<(ObjectId, PlayerColor, TriggeredAbility)> = Vec::new();

    for owner in state.board.ids() {
        let Some(obj) = state.board.get(owner) else {
            continue;
        };
        let color = obj.owner;
        let candidates: Vec<TriggeredAbility> = obj
            .triggers
            .iter()
            .filter(|t| !t.disabled && t.trigger.event == event)
            .cloned()
            .collect();

        for trigger in candidates {
            if listens(state, owner, &trigger, &target)? {
                matched.push((owner, color, trigger));
            }
        }
    }

    trace!(?event, matched = matched.len(), "event");

    if !matched.iter().any(|(_, _, t)| t.override_default) {
        if let Some(default) = default {
            default(state, parent)?;
        }
    }

    for (owner, color, trigger) in matched {
        debug!(?event, object = %owner, ability = %trigger.id, "trigger fires");
        let mut ctx = Context {
            current_object: Some(owner),
            controller: Some(color),
            source: Some(trigger.id),
            it: target.salient(),
            salient_player: target.player,
            that: target.undergoer.map(Salient::Object),
            iteratee: None,
            in_trigger: true,
            interactive: parent.interactive,
            duration: None,
        };
        execute_actions(state, &trigger.actions, &mut ctx)?;
    }

    Ok(())
}

fn listens(
    state: &mut MatchState,
    owner: ObjectId,
    trigger: &TriggeredAbility,
    target: &EventTarget,
) -> Result<bool, EngineError> {
    let spec = &trigger.trigger;

    let cause_matches = spec.cause == Cause::AnyEvent || Some(spec.cause) == target.cause;
    let type_matches = match &spec.card_type {
        Some(query) => target.card_type.is_some_and(|t| query.matches(t)),
        None => true,
    };
    if !cause_matches || !type_matches {
        return Ok(false);
    }

    let mut ctx = Context::for_object(state, owner);
    let listeners = resolve(state, &spec.targets, &mut ctx)?;
    Ok(match (target.object, target.player) {
        (Some(id), _) => listeners.contains_object(id),
        (None, Some(color)) => listeners.contains_player(color),
        (None, None) => false,
    })
}

/// Bring every passive ability up to date with the board
pub fn apply_abilities(state: &mut MatchState) -> Result<(), EngineError> {
    for owner in state.board.ids() {
        let ability_ids: Vec<AbilityId> = match state.board.get(owner) {
            Some(obj) => obj.abilities.iter().map(|a| a.id).collect(),
            None => continue,
        };

        for aid in ability_ids {
            // Earlier abilities may have changed this one, so fetch it fresh
            let Some(ability) = state
                .board
                .get(owner)
                .and_then(|obj| obj.abilities.iter().find(|a| a.id == aid))
                .cloned()
            else {
                continue;
            };

            if ability.current_targets.is_some() {
                unapply_passive(state, &ability);
            }

            let current = if ability.disabled {
                None
            } else {
                let mut ctx = Context::for_object(state, owner);
                ctx.source = Some(aid);
                let targets = resolve(state, &ability.targets, &mut ctx)?;
                apply_passive(state, &ability, &targets, &mut ctx)?;
                Some(targets)
            };

            if let Some(stored) = state
                .board
                .get_mut(owner)
                .and_then(|obj| obj.abilities.iter_mut().find(|a| a.id == aid))
            {
                stored.current_targets = current;
            }
        }
    }

    // Abilities whose grant was withdrawn go away for good
    let mut withdrawn: Vec<PassiveAbility> = Vec::new();
    for obj in state.board.objects_mut() {
        withdrawn.extend(obj.abilities.iter().filter(|a| a.disabled).cloned());
        obj.abilities.retain(|a| !a.disabled);
        obj.triggers.retain(|t| !t.disabled);
    }
    for ability in &withdrawn {
        if ability.current_targets.is_some() {
            unapply_passive(state, ability);
        }
    }

    Ok(())
}

fn status_effect(
    state: &mut MatchState,
    def: &StatusEffectDef,
    ctx: &mut Context,
) -> Result<StatusEffectKind, EngineError> {
    Ok(match def {
        StatusEffectDef::CannotAttack => StatusEffectKind::CannotAttack,
        StatusEffectDef::CannotMove => StatusEffectKind::CannotMove,
        StatusEffectDef::CannotActivate => StatusEffectKind::CannotActivate,
        StatusEffectDef::CannotFightBack => StatusEffectKind::CannotFightBack,
        StatusEffectDef::CanMoveOverObjects => StatusEffectKind::CanMoveOverObjects,
        StatusEffectDef::CanOnlyAttack(target) => {
            StatusEffectKind::CanOnlyAttack(resolve(state, target, ctx)?.objects(state)?)
        }
    })
}

fn apply_passive(
    state: &mut MatchState,
    ability: &PassiveAbility,
    targets: &Collection,
    ctx: &mut Context,
) -> Result<(), EngineError> {
    let aid = ability.id;
    trace!(ability = %aid, targets = targets.len(), "apply passive");

    match &ability.effect {
        PassiveEffect::AttributeAdjustment { attribute, modifier } => {
            let adjustment = resolve_modifier(state, modifier, ctx)?;
            match targets {
                Collection::Objects(ids) => {
                    for id in ids {
                        let Some(obj) = state.board.get_mut(*id) else {
                            continue;
                        };
                        if !obj.temporary_adjustments.iter().any(|adj| adj.aid == aid) {
                            obj.temporary_adjustments
                                .extend(attribute.attributes().into_iter().map(|attr| StatAdjustment {
                                    aid,
                                    attribute: Some(attr),
                                    adjustment,
                                }));
                        }
                    }
                }
                Collection::Cards(cards) => {
                    if *attribute != AttributeTarget::Cost {
                        return Ok(());
                    }
                    for card in cards {
                        let Some(holder) = state.holder_of(&card.id) else {
                            continue;
                        };
                        let Some(card) = state.players[holder].hand.get_mut(&card.id) else {
                            continue;
                        };
                        if !card.cost_adjustments.iter().any(|adj| adj.aid == aid) {
                            card.cost_adjustments.push(StatAdjustment {
                                aid,
                                attribute: None,
                                adjustment,
                            });
                        }
                    }
                }
                other => return Err(mismatch("objects or cards", other)),
            }
        }

        PassiveEffect::ApplyEffect(def) => {
            let kind = status_effect(state, def, ctx)?;
            for id in targets.objects(state)? {
                let Some(obj) = state.board.get_mut(id) else {
                    continue;
                };
                if !obj.effects.iter().any(|e| e.aid == aid) {
                    obj.effects.push(StatusEffect { aid, kind: kind.clone() });
                }
            }
        }

        PassiveEffect::GiveAbility(command) => {
            // One-shot actions make no sense as a continuous grant
            if matches!(command.as_ref(), CardCommand::Actions(_)) {
                return Ok(());
            }
            for id in targets.objects(state)? {
                install_command(state, id, command, Some(aid), None, ctx)?;
            }
        }

        PassiveEffect::Activated { text, actions } => {
            for id in targets.objects(state)? {
                if let Some(obj) = state.board.get_mut(id) {
                    if !obj.activated_abilities.iter().any(|a| a.aid == aid) {
                        obj.activated_abilities.push(ActivatedAbility {
                            aid,
                            text: text.clone(),
                            actions: actions.clone(),
                        });
                    }
                }
            }
        }
    }

    Ok(())
}

/// Withdraw everything a passive ability wrote, wherever it landed
pub fn unapply_passive(state: &mut MatchState, ability: &PassiveAbility) {
    let aid = ability.id;
    trace!(ability = %aid, "unapply passive");

    match &ability.effect {
        PassiveEffect::AttributeAdjustment { .. } => {
            for obj in state.board.objects_mut() {
                obj.remove_adjustments_from(aid);
            }
            for color in PlayerColor::ALL {
                for card in state.players[color].hand.cards_mut() {
                    card.cost_adjustments.retain(|adj| adj.aid != aid);
                }
            }
        }
        PassiveEffect::ApplyEffect(_) => {
            for obj in state.board.objects_mut() {
                obj.effects.retain(|e| e.aid != aid);
            }
        }
        PassiveEffect::GiveAbility(_) => {
            for obj in state.board.objects_mut() {
                for given in obj.abilities.iter_mut().filter(|a| a.source == Some(aid)) {
                    given.disabled = true;
                }
                for given in obj.triggers.iter_mut().filter(|t| t.source == Some(aid)) {
                    given.disabled = true;
                }
            }
        }
        PassiveEffect::Activated { .. } => {
            for obj in state.board.objects_mut() {
                obj.activated_abilities.retain(|a| a.aid != aid);
            }
        }
    }
}

/// Install a compiled sentence on an object. Abilities granted by a passive
/// (`source` set) are installed once per object and re-enabled afterwards.
pub fn install_command(
    state: &mut MatchState,
    object_id: ObjectId,
    command: &CardCommand,
    source: Option<AbilityId>,
    duration: Option<u32>,
    ctx: &mut Context,
) -> Result<(), EngineError> {
    if !state.board.contains(object_id) {
        return Ok(());
    }

    match command {
        CardCommand::Actions(actions) => {
            let mut object_ctx = ctx.on_behalf_of(state, object_id);
            object_ctx.source = source;
            execute_actions(state, actions, &mut object_ctx)?;
        }

        CardCommand::SetAbility(def) => {
            if reenable(state, object_id, source) {
                return Ok(());
            }
            let id = state.fresh_ability_id();
            if let Some(obj) = state.board.get_mut(object_id) {
                obj.abilities.push(PassiveAbility {
                    id,
                    source,
                    targets: def.targets.clone(),
                    effect: def.effect.clone(),
                    duration: duration.or(def.duration),
                    disabled: false,
                    current_targets: None,
                });
            }
        }

        CardCommand::SetTrigger(def) => {
            if reenable(state, object_id, source) {
                return Ok(());
            }
            let id = state.fresh_ability_id();
            if let Some(obj) = state.board.get_mut(object_id) {
                obj.triggers.push(TriggeredAbility {
                    id,
                    source,
                    trigger: def.trigger.clone(),
                    actions: def.actions.clone(),
                    override_default: def.override_default,
                    duration: duration.or(def.duration),
                    disabled: false,
                });
            }
        }
    }

    Ok(())
}

fn reenable(state: &mut MatchState, object_id: ObjectId, source: Option<AbilityId>) -> bool {
    let (Some(source), Some(obj)) = (source, state.board.get_mut(object_id)) else {
        return false;
    };
    let mut found = false;
    for given in obj.abilities.iter_mut().filter(|a| a.source == Some(source)) {
        given.disabled = false;
        found = true;
    }
    for given in obj.triggers.iter_mut().filter(|t| t.source == Some(source)) {
        given.disabled = false;
        found = true;
    }
    found
}

/// Install every sentence printed on an object's card
pub fn install_card_abilities(state: &mut MatchState, id: ObjectId, ctx: &mut Context) -> Result<(), EngineError> {
    let Some(commands) = state.board.get(id).map(|obj| obj.card.abilities.clone()) else {
        return Ok(());
    };
    for command in &commands {
        install_command(state, id, command, None, None, ctx)?;
    }
    Ok(())
}

/// Count down every timed ability by one turn and drop the expired ones
pub fn tick_durations(state: &mut MatchState) {
    let mut expired: Vec<PassiveAbility> = Vec::new();

    for obj in state.board.objects_mut() {
        let mut kept = Vec::with_capacity(obj.abilities.len());
        for mut ability in obj.abilities.drain(..) {
            if ability.tick() {
                expired.push(ability);
            } else {
                kept.push(ability);
            }
        }
        obj.abilities = kept;
        obj.triggers.retain_mut(|t| !t.tick());
    }

    for ability in &expired {
        debug!(ability = %ability.id, "expired");
        if ability.current_targets.is_some() {
            unapply_passive(state, ability);
        }
    }
}

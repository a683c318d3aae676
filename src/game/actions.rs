//! The action executor and the board mutations every other module shares.

use tracing::debug;

use crate::card::types::{Adjustment, AttributeTarget, CardInGame};
use crate::card::vocabulary::{Action, Cause, EventType};
use crate::game::conditions::{evaluate_global, evaluate_number, resolve_modifier};
use crate::game::error::EngineError;
use crate::game::formats::{burn_top_card, take_top_card};
use crate::game::hex::Hex;
use crate::game::state::{MatchState, PlayerColor};
use crate::game::targets::{mismatch, resolve, Collection, Context, Salient};
use crate::game::triggers::{apply_abilities, install_card_abilities, install_command, trigger_event, unapply_passive, EventTarget};
use crate::game::turns::end_turn_and_start_next;
use crate::game::zones::{Object, ObjectId};

/// Run actions in order, reapplying passive abilities after each one
pub fn execute_actions(state: &mut MatchState, actions: &[Action], ctx: &mut Context) -> Result<(), EngineError> {
    for action in actions {
        execute_action(state, action, ctx)?;
        apply_abilities(state)?;
    }
    Ok(())
}

/// Visit each object still on the board, exposing it to `They`
fn for_each_object<F>(state: &mut MatchState, ids: Vec<ObjectId>, ctx: &mut Context, mut f: F) -> Result<(), EngineError>
where
    F: FnMut(&mut MatchState, ObjectId, &mut Context) -> Result<(), EngineError>,
{
    let outer = ctx.iteratee.take();
    for id in ids {
        if !state.board.contains(id) {
            continue;
        }
        ctx.iteratee = Some(Salient::Object(id));
        f(state, id, ctx)?;
    }
    ctx.iteratee = outer;
    Ok(())
}

fn first_player(collection: Collection) -> Result<Option<PlayerColor>, EngineError> {
    Ok(collection.players()?.first().copied())
}

pub fn execute_action(state: &mut MatchState, action: &Action, ctx: &mut Context) -> Result<(), EngineError> {
    match action {
        Action::CanMoveAgain(target) => {
            let ids = resolve(state, target, ctx)?.objects(state)?;
            for id in ids {
                if let Some(obj) = state.board.get_mut(id) {
                    obj.moves_made = 0;
                    obj.cant_move = false;
                }
            }
        }

        Action::CanMoveAndAttackAgain(target) => {
            let ids = resolve(state, target, ctx)?.objects(state)?;
            for id in ids {
                if let Some(obj) = state.board.get_mut(id) {
                    obj.moves_made = 0;
                    obj.cant_move = false;
                    obj.cant_attack = false;
                }
            }
        }

        Action::DealDamage { target, amount } => {
            let victims = resolve(state, target, ctx)?;
            let amount = evaluate_number(state, amount, ctx)?;
            let ids = match victims {
                // Damage to a player lands on their core
                Collection::Players(players) => players
                    .iter()
                    .filter_map(|color| state.board.core_of(*color).map(|core| core.id))
                    .collect(),
                other => other.objects(state)?,
            };
            for_each_object(state, ids, ctx, |state, id, ctx| deal_damage(state, id, amount, None, ctx))?;
        }

        Action::Destroy(target) => {
            let ids = resolve(state, target, ctx)?.objects(state)?;
            for_each_object(state, ids, ctx, |state, id, ctx| {
                if let Some(obj) = state.board.get_mut(id) {
                    obj.is_destroyed = true;
                }
                update_or_destroy(state, id, None, ctx)
            })?;
        }

        Action::Discard(target) => {
            let cards = resolve(state, target, ctx)?.cards()?;
            for card in cards {
                let Some(holder) = state.holder_of(&card.id) else {
                    continue;
                };
                if let Some(card) = state.players[holder].hand.remove_card(&card.id) {
                    state.discard(holder, reset_card(card));
                }
            }
        }

        Action::Draw { player, count } => {
            let players = resolve(state, player, ctx)?.players()?;
            let count = evaluate_number(state, count, ctx)?.max(0) as usize;
            for color in players {
                draw_cards(state, color, count)?;
            }
        }

        Action::EndTurn => end_turn_and_start_next(state)?,

        Action::GiveAbility {
            target,
            ability,
            duration,
        } => {
            let ids = resolve(state, target, ctx)?.objects(state)?;
            let duration = (*duration).or(ctx.duration);
            for_each_object(state, ids, ctx, |state, id, ctx| {
                install_command(state, id, ability, None, duration, ctx)
            })?;
        }

        Action::ModifyAttribute {
            target,
            attribute,
            modifier,
        } => {
            let targets = resolve(state, target, ctx)?;
            let adjustment = resolve_modifier(state, modifier, ctx)?;
            modify_attribute(state, targets, *attribute, adjustment, ctx)?;
        }

        Action::ModifyEnergy { player, modifier } => {
            let players = resolve(state, player, ctx)?.players()?;
            let adjustment = resolve_modifier(state, modifier, ctx)?;
            for color in players {
                let energy = &mut state.players[color].energy;
                energy.available = adjustment.apply(energy.available);
            }
        }

        Action::RestoreHealth { target, amount } => {
            let ids = resolve(state, target, ctx)?.objects(state)?;
            let amount = match amount {
                Some(n) => Some(evaluate_number(state, n, ctx)?),
                None => None,
            };
            for id in ids {
                if let Some(obj) = state.board.get_mut(id) {
                    let base = obj.card.base_health();
                    if obj.stats.health < base {
                        obj.stats.health = match amount {
                            Some(n) => (obj.stats.health + n.max(0)).min(base),
                            None => base,
                        };
                    }
                }
            }
        }

        Action::SetAttribute {
            target,
            attribute,
            value,
        } => {
            let targets = resolve(state, target, ctx)?;
            let value = evaluate_number(state, value, ctx)?;
            modify_attribute(state, targets, *attribute, Adjustment::Set(value), ctx)?;
        }

        Action::SwapAttributes { target, first, second } => {
            let ids = resolve(state, target, ctx)?.objects(state)?;
            for_each_object(state, ids, ctx, |state, id, ctx| {
                if let Some(obj) = state.board.get_mut(id) {
                    if let (Some(a), Some(b)) = (obj.stats.get(*first), obj.stats.get(*second)) {
                        obj.stats.set(*first, b);
                        obj.stats.set(*second, a);
                    }
                }
                update_or_destroy(state, id, None, ctx)
            })?;
        }

        Action::TakeControl { player, target } => {
            let Some(new_owner) = first_player(resolve(state, player, ctx)?)? else {
                return Ok(());
            };
            let ids = resolve(state, target, ctx)?.objects(state)?;
            for id in ids {
                let Some(obj) = state.board.get_mut(id) else {
                    continue;
                };
                if obj.owner != new_owner {
                    obj.owner = new_owner;
                    obj.cant_move = true;
                    obj.cant_attack = true;
                    obj.cant_activate = true;
                    let card = obj.card.clone();
                    state.log(Some(new_owner), &format!("took control of |{}|", card.name), vec![card]);
                }
            }
            state.check_victory();
        }

        Action::ReturnToHand(target) => {
            let ids = resolve(state, target, ctx)?.objects(state)?;
            for id in ids {
                return_to_hand(state, id)?;
            }
        }

        Action::MoveObject { target, destination } => {
            let ids = resolve(state, target, ctx)?.objects(state)?;
            let destinations = match resolve(state, destination, ctx)? {
                Collection::Hexes(hexes) => hexes,
                other => return Err(mismatch("hexes", &other)),
            };
            if let (Some(id), Some(hex)) = (ids.first(), destinations.first()) {
                if hex.is_on_board() && !state.board.is_occupied(hex) {
                    if let Some(obj) = state.board.get_mut(*id) {
                        obj.hex = *hex;
                    }
                }
            }
        }

        Action::SpawnObject { card, hex, owner } => {
            let cards = resolve(state, card, ctx)?.cards()?;
            let hexes = match resolve(state, hex, ctx)? {
                Collection::Hexes(hexes) => hexes,
                other => return Err(mismatch("hexes", &other)),
            };
            let owner = first_player(resolve(state, owner, ctx)?)?.unwrap_or_else(|| ctx.controller(state));
            if let (Some(card), Some(hex)) = (cards.into_iter().next(), hexes.first()) {
                place_card(state, card, *hex, owner, false, ctx)?;
            }
        }

        Action::If { condition, then } => {
            if evaluate_global(state, condition, ctx)? {
                execute_actions(state, then, ctx)?;
            }
        }
    }

    Ok(())
}

/// Fold an adjustment into base stats (objects) or printed values (cards in hand)
fn modify_attribute(
    state: &mut MatchState,
    targets: Collection,
    attribute: AttributeTarget,
    adjustment: Adjustment,
    ctx: &mut Context,
) -> Result<(), EngineError> {
    match targets {
        Collection::Objects(ids) => for_each_object(state, ids, ctx, |state, id, ctx| {
            if let Some(obj) = state.board.get_mut(id) {
                for attr in attribute.attributes() {
                    if let Some(value) = obj.stats.get(attr) {
                        obj.stats.set(attr, adjustment.apply(value));
                    }
                }
            }
            update_or_destroy(state, id, None, ctx)
        }),
        Collection::Cards(cards) => {
            for card in cards {
                let Some(holder) = state.holder_of(&card.id) else {
                    continue;
                };
                let Some(card) = state.players[holder].hand.get_mut(&card.id) else {
                    continue;
                };
                if attribute == AttributeTarget::Cost {
                    card.cost = adjustment.apply(card.cost);
                } else if let Some(stats) = card.stats.as_mut() {
                    for attr in attribute.attributes() {
                        if let Some(value) = stats.get(attr) {
                            stats.set(attr, adjustment.apply(value));
                        }
                    }
                }
            }
            Ok(())
        }
        other => Err(mismatch("objects or cards", &other)),
    }
}

/// A card leaving the board or hand drops every temporary cost adjustment
pub(crate) fn reset_card(card: CardInGame) -> CardInGame {
    CardInGame {
        cost_adjustments: Vec::new(),
        ..card
    }
}

pub fn deal_damage(
    state: &mut MatchState,
    id: ObjectId,
    amount: i32,
    cause: Option<Cause>,
    ctx: &Context,
) -> Result<(), EngineError> {
    let Some(obj) = state.board.get_mut(id) else {
        return Ok(());
    };

    if !obj.being_destroyed {
        obj.stats.health -= amount.max(0);
        let card = obj.card.clone();
        state.log(None, &format!("|{}| received {} damage", card.name, amount), vec![card]);
        trigger_event(state, EventType::AfterDamageReceived, EventTarget::object(id), ctx, None)?;
    }

    update_or_destroy(state, id, cause, ctx)
}

/// Keep the object if it is healthy and not marked for destruction; otherwise
/// run destruction exactly once. `AfterDestroyed` triggers see the object still
/// on the board and may remove it themselves (e.g. return it to hand).
pub fn update_or_destroy(
    state: &mut MatchState,
    id: ObjectId,
    cause: Option<Cause>,
    ctx: &Context,
) -> Result<(), EngineError> {
    let Some(obj) = state.board.get_mut(id) else {
        return Ok(());
    };

    if (obj.health() <= 0 || obj.is_destroyed) && !obj.being_destroyed {
        obj.being_destroyed = true;
        let card = obj.card.clone();
        debug!(object = %id, card = %card.name, ?cause, "destroying");

        state.play_sound("destroyed.wav");
        state.log(None, &format!("|{}| was destroyed", card.name), vec![card]);
        trigger_event(
            state,
            EventType::AfterDestroyed,
            EventTarget::object(id).with_cause(cause),
            ctx,
            None,
        )?;

        if let Some(obj) = remove_object(state, id)? {
            state.discard(obj.owner, reset_card(obj.card));
        }
    }

    apply_abilities(state)
}

/// Take an object off the board, unapplying every passive ability it carried
pub fn remove_object(state: &mut MatchState, id: ObjectId) -> Result<Option<Object>, EngineError> {
    let Some(obj) = state.board.remove(id) else {
        return Ok(None);
    };

    for ability in &obj.abilities {
        if ability.current_targets.is_some() {
            unapply_passive(state, ability);
        }
    }

    apply_abilities(state)?;
    state.check_victory();
    Ok(Some(obj))
}

/// Reapply passives, then destroy whatever they left dead or marked
pub fn settle(state: &mut MatchState) -> Result<(), EngineError> {
    apply_abilities(state)?;

    let ctx = Context::default();
    for id in state.board.ids() {
        let doomed = state
            .board
            .get(id)
            .is_some_and(|obj| (obj.health() <= 0 || obj.is_destroyed) && !obj.being_destroyed);
        if doomed {
            update_or_destroy(state, id, None, &ctx)?;
        }
    }

    state.check_victory();
    Ok(())
}

pub fn return_to_hand(state: &mut MatchState, id: ObjectId) -> Result<(), EngineError> {
    let Some(obj) = remove_object(state, id)? else {
        return Ok(());
    };

    let owner = obj.owner;
    let card = reset_card(obj.card);
    if state.players[owner].hand.size() >= state.options.max_hand_size {
        state.discard(owner, card);
        let message = format!(
            "had to discard a card due to having a full hand of {} cards",
            state.options.max_hand_size
        );
        state.log(Some(owner), &message, vec![]);
    } else {
        state.players[owner].hand.add_card(card);
    }
    Ok(())
}

/// Draw up to the hand limit (one more while an event card is resolving);
/// every card past the limit is discarded from the top of the deck instead.
pub fn draw_cards(state: &mut MatchState, color: PlayerColor, count: usize) -> Result<(), EngineError> {
    let max_hand_size = state.options.max_hand_size + usize::from(state.event_executing);
    let room = max_hand_size.saturating_sub(state.players[color].hand.size());
    let drawn = count.min(room);

    for _ in 0..drawn {
        take_top_card(state, color);
    }

    for _ in drawn..count {
        if burn_top_card(state, color).is_some() {
            let message = format!(
                "had to discard a card due to having a full hand of {} cards",
                state.options.max_hand_size
            );
            state.log(Some(color), &message, vec![]);
        }
    }

    apply_abilities(state)
}

/// Put a robot or structure card onto the board and install its abilities.
/// Returns None when the hex cannot take it.
pub fn place_card(
    state: &mut MatchState,
    card: CardInGame,
    hex: Hex,
    owner: PlayerColor,
    just_played: bool,
    ctx: &Context,
) -> Result<Option<ObjectId>, EngineError> {
    if !card.card_type.is_object() || !hex.is_on_board() || state.board.is_occupied(&hex) {
        return Ok(None);
    }

    let id = state.fresh_object_id();
    let mut object = Object::new(id, reset_card(card), owner, hex);
    object.just_played = just_played;
    state
        .board
        .place(object)
        .map_err(|obj| EngineError::Malformed(format!("hex {} is occupied", obj.hex)))?;

    let mut object_ctx = ctx.on_behalf_of(state, id);
    install_card_abilities(state, id, &mut object_ctx)?;
    state.play_sound("spawn.wav");

    trigger_event(state, EventType::AfterPlayed, EventTarget::object(id), ctx, None)?;
    apply_abilities(state)?;
    Ok(Some(id))
}

//! Player commands and the turn cycle.
//!
//! Every command runs against a scratch copy of the match. If resolution
//! needs a target the player has not picked yet, the scratch copy is thrown
//! away and the canonical state records the prompt instead. Once the player
//! answers, the command is replayed from the start with the accumulated
//! choices, so a half-resolved card never leaks into the canonical state.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info};

use crate::card::abilities::StatusEffectKind;
use crate::card::types::{CardId, CardInGame, CardType};
use crate::card::vocabulary::{CardCommand, Cause, EventType};
use crate::game::actions::{deal_damage, draw_cards, execute_actions, place_card, reset_card, settle};
use crate::game::error::{EngineError, Refusal, Rejection};
use crate::game::hex::{intermediate_move_hex, valid_attack_hexes, valid_movement_hexes, valid_placement_hexes, Hex};
use crate::game::state::{
    Animation, ChosenTarget, MatchState, PendingSelection, PlayerColor, Resumption, TargetSelection,
};
use crate::game::targets::Context;
use crate::game::triggers::{tick_durations, trigger_event, DefaultBehavior, EventTarget};
use crate::game::zones::ObjectId;

/// A player's request, as delivered by the transport layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    PlayCard {
        player: PlayerColor,
        card_id: CardId,
        #[serde(default)]
        hex: Option<Hex>,
    },
    MoveObject {
        player: PlayerColor,
        from: Hex,
        to: Hex,
    },
    AttackObject {
        player: PlayerColor,
        from: Hex,
        target: Hex,
    },
    ActivateAbility {
        player: PlayerColor,
        hex: Hex,
        ability_index: usize,
    },
    ChooseTarget {
        player: PlayerColor,
        target: ChosenTarget,
    },
    PassTurn {
        player: PlayerColor,
    },
}

impl Command {
    pub fn player(&self) -> PlayerColor {
        match self {
            Command::PlayCard { player, .. }
            | Command::MoveObject { player, .. }
            | Command::AttackObject { player, .. }
            | Command::ActivateAbility { player, .. }
            | Command::ChooseTarget { player, .. }
            | Command::PassTurn { player } => *player,
        }
    }
}

fn rejected(mut state: MatchState, player: PlayerColor, rejection: Rejection) -> Result<MatchState, EngineError> {
    debug!(%player, %rejection, "command rejected");
    state.reject(player, rejection);
    Ok(state)
}

/// Apply one command. Illegal commands come back as the unchanged state with
/// `invalid` set; only broken content or a broken caller yields an error.
pub fn apply_command(mut state: MatchState, command: &Command) -> Result<MatchState, EngineError> {
    state.invalid = None;
    let player = command.player();

    if state.is_game_over() {
        return rejected(state, player, Rejection::GameOver);
    }

    let resumption = match command {
        Command::ChooseTarget { target, .. } => {
            let Some(pending) = state.pending.clone() else {
                return rejected(state, player, Rejection::NothingToChoose);
            };
            if pending.player != player {
                return rejected(state, player, Rejection::NotYourTurn);
            }
            if !state.players[player].target.allows(target) {
                return rejected(state, player, Rejection::IllegalTarget);
            }
            let mut chosen = state.players[player].target.chosen.clone();
            chosen.push_back(target.clone());
            return run_resumable(state, player, pending.resumption, chosen);
        }
        _ if state.pending.is_some() => return rejected(state, player, Rejection::SelectionPending),
        _ if player != state.current_turn => return rejected(state, player, Rejection::NotYourTurn),
        Command::PassTurn { .. } => {
            end_turn_and_start_next(&mut state)?;
            settle(&mut state)?;
            return Ok(state);
        }
        Command::PlayCard { card_id, hex, .. } => Resumption::PlayCard {
            card_id: card_id.clone(),
            hex: *hex,
        },
        Command::MoveObject { from, to, .. } => Resumption::MoveObject { from: *from, to: *to },
        Command::AttackObject { from, target, .. } => Resumption::AttackObject {
            from: *from,
            target: *target,
        },
        Command::ActivateAbility { hex, ability_index, .. } => Resumption::ActivateAbility {
            hex: *hex,
            ability_index: *ability_index,
        },
    };

    run_resumable(state, player, resumption, VecDeque::new())
}

fn run_resumable(
    canonical: MatchState,
    player: PlayerColor,
    resumption: Resumption,
    chosen: VecDeque<ChosenTarget>,
) -> Result<MatchState, EngineError> {
    let mut scratch = canonical.clone();
    scratch.players[player].target = TargetSelection {
        chosen: chosen.clone(),
        ..Default::default()
    };

    match perform(&mut scratch, player, &resumption) {
        Ok(()) => {}
        Err(Refusal::Rejected(rejection)) => return abandoned(canonical, player, rejection),
        Err(Refusal::Fatal(err)) => return Err(err),
    }

    if let Some(rejection) = scratch.invalid.take() {
        return abandoned(canonical, player, rejection);
    }

    if scratch.players[player].target.choosing {
        debug!(%player, ?resumption, "waiting on a target");
        let prompt = scratch.players[player].target.clone();
        let mut canonical = canonical;
        canonical.players[player].target = TargetSelection { chosen, ..prompt };
        canonical.players[player].status_message = "Choose a target".to_string();
        canonical.pending = Some(PendingSelection { player, resumption });
        return Ok(canonical);
    }

    settle(&mut scratch)?;
    scratch.players[player].target = TargetSelection::default();
    scratch.players[player].status_message.clear();
    scratch.pending = None;
    Ok(scratch)
}

/// A rejected re-run drops the whole suspended command, so the player is not
/// left answering a prompt that can never succeed.
fn abandoned(mut canonical: MatchState, player: PlayerColor, rejection: Rejection) -> Result<MatchState, EngineError> {
    if canonical.pending.take().is_some() {
        debug!(%player, "suspended command abandoned");
        canonical.players[player].target = TargetSelection::default();
        canonical.players[player].status_message.clear();
    }
    rejected(canonical, player, rejection)
}

fn perform(state: &mut MatchState, player: PlayerColor, resumption: &Resumption) -> Result<(), Refusal> {
    match resumption {
        Resumption::PlayCard { card_id, hex } => play_card(state, player, card_id, *hex),
        Resumption::MoveObject { from, to } => move_object(state, player, *from, *to),
        Resumption::AttackObject { from, target } => attack_object(state, player, *from, *target),
        Resumption::ActivateAbility { hex, ability_index } => activate_ability(state, player, *hex, *ability_index),
    }
}

fn command_context(player: PlayerColor) -> Context {
    Context {
        controller: Some(player),
        ..Context::command()
    }
}

fn own_object_at(state: &MatchState, player: PlayerColor, hex: Hex) -> Result<ObjectId, Rejection> {
    match state.board.object_at(&hex) {
        Some(obj) if obj.owner == player => Ok(obj.id),
        _ => Err(Rejection::NoObject(hex)),
    }
}

fn play_card(state: &mut MatchState, player: PlayerColor, card_id: &CardId, hex: Option<Hex>) -> Result<(), Refusal> {
    let Some(card) = state.players[player].hand.get(card_id).cloned() else {
        return Err(Rejection::CardNotInHand.into());
    };

    let cost = card.effective_cost();
    let available = state.players[player].energy.available;
    if cost > available {
        return Err(Rejection::NotEnoughEnergy { needed: cost, available }.into());
    }

    match (card.card_type, hex) {
        (CardType::Event, _) => play_event(state, player, card, cost),
        (CardType::Robot | CardType::Structure, Some(hex)) => play_object(state, player, card, cost, hex),
        (CardType::Robot | CardType::Structure, None) => {
            Err(EngineError::Malformed(format!("playing |{}| needs a hex", card.name)).into())
        }
        (CardType::Core, _) => Err(EngineError::Malformed("cores cannot be played".to_string()).into()),
    }
}

fn play_event(state: &mut MatchState, player: PlayerColor, card: CardInGame, cost: i32) -> Result<(), Refusal> {
    state.event_executing = true;
    state.players[player].energy.available -= cost;
    state.play_sound("event.wav");
    state.log(Some(player), &format!("played |{}|", card.name), vec![card.clone()]);

    let mut ctx = command_context(player);
    for command in &card.abilities {
        match command {
            CardCommand::Actions(actions) => execute_actions(state, actions, &mut ctx)?,
            _ => {
                return Err(EngineError::Malformed(format!("|{}| is an event with a lasting ability", card.name)).into())
            }
        }
    }

    if let Some(played) = state.players[player].hand.remove_card(&card.id) {
        state.discard(player, reset_card(played));
    }
    state.event_executing = false;

    trigger_event(
        state,
        EventType::AfterCardPlay,
        EventTarget::player(player).with_card(card),
        &ctx,
        None,
    )?;
    Ok(())
}

fn play_object(state: &mut MatchState, player: PlayerColor, card: CardInGame, cost: i32, hex: Hex) -> Result<(), Refusal> {
    if !valid_placement_hexes(state, player, card.card_type).contains(&hex) {
        return Err(Rejection::IllegalPlacement(hex).into());
    }

    state.players[player].energy.available -= cost;
    let Some(card) = state.players[player].hand.remove_card(&card.id) else {
        return Err(Rejection::CardNotInHand.into());
    };

    let ctx = command_context(player);
    let Some(id) = place_card(state, card.clone(), hex, player, true, &ctx)? else {
        return Err(Rejection::IllegalPlacement(hex).into());
    };
    state.log(Some(player), &format!("played |{}|", card.name), vec![card.clone()]);

    trigger_event(
        state,
        EventType::AfterCardPlay,
        EventTarget::player(player).with_card(card),
        &ctx,
        None,
    )?;

    if let Some(obj) = state.board.get_mut(id) {
        obj.just_played = false;
    }
    Ok(())
}

fn move_object(state: &mut MatchState, player: PlayerColor, from: Hex, to: Hex) -> Result<(), Refusal> {
    let id = own_object_at(state, player, from)?;
    if !valid_movement_hexes(state, from).contains(&to) {
        return Err(Rejection::IllegalMove(to).into());
    }

    if let Some(obj) = state.board.get_mut(id) {
        obj.moves_made += from.distance(&to) as i32;
        obj.hex = to;
        obj.moved_this_turn = true;
    }
    state.animation_queue.push(Animation::Move { from, to });
    state.play_sound("move.wav");

    trigger_event(state, EventType::AfterMove, EventTarget::object(id), &command_context(player), None)?;
    Ok(())
}

fn attack_object(state: &mut MatchState, player: PlayerColor, from: Hex, target: Hex) -> Result<(), Refusal> {
    let attacker = own_object_at(state, player, from)?;
    if !valid_attack_hexes(state, from).contains(&target) {
        return Err(Rejection::IllegalAttack(target).into());
    }
    let Some(defender) = state.board.id_at(&target) else {
        return Err(Rejection::IllegalAttack(target).into());
    };

    let mut origin = from;
    if let Some(step) = intermediate_move_hex(state, from, target) {
        move_object(state, player, from, step)?;
        origin = step;
    }

    let Some(obj) = state.board.get_mut(attacker) else {
        return Ok(());
    };
    obj.cant_move = true;
    obj.cant_attack = true;
    obj.attacked_this_turn = true;
    let attacker_card = obj.card.clone();

    let Some((defender_card, defender_type)) = state
        .board
        .get(defender)
        .map(|obj| (obj.card.clone(), obj.card_type()))
    else {
        return Ok(());
    };

    state.animation_queue.push(Animation::Attack { from: origin, to: target });
    state.play_sound("attack.wav");
    state.log(
        None,
        &format!("|{}| attacked |{}|", attacker_card.name, defender_card.name),
        vec![attacker_card, defender_card],
    );

    let combat: DefaultBehavior = &|state, ctx| resolve_combat(state, attacker, defender, ctx);
    trigger_event(
        state,
        EventType::AfterAttack,
        EventTarget::object(attacker)
            .with_undergoer(defender)
            .with_card_type(defender_type),
        &command_context(player),
        Some(combat),
    )?;
    Ok(())
}

/// Both sides strike at once: the defender fights back with the attack it had
/// going in, even if the blow destroys it.
fn resolve_combat(state: &mut MatchState, attacker: ObjectId, defender: ObjectId, ctx: &Context) -> Result<(), EngineError> {
    let Some(attack) = state.board.get(attacker).map(|obj| obj.attack()) else {
        return Ok(());
    };
    let retaliation = state
        .board
        .get(defender)
        .filter(|obj| !obj.has_effect(&StatusEffectKind::CannotFightBack))
        .map(|obj| obj.attack())
        .unwrap_or(0);

    deal_damage(state, defender, attack, Some(Cause::Combat), ctx)?;
    if retaliation > 0 && state.board.contains(attacker) {
        deal_damage(state, attacker, retaliation, Some(Cause::Combat), ctx)?;
    }
    Ok(())
}

fn activate_ability(state: &mut MatchState, player: PlayerColor, hex: Hex, index: usize) -> Result<(), Refusal> {
    let id = own_object_at(state, player, hex)?;
    let Some(obj) = state.board.get(id) else {
        return Err(Rejection::NoObject(hex).into());
    };
    if !obj.can_activate() {
        return Err(Rejection::CannotActivate.into());
    }
    let Some(ability) = obj.activated_abilities.get(index).cloned() else {
        return Err(Rejection::CannotActivate.into());
    };
    let card = obj.card.clone();

    state.log(Some(player), &format!("activated |{}|'s ability", card.name), vec![card]);
    let mut ctx = Context {
        current_object: Some(id),
        source: Some(ability.aid),
        ..command_context(player)
    };
    execute_actions(state, &ability.actions, &mut ctx)?;

    if let Some(obj) = state.board.get_mut(id) {
        obj.cant_activate = true;
        obj.cant_move = true;
        obj.cant_attack = true;
    }
    Ok(())
}

/// Finish the current player's turn and, unless the match ended, begin the next
pub fn end_turn_and_start_next(state: &mut MatchState) -> Result<(), EngineError> {
    end_turn(state)?;
    if !state.is_game_over() {
        start_turn(state)?;
    }
    Ok(())
}

fn end_turn(state: &mut MatchState) -> Result<(), EngineError> {
    let color = state.current_turn;
    state.players[color].target = TargetSelection::default();
    state.players[color].status_message.clear();

    for obj in state.board.objects_mut().filter(|obj| obj.owner == color) {
        obj.end_turn();
    }
    tick_durations(state);

    trigger_event(state, EventType::EndOfTurn, EventTarget::player(color), &Context::default(), None)?;
    state.check_victory();
    state.current_turn = color.opponent();
    Ok(())
}

fn start_turn(state: &mut MatchState) -> Result<(), EngineError> {
    let color = state.current_turn;
    state.turn_number += 1;

    let max_energy = state.options.max_energy;
    let energy = &mut state.players[color].energy;
    energy.total = (energy.total + 1).min(max_energy);
    energy.available = energy.total;

    for obj in state.board.objects_mut().filter(|obj| obj.owner == color) {
        obj.reset_for_turn();
    }

    draw_cards(state, color, 1)?;
    trigger_event(state, EventType::BeginningOfTurn, EventTarget::player(color), &Context::default(), None)?;

    if color == state.perspective {
        state.play_sound("yourmove.wav");
    }
    info!(player = %color, turn = state.turn_number, energy = state.players[color].energy.total, "turn started");
    Ok(())
}

//! Greedy self-play.
//!
//! Both seats follow the same simple policy: answer any pending prompt, play
//! whatever is affordable, attack whatever is in reach, walk robots towards
//! the enemy core, then pass. Useful for soak-testing the engine and for
//! producing match scripts to replay.

use tracing::{debug, info};

use crate::card::types::CardType;
use crate::game::error::EngineError;
use crate::game::formats::{new_game, MatchSetup};
use crate::game::hex::{core_hex, valid_attack_hexes, valid_movement_hexes, valid_placement_hexes};
use crate::game::state::{ChosenTarget, MatchState};
use crate::game::turns::{apply_command, Command};

/// Safety valve against a policy loop within one turn
const MAX_COMMANDS_PER_TURN: usize = 40;

/// Result of a single self-played match
#[derive(Debug, Clone)]
pub struct SelfPlayResult {
    pub state: MatchState,
    /// Every accepted command, in order; replaying them reproduces `state`
    pub commands: Vec<Command>,
}

impl SelfPlayResult {
    pub fn finished(&self) -> bool {
        self.state.is_game_over()
    }
}

/// Commands worth trying right now, best first
fn candidates(state: &MatchState) -> Vec<Command> {
    if let Some(pending) = &state.pending {
        let player = pending.player;
        let target = &state.players[player].target;
        let choice = target
            .possible_hexes
            .first()
            .map(|hex| ChosenTarget::Hex(*hex))
            .or_else(|| target.possible_cards.first().cloned().map(ChosenTarget::Card));
        return choice
            .map(|target| vec![Command::ChooseTarget { player, target }])
            .unwrap_or_default();
    }

    let player = state.current_turn;
    let me = &state.players[player];
    let mut commands = Vec::new();

    for card in me.hand.cards() {
        if card.effective_cost() > me.energy.available {
            continue;
        }
        let hex = match card.card_type {
            CardType::Event => None,
            card_type => match valid_placement_hexes(state, player, card_type).first() {
                Some(hex) => Some(*hex),
                None => continue,
            },
        };
        commands.push(Command::PlayCard {
            player,
            card_id: card.id.clone(),
            hex,
        });
    }

    let enemy_core = core_hex(player.opponent());
    for obj in state.board.objects_of(player) {
        if obj.card_type() == CardType::Core {
            continue;
        }
        if let Some(target) = valid_attack_hexes(state, obj.hex).first() {
            commands.push(Command::AttackObject {
                player,
                from: obj.hex,
                target: *target,
            });
        }
        let closer = valid_movement_hexes(state, obj.hex)
            .into_iter()
            .filter(|hex| hex.distance(&enemy_core) < obj.hex.distance(&enemy_core))
            .min_by_key(|hex| hex.distance(&enemy_core));
        if let Some(to) = closer {
            commands.push(Command::MoveObject {
                player,
                from: obj.hex,
                to,
            });
        }
    }

    commands
}

/// Try candidates until one is accepted; returns the new state and the command
fn step(state: &MatchState) -> Result<Option<(MatchState, Command)>, EngineError> {
    for command in candidates(state) {
        let next = apply_command(state.clone(), &command)?;
        if next.invalid.is_none() {
            return Ok(Some((next, command)));
        }
        debug!(?command, "policy move refused");
    }
    Ok(None)
}

/// Play a match out until someone wins or `max_turns` turns have started
pub fn play_match(setup: MatchSetup, max_turns: u32) -> Result<SelfPlayResult, EngineError> {
    let mut state = new_game(setup)?;
    let mut commands = Vec::new();

    while !state.is_game_over() && state.turn_number <= max_turns {
        for _ in 0..MAX_COMMANDS_PER_TURN {
            match step(&state)? {
                Some((next, command)) => {
                    state = next;
                    commands.push(command);
                }
                None => break,
            }
            if state.is_game_over() {
                break;
            }
        }

        if state.is_game_over() {
            break;
        }
        let pass = Command::PassTurn {
            player: state.current_turn,
        };
        state = apply_command(state, &pass)?;
        commands.push(pass);
    }

    info!(
        turns = state.turn_number,
        commands = commands.len(),
        winner = ?state.winner,
        "self-play finished"
    );
    Ok(SelfPlayResult { state, commands })
}

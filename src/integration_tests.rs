//! End-to-end scenarios driven through a JSON card library and `apply_command`.

use crate::card::types::{CardId, CardInGame, CardType, Stats};
use crate::card::CardDatabase;
use crate::game::actions::{deal_damage, place_card};
use crate::game::formats::{new_game, GameFormat, MatchOptions, MatchSetup};
use crate::game::hex::{core_hex, placement_hexes, valid_movement_hexes, valid_placement_hexes, Hex};
use crate::game::state::{Animation, ChosenTarget, Energy, MatchState, PerPlayer, PlayerColor};
use crate::game::targets::Context;
use crate::game::turns::{apply_command, Command};
use crate::game::{ObjectId, Rejection};
use crate::simulation::{fingerprint, replay};

const LIBRARY: &str = r#"[
    {"name": "Attack Bot", "type": "robot", "cost": 1,
     "stats": {"attack": 1, "health": 1, "speed": 1}},
    {"name": "Tank Bot", "type": "robot", "cost": 3,
     "stats": {"attack": 2, "health": 4, "speed": 1}},
    {"name": "Shy Bot", "type": "robot", "cost": 2, "text": "This robot can't fight back.",
     "stats": {"attack": 2, "health": 3, "speed": 1},
     "abilities": [{"setAbility": {"targets": "thisObject", "effect": {"applyEffect": "cannotFightBack"}}}]},
    {"name": "Shock", "type": "event", "cost": 1, "text": "Deal 1 damage to a robot.",
     "abilities": [{"actions": [{"dealDamage": {
        "target": {"choose": {"objectsInPlay": {"only": "robot"}}},
        "amount": {"const": 1}}}]}]},
    {"name": "Overload", "type": "event", "cost": 1, "text": "Deal 3 damage to your opponent.",
     "abilities": [{"actions": [{"dealDamage": {"target": "opponent", "amount": {"const": 3}}}]}]},
    {"name": "Discount Factory", "type": "structure", "cost": 2,
     "text": "Cards in your hand cost 1 less.",
     "stats": {"health": 2},
     "abilities": [{"setAbility": {
        "targets": {"cardsInHand": {"player": "selfPlayer", "cardType": "any"}},
        "effect": {"attributeAdjustment": {"attribute": "cost", "modifier": {"subtract": {"const": 1}}}}}}]},
    {"name": "Drill Sergeant", "type": "structure", "cost": 2,
     "text": "Robots you control have +1 attack.",
     "stats": {"health": 3},
     "abilities": [{"setAbility": {
        "targets": {"objectsMatching": {"objectType": {"only": "robot"},
                                        "conditions": [{"controlledBy": "selfPlayer"}]}},
        "effect": {"attributeAdjustment": {"attribute": "attack", "modifier": {"add": {"const": 1}}}}}}]},
    {"name": "Runner Bot", "type": "robot", "cost": 2,
     "stats": {"attack": 1, "health": 3, "speed": 2}},
    {"name": "Ghost Bot", "type": "robot", "cost": 2, "text": "This robot can move over other objects.",
     "stats": {"attack": 1, "health": 1, "speed": 2},
     "abilities": [{"setAbility": {"targets": "thisObject", "effect": {"applyEffect": "canMoveOverObjects"}}}]},
    {"name": "Chain Strike", "type": "event", "cost": 1,
     "text": "Deal 1 damage to a robot. Destroy a structure.",
     "abilities": [{"actions": [
        {"dealDamage": {"target": {"choose": {"objectsInPlay": {"only": "robot"}}}, "amount": {"const": 1}}},
        {"destroy": {"choose": {"objectsInPlay": {"only": "structure"}}}}]}]},
    {"name": "Twin Shock", "type": "event", "cost": 1,
     "text": "Deal 1 damage to a robot. Deal 1 damage to a robot.",
     "abilities": [{"actions": [
        {"dealDamage": {"target": {"choose": {"objectsInPlay": {"only": "robot"}}}, "amount": {"const": 1}}},
        {"dealDamage": {"target": {"choose": {"objectsInPlay": {"only": "robot"}}}, "amount": {"const": 1}}}]}]},
    {"name": "Scatter", "type": "event", "cost": 1, "text": "Deal 1 damage to a random robot.",
     "abilities": [{"actions": [{"dealDamage": {
        "target": {"random": {"count": 1, "from": {"objectsInPlay": {"only": "robot"}}}},
        "amount": {"const": 1}}}]}]},
    {"name": "Flip", "type": "event", "cost": 1,
     "text": "Swap the attack and speed of robots you control.",
     "abilities": [{"actions": [{"swapAttributes": {
        "target": {"objectsMatching": {"objectType": {"only": "robot"},
                                       "conditions": [{"controlledBy": "selfPlayer"}]}},
        "first": "attack", "second": "speed"}}]}]}
]"#;

fn library() -> CardDatabase {
    CardDatabase::from_json(LIBRARY).unwrap()
}

fn setup(blue: &[&str], orange: &[&str], options: MatchOptions, format: GameFormat) -> MatchSetup {
    let db = library();
    MatchSetup {
        usernames: PerPlayer::new("alice".to_string(), "bob".to_string()),
        decks: PerPlayer::new(db.build_deck(blue).unwrap(), db.build_deck(orange).unwrap()),
        format,
        options,
        seed: Some(2024),
        perspective: PlayerColor::Blue,
    }
}

fn bots(n: usize) -> Vec<&'static str> {
    vec!["Attack Bot"; n]
}

fn fresh_match() -> MatchState {
    new_game(setup(&bots(10), &bots(10), MatchOptions::default(), GameFormat::Normal)).unwrap()
}

fn instance(name: &str, tag: &str) -> CardInGame {
    library()
        .get_card(name)
        .unwrap()
        .instantiate(CardId(format!("{}#{}", name, tag)))
}

/// Put a specific card into a player's hand
fn give(state: &mut MatchState, color: PlayerColor, name: &str) -> CardId {
    let card = instance(name, "extra");
    let id = card.id.clone();
    state.players[color].hand.add_card(card);
    id
}

/// Put a specific object straight onto the board, ready to act
fn put(state: &mut MatchState, color: PlayerColor, name: &str, hex: Hex) -> ObjectId {
    let id = place_card(state, instance(name, &hex.to_string()), hex, color, false, &Context::default())
        .unwrap()
        .unwrap();
    state.board.get_mut(id).unwrap().reset_for_turn();
    id
}

fn send(state: MatchState, command: Command) -> MatchState {
    apply_command(state, &command).unwrap()
}

fn pass(state: MatchState) -> MatchState {
    let player = state.current_turn;
    send(state, Command::PassTurn { player })
}

#[test]
fn test_fresh_match_layout() {
    let state = fresh_match();

    for color in PlayerColor::ALL {
        let core = state.board.core_of(color).unwrap();
        assert_eq!(core.hex, core_hex(color));
        assert_eq!(core.health(), 20);
        assert_eq!(state.players[color].hand.size(), 2);
        assert_eq!(state.players[color].deck.size(), 8);
    }
    assert_eq!(state.current_turn, PlayerColor::Blue);
    assert_eq!(state.turn_number, 1);
    assert_eq!(state.players.blue.energy.total, 1);
    assert_eq!(state.players.orange.energy.total, 0);
    assert!(state.winner.is_none());
}

#[test]
fn test_energy_after_pass_pairs() {
    let mut commands = Vec::new();
    for _ in 0..12 {
        commands.push(Command::PassTurn { player: PlayerColor::Blue });
        commands.push(Command::PassTurn { player: PlayerColor::Orange });
    }
    let base = setup(&bots(30), &bots(30), MatchOptions::default(), GameFormat::Normal);

    for n in 1..=12 {
        let outcome = replay(base.clone(), &commands[..2 * n]).unwrap();
        assert_eq!(outcome.rejected, 0);
        let energy = outcome.state.players.blue.energy;
        assert_eq!(energy.total, (1 + n as i32).min(10));
        assert!(energy.total <= 10);
    }
}

#[test]
fn test_play_cheap_robot() {
    let state = fresh_match();
    let card_id = state.players.blue.hand.cards()[0].id.clone();
    let hex = placement_hexes(PlayerColor::Blue)[1];

    let state = send(
        state,
        Command::PlayCard {
            player: PlayerColor::Blue,
            card_id: card_id.clone(),
            hex: Some(hex),
        },
    );

    assert_eq!(state.invalid, None);
    assert_eq!(state.players.blue.energy.available, 0);
    assert_eq!(state.players.blue.hand.size(), 1);
    let obj = state.board.object_at(&hex).unwrap();
    assert_eq!(obj.card.id, card_id);
    assert_eq!(obj.moves_made, 0);
    assert_eq!(obj.owner, PlayerColor::Blue);
    assert!(state.sfx_queue.contains(&"spawn.wav".to_string()));
    assert!(state.action_log.iter().any(|e| e.text == "You played |Attack Bot|."));
}

#[test]
fn test_not_enough_energy_leaves_state_alone() {
    let mut state = fresh_match();
    let tank = give(&mut state, PlayerColor::Blue, "Tank Bot");
    let before = fingerprint(&state).unwrap();

    let state = send(
        state,
        Command::PlayCard {
            player: PlayerColor::Blue,
            card_id: tank,
            hex: Some(placement_hexes(PlayerColor::Blue)[0]),
        },
    );

    assert_eq!(
        state.invalid,
        Some(Rejection::NotEnoughEnergy { needed: 3, available: 1 })
    );
    let mut cleared = state.clone();
    cleared.invalid = None;
    cleared.players.blue.status_message.clear();
    assert_eq!(fingerprint(&cleared).unwrap(), before);
}

#[test]
fn test_targeted_event_suspends_then_resolves() {
    let mut state = fresh_match();
    let victim_hex = Hex::new(1, 0);
    put(&mut state, PlayerColor::Orange, "Attack Bot", victim_hex);
    let shock = give(&mut state, PlayerColor::Blue, "Shock");

    let state = send(
        state,
        Command::PlayCard {
            player: PlayerColor::Blue,
            card_id: shock.clone(),
            hex: None,
        },
    );

    // Prompted, nothing paid or moved yet
    assert!(state.pending.is_some());
    assert!(state.players.blue.target.choosing);
    assert_eq!(state.players.blue.target.possible_hexes, vec![victim_hex]);
    assert_eq!(state.players.blue.status_message, "Choose a target");
    assert_eq!(state.players.blue.energy.available, 1);
    assert!(state.players.blue.hand.get(&shock).is_some());

    // Anything but a choice is refused while the prompt is open
    let state = send(state, Command::PassTurn { player: PlayerColor::Blue });
    assert_eq!(state.invalid, Some(Rejection::SelectionPending));

    let state = send(
        state,
        Command::ChooseTarget {
            player: PlayerColor::Blue,
            target: ChosenTarget::Hex(Hex::new(0, 0)),
        },
    );
    assert_eq!(state.invalid, Some(Rejection::IllegalTarget));
    assert!(state.pending.is_some());

    let state = send(
        state,
        Command::ChooseTarget {
            player: PlayerColor::Blue,
            target: ChosenTarget::Hex(victim_hex),
        },
    );
    assert_eq!(state.invalid, None);
    assert!(state.pending.is_none());
    assert!(!state.players.blue.target.choosing);
    assert!(state.board.object_at(&victim_hex).is_none());
    assert_eq!(state.players.blue.energy.available, 0);
    assert!(state.players.blue.hand.get(&shock).is_none());
    assert_eq!(state.players.blue.discard_pile.last().unwrap().name, "Shock");
    assert_eq!(state.players.orange.discard_pile.last().unwrap().name, "Attack Bot");
    assert!(state.action_log.iter().any(|e| e.text == "|Attack Bot| was destroyed."));
}

#[test]
fn test_targeted_event_without_targets_is_refused() {
    let mut state = fresh_match();
    let shock = give(&mut state, PlayerColor::Blue, "Shock");

    let state = send(
        state,
        Command::PlayCard {
            player: PlayerColor::Blue,
            card_id: shock.clone(),
            hex: None,
        },
    );

    assert_eq!(state.invalid, Some(Rejection::NoValidTargets));
    assert!(state.pending.is_none());
    assert!(state.players.blue.hand.get(&shock).is_some());
    assert_eq!(state.players.blue.energy.available, 1);
}

#[test]
fn test_destroying_last_core_ends_match() {
    let options = MatchOptions {
        core_health: 3,
        ..MatchOptions::default()
    };
    let mut state = new_game(setup(&bots(10), &bots(10), options, GameFormat::Normal)).unwrap();
    let overload = give(&mut state, PlayerColor::Blue, "Overload");

    let state = send(
        state,
        Command::PlayCard {
            player: PlayerColor::Blue,
            card_id: overload,
            hex: None,
        },
    );

    assert_eq!(state.winner, Some(PlayerColor::Blue));
    assert!(state.board.core_of(PlayerColor::Orange).is_none());
    assert!(state.sfx_queue.contains(&"win.wav".to_string()));
    assert!(state.action_log.iter().any(|e| e.text == "You win."));

    let state = send(state, Command::PassTurn { player: PlayerColor::Blue });
    assert_eq!(state.invalid, Some(Rejection::GameOver));
    assert_eq!(state.turn_number, 1);
}

#[test]
fn test_losing_from_opponent_perspective() {
    let options = MatchOptions {
        core_health: 3,
        ..MatchOptions::default()
    };
    let mut base = setup(&bots(10), &bots(10), options, GameFormat::Normal);
    base.perspective = PlayerColor::Orange;
    let mut state = new_game(base).unwrap();
    let overload = give(&mut state, PlayerColor::Blue, "Overload");

    let state = send(
        state,
        Command::PlayCard {
            player: PlayerColor::Blue,
            card_id: overload,
            hex: None,
        },
    );

    assert_eq!(state.winner, Some(PlayerColor::Blue));
    assert!(state.sfx_queue.contains(&"lose.wav".to_string()));
    assert!(state.action_log.iter().any(|e| e.text == "alice wins."));
    assert!(state.action_log.iter().any(|e| e.text == "alice played |Overload|."));
}

#[test]
fn test_combat_trades_damage() {
    let mut state = fresh_match();
    let attacker = put(&mut state, PlayerColor::Blue, "Attack Bot", Hex::new(0, 0));
    let defender = put(&mut state, PlayerColor::Orange, "Tank Bot", Hex::new(1, 0));

    let state = send(
        state,
        Command::AttackObject {
            player: PlayerColor::Blue,
            from: Hex::new(0, 0),
            target: Hex::new(1, 0),
        },
    );

    assert_eq!(state.invalid, None);
    assert!(!state.board.contains(attacker));
    assert_eq!(state.board.get(defender).unwrap().health(), 3);
    assert_eq!(state.players.blue.discard_pile.last().unwrap().name, "Attack Bot");
    assert!(state.sfx_queue.contains(&"attack.wav".to_string()));
    assert!(state
        .action_log
        .iter()
        .any(|e| e.text == "|Attack Bot| attacked |Tank Bot|."));
}

#[test]
fn test_defender_that_cannot_fight_back() {
    let mut state = fresh_match();
    let attacker = put(&mut state, PlayerColor::Blue, "Attack Bot", Hex::new(0, 0));
    let defender = put(&mut state, PlayerColor::Orange, "Shy Bot", Hex::new(1, 0));

    let state = send(
        state,
        Command::AttackObject {
            player: PlayerColor::Blue,
            from: Hex::new(0, 0),
            target: Hex::new(1, 0),
        },
    );

    assert_eq!(state.invalid, None);
    let survivor = state.board.get(attacker).unwrap();
    assert_eq!(survivor.health(), 1);
    assert!(survivor.cant_attack && survivor.attacked_this_turn);
    assert_eq!(state.board.get(defender).unwrap().health(), 2);

    let state = send(
        state,
        Command::AttackObject {
            player: PlayerColor::Blue,
            from: Hex::new(0, 0),
            target: Hex::new(1, 0),
        },
    );
    assert_eq!(state.invalid, Some(Rejection::IllegalAttack(Hex::new(1, 0))));
}

#[test]
fn test_cost_passive_on_cards_in_hand() {
    let mut state = fresh_match();
    let tank = give(&mut state, PlayerColor::Blue, "Tank Bot");
    let orange_tank = give(&mut state, PlayerColor::Orange, "Tank Bot");

    let factory = put(&mut state, PlayerColor::Blue, "Discount Factory", Hex::new(-2, 0));
    assert_eq!(state.players.blue.hand.get(&tank).unwrap().effective_cost(), 2);
    assert_eq!(state.players.orange.hand.get(&orange_tank).unwrap().effective_cost(), 3);

    // Reapplying on every turn boundary never stacks the discount
    let mut state = pass(pass(state));
    assert_eq!(state.players.blue.hand.get(&tank).unwrap().effective_cost(), 2);
    assert_eq!(state.players.blue.hand.get(&tank).unwrap().cost_adjustments.len(), 1);

    deal_damage(&mut state, factory, 2, None, &Context::default()).unwrap();
    assert!(!state.board.contains(factory));
    let card = state.players.blue.hand.get(&tank).unwrap();
    assert_eq!(card.effective_cost(), 3);
    assert!(card.cost_adjustments.is_empty());
}

#[test]
fn test_aura_follows_the_board() {
    let mut state = fresh_match();
    let sergeant = put(&mut state, PlayerColor::Blue, "Drill Sergeant", Hex::new(-2, 0));
    let ours = put(&mut state, PlayerColor::Blue, "Attack Bot", Hex::new(0, 0));
    let theirs = put(&mut state, PlayerColor::Orange, "Attack Bot", Hex::new(2, 0));

    assert_eq!(state.board.get(ours).unwrap().attack(), 2);
    assert_eq!(state.board.get(theirs).unwrap().attack(), 1);

    for _ in 0..4 {
        state = pass(state);
    }
    assert_eq!(state.board.get(ours).unwrap().attack(), 2);
    assert_eq!(state.board.get(ours).unwrap().temporary_adjustments.len(), 1);

    deal_damage(&mut state, sergeant, 3, None, &Context::default()).unwrap();
    assert_eq!(state.board.get(ours).unwrap().attack(), 1);
    assert!(state.board.get(ours).unwrap().temporary_adjustments.is_empty());
}

#[test]
fn test_destroy_handled_once() {
    let mut state = fresh_match();
    let bot = put(&mut state, PlayerColor::Orange, "Tank Bot", Hex::new(1, 0));

    deal_damage(&mut state, bot, 4, None, &Context::default()).unwrap();
    deal_damage(&mut state, bot, 4, None, &Context::default()).unwrap();

    assert!(!state.board.contains(bot));
    assert_eq!(state.players.orange.discard_pile.size(), 1);
    assert_eq!(
        state.sfx_queue.iter().filter(|s| *s == "destroyed.wav").count(),
        1
    );
    assert_eq!(
        state
            .action_log
            .iter()
            .filter(|e| e.text == "|Tank Bot| was destroyed.")
            .count(),
        1
    );
}

#[test]
fn test_full_hand_burns_draws() {
    let options = MatchOptions {
        max_hand_size: 3,
        ..MatchOptions::default()
    };
    let state = new_game(setup(&bots(10), &bots(10), options, GameFormat::Normal)).unwrap();

    // orange: 2 -> 3, blue: 2 -> 3, orange burns
    let state = pass(pass(pass(state)));

    assert_eq!(state.players.orange.hand.size(), 3);
    assert_eq!(state.players.orange.discard_pile.size(), 1);
    assert_eq!(state.players.orange.deck.size(), 10 - 2 - 2);
    assert_eq!(
        state.action_log.last().unwrap().text,
        "bob had to discard a card due to having a full hand of 3 cards."
    );
}

#[test]
fn test_shared_deck_draws_for_both() {
    let state = new_game(setup(&bots(5), &bots(5), MatchOptions::default(), GameFormat::SharedDeck)).unwrap();

    assert_eq!(state.players.blue.deck.size(), 6);
    assert_eq!(state.players.blue.deck.cards(), state.players.orange.deck.cards());

    let state = pass(state);
    assert_eq!(state.players.orange.deck.size(), 5);
    assert_eq!(state.players.blue.deck.cards(), state.players.orange.deck.cards());
}

#[test]
fn test_same_seed_same_match() {
    let a = new_game(setup(&["Attack Bot", "Shock", "Tank Bot", "Overload"], &bots(4), MatchOptions::default(), GameFormat::Normal))
        .unwrap();
    let b = new_game(setup(&["Attack Bot", "Shock", "Tank Bot", "Overload"], &bots(4), MatchOptions::default(), GameFormat::Normal))
        .unwrap();
    assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());

    let a = pass(pass(a));
    let b = pass(pass(b));
    assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
}

#[test]
fn test_state_survives_serialization() {
    let state = pass(fresh_match());
    let json = serde_json::to_string(&state).unwrap();
    let restored: MatchState = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, state);
    assert_eq!(restored.rng.cursor(), state.rng.cursor());

    let a = pass(state);
    let b = pass(restored);
    assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
}

#[test]
fn test_failed_follow_up_choice_abandons_the_card() {
    let mut state = fresh_match();
    let tank = put(&mut state, PlayerColor::Orange, "Tank Bot", Hex::new(1, 0));
    let chain = give(&mut state, PlayerColor::Blue, "Chain Strike");

    let state = send(
        state,
        Command::PlayCard {
            player: PlayerColor::Blue,
            card_id: chain.clone(),
            hex: None,
        },
    );
    assert!(state.pending.is_some());

    // The robot is a fine pick, but there is no structure for the second choice
    let state = send(
        state,
        Command::ChooseTarget {
            player: PlayerColor::Blue,
            target: ChosenTarget::Hex(Hex::new(1, 0)),
        },
    );
    assert_eq!(state.invalid, Some(Rejection::NoValidTargets));
    assert!(state.pending.is_none());
    assert!(!state.players.blue.target.choosing);
    assert!(state.players.blue.target.chosen.is_empty());
    assert!(state.players.blue.target.possible_hexes.is_empty());
    assert!(state.players.blue.hand.get(&chain).is_some());
    assert_eq!(state.players.blue.energy.available, 1);
    assert_eq!(state.board.get(tank).unwrap().health(), 4);

    let state = send(
        state,
        Command::ChooseTarget {
            player: PlayerColor::Blue,
            target: ChosenTarget::Hex(Hex::new(1, 0)),
        },
    );
    assert_eq!(state.invalid, Some(Rejection::NothingToChoose));

    let state = send(state, Command::PassTurn { player: PlayerColor::Blue });
    assert_eq!(state.invalid, None);
    assert_eq!(state.current_turn, PlayerColor::Orange);
}

#[test]
fn test_two_choices_take_two_round_trips() {
    let mut state = fresh_match();
    let first = put(&mut state, PlayerColor::Orange, "Tank Bot", Hex::new(1, 0));
    let second = put(&mut state, PlayerColor::Orange, "Tank Bot", Hex::new(2, -1));
    let twin = give(&mut state, PlayerColor::Blue, "Twin Shock");

    let state = send(
        state,
        Command::PlayCard {
            player: PlayerColor::Blue,
            card_id: twin.clone(),
            hex: None,
        },
    );
    assert!(state.pending.is_some());
    assert_eq!(state.players.blue.target.possible_hexes.len(), 2);

    let state = send(
        state,
        Command::ChooseTarget {
            player: PlayerColor::Blue,
            target: ChosenTarget::Hex(Hex::new(1, 0)),
        },
    );
    assert_eq!(state.invalid, None);
    assert!(state.pending.is_some());
    assert!(state.players.blue.target.choosing);
    assert_eq!(state.players.blue.target.chosen.len(), 1);
    assert_eq!(state.players.blue.energy.available, 1);
    assert_eq!(state.board.get(first).unwrap().health(), 4);

    let state = send(
        state,
        Command::ChooseTarget {
            player: PlayerColor::Blue,
            target: ChosenTarget::Hex(Hex::new(2, -1)),
        },
    );
    assert_eq!(state.invalid, None);
    assert!(state.pending.is_none());
    assert_eq!(state.board.get(first).unwrap().health(), 3);
    assert_eq!(state.board.get(second).unwrap().health(), 3);
    assert_eq!(state.players.blue.energy.available, 0);
    assert!(state.players.blue.hand.get(&twin).is_none());
}

#[test]
fn test_swapping_twice_restores_stats_under_aura() {
    let mut state = fresh_match();
    put(&mut state, PlayerColor::Blue, "Drill Sergeant", Hex::new(-2, 0));
    let tank = put(&mut state, PlayerColor::Blue, "Tank Bot", Hex::new(0, 0));
    state.players.blue.energy = Energy { available: 3, total: 3 };
    assert_eq!(state.board.get(tank).unwrap().attack(), 3);

    let flip = give(&mut state, PlayerColor::Blue, "Flip");
    let mut state = send(
        state,
        Command::PlayCard {
            player: PlayerColor::Blue,
            card_id: flip,
            hex: None,
        },
    );
    let obj = state.board.get(tank).unwrap();
    assert_eq!(obj.stats, Stats::robot(1, 4, 2));
    assert_eq!(obj.attack(), 2);
    assert_eq!(obj.speed(), 2);

    let flip = give(&mut state, PlayerColor::Blue, "Flip");
    let state = send(
        state,
        Command::PlayCard {
            player: PlayerColor::Blue,
            card_id: flip,
            hex: None,
        },
    );
    assert_eq!(state.invalid, None);
    let obj = state.board.get(tank).unwrap();
    assert_eq!(obj.stats, Stats::robot(2, 4, 1));
    assert_eq!(obj.attack(), 3);
    assert_eq!(obj.speed(), 1);
}

#[test]
fn test_occupied_hexes_block_movement() {
    let corner = Hex::new(3, -3);
    let blockers = [Hex::new(3, -2), Hex::new(2, -2), Hex::new(2, -3)];
    let surrounded = |name: &str| {
        let mut state = fresh_match();
        put(&mut state, PlayerColor::Blue, name, corner);
        for hex in blockers {
            put(&mut state, PlayerColor::Blue, "Attack Bot", hex);
        }
        state
    };

    let state = surrounded("Runner Bot");
    assert!(valid_movement_hexes(&state, corner).is_empty());
    let state = send(
        state,
        Command::MoveObject {
            player: PlayerColor::Blue,
            from: corner,
            to: Hex::new(1, -1),
        },
    );
    assert_eq!(state.invalid, Some(Rejection::IllegalMove(Hex::new(1, -1))));

    let state = surrounded("Ghost Bot");
    let reachable = valid_movement_hexes(&state, corner);
    assert!(reachable.contains(&Hex::new(1, -1)));
    assert!(blockers.iter().all(|hex| !reachable.contains(hex)));
    let state = send(
        state,
        Command::MoveObject {
            player: PlayerColor::Blue,
            from: corner,
            to: Hex::new(1, -1),
        },
    );
    assert_eq!(state.invalid, None);
    assert_eq!(state.board.object_at(&Hex::new(1, -1)).unwrap().card.name, "Ghost Bot");
}

#[test]
fn test_structures_go_next_to_own_objects() {
    let mut state = fresh_match();
    state.players.blue.energy = Energy { available: 3, total: 3 };
    let factory = give(&mut state, PlayerColor::Blue, "Discount Factory");

    let placements = valid_placement_hexes(&state, PlayerColor::Blue, CardType::Structure);
    assert!(placements.contains(&Hex::new(-2, 0)));
    assert!(!placements.contains(&Hex::new(2, 0)));

    let state = send(
        state,
        Command::PlayCard {
            player: PlayerColor::Blue,
            card_id: factory.clone(),
            hex: Some(Hex::new(1, -1)),
        },
    );
    assert_eq!(state.invalid, Some(Rejection::IllegalPlacement(Hex::new(1, -1))));

    let mut state = state;
    put(&mut state, PlayerColor::Blue, "Attack Bot", Hex::new(0, 0));
    let state = send(
        state,
        Command::PlayCard {
            player: PlayerColor::Blue,
            card_id: factory,
            hex: Some(Hex::new(1, -1)),
        },
    );
    assert_eq!(state.invalid, None);
    let placed = state.board.object_at(&Hex::new(1, -1)).unwrap();
    assert_eq!(placed.card.name, "Discount Factory");
    assert_eq!(placed.card_type(), CardType::Structure);
}

#[test]
fn test_attack_steps_to_first_reachable_neighbor() {
    let mut state = fresh_match();
    let runner = put(&mut state, PlayerColor::Blue, "Runner Bot", Hex::new(-1, 0));
    put(&mut state, PlayerColor::Blue, "Attack Bot", Hex::new(0, 0));
    let tank = put(&mut state, PlayerColor::Orange, "Tank Bot", Hex::new(1, 0));

    let state = send(
        state,
        Command::AttackObject {
            player: PlayerColor::Blue,
            from: Hex::new(-1, 0),
            target: Hex::new(1, 0),
        },
    );

    assert_eq!(state.invalid, None);
    let obj = state.board.get(runner).unwrap();
    assert_eq!(obj.hex, Hex::new(0, 1));
    assert_eq!(obj.health(), 1);
    assert!(obj.attacked_this_turn);
    assert_eq!(state.board.get(tank).unwrap().health(), 3);
    assert_eq!(
        state.animation_queue,
        vec![
            Animation::Move {
                from: Hex::new(-1, 0),
                to: Hex::new(0, 1)
            },
            Animation::Attack {
                from: Hex::new(0, 1),
                to: Hex::new(1, 0)
            },
        ]
    );
}

#[test]
fn test_random_targets_replay_identically() {
    let base = setup(&["Scatter"; 10], &bots(10), MatchOptions::default(), GameFormat::Normal);
    let mut state = new_game(base.clone()).unwrap();
    let mut commands = Vec::new();

    fn record(state: MatchState, command: Command, commands: &mut Vec<Command>) -> MatchState {
        commands.push(command.clone());
        let state = send(state, command);
        assert_eq!(state.invalid, None);
        state
    }

    for slot in 0..2 {
        state = record(state, Command::PassTurn { player: PlayerColor::Blue }, &mut commands);
        let card_id = state.players.orange.hand.cards()[0].id.clone();
        state = record(
            state,
            Command::PlayCard {
                player: PlayerColor::Orange,
                card_id,
                hex: Some(placement_hexes(PlayerColor::Orange)[slot]),
            },
            &mut commands,
        );
        state = record(state, Command::PassTurn { player: PlayerColor::Orange }, &mut commands);
    }
    let scatter = state.players.blue.hand.cards()[0].id.clone();
    state = record(
        state,
        Command::PlayCard {
            player: PlayerColor::Blue,
            card_id: scatter,
            hex: None,
        },
        &mut commands,
    );

    let orange_robots = state
        .board
        .objects()
        .filter(|obj| obj.owner == PlayerColor::Orange && obj.card_type() == CardType::Robot)
        .count();
    assert_eq!(orange_robots, 1);
    assert!(state.action_log.iter().any(|e| e.text.ends_with("was selected.")));

    let first = replay(base.clone(), &commands).unwrap();
    let second = replay(base, &commands).unwrap();
    assert_eq!(first.rejected, 0);
    assert_eq!(fingerprint(&first.state).unwrap(), fingerprint(&second.state).unwrap());
    assert_eq!(fingerprint(&first.state).unwrap(), fingerprint(&state).unwrap());
}

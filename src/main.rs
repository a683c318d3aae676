use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing_subscriber::EnvFilter;

use hexbots_engine::card::CardDatabase;
use hexbots_engine::game::{GameFormat, MatchOptions, MatchSetup, PerPlayer, PlayerColor};
use hexbots_engine::rng::GameRng;
use hexbots_engine::simulation::{fingerprint, play_match, run_script, MatchScript, ScriptError, ScriptSetup};

#[derive(Parser)]
#[command(name = "hexbots")]
#[command(about = "Deterministic rules engine for a hex-board robot card game", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Card library (JSON array of card definitions)
    #[arg(short, long, default_value = "cards.json", global = true)]
    cards: String,

    /// Print engine diagnostics to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a match script and print its log and result
    Replay {
        /// Match script file
        script: String,
    },

    /// Replay each script twice and check both runs end in the same state
    Verify {
        /// Match script files
        #[arg(required = true)]
        scripts: Vec<String>,
    },

    /// Play out self-play matches between two copies of a deck
    Simulate {
        /// Number of matches to play
        #[arg(short, long, default_value = "100")]
        num_games: usize,

        /// Deck list file ("COUNT Card Name" per line)
        #[arg(short, long, default_value = "deck.txt")]
        deck: String,

        /// Base seed for reproducibility
        #[arg(short, long)]
        seed: Option<u64>,

        /// Give up on a match after this many turns
        #[arg(long, default_value = "60")]
        max_turns: u32,

        /// Draw both players from one merged deck
        #[arg(long)]
        shared_deck: bool,

        /// Write the first match as a replayable script
        #[arg(long)]
        save_script: Option<String>,
    },

    /// List the card library
    Cards,
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "hexbots_engine=debug" } else { "off" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{elapsed_precise}] {wide_bar:.cyan/blue} {pos:>5}/{len:5} {eta}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let db = match CardDatabase::from_file(&cli.cards) {
        Ok(db) => {
            eprintln!("✓ Loaded {} cards from {}", db.card_count(), cli.cards);
            db
        }
        Err(e) => {
            eprintln!("✗ Failed to load cards: {}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Replay { script } => replay_script(&db, &script),
        Commands::Verify { scripts } => verify_scripts(&db, &scripts),
        Commands::Simulate {
            num_games,
            deck,
            seed,
            max_turns,
            shared_deck,
            save_script,
        } => {
            let options = SimulateOptions {
                num_games,
                seed,
                max_turns,
                shared_deck,
                save_script,
            };
            simulate(&db, &deck, &options)
        }
        Commands::Cards => list_cards(&db),
    }
}

fn replay_script(db: &CardDatabase, path: &str) {
    let script = match MatchScript::from_file(path) {
        Ok(script) => script,
        Err(e) => {
            eprintln!("✗ Failed to read script '{}': {}", path, e);
            std::process::exit(1);
        }
    };

    let outcome = match run_script(&script, db) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("✗ Replay failed: {}", e);
            std::process::exit(1);
        }
    };

    let state = &outcome.state;
    println!("\n=== {} vs {} ===\n", state.usernames.blue, state.usernames.orange);
    for entry in &state.action_log {
        println!("  {}", entry.text);
    }
    println!();
    println!("Commands: {} ({} rejected)", script.commands.len(), outcome.rejected);
    println!("Turn: {}", state.turn_number);
    match state.winner {
        Some(winner) => println!("Winner: {} ({})", state.usernames[winner], winner),
        None => println!("No winner yet; {} to move", state.current_turn),
    }
    for color in PlayerColor::ALL {
        if let Some(core) = state.board.core_of(color) {
            println!("  {} core: {} health", color, core.health());
        }
    }
}

fn verify_scripts(db: &CardDatabase, paths: &[String]) {
    let pb = progress_bar(paths.len());
    pb.set_message("verifying");

    let start = std::time::Instant::now();
    let failures: Vec<(String, String)> = paths
        .par_iter()
        .filter_map(|path| {
            let result = (|| {
                let script = MatchScript::from_file(path)?;
                let first = fingerprint(&run_script(&script, db)?.state)?;
                let second = fingerprint(&run_script(&script, db)?.state)?;
                Ok::<bool, ScriptError>(first == second)
            })();
            pb.inc(1);
            match result {
                Ok(true) => None,
                Ok(false) => Some((path.clone(), "runs diverged".to_string())),
                Err(e) => Some((path.clone(), e.to_string())),
            }
        })
        .collect();
    pb.finish_and_clear();

    println!("\n=== Verification ===\n");
    println!("Scripts: {}", paths.len());
    println!("Consistent: {}", paths.len() - failures.len());
    for (path, reason) in &failures {
        println!("  ✗ {}: {}", path, reason);
    }
    println!("\nCompleted in {:.2?}", start.elapsed());

    if !failures.is_empty() {
        std::process::exit(1);
    }
}

struct SimulateOptions {
    num_games: usize,
    seed: Option<u64>,
    max_turns: u32,
    shared_deck: bool,
    save_script: Option<String>,
}

fn simulate(db: &CardDatabase, deck_file: &str, opts: &SimulateOptions) {
    let num_games = opts.num_games;
    let names = match std::fs::read_to_string(deck_file)
        .map_err(|e| e.to_string())
        .and_then(|content| db.parse_deck_list(&content).map_err(|e| e.to_string()))
    {
        Ok(names) => names,
        Err(e) => {
            eprintln!("✗ Failed to parse deck file '{}': {}", deck_file, e);
            std::process::exit(1);
        }
    };
    let deck = match db.build_deck(&names) {
        Ok(deck) => deck,
        Err(e) => {
            eprintln!("✗ Failed to build deck: {}", e);
            std::process::exit(1);
        }
    };

    let base_seed = opts.seed.unwrap_or_else(|| GameRng::new(None).seed());
    let format = if opts.shared_deck {
        GameFormat::SharedDeck
    } else {
        GameFormat::Normal
    };
    println!("\n=== Self-play ===\n");
    println!("Deck: {} ({} cards)", deck_file, deck.len());
    println!("Games: {}", num_games);
    println!("Seed: {}", base_seed);
    println!();

    let pb = progress_bar(num_games);
    pb.set_message("playing");
    let start = std::time::Instant::now();

    let results: Vec<_> = (0..num_games)
        .into_par_iter()
        .map(|i| {
            let setup = MatchSetup {
                usernames: PerPlayer::new("blue".to_string(), "orange".to_string()),
                decks: PerPlayer::new(deck.clone(), deck.clone()),
                format,
                options: MatchOptions::default(),
                seed: Some(base_seed.wrapping_add(i as u64)),
                perspective: PlayerColor::Blue,
            };
            let result = play_match(setup, opts.max_turns);
            pb.inc(1);
            result
        })
        .collect();
    pb.finish_and_clear();
    let elapsed = start.elapsed();

    if let (Some(path), Some(Ok(first))) = (&opts.save_script, results.first()) {
        let script = MatchScript {
            setup: ScriptSetup {
                usernames: PerPlayer::new("blue".to_string(), "orange".to_string()),
                decks: PerPlayer::new(names.clone(), names.clone()),
                format,
                options: MatchOptions::default(),
                seed: base_seed,
                perspective: PlayerColor::Blue,
            },
            commands: first.commands.clone(),
        };
        match script.to_json().map(|json| std::fs::write(path, json)) {
            Ok(Ok(())) => eprintln!("✓ Saved first match to {}", path),
            Ok(Err(e)) => eprintln!("✗ Failed to write script '{}': {}", path, e),
            Err(e) => eprintln!("✗ Failed to encode script: {}", e),
        }
    }

    let mut wins: BTreeMap<PlayerColor, usize> = BTreeMap::new();
    let mut turn_dist: BTreeMap<u32, usize> = BTreeMap::new();
    let mut unfinished = 0;
    let mut errors = 0;

    for result in &results {
        match result {
            Ok(r) => match r.state.winner {
                Some(winner) => {
                    *wins.entry(winner).or_insert(0) += 1;
                    *turn_dist.entry(r.state.turn_number).or_insert(0) += 1;
                }
                None => unfinished += 1,
            },
            Err(e) => {
                eprintln!("✗ Engine error: {}", e);
                errors += 1;
            }
        }
    }

    println!("=== Results ===\n");
    for color in PlayerColor::ALL {
        let n = wins.get(&color).copied().unwrap_or(0);
        println!("{:>7} wins: {:5.1}% ({})", color.to_string(), n as f64 / num_games as f64 * 100.0, n);
    }
    println!("Unfinished: {}", unfinished);
    if errors > 0 {
        println!("Engine errors: {}", errors);
    }
    println!();

    println!("Deciding turn distribution:");
    for (turn, count) in &turn_dist {
        let pct = *count as f64 / num_games as f64 * 100.0;
        let bar = "█".repeat((pct / 2.0) as usize);
        println!("  Turn {:3}: {:5.1}% {} ({})", turn, pct, bar, count);
    }

    println!();
    println!(
        "Simulation completed in {:.2?} ({:.0} games/sec)",
        elapsed,
        num_games as f64 / elapsed.as_secs_f64()
    );
}

fn list_cards(db: &CardDatabase) {
    for name in db.card_names() {
        if let Ok(card) = db.get_card(name) {
            let stats = match card.stats {
                Some(s) => match (s.attack, s.speed) {
                    (Some(attack), Some(speed)) => format!("{}/{}/{}", attack, s.health, speed),
                    _ => format!("{}", s.health),
                },
                None => String::new(),
            };
            println!("{:>2}  {:<28} {:<9} {:>8}  {}", card.cost, card.name, card.card_type.to_string(), stats, card.text);
        }
    }
}

//! Match scripts: a setup plus the commands both players sent, in order.
//!
//! Replaying a script must always reach the same final state. `fingerprint`
//! gives a comparable digest of that state for cross-checking two runs.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::card::{CardDatabase, CardDatabaseError};
use crate::game::formats::{new_game, GameFormat, MatchOptions, MatchSetup};
use crate::game::state::{MatchState, PerPlayer, PlayerColor};
use crate::game::turns::{apply_command, Command};
use crate::game::EngineError;

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Card library error: {0}")]
    Cards(#[from] CardDatabaseError),
    #[error("Engine error at command {index}: {source}")]
    Engine { index: usize, source: EngineError },
    #[error("Invalid match setup: {0}")]
    Setup(EngineError),
}

/// Deck lists by card name, resolved against a card library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptSetup {
    pub usernames: PerPlayer<String>,
    pub decks: PerPlayer<Vec<String>>,
    #[serde(default)]
    pub format: GameFormat,
    #[serde(default)]
    pub options: MatchOptions,
    pub seed: u64,
    #[serde(default = "default_perspective")]
    pub perspective: PlayerColor,
}

fn default_perspective() -> PlayerColor {
    PlayerColor::Blue
}

impl ScriptSetup {
    pub fn build(&self, db: &CardDatabase) -> Result<MatchSetup, ScriptError> {
        Ok(MatchSetup {
            usernames: self.usernames.clone(),
            decks: PerPlayer::new(
                db.build_deck(self.decks.blue.as_slice())?,
                db.build_deck(self.decks.orange.as_slice())?,
            ),
            format: self.format,
            options: self.options,
            seed: Some(self.seed),
            perspective: self.perspective,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchScript {
    pub setup: ScriptSetup,
    pub commands: Vec<Command>,
}

impl MatchScript {
    pub fn from_file(path: &str) -> Result<Self, ScriptError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn to_json(&self) -> Result<String, ScriptError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Final state of a replayed match
#[derive(Debug, Clone)]
pub struct ReplayOutcome {
    pub state: MatchState,
    /// Commands the engine refused along the way
    pub rejected: usize,
}

/// Apply commands to a prepared setup, counting refusals
pub fn replay(setup: MatchSetup, commands: &[Command]) -> Result<ReplayOutcome, ScriptError> {
    let mut state = new_game(setup).map_err(ScriptError::Setup)?;
    let mut rejected = 0;

    for (index, command) in commands.iter().enumerate() {
        state = apply_command(state, command).map_err(|source| ScriptError::Engine { index, source })?;
        if let Some(rejection) = &state.invalid {
            debug!(index, %rejection, "script command refused");
            rejected += 1;
        }
    }

    info!(
        commands = commands.len(),
        rejected,
        winner = ?state.winner,
        "replay finished"
    );
    Ok(ReplayOutcome { state, rejected })
}

pub fn run_script(script: &MatchScript, db: &CardDatabase) -> Result<ReplayOutcome, ScriptError> {
    replay(script.setup.build(db)?, &script.commands)
}

/// Canonical serialization of a state with wall-clock timestamps zeroed
pub fn fingerprint(state: &MatchState) -> Result<String, ScriptError> {
    let mut state = state.clone();
    for entry in &mut state.action_log {
        entry.timestamp = 0;
    }
    Ok(serde_json::to_string(&state)?)
}

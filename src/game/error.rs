use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::hex::Hex;
use crate::game::zones::ObjectId;

/// Fatal engine failures. These indicate broken content or a broken caller,
/// never an illegal move by a player.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Malformed command: {0}")]
    Malformed(String),
    #[error("Unknown object: {0}")]
    UnknownObject(ObjectId),
    #[error("Invalid match setup: {0}")]
    InvalidSetup(String),
}

/// Why a command was refused. The state is left as it was, apart from this marker
/// and the player's status message.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Rejection {
    #[error("It is not your turn")]
    NotYourTurn,
    #[error("The game is over")]
    GameOver,
    #[error("You must choose a target first")]
    SelectionPending,
    #[error("There is nothing to choose")]
    NothingToChoose,
    #[error("That is not a valid target")]
    IllegalTarget,
    #[error("There are no valid targets")]
    NoValidTargets,
    #[error("That card is not in your hand")]
    CardNotInHand,
    #[error("Not enough energy: need {needed}, have {available}")]
    NotEnoughEnergy { needed: i32, available: i32 },
    #[error("Cannot place a card at {0}")]
    IllegalPlacement(Hex),
    #[error("There is no object of yours at {0}")]
    NoObject(Hex),
    #[error("Cannot move to {0}")]
    IllegalMove(Hex),
    #[error("Cannot attack {0}")]
    IllegalAttack(Hex),
    #[error("That ability cannot be activated")]
    CannotActivate,
}

/// Outcome of a command handler: a rejection is an ordinary result, an engine error is not
#[derive(Debug)]
pub(crate) enum Refusal {
    Rejected(Rejection),
    Fatal(EngineError),
}

impl From<Rejection> for Refusal {
    fn from(rejection: Rejection) -> Self {
        Refusal::Rejected(rejection)
    }
}

impl From<EngineError> for Refusal {
    fn from(error: EngineError) -> Self {
        Refusal::Fatal(error)
    }
}

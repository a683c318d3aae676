pub mod actions;
pub mod conditions;
pub mod error;
pub mod formats;
pub mod hex;
pub mod state;
pub mod targets;
pub mod triggers;
pub mod turns;
pub mod zones;

pub use error::{EngineError, Rejection};
pub use formats::{new_game, GameFormat, MatchOptions, MatchSetup};
pub use hex::Hex;
pub use state::{ChosenTarget, MatchState, PerPlayer, PlayerColor};
pub use turns::{apply_command, Command};
pub use zones::{Board, Object, ObjectId};

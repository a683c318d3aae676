pub mod autoplay;
pub mod replay;

pub use autoplay::{play_match, SelfPlayResult};
pub use replay::{fingerprint, replay, run_script, MatchScript, ReplayOutcome, ScriptError, ScriptSetup};

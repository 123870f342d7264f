//! Match rules, state machine and registry

pub mod combat;
pub mod error;
pub mod local;
pub mod map;
pub mod r#match;
pub mod registry;
pub mod resolution;
pub mod roster;
pub mod snapshot;

pub use combat::{ActionRoll, Dice, RandomDice, ScriptedDice};
pub use error::{ErrorKind, MatchError};
pub use local::LocalMatch;
pub use map::ArenaMap;
pub use r#match::{Match, MatchId, MatchOutcome, MatchPhase, ParticipantId, Side, TeamStats};
pub use registry::MatchRegistry;
pub use resolution::{resolve, ActionCommand, Resolution};
pub use roster::{
    preset_squads, ActionKind, Combatant, CombatantClass, CombatantDraft, Team, TeamDraft,
    TEAM_SIZE,
};
pub use snapshot::{MatchSnapshot, SideSnapshot, Viewer};

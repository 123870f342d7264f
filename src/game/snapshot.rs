//! Read-only match views sent to polling clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::map::ArenaMap;
use super::r#match::{Match, MatchId, MatchOutcome, MatchPhase, Side, TeamStats};
use super::roster::Team;

/// Everything a client needs to render a match and decide whether to act
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub match_id: MatchId,
    pub phase: MatchPhase,
    pub turn_number: u32,
    pub active_side: Option<Side>,
    /// Name of the team whose turn it is
    pub active_team: Option<String>,
    pub map: Option<ArenaMap>,
    pub creator: SideSnapshot,
    pub opponent: SideSnapshot,
    pub outcome: Option<MatchOutcome>,
    pub last_action: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Present when the request named a participant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewer: Option<Viewer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideSnapshot {
    pub joined: bool,
    pub team: Option<Team>,
    pub living: usize,
    pub stats: TeamStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    pub side: Side,
    pub your_turn: bool,
}

impl MatchSnapshot {
    pub fn build(state: &Match, viewer: Option<Side>) -> Self {
        let side = |s: Side| {
            let seat = state.seat(s);
            let team = seat.and_then(|seat| seat.team.clone());
            SideSnapshot {
                joined: seat.is_some(),
                living: team.as_ref().map_or(0, Team::living_count),
                team,
                stats: state.stats(s),
            }
        };

        let active_team = state
            .active
            .and_then(|s| state.team(s))
            .map(|t| t.name.clone());

        Self {
            match_id: state.id.clone(),
            phase: state.phase,
            turn_number: state.turn_number,
            active_side: state.active,
            active_team,
            map: state.map,
            creator: side(Side::Creator),
            opponent: side(Side::Opponent),
            outcome: state.outcome(),
            last_action: state.last_action.clone(),
            created_at: state.created_at,
            updated_at: state.updated_at,
            viewer: viewer.map(|side| Viewer {
                side,
                your_turn: state.phase == MatchPhase::InProgress && state.active == Some(side),
            }),
        }
    }

    pub fn side(&self, side: Side) -> &SideSnapshot {
        match side {
            Side::Creator => &self.creator,
            Side::Opponent => &self.opponent,
        }
    }

    pub fn is_turn_of(&self, side: Side) -> bool {
        self.phase == MatchPhase::InProgress && self.active_side == Some(side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::combat::ScriptedDice;
    use crate::game::r#match::tests::{pid, squad, started};
    use crate::game::resolution::ActionCommand;
    use crate::game::roster::CombatantClass;

    #[test]
    fn snapshot_reports_turn_and_stats() {
        let mut m = started(
            squad("Reds", CombatantClass::Melee, 100),
            squad("Blues", CombatantClass::Ranged, 85),
        );
        let command = ActionCommand {
            combatant_index: 0,
            action_key: "1".to_string(),
            target_index: 0,
        };
        m.submit_action_with(&pid("alice"), &command, &mut ScriptedDice::new([40]))
            .unwrap();

        let snap = MatchSnapshot::build(&m, Some(Side::Opponent));
        assert_eq!(snap.active_team.as_deref(), Some("Blues"));
        assert!(snap.is_turn_of(Side::Opponent));
        assert_eq!(snap.viewer, Some(Viewer { side: Side::Opponent, your_turn: true }));
        assert_eq!(snap.creator.stats.damage_dealt, 40);
        assert_eq!(snap.opponent.living, 5);
        assert!(snap.outcome.is_none());
    }

    #[test]
    fn snapshots_are_stable_without_mutation() {
        let m = started(
            squad("Reds", CombatantClass::Melee, 100),
            squad("Blues", CombatantClass::Support, 90),
        );
        let a = MatchSnapshot::build(&m, None);
        let b = MatchSnapshot::build(&m, None);
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn fresh_match_has_empty_opponent() {
        let m = Match::new("feedbeef".into(), pid("alice"), 3);
        let snap = MatchSnapshot::build(&m, Some(Side::Creator));
        assert_eq!(snap.phase, MatchPhase::AwaitingOpponent);
        assert!(snap.creator.joined);
        assert!(!snap.opponent.joined);
        assert_eq!(snap.active_team, None);
        assert_eq!(snap.viewer.map(|v| v.your_turn), Some(false));
    }
}

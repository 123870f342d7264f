//! HTTP wire types shared by the server routes and the polling client

use serde::{Deserialize, Serialize};

use crate::game::roster::{Critical, Magnitude, TargetSide};
use crate::game::{
    ActionCommand, ActionKind, ArenaMap, CombatantClass, ErrorKind, MatchId, MatchPhase, Side,
    TeamDraft, TEAM_SIZE,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMatchRequest {
    #[serde(default)]
    pub player_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMatchResponse {
    pub match_id: MatchId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinMatchRequest {
    #[serde(default)]
    pub player_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitTeamRequest {
    #[serde(default)]
    pub player_id: String,
    pub team: TeamDraft,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitMapRequest {
    #[serde(default)]
    pub player_id: String,
    /// Display name or slug of an [`ArenaMap`]
    pub map: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitActionRequest {
    #[serde(default)]
    pub player_id: String,
    #[serde(flatten)]
    pub command: ActionCommand,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitActionResponse {
    pub narrative: String,
    pub phase: MatchPhase,
    pub turn_number: u32,
    pub active_side: Option<Side>,
    pub finished: bool,
}

/// Generic acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckResponse {
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateQuery {
    pub player_id: Option<String>,
}

/// Error body for every failed request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: ErrorKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub active_matches: usize,
}

/// Static game data: classes, their actions, maps and stock squads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub team_size: usize,
    pub classes: Vec<ClassInfo>,
    pub maps: Vec<ArenaMap>,
    pub presets: Vec<TeamDraft>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub class: CombatantClass,
    pub default_max_health: u32,
    pub actions: Vec<ActionInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionInfo {
    /// Slot key, "1" or "2"
    pub key: String,
    pub kind: ActionKind,
    pub label: String,
    pub target: TargetSide,
    pub magnitude: Magnitude,
    pub recoil: Option<Magnitude>,
    pub critical: Option<Critical>,
}

impl CatalogResponse {
    pub fn build() -> Self {
        let classes = CombatantClass::ALL
            .into_iter()
            .map(|class| ClassInfo {
                class,
                default_max_health: class.default_max_health(),
                actions: class
                    .actions()
                    .iter()
                    .enumerate()
                    .map(|(slot, spec)| ActionInfo {
                        key: (slot + 1).to_string(),
                        kind: spec.kind,
                        label: spec.label.to_string(),
                        target: spec.target,
                        magnitude: spec.magnitude,
                        recoil: spec.recoil,
                        critical: spec.critical,
                    })
                    .collect(),
            })
            .collect();

        Self {
            team_size: TEAM_SIZE,
            classes,
            maps: ArenaMap::ALL.to_vec(),
            presets: crate::game::preset_squads(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_request_is_flat() {
        let req: SubmitActionRequest = serde_json::from_str(
            r#"{"player_id":"p1","combatant_index":2,"action_key":"1","target_index":0}"#,
        )
        .unwrap();
        assert_eq!(req.player_id, "p1");
        assert_eq!(req.command.combatant_index, 2);
        assert_eq!(req.command.action_key, "1");
    }

    #[test]
    fn catalog_lists_two_actions_per_class() {
        let catalog = CatalogResponse::build();
        assert_eq!(catalog.classes.len(), 3);
        assert!(catalog.classes.iter().all(|c| c.actions.len() == 2));
        assert_eq!(catalog.maps.len(), 4);
        assert_eq!(catalog.presets.len(), 2);
    }
}

//! Match aggregate and its setup-phase transitions

use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::combat::{Dice, RandomDice};
use super::error::MatchError;
use super::map::ArenaMap;
use super::resolution::{resolve, ActionCommand, Resolution};
use super::roster::{Team, TeamDraft};

const MAX_PARTICIPANT_ID_LEN: usize = 64;

/// Short shareable match code
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(String);

impl MatchId {
    /// Fresh random 8-character hex code
    pub fn generate() -> Self {
        let mut code = Uuid::new_v4().simple().to_string();
        code.truncate(8);
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MatchId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for MatchId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque participant token chosen by the client
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn parse(raw: &str) -> Result<Self, MatchError> {
        let id = raw.trim();
        if id.is_empty() {
            return Err(MatchError::invalid("player_id is required"));
        }
        if id.len() > MAX_PARTICIPANT_ID_LEN {
            return Err(MatchError::invalid(format!(
                "player_id is longer than {} bytes",
                MAX_PARTICIPANT_ID_LEN
            )));
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Match phase. Transitions only move forward, one step at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    /// Created, second participant missing
    AwaitingOpponent,
    /// Both participants present, rosters pending
    AwaitingTeams,
    /// Both rosters locked, creator picks the arena
    AwaitingMap,
    /// Alternating turns
    InProgress,
    /// One side has no living combatants
    Finished,
}

impl fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MatchPhase::AwaitingOpponent => "awaiting an opponent",
            MatchPhase::AwaitingTeams => "awaiting teams",
            MatchPhase::AwaitingMap => "awaiting a map",
            MatchPhase::InProgress => "in progress",
            MatchPhase::Finished => "finished",
        })
    }
}

/// The two seats of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Creator,
    Opponent,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Creator => Side::Opponent,
            Side::Opponent => Side::Creator,
        }
    }
}

/// Per-side running totals. Only ever grow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamStats {
    pub damage_dealt: u64,
    pub healing_done: u64,
    pub combatants_lost: u32,
}

/// A participant's seat: identity, roster and statistics
#[derive(Debug, Clone)]
pub struct Seat {
    pub participant: ParticipantId,
    pub team: Option<Team>,
    pub stats: TeamStats,
}

impl Seat {
    fn new(participant: ParticipantId) -> Self {
        Self {
            participant,
            team: None,
            stats: TeamStats::default(),
        }
    }
}

/// How a finished match ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum MatchOutcome {
    Winner { side: Side, team: String },
    /// Both squads fell on the same action
    Draw,
}

/// Authoritative state of one match
#[derive(Debug, Clone)]
pub struct Match {
    pub id: MatchId,
    pub seed: u64,
    pub phase: MatchPhase,
    pub creator: Seat,
    pub opponent: Option<Seat>,
    /// Side entitled to the next action (set once both teams are in)
    pub active: Option<Side>,
    /// Turn currently being played, starting at 1
    pub turn_number: u32,
    pub map: Option<ArenaMap>,
    pub last_action: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    last_activity: Instant,
    rng: ChaCha8Rng,
}

impl Match {
    pub fn new(id: MatchId, creator: ParticipantId, seed: u64) -> Self {
        let now = Utc::now();
        Self {
            id,
            seed,
            phase: MatchPhase::AwaitingOpponent,
            creator: Seat::new(creator),
            opponent: None,
            active: None,
            turn_number: 1,
            map: None,
            last_action: None,
            created_at: now,
            updated_at: now,
            last_activity: Instant::now(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn side_of(&self, participant: &ParticipantId) -> Option<Side> {
        if &self.creator.participant == participant {
            Some(Side::Creator)
        } else if self
            .opponent
            .as_ref()
            .is_some_and(|s| &s.participant == participant)
        {
            Some(Side::Opponent)
        } else {
            None
        }
    }

    pub fn seat(&self, side: Side) -> Option<&Seat> {
        match side {
            Side::Creator => Some(&self.creator),
            Side::Opponent => self.opponent.as_ref(),
        }
    }

    pub fn team(&self, side: Side) -> Option<&Team> {
        self.seat(side).and_then(|s| s.team.as_ref())
    }

    pub fn stats(&self, side: Side) -> TeamStats {
        self.seat(side).map(|s| s.stats).unwrap_or_default()
    }

    /// `(acting, other)` seats for the given side
    pub(crate) fn seats_mut(&mut self, acting: Side) -> Result<(&mut Seat, &mut Seat), MatchError> {
        let opponent = self
            .opponent
            .as_mut()
            .ok_or_else(|| MatchError::Internal("opponent seat is empty".to_string()))?;
        Ok(match acting {
            Side::Creator => (&mut self.creator, opponent),
            Side::Opponent => (opponent, &mut self.creator),
        })
    }

    /// Winner or draw, once finished
    pub fn outcome(&self) -> Option<MatchOutcome> {
        if self.phase != MatchPhase::Finished {
            return None;
        }
        let creator_up = self.team(Side::Creator).is_some_and(|t| !t.is_wiped());
        let opponent_up = self.team(Side::Opponent).is_some_and(|t| !t.is_wiped());
        let winner = match (creator_up, opponent_up) {
            (true, false) => Side::Creator,
            (false, true) => Side::Opponent,
            _ => return Some(MatchOutcome::Draw),
        };
        let team = self.team(winner).map(|t| t.name.clone()).unwrap_or_default();
        Some(MatchOutcome::Winner { side: winner, team })
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }

    /// Reset the idle clock without recording a state change
    pub(crate) fn keep_alive(&mut self) {
        self.last_activity = Instant::now();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
        self.last_activity = Instant::now();
    }

    fn require_phase(
        &self,
        expected: MatchPhase,
        operation: &'static str,
    ) -> Result<(), MatchError> {
        if self.phase != expected {
            return Err(MatchError::InvalidPhase {
                operation,
                phase: self.phase,
            });
        }
        Ok(())
    }

    /// Second participant takes the opponent seat. Re-joining by the same
    /// participant is acknowledged without changes.
    pub fn join(&mut self, joiner: ParticipantId) -> Result<(), MatchError> {
        if self.side_of(&joiner) == Some(Side::Opponent) {
            return Ok(());
        }
        if joiner == self.creator.participant {
            return Err(MatchError::invalid("the creator cannot join their own match"));
        }
        self.require_phase(MatchPhase::AwaitingOpponent, "join the match")?;

        info!(match_id = %self.id, participant = %joiner, "Opponent joined match");
        self.opponent = Some(Seat::new(joiner));
        self.phase = MatchPhase::AwaitingTeams;
        self.touch();
        Ok(())
    }

    /// Lock in a side's roster. Returns the accepted team name.
    pub fn submit_team(
        &mut self,
        participant: &ParticipantId,
        draft: &TeamDraft,
    ) -> Result<String, MatchError> {
        self.require_phase(MatchPhase::AwaitingTeams, "submit a team")?;
        let side = self
            .side_of(participant)
            .ok_or_else(|| MatchError::unauthorized("not a participant of this match"))?;

        let seat = match side {
            Side::Creator => &mut self.creator,
            Side::Opponent => self
                .opponent
                .as_mut()
                .ok_or_else(|| MatchError::Internal("opponent seat is empty".to_string()))?,
        };
        if seat.team.is_some() {
            return Err(MatchError::invalid("team already submitted for this side"));
        }

        let team = draft.build()?;
        let name = team.name.clone();
        seat.team = Some(team);
        info!(match_id = %self.id, side = ?side, team = %name, "Team submitted");

        if self.team(Side::Creator).is_some() && self.team(Side::Opponent).is_some() {
            self.phase = MatchPhase::AwaitingMap;
            self.active = Some(Side::Creator);
            info!(match_id = %self.id, "Both teams locked, awaiting map");
        }
        self.touch();
        Ok(name)
    }

    /// Creator picks the arena; the match starts on the creator's turn.
    pub fn submit_map(
        &mut self,
        participant: &ParticipantId,
        map: &str,
    ) -> Result<ArenaMap, MatchError> {
        self.require_phase(MatchPhase::AwaitingMap, "choose the map")?;
        if self.side_of(participant) != Some(Side::Creator) {
            return Err(MatchError::unauthorized("only the match creator can choose the map"));
        }
        let map: ArenaMap = map
            .parse()
            .map_err(|e: super::map::UnknownMap| MatchError::invalid(e.to_string()))?;

        self.map = Some(map);
        self.phase = MatchPhase::InProgress;
        self.active = Some(Side::Creator);
        self.turn_number = 1;
        self.touch();
        info!(match_id = %self.id, map = %map, "Match started");
        Ok(map)
    }

    /// Resolve an action with the match's own generator. A rejected action
    /// leaves every field untouched, generator included.
    pub fn submit_action(
        &mut self,
        participant: &ParticipantId,
        command: &ActionCommand,
    ) -> Result<Resolution, MatchError> {
        let mut rng = self.rng.clone();
        let resolution = self.submit_action_with(participant, command, &mut RandomDice(&mut rng))?;
        self.rng = rng;
        Ok(resolution)
    }

    /// Resolve an action with caller-supplied dice
    pub fn submit_action_with<D: Dice + ?Sized>(
        &mut self,
        participant: &ParticipantId,
        command: &ActionCommand,
        dice: &mut D,
    ) -> Result<Resolution, MatchError> {
        let resolution = resolve(self, participant, command, dice)?;
        self.touch();
        if resolution.finished {
            info!(
                match_id = %self.id,
                turn = self.turn_number,
                outcome = ?self.outcome(),
                "Match finished"
            );
        }
        Ok(resolution)
    }
}

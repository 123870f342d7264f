//! Hot-seat driver: both sides play from one process
//!
//! Runs the same `Match` operations and resolution as the server, with two
//! fixed local participants, so offline play cannot drift from online rules.

use super::combat::Dice;
use super::error::MatchError;
use super::map::ArenaMap;
use super::r#match::{Match, MatchId, MatchPhase, ParticipantId, Side};
use super::resolution::{ActionCommand, Resolution};
use super::roster::TeamDraft;
use super::snapshot::MatchSnapshot;

const LOCAL_CREATOR: &str = "local-1";
const LOCAL_OPPONENT: &str = "local-2";

pub struct LocalMatch {
    state: Match,
    creator: ParticipantId,
    opponent: ParticipantId,
}

impl LocalMatch {
    /// Set up both teams and the map; the creator's team moves first.
    pub fn start(
        first: &TeamDraft,
        second: &TeamDraft,
        map: ArenaMap,
        seed: u64,
    ) -> Result<Self, MatchError> {
        let creator = ParticipantId::parse(LOCAL_CREATOR)?;
        let opponent = ParticipantId::parse(LOCAL_OPPONENT)?;

        let mut state = Match::new(MatchId::from("local"), creator.clone(), seed);
        state.join(opponent.clone())?;
        state.submit_team(&creator, first)?;
        state.submit_team(&opponent, second)?;
        state.submit_map(&creator, map.slug())?;

        Ok(Self {
            state,
            creator,
            opponent,
        })
    }

    fn participant(&self, side: Side) -> &ParticipantId {
        match side {
            Side::Creator => &self.creator,
            Side::Opponent => &self.opponent,
        }
    }

    pub fn active_side(&self) -> Option<Side> {
        self.state.active
    }

    pub fn is_over(&self) -> bool {
        self.state.phase == MatchPhase::Finished
    }

    /// Play the current turn for whichever side is active
    pub fn play(&mut self, command: &ActionCommand) -> Result<Resolution, MatchError> {
        let side = self.current_side()?;
        let who = self.participant(side).clone();
        self.state.submit_action(&who, command)
    }

    /// Same as [`play`](Self::play) with caller-supplied dice
    pub fn play_with<D: Dice + ?Sized>(
        &mut self,
        command: &ActionCommand,
        dice: &mut D,
    ) -> Result<Resolution, MatchError> {
        let side = self.current_side()?;
        let who = self.participant(side).clone();
        self.state.submit_action_with(&who, command, dice)
    }

    fn current_side(&self) -> Result<Side, MatchError> {
        if self.is_over() {
            return Err(MatchError::InvalidPhase {
                operation: "submit an action",
                phase: self.state.phase,
            });
        }
        self.state
            .active
            .ok_or_else(|| MatchError::Internal("local match has no active side".to_string()))
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot::build(&self.state, self.state.active)
    }

    pub fn state(&self) -> &Match {
        &self.state
    }
}

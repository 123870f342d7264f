//! Resolution engine: validates one action against a match and applies it
//!
//! Validation runs completely before the first write, so a rejected action
//! leaves the match untouched.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::combat::{ActionRoll, Dice};
use super::error::MatchError;
use super::r#match::{Match, MatchPhase, ParticipantId, Side};
use super::roster::{ActionKind, HealOutcome};

/// One client action. Indices address the living-members view of a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCommand {
    pub combatant_index: usize,
    pub action_key: String,
    pub target_index: usize,
}

/// What a successful resolution did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub narrative: String,
    pub side: Side,
    pub action: ActionKind,
    pub roll: ActionRoll,
    /// The action ended the match
    pub finished: bool,
}

/// Apply `command` for `participant`. On success the match has advanced to
/// the next turn, or to `Finished` if a side has no living combatants left.
pub fn resolve<D: Dice + ?Sized>(
    state: &mut Match,
    participant: &ParticipantId,
    command: &ActionCommand,
    dice: &mut D,
) -> Result<Resolution, MatchError> {
    if state.phase != MatchPhase::InProgress {
        return Err(MatchError::InvalidPhase {
            operation: "submit an action",
            phase: state.phase,
        });
    }

    let side = state
        .side_of(participant)
        .ok_or_else(|| MatchError::unauthorized("not a participant of this match"))?;
    let active = state
        .active
        .ok_or_else(|| {
            MatchError::Internal("match in progress without an active side".to_string())
        })?;
    if side != active {
        return Err(MatchError::unauthorized("it is not your turn"));
    }

    let (narrative, roll, kind) = {
        let (acting, other) = state.seats_mut(active)?;
        let missing = || MatchError::Internal("match in progress without both teams".to_string());
        let acting_team = acting.team.as_ref().ok_or_else(missing)?;
        let other_team = other.team.as_ref().ok_or_else(missing)?;

        let actor_pos = acting_team
            .living_position(command.combatant_index)
            .ok_or_else(|| {
                MatchError::invalid(format!(
                    "combatant index {} does not address a living member of your team",
                    command.combatant_index
                ))
            })?;
        let actor = &acting_team.combatants[actor_pos];
        let spec = actor.class.action(&command.action_key).ok_or_else(|| {
            MatchError::invalid(format!(
                "'{}' is not an action of {} ({})",
                command.action_key,
                actor.name,
                actor.class.label()
            ))
        })?;

        let target_team = if spec.is_heal() { acting_team } else { other_team };
        let target_pos = target_team
            .living_position(command.target_index)
            .ok_or_else(|| {
                MatchError::invalid(format!(
                    "target index {} does not address a living member of team '{}'",
                    command.target_index, target_team.name
                ))
            })?;

        // All checks passed; from here on nothing fails.
        let roll = ActionRoll::draw(spec, dice);
        let actor_name = actor.name.clone();
        let mut narrative = String::new();
        if roll.critical {
            narrative.push_str("Critical hit! ");
        }

        if spec.is_heal() {
            let team = acting.team.as_mut().ok_or_else(missing)?;
            let target = &mut team.combatants[target_pos];
            match target.heal(roll.amount) {
                HealOutcome::Restored(restored) => {
                    acting.stats.healing_done += u64::from(restored);
                    narrative.push_str(&format!(
                        "{} uses {} on {}: restores {} HP ({}/{} HP).",
                        actor_name,
                        spec.label,
                        target.name,
                        restored,
                        target.health,
                        target.max_health
                    ));
                }
                HealOutcome::Dead => {
                    narrative.push_str(&format!("{} is down and cannot be healed.", target.name));
                }
            }
        } else {
            let team = other.team.as_mut().ok_or_else(missing)?;
            let target = &mut team.combatants[target_pos];
            let hit = target.take_damage(roll.amount);
            acting.stats.damage_dealt += u64::from(roll.amount);
            narrative.push_str(&format!(
                "{} uses {} on {}: {} damage ({} HP left).",
                actor_name, spec.label, target.name, roll.amount, target.health
            ));
            if hit.died {
                other.stats.combatants_lost += 1;
                narrative.push_str(&format!(" {} is down!", target.name));
            }
        }

        if let Some(recoil) = roll.recoil {
            let team = acting.team.as_mut().ok_or_else(missing)?;
            let actor = &mut team.combatants[actor_pos];
            let hit = actor.take_damage(recoil);
            narrative.push_str(&format!(
                " {} takes {} recoil damage ({} HP left).",
                actor.name, recoil, actor.health
            ));
            if hit.died {
                acting.stats.combatants_lost += 1;
                narrative.push_str(&format!(" {} is down!", actor.name));
            }
        }

        (narrative, roll, spec.kind)
    };

    let finished = [Side::Creator, Side::Opponent]
        .into_iter()
        .any(|s| state.team(s).map_or(true, |t| t.is_wiped()));

    let mut narrative = narrative;
    if finished {
        state.phase = MatchPhase::Finished;
        match state.outcome() {
            Some(super::r#match::MatchOutcome::Winner { team, .. }) => {
                narrative.push_str(&format!(" {} wins the match!", team));
            }
            _ => narrative.push_str(" Both squads have fallen."),
        }
    } else {
        state.turn_number += 1;
        state.active = Some(active.other());
    }
    state.last_action = Some(narrative.clone());

    debug!(
        match_id = %state.id,
        side = ?side,
        action = ?kind,
        amount = roll.amount,
        turn = state.turn_number,
        finished,
        "Action resolved"
    );

    Ok(Resolution {
        narrative,
        side,
        action: kind,
        roll,
        finished,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::combat::ScriptedDice;
    use crate::game::r#match::tests::{pid, squad, started};
    use crate::game::r#match::MatchOutcome;
    use crate::game::roster::CombatantClass;

    fn cmd(combatant: usize, key: &str, target: usize) -> ActionCommand {
        ActionCommand {
            combatant_index: combatant,
            action_key: key.to_string(),
            target_index: target,
        }
    }

    fn melee_vs_melee() -> Match {
        started(
            squad("A", CombatantClass::Melee, 100),
            squad("B", CombatantClass::Melee, 100),
        )
    }

    #[test]
    fn fixed_fifty_damage_scenario() {
        let mut m = melee_vs_melee();
        let mut dice = ScriptedDice::new([50]);

        let res = resolve(&mut m, &pid("alice"), &cmd(0, "1", 0), &mut dice).unwrap();

        let target = &m.team(Side::Opponent).unwrap().combatants[0];
        assert_eq!(target.health, 50);
        assert!(target.alive);
        assert_eq!(m.stats(Side::Creator).damage_dealt, 50);
        assert_eq!(m.turn_number, 2);
        assert_eq!(m.active, Some(Side::Opponent));
        assert!(!res.finished);
        assert_eq!(res.narrative, "A 1 uses Basic strike on B 1: 50 damage (50 HP left).");
        assert_eq!(m.last_action.as_deref(), Some(res.narrative.as_str()));
    }

    #[test]
    fn heal_at_full_health_restores_nothing() {
        let mut m = started(
            squad("A", CombatantClass::Support, 90),
            squad("B", CombatantClass::Melee, 100),
        );
        let mut dice = ScriptedDice::new([55]);

        resolve(&mut m, &pid("alice"), &cmd(1, "restoring_heal", 3), &mut dice).unwrap();

        let ally = &m.team(Side::Creator).unwrap().combatants[3];
        assert_eq!(ally.health, 90);
        assert_eq!(m.stats(Side::Creator).healing_done, 0);
        assert_eq!(m.active, Some(Side::Opponent));
    }

    #[test]
    fn heal_targets_wounded_ally() {
        let mut m = started(
            squad("A", CombatantClass::Support, 90),
            squad("B", CombatantClass::Melee, 100),
        );
        resolve(&mut m, &pid("alice"), &cmd(0, "2", 0), &mut ScriptedDice::new([25])).unwrap();
        resolve(&mut m, &pid("bob"), &cmd(0, "1", 2), &mut ScriptedDice::new([40])).unwrap();
        resolve(&mut m, &pid("alice"), &cmd(0, "1", 2), &mut ScriptedDice::new([35])).unwrap();

        let ally = &m.team(Side::Creator).unwrap().combatants[2];
        assert_eq!(ally.health, 85);
        assert_eq!(m.stats(Side::Creator).healing_done, 35);
        assert_eq!(m.stats(Side::Creator).damage_dealt, 25);
        assert_eq!(m.turn_number, 4);
    }

    #[test]
    fn lethal_overkill_clamps_and_counts_one_loss() {
        let mut m = melee_vs_melee();
        m.opponent.as_mut().unwrap().team.as_mut().unwrap().combatants[0].health = 10;

        let res = resolve(
            &mut m,
            &pid("alice"),
            &cmd(0, "1", 0),
            &mut ScriptedDice::new([50]),
        ).unwrap();

        let target = &m.team(Side::Opponent).unwrap().combatants[0];
        assert_eq!(target.health, 0);
        assert!(!target.alive);
        assert_eq!(m.stats(Side::Opponent).combatants_lost, 1);
        assert_eq!(m.stats(Side::Creator).combatants_lost, 0);
        assert!(res.narrative.ends_with("B 1 is down!"));
    }

    #[test]
    fn wrong_turn_is_unauthorized_and_changes_nothing() {
        let mut m = melee_vs_melee();
        let before = format!("{:?}", m);

        let err = resolve(
            &mut m,
            &pid("bob"),
            &cmd(0, "1", 0),
            &mut ScriptedDice::new([50]),
        ).unwrap_err();
        assert_eq!(err.kind(), crate::game::error::ErrorKind::Unauthorized);

        let err = resolve(
            &mut m,
            &pid("eve"),
            &cmd(0, "1", 0),
            &mut ScriptedDice::new([50]),
        ).unwrap_err();
        assert_eq!(err.kind(), crate::game::error::ErrorKind::Unauthorized);
        assert_eq!(format!("{:?}", m), before);
    }

    #[test]
    fn invalid_inputs_leave_state_unchanged() {
        let mut m = melee_vs_melee();
        let before = format!("{:?}", m);

        for bad in [cmd(5, "1", 0), cmd(0, "3", 0), cmd(0, "aimed_shot", 0), cmd(0, "1", 9)] {
            let err = resolve(
                &mut m,
                &pid("alice"),
                &bad,
                &mut ScriptedDice::new([50]),
            ).unwrap_err();
            assert!(matches!(err, MatchError::InvalidInput(_)), "{:?}", bad);
        }
        assert_eq!(format!("{:?}", m), before);
    }

    #[test]
    fn dead_members_drop_out_of_addressing() {
        let mut m = melee_vs_melee();
        {
            let team = m.opponent.as_mut().unwrap().team.as_mut().unwrap();
            team.combatants[0].take_damage(1000);
        }
        resolve(&mut m, &pid("alice"), &cmd(0, "1", 0), &mut ScriptedDice::new([40])).unwrap();

        // living index 0 is now the second roster slot
        let team = m.team(Side::Opponent).unwrap();
        assert_eq!(team.combatants[1].health, 60);
        assert_eq!(team.living_count(), 4);
        assert!(matches!(
            resolve(&mut m, &pid("bob"), &cmd(4, "1", 0), &mut ScriptedDice::new([40])),
            Err(MatchError::InvalidInput(_))
        ));
    }

    #[test]
    fn recoil_can_kill_the_actor() {
        let mut m = melee_vs_melee();
        m.creator.team.as_mut().unwrap().combatants[0].health = 4;

        let res = resolve(
            &mut m,
            &pid("alice"),
            &cmd(0, "heavy_strike", 0),
            &mut ScriptedDice::new([45, 8]),
        ).unwrap();

        let actor = &m.team(Side::Creator).unwrap().combatants[0];
        assert!(!actor.alive);
        assert_eq!(m.stats(Side::Creator).combatants_lost, 1);
        assert_eq!(m.stats(Side::Creator).damage_dealt, 45);
        assert!(res.narrative.contains("takes 8 recoil damage (0 HP left)"));
        assert_eq!(m.team(Side::Opponent).unwrap().combatants[0].health, 55);
    }

    #[test]
    fn wiping_a_side_finishes_without_flipping_turn() {
        let mut m = melee_vs_melee();
        {
            let team = m.opponent.as_mut().unwrap().team.as_mut().unwrap();
            for c in team.combatants.iter_mut().skip(1) {
                c.take_damage(1000);
            }
            team.combatants[0].health = 20;
        }

        let res = resolve(
            &mut m,
            &pid("alice"),
            &cmd(0, "1", 0),
            &mut ScriptedDice::new([35]),
        ).unwrap();
        assert!(res.finished);
        assert_eq!(m.phase, MatchPhase::Finished);
        assert_eq!(m.active, Some(Side::Creator));
        assert_eq!(m.turn_number, 1);
        assert_eq!(
            m.outcome(),
            Some(MatchOutcome::Winner { side: Side::Creator, team: "A".to_string() })
        );
        assert!(res.narrative.ends_with("A wins the match!"));

        for who in ["alice", "bob"] {
            let err = resolve(
                &mut m,
                &pid(who),
                &cmd(0, "1", 0),
                &mut ScriptedDice::new([35]),
            ).unwrap_err();
            assert!(matches!(err, MatchError::InvalidPhase { phase: MatchPhase::Finished, .. }));
        }
    }

    #[test]
    fn mutual_wipe_is_a_draw() {
        let mut m = melee_vs_melee();
        {
            let (mine, theirs) = m.seats_mut(Side::Creator).unwrap();
            for team in [mine.team.as_mut().unwrap(), theirs.team.as_mut().unwrap()] {
                for c in team.combatants.iter_mut().skip(1) {
                    c.take_damage(1000);
                }
                team.combatants[0].health = 3;
            }
        }

        let res = resolve(
            &mut m,
            &pid("alice"),
            &cmd(0, "2", 0),
            &mut ScriptedDice::new([45, 3]),
        ).unwrap();
        assert!(res.finished);
        assert_eq!(m.outcome(), Some(MatchOutcome::Draw));
    }

    #[test]
    fn critical_shot_is_annotated() {
        let mut m = started(
            squad("A", CombatantClass::Ranged, 85),
            squad("B", CombatantClass::Melee, 130),
        );
        let mut dice = ScriptedDice::new([80]).with_chances([true]);
        let res = resolve(&mut m, &pid("alice"), &cmd(2, "2", 1), &mut dice).unwrap();

        assert!(res.roll.critical);
        assert_eq!(res.roll.amount, 120);
        assert!(res
            .narrative
            .starts_with("Critical hit! A 3 uses Aimed shot on B 2: 120 damage (10 HP left)."));
        assert_eq!(m.stats(Side::Creator).damage_dealt, 120);
    }

    #[test]
    fn actions_before_start_are_invalid_phase() {
        let mut m = Match::new("x".into(), pid("alice"), 1);
        let err = resolve(
            &mut m,
            &pid("alice"),
            &cmd(0, "1", 0),
            &mut ScriptedDice::default(),
        ).unwrap_err();
        assert!(matches!(
            err,
            MatchError::InvalidPhase {
                phase: MatchPhase::AwaitingOpponent,
                ..
            }
        ));
    }
}

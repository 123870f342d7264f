//! Combatants, teams and the per-class action table

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::error::MatchError;

/// Fixed squad size
pub const TEAM_SIZE: usize = 5;

/// Upper bound accepted for a submitted combatant's max health
pub const MAX_HEALTH_LIMIT: u32 = 500;

const MAX_NAME_LEN: usize = 48;

/// Combatant classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatantClass {
    /// Close-quarters bruiser
    #[serde(alias = "Warrior", alias = "warrior")]
    Melee,
    /// Healer with a light attack
    #[serde(alias = "Druide", alias = "druid")]
    Support,
    /// Bow user, highest burst
    #[serde(alias = "Archer", alias = "archer")]
    Ranged,
}

impl CombatantClass {
    pub const ALL: [CombatantClass; 3] = [
        CombatantClass::Melee,
        CombatantClass::Support,
        CombatantClass::Ranged,
    ];

    pub fn default_max_health(self) -> u32 {
        match self {
            CombatantClass::Melee => 130,
            CombatantClass::Support => 90,
            CombatantClass::Ranged => 85,
        }
    }

    /// The class's two actions, in slot order ("1", "2")
    pub fn actions(self) -> &'static [ActionSpec; 2] {
        match self {
            CombatantClass::Melee => &MELEE_ACTIONS,
            CombatantClass::Support => &SUPPORT_ACTIONS,
            CombatantClass::Ranged => &RANGED_ACTIONS,
        }
    }

    /// Look up an action by slot key ("1"/"2") or slug. Only this class's actions match.
    pub fn action(self, key: &str) -> Option<&'static ActionSpec> {
        let actions = self.actions();
        match key.trim() {
            "1" => Some(&actions[0]),
            "2" => Some(&actions[1]),
            other => actions.iter().find(|a| a.kind.slug() == other),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CombatantClass::Melee => "Melee",
            CombatantClass::Support => "Support",
            CombatantClass::Ranged => "Ranged",
        }
    }
}

/// Closed set of actions across all classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    BasicStrike,
    HeavyStrike,
    RestoringHeal,
    NatureStrike,
    QuickShot,
    AimedShot,
}

impl ActionKind {
    pub fn slug(self) -> &'static str {
        match self {
            ActionKind::BasicStrike => "basic_strike",
            ActionKind::HeavyStrike => "heavy_strike",
            ActionKind::RestoringHeal => "restoring_heal",
            ActionKind::NatureStrike => "nature_strike",
            ActionKind::QuickShot => "quick_shot",
            ActionKind::AimedShot => "aimed_shot",
        }
    }
}

/// Which side an action's target is picked from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSide {
    Ally,
    Enemy,
}

/// Inclusive integer range a magnitude is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Magnitude {
    pub min: u32,
    pub max: u32,
}

impl Magnitude {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

/// Chance to scale an attack's damage, e.g. 30% for +50%
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Critical {
    pub chance: f64,
    /// Final damage is `amount * multiplier_percent / 100`, rounded down
    pub multiplier_percent: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionSpec {
    pub kind: ActionKind,
    pub label: &'static str,
    pub target: TargetSide,
    pub magnitude: Magnitude,
    /// Damage the actor inflicts on itself
    pub recoil: Option<Magnitude>,
    pub critical: Option<Critical>,
}

impl ActionSpec {
    pub fn is_heal(&self) -> bool {
        self.target == TargetSide::Ally
    }
}

static MELEE_ACTIONS: [ActionSpec; 2] = [
    ActionSpec {
        kind: ActionKind::BasicStrike,
        label: "Basic strike",
        target: TargetSide::Enemy,
        magnitude: Magnitude::new(35, 50),
        recoil: None,
        critical: None,
    },
    ActionSpec {
        kind: ActionKind::HeavyStrike,
        label: "Heavy strike",
        target: TargetSide::Enemy,
        magnitude: Magnitude::new(45, 60),
        recoil: Some(Magnitude::new(3, 8)),
        critical: None,
    },
];

static SUPPORT_ACTIONS: [ActionSpec; 2] = [
    ActionSpec {
        kind: ActionKind::RestoringHeal,
        label: "Restoring heal",
        target: TargetSide::Ally,
        magnitude: Magnitude::new(35, 55),
        recoil: None,
        critical: None,
    },
    ActionSpec {
        kind: ActionKind::NatureStrike,
        label: "Nature strike",
        target: TargetSide::Enemy,
        magnitude: Magnitude::new(25, 40),
        recoil: None,
        critical: None,
    },
];

static RANGED_ACTIONS: [ActionSpec; 2] = [
    ActionSpec {
        kind: ActionKind::QuickShot,
        label: "Quick shot",
        target: TargetSide::Enemy,
        magnitude: Magnitude::new(50, 70),
        recoil: None,
        critical: None,
    },
    ActionSpec {
        kind: ActionKind::AimedShot,
        label: "Aimed shot",
        target: TargetSide::Enemy,
        magnitude: Magnitude::new(60, 80),
        recoil: None,
        critical: Some(Critical {
            chance: 0.3,
            multiplier_percent: 150,
        }),
    },
];

/// A single fighter. `alive` is kept equal to `health > 0` by every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combatant {
    pub name: String,
    pub class: CombatantClass,
    pub max_health: u32,
    pub health: u32,
    pub alive: bool,
    /// Cosmetic only
    pub item: String,
}

/// Result of applying damage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageOutcome {
    /// Health actually removed
    pub removed: u32,
    /// True only on the transition from alive to dead
    pub died: bool,
}

/// Result of applying healing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealOutcome {
    /// Health actually restored (0 when already at max)
    Restored(u32),
    /// Dead combatants cannot be healed
    Dead,
}

impl Combatant {
    pub fn new(name: impl Into<String>, class: CombatantClass, max_health: u32) -> Self {
        Self {
            name: name.into(),
            class,
            max_health,
            health: max_health,
            alive: max_health > 0,
            item: "standard issue".to_string(),
        }
    }

    pub fn with_item(mut self, item: impl Into<String>) -> Self {
        self.item = item.into();
        self
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn take_damage(&mut self, amount: u32) -> DamageOutcome {
        if !self.alive {
            return DamageOutcome {
                removed: 0,
                died: false,
            };
        }
        let removed = amount.min(self.health);
        self.health -= removed;
        let died = self.health == 0;
        if died {
            self.alive = false;
        }
        DamageOutcome { removed, died }
    }

    pub fn heal(&mut self, amount: u32) -> HealOutcome {
        if !self.alive {
            return HealOutcome::Dead;
        }
        let restored = amount.min(self.max_health - self.health);
        self.health += restored;
        HealOutcome::Restored(restored)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    pub combatants: Vec<Combatant>,
}

impl Team {
    /// Living members in roster order
    pub fn living(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.iter().filter(|c| c.alive)
    }

    pub fn living_count(&self) -> usize {
        self.living().count()
    }

    pub fn is_wiped(&self) -> bool {
        self.living_count() == 0
    }

    /// Roster position of the `index`-th living member
    pub fn living_position(&self, index: usize) -> Option<usize> {
        self.combatants
            .iter()
            .enumerate()
            .filter(|(_, c)| c.alive)
            .nth(index)
            .map(|(pos, _)| pos)
    }
}

/// A team as submitted by a client, before validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamDraft {
    pub name: String,
    pub combatants: Vec<CombatantDraft>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatantDraft {
    pub name: String,
    pub class: CombatantClass,
    /// Falls back to the class default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_health: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,
}

impl TeamDraft {
    /// Validate and build a fresh, full-health team
    pub fn build(&self) -> Result<Team, MatchError> {
        let name = checked_name(&self.name, "team name")?;

        if self.combatants.len() != TEAM_SIZE {
            return Err(MatchError::invalid(format!(
                "a team needs exactly {} combatants, got {}",
                TEAM_SIZE,
                self.combatants.len()
            )));
        }

        let mut seen = HashSet::with_capacity(TEAM_SIZE);
        let mut combatants = Vec::with_capacity(TEAM_SIZE);
        for draft in &self.combatants {
            let cname = checked_name(&draft.name, "combatant name")?;
            if !seen.insert(cname.clone()) {
                return Err(MatchError::invalid(format!(
                    "duplicate combatant name '{}' in team '{}'",
                    cname, name
                )));
            }

            let max_health = draft
                .max_health
                .unwrap_or_else(|| draft.class.default_max_health());
            if !(1..=MAX_HEALTH_LIMIT).contains(&max_health) {
                return Err(MatchError::invalid(format!(
                    "max health of '{}' must be between 1 and {}",
                    cname, MAX_HEALTH_LIMIT
                )));
            }

            let mut combatant = Combatant::new(cname, draft.class, max_health);
            if let Some(item) = draft.item.as_deref().map(str::trim).filter(|i| !i.is_empty()) {
                combatant.item = item.to_string();
            }
            combatants.push(combatant);
        }

        Ok(Team { name, combatants })
    }
}

fn checked_name(raw: &str, what: &str) -> Result<String, MatchError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(MatchError::invalid(format!("{} must not be empty", what)));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(MatchError::invalid(format!(
            "{} is longer than {} characters",
            what, MAX_NAME_LEN
        )));
    }
    Ok(name.to_string())
}

fn draft(name: &str, class: CombatantClass, item: &str) -> CombatantDraft {
    CombatantDraft {
        name: name.to_string(),
        class,
        max_health: None,
        item: Some(item.to_string()),
    }
}

/// The two stock squads offered to players
pub fn preset_squads() -> Vec<TeamDraft> {
    use CombatantClass::*;
    vec![
        TeamDraft {
            name: "4 Fantastiques et Demi".to_string(),
            combatants: vec![
                draft("Tic-Tac Man", Melee, "tronc"),
                draft("UK", Melee, "crâne"),
                draft("Tony Start", Melee, "pile électrique"),
                draft("Sbaver-Man", Support, "salive"),
                draft("L'oeil de con", Ranged, "arc"),
            ],
        },
        TeamDraft {
            name: "Pilules Bleues".to_string(),
            combatants: vec![
                draft("Natasha", Support, "bouche"),
                draft("Collette", Support, "seringue"),
                draft("Dr. Colon", Melee, "coloscope"),
                draft("Bruno le Clown", Ranged, "ballon"),
                draft("Dr. Morbide", Melee, "mains"),
            ],
        },
    ]
}

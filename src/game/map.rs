//! Arena maps a match can be played on

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The fixed set of arenas. Chosen once per match by its creator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArenaMap {
    #[serde(rename = "Hôpital Sainte Dérive")]
    SainteDeriveHospital,
    #[serde(rename = "Carrefour Saint-Sever")]
    SaintSeverCrossroads,
    #[serde(rename = "Quartier Yvetot")]
    YvetotQuarter,
    #[serde(rename = "Restaurant Flunch")]
    FlunchRestaurant,
}

impl ArenaMap {
    pub const ALL: [ArenaMap; 4] = [
        ArenaMap::SainteDeriveHospital,
        ArenaMap::SaintSeverCrossroads,
        ArenaMap::YvetotQuarter,
        ArenaMap::FlunchRestaurant,
    ];

    /// Display name, also the wire representation
    pub fn name(self) -> &'static str {
        match self {
            ArenaMap::SainteDeriveHospital => "Hôpital Sainte Dérive",
            ArenaMap::SaintSeverCrossroads => "Carrefour Saint-Sever",
            ArenaMap::YvetotQuarter => "Quartier Yvetot",
            ArenaMap::FlunchRestaurant => "Restaurant Flunch",
        }
    }

    /// Short ASCII key accepted as an alternative to the display name
    pub fn slug(self) -> &'static str {
        match self {
            ArenaMap::SainteDeriveHospital => "hospital",
            ArenaMap::SaintSeverCrossroads => "crossroads",
            ArenaMap::YvetotQuarter => "yvetot",
            ArenaMap::FlunchRestaurant => "restaurant",
        }
    }
}

impl fmt::Display for ArenaMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown map '{0}'")]
pub struct UnknownMap(pub String);

impl FromStr for ArenaMap {
    type Err = UnknownMap;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ArenaMap::ALL
            .into_iter()
            .find(|m| m.name() == wanted || m.slug().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownMap(s.to_string()))
    }
}

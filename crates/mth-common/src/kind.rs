//! Entity kinds of the survey hierarchy.
//!
//! The hierarchy is a strict tree:
//!
//! ```text
//! Survey
//! ├── Stations ── Station ── Run ── Channel (Electric | Magnetic | Auxiliary)
//! ├── Standards
//! ├── Filters
//! └── Reports
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// The closed set of entity kinds an archive node can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Survey,
    /// The collection node holding every station.
    Stations,
    Station,
    Run,
    Electric,
    Magnetic,
    Auxiliary,
    Standards,
    Filters,
    Reports,
}

impl EntityKind {
    /// All kinds, in hierarchy order.
    pub const ALL: [EntityKind; 10] = [
        EntityKind::Survey,
        EntityKind::Stations,
        EntityKind::Station,
        EntityKind::Run,
        EntityKind::Electric,
        EntityKind::Magnetic,
        EntityKind::Auxiliary,
        EntityKind::Standards,
        EntityKind::Filters,
        EntityKind::Reports,
    ];

    /// Tag stored in the `entity_kind` base attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Survey => "Survey",
            EntityKind::Stations => "Stations",
            EntityKind::Station => "Station",
            EntityKind::Run => "Run",
            EntityKind::Electric => "Electric",
            EntityKind::Magnetic => "Magnetic",
            EntityKind::Auxiliary => "Auxiliary",
            EntityKind::Standards => "Standards",
            EntityKind::Filters => "Filters",
            EntityKind::Reports => "Reports",
        }
    }

    /// Sections of the standards catalogue that make up this kind's schema.
    ///
    /// Channel kinds share the `channel` section and add their own. Kinds with
    /// no sections only carry the two base attributes.
    pub fn schema_sections(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Survey => &["survey"],
            EntityKind::Station => &["station"],
            EntityKind::Run => &["run"],
            EntityKind::Electric => &["channel", "electric"],
            EntityKind::Magnetic => &["channel", "magnetic"],
            EntityKind::Auxiliary => &["channel", "auxiliary"],
            EntityKind::Stations
            | EntityKind::Standards
            | EntityKind::Filters
            | EntityKind::Reports => &[],
        }
    }

    /// The channel kind, if this is a channel leaf.
    pub fn channel_kind(&self) -> Option<ChannelKind> {
        match self {
            EntityKind::Electric => Some(ChannelKind::Electric),
            EntityKind::Magnetic => Some(ChannelKind::Magnetic),
            EntityKind::Auxiliary => Some(ChannelKind::Auxiliary),
            _ => None,
        }
    }

    /// Whether nodes of this kind are leaf datasets rather than groups.
    pub fn is_channel(&self) -> bool {
        self.channel_kind().is_some()
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::coercion("entity_kind", "entity kind", s))
    }
}

/// The closed set of channel kinds recorded in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Electric,
    Magnetic,
    Auxiliary,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Electric => "electric",
            ChannelKind::Magnetic => "magnetic",
            ChannelKind::Auxiliary => "auxiliary",
        }
    }

    pub fn entity_kind(&self) -> EntityKind {
        match self {
            ChannelKind::Electric => EntityKind::Electric,
            ChannelKind::Magnetic => EntityKind::Magnetic,
            ChannelKind::Auxiliary => EntityKind::Auxiliary,
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ChannelKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "electric" => Ok(ChannelKind::Electric),
            "magnetic" => Ok(ChannelKind::Magnetic),
            "auxiliary" => Ok(ChannelKind::Auxiliary),
            _ => Err(Error::coercion(
                "type",
                "one of [ electric | magnetic | auxiliary ]",
                s,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_kind_roundtrips_through_tag() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.as_str().parse::<EntityKind>().unwrap(), kind);
        }
    }

    #[test]
    fn channel_kinds_share_channel_section() {
        for kind in [EntityKind::Electric, EntityKind::Magnetic, EntityKind::Auxiliary] {
            assert_eq!(kind.schema_sections()[0], "channel");
            assert!(kind.is_channel());
        }
        assert!(!EntityKind::Run.is_channel());
    }

    #[test]
    fn channel_kind_parse_is_case_insensitive() {
        assert_eq!("Magnetic".parse::<ChannelKind>().unwrap(), ChannelKind::Magnetic);
        assert_eq!(" ELECTRIC ".parse::<ChannelKind>().unwrap(), ChannelKind::Electric);
    }

    #[test]
    fn channel_kind_rejects_unknown() {
        let err = "seismic".parse::<ChannelKind>().unwrap_err();
        assert_eq!(err.code(), 11);
    }
}

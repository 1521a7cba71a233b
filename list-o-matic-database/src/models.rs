//! The persisted shape of every talking list.
//!
//! Child entities are stored in maps keyed by their id, the value structs never
//! repeat it. A [`Contribution`] keeps a copy of the [`Application`] that started
//! it, so the application id is gone once the application has been consumed.

use alloc::collections::BTreeMap;
use core::fmt;
use core::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Every talking list known to the application, keyed by list id.
pub type TalkingLists = BTreeMap<Uuid, TalkingList>;

/// Who may see a talking list without privileges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Visibility {
    /// Only privileged callers.
    #[default]
    Private,
    /// Everybody who knows the id.
    Unlisted,
    /// Everybody, including the public overview.
    Public,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidVisibility(pub u8);

impl fmt::Display for InvalidVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "visibility {} is unknown, expected 0 (private), 1 (unlisted) or 2 (public)",
            self.0
        )
    }
}

impl core::error::Error for InvalidVisibility {}

impl TryFrom<u8> for Visibility {
    type Error = InvalidVisibility;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Private),
            1 => Ok(Self::Unlisted),
            2 => Ok(Self::Public),
            other => Err(InvalidVisibility(other)),
        }
    }
}

impl From<Visibility> for u8 {
    fn from(value: Visibility) -> Self {
        match value {
            Visibility::Private => 0,
            Visibility::Unlisted => 1,
            Visibility::Public => 2,
        }
    }
}

/// A request of a person to speak.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub name: String,
}

/// A group of speakers, e.g. one side of a debate.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    #[serde(default)]
    pub applications: BTreeMap<Uuid, Application>,
}

impl Group {
    #[must_use]
    pub const fn new(name: String) -> Self {
        Self {
            name,
            applications: BTreeMap::new(),
        }
    }
}

/// A speaking turn, either running or finished.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    pub in_progress: bool,
    #[serde(default)]
    pub application: Option<Application>,
    #[serde(default)]
    pub group_uuid: Option<Uuid>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Only set once the contribution is finished.
    #[serde(default, with = "nanoseconds")]
    pub duration: Option<Duration>,
}

/// A person attending the event. Not involved in scheduling.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub given_name: String,
    pub sur_name: String,
    pub degree: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail: Option<String>,
}

/// An event people may talk at.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalkingList {
    pub name: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub groups: BTreeMap<Uuid, Group>,
    #[serde(default)]
    pub attendees: BTreeMap<Uuid, Attendee>,
    #[serde(default)]
    pub current_contribution: Contribution,
    #[serde(default)]
    pub past_contributions: Vec<Contribution>,
}

impl TalkingList {
    #[must_use]
    pub fn new(name: String, visibility: Visibility) -> Self {
        Self {
            name,
            visibility,
            ..Self::default()
        }
    }

    /// Every id this list refers to: its groups, applications and attendees, plus
    /// the groups its contributions were made in, even if those are gone by now.
    pub fn ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        let groups = self.groups.iter().flat_map(|(id, group)| {
            core::iter::once(*id).chain(group.applications.keys().copied())
        });
        let contributions = self
            .past_contributions
            .iter()
            .chain(core::iter::once(&self.current_contribution))
            .filter_map(|contribution| contribution.group_uuid);
        groups
            .chain(self.attendees.keys().copied())
            .chain(contributions)
    }
}

/// Durations are stored as integer nanoseconds.
mod nanoseconds {
    use core::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[allow(clippy::ref_option, reason = "signature required by serde(with)")]
    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value
            .map(|duration| u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX))
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_nanos))
    }
}

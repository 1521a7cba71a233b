use alloc::collections::BTreeMap;
use core::time::Duration;

use list_o_matic_database::models::{Contribution, Group};
use serde::{Serialize, Serializer};
use uuid::Uuid;

/// How the speaking time of a list was shared between its groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TimeDistribution {
    #[serde(serialize_with = "nanoseconds_map")]
    pub time_share: BTreeMap<Uuid, Duration>,
    pub number_contributions: BTreeMap<Uuid, u64>,
    #[serde(serialize_with = "nanoseconds")]
    pub total_time: Duration,
}

impl TimeDistribution {
    /// Every existing group shows up, even without contributions. Contributions of
    /// deleted groups still count towards the total time.
    #[must_use]
    pub fn new(groups: &BTreeMap<Uuid, Group>, past_contributions: &[Contribution]) -> Self {
        let mut distribution = Self {
            time_share: groups.keys().map(|id| (*id, Duration::ZERO)).collect(),
            number_contributions: groups.keys().map(|id| (*id, 0)).collect(),
            total_time: Duration::ZERO,
        };
        for contribution in past_contributions {
            let duration = contribution.duration.unwrap_or_default();
            distribution.total_time += duration;
            let Some(group) = contribution.group_uuid else {
                continue;
            };
            if let Some(time_share) = distribution.time_share.get_mut(&group) {
                *time_share += duration;
            }
            if let Some(count) = distribution.number_contributions.get_mut(&group) {
                *count += 1;
            }
        }
        distribution
    }

    /// Share of `group` in percent, floored to two decimal places.
    #[must_use]
    pub fn relative_share(&self, group: &Uuid) -> f64 {
        let total = self.total_time.as_nanos();
        if total == 0 {
            return 0.0;
        }
        let share = self.time_share.get(group).map_or(0, Duration::as_nanos);
        // hundredths of a percent, floored in integers so exact shares stay exact
        let basis_points = u32::try_from(share * 10_000 / total).unwrap_or(u32::MAX);
        f64::from(basis_points) / 100.0
    }
}

fn nanoseconds<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX))
}

fn nanoseconds_map<S: Serializer>(
    map: &BTreeMap<Uuid, Duration>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(
        map.iter()
            .map(|(id, duration)| (id, u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX))),
    )
}

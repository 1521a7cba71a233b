//! Who is speaking right now.
//!
//! A list is either idle or has exactly one contribution in progress, which then is
//! always the current contribution. Starting a contribution while another one runs
//! finishes the running one first.

use chrono::{DateTime, Utc};
use list_o_matic_database::models::{Contribution, TalkingList};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ContributionError {
    #[error("group {0} does not exist")]
    UnknownGroup(Uuid),
    #[error("application {application} does not exist in group {group}")]
    UnknownApplication { group: Uuid, application: Uuid },
}

pub trait ContributionExt {
    /// Consumes the application and makes it the current contribution.
    ///
    /// The application is removed from its group, so its id can't be resolved
    /// afterwards. The contribution keeps a copy of it.
    fn start_contribution(
        &mut self,
        group: Uuid,
        application: Uuid,
        now: DateTime<Utc>,
    ) -> Result<&Contribution, ContributionError>;

    /// Moves the running contribution into the history. Returns what was finished,
    /// `None` if nobody was speaking.
    fn stop_contribution(&mut self, now: DateTime<Utc>) -> Option<&Contribution>;

    /// Forgets the history but keeps the current contribution.
    fn reset_past_contributions(&mut self);
}

impl ContributionExt for TalkingList {
    fn start_contribution(
        &mut self,
        group: Uuid,
        application: Uuid,
        now: DateTime<Utc>,
    ) -> Result<&Contribution, ContributionError> {
        let snapshot = self
            .groups
            .get(&group)
            .ok_or(ContributionError::UnknownGroup(group))?
            .applications
            .get(&application)
            .ok_or(ContributionError::UnknownApplication { group, application })?
            .clone();

        // nothing below can fail anymore
        self.stop_contribution(now);
        if let Some(group) = self.groups.get_mut(&group) {
            group.applications.remove(&application);
        }
        self.current_contribution = Contribution {
            in_progress: true,
            application: Some(snapshot),
            group_uuid: Some(group),
            start_time: Some(now),
            end_time: None,
            duration: None,
        };
        Ok(&self.current_contribution)
    }

    fn stop_contribution(&mut self, now: DateTime<Utc>) -> Option<&Contribution> {
        if !self.current_contribution.in_progress {
            return None;
        }
        let current = &mut self.current_contribution;
        let start = current.start_time.unwrap_or(now);
        current.in_progress = false;
        current.end_time = Some(now);
        // a clock that went backwards yields an empty contribution
        current.duration = Some((now - start).to_std().unwrap_or_default());
        self.past_contributions.push(current.clone());
        self.past_contributions.last()
    }

    fn reset_past_contributions(&mut self) {
        self.past_contributions.clear();
    }
}

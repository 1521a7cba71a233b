//! The in-memory home of every talking list.
//!
//! Each list sits behind its own mutex, the map of lists is only locked exclusively
//! while a list is added or removed. The map lock is never acquired while a list
//! mutex is held. Every id ever issued or loaded is remembered, so an id is never
//! handed out twice, not even after its owner was deleted. After every successful
//! mutation the whole registry is written to the [`SnapshotStore`], failures there
//! are logged and otherwise ignored.

use alloc::collections::BTreeMap;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

use list_o_matic_database::models::{
    Application, Attendee, Contribution, Group, InvalidVisibility, TalkingList, TalkingLists,
    Visibility,
};
use list_o_matic_database::SnapshotStore;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::access::Caller;
use crate::clock::{Clock, SystemClock};
use crate::contribution::{ContributionError, ContributionExt as _};
use crate::ids::{fresh_id, IdGenerator, RandomIds};
use crate::report;
use crate::time_distribution::TimeDistribution;

pub const DEFAULT_GROUP_NAME: &str = "Redner";

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("talking list {0} does not exist")]
    ListNotFound(Uuid),
    #[error("group {0} does not exist")]
    GroupNotFound(Uuid),
    #[error("application {0} does not exist")]
    ApplicationNotFound(Uuid),
    #[error("attendee {0} does not exist")]
    AttendeeNotFound(Uuid),
    #[error("{0} must not be empty")]
    EmptyName(&'static str),
    #[error(transparent)]
    InvalidVisibility(#[from] InvalidVisibility),
    #[error(transparent)]
    Contribution(#[from] ContributionError),
    #[error("a talking list lock was poisoned")]
    Poisoned,
}

type SharedList = Arc<Mutex<TalkingList>>;

pub struct Registry {
    lists: RwLock<HashMap<Uuid, SharedList>>,
    store: Arc<dyn SnapshotStore>,
    ids: Box<dyn IdGenerator>,
    // taken last, nothing else is locked while holding it
    issued: Mutex<HashSet<Uuid>>,
    clock: Box<dyn Clock>,
    default_group_name: String,
    // serializes saves so a later snapshot is never overwritten by an older one
    persist_lock: Mutex<()>,
}

impl Registry {
    /// An empty registry writing through to `store`.
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self::with_lists(store, TalkingLists::new())
    }

    /// Restores the registry from `store`. Starts empty if that fails.
    pub fn load(store: Arc<dyn SnapshotStore>) -> Self {
        let lists = match store.load() {
            Ok(lists) => {
                info!("restored {} talking lists", lists.len());
                lists
            }
            Err(err) => {
                warn!("starting with an empty registry, failed to load talking lists: {err}");
                TalkingLists::new()
            }
        };
        Self::with_lists(store, lists)
    }

    fn with_lists(store: Arc<dyn SnapshotStore>, lists: TalkingLists) -> Self {
        let issued = lists
            .iter()
            .flat_map(|(id, list)| core::iter::once(*id).chain(list.ids()))
            .collect();
        Self {
            lists: RwLock::new(
                lists
                    .into_iter()
                    .map(|(id, list)| (id, Arc::new(Mutex::new(list))))
                    .collect(),
            ),
            store,
            ids: Box::new(RandomIds),
            issued: Mutex::new(issued),
            clock: Box::new(SystemClock),
            default_group_name: DEFAULT_GROUP_NAME.to_owned(),
            persist_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn with_ids(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    #[must_use]
    pub fn with_default_group_name(mut self, name: impl Into<String>) -> Self {
        self.default_group_name = name.into();
        self
    }

    fn new_id(&self) -> Result<Uuid, RegistryError> {
        let mut issued = self.issued.lock().map_err(|_| RegistryError::Poisoned)?;
        let id = fresh_id(&*self.ids, |id| issued.contains(id));
        issued.insert(id);
        Ok(id)
    }

    fn shared_list(&self, id: Uuid) -> Result<SharedList, RegistryError> {
        self.lists
            .read()
            .map_err(|_| RegistryError::Poisoned)?
            .get(&id)
            .cloned()
            .ok_or(RegistryError::ListNotFound(id))
    }

    fn all_lists(&self) -> Result<Vec<(Uuid, SharedList)>, RegistryError> {
        Ok(self
            .lists
            .read()
            .map_err(|_| RegistryError::Poisoned)?
            .iter()
            .map(|(id, list)| (*id, Arc::clone(list)))
            .collect())
    }

    /// Runs `read` on the list if `caller` may see it. Hidden lists look like missing ones.
    fn read<T>(
        &self,
        id: Uuid,
        caller: Caller,
        read: impl FnOnce(&TalkingList) -> Result<T, RegistryError>,
    ) -> Result<T, RegistryError> {
        let list = self.shared_list(id)?;
        let list = list.lock().map_err(|_| RegistryError::Poisoned)?;
        if !caller.can_read(list.visibility) {
            return Err(RegistryError::ListNotFound(id));
        }
        read(&list)
    }

    /// Runs `mutate` on the list and persists afterwards if it succeeded.
    fn mutate<T>(
        &self,
        id: Uuid,
        caller: Caller,
        mutate: impl FnOnce(&mut TalkingList) -> Result<T, RegistryError>,
    ) -> Result<T, RegistryError> {
        let result = {
            let list = self.shared_list(id)?;
            let mut list = list.lock().map_err(|_| RegistryError::Poisoned)?;
            if !caller.can_read(list.visibility) {
                return Err(RegistryError::ListNotFound(id));
            }
            mutate(&mut list)?
        };
        self.persist();
        Ok(result)
    }

    /// Writes the whole registry to the store. Errors only end up in the log.
    fn persist(&self) {
        let Ok(_guard) = self.persist_lock.lock() else {
            error!("not persisting talking lists, the persistence lock is poisoned");
            return;
        };
        let snapshot = match self.snapshot() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                error!("failed to take a snapshot of the talking lists: {err}");
                return;
            }
        };
        if let Err(err) = self.store.save(&snapshot) {
            error!("failed to persist talking lists: {err}");
        }
    }

    /// A copy of every list, independent of visibility.
    pub fn snapshot(&self) -> Result<TalkingLists, RegistryError> {
        self.all_lists()?
            .into_iter()
            .map(|(id, list)| {
                let list = list.lock().map_err(|_| RegistryError::Poisoned)?;
                Ok((id, list.clone()))
            })
            .collect()
    }

    pub fn create_list(&self, name: &str, visibility: Visibility) -> Result<Uuid, RegistryError> {
        let name = non_empty("name", name)?;
        let id = {
            let mut lists = self.lists.write().map_err(|_| RegistryError::Poisoned)?;
            let id = self.new_id()?;
            let mut list = TalkingList::new(name, visibility);
            let group = self.new_id()?;
            list.groups
                .insert(group, Group::new(self.default_group_name.clone()));
            lists.insert(id, Arc::new(Mutex::new(list)));
            id
        };
        debug!(list = %id, "created talking list");
        self.persist();
        Ok(id)
    }

    pub fn get_list(&self, id: Uuid, caller: Caller) -> Result<TalkingList, RegistryError> {
        self.read(id, caller, |list| Ok(list.clone()))
    }

    /// Every list `caller` may see in an overview.
    pub fn list_all(&self, caller: Caller) -> Result<TalkingLists, RegistryError> {
        let mut visible = TalkingLists::new();
        for (id, list) in self.all_lists()? {
            let list = list.lock().map_err(|_| RegistryError::Poisoned)?;
            if caller.can_list(list.visibility) {
                visible.insert(id, list.clone());
            }
        }
        Ok(visible)
    }

    pub fn delete_list(&self, id: Uuid) -> Result<(), RegistryError> {
        self.lists
            .write()
            .map_err(|_| RegistryError::Poisoned)?
            .remove(&id)
            .ok_or(RegistryError::ListNotFound(id))?;
        debug!(list = %id, "deleted talking list");
        self.persist();
        Ok(())
    }

    pub fn set_visibility(&self, id: Uuid, visibility: Visibility) -> Result<(), RegistryError> {
        self.mutate(id, Caller::Privileged, |list| {
            list.visibility = visibility;
            debug!(list = %id, ?visibility, "changed visibility");
            Ok(())
        })
    }

    pub fn create_group(&self, list_id: Uuid, name: &str) -> Result<Uuid, RegistryError> {
        let name = non_empty("name", name)?;
        self.mutate(list_id, Caller::Privileged, |list| {
            let id = self.new_id()?;
            list.groups.insert(id, Group::new(name));
            debug!(list = %list_id, group = %id, "created group");
            Ok(id)
        })
    }

    /// Pending applications of the group are discarded. A running contribution of the
    /// group keeps going.
    pub fn delete_group(&self, list_id: Uuid, group_id: Uuid) -> Result<(), RegistryError> {
        self.mutate(list_id, Caller::Privileged, |list| {
            list.groups
                .remove(&group_id)
                .ok_or(RegistryError::GroupNotFound(group_id))?;
            debug!(list = %list_id, group = %group_id, "deleted group");
            Ok(())
        })
    }

    pub fn groups(
        &self,
        list_id: Uuid,
        caller: Caller,
    ) -> Result<BTreeMap<Uuid, Group>, RegistryError> {
        self.read(list_id, caller, |list| Ok(list.groups.clone()))
    }

    pub fn group(
        &self,
        list_id: Uuid,
        group_id: Uuid,
        caller: Caller,
    ) -> Result<Group, RegistryError> {
        self.read(list_id, caller, |list| {
            list.groups
                .get(&group_id)
                .cloned()
                .ok_or(RegistryError::GroupNotFound(group_id))
        })
    }

    pub fn create_application(
        &self,
        list_id: Uuid,
        group_id: Uuid,
        name: &str,
        caller: Caller,
    ) -> Result<Uuid, RegistryError> {
        let name = non_empty("name", name)?;
        self.mutate(list_id, caller, |list| {
            let id = self.new_id()?;
            list.groups
                .get_mut(&group_id)
                .ok_or(RegistryError::GroupNotFound(group_id))?
                .applications
                .insert(id, Application { name });
            debug!(list = %list_id, group = %group_id, application = %id, "created application");
            Ok(id)
        })
    }

    pub fn delete_application(
        &self,
        list_id: Uuid,
        group_id: Uuid,
        application_id: Uuid,
        caller: Caller,
    ) -> Result<(), RegistryError> {
        self.mutate(list_id, caller, |list| {
            list.groups
                .get_mut(&group_id)
                .ok_or(RegistryError::GroupNotFound(group_id))?
                .applications
                .remove(&application_id)
                .ok_or(RegistryError::ApplicationNotFound(application_id))?;
            debug!(
                list = %list_id,
                group = %group_id,
                application = %application_id,
                "deleted application"
            );
            Ok(())
        })
    }

    pub fn applications(
        &self,
        list_id: Uuid,
        group_id: Uuid,
        caller: Caller,
    ) -> Result<BTreeMap<Uuid, Application>, RegistryError> {
        self.group(list_id, group_id, caller)
            .map(|group| group.applications)
    }

    pub fn create_attendee(&self, list_id: Uuid, attendee: Attendee) -> Result<Uuid, RegistryError> {
        let attendee = Attendee {
            given_name: non_empty("given name", &attendee.given_name)?,
            sur_name: non_empty("surname", &attendee.sur_name)?,
            degree: non_empty("degree", &attendee.degree)?,
            mail: attendee
                .mail
                .map(|mail| mail.trim().to_owned())
                .filter(|mail| !mail.is_empty()),
        };
        self.mutate(list_id, Caller::Privileged, |list| {
            let id = self.new_id()?;
            list.attendees.insert(id, attendee);
            debug!(list = %list_id, attendee = %id, "created attendee");
            Ok(id)
        })
    }

    pub fn delete_attendee(&self, list_id: Uuid, attendee_id: Uuid) -> Result<(), RegistryError> {
        self.mutate(list_id, Caller::Privileged, |list| {
            list.attendees
                .remove(&attendee_id)
                .ok_or(RegistryError::AttendeeNotFound(attendee_id))?;
            debug!(list = %list_id, attendee = %attendee_id, "deleted attendee");
            Ok(())
        })
    }

    pub fn attendees(
        &self,
        list_id: Uuid,
        caller: Caller,
    ) -> Result<BTreeMap<Uuid, Attendee>, RegistryError> {
        self.read(list_id, caller, |list| Ok(list.attendees.clone()))
    }

    pub fn attendee(
        &self,
        list_id: Uuid,
        attendee_id: Uuid,
        caller: Caller,
    ) -> Result<Attendee, RegistryError> {
        self.read(list_id, caller, |list| {
            list.attendees
                .get(&attendee_id)
                .cloned()
                .ok_or(RegistryError::AttendeeNotFound(attendee_id))
        })
    }

    /// Lets the application speak, finishing whoever spoke before.
    pub fn start_contribution(
        &self,
        list_id: Uuid,
        group_id: Uuid,
        application_id: Uuid,
    ) -> Result<Contribution, RegistryError> {
        self.mutate(list_id, Caller::Privileged, |list| {
            let now = self.clock.now();
            let current = list
                .start_contribution(group_id, application_id, now)?
                .clone();
            debug!(
                list = %list_id,
                group = %group_id,
                application = %application_id,
                "started contribution"
            );
            Ok(current)
        })
    }

    /// Returns the finished contribution, `None` if nobody was speaking.
    pub fn stop_contribution(&self, list_id: Uuid) -> Result<Option<Contribution>, RegistryError> {
        self.mutate(list_id, Caller::Privileged, |list| {
            let now = self.clock.now();
            let finished = list.stop_contribution(now).cloned();
            if finished.is_some() {
                debug!(list = %list_id, "stopped contribution");
            }
            Ok(finished)
        })
    }

    pub fn reset_history(&self, list_id: Uuid) -> Result<(), RegistryError> {
        self.mutate(list_id, Caller::Privileged, |list| {
            list.reset_past_contributions();
            debug!(list = %list_id, "reset past contributions");
            Ok(())
        })
    }

    pub fn time_distribution(
        &self,
        list_id: Uuid,
        caller: Caller,
    ) -> Result<TimeDistribution, RegistryError> {
        self.read(list_id, caller, |list| {
            Ok(TimeDistribution::new(&list.groups, &list.past_contributions))
        })
    }

    /// Markdown summary of the list, see [`report::markdown`].
    pub fn report(&self, list_id: Uuid) -> Result<String, RegistryError> {
        let generated_at = self.clock.now();
        self.read(list_id, Caller::Privileged, |list| {
            Ok(report::markdown(list, generated_at))
        })
    }
}

fn non_empty(field: &'static str, value: &str) -> Result<String, RegistryError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(RegistryError::EmptyName(field));
    }
    Ok(value.to_owned())
}

#[cfg(test)]
mod tests {
    use core::time::Duration;
    use std::thread;

    use chrono::{TimeZone as _, Utc};
    use list_o_matic_database::{DatabaseError, JsonFileStore, MemoryStore};

    use super::*;
    use crate::clock::ManualClock;
    use crate::ids::SequentialIds;

    struct FailingStore;

    impl SnapshotStore for FailingStore {
        fn load(&self) -> Result<TalkingLists, DatabaseError> {
            Err(DatabaseError::Poisoned)
        }

        fn save(&self, _lists: &TalkingLists) -> Result<(), DatabaseError> {
            Err(DatabaseError::Poisoned)
        }
    }

    fn registry() -> (Registry, Arc<MemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2022, 1, 13, 19, 0, 0).unwrap(),
        ));
        let registry = Registry::new(store.clone())
            .with_ids(SequentialIds::default())
            .with_clock(Arc::clone(&clock));
        (registry, store, clock)
    }

    #[test]
    fn new_lists_have_a_default_group() {
        let (registry, _, _) = registry();
        let id = registry.create_list(" Vollversammlung ", Visibility::Public).unwrap();

        let list = registry.get_list(id, Caller::Anonymous).unwrap();
        assert_eq!(list.name, "Vollversammlung");
        assert_eq!(list.groups.len(), 1);
        assert_eq!(list.groups.values().next().unwrap().name, DEFAULT_GROUP_NAME);
        assert!(!list.current_contribution.in_progress);
        assert!(list.past_contributions.is_empty());
        assert!(list.attendees.is_empty());
    }

    #[test]
    fn configured_default_group_name() {
        let (registry, _, _) = registry();
        let registry = registry.with_default_group_name("Speakers");
        let id = registry.create_list("Plenum", Visibility::Private).unwrap();
        let groups = registry.groups(id, Caller::Privileged).unwrap();
        assert_eq!(groups.values().next().unwrap().name, "Speakers");
    }

    #[test]
    fn empty_names_are_rejected() {
        let (registry, _, _) = registry();
        assert!(matches!(
            registry.create_list("   ", Visibility::Public),
            Err(RegistryError::EmptyName("name"))
        ));
        let id = registry.create_list("Plenum", Visibility::Public).unwrap();
        assert!(matches!(
            registry.create_group(id, ""),
            Err(RegistryError::EmptyName("name"))
        ));
        assert!(matches!(
            registry.create_attendee(
                id,
                Attendee {
                    given_name: "Ada".to_owned(),
                    sur_name: " ".to_owned(),
                    degree: "Dr.".to_owned(),
                    mail: None,
                }
            ),
            Err(RegistryError::EmptyName("surname"))
        ));
    }

    #[test]
    fn deleted_lists_are_gone() {
        let (registry, _, _) = registry();
        let id = registry.create_list("Plenum", Visibility::Public).unwrap();
        let group = registry.create_group(id, "Pro").unwrap();
        registry
            .create_application(id, group, "Alice", Caller::Privileged)
            .unwrap();

        registry.delete_list(id).unwrap();
        assert!(matches!(
            registry.get_list(id, Caller::Privileged),
            Err(RegistryError::ListNotFound(missing)) if missing == id
        ));
        assert!(matches!(
            registry.groups(id, Caller::Privileged),
            Err(RegistryError::ListNotFound(_))
        ));
        assert!(matches!(
            registry.delete_list(id),
            Err(RegistryError::ListNotFound(_))
        ));
    }

    #[test]
    fn private_lists_are_hidden() {
        let (registry, _, _) = registry();
        let private = registry.create_list("private", Visibility::Private).unwrap();
        let unlisted = registry.create_list("unlisted", Visibility::Unlisted).unwrap();
        let public = registry.create_list("public", Visibility::Public).unwrap();

        let anonymous = registry.list_all(Caller::Anonymous).unwrap();
        assert_eq!(anonymous.keys().copied().collect::<Vec<_>>(), [public]);
        let privileged = registry.list_all(Caller::Privileged).unwrap();
        assert_eq!(privileged.len(), 3);

        assert!(matches!(
            registry.get_list(private, Caller::Anonymous),
            Err(RegistryError::ListNotFound(_))
        ));
        assert!(matches!(
            registry.time_distribution(private, Caller::Anonymous),
            Err(RegistryError::ListNotFound(_))
        ));
        assert!(registry.get_list(private, Caller::Privileged).is_ok());
        assert!(registry.get_list(unlisted, Caller::Anonymous).is_ok());

        registry.set_visibility(private, Visibility::Public).unwrap();
        assert_eq!(registry.list_all(Caller::Anonymous).unwrap().len(), 2);
    }

    #[test]
    fn anonymous_callers_can_not_apply_to_private_lists() {
        let (registry, _, _) = registry();
        let id = registry.create_list("private", Visibility::Private).unwrap();
        let group = registry.create_group(id, "Pro").unwrap();
        assert!(matches!(
            registry.create_application(id, group, "Mallory", Caller::Anonymous),
            Err(RegistryError::ListNotFound(_))
        ));
        assert!(registry.applications(id, group, Caller::Privileged).unwrap().is_empty());
    }

    #[test]
    fn applications_and_attendees() {
        let (registry, _, _) = registry();
        let id = registry.create_list("Plenum", Visibility::Unlisted).unwrap();
        let group = registry.create_group(id, "Pro").unwrap();
        let alice = registry
            .create_application(id, group, "Alice", Caller::Anonymous)
            .unwrap();
        assert_eq!(
            registry.applications(id, group, Caller::Anonymous).unwrap()[&alice].name,
            "Alice"
        );
        assert!(matches!(
            registry.create_application(id, Uuid::from_u128(999), "Bob", Caller::Anonymous),
            Err(RegistryError::GroupNotFound(_))
        ));

        registry
            .delete_application(id, group, alice, Caller::Anonymous)
            .unwrap();
        assert!(matches!(
            registry.delete_application(id, group, alice, Caller::Anonymous),
            Err(RegistryError::ApplicationNotFound(_))
        ));

        let ada = registry
            .create_attendee(
                id,
                Attendee {
                    given_name: "Ada".to_owned(),
                    sur_name: "Lovelace".to_owned(),
                    degree: "Countess".to_owned(),
                    mail: Some("  ".to_owned()),
                },
            )
            .unwrap();
        let attendee = registry.attendee(id, ada, Caller::Privileged).unwrap();
        assert_eq!(attendee.sur_name, "Lovelace");
        assert_eq!(attendee.mail, None);
        assert_eq!(registry.attendees(id, Caller::Privileged).unwrap().len(), 1);

        registry.delete_attendee(id, ada).unwrap();
        assert!(matches!(
            registry.attendee(id, ada, Caller::Privileged),
            Err(RegistryError::AttendeeNotFound(_))
        ));
    }

    #[test]
    fn ids_are_unique_within_a_list() {
        let store = Arc::new(MemoryStore::new());
        // every id is handed out twice, the registry has to skip the repetition
        let registry = Registry::new(store).with_ids(RepeatingIds::default());
        let id = registry.create_list("Plenum", Visibility::Public).unwrap();
        let group = registry.create_group(id, "Pro").unwrap();
        let application = registry
            .create_application(id, group, "Alice", Caller::Privileged)
            .unwrap();
        let list = registry.get_list(id, Caller::Privileged).unwrap();
        let mut seen = vec![id, group, application];
        seen.extend(list.groups.keys());
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 4);
    }

    #[derive(Default)]
    struct RepeatingIds(core::sync::atomic::AtomicU64);

    impl IdGenerator for RepeatingIds {
        fn next_id(&self) -> Uuid {
            let n = self.0.fetch_add(1, core::sync::atomic::Ordering::Relaxed);
            Uuid::from_u128(u128::from(n / 2 + 1))
        }
    }

    /// Hands out the scripted ids in order.
    struct ScriptedIds(Mutex<alloc::collections::VecDeque<u128>>);

    impl ScriptedIds {
        fn new(script: &[u128]) -> Self {
            Self(Mutex::new(script.iter().copied().collect()))
        }
    }

    impl IdGenerator for ScriptedIds {
        fn next_id(&self) -> Uuid {
            Uuid::from_u128(self.0.lock().unwrap().pop_front().unwrap())
        }
    }

    #[test]
    fn ids_of_deleted_lists_are_not_reused() {
        let registry = Registry::new(Arc::new(MemoryStore::new()))
            .with_ids(ScriptedIds::new(&[1, 2, 3, 4, 5, 1, 2, 3, 6, 7, 4, 5, 8]));
        let first = registry.create_list("Plenum", Visibility::Public).unwrap();
        let group = registry.create_group(first, "Pro").unwrap();
        let second = registry.create_list("Senat", Visibility::Public).unwrap();
        assert_eq!([first, group, second], [1, 3, 4].map(Uuid::from_u128));
        registry.delete_list(first).unwrap();

        let third = registry.create_list("Rat", Visibility::Public).unwrap();
        assert_eq!(third, Uuid::from_u128(6));
        assert!(registry
            .groups(third, Caller::Privileged)
            .unwrap()
            .contains_key(&Uuid::from_u128(7)));

        // ids of another list are taken as well
        let attendee = registry
            .create_attendee(
                second,
                Attendee {
                    given_name: "Ada".to_owned(),
                    sur_name: "Lovelace".to_owned(),
                    degree: "B.Sc.".to_owned(),
                    mail: None,
                },
            )
            .unwrap();
        assert_eq!(attendee, Uuid::from_u128(8));
    }

    #[test]
    fn loaded_ids_are_not_reissued() {
        let store = Arc::new(MemoryStore::new());
        let registry = Registry::new(store.clone()).with_ids(SequentialIds::default());
        let list = registry.create_list("Plenum", Visibility::Public).unwrap();
        let group = registry.create_group(list, "Pro").unwrap();
        let alice = registry
            .create_application(list, group, "Alice", Caller::Privileged)
            .unwrap();
        registry.start_contribution(list, group, alice).unwrap();
        registry.stop_contribution(list).unwrap();
        registry.delete_group(list, group).unwrap();

        // the deleted group 3 is still referenced by the history
        let restarted = Registry::load(store).with_ids(SequentialIds::default());
        let fresh = restarted.create_group(list, "Contra").unwrap();
        assert_eq!(fresh, Uuid::from_u128(4));
    }

    #[test]
    fn contributions_and_time_distribution() {
        let (registry, _, clock) = registry();
        let id = registry.create_list("Plenum", Visibility::Public).unwrap();
        let pro = registry.create_group(id, "Pro").unwrap();
        let contra = registry.create_group(id, "Contra").unwrap();
        let alice = registry
            .create_application(id, pro, "Alice", Caller::Anonymous)
            .unwrap();
        let bob = registry
            .create_application(id, contra, "Bob", Caller::Anonymous)
            .unwrap();
        let carol = registry
            .create_application(id, pro, "Carol", Caller::Anonymous)
            .unwrap();

        registry.start_contribution(id, pro, alice).unwrap();
        clock.advance(chrono::Duration::minutes(5));
        registry.start_contribution(id, contra, bob).unwrap();
        clock.advance(chrono::Duration::minutes(15));
        registry.start_contribution(id, pro, carol).unwrap();
        clock.advance(chrono::Duration::minutes(10));
        let finished = registry.stop_contribution(id).unwrap().unwrap();
        assert_eq!(finished.duration, Some(Duration::from_secs(10 * 60)));
        assert!(registry.stop_contribution(id).unwrap().is_none());

        let distribution = registry.time_distribution(id, Caller::Anonymous).unwrap();
        assert_eq!(distribution.time_share[&pro], Duration::from_secs(15 * 60));
        assert_eq!(distribution.number_contributions[&pro], 2);
        assert_eq!(distribution.time_share[&contra], Duration::from_secs(15 * 60));
        assert_eq!(distribution.number_contributions[&contra], 1);
        assert_eq!(distribution.total_time, Duration::from_secs(30 * 60));

        assert!(matches!(
            registry.start_contribution(id, pro, alice),
            Err(RegistryError::Contribution(
                ContributionError::UnknownApplication { .. }
            ))
        ));

        registry.reset_history(id).unwrap();
        let list = registry.get_list(id, Caller::Anonymous).unwrap();
        assert!(list.past_contributions.is_empty());
        assert_eq!(list.current_contribution, finished);
    }

    #[test]
    fn at_most_one_contribution_in_progress_under_contention() {
        let registry = Registry::new(Arc::new(MemoryStore::new()));
        let id = registry.create_list("Plenum", Visibility::Public).unwrap();
        let group = registry.create_group(id, "Pro").unwrap();
        let applications: Vec<Uuid> = (0..64)
            .map(|n| {
                registry
                    .create_application(id, group, &format!("speaker {n}"), Caller::Privileged)
                    .unwrap()
            })
            .collect();

        thread::scope(|scope| {
            for chunk in applications.chunks(8) {
                let registry = &registry;
                scope.spawn(move || {
                    for application in chunk {
                        registry.start_contribution(id, group, *application).unwrap();
                        let list = registry.get_list(id, Caller::Privileged).unwrap();
                        assert!(list.past_contributions.iter().all(|c| !c.in_progress));
                        registry.stop_contribution(id).unwrap();
                    }
                });
            }
        });

        let list = registry.get_list(id, Caller::Privileged).unwrap();
        assert!(!list.current_contribution.in_progress);
        assert!(list.past_contributions.iter().all(|c| !c.in_progress));
        assert_eq!(list.past_contributions.len(), applications.len());
        assert!(list.groups[&group].applications.is_empty());
    }

    #[test]
    fn every_mutation_is_persisted() {
        let (registry, store, _) = registry();
        let id = registry.create_list("Plenum", Visibility::Public).unwrap();
        let group = registry.create_group(id, "Pro").unwrap();
        let alice = registry
            .create_application(id, group, "Alice", Caller::Privileged)
            .unwrap();
        registry.start_contribution(id, group, alice).unwrap();

        let restored = Registry::load(store.clone());
        assert_eq!(restored.snapshot().unwrap(), registry.snapshot().unwrap());

        registry.delete_list(id).unwrap();
        assert!(Registry::load(store).snapshot().unwrap().is_empty());
    }

    #[test]
    fn round_trips_through_a_json_file() {
        let directory = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonFileStore::new(directory.path().join("talking_lists.json")));
        let (registry, _, clock) = registry();
        let registry = Registry {
            store: store.clone(),
            ..registry
        };
        let id = registry.create_list("Plenum", Visibility::Unlisted).unwrap();
        let group = registry.create_group(id, "Pro").unwrap();
        for name in ["Alice", "Bob"] {
            let application = registry
                .create_application(id, group, name, Caller::Privileged)
                .unwrap();
            registry.start_contribution(id, group, application).unwrap();
            clock.advance(chrono::Duration::seconds(90));
        }
        registry
            .create_application(id, group, "Carol", Caller::Privileged)
            .unwrap();

        let restored = Registry::load(store);
        assert_eq!(restored.snapshot().unwrap(), registry.snapshot().unwrap());
    }

    #[test]
    fn failing_persistence_does_not_fail_mutations() {
        let registry = Registry::load(Arc::new(FailingStore));
        assert!(registry.snapshot().unwrap().is_empty());

        let id = registry.create_list("Plenum", Visibility::Public).unwrap();
        let group = registry.create_group(id, "Pro").unwrap();
        let alice = registry
            .create_application(id, group, "Alice", Caller::Privileged)
            .unwrap();
        registry.start_contribution(id, group, alice).unwrap();
        assert!(
            registry
                .get_list(id, Caller::Privileged)
                .unwrap()
                .current_contribution
                .in_progress
        );
    }

    #[test]
    fn deleting_the_speaking_group_keeps_the_contribution() {
        let (registry, _, _) = registry();
        let id = registry.create_list("Plenum", Visibility::Public).unwrap();
        let group = registry.create_group(id, "Pro").unwrap();
        let alice = registry
            .create_application(id, group, "Alice", Caller::Privileged)
            .unwrap();
        registry.start_contribution(id, group, alice).unwrap();
        registry.delete_group(id, group).unwrap();

        let list = registry.get_list(id, Caller::Privileged).unwrap();
        assert!(list.current_contribution.in_progress);
        assert_eq!(list.current_contribution.application.unwrap().name, "Alice");
        assert!(matches!(
            registry.delete_group(id, group),
            Err(RegistryError::GroupNotFound(_))
        ));
    }
}

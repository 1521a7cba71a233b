use core::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Source of identifiers for lists, groups, applications and attendees.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> Uuid;
}

/// Random version 4 UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Hands out `1`, `2`, `3`, ... as UUIDs. Meant for tests.
#[derive(Debug)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    #[must_use]
    pub const fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> Uuid {
        Uuid::from_u128(u128::from(self.next.fetch_add(1, Ordering::Relaxed)))
    }
}

/// Draws ids until one is not `taken`.
pub fn fresh_id(ids: &dyn IdGenerator, taken: impl Fn(&Uuid) -> bool) -> Uuid {
    loop {
        let id = ids.next_id();
        if !id.is_nil() && !taken(&id) {
            return id;
        }
    }
}

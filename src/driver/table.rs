use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Integer id of an entry of a handle table.
pub trait HandleId: Copy + Ord + fmt::Debug {
    fn from_raw(raw: u64) -> Self;
    fn raw(self: Self) -> u64;
}

macro_rules! handle_id {
    ($(#[$attr:meta])* $name:ident, $what:expr) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u64);

        impl HandleId for $name {
            fn from_raw(raw: u64) -> Self {
                $name(raw)
            }

            fn raw(self: Self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} #{}", $what, self.0)
            }
        }
    };
}

handle_id!(
    /// Id of a started algorithm instance.
    AlgorithmId,
    "algorithm"
);
handle_id!(
    /// Id of a file opened for reading.
    ReadFileId,
    "read channel"
);
handle_id!(
    /// Id of a file opened for writing.
    WriteFileId,
    "write channel"
);

/// Maps ids to live resources. Ids are issued in increasing order and never reused.
#[derive(Debug)]
pub struct HandleTable<I, T> {
    next: u64,
    entries: BTreeMap<I, T>,
}

impl<I: HandleId, T> HandleTable<I, T> {
    pub fn new() -> Self {
        HandleTable {
            next: 1,
            entries: BTreeMap::new(),
        }
    }

    /// Allocates a fresh id for `value`.
    pub fn insert(self: &mut Self, value: T) -> I {
        let id = I::from_raw(self.next);
        self.next += 1;
        self.entries.insert(id, value);
        id
    }

    pub fn get_mut(self: &mut Self, id: I) -> Option<&mut T> {
        self.entries.get_mut(&id)
    }

    pub fn get(self: &Self, id: I) -> Option<&T> {
        self.entries.get(&id)
    }

    pub fn remove(self: &mut Self, id: I) -> Option<T> {
        self.entries.remove(&id)
    }

    pub fn iter_mut(self: &mut Self) -> impl Iterator<Item = (I, &mut T)> {
        self.entries.iter_mut().map(|(id, v)| (*id, v))
    }

    pub fn ids(self: &Self) -> Vec<I> {
        self.entries.keys().copied().collect()
    }

    pub fn drain(self: &mut Self) -> Vec<(I, T)> {
        std::mem::take(&mut self.entries).into_iter().collect()
    }
}

/// Locks `mutex`, ignoring poisoning. Table operations never leave an entry half-updated.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

//! Insertion-ordered string-keyed map, also used as a scope object

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::ContainerError;
use crate::lock::{AdaptiveMutex, Lockable, ObjectLock};
use crate::value::{CycleGuard, Value};

/// Reserved key linking a scope dictionary to its enclosing scope.
pub const PARENT_KEY: &str = "__parent";

/// Insertion-ordered map from strings to values.
///
/// Scopes are dictionaries too: a local scope points at the scope it was
/// opened in through [`PARENT_KEY`]. Writes to that key are checked so the
/// chain can never become cyclic.
pub struct Dictionary {
    mutex: AdaptiveMutex,
    entries: RefCell<IndexMap<String, Value>>,
    frozen: AtomicBool,
}

// SAFETY: `entries` is only borrowed while `mutex` is held by the borrowing
// thread, either inside `read`/`write` or through a `DictionaryIter`, which
// requires a live `ObjectLock` on this dictionary.
unsafe impl Sync for Dictionary {}

impl Lockable for Dictionary {
    fn object_mutex(&self) -> &AdaptiveMutex {
        &self.mutex
    }
}

impl Dictionary {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self {
            mutex: AdaptiveMutex::new(),
            entries: RefCell::new(IndexMap::new()),
            frozen: AtomicBool::new(false),
        }
    }

    /// Create a new scope whose parent is `parent`.
    pub fn child_of(parent: &Arc<Dictionary>) -> Arc<Dictionary> {
        let child = Dictionary::new();
        child
            .entries
            .borrow_mut()
            .insert(PARENT_KEY.to_string(), Value::Dictionary(Arc::clone(parent)));
        Arc::new(child)
    }

    fn read<R>(&self, f: impl FnOnce(&IndexMap<String, Value>) -> R) -> R {
        let _olock = ObjectLock::new(self);
        let entries = self.entries.borrow();
        f(&entries)
    }

    fn write<R>(
        &self,
        override_frozen: bool,
        f: impl FnOnce(&mut IndexMap<String, Value>) -> R,
    ) -> Result<R, ContainerError> {
        let _olock = ObjectLock::new(self);
        if !override_frozen && self.is_frozen() {
            return Err(ContainerError::Frozen { kind: "Dictionary" });
        }
        let mut entries = self.entries.borrow_mut();
        Ok(f(&mut entries))
    }

    /// Number of entries, including `__parent` when present.
    pub fn len(&self) -> usize {
        self.read(|entries| entries.len())
    }

    /// True if the dictionary has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value stored under `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.read(|entries| entries.get(key).cloned())
    }

    /// True if `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.read(|entries| entries.contains_key(key))
    }

    /// Insert or replace `key`. Replacing keeps the original position.
    ///
    /// # Errors
    ///
    /// `Frozen` after [`freeze`](Self::freeze); `ScopeCycle` if `key` is
    /// `__parent` and the new parent chain would lead back here.
    pub fn set(&self, key: impl Into<String>, value: Value) -> Result<(), ContainerError> {
        self.set_with(key.into(), value, false)
    }

    pub(crate) fn set_with(
        &self,
        key: String,
        value: Value,
        override_frozen: bool,
    ) -> Result<(), ContainerError> {
        if key == PARENT_KEY {
            if let Value::Dictionary(parent) = &value {
                if self.is_ancestor_of(parent) {
                    return Err(ContainerError::ScopeCycle);
                }
            }
        }

        self.write(override_frozen, |entries| {
            entries.insert(key, value);
        })
    }

    /// True if this dictionary appears on the scope chain starting at `scope`.
    fn is_ancestor_of(&self, scope: &Arc<Dictionary>) -> bool {
        let mut current = Some(Arc::clone(scope));
        while let Some(dict) = current {
            if std::ptr::eq(Arc::as_ptr(&dict), self) {
                return true;
            }
            current = dict.parent_scope();
        }
        false
    }

    /// Remove `key`, preserving the order of the remaining entries.
    pub fn remove(&self, key: &str) -> Result<Option<Value>, ContainerError> {
        self.write(false, |entries| entries.shift_remove(key))
    }

    /// Remove every entry.
    pub fn clear(&self) -> Result<(), ContainerError> {
        self.write(false, |entries| entries.clear())
    }

    /// Snapshot of the keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.read(|entries| entries.keys().cloned().collect())
    }

    /// Snapshot of the values in insertion order.
    pub fn values(&self) -> Vec<Value> {
        self.read(|entries| entries.values().cloned().collect())
    }

    /// Snapshot of all entries in insertion order.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.read(|entries| {
            entries
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
    }

    /// New, unfrozen dictionary with the same entries.
    pub fn shallow_clone(&self) -> Dictionary {
        let copy = Dictionary::new();
        *copy.entries.borrow_mut() = self.read(|entries| entries.clone());
        copy
    }

    /// Insert all entries of this dictionary into `dest`, overwriting keys
    /// that already exist there.
    pub fn copy_to(&self, dest: &Dictionary) -> Result<(), ContainerError> {
        for (key, value) in self.entries() {
            dest.set_with(key, value, false)?;
        }
        Ok(())
    }

    /// The enclosing scope, if `__parent` holds a dictionary.
    pub fn parent_scope(&self) -> Option<Arc<Dictionary>> {
        match self.get(PARENT_KEY) {
            Some(Value::Dictionary(parent)) => Some(parent),
            _ => None,
        }
    }

    /// Link this scope to `parent`.
    pub fn set_parent_scope(&self, parent: &Arc<Dictionary>) -> Result<(), ContainerError> {
        self.set(PARENT_KEY, Value::Dictionary(Arc::clone(parent)))
    }

    /// Make the dictionary read-only. Cannot be undone.
    pub fn freeze(&self) {
        let _olock = ObjectLock::new(self);
        self.frozen.store(true, Ordering::Release);
    }

    /// True once [`freeze`](Self::freeze) was called.
    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    /// Iterate over `(key, value)` pairs while `lock` is held.
    ///
    /// # Panics
    ///
    /// If `lock` does not currently hold this dictionary's lock.
    pub fn iter<'a>(&'a self, lock: &'a ObjectLock<'_>) -> DictionaryIter<'a> {
        assert!(
            lock.guards(self),
            "Dictionary::iter requires the dictionary's own object lock"
        );
        DictionaryIter {
            dict: self,
            index: 0,
            _lock: lock,
        }
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let dict = Dictionary::new();
        {
            let mut entries = dict.entries.borrow_mut();
            for (key, value) in iter {
                entries.insert(key.into(), value);
            }
        }
        dict
    }
}

impl std::fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Some(_guard) = CycleGuard::enter(self) else {
            return write!(f, "{{...}}");
        };
        f.debug_map()
            .entries(
                self.entries()
                    .into_iter()
                    .filter(|(key, _)| key != PARENT_KEY),
            )
            .finish()
    }
}

/// Lazy iterator over a dictionary held under its object lock.
///
/// Entries are addressed by position and cloned one at a time. Cloning the
/// iterator restarts from the same position.
#[derive(Clone)]
pub struct DictionaryIter<'a> {
    dict: &'a Dictionary,
    index: usize,
    _lock: &'a ObjectLock<'a>,
}

impl DictionaryIter<'_> {
    /// Start over from the first entry.
    pub fn restart(&mut self) {
        self.index = 0;
    }
}

impl Iterator for DictionaryIter<'_> {
    type Item = (String, Value);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self
            .dict
            .entries
            .borrow()
            .get_index(self.index)
            .map(|(k, v)| (k.clone(), v.clone()))?;
        self.index += 1;
        Some(entry)
    }
}

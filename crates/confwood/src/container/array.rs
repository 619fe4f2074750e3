//! Ordered array of values

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::ContainerError;
use crate::lock::{AdaptiveMutex, Lockable, ObjectLock};
use crate::value::{CycleGuard, Value};

/// Ordered sequence of values, contiguous over `[0, len)`.
pub struct Array {
    mutex: AdaptiveMutex,
    items: RefCell<Vec<Value>>,
    frozen: AtomicBool,
}

// SAFETY: `items` is only borrowed while `mutex` is held by the borrowing
// thread, either inside `read`/`write` or through an `ArrayIter`, which
// requires a live `ObjectLock` on this array.
unsafe impl Sync for Array {}

impl Lockable for Array {
    fn object_mutex(&self) -> &AdaptiveMutex {
        &self.mutex
    }
}

impl Array {
    /// Create an empty array.
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Create an array owning `items`.
    pub fn from_vec(items: Vec<Value>) -> Self {
        Self {
            mutex: AdaptiveMutex::new(),
            items: RefCell::new(items),
            frozen: AtomicBool::new(false),
        }
    }

    fn read<R>(&self, f: impl FnOnce(&Vec<Value>) -> R) -> R {
        let _olock = ObjectLock::new(self);
        let items = self.items.borrow();
        f(&items)
    }

    fn write<R>(
        &self,
        override_frozen: bool,
        f: impl FnOnce(&mut Vec<Value>) -> Result<R, ContainerError>,
    ) -> Result<R, ContainerError> {
        let _olock = ObjectLock::new(self);
        if !override_frozen && self.is_frozen() {
            return Err(ContainerError::Frozen { kind: "Array" });
        }
        let mut items = self.items.borrow_mut();
        f(&mut items)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.read(|items| items.len())
    }

    /// True if the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at `index`.
    ///
    /// # Errors
    ///
    /// `IndexOutOfRange` if `index >= len`.
    pub fn get(&self, index: usize) -> Result<Value, ContainerError> {
        self.read(|items| {
            items
                .get(index)
                .cloned()
                .ok_or(ContainerError::IndexOutOfRange {
                    index: index as i64,
                    len: items.len(),
                })
        })
    }

    /// Replace the element at `index`.
    pub fn set(&self, index: usize, value: Value) -> Result<(), ContainerError> {
        self.set_with(index, value, false)
    }

    pub(crate) fn set_with(
        &self,
        index: usize,
        value: Value,
        override_frozen: bool,
    ) -> Result<(), ContainerError> {
        self.write(override_frozen, |items| {
            let len = items.len();
            match items.get_mut(index) {
                Some(slot) => {
                    *slot = value;
                    Ok(())
                }
                None => Err(ContainerError::IndexOutOfRange {
                    index: index as i64,
                    len,
                }),
            }
        })
    }

    /// Append to the end.
    pub fn add(&self, value: Value) -> Result<(), ContainerError> {
        self.write(false, |items| {
            items.push(value);
            Ok(())
        })
    }

    /// Insert before `index`; `index == len` appends.
    pub fn insert(&self, index: usize, value: Value) -> Result<(), ContainerError> {
        self.write(false, |items| {
            if index > items.len() {
                return Err(ContainerError::IndexOutOfRange {
                    index: index as i64,
                    len: items.len(),
                });
            }
            items.insert(index, value);
            Ok(())
        })
    }

    /// Remove and return the element at `index`, shifting later elements down.
    pub fn remove(&self, index: usize) -> Result<Value, ContainerError> {
        self.write(false, |items| {
            if index >= items.len() {
                return Err(ContainerError::IndexOutOfRange {
                    index: index as i64,
                    len: items.len(),
                });
            }
            Ok(items.remove(index))
        })
    }

    /// Remove all elements.
    pub fn clear(&self) -> Result<(), ContainerError> {
        self.write(false, |items| {
            items.clear();
            Ok(())
        })
    }

    /// Replace the whole contents.
    pub fn replace(&self, values: Vec<Value>) -> Result<(), ContainerError> {
        self.write(false, |items| {
            *items = values;
            Ok(())
        })
    }

    /// True if any element equals `value`.
    ///
    /// Compares against a snapshot so that comparing nested containers never
    /// holds two locks at once.
    pub fn contains(&self, value: &Value) -> bool {
        self.to_vec().iter().any(|item| item == value)
    }

    /// Snapshot of the elements.
    pub fn to_vec(&self) -> Vec<Value> {
        self.read(|items| items.clone())
    }

    /// New, unfrozen array with the same elements.
    pub fn shallow_clone(&self) -> Array {
        Array::from_vec(self.to_vec())
    }

    /// Append all elements of this array to `dest`.
    pub fn copy_to(&self, dest: &Array) -> Result<(), ContainerError> {
        let snapshot = self.to_vec();
        dest.write(false, |items| {
            items.extend(snapshot);
            Ok(())
        })
    }

    /// Make the array read-only. Cannot be undone.
    pub fn freeze(&self) {
        let _olock = ObjectLock::new(self);
        self.frozen.store(true, Ordering::Release);
    }

    /// True once [`freeze`](Self::freeze) was called.
    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    /// Iterate over `(index, value)` pairs while `lock` is held.
    ///
    /// # Panics
    ///
    /// If `lock` does not currently hold this array's lock.
    pub fn iter<'a>(&'a self, lock: &'a ObjectLock<'_>) -> ArrayIter<'a> {
        assert!(
            lock.guards(self),
            "Array::iter requires the array's own object lock"
        );
        ArrayIter {
            array: self,
            index: 0,
            _lock: lock,
        }
    }
}

impl Default for Array {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<Value>> for Array {
    fn from(items: Vec<Value>) -> Self {
        Array::from_vec(items)
    }
}

impl FromIterator<Value> for Array {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Array::from_vec(iter.into_iter().collect())
    }
}

impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        self.to_vec() == other.to_vec()
    }
}

impl std::fmt::Debug for Array {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match CycleGuard::enter(self) {
            Some(_guard) => f.debug_list().entries(self.to_vec()).finish(),
            None => write!(f, "[...]"),
        }
    }
}

/// Lazy iterator over an array held under its object lock.
///
/// Elements are cloned one at a time, so the iterator never keeps a borrow
/// of the array between calls. Cloning the iterator restarts from the same
/// position.
#[derive(Clone)]
pub struct ArrayIter<'a> {
    array: &'a Array,
    index: usize,
    _lock: &'a ObjectLock<'a>,
}

impl ArrayIter<'_> {
    /// Start over from the first element.
    pub fn restart(&mut self) {
        self.index = 0;
    }
}

impl Iterator for ArrayIter<'_> {
    type Item = (usize, Value);

    fn next(&mut self) -> Option<Self::Item> {
        let value = self.array.items.borrow().get(self.index).cloned()?;
        let index = self.index;
        self.index += 1;
        Some((index, value))
    }
}

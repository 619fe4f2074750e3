//! Mutable, lock-protected containers
//!
//! [`Array`] and [`Dictionary`] are the two container types scripts can
//! build. Both are shared through `Arc`, embed an adaptive lock and take it
//! internally for every operation, so a single call is always atomic with
//! respect to other threads. Iteration is the exception: the caller holds an
//! [`ObjectLock`](crate::lock::ObjectLock) for the whole walk and passes it
//! to `iter` as proof.

mod array;
mod dictionary;

pub use array::{Array, ArrayIter};
pub use dictionary::{Dictionary, DictionaryIter, PARENT_KEY};

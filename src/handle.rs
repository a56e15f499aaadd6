//! Nullable queue handles.
//!
//! These functions expose a [`Queue`] the way an external driver sees it: the
//! queue itself may be absent, insertions may carry an absent payload, and
//! every failure is reported as `false` or `None` rather than as an
//! [`Error`](crate::Error). Absent or empty queues are never a fault; each
//! operation has a defined no-op or `false` result for them.
//!
//! # Examples
//!
//! ```
//! use string_queue::handle;
//!
//! let mut queue = handle::new();
//! assert!(handle::insert_tail(queue.as_deref_mut(), Some("a")));
//! assert!(handle::insert_tail(queue.as_deref_mut(), Some("b")));
//! assert_eq!(handle::size(queue.as_deref()), 2);
//!
//! let mut buf = [0u8; 2];
//! assert!(handle::remove_head(queue.as_deref_mut(), Some(&mut buf)));
//! assert_eq!(&buf, b"a\0");
//!
//! handle::free(queue);
//! assert!(!handle::remove_head(None, None));
//! ```
use crate::{util::try_box, Queue};
use alloc::boxed::Box;

/// Allocates a new empty queue, or returns `None` if no memory is available.
#[must_use]
pub fn new() -> Option<Box<Queue>> {
    try_box(Queue::new()).ok()
}

/// Releases every element of `queue`, then the queue itself.
///
/// Does nothing if `queue` is `None`.
pub fn free(queue: Option<Box<Queue>>) {
    let Some(mut queue) = queue else {
        return;
    };
    queue.clear();
}

/// Inserts a copy of `value` at the head of `queue`.
///
/// Returns `false` if `queue` is `None` or the element could not be
/// allocated, in which case nothing changes.
pub fn insert_head(queue: Option<&mut Queue>, value: Option<&str>) -> bool {
    queue.is_some_and(|queue| queue.insert_head(value).is_ok())
}

/// Inserts a copy of `value` at the tail of `queue`.
///
/// Returns `false` if `queue` is `None` or the element could not be
/// allocated, in which case nothing changes.
pub fn insert_tail(queue: Option<&mut Queue>, value: Option<&str>) -> bool {
    queue.is_some_and(|queue| queue.insert_tail(value).is_ok())
}

/// Removes the head element of `queue`, copying its payload into `out` as a
/// truncated, NUL-terminated byte string if `out` is provided.
///
/// Returns `false` if `queue` is `None` or empty.
pub fn remove_head(queue: Option<&mut Queue>, out: Option<&mut [u8]>) -> bool {
    queue.is_some_and(|queue| queue.remove_head(out).is_ok())
}

/// Returns the number of elements in `queue`, or 0 if it is `None`.
#[must_use]
pub fn size(queue: Option<&Queue>) -> usize {
    queue.map_or(0, Queue::len)
}

/// Reverses `queue` in place. Does nothing if `queue` is `None`.
pub fn reverse(queue: Option<&mut Queue>) {
    if let Some(queue) = queue {
        queue.reverse();
    }
}

/// Sorts `queue` in place. Does nothing if `queue` is `None`.
pub fn sort(queue: Option<&mut Queue>) {
    if let Some(queue) = queue {
        queue.sort();
    }
}

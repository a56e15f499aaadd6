//! A queue of owned text payloads, stored as a singly-linked chain.
//!
//! See the [`Queue`] type for details.
use crate::{
    element::{Element, Link},
    util::FmtOption,
    Error,
};
use core::{fmt, iter::FusedIterator, marker::PhantomData, mem};

/// A singly-linked queue of text payloads.
///
/// Elements may be inserted at either end, but are only ever removed from the
/// head. Using [`Queue::insert_tail`] together with [`Queue::remove_head`]
/// yields first-in, first-out order; using [`Queue::insert_head`] instead
/// yields last-in, first-out order.
///
/// Every payload is copied into the queue when it is inserted, so the queue
/// never borrows memory owned by the caller. The whole chain can be
/// [reversed](Queue::reverse) or [sorted](Queue::sort) in place, without
/// allocating or freeing any element.
///
/// The queue keeps a count of its elements, so [`Queue::len`] is an _O_(1)
/// operation.
///
/// # Examples
///
/// ```
/// use string_queue::Queue;
///
/// let mut queue = Queue::new();
/// queue.insert_tail("banana")?;
/// queue.insert_tail("apple")?;
/// queue.insert_tail("cherry")?;
/// queue.sort();
///
/// let mut buf = [0u8; 16];
/// queue.remove_head(Some(&mut buf))?;
/// assert_eq!(&buf[..6], b"apple\0");
/// assert_eq!(queue.len(), 2);
/// # Ok::<(), string_queue::Error>(())
/// ```
pub struct Queue {
    pub(crate) head: Link,
    pub(crate) tail: Link,
    pub(crate) len: usize,
}

/// A borrowing iterator over the [`Element`]s of a [`Queue`], from head to
/// tail.
pub struct Iter<'a> {
    curr: Link,
    len: usize,
    _queue: PhantomData<&'a Queue>,
}

// === impl Queue ===

impl Queue {
    /// Returns a new empty `Queue`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Returns the number of elements in the queue.
    ///
    /// This is an _O_(1) operation.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the queue holds no elements.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        if self.head.is_none() {
            debug_assert!(
                self.tail.is_none(),
                "inconsistent state: a queue had a tail but no head!"
            );
            debug_assert_eq!(
                self.len, 0,
                "inconsistent state: a queue was empty, but its length was not zero"
            );
            return true;
        }

        debug_assert_ne!(
            self.len, 0,
            "inconsistent state: a queue was not empty, but its length was zero"
        );
        false
    }

    /// Copies `value` into a new element and links it in front of the current
    /// head.
    ///
    /// Passing `None` inserts an element with an absent payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`] if the element or its payload could not be
    /// allocated. The queue is left untouched in that case.
    pub fn insert_head<'a>(&mut self, value: impl Into<Option<&'a str>>) -> Result<(), Error> {
        let ptr = Element::try_new(value.into())?;
        tracing::trace!(?ptr, ?self.head, len = self.len, "Queue::insert_head");
        unsafe {
            // Safety: the new element is not yet reachable from anywhere else,
            // and we have exclusive access to the rest of the chain.
            (*ptr.as_ptr()).next = self.head.replace(ptr);
        }
        if self.tail.is_none() {
            self.tail = Some(ptr);
        }
        self.len += 1;
        Ok(())
    }

    /// Copies `value` into a new element and links it after the current tail.
    ///
    /// On an empty queue this behaves exactly like [`Queue::insert_head`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alloc`] if the element or its payload could not be
    /// allocated. The queue is left untouched in that case.
    pub fn insert_tail<'a>(&mut self, value: impl Into<Option<&'a str>>) -> Result<(), Error> {
        let Some(tail) = self.tail else {
            return self.insert_head(value);
        };

        let ptr = Element::try_new(value.into())?;
        tracing::trace!(?ptr, ?self.tail, len = self.len, "Queue::insert_tail");
        unsafe {
            // Safety: `tail` is owned by this queue, and nothing else holds a
            // reference into the chain while we have `&mut self`.
            debug_assert!((*tail.as_ptr()).next.is_none());
            (*tail.as_ptr()).next = Some(ptr);
        }
        self.tail = Some(ptr);
        self.len += 1;
        Ok(())
    }

    /// Unlinks the head element and releases it.
    ///
    /// If `out` is provided, the removed payload is first copied into it as a
    /// NUL-terminated byte string. Payloads longer than `out.len() - 1` bytes
    /// are truncated to fit; this is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Empty`] if the queue has no elements.
    pub fn remove_head(&mut self, out: Option<&mut [u8]>) -> Result<(), Error> {
        let head = self.head.ok_or(Error::Empty)?;
        let elem = unsafe {
            // Safety: `head` was linked into this queue, so it came from
            // `Element::try_new`, and it stops being reachable below.
            Element::from_ptr(head)
        };
        self.head = elem.next;
        self.len -= 1;
        if self.len == 0 {
            self.tail = None;
        }

        let copied = out.map(|out| elem.copy_to(out));
        tracing::trace!(?head, ?self.head, len = self.len, ?copied, "Queue::remove_head");
        Ok(())
    }

    /// Removes and releases every element in the queue.
    pub fn clear(&mut self) {
        tracing::trace!(len = self.len, "Queue::clear");
        while self.remove_head(None).is_ok() {}
    }

    /// Reverses the order of the elements in place.
    ///
    /// This is an _O_(_n_) operation which does not allocate or free any
    /// elements; only the links between them change.
    pub fn reverse(&mut self) {
        let Some(head) = self.head else {
            return;
        };
        tracing::trace!(?self.head, ?self.tail, len = self.len, "Queue::reverse");

        let mut prev: Link = None;
        let mut curr = Some(head);
        while let Some(node) = curr {
            unsafe {
                // Safety: every node reachable from the head is owned by this
                // queue, and we have exclusive access to it.
                curr = mem::replace(&mut (*node.as_ptr()).next, prev);
            }
            prev = Some(node);
        }

        // the old head had its link replaced by the initial `None`, so it is
        // already a valid tail.
        self.tail = Some(head);
        self.head = prev;
    }

    /// Returns the element at the head of the queue, if there is one.
    #[must_use]
    pub fn front(&self) -> Option<&Element> {
        self.head.map(|head| unsafe { &*head.as_ptr() })
    }

    /// Returns the element at the tail of the queue, if there is one.
    #[must_use]
    pub fn back(&self) -> Option<&Element> {
        self.tail.map(|tail| unsafe { &*tail.as_ptr() })
    }

    /// Returns an iterator over the queue's elements, from head to tail.
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            curr: self.head,
            len: self.len,
            _queue: PhantomData,
        }
    }

    /// Asserts as many of the queue's invariants as possible.
    ///
    /// # Panics
    ///
    /// If the head and tail disagree about emptiness, if the stored length
    /// does not match the length of the chain, or if the last node in the
    /// chain is not the tail.
    #[track_caller]
    pub fn assert_valid(&self) {
        let Some(head) = self.head else {
            assert!(
                self.tail.is_none(),
                "if the queue's head is null, the tail must also be null"
            );
            assert_eq!(self.len, 0, "if the queue's head is null, its length must be zero");
            return;
        };

        let tail = self
            .tail
            .expect("if the queue has a head, it must also have a tail");

        let mut walked = 1;
        let mut last = head;
        while let Some(next) = unsafe { (*last.as_ptr()).next } {
            assert_ne!(next, head, "the chain must not loop back to its head");
            walked += 1;
            assert!(
                walked <= self.len,
                "the chain is longer than the queue's length ({})",
                self.len
            );
            last = next;
        }

        assert_eq!(
            walked, self.len,
            "the chain's length must match the queue's length"
        );
        assert_eq!(last, tail, "the last node in the chain must be the tail");
    }
}

impl Drop for Queue {
    fn drop(&mut self) {
        self.clear();
    }
}

impl Default for Queue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue")
            .field("head", &FmtOption::new(&self.head))
            .field("tail", &FmtOption::new(&self.tail))
            .field("len", &self.len)
            .finish()
    }
}

impl<'a> Extend<&'a str> for Queue {
    fn extend<I: IntoIterator<Item = &'a str>>(&mut self, iter: I) {
        for value in iter {
            if let Err(error) = self.insert_tail(value) {
                tracing::debug!(%error, len = self.len, "Queue::extend stopped early");
                return;
            }
        }
    }
}

impl<'a> FromIterator<&'a str> for Queue {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut queue = Self::new();
        queue.extend(iter);
        queue
    }
}

impl<'a> IntoIterator for &'a Queue {
    type Item = &'a Element;
    type IntoIter = Iter<'a>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// # Safety
///
/// A `Queue` exclusively owns every element in its chain, and the chain is
/// only reachable through the `Queue`, so moving the queue to another thread
/// moves all of its elements along with it.
unsafe impl Send for Queue {}

// === impl Iter ===

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let curr = self.curr.take()?;
        self.len -= 1;
        unsafe {
            // Safety: the iterator borrows the queue, so no node can be freed
            // or relinked while it exists.
            let elem = &*curr.as_ptr();
            self.curr = elem.next;
            Some(elem)
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl ExactSizeIterator for Iter<'_> {
    #[inline]
    fn len(&self) -> usize {
        self.len
    }
}

impl FusedIterator for Iter<'_> {}

impl fmt::Debug for Iter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter")
            .field("curr", &FmtOption::new(&self.curr))
            .field("len", &self.len)
            .finish()
    }
}

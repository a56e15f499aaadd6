//! Queue elements: an owned text payload plus the link to the next element.
//!
//! See the [`Element`] type for details.
use crate::{util::try_box, Error};
use alloc::{boxed::Box, string::String};
use core::{fmt, mem, ptr::NonNull};

/// A link to the next [`Element`] in a chain, or `None` at the end of it.
pub(crate) type Link = Option<NonNull<Element>>;

/// A single node in a [`Queue`](crate::Queue).
///
/// Each element exclusively owns a copy of the text it was constructed from,
/// along with a 31-bit hash of that text. An element constructed from an
/// absent payload holds neither.
pub struct Element {
    value: Option<String>,
    hash: Option<u32>,
    pub(crate) next: Link,
}

/// Multiplier used by [`payload_hash`].
const HASH_MULTIPLIER: u32 = 37;

/// Mask keeping the low 31 bits of a [`payload_hash`].
const HASH_MASK: u32 = 0x7FFF_FFFF;

/// Returns the 31-bit polynomial hash of `value`'s bytes.
///
/// Two payloads with different hashes are guaranteed to differ. Two payloads
/// with the *same* hash may still differ, so the hash is never used to decide
/// ordering or equality on its own.
#[must_use]
pub fn payload_hash(value: &str) -> u32 {
    value.bytes().fold(0u32, |hash, byte| {
        hash.wrapping_mul(HASH_MULTIPLIER)
            .wrapping_add(u32::from(byte))
    }) & HASH_MASK
}

// === impl Element ===

impl Element {
    /// Builds a new unlinked element holding a fresh copy of `value`.
    ///
    /// The payload is copied first; if the node itself cannot be allocated,
    /// the copy is released before the error is returned.
    pub(crate) fn try_new(value: Option<&str>) -> Result<NonNull<Self>, Error> {
        let value = value.map(copy_payload).transpose()?;
        let hash = value.as_deref().map(payload_hash);
        let node = try_box(Self {
            value,
            hash,
            next: None,
        })?;
        Ok(NonNull::from(Box::leak(node)))
    }

    /// Takes back ownership of an element previously returned by
    /// [`Element::try_new`].
    ///
    /// # Safety
    ///
    /// `ptr` must have come from [`Element::try_new`], must no longer be
    /// reachable from any chain, and must not be used again afterwards.
    pub(crate) unsafe fn from_ptr(ptr: NonNull<Self>) -> Box<Self> {
        Box::from_raw(ptr.as_ptr())
    }

    /// Returns this element's payload, or `None` if it was constructed from
    /// an absent payload.
    #[inline]
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Returns the precomputed [`payload_hash`] of this element's payload.
    #[inline]
    #[must_use]
    pub fn hash(&self) -> Option<u32> {
        self.hash
    }

    /// Returns `true` if both elements hold the same payload.
    ///
    /// Differing hashes answer `false` without touching the payload bytes;
    /// matching hashes always fall through to a full comparison.
    pub(crate) fn same_payload(&self, other: &Self) -> bool {
        if let (Some(a), Some(b)) = (self.hash, other.hash) {
            if a != b {
                return false;
            }
        }
        self.value == other.value
    }

    /// Returns `true` if this element's payload sorts strictly before
    /// `other`'s. Absent payloads sort before every present one.
    pub(crate) fn precedes(&self, other: &Self) -> bool {
        !self.same_payload(other) && self.value() < other.value()
    }

    /// Exchanges payload and hash with `other`, leaving both links alone.
    pub(crate) fn swap_payload(&mut self, other: &mut Self) {
        mem::swap(&mut self.value, &mut other.value);
        mem::swap(&mut self.hash, &mut other.hash);
    }

    /// Copies this element's payload into `out` as a NUL-terminated byte
    /// string, truncating to `out.len() - 1` bytes.
    ///
    /// Returns the number of payload bytes copied. An absent payload or an
    /// empty buffer leaves `out` untouched.
    pub(crate) fn copy_to(&self, out: &mut [u8]) -> usize {
        let (Some(value), Some(max)) = (self.value(), out.len().checked_sub(1)) else {
            return 0;
        };
        let len = value.len().min(max);
        out[..len].copy_from_slice(&value.as_bytes()[..len]);
        out[len] = 0;
        len
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { value, hash, next } = self;
        f.debug_struct("Element")
            .field("value", value)
            .field("hash", hash)
            .field("next", next)
            .finish()
    }
}

fn copy_payload(value: &str) -> Result<String, Error> {
    let mut copy = String::new();
    if let Err(error) = copy.try_reserve_exact(value.len()) {
        tracing::debug!(%error, len = value.len(), "could not allocate payload");
        return Err(Error::Alloc);
    }
    copy.push_str(value);
    Ok(copy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(value: &str) -> Box<Element> {
        let ptr = Element::try_new(Some(value)).unwrap();
        unsafe { Element::from_ptr(ptr) }
    }

    #[test]
    fn hash_matches_polynomial() {
        assert_eq!(payload_hash(""), 0);
        assert_eq!(payload_hash("a"), 97);
        assert_eq!(payload_hash("ab"), 97 * 37 + 98);
    }

    #[test]
    fn hash_is_31_bits() {
        let long = "zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz";
        assert_eq!(payload_hash(long) & !HASH_MASK, 0);
    }

    #[test]
    fn payload_is_copied() {
        let mut source = String::from("hello");
        let elem = element(&source);
        source.push_str(" world");
        assert_eq!(elem.value(), Some("hello"));
        assert_eq!(elem.hash(), Some(payload_hash("hello")));
        assert!(elem.next.is_none());
    }

    #[test]
    fn absent_payload() {
        let ptr = Element::try_new(None).unwrap();
        let elem = unsafe { Element::from_ptr(ptr) };
        assert_eq!(elem.value(), None);
        assert_eq!(elem.hash(), None);

        let mut out = [0xffu8; 4];
        assert_eq!(elem.copy_to(&mut out), 0);
        assert_eq!(out, [0xff; 4]);
    }

    #[test]
    fn ordering() {
        let (a, ab, b) = (element("a"), element("ab"), element("b"));
        assert!(a.precedes(&ab));
        assert!(ab.precedes(&b));
        assert!(!b.precedes(&a));
        assert!(!a.precedes(&element("a")));
        assert!(a.same_payload(&element("a")));
        assert!(!a.same_payload(&b));

        let absent = unsafe { Element::from_ptr(Element::try_new(None).unwrap()) };
        assert!(absent.precedes(&a));
        assert!(!a.precedes(&absent));
    }

    #[test]
    fn copy_truncates() {
        let elem = element("0123456789");

        let mut out = [0xffu8; 4];
        assert_eq!(elem.copy_to(&mut out), 3);
        assert_eq!(&out, b"012\0");

        let mut out = [0xffu8; 16];
        assert_eq!(elem.copy_to(&mut out), 10);
        assert_eq!(&out[..11], b"0123456789\0");

        let mut out = [0u8; 0];
        assert_eq!(elem.copy_to(&mut out), 0);
    }

    #[test]
    fn swap_keeps_links() {
        let mut a = element("a");
        let mut b = element("b");
        let before = (a.next, b.next);
        a.swap_payload(&mut b);
        assert_eq!((a.value(), a.hash()), (Some("b"), Some(98)));
        assert_eq!((b.value(), b.hash()), (Some("a"), Some(97)));
        assert_eq!(before, (a.next, b.next));
    }
}

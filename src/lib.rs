#![cfg_attr(docsrs, doc = include_str!("../README.md"))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg, doc_cfg_hide))]
#![cfg_attr(docsrs, deny(missing_docs))]
#![cfg_attr(not(any(feature = "std", test)), no_std)]

extern crate alloc;
#[cfg(test)]
extern crate std;

#[macro_use]
pub(crate) mod util;

pub mod element;
pub mod handle;
pub mod queue;
pub mod sort;

#[doc(inline)]
pub use element::Element;
#[doc(inline)]
pub use queue::Queue;
#[doc(inline)]
pub use sort::{PivotSource, SortStrategy};

/// Errors returned by fallible [`Queue`] operations.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Memory for an element, its payload, or a queue handle could not be
    /// obtained. Nothing was modified.
    #[error("could not allocate memory for a queue element")]
    Alloc,

    /// The queue has no element to remove.
    #[error("the queue is empty")]
    Empty,
}

//! In-place sorting for [`Queue`]s.
//!
//! Two strategies are provided, both ordering payloads by byte-wise
//! lexicographic comparison and neither allocating nor freeing any element:
//!
//! - [`SortStrategy::Merge`] is a top-down merge sort that relinks nodes. It
//!   always runs in _O_(_n_ log _n_) time, recursing _O_(log _n_) deep.
//! - [`SortStrategy::Partition`] is a randomized quicksort that leaves the
//!   links alone and swaps payloads between nodes instead. It runs in
//!   _O_(_n_ log _n_) expected time, but a consistently unlucky
//!   [`PivotSource`] degrades it to _O_(_n_<sup>2</sup>).
//!
//! Both produce the same final order for the same input, since elements
//! with equal payloads are indistinguishable.
use crate::{
    element::{Element, Link},
    Queue,
};
use core::ptr::NonNull;
use rand_core::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

/// Selects the algorithm used by [`Queue::sort_with`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SortStrategy {
    /// Top-down merge sort over the chain's links.
    #[default]
    Merge,
    /// Randomized partition sort, choosing pivots from a
    /// [`Xoshiro256PlusPlus`] generator seeded with `seed`.
    Partition {
        /// Seed for the pivot generator.
        seed: u64,
    },
}

/// A source of pivot positions for [`SortStrategy::Partition`].
///
/// Every type implementing [`RngCore`] is a `PivotSource`. Tests may
/// implement this trait directly to script exact pivot choices.
pub trait PivotSource {
    /// Returns an index in `0..len`. `len` is always at least 2.
    ///
    /// Out-of-range answers are reduced modulo `len`.
    fn pick(&mut self, len: usize) -> usize;
}

impl<R: RngCore + ?Sized> PivotSource for R {
    #[inline]
    fn pick(&mut self, len: usize) -> usize {
        (self.next_u64() % len as u64) as usize
    }
}

/// The first and last node of a closed chain.
#[derive(Copy, Clone, Debug)]
struct Run {
    head: NonNull<Element>,
    tail: NonNull<Element>,
}

impl Queue {
    /// Default seed used by [`Queue::sort_partitioned`].
    pub const DEFAULT_PIVOT_SEED: u64 = 0x5eed_ba5e_d0d0_cafe;

    /// Sorts the queue's elements into non-decreasing payload order using
    /// [`SortStrategy::Merge`].
    ///
    /// Does nothing for queues with fewer than two elements.
    pub fn sort(&mut self) {
        self.sort_with(SortStrategy::Merge);
    }

    /// Sorts the queue's elements into non-decreasing payload order using the
    /// given strategy.
    pub fn sort_with(&mut self, strategy: SortStrategy) {
        match strategy {
            SortStrategy::Merge => self.sort_merged(),
            SortStrategy::Partition { seed } => {
                let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
                self.sort_partitioned_with(&mut rng);
            }
        }
    }

    /// Sorts the queue by relinking its nodes with a top-down merge sort.
    pub fn sort_merged(&mut self) {
        let (Some(head), Some(tail)) = (self.head, self.tail) else {
            return;
        };
        if self.len < 2 {
            return;
        }
        tracing::trace!(?self.head, ?self.tail, len = self.len, "Queue::sort_merged");

        let run = unsafe {
            // Safety: the queue exclusively owns the chain from `head` to
            // `tail`, which holds exactly `self.len` nodes.
            merge_sort(Run { head, tail }, self.len)
        };
        self.head = Some(run.head);
        self.tail = Some(run.tail);
    }

    /// Sorts the queue by swapping payloads between nodes, choosing pivots
    /// from a generator seeded with [`Queue::DEFAULT_PIVOT_SEED`].
    pub fn sort_partitioned(&mut self) {
        self.sort_with(SortStrategy::Partition {
            seed: Self::DEFAULT_PIVOT_SEED,
        });
    }

    /// Sorts the queue by swapping payloads between nodes, choosing pivots
    /// from `pivots`.
    ///
    /// The chain's links, and therefore its head and tail, never change.
    pub fn sort_partitioned_with<P: PivotSource + ?Sized>(&mut self, pivots: &mut P) {
        let Some(head) = self.head else {
            return;
        };
        if self.len < 2 {
            return;
        }
        tracing::trace!(?self.head, len = self.len, "Queue::sort_partitioned");

        unsafe {
            // Safety: the queue exclusively owns the `self.len` nodes
            // reachable from `head`.
            partition_sort(head, self.len, pivots);
        }
    }
}

#[inline]
unsafe fn next(node: NonNull<Element>) -> Link {
    (*node.as_ptr()).next
}

#[inline]
unsafe fn precedes(a: NonNull<Element>, b: NonNull<Element>) -> bool {
    (*a.as_ptr()).precedes(&*b.as_ptr())
}

#[inline]
unsafe fn swap_payload(a: NonNull<Element>, b: NonNull<Element>) {
    if a != b {
        (*a.as_ptr()).swap_payload(&mut *b.as_ptr());
    }
}

/// Walks `steps` links forward from `node`.
///
/// # Safety
///
/// At least `steps` nodes must follow `node` in its chain.
unsafe fn advance(mut node: NonNull<Element>, steps: usize) -> NonNull<Element> {
    for _ in 0..steps {
        match next(node) {
            Some(n) => node = n,
            None => {
                debug_assert!(false, "chain ended before advancing {steps} nodes");
                break;
            }
        }
    }
    node
}

/// Sorts the closed chain `run` of `len` nodes, returning its new extremes.
///
/// # Safety
///
/// `run` must be a chain of exactly `len` nodes, ending in `run.tail` whose
/// `next` link is `None`, and the caller must have exclusive access to it.
unsafe fn merge_sort(run: Run, len: usize) -> Run {
    if len < 2 {
        return run;
    }

    let front_len = len / 2;
    let front_tail = advance(run.head, front_len - 1);
    let Some(back_head) = (*front_tail.as_ptr()).next.take() else {
        debug_assert!(false, "chain ended before its midpoint");
        return run;
    };
    test_trace!(front_len, back_len = len - front_len, ?back_head, "merge_sort::split");

    let front = merge_sort(
        Run {
            head: run.head,
            tail: front_tail,
        },
        front_len,
    );
    let back = merge_sort(
        Run {
            head: back_head,
            tail: run.tail,
        },
        len - front_len,
    );
    merge(front, back)
}

/// Detaches whichever front node of `a` and `b` sorts first, preferring `a`
/// on ties. Returns `None` once either side is exhausted.
unsafe fn take_lesser(a: &mut Link, b: &mut Link) -> Link {
    let (x, y) = ((*a)?, (*b)?);
    let (side, node) = if precedes(y, x) { (b, y) } else { (a, x) };
    *side = (*node.as_ptr()).next.take();
    Some(node)
}

/// Merges two sorted, closed chains into one.
///
/// # Safety
///
/// `front` and `back` must be disjoint closed chains the caller has
/// exclusive access to.
unsafe fn merge(front: Run, back: Run) -> Run {
    let mut a = Some(front.head);
    let mut b = Some(back.head);

    let head = if precedes(back.head, front.head) {
        b = (*back.head.as_ptr()).next.take();
        back.head
    } else {
        a = (*front.head.as_ptr()).next.take();
        front.head
    };

    let mut tail = head;
    while let Some(node) = take_lesser(&mut a, &mut b) {
        (*tail.as_ptr()).next = Some(node);
        tail = node;
    }

    // at most one side still has nodes left; splice it on wholesale.
    match (a, b) {
        (Some(rest), _) => {
            (*tail.as_ptr()).next = Some(rest);
            tail = front.tail;
        }
        (None, Some(rest)) => {
            (*tail.as_ptr()).next = Some(rest);
            tail = back.tail;
        }
        (None, None) => {}
    }
    (*tail.as_ptr()).next = None;

    test_trace!(?head, ?tail, "merge_sort::merge");
    Run { head, tail }
}

/// Sorts the `len` nodes starting at `first` by swapping payloads.
///
/// # Safety
///
/// At least `len` nodes must be reachable from `first`, and the caller must
/// have exclusive access to them.
unsafe fn partition_sort<P: PivotSource + ?Sized>(
    mut first: NonNull<Element>,
    mut len: usize,
    pivots: &mut P,
) {
    while len > 1 {
        let step = pivots.pick(len) % len;
        swap_payload(first, advance(first, step));

        // `boundary` is the last node known to sort before the pivot, which
        // now sits at `first`.
        let mut boundary = first;
        let mut lesser = 0;
        let mut curr = next(first);
        for _ in 1..len {
            let Some(node) = curr else {
                break;
            };
            if precedes(node, first) {
                boundary = advance(boundary, 1);
                swap_payload(boundary, node);
                lesser += 1;
            }
            curr = next(node);
        }
        swap_payload(first, boundary);
        test_trace!(?first, len, step, lesser, "partition_sort::partition");

        // nodes before `boundary` sort before the pivot now sitting at
        // `boundary`; nodes after it do not.
        let greater = len - lesser - 1;
        let Some(after) = next(boundary) else {
            partition_sort(first, lesser, pivots);
            return;
        };

        // recurse into the shorter side and loop on the longer one, so the
        // stack stays logarithmic even when the partitions are lopsided.
        if lesser < greater {
            partition_sort(first, lesser, pivots);
            first = after;
            len = greater;
        } else {
            partition_sort(after, greater, pivots);
            len = lesser;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::trace_init;
    use std::{string::String, vec, vec::Vec};

    /// Hands out a fixed sequence of pivot indices, then always picks 0.
    struct Scripted(vec::IntoIter<usize>);

    impl PivotSource for Scripted {
        fn pick(&mut self, len: usize) -> usize {
            let idx = self.0.next().unwrap_or(0);
            assert!(idx < len, "scripted pivot {idx} out of range for {len} nodes");
            idx
        }
    }

    fn queue(values: &[&str]) -> Queue {
        values.iter().copied().collect()
    }

    fn values(queue: &Queue) -> Vec<String> {
        queue
            .iter()
            .map(|elem| String::from(elem.value().unwrap()))
            .collect()
    }

    fn reference(values: &[&str]) -> Vec<String> {
        let mut sorted = values.iter().map(|v| String::from(*v)).collect::<Vec<_>>();
        sorted.sort();
        sorted
    }

    const MIXED: &[&str] = &[
        "pear", "apple", "fig", "apple", "", "banana", "ab", "a", "abc", "zebra", "fig",
    ];

    #[test]
    fn merge_sorts() {
        let _trace = trace_init();
        let mut q = queue(MIXED);
        q.sort_merged();
        q.assert_valid();
        assert_eq!(values(&q), reference(MIXED));
        assert_eq!(q.back().and_then(Element::value), Some("zebra"));
    }

    #[test]
    fn partition_sorts() {
        let _trace = trace_init();
        let mut q = queue(MIXED);
        q.sort_partitioned();
        q.assert_valid();
        assert_eq!(values(&q), reference(MIXED));
    }

    #[test]
    fn partition_keeps_links() {
        let _trace = trace_init();
        let mut q = queue(&["c", "b", "a"]);
        let (head, tail) = (q.head, q.tail);
        q.sort_partitioned();
        assert_eq!((head, tail), (q.head, q.tail));
        assert_eq!(values(&q), ["a", "b", "c"]);
    }

    #[test]
    fn merge_relinks() {
        let _trace = trace_init();
        let mut q = queue(&["c", "b", "a"]);
        let (head, tail) = (q.head, q.tail);
        q.sort_merged();
        q.assert_valid();
        // the old tail holds "a", so it is now the head.
        assert_eq!((q.head, q.tail), (tail, head));
    }

    #[test]
    fn scripted_pivots() {
        let _trace = trace_init();
        // always pivoting on the last node is the worst case for sorted input
        let input = ["a", "b", "c", "d", "e"];
        let mut q = queue(&input);
        let mut pivots = Scripted(vec![4, 3, 2, 1].into_iter());
        q.sort_partitioned_with(&mut pivots);
        q.assert_valid();
        assert_eq!(values(&q), reference(&input));

        let input = ["d", "a", "e", "c", "b"];
        let mut q = queue(&input);
        let mut pivots = Scripted(vec![0, 0, 0, 0].into_iter());
        q.sort_partitioned_with(&mut pivots);
        assert_eq!(values(&q), reference(&input));
    }

    #[test]
    fn strategies_agree() {
        let _trace = trace_init();
        for seed in 0..16 {
            let mut merged = queue(MIXED);
            let mut partitioned = queue(MIXED);
            merged.sort_with(SortStrategy::Merge);
            partitioned.sort_with(SortStrategy::Partition { seed });
            assert_eq!(values(&merged), values(&partitioned), "seed {seed}");
        }
    }

    #[test]
    fn prefix_sorts_first() {
        let mut q = queue(&["abc", "ab", "abcd", "a"]);
        q.sort();
        assert_eq!(values(&q), ["a", "ab", "abc", "abcd"]);
    }

    #[test]
    fn absent_payloads_sort_first() {
        let mut q = Queue::new();
        q.insert_tail("b").unwrap();
        q.insert_tail(None).unwrap();
        q.insert_tail("a").unwrap();

        let mut p = Queue::new();
        p.extend(["b", "a"]);
        p.insert_tail(None).unwrap();

        q.sort_merged();
        p.sort_partitioned();
        for q in [&q, &p] {
            q.assert_valid();
            let got = q.iter().map(Element::value).collect::<Vec<_>>();
            assert_eq!(got, [None, Some("a"), Some("b")]);
        }
    }

    #[test]
    fn hash_travels_with_payload() {
        let mut q = queue(&["delta", "alpha", "charlie", "bravo"]);
        q.sort_partitioned();
        for elem in &q {
            assert_eq!(
                elem.hash(),
                elem.value().map(crate::element::payload_hash)
            );
        }
    }

    #[test]
    fn small_queues_untouched() {
        let mut q = Queue::new();
        q.sort();
        q.sort_partitioned();
        q.assert_valid();

        q.insert_tail("only").unwrap();
        let head = q.head;
        q.sort();
        q.sort_partitioned();
        q.assert_valid();
        assert_eq!(q.head, head);
        assert_eq!(values(&q), ["only"]);
    }
}

use std::fmt::Debug;

use nonmax::NonMaxU32;

use crate::grid::NodeId;

// A binary heap is a tree-like structure where every subtree's root has a
// better rank than all the other nodes in the subtree.
//
// It's stored in an array traversed in a non-linear way. These are the indices
// we assign to each slot.
//
//                           0
//              1                         2
//       3            4            5             6
//   7      8      9     10    11     12     13     14
// 15 16  17 18  19 20  21 22 23 24  25
//
// The last level will often be incomplete
//
//   - Up: (i-1)//2
//   - DL: (2*i) + 1
//   - DR: 2(i+1)

/// A position within the heap array.
///
/// `Option<HeapSlot>` is as small as a `u32`, which keeps the slot table dense.
#[derive(Copy, Clone, Debug, PartialOrd, Ord, PartialEq, Eq)]
pub struct HeapSlot {
    index: NonMaxU32,
}

impl HeapSlot {
    #[inline(always)]
    fn from_usize(i: usize) -> Self {
        debug_assert!(i < u32::MAX as usize);
        // SAFETY: The heap never holds more entries than `NodeId`s exist.
        Self {
            index: unsafe { NonMaxU32::new_unchecked(i as u32) },
        }
    }
    #[inline(always)]
    pub fn as_usize(&self) -> usize {
        self.index.get() as usize
    }
}

/// The parent slot
///
/// ```
/// use astar::data_structures::indexed_heap::up;
/// assert_eq!(up(1), 0);
/// assert_eq!(up(2), 0);
/// assert_eq!(up(3), 1);
/// assert_eq!(up(4), 1);
/// assert_eq!(up(5), 2);
/// assert_eq!(up(6), 2);
/// assert_eq!(up(25), 12);
/// ```
#[inline(always)]
#[must_use]
pub fn up(i: usize) -> usize {
    debug_assert!(i != 0);
    (i - 1) >> 1
}

/// The left child slot
///
/// ```
/// use astar::data_structures::indexed_heap::down_left;
/// assert_eq!(down_left(0), 1);
/// assert_eq!(down_left(1), 3);
/// assert_eq!(down_left(3), 7);
/// assert_eq!(down_left(11), 23);
/// ```
#[inline(always)]
#[must_use]
pub fn down_left(i: usize) -> usize {
    (2 * i) + 1
}

/// The right child slot
///
/// ```
/// use astar::data_structures::indexed_heap::down_right;
/// assert_eq!(down_right(0), 2);
/// assert_eq!(down_right(1), 4);
/// assert_eq!(down_right(2), 6);
/// assert_eq!(down_right(4), 10);
/// assert_eq!(down_right(6), 14);
/// ```
#[inline(always)]
#[must_use]
pub fn down_right(i: usize) -> usize {
    2 * (i + 1)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct HeapEntry<R> {
    rank: R,
    id: NodeId,
}

/// Indexed binary min-heap.
///
/// Holds `(rank, NodeId)` entries and a dense `NodeId -> HeapSlot` table, so
/// finding an element is a lookup instead of a linear search. This is what
/// makes `contains` constant and `decrease_key` logarithmic.
///
/// ```pseudocode
/// for (i, e) in self.heap.enumerate():
///   assert_eq(self.slots[e.id], i)
/// ```
#[derive(Debug)]
pub struct IndexedHeap<R>
where
    R: Ord + Copy + Debug,
{
    heap: Vec<HeapEntry<R>>,
    slots: Vec<Option<HeapSlot>>,
}

impl<R> IndexedHeap<R>
where
    R: Ord + Copy + Debug,
{
    pub fn new() -> Self {
        Self {
            heap: vec![],
            slots: vec![],
        }
    }
    /// Sizes the heap for ids in `0..s`, the most it can hold at once.
    pub fn with_capacity(s: usize) -> Self {
        Self {
            heap: Vec::with_capacity(s),
            slots: vec![None; s],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
    pub fn len(&self) -> usize {
        self.heap.len()
    }
    pub fn capacity(&self) -> usize {
        self.heap.capacity()
    }

    #[inline(always)]
    pub fn contains(&self, id: NodeId) -> bool {
        self.slot(id).is_some()
    }

    /// The rank `id` is currently held with.
    pub fn rank_of(&self, id: NodeId) -> Option<R> {
        self.slot(id).map(|s| self.heap[s.as_usize()].rank)
    }

    pub fn peek(&self) -> Option<(NodeId, R)> {
        self.heap.first().map(|e| (e.id, e.rank))
    }

    /// Adds a new element.
    ///
    /// `id` must not be in the heap already.
    pub fn push(&mut self, id: NodeId, rank: R) {
        debug_assert!(!self.contains(id), "{id} is already in the heap");
        self.verify_heap();

        let i = id.as_usize();
        if i >= self.slots.len() {
            self.slots.resize(i + 1, None);
        }

        let heap_index = self.heap.len(); // Future heap_index
        self.heap.push(HeapEntry { rank, id });
        self.slots[i] = Some(HeapSlot::from_usize(heap_index));
        self._unsafe_sift_up(heap_index);

        self.verify_heap();
    }

    /// Removes the element with the lowest rank.
    pub fn pop(&mut self) -> Option<NodeId> {
        self.verify_heap();

        let last = self.heap.len().checked_sub(1)?;
        if last != 0 {
            self._unsafe_swap(0, last);
        }
        let top = self.heap.pop()?;
        self.slots[top.id.as_usize()] = None;
        if !self.heap.is_empty() {
            self._unsafe_sift_down(0);
        }

        self.verify_heap();
        Some(top.id)
    }

    /// Lowers the rank of an element already in the heap.
    ///
    /// Returns whether `id` was found. Raising a rank is not supported, A*
    /// only ever finds cheaper paths to open nodes.
    pub fn decrease_key(&mut self, id: NodeId, rank: R) -> bool {
        let Some(slot) = self.slot(id) else {
            return false;
        };
        let index = slot.as_usize();
        debug_assert!(
            rank <= self.heap[index].rank,
            "{id} rank went up from {:?} to {rank:?}",
            self.heap[index].rank
        );

        self.heap[index].rank = rank;
        self._unsafe_sift_up(index);

        self.verify_heap();
        true
    }

    /// Drops every element, keeping the allocations.
    pub fn clear(&mut self) {
        for e in self.heap.drain(..) {
            self.slots[e.id.as_usize()] = None;
        }
    }

    #[inline(always)]
    fn slot(&self, id: NodeId) -> Option<HeapSlot> {
        self.slots.get(id.as_usize()).copied().flatten()
    }

    #[inline(always)]
    #[cfg(not(feature = "verify"))]
    pub(crate) fn verify_heap(&self) {
        // All good... (hopefully)
    }

    #[inline(always)]
    #[cfg(feature = "verify")]
    pub(crate) fn verify_heap(&self) {
        // Every entry,
        for (i, e) in self.heap.iter().enumerate() {
            // - Has the right slot recorded.
            debug_assert_eq!(self.slot(e.id).map(|s| s.as_usize()), Some(i));

            // - Goes after its parent entry, if any.
            if i == 0 {
                continue;
            }
            let p = up(i);
            debug_assert!(
                self.heap[p].rank <= self.heap[i].rank,
                "Entry[{p}]={:?} !<= child [{i}]={:?}. Out of heap of len={}",
                self.heap[p],
                self.heap[i],
                self.heap.len(),
            );
        }
        // And nothing else claims a slot.
        debug_assert_eq!(
            self.slots.iter().filter(|s| s.is_some()).count(),
            self.heap.len()
        );
    }

    // Implementation details

    /// Raises an entry
    /// Returns it's new index
    #[inline(always)]
    fn _unsafe_sift_up(&mut self, index: usize) -> usize {
        debug_assert!(
            index < self.heap.len(),
            "Entry is way out of sync. Index out of bounds..."
        );

        let mut pos = index;
        while pos != 0 {
            let parent = up(pos);
            if self.heap[parent].rank <= self.heap[pos].rank {
                break;
            }
            self._unsafe_swap(parent, pos);
            pos = parent;
        }
        pos
    }

    /// Lowers an entry
    /// Returns it's new index
    #[inline(always)]
    fn _unsafe_sift_down(&mut self, mut index: usize) -> usize {
        let len = self.heap.len();
        debug_assert!(
            index < len,
            "Entry is way out of sync. Index out of bounds..."
        );

        loop {
            // Find the best child
            let left = down_left(index);
            if left >= len {
                break;
            }
            let right = down_right(index);
            let child = if right < len && self.heap[right].rank < self.heap[left].rank {
                right
            } else {
                left
            };

            if self.heap[index].rank <= self.heap[child].rank {
                break;
            }

            self._unsafe_swap(index, child);
            index = child;
        }
        index
    }

    /// Swaps two entries in the heap.
    ///
    /// For consistency in calling code `l < r` is checked.
    ///
    /// Keeps the slot table in sync.
    #[inline(always)]
    fn _unsafe_swap(&mut self, l: usize, r: usize) {
        debug_assert!(l < r, "Swap({l}, {r}) uses wrong argument order");

        let len = self.heap.len();
        debug_assert!(l < len, "Left  swap index {l} is OUT OF BOUNDS({len})");
        debug_assert!(r < len, "Right swap index {r} is OUT OF BOUNDS({len})");
        self.heap.swap(l, r);
        self.slots[self.heap[l].id.as_usize()] = Some(HeapSlot::from_usize(l));
        self.slots[self.heap[r].id.as_usize()] = Some(HeapSlot::from_usize(r));
    }
}

impl<R> Default for IndexedHeap<R>
where
    R: Ord + Copy + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    fn id(i: usize) -> NodeId {
        NodeId::from_usize(i)
    }

    fn assert_heap_order<R: Ord + Copy + Debug>(heap: &IndexedHeap<R>) {
        for i in 1..heap.heap.len() {
            assert!(heap.heap[up(i)].rank <= heap.heap[i].rank);
        }
        for (i, e) in heap.heap.iter().enumerate() {
            assert_eq!(heap.slot(e.id).map(|s| s.as_usize()), Some(i));
        }
    }

    #[test]
    fn heap_works() {
        let mut heap = IndexedHeap::<u32>::with_capacity(4);

        heap.push(id(2), 7);
        assert!(heap.contains(id(2)));
        assert_eq!(heap.len(), 1);
        assert_eq!(heap.pop(), Some(id(2)));
        assert!(!heap.contains(id(2)));
        assert_eq!(heap.pop(), None);
        assert!(heap.is_empty());
    }

    #[test]
    fn heap_sorts() {
        let mut heap = IndexedHeap::<char>::with_capacity(6);

        for (i, c) in ['c', 'e', 'f', 'a', 'd', 'b'].into_iter().enumerate() {
            heap.push(id(i), c);
        }
        assert_eq!(heap.peek(), Some((id(3), 'a')));

        let order: Vec<usize> = std::iter::from_fn(|| heap.pop())
            .map(|n| n.as_usize())
            .collect();
        assert_eq!(order, vec![3, 5, 0, 4, 1, 2]);
    }

    #[test]
    fn ties_break_on_second_key() {
        // (f, h)
        let mut heap = IndexedHeap::<(u32, u32)>::with_capacity(3);
        heap.push(id(0), (56, 20));
        heap.push(id(1), (56, 0));
        heap.push(id(2), (60, 0));

        assert_eq!(heap.pop(), Some(id(1)));
        assert_eq!(heap.pop(), Some(id(0)));
        assert_eq!(heap.pop(), Some(id(2)));
    }

    #[test]
    fn decrease_key_moves_up() {
        let mut heap = IndexedHeap::<u32>::with_capacity(8);
        for i in 0..8 {
            heap.push(id(i), 10 * (i as u32 + 1));
        }
        assert_eq!(heap.peek(), Some((id(0), 10)));

        assert!(heap.decrease_key(id(7), 5));
        assert_eq!(heap.rank_of(id(7)), Some(5));
        assert_heap_order(&heap);
        assert_eq!(heap.pop(), Some(id(7)));
        assert_eq!(heap.pop(), Some(id(0)));

        assert!(!heap.decrease_key(id(7), 1));
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut heap = IndexedHeap::<u32>::with_capacity(16);
        for i in 0..10 {
            heap.push(id(i), i as u32);
        }
        heap.clear();

        assert!(heap.is_empty());
        assert!(heap.capacity() >= 16);
        for i in 0..10 {
            assert!(!heap.contains(id(i)));
        }
        heap.push(id(3), 1);
        assert_eq!(heap.pop(), Some(id(3)));
    }

    #[test]
    fn grows_past_initial_ids() {
        let mut heap = IndexedHeap::<u32>::new();
        heap.push(id(100), 3);
        heap.push(id(5), 4);
        assert!(heap.contains(id(100)));
        assert!(!heap.contains(id(50)));
        assert_eq!(heap.pop(), Some(id(100)));
    }

    #[derive(Clone, Debug)]
    enum Op {
        Push(usize, u32),
        Decrease(usize, u32),
        Pop,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..64usize, 0..1000u32).prop_map(|(i, r)| Op::Push(i, r)),
            (0..64usize, 0..1000u32).prop_map(|(i, d)| Op::Decrease(i, d)),
            Just(Op::Pop),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(512))]
        #[test]
        fn pop_returns_the_minimum(ops in proptest::collection::vec(op(), 1..200)) {
            let mut heap = IndexedHeap::<(u32, u32)>::with_capacity(64);
            // Reference model of what's in the heap.
            let mut model: Vec<Option<(u32, u32)>> = vec![None; 64];

            for op in ops {
                match op {
                    Op::Push(i, r) => {
                        if model[i].is_none() {
                            let rank = (r, r % 7);
                            heap.push(id(i), rank);
                            model[i] = Some(rank);
                        }
                    }
                    Op::Decrease(i, d) => {
                        if let Some((f, h)) = model[i] {
                            let rank = (f.saturating_sub(d), h);
                            prop_assert!(heap.decrease_key(id(i), rank));
                            model[i] = Some(rank);
                        } else {
                            prop_assert!(!heap.decrease_key(id(i), (0, 0)));
                        }
                    }
                    Op::Pop => {
                        let expected = model.iter().flatten().min().copied();
                        match heap.pop() {
                            Some(n) => {
                                let rank = model[n.as_usize()].take();
                                prop_assert_eq!(rank, expected);
                            }
                            None => prop_assert_eq!(expected, None),
                        }
                    }
                }

                assert_heap_order(&heap);
                prop_assert_eq!(heap.len(), model.iter().flatten().count());
                for (i, r) in model.iter().enumerate() {
                    prop_assert_eq!(heap.contains(id(i)), r.is_some());
                    prop_assert_eq!(heap.rank_of(id(i)), *r);
                }
            }
        }
    }
}
